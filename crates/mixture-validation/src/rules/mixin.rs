use crate::definition::MixinDefinition;
use crate::rule::{Rule, RuleContext, RuleSet};

pub static MIXIN_RULES: RuleSet<MixinDefinition> = RuleSet {
    name: "MixinRules",
    rules: &[
        Rule::must(
            "MixinCannotBeInterface",
            "An interface cannot be used as a mixin",
            not_interface,
        ),
        Rule::must(
            "MixinMustBePublic",
            "A mixin type must be publicly visible",
            is_public,
        ),
        Rule::must(
            "MixinWithOverriddenMembersMustHaveDefaultConstructor",
            "A mixin that overrides target members needs a public or protected default constructor",
            overriding_mixin_has_default_constructor,
        ),
        Rule::must(
            "MixinCannotMixItself",
            "A mixin cannot be applied to itself",
            not_mixing_itself,
        ),
        Rule::must(
            "MixinCannotMixItsBase",
            "A mixin cannot be applied to one of its own base types",
            not_mixing_its_base,
        ),
    ],
};

fn not_interface(ctx: &RuleContext<'_>, mixin: &MixinDefinition) -> bool {
    !ctx.universe.is_interface(mixin.mixin_type)
}

fn is_public(ctx: &RuleContext<'_>, mixin: &MixinDefinition) -> bool {
    ctx.universe.is_public(mixin.mixin_type)
}

fn overriding_mixin_has_default_constructor(
    ctx: &RuleContext<'_>,
    mixin: &MixinDefinition,
) -> bool {
    if !mixin.has_overridden_members() {
        return true;
    }
    ctx.universe.descriptor(mixin.mixin_type).is_some_and(|d| {
        d.constructors
            .iter()
            .any(|c| c.is_default() && c.visibility.is_accessible_to_subclass())
    })
}

fn not_mixing_itself(ctx: &RuleContext<'_>, mixin: &MixinDefinition) -> bool {
    mixin.mixin_type != ctx.target.class_type
}

fn not_mixing_its_base(ctx: &RuleContext<'_>, mixin: &MixinDefinition) -> bool {
    !ctx.universe.is_subclass_of(mixin.mixin_type, ctx.target.class_type)
}
