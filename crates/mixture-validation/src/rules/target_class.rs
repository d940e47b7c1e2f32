use crate::definition::TargetClassDefinition;
use crate::rule::{Rule, RuleContext, RuleSet};

pub static TARGET_CLASS_RULES: RuleSet<TargetClassDefinition> = RuleSet {
    name: "TargetClassRules",
    rules: &[
        Rule::must(
            "TargetClassMustNotBeSealed",
            "A sealed target class cannot be subclassed by the composed type",
            not_sealed,
        ),
        Rule::must(
            "TargetClassMustNotBeInterface",
            "An interface cannot be a mixin target",
            not_interface,
        ),
        Rule::must(
            "TargetClassMustHaveAccessibleConstructor",
            "A target class needs a public or protected constructor",
            has_accessible_constructor,
        ),
        Rule::must(
            "TargetClassMustBePublic",
            "A target class must be publicly visible",
            is_public,
        ),
    ],
};

fn not_sealed(ctx: &RuleContext<'_>, target: &TargetClassDefinition) -> bool {
    !ctx.universe.is_sealed(target.class_type)
}

fn not_interface(ctx: &RuleContext<'_>, target: &TargetClassDefinition) -> bool {
    !ctx.universe.is_interface(target.class_type)
}

fn has_accessible_constructor(ctx: &RuleContext<'_>, target: &TargetClassDefinition) -> bool {
    ctx.universe
        .descriptor(target.class_type)
        .is_some_and(|d| {
            d.constructors
                .iter()
                .any(|c| c.visibility.is_accessible_to_subclass())
        })
}

fn is_public(ctx: &RuleContext<'_>, target: &TargetClassDefinition) -> bool {
    ctx.universe.is_public(target.class_type)
}
