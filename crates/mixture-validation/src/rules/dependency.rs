use mixture_core::TypeRef;

use crate::definition::DependencyDefinition;
use crate::rule::{Rule, RuleContext, RuleSet};

pub static DEPENDENCY_RULES: RuleSet<DependencyDefinition> = RuleSet {
    name: "DependencyRules",
    rules: &[Rule::must(
        "DependencyMustBeSatisfied",
        "A dependency must be implemented by the target class or another mixin, or be an aggregate",
        is_satisfied,
    )],
};

fn is_satisfied(ctx: &RuleContext<'_>, dependency: &DependencyDefinition) -> bool {
    dependency.is_aggregate() || has_implementer(ctx, dependency.required_type)
}

/// The target, a received interface, or a mixin other than the dependent one provides `required`
fn has_implementer(ctx: &RuleContext<'_>, required: TypeRef) -> bool {
    let universe = ctx.universe;
    let target = ctx.target;
    if universe.is_assignable_from(required, target.class_type)
        || target
            .received_interfaces
            .iter()
            .any(|&received| universe.is_assignable_from(required, received))
    {
        return true;
    }

    let dependent = ctx.mixin.map(|m| m.mixin_type);
    target
        .mixins
        .iter()
        .filter(|other| Some(other.mixin_type) != dependent)
        .any(|other| {
            universe.is_assignable_from(required, other.mixin_type)
                || other
                    .introduced_interfaces
                    .iter()
                    .any(|i| universe.is_assignable_from(required, i.interface_type))
        })
}
