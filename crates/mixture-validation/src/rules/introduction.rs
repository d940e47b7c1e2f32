//! Rules for interfaces and attributes a mixin introduces onto its target

use crate::definition::{AttributeIntroductionDefinition, InterfaceIntroductionDefinition};
use crate::rule::{Rule, RuleContext, RuleSet};

pub static INTRODUCED_INTERFACE_RULES: RuleSet<InterfaceIntroductionDefinition> = RuleSet {
    name: "IntroducedInterfaceRules",
    rules: &[
        Rule::must(
            "ReservedInterfaceCannotBeIntroduced",
            "The mixin infrastructure interface cannot be introduced by a mixin",
            not_reserved,
        ),
        Rule::must(
            "IntroducedInterfaceMustBePublic",
            "An introduced interface must be publicly visible",
            is_public,
        ),
    ],
};

pub static INTRODUCED_ATTRIBUTE_RULES: RuleSet<AttributeIntroductionDefinition> = RuleSet {
    name: "IntroducedAttributeRules",
    rules: &[Rule::must(
        "AllowMultipleRequiredIfIntroducedMultipleTimes",
        "An attribute that does not allow multiple instances can be applied only once",
        single_unless_multiple_allowed,
    )],
};

fn not_reserved(ctx: &RuleContext<'_>, interface: &InterfaceIntroductionDefinition) -> bool {
    ctx.reserved_interface != Some(interface.interface_type)
}

fn is_public(ctx: &RuleContext<'_>, interface: &InterfaceIntroductionDefinition) -> bool {
    ctx.universe.is_public(interface.interface_type)
}

fn single_unless_multiple_allowed(
    ctx: &RuleContext<'_>,
    attribute: &AttributeIntroductionDefinition,
) -> bool {
    let ty = attribute.attribute_type;
    let allows_multiple = ctx
        .universe
        .descriptor(ty)
        .is_some_and(|d| d.allow_multiple);
    if allows_multiple {
        return true;
    }

    let declared = ctx.target.attributes.iter().filter(|&&a| a == ty).count();
    let introduced: usize = ctx
        .target
        .mixins
        .iter()
        .map(|m| {
            m.introduced_attributes
                .iter()
                .filter(|a| a.attribute_type == ty)
                .count()
        })
        .sum();
    declared + introduced <= 1
}
