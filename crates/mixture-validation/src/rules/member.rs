use crate::definition::{DependencyKind, PropertyOverrideDefinition, RequiredMethodDefinition};
use crate::rule::{Rule, RuleContext, RuleSet};

pub static REQUIRED_METHOD_RULES: RuleSet<RequiredMethodDefinition> = RuleSet {
    name: "RequiredMethodRules",
    rules: &[Rule::must(
        "BaseCallMethodMustBePublicOrProtected",
        "A method required through the base-call contract must be public or protected",
        base_call_is_accessible,
    )],
};

pub static PROPERTY_OVERRIDE_RULES: RuleSet<PropertyOverrideDefinition> = RuleSet {
    name: "PropertyOverrideRules",
    rules: &[Rule::should(
        "OverrideShouldNotIntroduceAccessor",
        "A property override adds an accessor the overridden property lacks; \
         it is unreachable from the composed instance",
        no_new_accessor,
    )],
};

fn base_call_is_accessible(_: &RuleContext<'_>, method: &RequiredMethodDefinition) -> bool {
    method.kind != DependencyKind::NextCall
        || method.implementation_visibility.is_accessible_to_subclass()
}

fn no_new_accessor(_: &RuleContext<'_>, property: &PropertyOverrideDefinition) -> bool {
    !property.overriding.adds_to(property.overridden)
}
