//! The built-in rule catalogue
//!
//! | Rule set | Node kind |
//! |---|---|
//! | `TargetClassRules` | target class |
//! | `MixinRules` | mixin |
//! | `DependencyRules` | dependency |
//! | `IntroducedInterfaceRules` | introduced interface |
//! | `IntroducedAttributeRules` | introduced attribute |
//! | `RequiredMethodRules` | required method |
//! | `PropertyOverrideRules` | property override |

mod dependency;
mod introduction;
mod member;
mod mixin;
mod target_class;

pub use dependency::DEPENDENCY_RULES;
pub use introduction::{INTRODUCED_ATTRIBUTE_RULES, INTRODUCED_INTERFACE_RULES};
pub use member::{PROPERTY_OVERRIDE_RULES, REQUIRED_METHOD_RULES};
pub use mixin::MIXIN_RULES;
pub use target_class::TARGET_CLASS_RULES;

use crate::rule::RuleTables;

/// Tables holding every built-in rule set
pub fn default_rule_sets() -> RuleTables {
    let mut tables = RuleTables::default();
    tables.install(TARGET_CLASS_RULES);
    tables.install(MIXIN_RULES);
    tables.install(DEPENDENCY_RULES);
    tables.install(INTRODUCED_INTERFACE_RULES);
    tables.install(INTRODUCED_ATTRIBUTE_RULES);
    tables.install(REQUIRED_METHOD_RULES);
    tables.install(PROPERTY_OVERRIDE_RULES);
    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::NodeKind;

    #[test]
    fn test_default_catalogue_size() {
        let tables = default_rule_sets();
        assert_eq!(tables.rule_count(NodeKind::TargetClass), 4);
        assert_eq!(tables.rule_count(NodeKind::Mixin), 5);
        assert_eq!(tables.rule_count(NodeKind::Dependency), 1);
        assert_eq!(tables.rule_count(NodeKind::IntroducedInterface), 2);
        assert_eq!(tables.rule_count(NodeKind::IntroducedAttribute), 1);
        assert_eq!(tables.rule_count(NodeKind::RequiredMethod), 1);
        assert_eq!(tables.rule_count(NodeKind::PropertyOverride), 1);
    }
}
