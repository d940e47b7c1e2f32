//! Rules, rule sets and the per-kind rule tables

use std::fmt;

use mixture_core::{TypeRef, TypeUniverse};
use serde::Serialize;
use tracing::trace;

use crate::definition::{
    AttributeIntroductionDefinition, DependencyDefinition, InterfaceIntroductionDefinition,
    MixinDefinition, NodeKind, PropertyOverrideDefinition, RequiredMethodDefinition,
    TargetClassDefinition,
};
use crate::log::{RuleEntry, ValidationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    /// Violations are failures
    Must,
    /// Violations are warnings
    Should,
}

/// What a predicate may read besides the node itself
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub universe: &'a TypeUniverse,
    pub target: &'a TargetClassDefinition,
    /// The mixin owning the node, for nodes below a mixin
    pub mixin: Option<&'a MixinDefinition>,
    /// The infrastructure interface, when the universe declares it
    pub reserved_interface: Option<TypeRef>,
}

/// A named predicate over one node kind
pub struct Rule<N: 'static> {
    pub name: &'static str,
    /// Shown when the rule does not hold
    pub description: &'static str,
    pub severity: Severity,
    pub predicate: fn(&RuleContext<'_>, &N) -> bool,
}

impl<N: 'static> Rule<N> {
    pub const fn must(
        name: &'static str,
        description: &'static str,
        predicate: fn(&RuleContext<'_>, &N) -> bool,
    ) -> Self {
        Self {
            name,
            description,
            severity: Severity::Must,
            predicate,
        }
    }

    pub const fn should(
        name: &'static str,
        description: &'static str,
        predicate: fn(&RuleContext<'_>, &N) -> bool,
    ) -> Self {
        Self {
            name,
            description,
            severity: Severity::Should,
            predicate,
        }
    }

    pub fn entry(&self, rule_set: &'static str) -> RuleEntry {
        RuleEntry {
            rule_set,
            rule: self.name,
            description: self.description,
            severity: self.severity,
        }
    }

    /// Evaluate against `node` and record the outcome
    pub fn check(
        &self,
        rule_set: &'static str,
        context: &RuleContext<'_>,
        node: &N,
        result: &mut ValidationResult,
    ) {
        let holds = (self.predicate)(context, node);
        trace!(rule_set, rule = self.name, node = %result.node, holds, "Evaluated rule");
        let entry = self.entry(rule_set);
        match self.severity {
            Severity::Must => must_hold(holds, result, entry),
            Severity::Should => should_hold(holds, result, entry),
        }
    }
}

impl<N: 'static> fmt::Debug for Rule<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("severity", &self.severity)
            .finish_non_exhaustive()
    }
}

/// Record a hard constraint
pub fn must_hold(holds: bool, result: &mut ValidationResult, entry: RuleEntry) {
    if holds {
        result.succeed(entry);
    } else {
        result.fail(entry);
    }
}

/// Record an advisory constraint
pub fn should_hold(holds: bool, result: &mut ValidationResult, entry: RuleEntry) {
    if holds {
        result.succeed(entry);
    } else {
        result.warn(entry);
    }
}

/// A named, fixed collection of rules for one node kind
pub struct RuleSet<N: 'static> {
    pub name: &'static str,
    pub rules: &'static [Rule<N>],
}

impl<N: 'static> Clone for RuleSet<N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N: 'static> Copy for RuleSet<N> {}

impl<N: 'static> fmt::Debug for RuleSet<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("name", &self.name)
            .field("rules", &self.rules)
            .finish()
    }
}

impl<N: 'static> RuleSet<N> {
    pub fn check(&self, context: &RuleContext<'_>, node: &N, result: &mut ValidationResult) {
        for rule in self.rules {
            rule.check(self.name, context, node, result);
        }
    }
}

/// Installed rule sets, one table per node kind
#[derive(Debug, Default)]
pub struct RuleTables {
    target_class: Vec<RuleSet<TargetClassDefinition>>,
    mixin: Vec<RuleSet<MixinDefinition>>,
    dependency: Vec<RuleSet<DependencyDefinition>>,
    introduced_interface: Vec<RuleSet<InterfaceIntroductionDefinition>>,
    introduced_attribute: Vec<RuleSet<AttributeIntroductionDefinition>>,
    required_method: Vec<RuleSet<RequiredMethodDefinition>>,
    property_override: Vec<RuleSet<PropertyOverrideDefinition>>,
}

impl RuleTables {
    pub fn install<N: RuleNode>(&mut self, rule_set: RuleSet<N>) {
        N::table_mut(self).push(rule_set);
    }

    pub fn rule_sets<N: RuleNode>(&self) -> &[RuleSet<N>] {
        N::table(self)
    }

    /// Number of rules installed for `kind`
    pub fn rule_count(&self, kind: NodeKind) -> usize {
        fn count<N: 'static>(sets: &[RuleSet<N>]) -> usize {
            sets.iter().map(|set| set.rules.len()).sum()
        }
        match kind {
            NodeKind::TargetClass => count(&self.target_class),
            NodeKind::Mixin => count(&self.mixin),
            NodeKind::Dependency => count(&self.dependency),
            NodeKind::IntroducedInterface => count(&self.introduced_interface),
            NodeKind::IntroducedAttribute => count(&self.introduced_attribute),
            NodeKind::RequiredMethod => count(&self.required_method),
            NodeKind::PropertyOverride => count(&self.property_override),
        }
    }
}

/// A definition node type with its own rule table
pub trait RuleNode: Sized + 'static {
    const KIND: NodeKind;

    fn table(tables: &RuleTables) -> &[RuleSet<Self>];
    fn table_mut(tables: &mut RuleTables) -> &mut Vec<RuleSet<Self>>;
}

macro_rules! rule_node {
    ($node:ty, $kind:ident, $field:ident) => {
        impl RuleNode for $node {
            const KIND: NodeKind = NodeKind::$kind;

            fn table(tables: &RuleTables) -> &[RuleSet<Self>] {
                &tables.$field
            }

            fn table_mut(tables: &mut RuleTables) -> &mut Vec<RuleSet<Self>> {
                &mut tables.$field
            }
        }
    };
}

rule_node!(TargetClassDefinition, TargetClass, target_class);
rule_node!(MixinDefinition, Mixin, mixin);
rule_node!(DependencyDefinition, Dependency, dependency);
rule_node!(InterfaceIntroductionDefinition, IntroducedInterface, introduced_interface);
rule_node!(AttributeIntroductionDefinition, IntroducedAttribute, introduced_attribute);
rule_node!(RequiredMethodDefinition, RequiredMethod, required_method);
rule_node!(PropertyOverrideDefinition, PropertyOverride, property_override);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::NodeId;
    use mixture_core::TypeDescriptor;

    fn holds(_: &RuleContext<'_>, _: &TargetClassDefinition) -> bool {
        true
    }

    fn never(_: &RuleContext<'_>, _: &TargetClassDefinition) -> bool {
        false
    }

    static ALWAYS: &[Rule<TargetClassDefinition>] = &[
        Rule::must("Holds", "Always holds", holds),
        Rule::should("Advises", "Never holds", never),
    ];

    #[test]
    fn test_severity_decides_outcome() {
        let mut b = TypeUniverse::builder();
        let target = b.add(TypeDescriptor::class("Target")).unwrap();
        let universe = b.build();
        let definition = TargetClassDefinition::new(target);
        let context = RuleContext {
            universe: &universe,
            target: &definition,
            mixin: None,
            reserved_interface: None,
        };

        let set = RuleSet {
            name: "Sample",
            rules: ALWAYS,
        };
        let mut result = ValidationResult::new(NodeId::new(NodeKind::TargetClass, "Target"));
        set.check(&context, &definition, &mut result);

        assert_eq!(result.successes.len(), 1);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.failures.is_empty());
        assert_eq!(result.warnings[0].rule_set, "Sample");
    }

    #[test]
    fn test_tables_are_per_kind() {
        let mut tables = RuleTables::default();
        tables.install(RuleSet {
            name: "Sample",
            rules: ALWAYS,
        });

        assert_eq!(tables.rule_count(NodeKind::TargetClass), 2);
        assert_eq!(tables.rule_count(NodeKind::Mixin), 0);
        assert_eq!(tables.rule_sets::<TargetClassDefinition>().len(), 1);
    }
}
