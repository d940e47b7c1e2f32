//! Single-pass validating visitor over a definition graph

use mixture_core::{TypeUniverse, ValidationSettings};
use tracing::debug;

use crate::definition::{DefinitionNode, MixinDefinition, NodeKind, TargetClassDefinition};
use crate::error::{Result, ValidationError};
use crate::log::{NodeId, ValidationLog, ValidationResult};
use crate::rule::{RuleContext, RuleNode, RuleSet, RuleTables};
use crate::rules::default_rule_sets;

/// A node scheduled for checking
struct Visit<'a> {
    id: NodeId,
    node: DefinitionNode<'a>,
    mixin: Option<&'a MixinDefinition>,
}

/// Dispatches every node of a definition graph to its kind's rule sets
#[derive(Debug)]
pub struct ValidatingVisitor {
    tables: RuleTables,
    reserved_interface: String,
}

impl Default for ValidatingVisitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidatingVisitor {
    /// A visitor with no rules installed
    pub fn new() -> Self {
        Self {
            tables: RuleTables::default(),
            reserved_interface: ValidationSettings::default().reserved_interface,
        }
    }

    pub fn with_default_rules() -> Self {
        Self {
            tables: default_rule_sets(),
            ..Self::new()
        }
    }

    pub fn with_settings(mut self, settings: &ValidationSettings) -> Self {
        self.reserved_interface = settings.reserved_interface.clone();
        self
    }

    pub fn install<N: RuleNode>(&mut self, rule_set: RuleSet<N>) -> &mut Self {
        self.tables.install(rule_set);
        self
    }

    pub fn tables(&self) -> &RuleTables {
        &self.tables
    }

    /// Run every installed rule against every node of `definition`
    ///
    /// The whole graph is checked for foreign type handles before any rule runs.
    pub fn validate(
        &self,
        universe: &TypeUniverse,
        definition: &TargetClassDefinition,
    ) -> Result<ValidationLog> {
        let visits = schedule(universe, definition);
        for visit in &visits {
            let foreign = visit
                .node
                .own_types()
                .into_iter()
                .find(|&ty| !universe.contains(ty));
            if let Some(ty) = foreign {
                return Err(ValidationError::ForeignType {
                    node: visit.id.clone(),
                    ty,
                });
            }
        }

        let reserved_interface = universe.resolve(&self.reserved_interface);
        let mut log = ValidationLog::new();
        for visit in visits {
            let context = RuleContext {
                universe,
                target: definition,
                mixin: visit.mixin,
                reserved_interface,
            };
            let result = log.begin(visit.id);
            match visit.node {
                DefinitionNode::TargetClass(node) => self.run(&context, node, result),
                DefinitionNode::Mixin(node) => self.run(&context, node, result),
                DefinitionNode::Dependency(node) => self.run(&context, node, result),
                DefinitionNode::IntroducedInterface(node) => self.run(&context, node, result),
                DefinitionNode::IntroducedAttribute(node) => self.run(&context, node, result),
                DefinitionNode::RequiredMethod(node) => self.run(&context, node, result),
                DefinitionNode::PropertyOverride(node) => self.run(&context, node, result),
            }
        }

        debug!(
            target_class = %universe.display_name(definition.class_type),
            nodes = log.results().len(),
            failures = log.failure_count(),
            warnings = log.warning_count(),
            "Validated definition"
        );
        Ok(log)
    }

    /// Validate several definitions into one log
    pub fn validate_all<'a>(
        &self,
        universe: &TypeUniverse,
        definitions: impl IntoIterator<Item = &'a TargetClassDefinition>,
    ) -> Result<ValidationLog> {
        let mut log = ValidationLog::new();
        for definition in definitions {
            log.merge(self.validate(universe, definition)?);
        }
        Ok(log)
    }

    fn run<N: RuleNode>(&self, context: &RuleContext<'_>, node: &N, result: &mut ValidationResult) {
        for rule_set in self.tables.rule_sets::<N>() {
            rule_set.check(context, node, result);
        }
    }
}

/// Every node of the graph in visiting order: the target and its required methods, then
/// each mixin followed by its children
fn schedule<'a>(universe: &TypeUniverse, definition: &'a TargetClassDefinition) -> Vec<Visit<'a>> {
    let root = universe.display_name(definition.class_type);
    let mut visits = vec![Visit {
        id: NodeId::new(NodeKind::TargetClass, root.clone()),
        node: DefinitionNode::TargetClass(definition),
        mixin: None,
    }];

    for method in &definition.required_methods {
        visits.push(Visit {
            id: NodeId::new(NodeKind::RequiredMethod, format!("{}/{}", root, method.name)),
            node: DefinitionNode::RequiredMethod(method),
            mixin: None,
        });
    }

    for mixin in &definition.mixins {
        let mixin_path = format!("{}/{}", root, universe.display_name(mixin.mixin_type));
        visits.push(Visit {
            id: NodeId::new(NodeKind::Mixin, mixin_path.clone()),
            node: DefinitionNode::Mixin(mixin),
            mixin: Some(mixin),
        });

        let below = |kind, label: String, node| Visit {
            id: NodeId::new(kind, format!("{}/{}", mixin_path, label)),
            node,
            mixin: Some(mixin),
        };
        for dependency in &mixin.dependencies {
            visits.push(below(
                NodeKind::Dependency,
                universe.display_name(dependency.required_type),
                DefinitionNode::Dependency(dependency),
            ));
        }
        for interface in &mixin.introduced_interfaces {
            visits.push(below(
                NodeKind::IntroducedInterface,
                universe.display_name(interface.interface_type),
                DefinitionNode::IntroducedInterface(interface),
            ));
        }
        for attribute in &mixin.introduced_attributes {
            visits.push(below(
                NodeKind::IntroducedAttribute,
                universe.display_name(attribute.attribute_type),
                DefinitionNode::IntroducedAttribute(attribute),
            ));
        }
        for property in &mixin.property_overrides {
            visits.push(below(
                NodeKind::PropertyOverride,
                property.name.clone(),
                DefinitionNode::PropertyOverride(property),
            ));
        }
    }

    visits
}
