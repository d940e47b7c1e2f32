//! Rule-based validation of expanded mixin definition graphs
//!
//! A [`ValidatingVisitor`] walks a [`TargetClassDefinition`] and runs the rule sets
//! installed for each node kind, recording every outcome in a [`ValidationLog`]. Rule
//! violations are data; whether a failed log should stop the pipeline is up to the caller
//! (see [`ValidationLog::ensure_no_failures`]).

pub mod definition;
pub mod error;
pub mod log;
pub mod rule;
pub mod rules;
pub mod visitor;

pub use definition::{
    Accessors, AttributeIntroductionDefinition, DefinitionNode, DependencyDefinition,
    DependencyKind, InterfaceIntroductionDefinition, MixinDefinition, NodeKind,
    PropertyOverrideDefinition, RequiredMethodDefinition, TargetClassDefinition,
};
pub use error::{Result, ValidationError};
pub use log::{NodeId, Outcome, RuleEntry, ValidationLog, ValidationResult};
pub use rule::{must_hold, should_hold, Rule, RuleContext, RuleNode, RuleSet, RuleTables, Severity};
pub use rules::default_rule_sets;
pub use visitor::ValidatingVisitor;
