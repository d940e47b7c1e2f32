//! Validation log and report rendering

use std::fmt;

use serde::Serialize;

use crate::definition::NodeKind;
use crate::error::{Result, ValidationError};
use crate::rule::Severity;

/// Identifies a checked node by kind and its path from the target class
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NodeId {
    pub kind: NodeKind,
    /// e.g. `App.Order/App.AuditMixin/App.IClock`
    pub path: String,
}

impl NodeId {
    pub fn new(kind: NodeKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.path)
    }
}

/// One rule outcome as recorded in the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleEntry {
    pub rule_set: &'static str,
    pub rule: &'static str,
    pub description: &'static str,
    pub severity: Severity,
}

impl fmt::Display for RuleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.rule_set, self.rule)
    }
}

/// Outcomes of all rules run against one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub node: NodeId,
    pub successes: Vec<RuleEntry>,
    pub warnings: Vec<RuleEntry>,
    pub failures: Vec<RuleEntry>,
}

impl ValidationResult {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            successes: Vec::new(),
            warnings: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn succeed(&mut self, entry: RuleEntry) {
        self.successes.push(entry);
    }

    pub fn warn(&mut self, entry: RuleEntry) {
        self.warnings.push(entry);
    }

    pub fn fail(&mut self, entry: RuleEntry) {
        self.failures.push(entry);
    }

    pub fn total(&self) -> usize {
        self.successes.len() + self.warnings.len() + self.failures.len()
    }

    /// The outcome recorded for `rule`, if it ran against this node
    pub fn outcome_of(&self, rule: &str) -> Option<Outcome> {
        let ran = |entries: &[RuleEntry]| entries.iter().any(|e| e.rule == rule);
        if ran(&self.failures) {
            Some(Outcome::Failed)
        } else if ran(&self.warnings) {
            Some(Outcome::Warned)
        } else if ran(&self.successes) {
            Some(Outcome::Succeeded)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Succeeded,
    Warned,
    Failed,
}

/// Append-only record of one validation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationLog {
    results: Vec<ValidationResult>,
}

impl ValidationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start recording outcomes for `node`
    pub fn begin(&mut self, node: NodeId) -> &mut ValidationResult {
        let index = self.results.len();
        self.results.push(ValidationResult::new(node));
        &mut self.results[index]
    }

    /// Append every result of `other`
    pub fn merge(&mut self, other: ValidationLog) {
        self.results.extend(other.results);
    }

    pub fn results(&self) -> &[ValidationResult] {
        &self.results
    }

    pub fn result_for(&self, node: &NodeId) -> Option<&ValidationResult> {
        self.results.iter().find(|r| &r.node == node)
    }

    /// Results of every node of `kind`, in visiting order
    pub fn results_of(&self, kind: NodeKind) -> impl Iterator<Item = &ValidationResult> {
        self.results.iter().filter(move |r| r.node.kind == kind)
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().map(|r| r.successes.len()).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.results.iter().map(|r| r.warnings.len()).sum()
    }

    pub fn failure_count(&self) -> usize {
        self.results.iter().map(|r| r.failures.len()).sum()
    }

    pub fn has_failures(&self) -> bool {
        self.failure_count() > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.warning_count() > 0
    }

    pub fn ensure_no_failures(&self) -> Result<()> {
        self.ensure_passes(false)
    }

    /// Fail when any rule failed, or when any warned and warnings count as failures
    pub fn ensure_passes(&self, treat_warnings_as_failures: bool) -> Result<()> {
        let failures = self.failure_count()
            + if treat_warnings_as_failures {
                self.warning_count()
            } else {
                0
            };
        if failures == 0 {
            return Ok(());
        }
        Err(ValidationError::Failed {
            failures,
            summary: self.failure_summary(treat_warnings_as_failures),
        })
    }

    pub fn into_result(self) -> Result<Self> {
        self.ensure_no_failures()?;
        Ok(self)
    }

    fn failure_summary(&self, include_warnings: bool) -> String {
        let mut lines = Vec::new();
        for result in &self.results {
            for entry in &result.failures {
                lines.push(format!("  - {}: {} ({})", result.node, entry.description, entry));
            }
            if include_warnings {
                for entry in &result.warnings {
                    lines.push(format!("  - {}: {} ({})", result.node, entry.description, entry));
                }
            }
        }
        lines.join("\n")
    }
}

impl fmt::Display for ValidationLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.results {
            writeln!(f, "{}", result.node)?;
            for entry in &result.failures {
                writeln!(f, "  FAIL  {}: {}", entry, entry.description)?;
            }
            for entry in &result.warnings {
                writeln!(f, "  WARN  {}: {}", entry, entry.description)?;
            }
            for entry in &result.successes {
                writeln!(f, "  ok    {}", entry)?;
            }
        }
        write!(
            f,
            "{} succeeded, {} warned, {} failed",
            self.success_count(),
            self.warning_count(),
            self.failure_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(rule: &'static str) -> RuleEntry {
        RuleEntry {
            rule_set: "TestRules",
            rule,
            description: "Something must hold",
            severity: Severity::Must,
        }
    }

    #[test]
    fn test_counts_and_outcomes() {
        let mut log = ValidationLog::new();
        let node = NodeId::new(NodeKind::Mixin, "Target/Mixin");
        let result = log.begin(node.clone());
        result.succeed(entry("A"));
        result.warn(entry("B"));
        result.fail(entry("C"));

        assert_eq!(log.success_count(), 1);
        assert_eq!(log.warning_count(), 1);
        assert_eq!(log.failure_count(), 1);
        let result = log.result_for(&node).unwrap();
        assert_eq!(result.outcome_of("A"), Some(Outcome::Succeeded));
        assert_eq!(result.outcome_of("B"), Some(Outcome::Warned));
        assert_eq!(result.outcome_of("C"), Some(Outcome::Failed));
        assert_eq!(result.outcome_of("D"), None);
    }

    #[test]
    fn test_ensure_passes() {
        let mut log = ValidationLog::new();
        log.begin(NodeId::new(NodeKind::TargetClass, "Target"))
            .warn(entry("Advisory"));

        assert!(log.ensure_no_failures().is_ok());
        match log.ensure_passes(true) {
            Err(ValidationError::Failed { failures, summary }) => {
                assert_eq!(failures, 1);
                assert!(summary.contains("TestRules.Advisory"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_display_report() {
        let mut log = ValidationLog::new();
        let result = log.begin(NodeId::new(NodeKind::TargetClass, "Target"));
        result.fail(entry("NotSealed"));
        result.succeed(entry("Public"));

        let report = log.to_string();
        assert!(report.starts_with("target class Target\n"));
        assert!(report.contains("  FAIL  TestRules.NotSealed: Something must hold\n"));
        assert!(report.contains("  ok    TestRules.Public\n"));
        assert!(report.ends_with("1 succeeded, 0 warned, 1 failed"));
    }

    #[test]
    fn test_serializes_to_json() {
        let mut log = ValidationLog::new();
        log.begin(NodeId::new(NodeKind::Dependency, "T/M/IDep"))
            .succeed(entry("Satisfied"));

        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["results"][0]["node"]["kind"], "Dependency");
        assert_eq!(json["results"][0]["successes"][0]["rule"], "Satisfied");
    }
}
