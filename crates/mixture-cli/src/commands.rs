//! Subcommand implementations
//!
//! Each command turns a loaded document into printable output; `main` only handles
//! argument parsing and exit codes.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use clap::ValueEnum;
use mixture_core::serialization::flat::serialize_class_context;
use mixture_core::serialization::named::Record;
use mixture_core::serialization::NamedClassContextSerializer;
use mixture_core::{EngineConfig, TypeRef};
use mixture_validation::{TargetClassDefinition, ValidatingVisitor};
use serde_json::Value;
use tracing::{debug, info};

use crate::document::LoadedDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Encoding {
    /// One ordered array per configuration
    #[default]
    Flat,
    /// One record with `Configurations[i]` prefixes
    Named,
}

/// Effective configuration of each requested type, or of every type in the document
pub fn resolve(doc: &LoadedDocument, config: &EngineConfig, types: &[String]) -> Result<String> {
    let registry = doc.registry(config.registry.clone())?;
    let targets: Vec<TypeRef> = if types.is_empty() {
        doc.universe.iter().map(|(ty, _)| ty).collect()
    } else {
        types
            .iter()
            .map(|name| doc.lookup(name))
            .collect::<Result<_>>()?
    };

    let mut out = String::new();
    for ty in targets {
        let name = doc.universe.display_name(ty);
        let context = registry
            .get_with_inheritance(ty)
            .with_context(|| format!("Failed to resolve configuration for '{}'", name))?;
        match context {
            Some(context) => {
                writeln!(out, "{}", context.describe(&doc.universe))?;
                for mixin in context.mixins().iter() {
                    writeln!(out, "  {}", mixin.describe(&doc.universe))?;
                }
            }
            None => writeln!(out, "{}: no mixin configuration", name)?,
        }
    }
    info!(registry = registry.len(), "Resolved configurations");
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub report: String,
    pub passed: bool,
}

/// Validate the document's definitions, or the trivial expansion of its configurations
/// when it has none
pub fn validate(
    doc: &LoadedDocument,
    config: &EngineConfig,
    format: ReportFormat,
) -> Result<ValidationOutcome> {
    let expanded: Vec<TargetClassDefinition>;
    let definitions = if doc.definitions.is_empty() {
        debug!("No explicit definitions, expanding configurations");
        expanded = doc
            .contexts
            .iter()
            .map(TargetClassDefinition::from_class_context)
            .collect();
        &expanded
    } else {
        &doc.definitions
    };

    let visitor = ValidatingVisitor::with_default_rules().with_settings(&config.validation);
    let log = visitor
        .validate_all(&doc.universe, definitions)
        .context("Validation could not run")?;

    let passed = log
        .ensure_passes(config.validation.treat_warnings_as_failures)
        .is_ok();
    let report = match format {
        ReportFormat::Text => log.to_string(),
        ReportFormat::Json => serde_json::to_string_pretty(&log)?,
    };
    info!(
        definitions = definitions.len(),
        failures = log.failure_count(),
        warnings = log.warning_count(),
        passed,
        "Validation finished"
    );
    Ok(ValidationOutcome { report, passed })
}

/// Serialize every configuration in the document
pub fn encode(doc: &LoadedDocument, encoding: Encoding) -> Result<String> {
    let value = match encoding {
        Encoding::Flat => {
            let contexts = doc
                .contexts
                .iter()
                .map(|context| {
                    serialize_class_context(&doc.universe, context).map(Value::Array)
                })
                .collect::<std::result::Result<Vec<_>, _>>()
                .context("Failed to encode configurations")?;
            Value::Array(contexts)
        }
        Encoding::Named => {
            let mut record = Record::new();
            record.insert(
                "Configurations.Count".to_string(),
                Value::from(doc.contexts.len()),
            );
            for (index, context) in doc.contexts.iter().enumerate() {
                let mut serializer = NamedClassContextSerializer::new(
                    &doc.universe,
                    &mut record,
                    format!("Configurations[{}]", index),
                );
                context
                    .serialize(&mut serializer)
                    .context("Failed to encode configurations")?;
            }
            Value::Object(record)
        }
    };
    Ok(serde_json::to_string_pretty(&value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::CompositionDocument;
    use pretty_assertions::assert_eq;

    fn load(json: &str) -> LoadedDocument {
        CompositionDocument::from_json_str(json).unwrap().resolve().unwrap()
    }

    const HIERARCHY: &str = r#"{
        "types": [
            { "name": "Base" },
            { "name": "Derived", "base": "Base" },
            { "name": "Other" },
            { "name": "M1" }
        ],
        "configurations": [{ "target": "Base", "mixins": [{ "mixin": "M1" }] }]
    }"#;

    #[test]
    fn test_resolve_reports_inherited_and_missing() {
        let doc = load(HIERARCHY);
        let types = ["Derived".to_string(), "Other".to_string()];
        let out = resolve(&doc, &EngineConfig::default(), &types).unwrap();
        assert_eq!(
            out,
            "ClassContext for Derived: 1 mixin, 0 complete interfaces\n\
             \x20 Mixin M1 (Used, Private)\n\
             Other: no mixin configuration\n"
        );
    }

    #[test]
    fn test_resolve_unknown_type() {
        let doc = load(HIERARCHY);
        let err = resolve(&doc, &EngineConfig::default(), &["Nope".into()]).unwrap_err();
        assert!(err.to_string().contains("Unknown type 'Nope'"));
    }

    #[test]
    fn test_validate_expands_configurations() {
        let doc = load(r#"{
            "types": [{ "name": "T" }, { "name": "M", "visibility": "non-public" }],
            "configurations": [{ "target": "T", "mixins": [{ "mixin": "M" }] }]
        }"#);
        let outcome = validate(&doc, &EngineConfig::default(), ReportFormat::Text).unwrap();
        assert!(!outcome.passed);
        assert!(outcome.report.contains("MixinRules.MixinMustBePublic"));
    }

    #[test]
    fn test_validate_json_report() {
        let doc = load(HIERARCHY);
        let outcome = validate(&doc, &EngineConfig::default(), ReportFormat::Json).unwrap();
        assert!(outcome.passed);
        let value: Value = serde_json::from_str(&outcome.report).unwrap();
        assert!(value["results"].is_array());
    }

    #[test]
    fn test_encode_named_uses_configuration_prefixes() {
        let doc = load(HIERARCHY);
        let value: Value = serde_json::from_str(&encode(&doc, Encoding::Named).unwrap()).unwrap();
        assert_eq!(value["Configurations.Count"], 1);
        assert_eq!(value["Configurations[0].ClassType"], "Base");
        assert_eq!(value["Configurations[0].Mixins.Count"], 1);
        assert_eq!(value["Configurations[0].Mixins[0].MixinType"], "M1");
    }

    #[test]
    fn test_encode_flat() {
        let doc = load(HIERARCHY);
        let value: Value = serde_json::from_str(&encode(&doc, Encoding::Flat).unwrap()).unwrap();
        assert_eq!(value[0][0], "Base");
        assert_eq!(value[0][1][0][0], "M1");
        assert_eq!(value[0][2], serde_json::json!([]));
    }
}
