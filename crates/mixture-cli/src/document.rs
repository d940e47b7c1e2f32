//! Composition documents: the CLI's JSON input
//!
//! ```json
//! {
//!   "types": [{ "name": "App.Order" }, { "name": "App.AuditMixin" }],
//!   "configurations": [
//!     { "target": "App.Order", "mixins": [{ "mixin": "App.AuditMixin", "kind": "Extending" }] }
//!   ],
//!   "definitions": []
//! }
//! ```
//!
//! Everything is addressed by full type name and resolved against the document's own
//! type universe when loaded.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use mixture_core::types::MemberVisibility;
use mixture_core::{
    ClassContext, ClassContextCollection, IntroducedMemberVisibility, MixinContext, MixinKind,
    RegistryConfig, TypeRef, TypeSpec, TypeUniverse,
};
use mixture_validation::{
    Accessors, AttributeIntroductionDefinition, DependencyDefinition, DependencyKind,
    InterfaceIntroductionDefinition, MixinDefinition, PropertyOverrideDefinition,
    RequiredMethodDefinition, TargetClassDefinition,
};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CompositionDocument {
    pub types: Vec<TypeSpec>,
    pub configurations: Vec<ConfigurationSpec>,
    pub definitions: Vec<TargetClassSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigurationSpec {
    pub target: String,
    #[serde(default)]
    pub mixins: Vec<MixinSpec>,
    #[serde(default)]
    pub complete_interfaces: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MixinSpec {
    pub mixin: String,
    #[serde(default)]
    pub kind: MixinKind,
    #[serde(default)]
    pub visibility: IntroducedMemberVisibility,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetClassSpec {
    pub class: String,
    #[serde(default)]
    pub mixins: Vec<MixinDefinitionSpec>,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub required_methods: Vec<RequiredMethodSpec>,
    #[serde(default)]
    pub received_interfaces: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MixinDefinitionSpec {
    pub mixin: String,
    #[serde(default)]
    pub kind: MixinKind,
    #[serde(default)]
    pub overridden_members: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,
    #[serde(default)]
    pub introduced_interfaces: Vec<String>,
    #[serde(default)]
    pub introduced_attributes: Vec<String>,
    #[serde(default)]
    pub property_overrides: Vec<PropertyOverrideSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DependencySpec {
    pub required: String,
    #[serde(default)]
    pub kind: DependencyKind,
    #[serde(default)]
    pub aggregated: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequiredMethodSpec {
    pub name: String,
    pub required_by: String,
    #[serde(default)]
    pub kind: DependencyKind,
    #[serde(default)]
    pub visibility: MemberVisibility,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropertyOverrideSpec {
    pub name: String,
    pub overriding: Accessors,
    pub overridden: Accessors,
}

/// A document with every name resolved to a handle
#[derive(Debug)]
pub struct LoadedDocument {
    pub universe: Arc<TypeUniverse>,
    pub contexts: Vec<ClassContext>,
    pub definitions: Vec<TargetClassDefinition>,
}

impl CompositionDocument {
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse composition document")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read composition document {}", path.display()))?;
        Self::from_json_str(&content).with_context(|| format!("In {}", path.display()))
    }

    pub fn resolve(&self) -> Result<LoadedDocument> {
        let universe = TypeUniverse::from_specs(&self.types).context("Invalid type list")?;
        let names = Names(&universe);

        let contexts = self
            .configurations
            .iter()
            .map(|spec| {
                names
                    .class_context(spec)
                    .with_context(|| format!("Invalid configuration for '{}'", spec.target))
            })
            .collect::<Result<Vec<_>>>()?;

        let definitions = self
            .definitions
            .iter()
            .map(|spec| {
                names
                    .definition(spec)
                    .with_context(|| format!("Invalid definition for '{}'", spec.class))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            types = universe.len(),
            configurations = contexts.len(),
            definitions = definitions.len(),
            "Loaded composition document"
        );

        Ok(LoadedDocument {
            universe: Arc::new(universe),
            contexts,
            definitions,
        })
    }
}

impl LoadedDocument {
    pub fn registry(&self, config: RegistryConfig) -> Result<ClassContextCollection> {
        ClassContextCollection::from_contexts(
            self.universe.clone(),
            config,
            self.contexts.iter().cloned(),
        )
        .context("Failed to build class context registry")
    }

    pub fn lookup(&self, name: &str) -> Result<TypeRef> {
        Names(&self.universe).lookup(name)
    }
}

/// Name resolution against one universe
struct Names<'u>(&'u TypeUniverse);

impl Names<'_> {
    fn lookup(&self, name: &str) -> Result<TypeRef> {
        self.0
            .resolve(name)
            .ok_or_else(|| anyhow!("Unknown type '{}'", name))
    }

    fn lookup_all(&self, names: &[String]) -> Result<Vec<TypeRef>> {
        names.iter().map(|name| self.lookup(name)).collect()
    }

    fn class_context(&self, spec: &ConfigurationSpec) -> Result<ClassContext> {
        let mixins = spec
            .mixins
            .iter()
            .map(|mixin| {
                Ok(MixinContext::new(
                    self.lookup(&mixin.mixin)?,
                    mixin.kind,
                    mixin.visibility,
                    self.lookup_all(&mixin.dependencies)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ClassContext::new(
            self.lookup(&spec.target)?,
            mixins,
            self.lookup_all(&spec.complete_interfaces)?,
        )?)
    }

    fn definition(&self, spec: &TargetClassSpec) -> Result<TargetClassDefinition> {
        let mut definition = TargetClassDefinition::new(self.lookup(&spec.class)?);
        definition.attributes = self.lookup_all(&spec.attributes)?;
        definition.received_interfaces = self.lookup_all(&spec.received_interfaces)?;
        for method in &spec.required_methods {
            definition.required_methods.push(RequiredMethodDefinition::new(
                method.name.clone(),
                self.lookup(&method.required_by)?,
                method.kind,
                method.visibility,
            ));
        }
        for mixin in &spec.mixins {
            definition.mixins.push(self.mixin_definition(mixin)?);
        }
        Ok(definition)
    }

    fn mixin_definition(&self, spec: &MixinDefinitionSpec) -> Result<MixinDefinition> {
        let mut mixin = MixinDefinition::new(self.lookup(&spec.mixin)?, spec.kind);
        mixin.overridden_members = spec.overridden_members.clone();
        for dependency in &spec.dependencies {
            mixin.dependencies.push(DependencyDefinition::aggregate(
                self.lookup(&dependency.required)?,
                dependency.kind,
                self.lookup_all(&dependency.aggregated)?,
            ));
        }
        for name in &spec.introduced_interfaces {
            mixin.introduced_interfaces.push(InterfaceIntroductionDefinition {
                interface_type: self.lookup(name)?,
            });
        }
        for name in &spec.introduced_attributes {
            mixin.introduced_attributes.push(AttributeIntroductionDefinition {
                attribute_type: self.lookup(name)?,
            });
        }
        for property in &spec.property_overrides {
            mixin.property_overrides.push(PropertyOverrideDefinition::new(
                property.name.clone(),
                property.overriding,
                property.overridden,
            ));
        }
        Ok(mixin)
    }
}
