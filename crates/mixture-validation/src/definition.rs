//! Node contracts of an expanded definition graph
//!
//! The definition builder expands a [`ClassContext`] into this graph; validation walks it.
//! Only the facts the rules read are modelled. [`TargetClassDefinition::from_class_context`]
//! performs the trivial expansion (one node per configured mixin, explicit dependencies
//! as mixin dependencies) for callers without a richer builder.

use std::fmt;

use mixture_core::types::MemberVisibility;
use mixture_core::{ClassContext, MixinKind, TypeRef};
use serde::{Deserialize, Serialize};

/// Closed set of node kinds, one rule table each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    TargetClass,
    Mixin,
    Dependency,
    IntroducedInterface,
    IntroducedAttribute,
    RequiredMethod,
    PropertyOverride,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::TargetClass => "target class",
            NodeKind::Mixin => "mixin",
            NodeKind::Dependency => "dependency",
            NodeKind::IntroducedInterface => "introduced interface",
            NodeKind::IntroducedAttribute => "introduced attribute",
            NodeKind::RequiredMethod => "required method",
            NodeKind::PropertyOverride => "property override",
        };
        f.write_str(name)
    }
}

/// How a required type or method is reached from the mixin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyKind {
    /// Calls into the composed target instance
    TargetCall,
    /// Calls into the next implementation in the override chain (the base call)
    NextCall,
    /// Requires another mixin of the composition
    #[default]
    Mixin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetClassDefinition {
    pub class_type: TypeRef,
    pub mixins: Vec<MixinDefinition>,
    /// Attributes already declared on the target class
    pub attributes: Vec<TypeRef>,
    pub required_methods: Vec<RequiredMethodDefinition>,
    /// Interfaces the composed type receives (complete interfaces plus introductions)
    pub received_interfaces: Vec<TypeRef>,
}

impl TargetClassDefinition {
    pub fn new(class_type: TypeRef) -> Self {
        Self {
            class_type,
            mixins: Vec::new(),
            attributes: Vec::new(),
            required_methods: Vec::new(),
            received_interfaces: Vec::new(),
        }
    }

    /// Expand a class context without member-level information
    pub fn from_class_context(context: &ClassContext) -> Self {
        let mut definition = Self::new(context.class_type());
        for mixin in context.mixins() {
            let mut node = MixinDefinition::new(mixin.mixin_type(), mixin.kind());
            node.dependencies = mixin
                .explicit_dependencies()
                .iter()
                .map(|&ty| DependencyDefinition::new(ty, DependencyKind::Mixin))
                .collect();
            definition.mixins.push(node);
        }
        definition.received_interfaces = context.complete_interfaces().to_vec();
        definition
    }

    pub fn with_mixin(mut self, mixin: MixinDefinition) -> Self {
        self.mixins.push(mixin);
        self
    }

    pub fn with_attribute(mut self, attribute: TypeRef) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_required_method(mut self, method: RequiredMethodDefinition) -> Self {
        self.required_methods.push(method);
        self
    }

    pub fn receiving(mut self, interface: TypeRef) -> Self {
        self.received_interfaces.push(interface);
        self
    }

    pub fn mixin(&self, mixin_type: TypeRef) -> Option<&MixinDefinition> {
        self.mixins.iter().find(|m| m.mixin_type == mixin_type)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MixinDefinition {
    pub mixin_type: TypeRef,
    pub kind: MixinKind,
    /// Names of target members the mixin overrides
    pub overridden_members: Vec<String>,
    pub dependencies: Vec<DependencyDefinition>,
    pub introduced_interfaces: Vec<InterfaceIntroductionDefinition>,
    pub introduced_attributes: Vec<AttributeIntroductionDefinition>,
    pub property_overrides: Vec<PropertyOverrideDefinition>,
}

impl MixinDefinition {
    pub fn new(mixin_type: TypeRef, kind: MixinKind) -> Self {
        Self {
            mixin_type,
            kind,
            overridden_members: Vec::new(),
            dependencies: Vec::new(),
            introduced_interfaces: Vec::new(),
            introduced_attributes: Vec::new(),
            property_overrides: Vec::new(),
        }
    }

    pub fn overriding(mut self, member: impl Into<String>) -> Self {
        self.overridden_members.push(member.into());
        self
    }

    pub fn with_dependency(mut self, dependency: DependencyDefinition) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn introducing_interface(mut self, interface_type: TypeRef) -> Self {
        self.introduced_interfaces
            .push(InterfaceIntroductionDefinition { interface_type });
        self
    }

    pub fn introducing_attribute(mut self, attribute_type: TypeRef) -> Self {
        self.introduced_attributes
            .push(AttributeIntroductionDefinition { attribute_type });
        self
    }

    pub fn with_property_override(mut self, property: PropertyOverrideDefinition) -> Self {
        self.property_overrides.push(property);
        self
    }

    pub fn has_overridden_members(&self) -> bool {
        !self.overridden_members.is_empty() || !self.property_overrides.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DependencyDefinition {
    pub required_type: TypeRef,
    pub kind: DependencyKind,
    /// Interfaces whose implementers jointly satisfy this dependency
    pub aggregated: Vec<TypeRef>,
}

impl DependencyDefinition {
    pub fn new(required_type: TypeRef, kind: DependencyKind) -> Self {
        Self {
            required_type,
            kind,
            aggregated: Vec::new(),
        }
    }

    pub fn aggregate(
        required_type: TypeRef,
        kind: DependencyKind,
        parts: impl IntoIterator<Item = TypeRef>,
    ) -> Self {
        Self {
            required_type,
            kind,
            aggregated: parts.into_iter().collect(),
        }
    }

    pub fn is_aggregate(&self) -> bool {
        !self.aggregated.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceIntroductionDefinition {
    pub interface_type: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeIntroductionDefinition {
    pub attribute_type: TypeRef,
}

/// A method the composition requires the target (or next implementation) to provide
#[derive(Debug, Clone, PartialEq)]
pub struct RequiredMethodDefinition {
    pub name: String,
    /// The mixin or interface that introduced the requirement
    pub required_by: TypeRef,
    pub kind: DependencyKind,
    pub implementation_visibility: MemberVisibility,
}

impl RequiredMethodDefinition {
    pub fn new(
        name: impl Into<String>,
        required_by: TypeRef,
        kind: DependencyKind,
        implementation_visibility: MemberVisibility,
    ) -> Self {
        Self {
            name: name.into(),
            required_by,
            kind,
            implementation_visibility,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Accessors {
    #[serde(default)]
    pub getter: bool,
    #[serde(default)]
    pub setter: bool,
}

impl Accessors {
    pub const READ_ONLY: Self = Self {
        getter: true,
        setter: false,
    };
    pub const WRITE_ONLY: Self = Self {
        getter: false,
        setter: true,
    };
    pub const READ_WRITE: Self = Self {
        getter: true,
        setter: true,
    };

    /// Whether `self` has an accessor `other` lacks
    pub fn adds_to(self, other: Accessors) -> bool {
        (self.getter && !other.getter) || (self.setter && !other.setter)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyOverrideDefinition {
    pub name: String,
    pub overriding: Accessors,
    pub overridden: Accessors,
}

impl PropertyOverrideDefinition {
    pub fn new(name: impl Into<String>, overriding: Accessors, overridden: Accessors) -> Self {
        Self {
            name: name.into(),
            overriding,
            overridden,
        }
    }
}

/// A borrowed node of any kind
#[derive(Debug, Clone, Copy)]
pub enum DefinitionNode<'a> {
    TargetClass(&'a TargetClassDefinition),
    Mixin(&'a MixinDefinition),
    Dependency(&'a DependencyDefinition),
    IntroducedInterface(&'a InterfaceIntroductionDefinition),
    IntroducedAttribute(&'a AttributeIntroductionDefinition),
    RequiredMethod(&'a RequiredMethodDefinition),
    PropertyOverride(&'a PropertyOverrideDefinition),
}

impl DefinitionNode<'_> {
    pub fn kind(&self) -> NodeKind {
        match self {
            DefinitionNode::TargetClass(_) => NodeKind::TargetClass,
            DefinitionNode::Mixin(_) => NodeKind::Mixin,
            DefinitionNode::Dependency(_) => NodeKind::Dependency,
            DefinitionNode::IntroducedInterface(_) => NodeKind::IntroducedInterface,
            DefinitionNode::IntroducedAttribute(_) => NodeKind::IntroducedAttribute,
            DefinitionNode::RequiredMethod(_) => NodeKind::RequiredMethod,
            DefinitionNode::PropertyOverride(_) => NodeKind::PropertyOverride,
        }
    }

    /// Type handles held directly by this node, not by its children
    pub fn own_types(&self) -> Vec<TypeRef> {
        match self {
            DefinitionNode::TargetClass(target) => std::iter::once(target.class_type)
                .chain(target.attributes.iter().copied())
                .chain(target.received_interfaces.iter().copied())
                .collect(),
            DefinitionNode::Mixin(mixin) => vec![mixin.mixin_type],
            DefinitionNode::Dependency(dependency) => std::iter::once(dependency.required_type)
                .chain(dependency.aggregated.iter().copied())
                .collect(),
            DefinitionNode::IntroducedInterface(interface) => vec![interface.interface_type],
            DefinitionNode::IntroducedAttribute(attribute) => vec![attribute.attribute_type],
            DefinitionNode::RequiredMethod(method) => vec![method.required_by],
            DefinitionNode::PropertyOverride(_) => Vec::new(),
        }
    }
}
