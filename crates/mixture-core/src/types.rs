//! Type model the mixin engine reasons about
//!
//! The engine never inspects real types. Whoever builds the configuration describes
//! the relevant types up front in a [`TypeUniverse`] and then addresses them through
//! small [`TypeRef`] handles. A handle is only meaningful for the universe that issued
//! it; handing a foreign handle to a lookup is an argument error.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{MixinError, Result};

static NEXT_UNIVERSE_ID: AtomicU32 = AtomicU32::new(1);

/// Opaque identity of a type within one [`TypeUniverse`]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef {
    universe: u32,
    index: u32,
}

impl TypeRef {
    fn new(universe: u32, index: usize) -> Self {
        Self {
            universe,
            index: index as u32,
        }
    }

    /// Position of the type in its universe, in declaration order
    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({}:{})", self.universe, self.index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeCategory {
    #[default]
    Class,
    Interface,
    /// A class usable as a custom attribute
    Attribute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypeVisibility {
    #[default]
    Public,
    NonPublic,
}

/// Visibility of a member (constructor, method, accessor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberVisibility {
    #[default]
    Public,
    Protected,
    Internal,
    Private,
}

impl MemberVisibility {
    /// Whether a generated subclass can reach a member of this visibility
    pub fn is_accessible_to_subclass(self) -> bool {
        matches!(self, MemberVisibility::Public | MemberVisibility::Protected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstructorInfo {
    #[serde(default)]
    pub visibility: MemberVisibility,
    #[serde(default)]
    pub parameter_count: usize,
}

impl ConstructorInfo {
    pub fn new(visibility: MemberVisibility, parameter_count: usize) -> Self {
        Self {
            visibility,
            parameter_count,
        }
    }

    pub fn public_default() -> Self {
        Self::new(MemberVisibility::Public, 0)
    }

    pub fn is_default(&self) -> bool {
        self.parameter_count == 0
    }
}

/// Everything the engine knows about one type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub name: String,
    pub category: TypeCategory,
    pub visibility: TypeVisibility,
    pub is_sealed: bool,
    pub is_abstract: bool,
    pub base_type: Option<TypeRef>,
    /// Declared interfaces, in declaration order
    pub interfaces: Vec<TypeRef>,
    /// Set for closed instantiations such as `List<int>`
    pub generic_definition: Option<TypeRef>,
    pub generic_parameter_count: usize,
    pub type_arguments: Vec<TypeRef>,
    pub constructors: Vec<ConstructorInfo>,
    /// Attributes only: whether several instances may decorate one type
    pub allow_multiple: bool,
}

impl TypeDescriptor {
    fn with_category(name: impl Into<String>, category: TypeCategory) -> Self {
        let constructors = match category {
            TypeCategory::Interface => Vec::new(),
            TypeCategory::Class | TypeCategory::Attribute => {
                vec![ConstructorInfo::public_default()]
            }
        };
        Self {
            name: name.into(),
            category,
            visibility: TypeVisibility::Public,
            is_sealed: false,
            is_abstract: false,
            base_type: None,
            interfaces: Vec::new(),
            generic_definition: None,
            generic_parameter_count: 0,
            type_arguments: Vec::new(),
            constructors,
            allow_multiple: false,
        }
    }

    /// A public, unsealed class with a public default constructor
    pub fn class(name: impl Into<String>) -> Self {
        Self::with_category(name, TypeCategory::Class)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::with_category(name, TypeCategory::Interface)
    }

    pub fn attribute(name: impl Into<String>) -> Self {
        Self::with_category(name, TypeCategory::Attribute)
    }

    pub fn with_base(mut self, base: TypeRef) -> Self {
        self.base_type = Some(base);
        self
    }

    pub fn implementing(mut self, interfaces: impl IntoIterator<Item = TypeRef>) -> Self {
        self.interfaces.extend(interfaces);
        self
    }

    pub fn non_public(mut self) -> Self {
        self.visibility = TypeVisibility::NonPublic;
        self
    }

    pub fn sealed(mut self) -> Self {
        self.is_sealed = true;
        self
    }

    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn with_constructors(
        mut self,
        constructors: impl IntoIterator<Item = ConstructorInfo>,
    ) -> Self {
        self.constructors = constructors.into_iter().collect();
        self
    }

    /// Marks the descriptor as an open generic type definition
    pub fn generic(mut self, parameter_count: usize) -> Self {
        self.generic_parameter_count = parameter_count;
        self
    }

    /// Marks the descriptor as a closed instantiation of `definition`
    pub fn instantiation_of(
        mut self,
        definition: TypeRef,
        arguments: impl IntoIterator<Item = TypeRef>,
    ) -> Self {
        self.generic_definition = Some(definition);
        self.type_arguments = arguments.into_iter().collect();
        self.generic_parameter_count = self.type_arguments.len();
        self
    }

    pub fn allow_multiple(mut self, allow: bool) -> Self {
        self.allow_multiple = allow;
        self
    }

    fn references(&self) -> impl Iterator<Item = TypeRef> + '_ {
        self.base_type
            .iter()
            .chain(self.interfaces.iter())
            .chain(self.generic_definition.iter())
            .chain(self.type_arguments.iter())
            .copied()
    }
}

/// Name-based description of a type, as found in composition documents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeSpec {
    pub name: String,
    pub category: TypeCategory,
    pub visibility: TypeVisibility,
    pub sealed: bool,
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    pub base: Option<String>,
    pub interfaces: Vec<String>,
    pub generic_definition: Option<String>,
    pub generic_parameters: usize,
    pub type_arguments: Vec<String>,
    /// `None` means the category's default (a public default constructor for classes)
    pub constructors: Option<Vec<ConstructorInfo>>,
    pub allow_multiple: bool,
}

/// Immutable catalogue of the types a configuration talks about
#[derive(Debug)]
pub struct TypeUniverse {
    id: u32,
    descriptors: Vec<TypeDescriptor>,
    by_name: HashMap<String, TypeRef>,
}

impl TypeUniverse {
    pub fn builder() -> TypeUniverseBuilder {
        TypeUniverseBuilder::new()
    }

    /// Build a universe from name-based specs; forward references are allowed
    pub fn from_specs(specs: &[TypeSpec]) -> Result<Self> {
        let id = NEXT_UNIVERSE_ID.fetch_add(1, Ordering::Relaxed);
        let mut by_name = HashMap::with_capacity(specs.len());
        for (index, spec) in specs.iter().enumerate() {
            if by_name
                .insert(spec.name.clone(), TypeRef::new(id, index))
                .is_some()
            {
                return Err(MixinError::DuplicateTypeName(spec.name.clone()));
            }
        }

        let lookup = |from: &str, referenced: &str| -> Result<TypeRef> {
            by_name
                .get(referenced)
                .copied()
                .ok_or_else(|| MixinError::UndeclaredType {
                    from: from.to_string(),
                    referenced: referenced.to_string(),
                })
        };

        let mut descriptors = Vec::with_capacity(specs.len());
        for spec in specs {
            let mut descriptor = TypeDescriptor::with_category(spec.name.clone(), spec.category);
            descriptor.visibility = spec.visibility;
            descriptor.is_sealed = spec.sealed;
            descriptor.is_abstract = spec.is_abstract;
            descriptor.allow_multiple = spec.allow_multiple;
            descriptor.generic_parameter_count = spec.generic_parameters;
            if let Some(base) = &spec.base {
                descriptor.base_type = Some(lookup(&spec.name, base)?);
            }
            for interface in &spec.interfaces {
                descriptor.interfaces.push(lookup(&spec.name, interface)?);
            }
            if let Some(definition) = &spec.generic_definition {
                descriptor.generic_definition = Some(lookup(&spec.name, definition)?);
            }
            for argument in &spec.type_arguments {
                descriptor.type_arguments.push(lookup(&spec.name, argument)?);
            }
            if descriptor.generic_definition.is_some() && descriptor.generic_parameter_count == 0 {
                descriptor.generic_parameter_count = descriptor.type_arguments.len();
            }
            if let Some(constructors) = &spec.constructors {
                descriptor.constructors = constructors.clone();
            }
            descriptors.push(descriptor);
        }

        tracing::debug!(universe = id, types = descriptors.len(), "Built type universe from specs");

        Ok(Self {
            id,
            descriptors,
            by_name,
        })
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Whether `ty` was issued by this universe
    pub fn contains(&self, ty: TypeRef) -> bool {
        ty.universe == self.id && ty.index() < self.descriptors.len()
    }

    /// Fail with an argument error naming `parameter` unless `ty` belongs here
    pub fn ensure_contains(&self, ty: TypeRef, parameter: &'static str) -> Result<()> {
        if self.contains(ty) {
            Ok(())
        } else {
            Err(MixinError::ForeignType { parameter, ty })
        }
    }

    pub fn descriptor(&self, ty: TypeRef) -> Option<&TypeDescriptor> {
        if self.contains(ty) {
            self.descriptors.get(ty.index())
        } else {
            None
        }
    }

    pub fn name(&self, ty: TypeRef) -> Option<&str> {
        self.descriptor(ty).map(|d| d.name.as_str())
    }

    /// Name for messages; falls back to the handle's debug form for foreign handles
    pub fn display_name(&self, ty: TypeRef) -> String {
        self.name(ty)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{:?}", ty))
    }

    pub fn resolve(&self, name: &str) -> Option<TypeRef> {
        self.by_name.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeRef, &TypeDescriptor)> {
        self.descriptors
            .iter()
            .enumerate()
            .map(move |(index, d)| (TypeRef::new(self.id, index), d))
    }

    pub fn is_interface(&self, ty: TypeRef) -> bool {
        self.descriptor(ty)
            .is_some_and(|d| d.category == TypeCategory::Interface)
    }

    pub fn is_public(&self, ty: TypeRef) -> bool {
        self.descriptor(ty)
            .is_some_and(|d| d.visibility == TypeVisibility::Public)
    }

    pub fn is_sealed(&self, ty: TypeRef) -> bool {
        self.descriptor(ty).is_some_and(|d| d.is_sealed)
    }

    pub fn is_generic_type_definition(&self, ty: TypeRef) -> bool {
        self.descriptor(ty)
            .is_some_and(|d| d.generic_definition.is_none() && d.generic_parameter_count > 0)
    }

    /// A generic instantiation that is not itself a generic type definition
    pub fn is_closed_generic(&self, ty: TypeRef) -> bool {
        self.descriptor(ty)
            .is_some_and(|d| d.generic_definition.is_some())
    }

    pub fn generic_type_definition_of(&self, ty: TypeRef) -> Option<TypeRef> {
        if self.is_generic_type_definition(ty) {
            return Some(ty);
        }
        self.descriptor(ty).and_then(|d| d.generic_definition)
    }

    pub fn base_type(&self, ty: TypeRef) -> Option<TypeRef> {
        self.descriptor(ty).and_then(|d| d.base_type)
    }

    pub fn interfaces(&self, ty: TypeRef) -> &[TypeRef] {
        self.descriptor(ty)
            .map(|d| d.interfaces.as_slice())
            .unwrap_or(&[])
    }

    /// Strict ancestors along the base-type chain, nearest first
    pub fn base_chain(&self, ty: TypeRef) -> BaseChain<'_> {
        BaseChain {
            universe: self,
            next: self.base_type(ty),
            remaining: self.descriptors.len(),
        }
    }

    pub fn is_subclass_of(&self, ty: TypeRef, base: TypeRef) -> bool {
        self.base_chain(ty).any(|ancestor| ancestor == base)
    }

    /// Whether a value of `source` can be used where `target` is expected
    ///
    /// Reflexive; follows base types and all transitively implemented interfaces.
    pub fn is_assignable_from(&self, target: TypeRef, source: TypeRef) -> bool {
        if !self.contains(target) || !self.contains(source) {
            return false;
        }
        self.supertypes(source).any(|ty| ty == target)
    }

    /// Every interface `ty` implements, directly or through bases and other interfaces
    pub fn implemented_interfaces(&self, ty: TypeRef) -> Vec<TypeRef> {
        self.supertypes(ty)
            .filter(|&candidate| candidate != ty && self.is_interface(candidate))
            .collect()
    }

    /// Breadth-first walk over `ty`, its bases and interfaces, each visited once
    fn supertypes(&self, ty: TypeRef) -> impl Iterator<Item = TypeRef> + '_ {
        let mut queue = VecDeque::from([ty]);
        let mut seen = HashSet::new();
        std::iter::from_fn(move || {
            while let Some(current) = queue.pop_front() {
                if !seen.insert(current) {
                    continue;
                }
                if let Some(descriptor) = self.descriptor(current) {
                    queue.extend(descriptor.base_type);
                    queue.extend(descriptor.interfaces.iter().copied());
                }
                return Some(current);
            }
            None
        })
    }
}

/// Iterator returned by [`TypeUniverse::base_chain`]
///
/// Bounded by the universe size so a malformed cyclic chain terminates.
pub struct BaseChain<'a> {
    universe: &'a TypeUniverse,
    next: Option<TypeRef>,
    remaining: usize,
}

impl Iterator for BaseChain<'_> {
    type Item = TypeRef;

    fn next(&mut self) -> Option<TypeRef> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.next?;
        self.next = self.universe.base_type(current);
        Some(current)
    }
}

/// Incremental builder for a [`TypeUniverse`]
///
/// Descriptors may only reference types that were added before them.
#[derive(Debug)]
pub struct TypeUniverseBuilder {
    id: u32,
    descriptors: Vec<TypeDescriptor>,
    by_name: HashMap<String, TypeRef>,
}

impl Default for TypeUniverseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeUniverseBuilder {
    pub fn new() -> Self {
        Self {
            id: NEXT_UNIVERSE_ID.fetch_add(1, Ordering::Relaxed),
            descriptors: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    pub fn add(&mut self, descriptor: TypeDescriptor) -> Result<TypeRef> {
        if self.by_name.contains_key(&descriptor.name) {
            return Err(MixinError::DuplicateTypeName(descriptor.name));
        }
        if let Some(foreign) = descriptor
            .references()
            .find(|ty| ty.universe != self.id || ty.index() >= self.descriptors.len())
        {
            return Err(MixinError::ForeignType {
                parameter: "descriptor",
                ty: foreign,
            });
        }

        let ty = TypeRef::new(self.id, self.descriptors.len());
        self.by_name.insert(descriptor.name.clone(), ty);
        self.descriptors.push(descriptor);
        Ok(ty)
    }

    pub fn build(self) -> TypeUniverse {
        TypeUniverse {
            id: self.id,
            descriptors: self.descriptors,
            by_name: self.by_name,
        }
    }
}
