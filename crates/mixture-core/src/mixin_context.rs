//! Configuration of one mixin within a target's composition

use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{MixinError, Result};
use crate::types::{TypeRef, TypeUniverse};

/// How a mixin relates to its target
///
/// Affects override precedence when the composition is expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MixinKind {
    /// The target uses the mixin
    #[default]
    Used,
    /// The mixin extends the target
    Extending,
}

impl MixinKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MixinKind::Used => "Used",
            MixinKind::Extending => "Extending",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Used" => Some(MixinKind::Used),
            "Extending" => Some(MixinKind::Extending),
            _ => None,
        }
    }
}

/// Visibility of the members a mixin introduces into the composed type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IntroducedMemberVisibility {
    Public,
    #[default]
    Private,
}

impl IntroducedMemberVisibility {
    pub fn as_str(self) -> &'static str {
        match self {
            IntroducedMemberVisibility::Public => "Public",
            IntroducedMemberVisibility::Private => "Private",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Public" => Some(IntroducedMemberVisibility::Public),
            "Private" => Some(IntroducedMemberVisibility::Private),
            _ => None,
        }
    }
}

/// One mixin applied to a target type
///
/// Explicit dependencies keep their insertion order for display and serialization,
/// but equality and hashing treat them as a set.
#[derive(Debug, Clone)]
pub struct MixinContext {
    mixin_type: TypeRef,
    kind: MixinKind,
    introduced_member_visibility: IntroducedMemberVisibility,
    explicit_dependencies: Vec<TypeRef>,
}

impl MixinContext {
    pub fn new(
        mixin_type: TypeRef,
        kind: MixinKind,
        introduced_member_visibility: IntroducedMemberVisibility,
        explicit_dependencies: impl IntoIterator<Item = TypeRef>,
    ) -> Self {
        let mut dependencies: Vec<TypeRef> = Vec::new();
        for dependency in explicit_dependencies {
            if !dependencies.contains(&dependency) {
                dependencies.push(dependency);
            }
        }

        Self {
            mixin_type,
            kind,
            introduced_member_visibility,
            explicit_dependencies: dependencies,
        }
    }

    /// A used mixin with private introduced members and no explicit dependencies
    pub fn used(mixin_type: TypeRef) -> Self {
        Self::new(
            mixin_type,
            MixinKind::Used,
            IntroducedMemberVisibility::Private,
            [],
        )
    }

    /// An extending mixin with private introduced members and no explicit dependencies
    pub fn extending(mixin_type: TypeRef) -> Self {
        Self::new(
            mixin_type,
            MixinKind::Extending,
            IntroducedMemberVisibility::Private,
            [],
        )
    }

    pub fn mixin_type(&self) -> TypeRef {
        self.mixin_type
    }

    pub fn kind(&self) -> MixinKind {
        self.kind
    }

    pub fn introduced_member_visibility(&self) -> IntroducedMemberVisibility {
        self.introduced_member_visibility
    }

    pub fn explicit_dependencies(&self) -> &[TypeRef] {
        &self.explicit_dependencies
    }

    /// Every type handle this context mentions
    pub fn referenced_types(&self) -> impl Iterator<Item = TypeRef> + '_ {
        std::iter::once(self.mixin_type).chain(self.explicit_dependencies.iter().copied())
    }

    /// e.g. `Mixin LoggingMixin (Used, Public), dependencies: ILogger`
    pub fn describe(&self, universe: &TypeUniverse) -> String {
        let mut text = format!(
            "Mixin {} ({}, {})",
            universe.display_name(self.mixin_type),
            self.kind.as_str(),
            self.introduced_member_visibility.as_str()
        );
        if !self.explicit_dependencies.is_empty() {
            let names: Vec<String> = self
                .explicit_dependencies
                .iter()
                .map(|&d| universe.display_name(d))
                .collect();
            text.push_str(", dependencies: ");
            text.push_str(&names.join(", "));
        }
        text
    }
}

impl PartialEq for MixinContext {
    fn eq(&self, other: &Self) -> bool {
        self.mixin_type == other.mixin_type
            && self.kind == other.kind
            && self.introduced_member_visibility == other.introduced_member_visibility
            && self.explicit_dependencies.len() == other.explicit_dependencies.len()
            && self
                .explicit_dependencies
                .iter()
                .all(|d| other.explicit_dependencies.contains(d))
    }
}

impl Eq for MixinContext {}

impl Hash for MixinContext {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.mixin_type.hash(state);
        self.kind.hash(state);
        self.introduced_member_visibility.hash(state);
        // Sorted so the hash does not depend on insertion order
        let mut dependencies = self.explicit_dependencies.clone();
        dependencies.sort_unstable();
        dependencies.hash(state);
    }
}

/// The mixins of one class context, keyed by mixin type
#[derive(Debug, Clone, Default)]
pub struct MixinContextCollection {
    mixins: IndexMap<TypeRef, MixinContext>,
}

impl MixinContextCollection {
    pub fn new(mixins: impl IntoIterator<Item = MixinContext>) -> Result<Self> {
        let mut collection = IndexMap::new();
        for mixin in mixins {
            let mixin_type = mixin.mixin_type();
            if collection.insert(mixin_type, mixin).is_some() {
                return Err(MixinError::DuplicateMixin { mixin: mixin_type });
            }
        }
        Ok(Self { mixins: collection })
    }

    pub(crate) fn from_map(mixins: IndexMap<TypeRef, MixinContext>) -> Self {
        Self { mixins }
    }

    pub fn len(&self) -> usize {
        self.mixins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mixins.is_empty()
    }

    pub fn get(&self, mixin_type: TypeRef) -> Option<&MixinContext> {
        self.mixins.get(&mixin_type)
    }

    pub fn contains_key(&self, mixin_type: TypeRef) -> bool {
        self.mixins.contains_key(&mixin_type)
    }

    /// Whether any configured mixin can be used as a `ty`
    pub fn contains_assignable_mixin(&self, universe: &TypeUniverse, ty: TypeRef) -> bool {
        self.mixins
            .keys()
            .any(|&mixin_type| universe.is_assignable_from(ty, mixin_type))
    }

    /// Mixins in configuration order
    pub fn iter(&self) -> impl Iterator<Item = &MixinContext> {
        self.mixins.values()
    }
}

impl PartialEq for MixinContextCollection {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .mixins
                .iter()
                .all(|(ty, mixin)| other.get(*ty) == Some(mixin))
    }
}

impl Eq for MixinContextCollection {}

impl<'a> IntoIterator for &'a MixinContextCollection {
    type Item = &'a MixinContext;
    type IntoIter = indexmap::map::Values<'a, TypeRef, MixinContext>;

    fn into_iter(self) -> Self::IntoIter {
        self.mixins.values()
    }
}
