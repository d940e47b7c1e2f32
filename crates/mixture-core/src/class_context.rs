//! Mixin configuration of a single target type

use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use tracing::{trace, warn};

use crate::config::MergePolicy;
use crate::error::{MixinError, Result};
use crate::mixin_context::{MixinContext, MixinContextCollection};
use crate::types::{TypeRef, TypeUniverse};

/// The declarative mixin composition for one target type
///
/// Immutable. Complete interfaces are compared as a set.
#[derive(Debug, Clone)]
pub struct ClassContext {
    class_type: TypeRef,
    mixins: MixinContextCollection,
    complete_interfaces: Vec<TypeRef>,
}

/// A mixin picked up while merging, with where it came from
struct Contribution {
    mixin: MixinContext,
    source: TypeRef,
    own: bool,
}

impl ClassContext {
    pub fn new(
        class_type: TypeRef,
        mixins: impl IntoIterator<Item = MixinContext>,
        complete_interfaces: impl IntoIterator<Item = TypeRef>,
    ) -> Result<Self> {
        Ok(Self {
            class_type,
            mixins: MixinContextCollection::new(mixins)?,
            complete_interfaces: dedup(complete_interfaces),
        })
    }

    /// A context with neither mixins nor complete interfaces
    pub fn empty(class_type: TypeRef) -> Self {
        Self {
            class_type,
            mixins: MixinContextCollection::default(),
            complete_interfaces: Vec::new(),
        }
    }

    pub fn class_type(&self) -> TypeRef {
        self.class_type
    }

    pub fn mixins(&self) -> &MixinContextCollection {
        &self.mixins
    }

    pub fn complete_interfaces(&self) -> &[TypeRef] {
        &self.complete_interfaces
    }

    pub fn get_mixin(&self, mixin_type: TypeRef) -> Option<&MixinContext> {
        self.mixins.get(mixin_type)
    }

    pub fn contains_mixin(&self, mixin_type: TypeRef) -> bool {
        self.mixins.contains_key(mixin_type)
    }

    /// Same mixins and complete interfaces, configured for `class_type`
    pub fn clone_for_specific_type(&self, class_type: TypeRef) -> Self {
        Self {
            class_type,
            mixins: self.mixins.clone(),
            complete_interfaces: self.complete_interfaces.clone(),
        }
    }

    /// Merge the configurations of `ancestors` into this context
    ///
    /// The result targets this context's class type. Mixins configured on this
    /// context take precedence over inherited ones; conflicts between ancestors are
    /// settled by `policy`. Complete interfaces are unioned in first-seen order.
    pub fn inherit_from<'a>(
        &self,
        ancestors: impl IntoIterator<Item = &'a ClassContext>,
        policy: MergePolicy,
    ) -> Result<Self> {
        let mut merged: IndexMap<TypeRef, Contribution> = self
            .mixins
            .iter()
            .map(|mixin| {
                (
                    mixin.mixin_type(),
                    Contribution {
                        mixin: mixin.clone(),
                        source: self.class_type,
                        own: true,
                    },
                )
            })
            .collect();
        let mut interfaces = self.complete_interfaces.clone();

        for ancestor in ancestors {
            trace!(
                target_type = ?self.class_type,
                ancestor = ?ancestor.class_type,
                "Merging ancestor configuration"
            );
            for mixin in ancestor.mixins() {
                let Some(existing) = merged.get_mut(&mixin.mixin_type()) else {
                    merged.insert(
                        mixin.mixin_type(),
                        Contribution {
                            mixin: mixin.clone(),
                            source: ancestor.class_type,
                            own: false,
                        },
                    );
                    continue;
                };

                if existing.own || existing.mixin == *mixin {
                    continue;
                }

                match policy {
                    MergePolicy::Error => {
                        return Err(MixinError::ConflictingMixins {
                            target: self.class_type,
                            mixin: mixin.mixin_type(),
                            first: existing.source,
                            second: ancestor.class_type,
                        });
                    }
                    MergePolicy::FirstWins => {
                        warn!(
                            target_type = ?self.class_type,
                            mixin = ?mixin.mixin_type(),
                            kept = ?existing.source,
                            dropped = ?ancestor.class_type,
                            "Conflicting inherited mixin configuration, keeping the first"
                        );
                    }
                    MergePolicy::LastWins => {
                        warn!(
                            target_type = ?self.class_type,
                            mixin = ?mixin.mixin_type(),
                            kept = ?ancestor.class_type,
                            dropped = ?existing.source,
                            "Conflicting inherited mixin configuration, keeping the last"
                        );
                        existing.mixin = mixin.clone();
                        existing.source = ancestor.class_type;
                    }
                }
            }

            for &interface in ancestor.complete_interfaces() {
                if !interfaces.contains(&interface) {
                    interfaces.push(interface);
                }
            }
        }

        let mixins = merged
            .into_iter()
            .map(|(ty, contribution)| (ty, contribution.mixin))
            .collect();

        Ok(Self {
            class_type: self.class_type,
            mixins: MixinContextCollection::from_map(mixins),
            complete_interfaces: interfaces,
        })
    }

    /// Every type handle this context mentions
    pub fn referenced_types(&self) -> impl Iterator<Item = TypeRef> + '_ {
        std::iter::once(self.class_type)
            .chain(self.mixins.iter().flat_map(|mixin| mixin.referenced_types()))
            .chain(self.complete_interfaces.iter().copied())
    }

    /// e.g. `ClassContext for Target: 2 mixins, 1 complete interface`
    pub fn describe(&self, universe: &TypeUniverse) -> String {
        format!(
            "ClassContext for {}: {} mixin{}, {} complete interface{}",
            universe.display_name(self.class_type),
            self.mixins.len(),
            if self.mixins.len() == 1 { "" } else { "s" },
            self.complete_interfaces.len(),
            if self.complete_interfaces.len() == 1 { "" } else { "s" },
        )
    }
}

fn dedup(types: impl IntoIterator<Item = TypeRef>) -> Vec<TypeRef> {
    let mut result = Vec::new();
    for ty in types {
        if !result.contains(&ty) {
            result.push(ty);
        }
    }
    result
}

impl PartialEq for ClassContext {
    fn eq(&self, other: &Self) -> bool {
        self.class_type == other.class_type
            && self.mixins == other.mixins
            && self.complete_interfaces.len() == other.complete_interfaces.len()
            && self
                .complete_interfaces
                .iter()
                .all(|i| other.complete_interfaces.contains(i))
    }
}

impl Eq for ClassContext {}

impl Hash for ClassContext {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.class_type.hash(state);
        self.mixins.len().hash(state);
        self.complete_interfaces.len().hash(state);
    }
}
