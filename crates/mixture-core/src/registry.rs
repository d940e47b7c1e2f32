//! Registry of class contexts keyed by target type
//!
//! A [`ClassContextCollection`] is built once from the configuration builder's output
//! and is read-only afterwards. Lookups either hit an exact entry or synthesize one via
//! [`crate::inheritance`]. Reconfiguration means building a new collection and swapping
//! it into a [`RegistryHandle`].

use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::class_context::ClassContext;
use crate::config::RegistryConfig;
use crate::error::{MixinError, Result};
use crate::inheritance::{FrontierBuilder, InheritanceResolver, ResolutionScope, Resolved};
use crate::types::{TypeRef, TypeUniverse};

#[derive(Debug)]
pub struct ClassContextCollection {
    universe: Arc<TypeUniverse>,
    config: RegistryConfig,
    contexts: IndexMap<TypeRef, Arc<ClassContext>>,
    /// Synthesized (non-exact) results, only filled with fully computed values
    inherited: DashMap<TypeRef, Resolved>,
}

impl ClassContextCollection {
    pub fn new(universe: Arc<TypeUniverse>, config: RegistryConfig) -> Self {
        Self {
            universe,
            config,
            contexts: IndexMap::new(),
            inherited: DashMap::new(),
        }
    }

    /// Build a registry from the configuration builder's class contexts
    ///
    /// Fails if a context mentions a type outside `universe` or if two contexts
    /// target the same type.
    pub fn from_contexts(
        universe: Arc<TypeUniverse>,
        config: RegistryConfig,
        contexts: impl IntoIterator<Item = ClassContext>,
    ) -> Result<Self> {
        let mut entries = IndexMap::new();
        for context in contexts {
            for ty in context.referenced_types() {
                universe.ensure_contains(ty, "context")?;
            }
            let target = context.class_type();
            if entries.insert(target, Arc::new(context)).is_some() {
                return Err(MixinError::DuplicateClassContext { target });
            }
        }

        debug!(
            contexts = entries.len(),
            merge_policy = ?config.merge_policy,
            memoize = config.memoize_inheritance,
            "Built class context registry"
        );

        Ok(Self {
            universe,
            config,
            contexts: entries,
            inherited: DashMap::new(),
        })
    }

    pub fn universe(&self) -> &Arc<TypeUniverse> {
        &self.universe
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Exact entries in the order they were supplied
    pub fn iter(&self) -> impl Iterator<Item = &ClassContext> {
        self.contexts.values().map(Arc::as_ref)
    }

    /// The entry stored for exactly `ty`
    pub fn get_exact(&self, ty: TypeRef) -> Result<Option<&ClassContext>> {
        self.universe.ensure_contains(ty, "type")?;
        Ok(self.contexts.get(&ty).map(Arc::as_ref))
    }

    pub fn contains_exact(&self, ty: TypeRef) -> Result<bool> {
        Ok(self.get_exact(ty)?.is_some())
    }

    /// The exact entry for `ty`, or one synthesized from its ancestors
    pub fn get_with_inheritance(&self, ty: TypeRef) -> Result<Option<Arc<ClassContext>>> {
        self.universe.ensure_contains(ty, "type")?;
        let mut scope = ResolutionScope::new(self.config.max_inheritance_depth);
        Ok(self.resolve_in_scope(ty, &mut scope)?.context)
    }

    pub fn contains_with_inheritance(&self, ty: TypeRef) -> Result<bool> {
        Ok(self.get_with_inheritance(ty)?.is_some())
    }

    /// Whether an exact entry for the context's type exists and equals it
    pub fn contains(&self, context: &ClassContext) -> Result<bool> {
        Ok(self.get_exact(context.class_type())? == Some(context))
    }

    /// A view that rejects mutation
    pub fn as_view(&self) -> ReadOnlyView<'_> {
        ReadOnlyView { registry: self }
    }

    fn resolve_in_scope(&self, ty: TypeRef, scope: &mut ResolutionScope) -> Result<Resolved> {
        if let Some(exact) = self.contexts.get(&ty) {
            return Ok(Resolved::exact(exact.clone()));
        }
        if let Some(resolved) = scope.lookup(ty) {
            scope.admit(resolved)?;
            return Ok(resolved.clone());
        }
        if self.config.memoize_inheritance {
            if let Some(cached) = self.inherited.get(&ty) {
                trace!(ty = ?ty, "Inherited configuration served from cache");
                scope.admit(cached.value())?;
                return Ok(cached.value().clone());
            }
        }

        scope.enter(ty)?;
        let resolver = InheritanceResolver::new(&self.universe, self.config.merge_policy);
        let mut frontier = FrontierBuilder::new(ty);
        let context = resolver.resolve(
            ty,
            |t| self.contexts.get(&t).cloned(),
            |ancestor| {
                let resolved = self.resolve_in_scope(ancestor, scope)?;
                frontier.add(&resolved);
                Ok(resolved.context)
            },
        );
        scope.leave();
        let resolved = frontier.finish(context?);

        if let Some(context) = &resolved.context {
            debug!(
                ty = ?ty,
                mixins = context.mixins().len(),
                depth = resolved.depth(),
                "Synthesized inherited configuration"
            );
        }

        scope.record(ty, resolved.clone());
        if self.config.memoize_inheritance {
            self.inherited.insert(ty, resolved.clone());
        }
        Ok(resolved)
    }
}

/// Read-only view over a registry's exact entries
///
/// The mutators exist for callers written against a mutable collection interface and
/// always fail with [`MixinError::UnsupportedOperation`].
#[derive(Debug, Clone, Copy)]
pub struct ReadOnlyView<'a> {
    registry: &'a ClassContextCollection,
}

impl<'a> ReadOnlyView<'a> {
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn get(&self, ty: TypeRef) -> Result<Option<&'a ClassContext>> {
        self.registry.get_exact(ty)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a ClassContext> {
        self.registry.iter()
    }

    pub fn insert(&self, _context: ClassContext) -> Result<()> {
        Err(MixinError::UnsupportedOperation { operation: "insert" })
    }

    pub fn remove(&self, _ty: TypeRef) -> Result<Option<ClassContext>> {
        Err(MixinError::UnsupportedOperation { operation: "remove" })
    }

    pub fn clear(&self) -> Result<()> {
        Err(MixinError::UnsupportedOperation { operation: "clear" })
    }
}

/// The composition root's handle on the current registry
///
/// Readers take cheap snapshots; `replace` publishes a new registry atomically.
#[derive(Debug)]
pub struct RegistryHandle {
    current: ArcSwap<ClassContextCollection>,
}

impl RegistryHandle {
    pub fn new(registry: ClassContextCollection) -> Self {
        Self {
            current: ArcSwap::from_pointee(registry),
        }
    }

    /// Snapshot of the registry as currently published
    pub fn load(&self) -> Arc<ClassContextCollection> {
        self.current.load_full()
    }

    /// Publish `registry`, returning the one it replaced
    pub fn replace(&self, registry: ClassContextCollection) -> Arc<ClassContextCollection> {
        debug!(contexts = registry.len(), "Publishing new class context registry");
        self.current.swap(Arc::new(registry))
    }
}
