//! Inheritance of mixin configuration across type hierarchies
//!
//! A type without an exact configuration inherits from, in this order:
//!
//! 1. its generic type definition, when it is a closed generic instantiation
//! 2. its declared base type
//! 3. its declared interfaces, in declaration order
//!
//! Ancestors are resolved recursively, so configuration flows down whole hierarchies.
//! The collected ancestor configurations are then combined: none yields nothing, one is
//! retargeted as is, several are merged with [`ClassContext::inherit_from`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::class_context::ClassContext;
use crate::config::MergePolicy;
use crate::error::{MixinError, Result};
use crate::types::{TypeRef, TypeUniverse};

/// The ancestors `ty` inherits configuration from, in precedence order
pub fn types_to_inherit_from(universe: &TypeUniverse, ty: TypeRef) -> Vec<TypeRef> {
    let mut ancestors = Vec::new();
    if universe.is_closed_generic(ty) {
        ancestors.extend(universe.generic_type_definition_of(ty));
    }
    ancestors.extend(universe.base_type(ty));
    ancestors.extend_from_slice(universe.interfaces(ty));
    ancestors
}

/// Combine the configurations inherited by `ty`
pub fn combine(
    ty: TypeRef,
    inherited: &[Arc<ClassContext>],
    policy: MergePolicy,
) -> Result<Option<ClassContext>> {
    match inherited {
        [] => Ok(None),
        [single] => Ok(Some(single.clone_for_specific_type(ty))),
        many => ClassContext::empty(ty)
            .inherit_from(many.iter().map(Arc::as_ref), policy)
            .map(Some),
    }
}

/// A resolved configuration together with the frames its resolution entered
///
/// `frontier[k]` is the first type entered at relative depth `k` in resolution order,
/// so `frontier[0]` is the resolved type itself. Exact entries enter no frames and have
/// an empty frontier. Replaying a cached result against the depth limit through the
/// frontier reports the same error a fresh resolution would.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub context: Option<Arc<ClassContext>>,
    frontier: Arc<[TypeRef]>,
}

impl Default for Resolved {
    fn default() -> Self {
        Self {
            context: None,
            frontier: Arc::from(Vec::new()),
        }
    }
}

impl Resolved {
    pub fn exact(context: Arc<ClassContext>) -> Self {
        Self {
            context: Some(context),
            frontier: Arc::from(Vec::new()),
        }
    }

    /// Frames a fresh resolution of this result would enter
    pub fn depth(&self) -> usize {
        self.frontier.len()
    }
}

/// Collects the frontier of a type while its ancestors resolve
#[derive(Debug)]
pub struct FrontierBuilder {
    frontier: Vec<TypeRef>,
}

impl FrontierBuilder {
    pub fn new(ty: TypeRef) -> Self {
        Self { frontier: vec![ty] }
    }

    /// Fold in an ancestor's result; earlier ancestors win at every depth
    pub fn add(&mut self, ancestor: &Resolved) {
        for (k, &ty) in ancestor.frontier.iter().enumerate() {
            if k + 1 == self.frontier.len() {
                self.frontier.push(ty);
            }
        }
    }

    pub fn finish(self, context: Option<Arc<ClassContext>>) -> Resolved {
        Resolved {
            context,
            frontier: Arc::from(self.frontier),
        }
    }
}

/// Tracks one top-level resolution: the current ancestor path and per-call results
#[derive(Debug)]
pub struct ResolutionScope {
    path: Vec<TypeRef>,
    max_depth: usize,
    resolved: HashMap<TypeRef, Resolved>,
}

impl ResolutionScope {
    pub fn new(max_depth: usize) -> Self {
        Self {
            path: Vec::new(),
            max_depth,
            resolved: HashMap::new(),
        }
    }

    pub fn enter(&mut self, ty: TypeRef) -> Result<()> {
        if self.path.contains(&ty) {
            return Err(MixinError::InheritanceCycle { ty });
        }
        if self.path.len() >= self.max_depth {
            return Err(MixinError::InheritanceTooDeep {
                ty,
                max_depth: self.max_depth,
            });
        }
        self.path.push(ty);
        Ok(())
    }

    pub fn leave(&mut self) {
        self.path.pop();
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Check a previously resolved result against the remaining depth budget
    pub fn admit(&self, resolved: &Resolved) -> Result<()> {
        let depth = self.path.len();
        if depth + resolved.depth() > self.max_depth {
            return Err(MixinError::InheritanceTooDeep {
                ty: resolved.frontier[self.max_depth.saturating_sub(depth)],
                max_depth: self.max_depth,
            });
        }
        Ok(())
    }

    pub fn lookup(&self, ty: TypeRef) -> Option<&Resolved> {
        self.resolved.get(&ty)
    }

    pub fn record(&mut self, ty: TypeRef, resolved: Resolved) {
        self.resolved.insert(ty, resolved);
    }
}

/// Resolves inherited configuration against caller-supplied lookups
pub struct InheritanceResolver<'a> {
    universe: &'a TypeUniverse,
    policy: MergePolicy,
}

impl<'a> InheritanceResolver<'a> {
    pub fn new(universe: &'a TypeUniverse, policy: MergePolicy) -> Self {
        Self { universe, policy }
    }

    /// Resolve the configuration for `ty`
    ///
    /// `exact` answers whether `ty` itself is configured; `inheritance_aware` is
    /// called for each ancestor and is expected to recurse back into resolution.
    pub fn resolve<E, I>(
        &self,
        ty: TypeRef,
        exact: E,
        mut inheritance_aware: I,
    ) -> Result<Option<Arc<ClassContext>>>
    where
        E: Fn(TypeRef) -> Option<Arc<ClassContext>>,
        I: FnMut(TypeRef) -> Result<Option<Arc<ClassContext>>>,
    {
        if let Some(context) = exact(ty) {
            return Ok(Some(context));
        }

        let mut inherited = Vec::new();
        for ancestor in types_to_inherit_from(self.universe, ty) {
            let context = inheritance_aware(ancestor)?;
            trace!(
                ty = ?ty,
                ancestor = ?ancestor,
                configured = context.is_some(),
                "Visited ancestor"
            );
            inherited.extend(context);
        }

        Ok(combine(ty, &inherited, self.policy)?.map(Arc::new))
    }
}
