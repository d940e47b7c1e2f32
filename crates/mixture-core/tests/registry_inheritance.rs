//! Integration tests for inheritance-aware registry lookups

use std::sync::Arc;
use std::thread;

use mixture_core::{
    ClassContext, ClassContextCollection, IntroducedMemberVisibility, MergePolicy, MixinContext,
    MixinError, MixinKind, RegistryConfig, TypeDescriptor, TypeRef, TypeUniverse,
};
use pretty_assertions::assert_eq;

/// `Object <- Base <- Derived`, `Derived: IService`, plus a generic `Repository`1`
struct Hierarchy {
    universe: Arc<TypeUniverse>,
    object: TypeRef,
    base: TypeRef,
    derived: TypeRef,
    service: TypeRef,
    open_repo: TypeRef,
    int_repo: TypeRef,
    tracking: TypeRef,
    caching: TypeRef,
    auditing: TypeRef,
}

fn hierarchy() -> Result<Hierarchy, Box<dyn std::error::Error>> {
    let mut b = TypeUniverse::builder();
    let object = b.add(TypeDescriptor::class("System.Object"))?;
    let int = b.add(TypeDescriptor::class("System.Int32").with_base(object))?;
    let service = b.add(TypeDescriptor::interface("App.IService"))?;
    let base = b.add(TypeDescriptor::class("App.Base").with_base(object))?;
    let derived = b.add(
        TypeDescriptor::class("App.Derived")
            .with_base(base)
            .implementing([service]),
    )?;
    let open_repo = b.add(TypeDescriptor::class("App.Repository`1").with_base(object).generic(1))?;
    let int_repo = b.add(
        TypeDescriptor::class("App.Repository<int>")
            .with_base(object)
            .instantiation_of(open_repo, [int]),
    )?;
    let tracking = b.add(TypeDescriptor::class("App.TrackingMixin"))?;
    let caching = b.add(TypeDescriptor::class("App.CachingMixin"))?;
    let auditing = b.add(TypeDescriptor::class("App.AuditingMixin"))?;

    Ok(Hierarchy {
        universe: Arc::new(b.build()),
        object,
        base,
        derived,
        service,
        open_repo,
        int_repo,
        tracking,
        caching,
        auditing,
    })
}

fn registry(
    h: &Hierarchy,
    contexts: Vec<ClassContext>,
) -> Result<ClassContextCollection, MixinError> {
    ClassContextCollection::from_contexts(h.universe.clone(), RegistryConfig::default(), contexts)
}

#[test]
fn test_unconfigured_types_are_absent() -> Result<(), Box<dyn std::error::Error>> {
    let h = hierarchy()?;
    let registry = registry(&h, vec![])?;

    for (ty, _) in h.universe.iter() {
        assert_eq!(registry.get_exact(ty)?, None);
        assert!(!registry.contains_exact(ty)?);
        assert_eq!(registry.get_with_inheritance(ty)?, None);
    }
    Ok(())
}

#[test]
fn test_exact_entry_always_wins() -> Result<(), Box<dyn std::error::Error>> {
    let h = hierarchy()?;
    let own = ClassContext::new(h.derived, [MixinContext::used(h.caching)], [])?;
    let registry = registry(
        &h,
        vec![
            ClassContext::new(h.base, [MixinContext::used(h.tracking)], [])?,
            own.clone(),
        ],
    )?;

    let resolved = registry.get_with_inheritance(h.derived)?.ok_or("missing")?;
    assert_eq!(*resolved, own);
    assert_eq!(registry.get_exact(h.derived)?, Some(&own));
    Ok(())
}

#[test]
fn test_single_ancestor_is_retargeted() -> Result<(), Box<dyn std::error::Error>> {
    let h = hierarchy()?;
    let base = ClassContext::new(h.base, [MixinContext::used(h.tracking)], [h.service])?;
    let registry = registry(&h, vec![base.clone()])?;

    let resolved = registry.get_with_inheritance(h.derived)?.ok_or("missing")?;
    assert_eq!(*resolved, base.clone_for_specific_type(h.derived));
    assert!(registry.contains_with_inheritance(h.derived)?);
    assert!(!registry.contains_exact(h.derived)?);
    Ok(())
}

#[test]
fn test_configuration_flows_through_whole_hierarchy() -> Result<(), Box<dyn std::error::Error>> {
    let h = hierarchy()?;
    let registry = registry(
        &h,
        vec![ClassContext::new(h.object, [MixinContext::used(h.tracking)], [])?],
    )?;

    let resolved = registry.get_with_inheritance(h.derived)?.ok_or("missing")?;
    assert_eq!(resolved.class_type(), h.derived);
    assert!(resolved.contains_mixin(h.tracking));
    Ok(())
}

#[test]
fn test_disjoint_ancestors_are_unioned() -> Result<(), Box<dyn std::error::Error>> {
    let h = hierarchy()?;
    let registry = registry(
        &h,
        vec![
            ClassContext::new(h.base, [MixinContext::used(h.tracking)], [])?,
            ClassContext::new(h.service, [MixinContext::extending(h.caching)], [h.service])?,
        ],
    )?;

    let resolved = registry.get_with_inheritance(h.derived)?.ok_or("missing")?;
    let expected = ClassContext::new(
        h.derived,
        [MixinContext::used(h.tracking), MixinContext::extending(h.caching)],
        [h.service],
    )?;
    assert_eq!(*resolved, expected);
    Ok(())
}

#[test]
fn test_closed_generic_inherits_from_definition_first() -> Result<(), Box<dyn std::error::Error>> {
    let h = hierarchy()?;
    let audit = MixinContext::new(
        h.auditing,
        MixinKind::Extending,
        IntroducedMemberVisibility::Public,
        [],
    );
    let registry = registry(
        &h,
        vec![
            ClassContext::new(h.open_repo, [audit.clone()], [])?,
            ClassContext::new(h.object, [MixinContext::used(h.tracking)], [])?,
        ],
    )?;

    let resolved = registry.get_with_inheritance(h.int_repo)?.ok_or("missing")?;
    let order: Vec<TypeRef> = resolved.mixins().iter().map(MixinContext::mixin_type).collect();
    assert_eq!(order, vec![h.auditing, h.tracking]);
    assert_eq!(resolved.get_mixin(h.auditing), Some(&audit));
    Ok(())
}

#[test]
fn test_conflicting_ancestors_follow_policy() -> Result<(), Box<dyn std::error::Error>> {
    let h = hierarchy()?;
    let from_base = ClassContext::new(h.base, [MixinContext::used(h.tracking)], [])?;
    let from_service = ClassContext::new(h.service, [MixinContext::extending(h.tracking)], [])?;
    let contexts = vec![from_base, from_service];

    let strict = registry(&h, contexts.clone())?;
    assert_eq!(
        strict.get_with_inheritance(h.derived).unwrap_err(),
        MixinError::ConflictingMixins {
            target: h.derived,
            mixin: h.tracking,
            first: h.base,
            second: h.service,
        }
    );

    let config = RegistryConfig {
        merge_policy: MergePolicy::LastWins,
        ..RegistryConfig::default()
    };
    let lenient = ClassContextCollection::from_contexts(h.universe.clone(), config, contexts)?;
    let resolved = lenient.get_with_inheritance(h.derived)?.ok_or("missing")?;
    assert_eq!(resolved.get_mixin(h.tracking), Some(&MixinContext::extending(h.tracking)));
    Ok(())
}

#[test]
fn test_cyclic_hierarchy_is_reported() -> Result<(), Box<dyn std::error::Error>> {
    // A malformed model where two specs name each other as base
    let specs: Vec<mixture_core::TypeSpec> = serde_json::from_value(serde_json::json!([
        { "name": "A", "base": "B" },
        { "name": "B", "base": "A" },
    ]))?;
    let universe = Arc::new(TypeUniverse::from_specs(&specs)?);
    let a = universe.resolve("A").ok_or("missing A")?;
    let registry = ClassContextCollection::new(universe, RegistryConfig::default());

    assert!(matches!(
        registry.get_with_inheritance(a),
        Err(MixinError::InheritanceCycle { .. })
    ));
    Ok(())
}

/// `Object <- A <- B <- C <- D` with a configuration on `A`
fn deep_chain(
    memoize_inheritance: bool,
) -> Result<(ClassContextCollection, Vec<TypeRef>), Box<dyn std::error::Error>> {
    let mut b = TypeUniverse::builder();
    let object = b.add(TypeDescriptor::class("Object"))?;
    let a = b.add(TypeDescriptor::class("A").with_base(object))?;
    let bb = b.add(TypeDescriptor::class("B").with_base(a))?;
    let c = b.add(TypeDescriptor::class("C").with_base(bb))?;
    let d = b.add(TypeDescriptor::class("D").with_base(c))?;
    let mixin = b.add(TypeDescriptor::class("Mixin"))?;
    let config = RegistryConfig {
        memoize_inheritance,
        max_inheritance_depth: 2,
        ..RegistryConfig::default()
    };
    let registry = ClassContextCollection::from_contexts(
        Arc::new(b.build()),
        config,
        vec![ClassContext::new(a, [MixinContext::used(mixin)], [])?],
    )?;
    Ok((registry, vec![bb, c, d]))
}

#[test]
fn test_depth_limit_does_not_depend_on_earlier_lookups() -> Result<(), Box<dyn std::error::Error>> {
    let too_deep = |ty: TypeRef| -> Result<bool, MixinError> {
        Err(MixinError::InheritanceTooDeep { ty, max_depth: 2 })
    };

    let (cold, cold_types) = deep_chain(true)?;
    assert_eq!(cold.contains_with_inheritance(cold_types[2]), too_deep(cold_types[0]));

    let (warm, types) = deep_chain(true)?;
    let (uncached, uncached_types) = deep_chain(false)?;
    let mut warm_results = Vec::new();
    let mut uncached_results = Vec::new();
    for i in 0..types.len() {
        warm_results.push(warm.contains_with_inheritance(types[i]).is_ok());
        uncached_results.push(uncached.contains_with_inheritance(uncached_types[i]).is_ok());
    }
    assert_eq!(warm_results, vec![true, true, false]);
    assert_eq!(warm_results, uncached_results);

    // B and C are cached now; D must still run out of budget at B
    assert_eq!(warm.contains_with_inheritance(types[1]), Ok(true));
    assert_eq!(warm.contains_with_inheritance(types[2]), too_deep(types[0]));
    assert_eq!(
        uncached.contains_with_inheritance(uncached_types[2]),
        too_deep(uncached_types[0])
    );
    Ok(())
}

#[test]
fn test_concurrent_readers_observe_equal_values() -> Result<(), Box<dyn std::error::Error>> {
    let h = hierarchy()?;
    let registry = Arc::new(registry(
        &h,
        vec![
            ClassContext::new(h.base, [MixinContext::used(h.tracking)], [])?,
            ClassContext::new(h.service, [MixinContext::used(h.caching)], [])?,
        ],
    )?);
    let derived = h.derived;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                (0..50)
                    .map(|_| registry.get_with_inheritance(derived))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let expected = registry.get_with_inheritance(derived)?.ok_or("missing")?;
    for handle in handles {
        for result in handle.join().map_err(|_| "reader panicked")? {
            assert_eq!(result?.as_deref(), Some(&*expected));
        }
    }
    Ok(())
}

#[test]
fn test_assignable_mixin_lookup_through_generic_interfaces(
) -> Result<(), Box<dyn std::error::Error>> {
    let mut b = TypeUniverse::builder();
    let object = b.add(TypeDescriptor::class("System.Object"))?;
    let int = b.add(TypeDescriptor::class("System.Int32").with_base(object))?;
    let string = b.add(TypeDescriptor::class("System.String").with_base(object).sealed())?;
    let open_collection = b.add(TypeDescriptor::interface("ICollection`1").generic(1))?;
    let int_collection = b.add(
        TypeDescriptor::interface("ICollection<int>").instantiation_of(open_collection, [int]),
    )?;
    let string_collection = b.add(
        TypeDescriptor::interface("ICollection<string>")
            .instantiation_of(open_collection, [string]),
    )?;
    let open_list = b.add(
        TypeDescriptor::class("List`1")
            .with_base(object)
            .implementing([open_collection])
            .generic(1),
    )?;
    let int_list = b.add(
        TypeDescriptor::class("List<int>")
            .with_base(object)
            .implementing([int_collection])
            .instantiation_of(open_list, [int]),
    )?;
    let derived_mixin = b.add(TypeDescriptor::class("DerivedMixinType").with_base(object))?;
    let target = b.add(TypeDescriptor::class("Target"))?;
    let universe = b.build();

    let context = ClassContext::new(
        target,
        [object, string, int_list, derived_mixin]
            .into_iter()
            .map(MixinContext::used),
        [],
    )?;

    assert!(context.mixins().contains_assignable_mixin(&universe, int_collection));
    assert!(!context.mixins().contains_assignable_mixin(&universe, string_collection));
    Ok(())
}
