//! Property tests for value semantics and both encodings

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use mixture_core::serialization::flat;
use mixture_core::serialization::named::Record;
use mixture_core::serialization::{
    NamedClassContextDeserializer, NamedClassContextSerializer, NamedMixinContextDeserializer,
    NamedMixinContextSerializer,
};
use mixture_core::{
    ClassContext, IntroducedMemberVisibility, MixinContext, MixinKind, TypeDescriptor, TypeRef,
    TypeUniverse,
};
use proptest::prelude::*;

const TYPES: usize = 12;

fn universe() -> (TypeUniverse, Vec<TypeRef>) {
    let mut b = TypeUniverse::builder();
    let types = (0..TYPES)
        .map(|i| b.add(TypeDescriptor::class(format!("T{}", i))).unwrap())
        .collect();
    (b.build(), types)
}

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn kind() -> impl Strategy<Value = MixinKind> {
    prop_oneof![Just(MixinKind::Used), Just(MixinKind::Extending)]
}

fn visibility() -> impl Strategy<Value = IntroducedMemberVisibility> {
    prop_oneof![
        Just(IntroducedMemberVisibility::Public),
        Just(IntroducedMemberVisibility::Private)
    ]
}

/// (mixin index, kind, visibility, dependency indices)
fn mixin_parts() -> impl Strategy<Value = MixinParts> {
    (
        0..TYPES,
        kind(),
        visibility(),
        prop::collection::vec(0..TYPES, 0..6),
    )
}

type MixinParts = (usize, MixinKind, IntroducedMemberVisibility, Vec<usize>);

/// A class context over `types`, keeping the first application of each mixin
fn class_context(
    types: &[TypeRef],
    target: usize,
    mixins: Vec<MixinParts>,
    interfaces: Vec<usize>,
) -> ClassContext {
    let mut seen = Vec::new();
    let mixins: Vec<MixinContext> = mixins
        .into_iter()
        .filter(|(mixin, ..)| {
            let fresh = !seen.contains(mixin);
            seen.push(*mixin);
            fresh
        })
        .map(|(mixin, kind, visibility, deps)| {
            MixinContext::new(types[mixin], kind, visibility, deps.into_iter().map(|i| types[i]))
        })
        .collect();
    ClassContext::new(types[target], mixins, interfaces.into_iter().map(|i| types[i])).unwrap()
}

proptest! {
    #[test]
    fn prop_dependency_order_does_not_affect_equality(
        (mixin, kind, visibility, deps) in mixin_parts(),
        seed in any::<u64>(),
    ) {
        let (_, types) = universe();
        let forward: Vec<TypeRef> = deps.iter().map(|&i| types[i]).collect();
        let mut shuffled = forward.clone();
        // Deterministic rotation plus reversal stands in for a shuffle
        if !shuffled.is_empty() {
            let len = shuffled.len();
            shuffled.rotate_left((seed as usize) % len);
        }
        shuffled.reverse();

        let a = MixinContext::new(types[mixin], kind, visibility, forward);
        let b = MixinContext::new(types[mixin], kind, visibility, shuffled);
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn prop_flat_round_trip(
        target in 0..TYPES,
        mixins in prop::collection::vec(mixin_parts(), 0..5),
        interfaces in prop::collection::vec(0..TYPES, 0..4),
    ) {
        let (universe, types) = universe();
        let context = class_context(&types, target, mixins, interfaces);

        let encoded = flat::serialize_class_context(&universe, &context).unwrap();
        prop_assert_eq!(encoded.len(), flat::CLASS_CONTEXT_SLOTS);
        let decoded = flat::deserialize_class_context(&universe, &encoded).unwrap();
        prop_assert_eq!(decoded, context);
    }

    #[test]
    fn prop_named_mixin_round_trip((mixin, kind, visibility, deps) in mixin_parts()) {
        let (universe, types) = universe();
        let context = MixinContext::new(
            types[mixin],
            kind,
            visibility,
            deps.into_iter().map(|i| types[i]),
        );

        let mut record = Record::new();
        let mut serializer = NamedMixinContextSerializer::new(&universe, &mut record, "m");
        context.serialize(&mut serializer).unwrap();
        prop_assert_eq!(record.len(), 4);
        let deserializer = NamedMixinContextDeserializer::new(&universe, &record, "m");
        let decoded = MixinContext::deserialize(&deserializer).unwrap();
        prop_assert_eq!(decoded, context);
    }

    #[test]
    fn prop_named_class_round_trip(
        target in 0..TYPES,
        mixins in prop::collection::vec(mixin_parts(), 0..5),
        interfaces in prop::collection::vec(0..TYPES, 0..4),
    ) {
        let (universe, types) = universe();
        let context = class_context(&types, target, mixins, interfaces);

        let mut record = Record::new();
        let mut serializer = NamedClassContextSerializer::new(&universe, &mut record, "ctx");
        context.serialize(&mut serializer).unwrap();
        let deserializer = NamedClassContextDeserializer::new(&universe, &record, "ctx");
        let decoded = ClassContext::deserialize(&deserializer).unwrap();
        prop_assert_eq!(decoded, context);
    }
}
