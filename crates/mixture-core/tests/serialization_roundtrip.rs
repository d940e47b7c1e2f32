//! Both value objects survive both encodings, and encodings can be mixed in one record

use mixture_core::serialization::flat;
use mixture_core::serialization::named::Record;
use mixture_core::serialization::{
    NamedClassContextDeserializer, NamedClassContextSerializer, NamedMixinContextDeserializer,
    NamedMixinContextSerializer, SerializationError, SlotId,
};
use mixture_core::{
    ClassContext, IntroducedMemberVisibility, MixinContext, MixinKind, TypeDescriptor, TypeUniverse,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn sample() -> Result<(TypeUniverse, Vec<ClassContext>), Box<dyn std::error::Error>> {
    let mut b = TypeUniverse::builder();
    let object = b.add(TypeDescriptor::class("System.Object"))?;
    let disposable = b.add(TypeDescriptor::interface("System.IDisposable"))?;
    let comparable = b.add(TypeDescriptor::interface("System.IComparable"))?;
    let customer = b.add(TypeDescriptor::class("Crm.Customer").with_base(object))?;
    let supplier = b.add(TypeDescriptor::class("Crm.Supplier").with_base(object))?;
    let equality = b.add(TypeDescriptor::class("Mixins.EquatableMixin"))?;
    let disposal = b.add(TypeDescriptor::class("Mixins.DisposableMixin"))?;
    let universe = b.build();

    let contexts = vec![
        ClassContext::new(
            customer,
            [
                MixinContext::new(
                    equality,
                    MixinKind::Extending,
                    IntroducedMemberVisibility::Public,
                    [comparable, disposable],
                ),
                MixinContext::used(disposal),
            ],
            [disposable, comparable],
        )?,
        ClassContext::empty(supplier),
    ];
    Ok((universe, contexts))
}

#[test]
fn test_flat_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let (universe, contexts) = sample()?;
    for context in &contexts {
        let encoded = flat::serialize_class_context(&universe, context)?;
        let decoded = flat::deserialize_class_context(&universe, &encoded)?;
        assert_eq!(&decoded, context);
        // Dependency order is part of the encoding even though equality ignores it
        assert_eq!(
            flat::serialize_class_context(&universe, &decoded)?,
            encoded
        );
    }
    Ok(())
}

#[test]
fn test_named_round_trip_in_shared_record() -> Result<(), Box<dyn std::error::Error>> {
    let (universe, contexts) = sample()?;
    let mut record = Record::new();
    for (index, context) in contexts.iter().enumerate() {
        let prefix = format!("ctx{}", index);
        let mut serializer = NamedClassContextSerializer::new(&universe, &mut record, prefix);
        context.serialize(&mut serializer)?;
    }
    // Unrelated data living next to the contexts is left alone
    record.insert("Header.Version".to_string(), json!(3));

    for (index, context) in contexts.iter().enumerate() {
        let deserializer =
            NamedClassContextDeserializer::new(&universe, &record, format!("ctx{}", index));
        assert_eq!(&ClassContext::deserialize(&deserializer)?, context);
    }
    assert_eq!(
        record.get("ctx0.Mixins[0].ExplicitDependencies"),
        Some(&json!(["System.IComparable", "System.IDisposable"]))
    );
    Ok(())
}

#[test]
fn test_named_mixin_context_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let (universe, contexts) = sample()?;
    let mixins: Vec<&MixinContext> = contexts[0].mixins().iter().collect();
    let mut record = Record::new();
    for (index, mixin) in mixins.iter().enumerate() {
        let prefix = format!("Applied[{}]", index);
        mixin.serialize(&mut NamedMixinContextSerializer::new(&universe, &mut record, prefix))?;
    }

    assert_eq!(record.len(), 8);
    assert_eq!(record.get("Applied[0].MixinKind"), Some(&json!("Extending")));
    assert_eq!(record.get("Applied[1].ExplicitDependencies"), Some(&json!([])));
    for (index, mixin) in mixins.iter().enumerate() {
        let deserializer =
            NamedMixinContextDeserializer::new(&universe, &record, format!("Applied[{}]", index));
        assert_eq!(&MixinContext::deserialize(&deserializer)?, *mixin);
    }
    Ok(())
}

#[test]
fn test_encoded_names_resolve_against_another_universe() -> Result<(), Box<dyn std::error::Error>> {
    let (universe, contexts) = sample()?;
    let (other, other_contexts) = sample()?;

    let encoded = flat::serialize_class_context(&universe, &contexts[0])?;
    let decoded = flat::deserialize_class_context(&other, &encoded)?;
    assert_eq!(decoded, other_contexts[0]);
    assert_ne!(decoded, contexts[0]);
    Ok(())
}

#[test]
fn test_nested_mixin_errors_surface() -> Result<(), Box<dyn std::error::Error>> {
    let (universe, _) = sample()?;
    let encoded: Vec<Value> = vec![
        json!("Crm.Customer"),
        json!([["Mixins.EquatableMixin", "Used", "Private"]]),
        json!([]),
    ];
    assert_eq!(
        flat::deserialize_class_context(&universe, &encoded).unwrap_err(),
        SerializationError::Nested {
            slot: SlotId::Element { slot: 1, index: 0 },
            source: Box::new(SerializationError::Arity {
                expected: 4,
                actual: 3
            }),
        }
    );

    let mut record = Record::new();
    record.insert("c.ClassType".into(), json!("Crm.Customer"));
    record.insert("c.Mixins.Count".into(), json!(0));
    assert_eq!(
        ClassContext::deserialize(&NamedClassContextDeserializer::new(&universe, &record, "c"))
            .unwrap_err(),
        SerializationError::MissingSlot {
            slot: SlotId::Key("c.CompleteInterfaces".into())
        }
    );
    Ok(())
}
