//! Flat positional encoding
//!
//! | Value object | Slots |
//! |---|---|
//! | `MixinContext` | `[mixin type, mixin kind, introduced visibility, [dependency types]]` |
//! | `ClassContext` | `[class type, [mixin context arrays], [complete interface types]]` |

use serde_json::Value;

use super::{
    read_kind, read_type, read_types, read_visibility, type_name_value, type_names_value,
    value_kind, ClassContextDeserializer, ClassContextSerializer, MixinContextDeserializer,
    MixinContextSerializer, SerializationError, SerializationResult, SlotId, SlotKind,
};
use crate::class_context::ClassContext;
use crate::mixin_context::{IntroducedMemberVisibility, MixinContext, MixinKind};
use crate::types::{TypeRef, TypeUniverse};

pub const MIXIN_CONTEXT_SLOTS: usize = 4;
pub const CLASS_CONTEXT_SLOTS: usize = 3;

fn check_arity(values: &[Value], expected: usize) -> SerializationResult<()> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(SerializationError::Arity {
            expected,
            actual: values.len(),
        })
    }
}

pub struct FlatMixinContextSerializer<'u> {
    universe: &'u TypeUniverse,
    values: Vec<Value>,
}

impl<'u> FlatMixinContextSerializer<'u> {
    pub fn new(universe: &'u TypeUniverse) -> Self {
        Self {
            universe,
            values: vec![Value::Null; MIXIN_CONTEXT_SLOTS],
        }
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl MixinContextSerializer for FlatMixinContextSerializer<'_> {
    fn add_mixin_type(&mut self, mixin_type: TypeRef) -> SerializationResult<()> {
        self.values[0] = type_name_value(self.universe, mixin_type)?;
        Ok(())
    }

    fn add_mixin_kind(&mut self, kind: MixinKind) -> SerializationResult<()> {
        self.values[1] = Value::String(kind.as_str().to_string());
        Ok(())
    }

    fn add_introduced_member_visibility(
        &mut self,
        visibility: IntroducedMemberVisibility,
    ) -> SerializationResult<()> {
        self.values[2] = Value::String(visibility.as_str().to_string());
        Ok(())
    }

    fn add_explicit_dependencies(&mut self, dependencies: &[TypeRef]) -> SerializationResult<()> {
        self.values[3] = type_names_value(self.universe, dependencies)?;
        Ok(())
    }
}

pub struct FlatMixinContextDeserializer<'a> {
    universe: &'a TypeUniverse,
    values: &'a [Value],
}

impl<'a> FlatMixinContextDeserializer<'a> {
    /// Fails with [`SerializationError::Arity`] before any slot is read
    pub fn new(universe: &'a TypeUniverse, values: &'a [Value]) -> SerializationResult<Self> {
        check_arity(values, MIXIN_CONTEXT_SLOTS)?;
        Ok(Self { universe, values })
    }
}

impl MixinContextDeserializer for FlatMixinContextDeserializer<'_> {
    fn get_mixin_type(&self) -> SerializationResult<TypeRef> {
        read_type(self.universe, &self.values[0], SlotId::Index(0))
    }

    fn get_mixin_kind(&self) -> SerializationResult<MixinKind> {
        read_kind(&self.values[1], SlotId::Index(1))
    }

    fn get_introduced_member_visibility(&self) -> SerializationResult<IntroducedMemberVisibility> {
        read_visibility(&self.values[2], SlotId::Index(2))
    }

    fn get_explicit_dependencies(&self) -> SerializationResult<Vec<TypeRef>> {
        read_types(self.universe, &self.values[3], SlotId::Index(3))
    }
}

pub struct FlatClassContextSerializer<'u> {
    universe: &'u TypeUniverse,
    values: Vec<Value>,
}

impl<'u> FlatClassContextSerializer<'u> {
    pub fn new(universe: &'u TypeUniverse) -> Self {
        Self {
            universe,
            values: vec![Value::Null; CLASS_CONTEXT_SLOTS],
        }
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl ClassContextSerializer for FlatClassContextSerializer<'_> {
    fn add_class_type(&mut self, class_type: TypeRef) -> SerializationResult<()> {
        self.values[0] = type_name_value(self.universe, class_type)?;
        Ok(())
    }

    fn add_mixins(&mut self, mixins: &[&MixinContext]) -> SerializationResult<()> {
        let mut encoded = Vec::with_capacity(mixins.len());
        for mixin in mixins {
            let mut serializer = FlatMixinContextSerializer::new(self.universe);
            mixin.serialize(&mut serializer)?;
            encoded.push(Value::Array(serializer.into_values()));
        }
        self.values[1] = Value::Array(encoded);
        Ok(())
    }

    fn add_complete_interfaces(&mut self, interfaces: &[TypeRef]) -> SerializationResult<()> {
        self.values[2] = type_names_value(self.universe, interfaces)?;
        Ok(())
    }
}

pub struct FlatClassContextDeserializer<'a> {
    universe: &'a TypeUniverse,
    values: &'a [Value],
}

impl<'a> FlatClassContextDeserializer<'a> {
    /// Fails with [`SerializationError::Arity`] before any slot is read
    pub fn new(universe: &'a TypeUniverse, values: &'a [Value]) -> SerializationResult<Self> {
        check_arity(values, CLASS_CONTEXT_SLOTS)?;
        Ok(Self { universe, values })
    }
}

impl ClassContextDeserializer for FlatClassContextDeserializer<'_> {
    fn get_class_type(&self) -> SerializationResult<TypeRef> {
        read_type(self.universe, &self.values[0], SlotId::Index(0))
    }

    fn get_mixins(&self) -> SerializationResult<Vec<MixinContext>> {
        let slot = &self.values[1];
        let items = slot.as_array().ok_or_else(|| SerializationError::SlotType {
            slot: SlotId::Index(1),
            expected: SlotKind::MixinArray,
            actual: value_kind(slot),
        })?;

        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let element = SlotId::Element { slot: 1, index };
                let values = item.as_array().ok_or_else(|| SerializationError::SlotType {
                    slot: element.clone(),
                    expected: SlotKind::MixinArray,
                    actual: value_kind(item),
                })?;
                FlatMixinContextDeserializer::new(self.universe, values)
                    .and_then(|deserializer| MixinContext::deserialize(&deserializer))
                    .map_err(|source| SerializationError::Nested {
                        slot: element,
                        source: Box::new(source),
                    })
            })
            .collect()
    }

    fn get_complete_interfaces(&self) -> SerializationResult<Vec<TypeRef>> {
        read_types(self.universe, &self.values[2], SlotId::Index(2))
    }
}

pub fn serialize_mixin_context(
    universe: &TypeUniverse,
    mixin: &MixinContext,
) -> SerializationResult<Vec<Value>> {
    let mut serializer = FlatMixinContextSerializer::new(universe);
    mixin.serialize(&mut serializer)?;
    Ok(serializer.into_values())
}

pub fn deserialize_mixin_context(
    universe: &TypeUniverse,
    values: &[Value],
) -> SerializationResult<MixinContext> {
    MixinContext::deserialize(&FlatMixinContextDeserializer::new(universe, values)?)
}

pub fn serialize_class_context(
    universe: &TypeUniverse,
    context: &ClassContext,
) -> SerializationResult<Vec<Value>> {
    let mut serializer = FlatClassContextSerializer::new(universe);
    context.serialize(&mut serializer)?;
    Ok(serializer.into_values())
}

pub fn deserialize_class_context(
    universe: &TypeUniverse,
    values: &[Value],
) -> SerializationResult<ClassContext> {
    ClassContext::deserialize(&FlatClassContextDeserializer::new(universe, values)?)
}
