//! Serialization boundary for class and mixin contexts
//!
//! Both value objects are written through serializer traits and read back through
//! deserializer traits, so the same logical slots can be carried by different physical
//! encodings:
//!
//! - [`flat`]: an ordered array of values (4 slots per mixin, 3 per class context)
//! - [`named`]: keys with a caller-supplied prefix inside one larger record
//!
//! Type identities travel as full type names and are resolved against a
//! [`TypeUniverse`] when read. Every slot is read with an expected [`SlotKind`]; a value
//! of another kind is an error, never coerced.

pub mod flat;
pub mod named;

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::class_context::ClassContext;
use crate::error::MixinError;
use crate::mixin_context::{IntroducedMemberVisibility, MixinContext, MixinKind};
use crate::types::{TypeRef, TypeUniverse};

pub use flat::{
    FlatClassContextDeserializer, FlatClassContextSerializer, FlatMixinContextDeserializer,
    FlatMixinContextSerializer,
};
pub use named::{
    NamedClassContextDeserializer, NamedClassContextSerializer, NamedMixinContextDeserializer,
    NamedMixinContextSerializer,
};

/// Logical type expected in a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Type,
    MixinKind,
    Visibility,
    TypeArray,
    MixinArray,
    Count,
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SlotKind::Type => "type name",
            SlotKind::MixinKind => "mixin kind",
            SlotKind::Visibility => "member visibility",
            SlotKind::TypeArray => "array of type names",
            SlotKind::MixinArray => "array of mixin contexts",
            SlotKind::Count => "count",
        };
        f.write_str(name)
    }
}

/// Where a slot lives in its encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotId {
    Index(usize),
    /// Element `index` of the array held in slot `slot`
    Element { slot: usize, index: usize },
    Key(String),
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotId::Index(index) => write!(f, "slot {}", index),
            SlotId::Element { slot, index } => write!(f, "slot {}[{}]", slot, index),
            SlotId::Key(key) => write!(f, "key '{}'", key),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SerializationError {
    #[error("Expected {expected} slots but found {actual}")]
    Arity { expected: usize, actual: usize },

    #[error("Expected {expected} at {slot}, found {actual}")]
    SlotType {
        slot: SlotId,
        expected: SlotKind,
        actual: &'static str,
    },

    #[error("Missing {slot}")]
    MissingSlot { slot: SlotId },

    #[error("Invalid {expected} '{value}' at {slot}")]
    InvalidValue {
        slot: SlotId,
        expected: SlotKind,
        value: String,
    },

    #[error("Unknown type '{name}' at {slot}")]
    UnknownTypeName { slot: SlotId, name: String },

    #[error("Cannot serialize {ty:?}: not part of the type universe")]
    ForeignType { ty: TypeRef },

    #[error("In {slot}: {source}")]
    Nested {
        slot: SlotId,
        #[source]
        source: Box<SerializationError>,
    },

    #[error("Deserialized context is invalid: {0}")]
    Context(#[from] MixinError),
}

pub type SerializationResult<T> = std::result::Result<T, SerializationError>;

pub trait MixinContextSerializer {
    fn add_mixin_type(&mut self, mixin_type: TypeRef) -> SerializationResult<()>;
    fn add_mixin_kind(&mut self, kind: MixinKind) -> SerializationResult<()>;
    fn add_introduced_member_visibility(
        &mut self,
        visibility: IntroducedMemberVisibility,
    ) -> SerializationResult<()>;
    fn add_explicit_dependencies(&mut self, dependencies: &[TypeRef]) -> SerializationResult<()>;
}

pub trait MixinContextDeserializer {
    fn get_mixin_type(&self) -> SerializationResult<TypeRef>;
    fn get_mixin_kind(&self) -> SerializationResult<MixinKind>;
    fn get_introduced_member_visibility(&self) -> SerializationResult<IntroducedMemberVisibility>;
    fn get_explicit_dependencies(&self) -> SerializationResult<Vec<TypeRef>>;
}

pub trait ClassContextSerializer {
    fn add_class_type(&mut self, class_type: TypeRef) -> SerializationResult<()>;
    fn add_mixins(&mut self, mixins: &[&MixinContext]) -> SerializationResult<()>;
    fn add_complete_interfaces(&mut self, interfaces: &[TypeRef]) -> SerializationResult<()>;
}

pub trait ClassContextDeserializer {
    fn get_class_type(&self) -> SerializationResult<TypeRef>;
    fn get_mixins(&self) -> SerializationResult<Vec<MixinContext>>;
    fn get_complete_interfaces(&self) -> SerializationResult<Vec<TypeRef>>;
}

impl MixinContext {
    pub fn serialize(
        &self,
        serializer: &mut impl MixinContextSerializer,
    ) -> SerializationResult<()> {
        serializer.add_mixin_type(self.mixin_type())?;
        serializer.add_mixin_kind(self.kind())?;
        serializer.add_introduced_member_visibility(self.introduced_member_visibility())?;
        serializer.add_explicit_dependencies(self.explicit_dependencies())
    }

    pub fn deserialize(deserializer: &impl MixinContextDeserializer) -> SerializationResult<Self> {
        Ok(MixinContext::new(
            deserializer.get_mixin_type()?,
            deserializer.get_mixin_kind()?,
            deserializer.get_introduced_member_visibility()?,
            deserializer.get_explicit_dependencies()?,
        ))
    }
}

impl ClassContext {
    pub fn serialize(
        &self,
        serializer: &mut impl ClassContextSerializer,
    ) -> SerializationResult<()> {
        serializer.add_class_type(self.class_type())?;
        let mixins: Vec<&MixinContext> = self.mixins().iter().collect();
        serializer.add_mixins(&mixins)?;
        serializer.add_complete_interfaces(self.complete_interfaces())
    }

    pub fn deserialize(deserializer: &impl ClassContextDeserializer) -> SerializationResult<Self> {
        let class_type = deserializer.get_class_type()?;
        let mixins = deserializer.get_mixins()?;
        let interfaces = deserializer.get_complete_interfaces()?;
        Ok(ClassContext::new(class_type, mixins, interfaces)?)
    }
}

/// Name of a JSON value's kind, for mismatch reports
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(crate) fn type_name_value(universe: &TypeUniverse, ty: TypeRef) -> SerializationResult<Value> {
    universe
        .name(ty)
        .map(|name| Value::String(name.to_string()))
        .ok_or(SerializationError::ForeignType { ty })
}

pub(crate) fn type_names_value(
    universe: &TypeUniverse,
    types: &[TypeRef],
) -> SerializationResult<Value> {
    types
        .iter()
        .map(|&ty| type_name_value(universe, ty))
        .collect::<SerializationResult<Vec<_>>>()
        .map(Value::Array)
}

fn expect_str<'v>(
    value: &'v Value,
    slot: &SlotId,
    expected: SlotKind,
) -> SerializationResult<&'v str> {
    value.as_str().ok_or_else(|| SerializationError::SlotType {
        slot: slot.clone(),
        expected,
        actual: value_kind(value),
    })
}

pub(crate) fn read_type(
    universe: &TypeUniverse,
    value: &Value,
    slot: SlotId,
) -> SerializationResult<TypeRef> {
    let name = expect_str(value, &slot, SlotKind::Type)?;
    universe
        .resolve(name)
        .ok_or_else(|| SerializationError::UnknownTypeName {
            slot,
            name: name.to_string(),
        })
}

pub(crate) fn read_types(
    universe: &TypeUniverse,
    value: &Value,
    slot: SlotId,
) -> SerializationResult<Vec<TypeRef>> {
    let items = value.as_array().ok_or_else(|| SerializationError::SlotType {
        slot: slot.clone(),
        expected: SlotKind::TypeArray,
        actual: value_kind(value),
    })?;
    items
        .iter()
        .map(|item| {
            let name = item.as_str().ok_or_else(|| SerializationError::SlotType {
                slot: slot.clone(),
                expected: SlotKind::TypeArray,
                actual: value_kind(item),
            })?;
            universe
                .resolve(name)
                .ok_or_else(|| SerializationError::UnknownTypeName {
                    slot: slot.clone(),
                    name: name.to_string(),
                })
        })
        .collect()
}

pub(crate) fn read_kind(value: &Value, slot: SlotId) -> SerializationResult<MixinKind> {
    let text = expect_str(value, &slot, SlotKind::MixinKind)?;
    MixinKind::parse(text).ok_or_else(|| SerializationError::InvalidValue {
        slot,
        expected: SlotKind::MixinKind,
        value: text.to_string(),
    })
}

pub(crate) fn read_visibility(
    value: &Value,
    slot: SlotId,
) -> SerializationResult<IntroducedMemberVisibility> {
    let text = expect_str(value, &slot, SlotKind::Visibility)?;
    IntroducedMemberVisibility::parse(text).ok_or_else(|| SerializationError::InvalidValue {
        slot,
        expected: SlotKind::Visibility,
        value: text.to_string(),
    })
}
