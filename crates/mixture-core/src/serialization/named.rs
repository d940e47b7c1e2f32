//! Named encoding: prefixed keys inside a caller-owned record
//!
//! A mixin context written with prefix `p` occupies `p.MixinType`, `p.MixinKind`,
//! `p.IntroducedMemberVisibility` and `p.ExplicitDependencies`. A class context occupies
//! `p.ClassType`, `p.Mixins.Count`, one nested mixin context per `p.Mixins[i]` and
//! `p.CompleteInterfaces`. Several contexts can share one record under distinct prefixes.

use serde_json::{Map, Value};

use super::{
    read_kind, read_type, read_types, read_visibility, type_name_value, type_names_value,
    value_kind, ClassContextDeserializer, ClassContextSerializer, MixinContextDeserializer,
    MixinContextSerializer, SerializationError, SerializationResult, SlotId, SlotKind,
};
use crate::mixin_context::{IntroducedMemberVisibility, MixinContext, MixinKind};
use crate::types::{TypeRef, TypeUniverse};

pub type Record = Map<String, Value>;

fn key(prefix: &str, name: &str) -> String {
    format!("{}.{}", prefix, name)
}

fn mixin_prefix(prefix: &str, index: usize) -> String {
    format!("{}.Mixins[{}]", prefix, index)
}

fn lookup<'r>(
    record: &'r Record,
    prefix: &str,
    name: &str,
) -> SerializationResult<(&'r Value, SlotId)> {
    let key = key(prefix, name);
    match record.get(&key) {
        Some(value) => Ok((value, SlotId::Key(key))),
        None => Err(SerializationError::MissingSlot {
            slot: SlotId::Key(key),
        }),
    }
}

pub struct NamedMixinContextSerializer<'a> {
    universe: &'a TypeUniverse,
    record: &'a mut Record,
    prefix: String,
}

impl<'a> NamedMixinContextSerializer<'a> {
    pub fn new(
        universe: &'a TypeUniverse,
        record: &'a mut Record,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            universe,
            record,
            prefix: prefix.into(),
        }
    }

    fn put(&mut self, name: &str, value: Value) {
        self.record.insert(key(&self.prefix, name), value);
    }
}

impl MixinContextSerializer for NamedMixinContextSerializer<'_> {
    fn add_mixin_type(&mut self, mixin_type: TypeRef) -> SerializationResult<()> {
        let value = type_name_value(self.universe, mixin_type)?;
        self.put("MixinType", value);
        Ok(())
    }

    fn add_mixin_kind(&mut self, kind: MixinKind) -> SerializationResult<()> {
        self.put("MixinKind", Value::String(kind.as_str().to_string()));
        Ok(())
    }

    fn add_introduced_member_visibility(
        &mut self,
        visibility: IntroducedMemberVisibility,
    ) -> SerializationResult<()> {
        self.put(
            "IntroducedMemberVisibility",
            Value::String(visibility.as_str().to_string()),
        );
        Ok(())
    }

    fn add_explicit_dependencies(&mut self, dependencies: &[TypeRef]) -> SerializationResult<()> {
        let value = type_names_value(self.universe, dependencies)?;
        self.put("ExplicitDependencies", value);
        Ok(())
    }
}

pub struct NamedMixinContextDeserializer<'a> {
    universe: &'a TypeUniverse,
    record: &'a Record,
    prefix: String,
}

impl<'a> NamedMixinContextDeserializer<'a> {
    pub fn new(universe: &'a TypeUniverse, record: &'a Record, prefix: impl Into<String>) -> Self {
        Self {
            universe,
            record,
            prefix: prefix.into(),
        }
    }
}

impl MixinContextDeserializer for NamedMixinContextDeserializer<'_> {
    fn get_mixin_type(&self) -> SerializationResult<TypeRef> {
        let (value, slot) = lookup(self.record, &self.prefix, "MixinType")?;
        read_type(self.universe, value, slot)
    }

    fn get_mixin_kind(&self) -> SerializationResult<MixinKind> {
        let (value, slot) = lookup(self.record, &self.prefix, "MixinKind")?;
        read_kind(value, slot)
    }

    fn get_introduced_member_visibility(&self) -> SerializationResult<IntroducedMemberVisibility> {
        let (value, slot) = lookup(self.record, &self.prefix, "IntroducedMemberVisibility")?;
        read_visibility(value, slot)
    }

    fn get_explicit_dependencies(&self) -> SerializationResult<Vec<TypeRef>> {
        let (value, slot) = lookup(self.record, &self.prefix, "ExplicitDependencies")?;
        read_types(self.universe, value, slot)
    }
}

pub struct NamedClassContextSerializer<'a> {
    universe: &'a TypeUniverse,
    record: &'a mut Record,
    prefix: String,
}

impl<'a> NamedClassContextSerializer<'a> {
    pub fn new(
        universe: &'a TypeUniverse,
        record: &'a mut Record,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            universe,
            record,
            prefix: prefix.into(),
        }
    }
}

impl ClassContextSerializer for NamedClassContextSerializer<'_> {
    fn add_class_type(&mut self, class_type: TypeRef) -> SerializationResult<()> {
        let value = type_name_value(self.universe, class_type)?;
        self.record.insert(key(&self.prefix, "ClassType"), value);
        Ok(())
    }

    fn add_mixins(&mut self, mixins: &[&MixinContext]) -> SerializationResult<()> {
        self.record
            .insert(key(&self.prefix, "Mixins.Count"), Value::from(mixins.len()));
        for (index, mixin) in mixins.iter().enumerate() {
            let prefix = mixin_prefix(&self.prefix, index);
            let mut nested =
                NamedMixinContextSerializer::new(self.universe, &mut *self.record, prefix);
            mixin.serialize(&mut nested)?;
        }
        Ok(())
    }

    fn add_complete_interfaces(&mut self, interfaces: &[TypeRef]) -> SerializationResult<()> {
        let value = type_names_value(self.universe, interfaces)?;
        self.record.insert(key(&self.prefix, "CompleteInterfaces"), value);
        Ok(())
    }
}

pub struct NamedClassContextDeserializer<'a> {
    universe: &'a TypeUniverse,
    record: &'a Record,
    prefix: String,
}

impl<'a> NamedClassContextDeserializer<'a> {
    pub fn new(universe: &'a TypeUniverse, record: &'a Record, prefix: impl Into<String>) -> Self {
        Self {
            universe,
            record,
            prefix: prefix.into(),
        }
    }

    fn mixin_count(&self) -> SerializationResult<usize> {
        let (value, slot) = lookup(self.record, &self.prefix, "Mixins.Count")?;
        let Value::Number(number) = value else {
            return Err(SerializationError::SlotType {
                slot,
                expected: SlotKind::Count,
                actual: value_kind(value),
            });
        };
        number
            .as_u64()
            .and_then(|count| usize::try_from(count).ok())
            .ok_or_else(|| SerializationError::InvalidValue {
                slot,
                expected: SlotKind::Count,
                value: number.to_string(),
            })
    }
}

impl ClassContextDeserializer for NamedClassContextDeserializer<'_> {
    fn get_class_type(&self) -> SerializationResult<TypeRef> {
        let (value, slot) = lookup(self.record, &self.prefix, "ClassType")?;
        read_type(self.universe, value, slot)
    }

    fn get_mixins(&self) -> SerializationResult<Vec<MixinContext>> {
        (0..self.mixin_count()?)
            .map(|index| {
                let nested = NamedMixinContextDeserializer::new(
                    self.universe,
                    self.record,
                    mixin_prefix(&self.prefix, index),
                );
                MixinContext::deserialize(&nested)
            })
            .collect()
    }

    fn get_complete_interfaces(&self) -> SerializationResult<Vec<TypeRef>> {
        let (value, slot) = lookup(self.record, &self.prefix, "CompleteInterfaces")?;
        read_types(self.universe, value, slot)
    }
}
