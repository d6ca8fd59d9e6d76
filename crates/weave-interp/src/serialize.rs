// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! serde support for values and records.
//!
//! Records serialize as a bare sequence of their slot values. A sequence
//! carries no type, so records are deserialized through their type with
//! [`RecordSeed`].

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};
use serde::ser::{self, SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::record::{Record, RecordType};
use crate::slots::Slots;
use crate::value::{lock, Value};

fn serialize_items<S: Serializer>(serializer: S, items: &[Value]) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(items.len()))?;
    for item in items {
        seq.serialize_element(item)?;
    }
    seq.end()
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::None => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Tuple(items) => serialize_items(serializer, items),
            Value::List(items) => {
                let items = lock(items).clone();
                serialize_items(serializer, &items)
            }
            Value::Dict(entries) => {
                let entries = lock(entries).clone();
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in &entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Range(r) => {
                let items: Vec<Value> = (0..r.len()).filter_map(|i| r.get(i)).map(Value::Int).collect();
                serialize_items(serializer, &items)
            }
            Value::Record(record) => record.serialize(serializer),
            other => Err(ser::Error::custom(format!(
                "cannot serialize a value of type '{}'",
                other.type_name()
            ))),
        }
    }
}

impl Serialize for Slots {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_items(serializer, &self.to_vec())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.slots().serialize(serializer)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a plain data value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        i64::try_from(v)
            .map(Value::Int)
            .map_err(|_| E::custom(format!("integer {} does not fit in 64 signed bits", v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::str(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::str(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::None)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    /// Sequences come back as tuples.
    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::tuple(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut entries = IndexMap::new();
        while let Some((k, v)) = map.next_entry::<String, Value>()? {
            entries.insert(k, v);
        }
        Ok(Value::dict(entries))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

/// Deserializes a sequence into an instance of one record type.
pub struct RecordSeed {
    ty: Arc<RecordType>,
}

impl RecordType {
    pub fn seed(self: &Arc<Self>) -> RecordSeed {
        RecordSeed { ty: self.clone() }
    }
}

impl<'de> DeserializeSeed<'de> for RecordSeed {
    type Value = Record;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Record, D::Error> {
        let values = Vec::<Value>::deserialize(deserializer)?;
        self.ty.make(values).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_values_to_json() {
        let mut entries = IndexMap::new();
        entries.insert("b".to_string(), Value::list([Value::Int(1), Value::None]));
        entries.insert("a".to_string(), Value::tuple([Value::Float(0.5), Value::str("x")]));
        let json = serde_json::to_string(&Value::dict(entries)).unwrap();
        assert_eq!(json, r#"{"b":[1,null],"a":[0.5,"x"]}"#);
    }

    #[test]
    fn json_arrays_come_back_as_tuples() {
        let value: Value = serde_json::from_str(r#"{"k": [1, true, "s"]}"#).unwrap();
        assert_eq!(value.repr(), "{'k': (1, True, 's')}");
    }

    #[test]
    fn functions_do_not_serialize() {
        assert!(serde_json::to_string(&Value::Slot(0)).is_err());
    }
}
