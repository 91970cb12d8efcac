//! Identity keys of structs with designated key fields.

use crate::error::FbeError;
use crate::record::Record;
use crate::schema::{FieldDef, StructSchema};
use crate::value::Value;

/// The key tuple of a record, in field order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Key(pub Vec<Value>);

/// Key derivation and equality for a schema with at least one key field.
///
/// Only obtainable through [`StructSchema::keyed`], which returns `None` for
/// schemas without key fields.
#[derive(Debug, Clone, Copy)]
pub struct Keyed<'a> {
    schema: &'a StructSchema,
}

impl<'a> Keyed<'a> {
    pub(crate) fn new(schema: &'a StructSchema) -> Option<Self> {
        schema.key_fields().next().map(|_| Self { schema })
    }

    pub fn fields(&self) -> impl Iterator<Item = &'a FieldDef> {
        self.schema.key_fields()
    }

    /// Extracts the key tuple. Missing key fields take their default value.
    pub fn key(&self, record: &Record) -> Result<Key, FbeError> {
        self.fields()
            .map(|field| match record.get(&field.name) {
                Some(value) => {
                    value.type_check(&field.ty)?;
                    Ok(value.clone())
                }
                None => Ok(field.ty.default_value()),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Key)
    }

    /// Whether both records have the same key, ignoring non-key fields.
    pub fn equals(&self, a: &Record, b: &Record) -> Result<bool, FbeError> {
        Ok(self.key(a)? == self.key(b)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldType;

    #[test]
    fn test_no_keys_no_identity() {
        let schema = StructSchema::builder("Tick")
            .field("price", FieldType::f64())
            .build()
            .unwrap();
        assert!(schema.keyed().is_none());
    }

    #[test]
    fn test_equals_ignores_non_key_fields() {
        let schema = StructSchema::builder("Order")
            .key("id", FieldType::i32())
            .key("venue", FieldType::string())
            .field("qty", FieldType::u32())
            .build()
            .unwrap();
        let keyed = schema.keyed().unwrap();
        let a = Record::new().with("id", 7i32).with("venue", "X").with("qty", 1u32);
        let b = Record::new().with("id", 7i32).with("venue", "X").with("qty", 9u32);
        let c = Record::new().with("id", 8i32).with("venue", "X");
        assert!(keyed.equals(&a, &b).unwrap());
        assert!(!keyed.equals(&a, &c).unwrap());
        assert_eq!(
            keyed.key(&a).unwrap(),
            Key(vec![Value::I32(7), Value::from("X")])
        );
    }

    #[test]
    fn test_inherited_keys() {
        let base = StructSchema::builder("Base")
            .key("id", FieldType::i64())
            .build()
            .unwrap();
        let derived = StructSchema::builder("Derived")
            .extends(base)
            .field("note", FieldType::string())
            .build()
            .unwrap();
        let keyed = derived.keyed().unwrap();
        assert_eq!(keyed.fields().count(), 1);
        assert_eq!(
            keyed.key(&Record::new()).unwrap(),
            Key(vec![Value::I64(0)])
        );
    }
}
