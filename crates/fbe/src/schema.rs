//! Struct schemas and single inheritance.

use std::sync::Arc;

use crate::error::FbeError;
use crate::keys::Keyed;
use crate::record::Record;
use crate::types::FieldType;

/// One named, typed field of a struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub ty: FieldType,
    /// Whether the field is part of the struct's identity key.
    pub key: bool,
}

/// An ordered set of fields, optionally extending a parent schema.
///
/// Inheritance is composition: the field list of a derived schema is the
/// parent's list followed by the derived schema's own fields, so a reader
/// built for the parent decodes the leading fields of a derived payload.
///
/// ```
/// use fbe::{FieldType, StructSchema};
///
/// let person = StructSchema::builder("Person")
///     .key("id", FieldType::i32())
///     .field("name", FieldType::string())
///     .build()
///     .unwrap();
/// let employee = StructSchema::builder("Employee")
///     .extends(person.clone())
///     .field("salary", FieldType::f64())
///     .build()
///     .unwrap();
///
/// let names: Vec<_> = employee.fields().iter().map(|f| f.name.as_str()).collect();
/// assert_eq!(names, ["id", "name", "salary"]);
/// assert!(employee.is_derived_from(&person));
/// assert!(employee.keyed().is_some());
/// ```
#[derive(Debug, PartialEq, Eq)]
pub struct StructSchema {
    name: String,
    parent: Option<Arc<StructSchema>>,
    fields: Vec<FieldDef>,
    own_from: usize,
}

impl StructSchema {
    pub fn builder(name: impl Into<String>) -> StructSchemaBuilder {
        StructSchemaBuilder {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<StructSchema>> {
        self.parent.as_ref()
    }

    /// All fields in wire order, inherited ones first.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Fields declared by this schema itself.
    pub fn own_fields(&self) -> &[FieldDef] {
        &self.fields[self.own_from..]
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Sum of the Standard field heads, without the struct header.
    pub fn head_size(&self) -> usize {
        self.fields.iter().map(|f| f.ty.head_size()).sum()
    }

    /// A record holding the default value of every field.
    pub fn default_record(&self) -> Record {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.ty.default_value()))
            .collect()
    }

    pub fn key_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.key)
    }

    /// Key accessor; `None` when no field of the chain is a key.
    pub fn keyed(&self) -> Option<Keyed<'_>> {
        Keyed::new(self)
    }

    /// Whether `ancestor` is this schema or one of its parents.
    pub fn is_derived_from(&self, ancestor: &StructSchema) -> bool {
        let mut current = Some(self);
        while let Some(schema) = current {
            if std::ptr::eq(schema, ancestor) || schema == ancestor {
                return true;
            }
            current = schema.parent.as_deref();
        }
        false
    }

    /// Rejects unknown field names and values of the wrong type.
    pub fn check_record(&self, record: &Record) -> Result<(), FbeError> {
        for (name, value) in record.iter() {
            let field = self
                .field(name)
                .ok_or_else(|| FbeError::UnknownField(name.to_owned()))?;
            value.type_check(&field.ty)?;
        }
        Ok(())
    }
}

/// Builder returned by [`StructSchema::builder`].
#[derive(Debug)]
pub struct StructSchemaBuilder {
    name: String,
    parent: Option<Arc<StructSchema>>,
    fields: Vec<FieldDef>,
}

impl StructSchemaBuilder {
    pub fn field(mut self, name: impl Into<String>, ty: impl Into<FieldType>) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            ty: ty.into(),
            key: false,
        });
        self
    }

    /// Adds a field that is part of the identity key.
    pub fn key(mut self, name: impl Into<String>, ty: impl Into<FieldType>) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            ty: ty.into(),
            key: true,
        });
        self
    }

    pub fn extends(mut self, parent: Arc<StructSchema>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn build(self) -> Result<Arc<StructSchema>, FbeError> {
        let mut fields = match &self.parent {
            Some(parent) => parent.fields.clone(),
            None => Vec::new(),
        };
        let own_from = fields.len();
        for field in self.fields {
            if fields.iter().any(|f| f.name == field.name) {
                return Err(FbeError::DuplicateField(field.name));
            }
            fields.push(field);
        }
        Ok(Arc::new(StructSchema {
            name: self.name,
            parent: self.parent,
            fields,
            own_from,
        }))
    }
}
