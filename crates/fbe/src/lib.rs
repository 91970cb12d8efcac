//! Schema-driven binary serialization with two wire formats.
//!
//! A [`StructSchema`] describes the fields of a struct; [`StructModel`]
//! encodes a [`Record`] of that schema in the *Standard* format (size
//! header, fixed-width field heads, variable payloads behind relative
//! pointers) and [`StructFinalModel`] in the *Final* format (everything
//! inline, no header). Single field values are handled by the field models
//! in [`field`], which dispatch on the closed [`FieldType`] enum.
//!
//! ```
//! use fbe::{FieldType, Record, StructFinalModel, StructSchema};
//!
//! let schema = StructSchema::builder("Quote")
//!     .field("id", FieldType::i32())
//!     .field("symbol", FieldType::string())
//!     .field("price", FieldType::f64())
//!     .build()
//!     .unwrap();
//! let quote = Record::new()
//!     .with("id", 42i32)
//!     .with("symbol", "EURUSD")
//!     .with("price", 1.23456f64);
//!
//! let mut model = StructFinalModel::new(schema);
//! let size = model.serialize(&quote).unwrap();
//! assert_eq!(size, 4 + 4 + 6 + 8);
//! assert_eq!(&model.data()[..14], b"\x2a\x00\x00\x00\x06\x00\x00\x00EURUSD");
//!
//! let (decoded, _) = model.deserialize(model.data()).unwrap();
//! assert_eq!(decoded, quote);
//! ```

pub mod error;
pub mod field;
pub mod json;
pub mod keys;
pub mod model;
pub mod record;
pub mod schema;
pub mod types;
pub mod value;

pub use error::{ErrorKind, FbeError};
pub use field::{
    final_size, standard_extra, FieldModel, FieldModelMut, FinalFieldModel, FinalFieldModelMut,
};
pub use keys::{Key, Keyed};
pub use model::{StructFinalModel, StructModel};
pub use record::Record;
pub use schema::{FieldDef, StructSchema, StructSchemaBuilder};
pub use types::{CollectionKind, FieldType, MapKind, Primitive, VariableKind};
pub use value::Value;

pub use fbe_buffers::{BufferConfig, BufferError, Decimal, ReadBuffer, Uuid, WriteBuffer};
