//! Core engine for bridging Rust record types to the Parquet columnar file
//! format: schema derivation (§4.2), the write-path shredder (§4.3) and the
//! read-path converter tree (§4.4) all live here. `carpet-derive` generates
//! the `ToParquetRecord`/`FromParquetRecord` impls this crate's traits
//! describe; `carpet` re-exports both behind one prelude.

pub mod config;
pub mod converter;
pub mod error;
pub mod field;
pub mod levels;
pub mod list_shape;
pub mod naming;
pub mod reader;
pub mod schema;
#[cfg(test)]
pub mod test_utils;
pub mod temporal;
pub mod value;
pub mod write_model;
pub mod writer;

pub use config::{AnnotatedLevel, DecimalConfig, TimeUnit, WriterConfig};
pub use converter::{value_to_record, FromParquetRecord};
pub use error::{CarpetError, ErrorContext, Result};
pub use field::{
    BinaryLogicalType, DecimalPhysical, DecimalSpec, Field, FieldType, RecordDescriptor, RoundingMode,
    StringLogicalType,
};
pub use naming::{camel_case_to_snake_case, ColumnNamingStrategy};
pub use reader::{read_generic_rows, CarpetReader, CarpetRowIter, GenericRowIter};
pub use value::ParquetValue;
pub use write_model::{record_to_value, BuiltRecordModel, RecordModelBuilder, ToParquetRecord};
pub use writer::CarpetWriter;

/// Re-exports of the crates the generated `#[derive(ParquetRecord)]` code
/// names directly (`bytes::Bytes`, `ordered_float::OrderedFloat`,
/// `indexmap::IndexMap`, `uuid::Uuid`), so a downstream crate with a plain
/// `f32`/`Vec<u8>`/`IndexMap` field doesn't have to add those crates as its
/// own direct dependencies just to make the expansion resolve.
#[doc(hidden)]
pub mod reexports {
    pub use bytes;
    pub use indexmap;
    pub use ordered_float;
    pub use uuid;
}
