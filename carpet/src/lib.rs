//! Carpet: derive a Parquet schema from a Rust struct, write records to a
//! file, and read them back — `#[derive(ParquetRecord)]` plus a thin
//! prelude over `carpet-core`'s engine.
//!
//! ```ignore
//! use carpet::ParquetRecord;
//!
//! #[derive(ParquetRecord)]
//! struct Order {
//!     id: i64,
//!     customer: String,
//!     total_cents: i64,
//!     notes: Option<String>,
//! }
//!
//! let mut writer = carpet::CarpetWriter::new(file, carpet::WriterConfig::default())?;
//! writer.write(&order)?;
//! writer.close()?;
//!
//! for row in carpet::CarpetReader::<Order>::open(file)? {
//!     let order = row?;
//! }
//! ```

pub use carpet_derive::ParquetRecord;

pub use carpet_core::{
    camel_case_to_snake_case, read_generic_rows, record_to_value, value_to_record, AnnotatedLevel,
    BinaryLogicalType, BuiltRecordModel, CarpetError, CarpetReader, CarpetRowIter, CarpetWriter,
    ColumnNamingStrategy, DecimalConfig, DecimalPhysical, DecimalSpec, ErrorContext, Field, FieldType,
    FromParquetRecord, GenericRowIter, ParquetValue, RecordDescriptor, RecordModelBuilder, Result,
    RoundingMode, StringLogicalType, ToParquetRecord, TimeUnit, WriterConfig,
};

/// Re-exports of the temporal types `jiff`-backed fields use, so crates
/// depending only on `carpet` don't need a direct `jiff` dependency to name
/// `DateOnly`/`TimeOfDay`/`LocalTimestamp`/`InstantTimestamp` fields.
pub mod temporal {
    pub use carpet_core::temporal::*;
    pub use jiff::civil::{Date, DateTime, Time};
    pub use jiff::Timestamp;
}
