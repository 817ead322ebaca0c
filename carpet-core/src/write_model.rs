//! The write-model front-end (§4.1): the trait the derive macro implements,
//! and the programmatic builder for zero-macro deployments (§4.1.2).

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{CarpetError, Result};
use crate::field::{Field, FieldType, RecordDescriptor};
use crate::value::ParquetValue;

/// Implemented by any type the writer can serialize to Parquet.
///
/// `#[derive(ParquetRecord)]` generates this impl: `record_descriptor()`
/// resolves once per type through a `OnceLock` (§5/§9 — no re-derivation
/// cost per file), and `to_parquet_values()` is a straight-line sequence
/// of per-field conversions, the compile-time analog of the distilled
/// spec's "compile per-field writer closures ahead of time".
pub trait ToParquetRecord {
    /// The immutable, shareable description of this type's columns.
    fn record_descriptor() -> Arc<RecordDescriptor>;

    /// This value's fields, in the same order as `record_descriptor()`.
    fn to_parquet_values(&self) -> Vec<ParquetValue>;
}

type Accessor<T> = Box<dyn Fn(&T) -> ParquetValue + Send + Sync>;

/// Programmatic alternative to the derive macro (§4.1.2): builds a
/// `RecordDescriptor` and a matching set of value accessors without any
/// macro expansion, for record shapes decided at runtime.
pub struct RecordModelBuilder<T> {
    type_name: String,
    fields: Vec<Field>,
    accessors: Vec<Accessor<T>>,
}

impl<T> RecordModelBuilder<T> {
    pub fn new(type_name: impl Into<String>) -> Self {
        RecordModelBuilder {
            type_name: type_name.into(),
            fields: Vec::new(),
            accessors: Vec::new(),
        }
    }

    /// Add a field with an explicit `FieldType` and an opaque accessor
    /// returning its value as a `ParquetValue`.
    pub fn field(
        mut self,
        name: impl Into<String>,
        field_type: FieldType,
        nullable: bool,
        accessor: impl Fn(&T) -> ParquetValue + Send + Sync + 'static,
    ) -> Self {
        self.fields.push(Field::new(name, field_type, nullable));
        self.accessors.push(Box::new(accessor));
        self
    }

    /// Convenience constructor for a required `Int32` field.
    pub fn int32_field(
        self,
        name: impl Into<String>,
        accessor: impl Fn(&T) -> i32 + Send + Sync + 'static,
    ) -> Self {
        self.field(name, FieldType::Int32, false, move |t| {
            ParquetValue::Int32(accessor(t))
        })
    }

    /// Convenience constructor for a required `Int64` field.
    pub fn int64_field(
        self,
        name: impl Into<String>,
        accessor: impl Fn(&T) -> i64 + Send + Sync + 'static,
    ) -> Self {
        self.field(name, FieldType::Int64, false, move |t| {
            ParquetValue::Int64(accessor(t))
        })
    }

    /// Convenience constructor for a required plain-string field.
    pub fn string_field(
        self,
        name: impl Into<String>,
        accessor: impl Fn(&T) -> String + Send + Sync + 'static,
    ) -> Self {
        self.field(
            name,
            FieldType::BinaryString(crate::field::StringLogicalType::Plain),
            false,
            move |t| ParquetValue::String(Arc::from(accessor(t).as_str())),
        )
    }

    /// Convenience constructor for a required `Bool` field.
    pub fn bool_field(
        self,
        name: impl Into<String>,
        accessor: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.field(name, FieldType::Bool, false, move |t| {
            ParquetValue::Boolean(accessor(t))
        })
    }

    /// Validate field-name/field-id uniqueness and acyclicity, and
    /// produce the built descriptor plus a value-materializing closure.
    pub fn build(self) -> Result<BuiltRecordModel<T>> {
        if self.fields.is_empty() {
            return Err(CarpetError::invalid_argument(
                "record model must declare at least one field",
            ));
        }
        let descriptor = Arc::new(RecordDescriptor::try_new(self.type_name, self.fields)?);
        Ok(BuiltRecordModel {
            descriptor,
            accessors: self.accessors,
        })
    }
}

/// Fold a nested `ToParquetRecord` value into a `ParquetValue::Record`,
/// zipping its descriptor's column names onto its own `to_parquet_values()`
/// output. The derive macro calls this for every struct-typed field instead
/// of generating the zip inline.
pub fn record_to_value<T: ToParquetRecord>(value: &T) -> ParquetValue {
    let descriptor = T::record_descriptor();
    let values = value.to_parquet_values();
    let mut map = IndexMap::with_capacity(values.len());
    for (field, v) in descriptor.fields.iter().zip(values) {
        map.insert(Arc::from(field.column_name.as_str()), v);
    }
    ParquetValue::Record(map)
}

/// The result of [`RecordModelBuilder::build`]: a validated descriptor
/// plus the accessors needed to materialize `ParquetValue`s for any `&T`.
pub struct BuiltRecordModel<T> {
    descriptor: Arc<RecordDescriptor>,
    accessors: Vec<Accessor<T>>,
}

impl<T> BuiltRecordModel<T> {
    pub fn descriptor(&self) -> Arc<RecordDescriptor> {
        self.descriptor.clone()
    }

    pub fn to_parquet_values(&self, value: &T) -> Vec<ParquetValue> {
        self.accessors.iter().map(|accessor| accessor(value)).collect()
    }
}
