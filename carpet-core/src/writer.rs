//! Writer compiler (§4.3): shreds `ToParquetRecord` rows into per-leaf
//! definition/repetition-level buffers and drives the real
//! `parquet::file::writer` column-writer sink.
//!
//! Dynamic row-group batch sizing (reservoir-sampled row size driving the
//! flush threshold) is carried over near-verbatim from the teacher's own
//! `Writer`/`WriterBuilder`, just retargeted from building `RecordBatch`es
//! to shredding `ParquetValue` rows directly into Parquet leaf columns.

use std::sync::Arc;

use parquet::data_type::{ByteArray, FixedLenByteArray};
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use rand::Rng;

use crate::config::{AnnotatedLevel, WriterConfig};
use crate::error::{CarpetError, Result};
use crate::field::{DecimalPhysical, DecimalSpec, Field, FieldType, RecordDescriptor, RoundingMode};
use crate::levels::{LevelBuffer, RepetitionPath};
use crate::schema::derive_message_type;
use crate::value::ParquetValue;
use crate::write_model::ToParquetRecord;

const DEFAULT_BATCH_SIZE: usize = 1000;
const MIN_BATCH_SIZE: usize = 10;
const MIN_SAMPLES_FOR_ESTIMATE: usize = 10;

/// One leaf Parquet column's accumulated values for the row group
/// currently being assembled.
#[derive(Debug, Clone)]
enum LeafBuffer {
    Bool(LevelBuffer<bool>),
    Int32(LevelBuffer<i32>),
    Int64(LevelBuffer<i64>),
    Float(LevelBuffer<f32>),
    Double(LevelBuffer<f64>),
    ByteArray(LevelBuffer<ByteArray>),
    FixedLenByteArray(LevelBuffer<FixedLenByteArray>),
}

impl LeafBuffer {
    fn for_field_type(field_type: &FieldType, config: &WriterConfig) -> Self {
        match leaf_kind(field_type, config) {
            LeafKind::Bool => LeafBuffer::Bool(LevelBuffer::new()),
            LeafKind::Int32 => LeafBuffer::Int32(LevelBuffer::new()),
            LeafKind::Int64 => LeafBuffer::Int64(LevelBuffer::new()),
            LeafKind::Float => LeafBuffer::Float(LevelBuffer::new()),
            LeafKind::Double => LeafBuffer::Double(LevelBuffer::new()),
            LeafKind::ByteArray => LeafBuffer::ByteArray(LevelBuffer::new()),
            LeafKind::FixedLenByteArray(_) => LeafBuffer::FixedLenByteArray(LevelBuffer::new()),
        }
    }

    fn clear(&mut self) {
        match self {
            LeafBuffer::Bool(b) => b.clear(),
            LeafBuffer::Int32(b) => b.clear(),
            LeafBuffer::Int64(b) => b.clear(),
            LeafBuffer::Float(b) => b.clear(),
            LeafBuffer::Double(b) => b.clear(),
            LeafBuffer::ByteArray(b) => b.clear(),
            LeafBuffer::FixedLenByteArray(b) => b.clear(),
        }
    }

    fn len(&self) -> usize {
        match self {
            LeafBuffer::Bool(b) => b.len(),
            LeafBuffer::Int32(b) => b.len(),
            LeafBuffer::Int64(b) => b.len(),
            LeafBuffer::Float(b) => b.len(),
            LeafBuffer::Double(b) => b.len(),
            LeafBuffer::ByteArray(b) => b.len(),
            LeafBuffer::FixedLenByteArray(b) => b.len(),
        }
    }

    fn push_null(&mut self, definition_level: i16, repetition_level: i16) {
        match self {
            LeafBuffer::Bool(b) => b.push_null(definition_level, repetition_level),
            LeafBuffer::Int32(b) => b.push_null(definition_level, repetition_level),
            LeafBuffer::Int64(b) => b.push_null(definition_level, repetition_level),
            LeafBuffer::Float(b) => b.push_null(definition_level, repetition_level),
            LeafBuffer::Double(b) => b.push_null(definition_level, repetition_level),
            LeafBuffer::ByteArray(b) => b.push_null(definition_level, repetition_level),
            LeafBuffer::FixedLenByteArray(b) => b.push_null(definition_level, repetition_level),
        }
    }

    fn push_value(
        &mut self,
        value: &ParquetValue,
        field_type: &FieldType,
        config: &WriterConfig,
        definition_level: i16,
        repetition_level: i16,
    ) -> Result<()> {
        match self {
            LeafBuffer::Bool(b) => {
                b.push_value(as_bool(value)?, definition_level, repetition_level)
            }
            LeafBuffer::Int32(b) => b.push_value(
                as_i32(value, field_type, config)?,
                definition_level,
                repetition_level,
            ),
            LeafBuffer::Int64(b) => b.push_value(
                as_i64(value, field_type, config)?,
                definition_level,
                repetition_level,
            ),
            LeafBuffer::Float(b) => b.push_value(as_f32(value)?, definition_level, repetition_level),
            LeafBuffer::Double(b) => {
                b.push_value(as_f64(value)?, definition_level, repetition_level)
            }
            LeafBuffer::ByteArray(b) => b.push_value(
                ByteArray::from(as_bytes(value)?),
                definition_level,
                repetition_level,
            ),
            LeafBuffer::FixedLenByteArray(b) => b.push_value(
                FixedLenByteArray::from(ByteArray::from(as_fixed_bytes(value, field_type)?)),
                definition_level,
                repetition_level,
            ),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum LeafKind {
    Bool,
    Int32,
    Int64,
    Float,
    Double,
    ByteArray,
    FixedLenByteArray(usize),
}

fn leaf_kind(field_type: &FieldType, config: &WriterConfig) -> LeafKind {
    use crate::config::TimeUnit;
    match field_type {
        FieldType::Bool => LeafKind::Bool,
        FieldType::Int8 | FieldType::Int16 | FieldType::Int32 | FieldType::DateOnly => LeafKind::Int32,
        FieldType::Int64 | FieldType::LocalTimestamp | FieldType::InstantTimestamp => LeafKind::Int64,
        FieldType::TimeOfDay => {
            if config.default_time_unit == TimeUnit::Millis {
                LeafKind::Int32
            } else {
                LeafKind::Int64
            }
        }
        FieldType::Float32 => LeafKind::Float,
        FieldType::Float64 => LeafKind::Double,
        FieldType::BinaryString(_) | FieldType::OpaqueBinary(_) | FieldType::EnumLike(_) => LeafKind::ByteArray,
        FieldType::Uuid => LeafKind::FixedLenByteArray(16),
        FieldType::Decimal(spec) => match spec.physical_width() {
            DecimalPhysical::Int32 => LeafKind::Int32,
            DecimalPhysical::Int64 => LeafKind::Int64,
            DecimalPhysical::FixedLenByteArray(width) => LeafKind::FixedLenByteArray(width),
        },
        FieldType::List(_) | FieldType::Set(_) | FieldType::Map(_, _) | FieldType::Record(_) => {
            unreachable!("leaf_kind called on a non-leaf field type")
        }
    }
}

fn as_bool(value: &ParquetValue) -> Result<bool> {
    match value {
        ParquetValue::Boolean(b) => Ok(*b),
        other => Err(CarpetError::conversion(format!("expected Boolean, got {}", other.type_name()))),
    }
}

fn as_i32(value: &ParquetValue, field_type: &FieldType, _config: &WriterConfig) -> Result<i32> {
    match (value, field_type) {
        (ParquetValue::Int8(v), _) => Ok(*v as i32),
        (ParquetValue::Int16(v), _) => Ok(*v as i32),
        (ParquetValue::Int32(v), _) => Ok(*v),
        (ParquetValue::Date32(v), FieldType::DateOnly) => Ok(*v),
        (ParquetValue::TimeMillis(v), FieldType::TimeOfDay) => Ok(*v),
        (ParquetValue::Decimal128(v, scale), FieldType::Decimal(spec)) => {
            spec.rescale(*v, *scale).and_then(|rescaled| {
                i32::try_from(rescaled)
                    .map_err(|_| CarpetError::data_validation("decimal value overflows a 32-bit Parquet leaf".to_string()))
            })
        }
        (other, _) => Err(CarpetError::conversion(format!(
            "cannot write {} as a 32-bit Parquet leaf",
            other.type_name()
        ))),
    }
}

fn as_i64(value: &ParquetValue, field_type: &FieldType, _config: &WriterConfig) -> Result<i64> {
    match (value, field_type) {
        (ParquetValue::Int64(v), _) => Ok(*v),
        (ParquetValue::TimeMicros(v), FieldType::TimeOfDay) => Ok(*v),
        (ParquetValue::TimestampMicros(v, _), FieldType::LocalTimestamp | FieldType::InstantTimestamp) => Ok(*v),
        (ParquetValue::TimestampMillis(v, _), FieldType::LocalTimestamp | FieldType::InstantTimestamp) => Ok(*v),
        (ParquetValue::TimestampNanos(v, _), FieldType::LocalTimestamp | FieldType::InstantTimestamp) => Ok(*v),
        (ParquetValue::Decimal128(v, scale), FieldType::Decimal(spec)) => {
            spec.rescale(*v, *scale).and_then(|rescaled| {
                i64::try_from(rescaled)
                    .map_err(|_| CarpetError::data_validation("decimal value overflows a 64-bit Parquet leaf".to_string()))
            })
        }
        (other, _) => Err(CarpetError::conversion(format!(
            "cannot write {} as a 64-bit Parquet leaf",
            other.type_name()
        ))),
    }
}

fn as_f32(value: &ParquetValue) -> Result<f32> {
    match value {
        ParquetValue::Float32(v) => Ok(v.into_inner()),
        other => Err(CarpetError::conversion(format!("expected Float32, got {}", other.type_name()))),
    }
}

fn as_f64(value: &ParquetValue) -> Result<f64> {
    match value {
        ParquetValue::Float64(v) => Ok(v.into_inner()),
        other => Err(CarpetError::conversion(format!("expected Float64, got {}", other.type_name()))),
    }
}

fn as_bytes(value: &ParquetValue) -> Result<Vec<u8>> {
    match value {
        ParquetValue::String(s) => Ok(s.as_bytes().to_vec()),
        ParquetValue::Bytes(b) => Ok(b.to_vec()),
        other => Err(CarpetError::conversion(format!(
            "cannot write {} as a binary Parquet leaf",
            other.type_name()
        ))),
    }
}

fn as_fixed_bytes(value: &ParquetValue, field_type: &FieldType) -> Result<Vec<u8>> {
    match (value, field_type) {
        (ParquetValue::Uuid(bytes), FieldType::Uuid) => Ok(bytes.to_vec()),
        (ParquetValue::Decimal128(v, scale), FieldType::Decimal(spec)) => {
            let width = match spec.physical_width() {
                DecimalPhysical::FixedLenByteArray(w) => w,
                _ => return Err(CarpetError::internal("decimal leaf kind mismatch")),
            };
            let rescaled = spec.rescale(*v, *scale)?;
            let full = rescaled.to_be_bytes();
            Ok(full[full.len() - width..].to_vec())
        }
        (other, _) => Err(CarpetError::conversion(format!(
            "cannot write {} as a fixed-length binary Parquet leaf",
            other.type_name()
        ))),
    }
}

/// Depth-first shredder: walks `fields`/`row` together, appending to
/// `leaves` (already sized to match the schema's leaf column order) at
/// the definition/repetition level implied by each ancestor's
/// nullability/repeatedness, per Parquet's own record-shredding rules.
struct Shredder<'a> {
    leaves: &'a mut Vec<LeafBuffer>,
    config: &'a WriterConfig,
    cursor: usize,
}

impl<'a> Shredder<'a> {
    fn shred_row(&mut self, fields: &[Field], row: &[ParquetValue]) -> Result<()> {
        if fields.len() != row.len() {
            return Err(CarpetError::schema(format!(
                "row has {} values but descriptor has {} fields",
                row.len(),
                fields.len()
            )));
        }
        self.cursor = 0;
        let mut path = RepetitionPath::new();
        for (field, value) in fields.iter().zip(row) {
            self.shred_field(field, value, 0, &mut path)?;
        }
        Ok(())
    }

    fn shred_field(
        &mut self,
        field: &Field,
        value: &ParquetValue,
        definition_level: i16,
        path: &mut RepetitionPath,
    ) -> Result<()> {
        let is_null = value.is_null();
        if is_null && !field.nullable {
            return Err(CarpetError::data_validation(format!(
                "null value for required field `{}`",
                field.column_name
            )));
        }
        let own_def_level = if field.nullable { definition_level + 1 } else { definition_level };
        let effective_def_level = if is_null { definition_level } else { own_def_level };

        match &field.field_type {
            FieldType::Record(descriptor) => {
                if is_null {
                    self.shred_absent_subtree(&descriptor.fields, effective_def_level, path.current());
                    return Ok(());
                }
                let record = match value {
                    ParquetValue::Record(map) => map,
                    other => {
                        return Err(CarpetError::conversion(format!(
                            "expected Record for field `{}`, got {}",
                            field.column_name,
                            other.type_name()
                        )))
                    }
                };
                for child in &descriptor.fields {
                    let child_value = record
                        .get(child.column_name.as_str())
                        .cloned()
                        .unwrap_or(ParquetValue::Null);
                    self.shred_field(child, &child_value, own_def_level, path)?;
                }
                Ok(())
            }
            FieldType::List(element) | FieldType::Set(element) => {
                self.shred_list(field, element, value, is_null, own_def_level, effective_def_level, path)
            }
            FieldType::Map(key, value_field) => {
                self.shred_map(field, key, value_field, value, is_null, own_def_level, effective_def_level, path)
            }
            primitive => {
                let buffer = &mut self.leaves[self.cursor];
                self.cursor += 1;
                if is_null {
                    buffer.push_null(effective_def_level, path.current());
                } else {
                    buffer.push_value(value, primitive, self.config, effective_def_level, path.current())?;
                }
                Ok(())
            }
        }
    }

    /// Shreds a repeated (list/set) value. The first element shares the
    /// repetition level of whatever came before this field (no divergence
    /// yet); every subsequent element diverges at this field's own,
    /// one-deeper level — the standard Dremel shredding rule.
    #[allow(clippy::too_many_arguments)]
    fn shred_list(
        &mut self,
        field: &Field,
        element: &Field,
        value: &ParquetValue,
        is_null: bool,
        own_def_level: i16,
        effective_def_level: i16,
        path: &mut RepetitionPath,
    ) -> Result<()> {
        if is_null {
            self.shred_absent_subtree(std::slice::from_ref(element), effective_def_level, path.current());
            return Ok(());
        }
        let items = match value {
            ParquetValue::List(items) => items,
            other => {
                return Err(CarpetError::conversion(format!(
                    "expected List for field `{}`, got {}",
                    field.column_name,
                    other.type_name()
                )))
            }
        };

        if items.is_empty() {
            // Empty-but-present list: one entry at the list's own
            // definition level (the "list exists but has no elements"
            // state), repetition level unchanged.
            self.shred_absent_subtree(std::slice::from_ref(element), own_def_level, path.current());
            return Ok(());
        }

        if self.config.annotated_levels == AnnotatedLevel::Two {
            if let Some(pos) = items.iter().position(|item| item.is_null()) {
                return Err(CarpetError::data_validation(format!(
                    "field `{}`: 2-level list encoding cannot represent a null element (found one at index {})",
                    field.column_name, pos
                )));
            }
        }

        let base_level = path.current();
        let repeated_level = path.child().current();
        for (i, item) in items.iter().enumerate() {
            let rep_level = if i == 0 { base_level } else { repeated_level };
            let mut item_path = RepetitionPath::with_depth(rep_level);
            self.shred_field(element, item, own_def_level + 1, &mut item_path)?;
        }
        *path = RepetitionPath::with_depth(base_level);
        Ok(())
    }

    /// Shreds a map's entries. Key and value of the same entry share one
    /// repetition level (they live in the same `key_value` repeated
    /// group); the first-vs-subsequent divergence rule is the same as for
    /// lists (§4.3.4).
    #[allow(clippy::too_many_arguments)]
    fn shred_map(
        &mut self,
        field: &Field,
        key: &Field,
        value_field: &Field,
        value: &ParquetValue,
        is_null: bool,
        own_def_level: i16,
        effective_def_level: i16,
        path: &mut RepetitionPath,
    ) -> Result<()> {
        if is_null {
            self.shred_absent_subtree(&[key.clone(), value_field.clone()], effective_def_level, path.current());
            return Ok(());
        }
        let entries = match value {
            ParquetValue::Map(entries) => entries,
            other => {
                return Err(CarpetError::conversion(format!(
                    "expected Map for field `{}`, got {}",
                    field.column_name,
                    other.type_name()
                )))
            }
        };

        // Keys are always required on disk (§4.3.4); a null key is a
        // caller bug, and the whole entry is dropped rather than written.
        let entries: Vec<_> = entries.iter().filter(|(k, _)| !k.is_null()).collect();

        if entries.is_empty() {
            self.shred_absent_subtree(&[key.clone(), value_field.clone()], own_def_level, path.current());
            return Ok(());
        }

        let base_level = path.current();
        let repeated_level = path.child().current();
        for (i, (k, v)) in entries.iter().enumerate() {
            let rep_level = if i == 0 { base_level } else { repeated_level };
            let mut key_path = RepetitionPath::with_depth(rep_level);
            self.shred_field(key, k, own_def_level + 1, &mut key_path)?;
            let mut value_path = RepetitionPath::with_depth(rep_level);
            self.shred_field(value_field, v, own_def_level + 1, &mut value_path)?;
        }
        *path = RepetitionPath::with_depth(base_level);
        Ok(())
    }

    /// A null/empty repeated-or-optional ancestor still contributes
    /// exactly one level entry per leaf beneath it for this row.
    fn shred_absent_subtree(&mut self, fields: &[Field], definition_level: i16, repetition_level: i16) {
        for field in fields {
            self.shred_absent_field(field, definition_level, repetition_level);
        }
    }

    fn shred_absent_field(&mut self, field: &Field, definition_level: i16, repetition_level: i16) {
        match &field.field_type {
            FieldType::Record(descriptor) => {
                self.shred_absent_subtree(&descriptor.fields, definition_level, repetition_level)
            }
            FieldType::List(element) | FieldType::Set(element) => {
                self.shred_absent_field(element, definition_level, repetition_level)
            }
            FieldType::Map(key, value) => {
                self.shred_absent_field(key, definition_level, repetition_level);
                self.shred_absent_field(value, definition_level, repetition_level);
            }
            _ => {
                let buffer = &mut self.leaves[self.cursor];
                self.cursor += 1;
                buffer.push_null(definition_level, repetition_level);
            }
        }
    }
}

fn build_leaf_buffers(descriptor: &RecordDescriptor, config: &WriterConfig) -> Vec<LeafBuffer> {
    let mut leaves = Vec::new();
    push_leaf_buffers(&descriptor.fields, config, &mut leaves);
    leaves
}

fn push_leaf_buffers(fields: &[Field], config: &WriterConfig, leaves: &mut Vec<LeafBuffer>) {
    for field in fields {
        push_leaf_buffers_for(&field.field_type, config, leaves);
    }
}

fn push_leaf_buffers_for(field_type: &FieldType, config: &WriterConfig, leaves: &mut Vec<LeafBuffer>) {
    match field_type {
        FieldType::Record(descriptor) => push_leaf_buffers(&descriptor.fields, config, leaves),
        FieldType::List(element) | FieldType::Set(element) => {
            push_leaf_buffers_for(&element.field_type, config, leaves)
        }
        FieldType::Map(key, value) => {
            push_leaf_buffers_for(&key.field_type, config, leaves);
            push_leaf_buffers_for(&value.field_type, config, leaves);
        }
        primitive => leaves.push(LeafBuffer::for_field_type(primitive, config)),
    }
}

/// Writes a stream of `T: ToParquetRecord` rows to a Parquet file.
pub struct CarpetWriter<W: std::io::Write + Send, T: ToParquetRecord> {
    inner: Option<SerializedFileWriter<W>>,
    descriptor: Arc<RecordDescriptor>,
    config: WriterConfig,
    buffered_rows: Vec<Vec<ParquetValue>>,
    current_batch_size: usize,
    size_samples: Vec<usize>,
    total_rows_written: usize,
    fixed_batch_size: Option<usize>,
    _marker: std::marker::PhantomData<T>,
}

impl<W, T> CarpetWriter<W, T>
where
    W: std::io::Write + Send,
    T: ToParquetRecord,
{
    pub fn new(writer: W, config: WriterConfig) -> Result<Self> {
        let descriptor = T::record_descriptor();
        let message_type = derive_message_type(&descriptor, &config)?;
        let props = WriterProperties::builder().set_compression(config.compression).build();
        let inner = SerializedFileWriter::new(writer, Arc::new(message_type), Arc::new(props))?;

        Ok(CarpetWriter {
            inner: Some(inner),
            current_batch_size: config.batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
            fixed_batch_size: config.batch_size,
            size_samples: Vec::with_capacity(config.sample_size),
            total_rows_written: 0,
            buffered_rows: Vec::new(),
            descriptor,
            config,
            _marker: std::marker::PhantomData,
        })
    }

    pub fn write(&mut self, record: &T) -> Result<()> {
        let values = record.to_parquet_values();
        if values.len() != self.descriptor.fields.len() {
            return Err(CarpetError::schema(format!(
                "record produced {} values but descriptor `{}` has {} fields",
                values.len(),
                self.descriptor.type_name,
                self.descriptor.fields.len()
            )));
        }

        if self.fixed_batch_size.is_none() {
            self.sample_row_size(&values);
        }

        self.buffered_rows.push(values);
        if self.buffered_rows.len() >= self.current_batch_size {
            self.flush_row_group()?;
        }
        Ok(())
    }

    fn sample_row_size(&mut self, row: &[ParquetValue]) {
        let row_size: usize = row.iter().map(estimate_value_size).sum();
        if self.size_samples.len() < self.config.sample_size {
            self.size_samples.push(row_size);
        } else {
            let mut rng = rand::rng();
            let idx = rng.random_range(0..=self.total_rows_written);
            if idx < self.config.sample_size {
                self.size_samples[idx] = row_size;
            }
        }
        if self.size_samples.len() >= MIN_SAMPLES_FOR_ESTIMATE {
            let total: usize = self.size_samples.iter().sum();
            let avg = (total as f64 / self.size_samples.len() as f64).max(1.0);
            let suggested = (self.config.memory_threshold as f64 / avg).floor() as usize;
            self.current_batch_size = suggested.max(MIN_BATCH_SIZE);
        }
    }

    fn flush_row_group(&mut self) -> Result<()> {
        if self.buffered_rows.is_empty() {
            return Ok(());
        }
        let rows = std::mem::take(&mut self.buffered_rows);
        self.total_rows_written += rows.len();

        let mut leaves = build_leaf_buffers(&self.descriptor, &self.config);
        for row in &rows {
            let mut shredder = Shredder {
                leaves: &mut leaves,
                config: &self.config,
                cursor: 0,
            };
            shredder.shred_row(&self.descriptor.fields, row)?;
        }

        let writer = self.inner.as_mut().ok_or_else(|| CarpetError::internal("writer already closed"))?;
        let mut row_group_writer = writer.next_row_group()?;
        for leaf in &leaves {
            let mut column_writer = row_group_writer
                .next_column()?
                .ok_or_else(|| CarpetError::internal("schema/leaf-buffer column count mismatch"))?;
            write_leaf(&mut column_writer, leaf)?;
            column_writer.close()?;
        }
        row_group_writer.close()?;
        Ok(())
    }

    /// Flush the current row group's worth of buffered rows immediately.
    pub fn flush(&mut self) -> Result<()> {
        self.flush_row_group()
    }

    /// Finalize the file. Must be called for the footer to be written.
    pub fn close(mut self) -> Result<()> {
        self.flush_row_group()?;
        if let Some(inner) = self.inner.take() {
            inner.close()?;
        }
        Ok(())
    }
}

fn write_leaf(column_writer: &mut parquet::column::writer::ColumnWriter, leaf: &LeafBuffer) -> Result<()> {
    use parquet::column::writer::ColumnWriter as CW;
    match (column_writer, leaf) {
        (CW::BoolColumnWriter(w), LeafBuffer::Bool(b)) => {
            w.write_batch(&b.values, Some(&b.definition_levels), Some(&b.repetition_levels))?;
        }
        (CW::Int32ColumnWriter(w), LeafBuffer::Int32(b)) => {
            w.write_batch(&b.values, Some(&b.definition_levels), Some(&b.repetition_levels))?;
        }
        (CW::Int64ColumnWriter(w), LeafBuffer::Int64(b)) => {
            w.write_batch(&b.values, Some(&b.definition_levels), Some(&b.repetition_levels))?;
        }
        (CW::FloatColumnWriter(w), LeafBuffer::Float(b)) => {
            w.write_batch(&b.values, Some(&b.definition_levels), Some(&b.repetition_levels))?;
        }
        (CW::DoubleColumnWriter(w), LeafBuffer::Double(b)) => {
            w.write_batch(&b.values, Some(&b.definition_levels), Some(&b.repetition_levels))?;
        }
        (CW::ByteArrayColumnWriter(w), LeafBuffer::ByteArray(b)) => {
            w.write_batch(&b.values, Some(&b.definition_levels), Some(&b.repetition_levels))?;
        }
        (CW::FixedLenByteArrayColumnWriter(w), LeafBuffer::FixedLenByteArray(b)) => {
            w.write_batch(&b.values, Some(&b.definition_levels), Some(&b.repetition_levels))?;
        }
        _ => return Err(CarpetError::internal("column writer / leaf buffer kind mismatch")),
    }
    Ok(())
}

fn estimate_value_size(value: &ParquetValue) -> usize {
    match value {
        ParquetValue::Null => 0,
        ParquetValue::Boolean(_) => 1,
        ParquetValue::Int8(_) => 1,
        ParquetValue::Int16(_) => 2,
        ParquetValue::Int32(_) | ParquetValue::Float32(_) | ParquetValue::Date32(_) | ParquetValue::TimeMillis(_) => 4,
        ParquetValue::Int64(_)
        | ParquetValue::Float64(_)
        | ParquetValue::TimeMicros(_)
        | ParquetValue::TimestampMillis(_, _)
        | ParquetValue::TimestampMicros(_, _)
        | ParquetValue::TimestampNanos(_, _) => 8,
        ParquetValue::Uuid(_) => 16,
        ParquetValue::Decimal128(_, _) => 16,
        ParquetValue::String(s) => s.len() + 24,
        ParquetValue::Bytes(b) => b.len() + 24,
        ParquetValue::List(items) => 24 + items.iter().map(estimate_value_size).sum::<usize>(),
        ParquetValue::Map(entries) => {
            32 + entries
                .iter()
                .map(|(k, v)| estimate_value_size(k) + estimate_value_size(v))
                .sum::<usize>()
        }
        ParquetValue::Record(fields) => 24 + fields.values().map(estimate_value_size).sum::<usize>(),
        _ => 16,
    }
}
