//! Read-path entry points (§4.4): open a file, pull `parquet::record::Row`s
//! through the `parquet` crate's own record API, and run them through
//! `converter.rs` to produce either typed values (`CarpetReader<T>`) or an
//! untyped `ParquetValue::Record` view (`read_generic_rows`).
//!
//! Grounded on the Row/Field pull API shown by the retrieved sample pack's
//! `parquet::record::Row` usage, rather than the teacher's
//! `parquet::arrow::arrow_reader` path: Arrow's `RecordBatch` has no way to
//! preserve the exact 1/2/3-level list encoding a file was written with,
//! which the converter tree (and `list_shape.rs`) need to reason about.

use std::marker::PhantomData;
use std::sync::Arc;

use parquet::file::metadata::ParquetMetaData;
use parquet::file::reader::{ChunkReader, FileReader, SerializedFileReader};
use parquet::record::reader::RowIter;
use parquet::schema::types::Type as ParquetSchemaType;

use crate::converter::{self, FromParquetRecord};
use crate::error::{CarpetError, Result};
use crate::field::{Field, FieldType, RecordDescriptor};
use crate::list_shape;
use crate::value::ParquetValue;

/// Entry point for typed reads: `CarpetReader::<T>::open(file)` validates
/// the file's schema is compatible with `T`'s descriptor and returns an
/// iterator of `Result<T>`.
pub struct CarpetReader<T> {
    _marker: PhantomData<T>,
}

impl<T: FromParquetRecord> CarpetReader<T> {
    /// Open every row group, reading every column.
    pub fn open<R>(source: R) -> Result<CarpetRowIter<T>>
    where
        R: ChunkReader + 'static,
    {
        let descriptor = T::record_descriptor();
        let file_reader = SerializedFileReader::new(source)?;
        validate_schema_compatible(file_reader.metadata(), &descriptor)?;
        let inner = RowIter::from_file_into(None, Box::new(file_reader));
        Ok(CarpetRowIter {
            inner,
            descriptor,
            _marker: PhantomData,
        })
    }

    /// Open with column projection: only the named top-level columns are
    /// decoded off disk. Fields of `T` absent from `columns` must be
    /// nullable, since the projected rows won't carry a value for them.
    pub fn open_with_columns<R>(source: R, columns: &[&str]) -> Result<CarpetRowIter<T>>
    where
        R: ChunkReader + 'static,
    {
        let descriptor = T::record_descriptor();
        let file_reader = SerializedFileReader::new(source)?;
        let full_schema = file_reader.metadata().file_metadata().schema();
        validate_schema_compatible(file_reader.metadata(), &descriptor)?;
        let projection = build_projection(full_schema, columns)?;
        let inner = RowIter::from_file_into(Some(projection), Box::new(file_reader));
        Ok(CarpetRowIter {
            inner,
            descriptor,
            _marker: PhantomData,
        })
    }
}

/// Owned iterator over a file's rows, converting each into a `T` as it is
/// pulled. Built with `RowIter::from_file_into` so the iterator does not
/// borrow from a `SerializedFileReader` the caller has to keep alive
/// separately.
pub struct CarpetRowIter<T> {
    inner: RowIter<'static>,
    descriptor: Arc<RecordDescriptor>,
    _marker: PhantomData<T>,
}

impl<T: FromParquetRecord> Iterator for CarpetRowIter<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.inner.next()?;
        Some(row.map_err(CarpetError::from).and_then(|row| {
            let values = converter::row_to_values(&row, &self.descriptor)?;
            T::from_parquet_values(values)
        }))
    }
}

/// Untyped row iterator: every column, every row, converted through the
/// generic "bag of columns" view (§4.4.7) instead of a known descriptor.
/// Useful for inspecting a file whose record type isn't known at compile
/// time.
pub struct GenericRowIter {
    inner: RowIter<'static>,
}

pub fn read_generic_rows<R>(source: R) -> Result<GenericRowIter>
where
    R: ChunkReader + 'static,
{
    let file_reader = SerializedFileReader::new(source)?;
    let inner = RowIter::from_file_into(None, Box::new(file_reader));
    Ok(GenericRowIter { inner })
}

impl Iterator for GenericRowIter {
    type Item = Result<ParquetValue>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.inner.next()?;
        Some(
            row.map_err(CarpetError::from)
                .and_then(|row| converter::row_to_generic_record(&row)),
        )
    }
}

/// Checks that every required (non-nullable) field of `descriptor` has a
/// same-named top-level column in the file's schema, and that any top-level
/// `List`/`Set` field lines up with a group column rather than a bare
/// scalar. This is still a shallow, top-level check, not a full structural
/// match: the per-row converter (`converter.rs`) still surfaces a precise
/// `CarpetError::Conversion` for mismatches it finds deeper in the tree, but
/// failing fast here turns "file is missing a whole column" or "column isn't
/// list-shaped at all" into one clear error instead of one per row.
fn validate_schema_compatible(metadata: &ParquetMetaData, descriptor: &RecordDescriptor) -> Result<()> {
    let file_schema = metadata.file_metadata().schema();
    for field in &descriptor.fields {
        let file_field = file_schema.get_fields().iter().find(|f| f.name() == field.column_name);
        match file_field {
            None if !field.nullable => {
                return Err(CarpetError::schema(format!(
                    "required column `{}` not found in file schema",
                    field.column_name
                )));
            }
            None => {}
            Some(file_field) => check_list_shape(field, file_field)?,
        }
    }
    Ok(())
}

/// For a `List`/`Set`-typed field, reject a file column that is a bare
/// primitive leaf up front (§4.4.8): that can only mean the file was
/// written with a different record shape than `descriptor` describes, and
/// `list_shape::classify` exists precisely to tell a real 2-/3-level
/// encoding apart from a column that was never list-shaped at all.
fn check_list_shape(field: &Field, file_field: &ParquetSchemaType) -> Result<()> {
    use parquet::basic::Repetition;

    if !matches!(field.field_type, FieldType::List(_) | FieldType::Set(_)) {
        return Ok(());
    }
    // A bare `REPEATED` column (1-level encoding, §4.2.3) is list-shaped
    // whether its element is a primitive or a group; only a non-repeated
    // primitive leaf is a genuine mismatch.
    if file_field.get_basic_info().repetition() == Repetition::REPEATED {
        return Ok(());
    }
    if file_field.is_primitive() {
        return Err(CarpetError::schema(format!(
            "column `{}` is declared as a list but the file stores it as a scalar",
            field.column_name
        )));
    }
    // A `LIST`-annotated group with no repeated child at all (e.g. some
    // other group-typed column reusing the name) is the other shape
    // `classify` can't make sense of; real list encodings always have
    // exactly one child here regardless of which level `classify` reports.
    if file_field.get_fields().len() != 1 {
        return Err(CarpetError::schema(format!(
            "column `{}` is declared as a list but the file schema doesn't look list-shaped",
            field.column_name
        )));
    }
    let _ = list_shape::classify(file_field);
    Ok(())
}

/// Build a projected schema group containing only the named top-level
/// fields, preserving each field's full subtree (nested groups/lists/maps
/// are projected whole, not recursively pruned).
fn build_projection(full_schema: &ParquetSchemaType, columns: &[&str]) -> Result<ParquetSchemaType> {
    let mut fields: Vec<_> = full_schema
        .get_fields()
        .iter()
        .filter(|f| columns.contains(&f.name()))
        .cloned()
        .collect();

    if fields.is_empty() {
        return Err(CarpetError::invalid_argument(
            "column projection selects no columns present in the file schema",
        ));
    }

    ParquetSchemaType::group_type_builder(full_schema.name())
        .with_fields(&mut fields)
        .build()
        .map_err(CarpetError::from)
}

// `validate_schema_compatible` and the projection builder are exercised
// end to end in `tests/reader_converters.rs`, where the fixture schema
// comes from a real file `CarpetWriter` produced rather than a
// hand-assembled `ParquetMetaData`.
