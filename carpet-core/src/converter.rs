//! Read-path converter tree (§4.4): turns a `parquet::record::Row` pulled
//! from the `parquet` crate's own record API into `ParquetValue`s shaped
//! by a `RecordDescriptor`, including the numeric widening table (§4.4.6)
//! and the generic, descriptor-free "bag of columns" view (§4.4.7).
//!
//! Grounded on the `parquet::record::{Row, Field}` pull API (see the
//! import example under the retrieved sample pack), deliberately used in
//! place of Arrow `RecordBatch` decoding: the Row API already resolves
//! 1/2/3-level list encodings into a single uniform `Field::ListInternal`
//! shape, so this module converts from that already-normalized surface
//! rather than re-deriving list shape itself (that bookkeeping is only
//! needed on the write path, see `writer.rs`, and for the structural
//! schema check in `list_shape.rs`).

use std::sync::Arc;

use bytes::Bytes;
use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use parquet::record::Field as PField;
use parquet::record::Row;

use crate::error::{CarpetError, Result};
use crate::field::{DecimalSpec, Field, FieldType, RecordDescriptor};
use crate::value::ParquetValue;

/// Implemented by any type the reader can materialize from Parquet.
///
/// `#[derive(ParquetRecord)]` generates this impl alongside
/// `ToParquetRecord`, so a single derive gives a type both directions of
/// the write/read round trip (§4.1, §4.4).
pub trait FromParquetRecord: Sized {
    fn record_descriptor() -> Arc<RecordDescriptor>;

    /// Build `Self` from the already-converted column values, in
    /// `record_descriptor()` order. Generated code indexes into `values`
    /// positionally; a length mismatch is a bug in the derive macro, not
    /// a data error, so it panics rather than returning `Result`.
    fn from_parquet_values(values: Vec<ParquetValue>) -> Result<Self>;
}

/// Convert one pulled row into a `ParquetValue::Record` keyed by the
/// descriptor's column order, recursing into nested groups/lists/maps.
pub fn row_to_record(row: &Row, descriptor: &RecordDescriptor) -> Result<ParquetValue> {
    let mut out = IndexMap::with_capacity(descriptor.fields.len());
    for field in &descriptor.fields {
        let raw = find_column(row, &field.column_name);
        let value = convert_named_field(raw, field)
            .map_err(|e| CarpetError::conversion(format!("field `{}`: {}", field.column_name, e)))?;
        out.insert(Arc::from(field.column_name.as_str()), value);
    }
    Ok(ParquetValue::Record(out))
}

/// Like [`row_to_record`] but returns the per-field values in descriptor
/// order instead of a keyed map, for `FromParquetRecord::from_parquet_values`.
pub fn row_to_values(row: &Row, descriptor: &RecordDescriptor) -> Result<Vec<ParquetValue>> {
    descriptor
        .fields
        .iter()
        .map(|field| {
            let raw = find_column(row, &field.column_name);
            convert_named_field(raw, field)
                .map_err(|e| CarpetError::conversion(format!("field `{}`: {}", field.column_name, e)))
        })
        .collect()
}

/// Rebuild a nested `FromParquetRecord` value out of a `ParquetValue::Record`
/// produced for a struct-typed field. The derive macro calls this for every
/// nested-record field instead of generating the lookup-by-name inline.
pub fn value_to_record<T: FromParquetRecord>(value: ParquetValue) -> Result<T> {
    match value {
        ParquetValue::Record(map) => {
            let descriptor = T::record_descriptor();
            let values: Vec<ParquetValue> = descriptor
                .fields
                .iter()
                .map(|f| map.get(f.column_name.as_str()).cloned().unwrap_or(ParquetValue::Null))
                .collect();
            T::from_parquet_values(values)
        }
        other => Err(CarpetError::conversion(format!(
            "expected a record value, found {}",
            other.type_name()
        ))),
    }
}

fn find_column<'a>(row: &'a Row, name: &str) -> Option<&'a PField> {
    row.get_column_iter().find(|(n, _)| n.as_str() == name).map(|(_, f)| f)
}

fn convert_named_field(raw: Option<&PField>, field: &Field) -> Result<ParquetValue> {
    match raw {
        None | Some(PField::Null) => {
            if field.nullable {
                Ok(ParquetValue::Null)
            } else {
                Err(CarpetError::data_validation(format!(
                    "missing or null value for required field `{}`",
                    field.column_name
                )))
            }
        }
        Some(other) => convert_value(other, &field.field_type),
    }
}

fn convert_value(raw: &PField, field_type: &FieldType) -> Result<ParquetValue> {
    match field_type {
        FieldType::Record(descriptor) => match raw {
            PField::Group(row) => row_to_record(row, descriptor),
            other => Err(mismatch("group", other)),
        },
        FieldType::List(element) | FieldType::Set(element) => match raw {
            PField::ListInternal(list) => {
                let mut items = Vec::with_capacity(list.elements().len());
                for elem in list.elements() {
                    items.push(convert_named_field(Some(elem), element)?);
                }
                Ok(ParquetValue::List(items))
            }
            other => Err(mismatch("list", other)),
        },
        FieldType::Map(key_field, value_field) => match raw {
            PField::MapInternal(map) => {
                let mut entries = Vec::with_capacity(map.entries().len());
                for (k, v) in map.entries() {
                    // A null map key has no valid target column value; the
                    // entry is dropped rather than surfaced as an error,
                    // matching Parquet's own key-value group convention of
                    // treating the key as required.
                    if matches!(k, PField::Null) {
                        continue;
                    }
                    let key_value = convert_value(k, &key_field.field_type)?;
                    let value_value = convert_named_field(Some(v), value_field)?;
                    entries.push((key_value, value_value));
                }
                Ok(ParquetValue::Map(entries))
            }
            other => Err(mismatch("map", other)),
        },
        primitive => convert_primitive(raw, primitive),
    }
}

fn convert_primitive(raw: &PField, field_type: &FieldType) -> Result<ParquetValue> {
    match field_type {
        FieldType::Bool => match raw {
            PField::Bool(b) => Ok(ParquetValue::Boolean(*b)),
            other => Err(mismatch("Bool", other)),
        },
        FieldType::Int8 | FieldType::Int16 | FieldType::Int32 | FieldType::Int64 => {
            widen_int(raw, field_type)
        }
        FieldType::Float32 | FieldType::Float64 => widen_float(raw, field_type),
        FieldType::BinaryString(_) | FieldType::EnumLike(_) => as_string(raw),
        FieldType::OpaqueBinary(_) => as_bytes(raw).map(|b| ParquetValue::Bytes(Bytes::from(b))),
        FieldType::Uuid => as_uuid(raw),
        FieldType::Decimal(spec) => as_decimal(raw, spec),
        FieldType::DateOnly => as_date(raw),
        FieldType::TimeOfDay => as_time(raw),
        FieldType::LocalTimestamp => as_timestamp(raw, false),
        FieldType::InstantTimestamp => as_timestamp(raw, true),
        FieldType::List(_) | FieldType::Set(_) | FieldType::Map(_, _) | FieldType::Record(_) => {
            unreachable!("convert_primitive is only called for leaf field types")
        }
    }
}

fn mismatch(expected: &str, actual: &PField) -> CarpetError {
    CarpetError::conversion(format!("expected a {} value, found {:?}", expected, actual))
}

fn as_string(raw: &PField) -> Result<ParquetValue> {
    match raw {
        PField::Str(s) => Ok(ParquetValue::String(Arc::from(s.as_str()))),
        PField::Bytes(b) => Ok(ParquetValue::String(Arc::from(
            String::from_utf8_lossy(b.data()).into_owned().as_str(),
        ))),
        other => Err(mismatch("string", other)),
    }
}

fn as_bytes(raw: &PField) -> Result<Vec<u8>> {
    match raw {
        PField::Bytes(b) => Ok(b.data().to_vec()),
        PField::Str(s) => Ok(s.as_bytes().to_vec()),
        other => Err(mismatch("bytes", other)),
    }
}

fn as_uuid(raw: &PField) -> Result<ParquetValue> {
    let bytes = as_bytes(raw)?;
    let array: [u8; 16] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| CarpetError::conversion(format!("expected a 16-byte UUID, got {} bytes", bytes.len())))?;
    Ok(ParquetValue::Uuid(array))
}

/// Decode a Parquet `DECIMAL` byte array (big-endian two's complement) into
/// an `i128` unscaled value. Rejects an input wider than 16 bytes rather
/// than silently dropping its most-significant byte(s): that width exceeds
/// anything this crate's own writer produces (§8.1, `MAX_DECIMAL_PRECISION`
/// caps a written column at 16 bytes), so it can only come from a foreign
/// file's column using a precision our decimal type can't represent.
fn decode_decimal_bytes(bytes: &[u8]) -> Result<i128> {
    if bytes.is_empty() {
        return Ok(0);
    }
    if bytes.len() > 16 {
        return Err(CarpetError::conversion(format!(
            "decimal column is {} bytes wide, exceeding the 16 bytes an i128 mantissa holds",
            bytes.len()
        )));
    }
    let negative = bytes[0] & 0x80 != 0;
    let mut buf = [if negative { 0xFFu8 } else { 0u8 }; 16];
    let start = 16 - bytes.len();
    buf[start..].copy_from_slice(bytes);
    Ok(i128::from_be_bytes(buf))
}

fn as_decimal(raw: &PField, spec: &DecimalSpec) -> Result<ParquetValue> {
    let unscaled = match raw {
        PField::Decimal(d) => decode_decimal_bytes(d.data())?,
        PField::Int(v) => *v as i128,
        PField::Long(v) => *v as i128,
        other => return Err(mismatch("decimal", other)),
    };
    Ok(ParquetValue::Decimal128(unscaled, spec.scale as i8))
}

fn as_date(raw: &PField) -> Result<ParquetValue> {
    match raw {
        PField::Date(d) => Ok(ParquetValue::Date32(*d)),
        PField::Int(v) => Ok(ParquetValue::Date32(*v)),
        other => Err(mismatch("date", other)),
    }
}

fn as_time(raw: &PField) -> Result<ParquetValue> {
    match raw {
        PField::TimeMillis(t) => Ok(ParquetValue::TimeMillis(*t)),
        PField::TimeMicros(t) => Ok(ParquetValue::TimeMicros(*t)),
        PField::Int(v) => Ok(ParquetValue::TimeMillis(*v)),
        PField::Long(v) => Ok(ParquetValue::TimeMicros(*v)),
        other => Err(mismatch("time of day", other)),
    }
}

fn as_timestamp(raw: &PField, is_instant: bool) -> Result<ParquetValue> {
    // `InstantTimestamp` is adjusted-to-UTC on disk; tag it so round-tripping
    // back through the write path reproduces the same annotation. `Long` is
    // the fallback the underlying row reader hands back for a timestamp unit
    // it does not itself expose a dedicated variant for (nanoseconds); we
    // treat that raw value as already being in the column's default unit.
    let tz: Option<Arc<str>> = if is_instant { Some(Arc::from("UTC")) } else { None };
    match raw {
        PField::TimestampMillis(t) => Ok(ParquetValue::TimestampMillis(*t, tz)),
        PField::TimestampMicros(t) => Ok(ParquetValue::TimestampMicros(*t, tz)),
        PField::Long(v) => Ok(ParquetValue::TimestampMicros(*v, tz)),
        other => Err(mismatch("timestamp", other)),
    }
}

fn physical_int(raw: &PField) -> Option<i64> {
    match raw {
        PField::Byte(v) => Some(*v as i64),
        PField::Short(v) => Some(*v as i64),
        PField::Int(v) => Some(*v as i64),
        PField::UByte(v) => Some(*v as i64),
        PField::UShort(v) => Some(*v as i64),
        PField::UInt(v) => Some(*v as i64),
        PField::Long(v) => Some(*v),
        PField::ULong(v) => Some(*v as i64),
        _ => None,
    }
}

/// Widen a physical `INT32`/`INT64` column (and the narrower row-reader
/// variants layered on top of it) up to the logical target width (§4.4.6).
fn widen_int(raw: &PField, target: &FieldType) -> Result<ParquetValue> {
    let value = physical_int(raw).ok_or_else(|| mismatch("integer", raw))?;
    Ok(match target {
        FieldType::Int8 => ParquetValue::Int8(value as i8),
        FieldType::Int16 => ParquetValue::Int16(value as i16),
        FieldType::Int32 => ParquetValue::Int32(value as i32),
        FieldType::Int64 => ParquetValue::Int64(value),
        _ => unreachable!("widen_int only called for integer targets"),
    })
}

/// Widen a physical `FLOAT`/`DOUBLE` column, or an integer column reused as
/// a floating-point target, up to the logical target width (§4.4.6).
fn widen_float(raw: &PField, target: &FieldType) -> Result<ParquetValue> {
    match raw {
        PField::Float(v) => Ok(match target {
            FieldType::Float32 => ParquetValue::Float32(OrderedFloat(*v)),
            FieldType::Float64 => ParquetValue::Float64(OrderedFloat(*v as f64)),
            _ => unreachable!("widen_float only called for float targets"),
        }),
        PField::Double(v) => match target {
            FieldType::Float64 => Ok(ParquetValue::Float64(OrderedFloat(*v))),
            FieldType::Float32 => Err(CarpetError::conversion(
                "cannot narrow a physical DOUBLE column into a Float32 field",
            )),
            _ => unreachable!("widen_float only called for float targets"),
        },
        other => {
            if let Some(i) = physical_int(other) {
                Ok(match target {
                    FieldType::Float32 => ParquetValue::Float32(OrderedFloat(i as f32)),
                    FieldType::Float64 => ParquetValue::Float64(OrderedFloat(i as f64)),
                    _ => unreachable!("widen_float only called for float targets"),
                })
            } else {
                Err(mismatch("float", other))
            }
        }
    }
}

/// Convert a whole row into a `ParquetValue::Record` without a
/// `RecordDescriptor`, inferring each column's shape from the physical
/// value the row reader produced (§4.4.7 generic map view). Useful for
/// ad hoc inspection of a file whose schema isn't known at compile time.
pub fn row_to_generic_record(row: &Row) -> Result<ParquetValue> {
    let mut out = IndexMap::new();
    for (name, raw) in row.get_column_iter() {
        out.insert(Arc::from(name.as_str()), generic_field_value(raw)?);
    }
    Ok(ParquetValue::Record(out))
}

fn generic_field_value(raw: &PField) -> Result<ParquetValue> {
    Ok(match raw {
        PField::Null => ParquetValue::Null,
        PField::Bool(b) => ParquetValue::Boolean(*b),
        PField::Byte(v) => ParquetValue::Int8(*v),
        PField::Short(v) => ParquetValue::Int16(*v),
        PField::Int(v) => ParquetValue::Int32(*v),
        PField::Long(v) => ParquetValue::Int64(*v),
        PField::UByte(v) => ParquetValue::UInt8(*v),
        PField::UShort(v) => ParquetValue::UInt16(*v),
        PField::UInt(v) => ParquetValue::UInt32(*v),
        PField::ULong(v) => ParquetValue::UInt64(*v),
        PField::Float16(v) => ParquetValue::Float16(OrderedFloat(f32::from(*v))),
        PField::Float(v) => ParquetValue::Float32(OrderedFloat(*v)),
        PField::Double(v) => ParquetValue::Float64(OrderedFloat(*v)),
        PField::Str(s) => ParquetValue::String(Arc::from(s.as_str())),
        PField::Bytes(b) => ParquetValue::Bytes(Bytes::copy_from_slice(b.data())),
        PField::Decimal(d) => ParquetValue::Decimal128(decode_decimal_bytes(d.data())?, d.scale() as i8),
        PField::Date(d) => ParquetValue::Date32(*d),
        PField::TimeMillis(t) => ParquetValue::TimeMillis(*t),
        PField::TimeMicros(t) => ParquetValue::TimeMicros(*t),
        PField::TimestampMillis(t) => ParquetValue::TimestampMillis(*t, None),
        PField::TimestampMicros(t) => ParquetValue::TimestampMicros(*t, None),
        PField::Group(row) => row_to_generic_record(row)?,
        PField::ListInternal(list) => ParquetValue::List(
            list.elements()
                .iter()
                .map(generic_field_value)
                .collect::<Result<Vec<_>>>()?,
        ),
        PField::MapInternal(map) => {
            let mut entries = Vec::with_capacity(map.entries().len());
            for (k, v) in map.entries() {
                entries.push((generic_field_value(k)?, generic_field_value(v)?));
            }
            ParquetValue::Map(entries)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::StringLogicalType;

    fn descriptor() -> RecordDescriptor {
        RecordDescriptor::try_new(
            "Person",
            vec![
                Field::new("id", FieldType::Int64, false),
                Field::new("name", FieldType::BinaryString(StringLogicalType::Plain), true),
            ],
        )
        .unwrap()
    }

    #[test]
    fn rejects_missing_required_column() {
        let d = descriptor();
        let err = convert_named_field(None, &d.fields[0]).unwrap_err();
        assert!(matches!(err, CarpetError::DataValidation(_)));
    }

    #[test]
    fn nullable_missing_column_becomes_null() {
        let d = descriptor();
        let v = convert_named_field(None, &d.fields[1]).unwrap();
        assert_eq!(v, ParquetValue::Null);
    }

    #[test]
    fn widens_int32_physical_to_int64_logical() {
        let v = widen_int(&PField::Int(42), &FieldType::Int64).unwrap();
        assert_eq!(v, ParquetValue::Int64(42));
    }

    #[test]
    fn widens_physical_int_to_float_target() {
        let v = widen_float(&PField::Int(7), &FieldType::Float64).unwrap();
        assert_eq!(v, ParquetValue::Float64(OrderedFloat(7.0)));
    }

    #[test]
    fn rejects_double_narrowed_to_float32() {
        let err = widen_float(&PField::Double(1.5), &FieldType::Float32).unwrap_err();
        assert!(matches!(err, CarpetError::Conversion(_)));
    }

    #[test]
    fn decodes_negative_decimal_bytes() {
        // -1 as a 2-byte big-endian two's complement value.
        let value = decode_decimal_bytes(&[0xFF, 0xFF]).unwrap();
        assert_eq!(value, -1);
    }

    #[test]
    fn decodes_positive_decimal_bytes() {
        let value = decode_decimal_bytes(&[0x01, 0x00]).unwrap();
        assert_eq!(value, 256);
    }

    #[test]
    fn rejects_a_decimal_wider_than_an_i128_mantissa() {
        let err = decode_decimal_bytes(&[0u8; 17]).unwrap_err();
        assert!(matches!(err, CarpetError::Conversion(_)));
    }
}
