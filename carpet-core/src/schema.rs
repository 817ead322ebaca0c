//! Schema derivation: turns a [`RecordDescriptor`] plus a [`WriterConfig`]
//! into a Parquet `MessageType` (§4.2).
//!
//! The distilled spec's abstract schema tree is realized directly as
//! `parquet::schema::types::Type`, the real file-container's own schema
//! representation, rather than through an intermediate schema-node tree
//! of our own — the pack's `pg2parquet` (`postgres_cloner.rs`) builds its
//! schema the same way, one `Type::primitive_type_builder`/
//! `Type::group_type_builder` call per record-descriptor field.

use std::collections::HashSet;
use std::sync::Arc;

use parquet::basic::{LogicalType, Repetition, Type as PhysicalType};
use parquet::format::{MicroSeconds, MilliSeconds, NanoSeconds, TimeUnit as FormatTimeUnit};
use parquet::schema::types::Type as ParquetType;

use crate::config::{AnnotatedLevel, TimeUnit, WriterConfig};
use crate::error::{CarpetError, Result};
use crate::field::{
    BinaryLogicalType, DecimalPhysical, DecimalSpec, Field, FieldType, RecordDescriptor, StringLogicalType,
};

/// Derive the `MessageType` for a root record descriptor.
pub fn derive_message_type(descriptor: &RecordDescriptor, config: &WriterConfig) -> Result<ParquetType> {
    let mut visiting: Vec<*const RecordDescriptor> = vec![descriptor as *const RecordDescriptor];
    let fields = derive_record_fields(descriptor, config, &mut visiting)?;

    ParquetType::group_type_builder(&descriptor.type_name)
        .with_fields(&mut fields.into_iter().map(Arc::new).collect())
        .build()
        .map_err(CarpetError::from)
}

fn derive_record_fields(
    descriptor: &RecordDescriptor,
    config: &WriterConfig,
    visiting: &mut Vec<*const RecordDescriptor>,
) -> Result<Vec<ParquetType>> {
    descriptor
        .fields
        .iter()
        .map(|field| derive_named_field(&field.column_name, field, repetition_of(field.nullable), field.field_id, config, visiting))
        .collect()
}

fn repetition_of(nullable: bool) -> Repetition {
    if nullable {
        Repetition::OPTIONAL
    } else {
        Repetition::REQUIRED
    }
}

/// Derive one named, explicitly-repeated Parquet type for `field`. Taking
/// the name and repetition as separate parameters (rather than reading
/// them off `field`) lets list/map encodings reuse this for synthetic
/// `element`/`key`/`value` fields that don't have their own `Field`.
fn derive_named_field(
    name: &str,
    field: &Field,
    repetition: Repetition,
    field_id: Option<i32>,
    config: &WriterConfig,
    visiting: &mut Vec<*const RecordDescriptor>,
) -> Result<ParquetType> {
    match &field.field_type {
        FieldType::Record(descriptor) => derive_record_field(name, field_id, descriptor, repetition, config, visiting),
        FieldType::List(element) | FieldType::Set(element) => {
            derive_list_field(name, field_id, element, repetition, config, visiting)
        }
        FieldType::Map(key, value) => derive_map_field(name, field_id, key, value, repetition, config, visiting),
        primitive => derive_primitive_field(name, field_id, primitive, repetition, config),
    }
}

fn derive_record_field(
    name: &str,
    field_id: Option<i32>,
    descriptor: &Arc<RecordDescriptor>,
    repetition: Repetition,
    config: &WriterConfig,
    visiting: &mut Vec<*const RecordDescriptor>,
) -> Result<ParquetType> {
    let ptr = Arc::as_ptr(descriptor);
    if visiting.contains(&ptr) {
        return Err(CarpetError::recursive(format!(
            "record type `{}` transitively contains itself",
            descriptor.type_name
        )));
    }
    visiting.push(ptr);
    let fields = derive_record_fields(descriptor, config, visiting)?;
    visiting.pop();

    let mut builder = ParquetType::group_type_builder(name)
        .with_repetition(repetition)
        .with_fields(&mut fields.into_iter().map(Arc::new).collect());
    if let Some(id) = field_id {
        builder = builder.with_id(Some(id));
    }
    builder.build().map_err(CarpetError::from)
}

/// List/Set encoding per §4.2.3, selected by `config.annotated_levels`.
fn derive_list_field(
    name: &str,
    field_id: Option<i32>,
    element: &Field,
    repetition: Repetition,
    config: &WriterConfig,
    visiting: &mut Vec<*const RecordDescriptor>,
) -> Result<ParquetType> {
    match config.annotated_levels {
        AnnotatedLevel::One => {
            if repetition == Repetition::OPTIONAL || element.nullable {
                return Err(CarpetError::unsupported(format!(
                    "field `{}`: 1-level list encoding cannot represent a nullable list or a nullable element",
                    name
                )));
            }
            if matches!(element.field_type, FieldType::List(_) | FieldType::Set(_)) {
                return Err(CarpetError::unsupported(format!(
                    "field `{}`: 1-level list encoding cannot nest a list/set directly inside another list",
                    name
                )));
            }
            derive_named_field(name, element, Repetition::REPEATED, field_id, config, visiting)
        }
        AnnotatedLevel::Two => {
            let element_type = derive_named_field("element", element, Repetition::REPEATED, None, config, visiting)?;
            let mut builder = ParquetType::group_type_builder(name)
                .with_repetition(repetition)
                .with_logical_type(Some(LogicalType::List))
                .with_fields(&mut vec![Arc::new(element_type)]);
            if let Some(id) = field_id {
                builder = builder.with_id(Some(id));
            }
            builder.build().map_err(CarpetError::from)
        }
        AnnotatedLevel::Three => {
            let element_type = derive_named_field(
                "element",
                element,
                repetition_of(element.nullable),
                None,
                config,
                visiting,
            )?;
            let list_group = ParquetType::group_type_builder("list")
                .with_repetition(Repetition::REPEATED)
                .with_fields(&mut vec![Arc::new(element_type)])
                .build()
                .map_err(CarpetError::from)?;
            let mut builder = ParquetType::group_type_builder(name)
                .with_repetition(repetition)
                .with_logical_type(Some(LogicalType::List))
                .with_fields(&mut vec![Arc::new(list_group)]);
            if let Some(id) = field_id {
                builder = builder.with_id(Some(id));
            }
            builder.build().map_err(CarpetError::from)
        }
    }
}

/// Map encoding per §4.3.4: always the annotated `key_value` form.
fn derive_map_field(
    name: &str,
    field_id: Option<i32>,
    key: &Field,
    value: &Field,
    repetition: Repetition,
    config: &WriterConfig,
    visiting: &mut Vec<*const RecordDescriptor>,
) -> Result<ParquetType> {
    if !key.field_type.is_valid_map_key() {
        return Err(CarpetError::unsupported(format!(
            "field `{}`: map key must be a scalar type",
            name
        )));
    }

    let key_type = derive_named_field("key", key, Repetition::REQUIRED, None, config, visiting)?;
    let value_type = derive_named_field("value", value, repetition_of(value.nullable), None, config, visiting)?;

    let key_value_group = ParquetType::group_type_builder("key_value")
        .with_repetition(Repetition::REPEATED)
        .with_fields(&mut vec![Arc::new(key_type), Arc::new(value_type)])
        .build()
        .map_err(CarpetError::from)?;

    let mut builder = ParquetType::group_type_builder(name)
        .with_repetition(repetition)
        .with_logical_type(Some(LogicalType::Map))
        .with_fields(&mut vec![Arc::new(key_value_group)]);
    if let Some(id) = field_id {
        builder = builder.with_id(Some(id));
    }
    builder.build().map_err(CarpetError::from)
}

fn derive_primitive_field(
    name: &str,
    field_id: Option<i32>,
    field_type: &FieldType,
    repetition: Repetition,
    config: &WriterConfig,
) -> Result<ParquetType> {
    let (physical, logical, length) = physical_and_logical(field_type, config)?;

    let mut builder = ParquetType::primitive_type_builder(name, physical).with_repetition(repetition);
    if let Some(logical) = logical {
        builder = builder.with_logical_type(Some(logical));
    }
    if let Some(length) = length {
        builder = builder.with_length(length);
    }
    if let FieldType::Decimal(spec) = field_type {
        builder = builder.with_precision(spec.precision as i32).with_scale(spec.scale as i32);
    }
    if let Some(id) = field_id {
        builder = builder.with_id(Some(id));
    }
    builder.build().map_err(CarpetError::from)
}

fn time_unit_format(unit: TimeUnit) -> FormatTimeUnit {
    match unit {
        TimeUnit::Millis => FormatTimeUnit::MILLIS(MilliSeconds {}),
        TimeUnit::Micros => FormatTimeUnit::MICROS(MicroSeconds {}),
        TimeUnit::Nanos => FormatTimeUnit::NANOS(NanoSeconds {}),
    }
}

fn physical_and_logical(
    field_type: &FieldType,
    config: &WriterConfig,
) -> Result<(PhysicalType, Option<LogicalType>, Option<i32>)> {
    Ok(match field_type {
        FieldType::Int8 => (
            PhysicalType::INT32,
            Some(LogicalType::Integer { bit_width: 8, is_signed: true }),
            None,
        ),
        FieldType::Int16 => (
            PhysicalType::INT32,
            Some(LogicalType::Integer { bit_width: 16, is_signed: true }),
            None,
        ),
        FieldType::Int32 => (PhysicalType::INT32, None, None),
        FieldType::Int64 => (PhysicalType::INT64, None, None),
        FieldType::Float32 => (PhysicalType::FLOAT, None, None),
        FieldType::Float64 => (PhysicalType::DOUBLE, None, None),
        FieldType::Bool => (PhysicalType::BOOLEAN, None, None),
        FieldType::BinaryString(logical) => (
            PhysicalType::BYTE_ARRAY,
            Some(match logical {
                StringLogicalType::Plain => LogicalType::String,
                StringLogicalType::Enum => LogicalType::Enum,
                StringLogicalType::Json => LogicalType::Json,
            }),
            None,
        ),
        FieldType::OpaqueBinary(logical) => (
            PhysicalType::BYTE_ARRAY,
            match logical {
                BinaryLogicalType::Plain => None,
                BinaryLogicalType::Enum => Some(LogicalType::Enum),
                BinaryLogicalType::Json => Some(LogicalType::Json),
                BinaryLogicalType::Bson => Some(LogicalType::Bson),
                BinaryLogicalType::Geometry { crs } => Some(LogicalType::Geometry { crs: crs.clone() }),
                BinaryLogicalType::Geography { crs, edge_algorithm } => Some(LogicalType::Geography {
                    crs: crs.clone(),
                    algorithm: edge_algorithm.clone(),
                }),
            },
            None,
        ),
        FieldType::EnumLike(_) => (PhysicalType::BYTE_ARRAY, Some(LogicalType::Enum), None),
        FieldType::Uuid => (PhysicalType::FIXED_LEN_BYTE_ARRAY, Some(LogicalType::Uuid), Some(16)),
        FieldType::Decimal(spec) => return decimal_physical_and_logical(spec),
        FieldType::DateOnly => (PhysicalType::INT32, Some(LogicalType::Date), None),
        FieldType::TimeOfDay => {
            let unit = config.default_time_unit;
            let physical = if unit == TimeUnit::Millis { PhysicalType::INT32 } else { PhysicalType::INT64 };
            (
                physical,
                Some(LogicalType::Time {
                    is_adjusted_to_u_t_c: false,
                    unit: time_unit_format(unit),
                }),
                None,
            )
        }
        FieldType::LocalTimestamp => (
            PhysicalType::INT64,
            Some(LogicalType::Timestamp {
                is_adjusted_to_u_t_c: false,
                unit: time_unit_format(config.default_time_unit),
            }),
            None,
        ),
        FieldType::InstantTimestamp => (
            PhysicalType::INT64,
            Some(LogicalType::Timestamp {
                is_adjusted_to_u_t_c: true,
                unit: time_unit_format(config.default_time_unit),
            }),
            None,
        ),
        FieldType::List(_) | FieldType::Set(_) | FieldType::Map(_, _) | FieldType::Record(_) => {
            return Err(CarpetError::internal("not a primitive field type"))
        }
    })
}

fn decimal_physical_and_logical(spec: &DecimalSpec) -> Result<(PhysicalType, Option<LogicalType>, Option<i32>)> {
    let logical = Some(LogicalType::Decimal {
        scale: spec.scale as i32,
        precision: spec.precision as i32,
    });
    Ok(match spec.physical_width() {
        DecimalPhysical::Int32 => (PhysicalType::INT32, logical, None),
        DecimalPhysical::Int64 => (PhysicalType::INT64, logical, None),
        DecimalPhysical::FixedLenByteArray(width) => (PhysicalType::FIXED_LEN_BYTE_ARRAY, logical, Some(width as i32)),
    })
}

/// Collects the set of distinct `RecordDescriptor` identities transitively
/// reachable from a root, used by tests to assert DAG vs. cycle shape.
pub fn reachable_descriptor_identities(descriptor: &RecordDescriptor) -> HashSet<*const RecordDescriptor> {
    let mut seen = HashSet::new();
    collect(descriptor, &mut seen);
    seen
}

fn collect(descriptor: &RecordDescriptor, seen: &mut HashSet<*const RecordDescriptor>) {
    if !seen.insert(descriptor as *const RecordDescriptor) {
        return;
    }
    for field in &descriptor.fields {
        collect_field_type(&field.field_type, seen);
    }
}

fn collect_field_type(field_type: &FieldType, seen: &mut HashSet<*const RecordDescriptor>) {
    match field_type {
        FieldType::Record(descriptor) => collect(descriptor, seen),
        FieldType::List(inner) | FieldType::Set(inner) => collect_field_type(&inner.field_type, seen),
        FieldType::Map(key, value) => {
            collect_field_type(&key.field_type, seen);
            collect_field_type(&value.field_type, seen);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WriterConfig;
    use crate::field::{Field, FieldType, RecordDescriptor};

    fn simple_descriptor() -> RecordDescriptor {
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
    fn derives_required_and_optional_primitive_fields() {
        let descriptor = simple_descriptor();
        let config = WriterConfig::default();
        let message = derive_message_type(&descriptor, &config).unwrap();
        assert_eq!(message.name(), "Person");
        let fields = message.get_fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].get_basic_info().repetition(), Repetition::REQUIRED);
        assert_eq!(fields[1].get_basic_info().repetition(), Repetition::OPTIONAL);
    }

    #[test]
    fn three_level_list_wraps_list_then_element() {
        let descriptor = RecordDescriptor::try_new(
            "Order",
            vec![Field::new(
                "tags",
                FieldType::List(Box::new(Field::new(
                    "elem",
                    FieldType::BinaryString(StringLogicalType::Plain),
                    false,
                ))),
                true,
            )],
        )
        .unwrap();
        let config = WriterConfig::default();
        let message = derive_message_type(&descriptor, &config).unwrap();
        let tags = &message.get_fields()[0];
        assert_eq!(tags.get_basic_info().repetition(), Repetition::OPTIONAL);
        let list_group = &tags.get_fields()[0];
        assert_eq!(list_group.name(), "list");
        assert_eq!(list_group.get_basic_info().repetition(), Repetition::REPEATED);
        let element = &list_group.get_fields()[0];
        assert_eq!(element.name(), "element");
    }

    #[test]
    fn one_level_list_rejects_nested_list() {
        let descriptor = RecordDescriptor::try_new(
            "Order",
            vec![Field::new(
                "matrix",
                FieldType::List(Box::new(Field::new(
                    "row",
                    FieldType::List(Box::new(Field::new("cell", FieldType::Int32, false))),
                    false,
                ))),
                false,
            )],
        )
        .unwrap();
        let mut config = WriterConfig::default();
        config.annotated_levels = AnnotatedLevel::One;
        let err = derive_message_type(&descriptor, &config).unwrap_err();
        assert!(matches!(err, CarpetError::Unsupported(_)));
    }

    #[test]
    fn one_level_list_rejects_nullable_list() {
        let descriptor = RecordDescriptor::try_new(
            "Order",
            vec![Field::new(
                "tags",
                FieldType::List(Box::new(Field::new("elem", FieldType::Int32, false))),
                true,
            )],
        )
        .unwrap();
        let mut config = WriterConfig::default();
        config.annotated_levels = AnnotatedLevel::One;
        let err = derive_message_type(&descriptor, &config).unwrap_err();
        assert!(matches!(err, CarpetError::Unsupported(_)));
    }

    #[test]
    fn one_level_list_of_required_elements_is_bare_repeated_field() {
        let descriptor = RecordDescriptor::try_new(
            "Order",
            vec![Field::new(
                "tags",
                FieldType::List(Box::new(Field::new("elem", FieldType::Int32, false))),
                false,
            )],
        )
        .unwrap();
        let mut config = WriterConfig::default();
        config.annotated_levels = AnnotatedLevel::One;
        let message = derive_message_type(&descriptor, &config).unwrap();
        let tags = &message.get_fields()[0];
        assert_eq!(tags.get_basic_info().repetition(), Repetition::REPEATED);
        assert!(tags.is_primitive());
    }

    #[test]
    fn map_encoding_uses_key_value_group() {
        let descriptor = RecordDescriptor::try_new(
            "Config",
            vec![Field::new(
                "props",
                FieldType::Map(
                    Box::new(Field::new("key", FieldType::BinaryString(StringLogicalType::Plain), false)),
                    Box::new(Field::new("value", FieldType::Int32, false)),
                ),
                false,
            )],
        )
        .unwrap();
        let config = WriterConfig::default();
        let message = derive_message_type(&descriptor, &config).unwrap();
        let props = &message.get_fields()[0];
        let key_value = &props.get_fields()[0];
        assert_eq!(key_value.name(), "key_value");
        assert_eq!(key_value.get_fields().len(), 2);
    }

    #[test]
    fn rejects_map_with_list_key() {
        let descriptor = RecordDescriptor::try_new(
            "Config",
            vec![Field::new(
                "props",
                FieldType::Map(
                    Box::new(Field::new(
                        "key",
                        FieldType::List(Box::new(Field::new("k", FieldType::Int32, false))),
                        false,
                    )),
                    Box::new(Field::new("value", FieldType::Int32, false)),
                ),
                false,
            )],
        )
        .unwrap();
        let config = WriterConfig::default();
        let err = derive_message_type(&descriptor, &config).unwrap_err();
        assert!(matches!(err, CarpetError::Unsupported(_)));
    }

    #[test]
    fn decimal_selects_physical_type_by_precision() {
        let descriptor = RecordDescriptor::try_new(
            "Money",
            vec![Field::new("amount", FieldType::Decimal(DecimalSpec::new(30, 4).unwrap()), false)],
        )
        .unwrap();
        let config = WriterConfig::default();
        let message = derive_message_type(&descriptor, &config).unwrap();
        let amount = &message.get_fields()[0];
        assert_eq!(amount.get_physical_type(), PhysicalType::FIXED_LEN_BYTE_ARRAY);
    }
}
