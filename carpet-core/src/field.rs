//! The closed `FieldType` sum and the `Field`/`RecordDescriptor` builders
//! that schema derivation, the writer compiler and the converter tree all
//! consume.
//!
//! This is a tagged union by design (§9 Design Notes): every consumer
//! exhaustively matches on `FieldType` rather than dispatching through a
//! trait object, so adding a variant is a compile error everywhere it
//! isn't handled yet instead of a silent no-op.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{CarpetError, Result};

/// How a `BinaryString` field's bytes are annotated in the Parquet schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringLogicalType {
    #[default]
    Plain,
    Enum,
    Json,
}

/// How an `OpaqueBinary` field's bytes are annotated in the Parquet schema.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BinaryLogicalType {
    #[default]
    Plain,
    Enum,
    Json,
    Bson,
    Geometry { crs: Option<String> },
    Geography {
        crs: Option<String>,
        edge_algorithm: Option<String>,
    },
}

/// How an absent-on-disk rounding mode is resolved during decimal rescale
/// (§4.3.5). Mirrors `java.math.RoundingMode`'s subset actually reachable
/// from the distilled spec's rescale rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingMode {
    Up,
    Down,
    Ceiling,
    Floor,
    HalfUp,
    HalfDown,
    HalfEven,
}

/// Largest precision a `Decimal` field can carry: an `i128` mantissa's
/// two's-complement range (`-2^127..2^127-1`) holds at most 38 decimal
/// digits, one short of the 39 a 17-byte `FIXED_LEN_BYTE_ARRAY` would need.
pub const MAX_DECIMAL_PRECISION: u32 = 38;

/// Precision/scale/rounding configuration carried by a `Decimal` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalSpec {
    pub precision: u32,
    pub scale: u32,
    pub rounding_mode: Option<RoundingMode>,
}

impl DecimalSpec {
    /// Rejects `precision` of `0` or greater than [`MAX_DECIMAL_PRECISION`]:
    /// beyond that an unscaled value no longer fits the `i128` mantissa the
    /// rest of this type relies on (§4.3.5).
    pub fn new(precision: u32, scale: u32) -> Result<Self> {
        if precision == 0 || precision > MAX_DECIMAL_PRECISION {
            return Err(CarpetError::invalid_argument(format!(
                "decimal precision must be between 1 and {MAX_DECIMAL_PRECISION}, got {precision}"
            )));
        }
        Ok(DecimalSpec {
            precision,
            scale,
            rounding_mode: None,
        })
    }

    pub fn with_rounding(mut self, mode: RoundingMode) -> Self {
        self.rounding_mode = Some(mode);
        self
    }

    /// The Parquet physical type a decimal of this precision is stored as:
    /// `INT32` up to 9 digits, `INT64` up to 18, `FIXED_LEN_BYTE_ARRAY`
    /// (sized to fit `precision` digits) beyond that.
    pub fn physical_width(&self) -> DecimalPhysical {
        if self.precision <= 9 {
            DecimalPhysical::Int32
        } else if self.precision <= 18 {
            DecimalPhysical::Int64
        } else {
            DecimalPhysical::FixedLenByteArray(Self::byte_width_for_precision(self.precision))
        }
    }

    fn byte_width_for_precision(precision: u32) -> usize {
        // smallest n such that 2^(8n-1) - 1 >= 10^precision - 1
        let mut n = 1usize;
        loop {
            let max_digits = ((8 * n - 1) as f64 * std::f64::consts::LOG10_2).floor() as u32;
            if max_digits >= precision {
                return n;
            }
            n += 1;
        }
    }

    /// Rescale an unscaled `i128` mantissa from `value_scale` to this
    /// spec's target scale, per §4.3.5: widening to a larger scale is
    /// always exact; narrowing to a smaller scale rounds per
    /// `rounding_mode` if one is configured, or fails if the narrowing
    /// would be inexact. The resulting mantissa is then checked against
    /// `precision`.
    pub fn rescale(&self, value: i128, value_scale: i8) -> Result<i128> {
        let target_scale = self.scale as i32;
        let value_scale = value_scale as i32;

        let rescaled = match target_scale.cmp(&value_scale) {
            std::cmp::Ordering::Equal => value,
            std::cmp::Ordering::Greater => {
                // Widening: more fractional digits than before, always exact.
                let factor = 10i128.pow((target_scale - value_scale) as u32);
                value
                    .checked_mul(factor)
                    .ok_or_else(|| CarpetError::data_validation("decimal rescale overflowed i128".to_string()))?
            }
            std::cmp::Ordering::Less => {
                let divisor = 10i128.pow((value_scale - target_scale) as u32);
                let quotient = value / divisor;
                let remainder = value - quotient * divisor;
                if remainder == 0 {
                    quotient
                } else {
                    match self.rounding_mode {
                        None => {
                            return Err(CarpetError::data_validation(format!(
                                "decimal value at scale {} cannot be rescaled exactly to scale {} and no rounding mode is configured",
                                value_scale, self.scale
                            )))
                        }
                        Some(mode) => round_quotient(quotient, remainder, divisor, mode),
                    }
                }
            }
        };

        let digits = count_digits(rescaled);
        if digits > self.precision {
            return Err(CarpetError::data_validation(format!(
                "decimal value (originally at scale {}) needs {} digits, exceeding precision {}",
                value_scale, digits, self.precision
            )));
        }
        Ok(rescaled)
    }
}

fn count_digits(value: i128) -> u32 {
    let mut v = value.unsigned_abs();
    let mut digits = 1u32;
    while v >= 10 {
        v /= 10;
        digits += 1;
    }
    digits
}

/// Round `quotient` (the truncated-toward-zero division result) up by one
/// magnitude unit according to `mode`, given the nonzero `remainder` and
/// the `divisor` it was computed against.
fn round_quotient(quotient: i128, remainder: i128, divisor: i128, mode: RoundingMode) -> i128 {
    let negative = remainder < 0;
    let away_from_zero = if negative { quotient - 1 } else { quotient + 1 };
    let double_remainder = remainder.unsigned_abs().saturating_mul(2);

    match mode {
        RoundingMode::Up => away_from_zero,
        RoundingMode::Down => quotient,
        RoundingMode::Ceiling => {
            if negative {
                quotient
            } else {
                away_from_zero
            }
        }
        RoundingMode::Floor => {
            if negative {
                away_from_zero
            } else {
                quotient
            }
        }
        RoundingMode::HalfUp => {
            if double_remainder >= divisor.unsigned_abs() {
                away_from_zero
            } else {
                quotient
            }
        }
        RoundingMode::HalfDown => {
            if double_remainder > divisor.unsigned_abs() {
                away_from_zero
            } else {
                quotient
            }
        }
        RoundingMode::HalfEven => {
            let divisor_abs = divisor.unsigned_abs();
            if double_remainder > divisor_abs {
                away_from_zero
            } else if double_remainder < divisor_abs {
                quotient
            } else if quotient % 2 == 0 {
                quotient
            } else {
                away_from_zero
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecimalPhysical {
    Int32,
    Int64,
    FixedLenByteArray(usize),
}

/// The closed set of field shapes a record column can take.
#[derive(Debug, Clone)]
pub enum FieldType {
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Bool,
    BinaryString(StringLogicalType),
    OpaqueBinary(BinaryLogicalType),
    EnumLike(Vec<String>),
    Uuid,
    Decimal(DecimalSpec),
    DateOnly,
    TimeOfDay,
    LocalTimestamp,
    InstantTimestamp,
    List(Box<Field>),
    Set(Box<Field>),
    Map(Box<Field>, Box<Field>),
    Record(Arc<RecordDescriptor>),
}

impl FieldType {
    /// `true` for types whose Parquet representation is a single leaf
    /// column (everything except `List`/`Set`/`Map`/`Record`).
    pub fn is_primitive_leaf(&self) -> bool {
        !matches!(
            self,
            FieldType::List(_) | FieldType::Set(_) | FieldType::Map(_, _) | FieldType::Record(_)
        )
    }

    /// A map key must be a non-list, non-map, non-record scalar.
    pub fn is_valid_map_key(&self) -> bool {
        !matches!(
            self,
            FieldType::List(_) | FieldType::Set(_) | FieldType::Map(_, _) | FieldType::Record(_)
        )
    }
}

/// One column of a `RecordDescriptor`: its Parquet-facing name, shape,
/// nullability and optional explicit field id.
#[derive(Debug, Clone)]
pub struct Field {
    pub column_name: String,
    pub field_type: FieldType,
    pub nullable: bool,
    pub field_id: Option<i32>,
}

impl Field {
    pub fn new(column_name: impl Into<String>, field_type: FieldType, nullable: bool) -> Self {
        Field {
            column_name: column_name.into(),
            field_type,
            nullable,
            field_id: None,
        }
    }

    pub fn with_field_id(mut self, field_id: i32) -> Self {
        self.field_id = Some(field_id);
        self
    }
}

/// Type name + ordered fields describing one Rust record type's mapping
/// onto a Parquet group. Built once, immutable, and safe to share behind
/// an `Arc` across threads once built (§5).
#[derive(Debug, Clone)]
pub struct RecordDescriptor {
    pub type_name: String,
    pub fields: Vec<Field>,
}

impl RecordDescriptor {
    /// Validate and construct a descriptor: rejects duplicate column
    /// names, duplicate explicit field ids, and structurally recursive
    /// field types (a descriptor appearing in its own transitive
    /// expansion, detected by descriptor identity rather than name).
    pub fn try_new(type_name: impl Into<String>, fields: Vec<Field>) -> Result<Self> {
        let type_name = type_name.into();

        let mut seen_names = HashSet::new();
        for f in &fields {
            if !seen_names.insert(f.column_name.as_str()) {
                return Err(CarpetError::schema(format!(
                    "duplicate column name `{}` in record `{}`",
                    f.column_name, type_name
                )));
            }
        }

        let mut seen_ids = HashSet::new();
        for f in &fields {
            if let Some(id) = f.field_id {
                if !seen_ids.insert(id) {
                    return Err(CarpetError::schema(format!(
                        "duplicate field id {} in record `{}`",
                        id, type_name
                    )));
                }
            }
        }

        let descriptor = RecordDescriptor { type_name, fields };
        descriptor.check_acyclic()?;
        Ok(descriptor)
    }

    fn check_acyclic(&self) -> Result<()> {
        let mut visiting: Vec<*const RecordDescriptor> = vec![self as *const RecordDescriptor];
        for field in &self.fields {
            Self::visit(&field.field_type, &mut visiting)?;
        }
        Ok(())
    }

    fn visit(field_type: &FieldType, visiting: &mut Vec<*const RecordDescriptor>) -> Result<()> {
        match field_type {
            FieldType::Record(descriptor) => {
                let ptr = Arc::as_ptr(descriptor);
                if visiting.contains(&ptr) {
                    return Err(CarpetError::recursive(format!(
                        "record type `{}` transitively contains itself",
                        descriptor.type_name
                    )));
                }
                visiting.push(ptr);
                for field in &descriptor.fields {
                    Self::visit(&field.field_type, visiting)?;
                }
                visiting.pop();
                Ok(())
            }
            FieldType::List(inner) | FieldType::Set(inner) => Self::visit(&inner.field_type, visiting),
            FieldType::Map(key, value) => {
                Self::visit(&key.field_type, visiting)?;
                Self::visit(&value.field_type, visiting)
            }
            _ => Ok(()),
        }
    }

    pub fn field(&self, column_name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.column_name == column_name)
    }
}
