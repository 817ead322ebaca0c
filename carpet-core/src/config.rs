//! Writer configuration surface (§6.4).
//!
//! Split from the teacher's single `WriterProperties`-only knob set: the
//! distilled-spec knobs (`annotated_levels`, time unit, decimal config)
//! sit alongside the ambient ones carried straight from
//! `parquet-core::writer::Writer` (compression, dynamic batch sizing).
//! Column naming is a struct-level `#[parquet(naming = "...")]` derive
//! attribute instead of a field here: it has to be resolved at macro
//! expansion time, before any `WriterConfig` exists (see `naming.rs`).

use parquet::basic::Compression;

use crate::field::{DecimalSpec, RoundingMode};

/// Which of the three standard Parquet list encodings the schema deriver
/// and writer compiler target for `List`/`Set` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnnotatedLevel {
    /// Bare repeated field, no wrapping group; cannot represent a null
    /// list or a null element.
    One,
    /// One wrapping `repeated` group of required elements; can represent
    /// a null list but not a null element.
    Two,
    /// The standard `LIST` 3-level encoding (`list` -> `repeated list` ->
    /// optional `element`); can represent both a null list and a null
    /// element.
    #[default]
    Three,
}

/// The unit newly-written `TimeOfDay` values are stored in, and the
/// default unit schema derivation picks for a `TimeOfDay`/`*Timestamp`
/// field that doesn't carry a more specific override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeUnit {
    Millis,
    #[default]
    Micros,
    Nanos,
}

/// Precision/scale/rounding defaults applied to `Decimal` fields that
/// don't carry their own per-field override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecimalConfig {
    pub precision: u32,
    pub scale: u32,
    pub rounding_mode: Option<RoundingMode>,
}

impl DecimalConfig {
    pub fn to_spec(self) -> DecimalSpec {
        DecimalSpec {
            precision: self.precision,
            scale: self.scale,
            rounding_mode: self.rounding_mode,
        }
    }
}

/// Configuration driving schema derivation and the writer compiler.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    pub annotated_levels: AnnotatedLevel,
    pub default_time_unit: TimeUnit,
    pub decimal_config: Option<DecimalConfig>,

    /// Ambient, carried from the teacher's `WriterBuilder` (not in the
    /// distilled spec): output compression codec.
    pub compression: Compression,
    /// Ambient: force a fixed row-group flush threshold instead of the
    /// dynamic reservoir-sampling estimate.
    pub batch_size: Option<usize>,
    /// Ambient: approximate in-memory byte budget before a row group is
    /// flushed regardless of row count.
    pub memory_threshold: usize,
    /// Ambient: number of leading rows sampled to estimate average row
    /// size for dynamic batch sizing.
    pub sample_size: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        WriterConfig {
            annotated_levels: AnnotatedLevel::default(),
            default_time_unit: TimeUnit::default(),
            decimal_config: None,
            compression: Compression::SNAPPY,
            batch_size: None,
            memory_threshold: 64 * 1024 * 1024,
            sample_size: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_config_defaults_match_three_level_lists() {
        let cfg = WriterConfig::default();
        assert_eq!(cfg.annotated_levels, AnnotatedLevel::Three);
        assert_eq!(cfg.default_time_unit, TimeUnit::Micros);
        assert!(cfg.decimal_config.is_none());
    }

    #[test]
    fn decimal_config_converts_to_field_spec() {
        let cfg = DecimalConfig {
            precision: 10,
            scale: 2,
            rounding_mode: Some(RoundingMode::HalfUp),
        };
        let spec = cfg.to_spec();
        assert_eq!(spec.precision, 10);
        assert_eq!(spec.scale, 2);
        assert_eq!(spec.rounding_mode, Some(RoundingMode::HalfUp));
    }
}
