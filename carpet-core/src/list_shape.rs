//! Centralizes the two-vs-three-level list-shape detection described in
//! §4.4.8, so every converter that needs the rule shares one
//! implementation (§9 Design Notes: "centralize it into one function").

use parquet::basic::Repetition;
use parquet::schema::types::Type as ParquetType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListShape {
    /// A bare repeated leaf/group (1-level), or a `LIST`-annotated group
    /// whose single child is itself the repeated element (2-level).
    Flat,
    /// A `LIST`-annotated group wrapping an intermediate repeated group
    /// conventionally named `list`, whose own single child is the element
    /// (3-level).
    ThreeLevel,
}

/// Classify a `LIST`-annotated group's inner shape. Callers special-case a
/// bare `REPEATED` field (1-level, no wrapping group at all) before
/// reaching this function.
pub fn classify(list_field: &ParquetType) -> ListShape {
    if list_field.is_primitive() {
        return ListShape::Flat;
    }
    let children = list_field.get_fields();
    if children.len() != 1 {
        return ListShape::Flat;
    }
    let inner = &children[0];
    let is_three_level = inner.name() == "list"
        && inner.get_basic_info().repetition() == Repetition::REPEATED
        && !inner.is_primitive()
        && inner.get_fields().len() == 1;

    if is_three_level {
        ListShape::ThreeLevel
    } else {
        ListShape::Flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnnotatedLevel, WriterConfig};
    use crate::field::{Field, FieldType, RecordDescriptor, StringLogicalType};
    use crate::schema::derive_message_type;

    fn list_of_strings(level: AnnotatedLevel) -> ParquetType {
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
        let mut config = WriterConfig::default();
        config.annotated_levels = level;
        let message = derive_message_type(&descriptor, &config).unwrap();
        message.get_fields()[0].as_ref().clone()
    }

    #[test]
    fn two_level_list_is_flat() {
        assert_eq!(classify(&list_of_strings(AnnotatedLevel::Two)), ListShape::Flat);
    }

    #[test]
    fn three_level_list_is_detected() {
        assert_eq!(classify(&list_of_strings(AnnotatedLevel::Three)), ListShape::ThreeLevel);
    }
}
