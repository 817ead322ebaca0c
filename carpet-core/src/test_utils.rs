//! Shared fixtures for carpet-core's own tests: a couple of
//! `RecordDescriptor`s plus matching `ParquetValue` rows, and the
//! float-tolerant value-equality helpers the writer/reader tests compare
//! round-tripped rows with.

#[cfg(test)]
pub mod test {
    use std::sync::Arc;

    use indexmap::IndexMap;
    use ordered_float::OrderedFloat;

    use crate::field::{Field, FieldType, RecordDescriptor, StringLogicalType};
    use crate::value::ParquetValue;

    /// A flat four-column descriptor: required id, nullable name/age/salary.
    pub fn sample_descriptor() -> RecordDescriptor {
        RecordDescriptor::try_new(
            "Person",
            vec![
                Field::new("id", FieldType::Int64, false),
                Field::new("name", FieldType::BinaryString(StringLogicalType::Plain), true),
                Field::new("age", FieldType::Int32, true),
                Field::new("salary", FieldType::Float64, true),
            ],
        )
        .unwrap()
    }

    /// A descriptor with a nested record field and a list-of-float field.
    pub fn complex_descriptor() -> RecordDescriptor {
        let person = Arc::new(
            RecordDescriptor::try_new(
                "Nested",
                vec![
                    Field::new("name", FieldType::BinaryString(StringLogicalType::Plain), false),
                    Field::new("age", FieldType::Int32, true),
                ],
            )
            .unwrap(),
        );

        RecordDescriptor::try_new(
            "Envelope",
            vec![
                Field::new("id", FieldType::Int64, false),
                Field::new("person", FieldType::Record(person), true),
                Field::new(
                    "scores",
                    FieldType::List(Box::new(Field::new("item", FieldType::Float32, false))),
                    true,
                ),
            ],
        )
        .unwrap()
    }

    /// One row matching [`sample_descriptor`].
    pub fn sample_values() -> Vec<ParquetValue> {
        vec![
            ParquetValue::Int64(1),
            ParquetValue::String(Arc::from("Alice")),
            ParquetValue::Int32(30),
            ParquetValue::Float64(OrderedFloat(75000.0)),
        ]
    }

    /// `count` rows matching [`sample_descriptor`], each with distinct values.
    pub fn sample_rows(count: usize) -> Vec<Vec<ParquetValue>> {
        (0..count)
            .map(|i| {
                vec![
                    ParquetValue::Int64(i as i64),
                    ParquetValue::String(Arc::from(format!("Person{}", i))),
                    ParquetValue::Int32((20 + i % 50) as i32),
                    ParquetValue::Float64(OrderedFloat(50000.0 + (i as f64 * 1000.0))),
                ]
            })
            .collect()
    }

    /// A row matching [`sample_descriptor`] with its nullable columns null.
    pub fn sample_values_with_nulls() -> Vec<ParquetValue> {
        vec![
            ParquetValue::Int64(2),
            ParquetValue::Null,
            ParquetValue::Int32(25),
            ParquetValue::Null,
        ]
    }

    /// One row matching [`complex_descriptor`].
    pub fn complex_values() -> Vec<ParquetValue> {
        let mut person = IndexMap::new();
        person.insert(Arc::from("name"), ParquetValue::String(Arc::from("Bob")));
        person.insert(Arc::from("age"), ParquetValue::Int32(35));

        vec![
            ParquetValue::Int64(1),
            ParquetValue::Record(person),
            ParquetValue::List(vec![
                ParquetValue::Float32(OrderedFloat(90.5)),
                ParquetValue::Float32(OrderedFloat(87.3)),
                ParquetValue::Float32(OrderedFloat(92.1)),
            ]),
        ]
    }

    pub fn temp_file_path() -> String {
        format!("{}/carpet_test_{}.parquet", std::env::temp_dir().display(), uuid::Uuid::new_v4())
    }

    /// Compare two `ParquetValue`s, treating floats within epsilon as equal
    /// and comparing `Record`s by key rather than by field order.
    pub fn values_equal(a: &ParquetValue, b: &ParquetValue) -> bool {
        match (a, b) {
            (ParquetValue::Float32(OrderedFloat(a)), ParquetValue::Float32(OrderedFloat(b))) => {
                (a - b).abs() < f32::EPSILON
            }
            (ParquetValue::Float64(OrderedFloat(a)), ParquetValue::Float64(OrderedFloat(b))) => {
                (a - b).abs() < f64::EPSILON
            }
            (ParquetValue::List(a), ParquetValue::List(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(a, b)| values_equal(a, b))
            }
            (ParquetValue::Map(a), ParquetValue::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|((k1, v1), (k2, v2))| values_equal(k1, k2) && values_equal(v1, v2))
            }
            (ParquetValue::Record(a), ParquetValue::Record(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).map_or(false, |v2| values_equal(v, v2)))
            }
            _ => a == b,
        }
    }

    pub fn assert_values_equal(expected: &[ParquetValue], actual: &[ParquetValue]) {
        assert_eq!(
            expected.len(),
            actual.len(),
            "value vectors have different lengths: expected {}, got {}",
            expected.len(),
            actual.len()
        );

        for (i, (e, a)) in expected.iter().zip(actual.iter()).enumerate() {
            assert!(
                values_equal(e, a),
                "values at index {} are not equal:\nexpected: {:?}\nactual: {:?}",
                i,
                e,
                a
            );
        }
    }
}

#[cfg(test)]
mod test_utils_tests {
    use super::test::*;
    use crate::value::ParquetValue;
    use ordered_float::OrderedFloat;

    #[test]
    fn sample_descriptor_has_four_columns() {
        let descriptor = sample_descriptor();
        assert_eq!(descriptor.fields.len(), 4);
        assert_eq!(descriptor.fields[0].column_name, "id");
        assert_eq!(descriptor.fields[3].column_name, "salary");
    }

    #[test]
    fn sample_values_match_descriptor_arity() {
        let values = sample_values();
        assert_eq!(values.len(), sample_descriptor().fields.len());
        assert!(matches!(values[0], ParquetValue::Int64(1)));
    }

    #[test]
    fn values_equal_tolerates_float_epsilon() {
        assert!(values_equal(
            &ParquetValue::Float32(OrderedFloat(1.0)),
            &ParquetValue::Float32(OrderedFloat(1.0 + f32::EPSILON / 2.0))
        ));
        assert!(!values_equal(&ParquetValue::Int32(42), &ParquetValue::Int32(43)));
    }

    #[test]
    fn values_equal_compares_records_by_key() {
        let a = complex_values();
        let b = complex_values();
        assert!(values_equal(&a[1], &b[1]));
    }
}
