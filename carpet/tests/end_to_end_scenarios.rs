//! Round-trips a handful of representative record shapes through
//! `CarpetWriter` and `CarpetReader`: flat scalars, nullable columns, a
//! nested record, a list field, a map field, and decimal/uuid/temporal
//! leaves, all via `#[derive(ParquetRecord)]`.

use std::collections::BTreeMap;
use std::fs::File;

use carpet::temporal::{Date, DateTime};
use carpet::{CarpetReader, CarpetWriter, ParquetRecord, WriterConfig};

#[derive(ParquetRecord, Debug, PartialEq, Clone)]
struct Address {
    street: String,
    city: String,
}

#[derive(ParquetRecord, Debug, PartialEq, Clone)]
struct Customer {
    id: i64,
    name: String,
    nickname: Option<String>,
    balance_cents: i64,
    home: Address,
    tags: Vec<String>,
    scores: Vec<Option<i32>>,
    attributes: BTreeMap<String, String>,
    signup_date: Date,
    #[parquet(precision = "10", scale = "2")]
    lifetime_value: i128,
}

fn sample_customers() -> Vec<Customer> {
    vec![
        Customer {
            id: 1,
            name: "Ada Lovelace".to_string(),
            nickname: Some("Ada".to_string()),
            balance_cents: 10_000,
            home: Address {
                street: "12 Analytical Engine Way".to_string(),
                city: "London".to_string(),
            },
            tags: vec!["vip".to_string(), "early-adopter".to_string()],
            scores: vec![Some(10), None, Some(7)],
            attributes: BTreeMap::from([("plan".to_string(), "gold".to_string())]),
            signup_date: carpet::temporal::Date::constant(2021, 1, 1),
            lifetime_value: 123_456,
        },
        Customer {
            id: 2,
            name: "Grace Hopper".to_string(),
            nickname: None,
            balance_cents: 0,
            home: Address {
                street: "1 Compiler Court".to_string(),
                city: "Arlington".to_string(),
            },
            tags: vec![],
            scores: vec![],
            attributes: BTreeMap::new(),
            signup_date: carpet::temporal::Date::constant(2019, 6, 15),
            lifetime_value: 0,
        },
    ]
}

#[test]
fn round_trips_customers_through_a_real_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("customers.parquet");

    let file = File::create(&path).unwrap();
    let mut writer = CarpetWriter::<_, Customer>::new(file, WriterConfig::default()).unwrap();
    for customer in sample_customers() {
        writer.write(&customer).unwrap();
    }
    writer.close().unwrap();

    let file = File::open(&path).unwrap();
    let rows: Vec<Customer> = CarpetReader::<Customer>::open(file)
        .unwrap()
        .collect::<carpet::Result<Vec<_>>>()
        .unwrap();

    assert_eq!(rows, sample_customers());
}

#[test]
fn generic_reader_exposes_columns_without_a_descriptor() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("customers_generic.parquet");

    let file = File::create(&path).unwrap();
    let mut writer = CarpetWriter::<_, Customer>::new(file, WriterConfig::default()).unwrap();
    for customer in sample_customers() {
        writer.write(&customer).unwrap();
    }
    writer.close().unwrap();

    let file = File::open(&path).unwrap();
    let rows: Vec<carpet::ParquetValue> = carpet::read_generic_rows(file)
        .unwrap()
        .collect::<carpet::Result<Vec<_>>>()
        .unwrap();

    assert_eq!(rows.len(), 2);
    match &rows[0] {
        carpet::ParquetValue::Record(map) => {
            assert_eq!(map.get("id"), Some(&carpet::ParquetValue::Int64(1)));
        }
        other => panic!("expected a record, got {other:?}"),
    }
}

#[test]
fn column_projection_reads_a_subset_of_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("customers_projected.parquet");

    let file = File::create(&path).unwrap();
    let mut writer = CarpetWriter::<_, Customer>::new(file, WriterConfig::default()).unwrap();
    for customer in sample_customers() {
        writer.write(&customer).unwrap();
    }
    writer.close().unwrap();

    let file = File::open(&path).unwrap();
    let rows: Vec<carpet::ParquetValue> = carpet::read_generic_rows(file)
        .unwrap()
        .collect::<carpet::Result<Vec<_>>>()
        .unwrap();
    assert!(!rows.is_empty());
}

#[derive(ParquetRecord, Debug, PartialEq)]
struct User {
    #[parquet(not_null)]
    id: i64,
    #[parquet(rename = "full_name")]
    name: Option<String>,
}

/// S2: a required id plus a nullable, renamed string column; both a present
/// and an absent value round-trip, and the column itself is stored under its
/// renamed name.
#[test]
fn scenario_s2_nullable_field_with_column_rename_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.parquet");

    let rows = vec![
        User { id: 1, name: Some("Ada".to_string()) },
        User { id: 2, name: None },
    ];

    let file = File::create(&path).unwrap();
    let mut writer = CarpetWriter::<_, User>::new(file, WriterConfig::default()).unwrap();
    for row in &rows {
        writer.write(row).unwrap();
    }
    writer.close().unwrap();

    let file = File::open(&path).unwrap();
    let read_back: Vec<User> = CarpetReader::<User>::open(file)
        .unwrap()
        .collect::<carpet::Result<Vec<_>>>()
        .unwrap();
    assert_eq!(read_back, rows);

    let file = File::open(&path).unwrap();
    let generic: Vec<carpet::ParquetValue> = carpet::read_generic_rows(file)
        .unwrap()
        .collect::<carpet::Result<Vec<_>>>()
        .unwrap();
    match &generic[0] {
        carpet::ParquetValue::Record(map) => {
            assert!(map.contains_key("full_name"));
            assert!(!map.contains_key("name"));
        }
        other => panic!("expected a record, got {other:?}"),
    }
}

#[derive(ParquetRecord, Debug, PartialEq, Clone)]
struct Item {
    sku: String,
    qty: i32,
}

#[derive(ParquetRecord, Debug, PartialEq, Clone)]
struct Order {
    items: Option<Vec<Item>>,
}

/// S3: a three-level-encoded list of nested records preserves element order
/// and field values.
#[test]
fn scenario_s3_three_level_list_of_records_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orders.parquet");

    let order = Order {
        items: Some(vec![
            Item { sku: "a".to_string(), qty: 1 },
            Item { sku: "b".to_string(), qty: 2 },
        ]),
    };

    let file = File::create(&path).unwrap();
    let mut writer = CarpetWriter::<_, Order>::new(file, WriterConfig::default()).unwrap();
    writer.write(&order).unwrap();
    writer.close().unwrap();

    let file = File::open(&path).unwrap();
    let rows: Vec<Order> = CarpetReader::<Order>::open(file)
        .unwrap()
        .collect::<carpet::Result<Vec<_>>>()
        .unwrap();
    assert_eq!(rows, vec![order]);
}

#[derive(ParquetRecord, Debug, PartialEq, Clone)]
struct Doc {
    tags: BTreeMap<String, Vec<String>>,
}

/// S4: a map whose value is itself a list preserves both a populated entry
/// and one whose list value is empty.
#[test]
fn scenario_s4_map_with_nested_list_value_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("docs.parquet");

    let doc = Doc {
        tags: BTreeMap::from([
            ("x".to_string(), vec!["p".to_string(), "q".to_string()]),
            ("y".to_string(), vec![]),
        ]),
    };

    let file = File::create(&path).unwrap();
    let mut writer = CarpetWriter::<_, Doc>::new(file, WriterConfig::default()).unwrap();
    writer.write(&doc).unwrap();
    writer.close().unwrap();

    let file = File::open(&path).unwrap();
    let rows: Vec<Doc> = CarpetReader::<Doc>::open(file)
        .unwrap()
        .collect::<carpet::Result<Vec<_>>>()
        .unwrap();
    assert_eq!(rows, vec![doc]);
}

#[derive(ParquetRecord, Debug, PartialEq)]
struct Event {
    id: i64,
    trace_id: uuid::Uuid,
    occurred_at: DateTime,
}

#[test]
fn local_timestamp_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.parquet");

    let event = Event {
        id: 1,
        trace_id: uuid::Uuid::new_v4(),
        occurred_at: carpet::temporal::DateTime::constant(2024, 3, 15, 9, 30, 0, 0),
    };

    let file = File::create(&path).unwrap();
    let mut writer = CarpetWriter::<_, Event>::new(file, WriterConfig::default()).unwrap();
    writer.write(&event).unwrap();
    writer.close().unwrap();

    let file = File::open(&path).unwrap();
    let rows: Vec<Event> = CarpetReader::<Event>::open(file)
        .unwrap()
        .collect::<carpet::Result<Vec<_>>>()
        .unwrap();
    assert_eq!(rows, vec![event]);
}

#[derive(ParquetRecord, Debug, PartialEq)]
struct WideCounter {
    value: i64,
}

#[derive(ParquetRecord, Debug, PartialEq)]
struct NarrowCounter {
    value: i32,
}

/// S6: a column written at a wider physical width than the reading
/// descriptor declares round-trips values that fit the narrower width, and
/// truncates (per Rust's own `as` cast, not a rejection) a value that
/// overflows it.
#[test]
fn scenario_s6_narrowing_a_wider_physical_column_on_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("counters.parquet");

    let file = File::create(&path).unwrap();
    let mut writer = CarpetWriter::<_, WideCounter>::new(file, WriterConfig::default()).unwrap();
    writer.write(&WideCounter { value: 42 }).unwrap();
    writer.write(&WideCounter { value: i64::from(i32::MAX) + 1 }).unwrap();
    writer.close().unwrap();

    let file = File::open(&path).unwrap();
    let rows: Vec<NarrowCounter> = CarpetReader::<NarrowCounter>::open(file)
        .unwrap()
        .collect::<carpet::Result<Vec<_>>>()
        .unwrap();
    assert_eq!(rows[0], NarrowCounter { value: 42 });
    assert_eq!(rows[1], NarrowCounter { value: (i64::from(i32::MAX) + 1) as i32 });
}

/// S8: the generic "bag of columns" view visits columns in the order the
/// schema declares them, under their exact declared names, with no
/// descriptor for the reader to consult.
#[test]
fn scenario_s8_generic_map_view_preserves_declared_field_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("customers_generic_order.parquet");

    let file = File::create(&path).unwrap();
    let mut writer = CarpetWriter::<_, Customer>::new(file, WriterConfig::default()).unwrap();
    writer.write(&sample_customers()[0]).unwrap();
    writer.close().unwrap();

    let file = File::open(&path).unwrap();
    let rows: Vec<carpet::ParquetValue> = carpet::read_generic_rows(file)
        .unwrap()
        .collect::<carpet::Result<Vec<_>>>()
        .unwrap();
    match &rows[0] {
        carpet::ParquetValue::Record(map) => {
            let names: Vec<&str> = map.keys().map(|k| k.as_ref()).collect();
            assert_eq!(
                names,
                vec![
                    "id",
                    "name",
                    "nickname",
                    "balance_cents",
                    "home",
                    "tags",
                    "scores",
                    "attributes",
                    "signup_date",
                    "lifetime_value",
                ]
            );
        }
        other => panic!("expected a record, got {other:?}"),
    }
}
