//! Round-trip properties over generated tables

use proptest::prelude::*;
use std::io::Cursor;
use xbase_core::Value;
use xbase_format::{FieldDescriptor, Version};
use xbase_table::{ReadOptions, ReadStop, Table, WriteOptions};

#[derive(Debug, Clone)]
struct Row {
    name: Option<String>,
    count: Option<i64>,
    flag: Option<bool>,
    deleted: bool,
}

fn row() -> impl Strategy<Value = Row> {
    (
        proptest::option::of("[A-Za-z0-9][A-Za-z0-9 ]{0,14}[A-Za-z0-9]"),
        proptest::option::of(-99_999_999i64..=999_999_999),
        proptest::option::of(any::<bool>()),
        any::<bool>(),
    )
        .prop_map(|(name, count, flag, deleted)| Row {
            name,
            count,
            flag,
            deleted,
        })
}

fn version() -> impl Strategy<Value = Version> {
    prop_oneof![
        Just(Version::FoxBase),
        Just(Version::DBase3),
        Just(Version::VisualFoxPro),
        Just(Version::FoxPro2Memo),
    ]
}

fn build(version: Version, rows: &[Row]) -> Table {
    let mut table = Table::builder()
        .version(version)
        .field(FieldDescriptor::character("NAME", 16).unwrap())
        .field(FieldDescriptor::numeric("COUNT", 10, 0).unwrap())
        .field(FieldDescriptor::logical("FLAG").unwrap())
        .build()
        .unwrap();
    for row in rows {
        let mut record = table.new_record();
        record.set(0, row.name.clone()).unwrap();
        record.set(1, row.count).unwrap();
        record.set(2, row.flag).unwrap();
        record.set_deleted(row.deleted);
        table.push(record).unwrap();
    }
    table
}

proptest! {
    #[test]
    fn test_records_roundtrip(version in version(), rows in proptest::collection::vec(row(), 0..20)) {
        let table = build(version, &rows);
        let mut bytes = Vec::new();
        table.write(&mut bytes, &WriteOptions::default()).unwrap();

        let (back, summary) =
            Table::read_with_summary(&mut Cursor::new(bytes), None, &ReadOptions::default()).unwrap();

        prop_assert_eq!(summary.stop, ReadStop::Terminator);
        prop_assert_eq!(summary.records, rows.len());
        prop_assert_eq!(back.version(), version);
        prop_assert_eq!(back.fields(), table.fields());
        for (record, row) in back.records().iter().zip(&rows) {
            prop_assert_eq!(record.is_deleted(), row.deleted);
            prop_assert_eq!(record.get(0), Some(&Value::from(row.name.clone())));
            prop_assert_eq!(record.get(1), Some(&Value::from(row.count)));
            prop_assert_eq!(record.get(2), Some(&Value::from(row.flag)));
        }
    }

    #[test]
    fn test_record_length_invariant(lengths in proptest::collection::vec(1usize..=254, 1..12)) {
        let mut builder = Table::builder();
        for (i, length) in lengths.iter().enumerate() {
            builder = builder.field(FieldDescriptor::character(format!("F{}", i), *length).unwrap());
        }
        let table = builder.build().unwrap();
        let mut bytes = Vec::new();
        table.write(&mut bytes, &WriteOptions::default()).unwrap();

        let record_length = u16::from_le_bytes([bytes[10], bytes[11]]) as usize;
        let header_length = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
        prop_assert_eq!(record_length, 1 + lengths.iter().sum::<usize>());
        prop_assert_eq!(header_length, 32 + 32 * lengths.len() + 1);
    }
}
