//! Memo fields and sidecar files

use std::fs;
use std::io::Cursor;
use tempfile::TempDir;
use xbase_core::{Error, FieldType, Value};
use xbase_format::header::TABLE_FLAG_MEMO;
use xbase_format::{FieldDescriptor, Version};
use xbase_table::{find_memo_sidecar, ReadOptions, Table, WriteOptions};

fn notes_table(version: Version, pointer_length: usize) -> Table {
    Table::builder()
        .version(version)
        .field(FieldDescriptor::integer("ID").unwrap())
        .field(FieldDescriptor::new("NOTES", FieldType::Memo, pointer_length, 0).unwrap())
        .build()
        .unwrap()
}

fn add_note(table: &mut Table, id: i64, note: Option<&str>) {
    let mut record = table.new_record();
    record.set(0, id).unwrap();
    record.set(1, note).unwrap();
    table.push(record).unwrap();
}

fn save_and_open(table: &Table, expected_extension: &str) -> Table {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.dbf");

    let sidecar = table.save(&path, &WriteOptions::default()).unwrap().unwrap();
    assert_eq!(sidecar.extension().unwrap(), expected_extension);
    assert_eq!(find_memo_sidecar(&path), Some(sidecar));

    Table::open(&path, &ReadOptions::default()).unwrap()
}

fn notes(table: &Table) -> Vec<Value> {
    table
        .records()
        .iter()
        .map(|r| r.get_by_name("notes").cloned().unwrap_or_default())
        .collect()
}

#[test]
fn test_dbase3_memo_roundtrip() {
    let mut table = notes_table(Version::DBase3, 10);
    assert_eq!(table.version(), Version::DBase3Memo);
    add_note(&mut table, 1, Some("first note"));
    add_note(&mut table, 2, None);
    add_note(&mut table, 3, Some(&"long ".repeat(300)));

    let back = save_and_open(&table, "dbt");
    assert_eq!(back.version(), Version::DBase3Memo);
    assert_eq!(notes(&back), notes(&table));
}

#[test]
fn test_dbase4_memo_roundtrip() {
    let mut table = notes_table(Version::DBase4Memo, 10);
    add_note(&mut table, 1, Some("dBase IV keeps an explicit length"));
    add_note(&mut table, 2, Some("second"));

    let back = save_and_open(&table, "dbt");
    assert_eq!(back.version(), Version::DBase4Memo);
    assert_eq!(notes(&back), notes(&table));
}

#[test]
fn test_foxpro_memo_roundtrip() {
    let mut table = Table::builder()
        .version(Version::VisualFoxPro)
        .field(FieldDescriptor::integer("ID").unwrap())
        .field(FieldDescriptor::new("NOTES", FieldType::Memo, 4, 0).unwrap())
        .field(FieldDescriptor::new("IMAGE", FieldType::General, 4, 0).unwrap())
        .build()
        .unwrap();
    let mut record = table.new_record();
    record.set(0, 1).unwrap();
    record.set(1, "fox text").unwrap();
    record.set(2, vec![0x89, b'P', b'N', b'G', 0x1A, 0x1A, 0x00]).unwrap();
    table.push(record).unwrap();
    add_note(&mut table, 2, Some("another"));

    let back = save_and_open(&table, "fpt");
    assert_eq!(back.header().table_flags & TABLE_FLAG_MEMO, TABLE_FLAG_MEMO);
    assert_eq!(back.records()[0].values(), table.records()[0].values());
    assert_eq!(notes(&back), notes(&table));
    assert!(back.records()[1].get(2).map_or(false, Value::is_null));
}

#[test]
fn test_memo_payload_requires_target() {
    let mut table = notes_table(Version::DBase3, 10);
    add_note(&mut table, 1, Some("orphan"));

    let mut out = Vec::new();
    let err = table.write(&mut out, &WriteOptions::default()).unwrap_err();
    assert!(matches!(err, Error::MemoTargetRequired));
    assert!(out.is_empty());
}

#[test]
fn test_write_with_memo_streams() {
    let mut table = notes_table(Version::DBase3, 10);
    add_note(&mut table, 1, Some("streamed"));

    let mut dbf = Vec::new();
    let mut dbt = Vec::new();
    table
        .write_with_memo(&mut dbf, &mut dbt, &WriteOptions::default())
        .unwrap();
    assert_eq!(dbt.len() % 512, 0);

    let back = Table::read(&mut Cursor::new(dbf), Some(&dbt), &ReadOptions::default()).unwrap();
    assert_eq!(notes(&back), [Value::from("streamed")]);
}

#[test]
fn test_null_memo_needs_no_target() {
    let mut table = notes_table(Version::DBase3, 10);
    add_note(&mut table, 1, None);
    add_note(&mut table, 2, Some(""));

    let mut out = Vec::new();
    table.write(&mut out, &WriteOptions::default()).unwrap();

    let back = Table::read(&mut Cursor::new(out), None, &ReadOptions::default()).unwrap();
    assert_eq!(notes(&back), [Value::Null, Value::Null]);
}

#[test]
fn test_missing_sidecar_reads_null() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.dbf");
    let mut table = notes_table(Version::DBase3, 10);
    add_note(&mut table, 1, Some("gone"));
    let sidecar = table.save(&path, &WriteOptions::default()).unwrap().unwrap();
    fs::remove_file(sidecar).unwrap();

    let back = Table::open(&path, &ReadOptions::default()).unwrap();
    assert_eq!(back.len(), 1);
    assert_eq!(notes(&back), [Value::Null]);
}

#[test]
fn test_without_memo_option() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.dbf");
    let mut table = notes_table(Version::DBase3, 10);
    add_note(&mut table, 1, Some("skipped"));
    table.save(&path, &WriteOptions::default()).unwrap();

    let back = Table::open(&path, &ReadOptions::without_memo()).unwrap();
    assert_eq!(notes(&back), [Value::Null]);
}

#[test]
fn test_foxbase_cannot_hold_memo() {
    let mut table = notes_table(Version::DBase3, 10);
    add_note(&mut table, 1, None);

    let mut out = Vec::new();
    let err = table
        .write(&mut out, &WriteOptions::to_version(Version::FoxBase))
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedFeature { .. }));
}
