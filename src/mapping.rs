//! Explicit entity mapping
//!
//! A [`Mapping`] is a static table of `(field name, getter, setter)`
//! entries, built once per entity type. There is no reflection: each entry
//! says how one struct member becomes a [`Value`] and back.
//!
//! ```ignore
//! #[derive(Default)]
//! struct Person { id: i64, name: String }
//!
//! let mapping = Mapping::new()
//!     .field("ID", |p: &Person| Value::from(p.id), |p, v| {
//!         p.id = v.as_int().unwrap_or_default();
//!         Ok(())
//!     })
//!     .field("NAME", |p: &Person| Value::from(p.name.as_str()), |p, v| {
//!         p.name = v.as_str().unwrap_or_default().to_string();
//!         Ok(())
//!     });
//!
//! let people: Vec<Person> = mapping.materialize_parallel(table.records(), 4)?;
//! ```

use tracing::debug;
use xbase_core::{Error, Result, Value};
use xbase_format::{Record, Schema};
use xbase_table::Table;

/// Reads one member of an entity as a field value
pub type Getter<T> = fn(&T) -> Value;

/// Stores a field value into one member of an entity
pub type Setter<T> = fn(&mut T, &Value) -> Result<()>;

/// One mapped field
pub struct FieldMapping<T> {
    name: &'static str,
    get: Getter<T>,
    set: Setter<T>,
}

impl<T> FieldMapping<T> {
    /// Field name, matched case-insensitively
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for FieldMapping<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            get: self.get,
            set: self.set,
        }
    }
}

impl<T> std::fmt::Debug for FieldMapping<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldMapping").field("name", &self.name).finish()
    }
}

/// Field table for entity type `T`
#[derive(Debug, Clone)]
pub struct Mapping<T> {
    fields: Vec<FieldMapping<T>>,
}

impl<T> Mapping<T> {
    /// Empty mapping
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Add a field entry
    pub fn field(mut self, name: &'static str, get: Getter<T>, set: Setter<T>) -> Self {
        self.fields.push(FieldMapping { name, get, set });
        self
    }

    /// Entries in the order they were added
    pub fn fields(&self) -> &[FieldMapping<T>] {
        &self.fields
    }

    /// Check that every mapped field exists in `schema`
    pub fn check(&self, schema: &Schema) -> Result<()> {
        match self.fields.iter().find(|f| schema.position(f.name).is_none()) {
            Some(missing) => Err(Error::UnknownField(missing.name.to_string())),
            None => Ok(()),
        }
    }

    /// Copy entity members into `record`
    pub fn write(&self, entity: &T, record: &mut Record) -> Result<()> {
        for field in &self.fields {
            record.set_by_name(field.name, (field.get)(entity))?;
        }
        Ok(())
    }

    /// Append one record per entity to `table`
    pub fn populate<'a, I>(&self, entities: I, table: &mut Table) -> Result<()>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        for entity in entities {
            let mut record = table.new_record();
            self.write(entity, &mut record)?;
            table.push(record)?;
        }
        Ok(())
    }
}

impl<T: Default> Mapping<T> {
    /// Build an entity from `record`
    pub fn read(&self, record: &Record) -> Result<T> {
        let mut entity = T::default();
        for field in &self.fields {
            let value = record
                .get_by_name(field.name)
                .ok_or_else(|| Error::UnknownField(field.name.to_string()))?;
            (field.set)(&mut entity, value)?;
        }
        Ok(entity)
    }

    /// Build one entity per record, in order
    pub fn materialize(&self, records: &[Record]) -> Result<Vec<T>> {
        records.iter().map(|r| self.read(r)).collect()
    }
}

impl<T: Default + Send> Mapping<T> {
    /// Build one entity per record, split across `workers` tasks.
    ///
    /// Records are split into contiguous ranges; each task fills the
    /// matching range of a pre-sized output buffer, so tasks never share a
    /// slot. The scope joins every task before returning. If several ranges
    /// fail, the error from the earliest range is returned.
    pub fn materialize_parallel(&self, records: &[Record], workers: usize) -> Result<Vec<T>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let workers = workers.clamp(1, records.len());
        if workers == 1 {
            return self.materialize(records);
        }

        let chunk = records.len().div_ceil(workers);
        debug!(
            "Materializing {} records in {} ranges of up to {}",
            records.len(),
            records.len().div_ceil(chunk),
            chunk
        );

        let mut slots: Vec<Option<T>> = Vec::with_capacity(records.len());
        slots.resize_with(records.len(), || None);
        let mut outcomes: Vec<Result<()>> = records.chunks(chunk).map(|_| Ok(())).collect();

        rayon::scope(|scope| {
            let ranges = records.chunks(chunk).zip(slots.chunks_mut(chunk));
            for ((input, output), outcome) in ranges.zip(outcomes.iter_mut()) {
                scope.spawn(move |_| {
                    *outcome = input
                        .iter()
                        .zip(output.iter_mut())
                        .try_for_each(|(record, slot)| -> Result<()> {
                            *slot = Some(self.read(record)?);
                            Ok(())
                        });
                });
            }
        });

        outcomes.into_iter().collect::<Result<()>>()?;
        slots
            .into_iter()
            .map(|slot| slot.ok_or_else(|| Error::SchemaConsistency("unfilled slot".to_string())))
            .collect()
    }
}

impl<T> Default for Mapping<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use xbase_format::FieldDescriptor;

    #[derive(Debug, Default, PartialEq)]
    struct Item {
        id: i64,
        label: String,
    }

    fn mapping() -> Mapping<Item> {
        Mapping::new()
            .field(
                "ID",
                |i: &Item| Value::from(i.id),
                |i, v| {
                    i.id = v.as_int().unwrap_or_default();
                    Ok(())
                },
            )
            .field(
                "LABEL",
                |i: &Item| Value::from(i.label.as_str()),
                |i, v| {
                    i.label = v.as_str().unwrap_or_default().to_string();
                    Ok(())
                },
            )
    }

    fn schema() -> Arc<Schema> {
        Arc::new(
            Schema::new(vec![
                FieldDescriptor::integer("ID").unwrap(),
                FieldDescriptor::character("LABEL", 12).unwrap(),
            ])
            .unwrap(),
        )
    }

    fn records(n: i64) -> Vec<Record> {
        (0..n)
            .map(|id| {
                let mut record = Record::new(schema());
                mapping()
                    .write(
                        &Item {
                            id,
                            label: format!("item {}", id),
                        },
                        &mut record,
                    )
                    .unwrap();
                record
            })
            .collect()
    }

    #[test]
    fn test_read_write() {
        let records = records(1);
        let item = mapping().read(&records[0]).unwrap();
        assert_eq!(
            item,
            Item {
                id: 0,
                label: "item 0".to_string()
            }
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let records = records(37);
        let sequential = mapping().materialize(&records).unwrap();
        for workers in [0, 1, 2, 5, 64] {
            assert_eq!(
                mapping().materialize_parallel(&records, workers).unwrap(),
                sequential
            );
        }
    }

    #[test]
    fn test_parallel_empty() {
        assert!(mapping().materialize_parallel(&[], 4).unwrap().is_empty());
    }

    #[test]
    fn test_check_unknown_field() {
        let bad = mapping().field("MISSING", |_| Value::Null, |_, _| Ok(()));
        assert!(mapping().check(&schema()).is_ok());
        assert!(matches!(bad.check(&schema()), Err(Error::UnknownField(_))));
    }
}
