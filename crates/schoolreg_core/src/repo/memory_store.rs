//! In-memory record store.
//!
//! Records are kept as JSON values in ordered per-kind maps, so one store
//! holds every aggregate kind and a transaction checkpoint is a plain clone.

use super::{RepoError, RepoResult, Store};
use crate::model::record::{EntityKind, Record, RecordId};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
struct Table {
    last_id: RecordId,
    rows: BTreeMap<RecordId, StoredRow>,
}

#[derive(Debug, Clone)]
struct StoredRow {
    unique_key: Option<String>,
    search_key: String,
    body: Value,
}

/// Process-local [`Store`] with the same constraints as the SQLite adapter.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: BTreeMap<EntityKind, Table>,
    checkpoint: Option<BTreeMap<EntityKind, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, kind: EntityKind) -> Option<&Table> {
        self.tables.get(&kind)
    }

    fn collect<R: Record>(&self, mut keep: impl FnMut(&StoredRow) -> bool) -> RepoResult<Vec<R>> {
        let Some(table) = self.table(R::KIND) else {
            return Ok(Vec::new());
        };
        table
            .rows
            .iter()
            .filter(|(_, row)| keep(row))
            .map(|(id, row)| decode::<R>(*id, row))
            .collect()
    }
}

impl Store for MemoryStore {
    fn save<R: Record>(&mut self, mut record: R) -> RepoResult<R> {
        record.validate()?;
        let body = serde_json::to_value(&record).map_err(|err| {
            RepoError::InvalidData(format!("cannot encode {} record: {err}", R::KIND))
        })?;
        let table = self.tables.entry(R::KIND).or_default();

        if let Some(key) = record.unique_key() {
            let taken = table.rows.iter().any(|(id, row)| {
                *id != record.record_id() && row.unique_key.as_deref() == Some(key)
            });
            if taken {
                return Err(RepoError::UniqueViolation {
                    kind: R::KIND,
                    key: key.to_string(),
                });
            }
        }

        let id = if record.is_persisted() {
            if !table.rows.contains_key(&record.record_id()) {
                return Err(RepoError::NotFound {
                    kind: R::KIND,
                    id: record.record_id(),
                });
            }
            record.record_id()
        } else {
            table.last_id += 1;
            table.last_id
        };

        record.assign_id(id);
        table.rows.insert(
            id,
            StoredRow {
                unique_key: record.unique_key().map(str::to_string),
                search_key: record.search_key().to_string(),
                body,
            },
        );
        Ok(record)
    }

    fn delete_by_id<R: Record>(&mut self, id: RecordId) -> RepoResult<()> {
        let removed = self
            .tables
            .get_mut(&R::KIND)
            .and_then(|table| table.rows.remove(&id));
        match removed {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound { kind: R::KIND, id }),
        }
    }

    fn find_by_id<R: Record>(&self, id: RecordId) -> RepoResult<Option<R>> {
        self.table(R::KIND)
            .and_then(|table| table.rows.get(&id))
            .map(|row| decode::<R>(id, row))
            .transpose()
    }

    fn find_by_unique_field<R: Record>(&self, value: &str) -> RepoResult<Option<R>> {
        Ok(self
            .collect::<R>(|row| row.unique_key.as_deref() == Some(value))?
            .into_iter()
            .next())
    }

    fn find_all<R: Record>(&self) -> RepoResult<Vec<R>> {
        self.collect(|_| true)
    }

    fn find_by_prefix<R: Record>(&self, prefix: &str) -> RepoResult<Vec<R>> {
        let mut matched = self.collect::<R>(|row| row.search_key.starts_with(prefix))?;
        matched.sort_by(|left, right| {
            left.search_key()
                .cmp(right.search_key())
                .then(left.record_id().cmp(&right.record_id()))
        });
        Ok(matched)
    }

    fn begin(&mut self) -> RepoResult<()> {
        if self.checkpoint.is_some() {
            return Err(RepoError::Transaction("begin while a transaction is open"));
        }
        self.checkpoint = Some(self.tables.clone());
        Ok(())
    }

    fn commit(&mut self) -> RepoResult<()> {
        match self.checkpoint.take() {
            Some(_) => Ok(()),
            None => Err(RepoError::Transaction("commit without begin")),
        }
    }

    fn rollback(&mut self) -> RepoResult<()> {
        match self.checkpoint.take() {
            Some(tables) => {
                self.tables = tables;
                Ok(())
            }
            None => Err(RepoError::Transaction("rollback without begin")),
        }
    }
}

fn decode<R: Record>(id: RecordId, row: &StoredRow) -> RepoResult<R> {
    let mut record: R = serde_json::from_value(row.body.clone()).map_err(|err| {
        RepoError::InvalidData(format!("invalid {} body for id {id}: {err}", R::KIND))
    })?;
    record.assign_id(id);
    Ok(record)
}
