//! SQLite-backed record store.
//!
//! # Responsibility
//! - Persist records as JSON bodies in one table per `EntityKind`.
//! - Translate `UNIQUE` constraint conflicts into `RepoError::UniqueViolation`.
//!
//! # Invariants
//! - Ids come from `AUTOINCREMENT` and are never reused.
//! - The `id` column is authoritative; the id inside `body` is overwritten on
//!   read.

use super::{RepoError, RepoResult, Store};
use crate::db::migrations::{current_user_version, latest_version};
use crate::model::record::{EntityKind, Record, RecordId};
use rusqlite::{ffi, params, Connection, OptionalExtension, Params};

const REQUIRED_COLUMNS: [&str; 4] = ["id", "unique_key", "search_key", "body"];

/// Record store over one migrated SQLite connection.
pub struct SqliteStore {
    conn: Connection,
    in_transaction: bool,
}

impl SqliteStore {
    /// Wraps a connection returned by `db::open_db*`.
    ///
    /// # Errors
    /// - `UninitializedConnection` if migrations have not been applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` on schema drift.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        ensure_connection_ready(&conn)?;
        Ok(Self {
            conn,
            in_transaction: false,
        })
    }

    fn load_many<R: Record, P: Params>(&self, sql: &str, params: P) -> RepoResult<Vec<R>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok((row.get::<_, RecordId>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut records = Vec::new();
        for row in rows {
            let (id, body) = row?;
            records.push(decode::<R>(id, &body)?);
        }
        Ok(records)
    }

    fn load_one<R: Record, P: Params>(&self, sql: &str, params: P) -> RepoResult<Option<R>> {
        let row = self
            .conn
            .query_row(sql, params, |row| {
                Ok((row.get::<_, RecordId>(0)?, row.get::<_, String>(1)?))
            })
            .optional()?;
        match row {
            Some((id, body)) => Ok(Some(decode::<R>(id, &body)?)),
            None => Ok(None),
        }
    }
}

impl Store for SqliteStore {
    fn save<R: Record>(&mut self, mut record: R) -> RepoResult<R> {
        record.validate()?;
        let table = R::KIND.table_name();
        let body = encode(&record)?;

        if record.is_persisted() {
            let changed = self
                .conn
                .execute(
                    &format!(
                        "UPDATE {table}
                         SET
                            unique_key = ?2,
                            search_key = ?3,
                            body = ?4,
                            updated_at = (strftime('%s', 'now') * 1000)
                         WHERE id = ?1;"
                    ),
                    params![
                        record.record_id(),
                        record.unique_key(),
                        record.search_key(),
                        body
                    ],
                )
                .map_err(|err| translate_write_error(err, &record))?;
            if changed == 0 {
                return Err(RepoError::NotFound {
                    kind: R::KIND,
                    id: record.record_id(),
                });
            }
            return Ok(record);
        }

        self.conn
            .execute(
                &format!(
                    "INSERT INTO {table} (unique_key, search_key, body)
                     VALUES (?1, ?2, ?3);"
                ),
                params![record.unique_key(), record.search_key(), body],
            )
            .map_err(|err| translate_write_error(err, &record))?;
        record.assign_id(self.conn.last_insert_rowid());
        Ok(record)
    }

    fn delete_by_id<R: Record>(&mut self, id: RecordId) -> RepoResult<()> {
        let table = R::KIND.table_name();
        let changed = self
            .conn
            .execute(&format!("DELETE FROM {table} WHERE id = ?1;"), [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { kind: R::KIND, id });
        }
        Ok(())
    }

    fn find_by_id<R: Record>(&self, id: RecordId) -> RepoResult<Option<R>> {
        let table = R::KIND.table_name();
        self.load_one(&format!("SELECT id, body FROM {table} WHERE id = ?1;"), [id])
    }

    fn find_by_unique_field<R: Record>(&self, value: &str) -> RepoResult<Option<R>> {
        let table = R::KIND.table_name();
        self.load_one(
            &format!("SELECT id, body FROM {table} WHERE unique_key = ?1;"),
            [value],
        )
    }

    fn find_all<R: Record>(&self) -> RepoResult<Vec<R>> {
        let table = R::KIND.table_name();
        self.load_many(&format!("SELECT id, body FROM {table} ORDER BY id ASC;"), [])
    }

    fn find_by_prefix<R: Record>(&self, prefix: &str) -> RepoResult<Vec<R>> {
        let table = R::KIND.table_name();
        self.load_many(
            &format!(
                "SELECT id, body
                 FROM {table}
                 WHERE substr(search_key, 1, length(?1)) = ?1
                 ORDER BY search_key ASC, id ASC;"
            ),
            [prefix],
        )
    }

    fn begin(&mut self) -> RepoResult<()> {
        if self.in_transaction {
            return Err(RepoError::Transaction("begin while a transaction is open"));
        }
        self.conn.execute_batch("BEGIN IMMEDIATE;")?;
        self.in_transaction = true;
        Ok(())
    }

    fn commit(&mut self) -> RepoResult<()> {
        if !self.in_transaction {
            return Err(RepoError::Transaction("commit without begin"));
        }
        // A failed COMMIT leaves the transaction open for rollback.
        self.conn.execute_batch("COMMIT;")?;
        self.in_transaction = false;
        Ok(())
    }

    fn rollback(&mut self) -> RepoResult<()> {
        if !self.in_transaction {
            return Err(RepoError::Transaction("rollback without begin"));
        }
        self.in_transaction = false;
        self.conn.execute_batch("ROLLBACK;")?;
        Ok(())
    }
}

fn encode<R: Record>(record: &R) -> RepoResult<String> {
    serde_json::to_string(record).map_err(|err| {
        RepoError::InvalidData(format!("cannot encode {} record: {err}", R::KIND))
    })
}

fn decode<R: Record>(id: RecordId, body: &str) -> RepoResult<R> {
    let mut record: R = serde_json::from_str(body).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid {} body in {}.body for id {id}: {err}",
            R::KIND,
            R::KIND.table_name()
        ))
    })?;
    record.assign_id(id);
    Ok(record)
}

/// Maps `SQLITE_CONSTRAINT_UNIQUE` on the key column to `UniqueViolation`.
/// Other constraint failures stay `Db` errors.
fn translate_write_error<R: Record>(err: rusqlite::Error, record: &R) -> RepoError {
    match (&err, record.unique_key()) {
        (rusqlite::Error::SqliteFailure(failure, _), Some(key))
            if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            RepoError::UniqueViolation {
                kind: R::KIND,
                key: key.to_string(),
            }
        }
        _ => err.into(),
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for kind in EntityKind::ALL {
        let table = kind.table_name();
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for column in REQUIRED_COLUMNS {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
