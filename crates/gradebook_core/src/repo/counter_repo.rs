//! Sequence counter repository for identifier allocation.
//!
//! # Responsibility
//! - Keep one persisted counter row per allocation scope.
//! - Expose the greatest existing identifier of a scope for first-use seeding.
//!
//! # Invariants
//! - `advance_sequence` is a single upsert statement; concurrent callers on
//!   separate connections always observe distinct values.
//! - Scans order by the numeric sequence tail, ignoring the year prefix, so
//!   `2024CS0010` outranks `2025CS0002`.
//! - Ids that do not match the scope format sort first, so seeding surfaces
//!   them as malformed instead of skipping them.

use super::{ensure_connection_ready, table_exists, table_has_column, RepoError, RepoResult};
use crate::model::identifier::{IdScope, TEACHER_SCOPE_CODE};
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for allocation counters.
pub trait IdCounterRepository {
    /// Last sequence handed out for `scope`, or `None` before first use.
    fn current_sequence(&self, scope: &IdScope) -> RepoResult<Option<u64>>;
    /// Greatest identifier already stored in the scope's collection.
    fn last_identifier(&self, scope: &IdScope) -> RepoResult<Option<String>>;
    /// Atomically increments the scope counter and returns the new value.
    ///
    /// When no counter row exists yet it is created with `seed + 1`.
    fn advance_sequence(&self, scope: &IdScope, seed: u64) -> RepoResult<u64>;
}

/// SQLite-backed counter repository.
pub struct SqliteIdCounterRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteIdCounterRepository<'conn> {
    /// Binds to a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl IdCounterRepository for SqliteIdCounterRepository<'_> {
    fn current_sequence(&self, scope: &IdScope) -> RepoResult<Option<u64>> {
        let value: Option<i64> = self
            .conn
            .query_row(
                "SELECT last_value FROM id_counters WHERE scope = ?1;",
                [scope.counter_key()],
                |row| row.get(0),
            )
            .optional()?;
        value.map(|value| to_sequence(value, scope)).transpose()
    }

    fn last_identifier(&self, scope: &IdScope) -> RepoResult<Option<String>> {
        scope.validate()?;
        let id = match scope {
            IdScope::Department(code) => self
                .conn
                .query_row(
                    &scoped_scan_sql(
                        "students s JOIN departments d ON d.id = s.department_id",
                        "s.id",
                        "d.code = ?1",
                    ),
                    [code],
                    |row| row.get(0),
                )
                .optional()?,
            IdScope::Teacher => self
                .conn
                .query_row(
                    &scoped_scan_sql("teachers", "id", "1 = 1"),
                    [TEACHER_SCOPE_CODE],
                    |row| row.get(0),
                )
                .optional()?,
            IdScope::Collection(name) => {
                if !table_exists(self.conn, name)? || !table_has_column(self.conn, name, "id")? {
                    return Ok(None);
                }
                // `name` is restricted to `[a-z][a-z0-9_]*` by `IdScope::validate`.
                self.conn
                    .query_row(
                        &format!(
                            "SELECT id FROM {name}
                             ORDER BY (id = '' OR id GLOB '*[^0-9]*') DESC,
                                      CAST(id AS INTEGER) DESC
                             LIMIT 1;"
                        ),
                        [],
                        |row| row.get(0),
                    )
                    .optional()?
            }
        };
        Ok(id)
    }

    fn advance_sequence(&self, scope: &IdScope, seed: u64) -> RepoResult<u64> {
        let initial = seed
            .checked_add(1)
            .and_then(|value| i64::try_from(value).ok())
            .ok_or_else(|| {
                RepoError::InvalidData(format!("sequence seed {seed} overflows scope `{scope}`"))
            })?;

        let value: i64 = self.conn.query_row(
            "INSERT INTO id_counters (scope, last_value) VALUES (?1, ?2)
             ON CONFLICT (scope) DO UPDATE SET
                last_value = id_counters.last_value + 1,
                updated_at = (strftime('%s', 'now') * 1000)
             RETURNING last_value;",
            params![scope.counter_key(), initial],
            |row| row.get(0),
        )?;
        to_sequence(value, scope)
    }
}

/// Greatest `<year><code><digits>` id, with `?1` bound to the scope code.
fn scoped_scan_sql(from: &str, id_column: &str, filter: &str) -> String {
    let tail = format!("substr({id_column}, 5 + LENGTH(?1))");
    format!(
        "SELECT {id_column}
         FROM {from}
         WHERE {filter}
         ORDER BY (
                NOT {id_column} GLOB '[0-9][0-9][0-9][0-9]' || ?1 || '[0-9][0-9][0-9][0-9]*'
                OR {tail} GLOB '*[^0-9]*'
             ) DESC,
             CAST({tail} AS INTEGER) DESC,
             {id_column} DESC
         LIMIT 1;"
    )
}

fn to_sequence(value: i64, scope: &IdScope) -> RepoResult<u64> {
    u64::try_from(value).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid counter value `{value}` for scope `{scope}` in id_counters.last_value"
        ))
    })
}
