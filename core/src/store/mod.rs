//! SQLite persistence layer — the analytical store.
//!
//! RULE: Only store/ talks to the database.
//! Orchestration components and reference steps call store methods;
//! they never execute SQL directly.

use crate::{error::SimResult, types::SimYear};
use rusqlite::{params, Connection};

mod ledger;
mod provider;
mod run;
mod workforce;

pub use provider::{ConnectionProvider, StoreProvider};

/// Tables keyed by `simulation_year` that the orchestrator counts and
/// deletes directly, without going through the transformation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum YearTable {
    /// The append-only event ledger.
    Ledger,
    /// End-of-year workforce snapshot.
    Snapshot,
    /// SCD-style snapshot history maintained by the snapshot manager.
    SnapshotState,
}

impl YearTable {
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Ledger        => "fct_yearly_events",
            Self::Snapshot      => "fct_workforce_snapshot",
            Self::SnapshotState => "scd_workforce_state",
        }
    }
}

pub struct SimStore {
    conn: Connection,
}

impl SimStore {
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open a private in-memory database (used in unit tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_events.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_snapshots.sql"))?;
        Ok(())
    }

    // ── Year-keyed tables ──────────────────────────────────────

    pub fn count_for_year(&self, table: YearTable, year: SimYear) -> SimResult<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE simulation_year = ?1",
            table.table_name()
        );
        let count: i64 = self.conn.query_row(&sql, params![year], |row| row.get(0))?;
        Ok(count)
    }

    pub fn delete_for_year(&self, table: YearTable, year: SimYear) -> SimResult<usize> {
        let sql = format!(
            "DELETE FROM {} WHERE simulation_year = ?1",
            table.table_name()
        );
        Ok(self.conn.execute(&sql, params![year])?)
    }

    pub fn count_outside_range(
        &self,
        table: YearTable,
        min_year: SimYear,
        max_year: SimYear,
    ) -> SimResult<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE simulation_year < ?1 OR simulation_year > ?2",
            table.table_name()
        );
        let count: i64 = self
            .conn
            .query_row(&sql, params![min_year, max_year], |row| row.get(0))?;
        Ok(count)
    }

    pub fn delete_outside_range(
        &self,
        table: YearTable,
        min_year: SimYear,
        max_year: SimYear,
    ) -> SimResult<usize> {
        let sql = format!(
            "DELETE FROM {} WHERE simulation_year < ?1 OR simulation_year > ?2",
            table.table_name()
        );
        Ok(self.conn.execute(&sql, params![min_year, max_year])?)
    }

    /// Distinct years present in a table, ascending.
    pub fn years_present(&self, table: YearTable) -> SimResult<Vec<SimYear>> {
        let sql = format!(
            "SELECT DISTINCT simulation_year FROM {} ORDER BY simulation_year",
            table.table_name()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let years = stmt
            .query_map([], |row| row.get::<_, SimYear>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(years)
    }
}
