//! Run registry.

use super::SimStore;
use crate::{error::SimResult, types::SimYear};
use rusqlite::{params, OptionalExtension};

impl SimStore {
    pub fn insert_run(
        &self,
        run_id: &str,
        start_year: SimYear,
        end_year: SimYear,
        seed: u64,
        version: &str,
        started_at: &str,
    ) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO simulation_run (
                run_id, start_year, end_year, random_seed, version, started_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![run_id, start_year, end_year, seed as i64, version, started_at],
        )?;
        Ok(())
    }

    pub fn complete_run(
        &self,
        run_id: &str,
        status: &str,
        completed_at: &str,
        summary_json: &str,
    ) -> SimResult<()> {
        self.conn.execute(
            "UPDATE simulation_run SET status = ?2, completed_at = ?3, summary_json = ?4
             WHERE run_id = ?1",
            params![run_id, status, completed_at, summary_json],
        )?;
        Ok(())
    }

    pub fn run_status(&self, run_id: &str) -> SimResult<Option<String>> {
        let status = self
            .conn
            .query_row(
                "SELECT status FROM simulation_run WHERE run_id = ?1",
                params![run_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(status)
    }
}
