//! Baseline, starting workforce, snapshot, and snapshot-state queries.

use super::SimStore;
use crate::{
    error::SimResult,
    types::SimYear,
    workforce::{DetailedStatus, EmployeeState, WorkforceSnapshotRow},
};
use rusqlite::{params, Row};

fn employee_from_row(row: &Row<'_>) -> rusqlite::Result<EmployeeState> {
    Ok(EmployeeState {
        employee_id:          row.get(0)?,
        current_compensation: row.get(1)?,
        current_age:          row.get(2)?,
        current_tenure:       row.get(3)?,
        level:                row.get(4)?,
    })
}

impl SimStore {
    // ── Baseline ───────────────────────────────────────────────

    pub fn insert_baseline_employee(&self, e: &EmployeeState) -> SimResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO baseline_workforce (
                employee_id, employment_status, current_compensation,
                current_age, current_tenure, level
            ) VALUES (?1, 'active', ?2, ?3, ?4, ?5)",
            params![
                e.employee_id,
                e.current_compensation,
                e.current_age,
                e.current_tenure,
                e.level
            ],
        )?;
        Ok(())
    }

    /// Replace the whole baseline population in one transaction.
    pub fn replace_baseline(&self, employees: &[EmployeeState]) -> SimResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM baseline_workforce", [])?;
        for e in employees {
            self.insert_baseline_employee(e)?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn baseline_active_count(&self) -> SimResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM baseline_workforce WHERE employment_status = 'active'",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn baseline_active(&self) -> SimResult<Vec<EmployeeState>> {
        let mut stmt = self.conn.prepare(
            "SELECT employee_id, current_compensation, current_age, current_tenure, level
             FROM baseline_workforce WHERE employment_status = 'active'
             ORDER BY employee_id",
        )?;
        let rows = stmt.query_map([], employee_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ── Starting workforce (per-year staging) ──────────────────

    pub fn replace_starting_workforce(
        &self,
        year: SimYear,
        employees: &[EmployeeState],
    ) -> SimResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM int_starting_workforce WHERE simulation_year = ?1",
            params![year],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO int_starting_workforce (
                    simulation_year, employee_id, current_compensation,
                    current_age, current_tenure, level
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for e in employees {
                stmt.execute(params![
                    year,
                    e.employee_id,
                    e.current_compensation,
                    e.current_age,
                    e.current_tenure,
                    e.level
                ])?;
            }
        }
        tx.commit()?;
        Ok(employees.len())
    }

    pub fn starting_workforce(&self, year: SimYear) -> SimResult<Vec<EmployeeState>> {
        let mut stmt = self.conn.prepare(
            "SELECT employee_id, current_compensation, current_age, current_tenure, level
             FROM int_starting_workforce WHERE simulation_year = ?1
             ORDER BY employee_id",
        )?;
        let rows = stmt.query_map(params![year], employee_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ── Workforce snapshot ─────────────────────────────────────

    /// Supersede the snapshot for `year` with `rows`.
    pub fn replace_snapshot(
        &self,
        year: SimYear,
        rows: &[WorkforceSnapshotRow],
    ) -> SimResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM fct_workforce_snapshot WHERE simulation_year = ?1",
            params![year],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO fct_workforce_snapshot (
                    simulation_year, employee_id, employment_status, current_compensation,
                    current_age, current_tenure, level, detailed_status_code
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for r in rows {
                stmt.execute(params![
                    year,
                    r.employee_id,
                    r.employment_status.as_str(),
                    r.current_compensation,
                    r.current_age,
                    r.current_tenure,
                    r.level,
                    r.detailed_status.as_str(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    pub fn active_headcount(&self, year: SimYear) -> SimResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM fct_workforce_snapshot
             WHERE simulation_year = ?1 AND employment_status = 'active'",
            params![year],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Active employees at the end of `year`, as next year's starting state.
    pub fn snapshot_active(&self, year: SimYear) -> SimResult<Vec<EmployeeState>> {
        let mut stmt = self.conn.prepare(
            "SELECT employee_id, current_compensation, current_age, current_tenure, level
             FROM fct_workforce_snapshot
             WHERE simulation_year = ?1 AND employment_status = 'active'
             ORDER BY employee_id",
        )?;
        let rows = stmt.query_map(params![year], employee_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn detailed_status_count(&self, year: SimYear, status: DetailedStatus) -> SimResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM fct_workforce_snapshot
             WHERE simulation_year = ?1 AND detailed_status_code = ?2",
            params![year, status.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn total_compensation(&self, year: SimYear) -> SimResult<f64> {
        let total: f64 = self.conn.query_row(
            "SELECT COALESCE(SUM(current_compensation), 0.0) FROM fct_workforce_snapshot
             WHERE simulation_year = ?1 AND employment_status = 'active'",
            params![year],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    // ── Snapshot state (SCD history) ───────────────────────────

    /// Copy the year's snapshot into the state history.
    /// Callers delete the year's state rows first.
    pub fn copy_snapshot_to_state(&self, year: SimYear, recorded_at: &str) -> SimResult<usize> {
        let inserted = self.conn.execute(
            "INSERT INTO scd_workforce_state (
                simulation_year, employee_id, employment_status, current_compensation,
                level, valid_from, valid_to, recorded_at
            )
            SELECT simulation_year, employee_id, employment_status, current_compensation,
                   level, printf('%04d-01-01', simulation_year),
                   CASE WHEN employment_status = 'active' THEN NULL
                        ELSE printf('%04d-12-31', simulation_year) END,
                   ?2
            FROM fct_workforce_snapshot WHERE simulation_year = ?1",
            params![year, recorded_at],
        )?;
        Ok(inserted)
    }
}
