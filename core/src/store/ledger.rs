//! Event staging and the consolidated yearly ledger.

use super::SimStore;
use crate::{
    error::SimResult,
    event::{EventCategory, EventCounts, EventRecord, EventType},
    types::SimYear,
};
use rusqlite::{
    params,
    types::{FromSql, FromSqlError, FromSqlResult, ValueRef},
    Row,
};

impl FromSql for EventType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        EventType::parse(value.as_str()?).ok_or(FromSqlError::InvalidType)
    }
}

impl FromSql for EventCategory {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        EventCategory::parse(value.as_str()?).ok_or(FromSqlError::InvalidType)
    }
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<EventRecord> {
    Ok(EventRecord {
        simulation_year: row.get(0)?,
        employee_id:     row.get(1)?,
        event_type:      row.get(2)?,
        event_category:  row.get(3)?,
        effective_date:  row.get(4)?,
        old_value:       row.get(5)?,
        new_value:       row.get(6)?,
        employee_age:    row.get(7)?,
        employee_level:  row.get(8)?,
    })
}

impl SimStore {
    // ── Staging ────────────────────────────────────────────────

    /// Stage events produced by `step`, in one transaction.
    pub fn insert_staged_events(&self, step: &str, events: &[EventRecord]) -> SimResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO int_workforce_events (
                    simulation_year, source_step, employee_id, event_type, event_category,
                    effective_date, old_value, new_value, employee_age, employee_level
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for e in events {
                stmt.execute(params![
                    e.simulation_year,
                    step,
                    e.employee_id,
                    e.event_type.as_str(),
                    e.event_category.as_str(),
                    e.effective_date,
                    e.old_value,
                    e.new_value,
                    e.employee_age,
                    e.employee_level,
                ])?;
            }
        }
        tx.commit()?;
        Ok(events.len())
    }

    pub fn delete_staged_events(&self, year: SimYear, step: &str) -> SimResult<usize> {
        Ok(self.conn.execute(
            "DELETE FROM int_workforce_events WHERE simulation_year = ?1 AND source_step = ?2",
            params![year, step],
        )?)
    }

    /// Drop every staged row for `step`, across all years (full refresh).
    pub fn clear_staged_events(&self, step: &str) -> SimResult<usize> {
        Ok(self.conn.execute(
            "DELETE FROM int_workforce_events WHERE source_step = ?1",
            params![step],
        )?)
    }

    pub fn staged_events(&self, year: SimYear, step: &str) -> SimResult<Vec<EventRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT simulation_year, employee_id, event_type, event_category, effective_date,
                    old_value, new_value, employee_age, employee_level
             FROM int_workforce_events
             WHERE simulation_year = ?1 AND source_step = ?2
             ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![year, step], event_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ── Ledger ─────────────────────────────────────────────────

    /// Rebuild the ledger slice for `year` from staged events, taking the
    /// steps in the given order. Returns the number of ledger rows written.
    pub fn consolidate_ledger(&self, year: SimYear, step_order: &[&str]) -> SimResult<usize> {
        let mut events = Vec::new();
        for step in step_order {
            events.extend(self.staged_events(year, step)?);
        }

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM fct_yearly_events WHERE simulation_year = ?1",
            params![year],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO fct_yearly_events (
                    simulation_year, event_sequence, employee_id, event_type, event_category,
                    effective_date, old_value, new_value, employee_age, employee_level
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for (seq, e) in events.iter().enumerate() {
                stmt.execute(params![
                    year,
                    seq as i64 + 1,
                    e.employee_id,
                    e.event_type.as_str(),
                    e.event_category.as_str(),
                    e.effective_date,
                    e.old_value,
                    e.new_value,
                    e.employee_age,
                    e.employee_level,
                ])?;
            }
        }
        tx.commit()?;
        Ok(events.len())
    }

    pub fn ledger_events(&self, year: SimYear) -> SimResult<Vec<EventRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT simulation_year, employee_id, event_type, event_category, effective_date,
                    old_value, new_value, employee_age, employee_level
             FROM fct_yearly_events
             WHERE simulation_year = ?1
             ORDER BY event_sequence ASC",
        )?;
        let rows = stmt.query_map(params![year], event_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn event_counts(&self, year: SimYear) -> SimResult<EventCounts> {
        let mut stmt = self.conn.prepare(
            "SELECT event_type, event_category, COUNT(*)
             FROM fct_yearly_events WHERE simulation_year = ?1
             GROUP BY event_type, event_category",
        )?;
        let rows = stmt
            .query_map(params![year], |row| {
                Ok((
                    row.get::<_, EventType>(0)?,
                    row.get::<_, EventCategory>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut counts = EventCounts::default();
        for (event_type, category, n) in rows {
            match (event_type, category) {
                (EventType::Hire, _) => counts.hires += n,
                (EventType::Termination, EventCategory::NewHireTermination) => {
                    counts.new_hire_terminations += n
                }
                (EventType::Termination, _) => counts.experienced_terminations += n,
                (EventType::Promotion, _) => counts.promotions += n,
                (EventType::Merit, _) => counts.merits += n,
            }
        }
        Ok(counts)
    }
}
