//! Year-scoped deletion and orphan hygiene for the ledger and snapshot.
//!
//! Best effort by policy: a failure on one table or year is logged,
//! recorded in the report, and the batch moves on.

use crate::{
    error::SimResult,
    store::{ConnectionProvider, SimStore, YearTable},
    types::SimYear,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Tables the cleaner owns.
pub const CLEANED_TABLES: [YearTable; 2] = [YearTable::Ledger, YearTable::Snapshot];

#[derive(Debug)]
pub struct CleanFailure {
    pub table: &'static str,
    /// `None` when the failure was not tied to one year (range cleanup).
    pub year:  Option<SimYear>,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct CleanReport {
    /// Rows deleted per table name.
    pub deleted:   BTreeMap<&'static str, usize>,
    /// Years left in each table after orphan cleanup.
    pub preserved: BTreeMap<&'static str, Vec<SimYear>>,
    pub failures:  Vec<CleanFailure>,
}

impl CleanReport {
    fn zeroed() -> Self {
        Self {
            deleted:   CLEANED_TABLES.iter().map(|t| (t.table_name(), 0)).collect(),
            preserved: BTreeMap::new(),
            failures:  Vec::new(),
        }
    }

    pub fn deleted_from(&self, table: YearTable) -> usize {
        self.deleted.get(table.table_name()).copied().unwrap_or(0)
    }

    pub fn preserved_in(&self, table: YearTable) -> &[SimYear] {
        self.preserved
            .get(table.table_name())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn total_deleted(&self) -> usize {
        self.deleted.values().sum()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record_failure(&mut self, table: YearTable, year: Option<SimYear>, error: String) {
        self.failures.push(CleanFailure {
            table: table.table_name(),
            year,
            error,
        });
    }
}

pub struct DataCleaner {
    provider: Arc<dyn ConnectionProvider>,
}

impl DataCleaner {
    pub fn new(provider: Arc<dyn ConnectionProvider>) -> Self {
        Self { provider }
    }

    /// Delete ledger and snapshot rows for each year.
    /// An empty list is a no-op that never touches the store.
    pub fn clean_years(&self, years: &[SimYear]) -> CleanReport {
        let mut report = CleanReport::zeroed();
        if years.is_empty() {
            return report;
        }

        let store = match self.provider.acquire() {
            Ok(store) => store,
            Err(e) => {
                log::warn!("clean: cannot acquire store: {e}");
                for table in CLEANED_TABLES {
                    for &year in years {
                        report.record_failure(table, Some(year), e.to_string());
                    }
                }
                return report;
            }
        };

        for &year in years {
            for table in CLEANED_TABLES {
                match store.delete_for_year(table, year) {
                    Ok(n) => {
                        *report.deleted.entry(table.table_name()).or_default() += n;
                        if n > 0 {
                            log::debug!("year={year} clean: {} -{n} rows", table.table_name());
                        }
                    }
                    Err(e) => {
                        log::warn!(
                            "year={year} clean: {} delete failed, continuing: {e}",
                            table.table_name()
                        );
                        report.record_failure(table, Some(year), e.to_string());
                    }
                }
            }
        }

        log::info!(
            "clean: years={years:?} ledger=-{} snapshot=-{} failures={}",
            report.deleted_from(YearTable::Ledger),
            report.deleted_from(YearTable::Snapshot),
            report.failures.len()
        );
        report
    }

    /// Delete ledger and snapshot rows whose year lies outside
    /// `[min(range), max(range)]`. An empty range is a no-op.
    pub fn clean_outside_range(&self, range: &[SimYear]) -> CleanReport {
        let mut report = CleanReport::zeroed();
        let (Some(&min_year), Some(&max_year)) = (range.iter().min(), range.iter().max()) else {
            return report;
        };

        let store = match self.provider.acquire() {
            Ok(store) => store,
            Err(e) => {
                log::warn!("orphan clean: cannot acquire store: {e}");
                for table in CLEANED_TABLES {
                    report.record_failure(table, None, e.to_string());
                }
                return report;
            }
        };

        for table in CLEANED_TABLES {
            match purge_outside(&store, table, min_year, max_year) {
                Ok((n, preserved)) => {
                    report.deleted.insert(table.table_name(), n);
                    report.preserved.insert(table.table_name(), preserved);
                }
                Err(e) => {
                    log::warn!(
                        "orphan clean: {} failed, continuing: {e}",
                        table.table_name()
                    );
                    report.record_failure(table, None, e.to_string());
                }
            }
        }
        report
    }
}

fn purge_outside(
    store: &SimStore,
    table: YearTable,
    min_year: SimYear,
    max_year: SimYear,
) -> SimResult<(usize, Vec<SimYear>)> {
    let orphans = store.count_outside_range(table, min_year, max_year)?;
    let deleted = if orphans == 0 {
        0
    } else {
        store.delete_outside_range(table, min_year, max_year)?
    };
    let preserved = store.years_present(table)?;
    log::info!(
        "orphan clean: {} -{deleted} rows outside {min_year}..={max_year}; preserved years {preserved:?}",
        table.table_name()
    );
    Ok((deleted, preserved))
}
