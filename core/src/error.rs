use crate::types::SimYear;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Baseline workforce is not valid; refusing to start a multi-year run")]
    BaselineInvalid,

    #[error(
        "Step '{step}' ({description}) failed with exit code {exit_code}\n--- stdout ---\n{stdout}\n--- stderr ---\n{stderr}"
    )]
    EngineExecution {
        step:        String,
        description: String,
        exit_code:   i32,
        stdout:      String,
        stderr:      String,
    },

    #[error(
        "Year {year} depends on an incomplete previous year: ledger={ledger_rows} snapshot={snapshot_rows}"
    )]
    MissingDependency {
        year:          SimYear,
        ledger_rows:   i64,
        snapshot_rows: i64,
    },

    #[error("Year {year} is incomplete: ledger={ledger_rows} snapshot={snapshot_rows}")]
    IncompleteYear {
        year:          SimYear,
        ledger_rows:   i64,
        snapshot_rows: i64,
    },

    #[error("{kind} snapshot for year {year} produced zero rows")]
    SnapshotIntegrity { year: SimYear, kind: String },

    #[error("Variable '{name}' is missing or has the wrong type")]
    InvalidVariable { name: String },

    #[error("Invalid calendar date: year {year}, day {day}")]
    InvalidDate { year: SimYear, day: u32 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
