//! Connection provisioning.
//!
//! Every orchestration operation acquires its own `SimStore` and drops it
//! when the operation ends, on success and error paths alike. Nothing holds
//! a connection across steps.

use super::SimStore;
use crate::error::SimResult;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Hands out fresh store handles. Injected into every component.
pub trait ConnectionProvider: Send + Sync {
    fn acquire(&self) -> SimResult<SimStore>;
}

/// Provider over a SQLite path or shared-cache URI.
pub struct StoreProvider {
    path:         String,
    acquisitions: AtomicUsize,
    // Keeps a shared in-memory database alive between acquisitions.
    _anchor:      Option<std::sync::Mutex<SimStore>>,
}

impl StoreProvider {
    /// Provider for a database file. Applies migrations once.
    pub fn open(path: &str) -> SimResult<Self> {
        SimStore::open(path)?.migrate()?;
        Ok(Self {
            path:         path.to_string(),
            acquisitions: AtomicUsize::new(0),
            _anchor:      None,
        })
    }

    /// Provider for a uniquely named shared-cache in-memory database.
    /// All handles acquired from it see the same data.
    pub fn in_memory() -> SimResult<Self> {
        let name = uuid::Uuid::new_v4().simple().to_string();
        let path = format!("file:wf_{name}?mode=memory&cache=shared");
        let anchor = SimStore::open(&path)?;
        anchor.migrate()?;
        Ok(Self {
            path,
            acquisitions: AtomicUsize::new(0),
            _anchor: Some(std::sync::Mutex::new(anchor)),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Number of handles acquired so far.
    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::Relaxed)
    }
}

impl ConnectionProvider for StoreProvider {
    fn acquire(&self) -> SimResult<SimStore> {
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        SimStore::open(&self.path)
    }
}
