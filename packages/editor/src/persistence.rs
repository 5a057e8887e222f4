//! # Persistence Gateway
//!
//! Whole-design snapshots keyed by design name, plus a most-recently-used
//! list of names stored under [`DESIGNS_KEY`].

use crate::document::Design;
use crate::{EditorError, EditorResult};
use chrono::{SecondsFormat, Timelike, Utc};
use designer_common::SnapshotStore;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Storage key of the recently used design names
pub const DESIGNS_KEY: &str = "designs";

/// A save that failed in the background
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceWarning {
    pub design: String,
    pub message: String,
}

impl fmt::Display for PersistenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to save {:?}: {}", self.design, self.message)
    }
}

/// Reads and writes design snapshots through a [`SnapshotStore`]
#[derive(Clone)]
pub struct Persistence {
    store: Arc<dyn SnapshotStore>,
}

impl fmt::Debug for Persistence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Persistence").finish_non_exhaustive()
    }
}

impl Persistence {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self { store }
    }

    /// Write a snapshot of `design` and move its name to the front of the
    /// recently used list. Returns the stamped save time.
    pub fn save(&self, design: &Design) -> EditorResult<String> {
        if design.name == DESIGNS_KEY {
            return Err(EditorError::Precondition(format!(
                "{DESIGNS_KEY:?} is reserved and cannot name a design"
            )));
        }

        let date = timestamp();
        let mut snapshot = design.clone();
        snapshot.date = Some(date.clone());
        self.store
            .set(&design.name, &serde_json::to_string(&snapshot)?)?;

        let mut names = self.design_names()?;
        if names.first() != Some(&design.name) {
            names.retain(|name| *name != design.name);
            names.insert(0, design.name.clone());
            self.write_names(&names)?;
        }

        tracing::info!(design = %design.name, %date, "saved design");
        Ok(date)
    }

    /// Raw snapshot stored under `name`
    pub fn load(&self, name: &str) -> EditorResult<Option<Value>> {
        match self.store.get(name)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Recently used design names, most recent first
    pub fn design_names(&self) -> EditorResult<Vec<String>> {
        match self.store.get(DESIGNS_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Drop the snapshot and its entry in the recently used list
    pub fn forget(&self, name: &str) -> EditorResult<()> {
        let mut names = self.design_names()?;
        let before = names.len();
        names.retain(|n| n != name);
        if names.len() != before {
            self.write_names(&names)?;
        }
        self.store.remove(name)?;

        tracing::info!(design = %name, "forgot design");
        Ok(())
    }

    fn write_names(&self, names: &[String]) -> EditorResult<()> {
        self.store
            .set(DESIGNS_KEY, &serde_json::to_string(names)?)?;
        Ok(())
    }
}

/// Current UTC time truncated to whole seconds
fn timestamp() -> String {
    let now = Utc::now();
    now.with_nanosecond(0)
        .unwrap_or(now)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
