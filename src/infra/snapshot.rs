//! Versioned rate table snapshots and the slot holding the active one.

use std::{
    sync::{Arc, PoisonError, RwLock},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use semver::Version;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::domain::RateTable;
use crate::infra::dataset::DataIntegrityError;

/// One immutable version of the rate table.
#[derive(Clone, Debug)]
pub struct RateSnapshot {
    /// Data version from the sheet.
    pub version: Version,
    /// When the sheet says it was last edited.
    pub last_updated: Option<OffsetDateTime>,
    /// Unix timestamp (seconds) when this snapshot was built.
    pub loaded_at: u64,
    pub table: RateTable,
    /// Problems skipped while building the table.
    pub issues: Vec<DataIntegrityError>,
}

impl RateSnapshot {
    /// Create a new snapshot with current timestamp.
    pub fn new(
        version: Version,
        last_updated: Option<OffsetDateTime>,
        table: RateTable,
        issues: Vec<DataIntegrityError>,
    ) -> Self {
        Self {
            version,
            last_updated,
            loaded_at: unix_now(),
            table,
            issues,
        }
    }

    /// True if `self` should replace `current`: a higher version, or the
    /// same version with a strictly later edit time.
    pub fn is_newer_than(&self, current: &RateSnapshot) -> bool {
        if self.version != current.version {
            return self.version > current.version;
        }
        match (self.last_updated, current.last_updated) {
            (Some(candidate), Some(active)) => candidate > active,
            (Some(_), None) => true,
            _ => false,
        }
    }

    pub fn last_updated_label(&self) -> Option<String> {
        self.last_updated
            .and_then(|stamp| stamp.format(&Rfc3339).ok())
    }

    /// Time since this snapshot was built.
    pub fn age(&self) -> Duration {
        Duration::from_secs(unix_now().saturating_sub(self.loaded_at))
    }

    /// Human-readable age string.
    pub fn age_string(&self) -> String {
        humanize_secs(self.age().as_secs())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn humanize_secs(secs: u64) -> String {
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86400 {
        format!("{}h", secs / 3600)
    } else {
        format!("{}d", secs / 86400)
    }
}

/// Holds the active snapshot.
///
/// Readers get an `Arc` and keep computing against it even if a swap lands
/// mid-request. Writers only ever swap whole snapshots.
#[derive(Debug)]
pub struct SnapshotStore {
    current: RwLock<Arc<RateSnapshot>>,
}

impl SnapshotStore {
    pub fn new(snapshot: RateSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn current(&self) -> Arc<RateSnapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Installs `snapshot` unconditionally and returns the previous one.
    pub fn replace(&self, snapshot: RateSnapshot) -> Arc<RateSnapshot> {
        let incoming = Arc::new(snapshot);
        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        tracing::info!(
            from = %slot.version,
            to = %incoming.version,
            countries = incoming.table.len(),
            "rate snapshot replaced"
        );
        std::mem::replace(&mut *slot, incoming)
    }

    /// Installs `snapshot` only if it is newer than the active one.
    pub fn replace_if_newer(&self, snapshot: RateSnapshot) -> bool {
        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if !snapshot.is_newer_than(&slot) {
            tracing::debug!(
                active = %slot.version,
                offered = %snapshot.version,
                "kept active rate snapshot"
            );
            return false;
        }
        tracing::info!(
            from = %slot.version,
            to = %snapshot.version,
            countries = snapshot.table.len(),
            "rate snapshot updated"
        );
        *slot = Arc::new(snapshot);
        true
    }
}
