use std::{fs, path::Path, sync::Arc};

use crate::{
    domain::{
        CountryMatcher, FeeCalculator, FeeResult, MatchCandidate, PhoneticIndex, QuoteError,
    },
    infra::{default_dataset, load_dataset_file, DatasetError, RateSnapshot, SnapshotStore},
    util::{
        assets,
        config::{AppConfig, RatesSource},
    },
};

/// Entry point for front ends: owns the active snapshot and the matcher.
///
/// Every call reads the snapshot once, so a concurrent [`App::install`]
/// never mixes two tables inside one quote.
#[derive(Debug)]
pub struct App {
    store: SnapshotStore,
    matcher: CountryMatcher,
}

impl App {
    pub fn new(snapshot: RateSnapshot, matcher: CountryMatcher) -> Self {
        Self {
            store: SnapshotStore::new(snapshot),
            matcher,
        }
    }

    /// Loads rates and the pinyin table as configured.
    ///
    /// A configured rate sheet that cannot be read falls back to the bundled
    /// one; only a broken bundled sheet is an error.
    pub fn bootstrap(config: &AppConfig) -> Result<Self, DatasetError> {
        let snapshot = match config.rates_source() {
            RatesSource::File(path) => match load_dataset_file(&path) {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "falling back to bundled rates");
                    default_dataset()?
                }
            },
            RatesSource::Embedded => default_dataset()?,
        };

        let phonetic = load_phonetic_index(config.phonetic_path.as_deref());
        Ok(Self::new(snapshot, CountryMatcher::new(phonetic)))
    }

    pub fn snapshot(&self) -> Arc<RateSnapshot> {
        self.store.current()
    }

    pub fn matcher(&self) -> &CountryMatcher {
        &self.matcher
    }

    pub fn quote(&self, country: &str, weight: f64, cost: f64) -> Result<FeeResult, QuoteError> {
        let snapshot = self.store.current();
        FeeCalculator::new(&snapshot.table).compute_fee(country, weight, cost)
    }

    /// Quotes raw form input.
    pub fn quote_text(
        &self,
        country: &str,
        weight: &str,
        cost: &str,
    ) -> Result<FeeResult, QuoteError> {
        let snapshot = self.store.current();
        FeeCalculator::new(&snapshot.table).quote_text(country, weight, cost)
    }

    pub fn search(&self, query: &str) -> Vec<MatchCandidate> {
        let snapshot = self.store.current();
        self.matcher.search(query, &snapshot.table)
    }

    /// Installs `snapshot` if it is newer than the active one.
    pub fn install(&self, snapshot: RateSnapshot) -> bool {
        self.store.replace_if_newer(snapshot)
    }

    /// Re-reads a rate sheet from disk and installs it if newer.
    pub fn reload_from(&self, path: &Path) -> Result<bool, DatasetError> {
        let snapshot = load_dataset_file(path)?;
        Ok(self.install(snapshot))
    }
}

/// Pinyin table from `path`, else the bundled one, else empty.
pub fn load_phonetic_index(path: Option<&Path>) -> PhoneticIndex {
    if let Some(path) = path {
        let parsed = fs::read_to_string(path)
            .map_err(|err| err.to_string())
            .and_then(|json| PhoneticIndex::from_json(&json).map_err(|err| err.to_string()));
        match parsed {
            Ok(index) => return index,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "falling back to bundled pinyin table");
            }
        }
    }

    match assets::phonetic_initials_json().map(|json| PhoneticIndex::from_json(&json)) {
        Some(Ok(index)) => index,
        Some(Err(err)) => {
            tracing::error!(%err, "bundled pinyin table is malformed");
            PhoneticIndex::default()
        }
        None => {
            tracing::error!("bundled pinyin table is missing");
            PhoneticIndex::default()
        }
    }
}
