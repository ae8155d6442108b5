//! Shipping fee estimator.
//!
//! Looks up a destination's weight band, prices the parcel, adds a
//! cost-tiered markup and converts the total to the secondary currency.
//! Also ranks destinations for free-text (including pinyin initials) search.
//!
//! ```
//! use shipping_fee_estimator::{infra::default_dataset, domain::FeeCalculator};
//!
//! let snapshot = default_dataset().unwrap();
//! let quote = FeeCalculator::new(&snapshot.table)
//!     .compute_fee("美国", 0.5, 50.0)
//!     .unwrap();
//! assert_eq!(format!("{:.2}", quote.total_secondary), "18.17");
//! ```

pub mod app;
pub mod domain;
pub mod infra;
pub mod util;

pub use app::App;
pub use domain::{
    CountryMatcher, FeeCalculator, FeeResult, MatchCandidate, PhoneticIndex, QuoteError, RateTable,
};
pub use infra::{DataIntegrityError, DatasetError, RateSnapshot, SnapshotStore};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
