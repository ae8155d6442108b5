//! Rate sheet decoding.
//!
//! - Accepts the sheet layout with Chinese keys (`时效`, `价格分段`, ...) or
//!   the English equivalents.
//! - Bad bands and markup rules are skipped and reported, never fatal.

use std::{fmt, fs, io, marker::PhantomData, path::Path, path::PathBuf};

use semver::Version;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::domain::{
    parse_cost_condition, parse_weight_range, BoundsError, CountryRate, PriceSegment, ProfitRule,
    ProfitRules, ProfitTier, RateTable,
};
use crate::infra::snapshot::RateSnapshot;
use crate::util::{assets, version::parse_version_str};

const DEFAULT_DATA_VERSION: Version = Version::new(1, 0, 0);

/// Sheet content that was dropped while building a table.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum DataIntegrityError {
    #[error("{country}: skipped weight band \"{range}\": {source}")]
    Segment {
        country: String,
        range: String,
        #[source]
        source: BoundsError,
    },
    #[error("skipped profit rule \"{key}\": {reason}")]
    ProfitRule { key: String, reason: String },
    #[error("ignored lastUpdated \"{0}\": not an RFC 3339 timestamp")]
    Timestamp(String),
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed rate sheet: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("exchange rate must be a positive number, got {0}")]
    InvalidExchangeRate(f64),
    #[error("invalid data version \"{0}\"")]
    InvalidVersion(String),
    #[error("bundled asset {0} is missing")]
    MissingAsset(&'static str),
}

#[derive(Debug, serde::Deserialize)]
struct SheetDto {
    #[serde(default)]
    version: Option<String>,
    #[serde(default, rename = "lastUpdated", alias = "last_updated")]
    last_updated: Option<String>,
    #[serde(rename = "exchangeRate", alias = "exchange_rate")]
    exchange_rate: f64,
    #[serde(
        rename = "shippingData",
        alias = "shipping_data",
        alias = "countries",
        deserialize_with = "ordered_entries"
    )]
    shipping_data: Vec<(String, CountryDto)>,
    #[serde(
        default,
        rename = "profitRules",
        alias = "profit_rules",
        deserialize_with = "ordered_entries"
    )]
    profit_rules: Vec<(String, ProfitRuleDto)>,
}

#[derive(Debug, serde::Deserialize)]
struct CountryDto {
    #[serde(default, rename = "时效", alias = "transitTime", alias = "transit_time")]
    transit_time: String,
    #[serde(default, rename = "价格分段", alias = "segments")]
    segments: Vec<SegmentDto>,
}

#[derive(Debug, serde::Deserialize)]
struct SegmentDto {
    #[serde(rename = "重量范围", alias = "range")]
    range: String,
    #[serde(rename = "单价", alias = "unitPrice", alias = "unit_price")]
    unit_price: f64,
    #[serde(rename = "挂号费", alias = "registrationFee", alias = "registration_fee")]
    registration_fee: f64,
}

#[derive(Debug, serde::Deserialize)]
struct ProfitRuleDto {
    #[serde(rename = "条件", alias = "condition")]
    condition: String,
    #[serde(rename = "利润", alias = "profit", alias = "amount")]
    amount: f64,
}

/// Decodes a rate sheet into a snapshot.
pub fn parse_dataset(json: &str) -> Result<RateSnapshot, DatasetError> {
    let sheet: SheetDto = serde_json::from_str(json)?;

    if !sheet.exchange_rate.is_finite() || sheet.exchange_rate <= 0.0 {
        return Err(DatasetError::InvalidExchangeRate(sheet.exchange_rate));
    }

    let version = match sheet.version.as_deref() {
        Some(raw) => {
            parse_version_str(raw).map_err(|_| DatasetError::InvalidVersion(raw.to_string()))?
        }
        None => DEFAULT_DATA_VERSION,
    };

    let mut issues = Vec::new();

    let last_updated = sheet.last_updated.and_then(|raw| {
        OffsetDateTime::parse(&raw, &Rfc3339)
            .map_err(|_| issues.push(DataIntegrityError::Timestamp(raw.clone())))
            .ok()
    });

    let countries = sheet
        .shipping_data
        .into_iter()
        .map(|(name, country)| build_country(name, country, &mut issues))
        .collect();

    let profit_rules = build_profit_rules(sheet.profit_rules, &mut issues);

    for issue in &issues {
        tracing::warn!(%issue, "rate sheet issue");
    }

    let table = RateTable::new(countries, profit_rules, sheet.exchange_rate);
    tracing::info!(
        %version,
        countries = table.len(),
        exchange_rate = table.exchange_rate(),
        issues = issues.len(),
        "rate sheet loaded"
    );

    Ok(RateSnapshot::new(version, last_updated, table, issues))
}

pub fn load_dataset_file(path: &Path) -> Result<RateSnapshot, DatasetError> {
    let json = fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_dataset(&json)
}

/// The rate sheet bundled with the binary.
pub fn default_dataset() -> Result<RateSnapshot, DatasetError> {
    let json =
        assets::default_rates_json().ok_or(DatasetError::MissingAsset(assets::DEFAULT_RATES))?;
    parse_dataset(&json)
}

fn build_country(name: String, dto: CountryDto, issues: &mut Vec<DataIntegrityError>) -> CountryRate {
    let segments = dto
        .segments
        .into_iter()
        .filter_map(|segment| match parse_weight_range(&segment.range) {
            Ok(range) => Some(PriceSegment {
                label: segment.range,
                min_weight: range.min,
                max_weight: range.max,
                unit_price: segment.unit_price,
                registration_fee: segment.registration_fee,
            }),
            Err(source) => {
                issues.push(DataIntegrityError::Segment {
                    country: name.clone(),
                    range: segment.range,
                    source,
                });
                None
            }
        })
        .collect();

    CountryRate {
        name,
        transit_time: dto.transit_time,
        segments,
    }
}

fn build_profit_rules(
    entries: Vec<(String, ProfitRuleDto)>,
    issues: &mut Vec<DataIntegrityError>,
) -> ProfitRules {
    if entries.is_empty() {
        return ProfitRules::canonical();
    }

    let mut rules: Vec<ProfitRule> = entries
        .into_iter()
        .filter_map(|(key, dto)| {
            let Some(tier) = ProfitTier::from_key(&key) else {
                issues.push(DataIntegrityError::ProfitRule {
                    key,
                    reason: "unknown tier".to_string(),
                });
                return None;
            };
            match parse_cost_condition(&dto.condition) {
                Ok(predicate) => Some(ProfitRule {
                    tier,
                    predicate,
                    amount: dto.amount,
                }),
                Err(err) => {
                    issues.push(DataIntegrityError::ProfitRule {
                        key,
                        reason: err.to_string(),
                    });
                    None
                }
            }
        })
        .collect();

    if rules.is_empty() {
        return ProfitRules::canonical();
    }

    rules.sort_by_key(|rule| rule.tier);
    ProfitRules::new(rules)
}

/// Reads a JSON object as `(key, value)` pairs in document order.
fn ordered_entries<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    struct OrderedEntries<T>(PhantomData<T>);

    impl<'de, T> Visitor<'de> for OrderedEntries<T>
    where
        T: Deserialize<'de>,
    {
        type Value = Vec<(String, T)>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an object keyed by name")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((key, value)) = access.next_entry::<String, T>()? {
                entries.push((key, value));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(OrderedEntries(PhantomData))
}
