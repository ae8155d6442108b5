use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One weight band of a destination's price list.
///
/// The band is open on the left and closed on the right: `min < W ≤ max`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceSegment {
    /// Range text as it appeared in the dataset, kept for display.
    pub label: String,
    pub min_weight: f64,
    pub max_weight: f64,
    /// Price per kilogram in the primary currency.
    pub unit_price: f64,
    /// Flat per-parcel fee in the primary currency.
    pub registration_fee: f64,
}

impl PriceSegment {
    /// Returns true if `weight` falls inside `min < weight ≤ max`.
    ///
    /// A weight sitting exactly on a shared boundary therefore belongs to the
    /// lower band; rate sheets are written against this rule.
    pub fn contains(&self, weight: f64) -> bool {
        weight > self.min_weight && weight <= self.max_weight
    }

    /// Shipping fee for `weight` under this band, unrounded.
    pub fn fee_for(&self, weight: f64) -> f64 {
        weight * self.unit_price + self.registration_fee
    }
}

/// Price list and delivery estimate for a single destination.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CountryRate {
    pub name: String,
    /// Display-only delivery estimate, e.g. "6-10工作日".
    pub transit_time: String,
    pub segments: Vec<PriceSegment>,
}

impl CountryRate {
    /// First band containing `weight`, in list order.
    pub fn find_segment(&self, weight: f64) -> Option<&PriceSegment> {
        self.segments.iter().find(|segment| segment.contains(weight))
    }

    /// Largest weight this destination is priced for.
    pub fn max_weight(&self) -> Option<f64> {
        self.segments
            .iter()
            .map(|segment| segment.max_weight)
            .reduce(f64::max)
    }
}

/// Cost bracket that decides the flat markup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProfitTier {
    High,
    Mid,
    Low,
}

impl ProfitTier {
    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Mid => "Mid",
            Self::Low => "Low",
        }
    }

    /// Tier key used by the rate sheets ("高", "中", "低").
    pub fn sheet_key(&self) -> &'static str {
        match self {
            Self::High => "高",
            Self::Mid => "中",
            Self::Low => "低",
        }
    }

    /// Accepts both the sheet keys and the English names.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim() {
            "高" => Some(Self::High),
            "中" => Some(Self::Mid),
            "低" => Some(Self::Low),
            other => match other.to_ascii_lowercase().as_str() {
                "high" => Some(Self::High),
                "mid" | "medium" => Some(Self::Mid),
                "low" => Some(Self::Low),
                _ => None,
            },
        }
    }
}

/// Condition over the product cost.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum CostPredicate {
    Above(f64),
    AtLeast(f64),
    Below(f64),
    AtMost(f64),
    Between {
        min: f64,
        min_inclusive: bool,
        max: f64,
        max_inclusive: bool,
    },
}

impl CostPredicate {
    pub fn matches(&self, cost: f64) -> bool {
        match *self {
            Self::Above(bound) => cost > bound,
            Self::AtLeast(bound) => cost >= bound,
            Self::Below(bound) => cost < bound,
            Self::AtMost(bound) => cost <= bound,
            Self::Between {
                min,
                min_inclusive,
                max,
                max_inclusive,
            } => {
                let above_min = if min_inclusive { cost >= min } else { cost > min };
                let below_max = if max_inclusive { cost <= max } else { cost < max };
                above_min && below_max
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfitRule {
    pub tier: ProfitTier,
    pub predicate: CostPredicate,
    pub amount: f64,
}

/// Markup selected for a given cost.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfitQuote {
    pub amount: f64,
    pub tier: ProfitTier,
}

/// Ordered markup rules, evaluated top-down.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfitRules {
    rules: Vec<ProfitRule>,
}

impl ProfitRules {
    pub fn new(rules: Vec<ProfitRule>) -> Self {
        Self { rules }
    }

    /// High above 60, Mid from 30 to 60 inclusive, Low below 30.
    pub fn canonical() -> Self {
        Self::new(vec![
            ProfitRule {
                tier: ProfitTier::High,
                predicate: CostPredicate::Above(60.0),
                amount: 25.0,
            },
            ProfitRule {
                tier: ProfitTier::Mid,
                predicate: CostPredicate::Between {
                    min: 30.0,
                    min_inclusive: true,
                    max: 60.0,
                    max_inclusive: true,
                },
                amount: 20.0,
            },
            ProfitRule {
                tier: ProfitTier::Low,
                predicate: CostPredicate::Below(30.0),
                amount: 15.0,
            },
        ])
    }

    /// First rule whose predicate accepts `cost`.
    pub fn select(&self, cost: f64) -> Option<ProfitQuote> {
        self.rules
            .iter()
            .find(|rule| rule.predicate.matches(cost))
            .map(|rule| ProfitQuote {
                amount: rule.amount,
                tier: rule.tier,
            })
    }

    pub fn rules(&self) -> &[ProfitRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for ProfitRules {
    fn default() -> Self {
        Self::canonical()
    }
}

/// Immutable view of every destination, the markup rules and the exchange rate.
///
/// Countries enumerate in the order they were supplied. Replace the whole
/// table to pick up new rates; nothing here is mutable after construction.
#[derive(Clone, Debug, PartialEq)]
pub struct RateTable {
    countries: Vec<CountryRate>,
    index: HashMap<String, usize>,
    profit_rules: ProfitRules,
    exchange_rate: f64,
}

impl RateTable {
    /// Builds a table. A repeated country name replaces the earlier entry but
    /// keeps its position.
    pub fn new(countries: Vec<CountryRate>, profit_rules: ProfitRules, exchange_rate: f64) -> Self {
        let mut ordered: Vec<CountryRate> = Vec::with_capacity(countries.len());
        let mut index = HashMap::with_capacity(countries.len());

        for country in countries {
            match index.get(&country.name) {
                Some(&slot) => ordered[slot] = country,
                None => {
                    index.insert(country.name.clone(), ordered.len());
                    ordered.push(country);
                }
            }
        }

        Self {
            countries: ordered,
            index,
            profit_rules,
            exchange_rate,
        }
    }

    pub fn get(&self, name: &str) -> Option<&CountryRate> {
        self.index.get(name).map(|&slot| &self.countries[slot])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn countries(&self) -> impl Iterator<Item = &CountryRate> {
        self.countries.iter()
    }

    pub fn country_names(&self) -> impl Iterator<Item = &str> {
        self.countries.iter().map(|country| country.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    pub fn profit_rules(&self) -> &ProfitRules {
        &self.profit_rules
    }

    /// Primary currency units per one secondary currency unit.
    pub fn exchange_rate(&self) -> f64 {
        self.exchange_rate
    }
}

/// A ranked search hit with its delivery estimate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub name: String,
    pub score: u8,
    pub transit_time: String,
}
