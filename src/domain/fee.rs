//! Shipping fee computation over a [`RateTable`].

use serde::Serialize;
use thiserror::Error;

use super::entities::{PriceSegment, ProfitQuote, RateTable};
use super::format::{format_currency, Currency};

#[derive(Clone, Debug, PartialEq, Error)]
pub enum QuoteError {
    #[error("unknown destination country: {0}")]
    InvalidCountry(String),
    #[error("weight must be a positive number, got {0}")]
    InvalidWeight(String),
    #[error("cost must be a non-negative number, got {0}")]
    InvalidCost(String),
    #[error("no weight range for {country} covers {weight} kg")]
    RangeNotFound { country: String, weight: f64 },
    #[error("no profit rule covers cost {0}")]
    ProfitRuleGap(f64),
}

/// A validated `(country, weight, cost)` triple.
#[derive(Clone, Debug, PartialEq)]
pub struct QuoteRequest {
    pub country: String,
    pub weight: f64,
    pub cost: f64,
}

impl QuoteRequest {
    /// Builds a request from raw form input, checking the fields in order.
    ///
    /// Weight must be positive and cost non-negative. Whether the country
    /// exists is decided against a table by [`FeeCalculator::quote_text`].
    pub fn parse(country: &str, weight: &str, cost: &str) -> Result<Self, QuoteError> {
        let country = country.trim();
        if country.is_empty() {
            return Err(QuoteError::InvalidCountry(String::new()));
        }

        let weight = parse_amount(weight)
            .filter(|value| *value > 0.0)
            .ok_or_else(|| QuoteError::InvalidWeight(weight.trim().to_string()))?;
        let cost = parse_amount(cost)
            .filter(|value| *value >= 0.0)
            .ok_or_else(|| QuoteError::InvalidCost(cost.trim().to_string()))?;

        Ok(Self {
            country: country.to_string(),
            weight,
            cost,
        })
    }
}

fn parse_amount(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Full breakdown of one quote. Amounts are unrounded; round at display.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeeResult {
    pub country: String,
    pub weight: f64,
    pub cost: f64,
    pub segment: PriceSegment,
    pub shipping_fee: f64,
    pub profit: ProfitQuote,
    pub total_primary: f64,
    pub total_secondary: f64,
    pub exchange_rate: f64,
}

/// Labelled line of a quote breakdown.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DetailLine {
    pub label: &'static str,
    pub value: String,
}

impl FeeResult {
    /// Breakdown lines in display order.
    pub fn details(&self) -> Vec<DetailLine> {
        let line = |label: &'static str, value: String| DetailLine { label, value };
        vec![
            line("Destination", self.country.clone()),
            line("Weight", format!("{} KG", self.weight)),
            line("Weight range", self.segment.label.clone()),
            line("Unit price", format!("¥{}/KG", self.segment.unit_price)),
            line("Registration fee", format!("¥{}", self.segment.registration_fee)),
            line(
                "Shipping fee",
                format!(
                    "{} × {} + {} = {}",
                    self.weight,
                    self.segment.unit_price,
                    self.segment.registration_fee,
                    format_currency(self.shipping_fee, Currency::Primary)
                ),
            ),
            line("Product cost", format_currency(self.cost, Currency::Primary)),
            line(
                "Profit tier",
                format!(
                    "{} ({})",
                    self.profit.tier.sheet_key(),
                    format_currency(self.profit.amount, Currency::Primary)
                ),
            ),
            line("Exchange rate", format!("1 USD = {} CNY", self.exchange_rate)),
        ]
    }
}

/// Prices parcels against one table snapshot.
#[derive(Clone, Copy, Debug)]
pub struct FeeCalculator<'a> {
    table: &'a RateTable,
}

impl<'a> FeeCalculator<'a> {
    pub fn new(table: &'a RateTable) -> Self {
        Self { table }
    }

    /// Band for `weight` in `country`, or `None` when the country is unknown
    /// or no band covers the weight.
    pub fn find_segment(&self, country: &str, weight: f64) -> Option<&'a PriceSegment> {
        self.table.get(country)?.find_segment(weight)
    }

    pub fn profit_for(&self, cost: f64) -> Option<ProfitQuote> {
        self.table.profit_rules().select(cost)
    }

    pub fn quote(&self, request: &QuoteRequest) -> Result<FeeResult, QuoteError> {
        self.compute_fee(&request.country, request.weight, request.cost)
    }

    /// Quotes raw form input, checking the country before the numbers so the
    /// error matches [`FeeCalculator::compute_fee`] for the same input.
    pub fn quote_text(
        &self,
        country: &str,
        weight: &str,
        cost: &str,
    ) -> Result<FeeResult, QuoteError> {
        let country = country.trim();
        if !self.table.contains(country) {
            return Err(rejected(QuoteError::InvalidCountry(country.to_string())));
        }
        let request = QuoteRequest::parse(country, weight, cost).map_err(rejected)?;
        self.quote(&request)
    }

    pub fn compute_fee(
        &self,
        country: &str,
        weight: f64,
        cost: f64,
    ) -> Result<FeeResult, QuoteError> {
        self.price(country, weight, cost).map_err(rejected)
    }

    fn price(&self, country: &str, weight: f64, cost: f64) -> Result<FeeResult, QuoteError> {
        let rate = self
            .table
            .get(country)
            .ok_or_else(|| QuoteError::InvalidCountry(country.to_string()))?;

        if !weight.is_finite() || weight <= 0.0 {
            return Err(QuoteError::InvalidWeight(weight.to_string()));
        }
        if !cost.is_finite() || cost < 0.0 {
            return Err(QuoteError::InvalidCost(cost.to_string()));
        }

        let segment = rate
            .find_segment(weight)
            .ok_or_else(|| QuoteError::RangeNotFound {
                country: country.to_string(),
                weight,
            })?;

        let profit = self
            .profit_for(cost)
            .ok_or(QuoteError::ProfitRuleGap(cost))?;

        let shipping_fee = segment.fee_for(weight);
        let total_primary = cost + shipping_fee + profit.amount;
        let exchange_rate = self.table.exchange_rate();

        Ok(FeeResult {
            country: country.to_string(),
            weight,
            cost,
            segment: segment.clone(),
            shipping_fee,
            profit,
            total_primary,
            total_secondary: total_primary / exchange_rate,
            exchange_rate,
        })
    }
}

fn rejected(err: QuoteError) -> QuoteError {
    tracing::debug!(%err, "quote rejected");
    err
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::domain::entities::{CountryRate, ProfitRules, ProfitTier};

    fn band(label: &str, min: f64, max: f64, unit_price: f64, registration_fee: f64) -> PriceSegment {
        PriceSegment {
            label: label.to_string(),
            min_weight: min,
            max_weight: max,
            unit_price,
            registration_fee,
        }
    }

    fn us_table() -> RateTable {
        let us = CountryRate {
            name: "美国".into(),
            transit_time: "6-10工作日".into(),
            segments: vec![
                band("0 < W ≤ 0.1", 0.0, 0.1, 80.0, 23.0),
                band("0.1 < W ≤ 0.2", 0.1, 0.2, 70.0, 25.0),
                band("0.2 < W ≤ 2", 0.2, 2.0, 68.0, 25.0),
                band("2 < W ≤ 20", 2.0, 20.0, 60.0, 25.0),
            ],
        };
        RateTable::new(vec![us], ProfitRules::canonical(), 7.1)
    }

    #[test]
    fn quotes_mid_tier_parcel() {
        let table = us_table();
        let result = FeeCalculator::new(&table)
            .compute_fee("美国", 0.5, 50.0)
            .unwrap();

        assert_eq!(result.segment.label, "0.2 < W ≤ 2");
        assert_eq!(result.shipping_fee, 0.5 * 68.0 + 25.0);
        assert_eq!(result.profit, ProfitQuote { amount: 20.0, tier: ProfitTier::Mid });
        assert_eq!(result.total_primary, 129.0);
        assert_eq!(format!("{:.2}", result.total_secondary), "18.17");
    }

    #[rstest]
    #[case(0.1, "0 < W ≤ 0.1")]
    #[case(0.2, "0.1 < W ≤ 0.2")]
    #[case(2.0, "0.2 < W ≤ 2")]
    #[case(2.0001, "2 < W ≤ 20")]
    #[case(20.0, "2 < W ≤ 20")]
    fn shared_boundary_resolves_to_lower_band(#[case] weight: f64, #[case] expected: &str) {
        let table = us_table();
        let segment = FeeCalculator::new(&table).find_segment("美国", weight).unwrap();
        assert_eq!(segment.label, expected);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn rejects_non_positive_weight(#[case] weight: f64) {
        let table = us_table();
        let err = FeeCalculator::new(&table)
            .compute_fee("美国", weight, 10.0)
            .unwrap_err();
        assert!(matches!(err, QuoteError::InvalidWeight(_)));
    }

    #[test]
    fn rejects_negative_cost_but_accepts_zero() {
        let table = us_table();
        let calculator = FeeCalculator::new(&table);
        assert!(matches!(
            calculator.compute_fee("美国", 1.0, -0.01),
            Err(QuoteError::InvalidCost(_))
        ));
        let free = calculator.compute_fee("美国", 1.0, 0.0).unwrap();
        assert_eq!(free.profit.tier, ProfitTier::Low);
    }

    #[test]
    fn unknown_country_is_reported_before_weight() {
        let table = us_table();
        assert_eq!(
            FeeCalculator::new(&table).compute_fee("火星", -1.0, 10.0),
            Err(QuoteError::InvalidCountry("火星".into()))
        );
    }

    #[test]
    fn weight_above_last_band_is_not_extrapolated() {
        let table = us_table();
        assert_eq!(
            FeeCalculator::new(&table).compute_fee("美国", 25.0, 10.0),
            Err(QuoteError::RangeNotFound {
                country: "美国".into(),
                weight: 25.0
            })
        );
    }

    #[test]
    fn gap_in_profit_rules_is_an_error() {
        let table = RateTable::new(
            us_table().countries().cloned().collect(),
            ProfitRules::new(Vec::new()),
            7.1,
        );
        assert_eq!(
            FeeCalculator::new(&table).compute_fee("美国", 1.0, 10.0),
            Err(QuoteError::ProfitRuleGap(10.0))
        );
    }

    #[rstest]
    #[case("美国", "0.5", "50", Ok(QuoteRequest { country: "美国".into(), weight: 0.5, cost: 50.0 }))]
    #[case(" 美国 ", " 2 ", "0", Ok(QuoteRequest { country: "美国".into(), weight: 2.0, cost: 0.0 }))]
    #[case("", "1", "1", Err(QuoteError::InvalidCountry(String::new())))]
    #[case("美国", "", "1", Err(QuoteError::InvalidWeight(String::new())))]
    #[case("美国", "abc", "1", Err(QuoteError::InvalidWeight("abc".into())))]
    #[case("美国", "1", "ten", Err(QuoteError::InvalidCost("ten".into())))]
    #[case("美国", "1", "inf", Err(QuoteError::InvalidCost("inf".into())))]
    #[case("美国", "0", "1", Err(QuoteError::InvalidWeight("0".into())))]
    #[case("美国", "-1", "ten", Err(QuoteError::InvalidWeight("-1".into())))]
    #[case("美国", "1", "-0.5", Err(QuoteError::InvalidCost("-0.5".into())))]
    fn parses_raw_form_input(
        #[case] country: &str,
        #[case] weight: &str,
        #[case] cost: &str,
        #[case] expected: Result<QuoteRequest, QuoteError>,
    ) {
        assert_eq!(QuoteRequest::parse(country, weight, cost), expected);
    }

    #[test]
    fn details_follow_display_order() {
        let table = us_table();
        let result = FeeCalculator::new(&table)
            .compute_fee("美国", 0.5, 50.0)
            .unwrap();
        let details = result.details();

        let labels: Vec<_> = details.iter().map(|line| line.label).collect();
        assert_eq!(
            labels,
            vec![
                "Destination",
                "Weight",
                "Weight range",
                "Unit price",
                "Registration fee",
                "Shipping fee",
                "Product cost",
                "Profit tier",
                "Exchange rate",
            ]
        );
        assert_eq!(details[1].value, "0.5 KG");
        assert_eq!(details[3].value, "¥68/KG");
        assert_eq!(details[5].value, "0.5 × 68 + 25 = ¥59.00");
        assert_eq!(details[7].value, "中 (¥20.00)");
        assert_eq!(details[8].value, "1 USD = 7.1 CNY");
    }

    #[rstest]
    #[case("火星", "abc", "1", QuoteError::InvalidCountry("火星".into()))]
    #[case(" 火星 ", "1", "ten", QuoteError::InvalidCountry("火星".into()))]
    #[case("", "", "", QuoteError::InvalidCountry(String::new()))]
    #[case("美国", "abc", "ten", QuoteError::InvalidWeight("abc".into()))]
    #[case("美国", "-1", "ten", QuoteError::InvalidWeight("-1".into()))]
    #[case("美国", "1", "ten", QuoteError::InvalidCost("ten".into()))]
    #[case("美国", "-1", "10", QuoteError::InvalidWeight("-1".into()))]
    fn raw_input_checks_country_then_weight_then_cost(
        #[case] country: &str,
        #[case] weight: &str,
        #[case] cost: &str,
        #[case] expected: QuoteError,
    ) {
        let table = us_table();
        assert_eq!(
            FeeCalculator::new(&table).quote_text(country, weight, cost),
            Err(expected)
        );
    }

    #[test]
    fn raw_input_agrees_with_numeric_entry_point() {
        let table = us_table();
        let calculator = FeeCalculator::new(&table);
        assert_eq!(
            calculator.quote_text("火星", "abc", "1"),
            calculator.compute_fee("火星", f64::NAN, 1.0)
        );
        assert_eq!(
            calculator.quote_text(" 美国 ", "0.5", "50"),
            calculator.compute_fee("美国", 0.5, 50.0)
        );
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn every_rejection_is_logged_at_debug() {
        let table = us_table();
        let gapped = RateTable::new(
            table.countries().cloned().collect(),
            ProfitRules::new(Vec::new()),
            7.1,
        );
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let calculator = FeeCalculator::new(&table);
            assert!(calculator.compute_fee("火星", 1.0, 10.0).is_err());
            assert!(calculator.compute_fee("美国", 0.0, 10.0).is_err());
            assert!(calculator.compute_fee("美国", 1.0, -1.0).is_err());
            assert!(calculator.compute_fee("美国", 25.0, 10.0).is_err());
            assert!(FeeCalculator::new(&gapped).compute_fee("美国", 1.0, 10.0).is_err());
            assert!(calculator.quote_text("美国", "heavy", "10").is_err());
            assert!(calculator.compute_fee("美国", 1.0, 10.0).is_ok());
        });

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = logs.lines().filter(|line| line.contains("quote rejected")).collect();
        assert_eq!(lines.len(), 6, "{logs}");
        assert!(lines.iter().all(|line| line.contains("DEBUG")));
        assert!(lines[0].contains("unknown destination country: 火星"));
        assert!(lines[3].contains("no weight range for 美国 covers 25 kg"));
        assert!(lines[4].contains("no profit rule covers cost 10"));
        assert!(lines[5].contains("heavy"));
    }
}
