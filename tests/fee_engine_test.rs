//! Quotes against the bundled rate sheet.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::{fixture, rstest};

use shipping_fee_estimator::{
    domain::{format_currency, Currency, ProfitTier, QuoteRequest},
    infra::default_dataset,
    util::logging,
    FeeCalculator, QuoteError, RateSnapshot,
};

#[fixture]
fn snapshot() -> RateSnapshot {
    logging::init_test();
    default_dataset().expect("bundled sheet parses")
}

#[rstest]
fn bundled_sheet_loads_cleanly(snapshot: RateSnapshot) {
    assert!(snapshot.issues.is_empty(), "issues: {:?}", snapshot.issues);
    assert_eq!(snapshot.table.len(), 26);
    assert_eq!(snapshot.table.exchange_rate(), 7.1);
    assert_eq!(snapshot.table.profit_rules().rules().len(), 3);
}

#[rstest]
fn half_kilo_to_us(snapshot: RateSnapshot) {
    let result = FeeCalculator::new(&snapshot.table)
        .compute_fee("美国", 0.5, 50.0)
        .unwrap();

    assert_eq!(result.segment.unit_price, 68.0);
    assert_eq!(result.segment.registration_fee, 25.0);
    assert_eq!(result.shipping_fee, 59.0);
    assert_eq!(result.profit.tier, ProfitTier::Mid);
    assert_eq!(result.profit.amount, 20.0);
    assert_eq!(result.total_primary, 129.0);
    assert_eq!(format_currency(result.total_secondary, Currency::Secondary), "$18.17");
}

#[rstest]
#[case(0.1, 80.0, 23.0)]
#[case(0.100001, 70.0, 25.0)]
#[case(0.2, 70.0, 25.0)]
#[case(2.0, 68.0, 25.0)]
#[case(20.0, 60.0, 25.0)]
fn shared_boundaries_resolve_to_lower_band(
    snapshot: RateSnapshot,
    #[case] weight: f64,
    #[case] unit_price: f64,
    #[case] registration_fee: f64,
) {
    let segment = FeeCalculator::new(&snapshot.table)
        .find_segment("美国", weight)
        .unwrap();
    assert_eq!(segment.unit_price, unit_price);
    assert_eq!(segment.registration_fee, registration_fee);
}

#[rstest]
fn overweight_parcel_has_no_band(snapshot: RateSnapshot) {
    let err = FeeCalculator::new(&snapshot.table)
        .compute_fee("美国", 25.0, 50.0)
        .unwrap_err();
    assert_eq!(
        err,
        QuoteError::RangeNotFound {
            country: "美国".to_string(),
            weight: 25.0,
        }
    );
}

#[rstest]
#[case(0.0)]
#[case(-1.0)]
#[case(f64::NAN)]
fn non_positive_weights_are_rejected(snapshot: RateSnapshot, #[case] weight: f64) {
    let err = FeeCalculator::new(&snapshot.table)
        .compute_fee("美国", weight, 50.0)
        .unwrap_err();
    assert!(matches!(err, QuoteError::InvalidWeight(_)), "{err:?}");
}

#[rstest]
fn unknown_country_is_reported_before_bad_numbers(snapshot: RateSnapshot) {
    let err = FeeCalculator::new(&snapshot.table)
        .compute_fee("火星", -1.0, -1.0)
        .unwrap_err();
    assert_eq!(err, QuoteError::InvalidCountry("火星".to_string()));
}

#[rstest]
#[case(0.0, ProfitTier::Low, 15.0)]
#[case(29.999, ProfitTier::Low, 15.0)]
#[case(30.0, ProfitTier::Mid, 20.0)]
#[case(59.999, ProfitTier::Mid, 20.0)]
#[case(60.0, ProfitTier::Mid, 20.0)]
#[case(60.000001, ProfitTier::High, 25.0)]
#[case(1000.0, ProfitTier::High, 25.0)]
fn profit_tier_boundaries(
    snapshot: RateSnapshot,
    #[case] cost: f64,
    #[case] tier: ProfitTier,
    #[case] amount: f64,
) {
    let quote = FeeCalculator::new(&snapshot.table).profit_for(cost).unwrap();
    assert_eq!(quote.tier, tier);
    assert_eq!(quote.amount, amount);
}

#[rstest]
fn form_input_is_trimmed_and_validated(snapshot: RateSnapshot) {
    let request = QuoteRequest::parse(" 日本 ", " 1.5 ", "12").unwrap();
    let result = FeeCalculator::new(&snapshot.table).quote(&request).unwrap();
    assert_eq!(result.country, "日本");
    assert_eq!(result.profit.tier, ProfitTier::Low);

    assert!(matches!(
        QuoteRequest::parse("日本", "abc", "12"),
        Err(QuoteError::InvalidWeight(_))
    ));
    assert!(matches!(
        QuoteRequest::parse("日本", "1", "lots"),
        Err(QuoteError::InvalidCost(_))
    ));

    assert_eq!(
        QuoteRequest::parse("日本", "1", "-3"),
        Err(QuoteError::InvalidCost("-3".to_string()))
    );
}

#[rstest]
fn every_destination_prices_its_heaviest_band(snapshot: RateSnapshot) {
    let calculator = FeeCalculator::new(&snapshot.table);
    for country in snapshot.table.countries() {
        let max = country.max_weight().unwrap();
        let result = calculator.compute_fee(&country.name, max, 10.0).unwrap();
        assert_eq!(result.segment.max_weight, max, "{}", country.name);
    }
}

proptest! {
    #[test]
    fn bands_partition_each_destination(fraction in 0.0001f64..=1.0, pick in 0usize..26) {
        let snapshot = default_dataset().unwrap();
        let country = snapshot.table.countries().nth(pick).unwrap();
        let weight = country.max_weight().unwrap() * fraction;

        let holders = country.segments.iter().filter(|s| s.contains(weight)).count();
        prop_assert_eq!(holders, 1);
    }

    #[test]
    fn totals_add_up_and_repeat(weight in 0.01f64..=20.0, cost in 0.0f64..500.0) {
        let snapshot = default_dataset().unwrap();
        let calculator = FeeCalculator::new(&snapshot.table);

        let first = calculator.compute_fee("美国", weight, cost).unwrap();
        let second = calculator.compute_fee("美国", weight, cost).unwrap();
        prop_assert_eq!(&first, &second);

        let expected = cost + first.shipping_fee + first.profit.amount;
        prop_assert!((first.total_primary - expected).abs() < 1e-9);
        prop_assert!((first.total_secondary * 7.1 - first.total_primary).abs() < 1e-6);
    }
}
