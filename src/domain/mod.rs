//! Fee computation and country search live here.

pub mod entities;
pub mod fee;
pub mod format;
pub mod parse;
pub mod search;

pub use entities::{
    CostPredicate, CountryRate, MatchCandidate, PriceSegment, ProfitQuote, ProfitRule, ProfitRules,
    ProfitTier, RateTable,
};
pub use fee::{DetailLine, FeeCalculator, FeeResult, QuoteError, QuoteRequest};
pub use format::{format_currency, Currency};
pub use parse::{parse_cost_condition, parse_weight_range, BoundsError, WeightRange};
pub use search::{
    fuzzy_match, highlight_spans, popular_countries, CountryMatcher, PhoneticIndex,
    MAX_SUGGESTIONS,
};
