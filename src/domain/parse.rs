//! Parsers for the textual bounds found in rate sheets.
//!
//! Weight bands look like `"0.2 < W ≤ 2"` (full-width `＜` is common in
//! sheets exported from spreadsheets). Markup conditions look like
//! `"成本 > 60"` or `"30 ≤ 成本 ≤ 60"`.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use super::entities::CostPredicate;

const NUMBER: &str = r"(\d+(?:\.\d+)?)";
const VARIABLE: &str = r"[^\d\s<>＜＞≤≥≦≧=＝]+";

#[derive(Clone, Debug, PartialEq, Error)]
pub enum BoundsError {
    #[error("expected \"<min> < W ≤ <max>\", got \"{0}\"")]
    MalformedRange(String),
    #[error("lower bound {min} is not below upper bound {max}")]
    EmptyRange { min: f64, max: f64 },
    #[error("unrecognised cost condition \"{0}\"")]
    MalformedCondition(String),
}

/// Numeric bounds of a weight band, `min < W ≤ max`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightRange {
    pub min: f64,
    pub max: f64,
}

fn weight_range_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern =
            format!(r"^\s*{NUMBER}\s*(?:<|＜)\s*[Ww]\s*(?:<=|＜=|<＝|＜＝|≤|≦)\s*{NUMBER}\s*$");
        Regex::new(&pattern).expect("weight range pattern is valid")
    })
}

fn single_bound_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = format!(r"^\s*{VARIABLE}\s*(>=|＞=|≥|≧|>|＞|<=|＜=|≤|≦|<|＜)\s*{NUMBER}\s*$");
        Regex::new(&pattern).expect("cost bound pattern is valid")
    })
}

fn between_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = format!(
            r"^\s*{NUMBER}\s*(<=|＜=|≤|≦|<|＜)\s*{VARIABLE}\s*(<=|＜=|≤|≦|<|＜)\s*{NUMBER}\s*$"
        );
        Regex::new(&pattern).expect("cost interval pattern is valid")
    })
}

/// Parses a band such as `"0.1 < W ≤ 0.2"` or `"0.05＜W≤0.1"`.
pub fn parse_weight_range(text: &str) -> Result<WeightRange, BoundsError> {
    let captures = weight_range_regex()
        .captures(text)
        .ok_or_else(|| BoundsError::MalformedRange(text.to_string()))?;

    let min = parse_number(&captures[1], text, BoundsError::MalformedRange)?;
    let max = parse_number(&captures[2], text, BoundsError::MalformedRange)?;

    if min >= max {
        return Err(BoundsError::EmptyRange { min, max });
    }

    Ok(WeightRange { min, max })
}

/// Parses a markup condition over the cost variable.
pub fn parse_cost_condition(text: &str) -> Result<CostPredicate, BoundsError> {
    if let Some(captures) = single_bound_regex().captures(text) {
        let bound = parse_number(&captures[2], text, BoundsError::MalformedCondition)?;
        let predicate = match &captures[1] {
            ">" | "＞" => CostPredicate::Above(bound),
            ">=" | "＞=" | "≥" | "≧" => CostPredicate::AtLeast(bound),
            "<" | "＜" => CostPredicate::Below(bound),
            _ => CostPredicate::AtMost(bound),
        };
        return Ok(predicate);
    }

    if let Some(captures) = between_regex().captures(text) {
        let min = parse_number(&captures[1], text, BoundsError::MalformedCondition)?;
        let max = parse_number(&captures[4], text, BoundsError::MalformedCondition)?;
        if min > max {
            return Err(BoundsError::MalformedCondition(text.to_string()));
        }
        return Ok(CostPredicate::Between {
            min,
            min_inclusive: is_inclusive(&captures[2]),
            max,
            max_inclusive: is_inclusive(&captures[3]),
        });
    }

    Err(BoundsError::MalformedCondition(text.to_string()))
}

fn is_inclusive(operator: &str) -> bool {
    !matches!(operator, "<" | "＜")
}

fn parse_number(
    digits: &str,
    text: &str,
    malformed: fn(String) -> BoundsError,
) -> Result<f64, BoundsError> {
    digits.parse::<f64>().map_err(|_| malformed(text.to_string()))
}
