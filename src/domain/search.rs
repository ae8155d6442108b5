//! Country lookup for the destination picker.
//!
//! Matching is tiered: exact name, prefix, substring, pinyin initials and
//! finally an in-order character match. Each country keeps the score of the
//! first tier it satisfies; ties keep table order.

use std::{collections::HashMap, ops::Range};

use super::entities::{MatchCandidate, RateTable};

/// Upper bound on suggestions returned for a query.
pub const MAX_SUGGESTIONS: usize = 10;

pub const SCORE_EXACT: u8 = 100;
pub const SCORE_PREFIX: u8 = 90;
pub const SCORE_CONTAINS: u8 = 80;
pub const SCORE_PHONETIC: u8 = 70;
pub const SCORE_FUZZY: u8 = 60;

/// Quick-select destinations, in button order.
pub const POPULAR_COUNTRIES: [&str; 11] = [
    "美国", "英国", "德国", "法国", "意大利", "西班牙", "日本", "韩国", "澳大利亚1区", "加拿大",
    "巴西",
];

/// Pinyin initials per country name, e.g. "美国" → "mg".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PhoneticIndex {
    codes: HashMap<String, String>,
}

impl PhoneticIndex {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            codes: pairs
                .into_iter()
                .map(|(name, code)| (name.into(), code.into().to_lowercase()))
                .collect(),
        }
    }

    /// Parses a JSON object of `{"name": "code"}` pairs.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let codes: HashMap<String, String> = serde_json::from_str(json)?;
        Ok(Self::from_pairs(codes))
    }

    pub fn code_for(&self, name: &str) -> Option<&str> {
        self.codes.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct CountryMatcher {
    phonetic: PhoneticIndex,
    limit: usize,
}

impl CountryMatcher {
    pub fn new(phonetic: PhoneticIndex) -> Self {
        Self {
            phonetic,
            limit: MAX_SUGGESTIONS,
        }
    }

    /// Caps the result list below [`MAX_SUGGESTIONS`].
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.min(MAX_SUGGESTIONS);
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn phonetic(&self) -> &PhoneticIndex {
        &self.phonetic
    }

    /// Score of `name` for an already trimmed, non-empty `query`. Zero means
    /// no match.
    pub fn score(&self, name: &str, query: &str) -> u8 {
        let name_lower = name.to_lowercase();
        let query_lower = query.to_lowercase();

        if name_lower == query_lower {
            return SCORE_EXACT;
        }
        if name_lower.starts_with(&query_lower) {
            return SCORE_PREFIX;
        }
        if name_lower.contains(&query_lower) {
            return SCORE_CONTAINS;
        }
        if self
            .phonetic
            .code_for(name)
            .is_some_and(|code| code.contains(&query_lower))
        {
            return SCORE_PHONETIC;
        }
        if fuzzy_match(&name_lower, &query_lower) {
            return SCORE_FUZZY;
        }
        0
    }

    /// Ranks `names` against `query`, best first, keeping input order among
    /// equal scores.
    pub fn rank<'n, I>(&self, query: &str, names: I) -> Vec<(&'n str, u8)>
    where
        I: IntoIterator<Item = &'n str>,
    {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let mut ranked: Vec<(&str, u8)> = names
            .into_iter()
            .map(|name| (name, self.score(name, query)))
            .filter(|(_, score)| *score > 0)
            .collect();

        // `sort_by` is stable, which keeps table order for ties.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(self.limit);
        ranked
    }

    /// Suggestions for `query` drawn from `table`, annotated with transit times.
    pub fn search(&self, query: &str, table: &RateTable) -> Vec<MatchCandidate> {
        self.rank(query, table.country_names())
            .into_iter()
            .map(|(name, score)| MatchCandidate {
                name: name.to_string(),
                score,
                transit_time: table
                    .get(name)
                    .map(|rate| rate.transit_time.clone())
                    .unwrap_or_default(),
            })
            .collect()
    }
}

impl Default for CountryMatcher {
    fn default() -> Self {
        Self::new(PhoneticIndex::default())
    }
}

/// True if every char of `pattern` occurs in `text` in order.
pub fn fuzzy_match(text: &str, pattern: &str) -> bool {
    let mut remaining = text.chars();
    pattern
        .chars()
        .all(|wanted| remaining.by_ref().any(|c| c == wanted))
}

/// Byte ranges of `name` equal to `query` ignoring case, left to right and
/// non-overlapping. The query is matched literally.
pub fn highlight_spans(name: &str, query: &str) -> Vec<Range<usize>> {
    let needle: Vec<char> = query.chars().map(fold_case).collect();
    if needle.is_empty() {
        return Vec::new();
    }

    let haystack: Vec<(usize, char)> = name
        .char_indices()
        .map(|(offset, c)| (offset, fold_case(c)))
        .collect();

    let mut spans = Vec::new();
    let mut start = 0;
    while start + needle.len() <= haystack.len() {
        let window = &haystack[start..start + needle.len()];
        if window.iter().map(|(_, c)| *c).eq(needle.iter().copied()) {
            let end = haystack
                .get(start + needle.len())
                .map(|(offset, _)| *offset)
                .unwrap_or(name.len());
            spans.push(haystack[start].0..end);
            start += needle.len();
        } else {
            start += 1;
        }
    }
    spans
}

fn fold_case(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Quick-select destinations present in `table`.
pub fn popular_countries(table: &RateTable) -> Vec<&'static str> {
    POPULAR_COUNTRIES
        .iter()
        .copied()
        .filter(|name| table.contains(name))
        .collect()
}
