use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::stopwords;

/// Cap for the ranked unigram/bigram path. Only the whitespace fallback is held to
/// [`MAX_FALLBACK_KEYWORDS`].
pub const MAX_KEYWORDS: usize = 10;
/// Cap for the whitespace fallback, used when no term survives stop-word removal.
pub const MAX_FALLBACK_KEYWORDS: usize = 5;
/// Queries with this many whitespace tokens or fewer get no keywords.
pub const MIN_QUERY_TOKENS: usize = 3;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid token pattern"));

pub fn extract(query: &str) -> Vec<String> {
    if query.split_whitespace().count() <= MIN_QUERY_TOKENS { return Vec::new(); }
    let ranked = ranked_terms(query);
    if ranked.is_empty() { fallback(query) } else { ranked }
}

/// Unigrams and bigrams of the stop-word-free token sequence, most frequent first.
/// Equal counts keep the order in which the terms first appeared.
pub fn ranked_terms(query: &str) -> Vec<String> {
    let lowered = query.to_lowercase();
    let tokens: Vec<&str> = TOKEN
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| !stopwords::is_english_stopword(t))
        .collect();

    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut bump = |term: String| {
        let count = counts.entry(term.clone()).or_insert(0);
        if *count == 0 { order.push(term); }
        *count += 1;
    };
    for (i, token) in tokens.iter().enumerate() {
        bump(token.to_string());
        if let Some(next) = tokens.get(i + 1) { bump(format!("{} {}", token, next)); }
    }

    let mut ranked: Vec<(usize, String)> = order.into_iter().map(|t| (counts[&t], t)).collect();
    // stable: ties stay in first-seen order
    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    ranked.into_iter().take(MAX_KEYWORDS).map(|(_, t)| t).collect()
}

fn fallback(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() > 3 && !stopwords::is_fallback_stopword(w))
        .take(MAX_FALLBACK_KEYWORDS)
        .map(str::to_string)
        .collect()
}
