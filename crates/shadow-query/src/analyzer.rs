use regex::Regex;
use shadow_core::config::GazetteerConfig;
use shadow_core::types::{Entities, Intent, QueryAnalysis};
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::keywords;

struct IntentRule {
    intent: Intent,
    pattern: Regex,
}

static INTENT_RULES: LazyLock<Vec<IntentRule>> = LazyLock::new(|| {
    let rule = |intent, pattern: &str| IntentRule { intent, pattern: Regex::new(pattern).expect("valid intent rule") };
    vec![
        rule(Intent::Procedure, r"(?i)how to|procedure|protocol for|steps for"),
        rule(Intent::Location, r"(?i)where|location|access|find"),
        rule(Intent::Status, r"(?i)status|progress|update on|current state"),
        rule(Intent::Security, r"(?i)security|protection|safeguard|risk"),
    ]
});

static LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([A-Za-z]+ (?:base|facility|compound|safehouse|region|area|zone|sector|building))")
        .expect("valid location pattern")
});

pub fn classify_intent(query: &str) -> Intent {
    INTENT_RULES.iter().find(|r| r.pattern.is_match(query)).map(|r| r.intent).unwrap_or(Intent::Information)
}

/// A known code name and its whole-word matcher.
#[derive(Debug, Clone)]
pub struct GazetteerEntry {
    pub name: String,
    pattern: Regex,
}

impl GazetteerEntry {
    pub fn new(name: &str) -> Self {
        let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(name))).expect("escaped name is a valid pattern");
        Self { name: name.to_string(), pattern }
    }

    pub fn is_match(&self, text: &str) -> bool { self.pattern.is_match(text) }
}

#[derive(Debug, Clone)]
pub struct Gazetteer {
    operations: Vec<GazetteerEntry>,
    protocols: Vec<GazetteerEntry>,
}

impl Gazetteer {
    pub fn new(config: &GazetteerConfig) -> Self {
        let entries = |names: &[String]| names.iter().map(|n| GazetteerEntry::new(n)).collect();
        Self { operations: entries(&config.operations), protocols: entries(&config.protocols) }
    }

    pub fn operations_in(&self, query: &str) -> Vec<String> { matching(&self.operations, query) }
    pub fn protocols_in(&self, query: &str) -> Vec<String> { matching(&self.protocols, query) }
}

impl Default for Gazetteer {
    fn default() -> Self { Self::new(&GazetteerConfig::default()) }
}

fn matching(entries: &[GazetteerEntry], query: &str) -> Vec<String> {
    entries.iter().filter(|e| e.is_match(query)).map(|e| e.name.clone()).collect()
}

pub fn locations(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    LOCATION
        .find_iter(query)
        .map(|m| m.as_str().to_string())
        .filter(|loc| seen.insert(loc.clone()))
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct QueryAnalyzer {
    gazetteer: Gazetteer,
}

impl QueryAnalyzer {
    pub fn new(gazetteer: Gazetteer) -> Self { Self { gazetteer } }

    pub fn gazetteer(&self) -> &Gazetteer { &self.gazetteer }

    pub fn analyze(&self, query: &str) -> QueryAnalysis {
        let analysis = QueryAnalysis {
            original_query: query.to_string(),
            intent: classify_intent(query),
            entities: Entities {
                operations: self.gazetteer.operations_in(query),
                protocols: self.gazetteer.protocols_in(query),
                locations: locations(query),
            },
            keywords: keywords::extract(query),
        };
        tracing::debug!(
            intent = analysis.intent.as_str(),
            operations = ?analysis.entities.operations,
            protocols = ?analysis.entities.protocols,
            keywords = analysis.keywords.len(),
            "analyzed query"
        );
        analysis
    }
}
