use shadow_core::types::{ExpandedQueries, QueryAnalysis};

/// A phrasing applied to every operation and protocol entity when one of
/// its trigger phrases appears in the lowercased query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionTemplate {
    pub name: &'static str,
    pub triggers: &'static [&'static str],
    /// `{}` is replaced by the entity name.
    pub expansion: &'static str,
}

impl ExpansionTemplate {
    pub fn is_triggered_by(&self, lowered_query: &str) -> bool { self.triggers.iter().any(|t| lowered_query.contains(t)) }

    pub fn apply(&self, entity: &str) -> String { self.expansion.replacen("{}", entity, 1) }
}

pub const TEMPLATES: &[ExpansionTemplate] = &[
    ExpansionTemplate {
        name: "status",
        triggers: &["status", "current state", "progress", "where are we", "how is it going"],
        expansion: "What is the current status, phase, and progress details of {}?",
    },
    ExpansionTemplate {
        name: "technique",
        triggers: &["technique", "method", "how to", "procedure", "protocol", "measures", "counter"],
        expansion: "What are the recommended techniques, methods, and protocols for {}?",
    },
    ExpansionTemplate {
        name: "security",
        triggers: &["security", "protection", "safeguard", "defend", "secure"],
        expansion: "What are the security measures and protection protocols for {}?",
    },
    ExpansionTemplate {
        name: "location",
        triggers: &["where", "location", "place", "site", "safehouse", "facility"],
        expansion: "What is the location or access information for {}?",
    },
    ExpansionTemplate {
        name: "extraction",
        triggers: &["extract", "escape", "evacuate", "exit", "remove"],
        expansion: "What are the extraction procedures and protocols for {}?",
    },
];

#[derive(Debug, Clone)]
pub struct QueryExpander {
    templates: &'static [ExpansionTemplate],
}

impl Default for QueryExpander {
    fn default() -> Self { Self { templates: TEMPLATES } }
}

impl QueryExpander {
    pub fn new() -> Self { Self::default() }

    pub fn templates(&self) -> &[ExpansionTemplate] { self.templates }

    /// The original query first, then template, entity and keyword phrasings.
    /// Repeats are dropped, keeping the first occurrence.
    pub fn expand(&self, query: &str, analysis: &QueryAnalysis) -> ExpandedQueries {
        let mut out = ExpandedQueries::new(query);
        let lowered = query.to_lowercase();
        let entities = &analysis.entities;

        for template in self.templates.iter().filter(|t| t.is_triggered_by(&lowered)) {
            for entity in entities.operations.iter().chain(&entities.protocols) {
                out.push(template.apply(entity));
            }
        }
        for op in &entities.operations {
            out.push(format!("information about {}", op));
            out.push(format!("{} details", op));
        }
        for p in &entities.protocols {
            out.push(format!("{} protocol details", p));
            out.push(format!("how to implement {}", p));
        }
        for triple in analysis.keywords.windows(3) {
            out.push(triple.join(" "));
        }

        tracing::debug!(expansions = out.len(), "expanded query");
        out
    }
}
