use shadow_core::types::Intent;
use shadow_query::{QueryAnalyzer, QueryExpander};

#[test]
fn status_question_about_known_operation() {
    let query = "What is the status of Operation Phantom Veil?";
    let analysis = QueryAnalyzer::default().analyze(query);
    assert_eq!(analysis.intent, Intent::Status);
    assert_eq!(analysis.entities.operations, vec!["Phantom Veil"]);
    assert!(analysis.entities.protocols.is_empty());

    let expanded = QueryExpander::new().expand(query, &analysis);
    assert_eq!(expanded.original(), query);
    assert!(expanded.contains("What is the current status, phase, and progress details of Phantom Veil?"));
    assert!(expanded.contains("information about Phantom Veil"));
    assert!(expanded.contains("Phantom Veil details"));
}

#[test]
fn expansion_has_no_duplicates() {
    let query = "How to secure the Eclipse safehouse and protect Eclipse protocol for extraction?";
    let analysis = QueryAnalyzer::default().analyze(query);
    let expanded = QueryExpander::new().expand(query, &analysis);
    let mut seen = std::collections::HashSet::new();
    for q in &expanded {
        assert!(seen.insert(q.clone()), "duplicate expansion {:?}", q);
    }
    assert_eq!(analysis.intent, Intent::Procedure);
    assert_eq!(analysis.entities.locations, vec!["Eclipse safehouse"]);
}

#[test]
fn unrelated_query_expands_to_itself_plus_keywords() {
    let query = "quarterly budget meeting notes";
    let analysis = QueryAnalyzer::default().analyze(query);
    assert!(analysis.entities.is_empty());
    let expanded = QueryExpander::new().expand(query, &analysis);
    assert_eq!(expanded.original(), query);
    assert!(expanded.iter().skip(1).all(|q| q.split(' ').count() >= 3));
}
