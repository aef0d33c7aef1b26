use shadow_core::clearance::ClearanceLevel;
use shadow_core::traits::AnswerGenerator;
use shadow_core::types::{QueryAnalysis, RankedChunk};
use shadow_core::{Error, Result};
use std::collections::HashSet;
use std::fmt::Write;
use std::time::Duration;

/// System and user prompts for the answer step. Only the ranked chunks, which already
/// passed the clearance gate, reach the context.
pub fn build_prompts(query: &str, analysis: &QueryAnalysis, ranked: &[RankedChunk], level: ClearanceLevel) -> (String, String) {
    let system = format!(
        "You are Project SHADOW's Intelligence Retrieval Assistant.\n\
         You are assisting an intelligence officer with clearance level {level}.\n\n\
         Only provide information that is appropriate for this clearance level.\n\
         Always maintain operational security and confidentiality protocols.\n\n\
         Use only the information provided in the context. If you don't have enough information,\n\
         acknowledge this without making up details. Provide factual, direct answers.\n\n\
         Format your responses in a clear, structured manner using markdown."
    );

    let mut context = String::new();
    for (i, hit) in ranked.iter().enumerate() {
        let _ = write!(context, "\nChunk {}:\n{}\n", i + 1, hit.chunk.text);
    }
    let entities = &analysis.entities;
    let mut seen = HashSet::new();
    let focus: Vec<&str> = entities
        .operations
        .iter()
        .chain(&entities.protocols)
        .chain(&entities.locations)
        .map(String::as_str)
        .filter(|e| seen.insert(*e))
        .collect();
    let focus_line = if focus.is_empty() { String::new() } else { format!("Entities of interest: {}\n", focus.join(", ")) };

    let user = format!(
        "Query: {query}\n{focus_line}\nContext information:\n{context}\n\
         Based on the context information above, please provide a comprehensive response to my query.\n\
         If the information in the context is not sufficient, please indicate this clearly."
    );
    (system, user)
}

pub async fn answer(
    generator: &dyn AnswerGenerator,
    query: &str,
    analysis: &QueryAnalysis,
    ranked: &[RankedChunk],
    level: ClearanceLevel,
    timeout: Duration,
) -> Result<String> {
    let (system, user) = build_prompts(query, analysis, ranked, level);
    match tokio::time::timeout(timeout, generator.generate(&system, &user)).await {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "answer generation failed");
            Err(Error::ProviderUnavailable(e.to_string()))
        }
        Err(_) => {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "answer generation timed out");
            Err(Error::ProviderUnavailable("answer generation timed out".to_string()))
        }
    }
}
