//! shadow-query
//!
//! Query understanding: intent rules, gazetteer entity matching, keyword
//! extraction and the expansion of one question into several phrasings.

pub mod analyzer;
pub mod expander;
pub mod keywords;
pub mod stopwords;

pub use analyzer::{Gazetteer, QueryAnalyzer};
pub use expander::{ExpansionTemplate, QueryExpander};
