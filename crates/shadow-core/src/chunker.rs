use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;
use unicode_segmentation::UnicodeSegmentation;

use crate::tagging;
use crate::types::{Chunk, Section};

static PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r?\n\s*\n").expect("valid paragraph pattern"));

const PARAGRAPH_SEP: &str = "\n\n";
const SENTENCE_SEP: &str = " ";

/// Sizes are counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub min_chunk_size: usize,
    pub max_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self { Self { min_chunk_size: 100, max_chunk_size: 1000 } }
}

#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Self { Self { config } }

    pub fn config(&self) -> &ChunkingConfig { &self.config }

    /// Split and tag every section. Deterministic: the same sections always yield the same chunks.
    /// Positions count per heading across the document, so a repeated heading continues its numbering.
    pub fn chunk(&self, sections: &[Section], doc_id: &str) -> Vec<Chunk> {
        let mut next_position: HashMap<&str, usize> = HashMap::new();
        let mut chunks = Vec::new();
        for section in sections {
            let start = next_position.entry(section.heading.as_str()).or_insert(0);
            let section_chunks = self.chunk_section(section, doc_id, *start);
            *start += section_chunks.len();
            chunks.extend(section_chunks);
        }
        chunks
    }

    fn chunk_section(&self, section: &Section, doc_id: &str, start: usize) -> Vec<Chunk> {
        self.split_text(&section.content)
            .into_iter()
            .zip(start..)
            .map(|(text, position)| Chunk {
                id: Chunk::make_id(doc_id, &section.heading, position),
                security_level: tagging::security_level(&text),
                operations: tagging::operations(&text),
                document: doc_id.to_string(),
                section: section.heading.clone(),
                text,
                position,
            })
            .collect()
    }

    /// Greedy paragraph packing; oversized paragraphs are packed sentence by sentence.
    /// Flushed pieces under `min_chunk_size` are dropped unless they are the last one.
    pub fn split_text(&self, content: &str) -> Vec<String> {
        let mut packer = Packer::new(self.config.max_chunk_size);
        for paragraph in PARAGRAPH_BREAK.split(content).map(str::trim).filter(|p| !p.is_empty()) {
            if char_len(paragraph) > self.config.max_chunk_size {
                for sentence in paragraph.unicode_sentences().map(str::trim).filter(|s| !s.is_empty()) {
                    packer.append(sentence, SENTENCE_SEP);
                }
            } else {
                packer.append(paragraph, PARAGRAPH_SEP);
            }
        }
        let pieces = packer.finish();
        let last = pieces.len().saturating_sub(1);
        pieces
            .into_iter()
            .enumerate()
            .filter(|(i, p)| *i == last || char_len(p) >= self.config.min_chunk_size)
            .map(|(_, p)| p)
            .collect()
    }
}

struct Packer {
    max: usize,
    current: String,
    current_len: usize,
    flushed: Vec<String>,
}

impl Packer {
    fn new(max: usize) -> Self { Self { max, current: String::new(), current_len: 0, flushed: Vec::new() } }

    fn append(&mut self, piece: &str, sep: &str) {
        let piece_len = char_len(piece);
        if self.current.is_empty() {
            self.current.push_str(piece);
            self.current_len = piece_len;
        } else if self.current_len + char_len(sep) + piece_len <= self.max {
            self.current.push_str(sep);
            self.current.push_str(piece);
            self.current_len += char_len(sep) + piece_len;
        } else {
            self.flushed.push(std::mem::replace(&mut self.current, piece.to_string()));
            self.current_len = piece_len;
        }
    }

    fn finish(mut self) -> Vec<String> {
        if !self.current.is_empty() { self.flushed.push(self.current); }
        self.flushed
    }
}

fn char_len(s: &str) -> usize { s.chars().count() }
