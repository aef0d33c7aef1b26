use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::Section;

pub const DEFAULT_HEADING: &str = "Introduction";
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Read a source file into (heading, content) sections.
pub fn decode(path: &Path) -> Result<Vec<Section>> {
    if !is_supported(path) { return Err(Error::UnsupportedFormat { path: path.to_path_buf() }); }
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => String::from_utf8_lossy(&fs::read(path)?).to_string(),
    };
    Ok(decode_str(&content))
}

/// Markdown ATX headings open a new section; text before the first heading
/// belongs to [`DEFAULT_HEADING`]. Sections without content are dropped.
pub fn decode_str(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut heading = DEFAULT_HEADING.to_string();
    let mut body: Vec<&str> = Vec::new();
    for line in text.lines() {
        if let Some(h) = parse_heading(line) {
            push_section(&mut sections, &heading, &body);
            heading = h.to_string();
            body.clear();
        } else {
            body.push(line);
        }
    }
    push_section(&mut sections, &heading, &body);
    sections
}

fn push_section(sections: &mut Vec<Section>, heading: &str, body: &[&str]) {
    let content = body.join("\n");
    let content = content.trim();
    if !content.is_empty() { sections.push(Section::new(heading, content)); }
}

fn parse_heading(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    if hashes == 0 || hashes > 6 { return None; }
    let rest = &trimmed[hashes..];
    if !rest.starts_with(' ') && !rest.starts_with('\t') { return None; }
    let title = rest.trim().trim_end_matches('#').trim();
    if title.is_empty() { None } else { Some(title) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_lands_in_default_section() {
        let sections = decode_str("First paragraph.\n\nSecond paragraph.\n");
        assert_eq!(sections, vec![Section::new(DEFAULT_HEADING, "First paragraph.\n\nSecond paragraph.")]);
    }

    #[test]
    fn headings_split_sections() {
        let text = "# Overview\nIntro text.\n\n## Protocols ##\nStep one.\n\nStep two.\n### Empty\n";
        let sections = decode_str(text);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].heading, "Overview");
        assert_eq!(sections[1].heading, "Protocols");
        assert_eq!(sections[1].content, "Step one.\n\nStep two.");
    }

    #[test]
    fn hash_without_space_is_text() {
        let sections = decode_str("#hashtag line\nmore");
        assert_eq!(sections[0].heading, DEFAULT_HEADING);
        assert_eq!(sections[0].content, "#hashtag line\nmore");
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let err = decode(Path::new("manual.docx")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }
}
