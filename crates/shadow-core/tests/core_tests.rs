use std::fs;
use tempfile::TempDir;

use shadow_core::chunker::ChunkingConfig;
use shadow_core::data_processor::DataProcessor;

#[test]
fn process_directory_single_small_file() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("a.txt"), "Short text\n").unwrap();

    let processor = DataProcessor::default();
    let chunks = processor.process_directory(tmp.path()).expect("process");

    assert_eq!(chunks.len(), 1, "one small paragraph becomes one chunk");
    assert_eq!(chunks[0].text, "Short text");
    assert_eq!(chunks[0].document, "a");
    assert_eq!(chunks[0].id, "a_Introduction_0");
}

#[test]
fn unsupported_files_are_skipped() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("manual.docx"), b"PK\x03\x04").unwrap();
    fs::write(tmp.path().join("notes.md"), "# Field notes\nOperation Eclipse is at level 2.\n").unwrap();

    let chunks = DataProcessor::default().process_directory(tmp.path()).expect("process");

    let docs: std::collections::HashSet<_> = chunks.iter().map(|c| c.document.clone()).collect();
    assert_eq!(docs.len(), 1);
    assert_eq!(chunks[0].section, "Field notes");
    assert_eq!(chunks[0].security_level, 2);
    assert_eq!(chunks[0].operations, vec!["Eclipse"]);
}

#[test]
fn processing_twice_is_identical() {
    let tmp = TempDir::new().unwrap();
    let body = "# Brief\n".to_string() + &"Agents at level 3 rotate weekly between sites. ".repeat(40) + "\n\nClosing remarks.\n";
    fs::write(tmp.path().join("brief.md"), body).unwrap();

    let processor = DataProcessor::new(ChunkingConfig { min_chunk_size: 50, max_chunk_size: 300 });
    let first = processor.process_directory(tmp.path()).unwrap();
    let second = processor.process_directory(tmp.path()).unwrap();

    assert!(first.len() > 1);
    assert_eq!(first, second);
    for c in &first { assert_eq!(c.security_level, 3); }
}

#[test]
fn empty_directory_yields_no_chunks() {
    let tmp = TempDir::new().unwrap();
    assert!(DataProcessor::default().process_directory(tmp.path()).unwrap().is_empty());
}

#[test]
fn duplicate_stems_and_repeated_headings_keep_ids_unique() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("brief.md"), "## Notes\nCafeteria hours.\n\n## Notes\nVault codes are level 4.\n").unwrap();
    fs::write(tmp.path().join("brief.txt"), "Second file with the same stem.").unwrap();

    let chunks = DataProcessor::default().process_directory(tmp.path()).unwrap();

    let ids: Vec<_> = chunks.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["brief_Notes_0", "brief_Notes_1"]);
    assert!(chunks.iter().all(|c| !c.text.contains("same stem")));
}
