use std::fs;
use std::io::Write;
use tempfile::TempDir;

use docqa_core::chunker::split;
use docqa_core::loader::DocumentLoader;

#[test]
fn load_directory_single_small_file() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    let file_path = dir.join("a.txt");
    let mut f = fs::File::create(&file_path).unwrap();
    writeln!(f, "Short text").unwrap();

    let docs = DocumentLoader::new().load_directory(dir).expect("load");

    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].raw_text.trim(), "Short text");
    assert!(docs[0].source_id.ends_with("a.txt"));
}

#[test]
fn load_with_limit_two_files_limit_one() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("a.txt"), "alpha bravo").unwrap();
    fs::write(dir.join("b.txt"), "charlie delta").unwrap();
    fs::write(dir.join("skip.md"), "not loaded").unwrap();

    let docs = DocumentLoader::new().load_with_limit(dir, 1).expect("load limited");

    assert_eq!(docs.len(), 1, "limited to one source document");
    assert!(docs[0].source_id.ends_with("a.txt"), "sorted order keeps a.txt first");
}

#[test]
fn cleaned_loader_then_chunker() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("notes.txt"), "Line one\r\nline two\n\n\nline three").unwrap();

    let docs = DocumentLoader::new().cleaned().load_directory(dir).expect("load");
    assert_eq!(docs[0].raw_text, "Line one line two line three");

    let chunks = split(&docs, 1000, 150).expect("split");
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].source_id, docs[0].source_id);
}

#[test]
fn missing_directory_loads_nothing() {
    let tmp = TempDir::new().unwrap();
    let docs = DocumentLoader::new().load_directory(&tmp.path().join("nope")).expect("load");
    assert!(docs.is_empty());
}
