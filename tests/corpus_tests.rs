use chordforge::corpus::{char_counts, load_corpus, Modifiers};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_nested_files_load_in_name_order() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("b_nested")).unwrap();
    fs::write(dir.path().join("c.txt"), "ccc").unwrap();
    fs::write(dir.path().join("a.txt"), "aaa").unwrap();
    fs::write(dir.path().join("b_nested").join("x.txt"), "bbb").unwrap();

    let text = load_corpus(dir.path(), false, &Modifiers::default()).unwrap();
    assert_eq!(text, "aaabbbccc");
}

#[test]
fn test_single_file_root() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("only.txt");
    fs::write(&file, "Hello").unwrap();

    let keys = load_corpus(&file, true, &Modifiers::default()).unwrap();
    assert_eq!(keys, "hello");
}

#[test]
fn test_invalid_utf8_is_dropped() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("bad.txt"), b"ab\xff\xfecd").unwrap();

    let text = load_corpus(dir.path(), false, &Modifiers::default()).unwrap();
    assert_eq!(text, "abcd");
}

#[test]
fn test_transcoding_applies_modifiers() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("pl.txt"), "Zażółć!").unwrap();
    let modifiers = Modifiers {
        shift: "S".into(),
        alt: "A".into(),
    };

    let keys = load_corpus(dir.path(), true, &modifiers).unwrap();
    assert_eq!(keys, "SzaAzAoAlAcS1");
    let counts = char_counts(&keys);
    assert_eq!(counts[&'A'], 4);
    assert_eq!(counts[&'S'], 2);
}

#[test]
fn test_missing_root_is_an_error() {
    let dir = tempdir().unwrap();
    let err = load_corpus(&dir.path().join("nope"), true, &Modifiers::default()).unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn test_empty_directory_gives_empty_corpus() {
    let dir = tempdir().unwrap();
    let text = load_corpus(dir.path(), true, &Modifiers::default()).unwrap();
    assert!(text.is_empty());
}
