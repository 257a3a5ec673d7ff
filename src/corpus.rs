//! Corpus loading and text-to-keystroke transcoding for a QWERTY reference
//! keyboard.

use crate::error::{CfResult, ChordError};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// What to emit in front of a key that needs Shift or AltGr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: String,
    pub alt: String,
}

impl Default for Modifiers {
    /// Shift is implied by the chord layer, so it emits nothing; Alt emits `T`.
    fn default() -> Self {
        Self {
            shift: String::new(),
            alt: "T".to_string(),
        }
    }
}

fn is_base_key(c: char) -> bool {
    c.is_ascii_lowercase()
        || c.is_ascii_digit()
        || matches!(
            c,
            '`' | '-' | '=' | '[' | ']' | '\\' | ';' | '\'' | ',' | '.' | '/' | ' ' | '\t' | '\n' | '\r'
        )
}

fn unshifted(c: char) -> Option<char> {
    if c.is_ascii_uppercase() {
        return Some(c.to_ascii_lowercase());
    }
    let base = match c {
        '!' => '1',
        '@' => '2',
        '#' => '3',
        '$' => '4',
        '%' => '5',
        '^' => '6',
        '&' => '7',
        '*' => '8',
        '(' => '9',
        ')' => '0',
        '~' => '`',
        '_' => '-',
        '+' => '=',
        '{' => '[',
        '}' => ']',
        '|' => '\\',
        ':' => ';',
        '"' => '\'',
        '<' => ',',
        '>' => '.',
        '?' => '/',
        _ => return None,
    };
    Some(base)
}

/// Polish letters typed as AltGr + base letter.
fn alt_base(c: char) -> Option<char> {
    let base = match c {
        'ą' | 'Ą' => 'a',
        'ć' | 'Ć' => 'c',
        'ę' | 'Ę' => 'e',
        'ł' | 'Ł' => 'l',
        'ń' | 'Ń' => 'n',
        'ó' | 'Ó' => 'o',
        'ś' | 'Ś' => 's',
        'ź' | 'Ź' => 'v',
        'ż' | 'Ż' => 'z',
        _ => return None,
    };
    Some(base)
}

/// Physical key sequence for `text`. Characters the reference keyboard has
/// no key for are dropped.
pub fn qwerty_keys(text: &str, modifiers: &Modifiers) -> String {
    let mut out = String::with_capacity(text.len());
    for mut c in text.chars() {
        if let Some(base) = alt_base(c) {
            out.push_str(&modifiers.alt);
            c = base;
        }
        if let Some(base) = unshifted(c) {
            out.push_str(&modifiers.shift);
            c = base;
        }
        if is_base_key(c) {
            out.push(c);
        }
    }
    out
}

/// Concatenates every file under `root` (or `root` itself if it is a file),
/// in file-name order. Unreadable entries are reported and skipped; invalid
/// UTF-8 is dropped.
pub fn load_corpus(root: &Path, transcode: bool, modifiers: &Modifiers) -> CfResult<String> {
    if !root.exists() {
        return Err(ChordError::Config(format!(
            "corpus path {} does not exist",
            root.display()
        )));
    }

    let mut corpus = String::new();
    let mut files = 0usize;
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping corpus entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let bytes = match fs::read(entry.path()) {
            Ok(b) => b,
            Err(e) => {
                warn!("Could not read {}: {}", entry.path().display(), e);
                continue;
            }
        };
        let text: String = String::from_utf8_lossy(&bytes)
            .chars()
            .filter(|&c| c != char::REPLACEMENT_CHARACTER)
            .collect();

        debug!("Loaded {} ({} bytes)", entry.path().display(), bytes.len());
        if transcode {
            corpus.push_str(&qwerty_keys(&text, modifiers));
        } else {
            corpus.push_str(&text);
        }
        files += 1;
    }

    info!(
        "Corpus: {} files, {} keys",
        files,
        corpus.chars().count()
    );
    Ok(corpus)
}

/// Occurrences of each character, sorted by character.
pub fn char_counts(keys: &str) -> BTreeMap<char, usize> {
    let mut counts = BTreeMap::new();
    for c in keys.chars() {
        *counts.entry(c).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcoding_with_visible_modifiers() {
        let m = Modifiers {
            shift: "S".into(),
            alt: "A".into(),
        };
        assert_eq!(qwerty_keys("Test_123%łóąć", &m), "StestS-123S5AlAoAaAc");
    }

    #[test]
    fn test_transcoding_with_default_modifiers() {
        assert_eq!(qwerty_keys("Test_1", &Modifiers::default()), "test-1");
        assert_eq!(qwerty_keys("Żółw", &Modifiers::default()), "TzToTlw");
    }

    #[test]
    fn test_unknown_characters_are_dropped() {
        assert_eq!(qwerty_keys("a€b\u{1F600}c", &Modifiers::default()), "abc");
    }

    #[test]
    fn test_char_counts() {
        let counts = char_counts("abca");
        assert_eq!(counts[&'a'], 2);
        assert_eq!(counts.keys().collect::<String>(), "abc");
    }
}
