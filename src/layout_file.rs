//! Plain-text layout files: a small header, one `char -> chords` line per
//! character, and a summary footer.
//!
//! ```text
//! Best Keyboard Layout
//! ============================================================
//! Generation: 12
//! Cost: 81234.0ms
//! Average cost per character: 95.12ms
//!
//! Chord Assignments:
//! ------------------------------------------------------------
//! ' '   -> 2000
//! a     -> 0011, 1220
//! ```

use crate::chord::Chord;
use crate::error::CfResult;
use crate::layout::Layout;
use itertools::Itertools;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

pub const TITLE: &str = "Best Keyboard Layout";
const RULE_WIDTH: usize = 60;
const ASSIGNMENTS_HEADER: &str = "Chord Assignments:";

/// Everything a saved file records besides the layout itself.
#[derive(Debug, Clone, Copy)]
pub struct LayoutHeader {
    pub generation: usize,
    pub cost_ms: f64,
    /// Length of the key sequence the cost was measured on.
    pub key_count: usize,
}

#[derive(Debug, Clone)]
pub struct LoadedLayout {
    pub layout: Layout,
    pub generation: Option<usize>,
    pub cost_ms: Option<f64>,
    /// Entries skipped because their character or chord was malformed.
    pub dropped: usize,
}

/// Quoted form for characters that would be invisible or ambiguous in the file.
pub fn char_repr(c: char) -> String {
    match c {
        '\n' => "'\\n'".to_string(),
        '\t' => "'\\t'".to_string(),
        '\r' => "'\\r'".to_string(),
        ' ' => "' '".to_string(),
        _ => c.to_string(),
    }
}

pub fn format_layout(layout: &Layout, header: &LayoutHeader) -> String {
    let average = if header.key_count == 0 {
        0.0
    } else {
        header.cost_ms / header.key_count as f64
    };

    let equals = "=".repeat(RULE_WIDTH);
    let mut out = format!(
        "{TITLE}\n{equals}\nGeneration: {}\nCost: {:.1}ms\nAverage cost per character: {:.2}ms\n\n{ASSIGNMENTS_HEADER}\n{}\n",
        header.generation,
        header.cost_ms,
        average,
        "-".repeat(RULE_WIDTH),
    );

    for (c, assignment) in layout.iter() {
        let chords = assignment.chords().map(|ch| ch.to_string()).join(", ");
        out.push_str(&format!("{:<5} -> {}\n", char_repr(c), chords));
    }

    out.push_str(&format!(
        "\n{equals}\nTotal unique characters: {}\nTotal chord assignments: {}\n",
        layout.len(),
        layout.total_chords()
    ));
    out
}

pub fn save_layout<P: AsRef<Path>>(path: P, layout: &Layout, header: &LayoutHeader) -> CfResult<()> {
    fs::write(path.as_ref(), format_layout(layout, header))?;
    debug!("Saved layout to {}", path.as_ref().display());
    Ok(())
}

pub fn load_layout<P: AsRef<Path>>(path: P) -> CfResult<LoadedLayout> {
    let bytes = fs::read(path)?;
    Ok(parse_layout(&String::from_utf8_lossy(&bytes)))
}

/// Reads the primary chord of every well-formed entry. Aliases are not
/// reloaded; malformed entries are reported and skipped.
pub fn parse_layout(text: &str) -> LoadedLayout {
    let mut loaded = LoadedLayout {
        layout: Layout::new(),
        generation: None,
        cost_ms: None,
        dropped: 0,
    };
    let mut in_assignments = false;

    for raw in text.lines() {
        let line = raw.trim();

        if !in_assignments {
            if line.starts_with(ASSIGNMENTS_HEADER) {
                in_assignments = true;
            } else if let Some(v) = line.strip_prefix("Generation:") {
                loaded.generation = v.trim().parse().ok();
            } else if let Some(v) = line.strip_prefix("Cost:") {
                loaded.cost_ms = v.trim().trim_end_matches("ms").trim().parse().ok();
            }
            continue;
        }
        if line.is_empty() || is_rule(line) {
            continue;
        }

        let Some((char_part, chord_part)) = raw.split_once("->") else {
            continue;
        };
        let Some(token) = character_token(char_part) else {
            continue;
        };

        let mut chars = token.chars();
        let c = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => {
                warn!("Dropping entry {:?}: not a single character", token);
                loaded.dropped += 1;
                continue;
            }
        };

        let first = chord_part.split(',').next().unwrap_or("").trim();
        match first.parse::<Chord>() {
            Ok(chord) => loaded.layout.assign(c, chord),
            Err(e) => {
                warn!("Dropping entry for {:?}: {}", c, e);
                loaded.dropped += 1;
            }
        }
    }

    loaded
}

fn is_rule(line: &str) -> bool {
    (line.starts_with('=') && line.contains(&"=".repeat(10)))
        || (line.starts_with('-') && line.contains(&"-".repeat(10)))
}

/// The character text left of the arrow: an unescaped quoted literal, or the
/// first character after leading spaces (which may be a raw control character).
fn character_token(char_part: &str) -> Option<String> {
    let quoted = char_part.trim();
    if quoted.len() > 2 && quoted.starts_with('\'') && quoted.ends_with('\'') {
        if let Some(s) = unescape(&quoted[1..quoted.len() - 1]) {
            return Some(s);
        }
    }
    char_part
        .trim_start_matches(' ')
        .chars()
        .next()
        .map(String::from)
}

/// Undoes the escapes a quoted character may carry: `\n \t \r \0 \\ \' \"`,
/// `\xHH`, `\uXXXX` and `\u{...}`.
fn unescape(body: &str) -> Option<String> {
    let mut out = String::new();
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let decoded = match chars.next()? {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            'x' => hex_char(&chars.by_ref().take(2).collect::<String>())?,
            'u' => {
                let rest = chars.as_str();
                if let Some(braced) = rest.strip_prefix('{') {
                    let end = braced.find('}')?;
                    let c = hex_char(&braced[..end])?;
                    chars = braced[end + 1..].chars();
                    c
                } else {
                    hex_char(&chars.by_ref().take(4).collect::<String>())?
                }
            }
            _ => return None,
        };
        out.push(decoded);
    }
    Some(out)
}

fn hex_char(digits: &str) -> Option<char> {
    if digits.is_empty() {
        return None;
    }
    u32::from_str_radix(digits, 16).ok().and_then(char::from_u32)
}
