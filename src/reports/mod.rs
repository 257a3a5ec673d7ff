use chordforge::chord::ChordSpace;
use chordforge::layout::Layout;
use chordforge::optimizer::pheromone::PheromoneMatrix;
use chordforge::profile::ForcedChord;
use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use std::collections::HashSet;

const PHEROMONE_BARS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Visible stand-in for whitespace and control characters.
fn display_char(c: char) -> String {
    match c {
        ' ' => "␣".to_string(),
        '\n' => "↵".to_string(),
        '\t' => "⇥".to_string(),
        c if c.is_control() => c.escape_debug().to_string(),
        c => c.to_string(),
    }
}

pub fn print_layout(name: &str, layout: &Layout) {
    println!("\nLayout: {}", name);
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Char").add_attribute(Attribute::Bold),
        Cell::new("Chord").fg(Color::Cyan),
        Cell::new("Aliases"),
    ]);

    for (c, assignment) in layout.iter() {
        let aliases: Vec<String> = assignment.aliases.iter().map(|a| a.to_string()).collect();
        table.add_row(vec![
            Cell::new(display_char(c)).set_alignment(CellAlignment::Center),
            Cell::new(assignment.primary.to_string()).fg(Color::Cyan),
            Cell::new(aliases.join(", ")),
        ]);
    }
    println!("{}", table);
    println!(
        "{} characters, {} chords",
        layout.len(),
        layout.total_chords()
    );
}

pub struct ScoreSummary {
    pub characters: usize,
    pub dropped: usize,
    pub generation: Option<usize>,
    pub stored_ms: Option<f64>,
    pub computed_ms: f64,
    pub key_count: usize,
}

pub fn print_score(s: &ScoreSummary) {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);

    let per_key = if s.key_count == 0 {
        0.0
    } else {
        s.computed_ms / s.key_count as f64
    };
    let opt = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());

    table.add_row(vec![Cell::new("Characters"), Cell::new(s.characters)]);
    table.add_row(vec![Cell::new("Dropped entries"), Cell::new(s.dropped)]);
    table.add_row(vec![
        Cell::new("Generation"),
        Cell::new(opt(s.generation.map(|g| g.to_string()))),
    ]);
    table.add_row(vec![
        Cell::new("Stored cost"),
        Cell::new(opt(s.stored_ms.map(|c| format!("{:.1}ms", c)))),
    ]);
    table.add_row(vec![
        Cell::new("Computed cost").add_attribute(Attribute::Bold),
        Cell::new(format!("{:.1}ms", s.computed_ms)).fg(Color::Cyan),
    ]);
    table.add_row(vec![
        Cell::new("Per key"),
        Cell::new(format!("{:.2}ms", per_key)),
    ]);
    if let Some(stored) = s.stored_ms {
        let delta = s.computed_ms - stored;
        let color = if delta.abs() < 0.05 { Color::Green } else { Color::Red };
        table.add_row(vec![
            Cell::new("Delta"),
            Cell::new(format!("{:+.1}ms", delta)).fg(color),
        ]);
    }

    if let Some(col) = table.column_mut(1) {
        col.set_cell_alignment(CellAlignment::Right);
    }
    println!("\n{}", table);
}

pub fn print_chord_spaces(spaces: &[(&str, &ChordSpace, usize)]) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Universe").add_attribute(Attribute::Bold),
        Cell::new("Fingers"),
        Cell::new("Possible"),
        Cell::new("Exclusions"),
        Cell::new("Chords").fg(Color::Cyan),
    ]);

    for (name, space, exclusions) in spaces {
        table.add_row(vec![
            Cell::new(name).add_attribute(Attribute::Bold),
            Cell::new(space.profile().describe()),
            Cell::new(space.profile().chord_count()),
            Cell::new(exclusions),
            Cell::new(space.len()).fg(Color::Cyan),
        ]);
    }
    for i in 2..=4 {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }
    println!("\n{}", table);
}

/// Rows are non-forced characters, columns non-forced chords; each cell is a
/// bar scaled to the strongest unprotected weight.
pub fn pheromone_heatmap(matrix: &PheromoneMatrix, forced: &[ForcedChord]) -> String {
    let forced_chars: HashSet<char> = forced.iter().map(|f| f.character).collect();
    let forced_chords: HashSet<_> = forced.iter().map(|f| f.chord).collect();

    let chars: Vec<char> = matrix
        .characters()
        .iter()
        .copied()
        .filter(|c| !forced_chars.contains(c))
        .collect();
    let chords: Vec<_> = matrix
        .chords()
        .iter()
        .copied()
        .filter(|c| !forced_chords.contains(c))
        .collect();

    let max = matrix.max_unprotected();
    let top = PHEROMONE_BARS.len() - 1;
    let mut lines = Vec::with_capacity(chars.len() + 5);

    // Two header rows: thumb digit, then the remaining digits.
    let thumbs: Vec<String> = chords.iter().map(|c| format!(" {} ", c.thumb())).collect();
    lines.push(format!("      {}", thumbs.join(" ")));
    let tails: Vec<String> = chords
        .iter()
        .map(|c| c.tail().iter().map(|d| d.to_string()).collect())
        .collect();
    lines.push(format!("      {}", tails.join(" ")));

    for &ch in &chars {
        let cells: Vec<String> = chords
            .iter()
            .map(|chord| {
                let w = matrix.get(ch, chord).unwrap_or(0.0);
                let idx = if max > 0.0 {
                    ((w / max) * top as f64) as usize
                } else {
                    0
                };
                PHEROMONE_BARS[idx.min(top)].to_string().repeat(3)
            })
            .collect();
        lines.push(format!("   {:<2} {}", display_char(ch), cells.join(" ")));
    }

    lines.push(String::new());
    lines.push(format!(
        "   Legend: Max pheromone = {:.2}, Total = {:.1}",
        max,
        matrix.total()
    ));
    if !forced_chars.is_empty() || !forced_chords.is_empty() {
        lines.push(format!(
            "   Note: {} forced characters and {} forced chords hidden",
            forced_chars.len(),
            forced_chords.len()
        ));
    }
    lines.join("\n")
}

pub fn print_pheromones(matrix: &PheromoneMatrix, forced: &[ForcedChord]) {
    println!("\n{}", pheromone_heatmap(matrix, forced));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chordforge::chord::FingerProfile;
    use chordforge::optimizer::{AntColony, PheromoneOptions};

    #[test]
    fn test_heatmap_hides_forced_rows_and_columns() {
        let space = ChordSpace::full(FingerProfile::new(&[3, 2]).unwrap());
        let forced = vec![ForcedChord {
            character: ' ',
            chord: "20".parse().unwrap(),
        }];
        let colony = AntColony::new(['a', 'b'], &space, forced, None, PheromoneOptions::default());
        let map = pheromone_heatmap(colony.matrix(), colony.forced());
        let lines: Vec<&str> = map.lines().collect();

        // 2 header rows + 'a' + 'b', then a blank line, legend and note.
        assert_eq!(lines.len(), 7);
        assert!(lines[2].contains("███"));
        assert!(!map.contains('␣'));
        assert!(map.contains("1 forced characters and 1 forced chords hidden"));
    }
}
