//! Pheromone-guided layout construction.
//!
//! Rows of the matrix are characters, columns are chords. Forced assignments
//! pin their whole row and column: every cell there is zero except the forced
//! cell itself, and none of them is touched by evaporation or boosting.

use crate::chord::{Chord, ChordSpace};
use crate::config::Config;
use crate::constraints::LayoutConstraints;
use crate::error::{CfResult, ChordError};
use crate::layout::Layout;
use crate::profile::ForcedChord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct PheromoneOptions {
    pub initial: f64,
    pub evaporation_rate: f64,
    pub boost: f64,
    /// Evaporation never takes an unprotected cell below this.
    pub floor: f64,
    pub assign_aliases: bool,
}

impl From<&Config> for PheromoneOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            initial: cfg.colony.initial_pheromone,
            evaporation_rate: cfg.colony.evaporation_rate,
            boost: cfg.colony.pheromone_boost,
            floor: cfg.colony.pheromone_floor,
            assign_aliases: cfg.colony.assign_aliases,
        }
    }
}

impl Default for PheromoneOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Characters that draw from one family of chords sharing a tail and differing
/// only in a leading modifier digit (e.g. diacritic letters on their own layer).
///
/// Each tail can be used by at least one family member; picking `m + tail`
/// also reserves `shifted_value + tail` so the shifted form stays free of
/// unrelated characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedAliasFamily {
    pub characters: Vec<char>,
    pub tails: Vec<Chord>,
    #[serde(default = "SharedAliasFamily::default_modifiers")]
    pub modifier_values: Vec<u8>,
    #[serde(default = "SharedAliasFamily::default_shifted")]
    pub shifted_value: u8,
    /// Tails treated as taken before construction starts.
    #[serde(default)]
    pub reserved_tails: Vec<Chord>,
}

impl SharedAliasFamily {
    fn default_modifiers() -> Vec<u8> {
        vec![0, 1, 2]
    }

    fn default_shifted() -> u8 {
        3
    }

    pub fn validate(&self) -> CfResult<()> {
        if self.modifier_values.contains(&self.shifted_value) {
            return Err(ChordError::Config(format!(
                "shared alias modifier {} doubles as the shifted value",
                self.shifted_value
            )));
        }
        Ok(())
    }

    /// `modifier` followed by `tail`, or `None` for the all-released chord.
    pub fn member(&self, modifier: u8, tail: &Chord) -> Option<Chord> {
        let mut digits = Vec::with_capacity(tail.len() + 1);
        digits.push(modifier);
        digits.extend_from_slice(tail.digits());
        Chord::from_digits(&digits).ok().filter(|c| !c.is_released())
    }
}

#[derive(Debug, Clone)]
pub struct PheromoneMatrix {
    characters: Vec<char>,
    chords: Vec<Chord>,
    rows: HashMap<char, usize>,
    cols: HashMap<Chord, usize>,
    weights: Vec<f64>,
    protected: Vec<bool>,
}

impl PheromoneMatrix {
    fn new(characters: Vec<char>, chords: Vec<Chord>, initial: f64, forced: &[ForcedChord]) -> Self {
        let rows: HashMap<char, usize> = characters.iter().enumerate().map(|(i, &c)| (c, i)).collect();
        let cols: HashMap<Chord, usize> = chords.iter().enumerate().map(|(i, &c)| (c, i)).collect();
        let cells = characters.len() * chords.len();
        let mut m = Self {
            characters,
            chords,
            rows,
            cols,
            weights: vec![initial; cells],
            protected: vec![false; cells],
        };

        let width = m.chords.len();
        for f in forced {
            let row = m.rows.get(&f.character).copied();
            let col = m.cols.get(&f.chord).copied();
            if let Some(r) = row {
                for c in 0..width {
                    m.weights[r * width + c] = 0.0;
                    m.protected[r * width + c] = true;
                }
            }
            if let Some(c) = col {
                for r in 0..m.characters.len() {
                    m.weights[r * width + c] = 0.0;
                    m.protected[r * width + c] = true;
                }
            }
            if let (Some(r), Some(c)) = (row, col) {
                m.weights[r * width + c] = initial;
            }
        }
        m
    }

    #[inline]
    fn cell(&self, row: usize, col: usize) -> usize {
        row * self.chords.len() + col
    }

    pub fn characters(&self) -> &[char] {
        &self.characters
    }

    pub fn chords(&self) -> &[Chord] {
        &self.chords
    }

    pub fn get(&self, ch: char, chord: &Chord) -> Option<f64> {
        let r = *self.rows.get(&ch)?;
        let c = *self.cols.get(chord)?;
        Some(self.weights[self.cell(r, c)])
    }

    pub fn is_protected(&self, ch: char, chord: &Chord) -> bool {
        match (self.rows.get(&ch), self.cols.get(chord)) {
            (Some(&r), Some(&c)) => self.protected[self.cell(r, c)],
            _ => false,
        }
    }

    /// Largest weight outside the protected rows and columns.
    pub fn max_unprotected(&self) -> f64 {
        self.weights
            .iter()
            .zip(&self.protected)
            .filter(|&(_, &p)| !p)
            .map(|(&w, _)| w)
            .fold(0.0, f64::max)
    }

    pub fn total(&self) -> f64 {
        self.weights.iter().sum()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Outcome of one ant's walk.
#[derive(Debug, Clone)]
pub struct Construction {
    pub layout: Layout,
    /// The chord supply ran out before every character got one.
    pub exhausted: bool,
}

/// Stochastic layout builder plus the pheromone matrix it learns into.
///
/// Construction only reads the matrix; `update_pheromones` is the sole writer
/// and runs between generations on the driving thread.
///
/// Thumb-alternative pairs from the attached constraints are honoured while
/// building: a base never lands on the thumb layer or on a chord whose variant
/// slot is taken, and its variant is assigned alongside it. The result can be
/// handed straight to beam search.
pub struct AntColony {
    matrix: PheromoneMatrix,
    forced: Vec<ForcedChord>,
    shared: Option<SharedAliasFamily>,
    constraints: LayoutConstraints,
    options: PheromoneOptions,
}

impl AntColony {
    /// Forced characters join the character universe even when `characters`
    /// does not list them.
    pub fn new<I>(
        characters: I,
        space: &ChordSpace,
        forced: Vec<ForcedChord>,
        shared: Option<SharedAliasFamily>,
        options: PheromoneOptions,
    ) -> Self
    where
        I: IntoIterator<Item = char>,
    {
        let mut universe: BTreeSet<char> = characters.into_iter().collect();
        universe.extend(forced.iter().map(|f| f.character));

        let matrix = PheromoneMatrix::new(
            universe.into_iter().collect(),
            space.chords().to_vec(),
            options.initial,
            &forced,
        );
        Self {
            matrix,
            forced,
            shared,
            constraints: LayoutConstraints::unconstrained(0),
            options,
        }
    }

    /// Attaches the thumb-alternative pairs constructed layouts must respect.
    pub fn with_constraints(mut self, constraints: LayoutConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn matrix(&self) -> &PheromoneMatrix {
        &self.matrix
    }

    pub fn forced(&self) -> &[ForcedChord] {
        &self.forced
    }

    pub fn construct_layout(&self, rng: &mut fastrand::Rng) -> Construction {
        let m = &self.matrix;
        let mut layout = Layout::new();
        let mut used: HashSet<Chord> = HashSet::new();

        for f in &self.forced {
            layout.assign(f.character, f.chord);
            used.insert(f.chord);
        }
        for f in &self.forced {
            self.place_variant(f.character, f.chord, &mut layout, &mut used);
        }

        if let Some(family) = &self.shared {
            self.assign_shared(family, &mut layout, &mut used, rng);
        }

        // Variants whose base is built here are only ever placed through it.
        let bound: HashSet<char> = self
            .constraints
            .thumb_pairs()
            .filter(|(base, _)| m.rows.contains_key(base) || layout.contains(*base))
            .map(|(_, variant)| variant)
            .collect();

        let mut exhausted = false;
        let mut weights = Vec::with_capacity(m.chords.len());
        let mut open = Vec::with_capacity(m.chords.len());
        for (row, &ch) in m.characters.iter().enumerate() {
            if layout.contains(ch) || bound.contains(&ch) {
                continue;
            }
            open.clear();
            open.extend((0..m.chords.len()).filter(|&c| !used.contains(&m.chords[c])));
            if open.is_empty() {
                exhausted = true;
                break;
            }
            if self.constraints.is_thumb_base(ch) {
                open.retain(|&c| self.base_can_take(m.chords[c], &used));
            }
            weights.clear();
            weights.extend(open.iter().map(|&c| m.weights[m.cell(row, c)]));

            if let Some(pick) = weighted_choice(&weights, rng) {
                let chord = m.chords[open[pick]];
                layout.assign(ch, chord);
                used.insert(chord);
                self.place_variant(ch, chord, &mut layout, &mut used);
            }
        }

        if self.options.assign_aliases {
            let mut column = Vec::with_capacity(m.characters.len());
            for (col, &chord) in m.chords.iter().enumerate() {
                if used.contains(&chord) {
                    continue;
                }
                column.clear();
                column.extend((0..m.characters.len()).map(|r| m.weights[m.cell(r, col)]));
                if let Some(row) = weighted_choice(&column, rng) {
                    layout.add_chord(m.characters[row], chord);
                    used.insert(chord);
                }
            }
        }

        Construction { layout, exhausted }
    }

    /// A thumb base may take `chord` only off the thumb layer and only when the
    /// matching variant slot is still free.
    fn base_can_take(&self, chord: Chord, used: &HashSet<Chord>) -> bool {
        !self.constraints.on_thumb_layer(chord)
            && !used.contains(&self.constraints.variant_chord(chord))
    }

    /// Assigns the variant of `base`, if it has one, and marks its chord used.
    fn place_variant(&self, base: char, chord: Chord, layout: &mut Layout, used: &mut HashSet<Chord>) {
        if let Some(variant) = self.constraints.thumb_variant(base) {
            let slot = self.constraints.variant_chord(chord);
            layout.assign(variant, slot);
            used.insert(slot);
        }
    }

    fn assign_shared(
        &self,
        family: &SharedAliasFamily,
        layout: &mut Layout,
        used: &mut HashSet<Chord>,
        rng: &mut fastrand::Rng,
    ) {
        let m = &self.matrix;
        let mut used_tails: BTreeSet<Chord> = family.reserved_tails.iter().copied().collect();

        for &ch in &family.characters {
            if layout.contains(ch) {
                continue;
            }
            let Some(&row) = m.rows.get(&ch) else {
                continue;
            };

            let mut options: Vec<(Chord, Chord)> = Vec::new();
            let mut weights: Vec<f64> = Vec::new();
            for &modifier in &family.modifier_values {
                for tail in family.tails.iter().filter(|t| !used_tails.contains(t)) {
                    let Some(chord) = family.member(modifier, tail) else {
                        continue;
                    };
                    if used.contains(&chord) {
                        continue;
                    }
                    if self.constraints.is_thumb_base(ch) && !self.base_can_take(chord, used) {
                        continue;
                    }
                    // Only chords the matrix knows can be weighed.
                    if let Some(&col) = m.cols.get(&chord) {
                        options.push((chord, *tail));
                        weights.push(m.weights[m.cell(row, col)]);
                    }
                }
            }
            if options.is_empty() {
                break;
            }

            if let Some(pick) = weighted_choice(&weights, rng) {
                let (chord, tail) = options[pick];
                layout.assign(ch, chord);
                used.insert(chord);
                used_tails.insert(tail);
                self.place_variant(ch, chord, layout, used);
            }
        }

        for tail in &used_tails {
            if let Some(shifted) = family.member(family.shifted_value, tail) {
                used.insert(shifted);
            }
        }
    }

    /// Evaporates every unprotected cell (floored), then boosts the cells the
    /// winner actually uses, primaries and aliases alike.
    pub fn update_pheromones(&mut self, winner: &Layout) {
        let keep = 1.0 - self.options.evaporation_rate;
        let floor = self.options.floor;
        let m = &mut self.matrix;

        for (w, &p) in m.weights.iter_mut().zip(&m.protected) {
            if !p {
                *w = (*w * keep).max(floor);
            }
        }

        for (ch, assignment) in winner.iter() {
            let Some(&row) = m.rows.get(&ch) else {
                continue;
            };
            for chord in assignment.chords() {
                if let Some(&col) = m.cols.get(&chord) {
                    let cell = m.cell(row, col);
                    if !m.protected[cell] {
                        m.weights[cell] += self.options.boost;
                    }
                }
            }
        }
    }
}

/// Cumulative-distribution inversion: draw `r` in `[0, 1)` and return the
/// first index whose normalised cumulative weight reaches it.
///
/// `None` when there is nothing to choose from (empty, all zero, or not finite).
/// Floating-point shortfall in the last bucket falls back to the last
/// positive weight, never to a zero one.
pub fn weighted_choice(weights: &[f64], rng: &mut fastrand::Rng) -> Option<usize> {
    let total: f64 = weights.iter().sum();
    if !(total > 0.0) || !total.is_finite() {
        return None;
    }

    let r = rng.f64();
    let mut acc = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        acc += w / total;
        if r <= acc && w > 0.0 {
            return Some(i);
        }
    }
    weights.iter().rposition(|&w| w > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::FingerProfile;

    fn chord(s: &str) -> Chord {
        s.parse().unwrap()
    }

    fn space_chord() -> ForcedChord {
        ForcedChord {
            character: ' ',
            chord: chord("2000"),
        }
    }

    #[test]
    fn test_weighted_choice_skips_zero_weights() {
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..200 {
            let pick = weighted_choice(&[0.0, 1.0, 0.0, 3.0], &mut rng).unwrap();
            assert!(pick == 1 || pick == 3);
        }
        assert_eq!(weighted_choice(&[0.0, 0.0], &mut rng), None);
        assert_eq!(weighted_choice(&[], &mut rng), None);
    }

    #[test]
    fn test_weighted_choice_follows_weights() {
        let mut rng = fastrand::Rng::with_seed(11);
        let hits = (0..4000)
            .filter(|_| weighted_choice(&[1.0, 3.0], &mut rng) == Some(1))
            .count();
        assert!((2700..3300).contains(&hits), "hits = {}", hits);
    }

    #[test]
    fn test_forced_row_and_column_zeroed() {
        let space = ChordSpace::full(FingerProfile::four_finger());
        let colony = AntColony::new(
            ['a', 'b'],
            &space,
            vec![space_chord()],
            None,
            PheromoneOptions::default(),
        );
        let m = colony.matrix();

        assert_eq!(m.characters(), &[' ', 'a', 'b']);
        assert_eq!(m.get(' ', &chord("2000")), Some(1.0));
        assert_eq!(m.get(' ', &chord("0100")), Some(0.0));
        assert_eq!(m.get('a', &chord("2000")), Some(0.0));
        assert_eq!(m.get('a', &chord("0100")), Some(1.0));
        assert!(m.is_protected('a', &chord("2000")));
        assert!(!m.is_protected('a', &chord("0100")));
    }

    #[test]
    fn test_construction_is_a_valid_layout() {
        let space = ChordSpace::full(FingerProfile::new(&[3, 2]).unwrap());
        let forced = vec![ForcedChord {
            character: ' ',
            chord: chord("20"),
        }];
        let colony = AntColony::new("abcdef".chars(), &space, forced, None, PheromoneOptions::default());
        let mut rng = fastrand::Rng::with_seed(3);

        for _ in 0..50 {
            let built = colony.construct_layout(&mut rng);
            assert!(!built.exhausted);
            assert_eq!(built.layout.len(), 7);
            assert_eq!(built.layout.primary(' '), Some(chord("20")));
            let owners = built.layout.owners();
            assert_eq!(owners.len(), built.layout.total_chords());
        }
    }

    #[test]
    fn test_construction_reports_exhaustion() {
        let space = ChordSpace::full(FingerProfile::new(&[1, 1]).unwrap());
        let colony = AntColony::new("abcde".chars(), &space, Vec::new(), None, PheromoneOptions::default());
        let built = colony.construct_layout(&mut fastrand::Rng::with_seed(1));
        assert!(built.exhausted);
        assert_eq!(built.layout.len(), 3);
    }

    #[test]
    fn test_aliases_use_every_leftover_chord() {
        let space = ChordSpace::full(FingerProfile::new(&[3, 2]).unwrap());
        let options = PheromoneOptions {
            assign_aliases: true,
            ..PheromoneOptions::default()
        };
        let colony = AntColony::new("ab".chars(), &space, Vec::new(), None, options);
        let built = colony.construct_layout(&mut fastrand::Rng::with_seed(5));
        assert_eq!(built.layout.len(), 2);
        assert_eq!(built.layout.total_chords(), space.len());
    }

    #[test]
    fn test_thumb_bases_stay_off_thumb_layer_and_bring_variants() {
        // Three bases over three tails: every base needs its own variant slot.
        let space = ChordSpace::full(FingerProfile::new(&[3, 2]).unwrap());
        let constraints =
            LayoutConstraints::new(Vec::<char>::new(), [('c', 'C'), ('v', 'V'), ('z', 'Z')], 3);
        let colony = AntColony::new("cvz".chars(), &space, Vec::new(), None, PheromoneOptions::default())
            .with_constraints(constraints.clone());
        let mut rng = fastrand::Rng::with_seed(13);

        for _ in 0..200 {
            let layout = colony.construct_layout(&mut rng).layout;
            for (base, variant) in constraints.thumb_pairs() {
                let chord = layout.primary(base).unwrap();
                assert_ne!(chord.thumb(), 3);
                assert_eq!(layout.primary(variant), Some(chord.with_thumb(3)));
            }
            assert!(constraints.violations(&layout).is_empty());
        }
    }

    #[test]
    fn test_shared_family_reserves_shifted_variant() {
        let space = ChordSpace::full(FingerProfile::four_finger());
        let family = SharedAliasFamily {
            characters: vec!['a'],
            tails: vec![chord("012")],
            modifier_values: vec![0, 1, 2],
            shifted_value: 3,
            reserved_tails: Vec::new(),
        };
        let colony = AntColony::new(
            "ab".chars(),
            &space,
            Vec::new(),
            Some(family),
            PheromoneOptions::default(),
        );
        let mut rng = fastrand::Rng::with_seed(9);
        for _ in 0..50 {
            let layout = colony.construct_layout(&mut rng).layout;
            let a = layout.primary('a').unwrap();
            assert_eq!(a.tail(), &[0, 1, 2]);
            assert_ne!(layout.primary('b'), Some(chord("3012")));
        }
    }

    #[test]
    fn test_update_floors_and_protects() {
        let space = ChordSpace::full(FingerProfile::four_finger());
        let options = PheromoneOptions {
            evaporation_rate: 0.5,
            ..PheromoneOptions::default()
        };
        let mut colony = AntColony::new(['a'], &space, vec![space_chord()], None, options);
        let winner: Layout = [(' ', chord("2000")), ('a', chord("0100"))].into_iter().collect();

        for _ in 0..100 {
            colony.update_pheromones(&winner);
        }
        let m = colony.matrix();
        assert_eq!(m.get(' ', &chord("2000")), Some(1.0));
        assert_eq!(m.get('a', &chord("2000")), Some(0.0));
        assert_eq!(m.get('a', &chord("0011")), Some(0.0001));
        assert!(m.get('a', &chord("0100")).unwrap() > 0.0001);
    }
}
