//! Single-swap neighborhood of a layout.

use crate::chord::{Chord, ChordSpace};
use crate::constraints::LayoutConstraints;
use crate::layout::{Layout, Slot};
use std::collections::HashMap;

type Owner = Option<(char, Slot)>;

/// Every legal layout one chord swap away from `layout`.
///
/// Walks the unordered chord pairs `(i, j), i < j` of `space` in order and
/// yields at most one layout per pair. The iterator borrows an immutable
/// snapshot, so calling `mutate` again on the same input replays the exact
/// same sequence.
pub fn mutate<'a>(
    layout: &'a Layout,
    space: &'a ChordSpace,
    constraints: &'a LayoutConstraints,
) -> Neighbors<'a> {
    Neighbors {
        layout,
        chords: space.chords(),
        constraints,
        owners: layout.owners(),
        i: 0,
        j: 1,
    }
}

pub struct Neighbors<'a> {
    layout: &'a Layout,
    chords: &'a [Chord],
    constraints: &'a LayoutConstraints,
    owners: HashMap<Chord, (char, Slot)>,
    i: usize,
    j: usize,
}

impl Neighbors<'_> {
    /// The owning character, if it is a thumb base holding `chord` as its primary.
    fn thumb_base(&self, owner: Owner) -> Option<char> {
        match owner {
            Some((ch, Slot::Primary)) if self.constraints.is_thumb_base(ch) => Some(ch),
            _ => None,
        }
    }

    /// Points a thumb base at `chord` and drags its variant along.
    fn move_thumb_base(&self, next: &mut Layout, base: char, chord: Chord) {
        next.assign(base, chord);
        if let Some(variant) = self.constraints.thumb_variant(base) {
            next.assign(variant, self.constraints.variant_chord(chord));
        }
    }

    fn swap(&self, c1: Chord, c2: Chord) -> Option<Layout> {
        let k1 = self.owners.get(&c1).copied();
        let k2 = self.owners.get(&c2).copied();

        let ch1 = k1.map(|(c, _)| c);
        let ch2 = k2.map(|(c, _)| c);
        if ch1 == ch2 {
            return None;
        }
        let fixed = |c: Option<char>| c.is_some_and(|c| self.constraints.is_fixed(c));
        if fixed(ch1) || fixed(ch2) {
            return None;
        }

        match (self.thumb_base(k1), self.thumb_base(k2)) {
            (Some(a), Some(b)) => {
                let mut next = self.layout.clone();
                self.move_thumb_base(&mut next, a, c2);
                self.move_thumb_base(&mut next, b, c1);
                Some(next)
            }
            (Some(base), None) => self.thumb_move(base, c1, c2, k2),
            (None, Some(base)) => self.thumb_move(base, c2, c1, k1),
            (None, None) => {
                let mut next = self.layout.clone();
                if let Some((a, slot)) = k1 {
                    next.set_slot(a, slot, c2);
                }
                if let Some((b, slot)) = k2 {
                    next.set_slot(b, slot, c1);
                }
                Some(next)
            }
        }
    }

    /// Thumb base on `from` trades places with whatever holds `to`.
    ///
    /// Refused when `to` is already a thumb-layer chord or when the variant's
    /// destination is taken.
    fn thumb_move(&self, base: char, from: Chord, to: Chord, other: Owner) -> Option<Layout> {
        if self.constraints.on_thumb_layer(to) {
            return None;
        }
        if self.owners.contains_key(&self.constraints.variant_chord(to)) {
            return None;
        }

        let mut next = self.layout.clone();
        self.move_thumb_base(&mut next, base, to);
        if let Some((ch, slot)) = other {
            next.set_slot(ch, slot, from);
        }
        Some(next)
    }
}

impl Iterator for Neighbors<'_> {
    type Item = Layout;

    fn next(&mut self) -> Option<Layout> {
        let n = self.chords.len();
        loop {
            if self.i + 1 >= n {
                return None;
            }
            if self.j >= n {
                self.i += 1;
                self.j = self.i + 1;
                continue;
            }

            let (c1, c2) = (self.chords[self.i], self.chords[self.j]);
            self.j += 1;
            if let Some(next) = self.swap(c1, c2) {
                return Some(next);
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.chords.len();
        if self.i + 1 >= n {
            return (0, Some(0));
        }
        // Pairs left in the current row, then every full row after it.
        let rest_of_row = n.saturating_sub(self.j);
        let later_rows = n - self.i - 1;
        let later = later_rows * later_rows.saturating_sub(1) / 2;
        (0, Some(rest_of_row + later))
    }
}
