use crate::chord::Chord;
use crate::layout::Layout;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("chord {chord} is bound to both {first:?} and {second:?}")]
    DuplicateChord {
        chord: Chord,
        first: char,
        second: char,
    },

    #[error("thumb variant {variant:?} of {base:?} should be {expected}, found {found:?}")]
    ThumbVariantMismatch {
        base: char,
        variant: char,
        expected: Chord,
        found: Option<Chord>,
    },
}

/// Structural rules every searched layout obeys: immovable characters and
/// base/thumb-variant pairs that move together.
#[derive(Debug, Clone)]
pub struct LayoutConstraints {
    fixed: BTreeSet<char>,
    thumb_pairs: BTreeMap<char, char>,
    thumb_layer: u8,
}

impl LayoutConstraints {
    /// Thumb variants are always fixed: they only move through their base.
    pub fn new<F, P>(fixed: F, thumb_pairs: P, thumb_layer: u8) -> Self
    where
        F: IntoIterator<Item = char>,
        P: IntoIterator<Item = (char, char)>,
    {
        let thumb_pairs: BTreeMap<char, char> = thumb_pairs.into_iter().collect();
        let mut fixed: BTreeSet<char> = fixed.into_iter().collect();
        fixed.extend(thumb_pairs.values().copied());
        Self {
            fixed,
            thumb_pairs,
            thumb_layer,
        }
    }

    pub fn unconstrained(thumb_layer: u8) -> Self {
        Self::new(std::iter::empty::<char>(), std::iter::empty(), thumb_layer)
    }

    #[inline]
    pub fn is_fixed(&self, ch: char) -> bool {
        self.fixed.contains(&ch)
    }

    #[inline]
    pub fn is_thumb_base(&self, ch: char) -> bool {
        self.thumb_pairs.contains_key(&ch)
    }

    pub fn thumb_variant(&self, base: char) -> Option<char> {
        self.thumb_pairs.get(&base).copied()
    }

    pub fn thumb_layer(&self) -> u8 {
        self.thumb_layer
    }

    pub fn fixed(&self) -> impl Iterator<Item = char> + '_ {
        self.fixed.iter().copied()
    }

    pub fn thumb_pairs(&self) -> impl Iterator<Item = (char, char)> + '_ {
        self.thumb_pairs.iter().map(|(&b, &v)| (b, v))
    }

    /// The chord a variant must hold when its base holds `base`.
    #[inline]
    pub fn variant_chord(&self, base: Chord) -> Chord {
        base.with_thumb(self.thumb_layer)
    }

    #[inline]
    pub fn on_thumb_layer(&self, chord: Chord) -> bool {
        chord.thumb() == self.thumb_layer
    }

    /// Recomputes every variant whose base is present in `layout`.
    pub fn apply_thumb_variants(&self, layout: &mut Layout) {
        for (&base, &variant) in &self.thumb_pairs {
            if let Some(chord) = layout.primary(base) {
                layout.assign(variant, self.variant_chord(chord));
            }
        }
    }

    pub fn violations(&self, layout: &Layout) -> Vec<Violation> {
        let mut out = Vec::new();

        let mut seen: HashMap<Chord, char> = HashMap::new();
        for (ch, a) in layout.iter() {
            for chord in a.chords() {
                if let Some(&first) = seen.get(&chord) {
                    out.push(Violation::DuplicateChord {
                        chord,
                        first,
                        second: ch,
                    });
                } else {
                    seen.insert(chord, ch);
                }
            }
        }

        for (&base, &variant) in &self.thumb_pairs {
            if let Some(chord) = layout.primary(base) {
                let expected = self.variant_chord(chord);
                let found = layout.primary(variant);
                if found != Some(expected) {
                    out.push(Violation::ThumbVariantMismatch {
                        base,
                        variant,
                        expected,
                        found,
                    });
                }
            }
        }

        out
    }
}
