use crate::error::{CfResult, ChordError};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// Widest hand the chord encoding supports (thumb through pinky).
pub const MAX_FINGERS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

/// A simultaneous key press: one position per finger, `0` meaning "not pressed".
///
/// Digits past `len` are always zero, so the derived `Eq`/`Hash`/`Ord` are structural.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Chord {
    digits: [u8; MAX_FINGERS],
    len: u8,
}

// Compile-time width check for `Chord::from_array`.
struct ArrayWidth<const N: usize>;

impl<const N: usize> ArrayWidth<N> {
    const CHECK: () = assert!(N >= 1 && N <= MAX_FINGERS, "chord width must be 1..=MAX_FINGERS");
}

impl Chord {
    pub fn from_digits(digits: &[u8]) -> CfResult<Self> {
        if digits.is_empty() || digits.len() > MAX_FINGERS {
            return Err(ChordError::Parse(format!(
                "chord must have 1..={} fingers, got {}",
                MAX_FINGERS,
                digits.len()
            )));
        }
        if let Some(d) = digits.iter().find(|&&d| d > 9) {
            return Err(ChordError::Parse(format!("chord digit {} out of range", d)));
        }

        let mut buf = [0u8; MAX_FINGERS];
        buf[..digits.len()].copy_from_slice(digits);
        Ok(Self {
            digits: buf,
            len: digits.len() as u8,
        })
    }

    /// Chord from a literal digit array, e.g. `Chord::from_array([2, 0, 0, 0])`.
    /// Each digit is clamped to 9. Arrays that are empty or wider than
    /// `MAX_FINGERS` are rejected at compile time.
    pub fn from_array<const N: usize>(digits: [u8; N]) -> Self {
        let () = ArrayWidth::<N>::CHECK;
        let mut buf = [0u8; MAX_FINGERS];
        for (slot, &d) in buf.iter_mut().zip(digits.iter()) {
            *slot = d.min(9);
        }
        Self {
            digits: buf,
            len: N as u8,
        }
    }

    #[inline]
    pub fn digits(&self) -> &[u8] {
        &self.digits[..self.len as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn thumb(&self) -> u8 {
        self.digits[0]
    }

    /// Everything except the thumb digit.
    #[inline]
    pub fn tail(&self) -> &[u8] {
        &self.digits()[1..]
    }

    /// True when no finger is pressed. Never true for a chord produced by enumeration.
    pub fn is_released(&self) -> bool {
        self.digits().iter().all(|&d| d == 0)
    }

    /// Same chord with the thumb digit replaced.
    pub fn with_thumb(&self, value: u8) -> Self {
        let mut out = *self;
        out.digits[0] = value;
        out
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &d in self.digits() {
            write!(f, "{}", d)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Chord(\"{}\")", self)
    }
}

impl FromStr for Chord {
    type Err = ChordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .trim()
            .chars()
            .map(|c| {
                c.to_digit(10)
                    .map(|d| d as u8)
                    .ok_or_else(|| ChordError::Parse(format!("invalid chord '{}'", s)))
            })
            .collect::<CfResult<Vec<u8>>>()?;
        Self::from_digits(&digits)
    }
}

impl TryFrom<String> for Chord {
    type Error = ChordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Chord> for String {
    fn from(chord: Chord) -> Self {
        chord.to_string()
    }
}

/// Number of keys each finger can reach, indexed thumb-first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct FingerProfile {
    counts: Vec<u8>,
}

impl FingerProfile {
    pub fn new(counts: &[u8]) -> CfResult<Self> {
        if counts.is_empty() || counts.len() > MAX_FINGERS {
            return Err(ChordError::Config(format!(
                "finger profile needs 1..={} fingers, got {}",
                MAX_FINGERS,
                counts.len()
            )));
        }
        if counts.iter().any(|&k| k > 9) {
            return Err(ChordError::Config(
                "a finger cannot reach more than 9 keys".to_string(),
            ));
        }
        Ok(Self {
            counts: counts.to_vec(),
        })
    }

    /// thumb:3, index:2, middle:2, ring:2, pinky:1
    pub fn five_finger() -> Self {
        Self {
            counts: vec![3, 2, 2, 2, 1],
        }
    }

    /// Same hand with the pinky left out (reserved for modifiers).
    pub fn four_finger() -> Self {
        Self {
            counts: vec![3, 2, 2, 2],
        }
    }

    pub fn counts(&self) -> &[u8] {
        &self.counts
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Whether `chord` is a legal press for this hand.
    pub fn admits(&self, chord: &Chord) -> bool {
        chord.len() == self.counts.len()
            && !chord.is_released()
            && chord
                .digits()
                .iter()
                .zip(&self.counts)
                .all(|(&d, &k)| d <= k)
    }

    /// Number of chords `enumerate_chords` yields for this profile.
    pub fn chord_count(&self) -> usize {
        self.counts.iter().map(|&k| k as usize + 1).product::<usize>() - 1
    }

    pub fn describe(&self) -> String {
        Finger::iter()
            .zip(&self.counts)
            .map(|(finger, k)| format!("{}:{}", finger, k))
            .join(", ")
    }
}

impl TryFrom<Vec<u8>> for FingerProfile {
    type Error = ChordError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<FingerProfile> for Vec<u8> {
    fn from(profile: FingerProfile) -> Self {
        profile.counts
    }
}

/// Every chord the hand can press: the Cartesian product of `0..=K_f` per finger,
/// minus the all-released chord.
pub fn enumerate_chords(profile: &FingerProfile) -> BTreeSet<Chord> {
    profile
        .counts()
        .iter()
        .map(|&k| 0..=k)
        .multi_cartesian_product()
        .filter(|digits| digits.iter().any(|&d| d != 0))
        .filter_map(|digits| Chord::from_digits(&digits).ok())
        .collect()
}

/// A chord shape with optional wildcards, e.g. `x222` matches `0222`..`3222`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordPattern {
    slots: Vec<Option<u8>>,
}

impl ChordPattern {
    pub fn matches(&self, chord: &Chord) -> bool {
        chord.len() == self.slots.len()
            && self
                .slots
                .iter()
                .zip(chord.digits())
                .all(|(slot, &d)| slot.map_or(true, |want| want == d))
    }
}

impl FromStr for ChordPattern {
    type Err = ChordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.chars().count() > MAX_FINGERS {
            return Err(ChordError::Parse(format!("invalid chord pattern '{}'", s)));
        }
        let slots = s
            .chars()
            .map(|c| match c {
                'x' | 'X' | '*' => Ok(None),
                _ => c
                    .to_digit(10)
                    .map(|d| Some(d as u8))
                    .ok_or_else(|| ChordError::Parse(format!("invalid chord pattern '{}'", s))),
            })
            .collect::<CfResult<Vec<_>>>()?;
        Ok(Self { slots })
    }
}

/// Chords withheld from a universe: uncomfortable presses and chords reserved
/// for system functions.
#[derive(Debug, Clone, Default)]
pub struct ExclusionList {
    patterns: Vec<ChordPattern>,
}

impl ExclusionList {
    pub fn parse<S: AsRef<str>>(patterns: &[S]) -> CfResult<Self> {
        let patterns = patterns
            .iter()
            .map(|p| p.as_ref().parse())
            .collect::<CfResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn excludes(&self, chord: &Chord) -> bool {
        self.patterns.iter().any(|p| p.matches(chord))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// An ordered, filtered chord universe with O(1) chord -> index lookup.
#[derive(Debug, Clone)]
pub struct ChordSpace {
    profile: FingerProfile,
    chords: Vec<Chord>,
    index: HashMap<Chord, usize>,
}

impl ChordSpace {
    pub fn new(profile: FingerProfile, exclusions: &ExclusionList) -> Self {
        let chords: Vec<Chord> = enumerate_chords(&profile)
            .into_iter()
            .filter(|c| !exclusions.excludes(c))
            .collect();
        let index = chords.iter().enumerate().map(|(i, &c)| (c, i)).collect();
        Self {
            profile,
            chords,
            index,
        }
    }

    pub fn full(profile: FingerProfile) -> Self {
        Self::new(profile, &ExclusionList::default())
    }

    pub fn profile(&self) -> &FingerProfile {
        &self.profile
    }

    pub fn chords(&self) -> &[Chord] {
        &self.chords
    }

    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    pub fn contains(&self, chord: &Chord) -> bool {
        self.index.contains_key(chord)
    }

    pub fn index_of(&self, chord: &Chord) -> Option<usize> {
        self.index.get(chord).copied()
    }
}
