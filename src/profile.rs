//! Hardware and policy description of a chording keyer: which chords exist,
//! which are withheld, and which characters are pinned or paired.

use crate::chord::{Chord, ChordSpace, ExclusionList, FingerProfile};
use crate::constraints::LayoutConstraints;
use crate::error::{CfResult, ChordError};
use crate::optimizer::pheromone::SharedAliasFamily;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// A character whose chord is decided up front and never searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForcedChord {
    pub character: char,
    pub chord: Chord,
}

/// A base character and the character produced by the same chord on the thumb layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbPair {
    pub base: char,
    pub variant: char,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyerProfile {
    pub name: String,
    /// Full hand, pinky included.
    pub generation_fingers: FingerProfile,
    /// Universe walked by the mutation operator.
    pub search_fingers: FingerProfile,
    /// Universe sampled by the ant colony.
    pub colony_fingers: FingerProfile,
    /// Thumb digit that turns a base chord into its variant.
    pub thumb_layer: u8,
    pub search_exclusions: Vec<String>,
    pub colony_exclusions: Vec<String>,
    pub forced: Vec<ForcedChord>,
    pub fixed_characters: Vec<char>,
    pub thumb_alternatives: Vec<ThumbPair>,
    pub shared_alias: Option<SharedAliasFamily>,
}

impl Default for KeyerProfile {
    fn default() -> Self {
        let pair = |base, variant| ThumbPair { base, variant };
        let forced = |character, digits: [u8; 4]| ForcedChord {
            character,
            chord: Chord::from_array(digits),
        };

        // Chords that tip the keyer in the hand, then chords bound to system functions.
        let mut colony_exclusions: Vec<String> = ["x222", "x220", "x022", "x202", "x212"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        colony_exclusions.extend(
            [
                "3100", "3200", "3101", "3201", "3011", "3021", "3121", "3211", "3102", "3012",
                "3000",
            ]
            .iter()
            .map(|s| s.to_string()),
        );

        Self {
            name: "default".to_string(),
            generation_fingers: FingerProfile::five_finger(),
            search_fingers: FingerProfile::four_finger(),
            colony_fingers: FingerProfile::four_finger(),
            thumb_layer: 3,
            search_exclusions: Vec::new(),
            colony_exclusions,
            forced: vec![
                forced(' ', [2, 0, 0, 0]),
                forced('\x08', [1, 0, 0, 0]),
                forced('\n', [2, 1, 0, 0]),
                forced('\t', [2, 2, 0, 0]),
            ],
            fixed_characters: vec![
                'D', 'F', 'I', 'J', 'K', 'M', 'H', 'Q', 'G', 'P', 'R', '\x08',
            ],
            thumb_alternatives: vec![
                pair('\t', 'U'),
                pair('c', 'C'),
                pair('v', 'V'),
                pair('x', 'X'),
                pair('z', 'Z'),
                pair('\n', 'B'),
            ],
            shared_alias: None,
        }
    }
}

impl KeyerProfile {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> CfResult<Self> {
        let content = fs::read_to_string(path)?;
        let profile: KeyerProfile = serde_json::from_str(&content)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> CfResult<()> {
        for fingers in [&self.search_fingers, &self.colony_fingers] {
            let thumb_keys = fingers.counts().first().copied().unwrap_or(0);
            if self.thumb_layer == 0 || self.thumb_layer > thumb_keys {
                return Err(ChordError::Config(format!(
                    "thumb_layer {} is outside the thumb range of [{}]",
                    self.thumb_layer,
                    fingers.describe()
                )));
            }
        }

        ExclusionList::parse(&self.search_exclusions)?;
        ExclusionList::parse(&self.colony_exclusions)?;

        let mut chars = HashSet::new();
        let mut chords = HashSet::new();
        for f in &self.forced {
            if !chars.insert(f.character) {
                return Err(ChordError::Config(format!(
                    "{:?} is forced more than once",
                    f.character
                )));
            }
            if !chords.insert(f.chord) {
                return Err(ChordError::Config(format!(
                    "chord {} is forced onto two characters",
                    f.chord
                )));
            }
        }

        let bases: HashSet<char> = self.thumb_alternatives.iter().map(|p| p.base).collect();
        for p in &self.thumb_alternatives {
            if p.base == p.variant || bases.contains(&p.variant) {
                return Err(ChordError::Config(format!(
                    "thumb variant {:?} of {:?} cannot itself be a base",
                    p.variant, p.base
                )));
            }
        }

        if let Some(family) = &self.shared_alias {
            family.validate()?;
        }
        Ok(())
    }

    pub fn generation_space(&self) -> ChordSpace {
        ChordSpace::full(self.generation_fingers.clone())
    }

    pub fn search_space(&self) -> CfResult<ChordSpace> {
        let exclusions = ExclusionList::parse(&self.search_exclusions)?;
        Ok(ChordSpace::new(self.search_fingers.clone(), &exclusions))
    }

    pub fn colony_space(&self) -> CfResult<ChordSpace> {
        let exclusions = ExclusionList::parse(&self.colony_exclusions)?;
        Ok(ChordSpace::new(self.colony_fingers.clone(), &exclusions))
    }

    pub fn constraints(&self) -> LayoutConstraints {
        LayoutConstraints::new(
            self.fixed_characters.iter().copied(),
            self.thumb_alternatives.iter().map(|p| (p.base, p.variant)),
            self.thumb_layer,
        )
    }
}
