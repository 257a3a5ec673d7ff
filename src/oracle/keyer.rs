//! Reference cost model for a one-handed chording keyer.
//!
//! The hand has four active fingers (thumb, index, middle, ring). Each finger
//! rests on a row of buttons; a chord digit `d > 0` means "press the button on
//! row `d - 1`". Typing a character moves the hand from whatever is currently
//! held to the character's chord, paying travel and press times per finger.

use super::{CostOracle, OracleError};
use crate::chord::Chord;
use crate::layout::Layout;
use std::collections::HashMap;

const ACTIVE_FINGERS: usize = 4;
const MAX_ROWS: usize = 3;

/// Rows reachable per finger, thumb first.
const ROWS: [u8; ACTIVE_FINGERS] = [3, 2, 2, 2];

/// Time to slide one row, per finger.
const TRAVEL_MS: [u32; ACTIVE_FINGERS] = [80, 100, 110, 150];

/// Time to press a button, per finger and row.
const PRESS_MS: [[u32; MAX_ROWS]; ACTIVE_FINGERS] =
    [[60, 40, 60], [50, 130, 0], [55, 140, 0], [60, 150, 0]];

#[inline]
fn fingers_in(mask: u8) -> impl Iterator<Item = usize> {
    (0..ACTIVE_FINGERS).filter(move |&f| mask & (1 << f) != 0)
}

/// Which buttons are held and where each finger rests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HandState {
    pressed: u8,
    rows: [u8; ACTIVE_FINGERS],
}

impl Default for HandState {
    /// Thumb on the middle row, everything else on the first, nothing held.
    fn default() -> Self {
        Self {
            pressed: 0,
            rows: [1, 0, 0, 0],
        }
    }
}

impl HandState {
    /// Target state for a chord. Digits past the ring finger are ignored and
    /// missing digits count as released.
    fn for_chord(chord: &Chord) -> Option<Self> {
        let mut state = Self::default();
        for (f, &d) in chord.digits().iter().take(ACTIVE_FINGERS).enumerate() {
            if d == 0 {
                continue;
            }
            if d > ROWS[f] {
                return None;
            }
            state.pressed |= 1 << f;
            state.rows[f] = d - 1;
        }
        Some(state)
    }

    #[inline]
    fn is_pressed(&self, f: usize) -> bool {
        self.pressed & (1 << f) != 0
    }

    /// Moves to `target`, returning the elapsed time in milliseconds.
    ///
    /// A character registers on a fresh press. If the hand is holding
    /// something and no held finger had to move, either a roll (release some
    /// buttons while pressing others) registers it for free, or the cheapest
    /// shared button is released and pressed again at twice its press cost.
    fn transition_to(&mut self, target: &HandState) -> u32 {
        let mut cost = 0;
        let mut re_press_needed = self.pressed != 0;

        for f in fingers_in(target.pressed) {
            let (from, to) = (self.rows[f], target.rows[f]);
            if from != to {
                if self.is_pressed(f) {
                    re_press_needed = false;
                    self.pressed &= !(1 << f);
                }
                self.rows[f] = to;
                cost += TRAVEL_MS[f] * u32::from(from.abs_diff(to));
            }
        }

        let released = self.pressed & !target.pressed;
        if re_press_needed {
            let new_press = target.pressed & !self.pressed;
            let is_roll = released != 0 && new_press != 0;
            if !is_roll {
                let cheapest = fingers_in(self.pressed & target.pressed)
                    .map(|f| (f, PRESS_MS[f][self.rows[f] as usize]))
                    .min_by_key(|&(_, ms)| ms);
                if let Some((f, ms)) = cheapest {
                    self.pressed &= !(1 << f);
                    cost += ms * 2;
                }
            }
        }

        self.pressed &= !released;
        for f in fingers_in(target.pressed & !self.pressed) {
            self.pressed |= 1 << f;
            cost += PRESS_MS[f][target.rows[f] as usize];
        }
        cost
    }
}

/// Simulates typing a key sequence and sums the transition times.
///
/// Characters without a chord reset the hand to its rest position at no cost.
/// When a character has several chords, the cheapest transition wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyerSimulator;

impl KeyerSimulator {
    pub fn new() -> Self {
        Self
    }

    fn compile(&self, layout: &Layout) -> Result<HashMap<char, Vec<HandState>>, OracleError> {
        let mut table = HashMap::with_capacity(layout.len());
        for (character, assignment) in layout.iter() {
            let states = assignment
                .chords()
                .map(|chord| {
                    HandState::for_chord(&chord)
                        .ok_or(OracleError::UnreachableChord { character, chord })
                })
                .collect::<Result<Vec<_>, _>>()?;
            table.insert(character, states);
        }
        Ok(table)
    }
}

impl CostOracle for KeyerSimulator {
    fn score(&self, layout: &Layout, keys: &str) -> Result<f64, OracleError> {
        let table = self.compile(layout)?;
        let mut hand = HandState::default();
        let mut total: u64 = 0;

        for ch in keys.chars() {
            match table.get(&ch).map(Vec::as_slice) {
                None | Some([]) => hand = HandState::default(),
                Some([only]) => total += u64::from(hand.transition_to(only)),
                Some(options) => {
                    let best = options
                        .iter()
                        .map(|target| {
                            let mut next = hand;
                            let ms = next.transition_to(target);
                            (ms, next)
                        })
                        .min_by_key(|&(ms, _)| ms);
                    if let Some((ms, next)) = best {
                        total += u64::from(ms);
                        hand = next;
                    }
                }
            }
        }

        Ok(total as f64)
    }
}
