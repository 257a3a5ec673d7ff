use chordforge::chord::{enumerate_chords, ChordSpace, ExclusionList, FingerProfile};
use chordforge::Chord;
use proptest::prelude::*;
use rstest::rstest;

#[rstest]
#[case(&[3, 2], 11)]
#[case(&[1], 1)]
#[case(&[1, 1, 1], 7)]
#[case(&[3, 2, 2, 2], 107)]
#[case(&[3, 2, 2, 2, 1], 215)]
fn test_enumeration_size(#[case] counts: &[u8], #[case] expected: usize) {
    let profile = FingerProfile::new(counts).unwrap();
    assert_eq!(enumerate_chords(&profile).len(), expected);
    assert_eq!(profile.chord_count(), expected);
}

#[rstest]
#[case("x222", 4)]
#[case("3xxx", 27)]
#[case("0000", 0)]
#[case("2100", 1)]
fn test_exclusion_removes_matching_chords(#[case] pattern: &str, #[case] removed: usize) {
    let list = ExclusionList::parse(&[pattern]).unwrap();
    let space = ChordSpace::new(FingerProfile::four_finger(), &list);
    assert_eq!(space.len(), 107 - removed);
    assert!(space.chords().iter().all(|c| !list.excludes(c)));
}

#[test]
fn test_space_order_is_sorted_and_indexed() {
    let space = ChordSpace::full(FingerProfile::four_finger());
    assert!(space.chords().windows(2).all(|w| w[0] < w[1]));
    for (i, c) in space.chords().iter().enumerate() {
        assert_eq!(space.index_of(c), Some(i));
    }
}

#[test]
fn test_bad_patterns_rejected() {
    assert!(ExclusionList::parse(&["12a4"]).is_err());
    assert!(ExclusionList::parse(&["123456"]).is_err());
    assert!(FingerProfile::new(&[]).is_err());
    assert!(FingerProfile::new(&[3, 2, 2, 2, 1, 1]).is_err());
}

prop_compose! {
    fn arb_profile()(counts in proptest::collection::vec(0u8..4, 1..=5)) -> Vec<u8> {
        counts
    }
}

proptest! {
    #[test]
    fn prop_every_chord_is_pressable(counts in arb_profile()) {
        let profile = FingerProfile::new(&counts).unwrap();
        let chords = enumerate_chords(&profile);

        prop_assert_eq!(chords.len(), profile.chord_count());
        for c in &chords {
            prop_assert!(!c.is_released());
            prop_assert_eq!(c.len(), counts.len());
            for (d, k) in c.digits().iter().zip(&counts) {
                prop_assert!(d <= k);
            }
        }
    }

    #[test]
    fn prop_chord_text_roundtrip(digits in proptest::collection::vec(0u8..10, 1..=5)) {
        let chord = Chord::from_digits(&digits).unwrap();
        let back: Chord = chord.to_string().parse().unwrap();
        prop_assert_eq!(back, chord);
    }
}
