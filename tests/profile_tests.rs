use chordforge::chord::Chord;
use chordforge::error::ChordError;
use chordforge::optimizer::{AntColony, PheromoneOptions};
use chordforge::profile::KeyerProfile;
use std::collections::HashSet;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_polish_profile_loads() {
    let profile = KeyerProfile::load_from_file("profiles/polish.json").unwrap();
    assert_eq!(profile.name, "polish");
    // Unlisted fields keep their defaults.
    assert_eq!(profile.forced.len(), 4);
    assert_eq!(profile.colony_space().unwrap().len(), 76);

    let family = profile.shared_alias.as_ref().unwrap();
    assert_eq!(family.characters.len(), 11);
    assert_eq!(family.reserved_tails.len(), 2);
}

#[test]
fn test_shared_family_members_use_distinct_tails() {
    let profile = KeyerProfile::load_from_file("profiles/polish.json").unwrap();
    let family = profile.shared_alias.clone().unwrap();
    let space = profile.colony_space().unwrap();
    let colony = AntColony::new(
        "acelnosvzdrt".chars(),
        &space,
        profile.forced.clone(),
        Some(family.clone()),
        PheromoneOptions::default(),
    );
    let reserved: HashSet<_> = family.reserved_tails.iter().copied().collect();
    let mut rng = fastrand::Rng::with_seed(21);

    for _ in 0..30 {
        let layout = colony.construct_layout(&mut rng).layout;
        let mut tails = HashSet::new();
        for &ch in &family.characters {
            if profile.forced.iter().any(|f| f.character == ch) {
                continue;
            }
            let chord = layout.primary(ch).unwrap();
            let tail = Chord::from_digits(chord.tail()).unwrap();
            assert!(family.modifier_values.contains(&chord.thumb()));
            assert!(!reserved.contains(&tail), "{:?} took reserved tail {}", ch, tail);
            assert!(tails.insert(tail), "tail {} used twice", tail);
        }
        // The shifted form of every used tail stays free.
        for tail in &tails {
            let shifted = family.member(family.shifted_value, tail).unwrap();
            assert!(layout.owners().get(&shifted).is_none());
        }
    }
}

#[test]
fn test_invalid_profiles_rejected() {
    let dir = tempdir().unwrap();

    let bad_layer = dir.path().join("layer.json");
    fs::write(&bad_layer, r#"{ "thumb_layer": 5 }"#).unwrap();
    assert!(matches!(
        KeyerProfile::load_from_file(&bad_layer),
        Err(ChordError::Config(_))
    ));

    let bad_pattern = dir.path().join("pattern.json");
    fs::write(&bad_pattern, r#"{ "colony_exclusions": ["12y4"] }"#).unwrap();
    assert!(KeyerProfile::load_from_file(&bad_pattern).is_err());

    let bad_family = dir.path().join("family.json");
    fs::write(
        &bad_family,
        r#"{ "shared_alias": { "characters": ["a"], "tails": ["010"], "modifier_values": [0, 3] } }"#,
    )
    .unwrap();
    assert!(KeyerProfile::load_from_file(&bad_family).is_err());

    let not_json = dir.path().join("broken.json");
    fs::write(&not_json, "{ thumb_layer").unwrap();
    assert!(matches!(
        KeyerProfile::load_from_file(&not_json),
        Err(ChordError::Json(_))
    ));
}
