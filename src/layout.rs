use crate::chord::Chord;
use fnv::{FnvHashSet, FnvHasher};
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

/// The chords bound to one character: the primary plus any aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub primary: Chord,
    pub aliases: Vec<Chord>,
}

impl Assignment {
    pub fn new(primary: Chord) -> Self {
        Self {
            primary,
            aliases: Vec::new(),
        }
    }

    /// Primary first, then aliases in insertion order.
    pub fn chords(&self) -> impl Iterator<Item = Chord> + '_ {
        std::iter::once(self.primary).chain(self.aliases.iter().copied())
    }
}

/// Where inside an `Assignment` a chord lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Primary,
    Alias(usize),
}

/// Character -> chord(s) mapping under optimization.
///
/// Chord uniqueness across the whole layout is maintained by whoever builds the
/// layout (mutation, construction, the file loader); it is not re-checked here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    entries: BTreeMap<char, Assignment>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the primary chord, keeping any aliases already bound to `ch`.
    pub fn assign(&mut self, ch: char, chord: Chord) {
        self.entries
            .entry(ch)
            .and_modify(|a| a.primary = chord)
            .or_insert_with(|| Assignment::new(chord));
    }

    /// Binds `chord` to `ch`: as primary if `ch` is new, otherwise as an alias.
    pub fn add_chord(&mut self, ch: char, chord: Chord) {
        match self.entries.get_mut(&ch) {
            Some(a) => a.aliases.push(chord),
            None => {
                self.entries.insert(ch, Assignment::new(chord));
            }
        }
    }

    /// Overwrites one specific slot. Unknown characters and stale alias indices are ignored.
    pub fn set_slot(&mut self, ch: char, slot: Slot, chord: Chord) {
        if let Some(a) = self.entries.get_mut(&ch) {
            match slot {
                Slot::Primary => a.primary = chord,
                Slot::Alias(i) => {
                    if let Some(alias) = a.aliases.get_mut(i) {
                        *alias = chord;
                    }
                }
            }
        }
    }

    pub fn get(&self, ch: char) -> Option<&Assignment> {
        self.entries.get(&ch)
    }

    pub fn primary(&self, ch: char) -> Option<Chord> {
        self.entries.get(&ch).map(|a| a.primary)
    }

    pub fn contains(&self, ch: char) -> bool {
        self.entries.contains_key(&ch)
    }

    /// Sorted by character.
    pub fn iter(&self) -> impl Iterator<Item = (char, &Assignment)> + '_ {
        self.entries.iter().map(|(&c, a)| (c, a))
    }

    pub fn characters(&self) -> impl Iterator<Item = char> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Primaries plus aliases.
    pub fn total_chords(&self) -> usize {
        self.entries.values().map(|a| 1 + a.aliases.len()).sum()
    }

    /// Reverse index over every bound chord.
    pub fn owners(&self) -> HashMap<Chord, (char, Slot)> {
        let mut map = HashMap::with_capacity(self.total_chords());
        for (&ch, a) in &self.entries {
            map.insert(a.primary, (ch, Slot::Primary));
            for (i, &alias) in a.aliases.iter().enumerate() {
                map.insert(alias, (ch, Slot::Alias(i)));
            }
        }
        map
    }

    /// Deduplication identity: hash of the sorted `(character, primary)` pairs.
    /// Aliases do not participate.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = FnvHasher::default();
        for (&ch, a) in &self.entries {
            ch.hash(&mut hasher);
            a.primary.hash(&mut hasher);
        }
        Fingerprint(hasher.finish())
    }

    /// Human-readable form of the fingerprint input, `a:0011;b:0100;...`.
    pub fn canonical_form(&self) -> String {
        self.entries
            .iter()
            .map(|(c, a)| format!("{}:{};", c, a.primary))
            .collect()
    }
}

impl FromIterator<(char, Chord)> for Layout {
    fn from_iter<I: IntoIterator<Item = (char, Chord)>>(iter: I) -> Self {
        let mut layout = Layout::new();
        for (c, chord) in iter {
            layout.assign(c, chord);
        }
        layout
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u64);

/// Every layout state the search has already produced. Only grows.
#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: FnvHashSet<Fingerprint>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the fingerprint was not seen before.
    pub fn insert(&mut self, fp: Fingerprint) -> bool {
        self.seen.insert(fp)
    }

    pub fn contains(&self, fp: &Fingerprint) -> bool {
        self.seen.contains(fp)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chord(s: &str) -> Chord {
        s.parse().unwrap()
    }

    #[test]
    fn test_fingerprint_ignores_aliases_and_insert_order() {
        let mut a = Layout::new();
        a.assign('a', chord("0011"));
        a.assign('b', chord("0100"));

        let mut b = Layout::new();
        b.assign('b', chord("0100"));
        b.assign('a', chord("0011"));
        b.add_chord('a', chord("1111"));

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.canonical_form(), "a:0011;b:0100;");
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_changes_on_swap() {
        let a: Layout = [('a', chord("0011")), ('b', chord("0100"))]
            .into_iter()
            .collect();
        let b: Layout = [('a', chord("0100")), ('b', chord("0011"))]
            .into_iter()
            .collect();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_add_chord_then_owners() {
        let mut l = Layout::new();
        l.add_chord('e', chord("0100"));
        l.add_chord('e', chord("0200"));
        l.add_chord('t', chord("0010"));

        assert_eq!(l.primary('e'), Some(chord("0100")));
        assert_eq!(l.total_chords(), 3);

        let owners = l.owners();
        assert_eq!(owners[&chord("0200")], ('e', Slot::Alias(0)));
        assert_eq!(owners[&chord("0010")], ('t', Slot::Primary));

        l.set_slot('e', Slot::Alias(0), chord("0020"));
        let e: Vec<Chord> = l.get('e').unwrap().chords().collect();
        assert_eq!(e, vec![chord("0100"), chord("0020")]);
    }

    #[test]
    fn test_visited_set_only_grows() {
        let mut v = VisitedSet::new();
        let l: Layout = [('a', chord("0011"))].into_iter().collect();
        assert!(v.insert(l.fingerprint()));
        assert!(!v.insert(l.fingerprint()));
        assert_eq!(v.len(), 1);
    }
}
