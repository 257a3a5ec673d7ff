use chordforge::chord::{Chord, ChordSpace, FingerProfile};
use chordforge::constraints::LayoutConstraints;
use chordforge::error::ChordError;
use chordforge::layout::Layout;
use chordforge::optimizer::{
    BeamOptions, BeamSearch, Candidate, Evaluator, RoundReport, SearchObserver, SilentObserver,
    StopReason,
};
use chordforge::oracle::{CostOracle, OracleError};
use std::sync::Arc;

fn chord(s: &str) -> Chord {
    s.parse().unwrap()
}

fn layout(pairs: &[(char, &str)]) -> Layout {
    pairs.iter().map(|&(c, s)| (c, chord(s))).collect()
}

/// Cost = number of characters not on their target chord.
struct TargetOracle(Layout);

impl CostOracle for TargetOracle {
    fn score(&self, layout: &Layout, _keys: &str) -> Result<f64, OracleError> {
        Ok(self
            .0
            .iter()
            .filter(|(c, a)| layout.primary(*c) != Some(a.primary))
            .count() as f64)
    }
}

struct BrokenOracle;

impl CostOracle for BrokenOracle {
    fn score(&self, _layout: &Layout, _keys: &str) -> Result<f64, OracleError> {
        Err(OracleError::Failed("no simulator".into()))
    }
}

#[derive(Default)]
struct Recorder {
    reports: Vec<RoundReport>,
    bests: Vec<(usize, f64)>,
    stop_after: Option<usize>,
}

impl SearchObserver for Recorder {
    fn on_new_best(&mut self, round: usize, best: &Candidate) {
        self.bests.push((round, best.cost));
    }

    fn on_round(&mut self, report: &RoundReport) -> bool {
        self.reports.push(report.clone());
        self.stop_after.map_or(true, |n| self.reports.len() < n)
    }
}

fn three_finger() -> ChordSpace {
    ChordSpace::full(FingerProfile::new(&[1, 1, 1]).unwrap())
}

fn options(width: usize, iterations: usize) -> BeamOptions {
    BeamOptions {
        beam_width: width,
        max_iterations: iterations,
    }
}

#[test]
fn test_beam_solves_three_cycle() {
    let target = layout(&[('a', "001"), ('b', "010"), ('c', "100")]);
    let seed = layout(&[('a', "100"), ('b', "001"), ('c', "010")]);
    let eval = Evaluator::new(Arc::new(TargetOracle(target.clone())), "abc", 2).unwrap();
    let space = three_finger();
    let constraints = LayoutConstraints::unconstrained(1);

    let mut search = BeamSearch::new(&eval, &space, &constraints, options(64, 10), seed).unwrap();
    assert_eq!(search.best().cost, 3.0);

    let mut rec = Recorder::default();
    let outcome = search.run(&mut rec);

    assert_eq!(outcome.best.cost, 0.0);
    assert_eq!(outcome.best.layout.fingerprint(), target.fingerprint());
    assert!(outcome.iterations <= 10);
    assert!(outcome.visited > outcome.iterations);
    // One swap fixes at most one character of a 3-cycle.
    assert_eq!(rec.bests.first(), Some(&(1, 2.0)));
    assert_eq!(rec.bests.get(1), Some(&(2, 0.0)));
}

#[test]
fn test_global_best_never_increases() {
    let target = layout(&[('a', "001"), ('b', "010"), ('c', "100"), ('d', "111")]);
    let seed = layout(&[('a', "111"), ('b', "100"), ('c', "001"), ('d', "010")]);
    let eval = Evaluator::new(Arc::new(TargetOracle(target)), "abcd", 2).unwrap();
    let space = three_finger();
    let constraints = LayoutConstraints::unconstrained(1);

    let mut search = BeamSearch::new(&eval, &space, &constraints, options(2, 30), seed).unwrap();
    let mut rec = Recorder::default();
    let outcome = search.run(&mut rec);

    assert!(!rec.reports.is_empty());
    let mut last = f64::INFINITY;
    for r in &rec.reports {
        assert!(r.global_best <= last);
        assert!(r.round_best >= r.global_best);
        assert!(search.beam().len() <= 2);
        last = r.global_best;
    }
    assert_eq!(outcome.best.cost, last);
}

#[test]
fn test_all_failed_round_keeps_beam() {
    let seed = layout(&[('a', "100"), ('b', "010")]);
    let eval = Evaluator::new(Arc::new(BrokenOracle), "ab", 1).unwrap();
    let space = three_finger();
    let constraints = LayoutConstraints::unconstrained(1);

    let mut search = BeamSearch::new(&eval, &space, &constraints, options(8, 10), seed.clone()).unwrap();
    assert!(search.best().cost.is_infinite());

    let mut rec = Recorder::default();
    let outcome = search.run(&mut rec);

    // The seed stays at the head of the beam, and its neighbors are all visited
    // after the first round.
    assert_eq!(outcome.stop_reason, StopReason::Exhausted);
    assert_eq!(outcome.iterations, 1);
    assert_eq!(rec.reports[0].failed, rec.reports[0].evaluated);
    assert!(rec.bests.is_empty());
    assert_eq!(search.beam()[0].layout, seed);
}

#[test]
fn test_exhaustion_on_tiny_space() {
    let space = ChordSpace::full(FingerProfile::new(&[1, 1]).unwrap());
    let target = layout(&[('a', "11")]);
    let eval = Evaluator::new(Arc::new(TargetOracle(target)), "a", 1).unwrap();
    let constraints = LayoutConstraints::unconstrained(1);

    let mut search =
        BeamSearch::new(&eval, &space, &constraints, options(4, 100), layout(&[('a', "01")])).unwrap();
    let outcome = search.run(&mut SilentObserver);

    assert_eq!(outcome.stop_reason, StopReason::Exhausted);
    assert_eq!(outcome.visited, 3);
    assert_eq!(outcome.best.cost, 0.0);
}

#[test]
fn test_observer_can_interrupt() {
    let target = layout(&[('a', "001"), ('b', "010"), ('c', "100")]);
    let seed = layout(&[('a', "100"), ('b', "001"), ('c', "010")]);
    let eval = Evaluator::new(Arc::new(TargetOracle(target)), "abc", 1).unwrap();
    let space = three_finger();
    let constraints = LayoutConstraints::unconstrained(1);

    let mut search = BeamSearch::new(&eval, &space, &constraints, options(8, 50), seed).unwrap();
    let mut rec = Recorder {
        stop_after: Some(1),
        ..Default::default()
    };
    let outcome = search.run(&mut rec);

    assert_eq!(outcome.stop_reason, StopReason::Interrupted);
    assert_eq!(outcome.iterations, 1);
    // A checkpoint-worthy improvement is reported before the stop.
    assert_eq!(rec.bests, vec![(1, 2.0)]);
}

#[test]
fn test_round_limit() {
    let target = layout(&[('a', "001"), ('b', "010"), ('c', "100")]);
    let seed = layout(&[('a', "100"), ('b', "001"), ('c', "010")]);
    let eval = Evaluator::new(Arc::new(TargetOracle(target)), "abc", 1).unwrap();
    let space = three_finger();
    let constraints = LayoutConstraints::unconstrained(1);

    let mut search = BeamSearch::new(&eval, &space, &constraints, options(8, 1), seed).unwrap();
    let outcome = search.run(&mut SilentObserver);
    assert_eq!(outcome.stop_reason, StopReason::RoundLimit);
    assert_eq!(outcome.iterations, 1);
}

#[test]
fn test_same_seed_same_result() {
    let target = layout(&[('a', "001"), ('b', "010"), ('c', "100"), ('d', "111")]);
    let seed = layout(&[('a', "111"), ('b', "100"), ('c', "001"), ('d', "010")]);
    let eval = Evaluator::new(Arc::new(TargetOracle(target)), "abcd", 4).unwrap();
    let space = three_finger();
    let constraints = LayoutConstraints::unconstrained(1);

    let run = || {
        let mut search =
            BeamSearch::new(&eval, &space, &constraints, options(3, 6), seed.clone()).unwrap();
        let outcome = search.run(&mut SilentObserver);
        (outcome.best.layout, outcome.iterations, outcome.visited)
    };
    assert_eq!(run(), run());
}

#[test]
fn test_rejects_bad_seed_and_width() {
    let eval = Evaluator::new(Arc::new(BrokenOracle), "c", 1).unwrap();
    let space = three_finger();
    let constraints = LayoutConstraints::new(Vec::<char>::new(), [('c', 'C')], 1);

    let missing_variant = layout(&[('c', "010")]);
    let err = BeamSearch::new(&eval, &space, &constraints, options(4, 4), missing_variant)
        .err()
        .unwrap();
    assert!(matches!(err, ChordError::Validation(_)));
    assert!(err.to_string().contains("'C'"));

    let valid = layout(&[('c', "010"), ('C', "110")]);
    let err = BeamSearch::new(&eval, &space, &constraints, options(0, 4), valid)
        .err()
        .unwrap();
    assert!(matches!(err, ChordError::Config(_)));
}
