// Copyright 2025 Joinkit Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Universal join properties on randomized inputs, checked against the
//! nested-loop oracle: every indexed mode must emit the same match set the
//! exhaustive scan does, and the shaping policies must be deterministic
//! functions of that set.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use joinkit::{
    by_distance, by_key, by_pred, join_indices, Cardinality, Condition, Datum, IndexPair,
    JoinOptions, Mode, Multi, PredOp, Radius,
};

fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

fn random_keys(rng: &mut StdRng, len: usize, span: i64) -> Vec<i64> {
    (0..len).map(|_| rng.gen_range(-span..=span)).collect()
}

fn pair_set(pairs: &[IndexPair]) -> Vec<IndexPair> {
    let mut sorted = pairs.to_vec();
    sorted.sort_unstable();
    sorted
}

fn run(
    left: &[i64],
    right: &[i64],
    condition: Condition<i64, i64>,
    options: JoinOptions,
) -> Vec<IndexPair> {
    join_indices(left, right, condition, options)
        .unwrap()
        .flat()
        .unwrap()
        .to_vec()
}

fn key_cond() -> Condition<i64, i64> {
    by_key(|v: &i64| *v)
}

fn pred_cond(op: PredOp) -> Condition<i64, i64> {
    by_pred(|v: &i64| *v, op, |v: &i64| *v)
}

fn dist_cond(tau: f64) -> Condition<i64, i64> {
    by_distance(
        |v: &i64| *v,
        |a: &Datum, b: &Datum| (a.as_f64().unwrap() - b.as_f64().unwrap()).abs(),
        Radius::at_most(tau),
    )
}

#[test]
fn test_mode_equivalence_for_key_conditions() {
    let mut rng = rng(11);
    for _ in 0..20 {
        let (nl, nr) = (rng.gen_range(0..40), rng.gen_range(0..40));
        let left = random_keys(&mut rng, nl, 8);
        let mut right = random_keys(&mut rng, nr, 8);

        let oracle = pair_set(&run(
            &left,
            &right,
            key_cond(),
            JoinOptions::inner().with_mode(Mode::NestedLoop),
        ));
        for mode in [Mode::Hash, Mode::Sort] {
            let got = pair_set(&run(
                &left,
                &right,
                key_cond(),
                JoinOptions::inner().with_mode(mode),
            ));
            assert_eq!(got, oracle, "mode {mode} disagrees with nested loop");
        }

        // SortChain asserts sorted input: sort the right side first and
        // compare against the oracle over the sorted side
        right.sort_unstable();
        let oracle = pair_set(&run(
            &left,
            &right,
            key_cond(),
            JoinOptions::inner().with_mode(Mode::NestedLoop),
        ));
        let chained = pair_set(&run(
            &left,
            &right,
            key_cond(),
            JoinOptions::inner().with_mode(Mode::SortChain),
        ));
        assert_eq!(chained, oracle);
    }
}

#[test]
fn test_mode_equivalence_for_ordered_predicates() {
    let mut rng = rng(23);
    let ops = [PredOp::Lt, PredOp::Le, PredOp::Eq, PredOp::Ge, PredOp::Gt];
    for _ in 0..10 {
        let (nl, nr) = (rng.gen_range(0..25), rng.gen_range(0..25));
        let left = random_keys(&mut rng, nl, 6);
        let right = random_keys(&mut rng, nr, 6);
        for op in ops {
            let oracle = pair_set(&run(
                &left,
                &right,
                pred_cond(op),
                JoinOptions::inner().with_mode(Mode::NestedLoop),
            ));
            let sorted = pair_set(&run(
                &left,
                &right,
                pred_cond(op),
                JoinOptions::inner().with_mode(Mode::Sort),
            ));
            assert_eq!(sorted, oracle, "operator {op} disagrees");
        }
    }
}

#[test]
fn test_mode_equivalence_for_distance() {
    let mut rng = rng(37);
    for _ in 0..10 {
        let (nl, nr) = (rng.gen_range(0..30), rng.gen_range(0..30));
        let left = random_keys(&mut rng, nl, 10);
        let right = random_keys(&mut rng, nr, 10);
        for tau in [0.0, 1.0, 3.5] {
            let oracle = pair_set(&run(
                &left,
                &right,
                dist_cond(tau),
                JoinOptions::inner().with_mode(Mode::NestedLoop),
            ));
            let tree = pair_set(&run(
                &left,
                &right,
                dist_cond(tau),
                JoinOptions::inner().with_mode(Mode::Tree),
            ));
            assert_eq!(tree, oracle, "radius {tau} disagrees");
        }
    }
}

#[test]
fn test_swap_symmetry() {
    let mut rng = rng(41);
    for op in [PredOp::Lt, PredOp::Le, PredOp::Eq, PredOp::Ge, PredOp::Gt] {
        let left = random_keys(&mut rng, 20, 5);
        let right = random_keys(&mut rng, 25, 5);

        let direct = pair_set(&run(&left, &right, pred_cond(op), JoinOptions::inner()));
        let swapped = run(
            &right,
            &left,
            pred_cond(op).swapped(),
            JoinOptions::inner(),
        );
        let flipped: Vec<IndexPair> = swapped.iter().map(|&(a, b)| (b, a)).collect();
        assert_eq!(pair_set(&flipped), direct, "operator {op}");
    }
}

#[test]
fn test_conjunction_is_intersection() {
    let mut rng = rng(53);
    for _ in 0..10 {
        let left = random_keys(&mut rng, 20, 4);
        let right = random_keys(&mut rng, 20, 4);

        let a = pair_set(&run(&left, &right, key_cond(), JoinOptions::inner()));
        let b = pair_set(&run(
            &left,
            &right,
            pred_cond(PredOp::Le),
            JoinOptions::inner(),
        ));
        let both = pair_set(&run(
            &left,
            &right,
            key_cond() & pred_cond(PredOp::Le),
            JoinOptions::inner(),
        ));

        let expect: Vec<IndexPair> = a.iter().filter(|p| b.contains(p)).copied().collect();
        assert_eq!(both, expect);
    }
}

#[test]
fn test_nonmatch_completeness() {
    let mut rng = rng(59);
    let left = random_keys(&mut rng, 30, 4);
    let right = random_keys(&mut rng, 30, 4);

    let pairs = run(&left, &right, key_cond(), JoinOptions::outer());
    for li in 0..left.len() {
        assert!(
            pairs.iter().any(|(l, _)| *l == Some(li)),
            "left {li} missing from outer join"
        );
    }
    for ri in 0..right.len() {
        assert!(
            pairs.iter().any(|(_, r)| *r == Some(ri)),
            "right {ri} missing from outer join"
        );
    }
}

#[test]
fn test_first_last_pick_extremes_of_all() {
    let mut rng = rng(61);
    for _ in 0..10 {
        let left = random_keys(&mut rng, 20, 3);
        let right = random_keys(&mut rng, 30, 3);

        let all = run(&left, &right, key_cond(), JoinOptions::inner());
        let first = run(
            &left,
            &right,
            key_cond(),
            JoinOptions::inner().with_multi(Multi::First),
        );
        let last = run(
            &left,
            &right,
            key_cond(),
            JoinOptions::inner().with_multi(Multi::Last),
        );

        for li in 0..left.len() {
            let matches: Vec<usize> = all
                .iter()
                .filter(|(l, _)| *l == Some(li))
                .map(|(_, r)| r.unwrap())
                .collect();
            let first_pick = first
                .iter()
                .find(|(l, _)| *l == Some(li))
                .map(|(_, r)| r.unwrap());
            let last_pick = last
                .iter()
                .find(|(l, _)| *l == Some(li))
                .map(|(_, r)| r.unwrap());
            assert_eq!(first_pick, matches.iter().min().copied());
            assert_eq!(last_pick, matches.iter().max().copied());
        }
    }
}

#[test]
fn test_closest_minimizes_distance_with_low_tie() {
    let mut rng = rng(67);
    for _ in 0..10 {
        let left = random_keys(&mut rng, 15, 6);
        let right = random_keys(&mut rng, 25, 6);
        let tau = 2.0;

        let all = run(&left, &right, dist_cond(tau), JoinOptions::inner());
        let closest = run(
            &left,
            &right,
            dist_cond(tau),
            JoinOptions::inner().with_multi(Multi::Closest),
        );

        for li in 0..left.len() {
            let matches: Vec<usize> = all
                .iter()
                .filter(|(l, _)| *l == Some(li))
                .map(|(_, r)| r.unwrap())
                .collect();
            let pick = closest
                .iter()
                .find(|(l, _)| *l == Some(li))
                .map(|(_, r)| r.unwrap());
            match pick {
                None => assert!(matches.is_empty()),
                Some(ri) => {
                    let d = |j: usize| (left[li] - right[j]).abs();
                    let best = matches.iter().map(|&j| d(j)).min().unwrap();
                    assert_eq!(d(ri), best);
                    // Ties break toward the smallest right index
                    let tied_min = matches
                        .iter()
                        .copied()
                        .filter(|&j| d(j) == best)
                        .min()
                        .unwrap();
                    assert_eq!(ri, tied_min);
                }
            }
        }
    }
}

#[test]
fn test_closest_is_mode_independent() {
    let mut rng = rng(71);
    for _ in 0..10 {
        let left = random_keys(&mut rng, 15, 5);
        let right = random_keys(&mut rng, 20, 5);

        for op in [PredOp::Lt, PredOp::Le, PredOp::Ge, PredOp::Gt] {
            let via_sort = run(
                &left,
                &right,
                pred_cond(op),
                JoinOptions::inner()
                    .with_multi(Multi::Closest)
                    .with_mode(Mode::Sort),
            );
            let via_scan = run(
                &left,
                &right,
                pred_cond(op),
                JoinOptions::inner()
                    .with_multi(Multi::Closest)
                    .with_mode(Mode::NestedLoop),
            );
            assert_eq!(via_sort, via_scan, "operator {op}");
        }
    }
}

#[test]
fn test_cardinality_passes_iff_counts_do() {
    let mut rng = rng(73);
    for _ in 0..10 {
        let left = random_keys(&mut rng, 12, 3);
        let right = random_keys(&mut rng, 12, 3);

        let all = run(&left, &right, key_cond(), JoinOptions::inner());
        let counts: Vec<usize> = (0..left.len())
            .map(|li| all.iter().filter(|(l, _)| *l == Some(li)).count())
            .collect();

        let exact_one = join_indices(
            &left,
            &right,
            key_cond(),
            JoinOptions::inner().with_cardinality(Cardinality::Exactly(1)),
        );
        assert_eq!(
            exact_one.is_ok(),
            counts.iter().all(|&c| c == 1),
            "exactly-1 verdict disagrees with counts {counts:?}"
        );

        let at_least = join_indices(
            &left,
            &right,
            key_cond(),
            JoinOptions::inner().with_cardinality(Cardinality::AtLeastOne),
        );
        assert_eq!(at_least.is_ok(), counts.iter().all(|&c| c >= 1));
    }
}

#[test]
fn test_large_input_parallel_sweep_matches_oracle() {
    // Crosses the parallel probe threshold to exercise the rayon path
    let mut rng = rng(79);
    let left = random_keys(&mut rng, 5000, 50);
    let right = random_keys(&mut rng, 1000, 50);

    let parallel = pair_set(&run(&left, &right, key_cond(), JoinOptions::inner()));
    let oracle = pair_set(&run(
        &left,
        &right,
        key_cond(),
        JoinOptions::inner().with_mode(Mode::NestedLoop),
    ));
    assert_eq!(parallel, oracle);
}
