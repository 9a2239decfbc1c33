use proptest::prelude::*;
use smallworld_core::{HnswConfig, HnswIndex, NeighborSelection, Point};
use std::collections::{HashSet, VecDeque};

/// Strategy for a small dataset of equal-dimension vectors.
fn dataset_strategy() -> impl Strategy<Value = Vec<Vec<f32>>> {
    (1usize..=4).prop_flat_map(|dim| {
        proptest::collection::vec(proptest::collection::vec(-100.0f32..100.0, dim), 1usize..=40)
    })
}

fn selection_strategy() -> impl Strategy<Value = NeighborSelection> {
    prop_oneof![
        Just(NeighborSelection::Simple),
        Just(NeighborSelection::Heuristic)
    ]
}

fn build(
    vectors: &[Vec<f32>],
    m: usize,
    seed: u64,
    selection: NeighborSelection,
    prune_overflow: bool,
) -> HnswIndex {
    let mut index = HnswIndex::new(HnswConfig {
        seed,
        ef_construction: 16,
        neighbor_selection: selection,
        prune_overflow,
        ..HnswConfig::with_max_neighbors(m)
    })
    .unwrap();
    for (i, v) in vectors.iter().enumerate() {
        let id = index.insert(Point::new(format!("p{i}"), v.clone())).unwrap();
        // A freshly inserted node never selects more than M neighbors
        for layer in 0..=index.node_layer(id).unwrap() {
            assert!(index.neighbors(id, layer).len() <= m);
            if prune_overflow {
                assert_overflow_is_bridges(&index, id, layer, m);
            }
        }
    }
    index
}

/// Whether `a` and `b` stay connected at `layer` without their direct edge.
fn connected_without_edge(index: &HnswIndex, a: u32, b: u32, layer: usize) -> bool {
    let mut seen = HashSet::from([a]);
    let mut queue = VecDeque::from([a]);
    while let Some(cur) = queue.pop_front() {
        for &nb in index.neighbors(cur, layer) {
            if cur == a && nb == b {
                continue;
            }
            if nb == b {
                return true;
            }
            if seen.insert(nb) {
                queue.push_back(nb);
            }
        }
    }
    false
}

/// Every list that just received `id` and still exceeds `m` is over only by
/// edges whose removal would disconnect their endpoints.
fn assert_overflow_is_bridges(index: &HnswIndex, id: u32, layer: usize, m: usize) {
    for &v in index.neighbors(id, layer) {
        let list = index.neighbors(v, layer);
        if list.len() <= m {
            continue;
        }
        let bridges = list
            .iter()
            .filter(|&&u| !connected_without_edge(index, v, u, layer))
            .count();
        assert!(
            bridges >= list.len() - m,
            "node {v} layer {layer}: {} neighbors but only {bridges} bridge edges",
            list.len()
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: result size is min(k, n) and results ascend by distance
    #[test]
    fn prop_result_size_and_order(
        vectors in dataset_strategy(),
        m in 1usize..=8,
        seed in any::<u64>(),
        k in 0usize..=50,
        selection in selection_strategy(),
    ) {
        let index = build(&vectors, m, seed, selection, false);
        let query = vectors[0].iter().map(|x| x + 0.5).collect::<Vec<f32>>();
        let hits = index.search(&query, k).unwrap();
        prop_assert_eq!(hits.len(), k.min(vectors.len()));
        for w in hits.windows(2) {
            prop_assert!(w[0].distance <= w[1].distance);
        }
    }

    /// Property: edges stay symmetric, lists non-empty and every layer connected after any inserts
    #[test]
    fn prop_invariants_hold(
        vectors in dataset_strategy(),
        m in 1usize..=8,
        seed in any::<u64>(),
        selection in selection_strategy(),
        prune_overflow in any::<bool>(),
    ) {
        let index = build(&vectors, m, seed, selection, prune_overflow);
        prop_assert_eq!(index.len(), vectors.len());
        let check = index.check_invariants();
        prop_assert!(check.is_ok(), "{:?}", check);
    }

    /// Property: with ef >= n the search equals the brute-force answer
    #[test]
    fn prop_full_width_search_is_exact(
        vectors in dataset_strategy(),
        m in 1usize..=8,
        seed in any::<u64>(),
        k in 1usize..=10,
        selection in selection_strategy(),
        prune_overflow in any::<bool>(),
    ) {
        let index = build(&vectors, m, seed, selection, prune_overflow);
        let query = vectors[vectors.len() / 2].iter().map(|x| x * 0.9).collect::<Vec<f32>>();
        let approx: Vec<f32> = index
            .search_with_ef(&query, k, vectors.len())
            .unwrap()
            .iter()
            .map(|h| h.distance)
            .collect();
        let exact: Vec<f32> = index
            .exact_search(&query, k)
            .unwrap()
            .iter()
            .map(|h| h.distance)
            .collect();
        prop_assert_eq!(approx, exact);
    }

    /// Property: inserts with the wrong dimension are rejected without side effects
    #[test]
    fn prop_dimension_mismatch_is_atomic(
        vectors in dataset_strategy(),
        seed in any::<u64>(),
    ) {
        let mut index = build(&vectors, 4, seed, NeighborSelection::Simple, false);
        let before = index.to_string();
        let dim = vectors[0].len();
        let wrong = vec![1.0f32; dim + 1];
        prop_assert!(index.insert(Point::new("wrong", wrong)).is_err());
        prop_assert_eq!(index.len(), vectors.len());
        prop_assert_eq!(index.to_string(), before);
    }
}
