use std::collections::{BTreeMap, HashSet};

use foldpath_algorithms::ContactClusterer;
use foldpath_core::{ClustererConfig, ContactRow, NativeContactMap, UNASSIGNED};

/// Deterministic pseudo-random contact map (linear congruential generator).
fn generate_map(seed: u64, count: usize) -> NativeContactMap {
    let mut state = seed;
    let mut next = move || {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (state >> 33) as u32
    };

    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    while rows.len() < count {
        let i = next() % 80;
        let j = i + 3 + next() % 40;
        if seen.insert((i, j)) {
            rows.push(ContactRow::new(i, j, 1.0, 1.0, 5.0));
        }
    }
    NativeContactMap::from_rows(rows).unwrap()
}

fn check(map: &NativeContactMap, k: usize, s: usize) {
    let clusterer = ContactClusterer::new(
        ClustererConfig::new()
            .with_cluster_count(k)
            .with_min_cluster_size(s),
    )
    .unwrap();
    let clustered = clusterer.cluster(map).unwrap();
    let sizes = clustered.cluster_sizes();

    assert!(sizes.len() <= k, "{} clusters exceed K={k}", sizes.len());
    assert!(sizes.values().all(|&size| size >= s));

    // Labels are contiguous from 1
    let ids: Vec<u32> = sizes.keys().copied().collect();
    let expected: Vec<u32> = (1..=ids.len() as u32).collect();
    assert_eq!(ids, expected);

    // Ids ascend with each cluster's smallest (i, j)
    let mut anchors: BTreeMap<u32, (u32, u32)> = BTreeMap::new();
    for contact in clustered.iter().filter(|c| c.cluster != UNASSIGNED) {
        let anchor = anchors.entry(contact.cluster).or_insert(contact.pair());
        *anchor = (*anchor).min(contact.pair());
    }
    let ordered: Vec<(u32, u32)> = anchors.values().copied().collect();
    assert!(ordered.windows(2).all(|w| w[0] < w[1]));

    // Geometry is untouched
    for (before, after) in map.iter().zip(clustered.iter()) {
        assert_eq!(before.pair(), after.pair());
        assert_eq!(before.r.to_bits(), after.r.to_bits());
    }

    // Re-clustering is stable
    assert_eq!(clusterer.cluster(&clustered).unwrap(), clustered);
}

#[test]
fn test_cluster_invariants_over_generated_maps() {
    for seed in 1..=12 {
        let map = generate_map(seed, 120);
        for &(k, s) in &[(1, 1), (3, 2), (10, 5), (25, 1), (40, 200)] {
            check(&map, k, s);
        }
    }
}

#[test]
fn test_large_min_size_leaves_all_unassigned() {
    let map = generate_map(7, 50);
    let clusterer = ContactClusterer::new(
        ClustererConfig::new()
            .with_cluster_count(4)
            .with_min_cluster_size(51),
    )
    .unwrap();
    let clustered = clusterer.cluster(&map).unwrap();
    assert_eq!(clustered.unassigned_count(), 50);
}
