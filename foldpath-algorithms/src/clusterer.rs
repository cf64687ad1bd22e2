//! Adjacency-constrained contact clustering.
//!
//! Contacts whose residue pairs are diagonal neighbours in contact-index
//! space (`|i1-i2| <= 1` and `|j1-j2| <= 1`) are joined with a union-find.
//! Surplus components are merged into their nearest neighbour until the
//! target count is reached, then undersized groups are dropped to cluster 0.
use std::collections::HashMap;

use foldpath_core::{
    ClusterId, ClustererConfig, NativeContact, NativeContactMap, ResidueIndex, Result, UNASSIGNED,
};
use log::{debug, info};

/// Union-Find data structure for connected component detection.
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Path compression
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    fn union(&mut self, x: usize, y: usize) {
        let px = self.find(x);
        let py = self.find(y);

        if px == py {
            return;
        }

        match self.rank[px].cmp(&self.rank[py]) {
            std::cmp::Ordering::Less => self.parent[px] = py,
            std::cmp::Ordering::Greater => self.parent[py] = px,
            std::cmp::Ordering::Equal => {
                self.parent[py] = px;
                self.rank[px] += 1;
            }
        }
    }
}

/// Sparse `(i, j) -> contact index` lookup, sized by the number of contacts.
struct ContactGrid {
    slots: HashMap<(ResidueIndex, ResidueIndex), usize>,
}

impl ContactGrid {
    fn build(contacts: &[NativeContact]) -> Self {
        let slots = contacts
            .iter()
            .enumerate()
            .map(|(idx, contact)| (contact.pair(), idx))
            .collect();
        Self { slots }
    }

    fn get(&self, i: i64, j: i64) -> Option<usize> {
        let i = ResidueIndex::try_from(i).ok()?;
        let j = ResidueIndex::try_from(j).ok()?;
        self.slots.get(&(i, j)).copied()
    }
}

/// A group of contacts under construction.
#[derive(Debug, Clone)]
struct Group {
    members: Vec<usize>,
    /// Lexicographically smallest `(i, j)` among the members.
    anchor: (ResidueIndex, ResidueIndex),
}

impl Group {
    fn order_key(&self) -> (usize, (ResidueIndex, ResidueIndex)) {
        (self.members.len(), self.anchor)
    }
}

/// Chebyshev distance between two contacts in contact-index space.
#[inline]
fn contact_distance(a: &NativeContact, b: &NativeContact) -> u32 {
    a.i.abs_diff(b.i).max(a.j.abs_diff(b.j))
}

/// Groups native contacts into at most K adjacency-connected clusters.
#[derive(Debug, Clone)]
pub struct ContactClusterer {
    config: ClustererConfig,
}

impl ContactClusterer {
    /// Creates a clusterer.
    ///
    /// # Errors
    /// Returns `Error::Configuration` if K or S is 0.
    pub fn new(config: ClustererConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the clustering configuration.
    #[must_use]
    pub fn config(&self) -> &ClustererConfig {
        &self.config
    }

    /// Returns a copy of `map` with cluster labels assigned.
    ///
    /// Existing labels are ignored, so re-clustering a clustered map with the
    /// same configuration reproduces the same labels.
    ///
    /// # Errors
    /// Propagates label/contact count mismatches from the map (never expected).
    pub fn cluster(&self, map: &NativeContactMap) -> Result<NativeContactMap> {
        let labels = self.labels(map);
        map.with_clusters(&labels)
    }

    /// Computes one cluster label per contact, in map order.
    #[must_use]
    pub fn labels(&self, map: &NativeContactMap) -> Vec<ClusterId> {
        let contacts = map.contacts();
        let mut groups = connected_groups(contacts);
        let components = groups.len();

        while groups.len() > self.config.cluster_count {
            merge_smallest(&mut groups, contacts);
        }
        if components > groups.len() {
            debug!(
                "merged {} adjacency components down to {} groups",
                components,
                groups.len()
            );
        }

        let mut retained: Vec<Group> = groups
            .into_iter()
            .filter(|group| group.members.len() >= self.config.min_cluster_size)
            .collect();
        retained.sort_by_key(|group| group.anchor);

        let mut labels = vec![UNASSIGNED; contacts.len()];
        for (label, group) in (1..).zip(&retained) {
            for &member in &group.members {
                labels[member] = label;
            }
        }

        let unassigned = labels.iter().filter(|&&l| l == UNASSIGNED).count();
        info!(
            "clustered {} contacts into {} clusters ({} unassigned, {} components)",
            contacts.len(),
            retained.len(),
            unassigned,
            components
        );
        labels
    }
}

/// Connected components of the diagonal-neighbour adjacency relation.
fn connected_groups(contacts: &[NativeContact]) -> Vec<Group> {
    if contacts.is_empty() {
        return Vec::new();
    }

    let grid = ContactGrid::build(contacts);
    let mut uf = UnionFind::new(contacts.len());

    for (idx, contact) in contacts.iter().enumerate() {
        let (i, j) = (i64::from(contact.i), i64::from(contact.j));
        for di in -1..=1 {
            for dj in -1..=1 {
                if di == 0 && dj == 0 {
                    continue;
                }
                if let Some(neighbor) = grid.get(i + di, j + dj) {
                    uf.union(idx, neighbor);
                }
            }
        }
    }

    // Group contacts by their root, in order of first appearance
    let mut root_to_group: HashMap<usize, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();
    for (idx, contact) in contacts.iter().enumerate() {
        let root = uf.find(idx);
        let slot = *root_to_group.entry(root).or_insert_with(|| {
            groups.push(Group {
                members: Vec::new(),
                anchor: contact.pair(),
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.members.push(idx);
        group.anchor = group.anchor.min(contact.pair());
    }

    groups.sort_by_key(|group| group.anchor);
    groups
}

/// Merges the smallest group into its nearest neighbour.
///
/// Smallest means fewest members, then smallest anchor. Nearest means the
/// smallest Chebyshev distance between any pair of members, then smallest anchor.
fn merge_smallest(groups: &mut Vec<Group>, contacts: &[NativeContact]) {
    let Some(smallest) = (0..groups.len()).min_by_key(|&g| groups[g].order_key()) else {
        return;
    };

    let nearest = (0..groups.len())
        .filter(|&g| g != smallest)
        .min_by_key(|&g| {
            let distance = groups[smallest]
                .members
                .iter()
                .flat_map(|&a| {
                    groups[g]
                        .members
                        .iter()
                        .map(move |&b| contact_distance(&contacts[a], &contacts[b]))
                })
                .min()
                .unwrap_or(u32::MAX);
            (distance, groups[g].anchor)
        });

    let Some(nearest) = nearest else {
        return;
    };

    let absorbed = groups.swap_remove(smallest);
    // swap_remove moved the last group into `smallest`
    let target = if nearest == groups.len() {
        smallest
    } else {
        nearest
    };
    debug!(
        "merging group at {:?} ({} contacts) into group at {:?}",
        absorbed.anchor,
        absorbed.members.len(),
        groups[target].anchor
    );
    let group = &mut groups[target];
    group.members.extend(absorbed.members);
    group.members.sort_unstable();
    group.anchor = group.anchor.min(absorbed.anchor);
}

#[cfg(test)]
mod tests {
    use super::*;
    use foldpath_core::{ContactRow, Error};

    fn map_from_pairs(pairs: &[(u32, u32)]) -> NativeContactMap {
        NativeContactMap::from_rows(
            pairs
                .iter()
                .map(|&(i, j)| ContactRow::new(i, j, 1.0, 1.0, 5.0)),
        )
        .unwrap()
    }

    fn clusterer(k: usize, s: usize) -> ContactClusterer {
        ContactClusterer::new(
            ClustererConfig::new()
                .with_cluster_count(k)
                .with_min_cluster_size(s),
        )
        .unwrap()
    }

    #[test]
    fn test_union_find() {
        let mut uf = UnionFind::new(5);
        uf.union(0, 1);
        uf.union(2, 3);
        uf.union(1, 2);

        assert_eq!(uf.find(0), uf.find(3));
        assert_ne!(uf.find(0), uf.find(4));
    }

    #[test]
    fn test_contact_grid_lookup() {
        let map = map_from_pairs(&[(2, 10), (3, 11), (7, 20)]);
        let grid = ContactGrid::build(map.contacts());
        assert_eq!(grid.get(3, 11), Some(1));
        assert_eq!(grid.get(3, 10), None);
        assert_eq!(grid.get(1, 10), None);
        assert_eq!(grid.get(100, 100), None);
        assert_eq!(grid.get(-1, 10), None);
    }

    #[test]
    fn test_far_apart_contacts() {
        let far = 4_000_000_000;
        let map = map_from_pairs(&[(0, 1), (far, far + 1), (far + 1, far + 2)]);
        let grid = ContactGrid::build(map.contacts());
        assert_eq!(grid.get(i64::from(far) + 1, i64::from(far) + 2), Some(2));
        assert_eq!(grid.get(i64::from(far) + 2, i64::from(far) + 3), None);

        let labels = clusterer(2, 1).labels(&map);
        assert_eq!(labels, vec![1, 2, 2]);
    }

    #[test]
    fn test_invalid_config() {
        let err = ContactClusterer::new(ClustererConfig::new().with_cluster_count(0)).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_diagonal_and_orthogonal_adjacency() {
        // Diagonal run (helix-like) and an orthogonal step join one group
        let map = map_from_pairs(&[(1, 10), (2, 11), (3, 12), (3, 13), (30, 40)]);
        let labels = clusterer(10, 1).labels(&map);
        assert_eq!(labels, vec![1, 1, 1, 1, 2]);
    }

    #[test]
    fn test_relabel_by_minimum_residue() {
        let map = map_from_pairs(&[(30, 40), (31, 41), (1, 10), (2, 11)]);
        let labels = clusterer(10, 1).labels(&map);
        assert_eq!(labels, vec![2, 2, 1, 1]);
    }

    #[test]
    fn test_size_filter_sets_unassigned() {
        let map = map_from_pairs(&[(1, 10), (2, 11), (3, 12), (30, 40)]);
        let labels = clusterer(10, 2).labels(&map);
        assert_eq!(labels, vec![1, 1, 1, UNASSIGNED]);
    }

    #[test]
    fn test_min_size_above_total_unassigns_everything() {
        let map = map_from_pairs(&[(1, 10), (2, 11)]);
        let clustered = clusterer(3, 5).cluster(&map).unwrap();
        assert!(clustered.iter().all(|c| c.cluster == UNASSIGNED));
        assert!(clustered.cluster_ids().is_empty());
    }

    #[test]
    fn test_merge_to_target_count() {
        // Three components: A (3 contacts), B (1 contact near A), C (2 contacts far away)
        let map = map_from_pairs(&[
            (1, 10),
            (2, 11),
            (3, 12),
            (5, 14),
            (50, 60),
            (51, 61),
        ]);
        let labels = clusterer(2, 1).labels(&map);
        // B merges into A, its nearest neighbour
        assert_eq!(labels, vec![1, 1, 1, 1, 2, 2]);
    }

    #[test]
    fn test_fewer_components_than_target() {
        let map = map_from_pairs(&[(1, 10), (2, 11), (40, 50)]);
        let clustered = clusterer(5, 1).cluster(&map).unwrap();
        assert_eq!(clustered.cluster_ids(), vec![1, 2]);
    }

    #[test]
    fn test_single_target_merges_everything() {
        let map = map_from_pairs(&[(1, 10), (20, 30), (40, 50)]);
        let labels = clusterer(1, 1).labels(&map);
        assert_eq!(labels, vec![1, 1, 1]);
    }

    #[test]
    fn test_idempotent() {
        let map = map_from_pairs(&[
            (1, 10),
            (2, 11),
            (3, 12),
            (5, 14),
            (50, 60),
            (51, 61),
            (80, 90),
        ]);
        let algo = clusterer(2, 2);
        let first = algo.cluster(&map).unwrap();
        let second = algo.cluster(&first).unwrap();
        assert_eq!(first.labels(), second.labels());
    }
}
