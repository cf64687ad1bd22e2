//! Native contacts and the native contact map.

use std::collections::{BTreeMap, HashSet};

use crate::frame::ResidueIndex;
use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Cluster label of a native contact. `0` marks unassigned contacts.
pub type ClusterId = u32;

/// Label carried by contacts that belong to no retained cluster.
pub const UNASSIGNED: ClusterId = 0;

/// A residue pair expected to be in contact in the folded state.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NativeContact {
    /// Lower residue index.
    pub i: ResidueIndex,
    /// Higher residue index.
    pub j: ResidueIndex,
    /// Contact-energy r^-6 coefficient, passed through unmodified.
    pub r6: f64,
    /// Contact-energy r^-12 coefficient, passed through unmodified.
    pub r12: f64,
    /// Native (reference) distance between the two residues.
    pub r: f64,
    /// Cluster label, `UNASSIGNED` until the clusterer runs.
    pub cluster: ClusterId,
}

impl NativeContact {
    /// Creates an unclustered contact.
    #[must_use]
    pub fn new(i: ResidueIndex, j: ResidueIndex, r6: f64, r12: f64, r: f64) -> Self {
        Self {
            i,
            j,
            r6,
            r12,
            r,
            cluster: UNASSIGNED,
        }
    }

    /// Sets the cluster label.
    #[must_use]
    pub fn with_cluster(mut self, cluster: ClusterId) -> Self {
        self.cluster = cluster;
        self
    }

    /// Returns the residue pair `(i, j)`.
    #[inline]
    #[must_use]
    pub fn pair(&self) -> (ResidueIndex, ResidueIndex) {
        (self.i, self.j)
    }

    /// Returns true if this contact belongs to a retained cluster.
    #[inline]
    #[must_use]
    pub fn is_clustered(&self) -> bool {
        self.cluster != UNASSIGNED
    }

    /// Native distance implied by Lennard-Jones style coefficients:
    /// `r = 10 * sqrt(6/5 * r12 / r6)`.
    #[must_use]
    pub fn native_distance_from_coefficients(r6: f64, r12: f64) -> f64 {
        10.0 * (6.0 / 5.0 * (r12 / r6)).sqrt()
    }
}

/// One raw row of a candidate contact table, before validation.
///
/// Fields are optional so that readers can report exactly which column is
/// missing; the map constructor rejects incomplete rows.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContactRow {
    /// First residue index.
    pub i: Option<ResidueIndex>,
    /// Second residue index.
    pub j: Option<ResidueIndex>,
    /// r^-6 coefficient.
    pub r6: f64,
    /// r^-12 coefficient.
    pub r12: f64,
    /// Native distance.
    pub r: Option<f64>,
}

impl ContactRow {
    /// Creates a complete row.
    #[must_use]
    pub fn new(i: ResidueIndex, j: ResidueIndex, r6: f64, r12: f64, r: f64) -> Self {
        Self {
            i: Some(i),
            j: Some(j),
            r6,
            r12,
            r: Some(r),
        }
    }
}

/// The immutable reference set of native contacts with their cluster labels.
///
/// Contacts are stored in input order and addressed by position; residue
/// pairs are unique and always satisfy `i < j`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NativeContactMap {
    contacts: Vec<NativeContact>,
}

impl NativeContactMap {
    /// Builds an unclustered map from raw rows.
    ///
    /// Rows given as `(j, i)` with `j > i` are stored as `(i, j)`.
    ///
    /// # Errors
    /// Returns `Error::Format` if a row lacks `i`, `j` or `r`, if `i == j`,
    /// if `r` is not a positive finite number, or if a pair repeats.
    /// Returns `Error::EmptyMap` if there are no rows.
    pub fn from_rows<I>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = ContactRow>,
    {
        let contacts = rows
            .into_iter()
            .enumerate()
            .map(|(line, row)| {
                let i = row
                    .i
                    .ok_or_else(|| Error::format(format!("row {line}: missing residue i")))?;
                let j = row
                    .j
                    .ok_or_else(|| Error::format(format!("row {line}: missing residue j")))?;
                let r = row
                    .r
                    .ok_or_else(|| Error::format(format!("row {line}: missing native distance r")))?;
                Ok(NativeContact::new(i.min(j), i.max(j), row.r6, row.r12, r))
            })
            .collect::<Result<Vec<_>>>()?;

        Self::from_contacts(contacts)
    }

    /// Builds a map from already-formed contacts, keeping their cluster labels.
    ///
    /// # Errors
    /// Same conditions as [`Self::from_rows`]; additionally rejects `i > j`.
    pub fn from_contacts(contacts: Vec<NativeContact>) -> Result<Self> {
        if contacts.is_empty() {
            return Err(Error::EmptyMap);
        }

        let mut seen = HashSet::with_capacity(contacts.len());
        for (idx, contact) in contacts.iter().enumerate() {
            if contact.i == contact.j {
                return Err(Error::format(format!(
                    "contact {idx}: residue {} paired with itself",
                    contact.i
                )));
            }
            if contact.i > contact.j {
                return Err(Error::format(format!(
                    "contact {idx}: pair ({}, {}) is not ordered i < j",
                    contact.i, contact.j
                )));
            }
            if !(contact.r.is_finite() && contact.r > 0.0) {
                return Err(Error::format(format!(
                    "contact ({}, {}): native distance {} must be positive",
                    contact.i, contact.j, contact.r
                )));
            }
            if !seen.insert(contact.pair()) {
                return Err(Error::format(format!(
                    "duplicate contact ({}, {})",
                    contact.i, contact.j
                )));
            }
        }

        Ok(Self { contacts })
    }

    /// Returns a copy of this map with new cluster labels, one per contact.
    ///
    /// Distance and coefficient fields are never touched; this is the only
    /// way labels change after construction.
    ///
    /// # Errors
    /// Returns `Error::Format` if `labels` does not match the contact count.
    pub fn with_clusters(&self, labels: &[ClusterId]) -> Result<Self> {
        if labels.len() != self.contacts.len() {
            return Err(Error::format(format!(
                "{} cluster labels supplied for {} contacts",
                labels.len(),
                self.contacts.len()
            )));
        }
        let contacts = self
            .contacts
            .iter()
            .zip(labels)
            .map(|(contact, &label)| contact.with_cluster(label))
            .collect();
        Ok(Self { contacts })
    }

    /// Returns the number of native contacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    /// Returns true if the map is empty. A constructed map never is.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Returns the contacts in storage order.
    #[must_use]
    pub fn contacts(&self) -> &[NativeContact] {
        &self.contacts
    }

    /// Returns the contact at `idx`.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&NativeContact> {
        self.contacts.get(idx)
    }

    /// Returns an iterator over the contacts.
    pub fn iter(&self) -> impl Iterator<Item = &NativeContact> {
        self.contacts.iter()
    }

    /// Returns the cluster labels in storage order.
    #[must_use]
    pub fn labels(&self) -> Vec<ClusterId> {
        self.contacts.iter().map(|c| c.cluster).collect()
    }

    /// Returns the size of every retained cluster, keyed by id. Cluster 0 is excluded.
    #[must_use]
    pub fn cluster_sizes(&self) -> BTreeMap<ClusterId, usize> {
        let mut sizes = BTreeMap::new();
        for contact in self.contacts.iter().filter(|c| c.is_clustered()) {
            *sizes.entry(contact.cluster).or_insert(0) += 1;
        }
        sizes
    }

    /// Returns the ids of retained clusters in ascending order.
    #[must_use]
    pub fn cluster_ids(&self) -> Vec<ClusterId> {
        self.cluster_sizes().into_keys().collect()
    }

    /// Returns the number of contacts labelled `UNASSIGNED`.
    #[must_use]
    pub fn unassigned_count(&self) -> usize {
        self.contacts.iter().filter(|c| !c.is_clustered()).count()
    }

    /// Returns the smallest `i` and largest `j` over all contacts.
    #[must_use]
    pub fn residue_range(&self) -> Option<(ResidueIndex, ResidueIndex)> {
        let min = self.contacts.iter().map(|c| c.i).min()?;
        let max = self.contacts.iter().map(|c| c.j).max()?;
        Some((min, max))
    }
}

impl<'a> IntoIterator for &'a NativeContactMap {
    type Item = &'a NativeContact;
    type IntoIter = std::slice::Iter<'a, NativeContact>;

    fn into_iter(self) -> Self::IntoIter {
        self.contacts.iter()
    }
}
