//! Merge rule management for BPE.
//!
//! This module provides the ordered merge table and the single-pass pair
//! replacement shared by training and encoding. Merge rules are stored using
//! token IDs rather than byte strings for fast comparison.

use crate::error::{Result, TokenizerError};
use ahash::AHashMap;

/// A pair of token IDs that can be merged.
pub type Pair = (u32, u32);

/// Number of raw byte tokens. IDs below this value always denote a single byte.
pub const BYTE_VOCAB_SIZE: u32 = 256;

/// Ordered BPE merge table: `(left, right) -> new_id`.
///
/// New IDs are strictly increasing in insertion order and every operand
/// must be a raw byte or an ID produced by an earlier rule. A lower ID means
/// the rule was learned earlier and has higher priority during encoding.
#[derive(Debug, Clone, Default)]
pub struct MergeTable {
    /// Rules in insertion order
    order: Vec<(Pair, u32)>,
    /// Pair -> new_id lookup
    ranks: AHashMap<Pair, u32>,
}

impl MergeTable {
    /// Create a new empty merge table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new merge table with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            order: Vec::with_capacity(capacity),
            ranks: AHashMap::with_capacity(capacity),
        }
    }

    /// Build a table from pairs listed in learning order, assigning IDs
    /// `256, 257, ...`.
    pub fn from_pairs(pairs: impl IntoIterator<Item = Pair>) -> Result<Self> {
        let mut table = Self::new();
        for (index, pair) in pairs.into_iter().enumerate() {
            table.add_merge(pair, BYTE_VOCAB_SIZE + index as u32)?;
        }
        Ok(table)
    }

    /// Add a merge rule.
    ///
    /// # Arguments
    /// * `pair` - The pair of token IDs to merge
    /// * `new_id` - The ID of the token created by this merge
    pub fn add_merge(&mut self, pair: Pair, new_id: u32) -> Result<()> {
        if new_id < BYTE_VOCAB_SIZE {
            return Err(TokenizerError::InvalidMerge(format!(
                "merge {:?} -> {} uses an id reserved for raw bytes",
                pair, new_id
            )));
        }
        if let Some(last) = self.max_id() {
            if new_id <= last {
                return Err(TokenizerError::InvalidMerge(format!(
                    "merge {:?} -> {} is not after the previous id {}",
                    pair, new_id, last
                )));
            }
        }
        for operand in [pair.0, pair.1] {
            if !self.is_known(operand) {
                return Err(TokenizerError::InvalidMerge(format!(
                    "merge {:?} -> {} references unknown token {}",
                    pair, new_id, operand
                )));
            }
        }
        if self.ranks.contains_key(&pair) {
            return Err(TokenizerError::InvalidMerge(format!(
                "pair {:?} is already merged",
                pair
            )));
        }

        self.ranks.insert(pair, new_id);
        self.order.push((pair, new_id));
        Ok(())
    }

    /// Get the ID produced by merging `pair`, if it is a rule.
    #[inline]
    pub fn get(&self, pair: Pair) -> Option<u32> {
        self.ranks.get(&pair).copied()
    }

    /// Whether `id` is a raw byte or produced by one of the rules.
    pub fn is_known(&self, id: u32) -> bool {
        id < BYTE_VOCAB_SIZE || self.contains_id(id)
    }

    /// Whether `id` is produced by one of the rules.
    pub fn contains_id(&self, id: u32) -> bool {
        self.order
            .binary_search_by_key(&id, |&(_, new_id)| new_id)
            .is_ok()
    }

    /// Largest ID produced so far.
    #[inline]
    pub fn max_id(&self) -> Option<u32> {
        self.order.last().map(|&(_, id)| id)
    }

    /// Iterate rules in insertion (learning) order.
    pub fn iter(&self) -> impl Iterator<Item = (Pair, u32)> + '_ {
        self.order.iter().copied()
    }

    /// Get the number of merge rules.
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if there are no merge rules.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl PartialEq for MergeTable {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order
    }
}

impl Eq for MergeTable {}

/// Replace every non-overlapping occurrence of `pair` with `new_id` in one
/// left-to-right pass. A token consumed by a replacement never starts the
/// next candidate pair.
pub fn merge_pair(ids: &[u32], pair: Pair, new_id: u32) -> Vec<u32> {
    let mut merged = Vec::with_capacity(ids.len());
    let mut i = 0;

    while i < ids.len() {
        if i + 1 < ids.len() && ids[i] == pair.0 && ids[i + 1] == pair.1 {
            merged.push(new_id);
            i += 2;
        } else {
            merged.push(ids[i]);
            i += 1;
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_merge() {
        let mut rules = MergeTable::new();
        rules.add_merge((97, 97), 256).unwrap();
        rules.add_merge((256, 98), 257).unwrap();

        assert_eq!(rules.get((97, 97)), Some(256));
        assert_eq!(rules.get((256, 98)), Some(257));
        assert_eq!(rules.get((98, 99)), None);
        assert_eq!(rules.max_id(), Some(257));
    }

    #[test]
    fn test_rejects_forward_reference() {
        let mut rules = MergeTable::new();
        let err = rules.add_merge((97, 300), 256).unwrap_err();
        assert!(matches!(err, TokenizerError::InvalidMerge(_)));
    }

    #[test]
    fn test_rejects_non_increasing_ids() {
        let mut rules = MergeTable::new();
        rules.add_merge((97, 97), 300).unwrap();
        assert!(rules.add_merge((98, 98), 300).is_err());
        assert!(rules.add_merge((98, 98), 299).is_err());
        assert!(rules.add_merge((98, 98), 12).is_err());
    }

    #[test]
    fn test_sparse_ids_are_known() {
        let mut rules = MergeTable::new();
        rules.add_merge((1, 2), 400).unwrap();
        rules.add_merge((400, 3), 1000).unwrap();

        assert!(rules.is_known(255));
        assert!(rules.is_known(400));
        assert!(rules.is_known(1000));
        assert!(!rules.is_known(256));
        assert!(!rules.is_known(999));
    }

    #[test]
    fn test_from_pairs() {
        let rules = MergeTable::from_pairs(vec![(0, 1), (256, 2), (257, 3)]).unwrap();

        assert_eq!(rules.get((0, 1)), Some(256));
        assert_eq!(rules.get((256, 2)), Some(257));
        assert_eq!(rules.get((257, 3)), Some(258));
        assert_eq!(rules.len(), 3);
        let order: Vec<u32> = rules.iter().map(|(_, id)| id).collect();
        assert_eq!(order, vec![256, 257, 258]);
    }

    #[test]
    fn test_merge_pair_is_non_overlapping() {
        assert_eq!(merge_pair(&[97, 97, 97], (97, 97), 256), vec![256, 97]);
        assert_eq!(merge_pair(&[97, 97, 97, 97], (97, 97), 256), vec![256, 256]);
        assert_eq!(merge_pair(&[1, 2, 3, 1, 2], (1, 2), 9), vec![9, 3, 9]);
        assert_eq!(merge_pair(&[1], (1, 2), 9), vec![1]);
        assert!(merge_pair(&[], (1, 2), 9).is_empty());
    }
}
