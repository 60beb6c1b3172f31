//! Merge recovery from flat rank tables.
//!
//! Some pretrained encoders ship only a `token bytes -> rank` table, where
//! the rank doubles as token id and merge priority, and the 256 single-byte
//! tokens are not numbered in byte order. This module rebuilds an ordered
//! [`MergeTable`] and the byte permutation from such a table, so that
//! [`ByteLevelEncoder`](crate::ByteLevelEncoder) over permuted bytes yields
//! exactly the external ids.

use crate::core::merges::{MergeTable, BYTE_VOCAB_SIZE};
use crate::error::{Result, TokenizerError};
use ahash::{AHashMap, AHashSet};
use std::ops::Range;

/// Flat mapping from token bytes to rank.
pub type RankTable = AHashMap<Vec<u8>, u32>;

/// Bijection between raw byte values and the ids an external table uses
/// for single-byte tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytePermutation {
    forward: [u8; 256],
    inverse: [u8; 256],
}

impl BytePermutation {
    /// The permutation mapping every byte to itself.
    pub fn identity() -> Self {
        let mut forward = [0u8; 256];
        for (byte, slot) in forward.iter_mut().enumerate() {
            *slot = byte as u8;
        }
        Self {
            forward,
            inverse: forward,
        }
    }

    /// Build from the forward table `byte -> id`.
    ///
    /// Fails with `InvalidArgument` if the table is not a bijection.
    pub fn from_forward(forward: [u8; 256]) -> Result<Self> {
        let mut inverse = [0u8; 256];
        let mut seen = [false; 256];

        for (byte, &id) in forward.iter().enumerate() {
            if seen[id as usize] {
                return Err(TokenizerError::InvalidArgument(format!(
                    "byte permutation maps two bytes to {}",
                    id
                )));
            }
            seen[id as usize] = true;
            inverse[id as usize] = byte as u8;
        }

        Ok(Self { forward, inverse })
    }

    /// External id of a raw byte.
    #[inline]
    pub fn forward(&self, byte: u8) -> u8 {
        self.forward[byte as usize]
    }

    /// Raw byte of an external single-byte id.
    #[inline]
    pub fn inverse(&self, id: u8) -> u8 {
        self.inverse[id as usize]
    }

    /// Map raw bytes into the external id space.
    pub fn apply(&self, bytes: &[u8]) -> Vec<u8> {
        bytes.iter().map(|&b| self.forward(b)).collect()
    }

    /// Map external single-byte ids back to raw bytes.
    pub fn apply_inverse(&self, bytes: &[u8]) -> Vec<u8> {
        bytes.iter().map(|&b| self.inverse(b)).collect()
    }

    /// Whether every byte maps to itself.
    pub fn is_identity(&self) -> bool {
        self.forward
            .iter()
            .enumerate()
            .all(|(byte, &id)| byte == id as usize)
    }
}

impl Default for BytePermutation {
    fn default() -> Self {
        Self::identity()
    }
}

/// Recover the merge table and byte permutation behind a flat rank table.
///
/// Each multi-byte token of rank `R` is split by greedy BPE over its own
/// bytes using only tokens of rank below `R`; it must come apart into exactly
/// two known tokens, which become the rule `(rank(left), rank(right)) -> R`.
pub fn recover_merges(ranks: &RankTable) -> Result<(MergeTable, BytePermutation)> {
    let permutation = byte_permutation(ranks)?;

    let mut seen_ranks = AHashSet::with_capacity(ranks.len());
    for (token, &rank) in ranks {
        if !seen_ranks.insert(rank) {
            return Err(TokenizerError::IncompatibleRankTable(format!(
                "rank {} is assigned to more than one token (one is {:?})",
                rank,
                String::from_utf8_lossy(token)
            )));
        }
    }

    let mut tokens: Vec<(&[u8], u32)> = ranks
        .iter()
        .filter(|(token, _)| token.len() > 1)
        .map(|(token, &rank)| (token.as_slice(), rank))
        .collect();
    tokens.sort_unstable_by_key(|&(_, rank)| rank);

    let mut merges = MergeTable::with_capacity(tokens.len());
    for (token, rank) in tokens {
        let parts = split_token(ranks, token, rank);
        if parts.len() != 2 {
            return Err(TokenizerError::IncompatibleRankTable(format!(
                "token {:?} (rank {}) reduces to {} parts instead of 2",
                String::from_utf8_lossy(token),
                rank,
                parts.len()
            )));
        }

        let left = part_rank(ranks, &token[parts[0].clone()])?;
        let right = part_rank(ranks, &token[parts[1].clone()])?;
        merges
            .add_merge((left, right), rank)
            .map_err(|e| TokenizerError::IncompatibleRankTable(e.to_string()))?;
    }

    log::info!(
        "recovered {} merges from a rank table of {} tokens",
        merges.len(),
        ranks.len()
    );

    Ok((merges, permutation))
}

/// Read the single-byte ranks as a permutation of `0..256`.
fn byte_permutation(ranks: &RankTable) -> Result<BytePermutation> {
    let mut forward = [0u8; 256];

    for byte in 0..=255u8 {
        let rank = ranks.get([byte].as_slice()).copied().ok_or_else(|| {
            TokenizerError::IncompatibleRankTable(format!(
                "no rank for single byte 0x{:02x}",
                byte
            ))
        })?;
        if rank >= BYTE_VOCAB_SIZE {
            return Err(TokenizerError::IncompatibleRankTable(format!(
                "single byte 0x{:02x} has rank {}, outside 0..256",
                byte, rank
            )));
        }
        forward[byte as usize] = rank as u8;
    }

    BytePermutation::from_forward(forward)
        .map_err(|e| TokenizerError::IncompatibleRankTable(e.to_string()))
}

fn part_rank(ranks: &RankTable, part: &[u8]) -> Result<u32> {
    ranks.get(part).copied().ok_or_else(|| {
        TokenizerError::IncompatibleRankTable(format!(
            "part {:?} is not in the rank table",
            String::from_utf8_lossy(part)
        ))
    })
}

/// Greedy BPE over the bytes of `token`, restricted to ranks below `max_rank`.
///
/// Parts are byte ranges of `token`. Each round picks the adjacent pair whose
/// concatenation has the lowest rank and joins every non-overlapping
/// occurrence of that same pair, left to right.
fn split_token(ranks: &RankTable, token: &[u8], max_rank: u32) -> Vec<Range<usize>> {
    let mut parts: Vec<Range<usize>> = (0..token.len()).map(|i| i..i + 1).collect();

    while parts.len() >= 2 {
        let best = parts
            .windows(2)
            .enumerate()
            .filter_map(|(i, pair)| {
                ranks
                    .get(&token[pair[0].start..pair[1].end])
                    .filter(|&&rank| rank < max_rank)
                    .map(|&rank| (i, rank))
            })
            .min_by_key(|&(_, rank)| rank);

        let Some((index, _)) = best else {
            break;
        };

        let left = &token[parts[index].clone()];
        let right = &token[parts[index + 1].clone()];
        let mut joined = Vec::with_capacity(parts.len() - 1);
        let mut i = 0;
        while i < parts.len() {
            if i + 1 < parts.len()
                && &token[parts[i].clone()] == left
                && &token[parts[i + 1].clone()] == right
            {
                joined.push(parts[i].start..parts[i + 1].end);
                i += 2;
            } else {
                joined.push(parts[i].clone());
                i += 1;
            }
        }
        parts = joined;
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::ByteLevelEncoder;

    /// Rank table where bytes are numbered by `(b * 7 + 3) % 256` and the
    /// given merges (in raw byte space) take ids 256, 257, ...
    fn synthetic_table(merges: &[&[u8]]) -> RankTable {
        let mut ranks = RankTable::new();
        for byte in 0..=255u8 {
            ranks.insert(vec![byte], (byte as u32 * 7 + 3) % 256);
        }
        for (i, token) in merges.iter().enumerate() {
            ranks.insert(token.to_vec(), 256 + i as u32);
        }
        ranks
    }

    fn shuffled(byte: u8) -> u32 {
        (byte as u32 * 7 + 3) % 256
    }

    #[test]
    fn test_identity_permutation() {
        let perm = BytePermutation::identity();
        assert!(perm.is_identity());
        assert_eq!(perm.apply(b"abc"), b"abc".to_vec());
    }

    #[test]
    fn test_permutation_rejects_non_bijection() {
        let mut forward = [0u8; 256];
        forward[1] = 0;
        assert!(BytePermutation::from_forward(forward).is_err());
    }

    #[test]
    fn test_recover_byte_permutation() {
        let ranks = synthetic_table(&[]);
        let (merges, perm) = recover_merges(&ranks).unwrap();

        assert!(merges.is_empty());
        for byte in 0..=255u8 {
            assert_eq!(perm.forward(byte) as u32, shuffled(byte));
            assert_eq!(perm.inverse(perm.forward(byte)), byte);
        }
    }

    #[test]
    fn test_recover_wikipedia_merges() {
        let ranks = synthetic_table(&[b"aa", b"aaa", b"aaab"]);
        let (merges, perm) = recover_merges(&ranks).unwrap();

        let a = shuffled(b'a');
        let b = shuffled(b'b');
        assert_eq!(merges.get((a, a)), Some(256));
        assert_eq!(merges.get((256, a)), Some(257));
        assert_eq!(merges.get((257, b)), Some(258));
        assert_eq!(merges.len(), 3);

        let encoder = ByteLevelEncoder::new(merges);
        let ids = encoder.encode(&perm.apply(b"aaabdaaabac"));
        assert_eq!(
            ids,
            vec![
                258,
                shuffled(b'd'),
                258,
                shuffled(b'a'),
                shuffled(b'c')
            ]
        );
    }

    #[test]
    fn test_split_respects_max_rank() {
        let ranks = synthetic_table(&[b"ab", b"abc"]);
        let parts = split_token(&ranks, b"abc", 257);
        assert_eq!(parts, vec![0..2, 2..3]);

        let parts = split_token(&ranks, b"abc", 256);
        assert_eq!(parts, vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn test_missing_byte_is_incompatible() {
        let mut ranks = synthetic_table(&[]);
        ranks.remove(&vec![0x41]);
        assert!(matches!(
            recover_merges(&ranks),
            Err(TokenizerError::IncompatibleRankTable(_))
        ));
    }

    #[test]
    fn test_unexplainable_token_is_incompatible() {
        // "abc" at 256 with no "ab" or "bc": three parts remain.
        let ranks = synthetic_table(&[b"abc"]);
        assert!(matches!(
            recover_merges(&ranks),
            Err(TokenizerError::IncompatibleRankTable(_))
        ));
    }

    #[test]
    fn test_duplicate_rank_is_incompatible() {
        let mut ranks = synthetic_table(&[b"ab"]);
        ranks.insert(b"cd".to_vec(), 256);
        assert!(matches!(
            recover_merges(&ranks),
            Err(TokenizerError::IncompatibleRankTable(_))
        ));
    }
}
