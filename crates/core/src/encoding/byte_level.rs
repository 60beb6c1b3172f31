//! Byte-level BPE encoding.
//!
//! This module applies an existing merge table to raw bytes. Encoding repeats
//! one step until nothing is mergeable: among the adjacent pairs currently
//! present, pick the one with the lowest merge id and replace all of its
//! non-overlapping occurrences in a single left-to-right pass. This is the
//! same pass the trainer uses, so a table always re-encodes its own corpus the
//! way it was learned.

use crate::core::merges::{merge_pair, MergeTable, Pair};
use crate::core::vocab::Vocab;
use crate::{Result, TokenizerError};

/// Byte-level BPE encoder over an immutable merge table.
///
/// The vocabulary is computed once at construction and shared by every
/// decode; replacing the table means building a new encoder.
#[derive(Debug, Clone, Default)]
pub struct ByteLevelEncoder {
    /// Merge rules: pair -> new_token_id
    merges: MergeTable,
    /// ID -> bytes, derived from `merges`
    vocab: Vocab,
}

impl ByteLevelEncoder {
    /// Create a new byte-level encoder.
    pub fn new(merges: MergeTable) -> Self {
        let vocab = Vocab::from_merges(&merges);
        Self { merges, vocab }
    }

    /// The merge table this encoder applies.
    pub fn merges(&self) -> &MergeTable {
        &self.merges
    }

    /// The vocabulary derived from the merge table.
    pub fn vocab(&self) -> &Vocab {
        &self.vocab
    }

    /// Encode one chunk of bytes into token IDs.
    pub fn encode(&self, bytes: &[u8]) -> Vec<u32> {
        let mut ids: Vec<u32> = bytes.iter().map(|&b| b as u32).collect();

        while ids.len() >= 2 {
            match self.lowest_mergeable_pair(&ids) {
                Some((pair, new_id)) => ids = merge_pair(&ids, pair, new_id),
                None => break,
            }
        }

        ids
    }

    /// Find the present pair with the lowest merge id.
    fn lowest_mergeable_pair(&self, ids: &[u32]) -> Option<(Pair, u32)> {
        ids.windows(2)
            .filter_map(|window| {
                let pair = (window[0], window[1]);
                self.merges.get(pair).map(|new_id| (pair, new_id))
            })
            .min_by_key(|&(_, new_id)| new_id)
    }

    /// Get the bytes of a single vocabulary token.
    #[inline]
    pub fn token_bytes(&self, id: u32) -> Option<&[u8]> {
        self.vocab.get(id)
    }

    /// Decode vocabulary IDs back to raw bytes.
    pub fn decode_bytes(&self, ids: &[u32]) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(ids.len() * 2);

        for &id in ids {
            let token = self
                .vocab
                .get(id)
                .ok_or(TokenizerError::InvalidToken(id))?;
            bytes.extend_from_slice(token);
        }

        Ok(bytes)
    }

    /// Decode vocabulary IDs to text, replacing invalid UTF-8 with U+FFFD.
    pub fn decode(&self, ids: &[u32]) -> Result<String> {
        let bytes = self.decode_bytes(ids)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
