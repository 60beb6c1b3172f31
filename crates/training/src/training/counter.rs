//! Pair counting for BPE training.
//!
//! Counts are kept in first-encountered order: walking the chunks in the
//! order they were added, and each chunk left to right, a pair takes its
//! position the first time it is seen. Selection ties are broken by that
//! position, so two runs over the same corpus always learn the same merges.

use ahash::AHashMap;
use pmbpe_core::{merge_pair, Pair};

/// Adjacent pair frequencies over one or more id sequences.
#[derive(Debug, Clone, Default)]
pub struct PairStats {
    /// Pair -> position in `counts`
    index: AHashMap<Pair, usize>,
    /// (pair, count) in first-encountered order
    counts: Vec<(Pair, u64)>,
}

impl PairStats {
    /// Create empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count the pairs of every sequence, in the given order.
    pub fn from_sequences<'a>(sequences: impl IntoIterator<Item = &'a [u32]>) -> Self {
        let mut stats = Self::new();
        for ids in sequences {
            stats.add_sequence(ids, 1);
        }
        stats
    }

    /// Add the adjacent pairs of `ids`, each counted `weight` times.
    pub fn add_sequence(&mut self, ids: &[u32], weight: u64) {
        for window in ids.windows(2) {
            let pair = (window[0], window[1]);
            match self.index.get(&pair) {
                Some(&position) => self.counts[position].1 += weight,
                None => {
                    self.index.insert(pair, self.counts.len());
                    self.counts.push((pair, weight));
                }
            }
        }
    }

    /// Get the count of a pair (zero if never seen).
    #[inline]
    pub fn get(&self, pair: Pair) -> u64 {
        self.index
            .get(&pair)
            .map(|&position| self.counts[position].1)
            .unwrap_or(0)
    }

    /// The pair with the highest count; the first encountered wins ties.
    pub fn most_frequent(&self) -> Option<(Pair, u64)> {
        let mut best: Option<(Pair, u64)> = None;
        for &(pair, count) in &self.counts {
            match best {
                Some((_, best_count)) if count <= best_count => {}
                _ => best = Some((pair, count)),
            }
        }
        best
    }

    /// Iterate `(pair, count)` in first-encountered order.
    pub fn iter(&self) -> impl Iterator<Item = (Pair, u64)> + '_ {
        self.counts.iter().copied()
    }

    /// Number of distinct pairs.
    #[inline]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no pair was seen.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Training corpus as distinct chunks with their occurrence counts.
///
/// Identical chunks are stored once, in first-seen order. Since a repeated
/// chunk never introduces a pair its first occurrence did not, this keeps
/// the first-encountered order of [`PairStats`] unchanged.
#[derive(Debug, Clone, Default)]
pub struct ChunkCounter {
    /// Chunk bytes -> position in `chunks`
    index: AHashMap<Vec<u8>, usize>,
    /// Distinct chunks as token IDs
    chunks: Vec<Vec<u32>>,
    /// Occurrences of each chunk
    chunk_counts: Vec<u64>,
}

impl ChunkCounter {
    /// Create an empty counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one chunk of raw bytes.
    pub fn add_chunk(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }

        match self.index.get(bytes) {
            Some(&position) => self.chunk_counts[position] += 1,
            None => {
                self.index.insert(bytes.to_vec(), self.chunks.len());
                self.chunks.push(bytes.iter().map(|&b| b as u32).collect());
                self.chunk_counts.push(1);
            }
        }
    }

    /// Count pairs across all chunks.
    pub fn pair_stats(&self) -> PairStats {
        let mut stats = PairStats::new();
        for (ids, &count) in self.chunks.iter().zip(self.chunk_counts.iter()) {
            stats.add_sequence(ids, count);
        }
        stats
    }

    /// Replace `pair` with `new_id` in every chunk.
    pub fn merge_pair(&mut self, pair: Pair, new_id: u32) {
        for ids in &mut self.chunks {
            if ids.len() >= 2 {
                *ids = merge_pair(ids, pair, new_id);
            }
        }
    }

    /// Number of distinct chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Total number of chunk occurrences.
    pub fn total_chunk_occurrences(&self) -> u64 {
        self.chunk_counts.iter().sum()
    }

    /// Current token IDs of each distinct chunk.
    pub fn chunks(&self) -> &[Vec<u32>] {
        &self.chunks
    }
}
