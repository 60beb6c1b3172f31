//! BPE trainer implementation.
//!
//! This module implements the greedy byte-level training loop: count pairs
//! over every chunk, merge the most frequent one everywhere, repeat. Pairs
//! are recounted from scratch on every iteration, which keeps the tie-break
//! order exact at the cost of one full pass over the corpus per merge.

use super::counter::ChunkCounter;
use pmbpe_core::{MergeTable, Result, TokenizerError, Vocab, BYTE_VOCAB_SIZE};
use serde::{Deserialize, Serialize};

/// Configuration for BPE training.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Target vocabulary size, including the 256 byte tokens
    pub vocab_size: usize,
    /// Minimum count for a pair to be merged
    pub min_frequency: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            vocab_size: 30_000,
            min_frequency: 1,
        }
    }
}

impl TrainingConfig {
    /// Check the configuration before training.
    pub fn validate(&self) -> Result<()> {
        if self.vocab_size < BYTE_VOCAB_SIZE as usize {
            return Err(TokenizerError::InvalidArgument(format!(
                "vocab_size must be at least {}, got {}",
                BYTE_VOCAB_SIZE, self.vocab_size
            )));
        }
        if self.vocab_size > u32::MAX as usize {
            return Err(TokenizerError::InvalidArgument(format!(
                "vocab_size {} does not fit token ids",
                self.vocab_size
            )));
        }
        Ok(())
    }

    /// Number of merges needed to reach `vocab_size`.
    pub fn num_merges(&self) -> usize {
        self.vocab_size.saturating_sub(BYTE_VOCAB_SIZE as usize)
    }
}

/// BPE trainer.
///
/// Trains a merge table from pre-segmented byte chunks by iteratively merging
/// the most frequent adjacent pair. Merges never span two chunks.
#[derive(Debug, Clone, Default)]
pub struct BpeTrainer {
    /// Configuration
    config: TrainingConfig,
}

impl BpeTrainer {
    /// Create a new BPE trainer with the given configuration.
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// Create a new BPE trainer with default configuration.
    pub fn with_vocab_size(vocab_size: usize) -> Self {
        Self::new(TrainingConfig {
            vocab_size,
            ..Default::default()
        })
    }

    /// The training configuration.
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train on chunks of raw bytes, given in corpus order.
    ///
    /// Stops early, without error, once no pair reaches `min_frequency`.
    pub fn train_chunks<I, C>(&self, chunks: I) -> Result<(MergeTable, Vocab)>
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        self.config.validate()?;

        let mut counter = ChunkCounter::new();
        for chunk in chunks {
            counter.add_chunk(chunk.as_ref());
        }

        let num_merges = self.config.num_merges();
        let mut merges = MergeTable::with_capacity(num_merges);

        log::info!(
            "training {} merges over {} distinct chunks ({} total)",
            num_merges,
            counter.chunk_count(),
            counter.total_chunk_occurrences()
        );

        for i in 0..num_merges {
            let stats = counter.pair_stats();
            let (pair, count) = match stats.most_frequent() {
                Some(best) if best.1 >= self.config.min_frequency => best,
                _ => {
                    log::info!(
                        "stopping early after {} of {} merges: no pair left to merge",
                        i,
                        num_merges
                    );
                    break;
                }
            };

            let new_id = BYTE_VOCAB_SIZE + i as u32;
            merges.add_merge(pair, new_id)?;
            counter.merge_pair(pair, new_id);

            log::debug!(
                "merge {}/{}: {:?} -> {} ({} occurrences)",
                i + 1,
                num_merges,
                pair,
                new_id,
                count
            );
        }

        let vocab = Vocab::from_merges(&merges);
        log::info!(
            "learned {} merges, vocabulary size {}",
            merges.len(),
            vocab.len()
        );

        Ok((merges, vocab))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wikipedia_example() {
        let trainer = BpeTrainer::with_vocab_size(259);
        let (merges, vocab) = trainer.train_chunks([b"aaabdaaabac"]).unwrap();

        let order: Vec<_> = merges.iter().collect();
        assert_eq!(
            order,
            vec![((97, 97), 256), ((256, 97), 257), ((257, 98), 258)]
        );
        assert_eq!(vocab.get(258), Some(&b"aaab"[..]));
    }

    #[test]
    fn test_tie_break_first_encountered() {
        // "xy" and "ab" both occur twice; "xy" appears first in the corpus.
        let trainer = BpeTrainer::with_vocab_size(257);
        let (merges, _) = trainer.train_chunks(["xy", "ab", "ab", "xy"]).unwrap();
        assert_eq!(merges.get((120, 121)), Some(256));
    }

    #[test]
    fn test_merges_stay_inside_chunks() {
        let trainer = BpeTrainer::with_vocab_size(300);
        let (merges, _) = trainer.train_chunks(["ab", "cd", "ab", "cd"]).unwrap();

        // Only "ab" and "cd" exist as pairs; "bc" spans a chunk boundary.
        assert_eq!(merges.len(), 2);
        assert_eq!(merges.get((98, 99)), None);
    }

    #[test]
    fn test_early_stop() {
        let trainer = BpeTrainer::with_vocab_size(1000);
        let (merges, vocab) = trainer.train_chunks(["abc"]).unwrap();

        assert_eq!(merges.len(), 2);
        assert_eq!(vocab.len(), 258);
    }

    #[test]
    fn test_min_frequency_filter() {
        let trainer = BpeTrainer::new(TrainingConfig {
            vocab_size: 300,
            min_frequency: 3,
        });
        let (merges, _) = trainer.train_chunks(["ab", "ab", "cd"]).unwrap();
        assert!(merges.is_empty());
    }

    #[test]
    fn test_rejects_small_vocab() {
        let trainer = BpeTrainer::with_vocab_size(255);
        assert!(matches!(
            trainer.train_chunks(["abc"]),
            Err(TokenizerError::InvalidArgument(_))
        ));
        assert!(BpeTrainer::with_vocab_size(256)
            .train_chunks(["abc"])
            .unwrap()
            .0
            .is_empty());
    }

    #[test]
    fn test_config_serde_defaults() {
        let config: TrainingConfig = serde_json::from_str(r#"{"vocab_size": 512}"#).unwrap();
        assert_eq!(config.vocab_size, 512);
        assert_eq!(config.min_frequency, 1);
    }
}
