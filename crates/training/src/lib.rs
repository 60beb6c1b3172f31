//! pmbpe-training - BPE training infrastructure
//!
//! This crate provides the training algorithm and utilities for learning
//! byte-level BPE merge rules from pre-segmented text.
//!
//! # Features
//!
//! - Pair frequency counting with a deterministic first-encountered tie-break
//! - Configurable training parameters (vocab size, min frequency)
//! - Integration with pmbpe-core for vocabulary and merge operations
//!
//! # Example
//!
//! ```rust
//! use pmbpe_training::{BpeTrainer, TrainingConfig};
//!
//! let config = TrainingConfig {
//!     vocab_size: 259,
//!     min_frequency: 1,
//! };
//!
//! let trainer = BpeTrainer::new(config);
//! let (merges, vocab) = trainer.train_chunks(["aaabdaaabac"]).unwrap();
//! assert_eq!(merges.len(), 3);
//! assert_eq!(vocab.get(258), Some(&b"aaab"[..]));
//! ```

pub use pmbpe_core::{Result, TokenizerError};

// Training infrastructure
pub mod training;
pub use training::{BpeTrainer, ChunkCounter, PairStats, TrainingConfig};
