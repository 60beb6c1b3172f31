//! Training infrastructure for BPE tokenizers.
//!
//! This module provides pair statistics and the greedy loop that learns
//! merge rules from segmented text.

pub mod counter;
pub mod trainer;

pub use counter::{ChunkCounter, PairStats};
pub use trainer::{BpeTrainer, TrainingConfig};
