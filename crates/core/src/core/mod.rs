//! Core BPE data model.
//!
//! This module contains the merge table, the derived byte vocabulary and the
//! special token registry, independent of how text is segmented.

pub mod merges;
pub mod vocab;

pub use merges::{merge_pair, MergeTable, Pair, BYTE_VOCAB_SIZE};
pub use vocab::{SpecialTokens, Vocab, VocabR};
