//! pmbpe-core - Core BPE algorithm implementation
//!
//! This crate provides the fundamental data structures and algorithms for
//! byte-level byte-pair encoding (BPE): the ordered merge table, the derived
//! vocabulary, greedy encoding and decoding, and recovery of a merge table
//! from a flat rank table.
//!
//! # Features
//!
//! - Merge tables with enforced ordering and no forward references
//! - Vocabulary derived once per merge table, stored in `AHashMap`
//! - Special-token registry kept in registration order
//! - Merge recovery with byte permutation for external rank tables
//!
//! # Example
//!
//! ```rust
//! use pmbpe_core::{ByteLevelEncoder, MergeTable};
//!
//! let merges = MergeTable::from_pairs(vec![(97, 97), (256, 97), (257, 98)]).unwrap();
//! let encoder = ByteLevelEncoder::new(merges);
//!
//! let ids = encoder.encode(b"aaabdaaabac");
//! assert_eq!(ids, vec![258, 100, 258, 97, 99]);
//! assert_eq!(encoder.decode(&ids).unwrap(), "aaabdaaabac");
//! ```

pub mod error;
pub use error::{Result, TokenizerError};

// Core BPE data model
pub mod core;
pub use core::{merge_pair, MergeTable, Pair, SpecialTokens, Vocab, VocabR, BYTE_VOCAB_SIZE};

// Encoding modes
pub mod encoding;
pub use encoding::ByteLevelEncoder;

// Merge recovery from flat rank tables
pub mod recovery;
pub use recovery::{recover_merges, BytePermutation, RankTable};
