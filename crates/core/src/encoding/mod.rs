//! Encoding engines for BPE tokenization.
//!
//! - Byte-level: greedy priority-ordered merging over UTF-8 bytes

pub mod byte_level;

pub use byte_level::ByteLevelEncoder;
