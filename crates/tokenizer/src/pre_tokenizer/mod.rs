//! Pre-tokenization pipeline.
//!
//! This module provides the operations applied before BPE encoding:
//! routing special-token literals and regex segmentation of ordinary text.

pub mod special;
pub mod split;

pub use special::{AllowedSpecial, Segment, SpecialTokenRouter};
pub use split::{Segmenter, SplitPattern, GPT2_SPLIT_PATTERN, GPT4_SPLIT_PATTERN};
