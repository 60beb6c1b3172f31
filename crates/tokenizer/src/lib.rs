//! pmbpe-tokenizer - High-level tokenizer API
//!
//! This crate provides a user-friendly interface for byte-level BPE
//! tokenization, integrating all components (segmentation, special tokens,
//! merge rules, encoder, persistence) into a single API.
//!
//! # Features
//!
//! - Simple builder pattern for tokenizer configuration
//! - GPT-2 and GPT-4 style regex segmentation, or none at all
//! - Special tokens with `all`, `none`, `none_raise` or allow-set handling
//! - A line-oriented `.model` format plus a pretty `.vocab` listing
//! - Tokenizers rebuilt from flat tiktoken-style rank tables
//!
//! # Example
//!
//! ```rust
//! use pmbpe_tokenizer::{AllowedSpecial, SplitPattern, Tokenizer};
//!
//! let mut tokenizer = Tokenizer::builder()
//!     .pattern(SplitPattern::Gpt4)
//!     .special_token("<|endoftext|>", 1000)
//!     .build()?;
//!
//! tokenizer.train("hello world, hello tokenizer", 270)?;
//!
//! let ids = tokenizer.encode("hello<|endoftext|>", &AllowedSpecial::All)?;
//! assert_eq!(ids.last(), Some(&1000));
//! assert_eq!(tokenizer.decode(&ids)?, "hello<|endoftext|>");
//! # Ok::<(), pmbpe_tokenizer::TokenizerError>(())
//! ```

// Re-export core types
pub use pmbpe_core::{
    BytePermutation, MergeTable, RankTable, Result, SpecialTokens, TokenizerError, Vocab,
};

// Tokenizer API
pub mod tokenizer;
pub use tokenizer::{Tokenizer, TokenizerBuilder, TokenizerConfig};

// IO/Serialization
pub mod io;
pub use io::{ModelFile, TokenizerLoader, TokenizerSaver, MODEL_FORMAT_TAG};

// Pre-tokenization
pub mod pre_tokenizer;
pub use pre_tokenizer::{
    AllowedSpecial, Segment, Segmenter, SpecialTokenRouter, SplitPattern, GPT2_SPLIT_PATTERN,
    GPT4_SPLIT_PATTERN,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
