//! Serialization and deserialization for BPE models.
//!
//! This module provides the `.model` text format, saving a trained
//! tokenizer to disk, and loading models, rank tables and special-token maps.

pub mod format;
pub mod load;
pub mod save;

pub use format::{ModelFile, MODEL_FORMAT_TAG};
pub use load::TokenizerLoader;
pub use save::TokenizerSaver;
