//! Load functionality for tokenizer models and external tables.
//!
//! This module reads the `.model` files written by
//! [`TokenizerSaver`](super::TokenizerSaver), flat tiktoken-style rank
//! tables for merge recovery, and JSON special-token maps.

use super::format::ModelFile;
use base64::{engine::general_purpose::STANDARD, Engine};
use pmbpe_core::{RankTable, Result, SpecialTokens, TokenizerError};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Tokenizer loader - handles loading trained models.
pub struct TokenizerLoader;

impl TokenizerLoader {
    /// Load a `.model` file.
    pub fn load(path: &Path) -> Result<ModelFile> {
        let text = read_to_string(path)?;
        let model = ModelFile::parse(&text)?;

        log::info!(
            "loaded {} merges and {} special tokens from {}",
            model.merges.len(),
            model.special_tokens.len(),
            path.display()
        );

        Ok(model)
    }

    /// Load a flat rank table, one `<base64 token> <rank>` per line.
    pub fn load_rank_table(path: &Path) -> Result<RankTable> {
        let text = read_to_string(path)?;
        let ranks = Self::parse_rank_table(&text)?;

        log::info!("loaded {} ranks from {}", ranks.len(), path.display());
        Ok(ranks)
    }

    /// Parse the text of a rank table.
    pub fn parse_rank_table(text: &str) -> Result<RankTable> {
        let mut ranks = RankTable::new();

        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let mut parts = line.split_whitespace();
            let (Some(token_b64), Some(rank), None) = (parts.next(), parts.next(), parts.next())
            else {
                return Err(TokenizerError::Load(format!(
                    "line {}: expected `<base64 token> <rank>`, got {:?}",
                    index + 1,
                    line
                )));
            };

            let token = STANDARD.decode(token_b64).map_err(|e| {
                TokenizerError::Load(format!("line {}: invalid base64: {}", index + 1, e))
            })?;
            let rank: u32 = rank.parse().map_err(|_| {
                TokenizerError::Load(format!("line {}: invalid rank {:?}", index + 1, rank))
            })?;

            if ranks.insert(token, rank).is_some() {
                return Err(TokenizerError::Load(format!(
                    "line {}: token {:?} is listed twice",
                    index + 1,
                    token_b64
                )));
            }
        }

        Ok(ranks)
    }

    /// Load special tokens from a JSON object `{"<literal>": id, ...}`.
    ///
    /// JSON objects carry no order, so literals are registered by ascending id.
    pub fn load_special_tokens(path: &Path) -> Result<SpecialTokens> {
        let text = read_to_string(path)?;
        Self::parse_special_tokens(&text)
    }

    /// Parse a JSON special-token map.
    pub fn parse_special_tokens(json: &str) -> Result<SpecialTokens> {
        let map: HashMap<String, u32> = serde_json::from_str(json)?;

        let mut entries: Vec<(String, u32)> = map.into_iter().collect();
        entries.sort_by_key(|&(_, id)| id);

        SpecialTokens::from_pairs(entries)
    }
}

fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| TokenizerError::Io {
        path: path.to_path_buf(),
        err,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rank_table() {
        // "Hello" = "SGVsbG8=", "a" = "YQ=="
        let ranks = TokenizerLoader::parse_rank_table("SGVsbG8= 300\nYQ== 5\n\n").unwrap();

        assert_eq!(ranks.len(), 2);
        assert_eq!(ranks.get(b"Hello".as_slice()), Some(&300));
        assert_eq!(ranks.get(b"a".as_slice()), Some(&5));
    }

    #[test]
    fn test_parse_rank_table_errors() {
        assert!(matches!(
            TokenizerLoader::parse_rank_table("YQ==\n"),
            Err(TokenizerError::Load(_))
        ));
        assert!(matches!(
            TokenizerLoader::parse_rank_table("!!! 1\n"),
            Err(TokenizerError::Load(_))
        ));
        assert!(matches!(
            TokenizerLoader::parse_rank_table("YQ== 1\nYQ== 2\n"),
            Err(TokenizerError::Load(_))
        ));
    }

    #[test]
    fn test_parse_special_tokens_sorted_by_id() {
        let special =
            TokenizerLoader::parse_special_tokens(r#"{"<|b|>": 1001, "<|a|>": 1000}"#).unwrap();
        let order: Vec<(&str, u32)> = special.iter().collect();
        assert_eq!(order, vec![("<|a|>", 1000), ("<|b|>", 1001)]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = TokenizerLoader::load(&dir.path().join("missing.model")).unwrap_err();
        assert!(matches!(err, TokenizerError::Io { .. }));
    }

    #[test]
    fn test_load_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tok.model");
        fs::write(&path, "pmbpe v1\n\n1\n<|eot|> 257\n104 105\n").unwrap();

        let model = TokenizerLoader::load(&path).unwrap();
        assert_eq!(model.merges.get((104, 105)), Some(256));
        assert_eq!(model.special_tokens.get_id("<|eot|>"), Some(257));
    }
}
