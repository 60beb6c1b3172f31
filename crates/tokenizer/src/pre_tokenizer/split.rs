//! Text segmentation for pre-tokenization.
//!
//! This module splits text into chunks along the category boundaries of a
//! regex pattern before BPE runs. Merges are applied to each chunk on its
//! own, so no learned token ever spans two chunks.

use fancy_regex::Regex;
use pmbpe_core::{Result, TokenizerError};
use serde::{Deserialize, Serialize};

/// GPT-2 split pattern.
pub const GPT2_SPLIT_PATTERN: &str =
    r"'(?:[sdmt]|ll|ve|re)| ?\p{L}+| ?\p{N}+| ?[^\s\p{L}\p{N}]+|\s+(?!\S)|\s+";

/// GPT-4 split pattern.
pub const GPT4_SPLIT_PATTERN: &str = r"'(?i:[sdmt]|ll|ve|re)|[^\r\n\p{L}\p{N}]?+\p{L}+|\p{N}{1,3}| ?[^\s\p{L}\p{N}]++[\r\n]*|\s*[\r\n]|\s+(?!\S)|\s+";

/// Splitting patterns.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SplitPattern {
    /// GPT-4 categories (letters, 1-3 digit groups, punctuation, whitespace)
    #[default]
    Gpt4,
    /// GPT-2 categories
    Gpt2,
    /// Custom regex pattern
    Custom(String),
    /// No splitting (the whole text is one chunk)
    NoSplit,
}

impl SplitPattern {
    /// Regex source of the pattern, `None` for [`SplitPattern::NoSplit`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SplitPattern::Gpt4 => Some(GPT4_SPLIT_PATTERN),
            SplitPattern::Gpt2 => Some(GPT2_SPLIT_PATTERN),
            SplitPattern::Custom(pattern) => Some(pattern),
            SplitPattern::NoSplit => None,
        }
    }

    /// Recognize a regex source, mapping the built-in patterns back to their
    /// variants and the empty string to [`SplitPattern::NoSplit`].
    pub fn from_source(source: &str) -> Self {
        match source {
            "" => SplitPattern::NoSplit,
            GPT4_SPLIT_PATTERN => SplitPattern::Gpt4,
            GPT2_SPLIT_PATTERN => SplitPattern::Gpt2,
            other => SplitPattern::Custom(other.to_string()),
        }
    }
}

/// Regex segmenter, compiled once at construction.
#[derive(Debug, Clone)]
pub struct Segmenter {
    /// Pattern to split on
    pattern: SplitPattern,
    /// Compiled pattern, absent for `NoSplit`
    regex: Option<Regex>,
}

impl Segmenter {
    /// Compile a segmenter for `pattern`.
    pub fn new(pattern: SplitPattern) -> Result<Self> {
        let regex = match pattern.as_str() {
            Some(source) if !source.is_empty() => Some(Regex::new(source).map_err(|e| {
                TokenizerError::Pattern(format!("failed to compile {:?}: {}", source, e))
            })?),
            _ => None,
        };

        Ok(Self { pattern, regex })
    }

    /// A segmenter that keeps the text whole.
    pub fn no_split() -> Self {
        Self {
            pattern: SplitPattern::NoSplit,
            regex: None,
        }
    }

    /// The pattern this segmenter was built from.
    pub fn pattern(&self) -> &SplitPattern {
        &self.pattern
    }

    /// Split text into ordered chunks that concatenate back to `text`.
    ///
    /// Regex matches become chunks; any text between matches becomes a chunk
    /// of its own. Empty input yields no chunks.
    pub fn segment<'t>(&self, text: &'t str) -> Result<Vec<&'t str>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let Some(regex) = &self.regex else {
            return Ok(vec![text]);
        };

        let mut chunks = Vec::new();
        let mut last_end = 0;

        for m in regex.find_iter(text) {
            let m = m.map_err(|e| TokenizerError::Pattern(format!("regex match failed: {}", e)))?;

            if m.start() > last_end {
                chunks.push(&text[last_end..m.start()]);
            }
            if m.end() > m.start() {
                chunks.push(m.as_str());
            }
            last_end = last_end.max(m.end());
        }

        if last_end < text.len() {
            chunks.push(&text[last_end..]);
        }

        Ok(chunks)
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::no_split()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpt4_split() {
        let segmenter = Segmenter::new(SplitPattern::Gpt4).unwrap();
        let chunks = segmenter.segment("Hello world123 it's  ok!").unwrap();
        assert_eq!(
            chunks,
            vec!["Hello", " world", "123", " it", "'s", " ", " ok", "!"]
        );
    }

    #[test]
    fn test_gpt4_digit_groups() {
        let segmenter = Segmenter::new(SplitPattern::Gpt4).unwrap();
        assert_eq!(segmenter.segment("1234567").unwrap(), vec!["123", "456", "7"]);
    }

    #[test]
    fn test_gpt2_split() {
        let segmenter = Segmenter::new(SplitPattern::Gpt2).unwrap();
        let chunks = segmenter.segment("Hello world123").unwrap();
        assert_eq!(chunks, vec!["Hello", " world", "123"]);
    }

    #[test]
    fn test_nosplit() {
        let segmenter = Segmenter::new(SplitPattern::NoSplit).unwrap();
        let result = segmenter.segment("hello world  test").unwrap();
        assert_eq!(result, vec!["hello world  test"]);
    }

    #[test]
    fn test_gaps_become_chunks() {
        let segmenter = Segmenter::new(SplitPattern::Custom(r"\d+".to_string())).unwrap();
        let chunks = segmenter.segment("ab12cd3").unwrap();
        assert_eq!(chunks, vec!["ab", "12", "cd", "3"]);
        assert_eq!(chunks.concat(), "ab12cd3");
    }

    #[test]
    fn test_empty_string() {
        let segmenter = Segmenter::default();
        assert!(segmenter.segment("").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_pattern() {
        let result = Segmenter::new(SplitPattern::Custom("(".to_string()));
        assert!(matches!(result, Err(TokenizerError::Pattern(_))));
    }

    #[test]
    fn test_pattern_from_source() {
        assert_eq!(SplitPattern::from_source(GPT4_SPLIT_PATTERN), SplitPattern::Gpt4);
        assert_eq!(SplitPattern::from_source(GPT2_SPLIT_PATTERN), SplitPattern::Gpt2);
        assert_eq!(SplitPattern::from_source(""), SplitPattern::NoSplit);
        assert_eq!(
            SplitPattern::from_source(r"\w+"),
            SplitPattern::Custom(r"\w+".to_string())
        );
    }
}
