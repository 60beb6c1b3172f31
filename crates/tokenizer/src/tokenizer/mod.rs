//! Main tokenizer implementation.
//!
//! This module provides the high-level `Tokenizer` struct that ties together
//! special-token routing, regex segmentation, the byte-level encoder and
//! persistence.

use crate::io::{ModelFile, TokenizerLoader, TokenizerSaver};
use crate::pre_tokenizer::{AllowedSpecial, Segment, Segmenter, SpecialTokenRouter, SplitPattern};
use pmbpe_core::{
    recover_merges, BytePermutation, ByteLevelEncoder, MergeTable, RankTable, Result,
    SpecialTokens, TokenizerError, Vocab,
};
use pmbpe_training::{BpeTrainer, TrainingConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for building a tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Pattern used to split text into chunks
    pub pattern: SplitPattern,
    /// Special tokens as `(literal, id)`, in registration order
    pub special_tokens: Vec<(String, u32)>,
    /// Minimum count for a pair to be merged during training
    pub min_frequency: u64,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            pattern: SplitPattern::default(),
            special_tokens: Vec::new(),
            min_frequency: 1,
        }
    }
}

/// Builder for creating a tokenizer.
#[derive(Debug, Clone, Default)]
pub struct TokenizerBuilder {
    config: TokenizerConfig,
}

impl TokenizerBuilder {
    /// Create a new tokenizer builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the split pattern.
    pub fn pattern(mut self, pattern: SplitPattern) -> Self {
        self.config.pattern = pattern;
        self
    }

    /// Add one special token.
    pub fn special_token(mut self, literal: impl Into<String>, id: u32) -> Self {
        self.config.special_tokens.push((literal.into(), id));
        self
    }

    /// Add several special tokens, keeping their order.
    pub fn special_tokens<S: Into<String>>(
        mut self,
        tokens: impl IntoIterator<Item = (S, u32)>,
    ) -> Self {
        self.config
            .special_tokens
            .extend(tokens.into_iter().map(|(literal, id)| (literal.into(), id)));
        self
    }

    /// Set the minimum frequency for merges.
    pub fn min_frequency(mut self, freq: u64) -> Self {
        self.config.min_frequency = freq;
        self
    }

    /// Build an untrained tokenizer (raw bytes only).
    pub fn build(self) -> Result<Tokenizer> {
        Tokenizer::new(self.config)
    }

    /// Build a tokenizer from an external flat rank table.
    ///
    /// The merge table and byte permutation are recovered from `ranks`; the
    /// resulting tokenizer reproduces the ids of the external encoder.
    pub fn build_pretrained(self, ranks: &RankTable) -> Result<Tokenizer> {
        let mut tokenizer = Tokenizer::new(self.config)?;
        let (merges, permutation) = recover_merges(ranks)?;

        let encoder = ByteLevelEncoder::new(merges);
        tokenizer.special_tokens().check_disjoint(encoder.vocab())?;

        tokenizer.encoder = encoder;
        tokenizer.permutation = (!permutation.is_identity()).then_some(permutation);
        Ok(tokenizer)
    }
}

/// Main tokenizer struct.
///
/// Text is encoded in three stages: special literals are cut out by the
/// router, the remaining text is split into chunks by the segmenter, and each
/// chunk is encoded on its own by the byte-level encoder.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    /// Regex segmenter
    segmenter: Segmenter,
    /// Special-token router, owns the registry
    router: SpecialTokenRouter,
    /// Merge table and vocabulary
    encoder: ByteLevelEncoder,
    /// Byte -> id mapping of an external table, if not the identity
    permutation: Option<BytePermutation>,
    /// Minimum merge count used by `train`
    min_frequency: u64,
}

impl Tokenizer {
    /// Create a new untrained tokenizer with the given configuration.
    pub fn new(config: TokenizerConfig) -> Result<Self> {
        let segmenter = Segmenter::new(config.pattern)?;
        let special = SpecialTokens::from_pairs(config.special_tokens)?;
        let encoder = ByteLevelEncoder::default();
        special.check_disjoint(encoder.vocab())?;

        Ok(Self {
            segmenter,
            router: SpecialTokenRouter::new(special)?,
            encoder,
            permutation: None,
            min_frequency: config.min_frequency,
        })
    }

    /// Create a tokenizer builder.
    pub fn builder() -> TokenizerBuilder {
        TokenizerBuilder::new()
    }

    /// Rebuild a tokenizer from a parsed model file.
    pub fn from_model(model: ModelFile) -> Result<Self> {
        let encoder = ByteLevelEncoder::new(model.merges);
        model.special_tokens.check_disjoint(encoder.vocab())?;

        Ok(Self {
            segmenter: Segmenter::new(model.pattern)?,
            router: SpecialTokenRouter::new(model.special_tokens)?,
            encoder,
            permutation: None,
            min_frequency: TokenizerConfig::default().min_frequency,
        })
    }

    /// Train on `text` until the vocabulary holds `vocab_size` tokens
    /// (special tokens not included), or no pair is left to merge.
    ///
    /// Special literals in `text` are treated as ordinary text. The previous
    /// merge table is replaced wholesale.
    pub fn train(&mut self, text: &str, vocab_size: usize) -> Result<()> {
        let chunks = self.segmenter.segment(text)?;

        let trainer = BpeTrainer::new(TrainingConfig {
            vocab_size,
            min_frequency: self.min_frequency,
        });
        let (merges, _) = trainer.train_chunks(chunks.iter().map(|chunk| chunk.as_bytes()))?;

        let encoder = ByteLevelEncoder::new(merges);
        self.special_tokens().check_disjoint(encoder.vocab())?;

        self.encoder = encoder;
        self.permutation = None;
        Ok(())
    }

    /// Register more special tokens after construction or training.
    pub fn register_special_tokens<S: AsRef<str>>(
        &mut self,
        tokens: impl IntoIterator<Item = (S, u32)>,
    ) -> Result<()> {
        let mut special = self.special_tokens().clone();
        for (literal, id) in tokens {
            special.register(literal.as_ref(), id)?;
        }
        special.check_disjoint(self.encoder.vocab())?;

        self.router = SpecialTokenRouter::new(special)?;
        Ok(())
    }

    /// Encode text to token IDs, recognizing the special literals `allowed`
    /// selects.
    pub fn encode(&self, text: &str, allowed: &AllowedSpecial) -> Result<Vec<u32>> {
        let mut ids = Vec::with_capacity(text.len() / 2);

        for segment in self.router.route(text, allowed)? {
            match segment {
                Segment::Text(part) => self.encode_chunks_into(part, &mut ids)?,
                Segment::Special(id) => ids.push(id),
            }
        }

        Ok(ids)
    }

    /// Encode text ignoring special tokens entirely.
    pub fn encode_ordinary(&self, text: &str) -> Result<Vec<u32>> {
        let mut ids = Vec::with_capacity(text.len() / 2);
        self.encode_chunks_into(text, &mut ids)?;
        Ok(ids)
    }

    fn encode_chunks_into(&self, text: &str, ids: &mut Vec<u32>) -> Result<()> {
        for chunk in self.segmenter.segment(text)? {
            let encoded = match &self.permutation {
                Some(permutation) => self.encoder.encode(&permutation.apply(chunk.as_bytes())),
                None => self.encoder.encode(chunk.as_bytes()),
            };
            ids.extend(encoded);
        }
        Ok(())
    }

    /// Decode token IDs back to raw bytes.
    pub fn decode_bytes(&self, ids: &[u32]) -> Result<Vec<u8>> {
        let special = self.special_tokens();
        let mut bytes = Vec::with_capacity(ids.len() * 2);

        for &id in ids {
            if let Some(token) = self.encoder.token_bytes(id) {
                match &self.permutation {
                    Some(permutation) => bytes.extend(permutation.apply_inverse(token)),
                    None => bytes.extend_from_slice(token),
                }
            } else if let Some(literal) = special.get_literal(id) {
                bytes.extend_from_slice(literal.as_bytes());
            } else {
                return Err(TokenizerError::InvalidToken(id));
            }
        }

        Ok(bytes)
    }

    /// Decode token IDs back to text, replacing invalid UTF-8 with U+FFFD.
    pub fn decode(&self, ids: &[u32]) -> Result<String> {
        let bytes = self.decode_bytes(ids)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Save `<prefix>.model` and `<prefix>.vocab`, returning the model path.
    pub fn save(&self, prefix: &Path) -> Result<PathBuf> {
        if self.permutation.is_some() {
            return Err(TokenizerError::Save(
                "tokenizers recovered with a byte permutation cannot be saved as a model file"
                    .to_string(),
            ));
        }

        TokenizerSaver::new(self.segmenter.pattern(), self.special_tokens(), &self.encoder)
            .save(prefix)
    }

    /// Load a tokenizer from a `.model` file.
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_model(TokenizerLoader::load(path)?)
    }

    /// Number of tokens: byte and merged tokens plus special tokens.
    pub fn vocab_size(&self) -> usize {
        self.encoder.vocab().len() + self.special_tokens().len()
    }

    /// The merge table.
    pub fn merges(&self) -> &MergeTable {
        self.encoder.merges()
    }

    /// The vocabulary derived from the merge table.
    pub fn vocab(&self) -> &Vocab {
        self.encoder.vocab()
    }

    /// Registered special tokens.
    pub fn special_tokens(&self) -> &SpecialTokens {
        self.router.special_tokens()
    }

    /// The split pattern.
    pub fn pattern(&self) -> &SplitPattern {
        self.segmenter.pattern()
    }

    /// Byte permutation of a recovered tokenizer, if any.
    pub fn permutation(&self) -> Option<&BytePermutation> {
        self.permutation.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trained(pattern: SplitPattern, text: &str, vocab_size: usize) -> Tokenizer {
        let mut tokenizer = Tokenizer::builder().pattern(pattern).build().unwrap();
        tokenizer.train(text, vocab_size).unwrap();
        tokenizer
    }

    #[test]
    fn test_builder() {
        let tokenizer = Tokenizer::builder()
            .pattern(SplitPattern::Gpt2)
            .special_token("<|eot|>", 1000)
            .min_frequency(2)
            .build()
            .unwrap();

        assert_eq!(tokenizer.pattern(), &SplitPattern::Gpt2);
        assert_eq!(tokenizer.vocab_size(), 257);
        assert_eq!(tokenizer.min_frequency, 2);
    }

    #[test]
    fn test_untrained_roundtrip() {
        let tokenizer = Tokenizer::builder().build().unwrap();

        let text = "Hello, world!";
        let ids = tokenizer.encode_ordinary(text).unwrap();
        assert_eq!(ids, text.bytes().map(u32::from).collect::<Vec<_>>());
        assert_eq!(tokenizer.decode(&ids).unwrap(), text);
    }

    #[test]
    fn test_train_wikipedia() {
        let tokenizer = trained(SplitPattern::NoSplit, "aaabdaaabac", 259);

        let ids = tokenizer.encode_ordinary("aaabdaaabac").unwrap();
        assert_eq!(ids, vec![258, 100, 258, 97, 99]);
        assert_eq!(tokenizer.decode(&ids).unwrap(), "aaabdaaabac");
    }

    #[test]
    fn test_train_gpt4_roundtrip() {
        let corpus = "the cat sat on the mat. the dog sat on the log. 12345 cats!";
        let tokenizer = trained(SplitPattern::Gpt4, corpus, 300);
        assert!(!tokenizer.merges().is_empty());

        for text in [corpus, "a brand new sentence, 987", "ünïcödé 😺", ""] {
            let ids = tokenizer.encode_ordinary(text).unwrap();
            assert_eq!(tokenizer.decode(&ids).unwrap(), text);
        }
    }

    #[test]
    fn test_train_rejects_small_vocab() {
        let mut tokenizer = Tokenizer::builder().build().unwrap();
        assert!(matches!(
            tokenizer.train("abc", 100),
            Err(TokenizerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_encode_special_modes() {
        let mut tokenizer = trained(SplitPattern::Gpt4, "hello world hello world", 270);
        tokenizer
            .register_special_tokens([("<|endoftext|>", 100257)])
            .unwrap();

        let text = "hello<|endoftext|>world";

        let ids = tokenizer.encode(text, &AllowedSpecial::All).unwrap();
        assert!(ids.contains(&100257));
        assert_eq!(tokenizer.decode(&ids).unwrap(), text);

        let ordinary = tokenizer.encode(text, &AllowedSpecial::None).unwrap();
        assert!(!ordinary.contains(&100257));
        assert_eq!(ordinary, tokenizer.encode_ordinary(text).unwrap());

        assert!(matches!(
            tokenizer.encode(text, &AllowedSpecial::NoneRaise),
            Err(TokenizerError::SpecialTokenConflict(_))
        ));
    }

    #[test]
    fn test_special_id_must_not_collide() {
        let mut tokenizer = trained(SplitPattern::NoSplit, "aaabdaaabac", 259);
        assert!(matches!(
            tokenizer.register_special_tokens([("<|x|>", 257)]),
            Err(TokenizerError::InvalidConfig(_))
        ));
        assert!(Tokenizer::builder().special_token("<|x|>", 10).build().is_err());
    }

    #[test]
    fn test_decode_unknown_id() {
        let tokenizer = Tokenizer::builder().build().unwrap();
        assert!(matches!(
            tokenizer.decode(&[104, 4096]),
            Err(TokenizerError::InvalidToken(4096))
        ));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut tokenizer = trained(SplitPattern::Gpt4, "low lower lowest newer newest", 280);
        tokenizer
            .register_special_tokens([("<|end|>", 5000)])
            .unwrap();

        let model_path = tokenizer.save(&dir.path().join("tok")).unwrap();
        let loaded = Tokenizer::load(&model_path).unwrap();

        assert_eq!(loaded.merges(), tokenizer.merges());
        assert_eq!(loaded.special_tokens(), tokenizer.special_tokens());
        assert_eq!(loaded.pattern(), tokenizer.pattern());

        let text = "slowest newer<|end|>lower";
        assert_eq!(
            loaded.encode(text, &AllowedSpecial::All).unwrap(),
            tokenizer.encode(text, &AllowedSpecial::All).unwrap()
        );
    }
}
