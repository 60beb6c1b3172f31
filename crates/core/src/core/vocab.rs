//! Vocabulary storage and lookup.
//!
//! The byte vocabulary is derived from a [`MergeTable`] and never edited
//! directly: ids below 256 expand to themselves, every merge expands to the
//! concatenation of its operands. Special tokens live in a separate registry
//! whose ids must stay disjoint from the vocabulary.

use crate::core::merges::{MergeTable, BYTE_VOCAB_SIZE};
use crate::error::{Result, TokenizerError};
use ahash::AHashMap;
use compact_str::CompactString;

/// Reverse mapping: ID -> token bytes
pub type VocabR = AHashMap<u32, Vec<u8>>;

/// Byte expansion of every token id, built once per merge table.
#[derive(Debug, Clone)]
pub struct Vocab {
    /// ID -> token bytes
    tokens: VocabR,
    /// IDs in ascending order
    ids: Vec<u32>,
}

impl Vocab {
    /// Build the vocabulary for a merge table.
    pub fn from_merges(merges: &MergeTable) -> Self {
        let capacity = BYTE_VOCAB_SIZE as usize + merges.len();
        let mut tokens = VocabR::with_capacity(capacity);
        let mut ids = Vec::with_capacity(capacity);

        for byte in 0..BYTE_VOCAB_SIZE {
            tokens.insert(byte, vec![byte as u8]);
            ids.push(byte);
        }

        // Operands always precede the rule that uses them.
        for ((left, right), new_id) in merges.iter() {
            let mut bytes = tokens[&left].clone();
            bytes.extend_from_slice(&tokens[&right]);
            tokens.insert(new_id, bytes);
            ids.push(new_id);
        }

        Self { tokens, ids }
    }

    /// Get the bytes for an ID.
    #[inline]
    pub fn get(&self, id: u32) -> Option<&[u8]> {
        self.tokens.get(&id).map(Vec::as_slice)
    }

    /// Check whether an ID belongs to the vocabulary.
    #[inline]
    pub fn contains(&self, id: u32) -> bool {
        self.tokens.contains_key(&id)
    }

    /// Iterate `(id, bytes)` in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[u8])> + '_ {
        self.ids
            .iter()
            .map(move |id| (*id, self.tokens[id].as_slice()))
    }

    /// Get the size of the vocabulary.
    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if the vocabulary is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl Default for Vocab {
    fn default() -> Self {
        Self::from_merges(&MergeTable::new())
    }
}

/// Registry of reserved literals and their ids, in registration order.
///
/// Registration order matters: when two literals match at the same position
/// the one registered first wins, and the model file lists them in this order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecialTokens {
    entries: Vec<(CompactString, u32)>,
    by_literal: AHashMap<CompactString, u32>,
    by_id: AHashMap<u32, usize>,
}

impl SpecialTokens {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from `(literal, id)` pairs, keeping their order.
    pub fn from_pairs<S: AsRef<str>>(pairs: impl IntoIterator<Item = (S, u32)>) -> Result<Self> {
        let mut special = Self::new();
        for (literal, id) in pairs {
            special.register(literal.as_ref(), id)?;
        }
        Ok(special)
    }

    /// Register a literal under a reserved id.
    pub fn register(&mut self, literal: &str, id: u32) -> Result<()> {
        if literal.is_empty() {
            return Err(TokenizerError::InvalidArgument(
                "special token literal must not be empty".to_string(),
            ));
        }
        if self.by_literal.contains_key(literal) {
            return Err(TokenizerError::InvalidArgument(format!(
                "special token {:?} is already registered",
                literal
            )));
        }
        if let Some(&index) = self.by_id.get(&id) {
            return Err(TokenizerError::InvalidArgument(format!(
                "special token id {} is already used by {:?}",
                id, self.entries[index].0
            )));
        }

        let literal = CompactString::new(literal);
        self.by_literal.insert(literal.clone(), id);
        self.by_id.insert(id, self.entries.len());
        self.entries.push((literal, id));
        Ok(())
    }

    /// Get the id of a literal.
    #[inline]
    pub fn get_id(&self, literal: &str) -> Option<u32> {
        self.by_literal.get(literal).copied()
    }

    /// Get the literal registered under an id.
    #[inline]
    pub fn get_literal(&self, id: u32) -> Option<&str> {
        self.by_id
            .get(&id)
            .map(|&index| self.entries[index].0.as_str())
    }

    /// Check if an ID is a special token.
    #[inline]
    pub fn is_special(&self, id: u32) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Fail if any special id is also a vocabulary id.
    pub fn check_disjoint(&self, vocab: &Vocab) -> Result<()> {
        match self.entries.iter().find(|(_, id)| vocab.contains(*id)) {
            Some((literal, id)) => Err(TokenizerError::InvalidConfig(format!(
                "special token {:?} uses id {} which is already a vocabulary id",
                literal, id
            ))),
            None => Ok(()),
        }
    }

    /// Iterate `(literal, id)` in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.entries.iter().map(|(literal, id)| (literal.as_str(), *id))
    }

    /// Number of registered literals.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no literal is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_vocab() {
        let vocab = Vocab::default();
        assert_eq!(vocab.len(), 256);
        assert_eq!(vocab.get(97), Some(&b"a"[..]));
        assert_eq!(vocab.get(256), None);
    }

    #[test]
    fn test_vocab_from_merges() {
        let merges = MergeTable::from_pairs(vec![(97, 97), (256, 97), (257, 98)]).unwrap();
        let vocab = Vocab::from_merges(&merges);

        assert_eq!(vocab.len(), 259);
        assert_eq!(vocab.get(256), Some(&b"aa"[..]));
        assert_eq!(vocab.get(257), Some(&b"aaa"[..]));
        assert_eq!(vocab.get(258), Some(&b"aaab"[..]));

        let last: Vec<u32> = vocab.iter().map(|(id, _)| id).skip(255).collect();
        assert_eq!(last, vec![255, 256, 257, 258]);
    }

    #[test]
    fn test_special_tokens_keep_order() {
        let special =
            SpecialTokens::from_pairs(vec![("<|b|>", 1001), ("<|a|>", 1000)]).unwrap();

        let literals: Vec<&str> = special.iter().map(|(literal, _)| literal).collect();
        assert_eq!(literals, vec!["<|b|>", "<|a|>"]);
        assert_eq!(special.get_id("<|a|>"), Some(1000));
        assert_eq!(special.get_literal(1001), Some("<|b|>"));
        assert!(special.is_special(1000));
        assert!(!special.is_special(999));
    }

    #[test]
    fn test_special_tokens_reject_duplicates() {
        let mut special = SpecialTokens::new();
        special.register("<|eot|>", 500).unwrap();

        assert!(matches!(
            special.register("<|eot|>", 501),
            Err(TokenizerError::InvalidArgument(_))
        ));
        assert!(matches!(
            special.register("<|other|>", 500),
            Err(TokenizerError::InvalidArgument(_))
        ));
        assert!(special.register("", 502).is_err());
    }

    #[test]
    fn test_special_tokens_disjoint_from_vocab() {
        let merges = MergeTable::from_pairs(vec![(104, 105)]).unwrap();
        let vocab = Vocab::from_merges(&merges);

        let clash = SpecialTokens::from_pairs(vec![("<|x|>", 256)]).unwrap();
        assert!(matches!(
            clash.check_disjoint(&vocab),
            Err(TokenizerError::InvalidConfig(_))
        ));

        let fine = SpecialTokens::from_pairs(vec![("<|x|>", 257)]).unwrap();
        assert!(fine.check_disjoint(&vocab).is_ok());
    }
}
