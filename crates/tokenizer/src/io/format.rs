//! Format definitions for tokenizer serialization.
//!
//! A `.model` file is line oriented:
//!
//! ```text
//! pmbpe v1
//! <pattern source, empty for no split>
//! <number of special tokens N>
//! <literal> <id>            (N lines)
//! <left> <right>            (one per merge, id implied as 256 + index)
//! ```
//!
//! Merge ids are never written; they are reassigned from line order on
//! load, so the merge lines must stay in learning order.

use crate::pre_tokenizer::SplitPattern;
use pmbpe_core::{MergeTable, Result, SpecialTokens, TokenizerError, BYTE_VOCAB_SIZE};
use std::fmt::Write;

/// First line of every model file.
pub const MODEL_FORMAT_TAG: &str = "pmbpe v1";

/// Contents of a `.model` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFile {
    /// Split pattern
    pub pattern: SplitPattern,
    /// Special tokens, in file order
    pub special_tokens: SpecialTokens,
    /// Merge rules, ids `256..`
    pub merges: MergeTable,
}

impl ModelFile {
    /// Render the model in the text format.
    ///
    /// Fails with `InvalidArgument` if the pattern or a literal contains a
    /// line break, since it could not be read back.
    pub fn render(
        pattern: &SplitPattern,
        special: &SpecialTokens,
        merges: &MergeTable,
    ) -> Result<String> {
        let source = pattern.as_str().unwrap_or("");
        if has_line_break(source) {
            return Err(TokenizerError::InvalidArgument(
                "split pattern containing a line break cannot be saved".to_string(),
            ));
        }

        let mut out = String::with_capacity(64 + 16 * (special.len() + merges.len()));
        // Writing to a String cannot fail.
        let _ = writeln!(out, "{}", MODEL_FORMAT_TAG);
        let _ = writeln!(out, "{}", source);
        let _ = writeln!(out, "{}", special.len());

        for (literal, id) in special.iter() {
            if has_line_break(literal) {
                return Err(TokenizerError::InvalidArgument(format!(
                    "special token {:?} contains a line break and cannot be saved",
                    literal
                )));
            }
            let _ = writeln!(out, "{} {}", literal, id);
        }

        for (expected, ((left, right), new_id)) in (BYTE_VOCAB_SIZE..).zip(merges.iter()) {
            if new_id != expected {
                return Err(TokenizerError::Save(format!(
                    "merge {:?} has id {}, but ids must be contiguous from {}",
                    (left, right),
                    new_id,
                    BYTE_VOCAB_SIZE
                )));
            }
            let _ = writeln!(out, "{} {}", left, right);
        }

        Ok(out)
    }

    /// Parse a model from its text form.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines().enumerate();

        let tag = lines.next().map(|(_, line)| line).unwrap_or("");
        if tag != MODEL_FORMAT_TAG {
            return Err(TokenizerError::UnsupportedModelFormat(tag.to_string()));
        }

        let (_, source) = lines
            .next()
            .ok_or_else(|| TokenizerError::Load("missing pattern line".to_string()))?;
        let pattern = SplitPattern::from_source(source);

        let (count_line, count) = lines
            .next()
            .ok_or_else(|| TokenizerError::Load("missing special token count".to_string()))?;
        let count: usize = count.trim().parse().map_err(|_| {
            TokenizerError::Load(format!(
                "line {}: invalid special token count {:?}",
                count_line + 1,
                count
            ))
        })?;

        let mut special_tokens = SpecialTokens::new();
        for _ in 0..count {
            let (index, line) = lines.next().ok_or_else(|| {
                TokenizerError::Load(format!("expected {} special tokens, file ended early", count))
            })?;
            let (literal, id) = line
                .rsplit_once(' ')
                .and_then(|(literal, id)| id.parse::<u32>().ok().map(|id| (literal, id)))
                .ok_or_else(|| {
                    TokenizerError::Load(format!(
                        "line {}: invalid special token line {:?}",
                        index + 1,
                        line
                    ))
                })?;
            special_tokens
                .register(literal, id)
                .map_err(|e| TokenizerError::Load(format!("line {}: {}", index + 1, e)))?;
        }

        let mut rest: Vec<(usize, &str)> = lines.collect();
        while rest.last().is_some_and(|(_, line)| line.trim().is_empty()) {
            rest.pop();
        }

        let mut merges = MergeTable::with_capacity(rest.len());
        for (offset, (index, line)) in rest.into_iter().enumerate() {
            let pair = parse_pair(line).ok_or_else(|| {
                TokenizerError::Load(format!("line {}: invalid merge line {:?}", index + 1, line))
            })?;
            merges.add_merge(pair, BYTE_VOCAB_SIZE + offset as u32)?;
        }

        Ok(Self {
            pattern,
            special_tokens,
            merges,
        })
    }
}

fn has_line_break(s: &str) -> bool {
    s.contains(|c: char| c == '\n' || c == '\r')
}

fn parse_pair(line: &str) -> Option<(u32, u32)> {
    let mut parts = line.split_whitespace();
    let left = parts.next()?.parse().ok()?;
    let right = parts.next()?.parse().ok()?;
    match parts.next() {
        Some(_) => None,
        None => Some((left, right)),
    }
}
