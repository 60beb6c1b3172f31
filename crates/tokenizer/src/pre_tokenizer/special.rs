//! Special-token routing.
//!
//! Before segmentation, text is cut around exact occurrences of reserved
//! literals. Ordinary stretches go on to the segmenter; each literal is
//! emitted directly as its reserved id and never merged.

use aho_corasick::{AhoCorasick, MatchKind};
use ahash::AHashSet;
use compact_str::CompactString;
use pmbpe_core::{Result, SpecialTokens, TokenizerError};
use std::str::FromStr;

/// Which special literals are recognized during encoding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AllowedSpecial {
    /// Every registered literal
    All,
    /// No literal; they are encoded as ordinary text
    None,
    /// No literal; finding one in the text is an error
    #[default]
    NoneRaise,
    /// Only the named literals
    Set(AHashSet<CompactString>),
}

impl AllowedSpecial {
    /// Allow only the given literals.
    pub fn set<S: AsRef<str>>(literals: impl IntoIterator<Item = S>) -> Self {
        AllowedSpecial::Set(
            literals
                .into_iter()
                .map(|literal| CompactString::new(literal.as_ref()))
                .collect(),
        )
    }
}

impl FromStr for AllowedSpecial {
    type Err = TokenizerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(AllowedSpecial::All),
            "none" => Ok(AllowedSpecial::None),
            "none_raise" => Ok(AllowedSpecial::NoneRaise),
            other => Err(TokenizerError::InvalidArgument(format!(
                "allowed_special={:?} not understood (expected all, none or none_raise)",
                other
            ))),
        }
    }
}

/// A piece of routed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'t> {
    /// Ordinary text, to be segmented and merged
    Text(&'t str),
    /// A recognized literal, as its reserved id
    Special(u32),
}

/// Splits text around special-token literals.
#[derive(Debug, Clone, Default)]
pub struct SpecialTokenRouter {
    /// Registered literals, in registration order
    special: SpecialTokens,
    /// Matcher over every registered literal
    matcher: Option<AhoCorasick>,
}

impl SpecialTokenRouter {
    /// Build a router over a special-token registry.
    pub fn new(special: SpecialTokens) -> Result<Self> {
        let matcher = if special.is_empty() {
            None
        } else {
            Some(build_matcher(special.iter().map(|(literal, _)| literal))?)
        };
        Ok(Self { special, matcher })
    }

    /// The registry this router matches against.
    pub fn special_tokens(&self) -> &SpecialTokens {
        &self.special
    }

    /// Route `text` according to `allowed`.
    ///
    /// Empty text stretches are never emitted.
    pub fn route<'t>(&self, text: &'t str, allowed: &AllowedSpecial) -> Result<Vec<Segment<'t>>> {
        let Some(matcher) = &self.matcher else {
            return Ok(plain(text));
        };

        match allowed {
            AllowedSpecial::None => Ok(plain(text)),
            AllowedSpecial::NoneRaise => {
                if let Some(m) = matcher.find(text) {
                    return Err(TokenizerError::SpecialTokenConflict(
                        text[m.start()..m.end()].to_string(),
                    ));
                }
                Ok(plain(text))
            }
            AllowedSpecial::All => {
                let ids: Vec<u32> = self.special.iter().map(|(_, id)| id).collect();
                Ok(split_on(matcher, &ids, text))
            }
            AllowedSpecial::Set(names) => {
                let enabled: Vec<(&str, u32)> = self
                    .special
                    .iter()
                    .filter(|(literal, _)| names.contains(*literal))
                    .collect();
                if enabled.is_empty() {
                    return Ok(plain(text));
                }

                let subset = build_matcher(enabled.iter().map(|&(literal, _)| literal))?;
                let ids: Vec<u32> = enabled.iter().map(|&(_, id)| id).collect();
                Ok(split_on(&subset, &ids, text))
            }
        }
    }
}

fn build_matcher<'a>(literals: impl IntoIterator<Item = &'a str>) -> Result<AhoCorasick> {
    AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostFirst)
        .build(literals)
        .map_err(|e| TokenizerError::InvalidConfig(format!("special token matcher: {}", e)))
}

fn plain(text: &str) -> Vec<Segment<'_>> {
    if text.is_empty() {
        Vec::new()
    } else {
        vec![Segment::Text(text)]
    }
}

/// Cut `text` at every leftmost-first match; `ids[i]` is the id of pattern `i`.
fn split_on<'t>(matcher: &AhoCorasick, ids: &[u32], text: &'t str) -> Vec<Segment<'t>> {
    let mut segments = Vec::new();
    let mut last_end = 0;

    for m in matcher.find_iter(text) {
        if m.start() > last_end {
            segments.push(Segment::Text(&text[last_end..m.start()]));
        }
        segments.push(Segment::Special(ids[m.pattern().as_usize()]));
        last_end = m.end();
    }

    if last_end < text.len() {
        segments.push(Segment::Text(&text[last_end..]));
    }

    segments
}
