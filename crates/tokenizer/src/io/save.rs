//! Save functionality for trained tokenizers.
//!
//! A save writes two files next to each other: `<prefix>.model`, which
//! [`TokenizerLoader`](super::TokenizerLoader) reads back, and
//! `<prefix>.vocab`, a pretty-printed listing meant only for people.

use super::format::ModelFile;
use crate::pre_tokenizer::SplitPattern;
use ahash::AHashMap;
use pmbpe_core::{ByteLevelEncoder, Pair, Result, SpecialTokens, TokenizerError};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Tokenizer saver - handles saving trained models.
pub struct TokenizerSaver<'a> {
    /// Split pattern
    pattern: &'a SplitPattern,
    /// Special tokens, in registration order
    special: &'a SpecialTokens,
    /// Merge table and derived vocabulary
    encoder: &'a ByteLevelEncoder,
}

impl<'a> TokenizerSaver<'a> {
    /// Create a new tokenizer saver.
    pub fn new(
        pattern: &'a SplitPattern,
        special: &'a SpecialTokens,
        encoder: &'a ByteLevelEncoder,
    ) -> Self {
        Self {
            pattern,
            special,
            encoder,
        }
    }

    /// Save `<prefix>.model` and `<prefix>.vocab`.
    ///
    /// Returns the path of the model file.
    pub fn save(&self, prefix: &Path) -> Result<PathBuf> {
        let model_path = with_suffix(prefix, ".model");
        let vocab_path = with_suffix(prefix, ".vocab");

        self.save_model(&model_path)?;
        self.save_vocab(&vocab_path)?;

        log::info!(
            "saved {} merges and {} special tokens to {}",
            self.encoder.merges().len(),
            self.special.len(),
            model_path.display()
        );

        Ok(model_path)
    }

    /// Write the model file.
    ///
    /// The content goes to a temporary file in the same directory first and
    /// is renamed into place, so a failed save never leaves a partial model.
    pub fn save_model(&self, path: &Path) -> Result<()> {
        let content = ModelFile::render(self.pattern, self.special, self.encoder.merges())?;

        let tmp_path = with_suffix(path, ".tmp");
        let written = write_file(&tmp_path, content.as_bytes())
            .and_then(|()| fs::rename(&tmp_path, path).map_err(|err| io_error(path, err)));

        if written.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        written
    }

    /// Write the human-readable vocabulary listing.
    ///
    /// Merged tokens are shown with the two tokens they were made from:
    /// `[left][right] -> [token] id`. Raw bytes and special tokens are shown
    /// as `[token] id`. Invalid UTF-8 is replaced, so this file cannot be
    /// loaded back.
    pub fn save_vocab(&self, path: &Path) -> Result<()> {
        let vocab = self.encoder.vocab();
        let inverted: AHashMap<u32, Pair> = self
            .encoder
            .merges()
            .iter()
            .map(|(pair, new_id)| (new_id, pair))
            .collect();

        let file = File::create(path).map_err(|err| io_error(path, err))?;
        let mut writer = BufWriter::new(file);

        for (id, token) in vocab.iter() {
            let rendered = render_token(token);
            let line = match inverted.get(&id) {
                Some(&(left, right)) => {
                    let left = vocab.get(left).map(render_token).unwrap_or_default();
                    let right = vocab.get(right).map(render_token).unwrap_or_default();
                    format!("[{}][{}] -> [{}] {}", left, right, rendered, id)
                }
                None => format!("[{}] {}", rendered, id),
            };
            writeln!(writer, "{}", line).map_err(|err| io_error(path, err))?;
        }

        for (literal, id) in self.special.iter() {
            writeln!(writer, "[{}] {}", replace_control_characters(literal), id)
                .map_err(|err| io_error(path, err))?;
        }

        writer.flush().map_err(|err| io_error(path, err))
    }
}

fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    let file = File::create(path).map_err(|err| io_error(path, err))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(content)
        .and_then(|()| writer.flush())
        .map_err(|err| io_error(path, err))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|err| io_error(path, err))
}

fn io_error(path: &Path, err: std::io::Error) -> TokenizerError {
    TokenizerError::Io {
        path: path.to_path_buf(),
        err,
    }
}

/// Append `suffix` to the final path component.
pub(crate) fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Escape control characters as `\uXXXX` so each token stays on one line.
fn replace_control_characters(s: &str) -> String {
    s.chars()
        .map(|ch| {
            if ch.is_control() {
                format!("\\u{:04x}", ch as u32)
            } else {
                ch.to_string()
            }
        })
        .collect()
}

/// Render token bytes as text, replacing invalid UTF-8.
fn render_token(token: &[u8]) -> String {
    replace_control_characters(&String::from_utf8_lossy(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmbpe_core::MergeTable;

    fn encoder() -> ByteLevelEncoder {
        ByteLevelEncoder::new(MergeTable::from_pairs(vec![(104, 105), (256, 33)]).unwrap())
    }

    #[test]
    fn test_render_token() {
        assert_eq!(render_token(b"hi"), "hi");
        assert_eq!(render_token(b"\n\t"), "\\u000a\\u0009");
        assert_eq!(render_token(&[0xff]), "\u{fffd}");
    }

    #[test]
    fn test_with_suffix() {
        assert_eq!(
            with_suffix(Path::new("out/tok"), ".model"),
            PathBuf::from("out/tok.model")
        );
    }

    #[test]
    fn test_save_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("tok");
        let encoder = encoder();
        let special = SpecialTokens::from_pairs(vec![("<|eot|>", 258)]).unwrap();
        let pattern = SplitPattern::Gpt2;

        let model_path = TokenizerSaver::new(&pattern, &special, &encoder)
            .save(&prefix)
            .unwrap();

        assert_eq!(model_path, dir.path().join("tok.model"));
        assert!(!dir.path().join("tok.model.tmp").exists());

        let vocab = fs::read_to_string(dir.path().join("tok.vocab")).unwrap();
        let lines: Vec<&str> = vocab.lines().collect();
        assert_eq!(lines.len(), 259);
        assert_eq!(lines[97], "[a] 97");
        assert_eq!(lines[256], "[h][i] -> [hi] 256");
        assert_eq!(lines[257], "[hi][!] -> [hi!] 257");
        assert_eq!(lines[258], "[<|eot|>] 258");
    }

    #[test]
    fn test_failed_save_leaves_no_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tok.model");
        let special = SpecialTokens::from_pairs(vec![("bad\nliteral", 300)]).unwrap();
        let encoder = encoder();
        let pattern = SplitPattern::NoSplit;

        let result = TokenizerSaver::new(&pattern, &special, &encoder).save_model(&path);
        assert!(result.is_err());
        assert!(!path.exists());
    }
}
