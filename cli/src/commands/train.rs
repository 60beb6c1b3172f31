//! Train command implementation.

use clap::Parser;

/// Train command arguments.
#[derive(Parser)]
pub struct TrainCommand {
    /// Path to the training data file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output prefix; writes `<prefix>.model` and `<prefix>.vocab`
    #[arg(short, long)]
    pub output: PathBuf,

    /// Target vocabulary size, including the 256 byte tokens
    #[arg(short, long, default_value_t = 512)]
    pub vocab_size: usize,

    /// Minimum frequency for merges
    #[arg(long, default_value_t = 1)]
    pub min_frequency: u64,

    /// Split pattern
    #[arg(short, long, value_enum, default_value_t = PatternArg::Gpt4)]
    pub pattern: PatternArg,

    /// JSON file mapping special token literals to ids
    #[arg(short, long)]
    pub special_tokens: Option<PathBuf>,
}

use super::PatternArg;
use anyhow::{Context, Result as AnyhowResult};
use pmbpe_tokenizer::{Tokenizer, TokenizerLoader};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

pub fn run(cmd: TrainCommand) -> AnyhowResult<()> {
    log::info!(
        "training on {} (vocab size {}, pattern {:?})",
        cmd.input.display(),
        cmd.vocab_size,
        cmd.pattern
    );

    let data = fs::read_to_string(&cmd.input)
        .with_context(|| format!("failed to read {}", cmd.input.display()))?;

    let mut tokenizer = Tokenizer::builder()
        .pattern(cmd.pattern.into())
        .min_frequency(cmd.min_frequency)
        .build()?;

    let start = Instant::now();
    tokenizer.train(&data, cmd.vocab_size)?;
    log::info!(
        "trained {} merges in {:.2}s",
        tokenizer.merges().len(),
        start.elapsed().as_secs_f64()
    );

    if let Some(path) = &cmd.special_tokens {
        let special = TokenizerLoader::load_special_tokens(path)?;
        tokenizer.register_special_tokens(special.iter())?;
    }

    let model_path = tokenizer.save(&cmd.output)?;
    println!(
        "Saved tokenizer with {} tokens to {}",
        tokenizer.vocab_size(),
        model_path.display()
    );

    Ok(())
}
