//! Decode command implementation.

use clap::Parser;

/// Decode command arguments.
#[derive(Parser)]
pub struct DecodeCommand {
    /// Path to the trained `.model` file
    #[arg(short, long)]
    pub model: PathBuf,

    /// Token IDs to decode (comma-separated)
    #[arg(short, long)]
    pub tokens: String,
}

use anyhow::{Context, Result as AnyhowResult};
use pmbpe_tokenizer::Tokenizer;
use std::path::PathBuf;

pub fn run(cmd: DecodeCommand) -> AnyhowResult<()> {
    let tokenizer = Tokenizer::load(&cmd.model)?;

    let ids: Vec<u32> = cmd
        .tokens
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .with_context(|| format!("invalid token id {:?}", s))
        })
        .collect::<AnyhowResult<Vec<_>>>()?;

    let text = tokenizer.decode(&ids)?;
    println!("{}", text);

    Ok(())
}
