//! Encode command implementation.

use clap::Parser;

/// Encode command arguments.
#[derive(Parser)]
pub struct EncodeCommand {
    /// Path to the trained `.model` file
    #[arg(short, long)]
    pub model: PathBuf,

    /// Text to encode ("-" reads stdin)
    #[arg(short, long)]
    pub input: String,

    /// Special token handling: all, none or none_raise
    #[arg(short, long, default_value = "none_raise")]
    pub allowed_special: String,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

use super::{format_ids, read_input};
use anyhow::Result as AnyhowResult;
use pmbpe_tokenizer::{AllowedSpecial, Tokenizer};
use std::path::PathBuf;

pub fn run(cmd: EncodeCommand) -> AnyhowResult<()> {
    let allowed: AllowedSpecial = cmd.allowed_special.parse()?;
    let tokenizer = Tokenizer::load(&cmd.model)?;

    let input_text = read_input(cmd.input)?;
    let ids = tokenizer.encode(&input_text, &allowed)?;
    let output = format_ids(&ids);

    match &cmd.output {
        Some(path) => {
            std::fs::write(path, &output)?;
            println!("Encoded {} tokens to {}", ids.len(), path.display());
        }
        None => {
            println!("{}", output);
        }
    }

    Ok(())
}
