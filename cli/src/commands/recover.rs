//! Recover command implementation.

use clap::Parser;

/// Recover command arguments.
#[derive(Parser)]
pub struct RecoverCommand {
    /// Flat rank table, one `<base64 token> <rank>` per line
    #[arg(short, long)]
    pub rank_table: PathBuf,

    /// Split pattern the table was trained with
    #[arg(short, long, value_enum, default_value_t = PatternArg::Gpt4)]
    pub pattern: PatternArg,

    /// Text to encode with the recovered tokenizer ("-" reads stdin)
    #[arg(short, long)]
    pub input: Option<String>,
}

use super::{format_ids, read_input, PatternArg};
use anyhow::Result as AnyhowResult;
use pmbpe_tokenizer::{Tokenizer, TokenizerLoader};
use std::path::PathBuf;

pub fn run(cmd: RecoverCommand) -> AnyhowResult<()> {
    let ranks = TokenizerLoader::load_rank_table(&cmd.rank_table)?;
    let tokenizer = Tokenizer::builder()
        .pattern(cmd.pattern.into())
        .build_pretrained(&ranks)?;

    println!(
        "Recovered {} merges ({} byte order)",
        tokenizer.merges().len(),
        if tokenizer.permutation().is_some() {
            "permuted"
        } else {
            "identity"
        }
    );

    if let Some(input) = cmd.input {
        let text = read_input(input)?;
        println!("{}", format_ids(&tokenizer.encode_ordinary(&text)?));
    }

    Ok(())
}
