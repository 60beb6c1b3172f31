//! CLI commands for the pmbpe tokenizer.

pub mod decode;
pub mod encode;
pub mod recover;
pub mod train;

pub use decode::DecodeCommand;
pub use encode::EncodeCommand;
pub use recover::RecoverCommand;
pub use train::TrainCommand;

use anyhow::Result as AnyhowResult;
use clap::ValueEnum;
use pmbpe_tokenizer::SplitPattern;

/// Split pattern choices on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PatternArg {
    /// GPT-4 split pattern
    Gpt4,
    /// GPT-2 split pattern
    Gpt2,
    /// No splitting
    None,
}

impl From<PatternArg> for SplitPattern {
    fn from(arg: PatternArg) -> Self {
        match arg {
            PatternArg::Gpt4 => SplitPattern::Gpt4,
            PatternArg::Gpt2 => SplitPattern::Gpt2,
            PatternArg::None => SplitPattern::NoSplit,
        }
    }
}

/// Read `input` literally, or all of stdin when it is "-".
pub fn read_input(input: String) -> AnyhowResult<String> {
    if input == "-" {
        use std::io::Read;
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(input)
    }
}

/// Format token IDs as a comma-separated list.
pub fn format_ids(ids: &[u32]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
