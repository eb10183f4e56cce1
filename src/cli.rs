use std::path::PathBuf;

use clap::builder::TypedValueParser;
use clap::{Args, Parser, Subcommand};

use crate::resampling::DEFAULT_TRIALS;
use crate::scores::DEFAULT_SCORE_COLUMN;

#[derive(Parser, Debug)]
#[command(
    name = "conllsig",
    version,
    about = "Significance testing for CoNLL evaluation score files"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Paired bootstrap test of whether system B beats system A.
    Bootstrap(BootstrapArgs),
}

#[derive(Args, Debug, Clone)]
pub struct BootstrapArgs {
    /// Per-item scores of the baseline system.
    pub system_a: PathBuf,

    /// Per-item scores of the candidate system.
    pub system_b: PathBuf,

    #[arg(long, default_value_t = DEFAULT_TRIALS, value_parser = clap::value_parser!(u64).range(1..).map(|value| value as usize))]
    pub trials: usize,

    /// Zero-based whitespace field holding the score.
    #[arg(long, default_value_t = DEFAULT_SCORE_COLUMN)]
    pub score_column: usize,

    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, default_value_t = false)]
    pub parallel: bool,

    #[arg(long, requires = "parallel")]
    pub threads: Option<usize>,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}
