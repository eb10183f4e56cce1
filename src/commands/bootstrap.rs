use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::info;

use crate::cli::BootstrapArgs;
use crate::model::{BootstrapReport, REPORT_VERSION, SystemScores};
use crate::resampling::{BootstrapOutcome, ScorePairs, count_wins, count_wins_par};
use crate::scores::{LoadedScores, read_scores};
use crate::util::{now_utc_string, write_json_pretty};

#[derive(Debug)]
struct BootstrapRun {
    outcome: BootstrapOutcome,
    seed: u64,
    system_a: SystemScores,
    system_b: SystemScores,
}

pub fn run(args: BootstrapArgs) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    run_with_output(&args, &mut output)?;
    output.flush()?;
    Ok(())
}

fn run_with_output<W: Write>(args: &BootstrapArgs, output: &mut W) -> Result<()> {
    let run = execute(args)?;

    let report = (args.json || args.report_path.is_some()).then(|| build_report(args, &run));

    match &report {
        Some(report) if args.json => {
            serde_json::to_writer_pretty(&mut *output, report)
                .context("failed to serialize bootstrap json output")?;
            writeln!(output)?;
        }
        _ => writeln!(output, "{}", run.outcome)?,
    }

    if let (Some(report_path), Some(report)) = (&args.report_path, &report) {
        write_json_pretty(report_path, report)?;
        info!(path = %report_path.display(), "wrote bootstrap report");
    }

    Ok(())
}

fn execute(args: &BootstrapArgs) -> Result<BootstrapRun> {
    let a_loaded = read_scores(&args.system_a, args.score_column)
        .with_context(|| format!("failed to load system A scores: {}", args.system_a.display()))?;
    let b_loaded = read_scores(&args.system_b, args.score_column)
        .with_context(|| format!("failed to load system B scores: {}", args.system_b.display()))?;

    info!(
        system_a = %args.system_a.display(),
        system_b = %args.system_b.display(),
        a_count = a_loaded.scores.len(),
        b_count = b_loaded.scores.len(),
        "loaded scores"
    );

    let LoadedScores {
        scores: a_scores,
        sha256: a_sha256,
    } = a_loaded;
    let LoadedScores {
        scores: b_scores,
        sha256: b_sha256,
    } = b_loaded;
    let pairs = ScorePairs::new(a_scores, b_scores)?;
    let system_a = describe_system(&args.system_a, a_sha256, pairs.system_a());
    let system_b = describe_system(&args.system_b, b_sha256, pairs.system_b());

    let seed = args.seed.unwrap_or_else(|| rand::rng().random());
    info!(
        seed,
        trials = args.trials,
        parallel = args.parallel,
        "starting paired bootstrap"
    );

    let outcome = if args.parallel {
        run_parallel(&pairs, args.trials, seed, args.threads)?
    } else {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        count_wins(&pairs, args.trials, &mut rng)?
    };

    info!(
        wins = outcome.wins,
        trials = outcome.trials,
        win_percentage = outcome.win_percentage(),
        "paired bootstrap completed"
    );

    Ok(BootstrapRun {
        outcome,
        seed,
        system_a,
        system_b,
    })
}

fn build_report(args: &BootstrapArgs, run: &BootstrapRun) -> BootstrapReport {
    BootstrapReport {
        report_version: REPORT_VERSION,
        generated_at: now_utc_string(),
        score_column: args.score_column,
        system_a: run.system_a.clone(),
        system_b: run.system_b.clone(),
        trials: run.outcome.trials,
        wins: run.outcome.wins,
        win_percentage: run.outcome.win_percentage(),
        seed: run.seed,
        parallel: args.parallel,
    }
}

fn run_parallel(
    pairs: &ScorePairs,
    trials: usize,
    seed: u64,
    threads: Option<usize>,
) -> Result<BootstrapOutcome> {
    let Some(threads) = threads else {
        return Ok(count_wins_par(pairs, trials, seed)?);
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .context("failed to build bootstrap thread pool")?;
    Ok(pool.install(|| count_wins_par(pairs, trials, seed))?)
}

fn describe_system(path: &Path, sha256: String, scores: &[f64]) -> SystemScores {
    SystemScores {
        path: path.display().to_string(),
        sha256,
        score_count: scores.len(),
        mean_score: scores.iter().sum::<f64>() / scores.len() as f64,
    }
}
