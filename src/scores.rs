use std::fs;
use std::io::BufRead;
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::util::sha256_hex;

/// Fourth whitespace-separated field, where the evaluation scripts put the
/// per-sentence score.
pub const DEFAULT_SCORE_COLUMN: usize = 3;

/// Scores of one system together with the digest of the bytes they came from.
#[derive(Debug, Clone)]
pub struct LoadedScores {
    pub scores: Vec<f64>,
    pub sha256: String,
}

/// Reads `path` exactly once, so pipes and process substitutions hash the
/// same bytes that were parsed.
pub fn read_scores(path: &Path, column: usize) -> Result<LoadedScores> {
    let raw = fs::read(path).with_context(|| format!("failed to open {}", path.display()))?;
    let scores = parse_scores(raw.as_slice(), column, &path.display().to_string())?;

    Ok(LoadedScores {
        scores,
        sha256: sha256_hex(&raw),
    })
}

pub fn parse_scores<R: BufRead>(reader: R, column: usize, source: &str) -> Result<Vec<f64>> {
    let mut scores = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("failed to read {source}:{line_no}"))?;

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }

        let Some(raw) = fields.get(column) else {
            bail!(
                "{source}:{line_no}: expected a score in field {} but found {} field(s)",
                column + 1,
                fields.len()
            );
        };

        let score = raw
            .parse::<f64>()
            .with_context(|| format!("{source}:{line_no}: invalid score {raw:?}"))?;
        if !score.is_finite() {
            bail!("{source}:{line_no}: score {raw:?} is not finite");
        }

        scores.push(score);
    }

    Ok(scores)
}
