use serde::{Deserialize, Serialize};

pub const REPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemScores {
    pub path: String,
    pub sha256: String,
    pub score_count: usize,
    pub mean_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapReport {
    pub report_version: u32,
    pub generated_at: String,
    pub score_column: usize,
    pub system_a: SystemScores,
    pub system_b: SystemScores,
    pub trials: usize,
    pub wins: usize,
    pub win_percentage: f64,
    pub seed: u64,
    pub parallel: bool,
}
