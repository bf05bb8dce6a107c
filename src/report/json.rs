use serde::Serialize;

use crate::model::confusion::ConfusionCounts;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub tool: String,
    pub tool_version: String,
    pub inputs: SummaryInputs,
    pub model: SummaryModel,
    pub scoring: SummaryScoring,
    pub confusion: ConfusionCounts,
    pub outputs: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryInputs {
    pub model: String,
    pub features: String,
    pub labels: String,
    pub n_rows: usize,
    pub n_features: usize,
    pub n_positive_labels: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryModel {
    pub objective: String,
    pub n_trees: usize,
    pub n_model_features: usize,
    pub max_depth: usize,
    pub expected_value: f64,
    pub max_additivity_error: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryScoring {
    pub decision_threshold: f64,
    pub band_edges: [f64; 2],
    pub top_k_features: usize,
    pub vs_score_features: Vec<String>,
    pub mean_proba: f64,
}

pub fn render_summary_json(summary: &RunSummary) -> serde_json::Result<String> {
    let mut out = serde_json::to_string_pretty(summary)?;
    out.push('\n');
    Ok(out)
}
