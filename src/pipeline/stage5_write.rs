use std::fs;
use std::path::{Path, PathBuf};

use crate::input::InputBundle;
use crate::model::profile::ExportProfile;
use crate::pipeline::stage2_score::ScoredTable;
use crate::pipeline::stage3_explain::Stage3Output;
use crate::pipeline::stage4_aggregate::Stage4Output;
use crate::report::csv::CsvWriter;
use crate::report::{format_f64, format_proba};
use crate::report::json::{
    RunSummary, SummaryInputs, SummaryModel, SummaryScoring, render_summary_json,
};

pub const GLOBAL_IMPORTANCE_CSV: &str = "global_shap_importance.csv";
pub const RISK_DISTRIBUTION_CSV: &str = "risk_distribution.csv";
pub const BANDED_CSV: &str = "agg_shap_by_risk_band.csv";
pub const VS_SCORE_CSV: &str = "shap_vs_risk_long.csv";
pub const CONFUSION_DETAIL_CSV: &str = "confusion_prediction_only.csv";
pub const CONFUSION_SUMMARY_CSV: &str = "confusion_summary.csv";
pub const CONFUSION_COMBINED_CSV: &str = "confusion_combined.csv";
pub const RUN_SUMMARY_JSON: &str = "run_summary.json";

const CONFUSION_SUMMARY_HEADER: [&str; 6] = [
    "Metric",
    "Count",
    "loan_default_proba",
    "actual_label",
    "predicted_label",
    "Source",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    pub combined_confusion: bool,
}

#[derive(Debug, Clone)]
pub struct Stage5Input<'a> {
    pub bundle: &'a InputBundle,
    pub profile: &'a ExportProfile,
    pub scored: &'a ScoredTable,
    pub explained: &'a Stage3Output,
    pub views: &'a Stage4Output,
    pub tool_name: String,
    pub tool_version: String,
}

/// Writes every view into `out_dir` and returns the written paths.
pub fn write_reports(
    input: &Stage5Input<'_>,
    out_dir: &Path,
    options: WriteOptions,
) -> std::io::Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;
    let mut written = Vec::new();
    let views = input.views;

    let path = out_dir.join(GLOBAL_IMPORTANCE_CSV);
    let mut w = CsvWriter::create(&path, &["feature_name", "mean_abs_shap_value"])?;
    for f in &views.importance {
        w.write_row([f.feature.clone(), format_f64(f.mean_abs_shap)])?;
    }
    log_written(&path, w.finish()?);
    written.push(path);

    let path = out_dir.join(RISK_DISTRIBUTION_CSV);
    let mut w = CsvWriter::create(&path, &["loan_default_proba", "actual_label", "label"])?;
    for r in &views.risk_distribution {
        w.write_row([format_proba(r.proba), r.actual.to_string(), r.label.to_string()])?;
    }
    log_written(&path, w.finish()?);
    written.push(path);

    let path = out_dir.join(BANDED_CSV);
    let mut w = CsvWriter::create(&path, &["risk_band", "feature", "shap_value"])?;
    for b in &views.banded {
        w.write_row([
            b.band.label().to_string(),
            b.feature.clone(),
            format_f64(b.mean_shap),
        ])?;
    }
    log_written(&path, w.finish()?);
    written.push(path);

    let path = out_dir.join(VS_SCORE_CSV);
    let mut w = CsvWriter::create(&path, &["loan_default_proba", "feature", "shap_value"])?;
    for r in &views.vs_score {
        w.write_row([format_proba(r.proba), r.feature.clone(), format_f64(r.shap)])?;
    }
    log_written(&path, w.finish()?);
    written.push(path);

    let path = out_dir.join(CONFUSION_DETAIL_CSV);
    let mut w = CsvWriter::create(
        &path,
        &["loan_default_proba", "predicted_label", "actual_label"],
    )?;
    for r in &views.confusion_rows {
        w.write_row([
            format_proba(r.proba),
            r.predicted.to_string(),
            r.actual.to_string(),
        ])?;
    }
    log_written(&path, w.finish()?);
    written.push(path);

    let path = out_dir.join(CONFUSION_SUMMARY_CSV);
    let mut w = CsvWriter::create(&path, &CONFUSION_SUMMARY_HEADER)?;
    write_confusion_summary_rows(&mut w, input)?;
    log_written(&path, w.finish()?);
    written.push(path);

    if options.combined_confusion {
        let path = out_dir.join(CONFUSION_COMBINED_CSV);
        let mut w = CsvWriter::create(&path, &CONFUSION_SUMMARY_HEADER)?;
        for r in &views.confusion_rows {
            w.write_row([
                String::new(),
                String::new(),
                format_proba(r.proba),
                r.actual.to_string(),
                r.predicted.to_string(),
                "Prediction".to_string(),
            ])?;
        }
        write_confusion_summary_rows(&mut w, input)?;
        log_written(&path, w.finish()?);
        written.push(path);
    }

    let path = out_dir.join(RUN_SUMMARY_JSON);
    let mut outputs: Vec<String> = written
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    outputs.push(RUN_SUMMARY_JSON.to_string());
    let summary = build_summary(input, outputs);
    let json = render_summary_json(&summary).map_err(std::io::Error::other)?;
    fs::write(&path, json)?;
    tracing::info!(path = %path.display(), "wrote run summary");
    written.push(path);

    Ok(written)
}

fn write_confusion_summary_rows(w: &mut CsvWriter, input: &Stage5Input<'_>) -> std::io::Result<()> {
    for (metric, count) in input.views.confusion.metrics() {
        w.write_row([
            metric.to_string(),
            count.to_string(),
            String::new(),
            String::new(),
            String::new(),
            "Summary".to_string(),
        ])?;
    }
    Ok(())
}

fn build_summary(input: &Stage5Input<'_>, outputs: Vec<String>) -> RunSummary {
    let bundle = input.bundle;
    let scored = input.scored;
    let mean_proba = if scored.n_rows() == 0 {
        0.0
    } else {
        scored.proba.iter().sum::<f64>() / scored.n_rows() as f64
    };

    RunSummary {
        tool: input.tool_name.clone(),
        tool_version: input.tool_version.clone(),
        inputs: SummaryInputs {
            model: bundle.paths.model.display().to_string(),
            features: bundle.paths.features.display().to_string(),
            labels: bundle.paths.labels.display().to_string(),
            n_rows: bundle.features.n_rows,
            n_features: bundle.features.n_cols(),
            n_positive_labels: bundle.labels.positives(),
        },
        model: SummaryModel {
            objective: bundle.model.objective.name().to_string(),
            n_trees: bundle.model.trees.len(),
            n_model_features: bundle.model.n_features,
            max_depth: bundle.model.max_depth(),
            expected_value: input.explained.attributions.expected_value,
            max_additivity_error: input.explained.max_additivity_error,
        },
        scoring: SummaryScoring {
            decision_threshold: scored.threshold,
            band_edges: [input.profile.band_low_edge, input.profile.band_high_edge],
            top_k_features: input.profile.top_k_features,
            vs_score_features: input.profile.vs_score_features.clone(),
            mean_proba,
        },
        confusion: input.views.confusion,
        outputs,
    }
}

fn log_written(path: &Path, rows: usize) {
    tracing::info!(path = %path.display(), rows, "wrote csv");
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage5_write.rs"]
mod tests;
