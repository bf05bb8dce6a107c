use std::collections::BTreeMap;

use crate::input::InputError;
use crate::model::bands::RiskBand;
use crate::model::confusion::ConfusionCounts;
use crate::model::profile::ExportProfile;
use crate::pipeline::stage2_score::ScoredTable;
use crate::pipeline::stage3_explain::AttributionTable;

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureImportance {
    pub feature: String,
    pub column: usize,
    pub mean_abs_shap: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskDistributionRow {
    pub proba: f64,
    pub actual: u8,
    pub label: &'static str,
}

/// One (row, feature) cell of a melted attribution table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LongEntry {
    pub row: usize,
    pub column: usize,
    pub shap: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BandedAttribution {
    pub band: RiskBand,
    pub feature: String,
    pub mean_shap: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VsScoreRow {
    pub proba: f64,
    pub feature: String,
    pub shap: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfusionRow {
    pub proba: f64,
    pub predicted: u8,
    pub actual: u8,
}

#[derive(Debug, Clone)]
pub struct Stage4Output {
    pub importance: Vec<FeatureImportance>,
    pub risk_distribution: Vec<RiskDistributionRow>,
    pub banded: Vec<BandedAttribution>,
    pub vs_score: Vec<VsScoreRow>,
    pub confusion_rows: Vec<ConfusionRow>,
    pub confusion: ConfusionCounts,
}

pub fn run_stage4(
    scored: &ScoredTable,
    attributions: &AttributionTable,
    profile: &ExportProfile,
) -> Result<Stage4Output, InputError> {
    let importance = global_importance(attributions);
    let risk_distribution = risk_distribution(scored);
    let banded = banded_attribution(scored, attributions, &importance, profile);
    let vs_score = vs_score_long(scored, attributions, &profile.vs_score_features)?;
    let confusion_rows = confusion_rows(scored);
    let confusion = ConfusionCounts::from_labels(&scored.predicted, &scored.actual);
    debug_assert_eq!(confusion.total(), scored.n_rows());

    if let Some(top) = importance.first() {
        tracing::info!(
            feature = %top.feature,
            mean_abs_shap = top.mean_abs_shap,
            "top global feature"
        );
    }
    tracing::info!(
        banded_rows = banded.len(),
        vs_score_rows = vs_score.len(),
        ?confusion,
        "aggregated views"
    );

    Ok(Stage4Output {
        importance,
        risk_distribution,
        banded,
        vs_score,
        confusion_rows,
        confusion,
    })
}

/// Mean absolute attribution per feature, descending. Ties keep column order.
pub fn global_importance(attributions: &AttributionTable) -> Vec<FeatureImportance> {
    let n_rows = attributions.n_rows;
    let mut sums = vec![0.0f64; attributions.n_cols()];
    for row in 0..n_rows {
        for (col, v) in attributions.row(row).iter().enumerate() {
            sums[col] += v.abs();
        }
    }

    let mut out: Vec<FeatureImportance> = attributions
        .columns
        .iter()
        .enumerate()
        .map(|(col, name)| FeatureImportance {
            feature: name.clone(),
            column: col,
            mean_abs_shap: if n_rows == 0 {
                0.0
            } else {
                sums[col] / n_rows as f64
            },
        })
        .collect();
    out.sort_by(|a, b| b.mean_abs_shap.total_cmp(&a.mean_abs_shap));
    out
}

pub fn default_label_text(actual: u8) -> &'static str {
    if actual == 1 { "Default" } else { "No Default" }
}

pub fn risk_distribution(scored: &ScoredTable) -> Vec<RiskDistributionRow> {
    scored
        .proba
        .iter()
        .zip(&scored.actual)
        .map(|(&proba, &actual)| RiskDistributionRow {
            proba,
            actual,
            label: default_label_text(actual),
        })
        .collect()
}

/// Feature-major melt: every row for `columns[0]`, then every row for `columns[1]`, ...
pub fn melt(attributions: &AttributionTable, columns: &[usize]) -> Vec<LongEntry> {
    let mut out = Vec::with_capacity(attributions.n_rows * columns.len());
    for &column in columns {
        for row in 0..attributions.n_rows {
            out.push(LongEntry {
                row,
                column,
                shap: attributions.value(row, column),
            });
        }
    }
    out
}

pub fn top_columns(importance: &[FeatureImportance], k: usize) -> Vec<usize> {
    importance.iter().take(k).map(|f| f.column).collect()
}

/// Mean attribution per (risk band, feature) over the top-k features. Bands
/// run Low to High, features by name; unobserved bands are omitted.
pub fn banded_attribution(
    scored: &ScoredTable,
    attributions: &AttributionTable,
    importance: &[FeatureImportance],
    profile: &ExportProfile,
) -> Vec<BandedAttribution> {
    let columns = top_columns(importance, profile.top_k_features);
    let long = melt(attributions, &columns);

    let bands: Vec<RiskBand> = scored
        .proba
        .iter()
        .map(|&p| RiskBand::assign(p, profile.band_low_edge, profile.band_high_edge))
        .collect();

    let mut groups: BTreeMap<(RiskBand, &str), (f64, usize)> = BTreeMap::new();
    for entry in &long {
        let key = (
            bands[entry.row],
            attributions.columns[entry.column].as_str(),
        );
        let slot = groups.entry(key).or_insert((0.0, 0));
        slot.0 += entry.shap;
        slot.1 += 1;
    }

    groups
        .into_iter()
        .map(|((band, feature), (sum, count))| BandedAttribution {
            band,
            feature: feature.to_string(),
            mean_shap: sum / count as f64,
        })
        .collect()
}

pub fn vs_score_long(
    scored: &ScoredTable,
    attributions: &AttributionTable,
    features: &[String],
) -> Result<Vec<VsScoreRow>, InputError> {
    let mut columns = Vec::with_capacity(features.len());
    let mut missing = Vec::new();
    for name in features {
        match attributions.column_index(name) {
            Some(idx) => columns.push(idx),
            None => missing.push(name.as_str()),
        }
    }
    if !missing.is_empty() {
        return Err(InputError::InvalidInput(format!(
            "attribution-vs-score features not in feature table: {} (override with --vs-score-features)",
            missing.join(",")
        )));
    }

    Ok(melt(attributions, &columns)
        .into_iter()
        .map(|entry| VsScoreRow {
            proba: scored.proba[entry.row],
            feature: attributions.columns[entry.column].clone(),
            shap: entry.shap,
        })
        .collect())
}

pub fn confusion_rows(scored: &ScoredTable) -> Vec<ConfusionRow> {
    (0..scored.n_rows())
        .map(|i| ConfusionRow {
            proba: scored.proba[i],
            predicted: scored.predicted[i],
            actual: scored.actual[i],
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_aggregate.rs"]
mod tests;
