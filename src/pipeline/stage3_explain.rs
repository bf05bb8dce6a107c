use crate::explain::explain_row;
use crate::input::InputBundle;
use crate::pipeline::stage2_score::ScoredTable;

/// Relative tolerance on `|sum(phi) + expected - margin|`.
const ADDITIVITY_TOLERANCE: f64 = 1e-6;

/// Per-row attributions laid out like the feature table.
#[derive(Debug, Clone)]
pub struct AttributionTable {
    pub columns: Vec<String>,
    pub n_rows: usize,
    pub expected_value: f64,
    values: Vec<f64>,
}

impl AttributionTable {
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn row(&self, idx: usize) -> &[f64] {
        let n_cols = self.n_cols();
        &self.values[idx * n_cols..(idx + 1) * n_cols]
    }

    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.n_cols() + col]
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

#[derive(Debug, Clone)]
pub struct Stage3Output {
    pub attributions: AttributionTable,
    pub max_additivity_error: f64,
}

pub fn run_stage3(bundle: &InputBundle, scored: &ScoredTable) -> Stage3Output {
    let n_rows = bundle.features.n_rows;
    let n_cols = bundle.features.n_cols();
    let n_model = bundle.model.n_features;
    let expected_value = bundle.model.expected_value();

    let mut values = vec![0.0f64; n_rows * n_cols];
    let mut model_row = Vec::with_capacity(n_model);
    let mut phi = vec![0.0f64; n_model];
    let mut max_error = 0.0f64;
    let mut worst_row = 0usize;

    for row in 0..n_rows {
        bundle
            .mapping
            .model_row(bundle.features.row(row), &mut model_row);
        explain_row(&bundle.model, &model_row, &mut phi);

        let out = &mut values[row * n_cols..(row + 1) * n_cols];
        for (feature, &col) in bundle.mapping.table_col_by_model_feature.iter().enumerate() {
            out[col] += phi[feature];
        }

        let sum: f64 = phi.iter().sum();
        let margin = scored.margin[row];
        let err = (sum + expected_value - margin).abs() / margin.abs().max(1.0);
        if err > max_error {
            max_error = err;
            worst_row = row;
        }
    }

    tracing::info!(
        rows = n_rows,
        features = n_cols,
        expected_value,
        max_additivity_error = max_error,
        "computed TreeSHAP attributions"
    );
    if max_error > ADDITIVITY_TOLERANCE {
        tracing::warn!(
            row = worst_row,
            error = max_error,
            "attributions do not sum to the model margin"
        );
    }

    Stage3Output {
        attributions: AttributionTable {
            columns: bundle.features.columns.clone(),
            n_rows,
            expected_value,
            values,
        },
        max_additivity_error: max_error,
    }
}

#[cfg(test)]
pub(crate) fn attribution_table_from_rows(
    columns: Vec<String>,
    rows: &[Vec<f64>],
    expected_value: f64,
) -> AttributionTable {
    AttributionTable {
        n_rows: rows.len(),
        values: rows.iter().flatten().copied().collect(),
        columns,
        expected_value,
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_explain.rs"]
mod tests;
