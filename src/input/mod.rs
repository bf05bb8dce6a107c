use std::path::PathBuf;

pub mod labels;
pub mod reader;
pub mod table;
pub mod xgboost;

use labels::{LabelVector, parse_labels};
use table::{FeatureTable, parse_feature_table};
use xgboost::load_xgboost_json;

use crate::model::ensemble::TreeEnsemble;

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing input: {0}")]
    MissingInput(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("model JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported model: {0}")]
    UnsupportedModel(String),
}

#[derive(Debug, Clone)]
pub struct InputPaths {
    pub model: PathBuf,
    pub features: PathBuf,
    pub labels: PathBuf,
}

/// Table column feeding each model feature, in model feature order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureMapping {
    pub table_col_by_model_feature: Vec<usize>,
}

impl FeatureMapping {
    pub fn model_row(&self, table_row: &[f64], out: &mut Vec<f64>) {
        out.clear();
        out.extend(self.table_col_by_model_feature.iter().map(|&c| table_row[c]));
    }
}

#[derive(Debug, Clone)]
pub struct InputBundle {
    pub paths: InputPaths,
    pub model: TreeEnsemble,
    pub features: FeatureTable,
    pub labels: LabelVector,
    pub mapping: FeatureMapping,
}

pub fn load_input(paths: &InputPaths) -> Result<InputBundle, InputError> {
    tracing::info!(
        model = %paths.model.display(),
        features = %paths.features.display(),
        labels = %paths.labels.display(),
        "loading inputs"
    );

    let model = load_xgboost_json(&paths.model)?;
    tracing::info!(
        trees = model.trees.len(),
        n_features = model.n_features,
        max_depth = model.max_depth(),
        objective = model.objective.name(),
        "loaded model"
    );

    let features = parse_feature_table(&paths.features)?;
    tracing::info!(
        rows = features.n_rows,
        columns = features.n_cols(),
        "loaded feature table"
    );

    let labels = parse_labels(&paths.labels)?;
    tracing::info!(
        column = %labels.name,
        rows = labels.len(),
        positives = labels.positives(),
        "loaded labels"
    );

    if labels.len() != features.n_rows {
        return Err(InputError::InvalidInput(format!(
            "label file has {} rows but feature table has {}",
            labels.len(),
            features.n_rows
        )));
    }

    let mapping = map_features(&model, &features)?;

    Ok(InputBundle {
        paths: paths.clone(),
        model,
        features,
        labels,
        mapping,
    })
}

pub fn map_features(
    model: &TreeEnsemble,
    table: &FeatureTable,
) -> Result<FeatureMapping, InputError> {
    if model.feature_names.is_empty() {
        if table.n_cols() < model.n_features {
            return Err(InputError::InvalidInput(format!(
                "model expects {} features but table has {} columns",
                model.n_features,
                table.n_cols()
            )));
        }
        if table.n_cols() > model.n_features {
            tracing::warn!(
                extra = table.n_cols() - model.n_features,
                "model has no feature names; trailing table columns are ignored"
            );
        }
        return Ok(FeatureMapping {
            table_col_by_model_feature: (0..model.n_features).collect(),
        });
    }

    let mut cols = Vec::with_capacity(model.n_features);
    let mut missing = Vec::new();
    for name in &model.feature_names {
        match table.column_index(name) {
            Some(idx) => cols.push(idx),
            None => missing.push(name.as_str()),
        }
    }
    if !missing.is_empty() {
        return Err(InputError::InvalidInput(format!(
            "feature table lacks model features: {}",
            missing.join(",")
        )));
    }
    let unused = table.n_cols().saturating_sub(cols.len());
    if unused > 0 {
        tracing::warn!(unused, "table columns not used by the model get zero attribution");
    }
    Ok(FeatureMapping {
        table_col_by_model_feature: cols,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/tests.rs"]
mod tests;
