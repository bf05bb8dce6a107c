use crate::input::InputBundle;
use crate::model::ensemble::sigmoid_f32;

#[derive(Debug, Clone)]
pub struct ScoredTable {
    /// `f64` margin, the target of the attribution sum.
    pub margin: Vec<f64>,
    /// Probabilities computed in `f32` and widened.
    pub proba: Vec<f64>,
    pub predicted: Vec<u8>,
    pub actual: Vec<u8>,
    pub threshold: f64,
}

impl ScoredTable {
    pub fn n_rows(&self) -> usize {
        self.proba.len()
    }
}

pub fn predicted_label(proba: f64, threshold: f64) -> u8 {
    u8::from(proba >= threshold)
}

pub fn run_stage2(bundle: &InputBundle, threshold: f64) -> ScoredTable {
    let n_rows = bundle.features.n_rows;
    let mut margin = Vec::with_capacity(n_rows);
    let mut proba = Vec::with_capacity(n_rows);
    let mut predicted = Vec::with_capacity(n_rows);
    let mut model_row = Vec::with_capacity(bundle.model.n_features);

    for row in 0..n_rows {
        bundle
            .mapping
            .model_row(bundle.features.row(row), &mut model_row);
        let m = bundle.model.predict_margin(&model_row);
        let p = f64::from(sigmoid_f32(bundle.model.predict_margin_f32(&model_row)));
        margin.push(m);
        proba.push(p);
        predicted.push(predicted_label(p, threshold));
    }

    let flagged = predicted.iter().filter(|&&v| v == 1).count();
    tracing::info!(
        rows = n_rows,
        threshold,
        flagged,
        "scored validation rows"
    );
    if n_rows > 1 && proba.iter().all(|&p| p == proba[0]) {
        tracing::warn!(proba = proba[0], "every row received the same probability");
    }

    ScoredTable {
        margin,
        proba,
        predicted,
        actual: bundle.labels.values.clone(),
        threshold,
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_score.rs"]
mod tests;
