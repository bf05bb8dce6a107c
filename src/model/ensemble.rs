use crate::model::tree::Tree;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    /// `binary:logistic` and `reg:logistic`; base score is a probability.
    Logistic,
    /// `binary:logitraw`; base score is already a margin.
    LogitRaw,
}

impl Objective {
    pub fn name(self) -> &'static str {
        match self {
            Objective::Logistic => "binary:logistic",
            Objective::LogitRaw => "binary:logitraw",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TreeEnsemble {
    pub trees: Vec<Tree>,
    pub base_margin: f64,
    pub objective: Objective,
    pub n_features: usize,
    /// Empty when the booster was saved without feature names.
    pub feature_names: Vec<String>,
}

impl TreeEnsemble {
    /// Raw log-odds for one row laid out in model feature order.
    pub fn predict_margin(&self, row: &[f64]) -> f64 {
        let mut margin = self.base_margin;
        for tree in &self.trees {
            margin += tree.leaf_value(row);
        }
        margin
    }

    /// Margin summed in `f32`, tree by tree, matching XGBoost's own predictor.
    /// Labels derive from this so rows near the threshold agree with the model.
    pub fn predict_margin_f32(&self, row: &[f64]) -> f32 {
        let mut margin = self.base_margin as f32;
        for tree in &self.trees {
            margin += tree.leaf_value(row) as f32;
        }
        margin
    }

    /// Baseline of the attribution decomposition.
    pub fn expected_value(&self) -> f64 {
        self.base_margin + self.trees.iter().map(Tree::mean_value).sum::<f64>()
    }

    pub fn max_depth(&self) -> usize {
        self.trees.iter().map(Tree::max_depth).max().unwrap_or(0)
    }
}

pub fn sigmoid_f32(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

pub fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}
