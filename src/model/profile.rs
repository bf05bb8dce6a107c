use std::path::Path;

use serde::Deserialize;

/// Editorial feature selection for the attribution-vs-score view.
pub const VS_SCORE_FEATURES_V1: [&str; 8] = [
    "EXT_SOURCE_1",
    "EXT_SOURCE_2",
    "EXT_SOURCE_3",
    "DAYS_BIRTH",
    "DAYS_EMPLOYED",
    "AMT_CREDIT",
    "AMT_ANNUITY",
    "AMT_GOODS_PRICE",
];

pub const VS_SCORE_FEATURE_COUNT: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("cannot read profile {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("cannot parse profile {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("invalid profile: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportProfile {
    pub decision_threshold: f64,
    pub band_low_edge: f64,
    pub band_high_edge: f64,
    pub top_k_features: usize,
    pub vs_score_features: Vec<String>,
}

impl Default for ExportProfile {
    fn default() -> Self {
        Self::default_v1()
    }
}

impl ExportProfile {
    pub fn default_v1() -> Self {
        Self {
            decision_threshold: 0.3,
            band_low_edge: 0.2,
            band_high_edge: 0.5,
            top_k_features: 15,
            vs_score_features: VS_SCORE_FEATURES_V1.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let text = std::fs::read_to_string(path).map_err(|source| ProfileError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ProfileError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        if !(0.0..=1.0).contains(&self.decision_threshold) {
            return Err(ProfileError::Invalid(format!(
                "decision_threshold {} outside [0, 1]",
                self.decision_threshold
            )));
        }
        if !(self.band_low_edge > 0.0
            && self.band_low_edge < self.band_high_edge
            && self.band_high_edge <= 1.0)
        {
            return Err(ProfileError::Invalid(format!(
                "band edges must satisfy 0 < low < high <= 1 (got {}, {})",
                self.band_low_edge, self.band_high_edge
            )));
        }
        if self.top_k_features == 0 {
            return Err(ProfileError::Invalid(
                "top_k_features must be at least 1".to_string(),
            ));
        }
        if self.vs_score_features.len() != VS_SCORE_FEATURE_COUNT {
            return Err(ProfileError::Invalid(format!(
                "vs_score_features needs exactly {} names, got {}",
                VS_SCORE_FEATURE_COUNT,
                self.vs_score_features.len()
            )));
        }
        for (i, name) in self.vs_score_features.iter().enumerate() {
            if self.vs_score_features[..i].contains(name) {
                return Err(ProfileError::Invalid(format!(
                    "duplicate vs_score feature: {}",
                    name
                )));
            }
        }
        Ok(())
    }
}
