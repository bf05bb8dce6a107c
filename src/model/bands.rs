#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    pub fn label(self) -> &'static str {
        match self {
            RiskBand::Low => "Low Risk",
            RiskBand::Medium => "Medium Risk",
            RiskBand::High => "High Risk",
        }
    }

    /// Half-open bands `[0, low)`, `[low, high)`, `[high, 1]`.
    pub fn assign(proba: f64, low_edge: f64, high_edge: f64) -> RiskBand {
        if proba >= high_edge {
            RiskBand::High
        } else if proba >= low_edge {
            RiskBand::Medium
        } else {
            RiskBand::Low
        }
    }
}
