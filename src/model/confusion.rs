use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionCounts {
    pub true_positive: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_negative: usize,
}

impl ConfusionCounts {
    pub fn from_labels(predicted: &[u8], actual: &[u8]) -> Self {
        let mut counts = Self::default();
        for (&p, &a) in predicted.iter().zip(actual) {
            match (p, a) {
                (1, 1) => counts.true_positive += 1,
                (1, _) => counts.false_positive += 1,
                (_, 1) => counts.false_negative += 1,
                _ => counts.true_negative += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.false_negative + self.true_negative
    }

    /// Named counts in dashboard order.
    pub fn metrics(&self) -> [(&'static str, usize); 4] {
        [
            ("True Positive", self.true_positive),
            ("False Positive", self.false_positive),
            ("False Negative", self.false_negative),
            ("True Negative", self.true_negative),
        ]
    }
}
