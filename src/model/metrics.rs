//! Held-out evaluation: ROC AUC and a threshold-0.5 classification report

use serde::{Deserialize, Serialize};

/// Decision threshold used by the classification report
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Area under the ROC curve via the rank-sum statistic.
///
/// Tied scores receive their average rank. With only one class present
/// the curve is undefined and 0.5 is returned.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn roc_auc(scores: &[f64], labels: &[bool]) -> f64 {
    let n = scores.len().min(labels.len());
    let positives = labels[..n].iter().filter(|&&l| l).count();
    let negatives = n - positives;
    if positives == 0 || negatives == 0 {
        return 0.5;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut rank_sum = 0.0;
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && scores[order[end]].total_cmp(&scores[order[start]]).is_eq() {
            end += 1;
        }
        // ranks are 1-based; the tie group shares the mean of start+1..=end
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        for &i in &order[start..end] {
            if labels[i] {
                rank_sum += avg_rank;
            }
        }
        start = end;
    }

    let pos = positives as f64;
    let neg = negatives as f64;
    (rank_sum - pos * (pos + 1.0) / 2.0) / (pos * neg)
}

/// Binary confusion counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// Admitted, predicted admitted
    pub true_positive: usize,
    /// Not admitted, predicted admitted
    pub false_positive: usize,
    /// Not admitted, predicted not admitted
    pub true_negative: usize,
    /// Admitted, predicted not admitted
    pub false_negative: usize,
}

impl ConfusionMatrix {
    /// Tally predictions at `threshold`
    #[must_use]
    pub fn from_scores(scores: &[f64], labels: &[bool], threshold: f64) -> Self {
        let mut m = Self::default();
        for (&score, &label) in scores.iter().zip(labels) {
            match (score >= threshold, label) {
                (true, true) => m.true_positive += 1,
                (true, false) => m.false_positive += 1,
                (false, false) => m.true_negative += 1,
                (false, true) => m.false_negative += 1,
            }
        }
        m
    }

    /// Total samples
    #[must_use]
    pub const fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }
}

/// Per-family held-out scores recorded in the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// ROC AUC (selection metric)
    pub auc: f64,
    /// Fraction correct at threshold 0.5
    pub accuracy: f64,
    /// Positive predictive value
    pub precision: f64,
    /// True positive rate
    pub recall: f64,
    /// Harmonic mean of precision and recall
    pub f1: f64,
    /// Admitted samples in the held-out split
    pub support_positive: usize,
    /// Not-admitted samples in the held-out split
    pub support_negative: usize,
    /// Raw counts
    pub confusion: ConfusionMatrix,
}

impl ClassificationReport {
    /// Evaluate positive-class probabilities against true labels
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn evaluate(scores: &[f64], labels: &[bool]) -> Self {
        let confusion = ConfusionMatrix::from_scores(scores, labels, DECISION_THRESHOLD);
        let ratio = |num: usize, den: usize| {
            if den == 0 {
                0.0
            } else {
                num as f64 / den as f64
            }
        };

        let accuracy = ratio(
            confusion.true_positive + confusion.true_negative,
            confusion.total(),
        );
        let precision = ratio(
            confusion.true_positive,
            confusion.true_positive + confusion.false_positive,
        );
        let recall = ratio(
            confusion.true_positive,
            confusion.true_positive + confusion.false_negative,
        );
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            auc: roc_auc(scores, labels),
            accuracy,
            precision,
            recall,
            f1,
            support_positive: confusion.true_positive + confusion.false_negative,
            support_negative: confusion.true_negative + confusion.false_positive,
            confusion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auc_perfect_and_inverted() {
        let labels = [false, false, true, true];
        assert!((roc_auc(&[0.1, 0.2, 0.8, 0.9], &labels) - 1.0).abs() < 1e-12);
        assert!(roc_auc(&[0.9, 0.8, 0.2, 0.1], &labels).abs() < 1e-12);
    }

    #[test]
    fn test_auc_ties_average() {
        // every score tied: no ranking information
        let labels = [false, true, false, true];
        assert!((roc_auc(&[0.5; 4], &labels) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_auc_partial() {
        // one of four positive/negative pairs misordered
        let labels = [false, true, false, true];
        let scores = [0.1, 0.3, 0.4, 0.9];
        assert!((roc_auc(&scores, &labels) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_auc_single_class_is_half() {
        assert!((roc_auc(&[0.2, 0.9], &[true, true]) - 0.5).abs() < f64::EPSILON);
        assert!((roc_auc(&[], &[]) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_report() {
        let scores = [0.9, 0.6, 0.4, 0.2];
        let labels = [true, false, true, false];
        let report = ClassificationReport::evaluate(&scores, &labels);

        assert_eq!(report.confusion.true_positive, 1);
        assert_eq!(report.confusion.false_positive, 1);
        assert_eq!(report.confusion.true_negative, 1);
        assert_eq!(report.confusion.false_negative, 1);
        assert!((report.accuracy - 0.5).abs() < 1e-12);
        assert!((report.precision - 0.5).abs() < 1e-12);
        assert!((report.recall - 0.5).abs() < 1e-12);
        assert!((report.f1 - 0.5).abs() < 1e-12);
        assert_eq!(report.support_positive, 2);
        assert_eq!(report.support_negative, 2);
    }

    #[test]
    fn test_report_no_positive_predictions() {
        let report = ClassificationReport::evaluate(&[0.1, 0.2], &[true, false]);
        assert!(report.precision.abs() < f64::EPSILON);
        assert!(report.f1.abs() < f64::EPSILON);
    }
}
