// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-wall quality scoring and defect reporting.

use crate::point::Point;
use serde::{Deserialize, Serialize};

/// Kind of geometric defect found during quality assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    SliverFace,
    MicroGap,
    SelfIntersection,
    DegenerateElement,
    AccuracyLoss,
    MissingMiterApex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IssueSeverity {
    Info,
    Warning,
    Critical,
}

/// One reported defect with a suggested remedy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    pub kind: IssueKind,
    pub severity: IssueSeverity,
    /// Where the defect sits, when localizable.
    pub location: Option<Point>,
    pub suggested_fix: String,
    /// The shape healing engine can repair this without user input.
    pub auto_fixable: bool,
}

/// Scores and defect counts for one wall's resolved geometry.
///
/// Scores are in 0.0 - 1.0. The geometric-accuracy score is a weighted
/// heuristic (point accuracy, resolution-method bonus, processing-time
/// bonus) kept for compatibility with earlier documents; it is tunable,
/// not a correctness proof.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct QualityMetrics {
    pub geometric_accuracy: f64,
    pub topological_consistency: f64,
    pub manufacturability: f64,
    pub architectural_compliance: f64,

    pub sliver_count: usize,
    pub micro_gap_count: usize,
    pub self_intersection_count: usize,
    pub degenerate_count: usize,

    pub complexity: f64,
    /// Vertices resolved per millisecond.
    pub processing_efficiency: f64,
    /// Estimated memory footprint of the resolved geometry, bytes.
    pub memory_estimate_bytes: usize,

    pub issues: Vec<Issue>,
}

impl QualityMetrics {
    /// Total defects across all counters.
    pub fn defect_count(&self) -> usize {
        self.sliver_count + self.micro_gap_count + self.self_intersection_count + self.degenerate_count
    }

    /// No defects and every score above the given floor.
    pub fn passes(&self, floor: f64) -> bool {
        self.defect_count() == 0
            && self.geometric_accuracy >= floor
            && self.topological_consistency >= floor
    }

    /// Worst severity among reported issues.
    pub fn worst_severity(&self) -> Option<IssueSeverity> {
        self.issues.iter().map(|i| i.severity).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defect_count_sums_counters() {
        let m = QualityMetrics {
            sliver_count: 2,
            micro_gap_count: 1,
            ..Default::default()
        };
        assert_eq!(m.defect_count(), 3);
        assert!(!m.passes(0.5));
    }

    #[test]
    fn clean_metrics_pass() {
        let m = QualityMetrics {
            geometric_accuracy: 0.95,
            topological_consistency: 0.9,
            ..Default::default()
        };
        assert!(m.passes(0.8));
    }

    #[test]
    fn worst_severity_picks_critical() {
        let m = QualityMetrics {
            issues: vec![
                Issue {
                    kind: IssueKind::MicroGap,
                    severity: IssueSeverity::Warning,
                    location: None,
                    suggested_fix: "run healing".into(),
                    auto_fixable: true,
                },
                Issue {
                    kind: IssueKind::SelfIntersection,
                    severity: IssueSeverity::Critical,
                    location: None,
                    suggested_fix: "rebuild offsets".into(),
                    auto_fixable: false,
                },
            ],
            ..Default::default()
        };
        assert_eq!(m.worst_severity(), Some(IssueSeverity::Critical));
    }
}
