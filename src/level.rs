use std::fmt;

use serde::Serialize;

/// Level cutoffs: 70th and 90th percentile of vehicle counts over the whole
/// dataset, all junctions pooled. Computed once at load by the store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuantileThresholds {
    pub p70: f64,
    pub p90: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrafficLevel {
    Low,
    Medium,
    High,
}

impl TrafficLevel {
    /// Total over all inputs: `> p90` is High, `> p70` is Medium, the rest
    /// (boundary values included) is Low.
    pub fn classify(predicted: f64, thresholds: &QuantileThresholds) -> Self {
        if predicted > thresholds.p90 {
            TrafficLevel::High
        } else if predicted > thresholds.p70 {
            TrafficLevel::Medium
        } else {
            TrafficLevel::Low
        }
    }
}

impl fmt::Display for TrafficLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrafficLevel::Low => "Low",
            TrafficLevel::Medium => "Medium",
            TrafficLevel::High => "High",
        };
        f.write_str(s)
    }
}
