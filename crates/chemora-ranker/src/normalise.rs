//! Feature normalisation: every method attribute mapped into [0, 1].

use chemora_common::{Annotation, MethodRecord};
use serde::{Deserialize, Serialize};

/// Top of the ordinal accuracy scale (benchmark / gold standard).
pub const MAX_ACCURACY_ORDINAL: f64 = 5.0;
/// Scaling exponents are clamped to [1, MAX_SCALING_EXPONENT].
pub const MAX_SCALING_EXPONENT: f64 = 8.0;
/// Package count at which availability saturates.
pub const AVAILABILITY_SATURATION: f64 = 5.0;
/// Citation count at which the log-scaled signal saturates.
pub const CITATION_SATURATION: f64 = 100_000.0;

/// Cost score used when neither scaling nor a complexity label is known.
const UNKNOWN_COST: f64 = 0.5;

/// Normalised features of one method record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MethodFeatures {
    pub accuracy: f64,
    /// Higher means cheaper.
    pub cost: f64,
    pub availability: f64,
    pub citations: f64,
}

impl MethodFeatures {
    pub fn of(method: &MethodRecord) -> Self {
        Self {
            accuracy: accuracy_norm(method.accuracy_level.as_ref()),
            cost: cost_norm(method),
            availability: availability_norm(method.software.len()),
            citations: citation_norm(method.citations),
        }
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.accuracy, self.cost, self.availability, self.citations]
    }
}

/// Ordinal accuracy / 5. Missing or unrecognised annotations score 0.
pub fn accuracy_norm(level: Option<&Annotation>) -> f64 {
    level
        .and_then(Annotation::ordinal)
        .map(|o| (o / MAX_ACCURACY_ORDINAL).clamp(0.0, 1.0))
        .unwrap_or(0.0)
}

/// Inverse cost: O(N^1) → 1.0, O(N^8) or worse → 0.0. Falls back to coarse
/// complexity labels, then to a neutral 0.5.
pub fn cost_norm(method: &MethodRecord) -> f64 {
    if let Some(exp) = method.scaling_exponent() {
        let e = exp.clamp(1.0, MAX_SCALING_EXPONENT);
        return (MAX_SCALING_EXPONENT - e) / (MAX_SCALING_EXPONENT - 1.0);
    }
    method
        .complexity
        .as_deref()
        .and_then(complexity_label_cost)
        .unwrap_or(UNKNOWN_COST)
}

fn complexity_label_cost(label: &str) -> Option<f64> {
    let key = label.trim().to_lowercase().replace(['-', ' '], "_");
    Some(match key.as_str() {
        "very_low" => 0.95,
        "low" => 0.85,
        "medium" | "moderate" => 0.55,
        "high" => 0.3,
        "very_high" => 0.1,
        _ => return None,
    })
}

pub fn availability_norm(package_count: usize) -> f64 {
    (package_count as f64 / AVAILABILITY_SATURATION).min(1.0)
}

pub fn citation_norm(citations: Option<u64>) -> f64 {
    let c = citations.unwrap_or(0) as f64;
    ((1.0 + c).ln() / (1.0 + CITATION_SATURATION).ln()).clamp(0.0, 1.0)
}
