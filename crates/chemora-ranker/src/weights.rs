//! Weight vectors for method ranking policies.

use serde::{Deserialize, Serialize};

/// Weights over the four normalised method features. Weights sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    /// Ordinal accuracy level
    #[serde(default)]
    pub accuracy: f64,
    /// Inverse computational scaling
    #[serde(default)]
    pub cost: f64,
    /// Number of implementing software packages
    #[serde(default)]
    pub availability: f64,
    /// Literature uptake (log-scaled citations)
    #[serde(default)]
    pub citations: f64,
}

impl Default for WeightVector {
    /// Accuracy-first prior used by the composite ranking.
    fn default() -> Self {
        Self::composite()
    }
}

impl WeightVector {
    pub fn composite() -> Self {
        Self {
            accuracy:     0.50,
            cost:         0.20,
            availability: 0.15,
            citations:    0.15,
        }
    }

    /// Cost/accuracy trade-off prior used by the efficiency view.
    pub fn efficiency() -> Self {
        Self {
            accuracy:     0.35,
            cost:         0.55,
            availability: 0.10,
            citations:    0.00,
        }
    }

    fn sum(&self) -> f64 {
        self.accuracy + self.cost + self.availability + self.citations
    }

    /// Validate that all weights sum to ~1.0 and none is negative.
    pub fn validate(&self) -> bool {
        self.as_array().iter().all(|w| *w >= 0.0) && (self.sum() - 1.0).abs() < 1e-6
    }

    /// Renormalise weights so they sum to 1.0
    pub fn normalise(&mut self) {
        let sum = self.sum();
        if sum > 0.0 {
            self.accuracy     /= sum;
            self.cost         /= sum;
            self.availability /= sum;
            self.citations    /= sum;
        }
    }

    pub fn normalised(mut self) -> Self {
        self.normalise();
        self
    }

    /// Convert to array for iteration.
    pub fn as_array(&self) -> [f64; 4] {
        [self.accuracy, self.cost, self.availability, self.citations]
    }
}
