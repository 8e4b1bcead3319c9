//! Sentiment distribution over semantic units (no model calls).

use serde::{Deserialize, Serialize};

use crate::detectors::semantic_units::{SemanticUnit, SentimentPolarity};

/// Share of units per polarity plus intensity statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentDistribution {
    /// Units counted
    pub unit_count: usize,
    /// Share of positive units
    pub positive: f64,
    /// Share of neutral units
    pub neutral: f64,
    /// Share of negative units
    pub negative: f64,
    /// Mean sentiment intensity over all units (1-5, 0 when empty)
    pub mean_intensity: f64,
    /// Mean intensity over non-neutral units (0 when there are none)
    pub charged_intensity: f64,
}

impl SentimentDistribution {
    /// Compute the distribution from unit sentiment fields.
    pub fn from_units(units: &[SemanticUnit]) -> Self {
        if units.is_empty() {
            return Self::default();
        }

        let n = units.len() as f64;
        let count = |polarity: SentimentPolarity| {
            units
                .iter()
                .filter(|u| u.sentiment_polarity() == polarity)
                .count() as f64
        };
        let charged: Vec<f64> = units
            .iter()
            .filter(|u| u.sentiment_polarity() != SentimentPolarity::Neutral)
            .map(|u| f64::from(u.sentiment_intensity()))
            .collect();

        Self {
            unit_count: units.len(),
            positive: count(SentimentPolarity::Positive) / n,
            neutral: count(SentimentPolarity::Neutral) / n,
            negative: count(SentimentPolarity::Negative) / n,
            mean_intensity: units
                .iter()
                .map(|u| f64::from(u.sentiment_intensity()))
                .sum::<f64>()
                / n,
            charged_intensity: if charged.is_empty() {
                0.0
            } else {
                charged.iter().sum::<f64>() / charged.len() as f64
            },
        }
    }

    /// Share of units carrying non-neutral sentiment.
    pub fn emotional_ratio(&self) -> f64 {
        self.positive + self.negative
    }
}
