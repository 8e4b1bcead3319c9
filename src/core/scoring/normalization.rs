//! Feature normalization into [0, 1].
//!
//! Single profiles are normalized against the catalogue's expected ranges.
//! Batches of profiles can additionally be min-max normalized per feature
//! for side-by-side reports. Degenerate ranges and zero-variance columns
//! map to the neutral 0.5.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::featureset::{FeatureDefinition, FeatureVector, STYLE_FEATURES};

/// Value used for degenerate ranges.
pub const NEUTRAL_NORMALIZED: f64 = 0.5;

/// Normalizes raw style features by catalogue range.
#[derive(Debug, Clone, Copy)]
pub struct FeatureNormalizer {
    definitions: &'static [FeatureDefinition],
}

impl Default for FeatureNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureNormalizer {
    /// Normalizer over the style feature catalogue.
    pub fn new() -> Self {
        Self {
            definitions: STYLE_FEATURES.as_slice(),
        }
    }

    /// Normalize one value against its definition.
    pub fn normalize_value(definition: &FeatureDefinition, value: f64) -> f64 {
        let range = definition.max_value - definition.min_value;
        if range.abs() < f64::EPSILON {
            return NEUTRAL_NORMALIZED;
        }
        let clamped = definition.clamp_value(value);
        ((clamped - definition.min_value) / range).clamp(0.0, 1.0)
    }

    /// Normalize a raw vector into a complete vector in catalogue order.
    ///
    /// Missing features take their normalized default. Unknown features are
    /// dropped.
    pub fn normalize(&self, raw: &FeatureVector) -> FeatureVector {
        let mut normalized = FeatureVector::new();
        for definition in self.definitions {
            let value = raw.get(definition.name).unwrap_or(definition.default_value);
            normalized.insert(definition.name, Self::normalize_value(definition, value));
        }
        normalized
    }

    /// Normalized value of a feature that is present in `raw`.
    pub fn normalized(&self, raw: &FeatureVector, name: &str) -> Option<f64> {
        let value = raw.get(name)?;
        self.definitions
            .iter()
            .find(|d| d.name == name)
            .map(|d| Self::normalize_value(d, value))
    }
}

/// Observed range of one feature across a batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnRange {
    /// Smallest observed value
    pub min: f64,
    /// Largest observed value
    pub max: f64,
}

/// Min-max normalize each feature across `vectors`.
///
/// Features absent from a vector stay absent. Columns whose values are all
/// equal normalize to 0.5.
pub fn min_max_normalize(vectors: &[FeatureVector]) -> Vec<FeatureVector> {
    let mut ranges: IndexMap<&str, ColumnRange> = IndexMap::new();
    for vector in vectors {
        for (name, value) in vector.iter().filter(|(_, v)| v.is_finite()) {
            ranges
                .entry(name)
                .and_modify(|r| {
                    r.min = r.min.min(value);
                    r.max = r.max.max(value);
                })
                .or_insert(ColumnRange {
                    min: value,
                    max: value,
                });
        }
    }

    vectors
        .iter()
        .map(|vector| {
            let mut normalized = FeatureVector::new();
            for (name, value) in vector.iter() {
                let scaled = match ranges.get(name) {
                    Some(range) if value.is_finite() && range.max - range.min > f64::EPSILON => {
                        (value - range.min) / (range.max - range.min)
                    }
                    _ => NEUTRAL_NORMALIZED,
                };
                normalized.insert(name, scaled);
            }
            normalized
        })
        .collect()
}
