//! Profile similarity.
//!
//! All methods return a value in [0, 1], 1 meaning identical scores:
//!
//! - cosine: scores are centered on the neutral value, so the comparison
//!   measures agreement in *direction* from neutral; the cosine `c` maps to
//!   `(c + 1) / 2`. Identical vectors give 1; a neutral (zero) centered vector
//!   against anything else gives 0.5.
//! - euclidean: `exp(-d² / 2σ²)` with `σ = 0.25·√n`.
//! - weighted: `1 - Σ wᵢ·|aᵢ - bᵢ| / Σ wᵢ`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::errors::Result;
use crate::core::profile::{StyleDimension, StyleScores, NEUTRAL_SCORE};

use super::{ComparisonMethod, DIMENSION_COUNT};

const ZERO_NORM: f64 = 1e-12;

/// Similarity of two score vectors under `method`.
pub fn compare(a: &StyleScores, b: &StyleScores, method: &ComparisonMethod) -> Result<f64> {
    method.validate()?;
    let (a, b) = (a.as_array(), b.as_array());
    let value = match method {
        ComparisonMethod::Cosine => centered_cosine(&a, &b),
        ComparisonMethod::Euclidean => gaussian_kernel(&a, &b),
        ComparisonMethod::Weighted { weights } => weighted(&a, &b, weights),
    };
    Ok(value.clamp(0.0, 1.0))
}

fn centered_cosine(a: &[f64; 6], b: &[f64; 6]) -> f64 {
    if a == b {
        return 1.0;
    }
    let ca = a.map(|v| v - NEUTRAL_SCORE);
    let cb = b.map(|v| v - NEUTRAL_SCORE);
    let dot: f64 = ca.iter().zip(&cb).map(|(x, y)| x * y).sum();
    let na = ca.iter().map(|x| x * x).sum::<f64>().sqrt();
    let nb = cb.iter().map(|x| x * x).sum::<f64>().sqrt();
    if na < ZERO_NORM || nb < ZERO_NORM {
        return 0.5;
    }
    (dot / (na * nb) + 1.0) / 2.0
}

fn gaussian_kernel(a: &[f64; 6], b: &[f64; 6]) -> f64 {
    let sigma = 0.25 * (DIMENSION_COUNT as f64).sqrt();
    let squared: f64 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
    (-squared / (2.0 * sigma * sigma)).exp()
}

fn weighted(a: &[f64; 6], b: &[f64; 6], weights: &[f64]) -> f64 {
    let total: f64 = weights.iter().sum();
    let distance: f64 = a
        .iter()
        .zip(b)
        .zip(weights)
        .map(|((x, y), w)| w * (x - y).abs())
        .sum();
    1.0 - distance / total
}

/// Gaps and similarities between a source and a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Method behind `similarity`
    pub method: ComparisonMethod,
    /// Similarity under `method`
    pub similarity: f64,
    /// Cosine similarity
    pub cosine: f64,
    /// Euclidean-kernel similarity
    pub euclidean: f64,
    /// Uniformly weighted similarity
    pub weighted: f64,
    /// Target minus source, per dimension
    pub gaps: IndexMap<StyleDimension, f64>,
}

impl ComparisonReport {
    /// Compare `source` to `target` under `method` and the two others.
    pub fn build(
        source: &StyleScores,
        target: &StyleScores,
        method: &ComparisonMethod,
    ) -> Result<Self> {
        let similarity = compare(source, target, method)?;
        let uniform = ComparisonMethod::Weighted {
            weights: vec![1.0; DIMENSION_COUNT],
        };
        Ok(Self {
            method: method.clone(),
            similarity,
            cosine: compare(source, target, &ComparisonMethod::Cosine)?,
            euclidean: compare(source, target, &ComparisonMethod::Euclidean)?,
            weighted: compare(source, target, &uniform)?,
            gaps: source
                .iter()
                .map(|(dimension, value)| (dimension, target.get(dimension) - value))
                .collect(),
        })
    }

    /// Dimensions by descending absolute gap above `min_gap`, at most `limit`.
    ///
    /// Ties keep dimension order.
    pub fn top_gaps(&self, min_gap: f64, limit: usize) -> Vec<StyleDimension> {
        let mut ranked: Vec<(StyleDimension, f64)> = self
            .gaps
            .iter()
            .map(|(d, gap)| (*d, gap.abs()))
            .filter(|(_, gap)| *gap > min_gap)
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.into_iter().take(limit).map(|(d, _)| d).collect()
    }

    /// Signed gap for one dimension.
    pub fn gap(&self, dimension: StyleDimension) -> f64 {
        self.gaps.get(&dimension).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ScrivenerError;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn scores(values: [f64; 6]) -> StyleScores {
        StyleScores::from_array(values)
    }

    #[test]
    fn identical_profiles_are_fully_similar() {
        let a = scores([0.8, 0.7, 0.3, 0.2, 0.6, 0.7]);
        for method in [
            ComparisonMethod::Cosine,
            ComparisonMethod::Euclidean,
            ComparisonMethod::Weighted {
                weights: vec![1.0; 6],
            },
        ] {
            assert_relative_eq!(compare(&a, &a, &method).unwrap(), 1.0);
        }
        let neutral = StyleScores::neutral();
        assert_relative_eq!(
            compare(&neutral, &neutral, &ComparisonMethod::Cosine).unwrap(),
            1.0
        );
    }

    #[test]
    fn opposite_directions_score_low_under_cosine() {
        let formal = scores([0.8, 0.7, 0.3, 0.2, 0.7, 0.7]);
        let casual = scores([0.2, 0.3, 0.7, 0.8, 0.3, 0.3]);
        assert_relative_eq!(
            compare(&formal, &casual, &ComparisonMethod::Cosine).unwrap(),
            0.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn neutral_against_anything_is_half_under_cosine() {
        let other = scores([0.9, 0.1, 0.5, 0.5, 0.5, 0.5]);
        assert_relative_eq!(
            compare(&StyleScores::neutral(), &other, &ComparisonMethod::Cosine).unwrap(),
            0.5
        );
    }

    #[test]
    fn euclidean_kernel_matches_formula() {
        let a = scores([0.0; 6]);
        let b = scores([1.0; 6]);
        // d² = 6, σ² = 6/16
        let expected = (-6.0f64 / (2.0 * 6.0 / 16.0)).exp();
        assert_relative_eq!(
            compare(&a, &b, &ComparisonMethod::Euclidean).unwrap(),
            expected
        );
    }

    #[test]
    fn weighted_ignores_zero_weight_dimensions() {
        let a = scores([0.5, 0.5, 0.5, 0.0, 0.5, 0.5]);
        let b = scores([0.5, 0.5, 0.5, 1.0, 0.5, 0.5]);
        let method = ComparisonMethod::Weighted {
            weights: vec![1.0, 1.0, 1.0, 0.0, 1.0, 1.0],
        };
        assert_relative_eq!(compare(&a, &b, &method).unwrap(), 1.0);
    }

    #[test]
    fn mismatched_weights_fail() {
        let method = ComparisonMethod::Weighted {
            weights: vec![1.0; 3],
        };
        let err = compare(&StyleScores::neutral(), &StyleScores::neutral(), &method).unwrap_err();
        assert!(matches!(err, ScrivenerError::InvalidWeights { actual: 3, .. }));
    }

    #[test]
    fn report_ranks_gaps() {
        let source = scores([0.5, 0.5, 0.5, 0.2, 0.5, 0.5]);
        let target = scores([0.6, 0.5, 0.5, 0.8, 0.5, 0.52]);
        let report = ComparisonReport::build(&source, &target, &ComparisonMethod::Cosine).unwrap();
        assert_eq!(
            report.top_gaps(0.05, 2),
            vec![
                StyleDimension::EmotionalExpressiveness,
                StyleDimension::ConceptOrganization
            ]
        );
        assert_relative_eq!(report.gap(StyleDimension::EmotionalExpressiveness), 0.6, epsilon = 1e-12);
        assert_relative_eq!(report.similarity, report.cosine);
    }

    proptest! {
        #[test]
        fn similarity_is_bounded_and_symmetric(
            a in prop::array::uniform6(0.0f64..=1.0),
            b in prop::array::uniform6(0.0f64..=1.0),
        ) {
            let (a, b) = (scores(a), scores(b));
            for method in [ComparisonMethod::Cosine, ComparisonMethod::Euclidean] {
                let ab = compare(&a, &b, &method).unwrap();
                let ba = compare(&b, &a, &method).unwrap();
                prop_assert!((0.0..=1.0).contains(&ab));
                prop_assert!((ab - ba).abs() < 1e-12);
            }
        }
    }
}
