//! Novelty of distant associations.
//!
//! Candidate pairs are unit pairs whose cosine distance reaches the
//! configured percentile of all pairwise distances. The farthest pairs are
//! judged by the model, one call per pair.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics};

use crate::detectors::semantic_space::cosine_distance;
use crate::providers::parse::find_string_after;
use crate::providers::LlmParse;

/// Neutral novelty value used when a pair judgment fails.
pub const FALLBACK_NOVELTY: f64 = 0.5;

/// Model judgment of a distant association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoveltyClass {
    /// Surprising and meaningful
    CreativeAssociation,
    /// Distant but fitting
    AptAnalogy,
    /// Strained link
    ForcedComparison,
    /// No meaningful link
    MeaninglessJuxtaposition,
}

impl NoveltyClass {
    /// Novelty value in [0, 1] contributed by this class.
    pub fn value(self) -> f64 {
        match self {
            NoveltyClass::CreativeAssociation => 1.0,
            NoveltyClass::AptAnalogy => 0.75,
            NoveltyClass::ForcedComparison => 0.3,
            NoveltyClass::MeaninglessJuxtaposition => 0.0,
        }
    }

    /// Kebab-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            NoveltyClass::CreativeAssociation => "creative-association",
            NoveltyClass::AptAnalogy => "apt-analogy",
            NoveltyClass::ForcedComparison => "forced-comparison",
            NoveltyClass::MeaninglessJuxtaposition => "meaningless-juxtaposition",
        }
    }

    /// Lenient parse of a class name.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '_' || c == ' ' { '-' } else { c })
            .collect();
        if normalized.contains("creative") {
            Some(NoveltyClass::CreativeAssociation)
        } else if normalized.contains("apt") || normalized.contains("analogy") {
            Some(NoveltyClass::AptAnalogy)
        } else if normalized.contains("forced") {
            Some(NoveltyClass::ForcedComparison)
        } else if normalized.contains("meaningless") || normalized.contains("juxtaposition") {
            Some(NoveltyClass::MeaninglessJuxtaposition)
        } else {
            None
        }
    }
}

/// A candidate pair, by index into the distinct unit texts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidatePair {
    /// First index (lower)
    pub a: usize,
    /// Second index
    pub b: usize,
    /// Cosine distance between the two vectors
    pub distance: f64,
}

/// All pairwise cosine distances `(i, j, d)` with `i < j`.
///
/// Rows are computed in parallel when `vectors.len()` exceeds
/// `parallel_threshold`; the output order is the same either way.
pub fn pairwise_distances(vectors: &[&[f32]], parallel_threshold: usize) -> Vec<CandidatePair> {
    let row = |i: usize| -> Vec<CandidatePair> {
        (i + 1..vectors.len())
            .map(|j| CandidatePair {
                a: i,
                b: j,
                distance: cosine_distance(vectors[i], vectors[j]),
            })
            .collect()
    };

    if vectors.len() > parallel_threshold {
        (0..vectors.len()).into_par_iter().flat_map_iter(row).collect()
    } else {
        (0..vectors.len()).flat_map(row).collect()
    }
}

/// Select the novelty candidates from pairwise distances.
///
/// Keeps pairs with a positive distance at or above the `percentile`
/// threshold, farthest first, ties broken by index order, capped at
/// `max_pairs`.
pub fn select_candidates(
    pairs: &[CandidatePair],
    percentile: f64,
    max_pairs: usize,
) -> Vec<CandidatePair> {
    if pairs.is_empty() || max_pairs == 0 {
        return Vec::new();
    }
    let threshold = distance_percentile(pairs, percentile);

    let mut selected: Vec<CandidatePair> = pairs
        .iter()
        .filter(|p| p.distance > 0.0 && p.distance >= threshold)
        .copied()
        .collect();
    selected.sort_by(|x, y| {
        y.distance
            .total_cmp(&x.distance)
            .then(x.a.cmp(&y.a))
            .then(x.b.cmp(&y.b))
    });
    selected.truncate(max_pairs);
    selected
}

/// Distance at the given percentile (0-100).
pub fn distance_percentile(pairs: &[CandidatePair], percentile: f64) -> f64 {
    let distances: Vec<f64> = pairs.iter().map(|p| p.distance).collect();
    let mut data = Data::new(distances);
    data.percentile(percentile.round().clamp(0.0, 100.0) as usize)
}

/// Build the prompt for one pair.
pub fn novelty_prompt(a: &str, b: &str) -> String {
    format!(
        r#"Two concepts appear together in one document: "{a}" and "{b}".
They are far apart in meaning. Classify the association as exactly one of:
creative-association, apt-analogy, forced-comparison, meaningless-juxtaposition.
Respond with JSON only: {{"class": "<one of the four>"}}"#
    )
}

#[derive(Debug, Deserialize)]
struct RawNovelty {
    #[serde(alias = "classification", alias = "type", alias = "novelty")]
    class: String,
}

/// Parse a novelty response.
pub fn parse_novelty(raw: &str) -> LlmParse<NoveltyClass> {
    let structured = match LlmParse::<RawNovelty>::from_response(raw, |_| None) {
        LlmParse::Parsed(payload) => NoveltyClass::parse(&payload.class)
            .map_or(LlmParse::Unparsable, LlmParse::Parsed),
        _ => LlmParse::Unparsable,
    };
    structured.or_recover(|| {
        find_string_after(raw, "class")
            .and_then(|value| NoveltyClass::parse(&value))
            .or_else(|| NoveltyClass::parse(raw))
    })
}
