//! Semantic behaviour analysis: cluster coherence, novelty of distant
//! associations and sentiment distribution.
//!
//! Coherence uses one model call per cluster; novelty uses one call per
//! candidate pair. Both sets of calls run concurrently and are reassembled by
//! cluster index and pair index. A failed or unparsable call yields the
//! documented neutral value tagged as a fallback and is recorded
//! on the [`SubcallLedger`].

pub mod coherence;
pub mod novelty;
pub mod sentiment;

use std::sync::Arc;

use futures::future::{join, join_all};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::config::BehaviorConfig;
use crate::core::provenance::{Scored, SubcallLedger};
use crate::detectors::semantic_space::similarity::cosine_distance_to_centroid;
use crate::detectors::semantic_space::{ClusterSkeleton, UnitVectors};
use crate::detectors::semantic_units::SemanticUnit;
use crate::providers::{CompletionOptions, LanguageModel};

pub use coherence::{CoherenceJudgment, FALLBACK_COHERENCE, FALLBACK_THEME};
pub use novelty::{CandidatePair, NoveltyClass, FALLBACK_NOVELTY};
pub use sentiment::SentimentDistribution;

/// Ledger stage for coherence calls.
pub const STAGE_COHERENCE: &str = "coherence";
/// Ledger stage for novelty calls.
pub const STAGE_NOVELTY: &str = "novelty";

const JUDGMENT_TEMPERATURE: f32 = 0.2;

/// A cluster of semantic units with its model judgment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptCluster {
    /// Cluster index
    pub id: usize,
    /// Member unit texts in first-appearance order
    pub members: Vec<String>,
    /// Coherence on the 1-5 scale
    pub coherence: Scored<f64>,
    /// Theme label
    pub theme: Scored<String>,
}

/// Aggregate view of the clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    /// Number of clusters
    pub count: usize,
    /// Member count per cluster
    pub sizes: Vec<usize>,
    /// Share of units in the largest cluster
    pub largest_share: f64,
    /// Share of clusters with a single member
    pub singleton_share: f64,
    /// Mean coherence over clusters (1-5)
    pub mean_coherence: f64,
}

impl ClusterSummary {
    fn from_clusters(clusters: &[ConceptCluster]) -> Self {
        let sizes: Vec<usize> = clusters.iter().map(|c| c.members.len()).collect();
        let total: usize = sizes.iter().sum();
        let count = clusters.len();

        Self {
            count,
            largest_share: match (sizes.iter().max(), total) {
                (Some(&largest), total) if total > 0 => largest as f64 / total as f64,
                _ => 0.0,
            },
            singleton_share: if count == 0 {
                0.0
            } else {
                sizes.iter().filter(|&&s| s == 1).count() as f64 / count as f64
            },
            mean_coherence: if count == 0 {
                FALLBACK_COHERENCE
            } else {
                clusters.iter().map(|c| c.coherence.value).sum::<f64>() / count as f64
            },
            sizes,
        }
    }
}

/// A judged distant pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoveltyPair {
    /// First unit text
    pub first: String,
    /// Second unit text
    pub second: String,
    /// Cosine distance between the two units
    pub distance: f64,
    /// Model classification; `None` when the judgment failed
    pub class: Option<NoveltyClass>,
    /// Novelty value in [0, 1]
    pub novelty: Scored<f64>,
}

/// Novelty over the farthest unit pairs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NoveltyMetrics {
    /// Distance threshold at the configured percentile
    pub threshold: Option<f64>,
    /// Judged pairs, farthest first
    pub pairs: Vec<NoveltyPair>,
}

impl NoveltyMetrics {
    /// Mean novelty over judged pairs, if any.
    pub fn mean_novelty(&self) -> Option<f64> {
        if self.pairs.is_empty() {
            None
        } else {
            Some(self.pairs.iter().map(|p| p.novelty.value).sum::<f64>() / self.pairs.len() as f64)
        }
    }
}

/// Statistics over all pairwise cosine distances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceStats {
    /// Number of pairs
    pub pair_count: usize,
    /// Mean distance
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Largest distance
    pub max: f64,
}

/// Behavioural metrics for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorMetrics {
    /// Judged clusters
    pub clusters: Vec<ConceptCluster>,
    /// Clustering summary
    pub summary: ClusterSummary,
    /// Novelty judgments
    pub novelty: NoveltyMetrics,
    /// Sentiment distribution from unit fields
    pub sentiment: SentimentDistribution,
    /// Pairwise distance statistics (absent with fewer than two vectors)
    pub distances: Option<DistanceStats>,
    /// One minus the mean distance to the global centroid (absent without vectors)
    pub vector_density: Option<f64>,
}

impl BehaviorMetrics {
    /// Metrics for a document with no units.
    pub fn empty() -> Self {
        Self {
            clusters: Vec::new(),
            summary: ClusterSummary::from_clusters(&[]),
            novelty: NoveltyMetrics::default(),
            sentiment: SentimentDistribution::default(),
            distances: None,
            vector_density: None,
        }
    }

    /// Metrics from units alone, used when vectorization failed.
    pub fn sentiment_only(units: &[SemanticUnit]) -> Self {
        Self {
            sentiment: SentimentDistribution::from_units(units),
            ..Self::empty()
        }
    }
}

/// Runs the behavioural judgments for one document.
pub struct BehaviorAnalyzer {
    llm: Arc<dyn LanguageModel>,
    config: BehaviorConfig,
}

impl BehaviorAnalyzer {
    /// Create a new analyzer
    pub fn new(llm: Arc<dyn LanguageModel>, config: BehaviorConfig) -> Self {
        Self { llm, config }
    }

    /// Analyze clusters over `vectors` (indices follow the map order).
    pub async fn analyze(
        &self,
        skeletons: &[ClusterSkeleton],
        vectors: &UnitVectors,
        units: &[SemanticUnit],
        ledger: &SubcallLedger,
    ) -> BehaviorMetrics {
        let texts: Vec<&str> = vectors.keys().map(String::as_str).collect();
        let slices: Vec<&[f32]> = vectors.values().map(|v| v.as_slice()).collect();

        let pairs = novelty::pairwise_distances(&slices, self.config.parallel_threshold);
        let distances = distance_stats(&pairs);
        let candidates = novelty::select_candidates(
            &pairs,
            self.config.novelty_percentile,
            self.config.max_novelty_pairs,
        );
        let threshold = (!pairs.is_empty())
            .then(|| novelty::distance_percentile(&pairs, self.config.novelty_percentile));

        debug!(
            clusters = skeletons.len(),
            pairs = pairs.len(),
            candidates = candidates.len(),
            "Running behaviour judgments"
        );

        let (clusters, judged_pairs) = join(
            self.judge_clusters(skeletons, &texts, ledger),
            self.judge_pairs(&candidates, &texts, ledger),
        )
        .await;

        let summary = ClusterSummary::from_clusters(&clusters);
        let metrics = BehaviorMetrics {
            summary,
            clusters,
            novelty: NoveltyMetrics {
                threshold,
                pairs: judged_pairs,
            },
            sentiment: SentimentDistribution::from_units(units),
            distances,
            vector_density: vector_density(&slices),
        };

        info!(
            clusters = metrics.summary.count,
            novelty_pairs = metrics.novelty.pairs.len(),
            mean_coherence = metrics.summary.mean_coherence,
            "Behaviour analysis complete"
        );
        metrics
    }

    async fn judge_clusters(
        &self,
        skeletons: &[ClusterSkeleton],
        texts: &[&str],
        ledger: &SubcallLedger,
    ) -> Vec<ConceptCluster> {
        let judgments = skeletons
            .iter()
            .filter(|skeleton| !skeleton.is_empty())
            .map(|skeleton| async move {
                let members: Vec<String> = skeleton
                    .members
                    .iter()
                    .filter_map(|&idx| texts.get(idx).map(|t| (*t).to_string()))
                    .collect();
                let (coherence, theme) = self.judge_cluster(skeleton.id, &members, ledger).await;
                ConceptCluster {
                    id: skeleton.id,
                    members,
                    coherence,
                    theme,
                }
            });

        let mut clusters = join_all(judgments).await;
        clusters.sort_by_key(|c| c.id);
        clusters
    }

    async fn judge_cluster(
        &self,
        id: usize,
        members: &[String],
        ledger: &SubcallLedger,
    ) -> (Scored<f64>, Scored<String>) {
        let identifier = format!("cluster-{id}");
        let fallback = || {
            (
                Scored::fallback(FALLBACK_COHERENCE),
                Scored::fallback(FALLBACK_THEME.to_string()),
            )
        };

        let refs: Vec<&str> = members.iter().map(String::as_str).collect();
        let prompt = coherence::coherence_prompt(&refs);
        let raw = match self
            .llm
            .complete(&prompt, &CompletionOptions::json(JUDGMENT_TEMPERATURE))
            .await
        {
            Ok(raw) => raw,
            Err(err) => {
                ledger.record_failure(STAGE_COHERENCE, &identifier, &err.to_string());
                return fallback();
            }
        };

        let parsed = coherence::parse_coherence(&raw);
        let fidelity = parsed.fidelity();
        match parsed.into_value() {
            Some(judgment) => {
                ledger.record_parsed(STAGE_COHERENCE, &identifier, fidelity);
                let theme = match judgment.theme {
                    Some(theme) => Scored::llm(theme),
                    None => Scored::fallback(FALLBACK_THEME.to_string()),
                };
                (Scored::llm(judgment.coherence), theme)
            }
            None => {
                ledger.record_failure(STAGE_COHERENCE, &identifier, "unparsable coherence");
                fallback()
            }
        }
    }

    async fn judge_pairs(
        &self,
        candidates: &[CandidatePair],
        texts: &[&str],
        ledger: &SubcallLedger,
    ) -> Vec<NoveltyPair> {
        let judgments = candidates.iter().enumerate().map(|(idx, pair)| async move {
            let first = texts[pair.a];
            let second = texts[pair.b];
            let class = self.judge_pair(idx, first, second, ledger).await;
            NoveltyPair {
                first: first.to_string(),
                second: second.to_string(),
                distance: pair.distance,
                class,
                novelty: match class {
                    Some(class) => Scored::llm(class.value()),
                    None => Scored::fallback(FALLBACK_NOVELTY),
                },
            }
        });
        join_all(judgments).await
    }

    async fn judge_pair(
        &self,
        idx: usize,
        first: &str,
        second: &str,
        ledger: &SubcallLedger,
    ) -> Option<NoveltyClass> {
        let identifier = format!("pair-{idx}");
        let prompt = novelty::novelty_prompt(first, second);
        match self
            .llm
            .complete(&prompt, &CompletionOptions::json(JUDGMENT_TEMPERATURE))
            .await
        {
            Ok(raw) => {
                let parsed = novelty::parse_novelty(&raw);
                let fidelity = parsed.fidelity();
                match parsed.into_value() {
                    Some(class) => {
                        ledger.record_parsed(STAGE_NOVELTY, &identifier, fidelity);
                        Some(class)
                    }
                    None => {
                        ledger.record_failure(STAGE_NOVELTY, &identifier, "unparsable novelty class");
                        None
                    }
                }
            }
            Err(err) => {
                ledger.record_failure(STAGE_NOVELTY, &identifier, &err.to_string());
                None
            }
        }
    }
}

fn distance_stats(pairs: &[CandidatePair]) -> Option<DistanceStats> {
    use statrs::statistics::Statistics;

    if pairs.is_empty() {
        return None;
    }
    let distances: Vec<f64> = pairs.iter().map(|p| p.distance).collect();
    Some(DistanceStats {
        pair_count: distances.len(),
        mean: distances.iter().mean(),
        std_dev: distances.iter().population_std_dev(),
        max: distances.iter().copied().fold(0.0, f64::max),
    })
}

fn vector_density(vectors: &[&[f32]]) -> Option<f64> {
    let first = vectors.first()?;
    let mut centroid = vec![0.0f64; first.len()];
    for vector in vectors {
        for (slot, &value) in centroid.iter_mut().zip(vector.iter()) {
            *slot += f64::from(value);
        }
    }
    let n = vectors.len() as f64;
    centroid.iter_mut().for_each(|slot| *slot /= n);

    let mean_distance = vectors
        .iter()
        .map(|v| cosine_distance_to_centroid(v, &centroid))
        .sum::<f64>()
        / n;
    Some((1.0 - mean_distance).clamp(0.0, 1.0))
}
