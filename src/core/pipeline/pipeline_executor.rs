//! Pipeline executor that turns text into a style profile.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::config::ScrivenerConfig;
use crate::core::errors::{Result, ScrivenerError};
use crate::core::featureset::FeatureVector;
use crate::core::profile::{ProfileFidelity, StyleProfile};
use crate::core::provenance::SubcallLedger;
use crate::core::scoring::{FeatureNormalizer, StyleFusion};
use crate::detectors::behavior::{BehaviorAnalyzer, BehaviorMetrics};
use crate::detectors::quantitative::QuantitativeExtractor;
use crate::detectors::semantic_space::{ClusterCount, SemanticSpaceMapper, VectorCache};
use crate::detectors::semantic_units::{IdentifiedUnits, SemanticUnitIdentifier};
use crate::detectors::style_judgment::{StyleJudge, StyleJudgment};
use crate::providers::{EmbeddingCapability, LanguageModel, ParseFidelity};

use super::pipeline_results::{PipelineStatistics, StyleAnalysis};

/// Ledger stage for unit vectorization.
pub const STAGE_VECTORIZE: &str = "vectorize";

/// Style analysis pipeline over injected capabilities.
pub struct AnalysisPipeline {
    extractor: QuantitativeExtractor,
    identifier: SemanticUnitIdentifier,
    mapper: SemanticSpaceMapper,
    behavior: BehaviorAnalyzer,
    judge: StyleJudge,
    fusion: StyleFusion,
    normalizer: FeatureNormalizer,
    max_failure_ratio: f64,
}

impl AnalysisPipeline {
    /// Create a pipeline; `cache` is shared across runs.
    pub fn new(
        config: &ScrivenerConfig,
        llm: Arc<dyn LanguageModel>,
        embedder: Arc<dyn EmbeddingCapability>,
        cache: Arc<VectorCache>,
    ) -> Self {
        Self {
            extractor: QuantitativeExtractor::new(),
            identifier: SemanticUnitIdentifier::new(llm.clone(), config.identifier.clone()),
            mapper: SemanticSpaceMapper::new(embedder, cache, config.mapper.clone()),
            behavior: BehaviorAnalyzer::new(llm.clone(), config.behavior.clone()),
            judge: StyleJudge::new(llm),
            fusion: StyleFusion::new(config.fusion.weights),
            normalizer: FeatureNormalizer::new(),
            max_failure_ratio: config.behavior.max_failure_ratio,
        }
    }

    /// The semantic space mapper (and its cache).
    pub fn mapper(&self) -> &SemanticSpaceMapper {
        &self.mapper
    }

    /// Analyze `text` into a profile named `name`.
    ///
    /// Empty or whitespace-only text yields a neutral profile without any
    /// model call. Returns [`ScrivenerError::AnalysisDegraded`] when more
    /// than the configured share of model sub-calls fell back.
    pub async fn analyze(&self, text: &str, name: &str) -> Result<StyleAnalysis> {
        let start_time = Instant::now();
        let timestamp = Utc::now();
        let ledger = SubcallLedger::new();

        info!(name, chars = text.chars().count(), "Starting style analysis");

        let quantitative = self.extractor.extract(text);

        let (units, judgment, behavior) = if text.trim().is_empty() {
            (
                IdentifiedUnits::empty(ParseFidelity::Parsed),
                StyleJudgment::neutral(),
                BehaviorMetrics::empty(),
            )
        } else {
            let (units, judgment) = join(
                self.identifier.identify(text, &ledger),
                self.judge.judge(text, &ledger),
            )
            .await;
            let behavior = self.behavior_for(&units, &ledger).await;
            (units, judgment, behavior)
        };

        let raw = FeatureVector::from_sources(&quantitative, &behavior, Some(&judgment));
        let breakdown = self.fusion.fuse_with_breakdown(&raw);
        let features = self.normalizer.normalize(&raw);

        let failed = ledger.failed();
        let recovered = ledger.recovered();
        let attempted = ledger.attempted();
        let fidelity = if failed == 0 && recovered == 0 {
            ProfileFidelity::Full
        } else {
            ProfileFidelity::Degraded {
                failed_subcalls: failed,
                recovered_subcalls: recovered,
                total_subcalls: attempted,
                notes: ledger
                    .snapshot()
                    .into_iter()
                    .flat_map(|(stage, tally)| {
                        let failed = (tally.failed > 0).then(|| {
                            format!("{stage}: {} of {} failed", tally.failed, tally.attempted)
                        });
                        let recovered = (tally.recovered > 0).then(|| {
                            format!(
                                "{stage}: {} of {} recovered from malformed output",
                                tally.recovered, tally.attempted
                            )
                        });
                        failed.into_iter().chain(recovered)
                    })
                    .collect(),
            }
        };

        let profile = StyleProfile::new(name, features, breakdown.scores, fidelity)
            .with_subcalls(ledger.snapshot());

        if ledger.failure_ratio() > self.max_failure_ratio {
            warn!(name, failed, attempted, "Style analysis degraded beyond threshold");
            return Err(ScrivenerError::AnalysisDegraded {
                profile: Box::new(profile),
                failed,
                total: attempted,
            });
        }

        let statistics = PipelineStatistics {
            unit_count: units.units.len(),
            vectorized_texts: behavior
                .clusters
                .iter()
                .map(|c| c.members.len())
                .sum(),
            cluster_count: behavior.summary.count,
            subcalls_attempted: attempted,
            subcalls_failed: failed,
        };

        let processing_time = start_time.elapsed().as_secs_f64();
        info!(
            name,
            label = %profile.label(),
            units = statistics.unit_count,
            clusters = statistics.cluster_count,
            processing_time,
            "Style analysis complete"
        );

        Ok(StyleAnalysis {
            analysis_id: Uuid::new_v4().to_string(),
            timestamp,
            processing_time,
            profile,
            units,
            quantitative,
            behavior,
            judgment,
            breakdown,
            statistics,
        })
    }

    async fn behavior_for(&self, units: &IdentifiedUnits, ledger: &SubcallLedger) -> BehaviorMetrics {
        if units.units.is_empty() {
            return BehaviorMetrics::empty();
        }

        match self.mapper.vectorize(&units.units).await {
            Ok(vectors) => {
                ledger.record_success(STAGE_VECTORIZE);
                let raw: Vec<Vec<f32>> = vectors.values().map(|v| v.as_ref().clone()).collect();
                let skeletons = self.mapper.cluster(&raw, ClusterCount::Auto);
                self.behavior
                    .analyze(&skeletons, &vectors, &units.units, ledger)
                    .await
            }
            Err(err) => {
                ledger.record_failure(STAGE_VECTORIZE, "units", &err.to_string());
                BehaviorMetrics::sentiment_only(&units.units)
            }
        }
    }
}

#[cfg(test)]
#[path = "pipeline_executor_tests.rs"]
mod tests;
