//! Main style engine implementation.

use std::sync::Arc;

use futures::future::join;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use crate::api::results::{EngineCacheStats, StyleComparison, TransferSession};
use crate::core::config::ScrivenerConfig;
use crate::core::errors::{Result, ScrivenerError};
use crate::core::pipeline::{AnalysisPipeline, StyleAnalysis};
use crate::core::profile::StyleProfile;
use crate::detectors::semantic_space::VectorCache;
use crate::providers::{EmbeddingCapability, GuardedEmbedder, GuardedLanguageModel, LanguageModel};
use crate::review::{
    Clock, Decision, ExportedDocument, ReviewPreview, ReviewSessionManager, SystemClock,
};
use crate::transfer::{
    ChangeStatus, ComparisonMethod, ComparisonReport, TransferEngine,
    TransferRequest, TransferState, TransferStrategy, TransferTracker,
};

/// Name given to the source profile of a transfer.
pub const SOURCE_PROFILE_NAME: &str = "source";

/// Style analysis, comparison and transfer over injected capabilities.
pub struct StyleEngine {
    config: Arc<ScrivenerConfig>,
    pipeline: AnalysisPipeline,
    transfer: TransferEngine,
    sessions: ReviewSessionManager,
    llm: Arc<GuardedLanguageModel>,
    embedder: Arc<GuardedEmbedder>,
}

impl StyleEngine {
    /// Create an engine with a fresh vector cache and the system clock.
    pub fn new(
        config: ScrivenerConfig,
        llm: Arc<dyn LanguageModel>,
        embedder: Arc<dyn EmbeddingCapability>,
    ) -> Result<Self> {
        let cache = Arc::new(VectorCache::new(config.providers.vector_cache_entries));
        Self::with_parts(config, llm, embedder, cache, Arc::new(SystemClock))
    }

    /// Create an engine over a shared vector cache and an injected clock.
    pub fn with_parts(
        config: ScrivenerConfig,
        llm: Arc<dyn LanguageModel>,
        embedder: Arc<dyn EmbeddingCapability>,
        cache: Arc<VectorCache>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        info!("Initializing style engine");
        config.validate()?;

        let llm = Arc::new(GuardedLanguageModel::new(llm, &config.providers));
        let embedder = Arc::new(GuardedEmbedder::new(embedder, &config.providers));
        let pipeline = AnalysisPipeline::new(&config, llm.clone(), embedder.clone(), cache);
        let transfer = TransferEngine::new(llm.clone(), config.transfer.clone());
        let sessions = ReviewSessionManager::with_clock(&config.review, clock);

        info!(provider = llm.name(), "Style engine initialized");
        Ok(Self {
            config: Arc::new(config),
            pipeline,
            transfer,
            sessions,
            llm,
            embedder,
        })
    }

    /// Engine configuration.
    pub fn config(&self) -> &ScrivenerConfig {
        &self.config
    }

    /// Review session registry.
    pub fn sessions(&self) -> &ReviewSessionManager {
        &self.sessions
    }

    /// Analyze the style of `text`.
    pub async fn analyze_style(&self, text: &str, name: &str) -> Result<StyleAnalysis> {
        self.pipeline.analyze(text, name).await
    }

    /// Analyze two texts concurrently and compare their profiles.
    pub async fn compare_styles(&self, first: &str, second: &str) -> Result<StyleComparison> {
        let (first, second) = join(
            self.pipeline.analyze(first, "first"),
            self.pipeline.analyze(second, "second"),
        )
        .await;
        let (first, second) = (first?, second?);
        let report = self.compare_profiles(&first.profile, &second.profile)?;
        info!(
            similarity = report.similarity,
            first = %first.profile.label(),
            second = %second.profile.label(),
            "Style comparison complete"
        );
        Ok(StyleComparison {
            first,
            second,
            report,
        })
    }

    /// Compare two profiles with the configured method.
    pub fn compare_profiles(&self, a: &StyleProfile, b: &StyleProfile) -> Result<ComparisonReport> {
        self.transfer.compare(a, b)
    }

    /// Compare two profiles with an explicit method.
    pub fn compare_profiles_with(
        &self,
        a: &StyleProfile,
        b: &StyleProfile,
        method: &ComparisonMethod,
    ) -> Result<ComparisonReport> {
        ComparisonReport::build(a.scores(), b.scores(), method)
    }

    /// Rewrite `source_text` toward `target` and open a review session.
    pub async fn start_transfer(
        &self,
        source_text: &str,
        target: &StyleProfile,
        strategy: TransferStrategy,
    ) -> Result<TransferSession> {
        self.start_transfer_with_cancel(source_text, target, strategy, &CancellationToken::new())
            .await
    }

    /// Like [`Self::start_transfer`], cancellable between gradual steps.
    pub async fn start_transfer_with_cancel(
        &self,
        source_text: &str,
        target: &StyleProfile,
        strategy: TransferStrategy,
        cancel: &CancellationToken,
    ) -> Result<TransferSession> {
        if source_text.trim().is_empty() {
            return Err(ScrivenerError::input("source content is empty").with_context("transfer"));
        }

        let mut tracker = TransferTracker::new(Uuid::new_v4().to_string());
        tracker.advance(TransferState::ProfilingSource)?;
        let source = match self.pipeline.analyze(source_text, SOURCE_PROFILE_NAME).await {
            Ok(analysis) => analysis,
            Err(err) => {
                tracker.advance(TransferState::Abandoned)?;
                return Err(err);
            }
        };

        tracker.advance(TransferState::ProfilingTarget)?;
        let request = TransferRequest {
            source_text,
            source: &source.profile,
            target,
            source_units: &source.units.units,
        };
        let outcome = self
            .transfer
            .transfer(&request, strategy, &mut tracker, cancel)
            .await?;
        let session = self.sessions.create_session(&outcome, tracker)?;

        Ok(TransferSession {
            session,
            source_profile: source.profile,
            outcome,
        })
    }

    /// Decide one change of a session; returns the preview after the decision.
    pub fn decide(&self, session_id: &str, decision: &Decision) -> Result<ReviewPreview> {
        self.sessions.decide(session_id, decision)
    }

    /// Decide several changes of a session at once.
    pub fn decide_batch(&self, session_id: &str, decisions: &[Decision]) -> Result<ReviewPreview> {
        self.sessions.decide_batch(session_id, decisions)
    }

    /// Set every change of a session to `status`.
    pub fn decide_all(&self, session_id: &str, status: ChangeStatus) -> Result<ReviewPreview> {
        self.sessions.decide_all(session_id, status)
    }

    /// Preview a session with its accepted changes applied.
    pub fn preview(&self, session_id: &str) -> Result<ReviewPreview> {
        self.sessions.preview(session_id)
    }

    /// Export a session's final text; the session is frozen afterwards.
    pub fn export_session(&self, session_id: &str) -> Result<ExportedDocument> {
        self.sessions.export(session_id)
    }

    /// Cache and call statistics.
    pub fn cache_stats(&self) -> EngineCacheStats {
        EngineCacheStats {
            vectors: self.pipeline.mapper().cache().stats(),
            llm: self.llm.stats(),
            embeddings: self.embedder.stats(),
            sessions: self.sessions.len(),
        }
    }
}
