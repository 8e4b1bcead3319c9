use super::*;
use crate::core::errors::ScrivenerError;
use crate::core::profile::{StyleLabel, StyleScores};
use crate::core::provenance::ScoreSource;
use crate::detectors::semantic_units::STAGE_IDENTIFY;
use crate::detectors::style_judgment::STAGE_STYLE_JUDGMENT;
use crate::providers::{CompletionOptions, HashingEmbedder};
use async_trait::async_trait;
use parking_lot::Mutex;

const UNITS_REPLY: &str = r#"{"units": [
    {"text": "合同", "role": "core-concept", "importance": 5, "sentiment": "neutral"},
    {"text": "条款", "role": "related-concept", "importance": 4, "sentiment": "neutral"},
    {"text": "审核", "role": "key-verb", "importance": 3, "sentiment": "neutral"},
    {"text": "开心", "role": "key-adjective", "importance": 2, "sentiment": "positive", "intensity": 4}
]}"#;

const RATINGS_REPLY: &str = r#"{"concept-organization": 5, "semantic-coherence": 4,
    "innovative-association": 2, "emotional-expressiveness": 1,
    "cognitive-complexity": 4, "thematic-focus": 4}"#;

/// Answers each prompt family with a fixed reply; `None` fails the call.
struct RoutedModel {
    units: Option<&'static str>,
    ratings: Option<&'static str>,
    calls: Mutex<usize>,
}

impl RoutedModel {
    fn new(units: Option<&'static str>, ratings: Option<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            units,
            ratings,
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl LanguageModel for RoutedModel {
    fn name(&self) -> &str {
        "routed"
    }

    async fn complete(&self, prompt: &str, _options: &CompletionOptions) -> Result<String> {
        *self.calls.lock() += 1;
        let reply = if prompt.contains("Extract the semantic units") {
            self.units
        } else if prompt.contains("Rate the writing style") {
            self.ratings
        } else if prompt.contains("Classify the association") {
            Some(r#"{"class": "apt"}"#)
        } else {
            Some(r#"{"coherence": 4, "theme": "合同"}"#)
        };
        reply
            .map(str::to_string)
            .ok_or_else(|| ScrivenerError::provider("routed", "offline"))
    }
}

struct BrokenEmbedder;

#[async_trait]
impl EmbeddingCapability for BrokenEmbedder {
    fn dimension(&self) -> usize {
        8
    }

    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(ScrivenerError::embedding("model unavailable"))
    }
}

fn pipeline(llm: Arc<RoutedModel>, embedder: Arc<dyn EmbeddingCapability>) -> AnalysisPipeline {
    AnalysisPipeline::new(
        &ScrivenerConfig::default(),
        llm,
        embedder,
        Arc::new(VectorCache::new(256)),
    )
}

#[tokio::test]
async fn empty_text_is_neutral_without_model_calls() {
    let llm = RoutedModel::new(Some(UNITS_REPLY), Some(RATINGS_REPLY));
    let analysis = pipeline(llm.clone(), Arc::new(HashingEmbedder::new(32)))
        .analyze("   \n", "blank")
        .await
        .unwrap();

    assert_eq!(llm.calls(), 0);
    assert_eq!(*analysis.profile.scores(), StyleScores::neutral());
    assert_eq!(analysis.profile.label(), StyleLabel::Balanced);
    assert!(analysis.profile.fidelity().is_full());
    assert_eq!(analysis.statistics.subcalls_attempted, 0);
}

#[tokio::test]
async fn full_run_records_every_stage() {
    let llm = RoutedModel::new(Some(UNITS_REPLY), Some(RATINGS_REPLY));
    let analysis = pipeline(llm, Arc::new(HashingEmbedder::new(32)))
        .analyze("本合同条款经双方审核后生效。我们很开心合作顺利。", "formal")
        .await
        .unwrap();

    let subcalls = analysis.profile.subcalls();
    assert!(subcalls.contains_key(STAGE_IDENTIFY));
    assert!(subcalls.contains_key(STAGE_STYLE_JUDGMENT));
    assert!(subcalls.contains_key(STAGE_VECTORIZE));
    assert!(analysis.profile.fidelity().is_full());
    assert_eq!(analysis.statistics.unit_count, 4);
    assert_eq!(analysis.statistics.subcalls_failed, 0);
    assert!(analysis
        .judgment
        .iter()
        .all(|(_, scored)| scored.source == ScoreSource::Llm));
    for (_, value) in analysis.profile.scores().iter() {
        assert!((0.0..=1.0).contains(&value));
    }
    assert!(!analysis.summary_line().is_empty());
}

#[tokio::test]
async fn embedding_failure_degrades_to_sentiment_only() {
    let llm = RoutedModel::new(Some(UNITS_REPLY), Some(RATINGS_REPLY));
    let analysis = pipeline(llm, Arc::new(BrokenEmbedder))
        .analyze("本合同条款经双方审核后生效。", "formal")
        .await
        .unwrap();

    assert!(analysis.behavior.clusters.is_empty());
    assert_eq!(analysis.behavior.sentiment.unit_count, 4);
    assert_eq!(analysis.profile.subcalls()[STAGE_VECTORIZE].failed, 1);
    match analysis.profile.fidelity() {
        ProfileFidelity::Degraded {
            failed_subcalls,
            notes,
            ..
        } => {
            assert_eq!(*failed_subcalls, 1);
            assert!(notes[0].starts_with(STAGE_VECTORIZE));
        }
        ProfileFidelity::Full => panic!("expected degraded fidelity"),
    }
}

#[tokio::test]
async fn mostly_failed_run_returns_degraded_error() {
    let llm = RoutedModel::new(None, None);
    let err = pipeline(llm, Arc::new(HashingEmbedder::new(32)))
        .analyze("今天天气很好。", "offline")
        .await
        .unwrap_err();

    match err {
        ScrivenerError::AnalysisDegraded {
            profile,
            failed,
            total,
        } => {
            assert_eq!(failed, 2);
            assert_eq!(total, 2);
            assert!(!profile.fidelity().is_full());
            for (_, value) in profile.scores().iter() {
                assert!((0.0..=1.0).contains(&value));
            }
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn recovered_replies_mark_the_profile_degraded() {
    let units = "Units:\n- 合同 (core-concept)\n- 条款 (related-concept)\n- 审核 (key-verb)";
    let ratings = "concept-organization: 4\nthematic-focus: 5";
    let llm = RoutedModel::new(Some(units), Some(ratings));
    let analysis = pipeline(llm, Arc::new(HashingEmbedder::new(32)))
        .analyze("本合同条款经双方审核后生效。", "formal")
        .await
        .unwrap();

    assert_eq!(analysis.units.fidelity, ParseFidelity::Degraded);
    assert_eq!(analysis.statistics.subcalls_failed, 0);
    assert_eq!(analysis.profile.subcalls()[STAGE_IDENTIFY].recovered, 1);
    assert_eq!(analysis.profile.subcalls()[STAGE_STYLE_JUDGMENT].recovered, 1);
    match analysis.profile.fidelity() {
        ProfileFidelity::Degraded {
            failed_subcalls,
            recovered_subcalls,
            notes,
            ..
        } => {
            assert_eq!(*failed_subcalls, 0);
            assert_eq!(*recovered_subcalls, 2);
            assert!(notes.iter().any(|note| note.starts_with(STAGE_IDENTIFY)));
        }
        ProfileFidelity::Full => panic!("recovered replies must not report full fidelity"),
    }
}
