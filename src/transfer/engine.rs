//! Transfer engine: compares profiles and drives the rewrite strategies.

use std::sync::Arc;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::config::TransferConfig;
use crate::core::errors::{Result, ScrivenerError};
use crate::core::profile::{StyleDimension, StyleProfile, StyleScores};
use crate::detectors::semantic_units::SemanticUnit;
use crate::providers::parse::strip_code_fences;
use crate::providers::{CompletionOptions, LanguageModel, LlmParse};

use super::diff::{align_changes, apply_changes, classify_change};
use super::prompts::{rewrite_prompt, selective_prompt};
use super::segments::segment;
use super::similarity::ComparisonReport;
use super::state::{TransferState, TransferTracker};
use super::tagging::tag_segment;
use super::{ChangeStatus, StyleChange, TransferOutcome, TransferStrategy};

/// Prefix of change identifiers.
pub const CHANGE_ID_PREFIX: &str = "change";

const MIN_OUTPUT_TOKENS: usize = 512;
const MAX_OUTPUT_TOKENS: usize = 8192;

/// Inputs to one transfer.
#[derive(Debug, Clone, Copy)]
pub struct TransferRequest<'a> {
    /// Content to rewrite
    pub source_text: &'a str,
    /// Profile of the content
    pub source: &'a StyleProfile,
    /// Profile to move toward
    pub target: &'a StyleProfile,
    /// Semantic units of the content, used by selective tagging
    pub source_units: &'a [SemanticUnit],
}

/// Rewritten text plus bookkeeping, before it becomes an outcome.
struct Rewrite {
    text: String,
    changes: Option<Vec<StyleChange>>,
    targeted: Vec<StyleDimension>,
    steps_planned: usize,
    steps_completed: usize,
    cancelled: bool,
}

struct RewriteFailure {
    step: usize,
    message: String,
    partial: Option<Rewrite>,
}

#[derive(Debug, Deserialize)]
struct RawRewrite {
    #[serde(alias = "segment", alias = "id")]
    index: usize,
    #[serde(alias = "rewrite", alias = "rewritten")]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RewritesPayload {
    Wrapped { rewrites: Vec<RawRewrite> },
    Bare(Vec<RawRewrite>),
}

/// Style similarity and transfer engine.
pub struct TransferEngine {
    llm: Arc<dyn LanguageModel>,
    config: TransferConfig,
}

impl TransferEngine {
    /// Create an engine over an injected language model.
    pub fn new(llm: Arc<dyn LanguageModel>, config: TransferConfig) -> Self {
        Self { llm, config }
    }

    /// Transfer configuration.
    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Compare two profiles with the configured method.
    pub fn compare(&self, source: &StyleProfile, target: &StyleProfile) -> Result<ComparisonReport> {
        ComparisonReport::build(
            source.scores(),
            target.scores(),
            &self.config.comparison_method,
        )
    }

    /// Rewrite `request.source_text` toward the target with `strategy`.
    ///
    /// `tracker` must be in `profiling_target`; it ends in `previewing` on
    /// success and `abandoned` on failure. A cancelled gradual run returns
    /// the steps completed so far, marked `cancelled`.
    pub async fn transfer(
        &self,
        request: &TransferRequest<'_>,
        strategy: TransferStrategy,
        tracker: &mut TransferTracker,
        cancel: &CancellationToken,
    ) -> Result<TransferOutcome> {
        tracker.advance(TransferState::Comparing)?;
        let report = self.compare(request.source, request.target)?;
        info!(
            transfer_id = tracker.transfer_id(),
            %strategy,
            similarity = report.similarity,
            "Starting style transfer"
        );

        tracker.advance(TransferState::Rewriting)?;
        let result = match strategy {
            TransferStrategy::Direct => self.direct(request, &report).await,
            TransferStrategy::Gradual => self.gradual(request, &report, cancel).await,
            TransferStrategy::Selective => self.selective(request, &report).await,
        };

        match result {
            Ok(rewrite) => {
                tracker.advance(TransferState::Previewing)?;
                let outcome = self.outcome(request, strategy, report, rewrite, tracker);
                info!(
                    transfer_id = tracker.transfer_id(),
                    changes = outcome.changes.len(),
                    cancelled = outcome.cancelled,
                    "Style transfer complete"
                );
                Ok(outcome)
            }
            Err(failure) => {
                warn!(
                    transfer_id = tracker.transfer_id(),
                    %strategy,
                    step = failure.step,
                    message = %failure.message,
                    "Style transfer failed"
                );
                tracker.advance(TransferState::Abandoned)?;
                let partial = failure.partial.map(|rewrite| {
                    Box::new(self.outcome(request, strategy, report, rewrite, tracker))
                });
                Err(ScrivenerError::TransferFailed {
                    strategy: strategy.as_str().to_string(),
                    step: failure.step,
                    message: failure.message,
                    partial,
                })
            }
        }
    }

    fn outcome(
        &self,
        request: &TransferRequest<'_>,
        strategy: TransferStrategy,
        report: ComparisonReport,
        rewrite: Rewrite,
        tracker: &TransferTracker,
    ) -> TransferOutcome {
        let changes = rewrite.changes.unwrap_or_else(|| {
            let rationale = rationale(&report, &rewrite.targeted, strategy, rewrite.steps_completed);
            align_changes(request.source_text, &rewrite.text, &rationale, CHANGE_ID_PREFIX)
        });
        let rewritten_text = apply_changes(request.source_text, &changes, |_| true);

        TransferOutcome {
            transfer_id: tracker.transfer_id().to_string(),
            strategy,
            source_text: request.source_text.to_string(),
            rewritten_text,
            changes,
            comparison: report,
            targeted_dimensions: rewrite.targeted,
            target: request.target.clone(),
            steps_planned: rewrite.steps_planned,
            steps_completed: rewrite.steps_completed,
            cancelled: rewrite.cancelled,
            states: tracker.states(),
        }
    }

    async fn direct(
        &self,
        request: &TransferRequest<'_>,
        report: &ComparisonReport,
    ) -> std::result::Result<Rewrite, RewriteFailure> {
        let text = self
            .rewrite(request.source_text, request.source.scores(), request.target.scores())
            .await
            .map_err(|message| RewriteFailure {
                step: 1,
                message,
                partial: None,
            })?;
        Ok(Rewrite {
            text,
            changes: None,
            targeted: report.top_gaps(self.config.selective_min_gap, StyleDimension::ALL.len()),
            steps_planned: 1,
            steps_completed: 1,
            cancelled: false,
        })
    }

    async fn gradual(
        &self,
        request: &TransferRequest<'_>,
        report: &ComparisonReport,
        cancel: &CancellationToken,
    ) -> std::result::Result<Rewrite, RewriteFailure> {
        let steps = self.config.gradual_steps.max(1);
        let targeted = report.top_gaps(self.config.selective_min_gap, StyleDimension::ALL.len());
        let source = request.source.scores();
        let target = request.target.scores();
        let mut current = request.source_text.to_string();

        let progress = |text: &str, completed: usize, cancelled: bool| Rewrite {
            text: text.to_string(),
            changes: None,
            targeted: targeted.clone(),
            steps_planned: steps,
            steps_completed: completed,
            cancelled,
        };

        for step in 1..=steps {
            if cancel.is_cancelled() {
                info!(step, steps, "Gradual transfer cancelled");
                return Ok(progress(&current, step - 1, true));
            }

            let from = source.interpolate(target, (step - 1) as f64 / steps as f64);
            let to = source.interpolate(target, step as f64 / steps as f64);
            match self.rewrite(&current, &from, &to).await {
                Ok(text) => {
                    debug!(step, steps, "Gradual step complete");
                    current = text;
                }
                Err(message) => {
                    return Err(RewriteFailure {
                        step,
                        message,
                        partial: (step > 1).then(|| progress(&current, step - 1, false)),
                    });
                }
            }
        }

        Ok(progress(&current, steps, false))
    }

    async fn selective(
        &self,
        request: &TransferRequest<'_>,
        report: &ComparisonReport,
    ) -> std::result::Result<Rewrite, RewriteFailure> {
        let source = request.source_text;
        let dimensions = report.top_gaps(
            self.config.selective_min_gap,
            self.config.selective_top_dimensions,
        );
        let unchanged = |targeted: Vec<StyleDimension>| Rewrite {
            text: source.to_string(),
            changes: Some(Vec::new()),
            targeted,
            steps_planned: 0,
            steps_completed: 0,
            cancelled: false,
        };
        if dimensions.is_empty() {
            debug!("No dimension gap above threshold; nothing to rewrite");
            return Ok(unchanged(dimensions));
        }

        let segments = segment(source);
        let tagged: Vec<(usize, &str)> = segments
            .iter()
            .filter(|s| {
                tag_segment(s.content(source), request.source_units)
                    .iter()
                    .any(|d| dimensions.contains(d))
            })
            .map(|s| (s.index, s.content(source)))
            .filter(|(_, content)| !content.is_empty())
            .collect();
        if tagged.is_empty() {
            debug!(?dimensions, "No segment carries the targeted dimensions");
            return Ok(unchanged(dimensions));
        }

        let gaps: Vec<(StyleDimension, f64)> =
            dimensions.iter().map(|d| (*d, report.gap(*d))).collect();
        let prompt = selective_prompt(&tagged, &gaps);
        let failure = |message: String| RewriteFailure {
            step: 1,
            message,
            partial: None,
        };

        let raw = self
            .llm
            .complete(&prompt, &CompletionOptions::json(self.config.temperature))
            .await
            .map_err(|err| failure(err.to_string()))?;
        let rewrites = LlmParse::<RewritesPayload>::from_response(&raw, |_| None)
            .into_value()
            .map(|payload| match payload {
                RewritesPayload::Wrapped { rewrites } | RewritesPayload::Bare(rewrites) => rewrites,
            })
            .ok_or_else(|| failure("unparsable segment rewrites".to_string()))?;

        let rationale = rationale(report, &dimensions, TransferStrategy::Selective, 1);
        let mut changes = Vec::new();
        let mut ignored = 0usize;
        for rewrite in &rewrites {
            let Some(segment) = segments
                .get(rewrite.index)
                .filter(|s| tagged.iter().any(|(index, _)| *index == s.index))
            else {
                ignored += 1;
                continue;
            };
            let proposed_text = rewrite.text.trim();
            if proposed_text.is_empty() || proposed_text == segment.content(source) {
                continue;
            }
            if changes.iter().any(|c: &StyleChange| c.start == segment.start) {
                continue;
            }
            let original = segment.text(source);
            let proposed = format!(
                "{}{proposed_text}{}",
                segment.leading(source),
                segment.trailing(source)
            );
            changes.push(StyleChange {
                id: String::new(),
                change_type: classify_change(original, &proposed),
                start: segment.start,
                end: segment.end,
                original_span: original.to_string(),
                proposed_span: proposed,
                rationale: rationale.clone(),
                status: ChangeStatus::Pending,
            });
        }
        if ignored > 0 {
            debug!(ignored, "Dropped rewrites for segments outside the selection");
        }

        changes.sort_by_key(|c| c.start);
        for (n, change) in changes.iter_mut().enumerate() {
            change.id = format!("{CHANGE_ID_PREFIX}-{}", n + 1);
        }
        let text = apply_changes(source, &changes, |_| true);

        Ok(Rewrite {
            text,
            changes: Some(changes),
            targeted: dimensions,
            steps_planned: 1,
            steps_completed: 1,
            cancelled: false,
        })
    }

    /// One whole-text rewrite; errors are reported as messages.
    async fn rewrite(
        &self,
        text: &str,
        from: &StyleScores,
        to: &StyleScores,
    ) -> std::result::Result<String, String> {
        let prompt = rewrite_prompt(text, from, to);
        let max_tokens = (text.chars().count() * 2)
            .clamp(MIN_OUTPUT_TOKENS, MAX_OUTPUT_TOKENS);
        let options = CompletionOptions::text(
            self.config.temperature,
            u32::try_from(max_tokens).unwrap_or(u32::MAX),
        );

        let raw = self
            .llm
            .complete(&prompt, &options)
            .await
            .map_err(|err| err.to_string())?;
        let body = strip_code_fences(&raw).trim();
        if body.is_empty() {
            return Err("model returned an empty rewrite".to_string());
        }
        Ok(restore_edges(text, body))
    }
}

/// Carry the source's leading and trailing whitespace over to a rewrite.
fn restore_edges(source: &str, rewritten: &str) -> String {
    let leading = &source[..source.len() - source.trim_start().len()];
    let trailing = &source[source.trim_end().len()..];
    format!("{leading}{rewritten}{trailing}")
}

fn rationale(
    report: &ComparisonReport,
    dimensions: &[StyleDimension],
    strategy: TransferStrategy,
    steps: usize,
) -> String {
    if dimensions.is_empty() {
        return "Aligns wording with the target style".to_string();
    }
    let moves = dimensions
        .iter()
        .map(|d| {
            let verb = if report.gap(*d) > 0.0 { "raises" } else { "lowers" };
            format!("{verb} {d} (gap {:+.2})", report.gap(*d))
        })
        .collect::<Vec<_>>()
        .join("; ");
    match strategy {
        TransferStrategy::Gradual if steps > 1 => {
            format!("Moves toward the target over {steps} steps: {moves}")
        }
        _ => format!("Moves toward the target: {moves}"),
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
