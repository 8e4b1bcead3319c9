//! Provenance tracking for model-derived values.
//!
//! Every value that comes from a language-model judgment is wrapped in
//! [`Scored`], which records whether the value is real model signal or a
//! documented fallback. [`SubcallLedger`] counts attempted, recovered and
//! failed model sub-calls per stage so the engine can decide whether a
//! result is degraded.

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::providers::ParseFidelity;

/// Where a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreSource {
    /// Parsed from a model response
    Llm,
    /// Neutral default substituted after a failed or unparsable call
    Fallback,
}

/// A value tagged with its source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scored<T> {
    /// The value
    pub value: T,
    /// Where it came from
    pub source: ScoreSource,
}

impl<T> Scored<T> {
    /// A model-derived value.
    pub fn llm(value: T) -> Self {
        Self {
            value,
            source: ScoreSource::Llm,
        }
    }

    /// A fallback value.
    pub fn fallback(value: T) -> Self {
        Self {
            value,
            source: ScoreSource::Fallback,
        }
    }

    /// True when the value is a fallback.
    pub fn is_fallback(&self) -> bool {
        self.source == ScoreSource::Fallback
    }
}

/// Attempted and failed sub-calls for one stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTally {
    /// Calls attempted
    pub attempted: usize,
    /// Calls that failed or returned nothing usable
    pub failed: usize,
    /// Calls whose reply was only recovered by permissive parsing
    #[serde(default)]
    pub recovered: usize,
}

/// Thread-safe per-stage sub-call counter for one analysis run.
#[derive(Debug, Default)]
pub struct SubcallLedger {
    stages: Mutex<IndexMap<&'static str, StageTally>>,
}

impl SubcallLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful sub-call.
    pub fn record_success(&self, stage: &'static str) {
        self.stages.lock().entry(stage).or_default().attempted += 1;
    }

    /// Record a sub-call whose reply was salvaged from malformed output.
    pub fn record_recovered(&self, stage: &'static str, identifier: &str) {
        debug!(stage, identifier, "Sub-call reply recovered permissively");
        let mut stages = self.stages.lock();
        let tally = stages.entry(stage).or_default();
        tally.attempted += 1;
        tally.recovered += 1;
    }

    /// Record a usable reply according to how it was parsed.
    pub fn record_parsed(&self, stage: &'static str, identifier: &str, fidelity: ParseFidelity) {
        match fidelity {
            ParseFidelity::Parsed => self.record_success(stage),
            ParseFidelity::Degraded => self.record_recovered(stage, identifier),
            ParseFidelity::Unparsable => {
                self.record_failure(stage, identifier, "unparsable reply");
            }
        }
    }

    /// Record a failed sub-call and log the absorbed fallback.
    pub fn record_failure(&self, stage: &'static str, identifier: &str, reason: &str) {
        warn!(stage, identifier, reason, "Sub-call failed; using fallback");
        let mut stages = self.stages.lock();
        let tally = stages.entry(stage).or_default();
        tally.attempted += 1;
        tally.failed += 1;
    }

    /// Total attempted sub-calls.
    pub fn attempted(&self) -> usize {
        self.stages.lock().values().map(|t| t.attempted).sum()
    }

    /// Total failed sub-calls.
    pub fn failed(&self) -> usize {
        self.stages.lock().values().map(|t| t.failed).sum()
    }

    /// Total sub-calls recovered by permissive parsing.
    pub fn recovered(&self) -> usize {
        self.stages.lock().values().map(|t| t.recovered).sum()
    }

    /// Failed / attempted, or 0 when nothing was attempted.
    pub fn failure_ratio(&self) -> f64 {
        let attempted = self.attempted();
        if attempted == 0 {
            0.0
        } else {
            self.failed() as f64 / attempted as f64
        }
    }

    /// Snapshot of the per-stage tallies in first-recorded order.
    pub fn snapshot(&self) -> IndexMap<String, StageTally> {
        self.stages
            .lock()
            .iter()
            .map(|(stage, tally)| ((*stage).to_string(), *tally))
            .collect()
    }
}
