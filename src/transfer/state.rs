//! Transfer lifecycle.
//!
//! ```text
//! requested → profiling_source → profiling_target → comparing → rewriting
//!           → previewing → reviewing → exported
//! ```
//!
//! `previewing` may go straight to `exported` when no review is needed, and
//! any non-terminal state may move to `abandoned`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::errors::{Result, ScrivenerError};

/// Lifecycle state of one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferState {
    /// Accepted, nothing done yet
    Requested,
    /// Analysing the source content
    ProfilingSource,
    /// Resolving the target profile
    ProfilingTarget,
    /// Comparing source and target
    Comparing,
    /// Rewriting with the language model
    Rewriting,
    /// Changes computed
    Previewing,
    /// Under review in a session
    Reviewing,
    /// Final text exported
    Exported,
    /// Dropped before export
    Abandoned,
}

impl TransferState {
    /// Snake-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::ProfilingSource => "profiling_source",
            Self::ProfilingTarget => "profiling_target",
            Self::Comparing => "comparing",
            Self::Rewriting => "rewriting",
            Self::Previewing => "previewing",
            Self::Reviewing => "reviewing",
            Self::Exported => "exported",
            Self::Abandoned => "abandoned",
        }
    }

    /// True for `exported` and `abandoned`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Exported | Self::Abandoned)
    }

    /// Whether `self → next` is a legal transition.
    pub fn can_transition_to(self, next: TransferState) -> bool {
        use TransferState::*;
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (_, Abandoned)
                | (Requested, ProfilingSource)
                | (ProfilingSource, ProfilingTarget)
                | (ProfilingTarget, Comparing)
                | (Comparing, Rewriting)
                | (Rewriting, Previewing)
                | (Previewing, Reviewing)
                | (Previewing, Exported)
                | (Reviewing, Exported)
        )
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    /// State entered
    pub state: TransferState,
    /// When it was entered
    pub at: DateTime<Utc>,
}

/// Enforces legal transitions and records the path taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferTracker {
    transfer_id: String,
    history: Vec<StateTransition>,
}

impl TransferTracker {
    /// Start a tracker in `requested`.
    pub fn new(transfer_id: impl Into<String>) -> Self {
        Self {
            transfer_id: transfer_id.into(),
            history: vec![StateTransition {
                state: TransferState::Requested,
                at: Utc::now(),
            }],
        }
    }

    /// Transfer identifier.
    pub fn transfer_id(&self) -> &str {
        &self.transfer_id
    }

    /// Current state.
    pub fn state(&self) -> TransferState {
        self.history
            .last()
            .map_or(TransferState::Requested, |t| t.state)
    }

    /// Move to `next`, failing on an illegal transition.
    pub fn advance(&mut self, next: TransferState) -> Result<()> {
        let current = self.state();
        if !current.can_transition_to(next) {
            return Err(ScrivenerError::internal(format!(
                "illegal transfer transition {current} -> {next}"
            ))
            .with_context(self.transfer_id.clone()));
        }
        debug!(transfer_id = %self.transfer_id, from = %current, to = %next, "Transfer state change");
        self.history.push(StateTransition {
            state: next,
            at: Utc::now(),
        });
        Ok(())
    }

    /// States visited, in order.
    pub fn states(&self) -> Vec<TransferState> {
        self.history.iter().map(|t| t.state).collect()
    }

    /// Full transition history.
    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_is_accepted() {
        let mut tracker = TransferTracker::new("t-1");
        for state in [
            TransferState::ProfilingSource,
            TransferState::ProfilingTarget,
            TransferState::Comparing,
            TransferState::Rewriting,
            TransferState::Previewing,
            TransferState::Reviewing,
            TransferState::Exported,
        ] {
            tracker.advance(state).unwrap();
        }
        assert_eq!(tracker.state(), TransferState::Exported);
        assert_eq!(tracker.states().len(), 8);
    }

    #[test]
    fn skipping_states_is_rejected() {
        let mut tracker = TransferTracker::new("t-2");
        let err = tracker.advance(TransferState::Rewriting).unwrap_err();
        match err {
            ScrivenerError::Internal { message, context } => {
                assert!(message.contains("requested -> rewriting"), "{message}");
                assert_eq!(context.as_deref(), Some("t-2"));
            }
            other => panic!("expected internal error, got {other:?}"),
        }
        assert_eq!(tracker.state(), TransferState::Requested);
    }

    #[test]
    fn terminal_states_are_final() {
        let mut tracker = TransferTracker::new("t-3");
        tracker.advance(TransferState::Abandoned).unwrap();
        assert!(tracker.advance(TransferState::ProfilingSource).is_err());
        assert!(tracker.advance(TransferState::Abandoned).is_err());
    }

    #[test]
    fn states_serialize_snake_case() {
        let json = serde_json::to_string(&TransferState::ProfilingSource).unwrap();
        assert_eq!(json, "\"profiling_source\"");
    }
}
