//! Registry of review sessions with inactivity expiry.

use std::sync::Arc;

use chrono::Duration;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::config::ReviewConfig;
use crate::core::errors::{Result, ScrivenerError};
use crate::transfer::{ChangeStatus, TransferOutcome, TransferState, TransferTracker};

use super::clock::{Clock, SystemClock};
use super::session::{Decision, ExportedDocument, ReviewPreview, ReviewSession, SessionSummary};

/// Owns review sessions; each session is guarded by its own lock.
pub struct ReviewSessionManager {
    sessions: DashMap<String, Arc<Mutex<ReviewSession>>>,
    clock: Arc<dyn Clock>,
    window: Duration,
}

impl ReviewSessionManager {
    /// Create a manager on the system clock.
    pub fn new(config: &ReviewConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a manager on an injected clock.
    pub fn with_clock(config: &ReviewConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: DashMap::new(),
            clock,
            window: config.inactivity_window(),
        }
    }

    /// Open a session for a transfer outcome; `tracker` moves to `reviewing`.
    pub fn create_session(
        &self,
        outcome: &TransferOutcome,
        mut tracker: TransferTracker,
    ) -> Result<SessionSummary> {
        tracker.advance(TransferState::Reviewing)?;
        let session_id = Uuid::new_v4().to_string();
        let session = ReviewSession::new(
            session_id.clone(),
            outcome.source_text.clone(),
            outcome.changes.clone(),
            outcome.target.clone(),
            tracker,
            self.clock.now(),
            self.window,
        )?;
        let summary = session.summary();
        self.sessions
            .insert(session_id.clone(), Arc::new(Mutex::new(session)));
        info!(session_id = %session_id, changes = summary.total, "Review session created");
        Ok(summary)
    }

    /// Decide one change and return the updated preview.
    pub fn decide(&self, session_id: &str, decision: &Decision) -> Result<ReviewPreview> {
        self.with_session(session_id, |session| {
            session.decide(decision)?;
            Ok(session.preview())
        })
    }

    /// Decide several changes at once and return the updated preview.
    pub fn decide_batch(&self, session_id: &str, decisions: &[Decision]) -> Result<ReviewPreview> {
        self.with_session(session_id, |session| {
            session.decide_batch(decisions)?;
            Ok(session.preview())
        })
    }

    /// Set every change of the session to `status` and return the updated preview.
    pub fn decide_all(&self, session_id: &str, status: ChangeStatus) -> Result<ReviewPreview> {
        self.with_session(session_id, |session| {
            session.decide_all(status)?;
            Ok(session.preview())
        })
    }

    /// Preview the session with the accepted changes applied.
    pub fn preview(&self, session_id: &str) -> Result<ReviewPreview> {
        self.with_session(session_id, |session| Ok(session.preview()))
    }

    /// Export the session; repeated exports return the same document.
    pub fn export(&self, session_id: &str) -> Result<ExportedDocument> {
        let now = self.clock.now();
        self.with_session(session_id, |session| session.export(now))
    }

    /// Session overview.
    pub fn summary(&self, session_id: &str) -> Result<SessionSummary> {
        self.with_session(session_id, |session| Ok(session.summary()))
    }

    /// Summaries of the live sessions, oldest first.
    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        let now = self.clock.now();
        let mut summaries: Vec<SessionSummary> = self
            .handles()
            .into_iter()
            .filter_map(|handle| {
                let session = handle.lock();
                (!session.is_expired(now)).then(|| session.summary())
            })
            .collect();
        summaries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        summaries
    }

    /// Remove expired sessions; returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().lock().is_expired(now))
            .map(|entry| entry.key().clone())
            .collect();
        for session_id in &expired {
            self.sessions.remove(session_id);
        }
        if !expired.is_empty() {
            debug!(removed = expired.len(), "Swept expired review sessions");
        }
        expired.len()
    }

    /// Number of sessions held, expired or not.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True when no session is held.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn handles(&self) -> Vec<Arc<Mutex<ReviewSession>>> {
        self.sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Run `f` under the session lock after the expiry check.
    ///
    /// An expired session fails with `SessionExpired` and is removed, so
    /// later calls see `SessionNotFound`.
    fn with_session<T>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut ReviewSession) -> Result<T>,
    ) -> Result<T> {
        let handle = self
            .sessions
            .get(session_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ScrivenerError::SessionNotFound {
                session_id: session_id.to_string(),
            })?;

        let now = self.clock.now();
        let mut session = handle.lock();
        if session.is_expired(now) {
            drop(session);
            self.sessions.remove(session_id);
            info!(session_id, "Review session expired");
            return Err(ScrivenerError::SessionExpired {
                session_id: session_id.to_string(),
            });
        }
        session.touch(now);
        f(&mut session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::profile::{StyleProfile, StyleScores};
    use crate::review::clock::ManualClock;
    use crate::transfer::{align_changes, ComparisonMethod, ComparisonReport, TransferStrategy};

    const SOURCE: &str = "嗨，今天聊聊合同吧。条款挺多的！我们慢慢看。";
    const REWRITE: &str = "您好，今天讨论合同事宜。条款挺多的！我们慢慢看。";

    fn previewing_tracker() -> TransferTracker {
        let mut tracker = TransferTracker::new("t");
        for state in [
            TransferState::ProfilingSource,
            TransferState::ProfilingTarget,
            TransferState::Comparing,
            TransferState::Rewriting,
            TransferState::Previewing,
        ] {
            tracker.advance(state).unwrap();
        }
        tracker
    }

    fn outcome() -> TransferOutcome {
        let scores = StyleScores::neutral();
        TransferOutcome {
            transfer_id: "t".into(),
            strategy: TransferStrategy::Direct,
            source_text: SOURCE.into(),
            rewritten_text: REWRITE.into(),
            changes: align_changes(SOURCE, REWRITE, "formal", "change"),
            comparison: ComparisonReport::build(&scores, &scores, &ComparisonMethod::Cosine)
                .unwrap(),
            targeted_dimensions: Vec::new(),
            target: StyleProfile::from_scores("formal", scores),
            steps_planned: 1,
            steps_completed: 1,
            cancelled: false,
            states: Vec::new(),
        }
    }

    fn manager() -> (ReviewSessionManager, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let manager = ReviewSessionManager::with_clock(&ReviewConfig::default(), clock.clone());
        (manager, clock)
    }

    #[test]
    fn decisions_return_the_preview_they_produced() {
        let (manager, _) = manager();
        let summary = manager.create_session(&outcome(), previewing_tracker()).unwrap();
        let first = outcome().changes[0].id.clone();

        let preview = manager
            .decide(&summary.session_id, &Decision::accept(&first))
            .unwrap();
        assert_eq!(preview.counts.accepted, 1);
        assert_eq!(preview, manager.preview(&summary.session_id).unwrap());

        let preview = manager
            .decide_all(&summary.session_id, ChangeStatus::Accepted)
            .unwrap();
        assert_eq!(preview.text, REWRITE);
        assert_eq!(preview.counts.pending, 0);

        let preview = manager
            .decide_batch(&summary.session_id, &[Decision::reject(&first)])
            .unwrap();
        assert_eq!(preview.counts.rejected, 1);
        assert_eq!(preview.counts.accepted, preview.total - 1);
    }

    #[test]
    fn oversized_window_is_capped_instead_of_overflowing() {
        let config = ReviewConfig {
            inactivity_window_secs: u64::MAX,
        };
        let clock = Arc::new(ManualClock::default());
        let manager = ReviewSessionManager::with_clock(&config, clock.clone());
        let summary = manager.create_session(&outcome(), previewing_tracker()).unwrap();

        clock.advance(Duration::days(29));
        assert!(manager.preview(&summary.session_id).is_ok());
        clock.advance(Duration::days(31));
        assert!(matches!(
            manager.preview(&summary.session_id),
            Err(ScrivenerError::SessionExpired { .. })
        ));
    }

    #[test]
    fn unknown_session_is_not_found() {
        let (manager, _) = manager();
        assert!(matches!(
            manager.preview("nope"),
            Err(ScrivenerError::SessionNotFound { .. })
        ));
    }

    #[test]
    fn expired_session_fails_then_disappears() {
        let (manager, clock) = manager();
        let summary = manager.create_session(&outcome(), previewing_tracker()).unwrap();
        clock.advance(Duration::minutes(61));

        assert!(matches!(
            manager.preview(&summary.session_id),
            Err(ScrivenerError::SessionExpired { .. })
        ));
        assert!(matches!(
            manager.preview(&summary.session_id),
            Err(ScrivenerError::SessionNotFound { .. })
        ));
        assert!(manager.is_empty());
    }

    #[test]
    fn activity_extends_the_window() {
        let (manager, clock) = manager();
        let summary = manager.create_session(&outcome(), previewing_tracker()).unwrap();
        clock.advance(Duration::minutes(45));
        manager.preview(&summary.session_id).unwrap();
        clock.advance(Duration::minutes(45));
        assert!(manager.preview(&summary.session_id).is_ok());
    }

    #[test]
    fn export_is_idempotent_until_expiry() {
        let (manager, clock) = manager();
        let summary = manager.create_session(&outcome(), previewing_tracker()).unwrap();
        manager
            .decide_all(&summary.session_id, ChangeStatus::Accepted)
            .unwrap();
        let first = manager.export(&summary.session_id).unwrap();
        assert_eq!(first.text, REWRITE);
        clock.advance(Duration::minutes(10));
        assert_eq!(manager.export(&summary.session_id).unwrap(), first);
        assert!(matches!(
            manager.decide_all(&summary.session_id, ChangeStatus::Rejected),
            Err(ScrivenerError::SessionFrozen { .. })
        ));
    }

    #[test]
    fn sweep_removes_only_expired_sessions() {
        let (manager, clock) = manager();
        let old = manager.create_session(&outcome(), previewing_tracker()).unwrap();
        clock.advance(Duration::minutes(40));
        let fresh = manager.create_session(&outcome(), previewing_tracker()).unwrap();
        clock.advance(Duration::minutes(30));

        assert_eq!(manager.sweep_expired(), 1);
        let live = manager.list_sessions();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].session_id, fresh.session_id);
        assert!(matches!(
            manager.summary(&old.session_id),
            Err(ScrivenerError::SessionNotFound { .. })
        ));
    }
}
