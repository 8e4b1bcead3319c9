//! A rewrite under review.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::errors::{Result, ScrivenerError};
use crate::core::profile::StyleProfile;
use crate::transfer::{apply_changes, ChangeStatus, StyleChange, TransferState, TransferTracker};

/// One decision on one change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Change identifier
    pub change_id: String,
    /// New status
    pub status: ChangeStatus,
}

impl Decision {
    /// Accept `change_id`.
    pub fn accept(change_id: impl Into<String>) -> Self {
        Self {
            change_id: change_id.into(),
            status: ChangeStatus::Accepted,
        }
    }

    /// Reject `change_id`.
    pub fn reject(change_id: impl Into<String>) -> Self {
        Self {
            change_id: change_id.into(),
            status: ChangeStatus::Rejected,
        }
    }
}

/// Decision counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionCounts {
    /// Accepted changes
    pub accepted: usize,
    /// Rejected changes
    pub rejected: usize,
    /// Undecided changes
    pub pending: usize,
}

/// Text with the currently accepted changes applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewPreview {
    /// Session identifier
    pub session_id: String,
    /// Preview text
    pub text: String,
    /// Decision counts
    pub counts: DecisionCounts,
    /// Total changes
    pub total: usize,
}

/// Final text of an exported session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedDocument {
    /// Session identifier
    pub session_id: String,
    /// Final text
    pub text: String,
    /// Identifiers of the applied changes, in document order
    pub applied: Vec<String>,
    /// When the session was first exported
    pub exported_at: DateTime<Utc>,
}

/// Overview of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session identifier
    pub session_id: String,
    /// Target profile name
    pub target: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Expiry time at the current activity
    pub expires_at: DateTime<Utc>,
    /// Total changes
    pub total: usize,
    /// Decision counts
    pub counts: DecisionCounts,
    /// True once exported
    pub frozen: bool,
}

/// Review state of one transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSession {
    id: String,
    source_text: String,
    changes: Vec<StyleChange>,
    target: StyleProfile,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    window_secs: i64,
    tracker: TransferTracker,
    export: Option<ExportedDocument>,
}

impl ReviewSession {
    /// Create a session, validating change spans against `source_text`.
    ///
    /// Spans must lie inside the content on character boundaries, be in
    /// document order without overlap, and match the content they replace.
    pub fn new(
        id: impl Into<String>,
        source_text: impl Into<String>,
        changes: Vec<StyleChange>,
        target: StyleProfile,
        tracker: TransferTracker,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<Self> {
        let source_text = source_text.into();
        validate_changes(&source_text, &changes)?;
        if now.checked_add_signed(window).is_none() {
            return Err(ScrivenerError::config_field(
                format!("inactivity window of {}s overflows the session clock", window.num_seconds()),
                "review.inactivity_window_secs",
            ));
        }
        Ok(Self {
            id: id.into(),
            source_text,
            changes,
            target,
            created_at: now,
            last_activity: now,
            window_secs: window.num_seconds(),
            tracker,
            export: None,
        })
    }

    /// Session identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Source content.
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// Changes in document order.
    pub fn changes(&self) -> &[StyleChange] {
        &self.changes
    }

    /// Target profile.
    pub fn target(&self) -> &StyleProfile {
        &self.target
    }

    /// Transfer lifecycle.
    pub fn tracker(&self) -> &TransferTracker {
        &self.tracker
    }

    /// True once exported.
    pub fn is_frozen(&self) -> bool {
        self.export.is_some()
    }

    /// Expiry time at the current activity.
    pub fn expires_at(&self) -> DateTime<Utc> {
        Duration::try_seconds(self.window_secs)
            .and_then(|window| self.last_activity.checked_add_signed(window))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// True when `now` is past the inactivity window.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at()
    }

    /// Record activity at `now`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
    }

    /// Set the status of one change; decisions may be changed until export.
    pub fn decide(&mut self, decision: &Decision) -> Result<StyleChange> {
        self.ensure_open()?;
        let index = self.position(&decision.change_id)?;
        let change = &mut self.changes[index];
        change.status = decision.status;
        debug!(session_id = %self.id, change_id = %change.id, status = change.status.as_str(), "Change decided");
        Ok(change.clone())
    }

    /// Apply several decisions; nothing changes if any identifier is unknown.
    ///
    /// Later decisions on the same change win.
    pub fn decide_batch(&mut self, decisions: &[Decision]) -> Result<Vec<StyleChange>> {
        self.ensure_open()?;
        let indices = decisions
            .iter()
            .map(|d| self.position(&d.change_id))
            .collect::<Result<Vec<_>>>()?;
        for (index, decision) in indices.iter().zip(decisions) {
            self.changes[*index].status = decision.status;
        }
        let touched: HashSet<usize> = indices.into_iter().collect();
        Ok(self
            .changes
            .iter()
            .enumerate()
            .filter(|(i, _)| touched.contains(i))
            .map(|(_, c)| c.clone())
            .collect())
    }

    /// Set every change to `status`.
    pub fn decide_all(&mut self, status: ChangeStatus) -> Result<usize> {
        self.ensure_open()?;
        for change in &mut self.changes {
            change.status = status;
        }
        Ok(self.changes.len())
    }

    /// Decision counts.
    pub fn counts(&self) -> DecisionCounts {
        self.changes
            .iter()
            .fold(DecisionCounts::default(), |mut counts, change| {
                match change.status {
                    ChangeStatus::Accepted => counts.accepted += 1,
                    ChangeStatus::Rejected => counts.rejected += 1,
                    ChangeStatus::Pending => counts.pending += 1,
                }
                counts
            })
    }

    /// Text with the accepted changes applied.
    pub fn preview(&self) -> ReviewPreview {
        ReviewPreview {
            session_id: self.id.clone(),
            text: self.accepted_text(),
            counts: self.counts(),
            total: self.changes.len(),
        }
    }

    /// Apply accepted changes in document order and freeze the session.
    ///
    /// Exporting again returns the same document.
    pub fn export(&mut self, now: DateTime<Utc>) -> Result<ExportedDocument> {
        if let Some(export) = &self.export {
            return Ok(export.clone());
        }
        if self.tracker.state() != TransferState::Exported {
            self.tracker.advance(TransferState::Exported)?;
        }
        let export = ExportedDocument {
            session_id: self.id.clone(),
            text: self.accepted_text(),
            applied: self
                .changes
                .iter()
                .filter(|c| c.status == ChangeStatus::Accepted)
                .map(|c| c.id.clone())
                .collect(),
            exported_at: now,
        };
        self.export = Some(export.clone());
        Ok(export)
    }

    /// Overview at the current state.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            target: self.target.name().to_string(),
            created_at: self.created_at,
            expires_at: self.expires_at(),
            total: self.changes.len(),
            counts: self.counts(),
            frozen: self.is_frozen(),
        }
    }

    fn accepted_text(&self) -> String {
        apply_changes(&self.source_text, &self.changes, |c| {
            c.status == ChangeStatus::Accepted
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_frozen() {
            return Err(ScrivenerError::SessionFrozen {
                session_id: self.id.clone(),
            });
        }
        Ok(())
    }

    fn position(&self, change_id: &str) -> Result<usize> {
        self.changes
            .iter()
            .position(|c| c.id == change_id)
            .ok_or_else(|| ScrivenerError::ChangeNotFound {
                session_id: self.id.clone(),
                change_id: change_id.to_string(),
            })
    }
}

fn validate_changes(source: &str, changes: &[StyleChange]) -> Result<()> {
    let mut ids = HashSet::new();
    let mut previous_end = 0;
    for change in changes {
        let field = format!("changes.{}", change.id);
        if !ids.insert(change.id.as_str()) {
            return Err(ScrivenerError::validation_field("duplicate change id", field));
        }
        if change.start > change.end || change.end > source.len() {
            return Err(ScrivenerError::validation_field(
                format!("span {}..{} outside content", change.start, change.end),
                field,
            ));
        }
        if !source.is_char_boundary(change.start) || !source.is_char_boundary(change.end) {
            return Err(ScrivenerError::validation_field(
                "span not on a character boundary",
                field,
            ));
        }
        if change.start < previous_end {
            return Err(ScrivenerError::validation_field(
                "changes overlap or are out of order",
                field,
            ));
        }
        if source[change.start..change.end] != change.original_span {
            return Err(ScrivenerError::validation_field(
                "original span does not match content",
                field,
            ));
        }
        previous_end = change.end;
    }
    Ok(())
}
