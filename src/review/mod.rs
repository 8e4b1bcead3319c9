//! Review sessions for proposed style changes.
//!
//! A session holds the source content and the changes of one transfer.
//! Changes are accepted or rejected one at a time or in batches, may be
//! toggled until export, and export applies the accepted ones in document
//! order. Sessions expire after a window of inactivity.

pub mod clock;
pub mod manager;
pub mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::ReviewSessionManager;
pub use session::{
    Decision, DecisionCounts, ExportedDocument, ReviewPreview, ReviewSession, SessionSummary,
};
