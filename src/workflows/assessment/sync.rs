use serde::{Deserialize, Serialize};

use super::domain::{AssessmentSession, EvaluationRecord};
use super::repository::{AssessmentRepository, RepositoryError};

/// State mutation broadcast to every connected assessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssessmentEvent {
    EvaluationUpserted(EvaluationRecord),
    SessionUpserted(AssessmentSession),
}

/// Outbound half of the peer channel. The transport (WebRTC in the browser
/// original) is somebody else's problem; the service only hands events over.
pub trait EventChannel: Send + Sync {
    fn broadcast(&self, event: AssessmentEvent) -> Result<(), ChannelError>;
}

/// Channel dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("channel transport unavailable: {0}")]
    Transport(String),
}

/// No-op channel for standalone (single-assessor) operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullChannel;

impl EventChannel for NullChannel {
    fn broadcast(&self, _event: AssessmentEvent) -> Result<(), ChannelError> {
        Ok(())
    }
}

/// Apply a received peer event to the local store.
///
/// Last-write-wins: whatever arrives replaces the record with the same id,
/// with no vector clocks or conflict detection. Locking is not re-checked
/// here; the lock guards local creation and import, not remote state.
pub fn apply_event<R: AssessmentRepository>(
    repository: &R,
    event: AssessmentEvent,
) -> Result<(), RepositoryError> {
    match event {
        AssessmentEvent::EvaluationUpserted(record) => repository.upsert_evaluation(record),
        AssessmentEvent::SessionUpserted(session) => repository.upsert_session(session),
    }
}
