use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use super::aggregation::{aggregate_across_assessors, pivot_by_module, AssessmentAggregate};
use super::domain::{
    AssessmentId, AssessmentSession, EvaluationId, EvaluationRecord, EvaluationStatus,
    MAX_TOPIC_SCORE,
};
use super::export::{write_evaluation_csv, ExportError};
use super::repository::{AssessmentRepository, RepositoryError};
use super::scoring::{summarize_evaluation, EvaluationSummary};
use super::sync::{apply_event, AssessmentEvent, ChannelError, EventChannel};
use crate::workflows::matrix::{CompetencyMatrix, Profile, ProfileId, TopicId};

/// Request payload for opening a new candidate assessment.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSession {
    pub candidate_name: String,
    pub profile_id: ProfileId,
    pub date: NaiveDate,
}

static ASSESSMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static EVALUATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_assessment_id() -> AssessmentId {
    let id = ASSESSMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    AssessmentId(format!("asmt-{id:06}"))
}

fn next_evaluation_id() -> EvaluationId {
    let id = EVALUATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    EvaluationId(format!("eval-{id:06}"))
}

/// Service composing the repository, the peer channel, and the scoring core.
///
/// All session and evaluation mutations flow through here so that status
/// transitions, the session lock, and score bounds are enforced in one place
/// and every accepted mutation is broadcast to peers.
pub struct AssessmentService<R, C> {
    matrix: Arc<CompetencyMatrix>,
    profiles: BTreeMap<ProfileId, Profile>,
    repository: Arc<R>,
    channel: Arc<C>,
}

impl<R, C> AssessmentService<R, C>
where
    R: AssessmentRepository + 'static,
    C: EventChannel + 'static,
{
    pub fn new(
        matrix: Arc<CompetencyMatrix>,
        profiles: Vec<Profile>,
        repository: Arc<R>,
        channel: Arc<C>,
    ) -> Self {
        let profiles = profiles
            .into_iter()
            .map(|profile| (profile.id.clone(), profile))
            .collect();

        Self {
            matrix,
            profiles,
            repository,
            channel,
        }
    }

    pub fn matrix(&self) -> &CompetencyMatrix {
        &self.matrix
    }

    fn profile(&self, id: &ProfileId) -> Result<&Profile, AssessmentServiceError> {
        self.profiles
            .get(id)
            .ok_or_else(|| AssessmentServiceError::UnknownProfile(id.0.clone()))
    }

    /// Open a new assessment for a candidate.
    pub fn create_session(
        &self,
        request: NewSession,
    ) -> Result<AssessmentSession, AssessmentServiceError> {
        let profile = self.profile(&request.profile_id)?;

        let session = AssessmentSession {
            id: next_assessment_id(),
            candidate_name: request.candidate_name,
            profile_id: profile.id.clone(),
            profile_title: profile.title.clone(),
            stack: profile.stack.clone(),
            date: request.date,
            locked: false,
        };

        self.repository.insert_session(session.clone())?;
        self.channel
            .broadcast(AssessmentEvent::SessionUpserted(session.clone()))?;

        info!(assessment = %session.id.0, candidate = %session.candidate_name, "assessment session created");
        Ok(session)
    }

    /// Every known assessment session, for the overview listing.
    pub fn sessions(&self) -> Result<Vec<AssessmentSession>, AssessmentServiceError> {
        Ok(self.repository.sessions()?)
    }

    /// Lock an assessment so no further evaluations can be created or imported.
    pub fn lock_session(
        &self,
        id: &AssessmentId,
    ) -> Result<AssessmentSession, AssessmentServiceError> {
        let mut session = self
            .repository
            .fetch_session(id)?
            .ok_or(RepositoryError::NotFound)?;

        session.locked = true;
        self.repository.upsert_session(session.clone())?;
        self.channel
            .broadcast(AssessmentEvent::SessionUpserted(session.clone()))?;

        info!(assessment = %session.id.0, "assessment session locked");
        Ok(session)
    }

    /// Start a fresh evaluation for one assessor within an assessment.
    pub fn start_evaluation(
        &self,
        assessment_id: &AssessmentId,
        assessor_name: String,
    ) -> Result<EvaluationRecord, AssessmentServiceError> {
        let session = self
            .repository
            .fetch_session(assessment_id)?
            .ok_or(RepositoryError::NotFound)?;

        if session.locked {
            return Err(AssessmentServiceError::SessionLocked(session.id.0));
        }

        let record = EvaluationRecord {
            id: next_evaluation_id(),
            assessment_id: session.id.clone(),
            assessor_name,
            candidate_name: session.candidate_name.clone(),
            profile_id: session.profile_id.clone(),
            profile_title: session.profile_title.clone(),
            stack: session.stack.clone(),
            date: session.date,
            status: EvaluationStatus::Ongoing,
            scores: BTreeMap::new(),
            notes: BTreeMap::new(),
            final_score: None,
        };

        self.repository.upsert_evaluation(record.clone())?;
        self.channel
            .broadcast(AssessmentEvent::EvaluationUpserted(record.clone()))?;

        Ok(record)
    }

    /// Record or revise one topic score on an ongoing evaluation.
    pub fn record_score(
        &self,
        evaluation_id: &EvaluationId,
        topic_id: &TopicId,
        score: u8,
    ) -> Result<EvaluationRecord, AssessmentServiceError> {
        if score > MAX_TOPIC_SCORE {
            return Err(AssessmentServiceError::ScoreOutOfRange(score));
        }

        self.mutate_ongoing(evaluation_id, topic_id, |record| {
            record.scores.insert(topic_id.clone(), score);
        })
    }

    /// Record or revise one topic note on an ongoing evaluation.
    pub fn record_note(
        &self,
        evaluation_id: &EvaluationId,
        topic_id: &TopicId,
        note: String,
    ) -> Result<EvaluationRecord, AssessmentServiceError> {
        self.mutate_ongoing(evaluation_id, topic_id, |record| {
            record.notes.insert(topic_id.clone(), note);
        })
    }

    fn mutate_ongoing(
        &self,
        evaluation_id: &EvaluationId,
        topic_id: &TopicId,
        apply: impl FnOnce(&mut EvaluationRecord),
    ) -> Result<EvaluationRecord, AssessmentServiceError> {
        if self.matrix.module_for_topic(topic_id).is_none() {
            return Err(AssessmentServiceError::UnknownTopic(topic_id.0.clone()));
        }

        let mut record = self
            .repository
            .fetch_evaluation(evaluation_id)?
            .ok_or(RepositoryError::NotFound)?;

        if record.status != EvaluationStatus::Ongoing {
            return Err(AssessmentServiceError::EvaluationClosed {
                status: record.status.label(),
            });
        }

        apply(&mut record);

        self.repository.upsert_evaluation(record.clone())?;
        self.channel
            .broadcast(AssessmentEvent::EvaluationUpserted(record.clone()))?;

        Ok(record)
    }

    /// Complete an evaluation, snapshotting its total as `final_score`.
    ///
    /// The snapshot is immutable from here on: even if a stale peer update
    /// later rewrites individual scores, `final_score` keeps the total as it
    /// stood at completion.
    pub fn complete_evaluation(
        &self,
        evaluation_id: &EvaluationId,
    ) -> Result<EvaluationRecord, AssessmentServiceError> {
        self.finish_evaluation(evaluation_id, EvaluationStatus::Completed)
    }

    /// Reject an evaluation; its scores remain but no total is snapshotted.
    pub fn reject_evaluation(
        &self,
        evaluation_id: &EvaluationId,
    ) -> Result<EvaluationRecord, AssessmentServiceError> {
        self.finish_evaluation(evaluation_id, EvaluationStatus::Rejected)
    }

    fn finish_evaluation(
        &self,
        evaluation_id: &EvaluationId,
        next: EvaluationStatus,
    ) -> Result<EvaluationRecord, AssessmentServiceError> {
        let mut record = self
            .repository
            .fetch_evaluation(evaluation_id)?
            .ok_or(RepositoryError::NotFound)?;

        if !record.status.can_transition_to(next) {
            return Err(AssessmentServiceError::InvalidTransition {
                from: record.status.label(),
                to: next.label(),
            });
        }

        if next == EvaluationStatus::Completed {
            let profile = self.profile(&record.profile_id)?;
            let summary = summarize_evaluation(&record, &self.matrix, profile);
            record.final_score = Some(summary.total_score);
        }
        record.status = next;

        self.repository.upsert_evaluation(record.clone())?;
        self.channel
            .broadcast(AssessmentEvent::EvaluationUpserted(record.clone()))?;

        info!(evaluation = %record.id.0, status = record.status.label(), "evaluation closed");
        Ok(record)
    }

    /// Live per-assessor summary for one evaluation.
    pub fn evaluation_summary(
        &self,
        evaluation_id: &EvaluationId,
    ) -> Result<EvaluationSummary, AssessmentServiceError> {
        let record = self
            .repository
            .fetch_evaluation(evaluation_id)?
            .ok_or(RepositoryError::NotFound)?;
        let profile = self.profile(&record.profile_id)?;

        Ok(summarize_evaluation(&record, &self.matrix, profile))
    }

    /// Cross-assessor aggregate for the whole assessment. Total with zero
    /// evaluations collapses to all-zero modules, never a non-numeric result.
    pub fn assessment_aggregate(
        &self,
        assessment_id: &AssessmentId,
    ) -> Result<AssessmentAggregate, AssessmentServiceError> {
        let session = self
            .repository
            .fetch_session(assessment_id)?
            .ok_or(RepositoryError::NotFound)?;
        let profile = self.profile(&session.profile_id)?;

        let evaluations = self.repository.evaluations_for(assessment_id)?;
        let module_major = pivot_by_module(&evaluations, &self.matrix, profile);

        Ok(aggregate_across_assessors(
            &module_major,
            &self.matrix,
            profile,
        ))
    }

    /// Render one evaluation as the per-topic CSV download.
    pub fn export_evaluation_csv(
        &self,
        evaluation_id: &EvaluationId,
    ) -> Result<String, AssessmentServiceError> {
        let record = self
            .repository
            .fetch_evaluation(evaluation_id)?
            .ok_or(RepositoryError::NotFound)?;
        let profile = self.profile(&record.profile_id)?;

        let mut buffer = Vec::new();
        write_evaluation_csv(&record, &self.matrix, profile, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Import an externally produced evaluation (JSON export from another
    /// instance). Honors the session lock; replaces any record with the same id.
    pub fn import_evaluation(
        &self,
        record: EvaluationRecord,
    ) -> Result<(), AssessmentServiceError> {
        let session = self
            .repository
            .fetch_session(&record.assessment_id)?
            .ok_or(RepositoryError::NotFound)?;

        if session.locked {
            return Err(AssessmentServiceError::SessionLocked(session.id.0));
        }

        self.repository.upsert_evaluation(record.clone())?;
        self.channel
            .broadcast(AssessmentEvent::EvaluationUpserted(record))?;
        Ok(())
    }

    /// Apply an event received from a peer. Not re-broadcast.
    pub fn apply_remote(&self, event: AssessmentEvent) -> Result<(), AssessmentServiceError> {
        apply_event(self.repository.as_ref(), event)?;
        Ok(())
    }
}

/// Error raised by the assessment service.
#[derive(Debug, thiserror::Error)]
pub enum AssessmentServiceError {
    #[error("unknown profile '{0}'")]
    UnknownProfile(String),
    #[error("topic '{0}' is not part of the competency matrix")]
    UnknownTopic(String),
    #[error("score {0} outside the 0-5 range")]
    ScoreOutOfRange(u8),
    #[error("assessment '{0}' is locked")]
    SessionLocked(String),
    #[error("evaluation is {status}, scores can no longer change")]
    EvaluationClosed { status: &'static str },
    #[error("illegal status transition {from} -> {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error(transparent)]
    Export(#[from] ExportError),
}
