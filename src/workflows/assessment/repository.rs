use std::collections::BTreeMap;
use std::sync::Mutex;

use super::domain::{AssessmentId, AssessmentSession, EvaluationId, EvaluationRecord};

/// Storage abstraction for sessions and evaluations so the service layer can
/// be exercised in isolation.
///
/// `upsert_*` is replace-by-id: the sync channel is last-write-wins, so a
/// later record with the same id unconditionally overwrites the local copy.
pub trait AssessmentRepository: Send + Sync {
    fn insert_session(&self, session: AssessmentSession) -> Result<(), RepositoryError>;
    fn upsert_session(&self, session: AssessmentSession) -> Result<(), RepositoryError>;
    fn fetch_session(&self, id: &AssessmentId)
        -> Result<Option<AssessmentSession>, RepositoryError>;
    fn sessions(&self) -> Result<Vec<AssessmentSession>, RepositoryError>;

    fn upsert_evaluation(&self, record: EvaluationRecord) -> Result<(), RepositoryError>;
    fn fetch_evaluation(
        &self,
        id: &EvaluationId,
    ) -> Result<Option<EvaluationRecord>, RepositoryError>;
    fn evaluations_for(
        &self,
        assessment_id: &AssessmentId,
    ) -> Result<Vec<EvaluationRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Default)]
struct StoreInner {
    sessions: BTreeMap<AssessmentId, AssessmentSession>,
    evaluations: BTreeMap<EvaluationId, EvaluationRecord>,
}

/// Process-local store backing the service; the browser original kept the
/// same shape in local storage, persisted wholesale on every change.
#[derive(Debug, Default)]
pub struct InMemoryAssessmentStore {
    inner: Mutex<StoreInner>,
}

impl InMemoryAssessmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, StoreInner>, RepositoryError> {
        self.inner
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
    }
}

impl AssessmentRepository for InMemoryAssessmentStore {
    fn insert_session(&self, session: AssessmentSession) -> Result<(), RepositoryError> {
        let mut inner = self.lock()?;
        if inner.sessions.contains_key(&session.id) {
            return Err(RepositoryError::Conflict);
        }
        inner.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    fn upsert_session(&self, session: AssessmentSession) -> Result<(), RepositoryError> {
        let mut inner = self.lock()?;
        inner.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    fn fetch_session(
        &self,
        id: &AssessmentId,
    ) -> Result<Option<AssessmentSession>, RepositoryError> {
        let inner = self.lock()?;
        Ok(inner.sessions.get(id).cloned())
    }

    fn sessions(&self) -> Result<Vec<AssessmentSession>, RepositoryError> {
        let inner = self.lock()?;
        Ok(inner.sessions.values().cloned().collect())
    }

    fn upsert_evaluation(&self, record: EvaluationRecord) -> Result<(), RepositoryError> {
        let mut inner = self.lock()?;
        inner.evaluations.insert(record.id.clone(), record);
        Ok(())
    }

    fn fetch_evaluation(
        &self,
        id: &EvaluationId,
    ) -> Result<Option<EvaluationRecord>, RepositoryError> {
        let inner = self.lock()?;
        Ok(inner.evaluations.get(id).cloned())
    }

    fn evaluations_for(
        &self,
        assessment_id: &AssessmentId,
    ) -> Result<Vec<EvaluationRecord>, RepositoryError> {
        let inner = self.lock()?;
        Ok(inner
            .evaluations
            .values()
            .filter(|record| &record.assessment_id == assessment_id)
            .cloned()
            .collect())
    }
}
