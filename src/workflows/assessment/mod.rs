//! Assessment scoring, cross-assessor aggregation, and the service shell
//! around them.
//!
//! The scoring functions in [`scoring`] and [`aggregation`] are pure: they
//! compute over whatever evaluation records exist locally at call time and
//! tolerate partial or stale sets (a freshly created assessment has zero
//! evaluations). Persistence and peer sync stay behind the
//! [`repository::AssessmentRepository`] and [`sync::EventChannel`] seams.

pub mod aggregation;
pub mod domain;
pub mod export;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod sync;

#[cfg(test)]
mod tests;

pub use aggregation::{
    aggregate_across_assessors, pivot_by_module, AssessmentAggregate, EvaluationSlice,
    ModuleAggregate, ModuleMajorScores,
};
pub use domain::{
    AssessmentId, AssessmentSession, EvaluationId, EvaluationRecord, EvaluationStatus,
    MAX_TOPIC_SCORE,
};
pub use export::{evaluation_from_json, evaluation_to_json, write_evaluation_csv, ExportError};
pub use repository::{AssessmentRepository, InMemoryAssessmentStore, RepositoryError};
pub use router::assessment_router;
pub use scoring::{summarize_evaluation, EvaluationSummary, ModuleScore};
pub use service::{AssessmentService, AssessmentServiceError, NewSession};
pub use sync::{apply_event, AssessmentEvent, ChannelError, EventChannel, NullChannel};
