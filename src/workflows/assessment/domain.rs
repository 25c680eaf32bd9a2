use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::workflows::matrix::{ProfileId, TopicId};

/// Highest score an assessor can award a topic.
pub const MAX_TOPIC_SCORE: u8 = 5;

/// Identifier wrapper for one assessor's evaluation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EvaluationId(pub String);

/// Identifier wrapper for the candidate-level assessment grouping.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssessmentId(pub String);

/// Lifecycle of an evaluation: `Ongoing` until the assessor either completes
/// or rejects it; both outcomes are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Ongoing,
    Completed,
    Rejected,
}

impl EvaluationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            EvaluationStatus::Ongoing => "ongoing",
            EvaluationStatus::Completed => "completed",
            EvaluationStatus::Rejected => "rejected",
        }
    }

    /// Only `ongoing -> completed` and `ongoing -> rejected` are legal.
    pub const fn can_transition_to(self, next: EvaluationStatus) -> bool {
        matches!(
            (self, next),
            (EvaluationStatus::Ongoing, EvaluationStatus::Completed)
                | (EvaluationStatus::Ongoing, EvaluationStatus::Rejected)
        )
    }
}

/// One assessor's scores and notes for one candidate against one profile.
///
/// `scores` is sparse: a topic absent from the map has not been scored yet,
/// which is distinct from a score of 0. `final_score` is captured once, at
/// completion, as a snapshot of the summary total at that instant; later
/// score corrections never rewrite it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub id: EvaluationId,
    pub assessment_id: AssessmentId,
    pub assessor_name: String,
    pub candidate_name: String,
    pub profile_id: ProfileId,
    pub profile_title: String,
    pub stack: String,
    pub date: NaiveDate,
    pub status: EvaluationStatus,
    pub scores: BTreeMap<TopicId, u8>,
    pub notes: BTreeMap<TopicId, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_score: Option<f64>,
}

/// Candidate-level grouping of evaluations across assessors.
///
/// `locked` forbids creating or importing further evaluations; the service
/// enforces it, the scoring functions never look at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentSession {
    pub id: AssessmentId,
    pub candidate_name: String,
    pub profile_id: ProfileId,
    pub profile_title: String,
    pub stack: String,
    pub date: NaiveDate,
    pub locked: bool,
}
