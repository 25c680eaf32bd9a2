use std::sync::Arc;

use super::common::*;
use crate::workflows::assessment::domain::EvaluationStatus;
use crate::workflows::assessment::repository::{
    AssessmentRepository, InMemoryAssessmentStore, RepositoryError,
};
use crate::workflows::assessment::service::{AssessmentService, AssessmentServiceError, NewSession};
use crate::workflows::assessment::sync::AssessmentEvent;

const TOLERANCE: f64 = 1e-9;

type Service = AssessmentService<InMemoryAssessmentStore, RecordingChannel>;

fn service() -> (Arc<Service>, Arc<InMemoryAssessmentStore>, Arc<RecordingChannel>) {
    let store = Arc::new(InMemoryAssessmentStore::new());
    let channel = Arc::new(RecordingChannel::default());
    let service = Arc::new(AssessmentService::new(
        Arc::new(matrix()),
        vec![profile()],
        store.clone(),
        channel.clone(),
    ));
    (service, store, channel)
}

fn new_session() -> NewSession {
    NewSession {
        candidate_name: "Alex Doe".to_string(),
        profile_id: profile().id,
        date: sample_date(),
    }
}

#[test]
fn session_creation_copies_profile_fields_and_broadcasts() {
    let (service, _store, channel) = service();

    let session = service.create_session(new_session()).expect("session created");

    assert_eq!(session.profile_title, "Backend Engineer");
    assert_eq!(session.stack, "rust");
    assert!(!session.locked);
    assert!(matches!(
        channel.events().last(),
        Some(AssessmentEvent::SessionUpserted(broadcast)) if broadcast.id == session.id
    ));
}

#[test]
fn unknown_profile_is_rejected() {
    let (service, _store, _channel) = service();
    let mut request = new_session();
    request.profile_id = crate::workflows::matrix::ProfileId("frontend-sr".to_string());

    let result = service.create_session(request);

    assert!(matches!(
        result,
        Err(AssessmentServiceError::UnknownProfile(id)) if id == "frontend-sr"
    ));
}

#[test]
fn locked_session_refuses_new_evaluations() {
    let (service, _store, _channel) = service();
    let session = service.create_session(new_session()).expect("session created");

    service.lock_session(&session.id).expect("session locks");
    let result = service.start_evaluation(&session.id, "Sam".to_string());

    assert!(matches!(result, Err(AssessmentServiceError::SessionLocked(_))));
}

#[test]
fn locked_session_refuses_imports() {
    let (service, _store, _channel) = service();
    let session = service.create_session(new_session()).expect("session created");
    let record = service
        .start_evaluation(&session.id, "Sam".to_string())
        .expect("evaluation starts");

    service.lock_session(&session.id).expect("session locks");
    let result = service.import_evaluation(record);

    assert!(matches!(result, Err(AssessmentServiceError::SessionLocked(_))));
}

#[test]
fn scores_above_five_are_rejected() {
    let (service, _store, _channel) = service();
    let session = service.create_session(new_session()).expect("session created");
    let record = service
        .start_evaluation(&session.id, "Sam".to_string())
        .expect("evaluation starts");

    let result = service.record_score(&record.id, &topic_id("core-ownership"), 6);

    assert!(matches!(
        result,
        Err(AssessmentServiceError::ScoreOutOfRange(6))
    ));
}

#[test]
fn scoring_an_unknown_topic_is_rejected() {
    let (service, _store, _channel) = service();
    let session = service.create_session(new_session()).expect("session created");
    let record = service
        .start_evaluation(&session.id, "Sam".to_string())
        .expect("evaluation starts");

    let result = service.record_score(&record.id, &topic_id("core-quantum"), 3);

    assert!(matches!(result, Err(AssessmentServiceError::UnknownTopic(_))));
}

#[test]
fn completion_snapshots_the_total_and_freezes_the_record() {
    let (service, _store, _channel) = service();
    let session = service.create_session(new_session()).expect("session created");
    let record = service
        .start_evaluation(&session.id, "Sam".to_string())
        .expect("evaluation starts");

    service
        .record_score(&record.id, &topic_id("core-ownership"), 4)
        .expect("score recorded");
    service
        .record_score(&record.id, &topic_id("core-concurrency"), 4)
        .expect("score recorded");

    let completed = service.complete_evaluation(&record.id).expect("completes");
    assert_eq!(completed.status, EvaluationStatus::Completed);
    // mod-core average 4.0 at weight 40, mod-arch unscored at weight 20.
    let final_score = completed.final_score.expect("final score snapshotted");
    assert!((final_score - 1.6).abs() < TOLERANCE);

    let late_edit = service.record_score(&record.id, &topic_id("core-tooling"), 5);
    assert!(matches!(
        late_edit,
        Err(AssessmentServiceError::EvaluationClosed { status: "completed" })
    ));

    let rejected_after = service.reject_evaluation(&record.id);
    assert!(matches!(
        rejected_after,
        Err(AssessmentServiceError::InvalidTransition {
            from: "completed",
            to: "rejected"
        })
    ));
}

#[test]
fn rejection_is_terminal_and_snapshots_nothing() {
    let (service, _store, _channel) = service();
    let session = service.create_session(new_session()).expect("session created");
    let record = service
        .start_evaluation(&session.id, "Sam".to_string())
        .expect("evaluation starts");

    let rejected = service.reject_evaluation(&record.id).expect("rejects");
    assert_eq!(rejected.status, EvaluationStatus::Rejected);
    assert!(rejected.final_score.is_none());

    let completed_after = service.complete_evaluation(&record.id);
    assert!(matches!(
        completed_after,
        Err(AssessmentServiceError::InvalidTransition {
            from: "rejected",
            to: "completed"
        })
    ));
}

#[test]
fn aggregate_combines_every_assessor_for_the_session() {
    let (service, _store, _channel) = service();
    let session = service.create_session(new_session()).expect("session created");

    let sam = service
        .start_evaluation(&session.id, "Sam".to_string())
        .expect("evaluation starts");
    service
        .record_score(&sam.id, &topic_id("core-ownership"), 5)
        .expect("score recorded");

    let riley = service
        .start_evaluation(&session.id, "Riley".to_string())
        .expect("evaluation starts");
    service
        .record_score(&riley.id, &topic_id("core-concurrency"), 1)
        .expect("score recorded");
    service
        .record_score(&riley.id, &topic_id("core-tooling"), 1)
        .expect("score recorded");

    let aggregate = service
        .assessment_aggregate(&session.id)
        .expect("aggregate computed");

    let core = &aggregate.modules[0];
    assert_eq!(core.evaluations, 2);
    assert!((core.average_score - 3.0).abs() < TOLERANCE);
}

#[test]
fn aggregate_with_no_evaluations_is_all_zero() {
    let (service, _store, _channel) = service();
    let session = service.create_session(new_session()).expect("session created");

    let aggregate = service
        .assessment_aggregate(&session.id)
        .expect("aggregate computed");

    assert_eq!(aggregate.total_score, 0.0);
    assert_eq!(aggregate.modules.len(), 2);
}

#[test]
fn remote_events_apply_without_rebroadcast() {
    let (service, store, channel) = service();
    let session = service.create_session(new_session()).expect("session created");
    let record = service
        .start_evaluation(&session.id, "Sam".to_string())
        .expect("evaluation starts");
    let broadcasts_before = channel.events().len();

    let mut remote = record.clone();
    remote.scores.insert(topic_id("core-ownership"), 5);
    service
        .apply_remote(AssessmentEvent::EvaluationUpserted(remote.clone()))
        .expect("remote applied");

    let stored = store
        .fetch_evaluation(&record.id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(stored, remote);
    assert_eq!(channel.events().len(), broadcasts_before);
}

#[test]
fn missing_records_surface_not_found() {
    let (service, _store, _channel) = service();

    let result = service.evaluation_summary(&crate::workflows::assessment::domain::EvaluationId(
        "eval-missing".to_string(),
    ));

    assert!(matches!(
        result,
        Err(AssessmentServiceError::Repository(RepositoryError::NotFound))
    ));
}
