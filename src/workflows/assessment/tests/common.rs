use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::NaiveDate;

use crate::workflows::assessment::domain::{
    AssessmentId, EvaluationId, EvaluationRecord, EvaluationStatus,
};
use crate::workflows::assessment::sync::{AssessmentEvent, ChannelError, EventChannel};
use crate::workflows::matrix::{
    CompetencyMatrix, Module, ModuleId, Profile, ProfileId, Topic, TopicId,
};

pub(super) fn topic_id(raw: &str) -> TopicId {
    TopicId(raw.to_string())
}

pub(super) fn module_id(raw: &str) -> ModuleId {
    ModuleId(raw.to_string())
}

fn topic(id: &str, name: &str, weight: u32, rust_guidance: &str) -> Topic {
    let mut mappings = BTreeMap::new();
    if !rust_guidance.is_empty() {
        mappings.insert("rust".to_string(), rust_guidance.to_string());
    }
    Topic {
        id: topic_id(id),
        name: name.to_string(),
        weight,
        mappings,
    }
}

/// Three modules; `mod-tools` is deliberately absent from the profile weights.
pub(super) fn matrix() -> CompetencyMatrix {
    CompetencyMatrix::new(vec![
        Module {
            id: module_id("mod-core"),
            title: "Core Language".to_string(),
            description: "Language fundamentals".to_string(),
            topics: vec![
                topic("core-ownership", "Ownership", 3, "Borrow checker fluency"),
                topic("core-concurrency", "Concurrency", 3, "Send/Sync reasoning"),
                topic("core-tooling", "Tooling", 2, ""),
            ],
        },
        Module {
            id: module_id("mod-arch"),
            title: "Architecture".to_string(),
            description: "System design".to_string(),
            topics: vec![
                topic("arch-layering", "Layering", 1, "Crate and module seams"),
                topic("arch-tradeoffs", "Tradeoffs", 1, ""),
            ],
        },
        Module {
            id: module_id("mod-tools"),
            title: "Delivery Tooling".to_string(),
            description: "CI and release practice".to_string(),
            topics: vec![topic("tools-ci", "Continuous Integration", 1, "")],
        },
    ])
}

pub(super) fn profile() -> Profile {
    let mut weights = BTreeMap::new();
    weights.insert(module_id("mod-core"), 40.0);
    weights.insert(module_id("mod-arch"), 20.0);
    Profile {
        id: ProfileId("backend-mid".to_string()),
        title: "Backend Engineer".to_string(),
        stack: "rust".to_string(),
        description: "Mid-level backend role".to_string(),
        weights,
    }
}

pub(super) fn sample_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 30).expect("valid date")
}

pub(super) fn evaluation(id: &str, assessment: &str, assessor: &str) -> EvaluationRecord {
    let profile = profile();
    EvaluationRecord {
        id: EvaluationId(id.to_string()),
        assessment_id: AssessmentId(assessment.to_string()),
        assessor_name: assessor.to_string(),
        candidate_name: "Alex Doe".to_string(),
        profile_id: profile.id,
        profile_title: profile.title,
        stack: profile.stack,
        date: sample_date(),
        status: EvaluationStatus::Ongoing,
        scores: BTreeMap::new(),
        notes: BTreeMap::new(),
        final_score: None,
    }
}

pub(super) fn with_score(mut record: EvaluationRecord, topic: &str, score: u8) -> EvaluationRecord {
    record.scores.insert(topic_id(topic), score);
    record
}

pub(super) fn with_note(mut record: EvaluationRecord, topic: &str, note: &str) -> EvaluationRecord {
    record.notes.insert(topic_id(topic), note.to_string());
    record
}

/// Channel double capturing every broadcast for assertions.
#[derive(Debug, Default)]
pub(super) struct RecordingChannel {
    events: Mutex<Vec<AssessmentEvent>>,
}

impl RecordingChannel {
    pub(super) fn events(&self) -> Vec<AssessmentEvent> {
        self.events.lock().expect("events mutex poisoned").clone()
    }
}

impl EventChannel for RecordingChannel {
    fn broadcast(&self, event: AssessmentEvent) -> Result<(), ChannelError> {
        self.events.lock().expect("events mutex poisoned").push(event);
        Ok(())
    }
}
