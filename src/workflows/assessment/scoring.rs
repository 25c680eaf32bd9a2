use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{EvaluationId, EvaluationRecord};
use crate::workflows::matrix::{CompetencyMatrix, Module, ModuleId, Profile, TopicId};

/// Per-module breakdown for one assessor's evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleScore {
    pub module_id: ModuleId,
    pub module_title: String,
    pub raw_sum: u32,
    pub completed_topics: usize,
    pub total_topics: usize,
    pub average_score: f64,
    pub weight: f64,
    pub weighted_score: f64,
}

/// Summary of one evaluation: module breakdown plus the assessment-level
/// total and global progress counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub evaluation_id: EvaluationId,
    pub modules: Vec<ModuleScore>,
    pub total_score: f64,
    pub completed_topics: usize,
    pub total_topics: usize,
}

/// Score one evaluation against the matrix and profile.
///
/// Modules in scope are those the profile weights above zero, in matrix
/// order. Each module's average is a plain mean over the topics the assessor
/// actually scored; unscored topics are excluded from the mean rather than
/// counted as zero, and a module with nothing scored averages 0 without being
/// dropped from the breakdown. The total is the sum of `average * weight/100`
/// per module, rounded to one decimal for display parity with the exports.
///
/// Topic `weight` feeds only `raw_sum`-style bookkeeping on the matrix side
/// and deliberately does not enter the averaging here.
pub fn summarize_evaluation(
    record: &EvaluationRecord,
    matrix: &CompetencyMatrix,
    profile: &Profile,
) -> EvaluationSummary {
    let mut modules = Vec::new();
    let mut total_score = 0.0;
    let mut completed_topics = 0;
    let mut total_topics = 0;

    for module in profile.applicable_modules(matrix) {
        let breakdown = score_module(module, profile, &record.scores);

        total_score += breakdown.weighted_score;
        completed_topics += breakdown.completed_topics;
        total_topics += breakdown.total_topics;
        modules.push(breakdown);
    }

    EvaluationSummary {
        evaluation_id: record.id.clone(),
        modules,
        total_score: round_one_decimal(total_score),
        completed_topics,
        total_topics,
    }
}

/// Module-level statistics for one assessor's score map.
pub(crate) fn score_module(
    module: &Module,
    profile: &Profile,
    scores: &BTreeMap<TopicId, u8>,
) -> ModuleScore {
    let mut raw_sum: u32 = 0;
    let mut completed_topics = 0;

    for topic in &module.topics {
        if let Some(score) = scores.get(&topic.id) {
            raw_sum += u32::from(*score);
            completed_topics += 1;
        }
    }

    let average_score = mean(f64::from(raw_sum), completed_topics);
    let weight = profile.weight_of(&module.id);

    ModuleScore {
        module_id: module.id.clone(),
        module_title: module.title.clone(),
        raw_sum,
        completed_topics,
        total_topics: module.topics.len(),
        average_score,
        weight,
        weighted_score: average_score * weight / 100.0,
    }
}

/// Zero-denominator-safe arithmetic mean.
pub(crate) fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

pub(crate) fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
