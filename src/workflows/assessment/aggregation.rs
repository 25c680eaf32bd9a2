use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{EvaluationId, EvaluationRecord};
use super::scoring::{mean, score_module};
use crate::workflows::matrix::{CompetencyMatrix, ModuleId, Profile, TopicId};

/// One evaluation's scores and notes restricted to a single module's topics.
///
/// Sparseness is preserved from the source record: a topic the assessor never
/// scored simply has no entry here, it is not coerced to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSlice {
    pub scores: BTreeMap<TopicId, u8>,
    pub notes: BTreeMap<TopicId, String>,
}

/// Evaluations pivoted from evaluation-major to module-major order: module id
/// first, then evaluation id, then that evaluation's topic entries for the
/// module. Only modules the profile weights above zero are retained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleMajorScores {
    pub modules: BTreeMap<ModuleId, BTreeMap<EvaluationId, EvaluationSlice>>,
}

/// Cross-assessor statistics for one module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleAggregate {
    pub module_id: ModuleId,
    pub module_title: String,
    pub average_score: f64,
    pub weighted_score: f64,
    pub weight: f64,
    pub evaluations: usize,
    pub notes: Vec<String>,
}

/// Assessment-wide statistics across all assessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentAggregate {
    pub modules: Vec<ModuleAggregate>,
    pub total_score: f64,
}

/// Pivot a set of evaluation records into module-major order for aggregation.
///
/// Every in-scope module appears as a key, and every evaluation appears under
/// every in-scope module even when its slice is empty, so the aggregator sees
/// the full assessor roster per module.
pub fn pivot_by_module(
    evaluations: &[EvaluationRecord],
    matrix: &CompetencyMatrix,
    profile: &Profile,
) -> ModuleMajorScores {
    let mut modules = BTreeMap::new();

    for module in profile.applicable_modules(matrix) {
        let mut per_evaluation = BTreeMap::new();

        for record in evaluations {
            let mut slice = EvaluationSlice::default();

            for topic in &module.topics {
                if let Some(score) = record.scores.get(&topic.id) {
                    slice.scores.insert(topic.id.clone(), *score);
                }
                if let Some(note) = record.notes.get(&topic.id) {
                    slice.notes.insert(topic.id.clone(), note.clone());
                }
            }

            per_evaluation.insert(record.id.clone(), slice);
        }

        modules.insert(module.id.clone(), per_evaluation);
    }

    ModuleMajorScores { modules }
}

/// Combine every assessor's evaluation into assessment-level statistics.
///
/// Each assessor's module average is computed exactly as in the
/// single-evaluation path, then the module's cross-assessor average is the
/// mean of those per-assessor averages. That is an average of averages, not a
/// pooled mean over raw topic scores: an assessor who scored one topic in a
/// module counts the same as one who scored five. A module with no
/// evaluations at all reports 0 rather than dropping out of the breakdown.
pub fn aggregate_across_assessors(
    module_major: &ModuleMajorScores,
    matrix: &CompetencyMatrix,
    profile: &Profile,
) -> AssessmentAggregate {
    let mut modules = Vec::new();
    let mut total_score = 0.0;

    static EMPTY: BTreeMap<EvaluationId, EvaluationSlice> = BTreeMap::new();

    for module in profile.applicable_modules(matrix) {
        let per_evaluation = module_major.modules.get(&module.id).unwrap_or(&EMPTY);

        let mut average_sum = 0.0;
        let mut weighted_sum = 0.0;
        let mut notes = Vec::new();

        for slice in per_evaluation.values() {
            let assessor = score_module(module, profile, &slice.scores);
            average_sum += assessor.average_score;
            weighted_sum += assessor.weighted_score;

            for topic in &module.topics {
                if let Some(note) = slice.notes.get(&topic.id) {
                    notes.push(note.clone());
                }
            }
        }

        let evaluations = per_evaluation.len();
        let aggregate = ModuleAggregate {
            module_id: module.id.clone(),
            module_title: module.title.clone(),
            average_score: mean(average_sum, evaluations),
            weighted_score: mean(weighted_sum, evaluations),
            weight: profile.weight_of(&module.id),
            evaluations,
            notes,
        };

        total_score += aggregate.weighted_score;
        modules.push(aggregate);
    }

    AssessmentAggregate {
        modules,
        total_score,
    }
}
