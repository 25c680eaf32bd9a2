use std::io::Write;

use serde::Serialize;

use super::domain::EvaluationRecord;
use crate::workflows::matrix::{CompetencyMatrix, Profile};

/// Failure modes when serializing evaluations for download.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct TopicRow<'a> {
    #[serde(rename = "Module Id")]
    module_id: &'a str,
    #[serde(rename = "Module Title")]
    module_title: &'a str,
    #[serde(rename = "Topic Id")]
    topic_id: &'a str,
    #[serde(rename = "Topic Name")]
    topic_name: &'a str,
    #[serde(rename = "Guidance")]
    guidance: &'a str,
    #[serde(rename = "Score")]
    score: Option<u8>,
    #[serde(rename = "Note")]
    note: &'a str,
}

/// Write one evaluation as CSV, one row per in-scope topic.
///
/// Guidance text follows the evaluation's stack; topics the assessor never
/// scored export an empty score cell, not a zero.
pub fn write_evaluation_csv<W: Write>(
    record: &EvaluationRecord,
    matrix: &CompetencyMatrix,
    profile: &Profile,
    writer: W,
) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for module in profile.applicable_modules(matrix) {
        for topic in &module.topics {
            csv_writer.serialize(TopicRow {
                module_id: &module.id.0,
                module_title: &module.title,
                topic_id: &topic.id.0,
                topic_name: &topic.name,
                guidance: topic.guidance_for(&record.stack).unwrap_or(""),
                score: record.scores.get(&topic.id).copied(),
                note: record.notes.get(&topic.id).map(String::as_str).unwrap_or(""),
            })?;
        }
    }

    csv_writer.flush()?;
    Ok(())
}

/// Serialize an evaluation record verbatim for transfer between instances.
pub fn evaluation_to_json(record: &EvaluationRecord) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(record)?)
}

/// Parse an evaluation record previously produced by [`evaluation_to_json`].
pub fn evaluation_from_json(raw: &str) -> Result<EvaluationRecord, ExportError> {
    Ok(serde_json::from_str(raw)?)
}
