use std::collections::BTreeMap;
use std::io::Read;

use serde::Deserialize;

use super::domain::{CompetencyMatrix, Module, ModuleId, Profile, ProfileId, Topic, TopicId};

/// Failure modes when hydrating matrix or profile seed data from CSV.
#[derive(Debug, thiserror::Error)]
pub enum MatrixImportError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("malformed mapping entry '{0}', expected 'stack=guidance'")]
    InvalidMapping(String),
    #[error("malformed weight entry '{0}', expected 'module-id=number'")]
    InvalidWeight(String),
    #[error("seed file contained no rows")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    #[serde(rename = "Module Id")]
    module_id: String,
    #[serde(rename = "Module Title")]
    module_title: String,
    #[serde(rename = "Module Description", default)]
    module_description: String,
    #[serde(rename = "Topic Id")]
    topic_id: String,
    #[serde(rename = "Topic Name")]
    topic_name: String,
    #[serde(rename = "Weight", default = "default_topic_weight")]
    weight: u32,
    #[serde(rename = "Mappings", default)]
    mappings: String,
}

fn default_topic_weight() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    #[serde(rename = "Profile Id")]
    id: String,
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Stack")]
    stack: String,
    #[serde(rename = "Description", default)]
    description: String,
    #[serde(rename = "Weights")]
    weights: String,
}

/// Parse the one-row-per-topic matrix export, grouping rows into modules in
/// first-appearance order.
pub fn parse_matrix<R: Read>(reader: R) -> Result<CompetencyMatrix, MatrixImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut modules: Vec<Module> = Vec::new();

    for record in csv_reader.deserialize::<MatrixRow>() {
        let row = record?;
        let module_id = ModuleId(row.module_id);

        let topic = Topic {
            id: TopicId(row.topic_id),
            name: row.topic_name,
            weight: row.weight,
            mappings: parse_pairs(&row.mappings, MatrixImportError::InvalidMapping)?
                .into_iter()
                .collect(),
        };

        match modules.iter_mut().find(|module| module.id == module_id) {
            Some(module) => module.topics.push(topic),
            None => modules.push(Module {
                id: module_id,
                title: row.module_title,
                description: row.module_description,
                topics: vec![topic],
            }),
        }
    }

    if modules.is_empty() {
        return Err(MatrixImportError::Empty);
    }

    Ok(CompetencyMatrix::new(modules))
}

/// Parse the one-row-per-profile export.
pub fn parse_profiles<R: Read>(reader: R) -> Result<Vec<Profile>, MatrixImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut profiles = Vec::new();

    for record in csv_reader.deserialize::<ProfileRow>() {
        let row = record?;

        let mut weights = BTreeMap::new();
        for (module, value) in parse_pairs(&row.weights, MatrixImportError::InvalidWeight)? {
            let weight = value
                .parse::<f64>()
                .map_err(|_| MatrixImportError::InvalidWeight(value.clone()))?;
            weights.insert(ModuleId(module), weight);
        }

        profiles.push(Profile {
            id: ProfileId(row.id),
            title: row.title,
            stack: row.stack,
            description: row.description,
            weights,
        });
    }

    if profiles.is_empty() {
        return Err(MatrixImportError::Empty);
    }

    Ok(profiles)
}

/// Split a `key=value|key=value` field into trimmed pairs. Empty fields yield
/// no pairs rather than an error.
fn parse_pairs(
    raw: &str,
    invalid: fn(String) -> MatrixImportError,
) -> Result<Vec<(String, String)>, MatrixImportError> {
    let mut pairs = Vec::new();

    for entry in raw.split('|') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }

        let (key, value) = entry.split_once('=').ok_or_else(|| invalid(entry.to_string()))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(invalid(entry.to_string()));
        }

        pairs.push((key.to_string(), value.trim().to_string()));
    }

    Ok(pairs)
}
