//! Competency matrix and role profile reference data.
//!
//! The matrix is loaded once per session (from the CSV seed files or an
//! embedded fixture) and treated as immutable afterwards; evaluations only
//! ever reference it by module/topic id.

pub mod domain;
mod importer;

pub use domain::{CompetencyMatrix, Module, ModuleId, Profile, ProfileId, Topic, TopicId};
pub use importer::{parse_matrix, parse_profiles, MatrixImportError};
