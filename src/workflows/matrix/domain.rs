use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identifier wrapper for competency modules.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleId(pub String);

/// Identifier wrapper for scoring topics.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TopicId(pub String);

/// Identifier wrapper for role profiles.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProfileId(pub String);

/// An individual skill scored 0-5 by an assessor.
///
/// `weight` is a raw-sum contribution multiplier carried from the matrix seed
/// data; the averaging path never applies it. `mappings` holds sparse
/// per-stack guidance text keyed by stack label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub name: String,
    pub weight: u32,
    pub mappings: BTreeMap<String, String>,
}

impl Topic {
    /// Stack-specific guidance, when the matrix carries any for this stack.
    pub fn guidance_for(&self, stack: &str) -> Option<&str> {
        self.mappings.get(stack).map(String::as_str)
    }
}

/// A named competency area containing scoring topics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub title: String,
    pub description: String,
    pub topics: Vec<Topic>,
}

impl Module {
    pub fn topic(&self, id: &TopicId) -> Option<&Topic> {
        self.topics.iter().find(|topic| &topic.id == id)
    }
}

/// The full module set for a session, immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetencyMatrix {
    pub modules: Vec<Module>,
}

impl CompetencyMatrix {
    pub fn new(modules: Vec<Module>) -> Self {
        Self { modules }
    }

    pub fn module(&self, id: &ModuleId) -> Option<&Module> {
        self.modules.iter().find(|module| &module.id == id)
    }

    /// Locate the module owning a topic, if any.
    pub fn module_for_topic(&self, topic_id: &TopicId) -> Option<&Module> {
        self.modules
            .iter()
            .find(|module| module.topic(topic_id).is_some())
    }
}

/// A role template assigning percentage weights to modules.
///
/// Weights conventionally sit in 0-100 but are never normalized; a module
/// absent from `weights` (or at 0) is simply out of scope for the profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub title: String,
    pub stack: String,
    pub description: String,
    pub weights: BTreeMap<ModuleId, f64>,
}

impl Profile {
    /// The module's contribution share, 0.0 when the profile does not list it.
    pub fn weight_of(&self, module_id: &ModuleId) -> f64 {
        self.weights.get(module_id).copied().unwrap_or(0.0)
    }

    /// Modules this profile actually scores, in matrix order.
    pub fn applicable_modules<'a>(
        &'a self,
        matrix: &'a CompetencyMatrix,
    ) -> impl Iterator<Item = &'a Module> {
        matrix
            .modules
            .iter()
            .filter(move |module| self.weight_of(&module.id) > 0.0)
    }
}
