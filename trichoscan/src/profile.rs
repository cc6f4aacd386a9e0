use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One questionnaire answer: a single choice or a multi-select list.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ProfileAnswer {
    Single(String),
    Multiple(Vec<String>),
}

impl From<&str> for ProfileAnswer {
    fn from(value: &str) -> Self {
        ProfileAnswer::Single(value.to_string())
    }
}

impl From<String> for ProfileAnswer {
    fn from(value: String) -> Self {
        ProfileAnswer::Single(value)
    }
}

impl From<Vec<String>> for ProfileAnswer {
    fn from(value: Vec<String>) -> Self {
        ProfileAnswer::Multiple(value)
    }
}

/// The user's questionnaire profile, keyed by question identifier.
///
/// The question set branches per flow (gender, concern, history), so the
/// profile is an open map rather than a fixed struct. Keys follow the
/// questionnaire, e.g. `scalpType` or `hairfallAmountMale`. A partially
/// completed questionnaire is an expected state.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct HairProfile {
    answers: BTreeMap<String, ProfileAnswer>,
}

impl HairProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, key: impl Into<String>, value: impl Into<ProfileAnswer>) -> Self {
        self.answers.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&ProfileAnswer> {
        self.answers.get(key)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}
