use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;
use thiserror::Error;

use crate::schema::QuestionSchema;

/// Answer keys the renderers know about, with the fallback used when a key is absent.
pub mod keys {
    pub const AGENT_NAME: &str = "agent_name";
    pub const AGENT_TYPE: &str = "primary_agent_type";
    pub const AGENT_DESCRIPTION: &str = "agent_description";
    pub const FRAMEWORK: &str = "agent_framework";
    pub const VERSION: &str = "version";
    pub const LLM_PROVIDER: &str = "llm_provider";
    pub const REPORT_FORMATS: &str = "report_formats";
    pub const DEPLOYMENT_TARGET: &str = "deployment_target";

    pub const DEFAULT_AGENT_NAME: &str = "security-agent";
    pub const DEFAULT_AGENT_TYPE: &str = "reconnaissance";
    pub const DEFAULT_FRAMEWORK: &str = "custom_python";
    pub const DEFAULT_VERSION: &str = "1.0.0";
    pub const DEFAULT_LLM_PROVIDER: &str = "none";
    pub const DEFAULT_REPORT_FORMAT: &str = "json";
    pub const DEFAULT_DEPLOYMENT_TARGET: &str = "local";
}

/// Nested config-document fields and the flat answer key each one maps to.
const CONFIG_FIELDS: &[(&str, &str, &str)] = &[
    ("agent", "name", keys::AGENT_NAME),
    ("agent", "type", keys::AGENT_TYPE),
    ("agent", "version", keys::VERSION),
    ("agent", "framework", keys::FRAMEWORK),
    ("agent", "deployment", keys::DEPLOYMENT_TARGET),
    ("llm", "provider", keys::LLM_PROVIDER),
    ("output", "formats", keys::REPORT_FORMATS),
];

/// Top-level sections of a generated config document.
const CONFIG_SECTIONS: &[&str] = &["agent", "llm", "output", "security"];

static PATH_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[/\\\x00]").expect("path separator pattern is valid"));

#[derive(Error, Debug)]
pub enum AnswerParseError {
    #[error("Failed to read answers: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse answers JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to parse answers YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Answer document must be a mapping of question ids to values")]
    NotAMapping,
    #[error("'agent_name' is empty; an agent name is required to name the output directory")]
    EmptyAgentName,
    #[error("'agent_name' {0:?} cannot be used as a directory name")]
    InvalidAgentName(String),
}

/// A single answer value.
///
/// Supplied documents are taken verbatim, so anything that is neither a string nor a list
/// of strings is kept as [`Answer::Other`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Answer {
    Text(String),
    Many(BTreeSet<String>),
    Other(Value),
}

impl Answer {
    pub fn text(value: impl Into<String>) -> Self {
        Answer::Text(value.into())
    }

    pub fn many<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Answer::Many(values.into_iter().map(Into::into).collect())
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            Answer::Text(s) => Some(s.clone()),
            Answer::Other(value) => scalar_to_string(value),
            Answer::Many(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<Vec<String>> {
        match self {
            Answer::Many(values) => Some(values.iter().cloned().collect()),
            Answer::Text(s) if s.trim().is_empty() => Some(Vec::new()),
            Answer::Text(s) => Some(vec![s.clone()]),
            Answer::Other(Value::Array(items)) => {
                let set: BTreeSet<String> = items.iter().filter_map(scalar_to_string).collect();
                Some(set.into_iter().collect())
            }
            Answer::Other(value) => scalar_to_string(value).map(|s| vec![s]),
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Question id to answer. Keys are kept sorted so every consumer sees the same order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AnswerSet {
    answers: BTreeMap<String, Answer>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(content: &str) -> Result<Self, AnswerParseError> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_document(value)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, AnswerParseError> {
        let value: Value = serde_yaml::from_str(content)?;
        Self::from_document(value)
    }

    /// Builds an answer set from a parsed document.
    ///
    /// A document shaped like a generated `config.yaml` (nested `agent`, `llm`, `output`
    /// sections) is flattened into the equivalent answer keys; any other mapping is taken
    /// as flat answers.
    pub fn from_document(value: Value) -> Result<Self, AnswerParseError> {
        let Value::Object(map) = value else {
            return Err(AnswerParseError::NotAMapping);
        };
        let map = if matches!(map.get("agent"), Some(Value::Object(_))) {
            flatten_config_document(map)
        } else {
            map
        };

        let mut set = AnswerSet::new();
        for (key, value) in map {
            set.insert(key, serde_json::from_value(value)?);
        }
        Ok(set)
    }

    pub fn insert(&mut self, id: impl Into<String>, answer: Answer) {
        self.answers.insert(id.into(), answer);
    }

    pub fn get(&self, id: &str) -> Option<&Answer> {
        self.answers.get(id)
    }

    pub fn text(&self, id: &str) -> Option<String> {
        self.get(id).and_then(Answer::as_text)
    }

    pub fn list(&self, id: &str) -> Option<Vec<String>> {
        self.get(id).and_then(Answer::as_list)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.answers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Drops every key that is not a question id of `schema`.
    pub fn retain_known(&mut self, schema: &QuestionSchema) {
        self.answers.retain(|key, _| {
            let known = schema.contains(key);
            if !known {
                warn!("Ignoring answer for unknown question '{}'", key);
            }
            known
        });
    }

    /// The directory name for the generated bundle.
    ///
    /// An absent name falls back to the default; a blank one is rejected instead of producing
    /// an unusable path.
    pub fn agent_name(&self) -> Result<String, AnswerParseError> {
        let Some(name) = self.text(keys::AGENT_NAME) else {
            debug!(
                "No '{}' answer, using '{}'",
                keys::AGENT_NAME,
                keys::DEFAULT_AGENT_NAME
            );
            return Ok(keys::DEFAULT_AGENT_NAME.to_string());
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(AnswerParseError::EmptyAgentName);
        }
        if name == "." || name == ".." || PATH_SEPARATOR.is_match(name) {
            return Err(AnswerParseError::InvalidAgentName(name.to_string()));
        }
        Ok(name.to_string())
    }
}

fn flatten_config_document(mut map: Map<String, Value>) -> Map<String, Value> {
    let mut flat = Map::new();
    for (section, field, key) in CONFIG_FIELDS {
        let value = map
            .get(*section)
            .and_then(|section| section.get(*field))
            .filter(|value| !value.is_null());
        if let Some(value) = value {
            flat.insert(key.to_string(), value.clone());
        }
    }
    for section in CONFIG_SECTIONS {
        map.remove(*section);
    }
    // Remaining top-level keys are flat answers.
    for (key, value) in map {
        flat.entry(key).or_insert(value);
    }
    flat
}
