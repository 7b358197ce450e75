use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// The questionnaire shipped with the generator.
const BUILTIN_QUESTIONNAIRE: &str = include_str!("../questionnaire/questions.json");

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuestionSchema {
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Section {
    pub name: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Question {
    pub id: String,
    #[serde(rename = "question", alias = "prompt")]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(rename = "type", alias = "kind")]
    pub kind: QuestionKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ChoiceOption>,
    /// Only consulted for text kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum QuestionKind {
    #[serde(rename = "text", alias = "free_text")]
    FreeText,
    #[serde(rename = "textarea", alias = "multi_line_text")]
    MultiLineText,
    #[serde(rename = "single_choice")]
    SingleChoice,
    #[serde(rename = "multi_choice")]
    MultiChoice,
}

impl QuestionKind {
    pub fn is_choice(self) -> bool {
        matches!(self, QuestionKind::SingleChoice | QuestionKind::MultiChoice)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChoiceOption {
    pub value: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to read questionnaire: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse questionnaire JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to parse questionnaire YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Duplicate question id: {0}")]
    DuplicateQuestion(String),
    #[error("Choice question '{0}' declares no options")]
    MissingOptions(String),
}

impl QuestionSchema {
    /// Loads a schema from disk. `.yaml`/`.yml` files are read as YAML, anything else as JSON.
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self, SchemaError> {
        let schema: QuestionSchema = serde_json::from_str(content)?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, SchemaError> {
        let schema: QuestionSchema = serde_yaml::from_str(content)?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn builtin() -> Result<Self, SchemaError> {
        Self::from_json_str(BUILTIN_QUESTIONNAIRE)
    }

    /// The raw text of the bundled questionnaire.
    pub fn builtin_source() -> &'static str {
        BUILTIN_QUESTIONNAIRE
    }

    /// All questions in document order.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.sections.iter().flat_map(|section| section.questions.iter())
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions().find(|question| question.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.question(id).is_some()
    }

    fn validate(&self) -> Result<(), SchemaError> {
        let mut seen = HashSet::new();
        for question in self.questions() {
            if !seen.insert(question.id.as_str()) {
                return Err(SchemaError::DuplicateQuestion(question.id.clone()));
            }
            if question.kind.is_choice() && question.options.is_empty() {
                return Err(SchemaError::MissingOptions(question.id.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"{
  "sections": [
    {
      "name": "Basics",
      "questions": [
        {
          "id": "agent_framework",
          "question": "Which framework?",
          "type": "single_choice",
          "options": [
            {"value": "custom", "label": "Custom"},
            {"value": "langchain", "label": "LangChain"}
          ]
        },
        {
          "id": "agent_name",
          "question": "Agent name?",
          "type": "text",
          "default": "security-agent"
        }
      ]
    }
  ]
}"#;

    #[test]
    fn test_parse_json_schema() {
        let schema = QuestionSchema::from_json_str(MINIMAL).unwrap();
        assert_eq!(schema.sections.len(), 1);
        let framework = schema.question("agent_framework").unwrap();
        assert_eq!(framework.kind, QuestionKind::SingleChoice);
        assert_eq!(framework.options[1].value, "langchain");
        let name = schema.question("agent_name").unwrap();
        assert_eq!(name.kind, QuestionKind::FreeText);
        assert_eq!(name.default.as_deref(), Some("security-agent"));
    }

    #[test]
    fn test_parse_yaml_schema_with_long_kind_names() {
        let content = r#"
sections:
  - name: Details
    questions:
      - id: notes
        prompt: Anything else?
        type: multi_line_text
      - id: title
        prompt: Title?
        kind: free_text
"#;
        let schema = QuestionSchema::from_yaml_str(content).unwrap();
        assert_eq!(schema.question("notes").unwrap().kind, QuestionKind::MultiLineText);
        assert_eq!(schema.question("title").unwrap().kind, QuestionKind::FreeText);
    }

    #[test]
    fn test_duplicate_question_id() {
        let content = r#"{"sections": [
            {"name": "A", "questions": [{"id": "x", "question": "?", "type": "text"}]},
            {"name": "B", "questions": [{"id": "x", "question": "?", "type": "textarea"}]}
        ]}"#;
        let result = QuestionSchema::from_json_str(content);
        assert!(matches!(result, Err(SchemaError::DuplicateQuestion(id)) if id == "x"));
    }

    #[test]
    fn test_choice_without_options() {
        let content = r#"{"sections": [
            {"name": "A", "questions": [{"id": "pick", "question": "?", "type": "single_choice"}]}
        ]}"#;
        let result = QuestionSchema::from_json_str(content);
        assert!(matches!(result, Err(SchemaError::MissingOptions(_))));
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let content = r#"{"sections": [
            {"name": "A", "questions": [{"id": "x", "question": "?", "type": "slider"}]}
        ]}"#;
        assert!(matches!(
            QuestionSchema::from_json_str(content),
            Err(SchemaError::Json(_))
        ));
    }

    #[test]
    fn test_load_from_file_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{}", MINIMAL).unwrap();
        let schema = QuestionSchema::load(file.path()).unwrap();
        assert!(schema.contains("agent_name"));

        let missing = QuestionSchema::load(Path::new("does/not/exist.yaml"));
        assert!(matches!(missing, Err(SchemaError::Io(_))));
    }

    #[test]
    fn test_builtin_questionnaire_loads() {
        let schema = QuestionSchema::builtin().unwrap();
        for id in [
            "agent_name",
            "primary_agent_type",
            "agent_framework",
            "llm_provider",
            "report_formats",
            "deployment_target",
        ] {
            assert!(schema.contains(id), "missing {}", id);
        }
    }
}
