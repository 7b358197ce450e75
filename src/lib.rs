//! Questionnaire-driven generator for security agent scaffolds.
//!
//! Answers are collected against a [`QuestionSchema`], an entry-script variant is selected
//! from them, and a consistent bundle (script, config, manifest, optional Dockerfile,
//! README) is rendered and written under one directory.

pub mod answers;
pub mod bundle;
pub mod collector;
pub mod config;
pub mod engine;
pub mod error;
pub mod filters;
pub mod keys;
pub mod render;
pub mod schema;
pub mod selector;
pub mod templates;

use log::info;
use std::path::Path;

pub use answers::{Answer, AnswerParseError, AnswerSet};
pub use bundle::{Artifact, BundleAssembler, OutputBundle, WriteError};
pub use collector::{collect, AnswerSource, CollectError, Console};
pub use config::{GeneratorConfig, OperationalDefaults};
pub use engine::{RenderError, TemplateEngine};
pub use error::GenerateError;
pub use render::{ArtifactKind, ArtifactRenderer};
pub use schema::{QuestionSchema, SchemaError};
pub use selector::{select, Archetype, Framework, TemplateVariant};

/// Answers in, written bundle out.
pub struct AgentGenerator {
    assembler: BundleAssembler,
}

impl AgentGenerator {
    pub fn new(settings: &GeneratorConfig) -> Result<Self, GenerateError> {
        let renderer = ArtifactRenderer::new(settings.security.clone())?;
        Ok(Self {
            assembler: BundleAssembler::new(renderer, settings.dry_run),
        })
    }

    pub fn generate(
        &self,
        answers: &AnswerSet,
        target_root: &Path,
    ) -> Result<OutputBundle, GenerateError> {
        let agent_name = answers.agent_name()?;
        let variant = select(answers);

        info!("Generating agent: {}", agent_name);
        info!("  Type: {}", variant.archetype.as_str());
        info!("  Framework: {}", variant.framework.as_str());
        info!("  Output: {:?}", target_root.join(&agent_name));

        self.assembler
            .assemble(target_root, &agent_name, &variant, answers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use tempfile::tempdir;

    const SCENARIO_SCHEMA: &str = r#"{"sections": [
        {"name": "Basics", "questions": [
            {"id": "agent_framework", "question": "Framework?", "type": "single_choice",
             "options": [{"value": "custom", "label": "Custom"}, {"value": "langchain", "label": "LangChain"}]},
            {"id": "agent_name", "question": "Name?", "type": "text", "default": "security-agent"}
        ]}
    ]}"#;

    fn console() -> Console<Cursor<String>, Vec<u8>> {
        Console::new(Cursor::new(String::new()), Vec::new())
    }

    #[test]
    fn test_supplied_empty_agent_name_is_rejected() {
        let schema = QuestionSchema::from_json_str(SCENARIO_SCHEMA).unwrap();
        let supplied =
            AnswerSet::from_json_str(r#"{"agent_framework": "langchain", "agent_name": ""}"#)
                .unwrap();
        let answers = collect(&schema, AnswerSource::Supplied(supplied), &mut console()).unwrap();

        let dir = tempdir().unwrap();
        let generator = AgentGenerator::new(&GeneratorConfig::default()).unwrap();
        let result = generator.generate(&answers, dir.path());
        assert!(matches!(
            result,
            Err(GenerateError::Answers(AnswerParseError::EmptyAgentName))
        ));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_interactive_default_name_scenario() {
        let schema = QuestionSchema::from_json_str(SCENARIO_SCHEMA).unwrap();
        let mut console = Console::new(Cursor::new("2\n\n".to_string()), Vec::new());
        let answers = collect(&schema, AnswerSource::Interactive, &mut console).unwrap();
        assert_eq!(answers.text("agent_name").as_deref(), Some("security-agent"));

        let dir = tempdir().unwrap();
        let generator = AgentGenerator::new(&GeneratorConfig::default()).unwrap();
        let bundle = generator.generate(&answers, dir.path()).unwrap();
        assert_eq!(bundle.directory, dir.path().join("security-agent"));

        let script = fs::read_to_string(dir.path().join("security-agent/agent.py")).unwrap();
        assert!(script.contains("from langchain.agents import"));
        let manifest =
            fs::read_to_string(dir.path().join("security-agent/requirements.txt")).unwrap();
        assert!(manifest.contains("langchain>=0.1.0"));
        assert!(manifest.contains("langchain-openai>=0.0.5"));
        assert!(!dir.path().join("security-agent/Dockerfile").exists());
    }

    #[test]
    fn test_generated_config_regenerates_same_identity() {
        let schema = QuestionSchema::builtin().unwrap();
        let supplied = AnswerSet::from_json_str(
            r#"{"agent_name": "watcher", "primary_agent_type": "security_monitoring",
                "agent_framework": "crewai", "deployment_target": "docker",
                "report_formats": ["json", "markdown"], "llm_provider": "anthropic"}"#,
        )
        .unwrap();
        let answers = collect(&schema, AnswerSource::Supplied(supplied), &mut console()).unwrap();

        let dir = tempdir().unwrap();
        let generator = AgentGenerator::new(&GeneratorConfig::default()).unwrap();
        let first = generator.generate(&answers, dir.path()).unwrap();
        assert!(first.contains(ArtifactKind::ContainerDefinition));

        let config_path = dir.path().join("watcher/config.yaml");
        let replay = collect(
            &schema,
            AnswerSource::ConfigFile(config_path),
            &mut console(),
        )
        .unwrap();
        assert_eq!(replay.text("agent_name").as_deref(), Some("watcher"));
        assert_eq!(
            replay.text("primary_agent_type").as_deref(),
            Some("security_monitoring")
        );
        assert_eq!(select(&replay), select(&answers));

        let again = tempdir().unwrap();
        let second = generator.generate(&replay, again.path()).unwrap();
        assert!(second.contains(ArtifactKind::ContainerDefinition));
        assert_eq!(
            second.get(ArtifactKind::Documentation).map(|a| &a.content),
            first.get(ArtifactKind::Documentation).map(|a| &a.content)
        );
    }

    #[test]
    fn test_unrecognized_values_never_block_generation() {
        let dir = tempdir().unwrap();
        let answers = AnswerSet::from_json_str(
            r#"{"agent_framework": 42, "primary_agent_type": ["x"], "deployment_target": null,
                "report_formats": "pdf", "llm_provider": "skynet"}"#,
        )
        .unwrap();
        let generator = AgentGenerator::new(&GeneratorConfig::default()).unwrap();
        let bundle = generator.generate(&answers, dir.path()).unwrap();
        assert_eq!(bundle.directory, dir.path().join("security-agent"));
        assert_eq!(bundle.artifacts().len(), 4);
    }
}
