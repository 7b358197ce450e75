use log::debug;
use minijinja::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::answers::{keys, AnswerSet};
use crate::bundle::is_containerized;
use crate::config::OperationalDefaults;
use crate::engine::{RenderError, TemplateEngine};
use crate::selector::TemplateVariant;
use crate::templates;

/// Lines every dependency manifest starts with.
pub const BASE_DEPENDENCIES: &[&str] = &["pyyaml>=6.0", "requests>=2.31.0", "python-dotenv>=1.0.0"];

const AGENT_ID_NAMESPACE: &str = "secforge.agents";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    EntryScript,
    Configuration,
    DependencyManifest,
    ContainerDefinition,
    Documentation,
}

impl ArtifactKind {
    pub fn file_name(self) -> &'static str {
        match self {
            ArtifactKind::EntryScript => "agent.py",
            ArtifactKind::Configuration => "config.yaml",
            ArtifactKind::DependencyManifest => "requirements.txt",
            ArtifactKind::ContainerDefinition => "Dockerfile",
            ArtifactKind::Documentation => "README.md",
        }
    }
}

/// A named template placeholder bound to an answer key.
#[derive(Debug, Clone, Copy)]
pub struct Slot {
    pub name: &'static str,
    pub answer: &'static str,
    /// Used when the answer is absent or blank.
    pub fallback: &'static str,
}

const fn slot(name: &'static str, answer: &'static str, fallback: &'static str) -> Slot {
    Slot {
        name,
        answer,
        fallback,
    }
}

const AGENT_NAME_SLOT: Slot = slot("agent_name", keys::AGENT_NAME, keys::DEFAULT_AGENT_NAME);
const AGENT_TYPE_SLOT: Slot = slot("agent_type", keys::AGENT_TYPE, keys::DEFAULT_AGENT_TYPE);

/// Slots of the entry-script templates. `framework` is filled from the variant.
pub const ENTRY_SCRIPT_SLOTS: &[Slot] = &[AGENT_NAME_SLOT, AGENT_TYPE_SLOT];

/// Slots of the README template. `framework` and `containerized` are computed.
pub const DOCUMENTATION_SLOTS: &[Slot] = &[
    AGENT_NAME_SLOT,
    AGENT_TYPE_SLOT,
    slot("agent_description", keys::AGENT_DESCRIPTION, ""),
    slot("version", keys::VERSION, keys::DEFAULT_VERSION),
];

fn resolve_text(answers: &AnswerSet, key: &str, fallback: &str) -> String {
    match answers.text(key) {
        Some(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => {
            debug!("Slot for '{}' falls back to {:?}", key, fallback);
            fallback.to_string()
        }
    }
}

fn fill_slots(slots: &[Slot], answers: &AnswerSet) -> BTreeMap<&'static str, Value> {
    slots
        .iter()
        .map(|slot| {
            (
                slot.name,
                Value::from(resolve_text(answers, slot.answer, slot.fallback)),
            )
        })
        .collect()
}

/// The `config.yaml` document of a generated agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfigDocument {
    pub agent: AgentSection,
    pub llm: LlmSection,
    pub output: OutputSection,
    pub security: OperationalDefaults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSection {
    pub name: String,
    #[serde(rename = "type")]
    pub agent_type: String,
    pub version: String,
    pub framework: String,
    pub deployment: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSection {
    pub provider: String,
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSection {
    pub formats: Vec<String>,
}

fn model_for_provider(provider: &str) -> Option<&'static str> {
    match provider {
        "openai" => Some("gpt-4"),
        "anthropic" => Some("claude-3-5-sonnet-20241022"),
        "google" => Some("gemini-pro"),
        "ollama" => Some("llama3"),
        _ => None,
    }
}

fn agent_id(name: &str) -> Uuid {
    let namespace = Uuid::new_v5(&Uuid::NAMESPACE_DNS, AGENT_ID_NAMESPACE.as_bytes());
    Uuid::new_v5(&namespace, name.as_bytes())
}

/// Produces the text of each artifact. No filesystem access.
pub struct ArtifactRenderer {
    engine: TemplateEngine,
    defaults: OperationalDefaults,
}

impl ArtifactRenderer {
    pub fn new(defaults: OperationalDefaults) -> Result<Self, RenderError> {
        Ok(Self {
            engine: TemplateEngine::new()?,
            defaults,
        })
    }

    pub fn render(
        &self,
        kind: ArtifactKind,
        variant: &TemplateVariant,
        answers: &AnswerSet,
    ) -> Result<String, RenderError> {
        match kind {
            ArtifactKind::EntryScript => self.entry_script(variant, answers),
            ArtifactKind::Configuration => self.configuration(variant, answers),
            ArtifactKind::DependencyManifest => Ok(self.dependency_manifest(variant)),
            ArtifactKind::ContainerDefinition => self.container_definition(),
            ArtifactKind::Documentation => self.documentation(variant, answers),
        }
    }

    pub fn entry_script(
        &self,
        variant: &TemplateVariant,
        answers: &AnswerSet,
    ) -> Result<String, RenderError> {
        let mut context = fill_slots(ENTRY_SCRIPT_SLOTS, answers);
        context.insert("framework", Value::from(variant.framework.as_str()));
        self.engine.render(variant.template, &context)
    }

    pub fn config_document(
        &self,
        variant: &TemplateVariant,
        answers: &AnswerSet,
    ) -> AgentConfigDocument {
        let name = resolve_text(answers, keys::AGENT_NAME, keys::DEFAULT_AGENT_NAME);
        let provider = resolve_text(answers, keys::LLM_PROVIDER, keys::DEFAULT_LLM_PROVIDER);
        let formats = answers
            .list(keys::REPORT_FORMATS)
            .filter(|formats| !formats.is_empty())
            .unwrap_or_else(|| {
                debug!(
                    "No report formats selected, using '{}'",
                    keys::DEFAULT_REPORT_FORMAT
                );
                vec![keys::DEFAULT_REPORT_FORMAT.to_string()]
            });

        AgentConfigDocument {
            agent: AgentSection {
                id: agent_id(&name).to_string(),
                name,
                agent_type: resolve_text(answers, keys::AGENT_TYPE, keys::DEFAULT_AGENT_TYPE),
                version: resolve_text(answers, keys::VERSION, keys::DEFAULT_VERSION),
                framework: variant.framework.as_str().to_string(),
                deployment: resolve_text(
                    answers,
                    keys::DEPLOYMENT_TARGET,
                    keys::DEFAULT_DEPLOYMENT_TARGET,
                ),
            },
            llm: LlmSection {
                model: model_for_provider(&provider).map(str::to_string),
                provider,
            },
            output: OutputSection { formats },
            security: self.defaults.clone(),
        }
    }

    pub fn configuration(
        &self,
        variant: &TemplateVariant,
        answers: &AnswerSet,
    ) -> Result<String, RenderError> {
        Ok(serde_yaml::to_string(&self.config_document(variant, answers))?)
    }

    /// Base set plus the variant framework's extensions, in that order.
    pub fn dependencies(&self, variant: &TemplateVariant) -> Vec<&'static str> {
        let mut deps = BASE_DEPENDENCIES.to_vec();
        for &dep in variant.framework.dependencies() {
            if !deps.contains(&dep) {
                deps.push(dep);
            }
        }
        deps
    }

    pub fn dependency_manifest(&self, variant: &TemplateVariant) -> String {
        let mut manifest = self.dependencies(variant).join("\n");
        manifest.push('\n');
        manifest
    }

    pub fn container_definition(&self) -> Result<String, RenderError> {
        self.engine
            .render(templates::DOCKERFILE, &BTreeMap::<&str, Value>::new())
    }

    pub fn documentation(
        &self,
        variant: &TemplateVariant,
        answers: &AnswerSet,
    ) -> Result<String, RenderError> {
        let mut context = fill_slots(DOCUMENTATION_SLOTS, answers);
        context.insert("framework", Value::from(variant.framework.as_str()));
        context.insert("containerized", Value::from(is_containerized(answers)));
        self.engine.render(templates::README, &context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::Answer;
    use crate::selector::{lookup, select, Archetype, Framework, DEFAULT_VARIANT, VARIANTS};

    fn renderer() -> ArtifactRenderer {
        ArtifactRenderer::new(OperationalDefaults::default()).unwrap()
    }

    fn answers(pairs: &[(&str, &str)]) -> AnswerSet {
        let mut set = AnswerSet::new();
        for (key, value) in pairs {
            set.insert(*key, Answer::text(*value));
        }
        set
    }

    #[test]
    fn test_every_variant_renders_without_answers() {
        let renderer = renderer();
        let empty = AnswerSet::new();
        for variant in VARIANTS {
            let script = renderer.entry_script(variant, &empty).unwrap();
            assert!(script.starts_with("#!/usr/bin/env python3\n"));
            assert!(!script.contains("{{"), "placeholder left in {}", variant.template);
            assert!(script.contains("AGENT_NAME = \"security-agent\""));
            assert!(script.contains("parser.add_argument(\"target\""));
            assert!(script.contains("parser.add_argument(\"--config\", default=\"config.yaml\""));
        }
    }

    #[test]
    fn test_entry_script_follows_the_variant() {
        let renderer = renderer();
        let set = answers(&[(keys::FRAMEWORK, "langchain"), (keys::AGENT_NAME, "scout")]);
        let script = renderer.entry_script(&select(&set), &set).unwrap();
        assert!(script.contains("from langchain.agents import"));
        assert!(script.contains("AGENT_NAME = \"scout\""));
        assert!(script.contains("FRAMEWORK = \"langchain\""));

        let monitoring = lookup(Archetype::SecurityMonitoring, Framework::CustomPython);
        let script = renderer.entry_script(&monitoring, &set).unwrap();
        assert!(script.contains("PATTERNS = ["));
        assert!(!script.contains("langchain"));
    }

    #[test]
    fn test_langchain_prompt_takes_name_as_variable() {
        let renderer = renderer();
        let set = answers(&[(keys::FRAMEWORK, "langchain"), (keys::AGENT_NAME, "scan{x}")]);
        let script = renderer.entry_script(&select(&set), &set).unwrap();
        assert!(script.contains(r#"AGENT_NAME = "scan{x}""#));
        assert!(script.contains("named {agent_name}."));
        assert!(script.contains(r#""agent_name": AGENT_NAME"#));
        assert_eq!(script.matches("scan{x}").count(), 1);
    }

    #[test]
    fn test_slot_values_are_quoted() {
        let renderer = renderer();
        let set = answers(&[(keys::AGENT_NAME, "evil\"name")]);
        let script = renderer.entry_script(&DEFAULT_VARIANT, &set).unwrap();
        assert!(script.contains(r#"AGENT_NAME = "evil\"name""#));
    }

    #[test]
    fn test_configuration_round_trip() {
        let renderer = renderer();
        let set = answers(&[
            (keys::AGENT_NAME, "scout"),
            (keys::AGENT_TYPE, "security_monitoring"),
            (keys::LLM_PROVIDER, "openai"),
            (keys::DEPLOYMENT_TARGET, "docker"),
        ]);
        let text = renderer.configuration(&select(&set), &set).unwrap();
        let parsed: AgentConfigDocument = serde_yaml::from_str(&text).unwrap();
        assert_eq!(parsed.agent.name, "scout");
        assert_eq!(parsed.agent.agent_type, "security_monitoring");
        assert_eq!(parsed.llm.model.as_deref(), Some("gpt-4"));
        assert_eq!(parsed.output.formats, vec!["json".to_string()]);
        assert_eq!(parsed.security.rate_limit, 10);
        assert_eq!(parsed.security.timeout, 30);

        let again = AnswerSet::from_yaml_str(&text).unwrap();
        assert_eq!(again.text(keys::AGENT_NAME).as_deref(), Some("scout"));
        assert_eq!(
            again.text(keys::AGENT_TYPE).as_deref(),
            Some("security_monitoring")
        );
        assert_eq!(
            again.text(keys::DEPLOYMENT_TARGET).as_deref(),
            Some("docker")
        );
    }

    #[test]
    fn test_configuration_defaults() {
        let renderer = renderer();
        let doc = renderer.config_document(&DEFAULT_VARIANT, &AnswerSet::new());
        assert_eq!(doc.agent.name, "security-agent");
        assert_eq!(doc.agent.version, "1.0.0");
        assert_eq!(doc.llm.provider, "none");
        assert_eq!(doc.agent.deployment, "local");
        assert!(doc.llm.model.is_none());
        assert_eq!(doc.agent.id, agent_id("security-agent").to_string());

        let text = renderer.configuration(&DEFAULT_VARIANT, &AnswerSet::new()).unwrap();
        assert!(text.contains("model: null"));
    }

    #[test]
    fn test_configuration_uses_supplied_operational_defaults() {
        let renderer = ArtifactRenderer::new(OperationalDefaults {
            rate_limit: 2,
            timeout: 5,
        })
        .unwrap();
        let mut set = AnswerSet::new();
        set.insert(keys::REPORT_FORMATS, Answer::many(["markdown", "json"]));
        let doc = renderer.config_document(&DEFAULT_VARIANT, &set);
        assert_eq!(doc.security.rate_limit, 2);
        assert_eq!(doc.security.timeout, 5);
        assert_eq!(doc.output.formats, vec!["json".to_string(), "markdown".to_string()]);
    }

    #[test]
    fn test_manifest_for_langchain() {
        let renderer = renderer();
        let set = answers(&[(keys::FRAMEWORK, "langchain")]);
        let manifest = renderer.dependency_manifest(&select(&set));
        let lines: Vec<&str> = manifest.lines().collect();
        assert_eq!(&lines[..3], BASE_DEPENDENCIES);
        assert!(lines.contains(&"langchain>=0.1.0"));
        assert!(lines.contains(&"langchain-openai>=0.0.5"));
        assert!(lines.contains(&"openai>=1.0.0"));
    }

    #[test]
    fn test_manifest_for_unknown_framework_is_base_only() {
        let renderer = renderer();
        let set = answers(&[(keys::FRAMEWORK, "autogen")]);
        let manifest = renderer.dependency_manifest(&select(&set));
        assert_eq!(manifest.lines().collect::<Vec<_>>(), BASE_DEPENDENCIES);
    }

    #[test]
    fn test_manifest_covers_script_imports() {
        let renderer = renderer();
        for variant in VARIANTS {
            let script = renderer.entry_script(variant, &AnswerSet::new()).unwrap();
            let manifest = renderer.dependency_manifest(variant);
            for (module, package) in [
                ("import yaml", "pyyaml"),
                ("from langchain.", "langchain>="),
                ("from langchain_openai", "langchain-openai"),
                ("from crewai", "crewai"),
            ] {
                if script.contains(module) {
                    assert!(
                        manifest.contains(package),
                        "{} imports {} without {}",
                        variant.template,
                        module,
                        package
                    );
                }
            }
        }
    }

    #[test]
    fn test_documentation() {
        let renderer = renderer();
        let set = answers(&[
            (keys::AGENT_NAME, "Acme Recon"),
            (keys::AGENT_TYPE, "reconnaissance"),
            (keys::DEPLOYMENT_TARGET, "docker"),
            (keys::AGENT_DESCRIPTION, "Maps the perimeter."),
        ]);
        let readme = renderer.documentation(&select(&set), &set).unwrap();
        assert!(readme.starts_with("# Acme Recon\n"));
        assert!(readme.contains("**Type:** reconnaissance"));
        assert!(readme.contains("Maps the perimeter."));
        assert!(readme.contains("python agent.py <target> [--config config.yaml]"));
        assert!(readme.contains("docker build -t acme-recon ."));

        let local = answers(&[(keys::DEPLOYMENT_TARGET, "local")]);
        let readme = renderer.documentation(&select(&local), &local).unwrap();
        assert!(!readme.contains("## Docker"));
        assert!(readme.contains("# security-agent"));
    }

    #[test]
    fn test_container_definition_is_fixed() {
        let renderer = renderer();
        let first = renderer.container_definition().unwrap();
        assert_eq!(first, renderer.container_definition().unwrap());
        assert!(first.contains("ENTRYPOINT [\"python\", \"agent.py\"]"));
    }
}
