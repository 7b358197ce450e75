use log::{debug, warn};

use crate::answers::{keys, AnswerSet};
use crate::templates;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Archetype {
    Reconnaissance,
    SecurityMonitoring,
}

impl Archetype {
    pub fn from_answer(value: &str) -> Option<Self> {
        match value {
            "reconnaissance" => Some(Archetype::Reconnaissance),
            "security_monitoring" => Some(Archetype::SecurityMonitoring),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Archetype::Reconnaissance => "reconnaissance",
            Archetype::SecurityMonitoring => "security_monitoring",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Framework {
    CustomPython,
    LangChain,
    CrewAi,
    HybridLangChainCustom,
    HybridCrewAiCustom,
}

impl Framework {
    pub fn from_answer(value: &str) -> Option<Self> {
        match value {
            "custom_python" | "custom" => Some(Framework::CustomPython),
            "langchain" => Some(Framework::LangChain),
            "crewai" => Some(Framework::CrewAi),
            "hybrid_langchain_custom" => Some(Framework::HybridLangChainCustom),
            "hybrid_crewai_custom" => Some(Framework::HybridCrewAiCustom),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Framework::CustomPython => "custom_python",
            Framework::LangChain => "langchain",
            Framework::CrewAi => "crewai",
            Framework::HybridLangChainCustom => "hybrid_langchain_custom",
            Framework::HybridCrewAiCustom => "hybrid_crewai_custom",
        }
    }

    /// Extra manifest lines the framework's entry script imports.
    pub fn dependencies(self) -> &'static [&'static str] {
        match self {
            Framework::CustomPython => &[],
            Framework::LangChain | Framework::HybridLangChainCustom => &[
                "langchain>=0.1.0",
                "langchain-openai>=0.0.5",
                "openai>=1.0.0",
            ],
            Framework::CrewAi | Framework::HybridCrewAiCustom => &[
                "crewai>=0.1.0",
                "langchain>=0.1.0",
                "langchain-openai>=0.0.5",
                "openai>=1.0.0",
            ],
        }
    }
}

/// An entry-script template resolved from an (archetype, framework) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateVariant {
    pub archetype: Archetype,
    pub framework: Framework,
    /// Name of the registered entry-script template.
    pub template: &'static str,
}

const fn variant(
    archetype: Archetype,
    framework: Framework,
    template: &'static str,
) -> TemplateVariant {
    TemplateVariant {
        archetype,
        framework,
        template,
    }
}

pub const DEFAULT_VARIANT: TemplateVariant = variant(
    Archetype::Reconnaissance,
    Framework::CustomPython,
    templates::CUSTOM_RECONNAISSANCE,
);

use Archetype::*;
use Framework::*;

pub const VARIANTS: &[TemplateVariant] = &[
    DEFAULT_VARIANT,
    variant(SecurityMonitoring, CustomPython, templates::CUSTOM_MONITORING),
    variant(Reconnaissance, LangChain, templates::LANGCHAIN),
    variant(SecurityMonitoring, LangChain, templates::LANGCHAIN),
    variant(Reconnaissance, HybridLangChainCustom, templates::LANGCHAIN),
    variant(SecurityMonitoring, HybridLangChainCustom, templates::LANGCHAIN),
    variant(Reconnaissance, CrewAi, templates::CREWAI),
    variant(SecurityMonitoring, CrewAi, templates::CREWAI),
    variant(Reconnaissance, HybridCrewAiCustom, templates::CREWAI),
    variant(SecurityMonitoring, HybridCrewAiCustom, templates::CREWAI),
];

/// Picks the entry-script variant for `answers`. Never fails: unknown values resolve to
/// the defaults.
pub fn select(answers: &AnswerSet) -> TemplateVariant {
    let archetype = resolve(
        answers,
        keys::AGENT_TYPE,
        Archetype::from_answer,
        Reconnaissance,
    );
    let framework = resolve(answers, keys::FRAMEWORK, Framework::from_answer, CustomPython);
    lookup(archetype, framework)
}

pub fn lookup(archetype: Archetype, framework: Framework) -> TemplateVariant {
    VARIANTS
        .iter()
        .copied()
        .find(|v| v.archetype == archetype && v.framework == framework)
        .unwrap_or(DEFAULT_VARIANT)
}

fn resolve<T: Copy>(
    answers: &AnswerSet,
    key: &str,
    parse: fn(&str) -> Option<T>,
    fallback: T,
) -> T {
    match answers.text(key) {
        None => {
            debug!("No '{}' answer, using the default", key);
            fallback
        }
        Some(value) => parse(value.trim()).unwrap_or_else(|| {
            warn!("Unrecognized '{}' value {:?}, using the default", key, value);
            fallback
        }),
    }
}
