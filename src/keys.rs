//! Reports which integrations of a generated agent have credentials configured, and whether
//! each configured one answers.
//!
//! Presence gates the check: an integration whose variable is unset is skipped without any
//! request. Local services with no credential are always probed.

use log::debug;
use regex::Regex;
use reqwest::blocking::Client;
use std::sync::LazyLock;
use std::time::Duration;

static SLACK_WEBHOOK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://hooks\.slack\.com/services/[A-Za-z0-9/_-]+$")
        .expect("slack webhook pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    LlmProvider,
    SecurityTool,
    Notification,
}

impl Category {
    pub fn title(self) -> &'static str {
        match self {
            Category::LlmProvider => "LLM Providers",
            Category::SecurityTool => "Security Tools",
            Category::Notification => "Notification Services",
        }
    }
}

/// How the credential travels with a probe request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    Bearer,
    Header(&'static str),
    Query(&'static str),
}

/// A cheap authenticated read that proves the credential works.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub url: &'static str,
    pub auth: Option<Auth>,
    pub headers: &'static [(&'static str, &'static str)],
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct Integration {
    pub name: &'static str,
    pub category: Category,
    /// `None` for local services that need no credential.
    pub env_var: Option<&'static str>,
    /// `None` when the integration is only format-checked.
    pub endpoint: Option<Endpoint>,
}

impl Integration {
    pub fn is_local(&self) -> bool {
        self.env_var.is_none()
    }
}

const REMOTE_TIMEOUT: Duration = Duration::from_secs(10);
const LOCAL_TIMEOUT: Duration = Duration::from_secs(2);

pub const INTEGRATIONS: &[Integration] = &[
    Integration {
        name: "OpenAI",
        category: Category::LlmProvider,
        env_var: Some("OPENAI_API_KEY"),
        endpoint: Some(Endpoint {
            url: "https://api.openai.com/v1/models",
            auth: Some(Auth::Bearer),
            headers: &[],
            timeout: REMOTE_TIMEOUT,
        }),
    },
    Integration {
        name: "Anthropic",
        category: Category::LlmProvider,
        env_var: Some("ANTHROPIC_API_KEY"),
        endpoint: Some(Endpoint {
            url: "https://api.anthropic.com/v1/models",
            auth: Some(Auth::Header("x-api-key")),
            headers: &[("anthropic-version", "2023-06-01")],
            timeout: REMOTE_TIMEOUT,
        }),
    },
    Integration {
        name: "Google Gemini",
        category: Category::LlmProvider,
        env_var: Some("GOOGLE_API_KEY"),
        endpoint: Some(Endpoint {
            url: "https://generativelanguage.googleapis.com/v1beta/models",
            auth: Some(Auth::Query("key")),
            headers: &[],
            timeout: REMOTE_TIMEOUT,
        }),
    },
    Integration {
        name: "Ollama",
        category: Category::LlmProvider,
        env_var: None,
        endpoint: Some(Endpoint {
            url: "http://localhost:11434/api/tags",
            auth: None,
            headers: &[],
            timeout: LOCAL_TIMEOUT,
        }),
    },
    Integration {
        name: "Shodan",
        category: Category::SecurityTool,
        env_var: Some("SHODAN_API_KEY"),
        endpoint: Some(Endpoint {
            url: "https://api.shodan.io/api-info",
            auth: Some(Auth::Query("key")),
            headers: &[],
            timeout: REMOTE_TIMEOUT,
        }),
    },
    Integration {
        name: "VirusTotal",
        category: Category::SecurityTool,
        env_var: Some("VIRUSTOTAL_API_KEY"),
        endpoint: Some(Endpoint {
            url: "https://www.virustotal.com/api/v3/users/current",
            auth: Some(Auth::Header("x-apikey")),
            headers: &[],
            timeout: REMOTE_TIMEOUT,
        }),
    },
    // Posting to a webhook sends a message, so Slack is only format-checked.
    Integration {
        name: "Slack",
        category: Category::Notification,
        env_var: Some("SLACK_WEBHOOK_URL"),
        endpoint: None,
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyStatus {
    NotConfigured,
    /// Set and well-formed, with nothing to probe.
    Configured,
    /// Set, but not in the expected shape.
    Invalid(String),
    Reachable,
    Unreachable(String),
}

#[derive(Debug, Clone)]
pub struct KeyReport {
    pub integration: Integration,
    pub status: KeyStatus,
}

impl KeyReport {
    /// A configured credential that is malformed or rejected. A local service that is not
    /// running is not a failure.
    pub fn is_failure(&self) -> bool {
        match self.status {
            KeyStatus::Invalid(_) => true,
            KeyStatus::Unreachable(_) => !self.integration.is_local(),
            _ => false,
        }
    }
}

/// Performs one probe request.
pub trait Prober {
    fn probe(&self, endpoint: &Endpoint, credential: Option<&str>) -> Result<(), String>;
}

impl<F> Prober for F
where
    F: Fn(&Endpoint, Option<&str>) -> Result<(), String>,
{
    fn probe(&self, endpoint: &Endpoint, credential: Option<&str>) -> Result<(), String> {
        self(endpoint, credential)
    }
}

/// Probes over HTTP with a blocking client.
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new() -> reqwest::Result<Self> {
        let client = Client::builder().timeout(REMOTE_TIMEOUT).build()?;
        Ok(Self { client })
    }
}

impl Prober for HttpProber {
    fn probe(&self, endpoint: &Endpoint, credential: Option<&str>) -> Result<(), String> {
        let mut request = self.client.get(endpoint.url).timeout(endpoint.timeout);
        if let (Some(auth), Some(credential)) = (endpoint.auth, credential) {
            request = match auth {
                Auth::Bearer => request.bearer_auth(credential),
                Auth::Header(name) => request.header(name, credential),
                Auth::Query(name) => request.query(&[(name, credential)]),
            };
        }
        for &(name, value) in endpoint.headers {
            request = request.header(name, value);
        }

        // Query credentials are part of the URL, which must not end up in the message.
        let response = request.send().map_err(|e| e.without_url().to_string())?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(format!("Status {}", status))
        }
    }
}

/// Checks every integration. `lookup` reads a variable (normally from the process
/// environment) and `prober` runs the request for each configured integration.
pub fn check_all<F, P>(lookup: F, prober: &P) -> Vec<KeyReport>
where
    F: Fn(&str) -> Option<String>,
    P: Prober + ?Sized,
{
    INTEGRATIONS
        .iter()
        .map(|integration| KeyReport {
            integration: *integration,
            status: check(integration, &lookup, prober),
        })
        .collect()
}

fn check<F, P>(integration: &Integration, lookup: &F, prober: &P) -> KeyStatus
where
    F: Fn(&str) -> Option<String>,
    P: Prober + ?Sized,
{
    let credential = match integration.env_var {
        None => None,
        Some(var) => {
            let value = lookup(var)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty());
            let Some(value) = value else {
                return KeyStatus::NotConfigured;
            };
            if var == "SLACK_WEBHOOK_URL" && !SLACK_WEBHOOK.is_match(&value) {
                return KeyStatus::Invalid(
                    "webhook URL must start with https://hooks.slack.com/services/".into(),
                );
            }
            Some(value)
        }
    };

    let Some(endpoint) = &integration.endpoint else {
        return KeyStatus::Configured;
    };
    debug!("Probing {} at {}", integration.name, endpoint.url);
    match prober.probe(endpoint, credential.as_deref()) {
        Ok(()) => KeyStatus::Reachable,
        Err(reason) => KeyStatus::Unreachable(reason),
    }
}
