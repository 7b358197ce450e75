use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::{Path, PathBuf};

use secforge::keys::{self, Category, HttpProber, KeyStatus};
use secforge::{collect, AgentGenerator, AnswerSource, Console, GeneratorConfig, QuestionSchema};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Run the questionnaire interactively (default when no answers are supplied)
    #[arg(short, long, global = true)]
    interactive: bool,

    /// Path to a JSON answers file
    #[arg(short, long, global = true)]
    answers: Option<PathBuf>,

    /// Path to a YAML config document (flat answers or a generated config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Questionnaire file (JSON or YAML) replacing the bundled one
    #[arg(short, long, global = true)]
    questionnaire: Option<PathBuf>,

    /// Base output directory (overrides settings if provided)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Path to the YAML generator settings file
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    /// Dry run mode - don't write files
    #[arg(long, global = true)]
    dry_run: bool,

    /// Write the collected answers to this JSON file
    #[arg(long, global = true)]
    save_answers: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter questionnaire, answers and settings file
    Init {
        /// Project directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Generate an agent bundle (default command)
    Generate,
    /// Report which integration credentials are configured
    Keys,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init { path }) => {
            init_project(&path)?;
        }
        Some(Commands::Keys) => {
            check_keys()?;
        }
        Some(Commands::Generate) | None => {
            generate(cli)?;
        }
    }

    Ok(())
}

fn init_project(path: &Path) -> Result<()> {
    info!("Initializing secforge project at {:?}", path);

    std::fs::create_dir_all(path)?;
    std::fs::write(path.join("questions.json"), QuestionSchema::builtin_source())?;

    let answers_content = r#"{
  "agent_name": "acme-recon",
  "agent_description": "Maps the external perimeter of acme.example.",
  "version": "0.1.0",
  "primary_agent_type": "reconnaissance",
  "agent_framework": "custom_python",
  "llm_provider": "none",
  "report_formats": ["json", "markdown"],
  "deployment_target": "docker"
}
"#;
    std::fs::write(path.join("answers.json"), answers_content)?;

    let settings_content = r#"output_dir: "output"
questionnaire: "questions.json"
security:
  rate_limit: 10
  timeout: 30
"#;
    std::fs::write(path.join("settings.yaml"), settings_content)?;

    info!("✓ Project initialized successfully!");
    info!("  Run: secforge -s settings.yaml -a answers.json");

    Ok(())
}

fn generate(cli: Cli) -> Result<()> {
    let mut settings = match &cli.settings {
        Some(path) => {
            info!("Loading settings from {:?}", path);
            let settings = GeneratorConfig::load(path).context("Failed to load settings")?;
            resolve_relative(settings, path)
        }
        None => GeneratorConfig::default(),
    };
    if let Some(output) = cli.output {
        settings.output_dir = output;
    }
    if let Some(questionnaire) = cli.questionnaire {
        settings.questionnaire = Some(questionnaire);
    }
    settings.dry_run |= cli.dry_run;

    let schema = match &settings.questionnaire {
        Some(path) => {
            info!("Loading questionnaire from {:?}", path);
            QuestionSchema::load(path).context("Failed to load questionnaire")?
        }
        None => QuestionSchema::builtin().context("Failed to load bundled questionnaire")?,
    };

    let source = match (cli.interactive, cli.answers, cli.config) {
        (false, Some(path), _) => AnswerSource::AnswersFile(path),
        (false, None, Some(path)) => AnswerSource::ConfigFile(path),
        _ => AnswerSource::Interactive,
    };

    let mut console = Console::stdio();
    let answers = collect(&schema, source, &mut console).context("Failed to collect answers")?;

    if let Some(path) = &cli.save_answers {
        let content = serde_json::to_string_pretty(&answers)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to save answers to {:?}", path))?;
        info!("Answers saved to {:?}", path);
    }

    if settings.dry_run {
        info!("=== DRY RUN MODE ===");
    }

    let generator = AgentGenerator::new(&settings)?;
    let bundle = generator
        .generate(&answers, &settings.output_dir)
        .context("Failed to generate agent")?;

    if settings.dry_run {
        info!("=== DRY RUN COMPLETE ===");
        return Ok(());
    }

    info!("✓ Agent generated successfully!");
    info!("Location: {:?}", bundle.directory);
    info!("Next steps:");
    info!("  1. cd {}", bundle.directory.display());
    info!("  2. pip install -r requirements.txt");
    info!("  3. python agent.py --help");

    Ok(())
}

/// Settings paths are relative to the settings file.
fn resolve_relative(mut settings: GeneratorConfig, settings_path: &Path) -> GeneratorConfig {
    let base = settings_path.parent().unwrap_or(Path::new("."));
    if settings.output_dir.is_relative() {
        settings.output_dir = base.join(&settings.output_dir);
    }
    if let Some(questionnaire) = settings.questionnaire.take() {
        settings.questionnaire = Some(if questionnaire.is_relative() {
            base.join(questionnaire)
        } else {
            questionnaire
        });
    }
    settings
}

fn check_keys() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(_) => warn!(".env file not found, using the process environment only"),
    }

    let prober = HttpProber::new().context("Failed to build HTTP client")?;
    let reports = keys::check_all(|var| std::env::var(var).ok(), &prober);

    for category in [Category::LlmProvider, Category::SecurityTool, Category::Notification] {
        println!("\n{}\n  {}\n{}", "=".repeat(60), category.title(), "=".repeat(60));
        for report in reports.iter().filter(|r| r.integration.category == category) {
            let name = report.integration.name;
            match &report.status {
                KeyStatus::Configured => println!("✅ {}: configured (format looks valid)", name),
                KeyStatus::Reachable => println!("✅ {}: connection successful", name),
                KeyStatus::NotConfigured => println!("⏭️  {}: not configured (skipping)", name),
                KeyStatus::Invalid(reason) => println!("❌ {}: {}", name, reason),
                KeyStatus::Unreachable(reason) if report.integration.is_local() => {
                    println!("⏭️  {}: not running ({})", name, reason)
                }
                KeyStatus::Unreachable(reason) => println!("❌ {}: failed - {}", name, reason),
            }
        }
    }

    let failed = reports.iter().filter(|r| r.is_failure()).count();
    if failed > 0 {
        anyhow::bail!("{} configured credential(s) failed", failed);
    }
    Ok(())
}
