mod config;
mod wizard;

use anyhow::{Context, Result, anyhow, bail};
use clap::{ArgAction, Parser, Subcommand};
use config::IntakeConfig;
use intake_spec::{
    Meta, Registry, ValidationResult, catalog, medical_intake, parse_record, registry_schema,
    validate,
};
use intake_wizard::{
    CompletionHandler, JsonFileSink, SimulatedDelay, Step, WizardController, WizardError,
};
use serde_json::Value;
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use wizard::{RenderMode, Verbosity, WizardPresenter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Medical intake questionnaire",
    long_about = "Runs the step-gated medical questionnaire in a terminal and validates answer documents"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Configuration file merged over ./intake.toml.
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Walk through the questionnaire interactively.
    Run {
        /// Registry JSON to use instead of the built-in medical questionnaire.
        #[arg(long, value_name = "REGISTRY")]
        registry: Option<PathBuf>,
        /// JSON file with answers to pre-fill.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        /// Write submissions as JSON into this directory.
        #[arg(long, value_name = "DIR")]
        submissions_dir: Option<PathBuf>,
        /// Client reference attached to the submission.
        #[arg(long, value_name = "REF")]
        client_ref: Option<String>,
        /// Intake channel attached to the submission, e.g. `phone` or `web`.
        #[arg(long, value_name = "CHANNEL")]
        channel: Option<String>,
        /// Show status lines and full question cards.
        #[arg(long)]
        detailed: bool,
        /// Also print the submitted answers as JSON.
        #[arg(long)]
        answers_json: bool,
        /// Render output mode for each question.
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
    },
    /// Validate an answers document against a registry.
    Validate {
        #[arg(long, value_name = "REGISTRY")]
        registry: Option<PathBuf>,
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
    },
    /// Print the questions of a registry.
    Describe {
        #[arg(long, value_name = "REGISTRY")]
        registry: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
    },
    /// Print the JSON Schema of registry documents.
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(path) = &cli.config
        && !path.exists()
    {
        bail!("config file {} does not exist", path.display());
    }
    let config = IntakeConfig::load(cli.config.as_deref())
        .map_err(|err| anyhow!("failed to load configuration: {err}"))?;
    init_tracing(cli.verbose, &config.log_level);
    debug!(?config, "configuration loaded");

    match cli.command {
        Command::Run {
            registry,
            answers,
            submissions_dir,
            client_ref,
            channel,
            detailed,
            answers_json,
            format,
        } => {
            let registry = load_registry(registry.or(config.registry.clone()).as_deref())?;
            let submissions_dir = submissions_dir.or(config.submissions_dir.clone());
            let handler = completion_handler(submissions_dir, &config)?;
            let meta = submission_meta(
                client_ref.or(config.client_ref.clone()),
                channel.or(config.channel.clone()),
            );
            let presenter =
                WizardPresenter::new(Verbosity::from_verbose(detailed), format, answers_json);
            run_wizard(registry, answers, handler, meta, presenter).await
        }
        Command::Validate { registry, answers } => {
            let registry = load_registry(registry.or(config.registry).as_deref())?;
            run_validate(&registry, &answers)
        }
        Command::Describe { registry, format } => {
            let registry = load_registry(registry.or(config.registry).as_deref())?;
            run_describe(&registry, format)
        }
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&registry_schema())?);
            Ok(())
        }
    }
}

fn init_tracing(verbose: u8, configured: &str) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured)),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn load_registry(path: Option<&Path>) -> Result<Registry> {
    match path {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read registry {}", path.display()))?;
            catalog::from_json_str(&contents)
                .with_context(|| format!("failed to load registry {}", path.display()))
        }
        None => medical_intake().context("built-in questionnaire is invalid"),
    }
}

fn completion_handler(
    submissions_dir: Option<PathBuf>,
    config: &IntakeConfig,
) -> Result<Arc<dyn CompletionHandler>> {
    match submissions_dir {
        Some(dir) => {
            if dir.as_os_str().is_empty() {
                bail!("submissions directory cannot be empty");
            }
            ensure_allowed_root(&dir)?;
            let sink = JsonFileSink::new(dir);
            info!(dir = %sink.dir().display(), "submissions will be written to disk");
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(SimulatedDelay::new(Duration::from_millis(
            config.completion_delay_ms,
        )))),
    }
}

fn submission_meta(client_ref: Option<String>, channel: Option<String>) -> Option<Meta> {
    if client_ref.is_none() && channel.is_none() {
        return None;
    }
    Some(Meta {
        client_ref,
        channel,
    })
}

async fn run_wizard(
    registry: Registry,
    answers_path: Option<PathBuf>,
    handler: Arc<dyn CompletionHandler>,
    meta: Option<Meta>,
    mut presenter: WizardPresenter,
) -> Result<()> {
    let registry = Arc::new(registry);
    let mut wizard = WizardController::new(registry.clone(), handler);
    if let Some(meta) = meta {
        wizard = wizard.with_meta(meta);
    }

    if let Some(path) = answers_path {
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read answers {}", path.display()))?;
        let value: Value = serde_json::from_str(&contents)?;
        let record = match parse_record(&registry, &value) {
            Ok(record) => record,
            Err(result) => {
                describe_validation(&result);
                bail!("pre-filled answers are invalid");
            }
        };
        wizard = wizard.with_answers(record)?;
    }

    loop {
        let payload = wizard.render();
        presenter.show_header(&payload);
        presenter.show_question(&payload);

        let Some(input) = read_line()? else {
            wizard.abandon();
            presenter.show_abandoned();
            bail!("input closed before the questionnaire was finished");
        };
        let trimmed = input.trim();

        match trimmed {
            ":back" | ":b" => {
                if wizard.previous() == Step::Blocked {
                    presenter.show_first_question();
                }
                continue;
            }
            ":quit" | ":q" | "exit" => {
                wizard.abandon();
                presenter.show_abandoned();
                return Ok(());
            }
            "" => {}
            raw => {
                if let Err(err) = wizard.answer_current(raw) {
                    presenter.show_parse_error(&err);
                    continue;
                }
            }
        }

        if wizard.is_last() && wizard.can_advance() {
            presenter.show_submitting();
        }
        match wizard.next().await {
            Ok(Step::Moved(_)) => {}
            Ok(Step::Blocked) => presenter.show_blocked(),
            Ok(Step::Submitted(receipt)) => {
                presenter.show_completion(&receipt, &wizard.answer_set());
                return Ok(());
            }
            Ok(Step::Ignored) => return Ok(()),
            Err(err @ WizardError::CompletionFailed { .. }) => {
                presenter.show_submission_failed(&err);
            }
            Err(err) => return Err(err.into()),
        }
    }
}

fn read_line() -> Result<Option<String>> {
    print!("> ");
    io::stdout().flush()?;
    let mut input = String::new();
    let read = io::stdin().read_line(&mut input)?;
    if read == 0 {
        Ok(None)
    } else {
        Ok(Some(input))
    }
}

fn run_validate(registry: &Registry, answers_path: &Path) -> Result<()> {
    let answers_json = fs::read_to_string(answers_path)
        .with_context(|| format!("failed to read answers {}", answers_path.display()))?;
    let answers: Value = serde_json::from_str(&answers_json)?;

    let result = validate(registry, &answers);
    println!(
        "Validation result: {}",
        if result.valid { "valid" } else { "invalid" }
    );
    describe_validation(&result);

    if result.valid {
        Ok(())
    } else {
        bail!("validation failed")
    }
}

fn describe_validation(result: &ValidationResult) {
    if !result.errors.is_empty() {
        println!("Errors:");
        for error in &result.errors {
            println!(
                "  {} - {}",
                error.path.as_deref().unwrap_or("<unknown>"),
                error.message
            );
        }
    }
    if !result.missing_required.is_empty() {
        println!(
            "Missing required answers: {}",
            result.missing_required.join(", ")
        );
    }
    if !result.unknown_fields.is_empty() {
        println!(
            "Unknown answer fields: {}",
            result.unknown_fields.join(", ")
        );
    }
}

fn run_describe(registry: &Registry, format: RenderMode) -> Result<()> {
    if format == RenderMode::Json {
        println!("{}", serde_json::to_string_pretty(registry.spec())?);
        return Ok(());
    }

    println!(
        "{} ({}, version {})",
        registry.title(),
        registry.id(),
        registry.version()
    );
    if let Some(description) = registry.description() {
        println!("{}", description);
    }
    let mut category = "";
    for (index, question) in registry.iter().enumerate() {
        if question.category != category {
            category = &question.category;
            println!("[{}]", category);
        }
        let mut line = format!(
            "{:>3}. {} ({}",
            index + 1,
            question.title,
            question.kind.as_str()
        );
        if question.required {
            line.push_str(", required");
        }
        line.push(')');
        println!("{}", line);
        if !question.options.is_empty() {
            println!("     options: {}", question.options.join(" / "));
        }
    }
    Ok(())
}

fn ensure_allowed_root(target: &Path) -> Result<()> {
    let target = canonicalize_target(target)?;
    let roots = allowed_roots()?;
    if roots.iter().any(|root| target.starts_with(root)) || path_is_writable(&target) {
        Ok(())
    } else {
        bail!(
            "path '{}' is outside allowed roots {:?}",
            target.display(),
            roots
        )
    }
}

fn allowed_roots() -> Result<Vec<PathBuf>> {
    let roots = env::var("INTAKE_ALLOWED_ROOTS")
        .ok()
        .map(|value| {
            value
                .split(':')
                .map(str::trim)
                .filter(|segment| !segment.is_empty())
                .map(PathBuf::from)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let mut canonical_roots = roots
        .into_iter()
        .map(|root| root.canonicalize().unwrap_or(root))
        .collect::<Vec<_>>();

    if canonical_roots.is_empty() {
        let cwd = env::current_dir()?;
        canonical_roots.push(cwd.canonicalize().unwrap_or(cwd));
    }

    Ok(canonical_roots)
}

fn path_is_writable(target: &Path) -> bool {
    let mut candidate = Some(target);
    while let Some(path) = candidate {
        if path.exists() {
            return fs::metadata(path)
                .map(|metadata| !metadata.permissions().readonly())
                .unwrap_or(false);
        }
        candidate = path.parent();
    }
    false
}

fn canonicalize_target(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.canonicalize()?);
    }

    if let Some(parent) = path.parent()
        && let Ok(parent_canon) = parent.canonicalize()
    {
        return Ok(match path.file_name() {
            Some(file_name) => parent_canon.join(file_name),
            None => parent_canon,
        });
    }

    Ok(env::current_dir()?.join(path))
}
