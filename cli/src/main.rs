//! `webvalidator`: W3C validation for HTML and CSS.
//!
//! `webvalidator check` validates files from disk and prints their issues;
//! `webvalidator lsp` runs the language server editors talk to.

mod terminal;

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use webvalidator_client::ValidatorClient;
use webvalidator_config::{ClientSettings, EditorSettings, WebValidatorConfig};
use webvalidator_engine::{Orchestrator, Trigger, ValidationOutcome};
use webvalidator_lsp::ServerOptions;

use crate::terminal::{TerminalHost, document_from_file};

#[derive(Parser)]
#[command(name = "webvalidator", version)]
#[command(about = "Validate HTML and CSS with the W3C Nu HTML Checker")]
struct Cli {
    /// Config file to use instead of ~/.webvalidator/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate files and print their issues
    Check {
        /// HTML (.html, .htm, .xhtml) or CSS (.css) files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        service: ServiceArgs,

        /// Only print issues, no per-file summary
        #[arg(short, long)]
        quiet: bool,
    },
    /// Run the language server on stdin/stdout
    Lsp {
        #[command(flatten)]
        service: ServiceArgs,
    },
    /// Print where the config file is looked up
    ConfigPath,
}

#[derive(clap::Args)]
struct ServiceArgs {
    /// Validator endpoint, e.g. a local Nu checker
    #[arg(long)]
    endpoint: Option<String>,

    /// Request timeout in seconds (0 disables it)
    #[arg(long)]
    timeout: Option<u64>,
}

/// Exit codes of `check`.
const EXIT_ISSUES: u8 = 1;
const EXIT_FAILURE: u8 = 2;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::try_new("warn").expect("warn filter is valid"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // stdout carries LSP frames, so the last resort is stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
    for warning in init_warnings {
        tracing::warn!("{warning}");
    }
}

fn open_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new().create(true).append(true).open(&candidate) {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => warnings.push(format!(
                "Failed to open log file {}: {e}",
                candidate.display()
            )),
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // ~/.webvalidator/logs/webvalidator.log
    if let Some(config_path) = WebValidatorConfig::path()
        && let Some(config_dir) = config_path.parent()
    {
        candidates.push(config_dir.join("logs").join("webvalidator.log"));
    }

    candidates.push(
        PathBuf::from(".webvalidator")
            .join("logs")
            .join("webvalidator.log"),
    );

    candidates
}

fn load_config(explicit: Option<&Path>) -> Result<WebValidatorConfig> {
    let loaded = match explicit {
        Some(path) => {
            let loaded = WebValidatorConfig::load_from(path)?;
            if loaded.is_none() {
                anyhow::bail!("config file {} does not exist", path.display());
            }
            loaded
        }
        None => WebValidatorConfig::load()?,
    };
    Ok(loaded.unwrap_or_default())
}

fn client_settings(config: &WebValidatorConfig, args: &ServiceArgs) -> Result<ClientSettings> {
    let mut section = config.validator.clone().unwrap_or_default();
    if let Some(endpoint) = &args.endpoint {
        section.endpoint = Some(endpoint.clone());
    }
    if let Some(timeout) = args.timeout {
        section.timeout_seconds = Some(timeout);
    }
    Ok(ClientSettings::resolve(Some(&section))?)
}

async fn check(
    files: &[PathBuf],
    client_settings: &ClientSettings,
    mut editor: EditorSettings,
    quiet: bool,
) -> Result<ExitCode> {
    let client = ValidatorClient::new(client_settings).context("building validator client")?;
    editor.show_popup = !quiet;
    let mut orchestrator = Orchestrator::new(TerminalHost::new(std::io::stdout()), editor);

    let mut issues = false;
    let mut failed = false;

    for path in files {
        let display = path.display().to_string();
        orchestrator.host_mut().set_display(display.as_str());

        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) => {
                eprintln!("{display}: error: {e}");
                failed = true;
                continue;
            }
        };

        let document = document_from_file(path, text);
        match orchestrator
            .validate_now(&client, &document, Trigger::Command)
            .await
        {
            ValidationOutcome::Valid => {}
            ValidationOutcome::Issues { .. } => issues = true,
            ValidationOutcome::Skipped
            | ValidationOutcome::Stale
            | ValidationOutcome::Failed(_) => failed = true,
        }
    }

    Ok(if failed {
        ExitCode::from(EXIT_FAILURE)
    } else if issues {
        ExitCode::from(EXIT_ISSUES)
    } else {
        ExitCode::SUCCESS
    })
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::ConfigPath => {
            match WebValidatorConfig::path() {
                Some(path) => println!("{}", path.display()),
                None => anyhow::bail!("no home directory; config file location unknown"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Check {
            files,
            service,
            quiet,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let settings = client_settings(&config, &service)?;
            check(&files, &settings, config.editor_settings(), quiet).await
        }
        Command::Lsp { service } => {
            let config = load_config(cli.config.as_deref())?;
            let options = ServerOptions {
                client: client_settings(&config, &service)?,
                editor: config.editor_settings(),
            };
            let reason = webvalidator_lsp::serve_stdio(options).await?;
            // The stdin reader sits in a blocking read until the editor
            // closes the pipe, and runtime shutdown would wait for it.
            std::io::stdout()
                .flush()
                .context("flushing stdout before exit")?;
            std::process::exit(reason.exit_code());
        }
    }
}
