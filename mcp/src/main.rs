//! Simone MCP - prompt templating server
//!
//! CLI entry point: serves MCP over stdio by default, with a few commands for
//! inspecting a project from the terminal.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use simone_mcp::activity::ActivityLogger;
use simone_mcp::cli::{Cli, Command, OutputFormat, get_log_path};
use simone_mcp::config::{Config, PathsConfig, resolve_project_path};
use simone_mcp::errlog::ErrorLog;
use simone_mcp::project::{ConfigLoader, ResolvedContext};
use simone_mcp::server::{McpServer, PromptInfo};
use simone_mcp::watcher::TemplateWatcher;

/// Capacity of the server notification channel
const NOTIFICATION_BUFFER: usize = 16;

fn setup_logging(level_str: &str) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    let level = match level_str.to_uppercase().as_str() {
        "TRACE" => tracing::Level::TRACE,
        "DEBUG" => tracing::Level::DEBUG,
        "INFO" => tracing::Level::INFO,
        "WARN" | "WARNING" => tracing::Level::WARN,
        "ERROR" => tracing::Level::ERROR,
        _ => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", level_str);
            tracing::Level::INFO
        }
    };

    // Several processes may share the file (one server per editor window)
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.level()).context("Failed to setup logging")?;

    let project = resolve_project_path(cli.project.as_deref())?;
    info!(project = %project.display(), "simone-mcp starting");

    let config = match Config::load(cli.config.as_ref()).context("Failed to load configuration") {
        Ok(config) => config,
        Err(e) => {
            let paths = PathsConfig::default().for_project(&project);
            return bootstrap_failed(&ErrorLog::new(paths.error_log_file()), e);
        }
    };

    let errlog = ErrorLog::new(config.paths.for_project(&project).error_log_file());

    debug!(command = ?cli.command, "main: dispatching command");
    let result = match cli.command.unwrap_or_default() {
        Command::Serve { no_watch } => cmd_serve(&config, project, no_watch).await,
        Command::Prompts { format } => cmd_prompts(&config, project, format),
        Command::Render { name, args } => cmd_render(&config, project, &name, args),
        Command::Contexts { format } => cmd_contexts(&config, project, format),
        Command::Activity { limit, format } => cmd_activity(&config, &project, limit, format),
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) => bootstrap_failed(&errlog, e),
    }
}

/// Record a fatal error in the project error log before exiting with it
fn bootstrap_failed(errlog: &ErrorLog, e: eyre::Report) -> Result<()> {
    error!(error = %e, "simone-mcp failed");
    errlog.log_report(&e);
    Err(e)
}

async fn cmd_serve(config: &Config, project: PathBuf, no_watch: bool) -> Result<()> {
    debug!(?project, no_watch, "cmd_serve: called");
    let server = McpServer::from_config(config, project);
    let (notify_tx, notify_rx) = mpsc::channel(NOTIFICATION_BUFFER);

    if config.watcher.enabled && !no_watch {
        let watcher = TemplateWatcher::new(
            config.watcher.clone(),
            server.paths(),
            server.engine(),
            notify_tx.clone(),
            server.errlog().clone(),
        );
        let errlog = server.errlog().clone();
        tokio::spawn(async move {
            if let Err(e) = watcher.run().await {
                warn!(error = %e, "Template watcher stopped");
                errlog.log_report(&e);
            }
        });
    } else {
        info!("Template hot-reload disabled");
    }
    drop(notify_tx);

    server
        .serve(tokio::io::stdin(), tokio::io::stdout(), notify_rx)
        .await
        .context("MCP server failed")
}

fn cmd_prompts(config: &Config, project: PathBuf, format: OutputFormat) -> Result<()> {
    debug!(?project, %format, "cmd_prompts: called");
    let server = McpServer::from_config(config, project);
    let prompts: Vec<PromptInfo> = server
        .prompts()
        .list_available_prompts()
        .iter()
        .map(PromptInfo::from)
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&prompts)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&prompts)?),
        OutputFormat::Text => {
            for prompt in &prompts {
                println!("{}", prompt.name.bold());
                if !prompt.description.is_empty() {
                    println!("  {}", prompt.description);
                }
                for argument in &prompt.arguments {
                    let marker = if argument.required { "*".red() } else { " ".normal() };
                    println!("  {}{:<14} {}", marker, argument.name.yellow(), argument.description.dimmed());
                }
            }
        }
    }
    Ok(())
}

fn cmd_render(config: &Config, project: PathBuf, name: &str, args: Vec<(String, String)>) -> Result<()> {
    debug!(?project, %name, "cmd_render: called");
    let server = McpServer::from_config(config, project);
    let args: Map<String, Value> = args.into_iter().map(|(k, v)| (k, Value::String(v))).collect();

    for message in server.prompts().get_prompt_messages(name, &args) {
        println!("{}", message.text());
    }
    Ok(())
}

fn cmd_contexts(config: &Config, project: PathBuf, format: OutputFormat) -> Result<()> {
    debug!(?project, %format, "cmd_contexts: called");
    let loader = ConfigLoader::new(config.paths.for_project(project));
    if let Some(e) = loader.load_error() {
        eyre::bail!("Invalid project configuration: {}", e);
    }
    if !loader.has_config() {
        println!("No project configuration found in {}", loader.paths().simone_dir().display());
        return Ok(());
    }

    let contexts = loader.resolved_contexts();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&contexts)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&contexts)?),
        OutputFormat::Text => contexts.iter().for_each(print_context),
    }
    Ok(())
}

fn print_context(context: &ResolvedContext) {
    println!("{} {}", context.name().bold(), context.context.path.dimmed());
    if let Some(github) = &context.resolved_github {
        println!("  {:<10} {}", "github", github.repository);
    }
    for (name, feature) in &context.resolved_tooling {
        let state = if feature.is_enabled() { "on".green() } else { "off".red() };
        let command = feature.command.as_deref().unwrap_or("");
        println!("  {:<10} {:<4} {}", name, state, command);
    }
    let methodology = &context.resolved_methodology;
    let named = [
        ("development", &methodology.development),
        ("architecture", &methodology.architecture),
        ("workflow", &methodology.workflow),
    ];
    for (key, value) in named {
        if let Some(value) = value {
            println!("  {:<10} {}", key, value);
        }
    }
}

fn cmd_activity(config: &Config, project: &Path, limit: usize, format: OutputFormat) -> Result<()> {
    debug!(?project, limit, %format, "cmd_activity: called");
    let paths = config.paths.for_project(project);
    let records = ActivityLogger::new(paths.activity_log_file()).recent(limit)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&records)?),
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No activity logged yet");
            }
            for record in &records {
                let status = if record.success { "ok".green() } else { "failed".red() };
                println!(
                    "{} {:<14} {:<7} {}",
                    record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
                    record.activity_type.cyan(),
                    status,
                    record.activity
                );
            }
        }
    }
    Ok(())
}
