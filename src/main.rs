use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use casegen::chat::{self, Session};
use casegen::cli::{Cli, CliCommand};
use casegen::config::Config;
use casegen::error::{Error, Result};
use casegen::export::{ExportFormat, export};
use casegen::format::{EMPTY_BATCH_MESSAGE, render_markdown};
use casegen::generator::Generator;
use casegen::prompts::PromptEngine;
use casegen::relay::{Relay, UreqUpstream, server};
use casegen::transport::HttpTransport;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

fn build_generator(config: &Config) -> Generator<HttpTransport> {
    Generator::new(
        HttpTransport::new(config.transport.clone()),
        PromptEngine::new(config.prompt_dir.clone(), config.language.clone()),
    )
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("warning: failed to load .env: {e}");
    }
    init_logging();

    info!("casegen starting");

    let config = match Config::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    info!(?config, "config loaded");

    let result = match cli.command {
        CliCommand::Generate {
            requirement,
            export: export_path,
            format,
            ..
        } => run_generate(&config, &requirement, export_path, format.as_deref()).await,
        CliCommand::Chat { .. } => run_chat(&config).await,
        CliCommand::Relay { .. } => run_relay(&config).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run_generate(
    config: &Config,
    requirement: &str,
    export_path: Option<PathBuf>,
    format: Option<&str>,
) -> Result<()> {
    let requirement = requirement.trim();
    if requirement.is_empty() {
        return Err(Error::Prompt("requirement must not be empty".to_string()));
    }
    let export_format = match format {
        Some(f) => Some(ExportFormat::parse(f).ok_or_else(|| {
            Error::ConfigValidation(format!("unknown export format: {f} (expected: text, csv, json)"))
        })?),
        None => None,
    };
    config.require_credentials()?;

    let generator = build_generator(config);
    let records = generator.generate(requirement, &config.categories).await?;

    if records.is_empty() {
        eprintln!("error: {EMPTY_BATCH_MESSAGE}");
        std::process::exit(1);
    }

    println!("{}", render_markdown(&records));

    if let Some(path) = export_path {
        let format = export_format
            .or_else(|| ExportFormat::from_path(&path))
            .unwrap_or_default();
        let written = export(&records, &path, format)?;
        eprintln!("exported {} test cases to {}", records.len(), written.display());
    }
    Ok(())
}

async fn run_chat(config: &Config) -> Result<()> {
    config.require_credentials()?;
    let mut session = Session::new(build_generator(config), config.categories.clone());
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    chat::run(&mut session, stdin, &mut stdout).await
}

async fn run_relay(config: &Config) -> Result<()> {
    if config.relay.api_key.is_none() {
        warn!(
            env = %config.relay.api_key_env,
            "relay API key not set; every request will be rejected with 500"
        );
    }
    let relay = Relay::new(config.relay.clone(), UreqUpstream::new());
    server::serve(relay, &config.bind).await
}
