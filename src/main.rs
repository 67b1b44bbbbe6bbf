mod cli;
mod config;
mod error;
mod llm;
mod orchestrator;
mod prompt;
mod retry;
mod sonar;
mod source;
#[cfg(test)]
mod testing;
mod types;

use clap::Parser;
use cli::{Cli, Commands, FixArgs, InitArgs};
use config::{Config, Settings};
use llm::ChatClient;
use orchestrator::Fixer;
use sonar::SonarClient;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

const EXIT_FAILURE: i32 = 1;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cli.log_level))
        .init();

    match cli.command {
        Some(Commands::Init(args)) => init(&args),
        None => {
            let settings = load_settings(cli.fix).unwrap_or_else(|e| {
                error!("Failed to load config: {:#}", e);
                std::process::exit(EXIT_FAILURE);
            });
            if let Err(e) = run(settings).await {
                error!("{:#}", e);
                std::process::exit(EXIT_FAILURE);
            }
        }
    }
}

fn init(args: &InitArgs) {
    if Path::new(&args.config).exists() && !args.r#override {
        error!(
            "Config file already exists: {} (use --override to replace it)",
            args.config
        );
        std::process::exit(EXIT_FAILURE);
    }

    let content = Config::default().to_toml().unwrap_or_else(|e| {
        error!("Failed to render default config: {}", e);
        std::process::exit(EXIT_FAILURE);
    });

    if let Err(e) = std::fs::write(&args.config, content) {
        error!("Failed to write config file: {}", e);
        std::process::exit(EXIT_FAILURE);
    }
    info!("Config written to {}", args.config);
}

fn load_settings(args: FixArgs) -> anyhow::Result<Settings> {
    let config = Config::load(&args.config, &args.config_overrides)?;
    Ok(Settings {
        config,
        sonar_token: args.sonar_token,
        llm_api_key: args.llm_api_key,
        source_root: PathBuf::from(args.source_root),
        dry_run: args.dry_run,
    })
}

/// Run one fix pass; partial failures are logged, not returned
async fn run(settings: Settings) -> anyhow::Result<()> {
    let config = &settings.config;
    debug!("sonar base_url: {}", config.sonar.base_url);
    debug!("project_key: {}", config.sonar.project_key);
    debug!("llm base_url: {}", config.llm.base_url);
    debug!("model: {}", config.llm.model);

    let sonar = SonarClient::new(&config.sonar, &settings.sonar_token, config.retry.clone());
    let chat = ChatClient::new(&config.llm, &settings.llm_api_key, config.retry.clone())?;

    let summary = Fixer::new(sonar, chat, settings.source_root, settings.dry_run)
        .run()
        .await;
    info!("Fix pass complete: {}", summary);
    Ok(())
}
