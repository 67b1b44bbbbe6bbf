use clap::{Parser, Subcommand};

// Display order for token options (placed at top of help text)
const TOKEN_DISPLAY_ORDER: usize = 0;
// Display order for log level option (placed at end of help text)
const LOG_LEVEL_DISPLAY_ORDER: usize = 100;

/// CLI arguments
///
/// Without a subcommand one fix pass runs over all current issues and hotspots.
#[derive(Parser)]
#[command(name = "sonar-autofix", version, about = "Fix Sonar issues and hotspots with an LLM", long_about = None)]
pub struct Cli {
    /// Log level (see https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html)
    /// [env: SONAR_AUTOFIX_LOG=] [default: info]
    #[arg(
        long,
        env = "SONAR_AUTOFIX_LOG",
        default_value = "info",
        global = true,
        hide_default_value = true,
        hide_env = true,
        display_order = LOG_LEVEL_DISPLAY_ORDER,
        verbatim_doc_comment
    )]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub fix: FixArgs,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Write a default sonar-autofix.toml config file
    Init(InitArgs),
}

/// Arguments for the init command
#[derive(Parser)]
pub struct InitArgs {
    /// Path to config file
    #[arg(long, default_value = "sonar-autofix.toml")]
    pub config: String,

    /// Override existing config file
    #[arg(long)]
    pub r#override: bool,
}

/// Arguments for a fix pass
#[derive(Parser, Debug)]
pub struct FixArgs {
    /// Path to config file (initialize with `sonar-autofix init`)
    #[arg(long, default_value = "sonar-autofix.toml")]
    pub config: String,

    /// Override config values using dot notation (e.g. llm.model=gpt-4)
    #[arg(long = "config-override")]
    pub config_overrides: Vec<String>,

    /// Sonar access token, sent as the Basic auth username
    #[arg(
        long,
        env = "SONAR_TOKEN",
        default_value = "",
        hide_default_value = true,
        hide_env_values = true,
        display_order = TOKEN_DISPLAY_ORDER
    )]
    pub sonar_token: String,

    /// LLM API key, sent as a bearer token
    #[arg(
        long,
        env = "GITHUB_TOKEN",
        default_value = "",
        hide_default_value = true,
        hide_env_values = true,
        display_order = TOKEN_DISPLAY_ORDER
    )]
    pub llm_api_key: String,

    /// Directory that finding paths are resolved against
    #[arg(long, default_value = "./")]
    pub source_root: String,

    /// Dry run: build prompts without calling the model or writing files
    #[arg(long)]
    pub dry_run: bool,
}
