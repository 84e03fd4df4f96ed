//! CLI definitions for the `chatrelay` binary.
//!
//! Every serve-time setting can come from a flag or its environment
//! variable, so the relay runs unchanged under a process manager that only
//! sets env.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use secrecy::SecretString;

use chatrelay_infra::store::pool::{MySqlSettings, StoreTarget};
use chatrelay_observe::tracing_setup::LogFormat;
use chatrelay_types::config::ServiceConfig;

/// HTTP relay between a chat page and a Gemini model.
#[derive(Parser)]
#[command(name = "chatrelay", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// More log output (-v debug for chatrelay crates, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans to stdout through OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    /// Log line format.
    #[arg(long, value_enum, default_value = "text", env = "CHATRELAY_LOG_FORMAT", global = true)]
    pub log_format: LogFormatArg,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server.
    Serve(ServeArgs),

    /// Create the chats table and exit.
    InitDb(StoreArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on.
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Host to bind to.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Gemini API key.
    #[arg(long, env = "GENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model identifier (overrides the config file).
    #[arg(long, env = "GENAI_MODEL")]
    pub model: Option<String>,

    /// File holding the system instruction sent with every request.
    #[arg(long, env = "INSTRUCTION_PATH", default_value = "instructions.txt")]
    pub instruction_file: PathBuf,

    /// Upper bound on one model call, in seconds (overrides the config file).
    #[arg(long, env = "GENERATION_TIMEOUT_SECS")]
    pub generation_timeout_secs: Option<u64>,

    /// Forget sessions idle this long, in seconds (overrides the config file).
    #[arg(long, env = "SESSION_IDLE_SECS")]
    pub session_idle_secs: Option<u64>,

    /// Directory holding `index.html` and static assets.
    #[arg(long, env = "CHATRELAY_WEB_DIR", default_value = "static")]
    pub web_dir: PathBuf,

    /// Optional TOML file with pipeline tunables.
    #[arg(long, env = "CHATRELAY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub store: StoreArgs,
}

impl ServeArgs {
    /// Apply flag/env overrides on top of file-loaded tunables.
    pub fn apply_overrides(&self, config: &mut ServiceConfig) {
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(secs) = self.generation_timeout_secs {
            config.generation_timeout_secs = secs;
        }
        if let Some(secs) = self.session_idle_secs {
            config.session_idle_secs = Some(secs);
        }
    }
}

#[derive(Debug, Args)]
pub struct StoreArgs {
    #[arg(long, env = "MYSQL_HOST", default_value = "localhost")]
    pub mysql_host: String,

    #[arg(long, env = "MYSQL_USER", default_value = "root")]
    pub mysql_user: String,

    #[arg(long, env = "MYSQL_PASSWORD", default_value = "", hide_env_values = true)]
    pub mysql_password: String,

    #[arg(long, env = "MYSQL_DATABASE", default_value = "chatbot")]
    pub mysql_database: String,

    #[arg(long, env = "MYSQL_PORT", default_value_t = 3306)]
    pub mysql_port: u16,

    /// Full store URL (`mysql://` or `sqlite://`); overrides the MySQL flags.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,
}

impl StoreArgs {
    pub fn target(&self) -> StoreTarget {
        match &self.database_url {
            Some(url) => StoreTarget::Url(url.clone()),
            None => StoreTarget::MySql(MySqlSettings {
                host: self.mysql_host.clone(),
                user: self.mysql_user.clone(),
                password: SecretString::from(self.mysql_password.clone()),
                database: self.mysql_database.clone(),
                port: self.mysql_port,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_overrides() {
        let cli = Cli::try_parse_from([
            "chatrelay",
            "serve",
            "--port",
            "8080",
            "--api-key",
            "k",
            "--model",
            "gemini-1.5-pro",
            "--session-idle-secs",
            "600",
        ])
        .unwrap();
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.port, 8080);
        assert_eq!(args.api_key.as_deref(), Some("k"));

        let mut config = ServiceConfig::default();
        args.apply_overrides(&mut config);
        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.session_idle_secs, Some(600));
        assert_eq!(config.generation_timeout_secs, 60);
    }

    #[test]
    fn test_database_url_overrides_mysql_parts() {
        let cli = Cli::try_parse_from([
            "chatrelay",
            "init-db",
            "--database-url",
            "sqlite://chat.db",
        ])
        .unwrap();
        let Commands::InitDb(store) = cli.command else {
            panic!("expected init-db");
        };
        assert!(matches!(store.target(), StoreTarget::Url(url) if url == "sqlite://chat.db"));
    }

    #[test]
    fn test_mysql_target_from_flags() {
        let cli = Cli::try_parse_from([
            "chatrelay",
            "init-db",
            "--mysql-host",
            "db",
            "--mysql-port",
            "3307",
        ])
        .unwrap();
        let Commands::InitDb(store) = cli.command else {
            panic!("expected init-db");
        };
        if store.database_url.is_some() {
            // DATABASE_URL set in the environment takes precedence.
            return;
        }
        assert_eq!(
            store.target().describe(),
            format!("mysql://{}@db:3307/{}", store.mysql_user, store.mysql_database)
        );
    }

    #[test]
    fn test_log_format_maps() {
        assert_eq!(LogFormat::from(LogFormatArg::Json), LogFormat::Json);
        assert_eq!(LogFormat::from(LogFormatArg::Text), LogFormat::Text);
    }
}
