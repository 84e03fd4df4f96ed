//! Startup configuration loading for chatrelay.
//!
//! Two inputs are read from disk before the server binds:
//! the optional TOML tunables file deserialized into [`ServiceConfig`], and
//! the system instruction text handed to every generation call.

use std::path::Path;

use chatrelay_types::config::ServiceConfig;
use chatrelay_types::error::ConfigError;

/// Load pipeline tunables from an optional TOML file.
///
/// - `None` or a missing file returns [`ServiceConfig::default()`].
/// - A file that cannot be read, parsed, or validated logs a warning and
///   returns the default.
pub async fn load_service_config(path: Option<&Path>) -> ServiceConfig {
    let Some(path) = path else {
        return ServiceConfig::default();
    };

    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return ServiceConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return ServiceConfig::default();
        }
    };

    let config = match toml::from_str::<ServiceConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            return ServiceConfig::default();
        }
    };

    if let Err(err) = config.validate() {
        tracing::warn!("Rejected {}: {err}, using defaults", path.display());
        return ServiceConfig::default();
    }

    config
}

/// Read the system instruction file.
///
/// The text is used verbatim. A missing or unreadable file is fatal.
pub async fn load_instruction(path: &Path) -> Result<String, ConfigError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::InstructionFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    if text.trim().is_empty() {
        tracing::warn!("Instruction file {} is empty", path.display());
    }

    Ok(text)
}
