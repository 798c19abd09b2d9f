//! Engine configuration
//!
//! A JSON file with every key optional:
//!
//! ```json
//! {
//!   "schema_dir": "./schemas",
//!   "stop_on_first_error": false,
//!   "xss_policy": "strip",
//!   "run_transforms": true,
//!   "log_level": "info"
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cli::{CliError, CliResult};
use crate::observability::{log_event_with_fields, Event, Logger, Severity};
use crate::validate::{ValidateOptions, XssPolicy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Directory scanned for schema files by `check --schema-id`
    #[serde(default = "default_schema_dir")]
    pub schema_dir: PathBuf,

    #[serde(default)]
    pub stop_on_first_error: bool,

    #[serde(default)]
    pub xss_policy: XssPolicy,

    #[serde(default = "default_run_transforms")]
    pub run_transforms: bool,

    #[serde(default = "default_log_level")]
    pub log_level: Severity,
}

fn default_schema_dir() -> PathBuf {
    PathBuf::from("./schemas")
}

fn default_run_transforms() -> bool {
    true
}

fn default_log_level() -> Severity {
    Severity::Info
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schema_dir: default_schema_dir(),
            stop_on_first_error: false,
            xss_policy: XssPolicy::default(),
            run_transforms: default_run_transforms(),
            log_level: default_log_level(),
        }
    }
}

impl EngineConfig {
    /// Loads and validates configuration from a file.
    ///
    /// Failures are logged as `CONFIG_INVALID`.
    pub fn load(path: &Path) -> CliResult<Self> {
        let source = path.display().to_string();
        let loaded = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))
            .and_then(|content| Self::parse(&content));
        let config = match loaded {
            Ok(config) => config,
            Err(e) => {
                log_event_with_fields(
                    Event::ConfigInvalid,
                    &[("error", e.message()), ("path", source.as_str())],
                );
                return Err(e);
            }
        };

        log_event_with_fields(
            Event::ConfigLoaded,
            &[("path", source.as_str()), ("xss_policy", config.xss_policy_name())],
        );
        Ok(config)
    }

    /// Parses and validates configuration JSON.
    pub fn parse(content: &str) -> CliResult<Self> {
        let config: EngineConfig = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CliResult<()> {
        if self.schema_dir.as_os_str().is_empty() {
            return Err(CliError::config_error("schema_dir must not be empty"));
        }
        if self.log_level == Severity::Fatal {
            return Err(CliError::config_error(
                "log_level 'fatal' would hide rejected documents and config errors",
            ));
        }
        Ok(())
    }

    /// Validation options described by this configuration.
    pub fn to_options(&self) -> ValidateOptions {
        ValidateOptions {
            stop_on_first_error: self.stop_on_first_error,
            xss_policy: self.xss_policy,
            run_transforms: self.run_transforms,
        }
    }

    /// Applies the configured log level to the process logger.
    pub fn apply_logging(&self) {
        Logger::set_min_severity(self.log_level);
    }

    fn xss_policy_name(&self) -> &'static str {
        match self.xss_policy {
            XssPolicy::Strip => "strip",
            XssPolicy::Reject => "reject",
        }
    }
}
