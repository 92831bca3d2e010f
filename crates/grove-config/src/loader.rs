//! Layered configuration loading.

use std::env;
use std::fs;
use std::path::Path;

use crate::{ConfigError, GroveConfig, LogFormat};

/// Builds a [`GroveConfig`] from layers, later layers winning:
///
/// 1. defaults or a preset
/// 2. a TOML or JSON document (file or string), which replaces the previous layer
/// 3. environment variables of the form `PREFIX__SECTION__KEY`
///
/// # Example
///
/// ```no_run
/// use grove_config::ConfigLoader;
///
/// # fn main() -> Result<(), grove_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("grove.toml")?
///     .with_dotenv()
///     .with_env_prefix("GROVE")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: GroveConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Starts from [`GroveConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: GroveConfig::default(),
            env_prefix: None,
        }
    }

    /// Resets the base layer to the defaults.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = GroveConfig::default();
        self
    }

    /// Uses [`GroveConfig::development`] as the base layer.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = GroveConfig::development();
        self
    }

    /// Uses [`GroveConfig::production`] as the base layer.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = GroveConfig::production();
        self
    }

    /// Loads a `.toml` or `.json` file.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing or unreadable, has another extension, or
    /// does not parse (unknown keys included).
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;
        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        self.config = parse(&content, &format)?;
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    ///
    /// # Errors
    ///
    /// Fails if the file exists and cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads a document held in memory. `format` is `"toml"` or `"json"`.
    ///
    /// # Errors
    ///
    /// Fails on an unknown format or a document that does not parse.
    ///
    /// # Example
    ///
    /// ```
    /// use grove_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[router]\nprefix = \"/api\"\n", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.router.prefix, "/api");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, &format.to_lowercase())?;
        Ok(self)
    }

    /// Reads overrides from `PREFIX__SECTION__KEY` variables when loading.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Loads a `.env` file into the process environment, if one exists.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        // A missing `.env` is not an error.
        let _ = dotenvy::dotenv();
        self
    }

    /// Applies environment overrides and validates.
    ///
    /// # Errors
    ///
    /// Fails if an override does not parse or the result is invalid.
    pub fn load(self) -> Result<GroveConfig, ConfigError> {
        let config = self.load_unvalidated()?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment overrides without validating.
    ///
    /// # Errors
    ///
    /// Fails if an override does not parse.
    pub fn load_unvalidated(mut self) -> Result<GroveConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let marker = format!("{prefix}__");
            let mut vars: Vec<(String, String)> =
                env::vars().filter(|(k, _)| k.starts_with(&marker)).collect();
            vars.sort();
            for (key, value) in vars {
                apply_env_var(&mut self.config, &key, &key[marker.len()..], &value)?;
            }
        }
        Ok(self.config)
    }
}

fn parse(content: &str, format: &str) -> Result<GroveConfig, ConfigError> {
    match format {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

fn apply_env_var(
    config: &mut GroveConfig,
    var: &str,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    let parts: Vec<&str> = key.split("__").collect();

    match parts.as_slice() {
        ["SERVER", "HTTP_ADDR"] => config.server.http_addr = value.to_string(),
        ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
            config.server.shutdown_timeout_secs = parse_int(var, value)?;
        }
        ["SERVER", "REQUEST_TIMEOUT_MS"] => {
            config.server.request_timeout_ms = parse_int(var, value)?;
        }

        ["ROUTER", "PREFIX"] => config.router.prefix = value.to_string(),
        ["ROUTER", "CONTENT_TYPE"] => config.router.content_type = value.to_string(),
        ["ROUTER", "TRAILING_SLASH"] => config.router.trailing_slash = parse_flag(var, value)?,

        ["LOGGING", "ENABLED"] => config.logging.enabled = parse_flag(var, value)?,
        ["LOGGING", "LEVEL"] => config.logging.level = value.to_string(),
        ["LOGGING", "FORMAT"] => {
            config.logging.format = match value.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                _ => return Err(ConfigError::env_parse_error(var, "expected 'json' or 'pretty'")),
            };
        }
        ["LOGGING", "INCLUDE_LOCATION"] => {
            config.logging.include_location = parse_flag(var, value)?;
        }

        ["METRICS", "ENABLED"] => config.metrics.enabled = parse_flag(var, value)?,
        ["METRICS", "ADDR"] => config.metrics.addr = value.to_string(),

        // Unrelated variables sharing the prefix are left alone.
        _ => {}
    }

    Ok(())
}

fn parse_int(var: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::env_parse_error(var, "expected integer"))
}

fn parse_flag(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env_parse_error(var, "expected boolean")),
    }
}
