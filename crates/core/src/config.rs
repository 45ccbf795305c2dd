use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attribution::AttributionModel;
use crate::dates::WeekStart;
use crate::subscription::pricing::PricingSettings;

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub attribution: AttributionConfig,
    pub subscriptions: SubscriptionConfig,
    pub catalog: CatalogConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AttributionConfig {
    pub model: AttributionModel,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubscriptionConfig {
    pub week_starts_on: WeekStart,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CatalogConfig {
    pub schedules_path: Option<PathBuf>,
    pub default_channel: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub attribution_model: Option<AttributionModel>,
    pub week_starts_on: Option<WeekStart>,
    pub schedules_path: Option<PathBuf>,
    pub default_channel: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            attribution: AttributionConfig { model: AttributionModel::Linear },
            subscriptions: SubscriptionConfig { week_starts_on: WeekStart::Monday },
            catalog: CatalogConfig {
                schedules_path: None,
                default_channel: "default-channel".to_string(),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("shopkit.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn pricing_settings(&self) -> PricingSettings {
        PricingSettings { week_start: self.subscriptions.week_starts_on }
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(attribution) = patch.attribution {
            if let Some(model) = attribution.model {
                self.attribution.model = model;
            }
        }

        if let Some(subscriptions) = patch.subscriptions {
            if let Some(week_starts_on) = subscriptions.week_starts_on {
                self.subscriptions.week_starts_on = week_starts_on;
            }
        }

        if let Some(catalog) = patch.catalog {
            if let Some(schedules_path) = catalog.schedules_path {
                self.catalog.schedules_path = Some(schedules_path);
            }
            if let Some(default_channel) = catalog.default_channel {
                self.catalog.default_channel = default_channel;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SHOPKIT_ATTRIBUTION_MODEL") {
            self.attribution.model = value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "SHOPKIT_ATTRIBUTION_MODEL".to_string(),
                value: value.clone(),
            })?;
        }

        if let Some(value) = read_env("SHOPKIT_SUBSCRIPTIONS_WEEK_STARTS_ON") {
            self.subscriptions.week_starts_on =
                value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                    key: "SHOPKIT_SUBSCRIPTIONS_WEEK_STARTS_ON".to_string(),
                    value: value.clone(),
                })?;
        }

        if let Some(value) = read_env("SHOPKIT_CATALOG_SCHEDULES_PATH") {
            self.catalog.schedules_path = Some(PathBuf::from(value));
        }
        if let Some(value) = read_env("SHOPKIT_CATALOG_DEFAULT_CHANNEL") {
            self.catalog.default_channel = value;
        }

        let log_level =
            read_env("SHOPKIT_LOGGING_LEVEL").or_else(|| read_env("SHOPKIT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SHOPKIT_LOGGING_FORMAT").or_else(|| read_env("SHOPKIT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(model) = overrides.attribution_model {
            self.attribution.model = model;
        }
        if let Some(week_starts_on) = overrides.week_starts_on {
            self.subscriptions.week_starts_on = week_starts_on;
        }
        if let Some(schedules_path) = overrides.schedules_path {
            self.catalog.schedules_path = Some(schedules_path);
        }
        if let Some(default_channel) = overrides.default_channel {
            self.catalog.default_channel = default_channel;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_catalog(&self.catalog)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("shopkit.toml"), PathBuf::from("config/shopkit.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if catalog.default_channel.trim().is_empty() {
        return Err(ConfigError::Validation(
            "catalog.default_channel cannot be empty".to_string(),
        ));
    }

    if let Some(path) = &catalog.schedules_path {
        let is_toml = path.extension().map(|ext| ext == "toml").unwrap_or(false);
        if !is_toml {
            return Err(ConfigError::Validation(format!(
                "catalog.schedules_path must point to a .toml file, got `{}`",
                path.display()
            )));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    attribution: Option<AttributionPatch>,
    subscriptions: Option<SubscriptionPatch>,
    catalog: Option<CatalogPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct AttributionPatch {
    model: Option<AttributionModel>,
}

#[derive(Debug, Default, Deserialize)]
struct SubscriptionPatch {
    week_starts_on: Option<WeekStart>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    schedules_path: Option<PathBuf>,
    default_channel: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
