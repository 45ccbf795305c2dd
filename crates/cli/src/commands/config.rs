use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use shopkit_core::attribution::AttributionPolicy;
use shopkit_core::config::{AppConfig, LoadOptions};
use toml::Value;

/// Renders effective settings, each with the layer it came from.
pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let schedules_path = config
        .catalog
        .schedules_path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unset>".to_string());
    let week_starts_on = format!("{:?}", config.subscriptions.week_starts_on).to_ascii_lowercase();

    let lines = [
        "effective config (source precedence: env > file > default):".to_string(),
        render_line(
            "attribution.model",
            config.attribution.model.name(),
            source("attribution.model", &["SHOPKIT_ATTRIBUTION_MODEL"]),
        ),
        render_line(
            "subscriptions.week_starts_on",
            &week_starts_on,
            source("subscriptions.week_starts_on", &["SHOPKIT_SUBSCRIPTIONS_WEEK_STARTS_ON"]),
        ),
        render_line(
            "catalog.schedules_path",
            &schedules_path,
            source("catalog.schedules_path", &["SHOPKIT_CATALOG_SCHEDULES_PATH"]),
        ),
        render_line(
            "catalog.default_channel",
            &config.catalog.default_channel,
            source("catalog.default_channel", &["SHOPKIT_CATALOG_DEFAULT_CHANNEL"]),
        ),
        render_line(
            "logging.level",
            &config.logging.level,
            source("logging.level", &["SHOPKIT_LOGGING_LEVEL", "SHOPKIT_LOG_LEVEL"]),
        ),
        render_line(
            "logging.format",
            &format!("{:?}", config.logging.format).to_ascii_lowercase(),
            source("logging.format", &["SHOPKIT_LOGGING_FORMAT", "SHOPKIT_LOG_FORMAT"]),
        ),
    ];

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("shopkit.toml"), PathBuf::from("config/shopkit.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
