use std::env;
use std::fs;
use std::path::Path;

use homesearch_core::config::{env_sources, resolve_config_path, AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

use crate::commands::sign::redact_token;
use crate::commands::{load_config, CommandResult};

const COMMAND: &str = "config";

const KEYS: &[&str] = &[
    "api.base_url",
    "api.token",
    "api.secret_key",
    "api.test_mode",
    "api.app_version",
    "api.api_version",
    "api.timeout_secs",
    "api.listings_path",
    "api.sold_path",
    "api.detail_path",
    "api.quick_search_path",
    "api.agent_search_path",
    "lookup.community_url",
    "lookup.school_url",
    "lookup.user_agent",
    "lookup.timeout_secs",
    "search.page_size",
    "search.site_base_url",
    "llm.provider",
    "llm.api_key",
    "llm.base_url",
    "llm.model",
    "llm.temperature",
    "llm.timeout_secs",
    "logging.level",
    "logging.format",
];

pub fn run(options: LoadOptions) -> CommandResult {
    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config = match load_config(COMMAND, options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines =
        vec!["effective config (source precedence: overrides > env > file > default):".to_string()];
    for key in KEYS {
        let source = field_source(key, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key, &display_value(&config, key), source));
    }

    CommandResult::success(COMMAND, lines.join("\n"))
}

fn display_value(config: &AppConfig, key: &str) -> String {
    match key {
        "api.base_url" => config.api.base_url.clone(),
        "api.token" => redact_token(config.api.token.expose_secret()),
        "api.secret_key" => redact_token(config.api.secret_key.expose_secret()),
        "api.test_mode" => config.api.test_mode.clone(),
        "api.app_version" => config.api.app_version.clone(),
        "api.api_version" => config.api.api_version.clone(),
        "api.timeout_secs" => config.api.timeout_secs.to_string(),
        "api.listings_path" => config.api.listings_path.clone(),
        "api.sold_path" => config.api.sold_path.clone(),
        "api.detail_path" => config.api.detail_path.clone(),
        "api.quick_search_path" => config.api.quick_search_path.clone(),
        "api.agent_search_path" => config.api.agent_search_path.clone(),
        "lookup.community_url" => config.lookup.community_url.clone(),
        "lookup.school_url" => config.lookup.school_url.clone(),
        "lookup.user_agent" => config.lookup.user_agent.clone(),
        "lookup.timeout_secs" => config.lookup.timeout_secs.to_string(),
        "search.page_size" => config.search.page_size.to_string(),
        "search.site_base_url" => config.search.site_base_url.clone(),
        "llm.provider" => format!("{:?}", config.llm.provider),
        "llm.api_key" => match &config.llm.api_key {
            Some(key) => redact_token(key.expose_secret()),
            None => "<unset>".to_string(),
        },
        "llm.base_url" => config.llm.effective_base_url(),
        "llm.model" => config.llm.model.clone(),
        "llm.temperature" => config.llm.temperature.to_string(),
        "llm.timeout_secs" => config.llm.timeout_secs.to_string(),
        "logging.level" => config.logging.level.clone(),
        "logging.format" => format!("{:?}", config.logging.format),
        _ => "<unknown>".to_string(),
    }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let from_env = env_sources(key_path)
        .iter()
        .find(|var| env::var(var).is_ok_and(|value| !value.trim().is_empty()));
    if let Some(env_key) = from_env {
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

#[cfg(test)]
mod tests {
    use super::contains_path;

    #[test]
    fn dotted_paths_walk_nested_tables() {
        let doc: toml::Value = "[api]\nbase_url = \"https://x\"\n".parse().expect("toml");
        assert!(contains_path(&doc, "api.base_url"));
        assert!(!contains_path(&doc, "api.token"));
        assert!(!contains_path(&doc, "llm.model"));
    }
}
