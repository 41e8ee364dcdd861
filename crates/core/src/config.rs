use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::request::EndpointPaths;
use crate::search::DEFAULT_PAGE_SIZE;

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["homesearch.toml", "config/homesearch.toml"];

/// Browser user agent sent on community and school lookups.
pub const DEFAULT_LOOKUP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub lookup: LookupConfig,
    pub search: SearchConfig,
    pub llm: LlmConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: SecretString,
    pub secret_key: SecretString,
    pub test_mode: String,
    pub app_version: String,
    pub api_version: String,
    pub timeout_secs: u64,
    pub listings_path: String,
    pub sold_path: String,
    pub detail_path: String,
    pub quick_search_path: String,
    pub agent_search_path: String,
}

#[derive(Clone, Debug)]
pub struct LookupConfig {
    pub community_url: String,
    pub school_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub page_size: u32,
    pub site_base_url: String,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    #[serde(rename = "openai")]
    OpenAi,
    Ollama,
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
    pub api_base_url: Option<String>,
    pub api_test_mode: Option<String>,
    pub page_size: Option<u32>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
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

/// Environment variables read for each config key, in lookup order. The
/// unprefixed names are the ones older deployments exported.
pub const ENV_SOURCES: &[(&str, &[&str])] = &[
    ("api.base_url", &["HOMESEARCH_API_BASE_URL", "V1_URL"]),
    ("api.token", &["HOMESEARCH_API_TOKEN", "HAR_TOKEN"]),
    ("api.secret_key", &["HOMESEARCH_API_SECRET_KEY", "HAR_SECRET_KEY"]),
    ("api.test_mode", &["HOMESEARCH_API_TEST_MODE", "TEST_MODE"]),
    ("api.timeout_secs", &["HOMESEARCH_API_TIMEOUT_SECS"]),
    ("lookup.community_url", &["HOMESEARCH_LOOKUP_COMMUNITY_URL"]),
    ("lookup.school_url", &["HOMESEARCH_LOOKUP_SCHOOL_URL"]),
    ("lookup.user_agent", &["HOMESEARCH_LOOKUP_USER_AGENT"]),
    ("lookup.timeout_secs", &["HOMESEARCH_LOOKUP_TIMEOUT_SECS"]),
    ("search.page_size", &["HOMESEARCH_SEARCH_PAGE_SIZE"]),
    ("search.site_base_url", &["HOMESEARCH_SEARCH_SITE_BASE_URL"]),
    ("llm.provider", &["HOMESEARCH_LLM_PROVIDER"]),
    ("llm.api_key", &["HOMESEARCH_LLM_API_KEY", "OPENAI_API_KEY"]),
    ("llm.base_url", &["HOMESEARCH_LLM_BASE_URL"]),
    ("llm.model", &["HOMESEARCH_LLM_MODEL"]),
    ("llm.temperature", &["HOMESEARCH_LLM_TEMPERATURE"]),
    ("llm.timeout_secs", &["HOMESEARCH_LLM_TIMEOUT_SECS"]),
    ("logging.level", &["HOMESEARCH_LOGGING_LEVEL", "HOMESEARCH_LOG_LEVEL"]),
    ("logging.format", &["HOMESEARCH_LOGGING_FORMAT", "HOMESEARCH_LOG_FORMAT"]),
];

pub fn env_sources(key_path: &str) -> &'static [&'static str] {
    ENV_SOURCES.iter().find(|(key, _)| *key == key_path).map(|(_, vars)| *vars).unwrap_or(&[])
}

impl Default for AppConfig {
    fn default() -> Self {
        let paths = EndpointPaths::default();
        Self {
            api: ApiConfig {
                base_url: String::new(),
                token: String::new().into(),
                secret_key: String::new().into(),
                test_mode: "0".to_string(),
                app_version: "4.0.0".to_string(),
                api_version: "9".to_string(),
                timeout_secs: 30,
                listings_path: paths.listings,
                sold_path: paths.sold,
                detail_path: paths.detail,
                quick_search_path: paths.quick_search,
                agent_search_path: paths.agent_search,
            },
            lookup: LookupConfig {
                community_url: "http://har.com/api/typeapp/mpcfinder".to_string(),
                school_url: "https://har.com/api/typeapp/schoolsearchfilter".to_string(),
                user_agent: DEFAULT_LOOKUP_USER_AGENT.to_string(),
                timeout_secs: 15,
            },
            search: SearchConfig {
                page_size: DEFAULT_PAGE_SIZE,
                site_base_url: "https://www.har.com".to_string(),
            },
            llm: LlmConfig {
                provider: LlmProvider::OpenAi,
                api_key: None,
                base_url: None,
                model: "gpt-4o".to_string(),
                temperature: 0.0,
                timeout_secs: 60,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl ApiConfig {
    pub fn endpoint_paths(&self) -> EndpointPaths {
        EndpointPaths {
            listings: self.listings_path.clone(),
            sold: self.sold_path.clone(),
            detail: self.detail_path.clone(),
            quick_search: self.quick_search_path.clone(),
            agent_search: self.agent_search_path.clone(),
        }
    }
}

impl LlmConfig {
    /// Chat-completions base URL, falling back to the provider's usual host.
    pub fn effective_base_url(&self) -> String {
        match (&self.base_url, self.provider) {
            (Some(url), _) if !url.trim().is_empty() => url.trim_end_matches('/').to_string(),
            (_, LlmProvider::OpenAi) => "https://api.openai.com/v1".to_string(),
            (_, LlmProvider::Ollama) => "http://localhost:11434/v1".to_string(),
        }
    }

    /// The key is only needed once a model is actually called, so searches
    /// without the assistant work without one.
    pub fn require_api_key(&self) -> Result<Option<&str>, ConfigError> {
        let key = self.api_key.as_ref().map(|value| value.expose_secret().trim());
        match (self.provider, key) {
            (LlmProvider::OpenAi, None | Some("")) => Err(ConfigError::Validation(
                "llm.api_key is required for the openai provider (set HOMESEARCH_LLM_API_KEY or OPENAI_API_KEY)"
                    .to_string(),
            )),
            (_, Some(key)) if !key.is_empty() => Ok(Some(key)),
            _ => Ok(None),
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected openai|ollama)"
            ))),
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
            let expected = options
                .config_path
                .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(api) = patch.api {
            if let Some(base_url) = api.base_url {
                self.api.base_url = base_url;
            }
            if let Some(api_token_value) = api.token {
                self.api.token = secret_value(api_token_value);
            }
            if let Some(api_secret_value) = api.secret_key {
                self.api.secret_key = secret_value(api_secret_value);
            }
            if let Some(test_mode) = api.test_mode {
                self.api.test_mode = test_mode.into_header_value();
            }
            if let Some(app_version) = api.app_version {
                self.api.app_version = app_version;
            }
            if let Some(api_version) = api.api_version {
                self.api.api_version = api_version;
            }
            if let Some(timeout_secs) = api.timeout_secs {
                self.api.timeout_secs = timeout_secs;
            }
            if let Some(path) = api.listings_path {
                self.api.listings_path = path;
            }
            if let Some(path) = api.sold_path {
                self.api.sold_path = path;
            }
            if let Some(path) = api.detail_path {
                self.api.detail_path = path;
            }
            if let Some(path) = api.quick_search_path {
                self.api.quick_search_path = path;
            }
            if let Some(path) = api.agent_search_path {
                self.api.agent_search_path = path;
            }
        }

        if let Some(lookup) = patch.lookup {
            if let Some(community_url) = lookup.community_url {
                self.lookup.community_url = community_url;
            }
            if let Some(school_url) = lookup.school_url {
                self.lookup.school_url = school_url;
            }
            if let Some(user_agent) = lookup.user_agent {
                self.lookup.user_agent = user_agent;
            }
            if let Some(timeout_secs) = lookup.timeout_secs {
                self.lookup.timeout_secs = timeout_secs;
            }
        }

        if let Some(search) = patch.search {
            if let Some(page_size) = search.page_size {
                self.search.page_size = page_size;
            }
            if let Some(site_base_url) = search.site_base_url {
                self.search.site_base_url = site_base_url;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(temperature) = llm.temperature {
                self.llm.temperature = temperature;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
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
        if let Some(value) = read_env_key("api.base_url") {
            self.api.base_url = value;
        }
        if let Some(value) = read_env_key("api.token") {
            self.api.token = secret_value(value);
        }
        if let Some(value) = read_env_key("api.secret_key") {
            self.api.secret_key = secret_value(value);
        }
        if let Some(value) = read_env_key("api.test_mode") {
            self.api.test_mode = value;
        }
        if let Some(value) = read_env_key("api.timeout_secs") {
            self.api.timeout_secs = parse_u64("HOMESEARCH_API_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env_key("lookup.community_url") {
            self.lookup.community_url = value;
        }
        if let Some(value) = read_env_key("lookup.school_url") {
            self.lookup.school_url = value;
        }
        if let Some(value) = read_env_key("lookup.user_agent") {
            self.lookup.user_agent = value;
        }
        if let Some(value) = read_env_key("lookup.timeout_secs") {
            self.lookup.timeout_secs = parse_u64("HOMESEARCH_LOOKUP_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env_key("search.page_size") {
            self.search.page_size = parse_u32("HOMESEARCH_SEARCH_PAGE_SIZE", &value)?;
        }
        if let Some(value) = read_env_key("search.site_base_url") {
            self.search.site_base_url = value;
        }

        if let Some(value) = read_env_key("llm.provider") {
            self.llm.provider = value.parse()?;
        }
        if let Some(value) = read_env_key("llm.api_key") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env_key("llm.base_url") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env_key("llm.model") {
            self.llm.model = value;
        }
        if let Some(value) = read_env_key("llm.temperature") {
            self.llm.temperature = parse_f32("HOMESEARCH_LLM_TEMPERATURE", &value)?;
        }
        if let Some(value) = read_env_key("llm.timeout_secs") {
            self.llm.timeout_secs = parse_u64("HOMESEARCH_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env_key("logging.level") {
            self.logging.level = value;
        }
        if let Some(value) = read_env_key("logging.format") {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.api_base_url {
            self.api.base_url = base_url;
        }
        if let Some(test_mode) = overrides.api_test_mode {
            self.api.test_mode = test_mode;
        }
        if let Some(page_size) = overrides.page_size {
            self.search.page_size = page_size;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(llm_provider) = overrides.llm_provider {
            self.llm.provider = llm_provider;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_api(&self.api)?;
        validate_lookup(&self.lookup)?;
        validate_search(&self.search)?;
        validate_llm(&self.llm)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// The config file `load` would read: the explicit path if it exists, else the first
/// existing candidate.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
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

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn validate_api(api: &ApiConfig) -> Result<(), ConfigError> {
    let base_url = api.base_url.trim();
    if base_url.is_empty() {
        return Err(ConfigError::Validation(
            "api.base_url is required (set HOMESEARCH_API_BASE_URL or V1_URL)".to_string(),
        ));
    }
    if !is_http_url(base_url) {
        return Err(ConfigError::Validation(
            "api.base_url must start with http:// or https://".to_string(),
        ));
    }

    if api.token.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "api.token is required (set HOMESEARCH_API_TOKEN or HAR_TOKEN)".to_string(),
        ));
    }
    if api.secret_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "api.secret_key is required (set HOMESEARCH_API_SECRET_KEY or HAR_SECRET_KEY)"
                .to_string(),
        ));
    }

    if api.timeout_secs == 0 || api.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "api.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    let paths = [
        ("api.listings_path", &api.listings_path),
        ("api.sold_path", &api.sold_path),
        ("api.detail_path", &api.detail_path),
        ("api.quick_search_path", &api.quick_search_path),
        ("api.agent_search_path", &api.agent_search_path),
    ];
    for (key, path) in paths {
        if !path.starts_with('/') {
            return Err(ConfigError::Validation(format!("{key} must start with `/`")));
        }
    }
    if !api.detail_path.contains("{id}") {
        return Err(ConfigError::Validation(
            "api.detail_path must contain the `{id}` placeholder".to_string(),
        ));
    }

    Ok(())
}

fn validate_lookup(lookup: &LookupConfig) -> Result<(), ConfigError> {
    if !is_http_url(&lookup.community_url) {
        return Err(ConfigError::Validation(
            "lookup.community_url must start with http:// or https://".to_string(),
        ));
    }
    if !is_http_url(&lookup.school_url) {
        return Err(ConfigError::Validation(
            "lookup.school_url must start with http:// or https://".to_string(),
        ));
    }
    if lookup.timeout_secs == 0 || lookup.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "lookup.timeout_secs must be in range 1..=300".to_string(),
        ));
    }
    Ok(())
}

fn validate_search(search: &SearchConfig) -> Result<(), ConfigError> {
    if !(1..=50).contains(&search.page_size) {
        return Err(ConfigError::Validation("search.page_size must be in range 1..=50".to_string()));
    }
    if !is_http_url(&search.site_base_url) {
        return Err(ConfigError::Validation(
            "search.site_base_url must start with http:// or https://".to_string(),
        ));
    }
    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if !(0.0..=2.0).contains(&llm.temperature) {
        return Err(ConfigError::Validation(
            "llm.temperature must be in range 0.0..=2.0".to_string(),
        ));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    if let Some(base_url) = &llm.base_url {
        if !is_http_url(base_url) {
            return Err(ConfigError::Validation(
                "llm.base_url must start with http:// or https://".to_string(),
            ));
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

fn read_env_key(key_path: &str) -> Option<String> {
    env_sources(key_path).iter().find_map(|var| read_env(var))
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f32(key: &str, value: &str) -> Result<f32, ConfigError> {
    value.trim().parse::<f32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    api: Option<ApiPatch>,
    lookup: Option<LookupPatch>,
    search: Option<SearchPatch>,
    llm: Option<LlmPatch>,
    logging: Option<LoggingPatch>,
}

/// `test_mode` is written as a bool or a string in existing files.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TestModePatch {
    Flag(bool),
    Raw(String),
}

impl TestModePatch {
    fn into_header_value(self) -> String {
        match self {
            Self::Flag(true) => "1".to_string(),
            Self::Flag(false) => "0".to_string(),
            Self::Raw(value) => value,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ApiPatch {
    base_url: Option<String>,
    token: Option<String>,
    secret_key: Option<String>,
    test_mode: Option<TestModePatch>,
    app_version: Option<String>,
    api_version: Option<String>,
    timeout_secs: Option<u64>,
    listings_path: Option<String>,
    sold_path: Option<String>,
    detail_path: Option<String>,
    quick_search_path: Option<String>,
    agent_search_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LookupPatch {
    community_url: Option<String>,
    school_url: Option<String>,
    user_agent: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchPatch {
    page_size: Option<u32>,
    site_base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
