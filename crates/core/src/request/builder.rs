use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::config::ApiConfig;
use crate::request::signing::{
    self, canonical_path, expires_at, signature, strip_fragment_markers, wire_path,
};
use crate::request::{CallerIdentity, Endpoint, SignedRequest};

/// Listing API paths, relative to the base URL. `detail` contains `{id}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointPaths {
    pub listings: String,
    pub sold: String,
    pub detail: String,
    pub quick_search: String,
    pub agent_search: String,
}

impl Default for EndpointPaths {
    fn default() -> Self {
        Self {
            listings: "/chatbot/listings".to_owned(),
            sold: "/chatbot/sold".to_owned(),
            detail: "/chatbot/property/{id}".to_owned(),
            quick_search: "/chatbot/quicksearch".to_owned(),
            agent_search: "/chatbot/agents".to_owned(),
        }
    }
}

impl EndpointPaths {
    pub fn path_for(&self, endpoint: &Endpoint) -> String {
        match endpoint {
            Endpoint::Listings => self.listings.clone(),
            Endpoint::Sold => self.sold.clone(),
            Endpoint::QuickSearch => self.quick_search.clone(),
            Endpoint::AgentSearch => self.agent_search.clone(),
            Endpoint::Detail { id } => self.detail.replace("{id}", id.trim()),
        }
    }
}

/// Builds signed GET requests. Holds credentials; never sends anything.
pub struct RequestBuilder {
    base_url: String,
    token: SecretString,
    secret_key: SecretString,
    test_mode: String,
    app_version: String,
    api_version: String,
    paths: EndpointPaths,
}

impl RequestBuilder {
    pub fn new(
        base_url: impl Into<String>,
        token: SecretString,
        secret_key: SecretString,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token,
            secret_key,
            test_mode: "0".to_owned(),
            app_version: "4.0.0".to_owned(),
            api_version: "9".to_owned(),
            paths: EndpointPaths::default(),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            token: config.token.clone(),
            secret_key: config.secret_key.clone(),
            test_mode: config.test_mode.clone(),
            app_version: config.app_version.clone(),
            api_version: config.api_version.clone(),
            paths: config.endpoint_paths(),
        }
    }

    pub fn with_test_mode(mut self, test_mode: impl Into<String>) -> Self {
        self.test_mode = test_mode.into();
        self
    }

    pub fn with_paths(mut self, paths: EndpointPaths) -> Self {
        self.paths = paths;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Signs `endpoint` with an already-built query string (may be empty).
    /// Caller headers are attached only when a caller is given.
    pub fn build(
        &self,
        endpoint: &Endpoint,
        query: &str,
        caller: Option<&CallerIdentity>,
        now: DateTime<Utc>,
    ) -> SignedRequest {
        let mut path = self.paths.path_for(endpoint);
        if !query.is_empty() {
            path.push(if path.contains('?') { '&' } else { '?' });
            path.push_str(query);
        }
        let path = strip_fragment_markers(&path);

        let token = self.token.expose_secret();
        let expires = expires_at(now);
        let auth = signature(&canonical_path(&path), token, self.secret_key.expose_secret(), expires);

        let mut headers = vec![
            (signing::HEADER_TOKEN, token.to_owned()),
            (signing::HEADER_AUTH, auth),
            (signing::HEADER_EXPIRES, expires.to_string()),
            (signing::HEADER_TEST_MODE, self.test_mode.clone()),
            (signing::HEADER_APP_VERSION, self.app_version.clone()),
            (signing::HEADER_API_VERSION, self.api_version.clone()),
        ];
        if let Some(caller) = caller {
            headers.push((signing::HEADER_USER_ID, caller.user_id.clone()));
            if let Some(member_number) = &caller.member_number {
                headers.push((signing::HEADER_MEMBER_NUMBER, member_number.clone()));
            }
            headers.push((signing::HEADER_USER_TYPE, caller.role.header_value().to_owned()));
            headers.push((signing::HEADER_APP_TYPE, signing::APP_TYPE.to_owned()));
            headers.push((signing::HEADER_APP_NAME, signing::APP_NAME.to_owned()));
            headers.push((signing::HEADER_DEVICE_TYPE, signing::DEVICE_TYPE.to_owned()));
            if matches!(endpoint, Endpoint::Detail { .. }) {
                if let Some(user_agent) = &caller.user_agent {
                    headers.push((signing::HEADER_USER_AGENT, user_agent.clone()));
                }
                if let Some(page_url) = &caller.page_url {
                    headers.push((signing::HEADER_PAGE, page_url.clone()));
                }
            }
        }

        let url = format!("{}{}", self.base_url, wire_path(&path));
        debug!(
            event_name = "api.request.signed",
            endpoint = endpoint.name(),
            path = %path,
            expires,
            with_caller = caller.is_some(),
            "signed listing api request"
        );
        SignedRequest { url, path, headers }
    }
}
