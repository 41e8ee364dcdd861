use std::time::Duration;

use async_trait::async_trait;
use homesearch_core::config::LookupConfig;
use homesearch_core::{EntityResolver, RequestError, SchoolLevel};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::USER_AGENT;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::transport::decode_body;
use crate::ClientError;

const QUERY_VALUE: &AsciiSet =
    &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// `{base}?query=<name>[&type=<type>]` with both values percent-encoded.
pub fn lookup_url(base: &str, name: &str, lookup_type: Option<&str>) -> String {
    let mut url = format!("{base}?query={}", utf8_percent_encode(name.trim(), QUERY_VALUE));
    if let Some(lookup_type) = lookup_type.filter(|value| !value.is_empty()) {
        url.push_str("&type=");
        url.push_str(&utf8_percent_encode(lookup_type, QUERY_VALUE).to_string());
    }
    url
}

/// Lookup endpoints answer with a bare array; a `data` array is accepted too.
/// Anything else counts as no match.
pub fn lookup_results(payload: Value) -> Vec<Value> {
    match payload {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("data") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Resolves community and school names through the public lookup endpoints.
/// These are unsigned and expect a browser user agent.
#[derive(Clone)]
pub struct HttpEntityResolver {
    client: Client,
    community_url: String,
    school_url: String,
    user_agent: String,
}

impl HttpEntityResolver {
    pub fn from_config(config: &LookupConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self {
            client,
            community_url: config.community_url.clone(),
            school_url: config.school_url.clone(),
            user_agent: config.user_agent.clone(),
        })
    }

    async fn fetch(&self, url: String) -> Result<Vec<Value>, RequestError> {
        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|error| RequestError::Transport {
                path: url.clone(),
                message: error.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                event_name = "api.lookup.failed",
                url = %url,
                status = status.as_u16(),
                "entity lookup returned a non-success status"
            );
            return Err(RequestError::Status { path: url, status: status.as_u16() });
        }

        let body = response
            .bytes()
            .await
            .map_err(|error| RequestError::Transport {
                path: url.clone(),
                message: error.to_string(),
            })?;
        let results = lookup_results(decode_body(&url, &body)?);
        debug!(
            event_name = "api.lookup.completed",
            url = %url,
            results = results.len(),
            "entity lookup completed"
        );
        Ok(results)
    }
}

#[async_trait]
impl EntityResolver for HttpEntityResolver {
    async fn lookup_communities(&self, name: &str) -> Result<Vec<Value>, RequestError> {
        self.fetch(lookup_url(&self.community_url, name, None)).await
    }

    async fn lookup_schools(
        &self,
        name: &str,
        level: SchoolLevel,
    ) -> Result<Vec<Value>, RequestError> {
        self.fetch(lookup_url(&self.school_url, name, Some(level.lookup_type()))).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{lookup_results, lookup_url};

    #[test]
    fn community_url_carries_only_the_query() {
        assert_eq!(
            lookup_url("http://lookup.test/mpcfinder", " Bridgeland ", None),
            "http://lookup.test/mpcfinder?query=Bridgeland"
        );
    }

    #[test]
    fn school_url_encodes_name_and_type() {
        assert_eq!(
            lookup_url("https://lookup.test/schools", "St. Mary's & Co", Some("high")),
            "https://lookup.test/schools?query=St.%20Mary%27s%20%26%20Co&type=high"
        );
    }

    #[test]
    fn results_accept_bare_or_wrapped_arrays() {
        assert_eq!(lookup_results(json!([{"community": 1}])).len(), 1);
        assert_eq!(lookup_results(json!({"data": [{"base_id": "x"}, {}]})).len(), 2);
        assert!(lookup_results(json!({"error": "nope"})).is_empty());
        assert!(lookup_results(json!(null)).is_empty());
    }
}
