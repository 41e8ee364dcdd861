use std::time::Duration;

use async_trait::async_trait;
use homesearch_core::config::ApiConfig;
use homesearch_core::{RequestError, SignedRequest, Transport};
use reqwest::Client;
use serde_json::Value;
use tracing::{info, warn};

use crate::ClientError;

/// Sends signed listing requests over HTTPS.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build().map_err(ClientError::Build)?;
        Ok(Self { client })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, ClientError> {
        Self::new(Duration::from_secs(config.timeout_secs))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, request: &SignedRequest) -> Result<Value, RequestError> {
        let mut outgoing = self.client.get(&request.url);
        for (name, value) in &request.headers {
            outgoing = outgoing.header(*name, value);
        }

        let response = outgoing.send().await.map_err(|error| RequestError::Transport {
            path: request.path.clone(),
            message: error.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                event_name = "api.request.failed",
                path = %request.path,
                status = status.as_u16(),
                "listing api returned a non-success status"
            );
            return Err(RequestError::Status {
                path: request.path.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|error| RequestError::Transport {
            path: request.path.clone(),
            message: error.to_string(),
        })?;
        let payload = decode_body(&request.path, &body)?;
        info!(
            event_name = "api.request.completed",
            path = %request.path,
            status = status.as_u16(),
            bytes = body.len(),
            "listing api request completed"
        );
        Ok(payload)
    }
}

pub(crate) fn decode_body(path: &str, body: &[u8]) -> Result<Value, RequestError> {
    serde_json::from_slice(body).map_err(|error| RequestError::MalformedBody {
        path: path.to_owned(),
        message: error.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use homesearch_core::RequestError;
    use serde_json::json;

    use super::decode_body;

    #[test]
    fn json_bodies_decode() {
        let value = decode_body("/chatbot/listings", br#"{"total": 3}"#).expect("decode");
        assert_eq!(value, json!({"total": 3}));
    }

    #[test]
    fn html_error_pages_are_malformed_bodies() {
        let error = decode_body("/chatbot/listings", b"<html>oops</html>").expect_err("html");
        assert!(matches!(error, RequestError::MalformedBody { ref path, .. } if path == "/chatbot/listings"));
    }
}
