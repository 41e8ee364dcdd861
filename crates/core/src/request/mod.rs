//! Signed requests against the listing API.
//!
//! Building a request is pure: [`RequestBuilder`] turns a query string and an
//! optional caller into a [`SignedRequest`]. Sending it is the job of a
//! [`Transport`] implementation.

pub mod builder;
pub mod signing;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::RequestError;

pub use builder::{EndpointPaths, RequestBuilder};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallerRole {
    #[default]
    Public,
    /// Association member; may see withdrawn, terminated and expired listings.
    Member,
}

impl CallerRole {
    pub fn is_privileged(self) -> bool {
        matches!(self, Self::Member)
    }

    pub fn header_value(self) -> &'static str {
        match self {
            Self::Public => "0",
            Self::Member => "1",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "0" | "public" | "consumer" => Some(Self::Public),
            "1" | "member" | "agent" => Some(Self::Member),
            _ => None,
        }
    }
}

/// The signed-in user a request is made on behalf of.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub user_id: String,
    #[serde(default)]
    pub member_number: Option<String>,
    #[serde(default)]
    pub role: CallerRole,
    /// Browser user agent, forwarded on property detail requests.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Page the user is on, forwarded on property detail requests.
    #[serde(default)]
    pub page_url: Option<String>,
}

impl CallerIdentity {
    pub fn new(user_id: impl Into<String>, role: CallerRole) -> Self {
        Self { user_id: user_id.into(), member_number: None, role, user_agent: None, page_url: None }
    }

    pub fn with_member_number(mut self, member_number: impl Into<String>) -> Self {
        self.member_number = Some(member_number.into());
        self
    }

    pub fn with_browser(mut self, user_agent: impl Into<String>, page_url: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self.page_url = Some(page_url.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Listings,
    Sold,
    QuickSearch,
    Detail { id: String },
    AgentSearch,
}

impl Endpoint {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Listings => "listings",
            Self::Sold => "sold",
            Self::QuickSearch => "quick_search",
            Self::Detail { .. } => "detail",
            Self::AgentSearch => "agent_search",
        }
    }
}

/// A fully addressed GET request. `path` is the signed path relative to the
/// API base; `url` is what goes on the wire.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub url: String,
    pub path: String,
    pub headers: Vec<(&'static str, String)>,
}

impl SignedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Debug for SignedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(key, value)| {
                let shown = if *key == signing::HEADER_TOKEN { "[REDACTED]" } else { value };
                (*key, shown)
            })
            .collect();
        f.debug_struct("SignedRequest")
            .field("url", &self.url)
            .field("path", &self.path)
            .field("headers", &headers)
            .finish()
    }
}

/// Sends a signed request and decodes the JSON body. Non-success statuses and
/// undecodable bodies are errors; nothing is retried.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, request: &SignedRequest) -> Result<Value, RequestError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn get_json(&self, request: &SignedRequest) -> Result<Value, RequestError> {
        (**self).get_json(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::{CallerIdentity, CallerRole, SignedRequest};

    #[test]
    fn only_members_are_privileged() {
        assert!(CallerRole::Member.is_privileged());
        assert!(!CallerRole::Public.is_privileged());
        assert_eq!(CallerRole::parse("1"), Some(CallerRole::Member));
        assert_eq!(CallerRole::parse(" Public "), Some(CallerRole::Public));
        assert_eq!(CallerRole::parse("admin"), None);
    }

    #[test]
    fn debug_output_hides_the_token() {
        let request = SignedRequest {
            url: "https://api.example.test/chatbot/listings?city=Houston".to_owned(),
            path: "/chatbot/listings?city=Houston".to_owned(),
            headers: vec![("X-Token", "tok-secret".to_owned()), ("X-Expires", "1".to_owned())],
        };

        let rendered = format!("{request:?}");
        assert!(!rendered.contains("tok-secret"));
        assert!(rendered.contains("[REDACTED]"));
        assert_eq!(request.header("x-expires"), Some("1"));
    }

    #[test]
    fn caller_identity_deserializes_with_defaults() {
        let caller: CallerIdentity =
            serde_json::from_value(serde_json::json!({"user_id": "42"})).expect("caller");
        assert_eq!(caller, CallerIdentity::new("42", CallerRole::Public));
    }
}
