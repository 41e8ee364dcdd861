use chrono::Utc;
use clap::{Args, ValueEnum};
use homesearch_core::config::LoadOptions;
use homesearch_core::request::signing::HEADER_TOKEN;
use homesearch_core::{Endpoint, RequestBuilder, SignedRequest};
use serde_json::{json, Map, Value};

use crate::commands::{caller, load_config, CallerArgs, CommandResult};

const COMMAND: &str = "sign";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EndpointArg {
    Listings,
    Sold,
    QuickSearch,
    Detail,
    Agents,
}

#[derive(Debug, Clone, Args)]
pub struct SignArgs {
    #[arg(value_enum, help = "Endpoint to sign")]
    pub endpoint: EndpointArg,
    #[arg(long, default_value = "", help = "Query string, e.g. city=Katy&max=5")]
    pub query: String,
    #[arg(long, help = "Listing id, required for the detail endpoint")]
    pub id: Option<String>,
    #[command(flatten)]
    pub caller: CallerArgs,
}

impl SignArgs {
    fn endpoint(&self) -> Result<Endpoint, String> {
        Ok(match self.endpoint {
            EndpointArg::Listings => Endpoint::Listings,
            EndpointArg::Sold => Endpoint::Sold,
            EndpointArg::QuickSearch => Endpoint::QuickSearch,
            EndpointArg::Agents => Endpoint::AgentSearch,
            EndpointArg::Detail => {
                let id = self.id.as_deref().map(str::trim).filter(|id| !id.is_empty());
                let id = id.ok_or_else(|| "--id is required for the detail endpoint".to_string())?;
                Endpoint::Detail { id: id.to_string() }
            }
        })
    }
}

pub fn run(options: LoadOptions, args: SignArgs) -> CommandResult {
    let config = match load_config(COMMAND, options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let caller = match caller(COMMAND, &args.caller) {
        Ok(caller) => caller,
        Err(failure) => return failure,
    };
    let endpoint = match args.endpoint() {
        Ok(endpoint) => endpoint,
        Err(message) => return CommandResult::failure(COMMAND, "invalid_input", message, 2),
    };

    let builder = RequestBuilder::from_config(&config.api);
    let query = args.query.trim().trim_start_matches('?');
    let request = builder.build(&endpoint, query, caller.as_ref(), Utc::now());
    CommandResult::success_json(COMMAND, &render(&request))
}

/// The request as JSON with the API token redacted.
pub fn render(request: &SignedRequest) -> Value {
    let headers: Map<String, Value> = request
        .headers
        .iter()
        .map(|(name, value)| {
            let shown = if *name == HEADER_TOKEN { redact_token(value) } else { value.clone() };
            ((*name).to_string(), Value::String(shown))
        })
        .collect();
    json!({ "method": "GET", "url": request.url, "path": request.path, "headers": headers })
}

pub(crate) fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    let visible: String = trimmed.chars().take(4).collect();
    if trimmed.chars().count() > 8 {
        return format!("{visible}***");
    }

    "<redacted>".to_string()
}
