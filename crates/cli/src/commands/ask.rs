use std::sync::Arc;

use chrono::Utc;
use homesearch_agent::{register_all, AgentRuntime, ChatMessage, OpenAiChatClient, ToolRegistry};
use homesearch_core::config::{AppConfig, LoadOptions};
use homesearch_core::{AnswerEnvelope, CallerIdentity, InterfaceError};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::commands::{async_runtime, caller, load_config, CallerArgs, CommandResult};

const COMMAND: &str = "ask";

#[derive(Debug, Serialize)]
struct TurnView<'a> {
    correlation_id: &'a str,
    tool: Option<&'static str>,
    answer: &'a AnswerEnvelope,
}

#[derive(Debug, Serialize)]
struct FailedTurnView<'a> {
    correlation_id: &'a str,
    error: &'static str,
    detail: String,
}

pub fn run(
    options: LoadOptions,
    message: Option<String>,
    caller_args: CallerArgs,
) -> CommandResult {
    let config = match load_config(COMMAND, options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let caller = match caller(COMMAND, &caller_args) {
        Ok(caller) => caller,
        Err(failure) => return failure,
    };
    if let Err(error) = config.llm.require_api_key() {
        return CommandResult::failure(COMMAND, "config_validation", error.to_string(), 2);
    }
    let agent = match build_agent(&config) {
        Ok(agent) => agent,
        Err(error) => return CommandResult::failure(COMMAND, "agent_init", format!("{error:#}"), 3),
    };
    let runtime = match async_runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    match message.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => runtime.block_on(single_turn(&agent, text, caller)),
        _ => runtime.block_on(session(&agent, caller)),
    }
}

fn build_agent(config: &AppConfig) -> anyhow::Result<AgentRuntime> {
    let llm = OpenAiChatClient::from_config(&config.llm)?;
    let service = Arc::new(homesearch_api::listing_service(config)?);
    let mut registry = ToolRegistry::default();
    register_all(&mut registry, service);
    Ok(AgentRuntime::new(Arc::new(llm), registry))
}

async fn single_turn(
    agent: &AgentRuntime,
    text: &str,
    caller: Option<CallerIdentity>,
) -> CommandResult {
    match agent.handle_turn(&[], text, caller, Utc::now()).await {
        Ok(outcome) => CommandResult::success_json(
            COMMAND,
            &TurnView {
                correlation_id: &outcome.correlation_id,
                tool: outcome.tool.map(|tool| tool.name()),
                answer: &outcome.answer,
            },
        ),
        Err(error) => turn_failure(&error),
    }
}

/// Reads one message per line from stdin until EOF or `exit`, printing each
/// answer as a JSON line. Failed turns are reported and the session goes on.
async fn session(agent: &AgentRuntime, caller: Option<CallerIdentity>) -> CommandResult {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut history: Vec<ChatMessage> = Vec::new();
    let mut turns = 0usize;

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(error) => {
                return CommandResult::failure(
                    COMMAND,
                    "io",
                    format!("failed to read stdin: {error}"),
                    1,
                );
            }
        };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if matches!(text, "exit" | "quit") {
            break;
        }

        turns += 1;
        match agent.handle_turn(&history, text, caller.clone(), Utc::now()).await {
            Ok(outcome) => {
                print_line(&TurnView {
                    correlation_id: &outcome.correlation_id,
                    tool: outcome.tool.map(|tool| tool.name()),
                    answer: &outcome.answer,
                });
                history.extend(outcome.transcript);
            }
            Err(error) => print_line(&FailedTurnView {
                correlation_id: error.correlation_id(),
                error: error.user_message(),
                detail: error.to_string(),
            }),
        }
    }

    info!(event_name = "cli.ask.session_ended", turns, "assistant session ended");
    CommandResult::success(COMMAND, format!("session ended after {turns} turns"))
}

fn turn_failure(error: &InterfaceError) -> CommandResult {
    let (class, code) = match error {
        InterfaceError::BadRequest { .. } => ("bad_request", 2),
        InterfaceError::ServiceUnavailable { .. } => ("service_unavailable", 4),
        InterfaceError::Internal { .. } => ("internal", 1),
    };
    CommandResult::failure(
        COMMAND,
        class,
        format!("{} (correlation id {}): {error}", error.user_message(), error.correlation_id()),
        code,
    )
}

fn print_line(value: &impl Serialize) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{line}"),
        Err(error) => eprintln!("could not render answer: {error}"),
    }
}
