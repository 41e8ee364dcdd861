use std::sync::Arc;

use chrono::{DateTime, Utc};
use homesearch_core::{
    parse_answer, select_schema, AnswerEnvelope, ApplicationError, CallerIdentity, CardSchema,
    InterfaceError, ToolKind,
};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::llm::{ChatMessage, LlmClient, ModelTurn};
use crate::prompt::{format_instructions, SYSTEM_PROMPT};
use crate::routing::{route, Route};
use crate::tools::{ToolContext, ToolRegistry};

const SKIPPED_CALL: &str = "not run: only the first tool call of a turn is executed";

/// The result of one user turn.
#[derive(Clone, Debug)]
pub struct TurnOutcome {
    pub correlation_id: String,
    pub answer: AnswerEnvelope,
    pub tool: Option<ToolKind>,
    pub tool_output: Option<Value>,
    /// Messages to append to the conversation history: the user's text and
    /// the assistant's final reply.
    pub transcript: Vec<ChatMessage>,
}

/// One turn: model → optional single tool → model again for the final,
/// schema-shaped answer.
pub struct AgentRuntime {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
}

impl AgentRuntime {
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolRegistry) -> Self {
        Self { llm, tools }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub async fn handle_turn(
        &self,
        history: &[ChatMessage],
        user_text: &str,
        caller: Option<CallerIdentity>,
        now: DateTime<Utc>,
    ) -> Result<TurnOutcome, InterfaceError> {
        let correlation_id = Uuid::new_v4().simple().to_string();
        match self.run(history, user_text, caller, now, &correlation_id).await {
            Ok(outcome) => Ok(outcome),
            Err(error) => {
                warn!(
                    event_name = "agent.turn.failed",
                    correlation_id = %correlation_id,
                    error = %error,
                    "turn failed"
                );
                Err(error.into_interface(correlation_id))
            }
        }
    }

    async fn run(
        &self,
        history: &[ChatMessage],
        user_text: &str,
        caller: Option<CallerIdentity>,
        now: DateTime<Utc>,
        correlation_id: &str,
    ) -> Result<TurnOutcome, ApplicationError> {
        let mut messages = Vec::with_capacity(history.len() + 4);
        messages.push(ChatMessage::system(SYSTEM_PROMPT));
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(user_text));

        let turn = self.complete(&messages, true).await?;
        let (kind, call) = match route(&turn) {
            Route::Finish => {
                info!(
                    event_name = "agent.turn.routed",
                    correlation_id = %correlation_id,
                    route = "finish",
                    "model answered without a tool"
                );
                let answer = parse_answer(&turn.content, CardSchema::Text);
                return Ok(outcome(correlation_id, user_text, &turn.content, answer, None, None));
            }
            Route::Tool { kind, call } => (kind, call),
        };
        info!(
            event_name = "agent.turn.routed",
            correlation_id = %correlation_id,
            route = kind.name(),
            "model requested a tool"
        );

        let tool = self.tools.get(kind.name()).ok_or_else(|| {
            ApplicationError::Configuration(format!("tool `{}` is not registered", kind.name()))
        })?;
        let context = ToolContext { caller, now, correlation_id: correlation_id.to_owned() };
        let output = tool.execute(call.arguments.clone(), &context).await?;

        messages.push(ChatMessage::assistant_calls(turn.content.clone(), turn.tool_calls.clone()));
        for (index, requested) in turn.tool_calls.iter().enumerate() {
            let content = if index == 0 { output.to_string() } else { SKIPPED_CALL.to_owned() };
            messages.push(ChatMessage::tool_result(requested.id.clone(), content));
        }

        let schema = select_schema(Some(kind));
        messages.push(ChatMessage::system(format_instructions(schema)));
        let final_turn = self.complete(&messages, false).await?;
        let answer = parse_answer(&final_turn.content, schema);
        info!(
            event_name = "agent.turn.completed",
            correlation_id = %correlation_id,
            tool = kind.name(),
            cards = answer.cards.len(),
            "turn answered"
        );
        Ok(outcome(
            correlation_id,
            user_text,
            &final_turn.content,
            answer,
            Some(kind),
            Some(output),
        ))
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        with_tools: bool,
    ) -> Result<ModelTurn, ApplicationError> {
        let specs = if with_tools { self.tools.specs() } else { Vec::new() };
        self.llm
            .complete(messages, &specs)
            .await
            .map_err(|error| ApplicationError::Model(format!("{error:#}")))
    }
}

fn outcome(
    correlation_id: &str,
    user_text: &str,
    reply: &str,
    answer: AnswerEnvelope,
    tool: Option<ToolKind>,
    tool_output: Option<Value>,
) -> TurnOutcome {
    TurnOutcome {
        correlation_id: correlation_id.to_owned(),
        answer,
        tool,
        tool_output,
        transcript: vec![ChatMessage::user(user_text), ChatMessage::assistant(reply)],
    }
}
