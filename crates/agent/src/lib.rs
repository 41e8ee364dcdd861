//! Conversational turn for the listing assistant.
//!
//! A turn is a short, fixed loop:
//! 1. **Model** (`llm`, `openai`) - the model sees the conversation and the tool specs
//! 2. **Routing** (`routing`) - no tool call finishes; otherwise the first call picks a tool
//! 3. **Tool** (`handlers`) - the chosen tool runs against the search core
//! 4. **Answer** (`runtime`) - the model answers again under the card schema the
//!    tool selects, and the text is parsed into an `AnswerEnvelope`
//!
//! The model only extracts filters and phrases answers. Entity resolution,
//! signing and response shaping are deterministic and live in `homesearch-core`.

pub mod handlers;
pub mod llm;
pub mod openai;
pub mod prompt;
pub mod routing;
pub mod runtime;
pub mod tools;

pub use handlers::{register_all, search_intent_schema};
pub use llm::{ChatMessage, LlmClient, ModelTurn, Role, ToolCall, ToolSpec};
pub use openai::OpenAiChatClient;
pub use routing::{route, Route};
pub use runtime::{AgentRuntime, TurnOutcome};
pub use tools::{Tool, ToolContext, ToolRegistry};
