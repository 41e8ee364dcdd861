use homesearch_core::ToolKind;

use crate::llm::{ModelTurn, ToolCall};

/// Where a model turn goes next.
#[derive(Clone, Debug, PartialEq)]
pub enum Route {
    /// No usable tool call; the model's text is the answer.
    Finish,
    Tool { kind: ToolKind, call: ToolCall },
}

/// The first tool call decides; later calls in the same turn are not run.
/// A name outside the tool set finishes the turn.
pub fn route(turn: &ModelTurn) -> Route {
    let Some(call) = turn.tool_calls.first() else {
        return Route::Finish;
    };
    match ToolKind::parse(&call.name) {
        Some(kind) => Route::Tool { kind, call: call.clone() },
        None => Route::Finish,
    }
}

#[cfg(test)]
mod tests {
    use homesearch_core::ToolKind;
    use serde_json::json;

    use super::{route, Route};
    use crate::llm::{ModelTurn, ToolCall};

    fn call(name: &str) -> ToolCall {
        ToolCall { id: format!("id-{name}"), name: name.to_owned(), arguments: json!({}) }
    }

    #[test]
    fn text_only_turn_finishes() {
        assert_eq!(route(&ModelTurn::text("hello")), Route::Finish);
    }

    #[test]
    fn first_tool_call_wins() {
        let turn = ModelTurn {
            content: String::new(),
            tool_calls: vec![call("search_agent"), call("search_properties")],
        };

        let Route::Tool { kind, call } = route(&turn) else {
            panic!("expected a tool route");
        };
        assert_eq!(kind, ToolKind::SearchAgent);
        assert_eq!(call.id, "id-search_agent");
    }

    #[test]
    fn unknown_tool_name_finishes() {
        let turn = ModelTurn { content: "ok".to_owned(), tool_calls: vec![call("book_flight")] };
        assert_eq!(route(&turn), Route::Finish);
    }
}
