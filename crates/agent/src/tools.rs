use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use homesearch_core::{ApplicationError, CallerIdentity, ToolKind};
use serde_json::Value;

use crate::llm::ToolSpec;

/// Per-turn facts every tool may need.
#[derive(Clone, Debug)]
pub struct ToolContext {
    pub caller: Option<CallerIdentity>,
    pub now: DateTime<Utc>,
    pub correlation_id: String,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn kind(&self) -> ToolKind;
    fn description(&self) -> &'static str;
    /// JSON schema of the tool's input object.
    fn parameters(&self) -> Value;
    async fn execute(&self, input: Value, context: &ToolContext) -> Result<Value, ApplicationError>;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_owned(),
            description: self.description().to_owned(),
            parameters: self.parameters(),
        }
    }
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.name(), Box::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name.trim()).map(Box::as_ref)
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.values().map(|tool| tool.spec()).collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use homesearch_core::{ApplicationError, ToolKind};
    use serde_json::{json, Value};

    use super::{Tool, ToolContext, ToolRegistry};

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn kind(&self) -> ToolKind {
            ToolKind::SearchAgent
        }

        fn description(&self) -> &'static str {
            "echo"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object"})
        }

        async fn execute(&self, input: Value, _: &ToolContext) -> Result<Value, ApplicationError> {
            Ok(input)
        }
    }

    #[test]
    fn registry_looks_tools_up_by_name() {
        let mut registry = ToolRegistry::default();
        assert!(registry.is_empty());

        registry.register(Echo);

        assert_eq!(registry.len(), 1);
        assert!(registry.get(" search_agent ").is_some());
        assert!(registry.get("search_school").is_none());
        assert_eq!(registry.specs()[0].name, "search_agent");
        assert_eq!(registry.names(), vec!["search_agent"]);
    }
}
