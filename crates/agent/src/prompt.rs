use homesearch_core::{answer_json_schema, CardSchema};

pub const SYSTEM_PROMPT: &str = "You are a real-estate assistant for the Houston area. \
Use the tools to find listings, sold homes, property details, agents and schools. \
Never invent listings, prices or agents; only describe what a tool returned. \
When the user asks for more results, repeat the last search with `start` increased \
by the page size. If a search reports that a community, county or school could not \
be found, say so and ask the user to check the name.";

/// Instructions for the final answer, embedding the schema the answer must follow.
pub fn format_instructions(schema: CardSchema) -> String {
    let document = answer_json_schema(schema);
    let cards = match schema {
        CardSchema::Property => {
            "Put each property you mention in `Card`, copying its fields from the tool output."
        }
        CardSchema::Agent => "Put each agent you mention in `Card` with its image, name and URL.",
        CardSchema::School => "Put each school you mention in `Card` with its image, name and URL.",
        CardSchema::Text => "Do not include any cards.",
    };
    format!(
        "Answer with a single JSON object and nothing else. {cards}\nJSON schema:\n{document}"
    )
}

#[cfg(test)]
mod tests {
    use homesearch_core::CardSchema;

    use super::format_instructions;

    #[test]
    fn instructions_embed_the_selected_schema() {
        let property = format_instructions(CardSchema::Property);
        assert!(property.contains("agentUrl"));

        let text = format_instructions(CardSchema::Text);
        assert!(text.contains("Do not include any cards"));
        assert!(!text.contains("\"Card\""));
    }
}
