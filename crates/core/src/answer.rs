//! The assistant's final answer: free text plus cards of one kind, chosen by
//! the tool that ran last.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::response::{AgentCard, ListingRecord, SchoolCard};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    SearchProperties,
    SearchSold,
    SearchByAddress,
    PropertyDetail,
    SearchAgent,
    SearchSchool,
}

impl ToolKind {
    pub const ALL: [ToolKind; 6] = [
        Self::SearchProperties,
        Self::SearchSold,
        Self::SearchByAddress,
        Self::PropertyDetail,
        Self::SearchAgent,
        Self::SearchSchool,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::SearchProperties => "search_properties",
            Self::SearchSold => "search_sold",
            Self::SearchByAddress => "search_by_address",
            Self::PropertyDetail => "property_detail",
            Self::SearchAgent => "search_agent",
            Self::SearchSchool => "search_school",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name.trim())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardSchema {
    Property,
    Agent,
    School,
    /// Plain text; no cards allowed.
    Text,
}

pub fn select_schema(last_tool: Option<ToolKind>) -> CardSchema {
    match last_tool {
        Some(
            ToolKind::SearchProperties
            | ToolKind::SearchSold
            | ToolKind::SearchByAddress
            | ToolKind::PropertyDetail,
        ) => CardSchema::Property,
        Some(ToolKind::SearchAgent) => CardSchema::Agent,
        Some(ToolKind::SearchSchool) => CardSchema::School,
        None => CardSchema::Text,
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyCard {
    #[serde(rename = "Image", default)]
    pub image: Option<String>,
    #[serde(rename = "Address", default)]
    pub address_label: Option<String>,
    #[serde(flatten)]
    pub listing: ListingRecord,
}

impl From<ListingRecord> for PropertyCard {
    fn from(listing: ListingRecord) -> Self {
        Self { image: listing.photo.clone(), address_label: listing.address.clone(), listing }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Card {
    Property(PropertyCard),
    Agent(AgentCard),
    School(SchoolCard),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AnswerEnvelope {
    pub pretext: String,
    #[serde(rename = "Card")]
    pub cards: Vec<Card>,
}

impl AnswerEnvelope {
    pub fn text(pretext: impl Into<String>) -> Self {
        Self { pretext: pretext.into(), cards: Vec::new() }
    }
}

/// Parses the model's final text. Anything that is not a JSON object becomes a
/// text-only answer; cards that do not fit `schema` are dropped.
pub fn parse_answer(text: &str, schema: CardSchema) -> AnswerEnvelope {
    let Some(Value::Object(object)) = extract_json(text) else {
        return AnswerEnvelope::text(text.trim());
    };

    let pretext = object.get("pretext").and_then(Value::as_str).unwrap_or_default().to_string();
    let raw_cards = object.get("Card").and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[]);

    let cards: Vec<Card> =
        raw_cards.iter().filter_map(|raw| card_for_schema(raw, schema)).collect();
    if cards.len() != raw_cards.len() {
        warn!(
            event_name = "answer.cards.dropped",
            schema = ?schema,
            dropped = raw_cards.len() - cards.len(),
            "cards not matching the selected schema were dropped"
        );
    }

    AnswerEnvelope { pretext, cards }
}

fn card_for_schema(raw: &Value, schema: CardSchema) -> Option<Card> {
    if !raw.is_object() {
        return None;
    }
    match schema {
        CardSchema::Property => {
            let card = PropertyCard::deserialize(raw).ok()?;
            let identified = card.listing.id.is_some()
                || card.listing.harid.is_some()
                || card.listing.mlsnum.is_some();
            identified.then_some(Card::Property(card))
        }
        CardSchema::Agent => directory_card(raw).map(Card::Agent),
        CardSchema::School => directory_card(raw).map(Card::School),
        CardSchema::Text => None,
    }
}

fn directory_card(raw: &Value) -> Option<AgentCard> {
    let card = AgentCard::deserialize(raw).ok()?;
    card.name.is_some().then_some(card)
}

fn extract_json(text: &str) -> Option<Value> {
    let trimmed = strip_fence(text.trim());
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    (start < end).then(|| serde_json::from_str(&trimmed[start..=end]).ok()).flatten()
}

fn strip_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn property_card_schema() -> Value {
    let text = json!({"type": ["string", "null"]});
    let number = json!({"type": "number"});
    json!({
        "type": "object",
        "properties": {
            "Image": text, "Address": text, "id": text, "status_short": text,
            "mlsnum": text, "harid": text, "share_url": text, "address": text,
            "price": number, "beds": {"type": "integer"}, "bath": text, "city": text,
            "zipCode": text, "sqft": {"type": "integer"}, "agent": text, "photo": text,
            "agentUrl": text, "status": text, "status_text": text, "agentphoto": text,
            "broker": text, "property_type": text,
            "bookmarked": {"type": "boolean"}, "islogin": {"type": "boolean"}
        },
        "required": ["id", "address", "price"]
    })
}

fn directory_card_schema() -> Value {
    let text = json!({"type": ["string", "null"]});
    json!({
        "type": "object",
        "properties": {"Image": text, "Name": text, "URL": text},
        "required": ["Name"]
    })
}

/// JSON schema of the envelope with only the card branch `schema` allows.
pub fn answer_json_schema(schema: CardSchema) -> Value {
    let pretext = json!({
        "type": "string",
        "description": "Textual response; can be detailed when no card is needed"
    });
    let card_items = match schema {
        CardSchema::Property => property_card_schema(),
        CardSchema::Agent | CardSchema::School => directory_card_schema(),
        CardSchema::Text => {
            return json!({
                "type": "object",
                "properties": {"pretext": pretext},
                "required": ["pretext"]
            });
        }
    };
    json!({
        "type": "object",
        "properties": {
            "pretext": pretext,
            "Card": {"type": "array", "items": card_items}
        },
        "required": ["pretext"]
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        answer_json_schema, parse_answer, select_schema, Card, CardSchema, PropertyCard, ToolKind,
    };
    use crate::response::ListingRecord;

    #[test]
    fn schema_follows_the_last_tool() {
        assert_eq!(select_schema(Some(ToolKind::SearchSold)), CardSchema::Property);
        assert_eq!(select_schema(Some(ToolKind::PropertyDetail)), CardSchema::Property);
        assert_eq!(select_schema(Some(ToolKind::SearchAgent)), CardSchema::Agent);
        assert_eq!(select_schema(Some(ToolKind::SearchSchool)), CardSchema::School);
        assert_eq!(select_schema(None), CardSchema::Text);
    }

    #[test]
    fn tool_names_round_trip() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::parse(kind.name()), Some(kind));
        }
        assert_eq!(ToolKind::parse("launch_rocket"), None);
    }

    #[test]
    fn fenced_property_answer_is_parsed() {
        let text = "```json\n{\"pretext\": \"Two homes\", \"Card\": [\
            {\"id\": \"1\", \"address\": \"1 Elm\", \"price\": 100000, \"zipCode\": \"77008\"},\
            {\"Name\": \"Not a property\"}]}\n```";

        let answer = parse_answer(text, CardSchema::Property);

        assert_eq!(answer.pretext, "Two homes");
        assert_eq!(answer.cards.len(), 1);
        let Card::Property(card) = &answer.cards[0] else {
            panic!("expected a property card");
        };
        assert_eq!(card.listing.zip_code.as_deref(), Some("77008"));
    }

    #[test]
    fn formatted_numbers_keep_the_property_card() {
        let text = r#"{"pretext": "One home", "Card": [
            {"id": 1, "price": "$450,000", "beds": "3", "sqft": "2,150", "zipCode": 77008}
        ]}"#;

        let answer = parse_answer(text, CardSchema::Property);

        let [Card::Property(card)] = answer.cards.as_slice() else {
            panic!("expected one property card, got {:?}", answer.cards);
        };
        assert_eq!(card.listing.price, 450_000.0);
        assert_eq!((card.listing.beds, card.listing.sqft), (3, 2150));
        assert_eq!(card.listing.id.as_deref(), Some("1"));
        assert_eq!(card.listing.zip_code.as_deref(), Some("77008"));
    }

    #[test]
    fn agent_schema_keeps_directory_cards_only() {
        let text = r#"{"pretext": "Found her", "Card": [{"Name": "Ana", "URL": "u", "Image": null}, 5]}"#;

        let answer = parse_answer(text, CardSchema::Agent);

        assert_eq!(answer.cards.len(), 1);
        assert!(matches!(answer.cards[0], Card::Agent(_)));
    }

    #[test]
    fn text_schema_drops_every_card() {
        let text = r#"{"pretext": "Hello", "Card": [{"Name": "Ana"}]}"#;
        let answer = parse_answer(text, CardSchema::Text);
        assert_eq!(answer.pretext, "Hello");
        assert!(answer.cards.is_empty());
    }

    #[test]
    fn plain_text_becomes_pretext() {
        let answer = parse_answer("  Sorry, nothing matched.  ", CardSchema::Property);
        assert_eq!(answer.pretext, "Sorry, nothing matched.");
        assert!(answer.cards.is_empty());
    }

    #[test]
    fn json_embedded_in_prose_is_recovered() {
        let answer = parse_answer("Here you go: {\"pretext\": \"ok\"} thanks", CardSchema::Text);
        assert_eq!(answer.pretext, "ok");
    }

    #[test]
    fn envelope_serializes_cards_untagged() {
        let listing = ListingRecord { id: Some("9".to_string()), ..ListingRecord::default() };
        let answer = super::AnswerEnvelope {
            pretext: "One".to_string(),
            cards: vec![Card::Property(PropertyCard::from(listing))],
        };

        let json = serde_json::to_value(&answer).expect("serialize");
        assert_eq!(json["Card"][0]["id"], "9");
        assert_eq!(json["pretext"], "One");
    }

    #[test]
    fn json_schema_keeps_only_the_selected_branch() {
        let property = answer_json_schema(CardSchema::Property);
        assert!(property["properties"]["Card"]["items"]["properties"]["agentUrl"].is_object());

        let school = answer_json_schema(CardSchema::School);
        assert_eq!(school["properties"]["Card"]["items"]["required"], json!(["Name"]));

        let text = answer_json_schema(CardSchema::Text);
        assert!(text["properties"].get("Card").is_none());
    }
}
