use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::response::fields;

/// Image/name/link card used for agents and schools.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryCard {
    #[serde(rename = "Image")]
    pub image: Option<String>,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "URL")]
    pub url: Option<String>,
}

pub type AgentCard = DirectoryCard;
pub type SchoolCard = DirectoryCard;

fn first_text(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| fields::string(item, key))
}

/// Entries under `key`, or the payload itself when it is already an array.
fn entries<'a>(payload: &'a Value, key: &str) -> &'a [Value] {
    match payload {
        Value::Array(items) => items,
        _ => fields::array(payload, key),
    }
}

fn is_named(card: &DirectoryCard) -> bool {
    card.name.is_some()
}

pub fn agent_cards(payload: &Value) -> Vec<AgentCard> {
    entries(payload, "agents")
        .iter()
        .map(|item| DirectoryCard {
            image: first_text(item, &["photo", "agentphoto", "image"]),
            name: first_text(item, &["agentname", "name"]),
            url: first_text(item, &["url", "profile_url", "share_url"]),
        })
        .filter(is_named)
        .collect()
}

pub fn school_cards(results: &[Value]) -> Vec<SchoolCard> {
    results
        .iter()
        .map(|item| DirectoryCard {
            image: first_text(item, &["photo", "image", "logo"]),
            name: first_text(item, &["name", "schoolname", "label"]),
            url: first_text(item, &["url", "link", "share_url"]),
        })
        .filter(is_named)
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{agent_cards, school_cards, DirectoryCard};

    #[test]
    fn agent_cards_accept_wrapped_or_bare_arrays() {
        let wrapped = json!({"agents": [{"agentname": "Ana Ruiz", "photo": "p.jpg", "url": "u"}]});
        let bare = json!([{"name": "Ana Ruiz"}, {"photo": "nameless.jpg"}]);

        assert_eq!(
            agent_cards(&wrapped),
            vec![DirectoryCard {
                image: Some("p.jpg".to_string()),
                name: Some("Ana Ruiz".to_string()),
                url: Some("u".to_string()),
            }]
        );
        assert_eq!(agent_cards(&bare).len(), 1);
    }

    #[test]
    fn school_cards_serialize_with_card_field_names() {
        let cards = school_cards(&[json!({"name": "Bush Elementary", "base_id": "E-12"})]);
        let json = serde_json::to_value(&cards[0]).expect("serialize");

        assert_eq!(json, json!({"Image": null, "Name": "Bush Elementary", "URL": null}));
    }
}
