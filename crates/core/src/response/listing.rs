use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::response::fields;

/// Payload key of the regular, server-paginated result list.
pub const LISTINGS_KEY: &str = "listings";
/// Payload key used for withdrawn, terminated and expired results, which the
/// API returns as one unpaginated array.
pub const OFF_MARKET_LISTINGS_KEY: &str = "offmarket_listings";

/// One search result as the front end renders it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingRecord {
    #[serde(deserialize_with = "fields::lenient_text")]
    pub id: Option<String>,
    #[serde(deserialize_with = "fields::lenient_text")]
    pub mlsnum: Option<String>,
    #[serde(deserialize_with = "fields::lenient_text")]
    pub harid: Option<String>,
    pub share_url: Option<String>,
    pub address: Option<String>,
    #[serde(deserialize_with = "fields::lenient_float")]
    pub price: f64,
    #[serde(deserialize_with = "fields::lenient_integer")]
    pub beds: i64,
    #[serde(deserialize_with = "fields::lenient_text")]
    pub bath: Option<String>,
    pub city: Option<String>,
    #[serde(rename = "zipCode", deserialize_with = "fields::lenient_text")]
    pub zip_code: Option<String>,
    #[serde(deserialize_with = "fields::lenient_integer")]
    pub sqft: i64,
    pub agent: Option<String>,
    pub photo: Option<String>,
    #[serde(rename = "agentUrl")]
    pub agent_url: Option<String>,
    pub status: Option<String>,
    pub status_short: Option<String>,
    pub status_text: Option<String>,
    pub agentphoto: Option<String>,
    pub broker: Option<String>,
    pub property_type: Option<String>,
    pub bookmarked: bool,
    pub islogin: bool,
}

impl ListingRecord {
    pub fn from_payload(item: &Value, site_base_url: &str) -> Self {
        let id = fields::string(item, "id");
        let agent = fields::string(item, "agentname");
        let listing_id = id.clone().or_else(|| fields::string(item, "harid"));
        let agent_url = agent
            .as_deref()
            .zip(listing_id.as_deref())
            .map(|(name, listing_id)| agent_url(site_base_url, name, listing_id));

        Self {
            mlsnum: fields::string(item, "mlsnum"),
            harid: fields::string(item, "harid"),
            share_url: fields::string(item, "share_url"),
            address: fields::string(item, "address"),
            price: fields::float(item, "price"),
            beds: fields::integer(item, "bed"),
            bath: fields::string(item, "bath"),
            city: fields::string(item, "city"),
            zip_code: fields::string(item, "zip"),
            sqft: fields::integer(item, "sqft"),
            photo: fields::string(item, "photo"),
            status: fields::string(item, "status"),
            status_short: fields::string(item, "status_short"),
            status_text: fields::string(item, "status_text"),
            agentphoto: fields::string(item, "agentphoto"),
            broker: fields::string(item, "broker"),
            property_type: fields::string(item, "property_type"),
            bookmarked: fields::flag(item, "bookmarked"),
            islogin: fields::flag(item, "islogin"),
            id,
            agent,
            agent_url,
        }
    }
}

/// Agent-name path segment: lowercased, each space replaced by `-`.
pub fn agent_slug(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "-")
}

pub fn agent_url(site_base_url: &str, agent_name: &str, listing_id: &str) -> String {
    format!(
        "{}/{}/agent_{}",
        site_base_url.trim_end_matches('/'),
        agent_slug(agent_name),
        listing_id.trim()
    )
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingPage {
    pub total: u64,
    pub start: u64,
    pub stop: u64,
    pub listings: Vec<ListingRecord>,
}

impl ListingPage {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// How to read a listings payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingOptions {
    /// The request targeted withdrawn/terminated/expired statuses.
    pub off_market: bool,
    /// Requested offset, used to slice off-market results.
    pub start: u64,
    pub page_size: u64,
    pub site_base_url: String,
}

pub fn normalize_listings(payload: &Value, options: &ListingOptions) -> ListingPage {
    if options.off_market {
        return normalize_off_market(payload, options);
    }

    if payload.get(LISTINGS_KEY).map(|value| !value.is_array()).unwrap_or(true) {
        warn!(
            event_name = "response.listings.malformed",
            key = LISTINGS_KEY,
            "listing payload has no listings array; treating as empty"
        );
    }
    ListingPage {
        total: fields::unsigned(payload, "total"),
        start: fields::unsigned(payload, "start"),
        stop: fields::unsigned(payload, "stop"),
        listings: records(fields::array(payload, LISTINGS_KEY), &options.site_base_url),
    }
}

fn normalize_off_market(payload: &Value, options: &ListingOptions) -> ListingPage {
    let all = fields::array(payload, OFF_MARKET_LISTINGS_KEY);
    let start = usize::try_from(options.start).unwrap_or(usize::MAX).min(all.len());
    let width = usize::try_from(options.page_size.max(1)).unwrap_or(usize::MAX);
    let end = start.saturating_add(width).min(all.len());
    let page = &all[start..end];

    let total = match fields::unsigned(payload, "total") {
        0 => all.len() as u64,
        total => total,
    };
    ListingPage {
        total,
        start: options.start,
        stop: options.start + page.len() as u64,
        listings: records(page, &options.site_base_url),
    }
}

fn records(items: &[Value], site_base_url: &str) -> Vec<ListingRecord> {
    items
        .iter()
        .filter(|item| {
            let is_object = item.is_object();
            if !is_object {
                warn!(
                    event_name = "response.listings.malformed",
                    "skipping listing entry that is not an object"
                );
            }
            is_object
        })
        .map(|item| ListingRecord::from_payload(item, site_base_url))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{agent_slug, agent_url, normalize_listings, ListingOptions, ListingRecord};

    fn options(off_market: bool, start: u64) -> ListingOptions {
        ListingOptions {
            off_market,
            start,
            page_size: 5,
            site_base_url: "https://www.example.test".to_string(),
        }
    }

    #[test]
    fn missing_numeric_fields_become_zero() {
        let record = ListingRecord::from_payload(&json!({"id": "1", "address": "1 Main"}), "");
        assert_eq!(record.sqft, 0);
        assert_eq!(record.beds, 0);
        assert_eq!(record.price, 0.0);
        assert_eq!(record.mlsnum, None);
    }

    #[test]
    fn maps_payload_names_to_record_fields() {
        let record = ListingRecord::from_payload(
            &json!({
                "id": 88, "harid": "H1", "mlsnum": "M1", "price": "450000", "bed": "3",
                "bath": "2/1", "zip": 77008, "sqft": "2,100", "agentname": "Jane Q Public",
                "bookmarked": 1, "islogin": false
            }),
            "https://www.example.test/",
        );

        assert_eq!(record.id.as_deref(), Some("88"));
        assert_eq!(record.price, 450_000.0);
        assert_eq!(record.beds, 3);
        assert_eq!(record.bath.as_deref(), Some("2/1"));
        assert_eq!(record.zip_code.as_deref(), Some("77008"));
        assert_eq!(record.sqft, 2100);
        assert_eq!(
            record.agent_url.as_deref(),
            Some("https://www.example.test/jane-q-public/agent_88")
        );
        assert!(record.bookmarked);
        assert!(!record.islogin);
    }

    #[test]
    fn record_serializes_with_front_end_names() {
        let json = serde_json::to_value(ListingRecord::default()).expect("serialize");
        assert!(json.get("zipCode").is_some());
        assert!(json.get("agentUrl").is_some());
        assert_eq!(json["sqft"], 0);
    }

    #[test]
    fn agent_slug_is_lowercase_and_hyphenated() {
        assert_eq!(agent_slug("Mary Ann  Smith"), "mary-ann--smith");
        let once = agent_slug("Mary Ann Smith");
        assert_eq!(agent_slug(&once), once);
        assert_eq!(agent_url("https://x.test", "Bo Li", "42"), "https://x.test/bo-li/agent_42");
    }

    #[test]
    fn no_agent_name_means_no_agent_url() {
        let record = ListingRecord::from_payload(&json!({"id": "5"}), "https://x.test");
        assert_eq!(record.agent_url, None);
    }

    #[test]
    fn regular_page_keeps_server_pagination() {
        let payload = json!({
            "total": 42, "start": 5, "stop": 10,
            "listings": [{"id": "a"}, "junk", {"id": "b"}]
        });

        let page = normalize_listings(&payload, &options(false, 5));

        assert_eq!((page.total, page.start, page.stop), (42, 5, 10));
        assert_eq!(page.listings.len(), 2);
    }

    #[test]
    fn missing_markers_and_list_default_to_zero() {
        let page = normalize_listings(&json!({"message": "oops"}), &options(false, 0));
        assert_eq!((page.total, page.start, page.stop), (0, 0, 0));
        assert!(page.listings.is_empty());
    }

    #[test]
    fn off_market_results_are_sliced_client_side() {
        let items: Vec<_> = (0..12).map(|n| json!({"id": n.to_string()})).collect();
        let payload = json!({"offmarket_listings": items});

        let page = normalize_listings(&payload, &options(true, 10));

        assert_eq!(page.total, 12);
        assert_eq!((page.start, page.stop), (10, 12));
        let ids: Vec<_> = page.listings.iter().filter_map(|r| r.id.as_deref()).collect();
        assert_eq!(ids, vec!["10", "11"]);
    }

    #[test]
    fn off_market_offset_past_the_end_is_empty() {
        let payload = json!({"offmarket_listings": [{"id": "1"}]});
        let page = normalize_listings(&payload, &options(true, 20));
        assert!(page.listings.is_empty());
        assert_eq!((page.total, page.start, page.stop), (1, 20, 20));
    }
}
