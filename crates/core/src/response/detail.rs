use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::response::fields;

/// Feature rows kept from `detail.detailitems` when `detail.type` is `value`.
pub const VALUE_FEATURE_KEYS: &[&str] = &[
    "Status",
    "Price/SQFT",
    "Bedrooms",
    "Baths",
    "Subdivision",
    "Year Built",
    "Lotsize",
    "Building SQFT",
    "Owner Name",
];

/// Feature rows kept for every other detail type. `Legal Descriptio` is the
/// API's own truncated title.
pub const LISTING_FEATURE_KEYS: &[&str] = &[
    "Price per SQFT",
    "Property Type",
    "Bedrooms",
    "County",
    "Subdivision",
    "Legal Descriptio",
    "Garage",
    "Stories",
    "Style",
    "Baths",
    "Year Built",
    "Building Sqft",
    "Lotsize",
    "Acre(s)",
    "Maintenance Fee",
    "Market Area",
];

const LISTING_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single property, flattened for the assistant. `features` holds the
/// allow-listed title/value rows and serializes at the top level.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PropertyDetailRecord {
    pub mlsnum: Option<String>,
    pub harid: Option<String>,
    pub listing_date: Option<String>,
    pub days_on_market: Option<i64>,
    pub address: Option<String>,
    pub price: f64,
    pub beds: Option<String>,
    pub shareurl: Option<String>,
    pub city: Option<String>,
    #[serde(rename = "zipCode")]
    pub zip_code: Option<String>,
    pub sqft: i64,
    pub agent: Option<String>,
    pub agentphoto: Option<String>,
    pub agent_details: Value,
    pub photo: Option<String>,
    pub status: Option<String>,
    pub broker: Option<String>,
    pub broker_details: Value,
    pub schools: Value,
    pub sound_score: Value,
    pub exterior: Value,
    pub interior: Value,
    pub rooms: Value,
    pub rooms_metric: Value,
    pub mortgage: Value,
    pub openhouse: Value,
    pub tax_details: Value,
    pub neighborhood_info: Value,
    pub carmode: Value,
    pub virtual_tours: Value,
    pub soldprice: Value,
    pub soldpricerange: Value,
    pub solddate: Value,
    pub soldpricesqft: Value,
    pub application_fee: Value,
    pub security_deposit: Value,
    pub rental_terms: Value,
    pub rental_type: Value,
    pub maint_fee_includes: Value,
    pub tax_rate: Value,
    pub tax_amount: Value,
    #[serde(flatten)]
    pub features: BTreeMap<String, Option<String>>,
}

impl PropertyDetailRecord {
    /// A detail lookup found a property only when it carries a harid.
    pub fn is_found(&self) -> bool {
        self.harid.is_some()
    }
}

pub fn normalize_detail(payload: &Value, now: DateTime<Utc>) -> PropertyDetailRecord {
    let detail = payload.get("detail").filter(|value| value.is_object()).unwrap_or(&Value::Null);
    let items = detail.get("detailitems").unwrap_or(&Value::Null);
    let titles = fields::array(items, "titles");
    let values = fields::array(items, "values");

    let allowed = if detail.get("type").and_then(Value::as_str) == Some("value") {
        VALUE_FEATURE_KEYS
    } else {
        LISTING_FEATURE_KEYS
    };
    let features = select_features(titles, values, allowed);

    let beds = titles
        .iter()
        .position(|title| title.as_str() == Some("Bedrooms"))
        .and_then(|index| values.get(index))
        .and_then(fields::as_text);

    let extra = payload.get("extra").unwrap_or(&Value::Null);
    let lease = line_items(extra, "lease");
    let finance = line_items(extra, "finance");

    let realtor = fields::object_or_empty(payload, "realtor");
    let broker = fields::object_or_empty(payload, "broker");
    let photo = payload
        .get("photos")
        .map(|photos| fields::array(photos, "urls"))
        .and_then(|urls| urls.first())
        .and_then(fields::as_text);

    let listing_date = fields::string(detail, "date");
    let days_on_market = listing_date.as_deref().and_then(|date| days_since(date, now));

    let record = PropertyDetailRecord {
        mlsnum: fields::string(payload, "mlsnum"),
        harid: fields::string(payload, "harid"),
        days_on_market,
        listing_date,
        address: fields::string(detail, "address"),
        price: fields::float(detail, "price"),
        beds,
        shareurl: fields::string(payload, "share_url"),
        city: fields::string(detail, "city"),
        zip_code: fields::string(detail, "zip"),
        sqft: fields::integer(detail, "sqft"),
        agent: fields::string(&realtor, "agentname"),
        agentphoto: fields::string(&realtor, "photo"),
        photo,
        status: fields::string(detail, "status"),
        broker: fields::string(&broker, "officename"),
        agent_details: realtor,
        broker_details: broker,
        schools: fields::raw(payload, "schools"),
        sound_score: fields::raw(payload, "sound_score"),
        exterior: fields::raw(payload, "exterior"),
        interior: fields::raw(payload, "interior"),
        rooms: fields::raw(payload, "rooms"),
        rooms_metric: fields::raw(payload, "rooms_metric"),
        mortgage: fields::raw(payload, "mortgage"),
        openhouse: fields::raw(payload, "openhouse"),
        tax_details: fields::raw(payload, "tax"),
        neighborhood_info: fields::raw(payload, "neighborhoodinfo"),
        carmode: fields::raw(payload, "carmode"),
        virtual_tours: fields::raw(payload, "virtual_tours"),
        soldprice: fields::raw(detail, "soldprice"),
        soldpricerange: fields::raw(detail, "soldpricerange"),
        solddate: fields::raw(detail, "solddate"),
        soldpricesqft: fields::raw(detail, "soldpricesqft"),
        application_fee: labelled(lease, "Application Fee"),
        security_deposit: labelled(lease, "Security Deposit"),
        rental_terms: labelled(lease, "Rental Terms"),
        rental_type: labelled(lease, "Rental Type"),
        maint_fee_includes: labelled(finance, "Maint Fee Includes"),
        tax_rate: labelled(finance, "Tax Rate"),
        tax_amount: labelled(finance, "Taxes W/o Exemp"),
        features,
    };

    debug!(
        event_name = "response.detail.normalized",
        found = record.is_found(),
        features = record.features.len(),
        "property detail normalized"
    );
    record
}

/// Zips the parallel arrays, keeping allow-listed titles. Arrays of unequal
/// length are ignored entirely since their rows cannot be paired reliably.
fn select_features(
    titles: &[Value],
    values: &[Value],
    allowed: &[&str],
) -> BTreeMap<String, Option<String>> {
    if titles.is_empty() || titles.len() != values.len() {
        return BTreeMap::new();
    }
    titles
        .iter()
        .zip(values)
        .filter_map(|(title, value)| {
            let title = title.as_str()?;
            allowed.contains(&title).then(|| {
                let value = value.as_str().map(str::trim).filter(|text| !text.is_empty());
                (title.to_string(), value.map(str::to_string))
            })
        })
        .collect()
}

/// `extra.<section>.data`: a list of single-key objects.
fn line_items<'a>(extra: &'a Value, section: &str) -> &'a [Value] {
    extra.get(section).map(|section| fields::array(section, "data")).unwrap_or(&[])
}

fn labelled(items: &[Value], label: &str) -> Value {
    items.iter().find_map(|item| item.get(label).cloned()).unwrap_or(Value::Null)
}

fn days_since(date: &str, now: DateTime<Utc>) -> Option<i64> {
    let listed = NaiveDateTime::parse_from_str(date.trim(), LISTING_DATE_FORMAT).ok()?;
    Some((now.naive_utc() - listed).num_days())
}
