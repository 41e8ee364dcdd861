//! The assistant's tools, each a thin adapter over [`ListingService`].

use std::sync::Arc;

use async_trait::async_trait;
use homesearch_core::reference::{AVAILABILITY_CODES, PROPERTY_TYPE_IDS};
use homesearch_core::search::{Amenity, QuickAccess};
use homesearch_core::{
    ApplicationError, EntityResolver, ListingService, SchoolLevel, SearchIntent, ToolKind,
    Transport,
};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::tools::{Tool, ToolContext, ToolRegistry};

type Service<R, T> = Arc<ListingService<R, T>>;

/// Registers all six tools over one shared service.
pub fn register_all<R, T>(registry: &mut ToolRegistry, service: Service<R, T>)
where
    R: EntityResolver + 'static,
    T: Transport + 'static,
{
    registry.register(SearchPropertiesTool { service: Arc::clone(&service), sold: false });
    registry.register(SearchPropertiesTool { service: Arc::clone(&service), sold: true });
    registry.register(SearchByAddressTool { service: Arc::clone(&service) });
    registry.register(PropertyDetailTool { service: Arc::clone(&service) });
    registry.register(SearchAgentTool { service: Arc::clone(&service) });
    registry.register(SearchSchoolTool { service });
}

fn invalid(tool: ToolKind, message: impl Into<String>) -> ApplicationError {
    ApplicationError::InvalidToolInput { tool: tool.name().to_owned(), message: message.into() }
}

fn encode<S: Serialize>(value: &S) -> Result<Value, ApplicationError> {
    serde_json::to_value(value).map_err(|error| ApplicationError::Encoding(error.to_string()))
}

/// First non-blank string under any of `keys`.
fn text_arg(tool: ToolKind, input: &Value, keys: &[&str]) -> Result<String, ApplicationError> {
    keys.iter()
        .find_map(|key| input.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| invalid(tool, format!("missing `{}`", keys[0])))
}

/// The model sends `{"fields": {...}}`; a bare filter object is accepted too.
pub fn intent_from_input(tool: ToolKind, input: Value) -> Result<SearchIntent, ApplicationError> {
    let fields = match input {
        Value::Object(mut object) => object.remove("fields").unwrap_or(Value::Object(object)),
        Value::String(text) => {
            serde_json::from_str(&text).map_err(|error| invalid(tool, error.to_string()))?
        }
        other => other,
    };
    let fields = match fields {
        Value::Object(mut object) => object.remove("fields").unwrap_or(Value::Object(object)),
        Value::Null => return Ok(SearchIntent::default()),
        other => other,
    };
    serde_json::from_value(fields).map_err(|error| invalid(tool, error.to_string()))
}

fn string_list(description: &str) -> Value {
    json!({"type": "array", "items": {"type": "string"}, "description": description})
}

fn range(kind: &str, description: &str) -> Value {
    json!({
        "type": "object",
        "description": description,
        "properties": {
            "min": {"type": kind},
            "max": {"type": kind},
            "equal": {"type": kind, "description": "Exact value; overrides min and max"}
        }
    })
}

/// Input schema of the property search tools, derived from the filter model.
pub fn search_intent_schema() -> Value {
    let mut fields = Map::new();
    let mut put = |name: &str, schema: Value| {
        fields.insert(name.to_owned(), schema);
    };

    put("city", string_list("City names"));
    put("community", string_list("Master-planned community names"));
    put("county", string_list("Texas county names"));
    put("subdivisions", json!({"type": "string"}));
    put("zip_code", string_list("Zip codes"));
    put("mls_number", json!({"type": "string"}));

    put("bedrooms", range("integer", "Bedroom count"));
    put("baths", range("integer", "Full bathroom count"));
    put("price", range("integer", "Listing price in dollars"));
    put("lot_size", range("integer", "Lot size in square feet"));
    put("acres", range("number", "Lot size in acres"));
    put("square_feet", range("integer", "Building square feet"));
    put("year_built", range("integer", "Year built"));
    put("price_sqft", range("integer", "Price per square foot"));
    put("hoa_fee", range("integer", "Monthly HOA fee"));
    put("days_on_market", range("integer", "Days on market"));

    put("half_bath", json!({"type": "boolean"}));
    put("garage_num", json!({"type": "integer"}));
    put("garage_desc", json!({"type": "string"}));
    put("stories", json!({"type": "array", "items": {"type": "number"}}));
    put("new_constr", json!({"type": "string"}));
    put("parking", json!({"type": "integer"}));
    let property_types: Vec<&str> = PROPERTY_TYPE_IDS.iter().map(|(name, _)| *name).collect();
    put(
        "property_type",
        json!({"type": "array", "items": {"type": "string", "enum": property_types}}),
    );
    put(
        "home_only",
        json!({"type": "boolean", "description": "User asked for homes without naming a type"}),
    );
    put("style", json!({"type": "string"}));
    put("finance", string_list("Accepted financing types"));
    put(
        "availability",
        json!({"type": "array", "items": {"type": "string", "enum": AVAILABILITY_CODES}}),
    );
    let quick: Vec<&str> = QuickAccess::ALL.iter().map(|flag| flag.as_str()).collect();
    put("quick_access", json!({"type": "array", "items": {"type": "string", "enum": quick}}));

    put("sort", json!({"type": "string", "description": "Sort key; defaults to newest first"}));
    put("start", json!({"type": "integer", "description": "Offset; add the page size for more"}));
    put("limit", json!({"type": "integer"}));
    put("sold", json!({"type": "boolean"}));
    put("for_sale", json!({"type": "integer", "enum": [0, 1]}));

    put("school_district", json!({"type": "string"}));
    put("elementary_school", json!({"type": "string"}));
    put("middle_school", json!({"type": "string"}));
    put("high_school", json!({"type": "string"}));

    for amenity in Amenity::ALL {
        put(amenity.as_str(), json!({"type": "boolean"}));
    }
    for flag in QuickAccess::ALL {
        put(flag.as_str(), json!({"type": "boolean"}));
    }

    json!({
        "type": "object",
        "properties": {"fields": {"type": "object", "properties": fields}},
        "required": ["fields"]
    })
}

pub struct SearchPropertiesTool<R, T> {
    service: Service<R, T>,
    sold: bool,
}

#[async_trait]
impl<R, T> Tool for SearchPropertiesTool<R, T>
where
    R: EntityResolver + 'static,
    T: Transport + 'static,
{
    fn kind(&self) -> ToolKind {
        if self.sold {
            ToolKind::SearchSold
        } else {
            ToolKind::SearchProperties
        }
    }

    fn description(&self) -> &'static str {
        if self.sold {
            "Search sold properties based on input filters."
        } else {
            "Search properties for sale or lease based on input filters."
        }
    }

    fn parameters(&self) -> Value {
        search_intent_schema()
    }

    async fn execute(&self, input: Value, context: &ToolContext) -> Result<Value, ApplicationError> {
        let mut intent = intent_from_input(self.kind(), input)?;
        if self.sold {
            intent.sold = Some(true);
        }
        let result = self.service.search(&intent, context.caller.as_ref(), context.now).await?;

        let mut output = encode(&result)?;
        if let Some(summary) = result.unresolved_summary() {
            output["message"] = Value::String(summary);
        }
        Ok(output)
    }
}

pub struct SearchByAddressTool<R, T> {
    service: Service<R, T>,
}

#[async_trait]
impl<R, T> Tool for SearchByAddressTool<R, T>
where
    R: EntityResolver + 'static,
    T: Transport + 'static,
{
    fn kind(&self) -> ToolKind {
        ToolKind::SearchByAddress
    }

    fn description(&self) -> &'static str {
        "Find listings by street address."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"address": {"type": "string"}},
            "required": ["address"]
        })
    }

    async fn execute(&self, input: Value, context: &ToolContext) -> Result<Value, ApplicationError> {
        let address = text_arg(self.kind(), &input, &["address", "query"])?;
        let page =
            self.service.quick_search(&address, context.caller.as_ref(), context.now).await?;
        encode(&page)
    }
}

pub struct PropertyDetailTool<R, T> {
    service: Service<R, T>,
}

#[async_trait]
impl<R, T> Tool for PropertyDetailTool<R, T>
where
    R: EntityResolver + 'static,
    T: Transport + 'static,
{
    fn kind(&self) -> ToolKind {
        ToolKind::PropertyDetail
    }

    fn description(&self) -> &'static str {
        "Get full details of one property by its listing id."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"id": {"type": "string", "description": "Listing id or harid"}},
            "required": ["id"]
        })
    }

    async fn execute(&self, input: Value, context: &ToolContext) -> Result<Value, ApplicationError> {
        let id = match input.get("id") {
            Some(Value::Number(id)) => id.to_string(),
            _ => text_arg(self.kind(), &input, &["id", "harid"])?,
        };
        let record = self.service.detail(&id, context.caller.as_ref(), context.now).await?;
        let mut output = encode(&record)?;
        output["found"] = Value::Bool(record.is_found());
        Ok(output)
    }
}

pub struct SearchAgentTool<R, T> {
    service: Service<R, T>,
}

#[async_trait]
impl<R, T> Tool for SearchAgentTool<R, T>
where
    R: EntityResolver + 'static,
    T: Transport + 'static,
{
    fn kind(&self) -> ToolKind {
        ToolKind::SearchAgent
    }

    fn description(&self) -> &'static str {
        "Search property agent based on name."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "Name": {"type": "string", "description": "Agent name to search for"}
            },
            "required": ["Name"]
        })
    }

    async fn execute(&self, input: Value, context: &ToolContext) -> Result<Value, ApplicationError> {
        let name = text_arg(self.kind(), &input, &["Name", "name"])?;
        let agents =
            self.service.search_agents(&name, context.caller.as_ref(), context.now).await?;
        Ok(json!({"agents": encode(&agents)?}))
    }
}

pub struct SearchSchoolTool<R, T> {
    service: Service<R, T>,
}

#[async_trait]
impl<R, T> Tool for SearchSchoolTool<R, T>
where
    R: EntityResolver + 'static,
    T: Transport + 'static,
{
    fn kind(&self) -> ToolKind {
        ToolKind::SearchSchool
    }

    fn description(&self) -> &'static str {
        "Search schools or school districts by name."
    }

    fn parameters(&self) -> Value {
        let levels: Vec<&str> = SchoolLevel::ALL.iter().map(|level| level.lookup_type()).collect();
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "level": {"type": "string", "enum": levels}
            },
            "required": ["name"]
        })
    }

    async fn execute(&self, input: Value, _context: &ToolContext) -> Result<Value, ApplicationError> {
        let name = text_arg(self.kind(), &input, &["name", "Name"])?;
        let level = match input.get("level").and_then(Value::as_str) {
            None => SchoolLevel::Elementary,
            Some(raw) => SchoolLevel::ALL
                .into_iter()
                .find(|level| level.lookup_type().eq_ignore_ascii_case(raw.trim()))
                .ok_or_else(|| invalid(self.kind(), format!("unknown school level `{raw}`")))?,
        };
        let schools = self.service.search_schools(&name, level).await?;
        Ok(json!({"schools": encode(&schools)?}))
    }
}
