//! One search, end to end: normalize, sign, send, shape.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::errors::RequestError;
use crate::request::{CallerIdentity, Endpoint, RequestBuilder, SignedRequest, Transport};
use crate::response::{
    agent_cards, normalize_detail, normalize_listings, school_cards, AgentCard, ListingOptions,
    ListingPage, PropertyDetailRecord, SchoolCard,
};
use crate::search::{
    EntityResolver, FilterNormalizer, NormalizeOutcome, SchoolLevel, SearchIntent,
    UnresolvedEntity,
};

/// Query parameter carrying free text on the quick-search endpoint.
pub const QUICK_SEARCH_PARAM: &str = "query";
/// Query parameter carrying the agent name on the agent-search endpoint.
pub const AGENT_SEARCH_PARAM: &str = "name";

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub page: ListingPage,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<UnresolvedEntity>,
}

impl SearchResult {
    pub fn is_zero_result(&self) -> bool {
        !self.unresolved.is_empty()
    }

    /// Sentence naming every entity that blocked the search, if any.
    pub fn unresolved_summary(&self) -> Option<String> {
        if self.unresolved.is_empty() {
            return None;
        }
        let names: Vec<String> = self.unresolved.iter().map(ToString::to_string).collect();
        Some(format!("No listings were searched because {}.", names.join("; ")))
    }
}

pub struct ListingService<R, T> {
    normalizer: FilterNormalizer<R>,
    builder: RequestBuilder,
    transport: T,
    site_base_url: String,
}

impl<R: EntityResolver, T: Transport> ListingService<R, T> {
    pub fn new(
        normalizer: FilterNormalizer<R>,
        builder: RequestBuilder,
        transport: T,
        site_base_url: impl Into<String>,
    ) -> Self {
        Self { normalizer, builder, transport, site_base_url: site_base_url.into() }
    }

    pub fn page_size(&self) -> u32 {
        self.normalizer.page_size()
    }

    pub fn normalizer(&self) -> &FilterNormalizer<R> {
        &self.normalizer
    }

    pub fn builder(&self) -> &RequestBuilder {
        &self.builder
    }

    /// Searches active or sold listings. An unresolved named entity yields an
    /// empty page and no upstream request.
    pub async fn search(
        &self,
        intent: &SearchIntent,
        caller: Option<&CallerIdentity>,
        now: DateTime<Utc>,
    ) -> Result<SearchResult, RequestError> {
        let query = match self.normalizer.normalize(intent, caller).await? {
            NormalizeOutcome::Query(query) => query,
            NormalizeOutcome::Unresolved(unresolved) => {
                return Ok(SearchResult { page: ListingPage::empty(), unresolved });
            }
        };

        let endpoint = if intent.targets_sold() { Endpoint::Sold } else { Endpoint::Listings };
        let request = self.builder.build(&endpoint, &query.to_query_string(), caller, now);
        let payload = self.send(&endpoint, &request).await?;

        let options = ListingOptions {
            off_market: query.targets_off_market(),
            start: u64::from(query.start()),
            page_size: u64::from(self.page_size()),
            site_base_url: self.site_base_url.clone(),
        };
        let page = normalize_listings(&payload, &options);
        debug!(
            event_name = "search.page.normalized",
            endpoint = endpoint.name(),
            total = page.total,
            returned = page.listings.len(),
            off_market = options.off_market,
            "listing page normalized"
        );
        Ok(SearchResult { page, unresolved: Vec::new() })
    }

    /// Looks a free-text address up on the quick-search endpoint.
    pub async fn quick_search(
        &self,
        address: &str,
        caller: Option<&CallerIdentity>,
        now: DateTime<Utc>,
    ) -> Result<ListingPage, RequestError> {
        let endpoint = Endpoint::QuickSearch;
        let query = format!("{QUICK_SEARCH_PARAM}={}", free_text(address));
        let request = self.builder.build(&endpoint, &query, caller, now);
        let payload = self.send(&endpoint, &request).await?;

        let options = ListingOptions {
            off_market: false,
            start: 0,
            page_size: u64::from(self.page_size()),
            site_base_url: self.site_base_url.clone(),
        };
        Ok(normalize_listings(&payload, &options))
    }

    pub async fn detail(
        &self,
        id: &str,
        caller: Option<&CallerIdentity>,
        now: DateTime<Utc>,
    ) -> Result<PropertyDetailRecord, RequestError> {
        let endpoint = Endpoint::Detail { id: free_text(id) };
        let request = self.builder.build(&endpoint, "", caller, now);
        let payload = self.send(&endpoint, &request).await?;
        Ok(normalize_detail(&payload, now))
    }

    pub async fn search_agents(
        &self,
        name: &str,
        caller: Option<&CallerIdentity>,
        now: DateTime<Utc>,
    ) -> Result<Vec<AgentCard>, RequestError> {
        let endpoint = Endpoint::AgentSearch;
        let query = format!("{AGENT_SEARCH_PARAM}={}", free_text(name));
        let request = self.builder.build(&endpoint, &query, caller, now);
        let payload = self.send(&endpoint, &request).await?;
        Ok(agent_cards(&payload))
    }

    /// School lookups go through the entity resolver; no signed request.
    pub async fn search_schools(
        &self,
        name: &str,
        level: SchoolLevel,
    ) -> Result<Vec<SchoolCard>, RequestError> {
        let results = self.normalizer.resolver().lookup_schools(name.trim(), level).await?;
        Ok(school_cards(&results))
    }

    async fn send(
        &self,
        endpoint: &Endpoint,
        request: &SignedRequest,
    ) -> Result<serde_json::Value, RequestError> {
        info!(
            event_name = "api.request.sent",
            endpoint = endpoint.name(),
            path = %request.path,
            "sending signed listing request"
        );
        self.transport.get_json(request).await
    }
}

/// Free text placed in a query value; characters that would split the query
/// are dropped.
fn free_text(raw: &str) -> String {
    raw.trim().chars().filter(|ch| !matches!(ch, '&' | '=' | '?' | '#')).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use secrecy::SecretString;
    use serde_json::{json, Value};

    use super::{free_text, ListingService};
    use crate::errors::RequestError;
    use crate::request::signing::{HEADER_AUTH, HEADER_USER_ID};
    use crate::request::{
        CallerIdentity, CallerRole, Endpoint, RequestBuilder, SignedRequest, Transport,
    };
    use crate::search::{EntityResolver, FilterNormalizer, SchoolLevel, SearchIntent};

    struct StaticResolver;

    #[async_trait]
    impl EntityResolver for StaticResolver {
        async fn lookup_communities(&self, name: &str) -> Result<Vec<Value>, RequestError> {
            Ok(if name == "Memorial" { vec![json!({"community": 77})] } else { Vec::new() })
        }

        async fn lookup_schools(
            &self,
            name: &str,
            _level: SchoolLevel,
        ) -> Result<Vec<Value>, RequestError> {
            Ok(vec![json!({"base_id": "S1", "name": name})])
        }
    }

    struct RecordingTransport {
        sent: Mutex<Vec<SignedRequest>>,
        reply: Value,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn get_json(&self, request: &SignedRequest) -> Result<Value, RequestError> {
            self.sent.lock().expect("lock").push(request.clone());
            Ok(self.reply.clone())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("valid time")
    }

    fn service(reply: Value) -> ListingService<StaticResolver, RecordingTransport> {
        let builder = RequestBuilder::new(
            "https://api.example.test/",
            SecretString::from("tok".to_owned()),
            SecretString::from("sec".to_owned()),
        );
        ListingService::new(
            FilterNormalizer::new(StaticResolver, 5),
            builder,
            RecordingTransport { sent: Mutex::default(), reply },
            "https://www.example.test",
        )
    }

    fn intent(value: Value) -> SearchIntent {
        serde_json::from_value(value).expect("intent")
    }

    fn sent_paths(service: &ListingService<StaticResolver, RecordingTransport>) -> Vec<String> {
        service.transport.sent.lock().expect("lock").iter().map(|r| r.path.clone()).collect()
    }

    #[tokio::test]
    async fn active_search_hits_the_listings_endpoint() {
        let service = service(json!({"total": 1, "start": 0, "stop": 1, "listings": [{"id": "1"}]}));

        let result = service
            .search(&intent(json!({"city": ["Houston"], "price": {"max": 500000}})), None, now())
            .await
            .expect("search");

        assert_eq!(result.page.total, 1);
        assert!(!result.is_zero_result());
        assert_eq!(
            sent_paths(&service),
            vec!["/chatbot/listings?city=Houston&listing_price_max=500000&max=5".to_owned()]
        );
    }

    #[tokio::test]
    async fn delimiters_inside_filter_values_are_escaped_and_signed() {
        let service = service(json!({"listings": []}));

        service
            .search(
                &intent(json!({"subdivisions": "Oak Forest & Shepherd Park", "style": "A=B"})),
                None,
                now(),
            )
            .await
            .expect("search");

        let sent = service.transport.sent.lock().expect("lock").clone();
        let query = "subdivision=Oak Forest %26 Shepherd Park&style=A%3DB&max=5";
        assert_eq!(sent[0].path, format!("/chatbot/listings?{query}"));
        assert!(sent[0]
            .url
            .ends_with("/chatbot/listings?subdivision=Oak%20Forest%20%26%20Shepherd%20Park&style=A%3DB&max=5"));

        let resigned = service.builder.build(&Endpoint::Listings, query, None, now());
        assert_eq!(sent[0].header(HEADER_AUTH), resigned.header(HEADER_AUTH));
    }

    #[tokio::test]
    async fn sold_intent_hits_the_sold_endpoint() {
        let service = service(json!({"listings": []}));

        service.search(&intent(json!({"sold": true})), None, now()).await.expect("search");

        assert!(sent_paths(&service)[0].starts_with("/chatbot/sold?"));
    }

    #[tokio::test]
    async fn unresolved_entity_answers_zero_without_a_request() {
        let service = service(json!({"total": 99}));

        let result = service
            .search(&intent(json!({"community": ["Atlantis"]})), None, now())
            .await
            .expect("search");

        assert!(result.is_zero_result());
        assert_eq!((result.page.total, result.page.listings.len()), (0, 0));
        assert!(sent_paths(&service).is_empty());
        let summary = result.unresolved_summary().expect("summary");
        assert!(summary.contains("no community named `Atlantis`"));

        let json = serde_json::to_value(&result).expect("serialize");
        assert_eq!(json["total"], 0);
        assert_eq!(json["listings"], json!([]));
    }

    #[tokio::test]
    async fn off_market_results_are_paged_locally_for_members() {
        let items: Vec<Value> = (0..8).map(|n| json!({"id": n.to_string()})).collect();
        let service = service(json!({"offmarket_listings": items}));
        let member = CallerIdentity::new("7", CallerRole::Member);

        let result = service
            .search(&intent(json!({"availablity": ["WITH"], "start": 5})), Some(&member), now())
            .await
            .expect("search");

        assert_eq!(result.page.total, 8);
        assert_eq!((result.page.start, result.page.stop), (5, 8));
        assert_eq!(result.page.listings.len(), 3);
    }

    #[tokio::test]
    async fn detail_is_fetched_by_id_and_normalized() {
        let service = service(json!({"harid": "H1", "detail": {"price": "10"}}));

        let record = service.detail(" 123 ", None, now()).await.expect("detail");

        assert!(record.is_found());
        assert_eq!(sent_paths(&service), vec!["/chatbot/property/123".to_owned()]);
    }

    #[tokio::test]
    async fn quick_search_and_agent_search_send_free_text() {
        let service = service(json!({"agents": [{"agentname": "Ana Ruiz"}], "listings": []}));

        service.quick_search("12 Oak St #4", None, now()).await.expect("quick search");
        let agents = service.search_agents("Ana Ruiz", None, now()).await.expect("agents");

        assert_eq!(agents.len(), 1);
        assert_eq!(
            sent_paths(&service),
            vec![
                "/chatbot/quicksearch?query=12 Oak St 4".to_owned(),
                "/chatbot/agents?name=Ana Ruiz".to_owned()
            ]
        );
    }

    #[tokio::test]
    async fn agent_search_signs_with_the_caller_identity() {
        let service = service(json!({"agents": []}));
        let member = CallerIdentity::new("u-42", CallerRole::Member);

        service.search_agents("Ana Ruiz", Some(&member), now()).await.expect("agents");

        let sent = service.transport.sent.lock().expect("lock").clone();
        assert_eq!(sent[0].header(HEADER_USER_ID), Some("u-42"));
    }

    #[tokio::test]
    async fn school_search_uses_the_resolver() {
        let service = service(Value::Null);

        let schools =
            service.search_schools("Bellaire", SchoolLevel::High).await.expect("schools");

        assert_eq!(schools[0].name.as_deref(), Some("Bellaire"));
        assert!(sent_paths(&service).is_empty());
    }

    #[test]
    fn free_text_drops_query_delimiters() {
        assert_eq!(free_text(" a&b=c?d#e "), "abcde");
    }
}
