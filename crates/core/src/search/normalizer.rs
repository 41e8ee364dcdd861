use std::fmt::Display;

use futures::future::{join, join_all};
use tracing::{debug, warn};

use crate::errors::RequestError;
use crate::reference::{fips_code, map_availability, property_type_ids, HOME_PROPERTY_TYPES};
use crate::request::CallerIdentity;
use crate::search::intent::{Amenity, QuickAccess, Range, SearchIntent};
use crate::search::query::{NormalizedQuery, Param};
use crate::search::resolver::{
    first_id, EntityKind, EntityResolver, SchoolLevel, UnresolvedEntity, COMMUNITY_ID_KEY,
    SCHOOL_ID_KEY,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NormalizeOutcome {
    Query(NormalizedQuery),
    /// At least one named entity had no id. Callers answer with zero results
    /// instead of searching with the filter silently removed.
    Unresolved(Vec<UnresolvedEntity>),
}

impl NormalizeOutcome {
    pub fn into_query(self) -> Option<NormalizedQuery> {
        match self {
            Self::Query(query) => Some(query),
            Self::Unresolved(_) => None,
        }
    }
}

#[derive(Debug, Default)]
struct ResolvedEntities {
    communities: Vec<String>,
    counties: Vec<String>,
    schools: Vec<(SchoolLevel, String)>,
    unresolved: Vec<UnresolvedEntity>,
}

/// Turns a [`SearchIntent`] into the flat parameter set of the listing API.
pub struct FilterNormalizer<R> {
    resolver: R,
    page_size: u32,
}

impl<R: EntityResolver> FilterNormalizer<R> {
    pub fn new(resolver: R, page_size: u32) -> Self {
        Self { resolver, page_size: page_size.max(1) }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Fails only when a lookup request itself fails; a lookup that finds
    /// nothing is reported through [`NormalizeOutcome::Unresolved`].
    pub async fn normalize(
        &self,
        intent: &SearchIntent,
        caller: Option<&CallerIdentity>,
    ) -> Result<NormalizeOutcome, RequestError> {
        let resolved = self.resolve_entities(intent).await?;
        if !resolved.unresolved.is_empty() {
            warn!(
                event_name = "search.normalize.unresolved",
                unresolved = resolved.unresolved.len(),
                first = %resolved.unresolved[0],
                "named entity lookup found nothing; answering with zero results"
            );
            return Ok(NormalizeOutcome::Unresolved(resolved.unresolved));
        }

        let mut query = NormalizedQuery::new();
        apply_location(&mut query, intent, &resolved);
        apply_ranges(&mut query, intent);
        apply_scalars(&mut query, intent);
        apply_enumerations(&mut query, intent, caller);
        apply_flags(&mut query, intent);
        self.apply_paging(&mut query, intent);

        debug!(
            event_name = "search.normalize.completed",
            params = query.len(),
            query = %query.to_query_string(),
            "search intent normalized"
        );
        Ok(NormalizeOutcome::Query(query))
    }

    async fn resolve_entities(&self, intent: &SearchIntent) -> Result<ResolvedEntities, RequestError> {
        let community_names: Vec<&str> = non_blank(&intent.community).collect();
        let school_names: Vec<(SchoolLevel, &str)> = SchoolLevel::ALL
            .into_iter()
            .filter_map(|level| school_name(intent, level).map(|name| (level, name)))
            .collect();

        let community_lookups =
            community_names.iter().map(|name| self.resolver.lookup_communities(name));
        let school_lookups =
            school_names.iter().map(|(level, name)| self.resolver.lookup_schools(name, *level));
        let (community_results, school_results) =
            join(join_all(community_lookups), join_all(school_lookups)).await;

        let mut resolved = ResolvedEntities::default();
        for (name, result) in community_names.iter().zip(community_results) {
            match first_id(&result?, COMMUNITY_ID_KEY) {
                Some(id) => resolved.communities.push(id),
                None => resolved.unresolved.push(UnresolvedEntity {
                    kind: EntityKind::Community,
                    name: (*name).to_owned(),
                }),
            }
        }
        for ((level, name), result) in school_names.iter().zip(school_results) {
            match first_id(&result?, SCHOOL_ID_KEY) {
                Some(id) => resolved.schools.push((*level, id)),
                None => resolved.unresolved.push(UnresolvedEntity {
                    kind: EntityKind::School(*level),
                    name: (*name).to_owned(),
                }),
            }
        }
        for name in non_blank(&intent.county) {
            match fips_code(name) {
                Some(code) => resolved.counties.push(code.to_owned()),
                None => resolved
                    .unresolved
                    .push(UnresolvedEntity { kind: EntityKind::County, name: name.to_owned() }),
            }
        }
        Ok(resolved)
    }

    fn apply_paging(&self, query: &mut NormalizedQuery, intent: &SearchIntent) {
        query.set_opt(Param::Sort, intent.sort.as_deref());
        query.set_opt(Param::Start, intent.start);
        query.set_opt(Param::ForSale, intent.for_sale);
        let max = intent.limit.unwrap_or(self.page_size).clamp(1, self.page_size);
        query.set(Param::Max, max);
    }
}

fn non_blank(values: &[String]) -> impl Iterator<Item = &str> {
    values.iter().map(|value| value.trim()).filter(|value| !value.is_empty())
}

fn school_name(intent: &SearchIntent, level: SchoolLevel) -> Option<&str> {
    let name = match level {
        SchoolLevel::District => intent.school_district.as_deref(),
        SchoolLevel::Elementary => intent.elementary_school.as_deref(),
        SchoolLevel::Middle => intent.middle_school.as_deref(),
        SchoolLevel::High => intent.high_school.as_deref(),
    }?;
    let name = name.trim();
    (!name.is_empty()).then_some(name)
}

fn apply_location(query: &mut NormalizedQuery, intent: &SearchIntent, resolved: &ResolvedEntities) {
    query.set_list(Param::City, &intent.city);
    query.set_list(Param::Community, &resolved.communities);
    query.set_list(Param::County, &resolved.counties);
    query.set_opt(Param::Subdivision, intent.subdivisions.as_deref());
    if let Some(zip) = &intent.zip_code {
        query.set_list(Param::ZipCode, zip.values());
    }
    query.set_opt(Param::MlsNumber, intent.mls_number.as_deref());
    for (level, id) in &resolved.schools {
        query.set(level.param(), id);
    }
}

fn apply_range<T: Copy + Display>(
    query: &mut NormalizedQuery,
    range: Option<&Range<T>>,
    min: Param,
    max: Param,
) {
    let Some(range) = range else {
        return;
    };
    let (lower, upper) = range.bounds();
    query.set_opt(min, lower);
    query.set_opt(max, upper);
}

fn apply_ranges(query: &mut NormalizedQuery, intent: &SearchIntent) {
    apply_range(query, intent.bedrooms.as_ref(), Param::BedroomMin, Param::BedroomMax);
    apply_range(query, intent.baths.as_ref(), Param::FullBathMin, Param::FullBathMax);
    apply_range(query, intent.price.as_ref(), Param::ListingPriceMin, Param::ListingPriceMax);
    apply_range(query, intent.lot_size.as_ref(), Param::LotSizeMin, Param::LotSizeMax);
    apply_range(query, intent.acres.as_ref(), Param::AcresMin, Param::AcresMax);
    apply_range(query, intent.square_feet.as_ref(), Param::SquareFeetMin, Param::SquareFeetMax);
    apply_range(query, intent.year_built.as_ref(), Param::YearBuiltMin, Param::YearBuiltMax);
    apply_range(query, intent.price_sqft.as_ref(), Param::PriceSqftMin, Param::PriceSqftMax);
    apply_range(query, intent.hoa_fee.as_ref(), Param::HoaFeeMin, Param::HoaFeeMax);
    apply_range(
        query,
        intent.days_on_market.as_ref(),
        Param::DaysOnMarketMin,
        Param::DaysOnMarketMax,
    );
}

fn apply_scalars(query: &mut NormalizedQuery, intent: &SearchIntent) {
    if intent.half_bath == Some(true) {
        query.set(Param::HalfBath, 1);
    }
    query.set_opt(Param::GarageNum, intent.garage_num);
    query.set_opt(Param::GarageDesc, intent.garage_desc.as_deref());
    query.set_list(Param::Stories, intent.stories.iter().map(f64::to_string));
    query.set_opt(Param::NewConstruction, intent.new_constr.as_deref());
    query.set_opt(Param::Parking, intent.parking);
    query.set_opt(Param::Style, intent.style.as_deref());
    query.set_list(Param::Financing, &intent.finance);
}

fn apply_enumerations(
    query: &mut NormalizedQuery,
    intent: &SearchIntent,
    caller: Option<&CallerIdentity>,
) {
    let names: Vec<&str> = if intent.property_type.is_empty() && intent.home_only == Some(true) {
        HOME_PROPERTY_TYPES.to_vec()
    } else {
        intent.property_type.iter().map(String::as_str).collect()
    };
    query.set_list(Param::PropertyClass, property_type_ids(names));

    let privileged = caller.map(|caller| caller.role.is_privileged()).unwrap_or(false);
    let statuses = map_availability(intent.availability.iter().map(String::as_str), privileged);
    query.set_list(Param::ListingStatus, statuses);
}

fn apply_flags(query: &mut NormalizedQuery, intent: &SearchIntent) {
    for flag in Amenity::ALL.iter().copied().filter(|flag| intent.amenities.is_set(*flag)) {
        query.set(Param::Amenity(flag), 1);
    }
    for flag in QuickAccess::ALL.iter().copied().filter(|flag| intent.wants_quick_access(*flag)) {
        query.set(Param::QuickAccess(flag), 1);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::{FilterNormalizer, NormalizeOutcome};
    use crate::errors::RequestError;
    use crate::request::{CallerIdentity, CallerRole};
    use crate::search::intent::{Amenity, QuickAccess, Range, SearchIntent};
    use crate::search::query::{NormalizedQuery, Param};
    use crate::search::resolver::{EntityKind, EntityResolver, SchoolLevel};

    #[derive(Default)]
    struct FakeResolver {
        communities: HashMap<String, Value>,
        schools: HashMap<(SchoolLevel, String), Value>,
        fail: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeResolver {
        fn with_community(mut self, name: &str, id: u64) -> Self {
            self.communities.insert(name.to_owned(), json!({"community": id}));
            self
        }

        fn with_school(mut self, level: SchoolLevel, name: &str, id: &str) -> Self {
            self.schools.insert((level, name.to_owned()), json!({"base_id": id}));
            self
        }
    }

    #[async_trait]
    impl EntityResolver for FakeResolver {
        async fn lookup_communities(&self, name: &str) -> Result<Vec<Value>, RequestError> {
            self.calls.lock().expect("calls lock").push(format!("community:{name}"));
            if self.fail {
                return Err(RequestError::Status { path: "/mpcfinder".to_owned(), status: 503 });
            }
            Ok(self.communities.get(name).cloned().into_iter().collect())
        }

        async fn lookup_schools(
            &self,
            name: &str,
            level: SchoolLevel,
        ) -> Result<Vec<Value>, RequestError> {
            self.calls.lock().expect("calls lock").push(format!("school:{name}"));
            Ok(self.schools.get(&(level, name.to_owned())).cloned().into_iter().collect())
        }
    }

    fn member() -> CallerIdentity {
        CallerIdentity::new("user-7", CallerRole::Member).with_member_number("M-100")
    }

    async fn normalize(resolver: FakeResolver, intent: SearchIntent) -> NormalizedQuery {
        let normalizer = FilterNormalizer::new(resolver, 5);
        match normalizer.normalize(&intent, None).await.expect("normalize") {
            NormalizeOutcome::Query(query) => query,
            NormalizeOutcome::Unresolved(entities) => panic!("unexpected unresolved: {entities:?}"),
        }
    }

    #[tokio::test]
    async fn city_and_price_cap_emit_only_their_keys() {
        let intent = SearchIntent {
            city: vec!["Houston".to_owned()],
            price: Some(Range::at_most(500_000)),
            limit: Some(5),
            ..SearchIntent::default()
        };

        let query = normalize(FakeResolver::default(), intent).await;

        assert_eq!(query.keys(), vec!["city", "listing_price_max", "max"]);
        assert_eq!(query.get(Param::City), Some("Houston"));
        assert_eq!(query.get(Param::ListingPriceMax), Some("500000"));
        assert_eq!(query.get(Param::Max), Some("5"));
    }

    #[tokio::test]
    async fn equal_bound_wins_over_min_and_max() {
        let intent = SearchIntent {
            bedrooms: Some(Range { min: Some(2), max: Some(5), equal: Some(3) }),
            acres: Some(Range::at_least(1.5)),
            ..SearchIntent::default()
        };

        let query = normalize(FakeResolver::default(), intent).await;

        assert_eq!(query.get(Param::BedroomMin), Some("3"));
        assert_eq!(query.get(Param::BedroomMax), Some("3"));
        assert_eq!(query.get(Param::AcresMin), Some("1.5"));
        assert!(!query.contains(Param::AcresMax));
    }

    #[tokio::test]
    async fn off_market_status_is_masked_for_public_callers() {
        let intent: SearchIntent =
            serde_json::from_value(json!({"availablity": ["WITH"]})).expect("intent");
        let normalizer = FilterNormalizer::new(FakeResolver::default(), 5);

        let public = normalizer.normalize(&intent, None).await.expect("normalize");
        let privileged = normalizer.normalize(&intent, Some(&member())).await.expect("normalize");

        let public = public.into_query().expect("query");
        let privileged = privileged.into_query().expect("query");
        assert_eq!(public.get(Param::ListingStatus), Some("inactive"));
        assert_eq!(privileged.get(Param::ListingStatus), Some("WITH"));
    }

    #[tokio::test]
    async fn unknown_community_short_circuits_to_unresolved() {
        let resolver = FakeResolver::default().with_community("Memorial", 77);
        let intent = SearchIntent {
            community: vec!["Memorial".to_owned(), "Atlantis".to_owned()],
            city: vec!["Houston".to_owned()],
            ..SearchIntent::default()
        };
        let normalizer = FilterNormalizer::new(resolver, 5);

        let outcome = normalizer.normalize(&intent, None).await.expect("normalize");

        let NormalizeOutcome::Unresolved(entities) = outcome else {
            panic!("expected unresolved outcome");
        };
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].kind, EntityKind::Community);
        assert_eq!(entities[0].name, "Atlantis");
    }

    #[tokio::test]
    async fn unknown_county_is_unresolved_without_a_lookup() {
        let intent = SearchIntent { county: vec!["Gotham".to_owned()], ..SearchIntent::default() };
        let normalizer = FilterNormalizer::new(FakeResolver::default(), 5);

        let outcome = normalizer.normalize(&intent, None).await.expect("normalize");

        assert!(matches!(outcome, NormalizeOutcome::Unresolved(ref e) if e[0].kind == EntityKind::County));
        assert!(normalizer.resolver().calls.lock().expect("calls lock").is_empty());
    }

    #[tokio::test]
    async fn resolved_entities_become_ids() {
        let resolver = FakeResolver::default()
            .with_community("Memorial", 77)
            .with_school(SchoolLevel::Elementary, "Bush", "E-12")
            .with_school(SchoolLevel::District, "Katy ISD", "D-3");
        let intent = SearchIntent {
            community: vec!["Memorial".to_owned()],
            county: vec!["Harris County".to_owned(), "fort bend".to_owned()],
            elementary_school: Some("Bush".to_owned()),
            school_district: Some("Katy ISD".to_owned()),
            ..SearchIntent::default()
        };

        let query = normalize(resolver, intent).await;

        assert_eq!(query.get(Param::Community), Some("77"));
        assert_eq!(query.get(Param::County), Some("48201,48157"));
        assert_eq!(query.get(Param::ElementarySchool), Some("E-12"));
        assert_eq!(query.get(Param::SchoolDistrict), Some("D-3"));
    }

    #[tokio::test]
    async fn lookup_transport_failure_propagates() {
        let resolver = FakeResolver { fail: true, ..FakeResolver::default() };
        let intent =
            SearchIntent { community: vec!["Memorial".to_owned()], ..SearchIntent::default() };
        let normalizer = FilterNormalizer::new(resolver, 5);

        let error = normalizer.normalize(&intent, None).await.expect_err("lookup should fail");

        assert!(matches!(error, RequestError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn quick_access_token_or_flag_sets_the_filter() {
        let mut intent = SearchIntent {
            quick_access: vec!["open house".to_owned(), "bogus".to_owned()],
            ..SearchIntent::default()
        };
        intent.quick.set(QuickAccess::PriceReduced);
        intent.amenities.set(Amenity::Pool);
        intent.amenities.waterfront = Some(false);

        let query = normalize(FakeResolver::default(), intent).await;

        assert_eq!(query.get(Param::QuickAccess(QuickAccess::OpenHouse)), Some("1"));
        assert_eq!(query.get(Param::QuickAccess(QuickAccess::PriceReduced)), Some("1"));
        assert!(!query.contains(Param::QuickAccess(QuickAccess::Foreclosure)));
        assert_eq!(query.get(Param::Amenity(Amenity::Pool)), Some("1"));
        assert!(!query.contains(Param::Amenity(Amenity::Waterfront)));
    }

    #[tokio::test]
    async fn home_only_defaults_to_residential_classes() {
        let intent = SearchIntent { home_only: Some(true), ..SearchIntent::default() };
        let query = normalize(FakeResolver::default(), intent).await;
        assert_eq!(query.get(Param::PropertyClass), Some("1,2,6"));

        let intent = SearchIntent {
            home_only: Some(true),
            property_type: vec!["Acreage".to_owned(), "Spaceship".to_owned()],
            ..SearchIntent::default()
        };
        let query = normalize(FakeResolver::default(), intent).await;
        assert_eq!(query.get(Param::PropertyClass), Some("5"));
    }

    #[tokio::test]
    async fn limit_is_clamped_to_page_size() {
        let intent = SearchIntent { limit: Some(40), start: Some(10), ..SearchIntent::default() };
        let query = normalize(FakeResolver::default(), intent).await;

        assert_eq!(query.get(Param::Max), Some("5"));
        assert_eq!(query.get(Param::Start), Some("10"));
        assert!(!query.contains(Param::Sort));
    }
}
