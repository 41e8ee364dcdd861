use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::errors::RequestError;
use crate::search::query::Param;

/// Key holding a community id in a community lookup result.
pub const COMMUNITY_ID_KEY: &str = "community";
/// Key holding a school id in a school lookup result.
pub const SCHOOL_ID_KEY: &str = "base_id";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchoolLevel {
    District,
    Elementary,
    Middle,
    High,
}

impl SchoolLevel {
    pub const ALL: [SchoolLevel; 4] = [Self::District, Self::Elementary, Self::Middle, Self::High];

    /// Value of the lookup endpoint's `type` parameter.
    pub fn lookup_type(self) -> &'static str {
        match self {
            Self::District => "district",
            Self::Elementary => "elementary",
            Self::Middle => "middle",
            Self::High => "high",
        }
    }

    pub fn param(self) -> Param {
        match self {
            Self::District => Param::SchoolDistrict,
            Self::Elementary => Param::ElementarySchool,
            Self::Middle => Param::MiddleSchool,
            Self::High => Param::HighSchool,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Community,
    County,
    School(SchoolLevel),
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Community => f.write_str("community"),
            Self::County => f.write_str("county"),
            Self::School(SchoolLevel::District) => f.write_str("school district"),
            Self::School(level) => write!(f, "{} school", level.lookup_type()),
        }
    }
}

/// A named place or school that no lookup could map to an id.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize)]
#[error("no {kind} named `{name}`")]
pub struct UnresolvedEntity {
    pub kind: EntityKind,
    pub name: String,
}

/// Name-to-id lookups for communities and schools. Implementations return the
/// raw result array; an empty array means "not found".
#[async_trait]
pub trait EntityResolver: Send + Sync {
    async fn lookup_communities(&self, name: &str) -> Result<Vec<Value>, RequestError>;

    async fn lookup_schools(
        &self,
        name: &str,
        level: SchoolLevel,
    ) -> Result<Vec<Value>, RequestError>;
}

#[async_trait]
impl<T: EntityResolver + ?Sized> EntityResolver for Arc<T> {
    async fn lookup_communities(&self, name: &str) -> Result<Vec<Value>, RequestError> {
        (**self).lookup_communities(name).await
    }

    async fn lookup_schools(
        &self,
        name: &str,
        level: SchoolLevel,
    ) -> Result<Vec<Value>, RequestError> {
        (**self).lookup_schools(name, level).await
    }
}

/// Id from the first lookup result, accepting string or numeric ids.
pub fn first_id(results: &[Value], key: &str) -> Option<String> {
    match results.first()?.get(key)? {
        Value::String(id) if !id.trim().is_empty() => Some(id.trim().to_owned()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{first_id, EntityKind, SchoolLevel, UnresolvedEntity, COMMUNITY_ID_KEY};

    #[test]
    fn first_id_reads_only_the_first_result() {
        let results = vec![json!({"community": 4021}), json!({"community": "9"})];
        assert_eq!(first_id(&results, COMMUNITY_ID_KEY), Some("4021".to_owned()));
    }

    #[test]
    fn first_id_is_none_for_missing_or_blank_ids() {
        assert_eq!(first_id(&[], COMMUNITY_ID_KEY), None);
        assert_eq!(first_id(&[json!({"community": " "})], COMMUNITY_ID_KEY), None);
        assert_eq!(first_id(&[json!({"name": "Memorial"})], COMMUNITY_ID_KEY), None);
    }

    #[test]
    fn unresolved_entity_reads_naturally() {
        let entity = UnresolvedEntity {
            kind: EntityKind::School(SchoolLevel::Elementary),
            name: "Nowhere".to_owned(),
        };
        assert_eq!(entity.to_string(), "no elementary school named `Nowhere`");
    }
}
