//! Search core for the listing assistant.
//!
//! Everything between a loosely-typed search intent and the records a
//! front-end renders lives here, free of any transport:
//!
//! 1. **Filter normalization** (`search`) - `SearchIntent` → `NormalizedQuery`
//! 2. **Request building** (`request`) - `NormalizedQuery` → `SignedRequest`
//! 3. **Response normalization** (`response`) - raw JSON → `ListingPage` / `PropertyDetailRecord`
//! 4. **Shape selection** (`answer`) - last tool → legal card schema for the `AnswerEnvelope`
//!
//! Network collaborators plug in through the `EntityResolver` and `Transport`
//! traits; `ListingService` wires the stages together.

pub mod answer;
pub mod config;
pub mod errors;
pub mod reference;
pub mod request;
pub mod response;
pub mod search;
pub mod service;

pub use answer::{
    answer_json_schema, parse_answer, select_schema, AnswerEnvelope, Card, CardSchema,
    PropertyCard, ToolKind,
};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
pub use errors::{ApplicationError, InterfaceError, RequestError};
pub use request::{
    CallerIdentity, CallerRole, Endpoint, RequestBuilder, SignedRequest, Transport,
};
pub use response::{
    AgentCard, DirectoryCard, ListingPage, ListingRecord, PropertyDetailRecord, SchoolCard,
};
pub use search::{
    EntityKind, EntityResolver, FilterNormalizer, NormalizeOutcome, NormalizedQuery, Param,
    SchoolLevel, SearchIntent, UnresolvedEntity,
};
pub use service::{ListingService, SearchResult};
