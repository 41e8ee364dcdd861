//! Search intent model and its normalization into listing API parameters.

pub mod intent;
pub mod normalizer;
pub mod query;
pub mod resolver;

pub use intent::{
    Amenity, AmenityFlags, OneOrMany, QuickAccess, QuickAccessFlags, Range, SearchIntent,
    DEFAULT_PAGE_SIZE,
};
pub use normalizer::{FilterNormalizer, NormalizeOutcome};
pub use query::{NormalizedQuery, Param};
pub use resolver::{EntityKind, EntityResolver, SchoolLevel, UnresolvedEntity};
