//! Shaping of listing API payloads into the records the assistant returns.
//! Nothing here fails on an unexpected shape; missing values default.

pub mod detail;
pub mod directory;
pub mod fields;
pub mod listing;

pub use detail::{normalize_detail, PropertyDetailRecord};
pub use directory::{agent_cards, school_cards, AgentCard, DirectoryCard, SchoolCard};
pub use listing::{
    agent_slug, agent_url, normalize_listings, ListingOptions, ListingPage, ListingRecord,
};
