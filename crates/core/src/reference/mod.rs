//! Static lookup tables shared by the normalizer: property classes, listing
//! status codes and the Texas county FIPS table.

pub mod availability;
pub mod counties;
pub mod property_types;

pub use availability::{is_off_market, map_availability, AVAILABILITY_CODES, INACTIVE_MARKER};
pub use counties::fips_code;
pub use property_types::{property_type_ids, HOME_PROPERTY_TYPES, PROPERTY_TYPE_IDS};
