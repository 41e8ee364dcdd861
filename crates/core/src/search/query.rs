use std::collections::BTreeMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::reference::is_off_market;
use crate::search::intent::{Amenity, QuickAccess};

/// Characters that would split or truncate a query value. Spaces and commas
/// stay raw: the wire path encodes spaces and commas separate list items.
const VALUE_ESCAPES: &AsciiSet = &CONTROLS.add(b'&').add(b'=').add(b'#').add(b'+').add(b'%');

/// A query parameter the listing API recognises. Declaration order is the
/// order parameters appear on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Param {
    City,
    Community,
    County,
    Subdivision,
    ZipCode,
    MlsNumber,
    BedroomMin,
    BedroomMax,
    FullBathMin,
    FullBathMax,
    ListingPriceMin,
    ListingPriceMax,
    LotSizeMin,
    LotSizeMax,
    AcresMin,
    AcresMax,
    SquareFeetMin,
    SquareFeetMax,
    YearBuiltMin,
    YearBuiltMax,
    PriceSqftMin,
    PriceSqftMax,
    HoaFeeMin,
    HoaFeeMax,
    DaysOnMarketMin,
    DaysOnMarketMax,
    HalfBath,
    GarageNum,
    GarageDesc,
    Stories,
    NewConstruction,
    Parking,
    PropertyClass,
    Style,
    Financing,
    ListingStatus,
    SchoolDistrict,
    ElementarySchool,
    MiddleSchool,
    HighSchool,
    Amenity(Amenity),
    QuickAccess(QuickAccess),
    ForSale,
    Sort,
    Start,
    Max,
}

impl Param {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::City => "city",
            Self::Community => "mpc",
            Self::County => "county",
            Self::Subdivision => "subdivision",
            Self::ZipCode => "zip_code",
            Self::MlsNumber => "mlsnum",
            Self::BedroomMin => "bedroom_min",
            Self::BedroomMax => "bedroom_max",
            Self::FullBathMin => "full_bath_min",
            Self::FullBathMax => "full_bath_max",
            Self::ListingPriceMin => "listing_price_min",
            Self::ListingPriceMax => "listing_price_max",
            Self::LotSizeMin => "lotsize_min",
            Self::LotSizeMax => "lotsize_max",
            Self::AcresMin => "acres_min",
            Self::AcresMax => "acres_max",
            Self::SquareFeetMin => "square_feet_min",
            Self::SquareFeetMax => "square_feet_max",
            Self::YearBuiltMin => "year_built_min",
            Self::YearBuiltMax => "year_built_max",
            Self::PriceSqftMin => "price_sqft_min",
            Self::PriceSqftMax => "price_sqft_max",
            Self::HoaFeeMin => "hoa_fee_min",
            Self::HoaFeeMax => "hoa_fee_max",
            Self::DaysOnMarketMin => "days_on_market_min",
            Self::DaysOnMarketMax => "days_on_market_max",
            Self::HalfBath => "half_bath_num",
            Self::GarageNum => "garage_num",
            Self::GarageDesc => "garage_desc",
            Self::Stories => "stories",
            Self::NewConstruction => "new_constr",
            Self::Parking => "parking",
            Self::PropertyClass => "property_class_id",
            Self::Style => "style",
            Self::Financing => "financing",
            Self::ListingStatus => "listing_status",
            Self::SchoolDistrict => "school_district",
            Self::ElementarySchool => "elementary_school",
            Self::MiddleSchool => "middle_school",
            Self::HighSchool => "high_school",
            Self::Amenity(flag) => flag.as_str(),
            Self::QuickAccess(flag) => flag.as_str(),
            Self::ForSale => "for_sale",
            Self::Sort => "sort",
            Self::Start => "start",
            Self::Max => "max",
        }
    }
}

/// Flat parameter set sent to the listing API. Blank values are never stored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizedQuery {
    params: BTreeMap<Param, String>,
}

impl NormalizedQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, param: Param, value: impl ToString) {
        let value = value.to_string();
        let value = value.trim();
        if value.is_empty() {
            self.params.remove(&param);
        } else {
            self.params.insert(param, value.to_owned());
        }
    }

    pub fn set_opt<T: ToString>(&mut self, param: Param, value: Option<T>) {
        if let Some(value) = value {
            self.set(param, value);
        }
    }

    /// Comma-joins the non-blank values; nothing is stored when none remain.
    pub fn set_list<I, S>(&mut self, param: Param, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = values
            .into_iter()
            .map(|value| value.as_ref().trim().to_owned())
            .filter(|value| !value.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        self.set(param, joined);
    }

    pub fn get(&self, param: Param) -> Option<&str> {
        self.params.get(&param).map(String::as_str)
    }

    pub fn contains(&self, param: Param) -> bool {
        self.params.contains_key(&param)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.params.iter().map(|(param, value)| (param.as_str(), value.as_str()))
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.params.keys().map(|param| param.as_str()).collect()
    }

    /// True when the status filter asks for withdrawn, terminated or expired
    /// listings, which the API serves unpaginated under a separate key.
    pub fn targets_off_market(&self) -> bool {
        self.get(Param::ListingStatus)
            .map(|statuses| statuses.split(',').any(is_off_market))
            .unwrap_or(false)
    }

    pub fn start(&self) -> u32 {
        self.get(Param::Start).and_then(|raw| raw.parse().ok()).unwrap_or(0)
    }

    /// `key=value&...` with delimiter characters inside values escaped. The
    /// request builder signs exactly this text.
    pub fn to_query_string(&self) -> String {
        self.iter()
            .map(|(key, value)| format!("{key}={}", utf8_percent_encode(value, VALUE_ESCAPES)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl Serialize for NormalizedQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.params.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
