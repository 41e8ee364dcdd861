use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// Numeric filter as the model extracts it. `equal` wins over `min`/`max`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Range<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equal: Option<T>,
}

impl<T: Copy> Range<T> {
    pub fn at_least(min: T) -> Self {
        Self { min: Some(min), max: None, equal: None }
    }

    pub fn at_most(max: T) -> Self {
        Self { min: None, max: Some(max), equal: None }
    }

    pub fn between(min: T, max: T) -> Self {
        Self { min: Some(min), max: Some(max), equal: None }
    }

    pub fn exactly(value: T) -> Self {
        Self { min: None, max: None, equal: Some(value) }
    }

    pub fn bounds(&self) -> (Option<T>, Option<T>) {
        match self.equal {
            Some(value) => (Some(value), Some(value)),
            None => (self.min, self.max),
        }
    }
}

/// One code or a list of them. Numbers are accepted and kept as their text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(#[serde(deserialize_with = "scalar_text")] String),
    Many(#[serde(deserialize_with = "scalar_list")] Vec<String>),
}

impl OneOrMany {
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::One(value) => vec![value.as_str()],
            Self::Many(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

// Each flag is both an intent field and an upstream query parameter of the
// same name, so one list drives the enum, the flag struct and the names.
macro_rules! flag_set {
    ($(#[$meta:meta])* $flags:ident, $kind:ident { $($field:ident => $variant:ident),+ $(,)? }) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $kind {
            $($variant),+
        }

        impl $kind {
            pub const ALL: &'static [$kind] = &[$($kind::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($kind::$variant => stringify!($field)),+
                }
            }

            pub fn parse(raw: &str) -> Option<Self> {
                let raw = raw.trim();
                Self::ALL.iter().copied().find(|flag| flag.as_str().eq_ignore_ascii_case(raw))
            }
        }

        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $flags {
            $(
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<bool>,
            )+
        }

        impl $flags {
            pub fn is_set(&self, flag: $kind) -> bool {
                match flag {
                    $($kind::$variant => self.$field == Some(true)),+
                }
            }

            pub fn set(&mut self, flag: $kind) {
                match flag {
                    $($kind::$variant => self.$field = Some(true)),+
                }
            }
        }
    };
}

flag_set!(
    /// Amenity filters; `Some(false)` and `None` both mean "don't filter".
    AmenityFlags,
    Amenity {
        loft => Loft,
        pool => Pool,
        area_pool => AreaPool,
        areatennis => AreaTennis,
        yard => Yard,
        garageapt => GarageApartment,
        sprinkle => Sprinkler,
        patiodeck => PatioDeck,
        mediarm => MediaRoom,
        studyrm => StudyRoom,
        spahottub => SpaHotTub,
        culdesac => CulDeSac,
        corner => Corner,
        waterview => WaterView,
        waterfront => Waterfront,
        lake => Lake,
        wooded => Wooded,
        greenbelt => Greenbelt,
        ongolfcourse => OnGolfCourse,
        ingolfcom => InGolfCommunity,
        energy => EnergyEfficient,
        greencert => GreenCertified,
        access => Gated,
        wheelchair => Wheelchair,
        elevator => Elevator,
        furnished => Furnished,
    }
);

flag_set!(
    /// Quick-access filters. Each can also be requested by name in `quick_access`.
    QuickAccessFlags,
    QuickAccess {
        pricereduced => PriceReduced,
        listed_today => ListedToday,
        new_entry => NewEntry,
        forcl => Foreclosure,
        new_constr2 => NewConstruction,
        open_houses => OpenHouse,
        voh_only => VirtualOpenHouse,
    }
);

impl QuickAccess {
    /// Accepts the parameter name or the phrase a user would say ("open house").
    pub fn from_token(token: &str) -> Option<Self> {
        if let Some(flag) = Self::parse(token) {
            return Some(flag);
        }
        let folded: String =
            token.chars().filter(|c| c.is_ascii_alphanumeric()).collect::<String>().to_lowercase();
        let flag = match folded.trim_end_matches('s') {
            "pricereduced" | "reduced" | "pricedrop" => Self::PriceReduced,
            "listedtoday" | "newtoday" => Self::ListedToday,
            "newentry" | "newlisting" | "justlisted" => Self::NewEntry,
            "foreclosure" | "forcl" => Self::Foreclosure,
            "newconstruction" | "newconstr" | "newbuild" => Self::NewConstruction,
            "openhouse" => Self::OpenHouse,
            "virtualopenhouse" | "vohonly" => Self::VirtualOpenHouse,
            _ => return None,
        };
        Some(flag)
    }
}

/// Structured search filters extracted from one user turn.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchIntent {
    #[serde(deserialize_with = "nullable_vec")]
    pub city: Vec<String>,
    #[serde(deserialize_with = "nullable_vec")]
    pub community: Vec<String>,
    #[serde(deserialize_with = "nullable_vec")]
    pub county: Vec<String>,
    #[serde(deserialize_with = "optional_text")]
    pub subdivisions: Option<String>,
    pub zip_code: Option<OneOrMany>,
    #[serde(deserialize_with = "optional_text")]
    pub mls_number: Option<String>,

    #[serde(alias = "bedrooms_beds")]
    pub bedrooms: Option<Range<i64>>,
    #[serde(alias = "baths_bathrooms")]
    pub baths: Option<Range<i64>>,
    pub price: Option<Range<i64>>,
    #[serde(alias = "lotsize")]
    pub lot_size: Option<Range<i64>>,
    pub acres: Option<Range<f64>>,
    pub square_feet: Option<Range<i64>>,
    pub year_built: Option<Range<i64>>,
    pub price_sqft: Option<Range<i64>>,
    pub hoa_fee: Option<Range<i64>>,
    pub days_on_market: Option<Range<i64>>,

    #[serde(alias = "half_bath_num")]
    pub half_bath: Option<bool>,
    pub garage_num: Option<i64>,
    #[serde(deserialize_with = "optional_text")]
    pub garage_desc: Option<String>,
    #[serde(deserialize_with = "nullable_vec")]
    pub stories: Vec<f64>,
    pub new_constr: Option<String>,
    pub parking: Option<i64>,
    #[serde(deserialize_with = "nullable_vec")]
    pub property_type: Vec<String>,
    pub home_only: Option<bool>,
    #[serde(deserialize_with = "optional_text")]
    pub style: Option<String>,
    #[serde(deserialize_with = "nullable_vec")]
    pub finance: Vec<String>,
    #[serde(alias = "availablity", deserialize_with = "nullable_vec")]
    pub availability: Vec<String>,
    #[serde(deserialize_with = "nullable_vec")]
    pub quick_access: Vec<String>,

    pub sort: Option<String>,
    pub start: Option<u32>,
    pub limit: Option<u32>,
    pub sold: Option<bool>,
    pub for_sale: Option<u8>,

    pub school_district: Option<String>,
    #[serde(alias = "elemantary_school")]
    pub elementary_school: Option<String>,
    pub middle_school: Option<String>,
    pub high_school: Option<String>,

    #[serde(flatten)]
    pub amenities: AmenityFlags,
    #[serde(flatten)]
    pub quick: QuickAccessFlags,
}

impl SearchIntent {
    pub fn targets_sold(&self) -> bool {
        self.sold == Some(true)
    }

    /// A quick-access filter applies when its flag is set or its token was named.
    pub fn wants_quick_access(&self, flag: QuickAccess) -> bool {
        self.quick.is_set(flag)
            || self.quick_access.iter().any(|token| QuickAccess::from_token(token) == Some(flag))
    }
}

fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Codes such as zips and MLS numbers arrive as JSON numbers as often as
/// strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl From<Scalar> for String {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Text(text) => text,
            Scalar::Number(number) => number.to_string(),
        }
    }
}

fn scalar_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Scalar::deserialize(deserializer).map(String::from)
}

fn scalar_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Vec::<Scalar>::deserialize(deserializer)?.into_iter().map(String::from).collect())
}

fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(String::from))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Amenity, OneOrMany, QuickAccess, Range, SearchIntent};

    #[test]
    fn equal_overrides_min_and_max() {
        let range = Range { min: Some(2), max: Some(6), equal: Some(4) };
        assert_eq!(range.bounds(), (Some(4), Some(4)));
        assert_eq!(Range::between(2, 6).bounds(), (Some(2), Some(6)));
        assert_eq!(Range::at_most(3).bounds(), (None, Some(3)));
    }

    #[test]
    fn deserializes_upstream_field_spellings() {
        let intent: SearchIntent = serde_json::from_value(json!({
            "city": ["Houston"],
            "bedrooms_beds": {"min": 3},
            "availablity": ["WITH"],
            "elemantary_school": "Bush Elementary",
            "zip_code": "77027",
            "pool": true,
            "pricereduced": true,
            "quick_access": null,
        }))
        .expect("intent should deserialize");

        assert_eq!(intent.city, vec!["Houston".to_string()]);
        assert_eq!(intent.bedrooms, Some(Range::at_least(3)));
        assert_eq!(intent.availability, vec!["WITH".to_string()]);
        assert_eq!(intent.elementary_school.as_deref(), Some("Bush Elementary"));
        assert_eq!(intent.zip_code, Some(OneOrMany::One("77027".to_string())));
        assert!(intent.amenities.is_set(Amenity::Pool));
        assert!(intent.quick.is_set(QuickAccess::PriceReduced));
        assert!(intent.quick_access.is_empty());
    }

    #[test]
    fn numeric_codes_deserialize_as_text() {
        let intent: SearchIntent = serde_json::from_value(json!({
            "zip_code": 77027,
            "mls_number": 81234567,
            "subdivisions": 1204,
            "style": "Traditional",
            "garage_desc": null,
        }))
        .expect("numeric codes should deserialize");

        assert_eq!(intent.zip_code, Some(OneOrMany::One("77027".to_string())));
        assert_eq!(intent.mls_number.as_deref(), Some("81234567"));
        assert_eq!(intent.subdivisions.as_deref(), Some("1204"));
        assert_eq!(intent.style.as_deref(), Some("Traditional"));
        assert_eq!(intent.garage_desc, None);

        let listed: SearchIntent = serde_json::from_value(json!({"zip_code": [77027, "77005"]}))
            .expect("mixed zip list should deserialize");
        assert_eq!(listed.zip_code.as_ref().map(OneOrMany::values), Some(vec!["77027", "77005"]));
    }

    #[test]
    fn null_lists_become_empty() {
        let intent: SearchIntent =
            serde_json::from_value(json!({"city": null, "stories": null})).expect("intent");
        assert!(intent.city.is_empty());
        assert!(intent.stories.is_empty());
    }

    #[test]
    fn quick_access_tokens_or_into_flags() {
        let mut intent = SearchIntent {
            quick_access: vec!["Open House".to_string(), "price_reduced".to_string()],
            ..SearchIntent::default()
        };
        intent.quick.set(QuickAccess::Foreclosure);

        assert!(intent.wants_quick_access(QuickAccess::OpenHouse));
        assert!(intent.wants_quick_access(QuickAccess::Foreclosure));
        assert!(intent.wants_quick_access(QuickAccess::PriceReduced));
        assert!(!intent.wants_quick_access(QuickAccess::VirtualOpenHouse));
    }

    #[test]
    fn flag_names_match_upstream_parameters() {
        assert_eq!(Amenity::GarageApartment.as_str(), "garageapt");
        assert_eq!(QuickAccess::NewConstruction.as_str(), "new_constr2");
        assert_eq!(QuickAccess::parse("OPEN_HOUSES"), Some(QuickAccess::OpenHouse));
        assert_eq!(QuickAccess::from_token("new construction"), Some(QuickAccess::NewConstruction));
        assert_eq!(QuickAccess::from_token("haunted"), None);
        assert_eq!(Amenity::ALL.len(), 26);
    }
}
