/// Property type name → upstream property class id. Several names share a class.
pub const PROPERTY_TYPE_IDS: &[(&str, &str)] = &[
    ("Single Family", "1"),
    ("Townhouse/Condo", "2"),
    ("Residential Lots", "3"),
    ("Multi-Family", "4"),
    ("Acreage", "5"),
    ("High-Rise", "6"),
    ("Mid-Rise", "6"),
    ("Condominium", "6"),
];

/// Types searched when the user asks for "homes" without naming a type.
pub const HOME_PROPERTY_TYPES: &[&str] = &["Single Family", "Townhouse/Condo", "High-Rise"];

pub fn property_type_id(name: &str) -> Option<&'static str> {
    let name = name.trim();
    PROPERTY_TYPE_IDS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(name))
        .map(|(_, id)| *id)
}

/// Maps names to class ids in input order, skipping unknown names and repeated ids.
pub fn property_type_ids<'a, I>(names: I) -> Vec<&'static str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut ids: Vec<&'static str> = Vec::new();
    for id in names.into_iter().filter_map(property_type_id) {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::{property_type_id, property_type_ids, HOME_PROPERTY_TYPES};

    #[test]
    fn known_names_map_to_ids() {
        assert_eq!(property_type_id("Single Family"), Some("1"));
        assert_eq!(property_type_id("acreage"), Some("5"));
        assert_eq!(property_type_id("Castle"), None);
    }

    #[test]
    fn shared_classes_are_emitted_once() {
        let ids = property_type_ids(["High-Rise", "Mid-Rise", "Townhouse/Condo", "Igloo"]);
        assert_eq!(ids, vec!["6", "2"]);
    }

    #[test]
    fn home_types_cover_residential_classes() {
        assert_eq!(property_type_ids(HOME_PROPERTY_TYPES.iter().copied()), vec!["1", "2", "6"]);
    }
}
