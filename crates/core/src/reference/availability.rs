/// Status codes the listing API accepts in `listing_status`.
pub const AVAILABILITY_CODES: &[&str] =
    &["Available", "PS", "OP", "P", "CS", "closd", "WITH", "term", "exp"];

/// Withdrawn, terminated and expired listings.
pub const OFF_MARKET_CODES: &[&str] = &["WITH", "term", "exp"];

/// What an unprivileged caller sees in place of any off-market code.
pub const INACTIVE_MARKER: &str = "inactive";

pub fn availability_code(raw: &str) -> Option<&'static str> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("active") {
        return Some("Available");
    }
    AVAILABILITY_CODES.iter().find(|code| **code == raw).copied()
}

pub fn is_off_market(code: &str) -> bool {
    OFF_MARKET_CODES.contains(&code) || code == INACTIVE_MARKER
}

/// Maps requested statuses to codes. Off-market codes pass through only for a
/// privileged caller; everyone else gets a single `INACTIVE_MARKER`.
pub fn map_availability<'a, I>(requested: I, privileged: bool) -> Vec<&'static str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut codes: Vec<&'static str> = Vec::new();
    for code in requested.into_iter().filter_map(availability_code) {
        let mapped = if !privileged && OFF_MARKET_CODES.contains(&code) {
            INACTIVE_MARKER
        } else {
            code
        };
        if !codes.contains(&mapped) {
            codes.push(mapped);
        }
    }
    codes
}

#[cfg(test)]
mod tests {
    use super::{availability_code, is_off_market, map_availability, INACTIVE_MARKER};

    #[test]
    fn unknown_codes_are_dropped() {
        assert_eq!(map_availability(["PS", "bogus", "CS"], false), vec!["PS", "CS"]);
    }

    #[test]
    fn active_is_an_alias_for_available() {
        assert_eq!(availability_code("Active"), Some("Available"));
    }

    #[test]
    fn off_market_codes_collapse_for_public_callers() {
        assert_eq!(map_availability(["WITH", "term", "exp"], false), vec![INACTIVE_MARKER]);
        assert_eq!(map_availability(["OP", "WITH"], false), vec!["OP", INACTIVE_MARKER]);
    }

    #[test]
    fn off_market_codes_pass_through_for_privileged_callers() {
        assert_eq!(map_availability(["WITH", "term"], true), vec!["WITH", "term"]);
    }

    #[test]
    fn marker_counts_as_off_market() {
        assert!(is_off_market(INACTIVE_MARKER));
        assert!(is_off_market("exp"));
        assert!(!is_off_market("closd"));
    }
}
