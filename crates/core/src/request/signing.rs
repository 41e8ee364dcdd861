use chrono::{DateTime, Duration, Utc};
use md5::{Digest, Md5};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

pub const HEADER_TOKEN: &str = "X-Token";
pub const HEADER_AUTH: &str = "X-Auth";
pub const HEADER_EXPIRES: &str = "X-Expires";
pub const HEADER_TEST_MODE: &str = "X-Test-Mode";
pub const HEADER_APP_VERSION: &str = "X-App-Version";
pub const HEADER_API_VERSION: &str = "X-API-Version";
pub const HEADER_USER_ID: &str = "X-Userid";
pub const HEADER_MEMBER_NUMBER: &str = "X-Realtorid";
pub const HEADER_USER_TYPE: &str = "X-User-Type";
pub const HEADER_APP_TYPE: &str = "X-App-Type";
pub const HEADER_APP_NAME: &str = "X-App-Name";
pub const HEADER_DEVICE_TYPE: &str = "X-Device-Type";
pub const HEADER_USER_AGENT: &str = "X-UA";
pub const HEADER_PAGE: &str = "X-Page";

pub const APP_TYPE: &str = "web";
pub const APP_NAME: &str = "cb";
pub const DEVICE_TYPE: &str = "windows";

/// The API rejects signatures whose expiry is not two hours ahead.
pub const CLOCK_SKEW_HOURS: i64 = 2;

/// Everything but ASCII alphanumerics and `_ . - ~` is escaped, so `/`, `(`,
/// `)`, `*`, `!` and `'` are all encoded.
const SIGNATURE_ESCAPES: &AsciiSet =
    &NON_ALPHANUMERIC.remove(b'_').remove(b'.').remove(b'-').remove(b'~');

pub fn expires_at(now: DateTime<Utc>) -> i64 {
    (now + Duration::hours(CLOCK_SKEW_HOURS)).timestamp_millis()
}

/// Escapes a relative path (with query) the way the API does before hashing.
/// Spaces become `+`.
pub fn canonical_path(path: &str) -> String {
    utf8_percent_encode(path, SIGNATURE_ESCAPES).to_string().replace("%20", "+")
}

/// Lowercase hex MD5 of `canonical_path + token + secret + expires`.
pub fn signature(canonical_path: &str, token: &str, secret: &str, expires: i64) -> String {
    let mut hasher = Md5::new();
    hasher.update(canonical_path.as_bytes());
    hasher.update(token.as_bytes());
    hasher.update(secret.as_bytes());
    hasher.update(expires.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// `#` is removed before signing; the API would otherwise treat it as a fragment.
pub fn strip_fragment_markers(path: &str) -> String {
    path.replace('#', "")
}

/// Path as it goes on the wire.
pub fn wire_path(path: &str) -> String {
    path.replace(' ', "%20")
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{canonical_path, expires_at, signature, wire_path};

    #[test]
    fn canonical_path_escapes_reserved_characters() {
        assert_eq!(
            canonical_path("/chatbot/listings?city=League City&style=(old)*!'"),
            "%2Fchatbot%2Flistings%3Fcity%3DLeague+City%26style%3D%28old%29%2A%21%27"
        );
        assert_eq!(canonical_path("a_b.c-d~e,f"), "a_b.c-d~e%2Cf");
    }

    #[test]
    fn canonical_path_encodes_utf8_bytes() {
        assert_eq!(canonical_path("café"), "caf%C3%A9");
    }

    #[test]
    fn expiry_is_two_hours_ahead_in_millis() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("valid time");
        assert_eq!(expires_at(now), 1_704_067_200_000 + 2 * 3_600_000);
    }

    #[test]
    fn signature_hashes_the_plain_concatenation() {
        // md5("0")
        assert_eq!(signature("", "", "", 0), "cfcd208495d565ef66e7dff9f98764da");
        assert_eq!(signature("a", "b", "c", 0), signature("ab", "", "c", 0));
        assert_ne!(signature("a", "b", "c", 0), signature("a", "b", "c", 1));
    }

    #[test]
    fn wire_path_escapes_spaces_only() {
        assert_eq!(
            wire_path("/chatbot/listings?city=League City"),
            "/chatbot/listings?city=League%20City"
        );
    }
}
