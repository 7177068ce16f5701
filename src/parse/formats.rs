//! Built-in string formats.
use std::net::{Ipv4Addr, Ipv6Addr};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::{DatetimeOptions, IpVersion};

static CUID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^c[^\s-]{8,}$").expect("cuid regex must compile"));

static CUID2: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][a-z0-9]*$").expect("cuid2 regex must compile"));

static ULID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-HJKMNP-TV-Z]{26}$").expect("ulid regex must compile"));

static UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}\b-[0-9a-f]{4}\b-[0-9a-f]{4}\b-[0-9a-f]{4}\b-[0-9a-f]{12}$")
        .expect("uuid regex must compile")
});

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[A-Z0-9_+\-.]*[A-Z0-9_+\-]@([A-Z0-9][A-Z0-9\-]*\.)+[A-Z]{2,}$")
        .expect("email regex must compile")
});

static EMOJI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\p{Extended_Pictographic}|\p{Emoji_Component})+$").expect("emoji regex must compile")
});

/// Fractional seconds are captured in group 1, the zone designator in 2.
static DATETIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.(\d+))?(Z|[+-]\d{2}(?::?\d{2})?)$")
        .expect("datetime regex must compile")
});

pub(crate) fn is_cuid(s: &str) -> bool {
    CUID.is_match(s)
}

pub(crate) fn is_cuid2(s: &str) -> bool {
    CUID2.is_match(s)
}

pub(crate) fn is_ulid(s: &str) -> bool {
    ULID.is_match(s)
}

pub(crate) fn is_uuid(s: &str) -> bool {
    UUID.is_match(s)
}

/// Local part may not start with a dot or contain consecutive dots.
pub(crate) fn is_email(s: &str) -> bool {
    !s.starts_with('.') && !s.contains("..") && EMAIL.is_match(s)
}

pub(crate) fn is_emoji(s: &str) -> bool {
    EMOJI.is_match(s)
}

pub(crate) fn is_url(s: &str) -> bool {
    url::Url::parse(s).is_ok()
}

pub(crate) fn is_ip(s: &str, version: Option<IpVersion>) -> bool {
    let v4 = || s.parse::<Ipv4Addr>().is_ok();
    let v6 = || s.parse::<Ipv6Addr>().is_ok();
    match version {
        Some(IpVersion::V4) => v4(),
        Some(IpVersion::V6) => v6(),
        None => v4() || v6(),
    }
}

pub(crate) fn is_datetime(s: &str, options: DatetimeOptions) -> bool {
    let Some(caps) = DATETIME.captures(s) else {
        return false;
    };
    let fraction = caps.get(1).map_or(0, |m| m.len());
    let precision_ok = match options.precision {
        None => true,
        Some(p) => fraction == p as usize,
    };
    let zone_ok = options.offset || caps.get(2).is_some_and(|m| m.as_str() == "Z");
    precision_ok && zone_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails() {
        assert!(is_email("jane.doe+tag@example.co"));
        assert!(!is_email(".jane@example.com"));
        assert!(!is_email("jane..doe@example.com"));
        assert!(!is_email("jane@example"));
    }

    #[test]
    fn datetimes() {
        let any = DatetimeOptions::default();
        assert!(is_datetime("2020-01-01T00:00:00Z", any));
        assert!(is_datetime("2020-01-01T00:00:00.123Z", any));
        assert!(!is_datetime("2020-01-01T00:00:00+02:00", any));
        assert!(is_datetime("2020-01-01T00:00:00+02:00", DatetimeOptions { offset: true, precision: None }));

        let millis = DatetimeOptions { precision: Some(3), offset: false };
        assert!(is_datetime("2020-01-01T00:00:00.123Z", millis));
        assert!(!is_datetime("2020-01-01T00:00:00.1Z", millis));

        let whole = DatetimeOptions { precision: Some(0), offset: false };
        assert!(is_datetime("2020-01-01T00:00:00Z", whole));
        assert!(!is_datetime("2020-01-01T00:00:00.0Z", whole));
    }

    #[test]
    fn ids_and_addresses() {
        assert!(is_uuid("123e4567-e89b-12d3-a456-426614174000"));
        assert!(!is_uuid("123e4567e89b12d3a456426614174000"));
        assert!(is_ulid("01ARZ3NDEKTSV4RRFFQ69G5FAV"));
        assert!(is_cuid("cjld2cjxh0000qzrmn831i7rn"));
        assert!(is_ip("192.168.0.1", Some(IpVersion::V4)));
        assert!(!is_ip("192.168.0.1", Some(IpVersion::V6)));
        assert!(is_ip("::1", None));
        assert!(is_url("https://example.com/a?b=c"));
        assert!(!is_url("not a url"));
        assert!(is_emoji("🙂"));
        assert!(!is_emoji("a"));
    }
}
