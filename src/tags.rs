/// Lenient parsing of OSM tag values.
///
/// OSM values are free text. Anything that does not parse is reported as
/// `None` and treated as a missing value by callers.

use crate::model::TAG_CAPACITY;

/// Parses a value made only of ASCII digits, e.g. `"4"`.
///
/// `"4 "`, `"-1"`, `"2;4"` and `""` are all rejected.
pub fn parse_count(value: &str) -> Option<u32> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Parses the first space-separated token of a value, e.g. `"2 x Type 2"` → 2.
pub fn leading_count(value: &str) -> Option<u32> {
    parse_count(value.split(' ').next().unwrap_or_default())
}

/// Returns the first run of digits embedded anywhere in a value,
/// e.g. `"max 22.5 kW"` → 22.
pub fn first_integer(value: &str) -> Option<u32> {
    let start = value.find(|c: char| c.is_ascii_digit())?;
    let digits: &str = value[start..]
        .split(|c: char| !c.is_ascii_digit())
        .next()
        .unwrap_or_default();
    digits.parse().ok()
}

/// Numeric `capacity` tag, if present and well formed.
pub fn capacity(tags: &std::collections::BTreeMap<String, String>) -> Option<u32> {
    tags.get(TAG_CAPACITY).and_then(|v| parse_count(v))
}

/// Socket related tag keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketKey<'a> {
    /// `socket:<type>`: number of sockets of that type.
    Count(&'a str),
    /// `socket:<type>:output`: power rating of that type.
    Output(&'a str),
}

/// Classifies a tag key as a socket count or socket output key.
pub fn socket_key(key: &str) -> Option<SocketKey<'_>> {
    let parts: Vec<&str> = key.split(':').collect();
    match parts.as_slice() {
        ["socket", socket_type] => Some(SocketKey::Count(*socket_type)),
        ["socket", socket_type, "output"] => Some(SocketKey::Output(*socket_type)),
        _ => None,
    }
}
