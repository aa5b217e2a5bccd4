//! Cookie data codec.
//!
//! A map is written as a run of records, one per entry, in key order:
//!
//! ```text
//! NUL escape(key) ':' escape(value) NUL
//! ```
//!
//! `escape` replaces `%` with `%25`, `:` with `%3A` and NUL with `%00`, so
//! neither delimiter can appear raw inside a key or value. The run is then
//! URL-encoded as a whole, which leaves only `[A-Za-z0-9-._~%]` in the
//! cookie value.
//!
//! Decoding is strict and total. Anything that is not exactly a run of
//! well-formed records decodes to an empty map; it never panics and never
//! guesses. Records written by the older unescaped format decode unchanged
//! as long as their values hold no `%` or `:`.

use girder_log::debug;
use std::collections::{BTreeMap, HashMap};

const RECORD: char = '\0';
const SEPARATOR: char = ':';

/// Whether `key` can be stored without breaking the record framing.
pub fn is_valid_key(key: &str) -> bool {
    !key.contains(SEPARATOR) && !key.contains(RECORD)
}

/// Encode a map into a cookie-safe string.
///
/// ```
/// use std::collections::HashMap;
/// use girder_session::codec;
///
/// let mut data = HashMap::new();
/// data.insert("user".to_string(), "a:b".to_string());
///
/// let wire = codec::encode(&data);
/// assert_eq!(wire, "%00user%3Aa%253Ab%00");
/// assert_eq!(codec::decode(&wire), data);
/// ```
pub fn encode<S: std::hash::BuildHasher>(data: &HashMap<String, String, S>) -> String {
    let sorted: BTreeMap<&str, &str> = data.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();

    let mut payload = String::new();
    for (key, value) in sorted {
        payload.push(RECORD);
        escape_into(&mut payload, key);
        payload.push(SEPARATOR);
        escape_into(&mut payload, value);
        payload.push(RECORD);
    }

    urlencoding::encode(&payload).into_owned()
}

/// Decode a cookie value into a fresh map. Malformed input yields an empty map.
pub fn decode(wire: &str) -> HashMap<String, String> {
    try_decode(wire).unwrap_or_default()
}

/// Decode a cookie value into `sink`.
///
/// On malformed input `sink` is left untouched. Returns whether the input was
/// well formed.
pub fn decode_into(sink: &mut HashMap<String, String>, wire: &str) -> bool {
    match try_decode(wire) {
        Some(records) => {
            sink.extend(records);
            true
        }
        None => false,
    }
}

fn try_decode(wire: &str) -> Option<HashMap<String, String>> {
    let payload = match urlencoding::decode(wire) {
        Ok(payload) => payload,
        Err(_) => {
            debug!(target: "girder::codec", "cookie payload is not UTF-8");
            return None;
        }
    };

    let records = parse_records(&payload);
    if records.is_none() {
        debug!(target: "girder::codec", { length = wire.len() }, "discarding malformed cookie payload");
    }
    records
}

fn parse_records(payload: &str) -> Option<HashMap<String, String>> {
    let mut data = HashMap::new();
    let mut rest = payload;

    while !rest.is_empty() {
        rest = rest.strip_prefix(RECORD)?;

        let separator = rest.find(SEPARATOR)?;
        let key = &rest[..separator];
        if key.contains(RECORD) {
            return None;
        }
        rest = &rest[separator + SEPARATOR.len_utf8()..];

        let end = rest.find(RECORD)?;
        let value = &rest[..end];
        if value.contains(SEPARATOR) {
            return None;
        }
        rest = &rest[end + RECORD.len_utf8()..];

        data.insert(unescape(key)?, unescape(value)?);
    }

    Some(data)
}

fn escape_into(out: &mut String, raw: &str) {
    for c in raw.chars() {
        match c {
            '%' => out.push_str("%25"),
            SEPARATOR => out.push_str("%3A"),
            RECORD => out.push_str("%00"),
            c => out.push(c),
        }
    }
}

fn unescape(escaped: &str) -> Option<String> {
    if !escaped.contains('%') {
        return Some(escaped.to_string());
    }

    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let code: String = chars.by_ref().take(2).collect();
        match code.to_ascii_uppercase().as_str() {
            "25" => out.push('%'),
            "3A" => out.push(SEPARATOR),
            "00" => out.push(RECORD),
            _ => return None,
        }
    }
    Some(out)
}
