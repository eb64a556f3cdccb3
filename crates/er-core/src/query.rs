//! # Filter Parameter Decoder
//!
//! The event repository filter grammar is not form encoding:
//!
//! ```text
//! <resource>?key[.key ...]<op>value[&key[.key ...]<op>value ...]
//! ```
//!
//! where `<op>` is one of `=`, `!=`, `<`, `>`, `<=`, `>=`. The angle
//! brackets usually arrive percent-encoded (`%3C`, `%3E=`, ...), so a
//! standard query-string decoder would split `a%3E=5` into the key `a>`
//! and the value `5`. This module scans the raw query instead.

use crate::error::Error;
use crate::params::{Operator, Params};

/// Result of decoding a raw query string.
///
/// Decoding is best-effort: a segment that fails to percent-decode is
/// skipped, the remaining segments are still decoded, and the first such
/// failure is kept in `error`.
#[derive(Debug)]
pub struct ParsedFilter {
    pub params: Params,
    pub error: Option<Error>,
}

impl ParsedFilter {
    pub fn into_result(self) -> Result<Params, Error> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.params),
        }
    }
}

/// Decode the filter segments of `raw_query`.
///
/// Segments are separated by `&` or `;`. Segments without an operator are
/// dropped, as are segments whose raw (still encoded) key is listed in
/// `ignore_keys`.
pub fn decode_filter_parameters(raw_query: &str, ignore_keys: &[&str]) -> ParsedFilter {
    let mut params = Params::new();
    let mut error = None;

    for segment in raw_query.split(['&', ';']) {
        if segment.is_empty() {
            continue;
        }
        let Some(found) = find_operator(segment) else {
            continue;
        };
        let raw_key = &segment[..found.start];
        let raw_value = &segment[found.start + found.len..];
        if ignore_keys.contains(&raw_key) {
            continue;
        }

        let decoded = unescape(raw_key).and_then(|key| Ok((key, unescape(raw_value)?)));
        match decoded {
            Ok((key, value)) => params.add(found.op, key, value),
            Err(err) => {
                error.get_or_insert(err);
            }
        }
    }

    ParsedFilter { params, error }
}

// =============================================================================
// Operator scanning
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Found {
    start: usize,
    len: usize,
    op: Operator,
}

/// Locate the leftmost operator token in a segment.
///
/// At a given position the longest token wins, so `%3C=` is `<=` rather
/// than `<` followed by a value starting with `=`.
fn find_operator(segment: &str) -> Option<Found> {
    let bytes = segment.as_bytes();
    (0..bytes.len()).find_map(|start| {
        operator_at(&bytes[start..]).map(|(op, len)| Found { start, len, op })
    })
}

fn operator_at(rest: &[u8]) -> Option<(Operator, usize)> {
    let followed_by_eq = |at: usize| rest.get(at) == Some(&b'=');
    match rest {
        [b'!', b'=', ..] => Some((Operator::Ne, 2)),
        [b'=', ..] => Some((Operator::Eq, 1)),
        [b'<', ..] if followed_by_eq(1) => Some((Operator::Lte, 2)),
        [b'<', ..] => Some((Operator::Lt, 1)),
        [b'>', ..] if followed_by_eq(1) => Some((Operator::Gte, 2)),
        [b'>', ..] => Some((Operator::Gt, 1)),
        [b'%', b'3', c, ..] if c.eq_ignore_ascii_case(&b'c') => {
            if followed_by_eq(3) {
                Some((Operator::Lte, 4))
            } else {
                Some((Operator::Lt, 3))
            }
        }
        [b'%', b'3', c, ..] if c.eq_ignore_ascii_case(&b'e') => {
            if followed_by_eq(3) {
                Some((Operator::Gte, 4))
            } else {
                Some((Operator::Gt, 3))
            }
        }
        _ => None,
    }
}

// =============================================================================
// Percent decoding
// =============================================================================

/// Query-component unescaping: `+` is a space and every `%` must start a
/// two-digit hex escape. The decoded bytes must form UTF-8.
fn unescape(raw: &str) -> Result<String, Error> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let escape = bytes.get(i + 1..i + 3).and_then(|hex| {
                    let hi = hex_value(hex[0])?;
                    let lo = hex_value(hex[1])?;
                    Some((hi << 4) | lo)
                });
                match escape {
                    Some(byte) => out.push(byte),
                    None => {
                        let end = (i + 3).min(bytes.len());
                        let bad = String::from_utf8_lossy(&bytes[i..end]);
                        return Err(Error::MalformedFilter(format!(
                            "invalid URL escape {bad:?} in {raw:?}"
                        )));
                    }
                }
                i += 3;
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }
    String::from_utf8(out)
        .map_err(|_| Error::MalformedFilter(format!("{raw:?} does not decode to UTF-8")))
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
