//! Cursor keys and the opaque token codec
//!
//! A cursor is the sort-key tuple of one entity. The codec turns it into a
//! printable, URL- and JSON-safe token and back without losing precision. It
//! carries values only; ordering semantics stay with the
//! [`SortSpecification`](crate::core::sort::SortSpecification).
//!
//! # Token layout
//!
//! ```text
//! base64url( tag payload ":" tag payload ":" ... )
//! ```
//!
//! Tags are `n` (null), `s` (string), `i` (integer), `f` (float bits in hex),
//! `b` (boolean), `u` (uuid) and `d` (seconds since the Unix epoch, a dot,
//! then nine digits of nanoseconds).
//! Backslash and colon inside a payload are escaped with a backslash.

use crate::core::error::CursorError;
use crate::core::field::{FieldKind, FieldValue};
use crate::core::sort::SortSpecification;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Upper bound on accepted token length; tokens come from untrusted clients
pub const MAX_CURSOR_TOKEN_LEN: usize = 8 * 1024;

const SEPARATOR: char = ':';
const ESCAPE: char = '\\';
const NULL_TAG: char = 'n';

/// Ordered tuple of sort-key values identifying a position in a sort order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CursorKey(Vec<FieldValue>);

impl CursorKey {
    pub fn new(values: Vec<FieldValue>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[FieldValue] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_values(self) -> Vec<FieldValue> {
        self.0
    }
}

impl From<Vec<FieldValue>> for CursorKey {
    fn from(values: Vec<FieldValue>) -> Self {
        Self(values)
    }
}

/// Encodes and decodes cursor keys as opaque tokens
pub struct CursorCodec;

impl CursorCodec {
    /// Encode a key into a token
    pub fn encode(key: &CursorKey) -> String {
        let mut text = String::new();
        for (index, value) in key.values().iter().enumerate() {
            if index > 0 {
                text.push(SEPARATOR);
            }
            write_segment(&mut text, value);
        }
        URL_SAFE_NO_PAD.encode(text.as_bytes())
    }

    /// Decode a token holding exactly `expected_arity` values
    pub fn decode(token: &str, expected_arity: usize) -> Result<CursorKey, CursorError> {
        let token = token.trim();

        if token.is_empty() {
            return Err(CursorError::invalid("cursor is empty"));
        }

        if token.len() > MAX_CURSOR_TOKEN_LEN {
            return Err(CursorError::invalid(format!(
                "cursor exceeds {} characters",
                MAX_CURSOR_TOKEN_LEN
            )));
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| CursorError::invalid(format!("not base64url: {}", e)))?;
        let text =
            String::from_utf8(bytes).map_err(|_| CursorError::invalid("payload is not UTF-8"))?;

        let values = split_segments(&text)?
            .iter()
            .map(|segment| parse_segment(segment))
            .collect::<Result<Vec<_>, _>>()?;

        if values.len() != expected_arity {
            return Err(CursorError::ArityMismatch {
                expected: expected_arity,
                actual: values.len(),
            });
        }

        Ok(CursorKey(values))
    }

    /// Decode a token for `sort`, checking arity and each value's kind
    pub fn decode_for<T>(
        token: &str,
        sort: &SortSpecification<T>,
    ) -> Result<CursorKey, CursorError> {
        let key = Self::decode(token, sort.len())?;

        for (field, value) in sort.fields().iter().zip(key.values()) {
            if !value.fits(field.kind()) {
                return Err(CursorError::invalid(format!(
                    "value for '{}' is not a {}",
                    field.name(),
                    field.kind()
                )));
            }
        }

        Ok(key)
    }
}

fn write_segment(out: &mut String, value: &FieldValue) {
    let payload = match value {
        FieldValue::Null => String::new(),
        FieldValue::String(s) => s.clone(),
        FieldValue::Integer(i) => i.to_string(),
        FieldValue::Float(f) => format!("{:016x}", f.to_bits()),
        FieldValue::Boolean(b) => String::from(if *b { "t" } else { "f" }),
        FieldValue::Uuid(u) => u.hyphenated().to_string(),
        FieldValue::DateTime(d) => format!("{}.{:09}", d.timestamp(), d.timestamp_subsec_nanos()),
    };

    out.push(value.kind().map_or(NULL_TAG, tag_for));
    for c in payload.chars() {
        if c == SEPARATOR || c == ESCAPE {
            out.push(ESCAPE);
        }
        out.push(c);
    }
}

fn split_segments(text: &str) -> Result<Vec<String>, CursorError> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match c {
            ESCAPE => match chars.next() {
                Some(escaped @ (SEPARATOR | ESCAPE)) => current.push(escaped),
                Some(other) => {
                    return Err(CursorError::invalid(format!(
                        "unknown escape sequence '\\{}'",
                        other
                    )));
                }
                None => return Err(CursorError::invalid("dangling escape at end of cursor")),
            },
            SEPARATOR => segments.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    segments.push(current);

    Ok(segments)
}

fn parse_segment(segment: &str) -> Result<FieldValue, CursorError> {
    let mut chars = segment.chars();
    let Some(tag) = chars.next() else {
        return Err(CursorError::invalid("empty cursor segment"));
    };
    let payload = chars.as_str();

    let value = match tag {
        NULL_TAG if payload.is_empty() => FieldValue::Null,
        NULL_TAG => return Err(CursorError::invalid("null value carries a payload")),
        's' => FieldValue::String(payload.to_string()),
        'i' => payload
            .parse::<i64>()
            .map(FieldValue::Integer)
            .map_err(|e| CursorError::invalid(format!("bad integer '{}': {}", payload, e)))?,
        'f' if payload.len() == 16 => u64::from_str_radix(payload, 16)
            .map(|bits| FieldValue::Float(f64::from_bits(bits)))
            .map_err(|e| CursorError::invalid(format!("bad float '{}': {}", payload, e)))?,
        'f' => return Err(CursorError::invalid(format!("bad float '{}'", payload))),
        'b' => match payload {
            "t" => FieldValue::Boolean(true),
            "f" => FieldValue::Boolean(false),
            _ => return Err(CursorError::invalid(format!("bad boolean '{}'", payload))),
        },
        'u' => Uuid::parse_str(payload)
            .map(FieldValue::Uuid)
            .map_err(|e| CursorError::invalid(format!("bad uuid '{}': {}", payload, e)))?,
        'd' => parse_timestamp(payload)
            .map(FieldValue::DateTime)
            .ok_or_else(|| CursorError::invalid(format!("bad timestamp '{}'", payload)))?,
        other => {
            return Err(CursorError::invalid(format!(
                "unknown value tag '{}'",
                other
            )));
        }
    };

    Ok(value)
}

fn parse_timestamp(payload: &str) -> Option<DateTime<Utc>> {
    let (secs, nanos) = payload.split_once('.')?;
    if nanos.len() < 9 || !nanos.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    DateTime::from_timestamp(secs.parse().ok()?, nanos.parse().ok()?)
}

fn tag_for(kind: FieldKind) -> char {
    match kind {
        FieldKind::String => 's',
        FieldKind::Integer => 'i',
        FieldKind::Float => 'f',
        FieldKind::Boolean => 'b',
        FieldKind::Uuid => 'u',
        FieldKind::DateTime => 'd',
    }
}
