//! Typed decoding of self-describing field nodes.
//!
//! # Design
//! Lighthouse tags every field element with a `type` attribute
//! (`<id type="integer">2245</id>`). `FieldType` is the closed set of tags
//! this client understands, and each variant owns exactly one conversion.
//! A node without a `type` attribute is passed through as its raw text.
//!
//! Boolean decoding is deliberately permissive: anything other than `1` or
//! a spelling of `true` is `false`, and it never reports an error.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::entity::{decode_fields, Fields};
use crate::error::DecodeError;
use crate::xml::Node;

/// Declared type of a field node.
///
/// `Integer` values are `i64`; anything outside that range is rejected as
/// `DecodeError::InvalidInteger`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    DateTime,
    Integer,
    Boolean,
    String,
    Nil,
    /// A nested collection, one record per element child.
    Array,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::DateTime => "datetime",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::String => "string",
            FieldType::Nil => "nil",
            FieldType::Array => "array",
        }
    }

    /// Decode raw node text. `Array` has no textual form and yields an
    /// empty collection here; use [`Field::from_node`] for nested nodes.
    pub fn decode(&self, raw: Option<&str>) -> Result<FieldValue, DecodeError> {
        match self {
            FieldType::DateTime => decode_datetime(raw),
            FieldType::Integer => decode_integer(raw),
            FieldType::Boolean => Ok(FieldValue::Boolean(decode_boolean(raw))),
            FieldType::String => {
                Ok(raw.map_or(FieldValue::Nil, |s| FieldValue::String(s.to_string())))
            }
            FieldType::Nil => Ok(FieldValue::Nil),
            FieldType::Array => Ok(FieldValue::Array(Vec::new())),
        }
    }

    /// Convert an already-decoded value into this type.
    pub fn coerce(&self, value: &FieldValue) -> Result<FieldValue, DecodeError> {
        match (self, value) {
            (FieldType::Nil, _) => Ok(FieldValue::Nil),
            (FieldType::String, FieldValue::Nil) => Ok(FieldValue::Nil),
            (FieldType::String, v) => Ok(FieldValue::String(v.to_string())),
            (FieldType::Boolean, FieldValue::Boolean(b)) => Ok(FieldValue::Boolean(*b)),
            (FieldType::Boolean, FieldValue::Integer(n)) => Ok(FieldValue::Boolean(*n == 1)),
            (FieldType::Boolean, FieldValue::String(s)) => {
                Ok(FieldValue::Boolean(decode_boolean(Some(s.as_str()))))
            }
            (FieldType::Boolean, _) => Ok(FieldValue::Boolean(false)),
            (FieldType::Integer, FieldValue::Integer(n)) => Ok(FieldValue::Integer(*n)),
            (FieldType::DateTime, FieldValue::DateTime(t)) => Ok(FieldValue::DateTime(*t)),
            (FieldType::Array, FieldValue::Array(records)) => {
                Ok(FieldValue::Array(records.clone()))
            }
            (_, FieldValue::Nil) => self.decode(None),
            (_, v) => self.decode(Some(&v.to_string())),
        }
    }
}

impl FromStr for FieldType {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "datetime" => Ok(FieldType::DateTime),
            "integer" => Ok(FieldType::Integer),
            "boolean" => Ok(FieldType::Boolean),
            "string" => Ok(FieldType::String),
            "nil" => Ok(FieldType::Nil),
            "array" => Ok(FieldType::Array),
            other => Err(DecodeError::UnknownType(other.to_string())),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Nil,
    Integer(i64),
    Boolean(bool),
    String(String),
    DateTime(DateTime<FixedOffset>),
    Array(Vec<Fields>),
}

impl FieldValue {
    pub fn is_nil(&self) -> bool {
        matches!(self, FieldValue::Nil)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            FieldValue::DateTime(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Fields]> {
        match self {
            FieldValue::Array(records) => Some(records),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Nil => Ok(()),
            FieldValue::Integer(n) => write!(f, "{n}"),
            FieldValue::Boolean(b) => write!(f, "{b}"),
            FieldValue::String(s) => f.write_str(s),
            FieldValue::DateTime(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S%:z")),
            FieldValue::Array(records) => write!(f, "[{} records]", records.len()),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Integer(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Boolean(b)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<DateTime<FixedOffset>> for FieldValue {
    fn from(t: DateTime<FixedOffset>) -> Self {
        FieldValue::DateTime(t)
    }
}

/// One decoded field node: its name, value and declared type (if any).
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
    pub field_type: Option<FieldType>,
}

impl Field {
    pub fn from_node(node: &Node) -> Result<Self, DecodeError> {
        let field_type = node.attribute("type").map(str::parse::<FieldType>).transpose()?;
        let raw = node.cdata.as_deref();

        let value = if node.attribute("nil") == Some("true") {
            FieldValue::Nil
        } else {
            match field_type {
                None => raw.map_or(FieldValue::Nil, |s| FieldValue::String(s.to_string())),
                Some(FieldType::Array) => FieldValue::Array(
                    node.children
                        .iter()
                        .map(decode_fields)
                        .collect::<Result<Vec<_>, _>>()?,
                ),
                Some(t) => t.decode(raw)?,
            }
        };

        Ok(Field {
            name: node.name.clone(),
            value,
            field_type,
        })
    }

    /// The key this field is stored under on an entity.
    pub fn key(&self) -> String {
        self.name.replace('-', "_")
    }
}

/// ISO-8601 layouts tried after RFC 3339, in order. `%#z` also accepts
/// hour-only offsets and `%.f` an optional fraction.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y%m%dT%H%M%S%.f%#z",
    "%Y%m%dT%H%M%#z",
];

fn decode_datetime(raw: Option<&str>) -> Result<FieldValue, DecodeError> {
    let Some(s) = raw.filter(|s| !s.is_empty()) else {
        return Ok(FieldValue::Nil);
    };
    let trimmed = s.trim();

    DateTime::parse_from_rfc3339(trimmed)
        .or_else(|err| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| DateTime::parse_from_str(trimmed, format).ok())
                .ok_or(err)
        })
        .map(FieldValue::DateTime)
        .map_err(|source| DecodeError::InvalidDateTime {
            input: s.to_string(),
            source,
        })
}

fn decode_integer(raw: Option<&str>) -> Result<FieldValue, DecodeError> {
    let Some(s) = raw.filter(|s| !s.is_empty()) else {
        return Ok(FieldValue::Nil);
    };

    s.trim()
        .parse::<i64>()
        .map(FieldValue::Integer)
        .map_err(|_| DecodeError::InvalidInteger(s.to_string()))
}

fn decode_boolean(raw: Option<&str>) -> bool {
    matches!(raw, Some(s) if s == "1" || s.eq_ignore_ascii_case("true"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn node(name: &str, attrs: &[(&str, &str)], cdata: Option<&str>) -> Node {
        Node {
            name: name.to_string(),
            attributes: attrs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            cdata: cdata.map(str::to_string),
            children: Vec::new(),
        }
    }

    #[test]
    fn datetime_keeps_wall_clock_and_offset() {
        let value = FieldType::DateTime.decode(Some("2009-01-26T16:47:00-08:00")).unwrap();
        let t = value.as_datetime().unwrap();
        assert_eq!((t.year(), t.month(), t.day()), (2009, 1, 26));
        assert_eq!((t.hour(), t.minute(), t.second()), (16, 47, 0));
        assert_eq!(t.offset().local_minus_utc(), -8 * 3600);
    }

    #[test]
    fn datetime_accepts_positive_offsets_and_zulu() {
        let t = FieldType::DateTime.decode(Some("2008-09-25T20:04:13+01:00")).unwrap();
        assert_eq!(t.as_datetime().unwrap().offset().local_minus_utc(), 3600);

        let t = FieldType::DateTime.decode(Some("2009-01-31T23:42:18Z")).unwrap();
        assert_eq!(t.as_datetime().unwrap().offset().local_minus_utc(), 0);

        let t = FieldType::DateTime.decode(Some("2009-01-31T15:42:18-0800")).unwrap();
        assert_eq!(t.as_datetime().unwrap().hour(), 15);
    }

    #[test]
    fn datetime_accepts_other_iso_8601_layouts() {
        let cases = [
            ("2009-01-26T16:47-08:00", (16, 47, 0), -8 * 3600),
            ("2009-01-26T16:47:00-08", (16, 47, 0), -8 * 3600),
            ("2009-01-26T16:47:00.5-0800", (16, 47, 0), -8 * 3600),
            ("20090126T164700-0800", (16, 47, 0), -8 * 3600),
            ("2009-01-26 16:47:00+05:30", (16, 47, 0), 5 * 3600 + 1800),
        ];
        for (raw, (h, m, sec), offset) in cases {
            let value = FieldType::DateTime.decode(Some(raw)).unwrap();
            let t = value.as_datetime().unwrap();
            assert_eq!((t.year(), t.month(), t.day()), (2009, 1, 26), "{raw}");
            assert_eq!((t.hour(), t.minute(), t.second()), (h, m, sec), "{raw}");
            assert_eq!(t.offset().local_minus_utc(), offset, "{raw}");
        }
    }

    #[test]
    fn datetime_keeps_fractional_seconds() {
        let value = FieldType::DateTime.decode(Some("2009-01-26T16:47:00.5-0800")).unwrap();
        assert_eq!(value.as_datetime().unwrap().timestamp_subsec_millis(), 500);
    }

    #[test]
    fn datetime_rejects_whitespace_only_text() {
        let err = FieldType::DateTime.decode(Some("   ")).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidDateTime { .. }));
    }

    #[test]
    fn datetime_rejects_garbage() {
        let err = FieldType::DateTime.decode(Some("last tuesday")).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidDateTime { .. }));
    }

    #[test]
    fn datetime_without_text_is_nil() {
        assert_eq!(FieldType::DateTime.decode(None).unwrap(), FieldValue::Nil);
    }

    #[test]
    fn integer_parses_base_ten() {
        assert_eq!(FieldType::Integer.decode(Some("10")).unwrap(), FieldValue::Integer(10));
        assert_eq!(FieldType::Integer.decode(Some("-3")).unwrap(), FieldValue::Integer(-3));
    }

    #[test]
    fn integer_rejects_non_integers() {
        assert_eq!(
            FieldType::Integer.decode(Some("True")).unwrap_err(),
            DecodeError::InvalidInteger("True".to_string())
        );
        assert_eq!(
            FieldType::Integer.decode(Some("23.5")).unwrap_err(),
            DecodeError::InvalidInteger("23.5".to_string())
        );
    }

    #[test]
    fn integer_beyond_i64_is_rejected() {
        assert_eq!(
            FieldType::Integer.decode(Some("99999999999999999999")).unwrap_err(),
            DecodeError::InvalidInteger("99999999999999999999".to_string())
        );
    }

    #[test]
    fn integer_without_text_is_nil() {
        assert_eq!(FieldType::Integer.decode(None).unwrap(), FieldValue::Nil);
        assert_eq!(FieldType::Integer.decode(Some("")).unwrap(), FieldValue::Nil);
    }

    #[test]
    fn boolean_truthy_inputs() {
        for raw in ["1", "true", "True", "TRUE"] {
            assert_eq!(
                FieldType::Boolean.decode(Some(raw)).unwrap(),
                FieldValue::Boolean(true),
                "{raw}"
            );
        }
        assert_eq!(
            FieldType::Boolean.coerce(&FieldValue::Integer(1)).unwrap(),
            FieldValue::Boolean(true)
        );
    }

    #[test]
    fn boolean_falsy_inputs() {
        for raw in ["2", "0", "false", "False"] {
            assert_eq!(
                FieldType::Boolean.decode(Some(raw)).unwrap(),
                FieldValue::Boolean(false),
                "{raw}"
            );
        }
        for n in [2, 0] {
            assert_eq!(
                FieldType::Boolean.coerce(&FieldValue::Integer(n)).unwrap(),
                FieldValue::Boolean(false)
            );
        }
    }

    // Current behaviour, not necessarily desirable: malformed booleans are
    // silently read as false.
    #[test]
    fn boolean_never_fails_on_garbage() {
        assert_eq!(
            FieldType::Boolean.decode(Some("yes please")).unwrap(),
            FieldValue::Boolean(false)
        );
        assert_eq!(FieldType::Boolean.decode(None).unwrap(), FieldValue::Boolean(false));
    }

    #[test]
    fn string_stringifies_primitives() {
        assert_eq!(FieldType::String.decode(Some("lol")).unwrap(), FieldValue::from("lol"));
        assert_eq!(
            FieldType::String.coerce(&FieldValue::Integer(1)).unwrap(),
            FieldValue::from("1")
        );
        assert_eq!(
            FieldType::String.coerce(&FieldValue::Boolean(true)).unwrap(),
            FieldValue::from("true")
        );
        assert_eq!(
            FieldType::String.decode(Some("2008-09-25T20:04:13+01:00")).unwrap(),
            FieldValue::from("2008-09-25T20:04:13+01:00")
        );

        let t = FieldType::DateTime.decode(Some("2008-09-25T20:04:13+01:00")).unwrap();
        assert_eq!(
            FieldType::String.coerce(&t).unwrap(),
            FieldValue::from("2008-09-25 20:04:13+01:00")
        );
    }

    #[test]
    fn nil_ignores_input() {
        assert_eq!(FieldType::Nil.decode(Some("lol")).unwrap(), FieldValue::Nil);
        assert_eq!(FieldType::Nil.coerce(&FieldValue::Integer(1)).unwrap(), FieldValue::Nil);
        assert_eq!(FieldType::Nil.coerce(&FieldValue::Boolean(true)).unwrap(), FieldValue::Nil);
        assert_eq!(FieldType::Nil.decode(None).unwrap(), FieldValue::Nil);
    }

    #[test]
    fn coerce_redecodes_text() {
        assert_eq!(
            FieldType::Integer.coerce(&FieldValue::from("42")).unwrap(),
            FieldValue::Integer(42)
        );
        assert!(FieldType::Integer.coerce(&FieldValue::Boolean(true)).is_err());
    }

    #[test]
    fn unknown_type_tag_is_rejected() {
        assert_eq!(
            "yaml".parse::<FieldType>().unwrap_err(),
            DecodeError::UnknownType("yaml".to_string())
        );
    }

    #[test]
    fn untyped_node_passes_text_through() {
        let field = Field::from_node(&node("permalink", &[], Some("ars-technica-50"))).unwrap();
        assert_eq!(field.value, FieldValue::from("ars-technica-50"));
        assert_eq!(field.field_type, None);

        let field = Field::from_node(&node("description", &[], None)).unwrap();
        assert!(field.value.is_nil());
    }

    #[test]
    fn nil_attribute_wins_over_declared_type() {
        let node = node("closed-at", &[("type", "datetime"), ("nil", "true")], None);
        let field = Field::from_node(&node).unwrap();
        assert!(field.value.is_nil());
        assert_eq!(field.field_type, Some(FieldType::DateTime));
    }

    #[test]
    fn typed_node_is_decoded_and_keyed() {
        let node = node("open-tickets-count", &[("type", "integer")], Some("12"));
        let field = Field::from_node(&node).unwrap();
        assert_eq!(field.value, FieldValue::Integer(12));
        assert_eq!(field.key(), "open_tickets_count");
    }

    #[test]
    fn array_node_decodes_each_child_record() {
        let mut versions = node("versions", &[("type", "array")], None);
        let mut version = node("version", &[], None);
        version.children.push(node("version", &[("type", "integer")], Some("2")));
        version.children.push(node("user-name", &[], Some("Clint")));
        versions.children.push(version);

        let field = Field::from_node(&versions).unwrap();
        let records = field.value.as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("version"), Some(&FieldValue::Integer(2)));
        assert_eq!(records[0].get("user_name").and_then(FieldValue::as_str), Some("Clint"));
    }

    #[test]
    fn decode_error_in_field_propagates() {
        let err = Field::from_node(&node("id", &[("type", "integer")], Some("abc"))).unwrap_err();
        assert_eq!(err, DecodeError::InvalidInteger("abc".to_string()));
    }
}
