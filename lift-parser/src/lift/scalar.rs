//! Scalar coercion
//!
//!     Typed wrappers for the attribute-level values of the format and the conversions between
//!     their markup text and their typed form. Every wrapper implements [`Scalar`], which is
//!     what the mapper and the serializer call; [`parse_scalar`] / [`format_scalar`] expose
//!     the same conversions for a kind chosen at runtime.
//!
//!     Formatting is canonical: the output depends on the value only, never on how the source
//!     spelled it. Dates are the visible case, `2008-07-01` comes back as
//!     `2008-07-01T00:00:00Z`.

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound};
use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// The value kinds a schema field can be coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScalarKind {
    /// Uninterpreted text.
    Text,
    /// A name or value drawn from a vocabulary (trait names, range ids, note types).
    Key,
    /// An identifier of an entry, sense or other identifiable item.
    RefId,
    /// A language tag.
    Lang,
    /// A URL, not checked for liveness.
    Url,
    DateTime,
    /// A non-negative integer (homograph numbers, relation order).
    Integer,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::Text => "text",
            ScalarKind::Key => "key",
            ScalarKind::RefId => "refid",
            ScalarKind::Lang => "lang",
            ScalarKind::Url => "url",
            ScalarKind::DateTime => "datetime",
            ScalarKind::Integer => "integer",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScalarError {
    #[error("{kind} value must not be empty")]
    Empty { kind: ScalarKind },
    #[error("'{text}' is not a date or timestamp")]
    InvalidDate { text: String },
    #[error("'{text}' is not a non-negative integer")]
    InvalidInteger { text: String },
}

/// Conversion between markup text and a typed value.
pub trait Scalar: Sized {
    const KIND: ScalarKind;

    fn parse_scalar(text: &str) -> Result<Self, ScalarError>;

    fn format_scalar(&self) -> String;
}

macro_rules! string_scalar {
    ($(#[$meta:meta])* $name:ident, $kind:expr, allow_empty = $allow_empty:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl Scalar for $name {
            const KIND: ScalarKind = $kind;

            fn parse_scalar(text: &str) -> Result<Self, ScalarError> {
                if !$allow_empty && text.is_empty() {
                    return Err(ScalarError::Empty { kind: Self::KIND });
                }
                Ok(Self(text.to_string()))
            }

            fn format_scalar(&self) -> String {
                self.0.clone()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

string_scalar!(
    /// A vocabulary key: trait names and values, note and relation types, range ids.
    Key,
    ScalarKind::Key,
    allow_empty = true
);

string_scalar!(
    /// Identifier of an identifiable item, or a weak reference to one.
    ///
    /// A `RefId` used as a reference carries no ownership; it is resolved through the
    /// lexicon's index when queried.
    RefId,
    ScalarKind::RefId,
    allow_empty = false
);

string_scalar!(
    /// A URL. Passed through untouched.
    Url,
    ScalarKind::Url,
    allow_empty = true
);

/// A language tag (`en`, `seh-fonipa-x-etic`).
///
/// Stored exactly as written; equality, ordering and hashing ignore ASCII case.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Lang(String);

impl Lang {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a plain tag.
    pub fn matches(&self, tag: &str) -> bool {
        self.0.eq_ignore_ascii_case(tag)
    }

    fn normalized(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl PartialEq for Lang {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl Eq for Lang {}

impl Hash for Lang {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl PartialOrd for Lang {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Lang {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.normalized().cmp(&other.normalized())
    }
}

impl Scalar for Lang {
    const KIND: ScalarKind = ScalarKind::Lang;

    fn parse_scalar(text: &str) -> Result<Self, ScalarError> {
        Ok(Self(text.to_string()))
    }

    fn format_scalar(&self) -> String {
        self.0.clone()
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Lang {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A timestamp, or the raw text of one that could not be read.
///
/// `Unparsed` only appears for optional fields; see the mapper's date policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DateTime {
    Parsed(chrono::DateTime<FixedOffset>),
    Unparsed(String),
}

impl DateTime {
    /// The current time, truncated to whole seconds.
    pub fn now() -> Self {
        DateTime::Parsed(chrono::Utc::now().trunc_subsecs(0).fixed_offset())
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, DateTime::Parsed(_))
    }

    pub fn timestamp(&self) -> Option<&chrono::DateTime<FixedOffset>> {
        match self {
            DateTime::Parsed(timestamp) => Some(timestamp),
            DateTime::Unparsed(_) => None,
        }
    }
}

fn parse_timestamp(text: &str) -> Option<chrono::DateTime<FixedOffset>> {
    let text = text.trim();
    if let Ok(timestamp) = chrono::DateTime::parse_from_rfc3339(text) {
        return Some(timestamp);
    }
    // Zone-less timestamps and plain dates are read as UTC.
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc().fixed_offset());
    }
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().fixed_offset())
}

impl Scalar for DateTime {
    const KIND: ScalarKind = ScalarKind::DateTime;

    fn parse_scalar(text: &str) -> Result<Self, ScalarError> {
        parse_timestamp(text)
            .map(DateTime::Parsed)
            .ok_or_else(|| ScalarError::InvalidDate {
                text: text.to_string(),
            })
    }

    fn format_scalar(&self) -> String {
        match self {
            DateTime::Parsed(timestamp) => timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            DateTime::Unparsed(raw) => raw.clone(),
        }
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_scalar())
    }
}

impl Scalar for u32 {
    const KIND: ScalarKind = ScalarKind::Integer;

    fn parse_scalar(text: &str) -> Result<Self, ScalarError> {
        text.trim()
            .parse()
            .map_err(|_| ScalarError::InvalidInteger {
                text: text.to_string(),
            })
    }

    fn format_scalar(&self) -> String {
        self.to_string()
    }
}

impl Scalar for String {
    const KIND: ScalarKind = ScalarKind::Text;

    fn parse_scalar(text: &str) -> Result<Self, ScalarError> {
        Ok(text.to_string())
    }

    fn format_scalar(&self) -> String {
        self.clone()
    }
}

/// A coerced value of a kind chosen at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Text(String),
    Key(Key),
    RefId(RefId),
    Lang(Lang),
    Url(Url),
    DateTime(DateTime),
    Integer(u32),
}

impl ScalarValue {
    pub fn kind(&self) -> ScalarKind {
        match self {
            ScalarValue::Text(_) => ScalarKind::Text,
            ScalarValue::Key(_) => ScalarKind::Key,
            ScalarValue::RefId(_) => ScalarKind::RefId,
            ScalarValue::Lang(_) => ScalarKind::Lang,
            ScalarValue::Url(_) => ScalarKind::Url,
            ScalarValue::DateTime(_) => ScalarKind::DateTime,
            ScalarValue::Integer(_) => ScalarKind::Integer,
        }
    }
}

pub fn parse_scalar(text: &str, kind: ScalarKind) -> Result<ScalarValue, ScalarError> {
    Ok(match kind {
        ScalarKind::Text => ScalarValue::Text(String::parse_scalar(text)?),
        ScalarKind::Key => ScalarValue::Key(Key::parse_scalar(text)?),
        ScalarKind::RefId => ScalarValue::RefId(RefId::parse_scalar(text)?),
        ScalarKind::Lang => ScalarValue::Lang(Lang::parse_scalar(text)?),
        ScalarKind::Url => ScalarValue::Url(Url::parse_scalar(text)?),
        ScalarKind::DateTime => ScalarValue::DateTime(DateTime::parse_scalar(text)?),
        ScalarKind::Integer => ScalarValue::Integer(u32::parse_scalar(text)?),
    })
}

pub fn format_scalar(value: &ScalarValue) -> String {
    match value {
        ScalarValue::Text(text) => text.format_scalar(),
        ScalarValue::Key(key) => key.format_scalar(),
        ScalarValue::RefId(id) => id.format_scalar(),
        ScalarValue::Lang(lang) => lang.format_scalar(),
        ScalarValue::Url(url) => url.format_scalar(),
        ScalarValue::DateTime(date) => date.format_scalar(),
        ScalarValue::Integer(number) => number.format_scalar(),
    }
}

/// One named property, with an optional type name and a required flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Property {
    pub name: String,
    pub value: Option<String>,
    #[serde(rename = "type")]
    pub prop_type: Option<String>,
    pub required: bool,
}

impl Property {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            prop_type: None,
            required: false,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_type(mut self, prop_type: impl Into<String>) -> Self {
        self.prop_type = Some(prop_type.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(prop_type) = &self.prop_type {
            write!(f, ": {prop_type}")?;
        }
        if self.required {
            f.write_str(" (required)")?;
        }
        if let Some(value) = &self.value {
            write!(f, " = {value}")?;
        }
        Ok(())
    }
}

/// Ordered key/value pairs. Adding a property whose name is already present is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PropertyBag {
    properties: Vec<Property>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, property: Property) {
        if self.get(&property.name).is_none() {
            self.properties.push(property);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter()
    }

    pub fn required(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter().filter(|p| p.required)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl FromIterator<Property> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = Property>>(iter: I) -> Self {
        let mut bag = PropertyBag::new();
        for property in iter {
            bag.add(property);
        }
        bag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("2008-07-01", "2008-07-01T00:00:00Z")]
    #[case("2008-07-01T10:20:30Z", "2008-07-01T10:20:30Z")]
    #[case("2008-07-01T10:20:30", "2008-07-01T10:20:30Z")]
    #[case("2008-07-01T10:20:30+02:00", "2008-07-01T10:20:30+02:00")]
    #[case("2008-07-01T10:20:30.250Z", "2008-07-01T10:20:30.250Z")]
    fn test_date_time_is_formatted_canonically(#[case] input: &str, #[case] expected: &str) {
        let date = DateTime::parse_scalar(input).expect("valid date");
        assert_eq!(date.format_scalar(), expected);
        assert_eq!(DateTime::parse_scalar(expected), Ok(date));
    }

    #[rstest]
    #[case("yesterday")]
    #[case("2008-13-01")]
    #[case("")]
    fn test_malformed_dates_are_rejected(#[case] input: &str) {
        assert!(matches!(
            DateTime::parse_scalar(input),
            Err(ScalarError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_unparsed_date_formats_verbatim() {
        let date = DateTime::Unparsed("circa 1990".to_string());
        assert_eq!(date.format_scalar(), "circa 1990");
        assert!(!date.is_parsed());
    }

    #[test]
    fn test_ref_id_must_not_be_empty() {
        assert_eq!(
            RefId::parse_scalar(""),
            Err(ScalarError::Empty {
                kind: ScalarKind::RefId
            })
        );
        assert_eq!(RefId::parse_scalar("house_1").map(|id| id.to_string()), Ok("house_1".to_string()));
        assert!(Key::parse_scalar("").is_ok());
    }

    #[test]
    fn test_lang_compares_case_insensitively_but_stores_original() {
        let lang = Lang::parse_scalar("SEH-Latn").expect("lang");
        assert_eq!(lang, Lang::from("seh-latn"));
        assert!(lang.matches("seh-LATN"));
        assert_eq!(lang.format_scalar(), "SEH-Latn");
    }

    #[test]
    fn test_integer_rejects_negative_values() {
        assert_eq!(u32::parse_scalar("3"), Ok(3));
        assert!(u32::parse_scalar("-1").is_err());
        assert!(u32::parse_scalar("two").is_err());
    }

    #[test]
    fn test_runtime_kind_dispatch() {
        let value = parse_scalar("2001-02-03", ScalarKind::DateTime).expect("date");
        assert_eq!(value.kind(), ScalarKind::DateTime);
        assert_eq!(format_scalar(&value), "2001-02-03T00:00:00Z");

        let value = parse_scalar("en", ScalarKind::Lang).expect("lang");
        assert_eq!(format_scalar(&value), "en");

        assert!(parse_scalar("", ScalarKind::RefId).is_err());
    }

    #[test]
    fn test_property_bag_keeps_first_of_duplicate_names() {
        let bag: PropertyBag = vec![
            Property::new("name").required(true).with_type("key"),
            Property::new("name").with_type("text"),
            Property::new("who"),
        ]
        .into_iter()
        .collect();
        assert_eq!(bag.len(), 2);
        assert_eq!(bag.get("name").and_then(|p| p.prop_type.as_deref()), Some("key"));
        assert_eq!(bag.required().count(), 1);
        assert_eq!(bag.get("name").map(ToString::to_string), Some("name: key (required)".to_string()));
    }
}
