//! Lenient `deserialize_with` helpers for request payloads.
//!
//! Clients frequently send numbers and booleans as strings (query strings
//! always do), embed JSON documents inside string fields, or pad text with
//! whitespace. These helpers normalize such input at the deserialization
//! boundary. A value that cannot be coerced is a deserialization error, so
//! the API layer reports it against the offending field.
//!
//! ```
//! use serde::Deserialize;
//! use stowage_core::types::coerce;
//!
//! #[derive(Deserialize)]
//! struct Query {
//!     #[serde(deserialize_with = "coerce::trim_string")]
//!     name: String,
//!     #[serde(default, deserialize_with = "coerce::parse_bool_opt")]
//!     archived: Option<bool>,
//! }
//!
//! let q: Query = serde_json::from_str(r#"{"name": "  report ", "archived": "yes"}"#).unwrap();
//! assert_eq!(q.name, "report");
//! assert_eq!(q.archived, Some(true));
//! ```

use std::fmt::Display;
use std::str::FromStr;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};

/// Trim surrounding whitespace.
pub fn trim_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.trim().to_string())
}

/// Trim surrounding whitespace; a blank string becomes `None`.
pub fn trim_string_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolLike {
    Bool(bool),
    Int(i64),
    Text(String),
}

fn bool_from_text(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl BoolLike {
    fn into_bool<E: serde::de::Error>(self) -> Result<bool, E> {
        match self {
            Self::Bool(b) => Ok(b),
            Self::Int(1) => Ok(true),
            Self::Int(0) => Ok(false),
            Self::Int(n) => Err(E::custom(format!("expected 0 or 1, got {n}"))),
            Self::Text(text) => bool_from_text(&text)
                .ok_or_else(|| E::custom(format!("'{text}' is not a boolean"))),
        }
    }
}

/// Accept a boolean, `0`/`1`, or one of `true/false/1/0/yes/no/on/off`.
pub fn parse_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    BoolLike::deserialize(deserializer)?.into_bool()
}

/// Optional variant of [`parse_bool`].
pub fn parse_bool_opt<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<BoolLike>::deserialize(deserializer)? {
        Some(value) => value.into_bool().map(Some),
        None => Ok(None),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberLike<T> {
    Number(T),
    Text(String),
}

impl<T> NumberLike<T>
where
    T: FromStr,
    T::Err: Display,
{
    fn into_number<E: serde::de::Error>(self) -> Result<T, E> {
        match self {
            Self::Number(n) => Ok(n),
            Self::Text(text) => text
                .trim()
                .parse::<T>()
                .map_err(|e| E::custom(format!("'{text}' is not a valid number: {e}"))),
        }
    }
}

/// Accept a number or a string holding one.
pub fn parse_number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    NumberLike::<T>::deserialize(deserializer)?.into_number()
}

/// Optional variant of [`parse_number`]. A blank string becomes `None`.
pub fn parse_number_opt<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match Option::<NumberLike<T>>::deserialize(deserializer)? {
        Some(NumberLike::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(value) => value.into_number().map(Some),
        None => Ok(None),
    }
}

/// Accept a JSON value, or a string containing a JSON document.
pub fn parse_json<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(text) => serde_json::from_str(&text)
            .map_err(|e| D::Error::custom(format!("invalid embedded JSON: {e}"))),
        other => serde_json::from_value(other).map_err(D::Error::custom),
    }
}
