use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SourceError;

/// One directory entry after field-name normalization, before scoring.
///
/// Every field is optional: directories disagree on what they publish, and
/// the normalizer decides what is fatal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEntry {
    pub name: Option<String>,
    pub description: Option<String>,
    pub auth: Option<String>,
    pub https: Option<bool>,
    pub cors: Option<String>,
    pub link: Option<String>,
    pub category: Option<String>,
}

const NAME_KEYS: &[&str] = &["API", "api", "Name", "name", "title"];
const DESCRIPTION_KEYS: &[&str] = &["Description", "description", "desc"];
const AUTH_KEYS: &[&str] = &["Auth", "auth", "authentication"];
const HTTPS_KEYS: &[&str] = &["HTTPS", "https", "Https"];
const CORS_KEYS: &[&str] = &["Cors", "cors", "CORS"];
const LINK_KEYS: &[&str] = &["Link", "link", "url", "URL"];
const CATEGORY_KEYS: &[&str] = &["Category", "category"];

fn first_str(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find_map(|v| match v {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

fn first_bool(obj: &Map<String, Value>, keys: &[&str]) -> Option<bool> {
    keys.iter().filter_map(|k| obj.get(*k)).find_map(|v| match v {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" => Some(true),
            "no" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

impl RawEntry {
    /// Map an arbitrary directory object onto the uniform shape.
    /// Returns `None` for values that are not JSON objects.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            name: first_str(obj, NAME_KEYS),
            description: first_str(obj, DESCRIPTION_KEYS),
            auth: first_str(obj, AUTH_KEYS),
            https: first_bool(obj, HTTPS_KEYS),
            cors: first_str(obj, CORS_KEYS),
            link: first_str(obj, LINK_KEYS),
            category: first_str(obj, CATEGORY_KEYS),
        })
    }
}

/// Parse a directory payload.
///
/// Accepts either a top-level array of entries or an object carrying an
/// `entries` (or `Entries`) array. Non-object items are skipped.
pub fn parse_directory(payload: &[u8]) -> Result<Vec<RawEntry>, SourceError> {
    let value: Value = serde_json::from_slice(payload)?;
    let items = match &value {
        Value::Array(items) => items,
        Value::Object(obj) => obj
            .get("entries")
            .or_else(|| obj.get("Entries"))
            .and_then(Value::as_array)
            .ok_or_else(|| SourceError::Malformed("object payload without an entries array".into()))?,
        _ => return Err(SourceError::Malformed("expected an array or object".into())),
    };
    Ok(items.iter().filter_map(RawEntry::from_value).collect())
}
