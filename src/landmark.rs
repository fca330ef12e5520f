//! Landmark records returned by source adapters
//!
//! Adapters hand back loosely typed values (whatever the script produced).
//! [`validate_landmarks`] is the single place where such values become
//! [`LandmarkRecord`]s; anything that does not fit is rejected with the index
//! of the first offending record.

use crate::geo::Location;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One geo-tagged result item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkRecord {
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub description: String,
    pub types: Vec<String>,
}

impl LandmarkRecord {
    pub fn new(lat: f64, lng: f64, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            lat,
            lng,
            name: name.into(),
            description: description.into(),
            types: Vec::new(),
        }
    }

    /// Add a type tag
    pub fn with_type(mut self, kind: impl Into<String>) -> Self {
        self.types.push(kind.into());
        self
    }

    pub fn location(&self) -> Location {
        Location::new(self.lat, self.lng)
    }
}

/// Validate an adapter result as an ordered sequence of landmark records.
///
/// Unknown fields are dropped. Coordinates must be in range.
pub fn validate_landmarks(value: Value) -> Result<Vec<LandmarkRecord>> {
    let Value::Array(items) = value else {
        return Err(Error::MalformedResult {
            index: None,
            reason: format!("expected an array of landmarks, got {}", describe(&value)),
        });
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            validate_record(item).map_err(|reason| Error::MalformedResult {
                index: Some(index),
                reason,
            })
        })
        .collect()
}

fn validate_record(item: Value) -> std::result::Result<LandmarkRecord, String> {
    let Value::Object(mut fields) = item else {
        return Err(format!("expected an object, got {}", describe(&item)));
    };

    let lat = number_field(&fields, "lat")?;
    let lng = number_field(&fields, "lng")?;
    Location::new(lat, lng).validate().map_err(|e| match e {
        Error::InvalidLocation(msg) => msg,
        other => other.to_string(),
    })?;

    let name = string_field(&mut fields, "name")?;
    let description = string_field(&mut fields, "description")?;

    let types = match fields.remove("types") {
        Some(Value::Array(tags)) => tags
            .into_iter()
            .enumerate()
            .map(|(i, tag)| match tag {
                Value::String(s) => Ok(s),
                other => Err(format!("field `types[{}]` must be a string, got {}", i, describe(&other))),
            })
            .collect::<std::result::Result<Vec<_>, _>>()?,
        Some(other) => return Err(format!("field `types` must be an array, got {}", describe(&other))),
        None => return Err("missing field `types`".to_string()),
    };

    Ok(LandmarkRecord { lat, lng, name, description, types })
}

fn number_field(fields: &Map<String, Value>, key: &str) -> std::result::Result<f64, String> {
    match fields.get(key) {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| format!("field `{}` is not representable as a float", key)),
        Some(other) => Err(format!("field `{}` must be a number, got {}", key, describe(other))),
        None => Err(format!("missing field `{}`", key)),
    }
}

fn string_field(fields: &mut Map<String, Value>, key: &str) -> std::result::Result<String, String> {
    match fields.remove(key) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(format!("field `{}` must be a string, got {}", key, describe(&other))),
        None => Err(format!("missing field `{}`", key)),
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
