use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use url::Url;

use crate::errors::PlaceError;
use crate::geo::Coordinate;

/// Whether a place is a Shinto shrine or a Buddhist temple.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceType {
    Shrine,
    Temple,
}

impl PlaceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceType::Shrine => "shrine",
            PlaceType::Temple => "temple",
        }
    }
}

impl fmt::Display for PlaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaceType {
    type Err = PlaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shrine" => Ok(PlaceType::Shrine),
            "temple" => Ok(PlaceType::Temple),
            other => Err(PlaceError::UnknownType(other.to_owned())),
        }
    }
}

/// A shrine or temple in the catalog. Owned by the place registry;
/// read-only everywhere else.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: String,

    pub name: String,

    #[serde(rename = "type")]
    pub place_type: PlaceType,

    pub prefecture: String,

    pub city: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,

    /// Whether the place issues goshuin at all, regardless of anyone's
    /// visits.
    pub has_goshuin: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goshuin_type: Option<String>,

    #[serde(rename = "hours_notes", default, skip_serializing_if = "Option::is_none")]
    pub hours_notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_period: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub official_url: Option<Url>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<Url>,

    pub source: String,

    pub updated_at: String,
}

impl Place {
    /// The place's position, if both components are present, finite and
    /// non-zero.
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) if lat != 0.0 && lng != 0.0 => {
                Some(Coordinate::new(lat, lng)).filter(Coordinate::is_valid)
            }
            _ => None,
        }
    }
}

/// A catalog row as it arrives from the document store, before any
/// validation: numbers may be strings, flags may be strings, and blank
/// strings or nulls stand in for missing values. A `0` coordinate means
/// the position was never filled in.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlace {
    #[serde(default)]
    pub id: Option<Value>,

    #[serde(default, deserialize_with = "deserialize_text")]
    pub name: String,

    #[serde(rename = "type", default, deserialize_with = "deserialize_text")]
    pub place_type: String,

    #[serde(default, deserialize_with = "deserialize_text")]
    pub prefecture: String,

    #[serde(default, deserialize_with = "deserialize_text")]
    pub city: String,

    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub address: Option<String>,

    #[serde(default)]
    pub lat: Option<Value>,

    #[serde(default)]
    pub lng: Option<Value>,

    #[serde(default, deserialize_with = "deserialize_flag")]
    pub has_goshuin: bool,

    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub goshuin_type: Option<String>,

    #[serde(rename = "hours_notes", default, deserialize_with = "deserialize_optional_text")]
    pub hours_notes: Option<String>,

    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub special_period: Option<String>,

    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub official_url: Option<String>,

    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub photo_url: Option<String>,

    #[serde(default, deserialize_with = "deserialize_text")]
    pub source: String,

    #[serde(default, deserialize_with = "deserialize_text")]
    pub updated_at: String,
}

impl RawPlace {
    /// The row's ID as written, for diagnostics.
    pub fn id_label(&self) -> String {
        match &self.id {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }
}

impl TryFrom<RawPlace> for Place {
    type Error = PlaceError;

    fn try_from(raw: RawPlace) -> Result<Self, Self::Error> {
        let id = match &raw.id {
            Some(Value::String(s)) => s.trim().to_owned(),
            None | Some(Value::Null) => String::new(),
            Some(other) => return Err(PlaceError::InvalidId(other.to_string())),
        };

        if id.is_empty() {
            return Err(PlaceError::MissingId);
        }

        let place_type = raw.place_type.trim().parse()?;

        Ok(Place {
            id,
            name: raw.name,
            place_type,
            prefecture: raw.prefecture,
            city: raw.city,
            address: raw.address,
            lat: raw.lat.as_ref().and_then(coerce_number),
            lng: raw.lng.as_ref().and_then(coerce_number),
            has_goshuin: raw.has_goshuin,
            goshuin_type: raw.goshuin_type,
            hours_notes: raw.hours_notes,
            special_period: raw.special_period,
            official_url: raw.official_url.as_deref().and_then(|u| Url::parse(u).ok()),
            photo_url: raw.photo_url.as_deref().and_then(|u| Url::parse(u).ok()),
            source: raw.source,
            updated_at: raw.updated_at,
        })
    }
}

/// Reads a JSON number or numeric string as a finite, non-zero `f64`.
fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    number.filter(|&n| is_set(n))
}

/// Zero is the store's placeholder for a coordinate nobody filled in.
fn is_set(component: f64) -> bool {
    component.is_finite() && component != 0.0
}

/// Reads a scalar as text; anything else becomes an empty string.
fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Deserialize::deserialize(deserializer)?;

    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

/// Like `deserialize_text`, with blank values treated as absent.
fn deserialize_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = deserialize_text(deserializer)?;

    Ok(Some(text).filter(|t| !t.trim().is_empty()))
}

/// Reads a boolean that may have been stored as `"true"`, `"True"` or `"1"`.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Deserialize::deserialize(deserializer)?;

    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => matches!(s.as_str(), "true" | "True" | "1"),
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        _ => false,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::{Place, PlaceType};

    /// A minimal place for tests.
    pub fn place(id: &str, place_type: PlaceType, coordinate: Option<(f64, f64)>) -> Place {
        Place {
            id: id.to_owned(),
            name: format!("Place {}", id),
            place_type,
            prefecture: "Tokyo".to_owned(),
            city: "Shibuya".to_owned(),
            address: None,
            lat: coordinate.map(|(lat, _)| lat),
            lng: coordinate.map(|(_, lng)| lng),
            has_goshuin: true,
            goshuin_type: None,
            hours_notes: None,
            special_period: None,
            official_url: None,
            photo_url: None,
            source: "test".to_owned(),
            updated_at: "2025-08-12".to_owned(),
        }
    }
}
