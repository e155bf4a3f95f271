use serde::Deserialize;

use crate::dates::parse_date;
use crate::errors::BackendError;
use crate::geo::Coordinate;
use crate::normalization::deserialize_option;
use crate::search::{SearchFilters, SearchRequest};
use crate::visit::NewVisitRecord;

/// Query string of `GET /shrines-temples`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceQuery {
    #[serde(default, deserialize_with = "deserialize_option")]
    pub prefecture: Option<String>,

    #[serde(default, deserialize_with = "deserialize_option")]
    pub city: Option<String>,

    #[serde(default, rename = "type")]
    pub place_type: Option<String>,

    #[serde(default)]
    pub has_goshuin: Option<String>,

    #[serde(flatten)]
    pub location: NearbyQuery,
}

impl PlaceQuery {
    /// A nearby search when both `lat` and `lng` are given, a field search
    /// otherwise.
    pub fn into_request(self, default_radius_km: f64) -> Result<SearchRequest, BackendError> {
        if self.location.lat.is_some() && self.location.lng.is_some() {
            return self.location.into_request(default_radius_km);
        }

        let place_type = match &self.place_type {
            Some(place_type) => place_type.parse()?,
            None => Default::default(),
        };

        Ok(SearchRequest::Fields(SearchFilters {
            prefecture: self.prefecture,
            city: self.city,
            place_type,
            has_goshuin: self.has_goshuin.map(|v| v == "true"),
        }))
    }
}

/// Query string of `GET /search/nearby`.
#[derive(Debug, Default, Deserialize)]
pub struct NearbyQuery {
    #[serde(default, deserialize_with = "deserialize_option")]
    pub lat: Option<String>,

    #[serde(default, deserialize_with = "deserialize_option")]
    pub lng: Option<String>,

    #[serde(default, deserialize_with = "deserialize_option")]
    pub radius: Option<String>,
}

impl NearbyQuery {
    pub fn into_request(self, default_radius_km: f64) -> Result<SearchRequest, BackendError> {
        let lat = parse_number("lat", self.lat.ok_or(BackendError::MissingParameter("lat"))?)?;
        let lng = parse_number("lng", self.lng.ok_or(BackendError::MissingParameter("lng"))?)?;

        let radius_km = match self.radius {
            Some(radius) => parse_number("radius", radius)?,
            None => default_radius_km,
        };

        Ok(SearchRequest::Nearby {
            center: Coordinate::new(lat, lng),
            radius_km,
        })
    }
}

fn parse_number(name: &'static str, value: String) -> Result<f64, BackendError> {
    match value.trim().parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(number),
        _ => Err(BackendError::InvalidNumber { name, value }),
    }
}

/// Body of `POST /visit-records`. Required fields are checked by
/// `into_new_record` so that a missing one is reported as such.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecordBody {
    #[serde(default, deserialize_with = "deserialize_option")]
    pub shrine_temple_id: Option<String>,

    #[serde(default, deserialize_with = "deserialize_option")]
    pub shrine_temple_name: Option<String>,

    #[serde(default, deserialize_with = "deserialize_option")]
    pub visit_date: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default)]
    pub rating: Option<u8>,

    #[serde(default)]
    pub is_favorite: Option<bool>,

    #[serde(default)]
    pub has_goshuin: Option<bool>,
}

impl NewRecordBody {
    pub fn into_new_record(self) -> Result<NewVisitRecord, BackendError> {
        let (shrine_temple_id, shrine_temple_name, visit_date) =
            match (self.shrine_temple_id, self.shrine_temple_name, self.visit_date) {
                (Some(id), Some(name), Some(date)) => (id, name, date),
                _ => return Err(BackendError::MissingFields),
            };

        Ok(NewVisitRecord {
            shrine_temple_id,
            shrine_temple_name,
            visit_date: parse_date(&visit_date)?,
            notes: Some(self.notes.unwrap_or_default()),
            rating: self.rating,
            is_favorite: self.is_favorite,
            has_goshuin: self.has_goshuin.unwrap_or(false),
        })
    }
}
