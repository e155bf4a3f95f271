use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::dates;
use crate::place::{Place, PlaceType};

/// A single logged visit to a place.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRecord {
    pub id: String,

    /// The visited place. Not enforced: the place may no longer exist,
    /// or may have been entered by hand with a synthetic ID.
    pub shrine_temple_id: String,

    /// The place's name at the time of the visit.
    pub shrine_temple_name: String,

    #[serde(with = "dates")]
    pub visit_date: Date,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// 1 to 5, if given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,

    /// Favorite flag on this particular visit. Superseded by
    /// `FavoriteItem` but still stored and displayed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,

    /// Whether goshuin was obtained on this visit.
    #[serde(default)]
    pub has_goshuin: bool,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl VisitRecord {
    /// Builds a record from user input with fresh timestamps.
    pub fn create(id: String, new: NewVisitRecord) -> Self {
        let now = dates::now();

        VisitRecord {
            id,
            shrine_temple_id: new.shrine_temple_id,
            shrine_temple_name: new.shrine_temple_name,
            visit_date: new.visit_date,
            notes: new.notes,
            rating: new.rating.filter(|r| (1..=5).contains(r)),
            is_favorite: new.is_favorite,
            has_goshuin: new.has_goshuin,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a partial update and bumps `updated_at`.
    pub fn apply(&mut self, update: VisitRecordUpdate) {
        let VisitRecordUpdate {
            shrine_temple_name,
            visit_date,
            notes,
            rating,
            is_favorite,
            has_goshuin,
        } = update;

        if let Some(name) = shrine_temple_name {
            self.shrine_temple_name = name;
        }
        if let Some(date) = visit_date {
            self.visit_date = date;
        }
        if let Some(notes) = notes {
            self.notes = Some(notes);
        }
        if let Some(rating) = rating {
            self.rating = rating.filter(|r| (1..=5).contains(r));
        }
        if let Some(is_favorite) = is_favorite {
            self.is_favorite = Some(is_favorite);
        }
        if let Some(has_goshuin) = has_goshuin {
            self.has_goshuin = has_goshuin;
        }

        self.updated_at = dates::now();
    }
}

/// The user-supplied part of a new visit record.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVisitRecord {
    pub shrine_temple_id: String,

    pub shrine_temple_name: String,

    #[serde(with = "dates")]
    pub visit_date: Date,

    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default)]
    pub rating: Option<u8>,

    #[serde(default)]
    pub is_favorite: Option<bool>,

    #[serde(default)]
    pub has_goshuin: bool,
}

/// A partial update to a visit record. `rating: Some(None)` clears the
/// rating.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRecordUpdate {
    #[serde(default)]
    pub shrine_temple_name: Option<String>,

    #[serde(default, with = "dates::option")]
    pub visit_date: Option<Date>,

    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default, deserialize_with = "deserialize_present")]
    pub rating: Option<Option<u8>>,

    #[serde(default)]
    pub is_favorite: Option<bool>,

    #[serde(default)]
    pub has_goshuin: Option<bool>,
}

/// Distinguishes an explicit `null` from an absent field.
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Membership of a place in the favorites set, independent of visits.
/// Carries a copy of the place fields needed to show it offline.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteItem {
    pub id: String,

    pub shrine_temple_id: String,

    pub shrine_temple_name: String,

    pub prefecture: String,

    pub city: String,

    #[serde(rename = "type")]
    pub place_type: PlaceType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl FavoriteItem {
    pub fn for_place(id: String, place: &Place) -> Self {
        FavoriteItem {
            id,
            shrine_temple_id: place.id.clone(),
            shrine_temple_name: place.name.clone(),
            prefecture: place.prefecture.clone(),
            city: place.city.clone(),
            place_type: place.place_type,
            address: place.address.clone(),
            lat: place.lat,
            lng: place.lng,
            created_at: dates::now(),
        }
    }
}
