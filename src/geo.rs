use serde::{Deserialize, Serialize};

/// Mean radius of the Earth in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the Earth in signed decimal degrees.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both components are finite numbers.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        distance_km(self.lat, self.lng, other.lat, other.lng)
    }
}

/// Great-circle distance in kilometres between two points, using the
/// Haversine formula. NaN inputs propagate to the result.
///
/// ```
/// use goshuin::geo::distance_km;
/// assert_eq!(distance_km(35.0, 139.0, 35.0, 139.0), 0.0);
/// ```
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Rounds to the given number of decimal places, halves away from zero.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
