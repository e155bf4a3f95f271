use std::cmp::Ordering;

use serde::Serialize;

use crate::geo::{round_to, Coordinate};
use crate::place::Place;

/// Radius used by the server when a nearby request gives none.
pub const DEFAULT_SERVER_RADIUS_KM: f64 = 5.0;

/// Radius used by the client's "near me" search.
pub const DEFAULT_CLIENT_RADIUS_KM: f64 = 10.0;

/// A place annotated with its distance from the search center.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NearbyPlace {
    #[serde(flatten)]
    pub place: Place,

    /// Kilometres, to two decimals.
    pub distance: f64,
}

/// A candidate left out of a nearby search because it cannot be located.
#[derive(Clone, Debug, PartialEq)]
pub struct Skipped {
    pub id: String,
    pub name: String,
}

/// The outcome of a nearby search.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Nearby {
    /// Places within the radius, closest first.
    pub places: Vec<NearbyPlace>,

    /// Candidates without usable coordinates.
    pub skipped: Vec<Skipped>,
}

/// Finds the candidates within `radius_km` of `center`, inclusive.
///
/// Candidates without a usable coordinate are reported in `skipped`
/// rather than failing the search. Ties in distance keep input order.
pub fn find_nearby<'a, I>(candidates: I, center: Coordinate, radius_km: f64) -> Nearby
where
    I: IntoIterator<Item = &'a Place>,
{
    let mut nearby = Nearby::default();

    for place in candidates {
        let coordinate = match place.coordinate() {
            Some(coordinate) => coordinate,
            None => {
                nearby.skipped.push(Skipped {
                    id: place.id.clone(),
                    name: place.name.clone(),
                });
                continue;
            }
        };

        let distance = center.distance_to(&coordinate);

        if distance <= radius_km {
            nearby.places.push(NearbyPlace {
                place: place.clone(),
                distance: round_to(distance, 2),
            });
        }
    }

    nearby
        .places
        .sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));

    nearby
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::place::fixtures::place;
    use crate::place::PlaceType;

    const TOKYO_STATION: Coordinate = Coordinate {
        lat: 35.6812,
        lng: 139.7671,
    };

    #[test]
    fn meiji_jingu_from_tokyo_station() {
        let places = vec![place("meiji", PlaceType::Shrine, Some((35.6762, 139.6993)))];

        assert!(find_nearby(&places, TOKYO_STATION, 5.0).places.is_empty());

        let found = find_nearby(&places, TOKYO_STATION, 10.0).places;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].distance, 6.15);
    }

    #[test]
    fn far_western_point() {
        // about 10.56 km away
        let places = vec![place("west", PlaceType::Shrine, Some((35.6762, 139.6503)))];

        assert!(find_nearby(&places, TOKYO_STATION, 5.0).places.is_empty());
        assert!(find_nearby(&places, TOKYO_STATION, 10.0).places.is_empty());
        assert_eq!(find_nearby(&places, TOKYO_STATION, 11.0).places[0].distance, 10.56);
    }

    #[test]
    fn boundary_is_inclusive() {
        let places = vec![place("here", PlaceType::Temple, Some((35.6812, 139.7671)))];

        assert_eq!(find_nearby(&places, TOKYO_STATION, 0.0).places.len(), 1);
    }

    #[test]
    fn skips_places_without_coordinates() {
        let mut half = place("half", PlaceType::Temple, Some((35.68, 139.76)));
        half.lng = None;
        let mut nan = place("nan", PlaceType::Temple, Some((35.68, 139.76)));
        nan.lat = Some(f64::NAN);
        let places = vec![
            place("none", PlaceType::Shrine, None),
            half,
            nan,
            place("ok", PlaceType::Shrine, Some((35.68, 139.76))),
        ];

        let nearby = find_nearby(&places, TOKYO_STATION, 5.0);

        assert_eq!(nearby.places.len(), 1);
        assert_eq!(nearby.places[0].place.id, "ok");
        assert_eq!(
            nearby.skipped.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(),
            vec!["none", "half", "nan"]
        );
    }

    #[test]
    fn sorted_closest_first_with_stable_ties() {
        let places = vec![
            place("far", PlaceType::Shrine, Some((35.70, 139.7671))),
            place("tie1", PlaceType::Shrine, Some((35.69, 139.7671))),
            place("near", PlaceType::Shrine, Some((35.6813, 139.7671))),
            place("tie2", PlaceType::Temple, Some((35.69, 139.7671))),
        ];

        let ids: Vec<_> = find_nearby(&places, TOKYO_STATION, 5.0)
            .places
            .into_iter()
            .map(|p| p.place.id)
            .collect();

        assert_eq!(ids, vec!["near", "tie1", "tie2", "far"]);
    }

    #[test]
    fn serializes_flat_with_distance() {
        let places = vec![place("meiji", PlaceType::Shrine, Some((35.6762, 139.6993)))];
        let found = find_nearby(&places, TOKYO_STATION, 10.0).places;
        let value = serde_json::to_value(&found[0]).unwrap();

        assert_eq!(value["id"], "meiji");
        assert_eq!(value["distance"], 6.15);
    }

    proptest! {
        #[test]
        fn results_respect_radius_and_order(
            coordinates in proptest::collection::vec((35.0f64..36.5, 139.0f64..140.5), 0..30),
            radius in 0.0f64..100.0,
        ) {
            let places: Vec<Place> = coordinates
                .iter()
                .enumerate()
                .map(|(i, c)| place(&format!("p{}", i), PlaceType::Shrine, Some(*c)))
                .collect();

            let found = find_nearby(&places, TOKYO_STATION, radius).places;

            for p in &found {
                let coordinate = p.place.coordinate();
                prop_assert!(coordinate.is_some());
                prop_assert!(TOKYO_STATION.distance_to(&coordinate.unwrap()) <= radius);
            }

            for pair in found.windows(2) {
                prop_assert!(pair[0].distance <= pair[1].distance);
            }
        }
    }
}
