use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::geo::round_to;
use crate::place::{Place, PlaceType};
use crate::status::FavoriteMode;
use crate::visit::{FavoriteItem, VisitRecord};

/// Collection-wide visit summary.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitStatistics {
    pub total_shrines: usize,
    pub visited_shrines: usize,
    pub goshuin_collected: usize,
    pub favorite_count: usize,
    /// Whole percent of `total_shrines` visited.
    pub visit_rate: u32,
}

/// Summarizes visits across `places`.
///
/// Visited and goshuin counts are distinct place IDs among all records,
/// including records for places outside `places`.
pub fn aggregate(
    places: &[Place],
    visit_records: &[VisitRecord],
    favorites: &[FavoriteItem],
    mode: FavoriteMode,
) -> VisitStatistics {
    let visited: HashSet<&str> = visit_records
        .iter()
        .map(|r| r.shrine_temple_id.as_str())
        .collect();
    let goshuin: HashSet<&str> = visit_records
        .iter()
        .filter(|r| r.has_goshuin)
        .map(|r| r.shrine_temple_id.as_str())
        .collect();

    let favorite_count = match mode {
        FavoriteMode::Independent => favorites.len(),
        FavoriteMode::Legacy => visit_records
            .iter()
            .filter(|r| r.is_favorite == Some(true))
            .map(|r| r.shrine_temple_id.as_str())
            .collect::<HashSet<_>>()
            .len(),
    };

    let total_shrines = places.len();
    let visited_shrines = visited.len();

    VisitStatistics {
        total_shrines,
        visited_shrines,
        goshuin_collected: goshuin.len(),
        favorite_count,
        visit_rate: visit_rate(visited_shrines, total_shrines),
    }
}

fn visit_rate(visited: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }

    (100.0 * visited as f64 / total as f64).round() as u32
}

/// Per-record totals for a visit log.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSummary {
    pub total_visits: usize,
    pub shrine_visits: usize,
    pub temple_visits: usize,
    pub goshuin_count: usize,
    /// Mean of the ratings given, to one decimal; zero when none are.
    pub average_rating: f64,
}

/// Totals `visit_records`, classifying each visit by the type of its
/// place in `places`. Visits to unknown places are in neither bucket.
pub fn record_summary(visit_records: &[VisitRecord], places: &[Place]) -> RecordSummary {
    let types: HashMap<&str, PlaceType> = places
        .iter()
        .map(|p| (p.id.as_str(), p.place_type))
        .collect();

    let count_type = |wanted: PlaceType| {
        visit_records
            .iter()
            .filter(|r| types.get(r.shrine_temple_id.as_str()) == Some(&wanted))
            .count()
    };

    let ratings: Vec<u8> = visit_records.iter().filter_map(|r| r.rating).collect();
    let average_rating = if ratings.is_empty() {
        0.0
    } else {
        let sum: u32 = ratings.iter().map(|&r| u32::from(r)).sum();
        round_to(f64::from(sum) / ratings.len() as f64, 1)
    };

    RecordSummary {
        total_visits: visit_records.len(),
        shrine_visits: count_type(PlaceType::Shrine),
        temple_visits: count_type(PlaceType::Temple),
        goshuin_count: visit_records.iter().filter(|r| r.has_goshuin).count(),
        average_rating,
    }
}
