//! Per-place visit status, derived on every read from the place, the
//! visit records and the favorites set.

use serde::Serialize;
use time::Date;

use crate::dates;
use crate::place::{Place, PlaceType};
use crate::visit::{FavoriteItem, VisitRecord};

/// Which notion of "favorite" a view should use.
///
/// Favorites used to be a flag on the latest visit record; they are now
/// a separate set. Both are still stored.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FavoriteMode {
    /// Membership in the `FavoriteItem` set.
    Independent,

    /// The `isFavorite` flag on the latest visit record.
    Legacy,
}

impl Default for FavoriteMode {
    fn default() -> Self {
        FavoriteMode::Independent
    }
}

/// A snapshot of one place's visit state.
///
/// `is_favorite` and `is_favorite_independent` may disagree; neither
/// overrides the other.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitStatus<'a> {
    pub is_visited: bool,

    /// True once any visit recorded goshuin.
    pub has_goshuin: bool,

    /// The legacy flag from the latest visit record.
    pub is_favorite: bool,

    pub is_favorite_independent: bool,

    pub visit_count: usize,

    #[serde(with = "dates::option", skip_serializing_if = "Option::is_none")]
    pub last_visit_date: Option<Date>,

    #[serde(rename = "visitRecord", skip_serializing_if = "Option::is_none")]
    pub latest: Option<&'a VisitRecord>,
}

impl<'a> VisitStatus<'a> {
    pub fn is_favorite_in(&self, mode: FavoriteMode) -> bool {
        match mode {
            FavoriteMode::Independent => self.is_favorite_independent,
            FavoriteMode::Legacy => self.is_favorite,
        }
    }
}

/// Computes the visit status of `place`.
pub fn compute_status<'a>(
    place: &Place,
    visit_records: &'a [VisitRecord],
    favorites: &[FavoriteItem],
) -> VisitStatus<'a> {
    status_for_id(&place.id, visit_records, favorites)
}

/// Computes the visit status of the place with ID `place_id`, which
/// need not be in any catalog.
pub fn status_for_id<'a>(
    place_id: &str,
    visit_records: &'a [VisitRecord],
    favorites: &[FavoriteItem],
) -> VisitStatus<'a> {
    let mut records: Vec<&VisitRecord> = visit_records
        .iter()
        .filter(|r| r.shrine_temple_id == place_id)
        .collect();

    let is_favorite_independent = favorites.iter().any(|f| f.shrine_temple_id == place_id);

    // newest first; equal dates keep their input order
    records.sort_by(|a, b| b.visit_date.cmp(&a.visit_date));

    let latest = match records.first() {
        Some(latest) => *latest,
        None => {
            return VisitStatus {
                is_visited: false,
                has_goshuin: false,
                is_favorite: false,
                is_favorite_independent,
                visit_count: 0,
                last_visit_date: None,
                latest: None,
            }
        }
    };

    VisitStatus {
        is_visited: true,
        has_goshuin: records.iter().any(|r| r.has_goshuin),
        is_favorite: latest.is_favorite.unwrap_or(false),
        is_favorite_independent,
        visit_count: records.len(),
        last_visit_date: Some(latest.visit_date),
        latest: Some(latest),
    }
}

/// The color channel of a map marker.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MarkerColor {
    Shrine,
    Temple,
    Favorite,
    Goshuin,
    Visited,
}

impl MarkerColor {
    pub fn hex(&self) -> &'static str {
        match self {
            MarkerColor::Shrine => "#FF6B6B",
            MarkerColor::Temple => "#4ECDC4",
            MarkerColor::Favorite => "#FF69B4",
            MarkerColor::Goshuin => "#FFD700",
            MarkerColor::Visited => "#666666",
        }
    }
}

/// Picks the marker color for a place.
///
/// With independent favorites, favorite only colors unvisited places;
/// once visited, goshuin beats plain visited and favorite shows as a
/// badge instead. The legacy scheme ranks goshuin, then the visit's
/// favorite flag, then plain visited, and ignores favorites on
/// unvisited places.
pub fn marker_color(place_type: PlaceType, status: &VisitStatus<'_>, mode: FavoriteMode) -> MarkerColor {
    let type_default = match place_type {
        PlaceType::Shrine => MarkerColor::Shrine,
        PlaceType::Temple => MarkerColor::Temple,
    };

    match mode {
        FavoriteMode::Independent => {
            if !status.is_visited {
                if status.is_favorite_independent {
                    MarkerColor::Favorite
                } else {
                    type_default
                }
            } else if status.has_goshuin {
                MarkerColor::Goshuin
            } else {
                MarkerColor::Visited
            }
        }
        FavoriteMode::Legacy => {
            if !status.is_visited {
                type_default
            } else if status.has_goshuin {
                MarkerColor::Goshuin
            } else if status.is_favorite {
                MarkerColor::Favorite
            } else {
                MarkerColor::Visited
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VisitedBadge {
    GoshuinMedal,
    Checkmark,
}

impl VisitedBadge {
    pub fn symbol(&self) -> &'static str {
        match self {
            VisitedBadge::GoshuinMedal => "🏅",
            VisitedBadge::Checkmark => "✅",
        }
    }
}

/// Overlay badges for a marker. The channels are independent: a place
/// can carry a favorite badge and a visited badge at once.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StatusBadges {
    pub favorite: bool,
    pub visited: Option<VisitedBadge>,
    /// Shown only for repeat visits.
    pub visit_count: Option<usize>,
}

pub fn status_badges(status: &VisitStatus<'_>, mode: FavoriteMode) -> StatusBadges {
    let visited = if !status.is_visited {
        None
    } else if status.has_goshuin {
        Some(VisitedBadge::GoshuinMedal)
    } else {
        Some(VisitedBadge::Checkmark)
    };

    StatusBadges {
        favorite: status.is_favorite_in(mode),
        visited,
        visit_count: Some(status.visit_count).filter(|&c| c > 1),
    }
}

/// The icon drawn inside a marker, by place type.
pub fn marker_icon(place_type: PlaceType) -> &'static str {
    match place_type {
        PlaceType::Shrine => "⛩️",
        PlaceType::Temple => "🏯",
    }
}

/// Describes a place's status for a callout:
///
/// ```text
/// Meiji Jingu
/// Tokyo Shibuya
/// Favorite
/// 2 visits • Goshuin collected • Last visit: 2024-06-01
/// ```
pub fn status_description(place: &Place, status: &VisitStatus<'_>, mode: FavoriteMode) -> String {
    let mut lines = vec![
        place.name.clone(),
        format!("{} {}", place.prefecture, place.city),
    ];

    if status.is_favorite_in(mode) {
        lines.push("Favorite".to_owned());
    }

    if !status.is_visited {
        lines.push("Not visited".to_owned());
        return lines.join("\n");
    }

    let mut parts = vec![if status.visit_count > 1 {
        format!("{} visits", status.visit_count)
    } else {
        "Visited".to_owned()
    }];

    if status.has_goshuin {
        parts.push("Goshuin collected".to_owned());
    }

    if let Some(date) = status.last_visit_date {
        parts.push(format!("Last visit: {}", dates::format_date(date)));
    }

    lines.push(parts.join(" • "));
    lines.join("\n")
}
