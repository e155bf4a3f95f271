//! Visit paths: a user's visits joined to place coordinates and drawn in
//! the order they happened.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use time::Date;

use crate::dates;
use crate::geo::{round_to, Coordinate};
use crate::place::Place;
use crate::visit::VisitRecord;

/// Colors for period paths, cycled by period index.
const PERIOD_COLORS: [&str; 8] = [
    "rgba(0, 122, 255, 0.8)",
    "rgba(255, 59, 48, 0.8)",
    "rgba(52, 199, 89, 0.8)",
    "rgba(255, 149, 0, 0.8)",
    "rgba(175, 82, 222, 0.8)",
    "rgba(255, 204, 0, 0.8)",
    "rgba(90, 200, 250, 0.8)",
    "rgba(255, 105, 180, 0.8)",
];

/// Point count at which a single path reaches full color.
const FULL_INTENSITY_POINTS: usize = 10;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GroupBy {
    Month,
    Year,
}

impl GroupBy {
    fn key(&self, date: Date) -> String {
        match self {
            GroupBy::Month => format!("{:04}-{:02}", date.year(), u8::from(date.month())),
            GroupBy::Year => format!("{:04}", date.year()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitPathPoint<'a> {
    pub visit_record: &'a VisitRecord,

    pub shrine_temple: &'a Place,

    #[serde(flatten)]
    pub coordinate: Coordinate,

    /// 1-based position along the path.
    pub order: usize,

    #[serde(with = "dates")]
    pub visit_date: Date,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitPath<'a> {
    pub id: String,

    pub points: Vec<VisitPathPoint<'a>>,

    pub color: String,

    /// Kilometres along the path, to one decimal.
    pub total_distance: f64,

    pub time_span: String,
}

/// A visit whose place could be located.
struct Located<'a> {
    record: &'a VisitRecord,
    place: &'a Place,
    coordinate: Coordinate,
}

/// Builds visit paths from `visit_records`.
///
/// Records whose place is not in `places` or has no usable coordinate
/// are left out. Without grouping the result is at most one path; with
/// grouping there is one path per month or year, ordered
/// chronologically. Any group with fewer than two points is dropped.
pub fn build_paths<'a>(
    visit_records: &'a [VisitRecord],
    places: &'a [Place],
    group_by: Option<GroupBy>,
) -> Vec<VisitPath<'a>> {
    let lookup: HashMap<&str, &Place> = places.iter().map(|p| (p.id.as_str(), p)).collect();

    let located: Vec<Located<'a>> = visit_records
        .iter()
        .filter_map(|record| {
            let place = *lookup.get(record.shrine_temple_id.as_str())?;
            let coordinate = place.coordinate()?;

            Some(Located {
                record,
                place,
                coordinate,
            })
        })
        .collect();

    match group_by {
        None => {
            let count = located.len();

            make_path("main_path".to_owned(), located, intensity_color(count))
                .into_iter()
                .collect()
        }
        Some(group_by) => {
            let mut groups: BTreeMap<String, Vec<Located<'a>>> = BTreeMap::new();

            for visit in located {
                groups
                    .entry(group_by.key(visit.record.visit_date))
                    .or_insert_with(Vec::new)
                    .push(visit);
            }

            groups
                .into_iter()
                .enumerate()
                .filter_map(|(index, (period, visits))| {
                    let color = PERIOD_COLORS[index % PERIOD_COLORS.len()].to_owned();

                    make_path(format!("path_{}", period), visits, color)
                })
                .collect()
        }
    }
}

fn make_path<'a>(id: String, mut visits: Vec<Located<'a>>, color: String) -> Option<VisitPath<'a>> {
    if visits.len() < 2 {
        return None;
    }

    // stable, so same-day visits keep their logged order
    visits.sort_by_key(|v| v.record.visit_date);

    let points: Vec<VisitPathPoint<'a>> = visits
        .into_iter()
        .enumerate()
        .map(|(index, v)| VisitPathPoint {
            visit_record: v.record,
            shrine_temple: v.place,
            coordinate: v.coordinate,
            order: index + 1,
            visit_date: v.record.visit_date,
        })
        .collect();

    let total_distance = total_distance(&points);
    let time_span = time_span(&points);

    Some(VisitPath {
        id,
        points,
        color,
        total_distance,
        time_span,
    })
}

fn total_distance(points: &[VisitPathPoint<'_>]) -> f64 {
    let total: f64 = points
        .windows(2)
        .map(|pair| pair[0].coordinate.distance_to(&pair[1].coordinate))
        .sum();

    round_to(total, 1)
}

fn time_span(points: &[VisitPathPoint<'_>]) -> String {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) => span_label((last.visit_date - first.visit_date).whole_days()),
        _ => String::new(),
    }
}

/// Labels a span of days: `same day`, `N days`, `N months` or
/// `Y years M months`, where a month is 30 days rounded up.
pub fn span_label(days: i64) -> String {
    let days = days.max(0);

    if days == 0 {
        "same day".to_owned()
    } else if days < 30 {
        plural(days, "day")
    } else if days < 365 {
        plural(months_ceil(days), "month")
    } else {
        let years = days / 365;
        let months = months_ceil(days % 365);

        format!("{} {}", plural(years, "year"), plural(months, "month"))
    }
}

fn months_ceil(days: i64) -> i64 {
    (days + 29) / 30
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

/// Blue deepens with the number of points, saturating at ten.
fn intensity_color(point_count: usize) -> String {
    let intensity = (point_count as f64 / FULL_INTENSITY_POINTS as f64).min(1.0);
    let blue = (255.0 * intensity).floor() as u8;

    format!("rgba(0, 122, {}, 0.8)", blue)
}

/// Summarizes a path for display:
///
/// ```text
/// 3 places visited (2024-01-01 - 2024-03-01)
/// Total distance: 7km • Span: 2 months
/// ```
pub fn path_description(path: &VisitPath<'_>) -> String {
    let (first, last) = match (path.points.first(), path.points.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return String::new(),
    };

    format!(
        "{} places visited ({} - {})\nTotal distance: {}km • Span: {}",
        path.points.len(),
        dates::format_date(first.visit_date),
        dates::format_date(last.visit_date),
        path.total_distance,
        path.time_span
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::EARTH_RADIUS_KM;
    use crate::place::fixtures::place;
    use crate::place::PlaceType;
    use crate::visit::fixtures::visit;

    /// Degrees spanning `km` along a great circle.
    fn degrees(km: f64) -> f64 {
        (km / EARTH_RADIUS_KM).to_degrees()
    }

    /// Degrees of longitude spanning `km` along the parallel at `lat`.
    fn degrees_east(lat: f64, km: f64) -> f64 {
        let half = (km / (2.0 * EARTH_RADIUS_KM)).sin() / lat.to_radians().cos();

        (2.0 * half.asin()).to_degrees()
    }

    /// 3 km north from `a` to `b`, then 4 km east to `c`.
    fn triangle() -> Vec<Place> {
        let south = 35.0;
        let north = south + degrees(3.0);

        vec![
            place("a", PlaceType::Shrine, Some((south, 139.0))),
            place("b", PlaceType::Temple, Some((north, 139.0))),
            place("c", PlaceType::Shrine, Some((north, 139.0 + degrees_east(north, 4.0)))),
        ]
    }

    #[test]
    fn no_path_from_fewer_than_two_points() {
        let places = triangle();

        assert!(build_paths(&[], &places, None).is_empty());

        let one = vec![visit("v1", "a", "2024-01-01", false)];
        assert!(build_paths(&one, &places, None).is_empty());
    }

    #[test]
    fn follows_visit_order_not_shortest_route() {
        let places = triangle();
        let records = vec![
            visit("v3", "c", "2024-03-01", false),
            visit("v1", "a", "2024-01-01", false),
            visit("v2", "b", "2024-02-01", false),
        ];

        let paths = build_paths(&records, &places, None);
        assert_eq!(paths.len(), 1);

        let path = &paths[0];
        assert_eq!(path.id, "main_path");
        assert_eq!(path.total_distance, 7.0);
        assert_eq!(
            path.points.iter().map(|p| (p.order, p.visit_record.id.as_str())).collect::<Vec<_>>(),
            vec![(1, "v1"), (2, "v2"), (3, "v3")]
        );
        assert_eq!(path.time_span, "2 months");
        assert_eq!(path.color, "rgba(0, 122, 76, 0.8)");
        assert_eq!(
            path_description(path),
            "3 places visited (2024-01-01 - 2024-03-01)\nTotal distance: 7km • Span: 2 months"
        );
    }

    #[test]
    fn revisiting_adds_the_return_leg() {
        let places = triangle();
        let records = vec![
            visit("v1", "a", "2024-01-01", false),
            visit("v2", "b", "2024-01-01", false),
            visit("v3", "a", "2024-01-01", false),
        ];

        let path = &build_paths(&records, &places, None)[0];
        assert_eq!(path.total_distance, 6.0);
        assert_eq!(path.time_span, "same day");
    }

    #[test]
    fn skips_unlocatable_visits() {
        let mut places = triangle();
        places.push(place("nowhere", PlaceType::Temple, None));

        let records = vec![
            visit("v1", "a", "2024-01-01", false),
            visit("v2", "nowhere", "2024-01-02", false),
            visit("v3", "manual-entry", "2024-01-03", false),
            visit("v4", "b", "2024-01-04", false),
        ];

        let paths = build_paths(&records, &places, None);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].points.len(), 2);
        assert_eq!(paths[0].total_distance, 3.0);
        assert_eq!(paths[0].time_span, "3 days");
    }

    #[test]
    fn groups_by_month() {
        let places = triangle();
        let records = vec![
            visit("v1", "a", "2024-01-05", false),
            visit("v2", "b", "2024-01-20", false),
            visit("v3", "c", "2024-02-01", false),
            visit("v4", "a", "2024-03-01", false),
            visit("v5", "c", "2024-03-15", false),
        ];

        let paths = build_paths(&records, &places, Some(GroupBy::Month));

        assert_eq!(
            paths.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
            vec!["path_2024-01", "path_2024-03"]
        );
        // February is dropped but still takes a palette slot
        assert_eq!(paths[0].color, PERIOD_COLORS[0]);
        assert_eq!(paths[1].color, PERIOD_COLORS[2]);
        assert_eq!(paths[1].points[0].order, 1);
        assert_eq!(paths[1].points[1].order, 2);
    }

    #[test]
    fn groups_by_year() {
        let places = triangle();
        let records = vec![
            visit("v1", "a", "2023-12-31", false),
            visit("v2", "b", "2024-01-01", false),
            visit("v3", "c", "2024-12-31", false),
        ];

        let paths = build_paths(&records, &places, Some(GroupBy::Year));

        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].id, "path_2024");
        assert_eq!(paths[0].total_distance, 4.0);
    }

    #[test]
    fn zero_coordinates_are_unlocated() {
        let mut places = triangle();
        places.push(place("unset", PlaceType::Shrine, Some((0.0, 0.0))));

        let records = vec![
            visit("v1", "a", "2024-01-01", false),
            visit("v2", "unset", "2024-01-02", false),
        ];

        assert!(build_paths(&records, &places, None).is_empty());
    }

    #[test]
    fn span_labels() {
        assert_eq!(span_label(0), "same day");
        assert_eq!(span_label(1), "1 day");
        assert_eq!(span_label(29), "29 days");
        assert_eq!(span_label(30), "1 month");
        assert_eq!(span_label(31), "2 months");
        assert_eq!(span_label(364), "13 months");
        assert_eq!(span_label(365), "1 year 0 months");
        assert_eq!(span_label(400), "1 year 2 months");
        assert_eq!(span_label(800), "2 years 3 months");
    }

    #[test]
    fn intensity_saturates() {
        assert_eq!(intensity_color(2), "rgba(0, 122, 51, 0.8)");
        assert_eq!(intensity_color(10), "rgba(0, 122, 255, 0.8)");
        assert_eq!(intensity_color(25), "rgba(0, 122, 255, 0.8)");
    }
}
