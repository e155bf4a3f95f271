//! Field and radius search over the place catalog.

use std::collections::HashMap;
use std::str::FromStr;

use lazy_static::lazy_static;

use crate::errors::BackendError;
use crate::geo::Coordinate;
use crate::nearby::{find_nearby, Nearby};
use crate::normalization::{fold, normalize_term};
use crate::place::{Place, PlaceType};

/// Prefectures as (native name, native name with suffix, romanized name).
const PREFECTURES: [(&str, &str, &str); 47] = [
    ("北海道", "北海道", "Hokkaido"),
    ("青森", "青森県", "Aomori"),
    ("岩手", "岩手県", "Iwate"),
    ("宮城", "宮城県", "Miyagi"),
    ("秋田", "秋田県", "Akita"),
    ("山形", "山形県", "Yamagata"),
    ("福島", "福島県", "Fukushima"),
    ("茨城", "茨城県", "Ibaraki"),
    ("栃木", "栃木県", "Tochigi"),
    ("群馬", "群馬県", "Gunma"),
    ("埼玉", "埼玉県", "Saitama"),
    ("千葉", "千葉県", "Chiba"),
    ("東京", "東京都", "Tokyo"),
    ("神奈川", "神奈川県", "Kanagawa"),
    ("新潟", "新潟県", "Niigata"),
    ("富山", "富山県", "Toyama"),
    ("石川", "石川県", "Ishikawa"),
    ("福井", "福井県", "Fukui"),
    ("山梨", "山梨県", "Yamanashi"),
    ("長野", "長野県", "Nagano"),
    ("岐阜", "岐阜県", "Gifu"),
    ("静岡", "静岡県", "Shizuoka"),
    ("愛知", "愛知県", "Aichi"),
    ("三重", "三重県", "Mie"),
    ("滋賀", "滋賀県", "Shiga"),
    ("京都", "京都府", "Kyoto"),
    ("大阪", "大阪府", "Osaka"),
    ("兵庫", "兵庫県", "Hyogo"),
    ("奈良", "奈良県", "Nara"),
    ("和歌山", "和歌山県", "Wakayama"),
    ("鳥取", "鳥取県", "Tottori"),
    ("島根", "島根県", "Shimane"),
    ("岡山", "岡山県", "Okayama"),
    ("広島", "広島県", "Hiroshima"),
    ("山口", "山口県", "Yamaguchi"),
    ("徳島", "徳島県", "Tokushima"),
    ("香川", "香川県", "Kagawa"),
    ("愛媛", "愛媛県", "Ehime"),
    ("高知", "高知県", "Kochi"),
    ("福岡", "福岡県", "Fukuoka"),
    ("佐賀", "佐賀県", "Saga"),
    ("長崎", "長崎県", "Nagasaki"),
    ("熊本", "熊本県", "Kumamoto"),
    ("大分", "大分県", "Oita"),
    ("宮崎", "宮崎県", "Miyazaki"),
    ("鹿児島", "鹿児島県", "Kagoshima"),
    ("沖縄", "沖縄県", "Okinawa"),
];

lazy_static! {
    /// Maps every spelling in `PREFECTURES` (romanized names lowercased)
    /// to the name in the other script.
    static ref PREFECTURE_NAMES: HashMap<String, &'static str> = {
        let mut names = HashMap::new();

        for &(native, suffixed, romanized) in PREFECTURES.iter() {
            names.insert(native.to_owned(), romanized);
            names.insert(suffixed.to_owned(), romanized);
            names.insert(romanized.to_lowercase(), native);
        }

        names
    };
}

/// Expands a prefecture search term into the spellings to match: the
/// term itself plus its counterpart in the other script, if known.
pub fn prefecture_terms(term: &str) -> Vec<String> {
    let term = normalize_term(term);

    match PREFECTURE_NAMES.get(&term.to_lowercase()) {
        Some(other) => vec![term, (*other).to_owned()],
        None => vec![term],
    }
}

/// The `type` filter.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TypeFilter {
    All,
    Only(PlaceType),
}

impl Default for TypeFilter {
    fn default() -> Self {
        TypeFilter::All
    }
}

impl FromStr for TypeFilter {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "all" => Ok(TypeFilter::All),
            other => other
                .parse()
                .map(TypeFilter::Only)
                .map_err(|_| BackendError::InvalidTypeFilter(s.to_owned())),
        }
    }
}

/// Field filters, combined with AND. `None` means unconstrained.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchFilters {
    pub prefecture: Option<String>,
    pub city: Option<String>,
    pub place_type: TypeFilter,
    pub has_goshuin: Option<bool>,
}

impl SearchFilters {
    pub fn matches(&self, place: &Place) -> bool {
        self.matches_prefecture(place)
            && self.matches_city(place)
            && self.matches_type(place)
            && self.has_goshuin.map_or(true, |wanted| place.has_goshuin == wanted)
    }

    fn matches_prefecture(&self, place: &Place) -> bool {
        let filter = match non_blank(&self.prefecture) {
            Some(filter) => filter,
            None => return true,
        };

        let actual = fold(&place.prefecture);

        if actual.is_empty() {
            return false;
        }

        prefecture_terms(filter).iter().map(fold).any(|term| {
            actual.contains(term.as_str()) || term.contains(actual.as_str())
        })
    }

    fn matches_city(&self, place: &Place) -> bool {
        let filter = match non_blank(&self.city) {
            Some(filter) => filter,
            None => return true,
        };

        let actual = fold(&place.city);

        !actual.is_empty() && actual.contains(fold(filter).as_str())
    }

    fn matches_type(&self, place: &Place) -> bool {
        match self.place_type {
            TypeFilter::All => true,
            TypeFilter::Only(wanted) => place.place_type == wanted,
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// A search request: field filters or a radius around a point, never
/// both.
#[derive(Clone, Debug, PartialEq)]
pub enum SearchRequest {
    Fields(SearchFilters),
    Nearby { center: Coordinate, radius_km: f64 },
}

/// The result of a search; nearby results carry distances.
#[derive(Clone, Debug, PartialEq)]
pub enum SearchResults {
    Places(Vec<Place>),
    Nearby(Nearby),
}

impl SearchResults {
    pub fn len(&self) -> usize {
        match self {
            SearchResults::Places(places) => places.len(),
            SearchResults::Nearby(nearby) => nearby.places.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Places matching `filters`, in catalog order.
pub fn search(places: &[Place], filters: &SearchFilters) -> Vec<Place> {
    places
        .iter()
        .filter(|p| filters.matches(p))
        .cloned()
        .collect()
}

/// Runs `request` against the full catalog.
pub fn run(places: &[Place], request: &SearchRequest) -> SearchResults {
    match request {
        SearchRequest::Fields(filters) => SearchResults::Places(search(places, filters)),
        SearchRequest::Nearby { center, radius_km } => {
            SearchResults::Nearby(find_nearby(places, *center, *radius_km))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::place::fixtures::place;

    fn catalog() -> Vec<Place> {
        let mut meiji = place("tokyo-meiji-jingu", PlaceType::Shrine, Some((35.6762, 139.6993)));
        meiji.prefecture = "Tokyo".to_owned();
        meiji.city = "Shibuya".to_owned();

        let mut sensoji = place("tokyo-senso-ji", PlaceType::Temple, Some((35.7148, 139.7967)));
        sensoji.prefecture = "東京都".to_owned();
        sensoji.city = "台東区".to_owned();

        let mut hachimangu = place("kanagawa-tsurugaoka", PlaceType::Shrine, Some((35.3259, 139.5564)));
        hachimangu.prefecture = "Kanagawa".to_owned();
        hachimangu.city = "Kamakura".to_owned();
        hachimangu.has_goshuin = false;

        let mut blank = place("blank", PlaceType::Temple, None);
        blank.prefecture = String::new();
        blank.city = String::new();

        vec![meiji, sensoji, hachimangu, blank]
    }

    fn ids(places: &[Place]) -> Vec<&str> {
        places.iter().map(|p| p.id.as_str()).collect()
    }

    fn by_prefecture(term: &str) -> SearchFilters {
        SearchFilters {
            prefecture: Some(term.to_owned()),
            ..SearchFilters::default()
        }
    }

    #[test]
    fn no_filters_returns_everything() {
        assert_eq!(search(&catalog(), &SearchFilters::default()).len(), 4);
    }

    #[test]
    fn prefecture_matches_across_scripts() {
        let places = catalog();

        assert_eq!(ids(&search(&places, &by_prefecture("東京"))), vec!["tokyo-meiji-jingu", "tokyo-senso-ji"]);
        assert_eq!(ids(&search(&places, &by_prefecture("東京都"))), vec!["tokyo-meiji-jingu", "tokyo-senso-ji"]);
        assert_eq!(ids(&search(&places, &by_prefecture("tokyo"))), vec!["tokyo-meiji-jingu", "tokyo-senso-ji"]);
        assert_eq!(ids(&search(&places, &by_prefecture("ＴＯＫＹＯ"))), vec!["tokyo-meiji-jingu", "tokyo-senso-ji"]);
    }

    #[test]
    fn prefecture_falls_back_to_substrings() {
        let places = catalog();

        assert_eq!(ids(&search(&places, &by_prefecture("kana"))), vec!["kanagawa-tsurugaoka"]);
        assert_eq!(ids(&search(&places, &by_prefecture("Kanagawa Prefecture"))), vec!["kanagawa-tsurugaoka"]);
        assert!(search(&places, &by_prefecture("Hokkaido")).is_empty());
    }

    #[test]
    fn prefecture_terms_expand() {
        assert_eq!(prefecture_terms("京都府"), vec!["京都府", "Kyoto"]);
        assert_eq!(prefecture_terms(" kyoto "), vec!["kyoto", "京都"]);
        assert_eq!(prefecture_terms("Kansai"), vec!["Kansai"]);
    }

    #[test]
    fn city_is_case_insensitive_containment() {
        let filters = SearchFilters {
            city: Some("KAMA".to_owned()),
            ..SearchFilters::default()
        };

        assert_eq!(ids(&search(&catalog(), &filters)), vec!["kanagawa-tsurugaoka"]);
    }

    #[test]
    fn blank_filters_are_ignored() {
        let filters = SearchFilters {
            prefecture: Some("  ".to_owned()),
            city: Some(String::new()),
            ..SearchFilters::default()
        };

        assert_eq!(search(&catalog(), &filters).len(), 4);
    }

    #[test]
    fn type_and_goshuin_compose() {
        let filters = SearchFilters {
            place_type: TypeFilter::Only(PlaceType::Shrine),
            has_goshuin: Some(true),
            ..SearchFilters::default()
        };

        assert_eq!(ids(&search(&catalog(), &filters)), vec!["tokyo-meiji-jingu"]);

        let filters = SearchFilters {
            has_goshuin: Some(false),
            ..SearchFilters::default()
        };

        assert_eq!(ids(&search(&catalog(), &filters)), vec!["kanagawa-tsurugaoka"]);
    }

    #[test]
    fn type_filter_parsing() {
        assert_eq!("all".parse::<TypeFilter>().unwrap(), TypeFilter::All);
        assert_eq!("temple".parse::<TypeFilter>().unwrap(), TypeFilter::Only(PlaceType::Temple));
        assert!("church".parse::<TypeFilter>().is_err());
    }

    #[test]
    fn nearby_requests_ignore_fields() {
        let request = SearchRequest::Nearby {
            center: Coordinate::new(35.6812, 139.7671),
            radius_km: 10.0,
        };

        match run(&catalog(), &request) {
            SearchResults::Nearby(nearby) => {
                let found = nearby.places;
                assert_eq!(found.len(), 2);
                assert_eq!(found[0].place.id, "tokyo-senso-ji");
            }
            other => panic!("expected nearby results, got {:?}", other),
        }
    }
}
