//! Country gazetteer and continent lookup table.
//!
//! The built-in dataset covers the destinations the recommendation engine
//! scores. Each country carries nine 0-10 ratings and a coarse climate class.
//! A JSON file with the same shape can replace the built-in set at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

// ─── Place model ────────────────────────────────────────────────

/// A country with coordinates and traveller-facing ratings.
///
/// `cost_of_living` is inverted: higher means more affordable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    /// ISO 3166-1 alpha-2 code.
    pub code: String,
    pub lat: f64,
    pub lng: f64,
    pub climate: String,
    pub safety_index: f64,
    pub beach_score: f64,
    pub nightlife_score: f64,
    pub cost_of_living: f64,
    pub sightseeing_score: f64,
    pub cultural_score: f64,
    pub adventure_score: f64,
    pub food_score: f64,
    pub infrastructure_score: f64,
}

impl Place {
    /// Rating fields by name, in a fixed order. Drives the scoring engine
    /// and keeps field names aligned with the JSON shape.
    pub fn score_fields(&self) -> [(&'static str, f64); 9] {
        [
            ("safety_index", self.safety_index),
            ("beach_score", self.beach_score),
            ("nightlife_score", self.nightlife_score),
            ("cost_of_living", self.cost_of_living),
            ("sightseeing_score", self.sightseeing_score),
            ("cultural_score", self.cultural_score),
            ("adventure_score", self.adventure_score),
            ("food_score", self.food_score),
            ("infrastructure_score", self.infrastructure_score),
        ]
    }

    pub fn score_field(&self, name: &str) -> Option<f64> {
        self.score_fields()
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| *value)
    }
}

// ─── Continent / region table ───────────────────────────────────

/// A continent-scale region: camera target only, never a tab.
#[derive(Debug, Clone, Serialize)]
pub struct ContinentRegion {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
    /// Camera altitude in globe radii.
    pub altitude: f64,
}

// Multi-word names come first so the containment pass prefers the more
// specific region ("southeast asia" before "asia").
const CONTINENT_REGIONS: &[ContinentRegion] = &[
    ContinentRegion { name: "north america", lat: 48.0, lng: -100.0, altitude: 2.2 },
    ContinentRegion { name: "south america", lat: -14.0, lng: -60.0, altitude: 2.1 },
    ContinentRegion { name: "central america", lat: 12.8, lng: -85.0, altitude: 1.4 },
    ContinentRegion { name: "southeast asia", lat: 12.0, lng: 105.0, altitude: 1.8 },
    ContinentRegion { name: "middle east", lat: 29.0, lng: 45.0, altitude: 1.6 },
    ContinentRegion { name: "africa", lat: 1.6, lng: 17.3, altitude: 2.4 },
    ContinentRegion { name: "asia", lat: 34.0, lng: 100.0, altitude: 2.6 },
    ContinentRegion { name: "europe", lat: 54.0, lng: 15.0, altitude: 1.8 },
    ContinentRegion { name: "oceania", lat: -22.0, lng: 140.0, altitude: 2.4 },
    ContinentRegion { name: "antarctica", lat: -82.0, lng: 0.0, altitude: 2.4 },
    ContinentRegion { name: "caribbean", lat: 18.0, lng: -73.0, altitude: 1.5 },
    ContinentRegion { name: "scandinavia", lat: 62.0, lng: 15.0, altitude: 1.6 },
];

/// Look up a continent-scale region: exact name first, then containment.
pub fn find_region(query: &str) -> Option<&'static ContinentRegion> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return None;
    }
    if let Some(region) = CONTINENT_REGIONS.iter().find(|r| r.name == q) {
        return Some(region);
    }
    CONTINENT_REGIONS.iter().find(|r| q.contains(r.name))
}

// ─── Built-in dataset ───────────────────────────────────────────

struct BuiltinCountry {
    name: &'static str,
    code: &'static str,
    lat: f64,
    lng: f64,
    climate: &'static str,
    // safety, beach, nightlife, cost, sightseeing, cultural, adventure, food, infra
    scores: [f64; 9],
}

const BUILTIN_COUNTRIES: &[BuiltinCountry] = &[
    BuiltinCountry { name: "France", code: "FR", lat: 46.2276, lng: 2.2137, climate: "temperate",
        scores: [8.2, 6.5, 8.0, 4.5, 9.5, 9.6, 7.0, 9.8, 9.2] },
    BuiltinCountry { name: "French Polynesia", code: "PF", lat: -17.6797, lng: -149.4068, climate: "tropical",
        scores: [8.8, 9.9, 5.5, 2.0, 7.5, 6.8, 8.5, 7.2, 6.0] },
    BuiltinCountry { name: "Japan", code: "JP", lat: 36.2048, lng: 138.2529, climate: "temperate",
        scores: [9.6, 6.0, 8.5, 4.0, 9.4, 9.7, 7.8, 9.7, 9.8] },
    BuiltinCountry { name: "Thailand", code: "TH", lat: 15.8700, lng: 100.9925, climate: "tropical",
        scores: [7.0, 9.3, 9.0, 8.8, 8.6, 8.8, 8.4, 9.5, 6.8] },
    BuiltinCountry { name: "Italy", code: "IT", lat: 41.8719, lng: 12.5674, climate: "temperate",
        scores: [7.8, 7.8, 7.8, 5.0, 9.8, 9.9, 7.2, 9.9, 7.8] },
    BuiltinCountry { name: "Spain", code: "ES", lat: 40.4637, lng: -3.7492, climate: "temperate",
        scores: [8.3, 8.8, 9.2, 6.0, 9.0, 9.2, 7.5, 9.3, 8.6] },
    BuiltinCountry { name: "Portugal", code: "PT", lat: 39.3999, lng: -8.2245, climate: "temperate",
        scores: [8.9, 8.6, 8.0, 6.8, 8.5, 8.6, 7.4, 8.8, 8.0] },
    BuiltinCountry { name: "Greece", code: "GR", lat: 39.0742, lng: 21.8243, climate: "temperate",
        scores: [8.0, 9.2, 8.2, 6.2, 9.3, 9.5, 7.3, 9.2, 7.0] },
    BuiltinCountry { name: "Germany", code: "DE", lat: 51.1657, lng: 10.4515, climate: "temperate",
        scores: [8.8, 4.0, 8.8, 5.5, 8.4, 8.8, 6.8, 7.8, 9.5] },
    BuiltinCountry { name: "United Kingdom", code: "GB", lat: 55.3781, lng: -3.4360, climate: "temperate",
        scores: [8.4, 5.0, 8.6, 3.8, 9.0, 9.3, 6.6, 7.6, 9.0] },
    BuiltinCountry { name: "Ireland", code: "IE", lat: 53.4129, lng: -8.2439, climate: "temperate",
        scores: [9.0, 5.5, 8.2, 4.2, 8.2, 8.8, 7.0, 7.8, 8.2] },
    BuiltinCountry { name: "Iceland", code: "IS", lat: 64.9631, lng: -19.0208, climate: "continental",
        scores: [9.8, 3.0, 6.0, 2.5, 9.2, 7.0, 9.8, 7.0, 8.8] },
    BuiltinCountry { name: "Norway", code: "NO", lat: 60.4720, lng: 8.4689, climate: "continental",
        scores: [9.5, 4.5, 6.5, 2.2, 9.0, 7.8, 9.6, 7.4, 9.4] },
    BuiltinCountry { name: "Sweden", code: "SE", lat: 60.1282, lng: 18.6435, climate: "continental",
        scores: [9.2, 4.8, 7.5, 3.5, 8.2, 8.2, 8.6, 7.6, 9.4] },
    BuiltinCountry { name: "Denmark", code: "DK", lat: 56.2639, lng: 9.5018, climate: "temperate",
        scores: [9.4, 5.2, 8.0, 3.2, 8.0, 8.4, 6.0, 8.4, 9.6] },
    BuiltinCountry { name: "Finland", code: "FI", lat: 61.9241, lng: 25.7482, climate: "continental",
        scores: [9.5, 4.2, 6.8, 3.4, 7.6, 7.8, 8.8, 7.2, 9.4] },
    BuiltinCountry { name: "Netherlands", code: "NL", lat: 52.1326, lng: 5.2913, climate: "temperate",
        scores: [8.9, 5.8, 8.8, 4.0, 8.6, 8.8, 5.5, 7.8, 9.7] },
    BuiltinCountry { name: "Switzerland", code: "CH", lat: 46.8182, lng: 8.2275, climate: "continental",
        scores: [9.7, 3.5, 7.0, 1.8, 9.4, 8.6, 9.5, 8.4, 9.9] },
    BuiltinCountry { name: "Austria", code: "AT", lat: 47.5162, lng: 14.5501, climate: "continental",
        scores: [9.3, 3.2, 7.4, 4.4, 9.0, 9.2, 8.8, 8.2, 9.5] },
    BuiltinCountry { name: "Czechia", code: "CZ", lat: 49.8175, lng: 15.4730, climate: "continental",
        scores: [8.8, 3.0, 8.6, 6.5, 8.8, 9.0, 6.4, 8.0, 8.6] },
    BuiltinCountry { name: "Poland", code: "PL", lat: 51.9194, lng: 19.1451, climate: "continental",
        scores: [8.6, 4.6, 7.8, 7.2, 8.2, 8.8, 6.8, 8.2, 8.2] },
    BuiltinCountry { name: "Croatia", code: "HR", lat: 45.1000, lng: 15.2000, climate: "temperate",
        scores: [8.7, 9.0, 7.8, 6.4, 8.8, 8.6, 7.8, 8.6, 7.6] },
    BuiltinCountry { name: "Turkey", code: "TR", lat: 38.9637, lng: 35.2433, climate: "temperate",
        scores: [6.8, 8.4, 7.6, 7.8, 9.2, 9.4, 7.6, 9.4, 7.2] },
    BuiltinCountry { name: "Morocco", code: "MA", lat: 31.7917, lng: -7.0926, climate: "arid",
        scores: [6.9, 7.2, 6.0, 8.2, 8.8, 9.0, 8.0, 9.0, 6.2] },
    BuiltinCountry { name: "Egypt", code: "EG", lat: 26.8206, lng: 30.8025, climate: "arid",
        scores: [6.2, 7.8, 5.8, 8.6, 9.7, 9.6, 7.0, 8.2, 5.8] },
    BuiltinCountry { name: "South Africa", code: "ZA", lat: -30.5595, lng: 22.9375, climate: "temperate",
        scores: [5.2, 8.4, 7.6, 7.6, 8.8, 8.0, 9.4, 8.6, 6.6] },
    BuiltinCountry { name: "Kenya", code: "KE", lat: -0.0236, lng: 37.9062, climate: "tropical",
        scores: [5.8, 7.4, 6.4, 7.8, 8.6, 7.6, 9.6, 7.4, 5.6] },
    BuiltinCountry { name: "Tanzania", code: "TZ", lat: -6.3690, lng: 34.8888, climate: "tropical",
        scores: [6.0, 8.8, 5.5, 7.9, 8.8, 7.4, 9.7, 7.2, 5.0] },
    BuiltinCountry { name: "United States", code: "US", lat: 37.0902, lng: -95.7129, climate: "temperate",
        scores: [7.4, 8.0, 9.0, 3.5, 9.6, 8.2, 9.2, 8.8, 8.8] },
    BuiltinCountry { name: "Canada", code: "CA", lat: 56.1304, lng: -106.3468, climate: "continental",
        scores: [9.2, 5.2, 7.6, 3.8, 8.8, 7.8, 9.5, 8.0, 9.2] },
    BuiltinCountry { name: "Mexico", code: "MX", lat: 23.6345, lng: -102.5528, climate: "tropical",
        scores: [5.8, 9.2, 8.8, 8.0, 9.0, 9.2, 8.2, 9.7, 6.8] },
    BuiltinCountry { name: "Brazil", code: "BR", lat: -14.2350, lng: -51.9253, climate: "tropical",
        scores: [5.0, 9.5, 9.4, 7.4, 9.0, 8.6, 9.2, 9.0, 6.4] },
    BuiltinCountry { name: "Argentina", code: "AR", lat: -38.4161, lng: -63.6167, climate: "temperate",
        scores: [7.0, 6.8, 8.8, 7.8, 8.8, 8.8, 9.0, 9.2, 7.0] },
    BuiltinCountry { name: "Peru", code: "PE", lat: -9.1900, lng: -75.0152, climate: "tropical",
        scores: [6.4, 6.6, 7.0, 8.2, 9.6, 9.4, 9.5, 9.6, 5.8] },
    BuiltinCountry { name: "Chile", code: "CL", lat: -35.6751, lng: -71.5430, climate: "temperate",
        scores: [7.8, 7.0, 7.6, 6.8, 9.0, 8.0, 9.6, 8.4, 7.8] },
    BuiltinCountry { name: "Colombia", code: "CO", lat: 4.5709, lng: -74.2973, climate: "tropical",
        scores: [5.6, 8.6, 8.8, 8.4, 8.6, 8.4, 8.8, 8.6, 6.2] },
    BuiltinCountry { name: "Costa Rica", code: "CR", lat: 9.7489, lng: -83.7534, climate: "tropical",
        scores: [7.6, 9.4, 7.2, 6.6, 8.4, 7.2, 9.7, 7.8, 6.8] },
    BuiltinCountry { name: "Cuba", code: "CU", lat: 21.5218, lng: -77.7812, climate: "tropical",
        scores: [7.8, 9.0, 8.0, 8.0, 8.2, 8.8, 6.6, 7.0, 4.8] },
    BuiltinCountry { name: "India", code: "IN", lat: 20.5937, lng: 78.9629, climate: "tropical",
        scores: [6.0, 7.6, 6.8, 9.4, 9.7, 9.8, 8.6, 9.6, 5.4] },
    BuiltinCountry { name: "Nepal", code: "NP", lat: 28.3949, lng: 84.1240, climate: "continental",
        scores: [7.4, 2.0, 5.5, 9.2, 8.8, 9.0, 9.9, 8.0, 4.2] },
    BuiltinCountry { name: "Vietnam", code: "VN", lat: 14.0583, lng: 108.2772, climate: "tropical",
        scores: [7.2, 8.8, 7.8, 9.3, 8.8, 9.0, 8.6, 9.7, 6.2] },
    BuiltinCountry { name: "Indonesia", code: "ID", lat: -0.7893, lng: 113.9213, climate: "tropical",
        scores: [6.6, 9.6, 7.4, 9.0, 9.0, 8.8, 9.3, 9.0, 5.8] },
    BuiltinCountry { name: "Malaysia", code: "MY", lat: 4.2105, lng: 101.9758, climate: "tropical",
        scores: [7.6, 8.8, 7.2, 8.6, 8.4, 8.2, 8.4, 9.4, 7.8] },
    BuiltinCountry { name: "Singapore", code: "SG", lat: 1.3521, lng: 103.8198, climate: "tropical",
        scores: [9.9, 6.2, 8.4, 2.8, 8.8, 8.0, 5.0, 9.6, 10.0] },
    BuiltinCountry { name: "Philippines", code: "PH", lat: 12.8797, lng: 121.7740, climate: "tropical",
        scores: [6.2, 9.8, 7.6, 8.8, 8.2, 7.6, 9.2, 8.4, 5.2] },
    BuiltinCountry { name: "South Korea", code: "KR", lat: 35.9078, lng: 127.7669, climate: "temperate",
        scores: [9.3, 6.4, 9.2, 5.2, 8.8, 9.0, 7.4, 9.5, 9.6] },
    BuiltinCountry { name: "China", code: "CN", lat: 35.8617, lng: 104.1954, climate: "continental",
        scores: [8.2, 6.0, 7.8, 7.0, 9.8, 9.8, 8.8, 9.5, 8.8] },
    BuiltinCountry { name: "Australia", code: "AU", lat: -25.2744, lng: 133.7751, climate: "arid",
        scores: [9.0, 9.7, 8.2, 3.6, 9.0, 7.0, 9.6, 8.4, 9.0] },
    BuiltinCountry { name: "New Zealand", code: "NZ", lat: -40.9006, lng: 174.8860, climate: "temperate",
        scores: [9.6, 8.2, 7.0, 3.9, 9.2, 7.4, 9.9, 8.0, 8.8] },
    BuiltinCountry { name: "Fiji", code: "FJ", lat: -17.7134, lng: 178.0650, climate: "tropical",
        scores: [8.4, 9.8, 5.8, 6.2, 7.4, 6.6, 8.8, 7.0, 5.4] },
    BuiltinCountry { name: "United Arab Emirates", code: "AE", lat: 23.4241, lng: 53.8478, climate: "arid",
        scores: [9.4, 8.2, 8.6, 4.6, 8.8, 7.0, 7.2, 8.8, 9.8] },
    BuiltinCountry { name: "Israel", code: "IL", lat: 31.0461, lng: 34.8516, climate: "arid",
        scores: [7.6, 8.0, 8.8, 3.9, 9.2, 9.7, 7.6, 9.3, 8.6] },
    BuiltinCountry { name: "Jordan", code: "JO", lat: 30.5852, lng: 36.2384, climate: "arid",
        scores: [8.0, 6.8, 5.6, 7.4, 9.5, 9.4, 8.4, 8.6, 6.6] },
    BuiltinCountry { name: "Georgia", code: "GE", lat: 42.3154, lng: 43.3569, climate: "temperate",
        scores: [8.5, 6.0, 7.4, 8.8, 8.8, 9.2, 9.0, 9.4, 6.4] },
];

// ─── Gazetteer ──────────────────────────────────────────────────

/// Gazetteer load failures (JSON override file).
#[derive(Debug)]
pub enum GazetteerError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Empty,
}

impl fmt::Display for GazetteerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Cannot read countries file: {}", e),
            Self::Parse(e) => write!(f, "Invalid countries file: {}", e),
            Self::Empty => write!(f, "Countries file contains no entries"),
        }
    }
}

impl std::error::Error for GazetteerError {}

/// The country dataset with name and code lookups.
///
/// Built once at startup and borrowed everywhere else.
pub struct Gazetteer {
    places: Vec<Place>,
    by_code: HashMap<String, usize>,
}

impl Gazetteer {
    pub fn builtin() -> Self {
        let places = BUILTIN_COUNTRIES
            .iter()
            .map(|c| Place {
                name: c.name.to_string(),
                code: c.code.to_string(),
                lat: c.lat,
                lng: c.lng,
                climate: c.climate.to_string(),
                safety_index: c.scores[0],
                beach_score: c.scores[1],
                nightlife_score: c.scores[2],
                cost_of_living: c.scores[3],
                sightseeing_score: c.scores[4],
                cultural_score: c.scores[5],
                adventure_score: c.scores[6],
                food_score: c.scores[7],
                infrastructure_score: c.scores[8],
            })
            .collect();
        Self::from_places(places)
    }

    pub fn from_places(places: Vec<Place>) -> Self {
        let by_code = places
            .iter()
            .enumerate()
            .map(|(i, p)| (p.code.to_uppercase(), i))
            .collect();
        Self { places, by_code }
    }

    /// Load a replacement dataset from a JSON array of country objects.
    pub fn from_json_file(path: &Path) -> Result<Self, GazetteerError> {
        let raw = std::fs::read_to_string(path).map_err(GazetteerError::Io)?;
        let places: Vec<Place> = serde_json::from_str(&raw).map_err(GazetteerError::Parse)?;
        if places.is_empty() {
            return Err(GazetteerError::Empty);
        }
        Ok(Self::from_places(places))
    }

    pub fn all(&self) -> &[Place] {
        &self.places
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    pub fn by_code(&self, code: &str) -> Option<&Place> {
        self.by_code
            .get(&code.trim().to_uppercase())
            .map(|&i| &self.places[i])
    }

    /// Find a country for a normalized query.
    ///
    /// Passes run strictly in order so an exact name always beats a looser
    /// match: exact name, query-contains-name, then name-starts-with-query
    /// for queries of three or more characters.
    pub fn find(&self, query: &str) -> Option<&Place> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return None;
        }

        // 1. Exact name
        if let Some(p) = self.places.iter().find(|p| p.name.to_lowercase() == q) {
            return Some(p);
        }

        // 2. Query mentions the country ("i'd love to see japan")
        if let Some(p) = self.places.iter().find(|p| q.contains(&p.name.to_lowercase())) {
            return Some(p);
        }

        // 3. Query is a prefix of the name ("portu" -> Portugal). Two-letter
        //    fragments are too ambiguous to guess from.
        if q.len() >= 3 {
            if let Some(p) = self.places.iter().find(|p| p.name.to_lowercase().starts_with(&q)) {
                return Some(p);
            }
        }

        None
    }
}
