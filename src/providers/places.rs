//! Google Places text search (the v1 `places:searchText` endpoint).

use crate::collab::{NearbyPlace, NearbySearch, RemoteError};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const SEARCH_URL: &str = "https://places.googleapis.com/v1/places:searchText";

/// Fields we pay for. Everything else stays out of the response.
const FIELD_MASK: &str = "places.displayName,places.location,places.formattedAddress,\
places.rating,places.userRatingCount,places.priceLevel,places.types,places.photos,\
places.currentOpeningHours.openNow,places.googleMapsUri";

const MAX_RESULTS: u32 = 10;

pub struct GooglePlacesClient {
    api_key: String,
}

impl GooglePlacesClient {
    pub fn new(settings: &crate::config::Settings) -> Self {
        Self { api_key: settings.google_places_api_key.clone() }
    }

    fn photo_url(&self, photo_name: &str) -> String {
        format!(
            "https://places.googleapis.com/v1/{}/media?maxWidthPx=400&key={}",
            photo_name, self.api_key
        )
    }
}

// ─── Response shape ─────────────────────────────────────────────

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    places: Vec<GooglePlace>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GooglePlace {
    display_name: Option<DisplayName>,
    location: Option<LatLng>,
    formatted_address: Option<String>,
    rating: Option<f64>,
    user_rating_count: Option<u32>,
    price_level: Option<String>,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    photos: Vec<Photo>,
    current_opening_hours: Option<OpeningHours>,
    google_maps_uri: Option<String>,
}

#[derive(Deserialize)]
struct DisplayName {
    text: String,
}

#[derive(Deserialize)]
struct LatLng {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct Photo {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpeningHours {
    open_now: Option<bool>,
}

/// Maps the API's enum to the 0 (free) to 4 (very expensive) scale.
fn price_level_rank(level: &str) -> Option<u8> {
    match level {
        "PRICE_LEVEL_FREE" => Some(0),
        "PRICE_LEVEL_INEXPENSIVE" => Some(1),
        "PRICE_LEVEL_MODERATE" => Some(2),
        "PRICE_LEVEL_EXPENSIVE" => Some(3),
        "PRICE_LEVEL_VERY_EXPENSIVE" => Some(4),
        _ => None,
    }
}

/// Keeps the three most specific type tags, human-readable.
fn simplify_types(types: &[String]) -> Vec<String> {
    types
        .iter()
        .filter(|t| *t != "point_of_interest" && *t != "establishment")
        .take(3)
        .map(|t| {
            t.split('_')
                .filter(|w| !w.is_empty())
                .map(|w| {
                    let mut chars = w.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                        None => String::new(),
                    }
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

impl NearbySearch for GooglePlacesClient {
    fn search(
        &self,
        query: &str,
        lat: f64,
        lng: f64,
        radius_m: f64,
    ) -> Result<Vec<NearbyPlace>, RemoteError> {
        if self.api_key.is_empty() {
            return Err(RemoteError::MissingKey("GOOGLE_PLACES_API_KEY"));
        }

        let result = ureq::post(SEARCH_URL)
            .set("Content-Type", "application/json")
            .set("X-Goog-Api-Key", &self.api_key)
            .set("X-Goog-FieldMask", FIELD_MASK)
            .timeout(Duration::from_secs(10))
            .send_json(json!({
                "textQuery": query,
                "maxResultCount": MAX_RESULTS,
                "locationBias": {
                    "circle": {
                        "center": {"latitude": lat, "longitude": lng},
                        "radius": radius_m,
                    },
                },
            }));

        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(status @ (401 | 403), response)) => {
                let body = response.into_string().unwrap_or_default();
                return Err(RemoteError::Unauthorized(format!("HTTP {}: {}", status, body)));
            }
            Err(ureq::Error::Status(status, response)) => {
                return Err(RemoteError::Http {
                    status,
                    body: response.into_string().unwrap_or_default(),
                });
            }
            Err(e) => return Err(RemoteError::Network(e.to_string())),
        };

        let parsed: SearchResponse = response
            .into_json()
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))?;

        let places = parsed
            .places
            .into_iter()
            .filter_map(|place| {
                // a result without a name or position is unusable
                let name = place.display_name?.text;
                let location = place.location?;
                Some(NearbyPlace {
                    name,
                    lat: location.latitude,
                    lng: location.longitude,
                    address: place.formatted_address,
                    rating: place.rating,
                    review_count: place.user_rating_count,
                    price_level: place.price_level.as_deref().and_then(price_level_rank),
                    is_open: place.current_opening_hours.and_then(|h| h.open_now),
                    types: simplify_types(&place.types),
                    photo_url: place.photos.first().map(|p| self.photo_url(&p.name)),
                    maps_url: place.google_maps_uri,
                })
            })
            .collect();

        Ok(places)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_level_rank() {
        assert_eq!(price_level_rank("PRICE_LEVEL_FREE"), Some(0));
        assert_eq!(price_level_rank("PRICE_LEVEL_MODERATE"), Some(2));
        assert_eq!(price_level_rank("PRICE_LEVEL_VERY_EXPENSIVE"), Some(4));
        assert_eq!(price_level_rank("PRICE_LEVEL_UNSPECIFIED"), None);
        assert_eq!(price_level_rank(""), None);
    }

    #[test]
    fn test_simplify_types() {
        let types = vec![
            "tourist_attraction".to_string(),
            "point_of_interest".to_string(),
            "establishment".to_string(),
            "museum".to_string(),
            "art_gallery".to_string(),
            "cafe".to_string(),
        ];
        assert_eq!(
            simplify_types(&types),
            vec!["Tourist Attraction", "Museum", "Art Gallery"]
        );
        assert!(simplify_types(&[]).is_empty());
    }

    #[test]
    fn test_missing_key_fails_before_network() {
        let client = GooglePlacesClient { api_key: String::new() };
        assert!(matches!(
            client.search("cafes", 59.3, 18.1, 1000.0),
            Err(RemoteError::MissingKey("GOOGLE_PLACES_API_KEY"))
        ));
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{
            "places": [{
                "displayName": {"text": "Vasa Museum"},
                "location": {"latitude": 59.328, "longitude": 18.0915},
                "formattedAddress": "Galärvarvsvägen 14, Stockholm",
                "rating": 4.7,
                "userRatingCount": 58214,
                "priceLevel": "PRICE_LEVEL_MODERATE",
                "types": ["museum", "tourist_attraction", "point_of_interest"],
                "photos": [{"name": "places/abc/photos/xyz"}],
                "currentOpeningHours": {"openNow": true},
                "googleMapsUri": "https://maps.google.com/?cid=1"
            }, {
                "location": {"latitude": 1.0, "longitude": 2.0}
            }]
        }"#;
        let parsed: SearchResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.places.len(), 2);
        assert_eq!(parsed.places[0].display_name.as_ref().unwrap().text, "Vasa Museum");
        assert_eq!(parsed.places[0].user_rating_count, Some(58214));
        assert_eq!(parsed.places[0].price_level.as_deref(), Some("PRICE_LEVEL_MODERATE"));
        assert_eq!(
            parsed.places[0].current_opening_hours.as_ref().and_then(|h| h.open_now),
            Some(true)
        );
        // the second entry has no name and would be filtered out
        assert!(parsed.places[1].display_name.is_none());
    }
}
