//! Production implementations of the collaborator traits.
//!
//! One file per upstream service. All of them go through `ureq` with
//! short timeouts and map failures into `RemoteError` / `DeviceError`.

mod geocode;
mod geolocate;
mod llm;
mod photos;
mod places;
mod weather;

pub use geocode::NominatimGeocoder;
pub use geolocate::{FixedGeolocator, IpGeolocator};
pub use llm::LlmClient;
pub use photos::WikipediaPhotos;
pub use places::GooglePlacesClient;
pub use weather::{CurrentWeather, OpenMeteoClient};

pub(crate) const USER_AGENT: &str = "AtlasIQ/0.4 (travel-explorer)";

/// Minimal percent-encoding for query string values.
pub(crate) fn urlencode(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            ' ' => "%20".to_string(),
            '&' => "%26".to_string(),
            '=' => "%3D".to_string(),
            '+' => "%2B".to_string(),
            ',' => "%2C".to_string(),
            '?' => "%3F".to_string(),
            '#' => "%23".to_string(),
            '/' => "%2F".to_string(),
            _ if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' || c == '~' => {
                c.to_string()
            }
            _ => {
                let mut buf = [0u8; 4];
                c.encode_utf8(&mut buf)
                    .bytes()
                    .map(|b| format!("%{:02X}", b))
                    .collect()
            }
        })
        .collect()
}
