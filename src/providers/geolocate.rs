//! Device position without a GPS: IP geolocation, or a fixed point
//! supplied on the command line.

use super::USER_AGENT;
use crate::collab::{DeviceError, GeoFix, Geolocator};
use serde::Deserialize;
use std::time::Duration;

/// Position from the caller's public IP. City-level accuracy at best.
pub struct IpGeolocator;

#[derive(Deserialize)]
struct IpApiResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    city: Option<String>,
    country_name: Option<String>,
}

impl Geolocator for IpGeolocator {
    fn locate(&self) -> Result<GeoFix, DeviceError> {
        let response = ureq::get("https://ipapi.co/json/")
            .set("User-Agent", USER_AGENT)
            .timeout(Duration::from_secs(10))
            .call()
            .map_err(|e| DeviceError::Unavailable(e.to_string()))?;

        let parsed: IpApiResponse = response
            .into_json()
            .map_err(|e| DeviceError::Unavailable(e.to_string()))?;

        let lat = parsed
            .latitude
            .ok_or_else(|| DeviceError::Unavailable("no latitude in reply".into()))?;
        let lng = parsed
            .longitude
            .ok_or_else(|| DeviceError::Unavailable("no longitude in reply".into()))?;

        let label = match (parsed.city, parsed.country_name) {
            (Some(city), Some(country)) => Some(format!("{}, {}", city, country)),
            (Some(city), None) => Some(city),
            (None, Some(country)) => Some(country),
            (None, None) => None,
        };

        Ok(GeoFix {
            lat,
            lng,
            // IP fixes are city-level
            accuracy_m: Some(25_000.0),
            label,
        })
    }
}

/// A position pinned at construction, for `--lat`/`--lng` runs and tests.
pub struct FixedGeolocator {
    pub lat: f64,
    pub lng: f64,
    pub label: Option<String>,
}

impl Geolocator for FixedGeolocator {
    fn locate(&self) -> Result<GeoFix, DeviceError> {
        Ok(GeoFix {
            lat: self.lat,
            lng: self.lng,
            accuracy_m: None,
            label: self.label.clone(),
        })
    }
}
