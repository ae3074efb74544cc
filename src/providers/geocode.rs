//! Reverse geocoding via OpenStreetMap Nominatim.

use super::USER_AGENT;
use crate::collab::{Address, RemoteError, ReverseGeocoder};
use serde::Deserialize;
use std::time::Duration;

pub struct NominatimGeocoder;

#[derive(Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    #[serde(default)]
    address: ReverseAddress,
}

#[derive(Deserialize, Default)]
struct ReverseAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
}

/// Nominatim display names run long. Keep the first components only.
fn short_label(display_name: &str) -> String {
    display_name
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .take(3)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ReverseGeocoder for NominatimGeocoder {
    fn reverse(&self, lat: f64, lng: f64) -> Result<Address, RemoteError> {
        let url = format!(
            "https://nominatim.openstreetmap.org/reverse?lat={}&lon={}&format=jsonv2",
            lat, lng
        );

        let response = ureq::get(&url)
            .set("User-Agent", USER_AGENT)
            .timeout(Duration::from_secs(10))
            .call()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let parsed: ReverseResponse = response
            .into_json()
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))?;

        let display_name = parsed
            .display_name
            .ok_or_else(|| RemoteError::InvalidResponse("no display_name in reply".into()))?;

        let city = parsed
            .address
            .city
            .or(parsed.address.town)
            .or(parsed.address.village);

        Ok(Address {
            label: short_label(&display_name),
            city,
            country: parsed.address.country,
            iso_code: parsed.address.country_code.map(|c| c.to_uppercase()),
        })
    }
}
