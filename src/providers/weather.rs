//! Current conditions from the Open-Meteo forecast API. No key needed.

use super::USER_AGENT;
use crate::collab::RemoteError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct OpenMeteoClient;

/// Current conditions at a point.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentWeather {
    pub temperature_c: f64,
    pub wind_speed_kmh: f64,
    pub code: u16,
    pub description: &'static str,
}

#[derive(Deserialize)]
struct ForecastResponse {
    current: CurrentBlock,
}

#[derive(Deserialize)]
struct CurrentBlock {
    temperature_2m: f64,
    weather_code: u16,
    wind_speed_10m: f64,
}

/// WMO weather interpretation codes.
fn describe_weather_code(code: u16) -> &'static str {
    match code {
        0 => "clear sky",
        1 => "mainly clear",
        2 => "partly cloudy",
        3 => "overcast",
        45 | 48 => "fog",
        51 | 53 | 55 => "drizzle",
        56 | 57 => "freezing drizzle",
        61 | 63 | 65 => "rain",
        66 | 67 => "freezing rain",
        71 | 73 | 75 => "snowfall",
        77 => "snow grains",
        80 | 81 | 82 => "rain showers",
        85 | 86 => "snow showers",
        95 => "thunderstorm",
        96 | 99 => "thunderstorm with hail",
        _ => "unknown",
    }
}

impl OpenMeteoClient {
    pub fn current(&self, lat: f64, lng: f64) -> Result<CurrentWeather, RemoteError> {
        let url = format!(
            "https://api.open-meteo.com/v1/forecast?latitude={}&longitude={}&current=temperature_2m,weather_code,wind_speed_10m",
            lat, lng
        );

        let response = ureq::get(&url)
            .set("User-Agent", USER_AGENT)
            .timeout(Duration::from_secs(10))
            .call()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let parsed: ForecastResponse = response
            .into_json()
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))?;

        Ok(CurrentWeather {
            temperature_c: parsed.current.temperature_2m,
            wind_speed_kmh: parsed.current.wind_speed_10m,
            code: parsed.current.weather_code,
            description: describe_weather_code(parsed.current.weather_code),
        })
    }
}
