//! Collaborator seams for everything outside the process.
//!
//! The navigation layer only ever talks to these traits. Production
//! implementations live in `providers`; tests and offline mode plug in
//! their own.

use crate::gazetteer::Place;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ─── Wire types ─────────────────────────────────────────────────

/// A place identified by the remote resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemotePlace {
    /// Canonical place name, e.g. "Eiffel Tower".
    pub name: String,
    /// Country the place belongs to, when known.
    pub country: Option<String>,
    /// ISO 3166-1 alpha-2 code of that country.
    pub iso_code: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub description: Option<String>,
}

impl RemotePlace {
    /// True when the result names a spot inside a country rather than the
    /// country itself.
    pub fn is_sub_place(&self) -> bool {
        match &self.country {
            Some(country) => !country.eq_ignore_ascii_case(&self.name),
            None => false,
        }
    }
}

/// Planner output: signed weights over `Place` rating fields plus an
/// optional climate preference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanWeights {
    pub weights: BTreeMap<String, f64>,
    pub climate: Option<String>,
    pub rationale: Option<String>,
}

/// One conversation turn with the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into() }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: Role::Assistant, text: text.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A nearby point of interest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyPlace {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub address: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    /// 0 (free) to 4 (very expensive).
    pub price_level: Option<u8>,
    pub is_open: Option<bool>,
    pub types: Vec<String>,
    pub photo_url: Option<String>,
    pub maps_url: Option<String>,
}

/// A representative photo for a place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacePhoto {
    pub url: String,
    pub thumb_url: Option<String>,
    pub description: Option<String>,
}

/// Reverse-geocoded address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub label: String,
    pub city: Option<String>,
    pub country: Option<String>,
    pub iso_code: Option<String>,
}

/// A device position fix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoFix {
    pub lat: f64,
    pub lng: f64,
    pub accuracy_m: Option<f64>,
    pub label: Option<String>,
}

// ─── Errors ─────────────────────────────────────────────────────

/// Failures talking to a remote service.
#[derive(Debug)]
pub enum RemoteError {
    Network(String),
    Http { status: u16, body: String },
    /// Credentials rejected. Retrying cannot help.
    Unauthorized(String),
    /// The service needs an API key that was never configured.
    MissingKey(&'static str),
    InvalidResponse(String),
}

impl RemoteError {
    /// Auth failures are permanent until configuration changes.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::MissingKey(_))
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::Http { status, body } => write!(f, "HTTP {}: {}", status, body),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            Self::MissingKey(var) => write!(f, "Missing API key: set {}", var),
            Self::InvalidResponse(msg) => write!(f, "Invalid API response: {}", msg),
        }
    }
}

impl std::error::Error for RemoteError {}

/// Failures reading the device position.
#[derive(Debug)]
pub enum DeviceError {
    PermissionDenied,
    Unavailable(String),
    Timeout,
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "Location permission denied"),
            Self::Unavailable(msg) => write!(f, "Location unavailable: {}", msg),
            Self::Timeout => write!(f, "Location request timed out"),
        }
    }
}

impl std::error::Error for DeviceError {}

// ─── Traits ─────────────────────────────────────────────────────

/// Resolves free text (or a photo) to a place via a remote AI.
pub trait RemoteResolver: Send {
    /// `Ok(None)` means the service answered but found no real place.
    fn resolve_place(&self, query: &str) -> Result<Option<RemotePlace>, RemoteError>;

    /// `data_url` is a validated `data:image/...;base64,...` string.
    fn resolve_photo(&self, data_url: &str) -> Result<Option<RemotePlace>, RemoteError>;
}

/// Turns trip preferences into scoring weights and commentary.
pub trait TripPlanner: Send {
    fn plan(&self, preferences: &str) -> Result<PlanWeights, RemoteError>;

    /// One-sentence pitch for a single ranked country. `Ok(None)` when the
    /// planner has nothing to add.
    fn insight(&self, preferences: &str, place: &Place) -> Result<Option<String>, RemoteError>;

    /// Closing summary over the ranked list as (name, score) pairs.
    fn summarize(
        &self,
        preferences: &str,
        ranked: &[(String, f64)],
    ) -> Result<Option<String>, RemoteError>;
}

/// Free-form travel conversation.
pub trait ChatAgent: Send {
    /// `place` names the destination under discussion, when the
    /// conversation belongs to a place tab.
    fn chat(&self, place: Option<&str>, turns: &[ChatTurn]) -> Result<String, RemoteError>;
}

/// Coordinates to human-readable address.
pub trait ReverseGeocoder: Send {
    fn reverse(&self, lat: f64, lng: f64) -> Result<Address, RemoteError>;
}

/// Text search for points of interest around a position.
pub trait NearbySearch: Send {
    fn search(
        &self,
        query: &str,
        lat: f64,
        lng: f64,
        radius_m: f64,
    ) -> Result<Vec<NearbyPlace>, RemoteError>;
}

/// Representative photo lookup by place name.
pub trait PhotoLookup: Send {
    fn photo_for(&self, name: &str) -> Result<Option<PlacePhoto>, RemoteError>;
}

/// Where is the device right now.
pub trait Geolocator: Send {
    fn locate(&self) -> Result<GeoFix, DeviceError>;
}

/// The full set of external services the navigation controller needs.
pub struct Collaborators {
    pub remote: Box<dyn RemoteResolver>,
    pub chat: Box<dyn ChatAgent>,
    pub geocoder: Box<dyn ReverseGeocoder>,
    pub nearby: Box<dyn NearbySearch>,
    pub photos: Box<dyn PhotoLookup>,
    pub geolocator: Box<dyn Geolocator>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_place_detection() {
        let eiffel = RemotePlace {
            name: "Eiffel Tower".into(),
            country: Some("France".into()),
            iso_code: Some("FR".into()),
            lat: 48.8584,
            lng: 2.2945,
            description: None,
        };
        assert!(eiffel.is_sub_place());

        let japan = RemotePlace {
            name: "Japan".into(),
            country: Some("japan".into()),
            iso_code: Some("JP".into()),
            lat: 36.2,
            lng: 138.2,
            description: None,
        };
        assert!(!japan.is_sub_place());

        let unknown = RemotePlace {
            name: "Somewhere".into(),
            country: None,
            iso_code: None,
            lat: 0.0,
            lng: 0.0,
            description: None,
        };
        assert!(!unknown.is_sub_place());
    }

    #[test]
    fn test_auth_errors_not_retryable() {
        assert!(RemoteError::Unauthorized("bad key".into()).is_auth());
        assert!(RemoteError::MissingKey("OPENROUTER_API_KEY").is_auth());
        assert!(!RemoteError::Network("timeout".into()).is_auth());
        assert!(!RemoteError::Http { status: 500, body: String::new() }.is_auth());
    }
}
