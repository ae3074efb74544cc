use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::collab::{ChatTurn, NearbyPlace};
use crate::config::VERSION;
use crate::gazetteer::Place;
use crate::globe::CameraTarget;
use crate::nav::{NavError, NavOutcome, SessionEvent, Tab};
use crate::providers::CurrentWeather;
use crate::recommend::Recommendations;
use crate::resolver::Resolution;

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub(super) struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

/// Retryable failures map to 5xx, caller mistakes to 4xx. Credential
/// problems get their own status so clients can stop retrying.
fn nav_error(e: NavError) -> ApiError {
    let status = match &e {
        NavError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        NavError::NoResults(_) => StatusCode::NOT_FOUND,
        NavError::Remote(remote) if remote.is_auth() => StatusCode::UNAUTHORIZED,
        NavError::Remote(_) => StatusCode::BAD_GATEWAY,
        NavError::Device(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    api_error(status, format!("{}", e))
}

// ─── Shared response shapes ──────────────────────────────────────

#[derive(Serialize)]
pub struct SessionSnapshot {
    pub tabs: Vec<Tab>,
    pub active: Option<u64>,
}

/// What a navigation action returns: the outcome itself plus enough
/// session context for a client to redraw without a second round-trip.
#[derive(Serialize)]
pub struct ActionResponse {
    pub outcome: NavOutcome,
    pub camera: Option<CameraTarget>,
    pub session: SessionSnapshot,
    pub events: Vec<SessionEvent>,
}

fn action_response(state: &AppState, outcome: NavOutcome) -> ActionResponse {
    let mut nav = state.nav.lock().unwrap();
    let events = nav.session_mut().take_events();
    let session = SessionSnapshot {
        tabs: nav.session().tabs().to_vec(),
        active: nav.session().active_id(),
    };
    let camera = state.globe.lock().unwrap().last_flight().cloned();
    ActionResponse { outcome, camera, session, events }
}

// ─── GET / ───────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ApiInfo {
    name: &'static str,
    version: &'static str,
    endpoints: Vec<&'static str>,
}

pub async fn index() -> Json<ApiInfo> {
    Json(ApiInfo {
        name: "AtlasIQ",
        version: VERSION,
        endpoints: vec![
            "GET  /api/health",
            "GET  /api/countries",
            "GET  /api/countries/{code}",
            "GET  /api/resolve?query=",
            "POST /api/query",
            "POST /api/photo",
            "POST /api/chat",
            "POST /api/recommendations",
            "POST /api/summary",
            "GET  /api/nearby?query=&lat=&lng=",
            "GET  /api/weather?lat=&lng=",
            "GET  /api/session",
            "POST /api/tabs/{id}/activate",
            "DELETE /api/tabs/{id}",
        ],
    })
}

// ─── GET /api/health ─────────────────────────────────────────────

#[derive(Serialize)]
pub struct Health {
    status: &'static str,
    version: &'static str,
    uptime_secs: u64,
    countries: usize,
    offline: bool,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<Health> {
    let countries = {
        let nav = state.nav.lock().unwrap();
        nav.gazetteer().len()
    };
    Json(Health {
        status: "ok",
        version: VERSION,
        uptime_secs: state.started.elapsed().as_secs(),
        countries,
        offline: state.offline,
    })
}

// ─── GET /api/countries ──────────────────────────────────────────

#[derive(Serialize)]
pub struct CountrySummary {
    pub name: String,
    pub code: String,
    pub lat: f64,
    pub lng: f64,
    pub climate: String,
}

pub async fn countries(State(state): State<Arc<AppState>>) -> Json<Vec<CountrySummary>> {
    let nav = state.nav.lock().unwrap();
    let list = nav
        .gazetteer()
        .all()
        .iter()
        .map(|p| CountrySummary {
            name: p.name.clone(),
            code: p.code.clone(),
            lat: p.lat,
            lng: p.lng,
            climate: p.climate.clone(),
        })
        .collect();
    Json(list)
}

pub async fn country_detail(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<Place>, ApiError> {
    let nav = state.nav.lock().unwrap();
    match nav.gazetteer().by_code(&code) {
        Some(place) => Ok(Json(place.clone())),
        None => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Unknown country code '{}'", code),
        )),
    }
}

// ─── POST /api/query ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct QueryBody {
    pub query: String,
}

pub async fn query(
    State(state): State<Arc<AppState>>,
    Json(body): Json<QueryBody>,
) -> Result<Json<ActionResponse>, ApiError> {
    let start = Instant::now();

    let outcome = {
        let mut nav = state.nav.lock().unwrap();
        nav.handle_query(&body.query)
    }
    .map_err(nav_error)?;

    eprintln!(
        "[{}] POST /api/query {:?} -> {} ({:.1}ms)",
        Utc::now().format("%H:%M:%S"),
        body.query,
        outcome_label(&outcome),
        start.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(Json(action_response(&state, outcome)))
}

fn outcome_label(outcome: &NavOutcome) -> String {
    match outcome {
        NavOutcome::Region { name } => format!("region {}", name),
        NavOutcome::Tab { id } => format!("tab {}", id),
        NavOutcome::Recommended { id } => format!("recommended tab {}", id),
        NavOutcome::Pins { places } => format!("{} pins", places.len()),
        NavOutcome::Located { label, .. } => format!("located at {}", label),
    }
}

// ─── POST /api/photo ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct PhotoBody {
    pub image_data: String,
}

pub async fn photo(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PhotoBody>,
) -> Result<Json<ActionResponse>, ApiError> {
    let start = Instant::now();

    let outcome = {
        let mut nav = state.nav.lock().unwrap();
        nav.handle_photo(&body.image_data)
    }
    .map_err(nav_error)?;

    eprintln!(
        "[{}] POST /api/photo ({} bytes) -> {} ({:.1}ms)",
        Utc::now().format("%H:%M:%S"),
        body.image_data.len(),
        outcome_label(&outcome),
        start.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(Json(action_response(&state, outcome)))
}

// ─── GET /api/resolve ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ResolveQuery {
    pub query: Option<String>,
}

pub async fn resolve(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveQuery>,
) -> Result<Json<Resolution>, ApiError> {
    let start = Instant::now();

    let query = params.query.as_deref().unwrap_or("").trim();
    if query.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Missing 'query' parameter"));
    }

    let cache_key = query.to_lowercase();
    {
        let mut cache = state.resolve_cache.lock().unwrap();
        if let Some(cached) = cache.get(&cache_key) {
            eprintln!(
                "[{}] GET /api/resolve?query={} -> CACHED ({:.1}ms)",
                Utc::now().format("%H:%M:%S"),
                query,
                start.elapsed().as_secs_f64() * 1000.0,
            );
            return Ok(Json(cached));
        }
    }

    let resolution = {
        let nav = state.nav.lock().unwrap();
        nav.resolve_only(query)
    }
    .map_err(nav_error)?;

    {
        let mut cache = state.resolve_cache.lock().unwrap();
        cache.put(cache_key, resolution.clone());
    }

    eprintln!(
        "[{}] GET /api/resolve?query={} ({:.1}ms)",
        Utc::now().format("%H:%M:%S"),
        query,
        start.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(Json(resolution))
}

// ─── POST /api/chat ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ChatBody {
    pub tab_id: Option<u64>,
    /// Omitted: send the tab's queued opening message instead.
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub tab_id: u64,
    pub reply: Option<String>,
    pub turns: Vec<ChatTurn>,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatBody>,
) -> Result<Json<ChatResponse>, ApiError> {
    let start = Instant::now();

    let mut nav = state.nav.lock().unwrap();
    let tab_id = match body.tab_id.or_else(|| nav.session().active_id()) {
        Some(id) => id,
        None => return Err(api_error(StatusCode::NOT_FOUND, "No open tab to chat in")),
    };

    let reply = match &body.message {
        Some(message) => Some(nav.chat(tab_id, message).map_err(nav_error)?),
        None => nav.flush_initial_message(tab_id).map_err(nav_error)?,
    };

    let turns = nav
        .session()
        .get(tab_id)
        .map(|t| t.turns.clone())
        .unwrap_or_default();
    drop(nav);

    eprintln!(
        "[{}] POST /api/chat tab={} ({:.1}ms)",
        Utc::now().format("%H:%M:%S"),
        tab_id,
        start.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(Json(ChatResponse { tab_id, reply, turns }))
}

// ─── POST /api/recommendations ───────────────────────────────────

#[derive(Deserialize)]
pub struct RecommendBody {
    pub preferences: String,
}

pub async fn recommendations(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RecommendBody>,
) -> Result<Json<Recommendations>, ApiError> {
    let start = Instant::now();

    // Planning costs a model round-trip per run; identical preferences
    // within the TTL reuse the last answer.
    let cache_key = body.preferences.trim().to_lowercase();
    {
        let mut cache = state.recs_cache.lock().unwrap();
        if let Some(cached) = cache.get(&cache_key) {
            eprintln!(
                "[{}] POST /api/recommendations -> CACHED ({:.1}ms)",
                Utc::now().format("%H:%M:%S"),
                start.elapsed().as_secs_f64() * 1000.0,
            );
            return Ok(Json(cached));
        }
    }

    let recs = {
        let nav = state.nav.lock().unwrap();
        nav.recommend(&body.preferences)
    }
    .map_err(nav_error)?;

    {
        let mut cache = state.recs_cache.lock().unwrap();
        cache.put(cache_key, recs.clone());
    }

    eprintln!(
        "[{}] POST /api/recommendations -> {} picks ({:.1}ms)",
        Utc::now().format("%H:%M:%S"),
        recs.picks.len(),
        start.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(Json(recs))
}

// ─── POST /api/summary ───────────────────────────────────────────

#[derive(Deserialize)]
pub struct SummaryBody {
    /// Omitted or empty: summarize the open tabs instead.
    #[serde(default)]
    pub highlights: Vec<String>,
}

#[derive(Serialize)]
pub struct TripSummary {
    pub summary: String,
}

pub async fn summary(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SummaryBody>,
) -> Result<Json<TripSummary>, ApiError> {
    let start = Instant::now();

    let summary = {
        let nav = state.nav.lock().unwrap();
        nav.trip_summary(&body.highlights)
    }
    .map_err(nav_error)?;

    eprintln!(
        "[{}] POST /api/summary ({} highlights) ({:.1}ms)",
        Utc::now().format("%H:%M:%S"),
        body.highlights.len(),
        start.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(Json(TripSummary { summary }))
}

// ─── GET /api/nearby ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct NearbyQuery {
    pub query: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius: Option<f64>,
}

pub async fn nearby(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NearbyQuery>,
) -> Result<Json<Vec<NearbyPlace>>, ApiError> {
    let start = Instant::now();

    let query = params.query.as_deref().unwrap_or("").trim().to_string();
    if query.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Missing 'query' parameter"));
    }
    let (lat, lng) = match (params.lat, params.lng) {
        (Some(lat), Some(lng)) => (lat, lng),
        _ => {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "Provide 'lat' and 'lng' parameters",
            ));
        }
    };
    let radius = params.radius.unwrap_or(2_000.0);

    let cache_key = format!("{}|{:.4}|{:.4}|{:.0}", query.to_lowercase(), lat, lng, radius);
    {
        let mut cache = state.nearby_cache.lock().unwrap();
        if let Some(cached) = cache.get(&cache_key) {
            return Ok(Json(cached));
        }
    }

    let places = {
        let nav = state.nav.lock().unwrap();
        nav.nearby_at(&query, lat, lng, radius)
    }
    .map_err(nav_error)?;

    {
        let mut cache = state.nearby_cache.lock().unwrap();
        cache.put(cache_key, places.clone());
    }

    eprintln!(
        "[{}] GET /api/nearby query={} -> {} places ({:.1}ms)",
        Utc::now().format("%H:%M:%S"),
        query,
        places.len(),
        start.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(Json(places))
}

// ─── GET /api/weather ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct WeatherQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

pub async fn weather(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WeatherQuery>,
) -> Result<Json<CurrentWeather>, ApiError> {
    let start = Instant::now();

    let (lat, lng) = match (params.lat, params.lng) {
        (Some(lat), Some(lng)) => (lat, lng),
        _ => {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "Provide 'lat' and 'lng' parameters",
            ));
        }
    };
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Invalid coordinates. Lat: -90..90, Lng: -180..180",
        ));
    }
    if state.offline {
        return Err(api_error(StatusCode::NOT_FOUND, "Weather needs a connection"));
    }

    // positions within ~1km share a cache slot
    let cache_key = format!("{:.2},{:.2}", lat, lng);
    {
        let mut cache = state.weather_cache.lock().unwrap();
        if let Some(cached) = cache.get(&cache_key) {
            return Ok(Json(cached));
        }
    }

    let current = state.weather.current(lat, lng).map_err(|e| {
        api_error(StatusCode::BAD_GATEWAY, format!("{}", e))
    })?;

    {
        let mut cache = state.weather_cache.lock().unwrap();
        cache.put(cache_key, current.clone());
    }

    eprintln!(
        "[{}] GET /api/weather {:.2},{:.2} -> {} ({:.1}ms)",
        Utc::now().format("%H:%M:%S"),
        lat,
        lng,
        current.description,
        start.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(Json(current))
}

// ─── Session and tabs ────────────────────────────────────────────

pub async fn session(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    let nav = state.nav.lock().unwrap();
    Json(SessionSnapshot {
        tabs: nav.session().tabs().to_vec(),
        active: nav.session().active_id(),
    })
}

#[derive(Serialize)]
pub struct TabChange {
    pub session: SessionSnapshot,
    pub events: Vec<SessionEvent>,
}

pub async fn activate_tab(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<TabChange>, ApiError> {
    let mut nav = state.nav.lock().unwrap();
    if !nav.activate_tab(id) {
        return Err(api_error(StatusCode::NOT_FOUND, format!("No tab {}", id)));
    }
    let events = nav.session_mut().take_events();
    Ok(Json(TabChange {
        session: SessionSnapshot {
            tabs: nav.session().tabs().to_vec(),
            active: nav.session().active_id(),
        },
        events,
    }))
}

pub async fn close_tab(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<TabChange>, ApiError> {
    let mut nav = state.nav.lock().unwrap();
    if !nav.close_tab(id) {
        return Err(api_error(StatusCode::NOT_FOUND, format!("No tab {}", id)));
    }
    let events = nav.session_mut().take_events();

    eprintln!(
        "[{}] DELETE /api/tabs/{} -> {} open",
        Utc::now().format("%H:%M:%S"),
        id,
        nav.session().len(),
    );

    Ok(Json(TabChange {
        session: SessionSnapshot {
            tabs: nav.session().tabs().to_vec(),
            active: nav.session().active_id(),
        },
        events,
    }))
}
