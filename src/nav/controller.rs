//! The navigation controller.
//!
//! Single entry point for everything the user does: free-text queries,
//! photo drops, country picks, chat, and tab management. Owns the session,
//! the resolver, and the collaborator seams, and drives the globe camera.
//!
//! Query flow:  classify -> normalize -> resolve chain -> camera + tab
//! Device flow: cached fix (5 min) -> geolocator -> reverse geocode / pins

use crate::collab::{
    ChatAgent, ChatTurn, Collaborators, DeviceError, GeoFix, Geolocator, NearbyPlace,
    NearbySearch, PhotoLookup, RemoteError, RemotePlace, RemoteResolver, ReverseGeocoder,
};
use crate::gazetteer::{Gazetteer, Place};
use crate::globe::{
    CameraTarget, GlobeSurface, PhotoMarker, Pin, ALT_COUNTRY, ALT_PINS, ALT_SUB_PLACE,
};
use crate::nav::session::{SessionState, TabDraft, TabKind};
use crate::query::{classify, looks_like_gibberish, normalize, QueryIntent};
use crate::recommend::{RecommendationEngine, Recommendations};
use crate::resolver::{PlaceResolver, Resolution};
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

/// How long a device fix stays fresh.
const GEO_FIX_TTL: Duration = Duration::from_secs(300);

const DEFAULT_NEARBY_TOPIC: &str = "tourist attractions";
const DEFAULT_NEARBY_RADIUS_M: f64 = 2_000.0;
const MIN_NEARBY_RADIUS_M: f64 = 100.0;
const MAX_NEARBY_RADIUS_M: f64 = 50_000.0;
const MAX_PINS: usize = 8;
const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;
const AGENT_TAB_TITLE: &str = "Trip Agent";

// ─── Errors ─────────────────────────────────────────────────────

/// Navigation failures, split by who can fix them.
#[derive(Debug)]
pub enum NavError {
    /// The input itself is unusable; rephrasing helps, retrying does not.
    InvalidQuery(String),
    /// Everything worked but nothing matched.
    NoResults(String),
    Remote(RemoteError),
    Device(DeviceError),
}

impl NavError {
    /// Whether trying the same action again can succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::InvalidQuery(_) | Self::NoResults(_) => false,
            Self::Remote(e) => !e.is_auth(),
            Self::Device(_) => true,
        }
    }
}

impl fmt::Display for NavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidQuery(msg) => write!(f, "Invalid query: {}", msg),
            Self::NoResults(msg) => write!(f, "No results: {}", msg),
            Self::Remote(e) => write!(f, "{}", e),
            Self::Device(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for NavError {}

impl From<RemoteError> for NavError {
    fn from(e: RemoteError) -> Self {
        Self::Remote(e)
    }
}

impl From<DeviceError> for NavError {
    fn from(e: DeviceError) -> Self {
        Self::Device(e)
    }
}

// ─── Outcome ────────────────────────────────────────────────────

/// What a navigation action did.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NavOutcome {
    /// Camera moved to a continent-scale region. No tab.
    Region { name: String },
    /// A tab was opened or refocused.
    Tab { id: u64 },
    /// The query read as trip preferences; the top-ranked pick got a tab.
    Recommended { id: u64 },
    /// Pins dropped around the user's position.
    Pins { places: Vec<NearbyPlace> },
    /// The user's own position, with a display label and, when the spot
    /// resolved to a known place, its tab.
    Located { fix: GeoFix, label: String, tab: Option<u64> },
}

// ─── Controller ─────────────────────────────────────────────────

pub struct NavController {
    resolver: PlaceResolver,
    session: SessionState,
    globe: Box<dyn GlobeSurface>,
    remote: Box<dyn RemoteResolver>,
    agent: Box<dyn ChatAgent>,
    geocoder: Box<dyn ReverseGeocoder>,
    nearby: Box<dyn NearbySearch>,
    photos: Box<dyn PhotoLookup>,
    geolocator: Box<dyn Geolocator>,
    engine: RecommendationEngine,
    geo_cache: Option<(GeoFix, Instant)>,
    offline: bool,
}

impl NavController {
    pub fn new(
        resolver: PlaceResolver,
        globe: Box<dyn GlobeSurface>,
        collab: Collaborators,
        engine: RecommendationEngine,
    ) -> Self {
        Self {
            resolver,
            session: SessionState::new(),
            globe,
            remote: collab.remote,
            agent: collab.chat,
            geocoder: collab.geocoder,
            nearby: collab.nearby,
            photos: collab.photos,
            geolocator: collab.geolocator,
            engine,
            geo_cache: None,
            offline: false,
        }
    }

    /// Offline mode: static resolution and session ops keep working, every
    /// network-backed step is skipped or refused.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
        self.resolver.set_offline(offline);
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    pub fn gazetteer(&self) -> &Gazetteer {
        self.resolver.gazetteer()
    }

    // ─── Query entry point ──────────────────────────────────────

    pub fn handle_query(&mut self, raw: &str) -> Result<NavOutcome, NavError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(NavError::InvalidQuery("empty query".into()));
        }
        match classify(trimmed) {
            QueryIntent::NearMe { topic } => self.near_me(&topic),
            QueryIntent::LocateMe => self.locate_me(),
            QueryIntent::AgentQuery => self.agent_query(trimmed),
            QueryIntent::Plain => self.plain_query(trimmed),
        }
    }

    /// Resolve without touching camera or session.
    pub fn resolve_only(&self, raw: &str) -> Result<Resolution, NavError> {
        let q = normalize(raw);
        if q.is_empty() {
            return Err(NavError::InvalidQuery("empty query".into()));
        }
        if looks_like_gibberish(&q) {
            return match self.resolver.resolve_static(&q) {
                Some(resolution) => Ok(resolution),
                None => Err(NavError::InvalidQuery(format!(
                    "'{}' does not look like a place",
                    raw.trim()
                ))),
            };
        }
        Ok(self.resolver.resolve(&q, self.remote.as_ref())?)
    }

    fn plain_query(&mut self, raw: &str) -> Result<NavOutcome, NavError> {
        let q = normalize(raw);
        if q.is_empty() {
            return Err(NavError::InvalidQuery("empty query".into()));
        }

        // Gibberish still gets the static tables; only the remote trip is
        // blocked.
        if looks_like_gibberish(&q) {
            return match self.resolver.resolve_static(&q) {
                Some(resolution) => self.apply_resolution(resolution),
                None => Err(NavError::InvalidQuery(format!(
                    "'{}' does not look like a place",
                    raw.trim()
                ))),
            };
        }

        match self.resolver.resolve(&q, self.remote.as_ref()) {
            Ok(Resolution::NotFound) => self.recommend_flow(raw),
            Ok(resolution) => self.apply_resolution(resolution),
            // Credential problems stay visible; anything else falls through
            // to ranking the text as trip preferences.
            Err(e) if e.is_auth() => Err(e.into()),
            Err(_) => self.recommend_flow(raw),
        }
    }

    fn apply_resolution(&mut self, resolution: Resolution) -> Result<NavOutcome, NavError> {
        match resolution {
            Resolution::Region(region) => {
                self.globe.fly_to(CameraTarget {
                    lat: region.lat,
                    lng: region.lng,
                    altitude: region.altitude,
                });
                Ok(NavOutcome::Region { name: region.name.to_string() })
            }
            Resolution::Country(place) => Ok(self.open_country_tab(&place)),
            Resolution::Remote(place) => Ok(self.open_remote_tab(place, None)),
            Resolution::NotFound => Err(NavError::NoResults("no place matched".into())),
        }
    }

    fn country_draft(place: &Place) -> TabDraft {
        TabDraft {
            title: place.name.clone(),
            iso_code: Some(place.code.clone()),
            sub_place: None,
            lat: place.lat,
            lng: place.lng,
            kind: TabKind::Country,
            score: None,
            insight: None,
            initial_message: None,
        }
    }

    fn remote_draft(place: &RemotePlace, initial_message: Option<&str>) -> TabDraft {
        let sub = place.is_sub_place();
        TabDraft {
            title: place.name.clone(),
            iso_code: place.iso_code.as_deref().map(str::to_uppercase),
            sub_place: if sub { Some(place.name.clone()) } else { None },
            lat: place.lat,
            lng: place.lng,
            kind: if sub { TabKind::SubPlace } else { TabKind::Country },
            score: None,
            insight: None,
            initial_message: initial_message.map(str::to_string),
        }
    }

    fn open_country_tab(&mut self, place: &Place) -> NavOutcome {
        self.globe.fly_to(CameraTarget {
            lat: place.lat,
            lng: place.lng,
            altitude: ALT_COUNTRY,
        });
        let id = self.session.add_or_activate(Self::country_draft(place));
        self.enrich_photo(id);
        NavOutcome::Tab { id }
    }

    fn open_remote_tab(&mut self, place: RemotePlace, initial_message: Option<&str>) -> NavOutcome {
        self.globe.fly_to(CameraTarget {
            lat: place.lat,
            lng: place.lng,
            altitude: if place.is_sub_place() { ALT_SUB_PLACE } else { ALT_COUNTRY },
        });
        let id = self.session.add_or_activate(Self::remote_draft(&place, initial_message));
        self.enrich_photo(id);
        NavOutcome::Tab { id }
    }

    // ─── Agent flow ─────────────────────────────────────────────

    /// A question may still name one concrete place ("is the louvre open on
    /// mondays?"). The remote resolver sees the whole sentence; the static
    /// tables are skipped because any country mentioned in passing would
    /// match.
    fn agent_query(&mut self, raw: &str) -> Result<NavOutcome, NavError> {
        if !self.offline {
            if let Ok(Some(place)) = self.remote.resolve_place(raw) {
                return Ok(self.open_remote_tab(place, Some(raw)));
            }
        }
        // No single place in the question: queue it on the agent tab.
        Ok(NavOutcome::Tab { id: self.agent_tab(raw) })
    }

    fn agent_tab(&mut self, raw: &str) -> u64 {
        // Camera stays put: the question does not name a single place.
        self.session.add_or_activate(TabDraft {
            title: AGENT_TAB_TITLE.into(),
            iso_code: None,
            sub_place: None,
            lat: 0.0,
            lng: 0.0,
            kind: TabKind::Agent,
            score: None,
            insight: None,
            initial_message: Some(raw.to_string()),
        })
    }

    /// One-shot question: open (or refocus) the agent tab and send it.
    pub fn ask(&mut self, question: &str) -> Result<String, NavError> {
        let trimmed = question.trim();
        if trimmed.is_empty() {
            return Err(NavError::InvalidQuery("empty question".into()));
        }
        let id = self.agent_tab(trimmed);
        match self.flush_initial_message(id)? {
            Some(reply) => Ok(reply),
            // the draft always queues the question, but stay safe
            None => self.chat(id, trimmed),
        }
    }

    // ─── Device flows ───────────────────────────────────────────

    fn device_fix(&mut self) -> Result<GeoFix, NavError> {
        if let Some((fix, at)) = &self.geo_cache {
            if at.elapsed() < GEO_FIX_TTL {
                return Ok(fix.clone());
            }
        }
        let fix = self.geolocator.locate()?;
        self.geo_cache = Some((fix.clone(), Instant::now()));
        Ok(fix)
    }

    fn near_me(&mut self, topic: &str) -> Result<NavOutcome, NavError> {
        let fix = self.device_fix()?;
        let query = if topic.is_empty() { DEFAULT_NEARBY_TOPIC } else { topic };
        let found = self.nearby_at(query, fix.lat, fix.lng, DEFAULT_NEARBY_RADIUS_M)?;
        if found.is_empty() {
            return Err(NavError::NoResults(format!("nothing found for '{}' nearby", query)));
        }

        self.globe.fly_to(CameraTarget {
            lat: fix.lat,
            lng: fix.lng,
            altitude: ALT_PINS,
        });
        self.globe.clear_pins();
        let places: Vec<NearbyPlace> = found.into_iter().take(MAX_PINS).collect();
        for place in &places {
            self.globe.drop_pin(Pin {
                label: place.name.clone(),
                lat: place.lat,
                lng: place.lng,
            });
        }
        Ok(NavOutcome::Pins { places })
    }

    fn locate_me(&mut self) -> Result<NavOutcome, NavError> {
        let fix = self.device_fix()?;
        let geocoded = if self.offline {
            None
        } else {
            match self.geocoder.reverse(fix.lat, fix.lng) {
                Ok(address) => Some(address.label),
                Err(_) => None,
            }
        };
        let named = geocoded.or_else(|| fix.label.clone());
        let label = named
            .clone()
            .unwrap_or_else(|| format!("{:.4}, {:.4}", fix.lat, fix.lng));

        self.globe.fly_to(CameraTarget {
            lat: fix.lat,
            lng: fix.lng,
            altitude: ALT_SUB_PLACE,
        });
        self.globe.drop_pin(Pin {
            label: "You are here".into(),
            lat: fix.lat,
            lng: fix.lng,
        });

        // Put a name on the spot when we can. Staying tabless is fine; the
        // camera already shows the position.
        let tab = named.and_then(|name| self.locality_tab(&name));
        Ok(NavOutcome::Located { fix, label, tab })
    }

    /// Open a tab for the place a device fix reverse-geocoded to. The
    /// camera is already there, so nothing flies.
    fn locality_tab(&mut self, name: &str) -> Option<u64> {
        let q = normalize(name);
        if q.is_empty() || looks_like_gibberish(&q) {
            return None;
        }
        let draft = match self.resolver.resolve(&q, self.remote.as_ref()) {
            Ok(Resolution::Country(place)) => Self::country_draft(&place),
            Ok(Resolution::Remote(place)) => Self::remote_draft(&place, None),
            Ok(Resolution::Region(_)) | Ok(Resolution::NotFound) | Err(_) => return None,
        };
        let id = self.session.add_or_activate(draft);
        self.enrich_photo(id);
        Some(id)
    }

    /// Validated nearby search with radius clamping. No session effects.
    pub fn nearby_at(
        &self,
        query: &str,
        lat: f64,
        lng: f64,
        radius_m: f64,
    ) -> Result<Vec<NearbyPlace>, NavError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(NavError::InvalidQuery(
                "Invalid coordinates. Lat: -90..90, Lng: -180..180".into(),
            ));
        }
        if self.offline {
            return Err(NavError::NoResults("nearby search needs a connection".into()));
        }
        let radius = radius_m.clamp(MIN_NEARBY_RADIUS_M, MAX_NEARBY_RADIUS_M);
        Ok(self.nearby.search(query, lat, lng, radius)?)
    }

    // ─── Photo flow ─────────────────────────────────────────────

    pub fn handle_photo(&mut self, data_url: &str) -> Result<NavOutcome, NavError> {
        validate_photo_data_url(data_url).map_err(NavError::InvalidQuery)?;
        if self.offline {
            return Err(NavError::NoResults("photo lookup needs a connection".into()));
        }
        match self.remote.resolve_photo(data_url)? {
            Some(place) => Ok(self.open_remote_tab(place, None)),
            None => Err(NavError::NoResults(
                "could not recognize a place in the photo".into(),
            )),
        }
    }

    /// Attach a representative photo to a tab and anchor it on the globe.
    /// Returns false when the tab has closed in the meantime or no photo is
    /// available.
    pub fn enrich_photo(&mut self, id: u64) -> bool {
        if self.offline {
            return false;
        }
        let Some(tab) = self.session.get(id) else {
            return false;
        };
        if tab.kind == TabKind::Agent {
            // agent tabs have no spot on the globe
            return false;
        }
        let name = tab.title.clone();
        let (lat, lng) = (tab.lat, tab.lng);
        match self.photos.photo_for(&name) {
            Ok(Some(photo)) => {
                let url = photo.url.clone();
                if !self.session.set_photo(id, photo) {
                    return false;
                }
                self.globe.show_photo_marker(PhotoMarker { tab_id: id, lat, lng, url });
                true
            }
            Ok(None) => false,
            Err(_) => false,
        }
    }

    // ─── Country pick ───────────────────────────────────────────

    pub fn open_country(&mut self, code: &str) -> Result<NavOutcome, NavError> {
        match self.resolver.gazetteer().by_code(code) {
            Some(place) => {
                let place = place.clone();
                Ok(self.open_country_tab(&place))
            }
            None => Err(NavError::InvalidQuery(format!("unknown country code '{}'", code))),
        }
    }

    // ─── Recommendations ────────────────────────────────────────

    pub fn recommend(&self, preferences: &str) -> Result<Recommendations, NavError> {
        let preferences = preferences.trim();
        if preferences.is_empty() {
            return Err(NavError::InvalidQuery("describe the trip you want".into()));
        }
        Ok(self.engine.recommend(preferences, self.resolver.gazetteer())?)
    }

    /// Plain text that is not a place reads as trip preferences: rank, then
    /// navigate to the winner.
    fn recommend_flow(&mut self, interests: &str) -> Result<NavOutcome, NavError> {
        let recs = self.engine.recommend(interests, self.resolver.gazetteer())?;
        let Some(top) = recs.picks.first() else {
            return Err(NavError::NoResults(format!("no place found for '{}'", interests)));
        };
        let place = top.place.clone();
        let score = top.score;
        let insight = top.insight.clone();

        self.globe.fly_to(CameraTarget {
            lat: place.lat,
            lng: place.lng,
            altitude: ALT_COUNTRY,
        });
        let id = self.session.add_or_activate(TabDraft {
            score: Some(score),
            insight,
            ..Self::country_draft(&place)
        });
        self.enrich_photo(id);
        Ok(NavOutcome::Recommended { id })
    }

    // ─── Chat ───────────────────────────────────────────────────

    pub fn chat(&mut self, tab_id: u64, message: &str) -> Result<String, NavError> {
        if !self.session.contains(tab_id) {
            return Err(NavError::InvalidQuery(format!("no tab {}", tab_id)));
        }
        if self.offline {
            return Err(NavError::NoResults("the travel agent needs a connection".into()));
        }

        self.session.push_turn(tab_id, ChatTurn::user(message));
        let (place, turns) = match self.session.get(tab_id) {
            Some(tab) => {
                let place = match tab.kind {
                    TabKind::Agent => None,
                    _ => Some(tab.title.clone()),
                };
                (place, tab.turns.clone())
            }
            None => (None, Vec::new()),
        };
        let reply = self.agent.chat(place.as_deref(), &turns)?;

        // The tab may close while a reply is in flight; drop the turn
        // rather than resurrecting the tab.
        if self.session.contains(tab_id) {
            self.session.push_turn(tab_id, ChatTurn::assistant(reply.clone()));
        }
        Ok(reply)
    }

    /// Send a tab's queued message to the agent, if one is waiting.
    pub fn flush_initial_message(&mut self, tab_id: u64) -> Result<Option<String>, NavError> {
        match self.session.take_initial_message(tab_id) {
            Some(message) => self.chat(tab_id, &message).map(Some),
            None => Ok(None),
        }
    }

    /// A short narrative over places explored this session. Callers may
    /// supply their own highlights; open tabs are the default.
    pub fn trip_summary(&self, highlights: &[String]) -> Result<String, NavError> {
        let stops: Vec<String> = if highlights.is_empty() {
            self.session
                .tabs()
                .iter()
                .filter(|t| t.kind != TabKind::Agent)
                .map(|t| t.title.clone())
                .collect()
        } else {
            highlights.to_vec()
        };
        if stops.is_empty() {
            return Err(NavError::InvalidQuery("nothing to summarize".into()));
        }
        if self.offline {
            return Err(NavError::NoResults("the travel agent needs a connection".into()));
        }
        let prompt = format!(
            "Write a short, friendly trip summary (3-4 sentences) covering these stops:\n- {}",
            stops.join("\n- ")
        );
        Ok(self.agent.chat(None, &[ChatTurn::user(prompt)])?)
    }

    // ─── Tab management ─────────────────────────────────────────

    pub fn activate_tab(&mut self, id: u64) -> bool {
        self.session.set_active(id)
    }

    pub fn close_tab(&mut self, id: u64) -> bool {
        let closed = self.session.close(id);
        if closed {
            self.globe.remove_marker(id);
        }
        closed
    }
}

fn validate_photo_data_url(data_url: &str) -> Result<(), String> {
    if !data_url.starts_with("data:image/") {
        return Err("photo must be a data:image/... URL".into());
    }
    let Some((_, payload)) = data_url.split_once(";base64,") else {
        return Err("photo data must be base64-encoded".into());
    };
    if payload.is_empty() {
        return Err("photo payload is empty".into());
    }
    // decoded size estimate: 3 bytes per 4 base64 chars
    if payload.len() / 4 * 3 > MAX_PHOTO_BYTES {
        return Err(format!(
            "photo exceeds the {} MB limit",
            MAX_PHOTO_BYTES / (1024 * 1024)
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{Address, PlacePhoto};
    use crate::gazetteer::Gazetteer;
    use crate::globe::HeadlessGlobe;
    use crate::recommend::HeuristicPlanner;
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    // ─── Stubs ──────────────────────────────────────────────────

    struct StubRemote(Option<RemotePlace>);

    impl RemoteResolver for StubRemote {
        fn resolve_place(&self, _: &str) -> Result<Option<RemotePlace>, RemoteError> {
            Ok(self.0.clone())
        }

        fn resolve_photo(&self, _: &str) -> Result<Option<RemotePlace>, RemoteError> {
            Ok(self.0.clone())
        }
    }

    struct PanicRemote;

    impl RemoteResolver for PanicRemote {
        fn resolve_place(&self, query: &str) -> Result<Option<RemotePlace>, RemoteError> {
            panic!("remote resolver consulted for {:?}", query);
        }

        fn resolve_photo(&self, _: &str) -> Result<Option<RemotePlace>, RemoteError> {
            panic!("photo resolver consulted");
        }
    }

    /// Records every query it sees, resolves none of them.
    struct RecordingRemote {
        queries: Arc<Mutex<Vec<String>>>,
    }

    impl RemoteResolver for RecordingRemote {
        fn resolve_place(&self, query: &str) -> Result<Option<RemotePlace>, RemoteError> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(None)
        }

        fn resolve_photo(&self, _: &str) -> Result<Option<RemotePlace>, RemoteError> {
            Ok(None)
        }
    }

    struct StubChat;

    impl ChatAgent for StubChat {
        fn chat(&self, _: Option<&str>, turns: &[ChatTurn]) -> Result<String, RemoteError> {
            Ok(format!("reply #{}", turns.len()))
        }
    }

    /// Remembers which place context each call carried.
    struct ContextSpy {
        seen: Arc<Mutex<Vec<Option<String>>>>,
    }

    impl ChatAgent for ContextSpy {
        fn chat(&self, place: Option<&str>, _: &[ChatTurn]) -> Result<String, RemoteError> {
            self.seen.lock().unwrap().push(place.map(str::to_string));
            Ok("noted".into())
        }
    }

    struct StubGeocoder;

    impl ReverseGeocoder for StubGeocoder {
        fn reverse(&self, _: f64, _: f64) -> Result<Address, RemoteError> {
            Ok(Address {
                label: "Kungsgatan, Stockholm, Sweden".into(),
                city: Some("Stockholm".into()),
                country: Some("Sweden".into()),
                iso_code: Some("SE".into()),
            })
        }
    }

    struct StubNearby {
        queries: Arc<Mutex<Vec<String>>>,
        results: Vec<NearbyPlace>,
    }

    impl NearbySearch for StubNearby {
        fn search(
            &self,
            query: &str,
            _: f64,
            _: f64,
            _: f64,
        ) -> Result<Vec<NearbyPlace>, RemoteError> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(self.results.clone())
        }
    }

    struct StubPhotos;

    impl PhotoLookup for StubPhotos {
        fn photo_for(&self, name: &str) -> Result<Option<PlacePhoto>, RemoteError> {
            Ok(Some(PlacePhoto {
                url: format!("https://photos.test/{}.jpg", name.to_lowercase().replace(' ', "-")),
                thumb_url: None,
                description: None,
            }))
        }
    }

    struct CountingGeolocator {
        calls: Arc<AtomicU32>,
    }

    impl Geolocator for CountingGeolocator {
        fn locate(&self) -> Result<GeoFix, DeviceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(GeoFix {
                lat: 59.3293,
                lng: 18.0686,
                accuracy_m: Some(25.0),
                label: Some("Stockholm".into()),
            })
        }
    }

    fn eiffel() -> RemotePlace {
        RemotePlace {
            name: "Eiffel Tower".into(),
            country: Some("France".into()),
            iso_code: Some("FR".into()),
            lat: 48.8584,
            lng: 2.2945,
            description: Some("Iron lattice tower in Paris".into()),
        }
    }

    fn nearby_place(name: &str) -> NearbyPlace {
        NearbyPlace {
            name: name.into(),
            lat: 59.33,
            lng: 18.07,
            address: None,
            rating: Some(4.5),
            review_count: Some(120),
            price_level: Some(2),
            is_open: Some(true),
            types: vec!["Cafe".into()],
            photo_url: None,
            maps_url: None,
        }
    }

    struct Harness {
        nav: NavController,
        globe: Arc<Mutex<HeadlessGlobe>>,
        geo_calls: Arc<AtomicU32>,
        nearby_queries: Arc<Mutex<Vec<String>>>,
    }

    fn harness_full(remote: Box<dyn RemoteResolver>, chat: Box<dyn ChatAgent>) -> Harness {
        let globe = Arc::new(Mutex::new(HeadlessGlobe::default()));
        let geo_calls = Arc::new(AtomicU32::new(0));
        let nearby_queries = Arc::new(Mutex::new(Vec::new()));
        let collab = Collaborators {
            remote,
            chat,
            geocoder: Box::new(StubGeocoder),
            nearby: Box::new(StubNearby {
                queries: nearby_queries.clone(),
                results: vec![nearby_place("Cafe Uno"), nearby_place("Cafe Duo")],
            }),
            photos: Box::new(StubPhotos),
            geolocator: Box::new(CountingGeolocator { calls: geo_calls.clone() }),
        };
        let nav = NavController::new(
            PlaceResolver::new(Gazetteer::builtin()),
            Box::new(globe.clone()),
            collab,
            RecommendationEngine::new(Box::new(HeuristicPlanner)),
        );
        Harness { nav, globe, geo_calls, nearby_queries }
    }

    fn harness_with_remote(remote: Box<dyn RemoteResolver>) -> Harness {
        harness_full(remote, Box::new(StubChat))
    }

    fn harness() -> Harness {
        harness_with_remote(Box::new(StubRemote(None)))
    }

    // ─── Plain and static flows ─────────────────────────────────

    #[test]
    fn test_country_query_opens_tab_and_flies() {
        let mut h = harness();
        let outcome = h.nav.handle_query("Japan").unwrap();
        let NavOutcome::Tab { id } = outcome else {
            panic!("expected tab outcome");
        };

        let tab = h.nav.session().get(id).unwrap();
        assert_eq!(tab.iso_code.as_deref(), Some("JP"));
        assert_eq!(tab.kind, TabKind::Country);
        assert_eq!(
            tab.photo.as_ref().map(|p| p.url.as_str()),
            Some("https://photos.test/japan.jpg")
        );

        let globe = h.globe.lock().unwrap();
        let flight = globe.last_flight().unwrap();
        assert_relative_eq!(flight.altitude, ALT_COUNTRY);
        assert_relative_eq!(flight.lat, 36.2048, epsilon = 1e-6);
        // the photo is anchored on the globe too
        assert_eq!(globe.markers.len(), 1);
        assert_eq!(globe.markers[0].tab_id, id);
    }

    #[test]
    fn test_region_query_moves_camera_only() {
        let mut h = harness();
        let outcome = h.nav.handle_query("Asia").unwrap();
        assert!(matches!(outcome, NavOutcome::Region { ref name } if name == "asia"));
        assert!(h.nav.session().is_empty());
        assert_eq!(h.globe.lock().unwrap().flights.len(), 1);
    }

    #[test]
    fn test_remote_sub_place_end_to_end() {
        let mut h = harness_with_remote(Box::new(StubRemote(Some(eiffel()))));
        let outcome = h.nav.handle_query("Eiffel Tower").unwrap();
        let NavOutcome::Tab { id } = outcome else {
            panic!("expected tab outcome");
        };

        let tab = h.nav.session().get(id).unwrap();
        assert_eq!(tab.iso_code.as_deref(), Some("FR"));
        assert_eq!(tab.sub_place.as_deref(), Some("Eiffel Tower"));
        assert_eq!(tab.kind, TabKind::SubPlace);

        let globe = h.globe.lock().unwrap();
        let flight = globe.last_flight().unwrap();
        assert_relative_eq!(flight.lat, 48.8584, epsilon = 1e-6);
        assert_relative_eq!(flight.lng, 2.2945, epsilon = 1e-6);
        assert_relative_eq!(flight.altitude, ALT_SUB_PLACE);
    }

    #[test]
    fn test_repeat_query_reuses_tab() {
        let mut h = harness();
        let NavOutcome::Tab { id: first } = h.nav.handle_query("Japan").unwrap() else {
            panic!("expected tab");
        };
        let NavOutcome::Tab { id: second } = h.nav.handle_query("go to japan").unwrap() else {
            panic!("expected tab");
        };
        assert_eq!(first, second);
        assert_eq!(h.nav.session().len(), 1);
    }

    #[test]
    fn test_unresolved_text_becomes_recommendation() {
        let mut h = harness();
        let NavOutcome::Recommended { id } =
            h.nav.handle_query("quiet beaches and great food").unwrap()
        else {
            panic!("expected recommendation");
        };

        let tab = h.nav.session().get(id).unwrap();
        assert!(tab.score.is_some());
        assert_eq!(tab.kind, TabKind::Country);

        let globe = h.globe.lock().unwrap();
        assert_relative_eq!(globe.last_flight().unwrap().altitude, ALT_COUNTRY);
    }

    // ─── Agent flow ─────────────────────────────────────────────

    #[test]
    fn test_comparison_opens_agent_tab_without_camera() {
        let queries = Arc::new(Mutex::new(Vec::new()));
        let mut h = harness_with_remote(Box::new(RecordingRemote { queries: queries.clone() }));
        let raw = "compare Japan and Thailand";
        let NavOutcome::Tab { id } = h.nav.handle_query(raw).unwrap() else {
            panic!("expected tab");
        };

        // the resolver saw the whole sentence, not a normalized fragment
        assert_eq!(queries.lock().unwrap().as_slice(), [raw]);

        let tab = h.nav.session().get(id).unwrap();
        assert_eq!(tab.kind, TabKind::Agent);
        assert_eq!(tab.iso_code, None);
        assert_eq!(tab.initial_message.as_deref(), Some(raw));
        assert!(h.globe.lock().unwrap().flights.is_empty());
        assert_eq!(h.nav.session().len(), 1);
    }

    #[test]
    fn test_question_naming_a_place_opens_its_tab() {
        let mut h = harness_with_remote(Box::new(StubRemote(Some(eiffel()))));
        let raw = "is the eiffel tower worth seeing?";
        let NavOutcome::Tab { id } = h.nav.handle_query(raw).unwrap() else {
            panic!("expected tab");
        };

        let tab = h.nav.session().get(id).unwrap();
        assert_eq!(tab.kind, TabKind::SubPlace);
        // the question follows the tab in and auto-sends on mount
        assert_eq!(tab.initial_message.as_deref(), Some(raw));
        assert_eq!(h.globe.lock().unwrap().flights.len(), 1);
    }

    #[test]
    fn test_chat_records_both_turns() {
        let mut h = harness();
        let NavOutcome::Tab { id } = h.nav.handle_query("plan a week in italy?").unwrap() else {
            panic!("expected tab");
        };
        let reply = h.nav.chat(id, "make it ten days").unwrap();
        // the agent saw exactly one turn, the user message just pushed
        assert_eq!(reply, "reply #1");

        let tab = h.nav.session().get(id).unwrap();
        // initial message still queued, plus the user turn and the reply
        assert_eq!(tab.turns.len(), 2);
        assert_eq!(tab.turns[0].role, crate::collab::Role::User);
        assert_eq!(tab.turns[1].role, crate::collab::Role::Assistant);
    }

    #[test]
    fn test_chat_carries_place_context() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut h = harness_full(
            Box::new(StubRemote(None)),
            Box::new(ContextSpy { seen: seen.clone() }),
        );

        let NavOutcome::Tab { id: japan } = h.nav.handle_query("Japan").unwrap() else {
            panic!("expected tab");
        };
        h.nav.chat(japan, "when is cherry blossom season?").unwrap();

        let NavOutcome::Tab { id: agent } = h.nav.handle_query("compare hostels or hotels").unwrap()
        else {
            panic!("expected tab");
        };
        h.nav.chat(agent, "for two weeks").unwrap();

        assert_eq!(
            seen.lock().unwrap().as_slice(),
            [Some("Japan".to_string()), None]
        );
    }

    #[test]
    fn test_flush_initial_message() {
        let mut h = harness();
        let raw = "best food, rome or tokyo?";
        let NavOutcome::Tab { id } = h.nav.handle_query(raw).unwrap() else {
            panic!("expected tab");
        };
        let reply = h.nav.flush_initial_message(id).unwrap();
        assert!(reply.is_some());

        let tab = h.nav.session().get(id).unwrap();
        assert_eq!(tab.initial_message, None);
        assert_eq!(tab.turns.len(), 2);
        assert_eq!(tab.turns[0].text, raw);

        // nothing queued anymore
        assert_eq!(h.nav.flush_initial_message(id).unwrap(), None);
    }

    #[test]
    fn test_chat_unknown_tab() {
        let mut h = harness();
        assert!(matches!(
            h.nav.chat(99, "hello"),
            Err(NavError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_ask_one_shot() {
        let mut h = harness();
        let reply = h.nav.ask("is october good for nepal?").unwrap();
        assert_eq!(reply, "reply #1");
        assert_eq!(h.nav.session().len(), 1);

        let tab = h.nav.session().active_tab().unwrap();
        assert_eq!(tab.kind, TabKind::Agent);
        assert_eq!(tab.turns.len(), 2);

        // a second question lands in the same tab
        h.nav.ask("and the visa situation?").unwrap();
        assert_eq!(h.nav.session().len(), 1);
        assert_eq!(h.nav.session().active_tab().unwrap().turns.len(), 4);
    }

    #[test]
    fn test_trip_summary() {
        let mut h = harness();
        assert!(matches!(
            h.nav.trip_summary(&[]),
            Err(NavError::InvalidQuery(_))
        ));

        h.nav.handle_query("Japan").unwrap();
        h.nav.handle_query("Peru").unwrap();
        let summary = h.nav.trip_summary(&[]).unwrap();
        assert_eq!(summary, "reply #1");

        h.nav.set_offline(true);
        assert!(matches!(
            h.nav.trip_summary(&[]),
            Err(NavError::NoResults(_))
        ));
    }

    // ─── Gibberish guard ────────────────────────────────────────

    #[test]
    fn test_gibberish_never_reaches_remote() {
        let mut h = harness_with_remote(Box::new(PanicRemote));
        for junk in ["hi", "xyzzqq", "strstr"] {
            let err = h.nav.handle_query(junk).unwrap_err();
            assert!(matches!(err, NavError::InvalidQuery(_)), "{} -> {:?}", junk, err);
            assert!(!err.is_retryable());
        }
        assert!(h.nav.session().is_empty());
    }

    // ─── Device flows ───────────────────────────────────────────

    #[test]
    fn test_near_me_drops_pins_and_caches_fix() {
        let mut h = harness();
        let NavOutcome::Pins { places } = h.nav.handle_query("coffee near me").unwrap() else {
            panic!("expected pins");
        };
        assert_eq!(places.len(), 2);

        // second query inside the TTL reuses the fix
        h.nav.handle_query("coffee near me").unwrap();
        assert_eq!(h.geo_calls.load(Ordering::SeqCst), 1);

        let globe = h.globe.lock().unwrap();
        assert_eq!(globe.pins.len(), 2);
        assert_relative_eq!(globe.last_flight().unwrap().altitude, ALT_PINS);
        assert_eq!(
            h.nearby_queries.lock().unwrap().as_slice(),
            ["coffee", "coffee"]
        );
    }

    #[test]
    fn test_near_me_default_topic() {
        let mut h = harness();
        h.nav.handle_query("near me").unwrap();
        assert_eq!(
            h.nearby_queries.lock().unwrap().last().map(String::as_str),
            Some("tourist attractions")
        );
    }

    #[test]
    fn test_locate_me_names_the_spot() {
        let mut h = harness();
        let NavOutcome::Located { label, fix, tab } = h.nav.handle_query("where am I?").unwrap()
        else {
            panic!("expected located");
        };
        assert_eq!(label, "Kungsgatan, Stockholm, Sweden");
        assert_relative_eq!(fix.lat, 59.3293, epsilon = 1e-6);

        // the geocoded label contains a country the gazetteer knows
        let tab = tab.expect("expected a tab for the locality");
        assert_eq!(h.nav.session().get(tab).unwrap().iso_code.as_deref(), Some("SE"));

        // the camera stays on the fix, not the country centroid
        let globe = h.globe.lock().unwrap();
        assert_eq!(globe.flights.len(), 1);
        assert_relative_eq!(globe.last_flight().unwrap().lat, 59.3293, epsilon = 1e-6);
        assert_relative_eq!(globe.last_flight().unwrap().altitude, ALT_SUB_PLACE);
    }

    #[test]
    fn test_locate_me_shares_fix_cache() {
        let mut h = harness();
        h.nav.handle_query("where am I?").unwrap();
        h.nav.handle_query("bars near me").unwrap();
        assert_eq!(h.geo_calls.load(Ordering::SeqCst), 1);
    }

    // ─── Stale-result guards ────────────────────────────────────

    #[test]
    fn test_photo_enrichment_skipped_for_closed_tab() {
        let mut h = harness();
        let NavOutcome::Tab { id } = h.nav.handle_query("Japan").unwrap() else {
            panic!("expected tab");
        };
        assert!(h.nav.close_tab(id));
        assert!(!h.nav.enrich_photo(id));
        assert!(!h.nav.session().contains(id));
    }

    #[test]
    fn test_close_tab_releases_marker() {
        let mut h = harness();
        let NavOutcome::Tab { id } = h.nav.handle_query("Japan").unwrap() else {
            panic!("expected tab");
        };
        assert_eq!(h.globe.lock().unwrap().markers.len(), 1);
        assert!(h.nav.close_tab(id));
        assert!(h.globe.lock().unwrap().markers.is_empty());
    }

    // ─── Photo input ────────────────────────────────────────────

    #[test]
    fn test_photo_input_opens_tab() {
        let mut h = harness_with_remote(Box::new(StubRemote(Some(eiffel()))));
        let outcome = h.nav.handle_photo("data:image/jpeg;base64,AAAA").unwrap();
        assert!(matches!(outcome, NavOutcome::Tab { .. }));
    }

    #[test]
    fn test_photo_input_validation() {
        let mut h = harness_with_remote(Box::new(PanicRemote));
        assert!(matches!(
            h.nav.handle_photo("https://example.com/pic.jpg"),
            Err(NavError::InvalidQuery(_))
        ));
        assert!(matches!(
            h.nav.handle_photo("data:image/png;base64,"),
            Err(NavError::InvalidQuery(_))
        ));

        let oversized = format!("data:image/jpeg;base64,{}", "A".repeat(14_000_000));
        assert!(matches!(
            h.nav.handle_photo(&oversized),
            Err(NavError::InvalidQuery(_))
        ));
    }

    // ─── Offline mode ───────────────────────────────────────────

    #[test]
    fn test_offline_never_calls_remote() {
        let mut h = harness_with_remote(Box::new(PanicRemote));
        h.nav.set_offline(true);

        // static resolution still works
        let outcome = h.nav.handle_query("Japan").unwrap();
        assert!(matches!(outcome, NavOutcome::Tab { .. }));

        // unresolvable text skips the remote stage and ranks offline
        let outcome = h.nav.handle_query("Eiffel Tower").unwrap();
        assert!(matches!(outcome, NavOutcome::Recommended { .. }));

        // agent questions skip resolution and go straight to the tab
        let outcome = h.nav.handle_query("compare Japan and Thailand").unwrap();
        assert!(matches!(outcome, NavOutcome::Tab { .. }));
    }

    #[test]
    fn test_offline_refuses_photo_and_chat() {
        let mut h = harness();
        let NavOutcome::Tab { id } = h.nav.handle_query("compare a or b").unwrap() else {
            panic!("expected tab");
        };
        h.nav.set_offline(true);
        assert!(matches!(
            h.nav.handle_photo("data:image/png;base64,AAAA"),
            Err(NavError::NoResults(_))
        ));
        assert!(matches!(h.nav.chat(id, "hello"), Err(NavError::NoResults(_))));
    }

    // ─── Country pick and recommendations ───────────────────────

    #[test]
    fn test_open_country_by_code() {
        let mut h = harness();
        let NavOutcome::Tab { id } = h.nav.open_country("pe").unwrap() else {
            panic!("expected tab");
        };
        assert_eq!(h.nav.session().get(id).unwrap().iso_code.as_deref(), Some("PE"));
        assert!(matches!(
            h.nav.open_country("ZZ"),
            Err(NavError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_recommend_smoke() {
        let h = harness();
        let recs = h.nav.recommend("beaches and nightlife on a budget").unwrap();
        assert_eq!(recs.picks.len(), 5);
        for pair in recs.picks.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert!(matches!(
            h.nav.recommend("   "),
            Err(NavError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_resolve_only_has_no_side_effects() {
        let h = harness();
        let resolution = h.nav.resolve_only("let's go to france").unwrap();
        assert!(matches!(resolution, Resolution::Country(ref p) if p.code == "FR"));
        assert!(h.nav.session().is_empty());
        assert!(h.globe.lock().unwrap().flights.is_empty());
    }

    // ─── Error taxonomy ─────────────────────────────────────────

    #[test]
    fn test_retryability() {
        assert!(!NavError::InvalidQuery("x".into()).is_retryable());
        assert!(!NavError::NoResults("x".into()).is_retryable());
        assert!(NavError::Remote(RemoteError::Network("t".into())).is_retryable());
        assert!(!NavError::Remote(RemoteError::Unauthorized("k".into())).is_retryable());
        assert!(!NavError::Remote(RemoteError::MissingKey("K")).is_retryable());
        assert!(NavError::Device(DeviceError::Timeout).is_retryable());
    }
}
