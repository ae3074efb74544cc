use crate::cache::TtlCache;
use crate::collab::{Collaborators, NearbyPlace};
use crate::config::Settings;
use crate::gazetteer::Gazetteer;
use crate::globe::HeadlessGlobe;
use crate::nav::NavController;
use crate::providers::{
    CurrentWeather, FixedGeolocator, GooglePlacesClient, IpGeolocator, LlmClient,
    NominatimGeocoder, OpenMeteoClient, WikipediaPhotos,
};
use crate::recommend::{HeuristicPlanner, RecommendationEngine, Recommendations};
use crate::resolver::{PlaceResolver, Resolution};
use crate::server::ServeOptions;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Nearby and weather lookups change slowly; cache them longer than
/// resolutions.
const POI_CACHE_TTL_SECS: u64 = 600;

pub struct AppState {
    pub nav: Mutex<NavController>,
    pub globe: Arc<Mutex<HeadlessGlobe>>,
    pub resolve_cache: Mutex<TtlCache<Resolution>>,
    pub nearby_cache: Mutex<TtlCache<Vec<NearbyPlace>>>,
    pub weather_cache: Mutex<TtlCache<CurrentWeather>>,
    pub recs_cache: Mutex<TtlCache<Recommendations>>,
    pub weather: OpenMeteoClient,
    pub started: Instant,
    pub offline: bool,
}

pub fn build(options: ServeOptions) -> Arc<AppState> {
    let ServeOptions { settings, gazetteer, offline, fixed_position } = options;

    let globe = Arc::new(Mutex::new(HeadlessGlobe::default()));
    let collab = Collaborators {
        remote: Box::new(LlmClient::new(&settings)),
        chat: Box::new(LlmClient::new(&settings)),
        geocoder: Box::new(NominatimGeocoder),
        nearby: Box::new(GooglePlacesClient::new(&settings)),
        photos: Box::new(WikipediaPhotos),
        geolocator: match fixed_position {
            Some((lat, lng)) => Box::new(FixedGeolocator { lat, lng, label: None }),
            None => Box::new(IpGeolocator),
        },
    };

    // Without a key the language-model planner can never answer; fall back
    // to the keyword heuristic.
    let engine = if offline || settings.openrouter_api_key.is_empty() {
        RecommendationEngine::new(Box::new(HeuristicPlanner))
    } else {
        RecommendationEngine::new(Box::new(LlmClient::new(&settings)))
    };

    let mut nav = NavController::new(
        PlaceResolver::new(gazetteer),
        Box::new(globe.clone()),
        collab,
        engine,
    );
    nav.set_offline(offline);

    Arc::new(AppState {
        nav: Mutex::new(nav),
        globe,
        resolve_cache: Mutex::new(TtlCache::with_ttl_secs(settings.cache_ttl_secs)),
        nearby_cache: Mutex::new(TtlCache::with_ttl_secs(POI_CACHE_TTL_SECS)),
        weather_cache: Mutex::new(TtlCache::with_ttl_secs(POI_CACHE_TTL_SECS)),
        recs_cache: Mutex::new(TtlCache::with_ttl_secs(POI_CACHE_TTL_SECS)),
        weather: OpenMeteoClient,
        started: Instant::now(),
        offline,
    })
}
