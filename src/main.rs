use base64::Engine;
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use atlasiq::collab::Collaborators;
use atlasiq::config::Settings;
use atlasiq::gazetteer::Gazetteer;
use atlasiq::globe::{CameraTarget, HeadlessGlobe};
use atlasiq::nav::{NavController, NavOutcome, Tab};
use atlasiq::providers::{
    FixedGeolocator, GooglePlacesClient, IpGeolocator, LlmClient, NominatimGeocoder,
    WikipediaPhotos,
};
use atlasiq::recommend::{HeuristicPlanner, RecommendationEngine};
use atlasiq::resolver::PlaceResolver;
use atlasiq::server::{self, ServeOptions};

/// AtlasIQ - the travel engine behind the globe explorer
///
/// Understands free-text travel queries, opens destination tabs, ranks
/// destinations against trip preferences, and identifies places from photos.
///
/// Examples:
///   atlasiq "let's go to japan"
///   atlasiq --query "coffee near me" --lat 59.3293 --lng 18.0686
///   atlasiq --photo vacation.jpg
///   atlasiq --recommend "beaches and nightlife on a budget"
///   atlasiq --chat "is october a good time for nepal?"
///   atlasiq --serve --port 8080
#[derive(Parser)]
#[command(name = "atlasiq", version, about, long_about = None)]
struct Cli {
    /// Travel query (positional). Example: atlasiq "fly to paris"
    #[arg(index = 1)]
    query_positional: Option<String>,

    /// Travel query (named).
    #[arg(long)]
    query: Option<String>,

    /// Identify the place in a photo file and open it.
    #[arg(long)]
    photo: Option<PathBuf>,

    /// Ask the travel agent a one-off question.
    #[arg(long)]
    chat: Option<String>,

    /// Rank destinations against trip preferences.
    #[arg(long)]
    recommend: Option<String>,

    /// Run the HTTP API server.
    #[arg(long)]
    serve: bool,

    /// Server bind host.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server bind port.
    #[arg(long, short = 'p', default_value_t = 8080)]
    port: u16,

    /// Offline mode: built-in data only, no network calls.
    #[arg(long)]
    offline: bool,

    /// Replace the built-in country set with a JSON file.
    #[arg(long)]
    countries: Option<PathBuf>,

    /// Device latitude (-90 to 90), instead of IP geolocation.
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Device longitude (-180 to 180), instead of IP geolocation.
    #[arg(long, allow_hyphen_values = true)]
    lng: Option<f64>,
}

/// One-shot query output: the outcome plus the state a UI would need.
#[derive(Serialize)]
struct QueryReport<'a> {
    outcome: &'a NavOutcome,
    camera: Option<&'a CameraTarget>,
    tabs: &'a [Tab],
}

fn main() {
    let cli = Cli::parse();
    let settings = Settings::from_env();

    // ── Load the gazetteer ──────────────────────────────────────

    let gazetteer = match &cli.countries {
        Some(path) => Gazetteer::from_json_file(path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }),
        None => Gazetteer::builtin(),
    };

    // ── Device position ─────────────────────────────────────────

    let fixed_position = match (cli.lat, cli.lng) {
        (Some(lat), Some(lng)) => {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
                eprintln!("Error: Invalid coordinates. Lat: -90..90, Lng: -180..180");
                std::process::exit(1);
            }
            Some((lat, lng))
        }
        (None, None) => None,
        _ => {
            eprintln!("Error: Provide both --lat and --lng, or neither.");
            std::process::exit(1);
        }
    };

    // ── Server mode ─────────────────────────────────────────────

    if cli.serve {
        let options = ServeOptions {
            settings,
            gazetteer,
            offline: cli.offline,
            fixed_position,
        };
        let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("Error: Cannot start runtime: {}", e);
            std::process::exit(1);
        });
        runtime.block_on(server::start(&cli.host, cli.port, options));
        return;
    }

    // ── One-shot commands ───────────────────────────────────────

    let globe = Arc::new(Mutex::new(HeadlessGlobe::default()));
    let mut nav = build_controller(&settings, gazetteer, fixed_position, cli.offline, globe.clone());
    nav.set_offline(cli.offline);

    if let Some(path) = &cli.photo {
        let data_url = photo_data_url(path);
        let outcome = nav.handle_photo(&data_url).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });
        print_report(&nav, &globe, &outcome);
        return;
    }

    if let Some(preferences) = &cli.recommend {
        let recs = nav.recommend(preferences).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });
        if let Some(summary) = &recs.summary {
            eprintln!("  {}", summary);
        }
        println!("{}", serde_json::to_string_pretty(&recs).unwrap());
        return;
    }

    if let Some(question) = &cli.chat {
        let reply = nav.ask(question).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });
        println!("{}", reply);
        return;
    }

    if let Some(query) = cli.query.as_ref().or(cli.query_positional.as_ref()) {
        let outcome = nav.handle_query(query).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });
        print_report(&nav, &globe, &outcome);
        return;
    }

    // ── Nothing to do ───────────────────────────────────────────

    eprintln!("Error: No query specified.");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  atlasiq \"let's go to japan\"");
    eprintln!("  atlasiq --query \"coffee near me\" --lat 59.3293 --lng 18.0686");
    eprintln!("  atlasiq --photo vacation.jpg");
    eprintln!("  atlasiq --recommend \"beaches and nightlife on a budget\"");
    eprintln!("  atlasiq --chat \"is october a good time for nepal?\"");
    eprintln!("  atlasiq --serve");
    std::process::exit(1);
}

fn build_controller(
    settings: &Settings,
    gazetteer: Gazetteer,
    fixed_position: Option<(f64, f64)>,
    offline: bool,
    globe: Arc<Mutex<HeadlessGlobe>>,
) -> NavController {
    let collab = Collaborators {
        remote: Box::new(LlmClient::new(settings)),
        chat: Box::new(LlmClient::new(settings)),
        geocoder: Box::new(NominatimGeocoder),
        nearby: Box::new(GooglePlacesClient::new(settings)),
        photos: Box::new(WikipediaPhotos),
        geolocator: match fixed_position {
            Some((lat, lng)) => Box::new(FixedGeolocator { lat, lng, label: None }),
            None => Box::new(IpGeolocator),
        },
    };
    // The language-model planner cannot answer offline or without a key.
    let engine = if offline || settings.openrouter_api_key.is_empty() {
        RecommendationEngine::new(Box::new(HeuristicPlanner))
    } else {
        RecommendationEngine::new(Box::new(LlmClient::new(settings)))
    };
    NavController::new(PlaceResolver::new(gazetteer), Box::new(globe), collab, engine)
}

/// Read an image file into the `data:` URL the resolver expects.
fn photo_data_url(path: &Path) -> String {
    let bytes = std::fs::read(path).unwrap_or_else(|e| {
        eprintln!("Error: Cannot read {}: {}", path.display(), e);
        std::process::exit(1);
    });
    let mime = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    };
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(&bytes)
    )
}

fn print_report(nav: &NavController, globe: &Arc<Mutex<HeadlessGlobe>>, outcome: &NavOutcome) {
    // Banner to stderr, JSON to stdout.
    match outcome {
        NavOutcome::Region { name } => eprintln!("  Camera over {}", name),
        NavOutcome::Tab { id } => {
            if let Some(tab) = nav.session().get(*id) {
                match &tab.iso_code {
                    Some(code) => eprintln!("  Opened {} ({})", tab.title, code),
                    None => eprintln!("  Opened {}", tab.title),
                }
            }
        }
        NavOutcome::Recommended { id } => {
            if let Some(tab) = nav.session().get(*id) {
                match tab.score {
                    Some(score) => eprintln!("  Recommended {} ({:.2})", tab.title, score),
                    None => eprintln!("  Recommended {}", tab.title),
                }
            }
        }
        NavOutcome::Pins { places } => eprintln!("  {} places nearby", places.len()),
        NavOutcome::Located { label, .. } => eprintln!("  You are near {}", label),
    }

    let globe = globe.lock().unwrap();
    let report = QueryReport {
        outcome,
        camera: globe.last_flight(),
        tabs: nav.session().tabs(),
    };
    println!("{}", serde_json::to_string_pretty(&report).unwrap());
}
