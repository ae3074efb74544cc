//! Environment-driven settings.
//!
//! Nothing here is required at startup: missing keys only disable the
//! providers that need them, so offline and test runs work with an empty
//! environment.

use std::env;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default chat/resolution model on OpenRouter.
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Default model for photo recognition.
pub const DEFAULT_VISION_MODEL: &str = "meta-llama/llama-3.2-90b-vision-instruct";

/// Models tried in order when the primary model is rate-limited (HTTP 429).
pub const FALLBACK_MODELS: &[&str] = &[
    "google/gemma-3-27b-it:free",
    "mistralai/mistral-small-3.1-24b-instruct:free",
    "meta-llama/llama-3.3-70b-instruct:free",
];

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub openrouter_api_key: String,
    pub openrouter_base_url: String,
    pub model: String,
    pub vision_model: String,
    pub google_places_api_key: String,
    pub cache_ttl_secs: u64,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            openrouter_api_key: env::var("OPENROUTER_API_KEY").unwrap_or_default(),
            openrouter_base_url: env::var("OPENROUTER_BASE_URL")
                .unwrap_or_else(|_| "https://openrouter.ai/api/v1".into()),
            model: env::var("ATLASIQ_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
            vision_model: env::var("ATLASIQ_VISION_MODEL")
                .unwrap_or_else(|_| DEFAULT_VISION_MODEL.into()),
            google_places_api_key: env::var("GOOGLE_PLACES_API_KEY").unwrap_or_default(),
            cache_ttl_secs: env::var("ATLASIQ_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
        }
    }
}
