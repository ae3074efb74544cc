//! OpenRouter-backed language model client.
//!
//! One client serves three seams: place resolution (text and photo), trip
//! planning, and the travel-agent chat. Replies are requested as bare JSON
//! where structure matters; a malformed reply gets echoed back to the model
//! once with the parse error before giving up.

use crate::collab::{
    ChatAgent, ChatTurn, PlanWeights, RemoteError, RemotePlace, RemoteResolver, TripPlanner,
};
use crate::config::{Settings, FALLBACK_MODELS};
use crate::gazetteer::Place;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Attempts per structured request, including the retry with parse feedback.
const PARSE_ATTEMPTS: usize = 2;

const RESOLVE_PROMPT: &str = "\
You identify the place a travel query refers to. Reply with only a JSON \
object, no prose, shaped like: {\"name\": \"Eiffel Tower\", \"country\": \
\"France\", \"iso_code\": \"FR\", \"lat\": 48.8584, \"lng\": 2.2945, \
\"description\": \"one sentence\"}. For a country, name and country are the \
same. If the query names no real place, reply {\"name\": null}.";

const PHOTO_PROMPT: &str = "\
Identify the place shown in this photo. Reply with only a JSON object \
shaped like: {\"name\": \"Eiffel Tower\", \"country\": \"France\", \
\"iso_code\": \"FR\", \"lat\": 48.8584, \"lng\": 2.2945, \"description\": \
\"one sentence\"}. If you cannot recognize a specific place, reply \
{\"name\": null}.";

const PLAN_PROMPT: &str = "\
You turn trip preferences into scoring weights. Reply with only a JSON \
object: {\"weights\": {\"<field>\": <number>}, \"climate\": \"tropical\"|\
\"temperate\"|\"continental\"|\"arid\"|null, \"rationale\": \"one \
sentence\"}. Fields: safety_index, beach_score, nightlife_score, \
cost_of_living, sightseeing_score, cultural_score, adventure_score, \
food_score, infrastructure_score. Weights range -1 to 1; negative means \
avoid. Include only fields the preferences speak to.";

const CHAT_PROMPT: &str = "\
You are AtlasIQ's travel agent. Answer travel questions concisely and \
concretely. Prefer short paragraphs over lists unless the user asks for a \
ranking.";

pub struct LlmClient {
    api_key: String,
    base_url: String,
    model: String,
    vision_model: String,
}

impl LlmClient {
    pub fn new(settings: &Settings) -> Self {
        Self {
            api_key: settings.openrouter_api_key.clone(),
            base_url: settings.openrouter_base_url.clone(),
            model: settings.model.clone(),
            vision_model: settings.vision_model.clone(),
        }
    }

    fn require_key(&self) -> Result<&str, RemoteError> {
        if self.api_key.is_empty() {
            return Err(RemoteError::MissingKey("OPENROUTER_API_KEY"));
        }
        Ok(&self.api_key)
    }

    /// One completion call against a specific model.
    fn completion_once(&self, model: &str, messages: &[Value]) -> Result<String, RemoteError> {
        let key = self.require_key()?;
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let result = ureq::post(&url)
            .set("Authorization", &format!("Bearer {}", key))
            .set("Content-Type", "application/json")
            .timeout(REQUEST_TIMEOUT)
            .send_json(json!({
                "model": model,
                "messages": messages,
            }));

        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(status @ (401 | 403), response)) => {
                let body = response.into_string().unwrap_or_default();
                return Err(RemoteError::Unauthorized(format!("HTTP {}: {}", status, body)));
            }
            Err(ureq::Error::Status(status, response)) => {
                return Err(RemoteError::Http {
                    status,
                    body: response.into_string().unwrap_or_default(),
                });
            }
            Err(e) => return Err(RemoteError::Network(e.to_string())),
        };

        let body: Value = response
            .into_json()
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))?;
        extract_content(&body)
    }

    /// Completion with rate-limit fallback: a 429 on the requested model
    /// walks the free fallback list before giving up.
    fn completion(&self, model: &str, messages: &[Value]) -> Result<String, RemoteError> {
        match self.completion_once(model, messages) {
            Err(RemoteError::Http { status: 429, .. }) => {
                for fallback in FALLBACK_MODELS {
                    if *fallback == model {
                        continue;
                    }
                    match self.completion_once(fallback, messages) {
                        Err(RemoteError::Http { status: 429, .. }) => continue,
                        other => return other,
                    }
                }
                Err(RemoteError::Http {
                    status: 429,
                    body: "all models rate-limited".into(),
                })
            }
            other => other,
        }
    }

    /// Ask for JSON, re-prompting once with the parse error on failure.
    fn structured<T>(
        &self,
        model: &str,
        mut messages: Vec<Value>,
        parse: impl Fn(&str) -> Result<T, String>,
    ) -> Result<T, RemoteError> {
        let mut last_problem = String::new();
        for _ in 0..PARSE_ATTEMPTS {
            let reply = self.completion(model, &messages)?;
            match parse(&reply) {
                Ok(value) => return Ok(value),
                Err(problem) => {
                    messages.push(json!({"role": "assistant", "content": reply}));
                    messages.push(json!({
                        "role": "user",
                        "content": format!(
                            "That reply could not be parsed: {}. Answer again with only the JSON object.",
                            problem
                        ),
                    }));
                    last_problem = problem;
                }
            }
        }
        Err(RemoteError::InvalidResponse(last_problem))
    }
}

// ─── Reply parsing ──────────────────────────────────────────────

fn extract_content(body: &Value) -> Result<String, RemoteError> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| RemoteError::InvalidResponse("no message content in reply".into()))
}

/// Models love fencing JSON in markdown. Unwrap it.
fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // the opening fence may carry a language tag
    let rest = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest,
    };
    rest.trim().trim_end_matches("```").trim()
}

#[derive(Deserialize)]
struct PlaceReply {
    name: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    iso_code: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lng: Option<f64>,
    #[serde(default)]
    description: Option<String>,
}

fn parse_place_reply(reply: &str) -> Result<Option<RemotePlace>, String> {
    let parsed: PlaceReply =
        serde_json::from_str(strip_code_fences(reply)).map_err(|e| e.to_string())?;
    let Some(name) = parsed.name else {
        return Ok(None);
    };
    let lat = parsed.lat.ok_or("missing lat")?;
    let lng = parsed.lng.ok_or("missing lng")?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(format!("coordinates out of range: {}, {}", lat, lng));
    }
    Ok(Some(RemotePlace {
        name,
        country: parsed.country.filter(|c| !c.trim().is_empty()),
        // models answer "" for places without a country
        iso_code: parsed.iso_code.filter(|c| !c.trim().is_empty()),
        lat,
        lng,
        description: parsed.description,
    }))
}

fn parse_plan_reply(reply: &str) -> Result<PlanWeights, String> {
    let plan: PlanWeights =
        serde_json::from_str(strip_code_fences(reply)).map_err(|e| e.to_string())?;
    if plan.weights.is_empty() {
        return Err("weights object is empty".into());
    }
    Ok(plan)
}

fn turns_to_messages(place: Option<&str>, turns: &[ChatTurn]) -> Vec<Value> {
    let system = match place {
        Some(place) => format!(
            "{}\nThe traveller is currently looking at {}; answer with that place in mind.",
            CHAT_PROMPT, place
        ),
        None => CHAT_PROMPT.to_string(),
    };
    let mut messages = Vec::with_capacity(turns.len() + 1);
    messages.push(json!({"role": "system", "content": system}));
    for turn in turns {
        messages.push(json!({"role": turn.role.as_str(), "content": turn.text}));
    }
    messages
}

// ─── Trait impls ────────────────────────────────────────────────

impl RemoteResolver for LlmClient {
    fn resolve_place(&self, query: &str) -> Result<Option<RemotePlace>, RemoteError> {
        let messages = vec![
            json!({"role": "system", "content": RESOLVE_PROMPT}),
            json!({"role": "user", "content": query}),
        ];
        self.structured(&self.model, messages, parse_place_reply)
    }

    fn resolve_photo(&self, data_url: &str) -> Result<Option<RemotePlace>, RemoteError> {
        let messages = vec![json!({
            "role": "user",
            "content": [
                {"type": "text", "text": PHOTO_PROMPT},
                {"type": "image_url", "image_url": {"url": data_url}},
            ],
        })];
        self.structured(&self.vision_model, messages, parse_place_reply)
    }
}

impl TripPlanner for LlmClient {
    fn plan(&self, preferences: &str) -> Result<PlanWeights, RemoteError> {
        let messages = vec![
            json!({"role": "system", "content": PLAN_PROMPT}),
            json!({"role": "user", "content": preferences}),
        ];
        self.structured(&self.model, messages, parse_plan_reply)
    }

    fn insight(&self, preferences: &str, place: &Place) -> Result<Option<String>, RemoteError> {
        let prompt = format!(
            "A traveller wants: {}. In one sentence, why does {} fit? Reply with the sentence only.",
            preferences, place.name
        );
        let messages = vec![json!({"role": "user", "content": prompt})];
        let reply = self.completion(&self.model, &messages)?;
        let text = reply.trim();
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(text.to_string()))
    }

    fn summarize(
        &self,
        preferences: &str,
        ranked: &[(String, f64)],
    ) -> Result<Option<String>, RemoteError> {
        if ranked.is_empty() {
            return Ok(None);
        }
        let listing = ranked
            .iter()
            .map(|(name, score)| format!("{} ({:.2})", name, score))
            .collect::<Vec<_>>()
            .join(", ");
        let prompt = format!(
            "A traveller wants: {}. The ranked shortlist is: {}. Sum up the shortlist in two sentences.",
            preferences, listing
        );
        let messages = vec![json!({"role": "user", "content": prompt})];
        let reply = self.completion(&self.model, &messages)?;
        let text = reply.trim();
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(text.to_string()))
    }
}

impl ChatAgent for LlmClient {
    fn chat(&self, place: Option<&str>, turns: &[ChatTurn]) -> Result<String, RemoteError> {
        self.completion(&self.model, &turns_to_messages(place, turns))
    }
}
