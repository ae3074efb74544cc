//! Ordered intent classification.
//!
//! Categories are checked most-specific first: proximity ("near me") beats
//! self-location, which beats open-ended agent questions, and anything left
//! is treated as a plain place query. A question mark alone is enough to
//! route a query to the agent.

use super::normalize::normalize;

/// What the user is asking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryIntent {
    /// Things around the user's position. `topic` is the category fragment
    /// before the proximity marker; may be empty.
    NearMe { topic: String },
    /// Show the user where they currently are.
    LocateMe,
    /// Open-ended question, comparison, or trip-planning talk.
    AgentQuery,
    /// Candidate place name for the resolution chain.
    Plain,
}

const NEAR_MARKERS: &[&str] = &["near me", "around me", "close to me", "close by", "nearby"];

const LOCATE_PHRASES: &[&str] = &[
    "where am i",
    "locate me",
    "find me",
    "find my location",
    "show my location",
];

// A query whose first word is one of these reads as a question or a ranking
// request, not a destination.
const LEADING_WORDS: &[&str] = &[
    "which", "what", "how", "why", "who", "where", "when", "is", "are", "do", "does", "can",
    "should", "rank", "list", "top", "best", "worst", "safest", "cheapest", "recommend",
    "suggest", "plan",
];

const COMPARISON_MARKERS: &[&str] = &[" vs ", " vs. ", " versus ", " compared to ", " or "];

const TRAVEL_WORDS: &[&str] = &[
    "itinerary", "trip", "travel", "visa", "budget", "flight", "hotel", "honeymoon",
    "backpacking", "weather", "vacation", "holiday", "ideas",
];

const PLACE_PATTERNS: &[&str] = &[
    "restaurants in",
    "things to do",
    "museums in",
    "beaches in",
    "bars in",
    "cafes in",
    "hotels in",
    "food in",
    "attractions in",
];

pub fn classify(input: &str) -> QueryIntent {
    let q = input.trim().to_lowercase();
    if q.is_empty() {
        return QueryIntent::Plain;
    }

    // 1. Proximity
    for marker in NEAR_MARKERS {
        if let Some(idx) = q.find(marker) {
            let topic = normalize(q[..idx].trim());
            return QueryIntent::NearMe { topic };
        }
    }

    // 2. Self-location
    let bare = q.trim_end_matches(['?', '!', '.']).trim();
    if LOCATE_PHRASES.contains(&bare)
        || bare.starts_with("where am i")
        || bare.contains("my location")
        || bare.contains("current location")
    {
        return QueryIntent::LocateMe;
    }

    // 3. Agent territory
    if is_agent_query(&q) {
        return QueryIntent::AgentQuery;
    }

    QueryIntent::Plain
}

fn is_agent_query(q: &str) -> bool {
    if q.ends_with('?') || q.starts_with("compare ") {
        return true;
    }
    if COMPARISON_MARKERS.iter().any(|m| q.contains(m)) {
        return true;
    }
    let first_word = q
        .split(|c: char| !c.is_alphanumeric())
        .find(|w| !w.is_empty())
        .unwrap_or("");
    if LEADING_WORDS.contains(&first_word) {
        return true;
    }
    TRAVEL_WORDS.iter().any(|w| q.contains(w)) || PLACE_PATTERNS.iter().any(|p| q.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_near_me_with_topic() {
        assert_eq!(
            classify("restaurants near me"),
            QueryIntent::NearMe { topic: "restaurants".into() }
        );
        assert_eq!(
            classify("show me cafes around me"),
            QueryIntent::NearMe { topic: "cafes".into() }
        );
    }

    #[test]
    fn test_near_me_empty_topic() {
        assert_eq!(classify("near me"), QueryIntent::NearMe { topic: String::new() });
    }

    #[test]
    fn test_near_me_beats_question_mark() {
        // proximity outranks the agent even when phrased as a question
        assert_eq!(
            classify("what's good near me?"),
            QueryIntent::NearMe { topic: "what's good".into() }
        );
    }

    #[test]
    fn test_locate_me() {
        assert_eq!(classify("where am I"), QueryIntent::LocateMe);
        assert_eq!(classify("Where am I right now?"), QueryIntent::LocateMe);
        assert_eq!(classify("locate me"), QueryIntent::LocateMe);
        assert_eq!(classify("what is my location"), QueryIntent::LocateMe);
    }

    #[test]
    fn test_question_mark_routes_to_agent() {
        assert_eq!(classify("Tokyo?"), QueryIntent::AgentQuery);
        assert_eq!(classify("is bali expensive?"), QueryIntent::AgentQuery);
    }

    #[test]
    fn test_comparison_routes_to_agent() {
        assert_eq!(classify("compare Japan and Thailand"), QueryIntent::AgentQuery);
        assert_eq!(classify("portugal vs spain"), QueryIntent::AgentQuery);
        assert_eq!(classify("greece or croatia"), QueryIntent::AgentQuery);
    }

    #[test]
    fn test_leading_word_routes_to_agent() {
        assert_eq!(classify("which country has the best food"), QueryIntent::AgentQuery);
        assert_eq!(classify("safest countries in south america"), QueryIntent::AgentQuery);
        assert_eq!(classify("top beaches in asia"), QueryIntent::AgentQuery);
        assert_eq!(classify("what's the cheapest month to fly"), QueryIntent::AgentQuery);
    }

    #[test]
    fn test_travel_topics_route_to_agent() {
        assert_eq!(classify("5 day itinerary for rome"), QueryIntent::AgentQuery);
        assert_eq!(classify("weather in tokyo"), QueryIntent::AgentQuery);
        assert_eq!(classify("things to do in lisbon"), QueryIntent::AgentQuery);
    }

    #[test]
    fn test_plain_place_queries() {
        assert_eq!(classify("japan"), QueryIntent::Plain);
        assert_eq!(classify("Eiffel Tower"), QueryIntent::Plain);
        assert_eq!(classify("let's go to paris"), QueryIntent::Plain);
        assert_eq!(classify("french polynesia"), QueryIntent::Plain);
    }

    #[test]
    fn test_empty_is_plain() {
        assert_eq!(classify(""), QueryIntent::Plain);
        assert_eq!(classify("   "), QueryIntent::Plain);
    }
}
