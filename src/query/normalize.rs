//! Conversational-prefix stripping.

// Longer phrases come before their own prefixes ("search for " before
// "search ") so the most specific phrase wins.
const PREFIXES: &[&str] = &[
    "let's go to ",
    "lets go to ",
    "i want to visit ",
    "i want to go to ",
    "take me to ",
    "tell me about ",
    "navigate to ",
    "show me ",
    "fly to ",
    "go to ",
    "search for ",
    "search ",
    "visit ",
    "explore ",
    "find ",
];

/// Lowercase, trim, and strip at most one conversational prefix.
///
/// Applying the function twice gives the same result as applying it once:
/// a stripped query is already lowercase and starts with the place text.
pub fn normalize(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    for prefix in PREFIXES {
        if let Some(rest) = lowered.strip_prefix(prefix) {
            return rest.trim().to_string();
        }
    }
    lowered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_prefix_and_case() {
        assert_eq!(normalize("Let's go to Paris"), "paris");
        assert_eq!(normalize("  Take me to Tokyo  "), "tokyo");
        assert_eq!(normalize("SHOW ME iceland"), "iceland");
        assert_eq!(normalize("i want to visit New Zealand"), "new zealand");
    }

    #[test]
    fn test_plain_input_untouched() {
        assert_eq!(normalize("japan"), "japan");
        assert_eq!(normalize("Eiffel Tower"), "eiffel tower");
    }

    #[test]
    fn test_strips_at_most_one_prefix() {
        // only the outermost phrase is removed
        assert_eq!(normalize("show me go to paris"), "go to paris");
    }

    #[test]
    fn test_longest_phrase_wins() {
        assert_eq!(normalize("search for italy"), "italy");
        assert_eq!(normalize("search italy"), "italy");
    }

    #[test]
    fn test_idempotent() {
        for input in [
            "Let's go to Paris",
            "Fiji",
            "  Explore   the Alps ",
            "find France",
            "japan",
        ] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }
}
