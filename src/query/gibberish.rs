//! Gibberish guard for plain queries.
//!
//! Blocks obvious non-places (greetings, keyboard mash) from reaching the
//! remote resolver. Static lookups still run: the guard only exists to save
//! a network round-trip that cannot succeed.

const BLOCKED: &[&str] = &[
    "hi", "hello", "hey", "ok", "okay", "yes", "no", "thanks", "thank you", "thankyou",
    "test", "asdf", "qwerty", "lol", "hmm", "huh", "yo", "sup", "bye", "idk",
];

const MIN_LETTERS: usize = 3;
const MAX_CONSONANT_RUN: usize = 6;

/// True when the text cannot plausibly name a place.
pub fn looks_like_gibberish(input: &str) -> bool {
    let q = input.trim().to_lowercase();
    if BLOCKED.contains(&q.as_str()) {
        return true;
    }

    let letters: Vec<char> = q.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() < MIN_LETTERS {
        return true;
    }

    if !letters.iter().any(|c| is_vowel(*c)) {
        return true;
    }

    // Long consonant runs do not occur in place names; count within words so
    // word boundaries reset the run.
    let mut run = 0usize;
    for c in q.chars() {
        if c.is_alphabetic() && !is_vowel(c) {
            run += 1;
            if run >= MAX_CONSONANT_RUN {
                return true;
            }
        } else {
            run = 0;
        }
    }

    false
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_words() {
        assert!(looks_like_gibberish("hi"));
        assert!(looks_like_gibberish("  Hello "));
        assert!(looks_like_gibberish("thanks"));
        assert!(looks_like_gibberish("asdf"));
    }

    #[test]
    fn test_too_few_letters() {
        assert!(looks_like_gibberish(""));
        assert!(looks_like_gibberish("a"));
        assert!(looks_like_gibberish("1234"));
        assert!(looks_like_gibberish("b c"));
    }

    #[test]
    fn test_no_vowels() {
        assert!(looks_like_gibberish("xyzzqq"));
        assert!(looks_like_gibberish("strstr"));
    }

    #[test]
    fn test_consonant_run() {
        assert!(looks_like_gibberish("abcdfghjk"));
    }

    #[test]
    fn test_real_places_pass() {
        assert!(!looks_like_gibberish("Tokyo"));
        assert!(!looks_like_gibberish("france"));
        assert!(!looks_like_gibberish("eiffel tower"));
        assert!(!looks_like_gibberish("reykjavik"));
        // an honest edge: lots of consonants but legitimate
        assert!(!looks_like_gibberish("brno"));
    }
}
