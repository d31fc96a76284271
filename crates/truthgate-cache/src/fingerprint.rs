//! Semantic query fingerprints.
//!
//! lowercase → strip punctuation per token → drop stop words → drop empty
//! tokens → sort → join. Sorting makes the key commutative over word order,
//! so "weather paris" and "What's the weather in Paris?" share one entry.
//! Word-order semantics are lost; "dog bites man" collides with
//! "man bites dog".

/// Separator between sorted tokens.
pub const TOKEN_DELIMITER: &str = "_";

const STOP_WORDS: &[&str] = &[
    "a", "about", "an", "and", "any", "are", "as", "at", "be", "been", "by", "can", "could", "did",
    "do", "does", "for", "from", "give", "has", "have", "hey", "how", "hows", "i", "im", "in", "is",
    "it", "its", "know", "let", "lets", "me", "my", "of", "on", "or", "please", "show", "so",
    "tell", "that", "thats", "the", "there", "theres", "this", "to", "was", "were", "what",
    "whats", "when", "whens", "where", "wheres", "which", "who", "whos", "will", "with", "would",
    "you", "your",
];

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.binary_search(&token).is_ok()
}

/// Normalise `query` into its order-independent cache key.
///
/// Returns an empty string when nothing meaningful is left; the cache treats
/// that as an invalid key.
pub fn fingerprint(query: &str) -> String {
    let mut tokens: Vec<String> = query
        .split_whitespace()
        .map(|raw| {
            raw.chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|token| !token.is_empty() && !is_stop_word(token))
        .collect();

    tokens.sort_unstable();
    tokens.join(TOKEN_DELIMITER)
}

#[cfg(test)]
mod tests {
    use super::{fingerprint, STOP_WORDS};

    #[test]
    fn stop_word_list_is_sorted_for_binary_search() {
        let mut sorted = STOP_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, STOP_WORDS);
    }

    #[test]
    fn paraphrase_collides() {
        assert_eq!(fingerprint("What's the weather in Paris?"), fingerprint("weather paris"));
        assert_eq!(fingerprint("weather paris"), "paris_weather");
    }

    #[test]
    fn word_order_is_irrelevant() {
        let base = fingerprint("bitcoin price usd");
        for permuted in ["usd bitcoin price", "price usd bitcoin", "usd price bitcoin"] {
            assert_eq!(fingerprint(permuted), base);
        }
    }

    #[test]
    fn punctuation_and_case_are_ignored() {
        assert_eq!(fingerprint("BITCOIN, price!!"), fingerprint("bitcoin price"));
    }

    #[test]
    fn only_stop_words_yields_empty_key() {
        assert_eq!(fingerprint("what is the"), "");
        assert_eq!(fingerprint("   ?! "), "");
    }
}
