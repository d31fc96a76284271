//! Conversational query → search string.
//!
//! Strips filler openers ("hey, can you tell me ...") and reported-speech
//! prefixes ("I heard that ..."). Long inputs are reduced to a quoted
//! substring, else a subject-verb-object clause, else a word-boundary cut.

use std::sync::LazyLock;

use regex::Regex;

static FILLER_OPENER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(hey|hi|hello|ok|okay|so|um|uh|well|please|quick question|can you (tell me|check|look up|find out)?|could you (tell me|check|look up|find out)?|would you (tell me|check)?|tell me|do you know|i want to know|i'?d like to know|i wonder|i was wondering)\b[\s,:;!-]*",
    )
    .unwrap()
});

static REPORTED_SPEECH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(i (heard|read|saw)( somewhere)?( that)?|someone (told|said to) me( that)?|my \w+ (told me|said)( that)?|is it true( that)?|apparently,?|rumou?r has it( that)?)\b[\s,:]*",
    )
    .unwrap()
});

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["“]([^"”]{3,}?)["”]"#).unwrap());

static SUBJECT_VERB_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b([A-Z][\w'&.-]*(?:\s+[A-Z][\w'&.-]*)*)\s+(is|was|has|have|had|will|did|does|announced|said|won|lost|died|resigned|signed|launched|raised|cut|banned|approved|acquired|fired)\s+([^.?!;]{1,60})",
    )
    .unwrap()
});

/// Clean `query` into a search string of at most `max_chars` characters.
pub fn clean_search_query(query: &str, max_chars: usize) -> String {
    let mut text = normalize_whitespace(query);

    // Openers can stack: "Hey, so I heard that ..."
    loop {
        let before = text.len();
        text = FILLER_OPENER.replace(&text, "").into_owned();
        text = REPORTED_SPEECH.replace(&text, "").into_owned();
        if text.len() == before {
            break;
        }
    }

    let text = text
        .trim()
        .trim_end_matches(|c: char| matches!(c, '?' | '!' | '.'))
        .trim()
        .to_string();
    if text.chars().count() <= max_chars {
        return text;
    }

    if let Some(quoted) = QUOTED
        .captures(&text)
        .map(|c| c[1].trim().to_string())
        .filter(|q| q.chars().count() <= max_chars)
    {
        return quoted;
    }

    if let Some(clause) = SUBJECT_VERB_OBJECT
        .find(&text)
        .map(|m| m.as_str().trim().to_string())
        .filter(|c| c.chars().count() <= max_chars)
    {
        return clause;
    }

    cut_at_word_boundary(&text, max_chars)
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn cut_at_word_boundary(text: &str, max_chars: usize) -> String {
    let mut out = String::new();
    for word in text.split_whitespace() {
        let extra = if out.is_empty() { 0 } else { 1 };
        if out.chars().count() + extra + word.chars().count() > max_chars {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    if out.is_empty() {
        // One enormous token.
        out = text.chars().take(max_chars).collect();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::clean_search_query;

    #[test]
    fn strips_filler_and_reported_speech() {
        assert_eq!(
            clean_search_query("Hey, so I heard that the mayor resigned?", 100),
            "the mayor resigned"
        );
        assert_eq!(
            clean_search_query("Can you tell me the price of gold today?", 100),
            "the price of gold today"
        );
        assert_eq!(
            clean_search_query("Is it true that Acme was acquired", 100),
            "Acme was acquired"
        );
    }

    #[test]
    fn short_queries_pass_through() {
        assert_eq!(clean_search_query("bitcoin price", 100), "bitcoin price");
    }

    #[test]
    fn long_input_prefers_quoted_text() {
        let long = format!(
            "{} and then the article said \"central bank cuts rates\" which {}",
            "context ".repeat(20),
            "more ".repeat(10)
        );
        assert_eq!(clean_search_query(&long, 100), "central bank cuts rates");
    }

    #[test]
    fn long_input_falls_back_to_clause() {
        let long = format!(
            "{} anyway the Federal Reserve announced a rate cut. {}",
            "background ".repeat(15),
            "filler ".repeat(15)
        );
        assert_eq!(
            clean_search_query(&long, 100),
            "Federal Reserve announced a rate cut"
        );
    }

    #[test]
    fn long_input_without_structure_is_cut_on_words() {
        let long = "word ".repeat(50);
        let cleaned = clean_search_query(&long, 100);
        assert!(cleaned.chars().count() <= 100);
        assert!(cleaned.ends_with("word"));
    }
}
