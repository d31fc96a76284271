//! Query-domain matchers.
//!
//! An ordered list of matchers maps a query to the source category it
//! belongs to. The first matcher that fires wins. Order: currency, commodity,
//! government, crypto, stock, medical, weather, news, generic freshness.
//! Some matchers also pull out a subject (currency code, metal code, ticker,
//! drug, place) that source URL templates interpolate as `{subject}`.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use truthgate_contracts::source::SourceCategory;

/// The category a query belongs to, plus the subject found in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainMatch {
    pub category: SourceCategory,
    pub subject: Option<String>,
    /// Which matcher fired.
    pub matcher: &'static str,
}

impl DomainMatch {
    fn new(category: SourceCategory, subject: Option<String>, matcher: &'static str) -> Self {
        Self {
            category,
            subject,
            matcher,
        }
    }
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}

// ── Currency ──────────────────────────────────────────────────────────────────

static CURRENCY_INTENT: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\b(exchange rates?|forex|fx rate|currency conversion|convert\s+\d[\d.,]*\s*\w+\s+(to|into))\b"));

static CURRENCY_MENTION: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("USD", r"(?i)\b(usd|us dollars?|dollars?)\b"),
        ("EUR", r"(?i)\b(eur|euros?)\b"),
        ("GBP", r"(?i)\b(gbp|british pounds?|pounds? sterling|sterling)\b"),
        ("JPY", r"(?i)\b(jpy|japanese yen|yen)\b"),
        ("CNY", r"(?i)\b(cny|rmb|yuan|renminbi)\b"),
        ("INR", r"(?i)\b(inr|indian rupees?|rupees?)\b"),
        ("CAD", r"(?i)\b(cad|canadian dollars?)\b"),
        ("AUD", r"(?i)\b(aud|australian dollars?)\b"),
        ("CHF", r"(?i)\b(chf|swiss francs?)\b"),
        ("MXN", r"(?i)\b(mxn|mexican pesos?|pesos?)\b"),
    ]
    .into_iter()
    .map(|(code, pattern)| (code, re(pattern)))
    .collect()
});

/// ISO codes of the currencies mentioned in `text`, in order of first
/// appearance. A plain "dollar" is USD unless a more specific dollar matched.
pub fn currency_codes(text: &str) -> Vec<&'static str> {
    let mut found: Vec<(usize, &'static str)> = CURRENCY_MENTION
        .iter()
        .filter_map(|(code, pattern)| pattern.find(text).map(|m| (m.start(), *code)))
        .collect();

    let specific_dollar = found.iter().any(|(_, c)| matches!(*c, "CAD" | "AUD"));
    if specific_dollar && !text.to_ascii_lowercase().contains("usd") && !text.to_ascii_lowercase().contains("us dollar") {
        found.retain(|(_, c)| *c != "USD");
    }
    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, code)| code).collect()
}

fn match_currency(query: &str) -> Option<DomainMatch> {
    let codes = currency_codes(query);
    if !CURRENCY_INTENT.is_match(query) && codes.len() < 2 {
        return None;
    }
    let base = codes.first().copied().unwrap_or("USD");
    Some(DomainMatch::new(SourceCategory::Currency, Some(base.to_string()), "currency"))
}

// ── Commodity ─────────────────────────────────────────────────────────────────

static COMMODITY: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(?i)\b(gold|silver|platinum|palladium|copper|crude|oil|brent|wti|natural gas|wheat|corn|coffee|cocoa)\b")
});

static PRICE_CONTEXT: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(?i)\b(price|prices|cost|worth|trading|per ounce|an ounce|ounce|per barrel|barrel|spot|futures?|quote)\b")
});

/// Metal symbols understood by precious-metal price sources.
pub fn metal_code(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    [("gold", "XAU"), ("silver", "XAG"), ("platinum", "XPT"), ("palladium", "XPD")]
        .into_iter()
        .find(|(name, _)| lower.contains(name))
        .map(|(_, code)| code)
}

/// True when the query asks what something costs, whatever the domain.
pub fn is_price_query(query: &str) -> bool {
    PRICE_CONTEXT.is_match(query)
}

fn match_commodity(query: &str) -> Option<DomainMatch> {
    if !(COMMODITY.is_match(query) && PRICE_CONTEXT.is_match(query)) {
        return None;
    }
    Some(DomainMatch::new(
        SourceCategory::Commodity,
        metal_code(query).map(str::to_string),
        "commodity",
    ))
}

// ── Government ────────────────────────────────────────────────────────────────

static POLITICAL_OFFICE: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(?i)\b(president|prime minister|chancellor|governor|mayor|senators?|congress(wo)?man|secretary of state|speaker of the house|head of state|foreign minister|premier|attorney general|supreme court justices?)\b")
});

fn match_government(query: &str) -> Option<DomainMatch> {
    POLITICAL_OFFICE
        .is_match(query)
        .then(|| DomainMatch::new(SourceCategory::Government, None, "government"))
}

// ── Crypto ────────────────────────────────────────────────────────────────────

static CRYPTO: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(?i)\b(bitcoin|btc|ethereum|eth|ether|solana|dogecoin|doge|crypto|cryptocurrenc(y|ies))\b")
});

fn match_crypto(query: &str) -> Option<DomainMatch> {
    CRYPTO
        .is_match(query)
        .then(|| DomainMatch::new(SourceCategory::Crypto, None, "crypto"))
}

// ── Stock ─────────────────────────────────────────────────────────────────────

static STOCK: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(?i)(\b(stocks?|shares?|share price|ticker|nasdaq|nyse|market cap|dow jones)\b|\$[a-z]{1,5}\b)")
});

static CASHTAG: LazyLock<Regex> = LazyLock::new(|| re(r"\$([A-Z]{1,5})\b"));

static UPPER_TOKEN: LazyLock<Regex> = LazyLock::new(|| re(r"\b([A-Z]{2,5})\b"));

const NOT_TICKERS: &[&str] = &["CEO", "ETF", "IPO", "NYSE", "USA", "US", "UK", "EU", "AI", "USD", "SEC"];

const COMPANY_TICKERS: &[(&str, &str)] = &[
    ("apple", "AAPL"),
    ("microsoft", "MSFT"),
    ("tesla", "TSLA"),
    ("alphabet", "GOOGL"),
    ("google", "GOOGL"),
    ("amazon", "AMZN"),
    ("nvidia", "NVDA"),
    ("meta", "META"),
    ("netflix", "NFLX"),
    ("berkshire", "BRK.B"),
];

/// The ticker symbol a stock query is about, if one can be found.
pub fn ticker_symbol(text: &str) -> Option<String> {
    if let Some(caps) = CASHTAG.captures(text) {
        return Some(caps[1].to_string());
    }
    let lower = text.to_lowercase();
    if let Some((_, ticker)) = COMPANY_TICKERS.iter().find(|(name, _)| lower.contains(name)) {
        return Some((*ticker).to_string());
    }
    UPPER_TOKEN
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .find(|token| !NOT_TICKERS.contains(&token.as_str()))
}

fn match_stock(query: &str) -> Option<DomainMatch> {
    STOCK
        .is_match(query)
        .then(|| DomainMatch::new(SourceCategory::Stock, ticker_symbol(query), "stock"))
}

// ── Medical ───────────────────────────────────────────────────────────────────

static DRUG: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(?i)\b(ibuprofen|acetaminophen|paracetamol|tylenol|advil|motrin|aleve|naproxen|aspirin|metformin|lisinopril|amoxicillin|atorvastatin|omeprazole|sertraline|insulin|warfarin|prednisone|gabapentin|ozempic|semaglutide)\b")
});

static SIDE_EFFECTS_OF: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\b(side effects|dosage|dose|interactions|warnings) (of|for)\s+([a-z][a-z-]{3,})\b"));

/// Generic name for a brand the label source does not index.
fn generic_name(drug: &str) -> String {
    match drug.to_lowercase().as_str() {
        "tylenol" | "paracetamol" => "acetaminophen".to_string(),
        "advil" | "motrin" => "ibuprofen".to_string(),
        "aleve" => "naproxen".to_string(),
        "ozempic" => "semaglutide".to_string(),
        other => other.to_string(),
    }
}

fn match_medical(query: &str) -> Option<DomainMatch> {
    let drug = DRUG
        .find(query)
        .map(|m| m.as_str().to_string())
        .or_else(|| SIDE_EFFECTS_OF.captures(query).map(|caps| caps[3].to_string()))?;
    Some(DomainMatch::new(
        SourceCategory::Medical,
        Some(generic_name(&drug)),
        "medical",
    ))
}

// ── Weather ───────────────────────────────────────────────────────────────────

static WEATHER: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(?i)\b(weather|forecast|temperature|humidity|raining|snowing|rain|snow|sunny|windy)\b")
});

static PLACE_PREPOSITION: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\b(in|at|for)\s+"));

const TRAILING_TIME_WORDS: &[&str] = &[
    "today", "tonight", "tomorrow", "now", "right", "currently", "this", "week", "weekend", "morning",
    "afternoon", "evening",
];

/// The place a weather query is about: whatever follows the last
/// "in"/"at"/"for", minus trailing time words and punctuation.
pub fn weather_location(text: &str) -> Option<String> {
    let start = PLACE_PREPOSITION.find_iter(text).last()?.end();
    let mut words: Vec<&str> = text[start..]
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '-' && c != '\''))
        .filter(|w| !w.is_empty())
        .collect();
    while words
        .last()
        .is_some_and(|w| TRAILING_TIME_WORDS.contains(&w.to_lowercase().as_str()))
    {
        words.pop();
    }
    (!words.is_empty()).then(|| words.join(" "))
}

fn match_weather(query: &str) -> Option<DomainMatch> {
    WEATHER
        .is_match(query)
        .then(|| DomainMatch::new(SourceCategory::Weather, weather_location(query), "weather"))
}

// ── News ──────────────────────────────────────────────────────────────────────

static NEWS_STRUCTURE: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(?i)(\b(news|headlines?|happened|happening|announced|announcement|reported|elections?|resigned|resigns|died|passed away|arrested|indicted|verdict|ceasefire|scandal|breaking)\b|^\s*(i (heard|read|saw) that|is it true that|someone told me|apparently)\b)")
});

static EVENT_VERB: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(?i)\b(said|says|won|lost|signed|launched|fired|sued|visited|met|banned|approved|acquired|merged|crashed)\b")
});

static CAPITALISED: LazyLock<Regex> = LazyLock::new(|| re(r"\b[A-Z][a-z]+\b"));

/// Two or more capitalised words past the first, next to an event verb.
fn looks_like_event_about_named_entities(query: &str) -> bool {
    let first_word_end = query.split_whitespace().next().map_or(0, str::len);
    let proper_nouns = CAPITALISED
        .find_iter(query)
        .filter(|m| m.start() >= first_word_end)
        .count();
    proper_nouns >= 2 && EVENT_VERB.is_match(query)
}

fn match_news(query: &str) -> Option<DomainMatch> {
    (NEWS_STRUCTURE.is_match(query) || looks_like_event_about_named_entities(query))
        .then(|| DomainMatch::new(SourceCategory::News, None, "news"))
}

// ── Generic freshness ─────────────────────────────────────────────────────────

static FRESHNESS: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(?i)\b(current|currently|latest|recent|recently|right now|today|this (week|month|year)|as of|up to date|20[2-9]\d)\b")
});

fn match_generic(query: &str) -> Option<DomainMatch> {
    FRESHNESS
        .is_match(query)
        .then(|| DomainMatch::new(SourceCategory::General, None, "generic_freshness"))
}

type Matcher = fn(&str) -> Option<DomainMatch>;

const MATCHERS: &[Matcher] = &[
    match_currency,
    match_commodity,
    match_government,
    match_crypto,
    match_stock,
    match_medical,
    match_weather,
    match_news,
    match_generic,
];

/// Run the matchers in order and return the first hit.
pub fn detect_domain(query: &str) -> Option<DomainMatch> {
    MATCHERS.iter().find_map(|matcher| matcher(query))
}

#[cfg(test)]
mod tests {
    use truthgate_contracts::source::SourceCategory;

    use super::*;

    fn category(query: &str) -> Option<SourceCategory> {
        detect_domain(query).map(|m| m.category)
    }

    // ── Price context ────────────────────────────────────────────────────────

    #[test]
    fn price_questions_are_recognised_outside_price_domains() {
        assert!(is_price_query("What is the current price of lumber?"));
        assert!(is_price_query("How much does a barrel cost today?"));
        assert!(!is_price_query("latest headlines about the port strike"));
    }

    // ── Ordering ─────────────────────────────────────────────────────────────

    #[test]
    fn bitcoin_price_is_crypto() {
        let m = detect_domain("What is the current price of Bitcoin?").unwrap();
        assert_eq!(m.category, SourceCategory::Crypto);
        assert_eq!(m.matcher, "crypto");
    }

    #[test]
    fn currency_pair_beats_everything() {
        let m = detect_domain("How many euros is 100 dollars right now?").unwrap();
        assert_eq!(m.category, SourceCategory::Currency);
        assert_eq!(m.subject.as_deref(), Some("EUR"));
    }

    #[test]
    fn gold_medal_is_not_a_commodity() {
        assert_eq!(category("Who won gold in the 100m?"), None);
        let m = detect_domain("What is the price of gold per ounce?").unwrap();
        assert_eq!(m.category, SourceCategory::Commodity);
        assert_eq!(m.subject.as_deref(), Some("XAU"));
    }

    #[test]
    fn oil_has_no_metal_subject() {
        let m = detect_domain("crude oil price today").unwrap();
        assert_eq!(m.category, SourceCategory::Commodity);
        assert_eq!(m.subject, None);
    }

    #[test]
    fn office_holder_is_government() {
        assert_eq!(
            category("Who is the prime minister of Canada?"),
            Some(SourceCategory::Government)
        );
    }

    #[test]
    fn stock_ticker_extraction() {
        let m = detect_domain("What's Apple's share price?").unwrap();
        assert_eq!(m.category, SourceCategory::Stock);
        assert_eq!(m.subject.as_deref(), Some("AAPL"));
        assert_eq!(ticker_symbol("how is $PLTR stock doing"), Some("PLTR".into()));
        assert_eq!(ticker_symbol("is the CEO selling shares"), None);
    }

    #[test]
    fn drug_queries_use_generic_names() {
        let m = detect_domain("How much Tylenol can I take?").unwrap();
        assert_eq!(m.category, SourceCategory::Medical);
        assert_eq!(m.subject.as_deref(), Some("acetaminophen"));

        let m = detect_domain("side effects of lisinopril").unwrap();
        assert_eq!(m.subject.as_deref(), Some("lisinopril"));
    }

    #[test]
    fn weather_location_strips_time_words() {
        let m = detect_domain("What's the weather in Paris?").unwrap();
        assert_eq!(m.category, SourceCategory::Weather);
        assert_eq!(m.subject.as_deref(), Some("Paris"));
        assert_eq!(
            weather_location("weather forecast for New York tomorrow"),
            Some("New York".into())
        );
        assert_eq!(weather_location("is it raining"), None);
    }

    #[test]
    fn news_by_structure_and_by_proper_nouns() {
        assert_eq!(category("latest headlines about the strike"), Some(SourceCategory::News));
        assert_eq!(
            category("I heard that the mayor resigned"),
            Some(SourceCategory::Government)
        );
        assert_eq!(
            category("Did Acme Corp sign with Globex Industries?"),
            None
        );
        assert_eq!(
            category("Globex Industries acquired Initech last month"),
            Some(SourceCategory::News)
        );
    }

    #[test]
    fn generic_freshness_is_last_resort() {
        assert_eq!(
            category("what is the latest version of rustc"),
            Some(SourceCategory::General)
        );
        assert_eq!(category("how do magnets work"), None);
    }

    #[test]
    fn currency_codes_in_order() {
        assert_eq!(currency_codes("convert 50 GBP to JPY"), vec!["GBP", "JPY"]);
        assert_eq!(currency_codes("canadian dollars to euros"), vec!["CAD", "EUR"]);
    }
}
