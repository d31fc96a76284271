//! Built-in extractors, one per supported upstream format.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use truthgate_contracts::{
    error::TruthgateResult,
    source::{ParserKind, Payload},
};

use crate::domain::currency_codes;
use crate::extract::{expect_feed, expect_json, expect_text, number_at, text_at, truncate_chars, ExtractContext, Extractor};

/// Longest single field quoted from a drug label.
const LABEL_FIELD_CHARS: usize = 400;

/// Longest plain-text page excerpt.
const PAGE_EXCERPT_CHARS: usize = 2_000;

/// `1234.5` → `"$1,234.50"`; sub-dollar prices keep four decimals.
pub fn format_usd(value: f64) -> String {
    let decimals = if value.abs() < 1.0 { 4 } else { 2 };
    let formatted = format!("{:.*}", decimals, value.abs());
    let (whole, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), ""));

    let mut grouped = String::new();
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{fraction}")
}

fn html_to_text(fragment: &str) -> String {
    Html::parse_fragment(fragment)
        .root_element()
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Crypto ────────────────────────────────────────────────────────────────────

/// CoinGecko `simple/price`: `{"bitcoin": {"usd": 64000.0}, ...}`.
///
/// Bitcoin and Ethereum are always reported; other coins only when the query
/// names them.
pub struct CryptoPrices;

const COINS: &[(&str, &str, bool)] = &[
    ("bitcoin", "Bitcoin", true),
    ("ethereum", "Ethereum", true),
    ("solana", "Solana", false),
    ("dogecoin", "Dogecoin", false),
];

impl Extractor for CryptoPrices {
    fn parser(&self) -> ParserKind {
        ParserKind::Json
    }

    fn extract(&self, payload: &Payload, ctx: &ExtractContext<'_>) -> TruthgateResult<Option<String>> {
        let json = expect_json("crypto_prices", payload)?;
        let query = ctx.query.to_lowercase();
        let quotes: Vec<String> = COINS
            .iter()
            .filter(|(id, _, always)| *always || query.contains(id))
            .filter_map(|(id, label, _)| {
                number_at(json, &format!("{id}.usd")).map(|usd| format!("{label}: {}", format_usd(usd)))
            })
            .collect();
        Ok((!quotes.is_empty()).then(|| quotes.join(", ")))
    }
}

// ── Currency ──────────────────────────────────────────────────────────────────

/// open.er-api.com `latest/<base>`: `{"result": "success", "base_code": "USD", "rates": {...}}`.
pub struct ExchangeRates;

const DEFAULT_QUOTE_CURRENCIES: &[&str] = &["EUR", "GBP", "JPY"];

impl Extractor for ExchangeRates {
    fn parser(&self) -> ParserKind {
        ParserKind::Json
    }

    fn extract(&self, payload: &Payload, ctx: &ExtractContext<'_>) -> TruthgateResult<Option<String>> {
        let json = expect_json("exchange_rates", payload)?;
        if text_at(json, "result").as_deref() != Some("success") {
            return Ok(None);
        }
        let Some(base) = text_at(json, "base_code") else {
            return Ok(None);
        };

        let mentioned: Vec<&str> = currency_codes(ctx.query)
            .into_iter()
            .filter(|code| *code != base)
            .collect();
        let targets = if mentioned.is_empty() {
            DEFAULT_QUOTE_CURRENCIES.to_vec()
        } else {
            mentioned
        };

        let rates: Vec<String> = targets
            .iter()
            .filter(|code| **code != base)
            .filter_map(|code| number_at(json, &format!("rates.{code}")).map(|rate| format!("{rate:.4} {code}")))
            .collect();
        if rates.is_empty() {
            return Ok(None);
        }
        Ok(Some(format!("1 {base} = {}", rates.join(", "))))
    }
}

// ── Commodity ─────────────────────────────────────────────────────────────────

/// metals-api `latest?base=USD&symbols=<code>`.
///
/// Prefers the direct `USD<code>` rate; otherwise inverts `<code>`.
pub struct MetalPrice;

fn metal_name(code: &str) -> &'static str {
    match code {
        "XAU" => "Gold",
        "XAG" => "Silver",
        "XPT" => "Platinum",
        "XPD" => "Palladium",
        _ => "Metal",
    }
}

impl Extractor for MetalPrice {
    fn parser(&self) -> ParserKind {
        ParserKind::Json
    }

    fn extract(&self, payload: &Payload, ctx: &ExtractContext<'_>) -> TruthgateResult<Option<String>> {
        let json = expect_json("metal_price", payload)?;
        let Some(code) = ctx.subject else {
            return Ok(None);
        };
        let price = number_at(json, &format!("rates.USD{code}")).or_else(|| {
            number_at(json, &format!("rates.{code}"))
                .filter(|rate| *rate > 0.0)
                .map(|rate| 1.0 / rate)
        });
        Ok(price.map(|usd| format!("{} ({code}): {} per troy ounce", metal_name(code), format_usd(usd))))
    }
}

// ── Stock ─────────────────────────────────────────────────────────────────────

/// Alpha Vantage `GLOBAL_QUOTE`.
pub struct StockQuote;

impl Extractor for StockQuote {
    fn parser(&self) -> ParserKind {
        ParserKind::Json
    }

    fn extract(&self, payload: &Payload, _ctx: &ExtractContext<'_>) -> TruthgateResult<Option<String>> {
        let json = expect_json("stock_quote", payload)?;
        // Field names contain dots ("05. price"), so no path lookups here.
        let field = |name: &str| {
            json.get("Global Quote")
                .and_then(|quote| quote.get(name))
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };
        let (Some(symbol), Some(price)) = (
            field("01. symbol"),
            field("05. price").and_then(|p| p.parse::<f64>().ok()),
        ) else {
            // Rate-limit notes and unknown symbols come back as an empty quote.
            return Ok(None);
        };

        let mut line = format!("{symbol}: {}", format_usd(price));
        if let Some(change) = field("10. change percent") {
            line.push_str(&format!(" (change {change})"));
        }
        if let Some(day) = field("07. latest trading day") {
            line.push_str(&format!(", as of {day}"));
        }
        Ok(Some(line))
    }
}

// ── Wikipedia ─────────────────────────────────────────────────────────────────

/// MediaWiki `list=search`: titles plus HTML snippets.
pub struct WikipediaSearch;

impl Extractor for WikipediaSearch {
    fn parser(&self) -> ParserKind {
        ParserKind::Json
    }

    fn extract(&self, payload: &Payload, ctx: &ExtractContext<'_>) -> TruthgateResult<Option<String>> {
        let json = expect_json("wikipedia_search", payload)?;
        let Some(hits) = json.pointer("/query/search").and_then(|v| v.as_array()) else {
            return Ok(None);
        };

        let lines: Vec<String> = hits
            .iter()
            .take(ctx.max_items.max(1))
            .filter_map(|hit| {
                let title = text_at(hit, "title")?;
                let snippet = text_at(hit, "snippet").map(|s| html_to_text(&s)).unwrap_or_default();
                Some(if snippet.is_empty() {
                    title
                } else {
                    format!("{title}: {snippet}")
                })
            })
            .collect();
        Ok((!lines.is_empty()).then(|| lines.join("\n")))
    }
}

// ── openFDA ───────────────────────────────────────────────────────────────────

/// openFDA drug label. Quotes the label section the query asks about.
pub struct OpenFdaLabel;

static DOSAGE_INTENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(dose|dosage|how much|how many|maximum|max)\b").unwrap());
static SIDE_EFFECT_INTENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(side effects?|adverse|reactions?)\b").unwrap());
static INTERACTION_INTENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(interact\w*|mix|combine|together with|alcohol)\b").unwrap());

impl Extractor for OpenFdaLabel {
    fn parser(&self) -> ParserKind {
        ParserKind::Json
    }

    fn extract(&self, payload: &Payload, ctx: &ExtractContext<'_>) -> TruthgateResult<Option<String>> {
        let json = expect_json("openfda_label", payload)?;
        let Some(label) = json.pointer("/results/0") else {
            return Ok(None);
        };

        let section = if DOSAGE_INTENT.is_match(ctx.query) {
            ("Dosage", "dosage_and_administration.0")
        } else if SIDE_EFFECT_INTENT.is_match(ctx.query) {
            ("Adverse reactions", "adverse_reactions.0")
        } else if INTERACTION_INTENT.is_match(ctx.query) {
            ("Drug interactions", "drug_interactions.0")
        } else {
            ("Indications", "indications_and_usage.0")
        };

        let mut parts = Vec::new();
        if let Some(text) = text_at(label, section.1) {
            parts.push(format!("{}: {}", section.0, truncate_chars(&text, LABEL_FIELD_CHARS)));
        }
        if let Some(warnings) = text_at(label, "warnings.0") {
            parts.push(format!("Warnings: {}", truncate_chars(&warnings, LABEL_FIELD_CHARS)));
        }
        if parts.is_empty() {
            return Ok(None);
        }

        let name = text_at(label, "openfda.generic_name.0")
            .or_else(|| ctx.subject.map(str::to_uppercase))
            .unwrap_or_else(|| "Drug".to_string());
        let effective = text_at(label, "effective_time")
            .map(|t| format!(" (label effective {t})"))
            .unwrap_or_default();
        Ok(Some(format!("{name}{effective}. {}", parts.join(" "))))
    }
}

// ── Weather ───────────────────────────────────────────────────────────────────

/// wttr.in `format=j1`.
pub struct WttrWeather;

impl Extractor for WttrWeather {
    fn parser(&self) -> ParserKind {
        ParserKind::Json
    }

    fn extract(&self, payload: &Payload, ctx: &ExtractContext<'_>) -> TruthgateResult<Option<String>> {
        let json = expect_json("wttr_weather", payload)?;
        let Some(temp_c) = text_at(json, "current_condition.0.temp_C") else {
            return Ok(None);
        };

        let place = text_at(json, "nearest_area.0.areaName.0.value")
            .or_else(|| ctx.subject.map(str::to_string))
            .unwrap_or_else(|| "Current conditions".to_string());
        let mut line = format!("{place}: {temp_c}°C");
        if let Some(temp_f) = text_at(json, "current_condition.0.temp_F") {
            line.push_str(&format!(" ({temp_f}°F)"));
        }
        if let Some(desc) = text_at(json, "current_condition.0.weatherDesc.0.value") {
            line.push_str(&format!(", {desc}"));
        }
        if let Some(humidity) = text_at(json, "current_condition.0.humidity") {
            line.push_str(&format!(", humidity {humidity}%"));
        }
        if let Some(wind) = text_at(json, "current_condition.0.windspeedKmph") {
            line.push_str(&format!(", wind {wind} km/h"));
        }
        Ok(Some(line))
    }
}

// ── RSS ───────────────────────────────────────────────────────────────────────

/// RSS `<item>` titles, filtered to those mentioning a query term.
///
/// A query with no usable terms takes the newest items unfiltered. A query
/// whose terms match nothing yields no data rather than unrelated headlines.
pub struct RssHeadlines;

static RSS_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<item\b.*?</item>").unwrap());
static RSS_TITLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title>").unwrap());
static RSS_DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<pubDate>(.*?)</pubDate>").unwrap());
static CDATA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").unwrap());

const TERM_STOP_WORDS: &[&str] = &[
    "about", "after", "been", "does", "from", "have", "heard", "latest", "news", "that", "their", "there",
    "this", "what", "when", "where", "which", "with", "would",
];

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn clean_feed_text(raw: &str) -> String {
    let unwrapped = CDATA.replace_all(raw, "$1");
    decode_entities(unwrapped.trim())
}

fn query_terms(query: &str) -> Vec<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|t| t.chars().count() >= 4 && !TERM_STOP_WORDS.contains(&t.as_str()))
        .collect()
}

impl Extractor for RssHeadlines {
    fn parser(&self) -> ParserKind {
        ParserKind::Rss
    }

    fn extract(&self, payload: &Payload, ctx: &ExtractContext<'_>) -> TruthgateResult<Option<String>> {
        let xml = expect_feed("rss_headlines", payload)?;
        let terms = query_terms(ctx.query);

        let headlines: Vec<String> = RSS_ITEM
            .find_iter(xml)
            .filter_map(|item| {
                let item = item.as_str();
                let title = clean_feed_text(RSS_TITLE.captures(item)?.get(1)?.as_str());
                if title.is_empty() {
                    return None;
                }
                let date = RSS_DATE
                    .captures(item)
                    .and_then(|c| c.get(1))
                    .map(|d| clean_feed_text(d.as_str()));
                Some((title, date))
            })
            .filter(|(title, _)| {
                let lower = title.to_lowercase();
                terms.is_empty() || terms.iter().any(|t| lower.contains(t.as_str()))
            })
            .take(ctx.max_items)
            .map(|(title, date)| match date {
                Some(date) if !date.is_empty() => format!("- {title} ({date})"),
                _ => format!("- {title}"),
            })
            .collect();

        Ok((!headlines.is_empty()).then(|| headlines.join("\n")))
    }
}

// ── Plain text ────────────────────────────────────────────────────────────────

/// Visible text of an HTML page (or the raw body if it is not HTML).
pub struct PlainText;

impl Extractor for PlainText {
    fn parser(&self) -> ParserKind {
        ParserKind::Text
    }

    fn extract(&self, payload: &Payload, _ctx: &ExtractContext<'_>) -> TruthgateResult<Option<String>> {
        let body = expect_text("plain_text", payload)?;
        let document = Html::parse_document(body);
        let body_selector = Selector::parse("body").unwrap_or_else(|_| unreachable!());
        let text = document
            .select(&body_selector)
            .next()
            .map(|el| el.text().collect::<Vec<_>>().join(" "))
            .unwrap_or_else(|| body.to_string());
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(truncate_chars(&text, PAGE_EXCERPT_CHARS)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use truthgate_contracts::source::Payload;

    use super::*;

    fn ctx<'a>(query: &'a str, subject: Option<&'a str>) -> ExtractContext<'a> {
        ExtractContext {
            query,
            subject,
            max_items: 3,
        }
    }

    fn run(extractor: &dyn Extractor, payload: Payload, query: &str, subject: Option<&str>) -> Option<String> {
        extractor.extract(&payload, &ctx(query, subject)).unwrap()
    }

    // ── Formatting ───────────────────────────────────────────────────────────

    #[test]
    fn usd_formatting() {
        assert_eq!(format_usd(64_000.5), "$64,000.50");
        assert_eq!(format_usd(1_234_567.0), "$1,234,567.00");
        assert_eq!(format_usd(999.0), "$999.00");
        assert_eq!(format_usd(0.1234), "$0.1234");
    }

    // ── JSON extractors ──────────────────────────────────────────────────────

    #[test]
    fn crypto_prices_reports_bitcoin_and_ethereum() {
        let payload = Payload::Json(json!({
            "bitcoin": {"usd": 64000.0},
            "ethereum": {"usd": 3100.25},
            "solana": {"usd": 150.0}
        }));
        assert_eq!(
            run(&CryptoPrices, payload.clone(), "current price of bitcoin", None).as_deref(),
            Some("Bitcoin: $64,000.00, Ethereum: $3,100.25")
        );
        assert_eq!(
            run(&CryptoPrices, payload, "solana price", None).as_deref(),
            Some("Bitcoin: $64,000.00, Ethereum: $3,100.25, Solana: $150.00")
        );
    }

    #[test]
    fn crypto_prices_empty_payload_is_no_data() {
        assert_eq!(run(&CryptoPrices, Payload::Json(json!({})), "bitcoin", None), None);
    }

    #[test]
    fn exchange_rates_uses_mentioned_currencies() {
        let payload = Payload::Json(json!({
            "result": "success",
            "base_code": "GBP",
            "rates": {"GBP": 1, "JPY": 190.5, "EUR": 1.17}
        }));
        assert_eq!(
            run(&ExchangeRates, payload, "convert 50 GBP to JPY", Some("GBP")).as_deref(),
            Some("1 GBP = 190.5000 JPY")
        );
    }

    #[test]
    fn exchange_rates_error_result_is_no_data() {
        let payload = Payload::Json(json!({"result": "error", "error-type": "unsupported-code"}));
        assert_eq!(run(&ExchangeRates, payload, "usd to eur", Some("USD")), None);
    }

    #[test]
    fn metal_price_inverts_base_rate() {
        let payload = Payload::Json(json!({"success": true, "rates": {"XAU": 0.0004}}));
        assert_eq!(
            run(&MetalPrice, payload, "gold price", Some("XAU")).as_deref(),
            Some("Gold (XAU): $2,500.00 per troy ounce")
        );
    }

    #[test]
    fn stock_quote_formats_global_quote() {
        let payload = Payload::Json(json!({
            "Global Quote": {
                "01. symbol": "AAPL",
                "05. price": "189.3000",
                "07. latest trading day": "2026-10-16",
                "10. change percent": "0.6400%"
            }
        }));
        assert_eq!(
            run(&StockQuote, payload, "apple share price", Some("AAPL")).as_deref(),
            Some("AAPL: $189.30 (change 0.6400%), as of 2026-10-16")
        );
        let limited = Payload::Json(json!({"Note": "API call frequency exceeded"}));
        assert_eq!(run(&StockQuote, limited, "aapl", Some("AAPL")), None);
    }

    #[test]
    fn wikipedia_snippets_are_stripped_of_markup() {
        let payload = Payload::Json(json!({
            "query": {"search": [
                {"title": "Prime Minister of Canada", "snippet": "The <span class=\"searchmatch\">prime</span> minister is the head of government"},
                {"title": "Second", "snippet": ""}
            ]}
        }));
        assert_eq!(
            run(&WikipediaSearch, payload, "prime minister canada", None).as_deref(),
            Some("Prime Minister of Canada: The prime minister is the head of government\nSecond")
        );
    }

    #[test]
    fn openfda_quotes_dosage_for_dose_questions() {
        let payload = Payload::Json(json!({
            "results": [{
                "openfda": {"generic_name": ["IBUPROFEN"]},
                "effective_time": "20250101",
                "dosage_and_administration": ["Adults: 1 tablet every 4 to 6 hours."],
                "indications_and_usage": ["Temporarily relieves minor aches."]
            }]
        }));
        assert_eq!(
            run(&OpenFdaLabel, payload, "max dose of ibuprofen", Some("ibuprofen")).as_deref(),
            Some("IBUPROFEN (label effective 20250101). Dosage: Adults: 1 tablet every 4 to 6 hours.")
        );
    }

    #[test]
    fn wttr_current_conditions() {
        let payload = Payload::Json(json!({
            "current_condition": [{
                "temp_C": "18", "temp_F": "64",
                "weatherDesc": [{"value": "Partly cloudy"}],
                "humidity": "60", "windspeedKmph": "11"
            }],
            "nearest_area": [{"areaName": [{"value": "Paris"}]}]
        }));
        assert_eq!(
            run(&WttrWeather, payload, "weather paris", Some("Paris")).as_deref(),
            Some("Paris: 18°C (64°F), Partly cloudy, humidity 60%, wind 11 km/h")
        );
    }

    // ── Feeds and pages ──────────────────────────────────────────────────────

    const FEED: &str = r#"<?xml version="1.0"?>
        <rss><channel><title>Top stories</title>
        <item><title><![CDATA[Gold hits record high - Reuters]]></title><pubDate>Mon, 19 Oct 2026 08:00:00 GMT</pubDate></item>
        <item><title>Markets &amp; gold: what to watch - AP News</title></item>
        <item><title>Local team wins cup</title></item>
        </channel></rss>"#;

    #[test]
    fn rss_headlines_filters_by_query_terms() {
        let text = run(&RssHeadlines, Payload::Feed(FEED.into()), "gold price", None).unwrap();
        assert_eq!(
            text,
            "- Gold hits record high - Reuters (Mon, 19 Oct 2026 08:00:00 GMT)\n- Markets & gold: what to watch - AP News"
        );
    }

    #[test]
    fn rss_headlines_without_matching_items_is_no_data() {
        assert_eq!(run(&RssHeadlines, Payload::Feed(FEED.into()), "volcano eruption", None), None);
    }

    #[test]
    fn rss_headlines_caps_item_count() {
        let extractor = RssHeadlines;
        let ctx = ExtractContext {
            query: "",
            subject: None,
            max_items: 1,
        };
        let text = extractor.extract(&Payload::Feed(FEED.into()), &ctx).unwrap().unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn plain_text_strips_html() {
        let html = "<html><head><title>x</title></head><body><h1>Current events</h1>\n<p>Talks  resume.</p></body></html>";
        assert_eq!(
            run(&PlainText, Payload::Text(html.into()), "", None).as_deref(),
            Some("Current events Talks resume.")
        );
    }
}
