//! URL resolution for catalog sources.
//!
//! Resolution never fails loudly: a missing credential, an empty query or a
//! template that needs a subject nobody found all resolve to `None`, which
//! the executor records as `no_url` and skips.

use truthgate_contracts::source::UrlRule;
use truthgate_core::traits::Credentials;

/// The values a template may interpolate.
#[derive(Debug, Clone, Copy)]
pub struct UrlContext<'a> {
    /// The cleaned search string.
    pub query: &'a str,
    /// Domain subject from the matcher (ticker, currency code, place, ...).
    pub subject: Option<&'a str>,
}

/// Resolve `rule` to a concrete URL.
pub fn resolve_url(rule: &UrlRule, ctx: UrlContext<'_>, credentials: &dyn Credentials) -> Option<String> {
    match rule {
        UrlRule::Static { url } => Some(url.clone()),
        UrlRule::QueryBuilt { template } => fill_template(template, ctx, None),
        UrlRule::EnvKeyGated { env_var, template } => {
            let key = credentials.get(env_var).filter(|k| !k.trim().is_empty())?;
            fill_template(template, ctx, Some(key.trim()))
        }
    }
}

fn fill_template(template: &str, ctx: UrlContext<'_>, key: Option<&str>) -> Option<String> {
    let mut url = template.to_string();

    if url.contains("{query}") {
        let query = ctx.query.trim();
        if query.is_empty() {
            return None;
        }
        url = url.replace("{query}", &urlencoding::encode(query));
    }
    if url.contains("{subject}") {
        let subject = ctx.subject.map(str::trim).filter(|s| !s.is_empty())?;
        url = url.replace("{subject}", &urlencoding::encode(subject));
    }
    if url.contains("{key}") {
        url = url.replace("{key}", &urlencoding::encode(key?));
    }
    Some(url)
}
