use crate::UrlError;
use url::Url;

/// Scheme prepended to input that does not carry one
const DEFAULT_SCHEME: &str = "https";

/// Tracking query parameters removed during canonicalization
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
];

/// Normalizes raw user input into an absolute URL string
///
/// Prepends `https://` when the input has no `scheme://` prefix. Returns
/// `None` for empty input or when the result still does not parse, so
/// callers can skip malformed values without aborting.
///
/// # Examples
///
/// ```
/// use sumi_shutter::url::normalize_url;
///
/// assert_eq!(normalize_url("example.com").as_deref(), Some("https://example.com/"));
/// assert_eq!(normalize_url("http://example.com/a").as_deref(), Some("http://example.com/a"));
/// assert_eq!(normalize_url("not a url"), None);
/// ```
pub fn normalize_url(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let candidate = if has_scheme(raw) {
        raw.to_string()
    } else {
        format!("{}://{}", DEFAULT_SCHEME, raw)
    };

    Url::parse(&candidate).ok().map(String::from)
}

/// Returns true if the string parses as an absolute URL with a host
pub fn is_valid_url(url: &str) -> bool {
    Url::parse(url)
        .map(|parsed| parsed.host_str().is_some_and(|h| !h.is_empty()))
        .unwrap_or(false)
}

/// Validates a crawl root supplied by a caller
///
/// Normalizes the input, then requires an HTTP(S) URL with a host. Only the
/// fragment is dropped; the query is kept as written.
pub fn validate_source_url(raw: &str) -> Result<Url, UrlError> {
    if raw.trim().is_empty() {
        return Err(UrlError::Empty);
    }

    let normalized = normalize_url(raw).ok_or_else(|| UrlError::Parse(raw.trim().to_string()))?;
    let url = Url::parse(&normalized).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    let mut url = url;
    url.set_fragment(None);
    Ok(url)
}

/// Produces the form of a URL used for visited/pending bookkeeping
///
/// Drops the fragment and tracking parameters and sorts the remaining query
/// pairs, so `/a?b=2&a=1#top` and `/a?a=1&b=2` are the same page.
pub fn canonicalize(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);

    if url.query().is_some() {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        params.sort();

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params.iter());
        }
    }

    url
}

/// Checks for a `scheme://` prefix
fn has_scheme(raw: &str) -> bool {
    match raw.find("://") {
        Some(idx) if idx > 0 => raw[..idx]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.'),
        _ => false,
    }
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
