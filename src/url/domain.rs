use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_shutter::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the host of a URL string, or an empty string if it does not parse
///
/// The empty string never matches a real host, so it is safe to compare
/// against a job's scoping domain.
pub fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| extract_domain(&parsed))
        .unwrap_or_default()
}

/// Same-domain scoping predicate
///
/// Hosts must match exactly; subdomains are different sites.
pub fn is_same_domain(url: &Url, domain: &str) -> bool {
    !domain.is_empty() && extract_domain(url).is_some_and(|host| host == domain)
}
