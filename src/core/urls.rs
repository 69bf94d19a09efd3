//! URL helpers used when resolving call targets.

use log::error;
use url::Url;

/// `scheme://host`, plus `:port` when the URL names a non-default port.
pub fn origin_from_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}://{host}:{port}", url.scheme()),
        None => format!("{}://{host}", url.scheme()),
    }
}

/// Splits a full URL into `(base, endpoint)`.
///
/// The base is `scheme://host[:port]`, the endpoint is path plus query and
/// fragment (`/` when the path is empty). URLs without an `http(s)://` scheme
/// are treated as `http://`. Unparseable input degrades to a plain string split.
pub fn split_url(raw: &str) -> (String, String) {
    let lowered = raw.to_ascii_lowercase();
    let url = if lowered.starts_with("http://") || lowered.starts_with("https://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };

    match Url::parse(&url) {
        Ok(parsed) if parsed.has_host() => {
            let mut endpoint = parsed.path().to_string();
            if endpoint.is_empty() {
                endpoint.push('/');
            }
            if let Some(query) = parsed.query() {
                endpoint.push('?');
                endpoint.push_str(query);
            }
            if let Some(fragment) = parsed.fragment() {
                endpoint.push('#');
                endpoint.push_str(fragment);
            }
            (origin_from_url(&parsed), endpoint)
        }
        Ok(_) => fallback_split(&url),
        Err(err) => {
            error!("Error parsing URL '{url}': {err}");
            fallback_split(&url)
        }
    }
}

fn fallback_split(url: &str) -> (String, String) {
    if let Some((scheme, rest)) = url.split_once("//")
        && let Some((domain, _)) = rest.split_once('/')
    {
        let base = format!("{scheme}//{domain}");
        let endpoint = &url[base.len()..];
        let endpoint = if endpoint.is_empty() { "/" } else { endpoint };
        return (base, endpoint.to_string());
    }
    (url.to_string(), "/".to_string())
}

/// Resolves a session endpoint against its base URL.
///
/// Absolute `http(s)` endpoints are used as-is; everything else is appended to
/// the base with exactly one `/` between them.
pub fn join_endpoint(base: &str, endpoint: &str) -> Result<Url, url::ParseError> {
    let lowered = endpoint.to_ascii_lowercase();
    if lowered.starts_with("http://") || lowered.starts_with("https://") {
        return Url::parse(endpoint);
    }
    if endpoint.is_empty() {
        return Url::parse(base);
    }
    Url::parse(&format!(
        "{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    ))
}
