//! Filtering of links extracted from a homepage before they are evaluated.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::error::{AuditError, Result};

static SOCIAL_MEDIA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"facebook\.com|instagram\.com|twitter\.com|youtube\.com|flickr\.com|foursquare\.com")
        .unwrap()
});

static IMAGE_FILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(png|jpe?g|gif|bmp|svg)$").unwrap());

/// Links that never make sense to evaluate: phone and mail links, social
/// media profiles, and direct image files.
pub fn is_ignored_link(link: &str) -> bool {
    link.starts_with("tel:")
        || link.starts_with("mailto:")
        || SOCIAL_MEDIA_RE.is_match(link)
        || IMAGE_FILE_RE.is_match(link)
}

/// De-duplicate links (first occurrence wins) and drop ignored ones.
pub fn filter_links<I, S>(links: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    links
        .into_iter()
        .map(|l| l.as_ref().trim().to_string())
        .filter(|l| !l.is_empty())
        .filter(|l| seen.insert(l.clone()))
        .filter(|l| !is_ignored_link(l))
        .collect()
}

/// Turn user input into an absolute http(s) site URL.
///
/// Input without a scheme is assumed to be `https://`.
pub fn normalize_site_url(input: &str) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AuditError::InvalidRequest("url must not be empty".into()));
    }
    let with_https = || {
        Url::parse(&format!("https://{input}"))
            .map_err(|e| AuditError::InvalidRequest(format!("invalid url '{input}': {e}")))
    };
    let parsed = match Url::parse(input) {
        Ok(url) if is_host_with_port(input, &url) => with_https()?,
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => with_https()?,
        Err(e) => {
            return Err(AuditError::InvalidRequest(format!(
                "invalid url '{input}': {e}"
            )))
        }
    };
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(parsed.to_string()),
        _ => Err(AuditError::InvalidRequest(format!(
            "url '{input}' must use http or https"
        ))),
    }
}

/// `example.org:8080` and `localhost:3000/path` parse as a URL whose scheme
/// is the host name.
fn is_host_with_port(input: &str, parsed: &Url) -> bool {
    if parsed.scheme().contains('.') {
        return true;
    }
    input
        .split_once(':')
        .and_then(|(_, rest)| rest.split('/').next())
        .is_some_and(|port| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()))
}

/// Resolve a link found on `base` to an absolute URL without fragment.
///
/// Links that cannot be resolved are returned unchanged.
pub fn resolve_link(base: &str, link: &str) -> String {
    let link = link.trim();
    let resolved = match Url::parse(link) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(base).ok().and_then(|b| b.join(link).ok())
        }
        Err(_) => None,
    };
    match resolved {
        Some(mut url) if matches!(url.scheme(), "http" | "https") => {
            url.set_fragment(None);
            url.to_string()
        }
        _ => link.to_string(),
    }
}

/// Remove links the user chose to skip.
pub fn exclude_links(links: Vec<String>, ignored: &[String]) -> Vec<String> {
    if ignored.is_empty() {
        return links;
    }
    let ignored: HashSet<&str> = ignored.iter().map(|s| s.trim()).collect();
    links
        .into_iter()
        .filter(|l| !ignored.contains(l.as_str()))
        .collect()
}
