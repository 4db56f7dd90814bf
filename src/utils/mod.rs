//! Utility functions and helpers.

pub mod http;
pub mod log;

use url::Url;

use crate::error::{AppError, Result};

/// Extract the host of a URL string.
///
/// Fails with [`AppError::MalformedUrl`] when the string does not parse or
/// carries no host (e.g. `mailto:` or `file:///`).
pub fn host_of(url_str: &str) -> Result<String> {
    let url = Url::parse(url_str).map_err(|e| AppError::malformed_url(url_str, e))?;
    url.host_str()
        .filter(|host| !host.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::malformed_url(url_str, "URL has no host"))
}

/// Resolve a link found on a page against the page URL.
///
/// Anchors and non-navigational schemes are skipped, fragments are stripped
/// and only `http`/`https` results are kept.
pub fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://example.com/path").unwrap(), "example.com");
        assert_eq!(
            host_of("https://sub.example.com:8080/path").unwrap(),
            "sub.example.com"
        );
    }

    #[test]
    fn test_host_of_malformed() {
        assert!(matches!(
            host_of("not a url"),
            Err(AppError::MalformedUrl { .. })
        ));
        assert!(matches!(
            host_of("mailto:someone@example.com"),
            Err(AppError::MalformedUrl { .. })
        ));
    }

    #[test]
    fn test_resolve_link() {
        let base = Url::parse("https://example.com/path/").unwrap();
        assert_eq!(
            resolve_link(&base, "page.html"),
            Some("https://example.com/path/page.html".to_string())
        );
        assert_eq!(
            resolve_link(&base, "/root.html#top"),
            Some("https://example.com/root.html".to_string())
        );
        assert_eq!(
            resolve_link(&base, "https://other.com/x"),
            Some("https://other.com/x".to_string())
        );
    }

    #[test]
    fn test_resolve_link_skips_special() {
        let base = Url::parse("https://example.com/").unwrap();
        assert_eq!(resolve_link(&base, "#section"), None);
        assert_eq!(resolve_link(&base, "mailto:a@example.com"), None);
        assert_eq!(resolve_link(&base, "javascript:void(0)"), None);
        assert_eq!(resolve_link(&base, "ftp://example.com/file"), None);
    }
}
