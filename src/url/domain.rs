use url::Url;

/// Extracts the lowercase host from a URL
///
/// Ports are not part of the result, so `https://example.com:8443/` and
/// `http://example.com/` share a domain.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sitemapper::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.com:8443/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("mailto:someone@example.com").unwrap();
/// assert_eq!(extract_domain(&url), None);
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks if a host matches a domain pattern
///
/// Patterns are either an exact host (`example.com`) or a wildcard
/// (`*.example.com`) that matches the bare domain and any subdomain of it.
/// Both sides are compared case-insensitively.
pub fn matches_pattern(pattern: &str, host: &str) -> bool {
    let pattern = pattern.to_lowercase();
    let host = host.to_lowercase();

    match pattern.strip_prefix("*.") {
        Some(base) => host == base || host.ends_with(&format!(".{}", base)),
        None => host == pattern,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_domain() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_ignores_port() {
        let url = Url::parse("http://127.0.0.1:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("127.0.0.1".to_string()));
    }

    #[test]
    fn test_extract_mixed_case() {
        let url = Url::parse("https://Foo.Bar.COM/Path").unwrap();
        assert_eq!(extract_domain(&url), Some("foo.bar.com".to_string()));
    }

    #[test]
    fn test_pattern_exact() {
        assert!(matches_pattern("example.com", "example.com"));
        assert!(!matches_pattern("example.com", "blog.example.com"));
        assert!(!matches_pattern("example.com", "other.com"));
    }

    #[test]
    fn test_pattern_wildcard() {
        assert!(matches_pattern("*.example.com", "example.com"));
        assert!(matches_pattern("*.example.com", "blog.example.com"));
        assert!(matches_pattern("*.example.com", "api.v2.example.com"));
        assert!(!matches_pattern("*.example.com", "notexample.com"));
        assert!(!matches_pattern("*.example.com", "example.org"));
    }

    #[test]
    fn test_pattern_case_insensitive() {
        assert!(matches_pattern("*.Example.com", "BLOG.example.COM"));
    }
}
