use url::Url;

/// Resolves a raw `href`/`src` attribute value against a base URL
///
/// Returns None if the value should not be recorded at all:
/// - empty (after trimming surrounding whitespace)
/// - fragment-only (`#section`), which points back at the same document
/// - not resolvable against `base`
///
/// Everything else is returned in its resolved absolute form, including
/// non-HTTP schemes such as `mailto:`. Deciding whether those are worth
/// following is the eligibility predicate's job, not the resolver's.
pub fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    base.join(href).ok().map(|resolved| resolved.to_string())
}
