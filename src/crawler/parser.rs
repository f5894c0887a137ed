//! HTML parser for extracting links and metadata
//!
//! This module handles parsing HTML content to extract:
//! - Hyperlinks (`<a href>`) and embedded resources (`<img src>`)
//! - The document base (`<base href>`) used to resolve them
//! - Page title

use crate::crawler::site_map::{Link, LinkKind};
use crate::url::resolve_link;
use scraper::{Html, Selector};
use url::Url;

/// Extracts every link from an HTML document, in document order
///
/// Relative references are resolved against the document's `<base href>`
/// when present, otherwise against `page_url`. References that are empty,
/// fragment-only or unresolvable are skipped. Non-HTTP schemes such as
/// `mailto:` are kept as written; whether they are followed is up to the
/// eligibility filter.
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `page_url` - The URL the document was served from (after redirects)
///
/// # Example
///
/// ```
/// use sitemapper::crawler::extract_links;
/// use sitemapper::{Link, LinkKind};
/// use url::Url;
///
/// let html = r#"<a href="/about">About</a><img src="logo.png">"#;
/// let page_url = Url::parse("https://example.com/index.html").unwrap();
/// let links = extract_links(html, &page_url);
/// assert_eq!(
///     links,
///     vec![
///         Link::new(LinkKind::Hyperlink, "https://example.com/about"),
///         Link::new(LinkKind::EmbeddedResource, "https://example.com/logo.png"),
///     ]
/// );
/// ```
pub fn extract_links(html: &str, page_url: &Url) -> Vec<Link> {
    let document = Html::parse_document(html);
    let base_url = document_base(&document, page_url);

    let selector = match Selector::parse("a[href], img[src]") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    let mut links = Vec::new();
    for element in document.select(&selector) {
        let (kind, attr) = match element.value().name() {
            "a" => (LinkKind::Hyperlink, "href"),
            "img" => (LinkKind::EmbeddedResource, "src"),
            _ => continue,
        };

        if let Some(target) = element
            .value()
            .attr(attr)
            .and_then(|value| resolve_link(&base_url, value))
        {
            links.push(Link::new(kind, target));
        }
    }

    links
}

/// Extracts the page title from an HTML document
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolves the first `<base href>` against the page URL
fn document_base(document: &Html, page_url: &Url) -> Url {
    let base_href = Selector::parse("base[href]").ok().and_then(|selector| {
        document
            .select(&selector)
            .next()
            .and_then(|element| element.value().attr("href"))
            .map(str::to_string)
    });

    base_href
        .and_then(|href| page_url.join(href.trim()).ok())
        .unwrap_or_else(|| page_url.clone())
}
