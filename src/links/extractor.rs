use scraper::{Html, Selector};
use url::Url;

/// A link pulled out of a video description, before any classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLink {
    /// The href, resolved against the page URL.
    pub url: String,
    /// Visible anchor text with whitespace collapsed.
    pub text: String,
}

impl CandidateLink {
    #[must_use]
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
        }
    }
}

/// Extract every anchor from a description panel's markup.
///
/// Relative hrefs are resolved against `page_url`. Empty hrefs, in-page
/// anchors, `javascript:` and `mailto:` links are skipped. Duplicates are kept;
/// the classifier deduplicates after redirect unwrapping.
#[must_use]
pub fn extract_links(html: &str, page_url: &str) -> Vec<CandidateLink> {
    let document = Html::parse_fragment(html);
    let link_selector = Selector::parse("a[href]").expect("Invalid selector");
    let base = Url::parse(page_url).ok();

    let mut links = Vec::new();

    for element in document.select(&link_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();

        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
        {
            continue;
        }

        let Some(url) = resolve_href(base.as_ref(), href) else {
            continue;
        };

        let text = element
            .text()
            .flat_map(str::split_whitespace)
            .collect::<Vec<_>>()
            .join(" ");

        links.push(CandidateLink { url, text });
    }

    links
}

fn resolve_href(base: Option<&Url>, href: &str) -> Option<String> {
    if let Ok(absolute) = Url::parse(href) {
        return Some(absolute.to_string());
    }
    base.and_then(|b| b.join(href).ok()).map(|u| u.to_string())
}
