mod classifier;
mod extractor;
mod normalize;

pub use classifier::{
    ClassifierConfig, LinkClassifier, Rule, RuleKind, Verdict, DEFAULT_EXCLUDE_PATTERNS,
    DEFAULT_JOB_KEYWORDS, DEFAULT_TRUSTED_PLATFORMS,
};
pub use extractor::{extract_links, CandidateLink};
pub use normalize::unwrap_redirect;

/// Unwrap every candidate's URL in place, keeping its display text.
#[must_use]
pub fn normalize_all(links: Vec<CandidateLink>) -> Vec<CandidateLink> {
    links
        .into_iter()
        .map(|link| CandidateLink {
            url: unwrap_redirect(&link.url),
            text: link.text,
        })
        .collect()
}
