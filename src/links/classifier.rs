//! Job link classification.
//!
//! Each link runs through an ordered rule chain (exclude, trust, keyword) and
//! the first rule that fires decides. Links no rule claims are rejected.

use std::collections::HashSet;

use super::extractor::CandidateLink;

/// Pattern lists driving the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierConfig {
    /// URL substrings that always reject (social, messaging, the channel's own pages).
    pub exclude: Vec<String>,
    /// URL substrings of known application-form hosts that always accept.
    pub trusted: Vec<String>,
    /// Substrings of the URL or display text that signal a job posting.
    pub keywords: Vec<String>,
}

pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    "instagram",
    "telegram",
    "whatsapp",
    "facebook",
    "discord",
    "twitter",
    "youtube.com/channel",
    "youtube.com/watch",
    "youtube.com/hashtag",
    "youtube.com/@",
];

pub const DEFAULT_TRUSTED_PLATFORMS: &[&str] =
    &["forms.gle", "docs.google.com", "notion.site", "airtable.com"];

pub const DEFAULT_JOB_KEYWORDS: &[&str] = &[
    "job",
    "career",
    "careers",
    "apply",
    "hiring",
    "opening",
    "backend",
    "engineer",
    "developer",
    "role",
    "position",
    "vacancy",
];

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            exclude: to_owned_list(DEFAULT_EXCLUDE_PATTERNS),
            trusted: to_owned_list(DEFAULT_TRUSTED_PLATFORMS),
            keywords: to_owned_list(DEFAULT_JOB_KEYWORDS),
        }
    }
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

/// Which rule decided a link's fate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Exclude,
    Trust,
    Keyword,
}

/// A single rule in the chain. Patterns are stored lowercased.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Reject when the URL contains any pattern.
    Exclude(Vec<String>),
    /// Accept when the URL contains any pattern.
    Trust(Vec<String>),
    /// Accept when the URL or display text contains any pattern.
    Keyword(Vec<String>),
}

impl Rule {
    #[must_use]
    pub fn kind(&self) -> RuleKind {
        match self {
            Self::Exclude(_) => RuleKind::Exclude,
            Self::Trust(_) => RuleKind::Trust,
            Self::Keyword(_) => RuleKind::Keyword,
        }
    }

    /// Returns `Some(accepted)` when this rule fires, `None` to fall through.
    ///
    /// `url` and `text` must already be lowercased.
    fn evaluate(&self, url: &str, text: &str) -> Option<bool> {
        match self {
            Self::Exclude(patterns) => contains_any(url, patterns).then_some(false),
            Self::Trust(patterns) => contains_any(url, patterns).then_some(true),
            Self::Keyword(patterns) => {
                (contains_any(url, patterns) || contains_any(text, patterns)).then_some(true)
            }
        }
    }
}

fn contains_any(haystack: &str, patterns: &[String]) -> bool {
    patterns
        .iter()
        .any(|p| !p.is_empty() && haystack.contains(p.as_str()))
}

/// Outcome of classifying one link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub accepted: bool,
    /// The rule that fired, or `None` when the link fell through every rule.
    pub decided_by: Option<RuleKind>,
}

/// Ordered rule chain separating job links from noise.
#[derive(Debug, Clone)]
pub struct LinkClassifier {
    rules: Vec<Rule>,
}

impl LinkClassifier {
    #[must_use]
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            rules: vec![
                Rule::Exclude(lowercase_all(&config.exclude)),
                Rule::Trust(lowercase_all(&config.trusted)),
                Rule::Keyword(lowercase_all(&config.keywords)),
            ],
        }
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Run one link through the rule chain.
    #[must_use]
    pub fn classify_link(&self, url: &str, text: &str) -> Verdict {
        let url = url.to_lowercase();
        let text = text.to_lowercase();

        for rule in &self.rules {
            if let Some(accepted) = rule.evaluate(&url, &text) {
                return Verdict {
                    accepted,
                    decided_by: Some(rule.kind()),
                };
            }
        }

        Verdict {
            accepted: false,
            decided_by: None,
        }
    }

    /// Return the accepted URLs, each at most once, in first-seen order.
    #[must_use]
    pub fn classify(&self, links: &[CandidateLink]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut accepted = Vec::new();

        for link in links {
            if !self.classify_link(&link.url, &link.text).accepted {
                continue;
            }
            if seen.insert(link.url.as_str()) {
                accepted.push(link.url.clone());
            }
        }

        accepted
    }
}

impl Default for LinkClassifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

fn lowercase_all(patterns: &[String]) -> Vec<String> {
    patterns.iter().map(|p| p.to_lowercase()).collect()
}
