//! Page automation capability used by the scanner and video processor.
//!
//! The pipeline only talks to [`PageSession`]; [`chrome::ChromeSession`] backs it
//! with headless Chromium, tests back it with a scripted fake.

pub mod chrome;

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

pub use chrome::{BrowserSettings, ChromeSession};

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to launch browser: {0}")]
    Launch(String),
    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },
    #[error("timed out after {timeout:?} waiting for `{selector}`")]
    Timeout { selector: String, timeout: Duration },
    #[error("no element matches `{0}`")]
    NotFound(String),
    #[error("page script failed: {0}")]
    Script(String),
    #[error(transparent)]
    Cdp(#[from] chromiumoxide::error::CdpError),
}

/// Snapshot of one element returned by [`PageSession::query_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ElementInfo {
    /// The raw `href` attribute, if any.
    pub href: Option<String>,
}

/// A single browser tab.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Load `url` and wait for the navigation to settle.
    async fn navigate(&self, url: &str) -> Result<(), BrowserError>;

    /// Wait until an element matches `selector`.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration)
        -> Result<(), BrowserError>;

    /// Snapshot every element currently matching `selector`.
    async fn query_all(&self, selector: &str) -> Result<Vec<ElementInfo>, BrowserError>;

    /// Current document title.
    async fn title(&self) -> Result<Option<String>, BrowserError>;

    /// Rendered text of the first element matching `selector`, waiting up to `timeout`.
    async fn text(&self, selector: &str, timeout: Duration) -> Result<String, BrowserError>;

    /// Inner HTML of every element matching `selector`, concatenated in document order.
    async fn inner_html(&self, selector: &str) -> Result<String, BrowserError>;

    /// Scroll the viewport vertically by `delta_y` pixels.
    async fn scroll_by(&self, delta_y: i64) -> Result<(), BrowserError>;

    /// Click the first visible element inside `scope` whose text is exactly `text`.
    ///
    /// Returns `false` when nothing matched.
    async fn click_text(&self, scope: &str, text: &str) -> Result<bool, BrowserError>;
}
