//! Shared fixtures: a scripted page session and a recording notifier.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use channel_job_watcher::browser::{BrowserError, ElementInfo, PageSession};
use channel_job_watcher::config::{Config, PageSelectors};
use channel_job_watcher::notify::{Notifier, NotifyError};
use channel_job_watcher::store::JobRecord;

pub const CHANNEL_URL: &str = "https://www.youtube.com/@testchannel/videos";

/// Test configuration writing its store under `dir`.
pub fn config_in(dir: &Path) -> Config {
    Config {
        channel_url: CHANNEL_URL.to_string(),
        data_file: dir.join("data").join("jobs.json"),
        ..Config::for_testing()
    }
}

pub fn watch_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={id}")
}

/// What a fake video page exposes.
#[derive(Debug, Clone, Default)]
pub struct FakeVideo {
    pub title: Option<String>,
    pub channel: Option<String>,
    pub description: Option<String>,
    pub show_more: bool,
    pub show_more_fails: bool,
    /// The title lookup itself errors, rather than returning nothing.
    pub title_fails: bool,
    /// The description panel is present but reading its HTML errors.
    pub description_read_fails: bool,
}

impl FakeVideo {
    pub fn new(title: &str, description: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            channel: Some("Tech Jobs Daily".to_string()),
            description: Some(description.to_string()),
            ..Self::default()
        }
    }
}

/// A page session driven entirely by canned data.
#[derive(Debug, Default)]
pub struct FakeSession {
    selectors: PageSelectors,
    /// `None` means the listing's items never appear.
    listing: Option<Vec<ElementInfo>>,
    videos: HashMap<String, FakeVideo>,
    current: Mutex<String>,
    pub visited: Mutex<Vec<String>>,
    pub expand_clicks: Mutex<usize>,
    /// Scope selector passed to every `click_text` call.
    pub click_scopes: Mutex<Vec<String>>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self {
            selectors: PageSelectors::default(),
            ..Self::default()
        }
    }

    /// Listing whose thumbnails link to the given video ids, in order.
    pub fn with_listing(mut self, ids: &[&str]) -> Self {
        self.listing = Some(
            ids.iter()
                .map(|id| ElementInfo {
                    href: Some(format!("/watch?v={id}")),
                })
                .collect(),
        );
        self
    }

    pub fn with_video(mut self, id: &str, video: FakeVideo) -> Self {
        self.videos.insert(watch_url(id), video);
        self
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }

    fn current_video(&self) -> Option<FakeVideo> {
        let current = self.current.lock().unwrap().clone();
        self.videos.get(&current).cloned()
    }

    fn on_listing(&self) -> bool {
        *self.current.lock().unwrap() == CHANNEL_URL
    }

    fn present(&self, selector: &str) -> bool {
        if self.on_listing() {
            return selector == self.selectors.video_item && self.listing.is_some();
        }
        let Some(video) = self.current_video() else {
            return false;
        };
        if selector == self.selectors.description {
            video.description.is_some()
        } else if selector == self.selectors.channel_name {
            video.channel.is_some()
        } else {
            false
        }
    }
}

#[async_trait]
impl PageSession for FakeSession {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        self.visited.lock().unwrap().push(url.to_string());
        if url != CHANNEL_URL && !self.videos.contains_key(url) {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        *self.current.lock().unwrap() = url.to_string();
        Ok(())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        if self.present(selector) {
            Ok(())
        } else {
            Err(BrowserError::Timeout {
                selector: selector.to_string(),
                timeout,
            })
        }
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementInfo>, BrowserError> {
        if self.on_listing() && selector == self.selectors.video_link {
            return Ok(self.listing.clone().unwrap_or_default());
        }
        Ok(Vec::new())
    }

    async fn title(&self) -> Result<Option<String>, BrowserError> {
        let video = self.current_video().unwrap_or_default();
        if video.title_fails {
            return Err(BrowserError::Script("target closed".to_string()));
        }
        Ok(video.title)
    }

    async fn text(&self, selector: &str, timeout: Duration) -> Result<String, BrowserError> {
        self.wait_for_selector(selector, timeout).await?;
        self.current_video()
            .and_then(|v| v.channel)
            .ok_or_else(|| BrowserError::NotFound(selector.to_string()))
    }

    async fn inner_html(&self, selector: &str) -> Result<String, BrowserError> {
        let video = self.current_video().unwrap_or_default();
        if video.description_read_fails {
            return Err(BrowserError::Script("node detached".to_string()));
        }
        video
            .description
            .ok_or_else(|| BrowserError::NotFound(selector.to_string()))
    }

    async fn scroll_by(&self, _delta_y: i64) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn click_text(&self, scope: &str, _text: &str) -> Result<bool, BrowserError> {
        self.click_scopes.lock().unwrap().push(scope.to_string());
        let video = self.current_video().unwrap_or_default();
        if video.show_more_fails {
            return Err(BrowserError::Script("element detached".to_string()));
        }
        if video.show_more {
            *self.expand_clicks.lock().unwrap() += 1;
        }
        Ok(video.show_more)
    }
}

/// Notifier that remembers what it was asked to send.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<JobRecord>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<JobRecord> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, record: &JobRecord) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(record.clone());
        if self.fail {
            return Err(NotifyError::Rejected {
                status: reqwest::StatusCode::BAD_GATEWAY,
                body: "upstream unavailable".to_string(),
            });
        }
        Ok(())
    }
}
