use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use crate::browser::{BrowserError, ElementInfo, PageSession};
use crate::config::{Config, PageSelectors};

/// Pixels scrolled to make the listing load its first batch of videos.
const LAZY_LOAD_SCROLL: i64 = 2000;

/// Path every video page lives under.
const WATCH_PATH: &str = "/watch";

/// Finds the most recent uploads on a channel's video listing.
#[derive(Debug, Clone)]
pub struct ChannelScanner {
    channel_url: String,
    selectors: PageSelectors,
    load_timeout: Duration,
    scroll_settle: Duration,
}

impl ChannelScanner {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            channel_url: config.channel_url.clone(),
            selectors: config.selectors.clone(),
            load_timeout: config.page_timeout,
            scroll_settle: config.scroll_settle,
        }
    }

    #[must_use]
    pub fn channel_url(&self) -> &str {
        &self.channel_url
    }

    /// Return up to `max` video URLs, newest first as the listing presents them.
    ///
    /// A listing whose items never appear yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be loaded or queried.
    pub async fn latest_video_urls(
        &self,
        session: &dyn PageSession,
        max: usize,
    ) -> Result<Vec<String>, BrowserError> {
        session.navigate(&self.channel_url).await?;

        // The grid is lazy-loaded; nudge it before reading
        if let Err(e) = session.scroll_by(LAZY_LOAD_SCROLL).await {
            debug!(error = %e, "Scroll failed, reading listing as-is");
        }
        tokio::time::sleep(self.scroll_settle).await;

        match session
            .wait_for_selector(&self.selectors.video_item, self.load_timeout)
            .await
        {
            Ok(()) => {}
            Err(BrowserError::Timeout { .. }) => {
                warn!(channel = %self.channel_url, "No videos appeared on channel listing");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        }

        let elements = session.query_all(&self.selectors.video_link).await?;
        let urls = self.video_urls_from(&elements, max);

        info!(channel = %self.channel_url, count = urls.len(), "Found videos");
        Ok(urls)
    }

    fn video_urls_from(&self, elements: &[ElementInfo], max: usize) -> Vec<String> {
        let Ok(base) = Url::parse(&self.channel_url) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut urls = Vec::new();

        for href in elements.iter().filter_map(|e| e.href.as_deref()) {
            if urls.len() >= max {
                break;
            }
            let Ok(url) = base.join(href) else {
                continue;
            };
            if url.path() != WATCH_PATH {
                continue;
            }
            let url = url.to_string();
            if seen.insert(url.clone()) {
                urls.push(url);
            }
        }

        urls
    }
}
