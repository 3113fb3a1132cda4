//! One scan-and-process pass over the channel.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::browser::{BrowserError, ChromeSession, PageSession};
use crate::config::Config;
use crate::notify::Notifier;
use crate::processor::{ProcessError, VideoOutcome, VideoProcessor};
use crate::scanner::ChannelScanner;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("browser session failed: {0}")]
    Browser(#[source] BrowserError),
    #[error("failed to scan channel listing: {0}")]
    Scan(#[source] BrowserError),
    #[error("processing {url} failed: {source}")]
    Video {
        url: String,
        #[source]
        source: ProcessError,
    },
}

/// Tally of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub videos_found: usize,
    pub saved: usize,
    pub no_job_links: usize,
    pub already_recorded: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &VideoOutcome) {
        match outcome {
            VideoOutcome::Saved(_) => self.saved += 1,
            VideoOutcome::NoJobLinks => self.no_job_links += 1,
            VideoOutcome::AlreadyExists => self.already_recorded += 1,
        }
    }
}

/// Scan the channel and process each video in listing order.
///
/// Non-matching and already-recorded videos are skipped; the first fatal
/// processing error ends the run.
///
/// # Errors
///
/// Returns an error if the listing cannot be scanned or any video fails fatally.
pub async fn run_with_session(
    session: &dyn PageSession,
    scanner: &ChannelScanner,
    processor: &VideoProcessor,
    max_videos: usize,
) -> Result<RunSummary, PipelineError> {
    let video_urls = scanner
        .latest_video_urls(session, max_videos)
        .await
        .map_err(PipelineError::Scan)?;

    let mut summary = RunSummary {
        videos_found: video_urls.len(),
        ..RunSummary::default()
    };

    for url in &video_urls {
        info!(url = %url, "Processing video");
        let outcome = processor
            .process(session, url)
            .await
            .map_err(|source| PipelineError::Video {
                url: url.clone(),
                source,
            })?;
        summary.record(&outcome);
    }

    Ok(summary)
}

/// Launch a browser, run one pass, and close the browser whatever happened.
///
/// # Errors
///
/// Returns an error if the browser cannot be launched or the pass fails.
pub async fn run_once(
    config: &Config,
    notifier: Arc<dyn Notifier>,
) -> Result<RunSummary, PipelineError> {
    let session = ChromeSession::launch(&config.browser_settings())
        .await
        .map_err(PipelineError::Browser)?;

    let scanner = ChannelScanner::new(config);
    let processor = VideoProcessor::new(config, notifier);

    let result = run_with_session(&session, &scanner, &processor, config.max_videos).await;
    session.close().await;

    match &result {
        Ok(summary) => info!(
            videos = summary.videos_found,
            saved = summary.saved,
            no_job_links = summary.no_job_links,
            already_recorded = summary.already_recorded,
            "Run complete"
        ),
        Err(e) => warn!("Run aborted: {e}"),
    }

    result
}
