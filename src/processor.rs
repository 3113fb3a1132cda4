//! Per-video processing: description links in, at most one job record out.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::browser::{BrowserError, PageSession};
use crate::config::{Config, PageSelectors};
use crate::constants::UNKNOWN_CHANNEL;
use crate::links::{extract_links, normalize_all, CandidateLink, LinkClassifier};
use crate::notify::Notifier;
use crate::store::{self, JobRecord, JobStore, StoreError};

/// Failures that mean the page no longer looks the way we expect, or that
/// the store cannot be trusted. Both stop the run.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to load video {url}: {source}")]
    Navigation {
        url: String,
        #[source]
        source: BrowserError,
    },
    #[error("failed to read title of {url}: {source}")]
    Title {
        url: String,
        #[source]
        source: BrowserError,
    },
    #[error("video {url} has an empty title")]
    EmptyTitle { url: String },
    #[error("description panel never appeared on {url}: {source}")]
    DescriptionMissing {
        url: String,
        #[source]
        source: BrowserError,
    },
    #[error("failed to read description of {url}: {source}")]
    Description {
        url: String,
        #[source]
        source: BrowserError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// How processing one video ended, short of a fatal error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoOutcome {
    /// A new record was written to the store.
    Saved(JobRecord),
    /// The description had no links the classifier accepted.
    NoJobLinks,
    /// The store already holds a record for this video.
    AlreadyExists,
}

/// The value a best-effort step produced, and whether it is the fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt<T> {
    pub value: T,
    pub fell_back: bool,
}

/// Run `step`; on failure log it and use `fallback` instead.
pub async fn attempt_or<T, E, F>(what: &str, step: F, fallback: T) -> Attempt<T>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match step.await {
        Ok(value) => Attempt {
            value,
            fell_back: false,
        },
        Err(e) => {
            debug!(step = %what, error = %e, "Best-effort step failed, using fallback");
            Attempt {
                value: fallback,
                fell_back: true,
            }
        }
    }
}

pub struct VideoProcessor {
    selectors: PageSelectors,
    page_timeout: Duration,
    channel_name_timeout: Duration,
    expand_settle: Duration,
    source_tag: String,
    classifier: LinkClassifier,
    store: JobStore,
    notifier: Arc<dyn Notifier>,
}

impl VideoProcessor {
    #[must_use]
    pub fn new(config: &Config, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            selectors: config.selectors.clone(),
            page_timeout: config.page_timeout,
            channel_name_timeout: config.channel_name_timeout,
            expand_settle: config.expand_settle,
            source_tag: config.source_tag.clone(),
            classifier: LinkClassifier::new(&config.classifier),
            store: JobStore::new(config.data_file.clone()),
            notifier,
        }
    }

    #[must_use]
    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Process one video page.
    ///
    /// # Errors
    ///
    /// Returns an error when the page cannot be loaded, its title or
    /// description panel cannot be read, or the store cannot be read or written.
    pub async fn process(
        &self,
        session: &dyn PageSession,
        video_url: &str,
    ) -> Result<VideoOutcome, ProcessError> {
        session
            .navigate(video_url)
            .await
            .map_err(|source| ProcessError::Navigation {
                url: video_url.to_string(),
                source,
            })?;

        let title = self.read_title(session, video_url).await?;
        let channel_name = self.read_channel_name(session).await;

        let links = self.read_description_links(session, video_url).await?;
        let links = normalize_all(links);
        debug!(url = %video_url, candidates = links.len(), "Description links extracted");

        let job_links = self.classifier.classify(&links);
        if job_links.is_empty() {
            info!(title = %title, "No job links found");
            return Ok(VideoOutcome::NoJobLinks);
        }

        let mut records = self.store.load().await?;
        if store::contains(&records, &title, video_url) {
            info!(title = %title, "Job already exists for this video");
            return Ok(VideoOutcome::AlreadyExists);
        }

        let record = JobRecord::new(
            &self.source_tag,
            &title,
            &channel_name,
            video_url,
            job_links,
        );
        records.push(record.clone());
        self.store.save(&records).await?;

        info!(title = %title, links = record.job_links.len(), "New job saved");

        // The record is already durable; a failed alert is only worth a warning
        if let Err(e) = self.notifier.notify(&record).await {
            warn!(title = %title, "Failed to send job alert: {e}");
        }

        Ok(VideoOutcome::Saved(record))
    }

    async fn read_title(
        &self,
        session: &dyn PageSession,
        video_url: &str,
    ) -> Result<String, ProcessError> {
        let title = session
            .title()
            .await
            .map_err(|source| ProcessError::Title {
                url: video_url.to_string(),
                source,
            })?
            .map(|t| t.trim().to_string())
            .unwrap_or_default();

        if title.is_empty() {
            return Err(ProcessError::EmptyTitle {
                url: video_url.to_string(),
            });
        }
        Ok(title)
    }

    async fn read_channel_name(&self, session: &dyn PageSession) -> String {
        let lookup = async {
            let name = session
                .text(&self.selectors.channel_name, self.channel_name_timeout)
                .await?;
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(BrowserError::NotFound(self.selectors.channel_name.clone()));
            }
            Ok::<_, BrowserError>(name)
        };

        attempt_or("channel name", lookup, UNKNOWN_CHANNEL.to_string())
            .await
            .value
    }

    async fn read_description_links(
        &self,
        session: &dyn PageSession,
        video_url: &str,
    ) -> Result<Vec<CandidateLink>, ProcessError> {
        session
            .wait_for_selector(&self.selectors.description, self.page_timeout)
            .await
            .map_err(|source| ProcessError::DescriptionMissing {
                url: video_url.to_string(),
                source,
            })?;

        let expanded = attempt_or(
            "expand description",
            session.click_text(&self.selectors.description, &self.selectors.expand_text),
            false,
        )
        .await;
        if expanded.value {
            tokio::time::sleep(self.expand_settle).await;
        }

        let html = session
            .inner_html(&self.selectors.description)
            .await
            .map_err(|source| ProcessError::Description {
                url: video_url.to_string(),
                source,
            })?;

        Ok(extract_links(&html, video_url))
    }
}
