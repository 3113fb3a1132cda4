//! Delivery of new job records to a chat.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use crate::store::JobRecord;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("telegram request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("telegram rejected message with status {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Something that announces a freshly recorded job.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one record.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails.
    async fn notify(&self, record: &JobRecord) -> Result<(), NotifyError>;
}

/// Notifier that only writes the message to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, record: &JobRecord) -> Result<(), NotifyError> {
        info!(
            title = %record.video_title,
            links = record.job_links.len(),
            "Telegram not configured, job alert logged only"
        );
        debug!(message = %format_job_message(record), "Job alert");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

/// Posts job alerts through the Telegram Bot API.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_url: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    /// Create a notifier for `chat_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_url: &str, bot_token: &str, chat_id: &str) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(NotifyError::Client)?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
        })
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_url, self.bot_token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, record: &JobRecord) -> Result<(), NotifyError> {
        let text = format_job_message(record);
        let body = SendMessage {
            chat_id: &self.chat_id,
            text: &text,
            parse_mode: "Markdown",
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(self.send_message_url())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status, body });
        }

        debug!(title = %record.video_title, "Job alert delivered to Telegram");
        Ok(())
    }
}

/// Pick the Telegram notifier when credentials are configured, else log only.
///
/// # Errors
///
/// Returns an error if the Telegram client cannot be built.
pub fn notifier_from_config(config: &Config) -> Result<Arc<dyn Notifier>, NotifyError> {
    match (&config.telegram_bot_token, &config.telegram_chat_id) {
        (Some(token), Some(chat_id)) => Ok(Arc::new(TelegramNotifier::new(
            &config.telegram_api_url,
            token,
            chat_id,
        )?)),
        _ => Ok(Arc::new(LogNotifier)),
    }
}

/// Render a record as a Telegram Markdown message.
#[must_use]
pub fn format_job_message(record: &JobRecord) -> String {
    let mut message = format!(
        "🔥 *New Job Alert ({})*\n\n📌 *{}*\n🎥 Channel: {}\n\n🔗 *Apply Links:*\n",
        escape_markdown(&record.source),
        escape_markdown(&record.video_title),
        escape_markdown(&record.channel_name),
    );

    for (i, link) in record.job_links.iter().enumerate() {
        let _ = writeln!(message, "{}. {}", i + 1, escape_markdown(link));
    }

    let _ = write!(message, "\n⏰ Added: {}", record.added_at);
    message
}

/// Escape the characters legacy Telegram Markdown treats as entity delimiters.
fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
