//! Headless Chromium implementation of [`PageSession`].

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures_util::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::{BrowserError, ElementInfo, PageSession};
use crate::constants::BROWSER_USER_AGENT;

/// Default viewport width in pixels.
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1280;

/// Default viewport height in pixels.
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 900;

/// How often `wait_for_selector` re-checks the DOM.
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Browser launch options.
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    /// Path to Chrome/Chromium executable (None for auto-detection).
    pub chrome_path: Option<String>,
    pub headless: bool,
    /// CDP request timeout, also the upper bound for page loads.
    pub page_timeout: Duration,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            page_timeout: Duration::from_secs(15),
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
        }
    }
}

/// One Chromium process with a single open tab.
pub struct ChromeSession {
    browser: Mutex<Browser>,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromeSession {
    /// Launch Chromium and open a blank tab.
    ///
    /// # Errors
    ///
    /// Returns an error if the browser cannot be started or the tab cannot be opened.
    pub async fn launch(settings: &BrowserSettings) -> Result<Self, BrowserError> {
        info!(headless = settings.headless, "Launching browser");

        let mut config_builder = BrowserConfig::builder()
            .window_size(settings.viewport_width, settings.viewport_height)
            .request_timeout(settings.page_timeout)
            .no_sandbox()
            .disable_default_args()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--disable-sync")
            .arg("--mute-audio")
            .arg(format!("--user-agent={BROWSER_USER_AGENT}"));

        config_builder = if settings.headless {
            config_builder.arg("--headless=new")
        } else {
            config_builder.with_head()
        };

        if let Some(ref chrome_path) = settings.chrome_path {
            config_builder = config_builder.chrome_executable(chrome_path);
        }

        let browser_config = config_builder.build().map_err(BrowserError::Launch)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        // The CDP handler must be polled for the browser to make progress
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {e}");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(BrowserError::Launch(format!("failed to open tab: {e}")));
            }
        };

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler,
        })
    }

    /// Shut the browser down and stop the event handler.
    pub async fn close(self) {
        let mut browser = self.browser.into_inner();
        if let Err(e) = browser.close().await {
            error!("Failed to close browser: {e}");
        } else if let Err(e) = browser.wait().await {
            warn!("Browser did not exit cleanly: {e}");
        } else {
            info!("Browser shutdown complete");
        }
        self.handler.abort();
    }

    async fn evaluate_json<T: serde::de::DeserializeOwned>(
        &self,
        script: String,
    ) -> Result<T, BrowserError> {
        self.page
            .evaluate(script)
            .await?
            .into_value::<T>()
            .map_err(|e| BrowserError::Script(e.to_string()))
    }

    async fn first_match(&self, selector: &str) -> Result<chromiumoxide::Element, BrowserError> {
        self.page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::NotFound(selector.to_string()))
    }
}

/// Encode a Rust string as a JavaScript string literal.
fn js_string(value: &str) -> Result<String, BrowserError> {
    serde_json::to_string(value).map_err(|e| BrowserError::Script(e.to_string()))
}

#[async_trait]
impl PageSession for ChromeSession {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        debug!(url = %url, "Navigating");
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let poll = async {
            loop {
                if self.page.find_element(selector).await.is_ok() {
                    return;
                }
                tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| BrowserError::Timeout {
                selector: selector.to_string(),
                timeout,
            })
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementInfo>, BrowserError> {
        let script = format!(
            "Array.from(document.querySelectorAll({})).map(e => ({{ href: e.getAttribute('href') }}))",
            js_string(selector)?
        );
        self.evaluate_json(script).await
    }

    async fn title(&self) -> Result<Option<String>, BrowserError> {
        Ok(self.page.get_title().await?)
    }

    async fn text(&self, selector: &str, timeout: Duration) -> Result<String, BrowserError> {
        let read = async {
            self.wait_for_selector(selector, timeout).await?;
            let element = self.first_match(selector).await?;
            element
                .inner_text()
                .await?
                .ok_or_else(|| BrowserError::NotFound(selector.to_string()))
        };

        tokio::time::timeout(timeout, read)
            .await
            .map_err(|_| BrowserError::Timeout {
                selector: selector.to_string(),
                timeout,
            })?
    }

    async fn inner_html(&self, selector: &str) -> Result<String, BrowserError> {
        self.evaluate_json::<Option<String>>(inner_html_script(selector)?)
            .await?
            .ok_or_else(|| BrowserError::NotFound(selector.to_string()))
    }

    async fn scroll_by(&self, delta_y: i64) -> Result<(), BrowserError> {
        self.page
            .evaluate(format!("window.scrollBy(0, {delta_y})"))
            .await?;
        Ok(())
    }

    async fn click_text(&self, scope: &str, text: &str) -> Result<bool, BrowserError> {
        self.evaluate_json(click_text_script(scope, text)?).await
    }
}

/// Script joining the inner HTML of every match, or `null` when nothing matches.
fn inner_html_script(selector: &str) -> Result<String, BrowserError> {
    Ok(format!(
        "(() => {{ const all = Array.from(document.querySelectorAll({})); return all.length ? all.map(e => e.innerHTML).join('\\n') : null; }})()",
        js_string(selector)?
    ))
}

/// Script clicking the first visible leaf under `scope` whose text is `text`.
fn click_text_script(scope: &str, text: &str) -> Result<String, BrowserError> {
    Ok(format!(
        r"((scope, wanted) => {{
            const target = Array.from(document.querySelectorAll(scope))
                .flatMap(root => Array.from(root.querySelectorAll('*')))
                .find(e =>
                    e.offsetParent !== null &&
                    e.children.length === 0 &&
                    (e.innerText || '').trim().toLowerCase() === wanted);
            if (!target) return false;
            target.click();
            return true;
        }})({}, {})",
        js_string(scope)?,
        js_string(&text.trim().to_lowercase())?
    ))
}
