//! Shared constants used across the application.

/// User agent string the browser presents to the video site.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Channel name recorded when the page does not expose one in time.
pub const UNKNOWN_CHANNEL: &str = "Unknown Channel";

/// Origin tag stamped on every job record.
pub const DEFAULT_SOURCE_TAG: &str = "YouTube";
