//! Shared constants used across the crate.

/// Root of the site scraped by default.
pub const DEFAULT_BASE_URL: &str = "https://www.furaffinity.net";

/// User agent string sent with every request.
///
/// A regular browser user agent, matching the browser the session cookies
/// were exported from.
pub const SCRAPER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
