//! Session cookies supplied by an external login step.
//!
//! The scraper never logs in itself. Instead it is handed cookies exported from
//! a logged-in browser: a JSON array of objects carrying at least `domain`,
//! `name` and `value` (the shape most cookie-export extensions produce; other
//! keys are ignored).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::cookie::Jar;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Error)]
pub enum CookieError {
    #[error("failed to read cookie file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse cookie file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid cookie domain: {0:?}")]
    InvalidDomain(String),
}

/// A single domain-scoped cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub domain: String,
    pub name: String,
    pub value: String,
}

/// Build a cookie jar holding the given cookies.
///
/// # Errors
///
/// Returns an error if a cookie's domain cannot form a URL.
pub fn jar_from_cookies(cookies: &[Cookie]) -> Result<Arc<Jar>, CookieError> {
    let jar = Jar::default();
    for cookie in cookies {
        let host = cookie.domain.trim_start_matches('.');
        if host.is_empty() {
            return Err(CookieError::InvalidDomain(cookie.domain.clone()));
        }
        let url = Url::parse(&format!("https://{host}/"))
            .map_err(|_| CookieError::InvalidDomain(cookie.domain.clone()))?;
        jar.add_cookie_str(
            &format!(
                "{}={}; Domain={}; Path=/",
                cookie.name, cookie.value, cookie.domain
            ),
            &url,
        );
    }
    debug!(count = cookies.len(), "Cookie jar populated");
    Ok(Arc::new(jar))
}

/// Load a JSON cookie export into a cookie jar.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or holds a cookie
/// with an unusable domain.
pub fn load_cookie_file(path: &Path) -> Result<Arc<Jar>, CookieError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CookieError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let cookies: Vec<Cookie> = serde_json::from_str(&raw).map_err(|source| CookieError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    jar_from_cookies(&cookies)
}
