//! URL templates for the three page types.
//!
//! All builders take the site root (e.g. `https://www.furaffinity.net`) so the
//! client can be pointed at a mock server in tests.

use urlencoding::encode;

/// Detail page of a submission: `{base}/view/{id}/`.
#[must_use]
pub fn post_url(base: &str, post_id: u64) -> String {
    format!("{}/view/{post_id}/", trim(base))
}

/// A user's favorites listing: `{base}/favorites/{user}/`, with
/// `{after}/next` appended to resume after a given favorite id.
#[must_use]
pub fn favorites_url(base: &str, user: &str, after: Option<u64>) -> String {
    let mut url = format!("{}/favorites/{}/", trim(base), encode(user));
    if let Some(after) = after {
        url.push_str(&format!("{after}/next"));
    }
    url
}

/// A user's gallery listing: `{base}/gallery/{user}/`, with `{page}/`
/// appended only past the first page. Pages 0 and 1 share the bare form.
#[must_use]
pub fn gallery_url(base: &str, user: &str, page: u32) -> String {
    let mut url = format!("{}/gallery/{}/", trim(base), encode(user));
    if page > 1 {
        url.push_str(&format!("{page}/"));
    }
    url
}

fn trim(base: &str) -> &str {
    base.trim_end_matches('/')
}
