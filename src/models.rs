//! Records produced by the scraper.

use serde::{Deserialize, Serialize};

/// A single submission and its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    /// The detail page the post was scraped from.
    pub source: String,
    pub preview_url: String,
    pub content_url: String,
    /// File extension of `content_url` (`jpg`, `png`, `txt`, ...).
    pub content_type: String,
    pub view_count: u64,
    pub fav_count: u64,
    pub rating: String,
    pub title: String,
    pub creator: String,
    /// Tags in display order. Duplicates are kept.
    pub tags: Vec<String>,
}

/// One entry in a user's favorites listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Favorite {
    /// Id of the favoriting event, used as the pagination cursor.
    pub id: u64,
    pub post_id: u64,
    pub user: String,
}

/// One page of a favorites listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoritesPage {
    pub favorites: Vec<Favorite>,
    /// Cursor for the following page, `None` on the last page.
    pub next: Option<u64>,
}

impl FavoritesPage {
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }
}
