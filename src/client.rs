//! HTTP client for the three page types.
//!
//! Every operation performs exactly one GET through the shared [`Throttle`],
//! so all operations on one [`Scraper`] (and on any other scraper handed the
//! same throttle) draw from a single spacing budget.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{ExtractionError, ScrapeError};
use crate::extract::{parse_favorites, parse_gallery, parse_post};
use crate::models::{Favorite, FavoritesPage, Post};
use crate::throttle::Throttle;
use crate::urls::{favorites_url, gallery_url, post_url};

/// Rate-limited scraper holding a cookie-carrying HTTP session.
#[derive(Debug, Clone)]
pub struct Scraper {
    client: Client,
    base_url: String,
    throttle: Arc<Throttle>,
}

impl Scraper {
    /// Create a scraper from configuration.
    ///
    /// `jar` carries the session cookies; pass an empty jar for anonymous
    /// access.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        config: &Config,
        throttle: Arc<Throttle>,
        jar: Arc<Jar>,
    ) -> Result<Self, ScrapeError> {
        Self::with_client_options(
            &config.base_url,
            throttle,
            jar,
            config.request_timeout,
            &config.user_agent,
        )
    }

    /// Create a scraper with explicit client settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_client_options(
        base_url: &str,
        throttle: Arc<Throttle>,
        jar: Arc<Jar>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .cookie_provider(jar)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            throttle,
        })
    }

    #[must_use]
    pub fn throttle(&self) -> &Arc<Throttle> {
        &self.throttle
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a single post.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::NotFound`] on a 404, [`ScrapeError::Extraction`]
    /// if the page lacks any expected field, and [`ScrapeError::Transport`] for
    /// network failures and other error statuses.
    pub async fn get_post(&self, post_id: u64) -> Result<Post, ScrapeError> {
        let url = post_url(&self.base_url, post_id);

        self.throttle
            .guard(|| async {
                let html = self.fetch(&url).await?;
                let post = parse_post(&html, post_id, &url).map_err(|e| extraction(&url, e))?;
                debug!(
                    post_id,
                    title = %post.title,
                    tags = post.tags.len(),
                    "Post extracted"
                );
                Ok::<_, ScrapeError>(post)
            })
            .await
    }

    /// Fetch one page of a user's favorites.
    ///
    /// Pass `after = None` for the first page, then the previous page's
    /// [`FavoritesPage::next`] until it comes back `None`.
    ///
    /// # Errors
    ///
    /// See [`Scraper::get_post`].
    pub async fn get_favorites(
        &self,
        user: &str,
        after: Option<u64>,
    ) -> Result<FavoritesPage, ScrapeError> {
        let url = favorites_url(&self.base_url, user, after);

        self.throttle
            .guard(|| async {
                let html = self.fetch(&url).await?;
                let page = parse_favorites(&html, user).map_err(|e| extraction(&url, e))?;
                debug!(
                    user = %user,
                    after = ?after,
                    count = page.favorites.len(),
                    next = ?page.next,
                    "Favorites page extracted"
                );
                Ok::<_, ScrapeError>(page)
            })
            .await
    }

    /// Fetch the post ids on one page of a user's gallery.
    ///
    /// Pages are numbered from 1; page 0 is treated as page 1.
    ///
    /// # Errors
    ///
    /// See [`Scraper::get_post`].
    pub async fn get_gallery(&self, user: &str, page: u32) -> Result<Vec<u64>, ScrapeError> {
        let url = gallery_url(&self.base_url, user, page);

        self.throttle
            .guard(|| async {
                let html = self.fetch(&url).await?;
                let ids = parse_gallery(&html).map_err(|e| extraction(&url, e))?;
                debug!(user = %user, page, count = ids.len(), "Gallery page extracted");
                Ok::<_, ScrapeError>(ids)
            })
            .await
    }

    /// Walk every page of a user's favorites, following the cursor until the
    /// last page.
    ///
    /// Favorites repeated across pages are kept once, in first-seen order.
    ///
    /// # Errors
    ///
    /// Fails as soon as any page fails; nothing collected so far is returned.
    /// A cursor handed back twice is reported as an extraction error rather
    /// than looping forever.
    pub async fn get_all_favorites(&self, user: &str) -> Result<Vec<Favorite>, ScrapeError> {
        let mut favorites = Vec::new();
        let mut seen_ids = HashSet::new();
        let mut seen_cursors = HashSet::new();
        let mut after = None;
        let mut pages = 0_usize;

        loop {
            let page = self.get_favorites(user, after).await?;
            pages += 1;
            favorites.extend(page.favorites.into_iter().filter(|f| seen_ids.insert(f.id)));

            let Some(cursor) = page.next else {
                break;
            };
            if !seen_cursors.insert(cursor) {
                return Err(extraction(
                    &favorites_url(&self.base_url, user, after),
                    ExtractionError::RepeatedCursor(cursor),
                ));
            }
            after = Some(cursor);
        }

        info!(user = %user, pages, count = favorites.len(), "Collected all favorites");
        Ok(favorites)
    }

    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        debug!(url = %url, "Fetching page");

        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ScrapeError::NotFound {
                url: url.to_string(),
            });
        }

        Ok(response.error_for_status()?.text().await?)
    }
}

fn extraction(url: &str, source: ExtractionError) -> ScrapeError {
    ScrapeError::Extraction {
        url: url.to_string(),
        source,
    }
}
