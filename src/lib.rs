//! Rate-limited scraper for FurAffinity.
//!
//! Fetches single posts, pages of a user's favorites and pages of a user's
//! gallery, and turns the markup into typed records. Every request goes
//! through a shared [`throttle::Throttle`] so the site sees at most one request
//! per configured interval.

pub mod client;
pub mod config;
pub mod constants;
pub mod cookies;
pub mod error;
pub mod extract;
pub mod layout;
pub mod models;
pub mod throttle;
pub mod urls;

pub use client::Scraper;
pub use error::{ExtractionError, ScrapeError};
pub use models::{Favorite, FavoritesPage, Post};
pub use throttle::Throttle;
