use thiserror::Error;

/// Errors returned by [`crate::client::Scraper`] operations.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Network failure or an unexpected HTTP status, straight from `reqwest`.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The site answered 404 before any markup was inspected.
    #[error("not found: {url}")]
    NotFound { url: String },

    /// The page was fetched but did not have the expected layout.
    #[error("failed to extract data from {url}: {source}")]
    Extraction {
        url: String,
        #[source]
        source: ExtractionError,
    },
}

impl ScrapeError {
    /// Whether the error is the site reporting a missing resource.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// A structural assumption about the page did not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("missing element matching `{0}`")]
    MissingElement(&'static str),

    #[error("element `{element}` has no `{attribute}` attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("`{field}` is not a number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("id {value:?} does not start with {prefix:?}")]
    UnexpectedId { value: String, prefix: &'static str },

    #[error("content url has no file extension: {0}")]
    MissingExtension(String),

    #[error("pagination returned cursor {0} twice")]
    RepeatedCursor(u64),
}
