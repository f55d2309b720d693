//! Where each piece of data lives in the site's markup.
//!
//! Every selector, attribute name and id prefix the extractors rely on is
//! listed here, one table per page type. When the site changes its layout,
//! this is the only file that should need touching.

use std::sync::LazyLock;

use scraper::Selector;

/// Detail page of a single submission (`/view/{id}/`).
#[derive(Debug, Clone, Copy)]
pub struct PostLayout {
    /// `<meta>` tag whose `content` is the preview image.
    pub preview: &'static str,
    pub preview_attr: &'static str,
    /// Download link whose `href` is the full-size content.
    pub download: &'static str,
    pub download_attr: &'static str,
    pub views: &'static str,
    pub favorites: &'static str,
    pub rating: &'static str,
    pub title: &'static str,
    pub creator: &'static str,
    /// Container of the tag list, and the tag elements inside it.
    pub tags_row: &'static str,
    pub tag: &'static str,
}

/// A page of a user's favorites (`/favorites/{user}/`).
#[derive(Debug, Clone, Copy)]
pub struct FavoritesLayout {
    pub gallery: &'static str,
    pub item: &'static str,
    pub fav_id_attr: &'static str,
    pub post_id_attr: &'static str,
    pub post_id_prefix: &'static str,
    /// Pagination bar, and the "next" control inside it.
    pub pagination: &'static str,
    pub next: &'static str,
}

/// A page of a user's gallery (`/gallery/{user}/`).
#[derive(Debug, Clone, Copy)]
pub struct GalleryLayout {
    pub gallery: &'static str,
    pub item: &'static str,
    pub post_id_attr: &'static str,
    pub post_id_prefix: &'static str,
}

pub const POST: PostLayout = PostLayout {
    preview: r#"meta[property="og:image:secure_url"]"#,
    preview_attr: "content",
    download: ".download a",
    download_attr: "href",
    views: ".views span",
    favorites: ".favorites span",
    rating: ".rating-box",
    title: ".submission-title p",
    creator: ".minigallery-more a",
    tags_row: ".tags-row",
    tag: "a",
};

pub const FAVORITES: FavoritesLayout = FavoritesLayout {
    gallery: "#gallery-favorites",
    item: "figure",
    fav_id_attr: "data-fav-id",
    post_id_attr: "id",
    post_id_prefix: "sid-",
    pagination: ".pagination",
    next: ".right",
};

pub const GALLERY: GalleryLayout = GalleryLayout {
    gallery: "#gallery-gallery",
    item: "figure",
    post_id_attr: "id",
    post_id_prefix: "sid-",
};

/// Compiled form of [`PostLayout`].
pub struct PostSelectors {
    pub preview: Selector,
    pub download: Selector,
    pub views: Selector,
    pub favorites: Selector,
    pub rating: Selector,
    pub title: Selector,
    pub creator: Selector,
    pub tags_row: Selector,
    pub tag: Selector,
}

/// Compiled form of [`FavoritesLayout`].
pub struct FavoritesSelectors {
    pub gallery: Selector,
    pub item: Selector,
    pub pagination: Selector,
    pub next: Selector,
}

/// Compiled form of [`GalleryLayout`].
pub struct GallerySelectors {
    pub gallery: Selector,
    pub item: Selector,
}

pub static POST_SELECTORS: LazyLock<PostSelectors> = LazyLock::new(|| PostSelectors {
    preview: compile(POST.preview),
    download: compile(POST.download),
    views: compile(POST.views),
    favorites: compile(POST.favorites),
    rating: compile(POST.rating),
    title: compile(POST.title),
    creator: compile(POST.creator),
    tags_row: compile(POST.tags_row),
    tag: compile(POST.tag),
});

pub static FAVORITES_SELECTORS: LazyLock<FavoritesSelectors> =
    LazyLock::new(|| FavoritesSelectors {
        gallery: compile(FAVORITES.gallery),
        item: compile(FAVORITES.item),
        pagination: compile(FAVORITES.pagination),
        next: compile(FAVORITES.next),
    });

pub static GALLERY_SELECTORS: LazyLock<GallerySelectors> = LazyLock::new(|| GallerySelectors {
    gallery: compile(GALLERY.gallery),
    item: compile(GALLERY.item),
});

// The tables above are constants, so a bad selector is a programming error.
fn compile(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e:?}"))
}
