//! Turn fetched pages into records.
//!
//! These functions only look at markup; fetching and throttling live in
//! [`crate::client`]. Selectors come from [`crate::layout`]. A missing or
//! malformed element is always an error, never a default value.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::ExtractionError;
use crate::layout::{
    FAVORITES, FAVORITES_SELECTORS, GALLERY, GALLERY_SELECTORS, POST, POST_SELECTORS,
};
use crate::models::{Favorite, FavoritesPage, Post};

/// Extract a [`Post`] from a submission detail page.
///
/// `source` is the URL the page was fetched from. It is stored on the post and
/// used to resolve a relative download link.
///
/// # Errors
///
/// Returns an error if any of the expected elements is missing or malformed.
pub fn parse_post(html: &str, id: u64, source: &str) -> Result<Post, ExtractionError> {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let sel = &*POST_SELECTORS;

    let preview_url = attr(
        first(root, &sel.preview, POST.preview)?,
        POST.preview,
        POST.preview_attr,
    )?;
    let href = attr(
        first(root, &sel.download, POST.download)?,
        POST.download,
        POST.download_attr,
    )?;
    let content_url = resolve(source, &href);
    let content_type = content_type(&content_url)?;

    let view_count = parse_count("view count", &text(first(root, &sel.views, POST.views)?))?;
    let fav_count = parse_count(
        "favorite count",
        &text(first(root, &sel.favorites, POST.favorites)?),
    )?;

    let rating = text(first(root, &sel.rating, POST.rating)?);
    let title = text(first(root, &sel.title, POST.title)?);
    let creator = text(first(root, &sel.creator, POST.creator)?);

    let tags = first(root, &sel.tags_row, POST.tags_row)?
        .select(&sel.tag)
        .map(text)
        .collect();

    Ok(Post {
        id,
        source: source.to_string(),
        preview_url,
        content_url,
        content_type,
        view_count,
        fav_count,
        rating,
        title,
        creator,
        tags,
    })
}

/// Extract one page of favorites and the cursor for the next page.
///
/// The cursor is the id of the last favorite on the page, and is only set when
/// the page shows a "next" control. `user` is copied onto every favorite.
///
/// # Errors
///
/// Returns an error if the gallery or pagination bar is missing, if an entry
/// has malformed ids, or if a "next" control is shown on an empty page.
pub fn parse_favorites(html: &str, user: &str) -> Result<FavoritesPage, ExtractionError> {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let sel = &*FAVORITES_SELECTORS;

    let gallery = first(root, &sel.gallery, FAVORITES.gallery)?;
    let favorites = gallery
        .select(&sel.item)
        .map(|item| -> Result<Favorite, ExtractionError> {
            Ok(Favorite {
                id: parse_count(
                    "favorite id",
                    &attr(item, FAVORITES.item, FAVORITES.fav_id_attr)?,
                )?,
                post_id: parse_prefixed_id(
                    &attr(item, FAVORITES.item, FAVORITES.post_id_attr)?,
                    FAVORITES.post_id_prefix,
                )?,
                user: user.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let pagination = first(root, &sel.pagination, FAVORITES.pagination)?;
    let next = if pagination.select(&sel.next).next().is_some() {
        let last = favorites
            .last()
            .ok_or(ExtractionError::MissingElement(FAVORITES.item))?;
        Some(last.id)
    } else {
        None
    };

    Ok(FavoritesPage { favorites, next })
}

/// Extract the post ids listed on one gallery page, in display order.
///
/// # Errors
///
/// Returns an error if the gallery is missing or an entry has a malformed id.
pub fn parse_gallery(html: &str) -> Result<Vec<u64>, ExtractionError> {
    let document = Html::parse_document(html);
    let sel = &*GALLERY_SELECTORS;

    first(document.root_element(), &sel.gallery, GALLERY.gallery)?
        .select(&sel.item)
        .map(|item| {
            parse_prefixed_id(
                &attr(item, GALLERY.item, GALLERY.post_id_attr)?,
                GALLERY.post_id_prefix,
            )
        })
        .collect()
}

/// The file extension of a content URL, ignoring any query or fragment.
///
/// # Errors
///
/// Returns an error if the last path segment has no extension.
pub fn content_type(content_url: &str) -> Result<String, ExtractionError> {
    let path = Url::parse(content_url).map_or_else(
        |_| content_url.split(['?', '#']).next().unwrap_or_default().to_string(),
        |url| url.path().to_string(),
    );
    let file_name = path.rsplit('/').next().unwrap_or_default();

    match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Ok(ext.to_string()),
        _ => Err(ExtractionError::MissingExtension(content_url.to_string())),
    }
}

fn first<'a>(
    scope: ElementRef<'a>,
    selector: &Selector,
    css: &'static str,
) -> Result<ElementRef<'a>, ExtractionError> {
    scope
        .select(selector)
        .next()
        .ok_or(ExtractionError::MissingElement(css))
}

fn attr(
    element: ElementRef<'_>,
    css: &'static str,
    name: &'static str,
) -> Result<String, ExtractionError> {
    element
        .value()
        .attr(name)
        .map(str::to_string)
        .ok_or(ExtractionError::MissingAttribute {
            element: css,
            attribute: name,
        })
}

fn text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn parse_count(field: &'static str, raw: &str) -> Result<u64, ExtractionError> {
    let digits: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    digits.parse().map_err(|_| ExtractionError::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}

fn parse_prefixed_id(raw: &str, prefix: &'static str) -> Result<u64, ExtractionError> {
    let digits = raw
        .strip_prefix(prefix)
        .ok_or_else(|| ExtractionError::UnexpectedId {
            value: raw.to_string(),
            prefix,
        })?;
    parse_count("post id", digits)
}

/// Resolve protocol-relative and relative links against the page they came from.
fn resolve(base: &str, href: &str) -> String {
    Url::parse(base)
        .and_then(|base| base.join(href))
        .map_or_else(|_| href.to_string(), String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "https://www.furaffinity.net/view/1234/";

    fn post_html(views: Option<&str>) -> String {
        let views = views.map_or_else(String::new, |v| {
            format!(r#"<div class="views"><span>{v}</span> Views</div>"#)
        });
        format!(
            r#"<html>
                <head>
                    <meta property="og:image:secure_url" content="https://t.furaffinity.net/1234@600-1.jpg">
                </head>
                <body>
                    <div class="submission-title"><p>  Sunset Study </p></div>
                    <div class="minigallery-more"><a href="/user/painter/">painter</a></div>
                    <div class="rating-box">
                        General
                    </div>
                    {views}
                    <div class="favorites"><span>87</span> Favorites</div>
                    <div class="download"><a href="//d.furaffinity.net/art/painter/1700000000/sunset.study.png">Download</a></div>
                    <section class="tags-row">
                        <span class="tags"><a href="/search/@keywords%20sky">sky</a></span>
                        <span class="tags"><a href="/search/@keywords%20sunset">sunset</a></span>
                        <span class="tags"><a href="/search/@keywords%20sky">sky</a></span>
                    </section>
                </body>
            </html>"#
        )
    }

    #[test]
    fn test_parse_post() {
        let post = parse_post(&post_html(Some("1,024")), 1234, SOURCE).unwrap();

        assert_eq!(post.id, 1234);
        assert_eq!(post.source, SOURCE);
        assert_eq!(post.preview_url, "https://t.furaffinity.net/1234@600-1.jpg");
        assert_eq!(
            post.content_url,
            "https://d.furaffinity.net/art/painter/1700000000/sunset.study.png"
        );
        assert_eq!(post.content_type, "png");
        assert_eq!(post.view_count, 1024);
        assert_eq!(post.fav_count, 87);
        assert_eq!(post.rating, "General");
        assert_eq!(post.title, "Sunset Study");
        assert_eq!(post.creator, "painter");
        assert_eq!(post.tags, vec!["sky", "sunset", "sky"]);
    }

    #[test]
    fn test_parse_post_missing_view_count_is_an_error() {
        let err = parse_post(&post_html(None), 1234, SOURCE).unwrap_err();
        assert_eq!(err, ExtractionError::MissingElement(".views span"));
    }

    #[test]
    fn test_parse_post_non_numeric_count_is_an_error() {
        let err = parse_post(&post_html(Some("lots")), 1234, SOURCE).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::InvalidNumber {
                field: "view count",
                ..
            }
        ));
    }

    #[test]
    fn test_parse_post_on_unrelated_page_is_an_error() {
        let html = "<html><body><p>The submission you are trying to find is not in our database.</p></body></html>";
        assert!(parse_post(html, 1, SOURCE).is_err());
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type("https://d.example.net/a/b/file.JPG").unwrap(), "JPG");
        assert_eq!(
            content_type("https://d.example.net/a/b.c/story.txt?dl=1").unwrap(),
            "txt"
        );
        assert_eq!(content_type("/relative/song.mp3").unwrap(), "mp3");
        assert!(content_type("https://d.example.net/a.b/noext").is_err());
        assert!(content_type("https://d.example.net/dir/").is_err());
    }

    fn favorites_html(items: &[(u64, u64)], has_next: bool) -> String {
        let figures: String = items
            .iter()
            .map(|(fav, post)| {
                format!(r#"<figure id="sid-{post}" data-fav-id="{fav}"><a href="/view/{post}/">x</a></figure>"#)
            })
            .collect();
        let next = if has_next {
            r#"<form class="right"><button type="submit">Next</button></form>"#
        } else {
            ""
        };
        format!(
            r#"<html><body>
                <section id="gallery-favorites">{figures}</section>
                <div class="pagination"><a class="button left">Prev</a>{next}</div>
            </body></html>"#
        )
    }

    #[test]
    fn test_parse_favorites_with_next_page() {
        let page = parse_favorites(&favorites_html(&[(900, 11), (850, 12)], true), "alice").unwrap();

        assert_eq!(
            page.favorites,
            vec![
                Favorite { id: 900, post_id: 11, user: "alice".to_string() },
                Favorite { id: 850, post_id: 12, user: "alice".to_string() },
            ]
        );
        assert_eq!(page.next, Some(850));
        assert!(!page.is_last());
    }

    #[test]
    fn test_parse_favorites_last_page() {
        let page = parse_favorites(&favorites_html(&[(10, 1)], false), "alice").unwrap();
        assert_eq!(page.favorites.len(), 1);
        assert_eq!(page.next, None);
        assert!(page.is_last());
    }

    #[test]
    fn test_parse_favorites_empty_last_page() {
        let page = parse_favorites(&favorites_html(&[], false), "alice").unwrap();
        assert!(page.favorites.is_empty());
        assert!(page.is_last());
    }

    #[test]
    fn test_parse_favorites_next_on_empty_page_is_an_error() {
        let err = parse_favorites(&favorites_html(&[], true), "alice").unwrap_err();
        assert_eq!(err, ExtractionError::MissingElement("figure"));
    }

    #[test]
    fn test_parse_favorites_missing_pagination_is_an_error() {
        let html = r#"<section id="gallery-favorites"><figure id="sid-1" data-fav-id="2"></figure></section>"#;
        let err = parse_favorites(html, "alice").unwrap_err();
        assert_eq!(err, ExtractionError::MissingElement(".pagination"));
    }

    #[test]
    fn test_parse_favorites_missing_fav_id_is_an_error() {
        let html = r#"<section id="gallery-favorites"><figure id="sid-1"></figure></section><div class="pagination"></div>"#;
        let err = parse_favorites(html, "alice").unwrap_err();
        assert_eq!(
            err,
            ExtractionError::MissingAttribute {
                element: "figure",
                attribute: "data-fav-id",
            }
        );
    }

    #[test]
    fn test_parse_gallery() {
        let html = r#"<html><body><section id="gallery-gallery">
            <figure id="sid-300"></figure>
            <figure id="sid-200"></figure>
            <figure id="sid-100"></figure>
        </section></body></html>"#;
        assert_eq!(parse_gallery(html).unwrap(), vec![300, 200, 100]);
    }

    #[test]
    fn test_parse_gallery_empty() {
        let html = r#"<section id="gallery-gallery"></section>"#;
        assert!(parse_gallery(html).unwrap().is_empty());
    }

    #[test]
    fn test_parse_gallery_unexpected_id_prefix() {
        let html = r#"<section id="gallery-gallery"><figure id="post-300"></figure></section>"#;
        assert_eq!(
            parse_gallery(html).unwrap_err(),
            ExtractionError::UnexpectedId {
                value: "post-300".to_string(),
                prefix: "sid-",
            }
        );
    }

    #[test]
    fn test_parse_gallery_missing_container() {
        assert_eq!(
            parse_gallery("<html><body></body></html>").unwrap_err(),
            ExtractionError::MissingElement("#gallery-gallery")
        );
    }
}
