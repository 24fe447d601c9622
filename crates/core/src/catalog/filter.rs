//! Client-side text filtering.
//!
//! Filtering never touches the stored collection; it yields a borrowed
//! subsequence in collection order and is cheap enough to recompute on every
//! keystroke.

use super::{Link, SavedQuery, Video, VideoCandidate};

/// Records with a default set of searchable text fields.
pub trait Searchable {
    /// Fields matched by the search box for this record type.
    fn search_fields(&self) -> Vec<&str>;
}

impl Searchable for Video {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.title, &self.description]
    }
}

impl Searchable for SavedQuery {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.title, &self.query]
    }
}

impl Searchable for Link {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.title, &self.url, &self.description]
    }
}

impl Searchable for VideoCandidate {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.title, &self.description]
    }
}

/// Case-insensitive substring filter over the fields picked by `fields`.
///
/// An empty query keeps every record.
///
/// ```
/// use support_portal_core::{Searchable, SavedQuery, QueryId, filter_by_text};
///
/// let queries = vec![SavedQuery {
///     id: QueryId::new("1"),
///     title: "Open tickets".to_string(),
///     query: "SELECT * FROM tickets".to_string(),
/// }];
///
/// assert_eq!(filter_by_text(&queries, "TICKETS", SavedQuery::search_fields).len(), 1);
/// assert_eq!(filter_by_text(&queries, "orders", SavedQuery::search_fields).len(), 0);
/// ```
pub fn filter_by_text<'a, T, F, I>(items: &'a [T], query: &str, fields: F) -> Vec<&'a T>
where
    F: Fn(&'a T) -> I,
    I: IntoIterator<Item = &'a str>,
{
    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|&item| {
            needle.is_empty()
                || fields(item)
                    .into_iter()
                    .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::catalog::video::{VideoDraft, add_video};
    use crate::types::IdGenerator;

    fn videos() -> Vec<Video> {
        let ids = IdGenerator::new();
        let mut videos = Vec::new();
        for (title, description, id) in [
            ("Reset password", "Recover access to your account", "aaaaaaaaaaa"),
            ("Export invoices", "Download monthly INVOICE reports", "bbbbbbbbbbb"),
            ("Configure tax", "Set up VAT rates", "ccccccccccc"),
        ] {
            videos = add_video(
                &videos,
                VideoDraft {
                    title: title.to_string(),
                    description: description.to_string(),
                    url: format!("https://youtu.be/{id}"),
                    category: None,
                },
                &ids,
            )
            .unwrap();
        }
        videos
    }

    #[test]
    fn test_empty_query_is_identity() {
        let videos = videos();
        let filtered = filter_by_text(&videos, "", Video::search_fields);
        assert_eq!(filtered, videos.iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_matches_title_or_description_case_insensitively() {
        let videos = videos();
        let by_description = filter_by_text(&videos, "invoice", Video::search_fields);
        assert_eq!(by_description.len(), 1);
        assert_eq!(by_description[0].title, "Export invoices");

        let by_title = filter_by_text(&videos, "RESET", Video::search_fields);
        assert_eq!(by_title.len(), 1);
        assert_eq!(by_title[0].title, "Reset password");
    }

    #[test]
    fn test_keeps_collection_order() {
        let videos = videos();
        let filtered = filter_by_text(&videos, "e", Video::search_fields);
        let titles: Vec<&str> = filtered.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, ["Configure tax", "Export invoices", "Reset password"]);
    }

    #[test]
    fn test_links_match_on_url() {
        let links = vec![
            Link {
                id: "2".into(),
                title: "Status".to_string(),
                url: "https://status.polosys.com".to_string(),
                description: String::new(),
            },
            Link {
                id: "1".into(),
                title: "Handbook".to_string(),
                url: "https://docs.polosys.com/handbook".to_string(),
                description: "Internal guide".to_string(),
            },
        ];
        let by_host = filter_by_text(&links, "DOCS.POLOSYS", Link::search_fields);
        assert_eq!(by_host.len(), 1);
        assert_eq!(by_host[0].title, "Handbook");
    }

    #[test]
    fn test_custom_field_selection() {
        let videos = videos();
        let titles_only = filter_by_text(&videos, "vat", |v| [v.title.as_str()]);
        assert!(titles_only.is_empty());
    }
}
