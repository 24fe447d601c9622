//! Integration tests for the pure catalog mutators.

#![allow(clippy::unwrap_used)]

use support_portal_core::catalog::link::{add_link, delete_link, update_link};
use support_portal_core::catalog::query::{add_query, update_query};
use support_portal_core::catalog::video::{add_video, delete_video, update_video};
use support_portal_core::{
    CatalogError, IdGenerator, Link, SavedQuery, Searchable, Video, VideoCandidate, YouTubeId,
    filter_by_text, import_videos,
};
use support_portal_integration_tests::{link_draft, query_draft, video_draft};

fn three_videos(ids: &IdGenerator) -> Vec<Video> {
    let mut videos = Vec::new();
    for (title, url) in [
        ("Printing invoices", "https://youtube.com/watch?v=dQw4w9WgXcQ"),
        ("GST returns", "https://youtu.be/9bZkp7q5f_w"),
        ("Stock transfer", "https://www.youtube.com/embed/kJQP7kiw5Fk"),
    ] {
        videos = add_video(&videos, video_draft(title, url), ids).unwrap();
    }
    videos
}

// =============================================================================
// Add
// =============================================================================

#[test]
fn test_add_video_accepts_watch_url() {
    let ids = IdGenerator::new();
    let videos = add_video(
        &[],
        video_draft("Intro", "https://youtube.com/watch?v=dQw4w9WgXcQ"),
        &ids,
    )
    .unwrap();

    assert_eq!(videos.len(), 1);
    let head = videos.first().unwrap();
    assert_eq!(head.video_id.as_str(), "dQw4w9WgXcQ");
    assert_eq!(
        head.thumbnail_url(),
        "https://img.youtube.com/vi/dQw4w9WgXcQ/hqdefault.jpg"
    );
    assert!(head.embed_url().starts_with("https://www.youtube.com/embed/dQw4w9WgXcQ"));
}

#[test]
fn test_add_video_prepends() {
    let ids = IdGenerator::new();
    let videos = three_videos(&ids);
    let titles: Vec<_> = videos.iter().map(|v| v.title.as_str()).collect();
    assert_eq!(titles, ["Stock transfer", "GST returns", "Printing invoices"]);
}

#[test]
fn test_add_video_rejects_urls_without_an_id() {
    let ids = IdGenerator::new();
    let existing = three_videos(&ids);

    for url in [
        "",
        "not a url",
        "https://vimeo.com/76979871",
        "https://youtube.com/watch?v=short",
        "https://youtube.com/watch?v=dQw4w9WgXcQextra",
        "https://youtube.com/channel/UC1234567890",
    ] {
        let result = add_video(&existing, video_draft("Broken", url), &ids);
        assert!(
            matches!(result, Err(CatalogError::InvalidSourceUrl(_))),
            "{url} should be rejected"
        );
    }
    assert_eq!(existing.len(), 3);
}

#[test]
fn test_add_video_recognises_every_url_shape() {
    let ids = IdGenerator::new();
    for url in [
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
        "https://youtu.be/dQw4w9WgXcQ",
        "https://www.youtube.com/embed/dQw4w9WgXcQ",
        "https://www.youtube.com/v/dQw4w9WgXcQ",
        "https://www.youtube.com/u/w/dQw4w9WgXcQ",
        "https://youtu.be/dQw4w9WgXcQ?t=42",
    ] {
        let videos = add_video(&[], video_draft("Shape", url), &ids).unwrap();
        assert_eq!(
            videos.first().unwrap().video_id.as_str(),
            "dQw4w9WgXcQ",
            "{url}"
        );
    }
}

#[test]
fn test_add_assigns_unique_increasing_ids() {
    let ids = IdGenerator::new();
    let mut queries: Vec<SavedQuery> = Vec::new();
    for n in 0..50 {
        queries = add_query(&queries, &query_draft(&format!("q{n}"), "select 1"), &ids).unwrap();
    }
    let mut seen: Vec<i64> = queries
        .iter()
        .map(|q| q.id.as_str().parse().unwrap())
        .collect();
    // Newest first, so ids strictly decrease along the collection.
    assert!(seen.windows(2).all(|pair| pair.first() > pair.get(1)));
    seen.dedup();
    assert_eq!(seen.len(), 50);
}

#[test]
fn test_missing_required_fields() {
    let ids = IdGenerator::new();
    let mut draft = video_draft("", "https://youtu.be/dQw4w9WgXcQ");
    assert_eq!(
        add_video(&[], draft.clone(), &ids),
        Err(CatalogError::MissingField("title"))
    );
    draft.title = "Title".to_string();
    draft.description = "   ".to_string();
    assert_eq!(
        add_video(&[], draft, &ids),
        Err(CatalogError::MissingField("description"))
    );

    assert_eq!(
        add_query(&[], &query_draft("Q", "  "), &ids),
        Err(CatalogError::MissingField("query"))
    );
    assert!(matches!(
        add_link(&[], &link_draft("Docs", "docs.polosys.com"), &ids),
        Err(CatalogError::InvalidLinkUrl(_))
    ));
}

// =============================================================================
// Update
// =============================================================================

#[test]
fn test_update_video_preserves_position() {
    let ids = IdGenerator::new();
    let videos = three_videos(&ids);
    let middle = videos.get(1).unwrap().id.clone();

    let updated = update_video(
        &videos,
        &middle,
        video_draft("GST returns (2024)", "https://youtu.be/kJQP7kiw5Fk"),
    )
    .unwrap();

    let titles: Vec<_> = updated.iter().map(|v| v.title.as_str()).collect();
    assert_eq!(titles, ["Stock transfer", "GST returns (2024)", "Printing invoices"]);
    let changed = updated.get(1).unwrap();
    assert_eq!(changed.id, middle);
    assert_eq!(changed.video_id.as_str(), "kJQP7kiw5Fk");
}

#[test]
fn test_update_missing_id_changes_nothing() {
    let ids = IdGenerator::new();
    let videos = three_videos(&ids);
    let result = update_video(
        &videos,
        &"0".into(),
        video_draft("Ghost", "https://youtu.be/dQw4w9WgXcQ"),
    );
    assert!(matches!(result, Err(CatalogError::NotFound { .. })));

    let links: Vec<Link> =
        add_link(&[], &link_draft("Docs", "https://docs.polosys.com"), &ids).unwrap();
    assert!(matches!(
        update_link(&links, &"0".into(), &link_draft("X", "https://x.polosys.com")),
        Err(CatalogError::NotFound { .. })
    ));
    let queries = add_query(&[], &query_draft("Q", "select 1"), &ids).unwrap();
    assert!(matches!(
        update_query(&queries, &"0".into(), &query_draft("X", "y")),
        Err(CatalogError::NotFound { .. })
    ));
}

#[test]
fn test_update_with_invalid_url_is_rejected_before_lookup() {
    let ids = IdGenerator::new();
    let videos = three_videos(&ids);
    let id = videos.first().unwrap().id.clone();
    let result = update_video(&videos, &id, video_draft("Same", "https://example.com"));
    assert!(matches!(result, Err(CatalogError::InvalidSourceUrl(_))));
}

// =============================================================================
// Delete
// =============================================================================

#[test]
fn test_delete_is_idempotent() {
    let ids = IdGenerator::new();
    let videos = three_videos(&ids);
    let target = videos.first().unwrap().id.clone();

    let once = delete_video(&videos, &target);
    let twice = delete_video(&once, &target);
    assert_eq!(once, twice);
    assert_eq!(once.len(), 2);

    let links = add_link(&[], &link_draft("Docs", "https://docs.polosys.com"), &ids).unwrap();
    assert_eq!(delete_link(&links, &"missing".into()), links);
}

// =============================================================================
// Filter
// =============================================================================

#[test]
fn test_empty_filter_is_identity() {
    let ids = IdGenerator::new();
    let videos = three_videos(&ids);
    let all = filter_by_text(&videos, "", Video::search_fields);
    let expected: Vec<&Video> = videos.iter().collect();
    assert_eq!(all, expected);
}

#[test]
fn test_filter_matches_named_fields_case_insensitively() {
    let ids = IdGenerator::new();
    let videos = three_videos(&ids);

    let gst = filter_by_text(&videos, "gst", |v| [v.title.as_str()]);
    assert_eq!(gst.len(), 1);
    assert_eq!(gst.first().unwrap().title, "GST returns");

    // Description is not searched when only the title is named.
    let by_title = filter_by_text(&videos, "walkthrough", |v| [v.title.as_str()]);
    assert!(by_title.is_empty());
    let by_description = filter_by_text(&videos, "WALKTHROUGH", |v| [v.description.as_str()]);
    assert_eq!(by_description.len(), 3);
}

// =============================================================================
// Import
// =============================================================================

#[test]
fn test_import_skips_known_videos_and_keeps_order() {
    let ids = IdGenerator::new();
    let videos = three_videos(&ids);
    let candidate = |id: &str, title: &str| VideoCandidate {
        video_id: YouTubeId::parse(id).unwrap(),
        title: title.to_string(),
        description: String::new(),
        published_at: None,
    };

    let outcome = import_videos(
        &videos,
        &[
            candidate("aaaaaaaaaaa", "New one"),
            candidate("dQw4w9WgXcQ", "Already there"),
            candidate("bbbbbbbbbbb", "New two"),
            candidate("aaaaaaaaaaa", "Duplicate in batch"),
        ],
        &ids,
    );

    assert_eq!(outcome.added, 2);
    assert_eq!(outcome.skipped, 2);
    let titles: Vec<_> = outcome.videos.iter().map(|v| v.title.as_str()).collect();
    assert_eq!(
        titles,
        ["New one", "New two", "Stock transfer", "GST returns", "Printing invoices"]
    );
    assert_eq!(
        outcome.videos.first().unwrap().url,
        "https://www.youtube.com/watch?v=aaaaaaaaaaa"
    );
}
