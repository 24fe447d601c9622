//! Tutorial videos.

use serde::{Deserialize, Serialize};

use super::{CatalogError, CatalogRecord, prepend, remove_by_id, replace_by_id, required};
use crate::types::{CollectionName, IdGenerator, VideoId, YouTubeId};

/// A tutorial video in the catalog.
///
/// `video_id` is always the identifier extracted from `url`; a video whose
/// URL does not yield one is rejected before it reaches the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: VideoId,
    pub title: String,
    pub description: String,
    /// Source URL as entered.
    pub url: String,
    pub video_id: YouTubeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Video {
    /// Thumbnail for the customer grid.
    #[must_use]
    pub fn thumbnail_url(&self) -> String {
        self.video_id.thumbnail_url()
    }

    /// Player URL for the overlay.
    #[must_use]
    pub fn embed_url(&self) -> String {
        self.video_id.autoplay_embed_url()
    }
}

/// Admin form input for adding or editing a video.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoDraft {
    pub title: String,
    pub description: String,
    pub url: String,
    /// `None` leaves an existing category untouched on update.
    pub category: Option<String>,
}

/// Validated draft fields.
struct ValidVideo {
    title: String,
    description: String,
    url: String,
    video_id: YouTubeId,
    category: Option<String>,
}

impl VideoDraft {
    fn validate(self) -> Result<ValidVideo, CatalogError> {
        let url = self.url.trim().to_owned();
        let video_id = YouTubeId::from_source_url(&url)
            .map_err(|_| CatalogError::InvalidSourceUrl(url.clone()))?;
        Ok(ValidVideo {
            title: required("title", &self.title)?,
            description: required("description", &self.description)?,
            url,
            video_id,
            category: self
                .category
                .map(|c| c.trim().to_owned())
                .filter(|c| !c.is_empty()),
        })
    }
}

/// A video offered by a channel search, ready for bulk import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCandidate {
    pub video_id: YouTubeId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

/// Mutations accepted by the video collection.
#[derive(Debug, Clone)]
pub enum VideoIntent {
    Add(VideoDraft),
    Update { id: VideoId, draft: VideoDraft },
    Delete(VideoId),
    Import(Vec<VideoCandidate>),
}

impl CatalogRecord for Video {
    type Id = VideoId;
    type Intent = VideoIntent;

    const COLLECTION: CollectionName = CollectionName::Videos;

    fn id(&self) -> &VideoId {
        &self.id
    }

    fn apply(
        existing: &[Self],
        intent: VideoIntent,
        ids: &IdGenerator,
    ) -> Result<Vec<Self>, CatalogError> {
        match intent {
            VideoIntent::Add(draft) => add_video(existing, draft, ids),
            VideoIntent::Update { id, draft } => update_video(existing, &id, draft),
            VideoIntent::Delete(id) => Ok(delete_video(existing, &id)),
            VideoIntent::Import(candidates) => Ok(import_videos(existing, &candidates, ids).videos),
        }
    }
}

/// Add a video at the head of the collection.
///
/// # Errors
///
/// Returns [`CatalogError::InvalidSourceUrl`] if the URL has no 11-character
/// video id, or [`CatalogError::MissingField`] for an empty title or
/// description.
pub fn add_video(
    existing: &[Video],
    draft: VideoDraft,
    ids: &IdGenerator,
) -> Result<Vec<Video>, CatalogError> {
    let valid = draft.validate()?;
    let video = Video {
        id: ids.next_id(),
        title: valid.title,
        description: valid.description,
        url: valid.url,
        video_id: valid.video_id,
        category: valid.category,
    };
    Ok(prepend(existing, video))
}

/// Replace the fields of an existing video, keeping its id and position.
///
/// # Errors
///
/// Returns the same validation errors as [`add_video`], or
/// [`CatalogError::NotFound`] if `id` is not in the collection.
pub fn update_video(
    existing: &[Video],
    id: &VideoId,
    draft: VideoDraft,
) -> Result<Vec<Video>, CatalogError> {
    let valid = draft.validate()?;
    replace_by_id(existing, id, |current| Video {
        id: current.id.clone(),
        title: valid.title,
        description: valid.description,
        url: valid.url,
        video_id: valid.video_id,
        category: valid.category.or_else(|| current.category.clone()),
    })
    .ok_or_else(|| CatalogError::NotFound {
        collection: CollectionName::Videos,
        id: id.to_string(),
    })
}

/// Remove a video. Deleting an id that is not present is a no-op.
#[must_use]
pub fn delete_video(existing: &[Video], id: &VideoId) -> Vec<Video> {
    remove_by_id(existing, id)
}

/// Result of a bulk import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    pub videos: Vec<Video>,
    pub added: usize,
    /// Candidates already in the catalog, repeated in the batch, or untitled.
    pub skipped: usize,
}

/// Import search candidates at the head of the collection.
///
/// Candidates keep their relative order. A candidate is skipped when its
/// platform id is already in the catalog (or earlier in the batch) or it has
/// no title.
#[must_use]
pub fn import_videos(
    existing: &[Video],
    candidates: &[VideoCandidate],
    ids: &IdGenerator,
) -> ImportOutcome {
    let mut imported: Vec<Video> = Vec::with_capacity(candidates.len());
    let mut skipped = 0;

    for candidate in candidates {
        let known = existing
            .iter()
            .chain(imported.iter())
            .any(|video| video.video_id == candidate.video_id);
        let title = candidate.title.trim();
        if known || title.is_empty() {
            skipped += 1;
            continue;
        }

        imported.push(Video {
            id: ids.next_id(),
            title: title.to_owned(),
            description: candidate.description.trim().to_owned(),
            url: candidate.video_id.watch_url(),
            video_id: candidate.video_id.clone(),
            category: None,
        });
    }

    let added = imported.len();
    imported.extend_from_slice(existing);
    ImportOutcome {
        videos: imported,
        added,
        skipped,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn draft(title: &str, url: &str) -> VideoDraft {
        VideoDraft {
            title: title.to_string(),
            description: format!("{title} walkthrough"),
            url: url.to_string(),
            category: None,
        }
    }

    fn seeded(ids: &IdGenerator) -> Vec<Video> {
        let videos = add_video(&[], draft("Reset password", "https://youtu.be/aaaaaaaaaaa"), ids)
            .unwrap();
        let videos = add_video(
            &videos,
            draft("Export invoices", "https://youtu.be/bbbbbbbbbbb"),
            ids,
        )
        .unwrap();
        add_video(
            &videos,
            draft("Configure tax", "https://youtu.be/ccccccccccc"),
            ids,
        )
        .unwrap()
    }

    #[test]
    fn test_add_prepends_with_extracted_id() {
        let ids = IdGenerator::new();
        let existing = seeded(&ids);
        let next = add_video(
            &existing,
            draft("Intro", "https://youtube.com/watch?v=dQw4w9WgXcQ"),
            &ids,
        )
        .unwrap();

        assert_eq!(next.len(), existing.len() + 1);
        assert_eq!(next[0].video_id.as_str(), "dQw4w9WgXcQ");
        assert_eq!(next[0].title, "Intro");
        assert_eq!(&next[1..], existing.as_slice());
    }

    #[test]
    fn test_add_rejects_invalid_url() {
        let ids = IdGenerator::new();
        let existing = seeded(&ids);
        let result = add_video(
            &existing,
            draft("Broken", "https://youtube.com/watch?v=short"),
            &ids,
        );
        assert_eq!(
            result,
            Err(CatalogError::InvalidSourceUrl(
                "https://youtube.com/watch?v=short".to_string()
            ))
        );
        assert_eq!(existing.len(), 3);
    }

    #[test]
    fn test_add_requires_title_and_description() {
        let ids = IdGenerator::new();
        let mut missing_title = draft("x", "https://youtu.be/dQw4w9WgXcQ");
        missing_title.title = "  ".to_string();
        assert_eq!(
            add_video(&[], missing_title, &ids),
            Err(CatalogError::MissingField("title"))
        );

        let mut missing_description = draft("x", "https://youtu.be/dQw4w9WgXcQ");
        missing_description.description = String::new();
        assert_eq!(
            add_video(&[], missing_description, &ids),
            Err(CatalogError::MissingField("description"))
        );
    }

    #[test]
    fn test_ids_are_distinct() {
        let ids = IdGenerator::new();
        let videos = seeded(&ids);
        assert_ne!(videos[0].id, videos[1].id);
        assert_ne!(videos[1].id, videos[2].id);
    }

    #[test]
    fn test_update_preserves_position() {
        let ids = IdGenerator::new();
        let existing = seeded(&ids);
        let target = existing[2].id.clone();

        let next = update_video(
            &existing,
            &target,
            draft("Reset password (2024)", "https://youtu.be/ddddddddddd"),
        )
        .unwrap();

        assert_eq!(next.len(), 3);
        assert_eq!(next[2].id, target);
        assert_eq!(next[2].title, "Reset password (2024)");
        assert_eq!(next[2].video_id.as_str(), "ddddddddddd");
        assert_eq!(next[0], existing[0]);
        assert_eq!(next[1], existing[1]);
    }

    #[test]
    fn test_update_keeps_category_unless_replaced() {
        let ids = IdGenerator::new();
        let mut with_category = draft("Billing", "https://youtu.be/eeeeeeeeeee");
        with_category.category = Some("billing".to_string());
        let existing = add_video(&[], with_category, &ids).unwrap();
        let id = existing[0].id.clone();

        let next = update_video(&existing, &id, draft("Billing", "https://youtu.be/eeeeeeeeeee"))
            .unwrap();
        assert_eq!(next[0].category.as_deref(), Some("billing"));
    }

    #[test]
    fn test_update_missing_id() {
        let ids = IdGenerator::new();
        let existing = seeded(&ids);
        let result = update_video(
            &existing,
            &VideoId::new("missing"),
            draft("x", "https://youtu.be/dQw4w9WgXcQ"),
        );
        assert!(matches!(result, Err(CatalogError::NotFound { .. })));
    }

    #[test]
    fn test_update_validates_before_lookup() {
        let ids = IdGenerator::new();
        let existing = seeded(&ids);
        let result = update_video(&existing, &existing[0].id, draft("x", "not a url"));
        assert!(matches!(result, Err(CatalogError::InvalidSourceUrl(_))));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let ids = IdGenerator::new();
        let existing = seeded(&ids);
        let target = existing[1].id.clone();

        let once = delete_video(&existing, &target);
        let twice = delete_video(&once, &target);

        assert_eq!(once.len(), 2);
        assert_eq!(once, twice);
        assert_eq!(delete_video(&existing, &VideoId::new("missing")), existing);
    }

    #[test]
    fn test_import_skips_known_and_duplicate_candidates() {
        let ids = IdGenerator::new();
        let existing = seeded(&ids);
        let candidate = |id: &str, title: &str| VideoCandidate {
            video_id: YouTubeId::parse(id).unwrap(),
            title: title.to_string(),
            description: String::new(),
            published_at: None,
        };

        let outcome = import_videos(
            &existing,
            &[
                candidate("fffffffffff", "New one"),
                candidate("aaaaaaaaaaa", "Already there"),
                candidate("ggggggggggg", "Another"),
                candidate("fffffffffff", "Repeated"),
                candidate("hhhhhhhhhhh", "  "),
            ],
            &ids,
        );

        assert_eq!(outcome.added, 2);
        assert_eq!(outcome.skipped, 3);
        assert_eq!(outcome.videos.len(), 5);
        assert_eq!(outcome.videos[0].title, "New one");
        assert_eq!(outcome.videos[1].title, "Another");
        assert_eq!(
            outcome.videos[0].url,
            "https://www.youtube.com/watch?v=fffffffffff"
        );
        assert_eq!(&outcome.videos[2..], existing.as_slice());
    }

    #[test]
    fn test_serializes_with_original_field_names() {
        let ids = IdGenerator::new();
        let videos = add_video(&[], draft("Intro", "https://youtu.be/dQw4w9WgXcQ"), &ids).unwrap();
        let json = serde_json::to_value(&videos[0]).unwrap();
        assert_eq!(json["videoId"], "dQw4w9WgXcQ");
        assert_eq!(json["url"], "https://youtu.be/dQw4w9WgXcQ");
        assert!(json.get("category").is_none());
    }
}
