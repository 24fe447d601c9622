//! Video catalog commands.

use std::path::Path;

use support_portal::PortalConfig;
use support_portal::PortalError;
use support_portal::search::StaticSearchProvider;
use support_portal_core::{
    CollectionName, Searchable, Video, VideoDraft, VideoId, VideoIntent, filter_by_text,
};

use super::{CommandError, Credentials, Output, Workspace};

/// Fields to change on `videos update`; `None` keeps the current value.
pub struct VideoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub category: Option<String>,
}

fn describe(video: &Video) -> String {
    let category = video.category.as_deref().unwrap_or("-");
    format!(
        "{}  [{}]  {}  ({category})  {}",
        video.id,
        video.video_id,
        video.title,
        video.video_id.watch_url()
    )
}

/// Print the catalog, optionally filtered.
pub async fn list(
    config: &PortalConfig,
    output: Output,
    search: Option<&str>,
) -> Result<(), CommandError> {
    let workspace = Workspace::open(config).await?;
    let videos = workspace.portal.catalog().videos().snapshot();
    let matches = filter_by_text(videos.as_slice(), search.unwrap_or(""), Video::search_fields);
    output.records(&matches, describe)
}

/// Add a video at the head of the catalog.
pub async fn add(
    config: &PortalConfig,
    credentials: &Credentials,
    output: Output,
    draft: VideoDraft,
) -> Result<(), CommandError> {
    let workspace = Workspace::open_admin(config, credentials, CollectionName::Videos).await?;
    workspace.portal.mutate(VideoIntent::Add(draft).into())?;
    let videos = workspace.portal.catalog().videos().snapshot();
    workspace.commit().await?;

    if let Some(video) = videos.first() {
        tracing::info!(id = %video.id, video_id = %video.video_id, "Video added");
        output.record(video, describe)?;
    }
    Ok(())
}

/// Edit a video in place.
pub async fn update(
    config: &PortalConfig,
    credentials: &Credentials,
    output: Output,
    id: &str,
    changes: VideoChanges,
) -> Result<(), CommandError> {
    let workspace = Workspace::open_admin(config, credentials, CollectionName::Videos).await?;
    let id = VideoId::new(id);

    let current = workspace.portal.catalog().videos().snapshot();
    let existing = current
        .iter()
        .find(|video| video.id == id)
        .ok_or_else(|| CommandError::UnknownId {
            collection: CollectionName::Videos,
            id: id.to_string(),
        })?;
    let draft = VideoDraft {
        title: changes.title.unwrap_or_else(|| existing.title.clone()),
        description: changes
            .description
            .unwrap_or_else(|| existing.description.clone()),
        url: changes.url.unwrap_or_else(|| existing.url.clone()),
        category: changes.category,
    };

    workspace.portal.mutate(
        VideoIntent::Update {
            id: id.clone(),
            draft,
        }
        .into(),
    )?;
    let videos = workspace.portal.catalog().videos().snapshot();
    workspace.commit().await?;

    if let Some(video) = videos.iter().find(|video| video.id == id) {
        output.record(video, describe)?;
    }
    Ok(())
}

/// Remove a video. Deleting an unknown id succeeds without changes.
pub async fn delete(
    config: &PortalConfig,
    credentials: &Credentials,
    id: &str,
) -> Result<(), CommandError> {
    let workspace = Workspace::open_admin(config, credentials, CollectionName::Videos).await?;
    let id = VideoId::new(id);

    let known = workspace
        .portal
        .catalog()
        .videos()
        .snapshot()
        .iter()
        .any(|video| video.id == id);
    workspace.portal.mutate(VideoIntent::Delete(id.clone()).into())?;
    workspace.commit().await?;

    if known {
        tracing::info!(%id, "Video deleted");
    } else {
        tracing::info!(%id, "No such video, nothing deleted");
    }
    Ok(())
}

/// Import matching channel videos that are not in the catalog yet.
#[allow(clippy::print_stdout)]
pub async fn import(
    config: &PortalConfig,
    credentials: &Credentials,
    candidates: &Path,
    search: &str,
) -> Result<(), CommandError> {
    let provider = StaticSearchProvider::from_json_file(candidates)
        .await
        .map_err(PortalError::from)?;

    let workspace = Workspace::open_admin(config, credentials, CollectionName::Videos).await?;
    let summary = workspace.portal.import_videos(&provider, search).await?;
    workspace.commit().await?;

    println!(
        "Imported {} of {} matching videos ({} already in the catalog or untitled)",
        summary.added, summary.found, summary.skipped
    );
    Ok(())
}
