//! Reference link commands.

use support_portal::PortalConfig;
use support_portal_core::{
    CollectionName, Link, LinkDraft, LinkId, LinkIntent, Searchable, filter_by_text,
};

use super::{CommandError, Credentials, Output, Workspace};

/// Fields to change on `links update`; `None` keeps the current value.
pub struct LinkChanges {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
}

fn describe(link: &Link) -> String {
    if link.description.is_empty() {
        format!("{}  {}  {}", link.id, link.title, link.url)
    } else {
        format!("{}  {}  {}\n    {}", link.id, link.title, link.url, link.description)
    }
}

/// Print reference links, optionally filtered.
pub async fn list(
    config: &PortalConfig,
    output: Output,
    search: Option<&str>,
) -> Result<(), CommandError> {
    let workspace = Workspace::open(config).await?;
    let links = workspace.portal.catalog().links().snapshot();
    let matches = filter_by_text(links.as_slice(), search.unwrap_or(""), Link::search_fields);
    output.records(&matches, describe)
}

/// Add a link at the head of the list.
pub async fn add(
    config: &PortalConfig,
    credentials: &Credentials,
    output: Output,
    draft: LinkDraft,
) -> Result<(), CommandError> {
    let workspace = Workspace::open_admin(config, credentials, CollectionName::Links).await?;
    workspace.portal.mutate(LinkIntent::Add(draft).into())?;
    let links = workspace.portal.catalog().links().snapshot();
    workspace.commit().await?;

    if let Some(link) = links.first() {
        tracing::info!(id = %link.id, "Link added");
        output.record(link, describe)?;
    }
    Ok(())
}

/// Edit a link in place.
pub async fn update(
    config: &PortalConfig,
    credentials: &Credentials,
    output: Output,
    id: &str,
    changes: LinkChanges,
) -> Result<(), CommandError> {
    let workspace = Workspace::open_admin(config, credentials, CollectionName::Links).await?;
    let id = LinkId::new(id);

    let current = workspace.portal.catalog().links().snapshot();
    let existing = current
        .iter()
        .find(|link| link.id == id)
        .ok_or_else(|| CommandError::UnknownId {
            collection: CollectionName::Links,
            id: id.to_string(),
        })?;
    let draft = LinkDraft {
        title: changes.title.unwrap_or_else(|| existing.title.clone()),
        url: changes.url.unwrap_or_else(|| existing.url.clone()),
        description: changes
            .description
            .unwrap_or_else(|| existing.description.clone()),
    };

    workspace.portal.mutate(
        LinkIntent::Update {
            id: id.clone(),
            draft,
        }
        .into(),
    )?;
    let links = workspace.portal.catalog().links().snapshot();
    workspace.commit().await?;

    if let Some(link) = links.iter().find(|link| link.id == id) {
        output.record(link, describe)?;
    }
    Ok(())
}

/// Remove a link. Deleting an unknown id succeeds without changes.
pub async fn delete(
    config: &PortalConfig,
    credentials: &Credentials,
    id: &str,
) -> Result<(), CommandError> {
    let workspace = Workspace::open_admin(config, credentials, CollectionName::Links).await?;
    let id = LinkId::new(id);
    workspace.portal.mutate(LinkIntent::Delete(id.clone()).into())?;
    workspace.commit().await?;
    tracing::info!(%id, "Link deleted");
    Ok(())
}
