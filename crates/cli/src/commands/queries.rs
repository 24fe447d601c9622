//! Saved query commands.

use support_portal::PortalConfig;
use support_portal_core::{
    CollectionName, QueryDraft, QueryId, QueryIntent, SavedQuery, Searchable, filter_by_text,
};

use super::{CommandError, Credentials, Output, Workspace};

fn describe(query: &SavedQuery) -> String {
    format!("{}  {}\n    {}", query.id, query.title, query.query.replace('\n', "\n    "))
}

/// Print saved queries, optionally filtered.
pub async fn list(
    config: &PortalConfig,
    output: Output,
    search: Option<&str>,
) -> Result<(), CommandError> {
    let workspace = Workspace::open(config).await?;
    let queries = workspace.portal.catalog().queries().snapshot();
    let matches = filter_by_text(
        queries.as_slice(),
        search.unwrap_or(""),
        SavedQuery::search_fields,
    );
    output.records(&matches, describe)
}

/// Save a query at the head of the list.
pub async fn add(
    config: &PortalConfig,
    credentials: &Credentials,
    output: Output,
    draft: QueryDraft,
) -> Result<(), CommandError> {
    let workspace = Workspace::open_admin(config, credentials, CollectionName::Queries).await?;
    workspace.portal.mutate(QueryIntent::Add(draft).into())?;
    let queries = workspace.portal.catalog().queries().snapshot();
    workspace.commit().await?;

    if let Some(query) = queries.first() {
        tracing::info!(id = %query.id, "Query saved");
        output.record(query, describe)?;
    }
    Ok(())
}

/// Edit a saved query in place; `None` keeps the current value.
pub async fn update(
    config: &PortalConfig,
    credentials: &Credentials,
    output: Output,
    id: &str,
    title: Option<String>,
    query: Option<String>,
) -> Result<(), CommandError> {
    let workspace = Workspace::open_admin(config, credentials, CollectionName::Queries).await?;
    let id = QueryId::new(id);

    let current = workspace.portal.catalog().queries().snapshot();
    let existing = current
        .iter()
        .find(|saved| saved.id == id)
        .ok_or_else(|| CommandError::UnknownId {
            collection: CollectionName::Queries,
            id: id.to_string(),
        })?;
    let draft = QueryDraft {
        title: title.unwrap_or_else(|| existing.title.clone()),
        query: query.unwrap_or_else(|| existing.query.clone()),
    };

    workspace.portal.mutate(
        QueryIntent::Update {
            id: id.clone(),
            draft,
        }
        .into(),
    )?;
    let queries = workspace.portal.catalog().queries().snapshot();
    workspace.commit().await?;

    if let Some(saved) = queries.iter().find(|saved| saved.id == id) {
        output.record(saved, describe)?;
    }
    Ok(())
}

/// Remove a saved query. Deleting an unknown id succeeds without changes.
pub async fn delete(
    config: &PortalConfig,
    credentials: &Credentials,
    id: &str,
) -> Result<(), CommandError> {
    let workspace = Workspace::open_admin(config, credentials, CollectionName::Queries).await?;
    let id = QueryId::new(id);
    workspace.portal.mutate(QueryIntent::Delete(id.clone()).into())?;
    workspace.commit().await?;
    tracing::info!(%id, "Query deleted");
    Ok(())
}
