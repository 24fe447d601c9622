//! Channel-video search seam used by the bulk import.

use std::future::Future;
use std::path::Path;

use support_portal_core::{VideoCandidate, filter_by_text};
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors from a video search provider.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Failed to read candidates: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed candidates file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Search provider error: {0}")]
    Provider(String),
}

/// Finds videos on the support channel that could be imported.
pub trait VideoSearchProvider: Send + Sync {
    /// Candidates matching `query`. An empty query returns everything the
    /// provider offers.
    fn search(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<VideoCandidate>, SearchError>> + Send;
}

/// Search over a fixed list of candidates.
#[derive(Debug, Clone, Default)]
pub struct StaticSearchProvider {
    candidates: Vec<VideoCandidate>,
}

impl StaticSearchProvider {
    #[must_use]
    pub const fn new(candidates: Vec<VideoCandidate>) -> Self {
        Self { candidates }
    }

    /// Load candidates from a JSON array file.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if the file cannot be read or parsed.
    pub async fn from_json_file(path: &Path) -> Result<Self, SearchError> {
        let contents = tokio::fs::read_to_string(path).await?;
        let candidates: Vec<VideoCandidate> = serde_json::from_str(&contents)?;
        debug!(path = %path.display(), candidates = candidates.len(), "Loaded search candidates");
        Ok(Self::new(candidates))
    }
}

impl VideoSearchProvider for StaticSearchProvider {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<VideoCandidate>, SearchError> {
        Ok(filter_by_text(&self.candidates, query, |c| {
            [c.title.as_str(), c.description.as_str()]
        })
        .into_iter()
        .cloned()
        .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use support_portal_core::YouTubeId;

    use super::*;

    fn candidate(id: &str, title: &str) -> VideoCandidate {
        VideoCandidate {
            video_id: YouTubeId::parse(id).unwrap(),
            title: title.to_string(),
            description: String::new(),
            published_at: None,
        }
    }

    #[tokio::test]
    async fn test_search_filters_case_insensitively() {
        let provider = StaticSearchProvider::new(vec![
            candidate("dQw4w9WgXcQ", "Installing the POS client"),
            candidate("9bZkp7q5f_w", "Month-end closing"),
        ]);
        let results = provider.search("pos").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results.first().unwrap().title, "Installing the POS client");
    }

    #[tokio::test]
    async fn test_empty_query_returns_everything() {
        let provider = StaticSearchProvider::new(vec![
            candidate("dQw4w9WgXcQ", "A"),
            candidate("9bZkp7q5f_w", "B"),
        ]);
        assert_eq!(provider.search("").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_from_json_file() {
        let path = std::env::temp_dir().join(format!("portal-candidates-{}.json", std::process::id()));
        tokio::fs::write(
            &path,
            r#"[{"videoId":"dQw4w9WgXcQ","title":"Backups","publishedAt":"2024-02-01T09:00:00Z"}]"#,
        )
        .await
        .unwrap();

        let provider = StaticSearchProvider::from_json_file(&path).await.unwrap();
        let results = provider.search("backup").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results.first().unwrap().video_id.as_str(), "dQw4w9WgXcQ");
        let _ = tokio::fs::remove_file(path).await;
    }

    #[tokio::test]
    async fn test_from_json_file_rejects_bad_video_id() {
        let path = std::env::temp_dir().join(format!("portal-candidates-bad-{}.json", std::process::id()));
        tokio::fs::write(&path, r#"[{"videoId":"short","title":"Backups"}]"#)
            .await
            .unwrap();
        let result = StaticSearchProvider::from_json_file(&path).await;
        assert!(matches!(result, Err(SearchError::Parse(_))));
        let _ = tokio::fs::remove_file(path).await;
    }
}
