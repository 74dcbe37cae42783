//! Video asset cache repository.

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};

use vox_models::CachedVideoAsset;

use crate::client::SupabaseClient;
use crate::error::DbResult;

/// Table holding cached video asset rows, unique on
/// `source_video_identifier`.
const CACHE_TABLE: &str = "video_asset_cache";

/// Repository for cross-job cached video assets.
#[derive(Clone)]
pub struct VideoAssetCacheRepository {
    client: SupabaseClient,
}

impl VideoAssetCacheRepository {
    /// Create a new repository.
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Look up the cache entry for a canonical video identifier.
    pub async fn get(&self, identifier: &str) -> DbResult<Option<CachedVideoAsset>> {
        let entry = self
            .client
            .select_one(CACHE_TABLE, "source_video_identifier", identifier)
            .await?;
        debug!(
            identifier = identifier,
            hit = entry.is_some(),
            "Asset cache lookup"
        );
        Ok(entry)
    }

    /// Insert a cache entry unless one already exists for the identifier.
    ///
    /// The conflict is resolved server-side in a single request, so two jobs
    /// processing the same new video concurrently cannot create duplicate
    /// rows. Returns whether this call's row was the one written.
    pub async fn insert_if_absent(&self, asset: &CachedVideoAsset) -> DbResult<bool> {
        let written = self
            .client
            .insert(CACHE_TABLE, asset, Some("source_video_identifier"))
            .await?;
        if written {
            info!(
                identifier = %asset.source_video_identifier,
                "Cached new video assets"
            );
        } else {
            debug!(
                identifier = %asset.source_video_identifier,
                "Cache row already present, insert skipped"
            );
        }
        Ok(written)
    }

    /// Bump `last_accessed_at` for an identifier.
    ///
    /// Callers treat a failure here as non-fatal.
    pub async fn touch_last_accessed(&self, identifier: &str) -> DbResult<()> {
        let changes = json!({ "last_accessed_at": Utc::now().to_rfc3339() });
        self.client
            .update(CACHE_TABLE, "source_video_identifier", identifier, &changes)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::client::SupabaseConfig;

    fn repo_for(server: &MockServer) -> VideoAssetCacheRepository {
        let client = SupabaseClient::new(SupabaseConfig {
            base_url: server.uri(),
            service_role_key: "service-key".to_string(),
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(1),
        })
        .unwrap();
        VideoAssetCacheRepository::new(client)
    }

    #[tokio::test]
    async fn test_get_miss_returns_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/video_asset_cache"))
            .and(query_param("source_video_identifier", "eq.youtube_missing0000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let repo = repo_for(&server);
        let entry = repo.get("youtube_missing0000").await.unwrap();
        assert!(entry.is_none());
    }

    #[tokio::test]
    async fn test_insert_if_absent_uses_conflict_column() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/video_asset_cache"))
            .and(query_param("on_conflict", "source_video_identifier"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!([{"source_video_identifier": "x"}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let repo = repo_for(&server);
        let asset = CachedVideoAsset::new("youtube_abc123def45");
        let written = repo.insert_if_absent(&asset).await.unwrap();
        assert!(written);
    }
}
