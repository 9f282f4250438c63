use serde_json::Value;

use crate::error::Result;
use crate::TruthSocialClient;

impl TruthSocialClient {
    /// Trending posts
    pub async fn trending(&self, limit: u64) -> Result<Value> {
        self.get_json("/api/v1/truth/trending/truths", &[("limit", limit.to_string())])
            .await
    }

    /// Trending hashtags
    pub async fn tags(&self) -> Result<Value> {
        self.get_json("/api/v1/trends", &[]).await
    }

    /// Suggested accounts to follow
    pub async fn suggested(&self, maximum: u64) -> Result<Value> {
        self.get_json("/api/v2/suggestions", &[("limit", maximum.to_string())])
            .await
    }

    pub async fn trending_groups(&self, limit: u64) -> Result<Value> {
        self.get_json("/api/v1/truth/trends/groups", &[("limit", limit.to_string())])
            .await
    }

    pub async fn suggested_groups(&self, maximum: u64) -> Result<Value> {
        self.get_json(
            "/api/v1/truth/suggestions/groups",
            &[("limit", maximum.to_string())],
        )
        .await
    }
}
