use serde_json::Value;

use crate::error::{Result, TruthSocialError};
use crate::utils::value_id;
use crate::TruthSocialClient;

impl TruthSocialClient {
    pub async fn group_tags(&self) -> Result<Value> {
        self.get_json("/api/v1/groups/tags", &[]).await
    }

    /// Collect up to `limit` posts from a group timeline, newest first
    pub async fn group_posts(&self, group_id: &str, limit: usize) -> Result<Vec<Value>> {
        let path = format!("/api/v1/timelines/group/{}", group_id);
        let mut timeline = Vec::new();
        let mut remaining = limit;
        let mut max_id: Option<String> = None;

        while remaining > 0 {
            let mut params = vec![("limit", remaining.to_string())];
            if let Some(id) = &max_id {
                params.push(("max_id", id.clone()));
            }

            let posts = match self.get_json(&path, &params).await? {
                Value::Array(posts) => posts,
                other => {
                    return Err(TruthSocialError::UnexpectedResponse {
                        msg: format!("expected a list of posts, got {}", other),
                    })
                }
            };
            if posts.is_empty() {
                break;
            }

            let last = posts.last().and_then(value_id);
            if last.is_none() || last == max_id {
                timeline.extend(posts.into_iter().take(remaining));
                break;
            }
            max_id = last;

            remaining = remaining.saturating_sub(posts.len());
            timeline.extend(posts);
        }

        timeline.truncate(limit);
        Ok(timeline)
    }
}
