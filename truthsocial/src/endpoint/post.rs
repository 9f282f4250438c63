use std::fmt::Display;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::Result;
use crate::utils::{deserialize_id, deserialize_timestamp};
use crate::TruthSocialClient;

#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Unlisted,
    Private,
    Direct,
}

impl Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Public => "public",
            Self::Unlisted => "unlisted",
            Self::Private => "private",
            Self::Direct => "direct",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::Public),
            "unlisted" => Ok(Self::Unlisted),
            "private" => Ok(Self::Private),
            "direct" => Ok(Self::Direct),
            _ => Err(format!("unknown visibility: {}", s)),
        }
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct Poll {
    pub options: Vec<String>,
    pub expires_in: u64,
    pub multiple: bool,
}

/// Optional fields of a new post
#[derive(Clone, Debug)]
pub struct PostOptions {
    pub content_type: String,
    pub in_reply_to_id: Option<String>,
    pub quote_id: Option<String>,
    pub poll: Option<Poll>,
    pub group_timeline_visible: bool,
}

impl Default for PostOptions {
    fn default() -> Self {
        Self {
            content_type: "text/plain".to_owned(),
            in_reply_to_id: None,
            quote_id: None,
            poll: None,
            group_timeline_visible: false,
        }
    }
}

#[derive(Serialize, Debug)]
struct NewPost<'a> {
    status: &'a str,
    media_ids: Vec<String>,
    visibility: Visibility,
    content_type: &'a str,
    in_reply_to_id: Option<&'a str>,
    quote_id: Option<&'a str>,
    poll: Option<&'a Poll>,
    group_timeline_visible: bool,
}

/// A created post, as returned by the API
#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(from = "RawPost")]
pub struct PostResult {
    pub id: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    pub content: Option<String>,
    pub visibility: Option<String>,
    pub url: Option<String>,
    pub replies_count: Option<u64>,
    pub reblogs_count: Option<u64>,
    pub favourites_count: Option<u64>,
    pub application: Option<String>,
    pub tags: Vec<String>,
    pub account: AccountSummary,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct AccountSummary {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        serialize_with = "time::serde::rfc3339::option::serialize"
    )]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub statuses_count: Option<u64>,
}

#[derive(Deserialize)]
struct RawPost {
    #[serde(default, deserialize_with = "deserialize_id")]
    id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    created_at: Option<OffsetDateTime>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    visibility: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    replies_count: Option<u64>,
    #[serde(default)]
    reblogs_count: Option<u64>,
    #[serde(default)]
    favourites_count: Option<u64>,
    #[serde(default)]
    application: Option<RawApplication>,
    #[serde(default)]
    tags: Option<Vec<RawTag>>,
    #[serde(default)]
    account: Option<AccountSummary>,
}

#[derive(Deserialize)]
struct RawApplication {
    name: Option<String>,
}

#[derive(Deserialize)]
struct RawTag {
    name: Option<String>,
}

impl From<RawPost> for PostResult {
    fn from(raw: RawPost) -> Self {
        Self {
            id: raw.id,
            created_at: raw.created_at,
            content: raw.content,
            visibility: raw.visibility,
            url: raw.url,
            replies_count: raw.replies_count,
            reblogs_count: raw.reblogs_count,
            favourites_count: raw.favourites_count,
            application: raw.application.and_then(|a| a.name),
            tags: raw
                .tags
                .unwrap_or_default()
                .into_iter()
                .filter_map(|t| t.name)
                .collect(),
            account: raw.account.unwrap_or_default(),
        }
    }
}

impl TruthSocialClient {
    /// Publish a post.
    ///
    /// Each entry of `media_files` is either an already uploaded media id (all digits) or a
    /// path to a file that is uploaded first.
    pub async fn send_post(
        &self,
        content: &str,
        media_files: &[&str],
        visibility: Visibility,
        options: &PostOptions,
    ) -> Result<PostResult> {
        let media_ids = self.resolve_media(media_files).await?;

        let payload = NewPost {
            status: content,
            media_ids,
            visibility,
            content_type: &options.content_type,
            in_reply_to_id: options.in_reply_to_id.as_deref(),
            quote_id: options.quote_id.as_deref(),
            poll: options.poll.as_ref(),
            group_timeline_visible: options.group_timeline_visible,
        };

        let post: PostResult = self.post_json("/api/v1/statuses", &payload).await?;
        tracing::info!(parent: self.span(), "Posted {:?}", post.id);
        Ok(post)
    }
}
