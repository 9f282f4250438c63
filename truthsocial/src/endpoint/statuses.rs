use std::cmp::Ordering;
use std::collections::VecDeque;

use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::account::UserRef;
use crate::error::{Result, TruthSocialError};
use crate::pagination::items;
use crate::utils::{compare_ids, post_id, value_id};
use crate::TruthSocialClient;

/// Filters for [`TruthSocialClient::pull_statuses`]
#[derive(Clone, Debug, Default)]
pub struct PullOptions {
    /// Include replies to other posts
    pub replies: bool,
    /// Stop at the first post created at or before this time
    pub created_after: Option<OffsetDateTime>,
    /// Stop at the first post whose id is at or below this id
    pub since_id: Option<String>,
    /// Only fetch the single page of pinned posts
    pub pinned: bool,
}

struct PullState<'a> {
    client: &'a TruthSocialClient,
    user_id: String,
    options: PullOptions,
    max_id: Option<String>,
    posts: VecDeque<Value>,
    keep_going: bool,
    page: u64,
}

impl TruthSocialClient {
    /// Stream the accounts that liked a post, `post` may be an id or a post URL
    pub fn user_likes<'a>(
        &'a self,
        post: &str,
        include_all: bool,
        top_num: usize,
    ) -> impl Stream<Item = Result<Value>> + 'a {
        let pages = self.paginate(
            &format!("/api/v1/statuses/{}/favourited_by", post_id(post)),
            vec![("limit", "80".to_owned())],
            None,
        );
        items(pages).take(if include_all { usize::MAX } else { top_num })
    }

    /// Stream the replies under a post, oldest first.
    ///
    /// With `only_first` set only direct replies to the post are kept.
    pub fn pull_comments<'a>(
        &'a self,
        post: &str,
        include_all: bool,
        only_first: bool,
        top_num: usize,
    ) -> impl Stream<Item = Result<Value>> + 'a {
        let post = post_id(post).to_owned();
        let pages = self.paginate(
            &format!("/api/v1/statuses/{}/context/descendants", post),
            vec![("sort", "oldest".to_owned())],
            None,
        );
        items(pages)
            .filter(move |comment| {
                let keep = match comment {
                    Ok(c) if only_first => {
                        c.get("in_reply_to_id").and_then(Value::as_str) == Some(post.as_str())
                    }
                    _ => true,
                };
                future::ready(keep)
            })
            .take(if include_all { usize::MAX } else { top_num })
    }

    /// Stream the posts of a user, newest first.
    ///
    /// Failing to resolve `username` is an error, but once streaming starts any failure is
    /// logged and simply ends the stream.
    pub async fn pull_statuses<'a>(
        &'a self,
        username: &str,
        options: PullOptions,
    ) -> Result<BoxStream<'a, Value>> {
        let user_id = self.account_id(UserRef::Handle(username)).await?;
        let state = PullState {
            client: self,
            user_id,
            options,
            max_id: None,
            posts: VecDeque::new(),
            keep_going: true,
            page: 0,
        };

        let stream = stream::unfold(state, |mut state| async move {
            loop {
                if let Some(post) = state.posts.pop_front() {
                    return Some((post, state));
                }
                if !state.keep_going {
                    return None;
                }
                if let Err(e) = state.next_page().await {
                    tracing::error!(
                        parent: state.client.span(),
                        "Unable to pull user #{}'s statuses: {}",
                        state.user_id,
                        e
                    );
                    return None;
                }
            }
        });
        Ok(stream.boxed())
    }
}

impl PullState<'_> {
    async fn next_page(&mut self) -> Result<()> {
        let mut params = Vec::new();
        if self.options.pinned {
            params.push(("pinned", "true".to_owned()));
            params.push(("with_muted", "true".to_owned()));
        } else if !self.options.replies {
            params.push(("exclude_replies", "true".to_owned()));
        }
        if let Some(max_id) = &self.max_id {
            params.push(("max_id", max_id.clone()));
        }

        let path = format!("/api/v1/accounts/{}/statuses", self.user_id);
        tracing::debug!(parent: self.client.span(), "{} {:?}", path, params);
        let result = self.client.get_json(&path, &params).await?;
        self.page += 1;

        let mut posts = match result {
            Value::Array(posts) => posts,
            other => {
                return Err(TruthSocialError::UnexpectedResponse {
                    msg: format!("result is not a list: {}", other),
                })
            }
        };
        if posts.is_empty() {
            self.keep_going = false;
            return Ok(());
        }

        // Newest first, the oldest post on the page is the cursor for the next one
        posts.sort_by(|a, b| {
            compare_ids(
                &value_id(b).unwrap_or_default(),
                &value_id(a).unwrap_or_default(),
            )
        });
        let oldest = posts.last().and_then(value_id);
        if oldest.is_none() || oldest == self.max_id {
            self.keep_going = false;
        }
        self.max_id = oldest;
        if self.options.pinned {
            self.keep_going = false;
        }
        tracing::debug!(parent: self.client.span(), "PAGE: {}", self.page);

        let pulled = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| TruthSocialError::UnexpectedResponse { msg: e.to_string() })?;
        for mut post in posts {
            // The rest of the page is older still
            if self.already_seen(&post)? {
                self.keep_going = false;
                break;
            }
            if let Some(obj) = post.as_object_mut() {
                obj.insert("_pulled".to_owned(), Value::String(pulled.clone()));
            }
            tracing::debug!(
                parent: self.client.span(),
                "{} {}",
                post["id"],
                post["created_at"]
            );
            self.posts.push_back(post);
        }

        Ok(())
    }

    fn already_seen(&self, post: &Value) -> Result<bool> {
        if let Some(created_after) = self.options.created_after {
            let created_at = post
                .get("created_at")
                .and_then(Value::as_str)
                .ok_or_else(|| TruthSocialError::UnexpectedResponse {
                    msg: format!("post without created_at: {}", post),
                })?;
            let post_at = OffsetDateTime::parse(created_at, &Rfc3339).map_err(|e| {
                TruthSocialError::UnexpectedResponse {
                    msg: format!("invalid created_at {}: {}", created_at, e),
                }
            })?;
            if post_at <= created_after {
                return Ok(true);
            }
        }

        if let (Some(since_id), Some(id)) = (&self.options.since_id, value_id(post)) {
            if compare_ids(&id, since_id) != Ordering::Greater {
                return Ok(true);
            }
        }

        Ok(false)
    }
}
