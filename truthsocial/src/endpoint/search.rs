use std::fmt::Display;

use futures::stream::{self, Stream};
use serde_json::Value;

use crate::error::Result;
use crate::utils::is_falsy;
use crate::TruthSocialClient;

/// Results returned per search request
const PAGE_SIZE: u64 = 40;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SearchType {
    Accounts,
    Statuses,
    Hashtags,
    Groups,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accounts => "accounts",
            Self::Statuses => "statuses",
            Self::Hashtags => "hashtags",
            Self::Groups => "groups",
        }
    }
}

impl Display for SearchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SearchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accounts" => Ok(Self::Accounts),
            "statuses" => Ok(Self::Statuses),
            "hashtags" => Ok(Self::Hashtags),
            "groups" => Ok(Self::Groups),
            _ => Err(format!("unknown search type: {}", s)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SearchQuery {
    pub search_type: SearchType,
    pub query: String,
    /// Stop once this many results have been requested
    pub limit: u64,
    pub resolve: u64,
    pub offset: u64,
    pub min_id: String,
    pub max_id: Option<String>,
}

impl SearchQuery {
    pub fn new(search_type: SearchType, query: impl Into<String>) -> Self {
        Self {
            search_type,
            query: query.into(),
            limit: 40,
            resolve: 4,
            offset: 0,
            min_id: "0".to_owned(),
            max_id: None,
        }
    }
}

struct SearchState<'a> {
    client: &'a TruthSocialClient,
    query: SearchQuery,
    done: bool,
}

impl TruthSocialClient {
    /// Stream raw search result pages, each an object keyed by result type
    pub fn search(&self, query: SearchQuery) -> impl Stream<Item = Result<Value>> + '_ {
        let state = SearchState {
            client: self,
            query,
            done: false,
        };

        stream::unfold(state, |mut state| async move {
            if state.done || state.query.offset >= state.query.limit {
                return None;
            }

            let q = &state.query;
            let mut params = vec![
                ("q", q.query.clone()),
                ("resolve", q.resolve.to_string()),
                ("limit", q.limit.to_string()),
                ("type", q.search_type.to_string()),
                ("offset", q.offset.to_string()),
                ("min_id", q.min_id.clone()),
            ];
            if let Some(max_id) = &q.max_id {
                params.push(("max_id", max_id.clone()));
            }

            let page = match state.client.get_json("/api/v2/search", &params).await {
                Ok(page) => page,
                Err(e) => {
                    state.done = true;
                    return Some((Err(e), state));
                }
            };

            // `{}` and `null` count as empty pages too
            let all_empty = match &page {
                Value::Object(o) => o.values().all(is_falsy),
                other => is_falsy(other),
            };
            if all_empty {
                return None;
            }

            state.query.offset += PAGE_SIZE;
            tracing::debug!(
                parent: state.client.span(),
                "Search {:?} offset {}",
                state.query.query,
                state.query.offset
            );
            Some((Ok(page), state))
        })
    }
}
