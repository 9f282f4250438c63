mod client;
pub mod endpoint;
mod error;
mod pagination;
mod rate_limit;
mod utils;

pub use client::{ClientConfig, TruthSocialClient, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
pub use endpoint::account::UserRef;
pub use endpoint::media::MediaResult;
pub use endpoint::post::{AccountSummary, Poll, PostOptions, PostResult, Visibility};
pub use endpoint::search::{SearchQuery, SearchType};
pub use endpoint::statuses::PullOptions;
pub use error::{Result, TruthSocialError};
