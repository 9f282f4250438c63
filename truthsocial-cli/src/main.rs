use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;
use truthsocial::{SearchType, Visibility};

mod commands;
mod config;

use config::Config;

/// Post to and read from Truth Social
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Command,

    /// Config file location
    #[clap(short, long, default_value_os_t = default_config_path(), value_parser)]
    config: PathBuf,

    /// Bearer token, overrides the one in the config file
    #[clap(long, env = "TRUTHSOCIAL_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Publish a post
    Post {
        content: String,

        /// Media file path or id of an earlier upload, may be repeated
        #[clap(short, long)]
        media: Vec<String>,

        #[clap(long, default_value = "public")]
        visibility: Visibility,

        #[clap(long, default_value = "text/plain")]
        content_type: String,

        /// Id of the post to reply to
        #[clap(long)]
        reply_to: Option<String>,

        /// Id of the post to quote
        #[clap(long)]
        quote: Option<String>,

        /// Also show the post in its group timeline
        #[clap(long)]
        group_timeline_visible: bool,
    },
    /// Upload a media file
    Upload { path: PathBuf },
    /// Look up an account by handle
    Lookup { handle: String },
    /// List the followers of an account
    Followers {
        handle: String,
        #[clap(long, default_value_t = 1000)]
        maximum: usize,
        /// Fetch every follower
        #[clap(long)]
        all: bool,
        /// max_id to resume from
        #[clap(long)]
        resume: Option<String>,
    },
    /// List the accounts an account follows
    Following {
        handle: String,
        #[clap(long, default_value_t = 1000)]
        maximum: usize,
        #[clap(long)]
        all: bool,
        #[clap(long)]
        resume: Option<String>,
    },
    /// List the accounts that liked a post
    Likes {
        /// Post id or URL
        post: String,
        #[clap(long, default_value_t = 40)]
        top_num: usize,
        #[clap(long)]
        all: bool,
    },
    /// List the replies to a post
    Comments {
        /// Post id or URL
        post: String,
        #[clap(long, default_value_t = 40)]
        top_num: usize,
        #[clap(long)]
        all: bool,
        /// Only direct replies to the post
        #[clap(long)]
        only_first: bool,
    },
    /// Pull the posts of an account, newest first
    Statuses {
        username: String,
        #[clap(long)]
        replies: bool,
        /// Stop at posts created at or before this RFC 3339 time
        #[clap(long, value_parser = parse_datetime)]
        created_after: Option<OffsetDateTime>,
        /// Stop at posts with this id or older
        #[clap(long)]
        since_id: Option<String>,
        /// Only pinned posts
        #[clap(long)]
        pinned: bool,
    },
    /// Search accounts, statuses, hashtags or groups
    Search {
        query: String,
        #[clap(short = 't', long = "type", default_value = "accounts")]
        search_type: SearchType,
        #[clap(long, default_value_t = 40)]
        limit: u64,
        #[clap(long, default_value_t = 4)]
        resolve: u64,
        #[clap(long, default_value_t = 0)]
        offset: u64,
        #[clap(long, default_value = "0")]
        min_id: String,
        #[clap(long)]
        max_id: Option<String>,
    },
    /// Trending posts
    Trends {
        #[clap(long, default_value_t = 10)]
        limit: u64,
    },
    /// Trending hashtags
    Tags,
    /// Suggested accounts
    Suggestions {
        #[clap(long, default_value_t = 50)]
        maximum: u64,
    },
    /// Trending groups
    TrendingGroups {
        #[clap(long, default_value_t = 10)]
        limit: u64,
    },
    /// Suggested groups
    SuggestedGroups {
        #[clap(long, default_value_t = 50)]
        maximum: u64,
    },
    /// Group tags
    GroupTags,
    /// Posts from a group timeline
    GroupPosts {
        group_id: String,
        #[clap(long, default_value_t = 20)]
        limit: usize,
    },
}

fn default_config_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "truthsocial")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("truthsocial.toml"))
}

fn parse_datetime(s: &str) -> Result<OffsetDateTime, String> {
    OffsetDateTime::parse(s, &Rfc3339).map_err(|e| format!("{}: {}", s, e))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(_) => process::exit(0),
        Err(err) => {
            eprintln!("{:#}", err);
            process::exit(1);
        }
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();
    let conf = Config::read_optional(&args.config)?.client_config(args.token)?;
    let client = truthsocial::TruthSocialClient::from_config(conf)?;

    commands::execute(&client, args.command).await
}

#[cfg(test)]
mod test {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_args() {
        Args::command().debug_assert();
    }

    #[test]
    fn parse_post() {
        let args = Args::try_parse_from([
            "truthsocial",
            "--token",
            "abc",
            "post",
            "hello",
            "-m",
            "12345",
            "-m",
            "photo.jpg",
            "--visibility",
            "unlisted",
        ])
        .unwrap();
        match args.command {
            Command::Post {
                content,
                media,
                visibility,
                ..
            } => {
                assert_eq!(content, "hello");
                assert_eq!(media, vec!["12345", "photo.jpg"]);
                assert_eq!(visibility, Visibility::Unlisted);
            }
            c => panic!("unexpected command: {:?}", c),
        }
    }

    #[test]
    fn parse_statuses_cutoff() {
        let args = Args::try_parse_from([
            "truthsocial",
            "statuses",
            "someone",
            "--created-after",
            "2024-05-01T00:00:00Z",
        ])
        .unwrap();
        match args.command {
            Command::Statuses { created_after, .. } => {
                assert_eq!(created_after.unwrap().unix_timestamp(), 1714521600);
            }
            c => panic!("unexpected command: {:?}", c),
        }
    }

    #[test]
    fn bad_search_type() {
        let res = Args::try_parse_from(["truthsocial", "search", "x", "--type", "people"]);
        assert!(res.is_err());
    }
}
