use anyhow::Result;
use futures::{Stream, StreamExt};
use serde::Serialize;
use serde_json::Value;
use truthsocial::{PostOptions, PullOptions, SearchQuery, TruthSocialClient, UserRef};

use crate::Command;

pub async fn execute(client: &TruthSocialClient, command: Command) -> Result<()> {
    match command {
        Command::Post {
            content,
            media,
            visibility,
            content_type,
            reply_to,
            quote,
            group_timeline_visible,
        } => {
            let options = PostOptions {
                content_type,
                in_reply_to_id: reply_to,
                quote_id: quote,
                poll: None,
                group_timeline_visible,
            };
            let media: Vec<_> = media.iter().map(String::as_str).collect();
            let post = client
                .send_post(&content, &media, visibility, &options)
                .await?;
            print_response(&post)?;
        }
        Command::Upload { path } => {
            let media = client.upload_media(&path).await?;
            print_response(&media)?;
        }
        Command::Lookup { handle } => {
            print_response(&client.lookup(&handle).await?)?;
        }
        Command::Followers {
            handle,
            maximum,
            all,
            resume,
        } => {
            let maximum = (!all).then_some(maximum);
            let followers = client
                .user_followers(UserRef::Handle(&handle), maximum, resume.as_deref())
                .await?;
            print_items(followers).await?;
        }
        Command::Following {
            handle,
            maximum,
            all,
            resume,
        } => {
            let maximum = (!all).then_some(maximum);
            let following = client
                .user_following(UserRef::Handle(&handle), maximum, resume.as_deref())
                .await?;
            print_items(following).await?;
        }
        Command::Likes { post, top_num, all } => {
            print_items(client.user_likes(&post, all, top_num)).await?;
        }
        Command::Comments {
            post,
            top_num,
            all,
            only_first,
        } => {
            print_items(client.pull_comments(&post, all, only_first, top_num)).await?;
        }
        Command::Statuses {
            username,
            replies,
            created_after,
            since_id,
            pinned,
        } => {
            let options = PullOptions {
                replies,
                created_after,
                since_id,
                pinned,
            };
            let statuses = client.pull_statuses(&username, options).await?;
            print_items(statuses.map(Ok)).await?;
        }
        Command::Search {
            query,
            search_type,
            limit,
            resolve,
            offset,
            min_id,
            max_id,
        } => {
            let query = SearchQuery {
                search_type,
                query,
                limit,
                resolve,
                offset,
                min_id,
                max_id,
            };
            print_items(client.search(query)).await?;
        }
        Command::Trends { limit } => print_response(&client.trending(limit).await?)?,
        Command::Tags => print_response(&client.tags().await?)?,
        Command::Suggestions { maximum } => print_response(&client.suggested(maximum).await?)?,
        Command::TrendingGroups { limit } => {
            print_response(&client.trending_groups(limit).await?)?
        }
        Command::SuggestedGroups { maximum } => {
            print_response(&client.suggested_groups(maximum).await?)?
        }
        Command::GroupTags => print_response(&client.group_tags().await?)?,
        Command::GroupPosts { group_id, limit } => {
            print_response(&client.group_posts(&group_id, limit).await?)?
        }
    }

    Ok(())
}

fn print_response(response: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}

/// Print one JSON document per line as items arrive
async fn print_items(items: impl Stream<Item = truthsocial::Result<Value>>) -> Result<()> {
    futures::pin_mut!(items);
    let mut count = 0;
    while let Some(item) = items.next().await {
        println!("{}", serde_json::to_string(&item?)?);
        count += 1;
    }
    tracing::info!("Printed {} items", count);
    Ok(())
}
