use futures::stream::{BoxStream, StreamExt};
use serde_json::Value;

use crate::error::{Result, TruthSocialError};
use crate::pagination::items;
use crate::utils::value_id;
use crate::TruthSocialClient;

/// An account, either by handle or by numeric id
#[derive(Clone, Copy, Debug)]
pub enum UserRef<'a> {
    Handle(&'a str),
    Id(&'a str),
}

impl TruthSocialClient {
    /// Look up an account by its handle, with or without the leading `@`
    pub async fn lookup(&self, user_handle: &str) -> Result<Value> {
        let handle = user_handle.trim_start_matches('@');
        self.get_json("/api/v1/accounts/lookup", &[("acct", handle.to_owned())])
            .await
    }

    pub(crate) async fn account_id(&self, user: UserRef<'_>) -> Result<String> {
        match user {
            UserRef::Id(id) => Ok(id.to_owned()),
            UserRef::Handle(handle) => {
                let account = self.lookup(handle).await?;
                value_id(&account).ok_or_else(|| TruthSocialError::UnexpectedResponse {
                    msg: format!("no id for account {}", handle),
                })
            }
        }
    }

    /// Stream the followers of an account, stopping after `maximum` when given
    pub async fn user_followers<'a>(
        &'a self,
        user: UserRef<'_>,
        maximum: Option<usize>,
        resume: Option<&str>,
    ) -> Result<BoxStream<'a, Result<Value>>> {
        self.follow_list(user, "followers", maximum, resume).await
    }

    /// Stream the accounts an account follows, stopping after `maximum` when given
    pub async fn user_following<'a>(
        &'a self,
        user: UserRef<'_>,
        maximum: Option<usize>,
        resume: Option<&str>,
    ) -> Result<BoxStream<'a, Result<Value>>> {
        self.follow_list(user, "following", maximum, resume).await
    }

    async fn follow_list<'a>(
        &'a self,
        user: UserRef<'_>,
        list: &str,
        maximum: Option<usize>,
        resume: Option<&str>,
    ) -> Result<BoxStream<'a, Result<Value>>> {
        let user_id = self.account_id(user).await?;
        let pages = self.paginate(
            &format!("/api/v1/accounts/{}/{}", user_id, list),
            Vec::new(),
            resume,
        );
        Ok(items(pages).take(maximum.unwrap_or(usize::MAX)).boxed())
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::utils::test_client;

    async fn mount_lookup(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/v1/accounts/lookup"))
            .and(query_param("acct", "realDonaldTrump"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "107780257626128497",
                "username": "realDonaldTrump",
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn lookup_strips_at() {
        let server = MockServer::start().await;
        mount_lookup(&server).await;

        let client = test_client(&server.uri());
        let account = client.lookup("@realDonaldTrump").await.unwrap();
        assert_eq!(account["id"], "107780257626128497");
    }

    #[tokio::test]
    async fn followers_by_handle_truncated() {
        let server = MockServer::start().await;
        let uri = server.uri();
        mount_lookup(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/accounts/107780257626128497/followers"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": "1"}, {"id": "2"}, {"id": "3"}]))
                    .insert_header("link", format!(r#"<{uri}/api/v1/more>; rel="next""#)),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/more"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "4"}])))
            .expect(0)
            .mount(&server)
            .await;

        let client = test_client(&uri);
        let followers: Vec<_> = client
            .user_followers(UserRef::Handle("realDonaldTrump"), Some(2), None)
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(followers.len(), 2);
    }

    #[tokio::test]
    async fn following_by_id_all() {
        let server = MockServer::start().await;
        let uri = server.uri();
        Mock::given(method("GET"))
            .and(path("/api/v1/accounts/9/following"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": "1"}, {"id": "2"}]))
                    .insert_header("link", format!(r#"<{uri}/api/v1/more>; rel="next""#)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/more"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "3"}])))
            .mount(&server)
            .await;

        let client = test_client(&uri);
        let following: Vec<_> = client
            .user_following(UserRef::Id("9"), None, None)
            .await
            .unwrap()
            .collect()
            .await;
        let ids: Vec<_> = following
            .into_iter()
            .map(|a| a.unwrap()["id"].as_str().unwrap().to_owned())
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }
}
