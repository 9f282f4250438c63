use std::time::Duration;

use futures::stream::{self, Stream, StreamExt};
use reqwest::header::LINK;
use reqwest::Url;
use serde_json::Value;

use crate::client::read_json;
use crate::error::{Result, TruthSocialError};
use crate::TruthSocialClient;

struct FetchState<'a> {
    client: &'a TruthSocialClient,
    next: Option<Url>,
    params: Vec<(&'static str, String)>,
    delay: Option<Duration>,
    error: Option<TruthSocialError>,
}

impl TruthSocialClient {
    /// Lazily walk a paginated endpoint, one request per page.
    ///
    /// `params` are only sent with the first request, later pages are fetched from the
    /// `rel="next"` URL in the `Link` header, which already carries the query. `resume`
    /// continues from a previously seen `max_id`.
    pub fn paginate<'a>(
        &'a self,
        path: &str,
        mut params: Vec<(&'static str, String)>,
        resume: Option<&str>,
    ) -> impl Stream<Item = Result<Value>> + 'a {
        if let Some(max_id) = resume {
            params.push(("max_id", max_id.to_owned()));
        }
        let (next, error) = match self.endpoint(path) {
            Ok(url) => (Some(url), None),
            Err(e) => (None, Some(e)),
        };
        let state = FetchState {
            client: self,
            next,
            params,
            delay: None,
            error,
        };

        stream::unfold(state, |mut state| async move {
            if let Some(e) = state.error.take() {
                return Some((Err(e), state));
            }
            let url = state.next.take()?;

            // Rate limit from the previous page
            if let Some(duration) = state.delay.take() {
                state.client.wait(duration).await;
            }

            let params = std::mem::take(&mut state.params);
            let resp = match state.client.get(url.clone(), &params).await {
                Ok(resp) => resp,
                Err(e) => return Some((Err(e), state)),
            };

            let link = resp
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(next_link);
            state.delay = state.client.rate_limit_delay(resp.headers());

            let page = match read_json::<Value>(resp).await {
                Ok(page) => page,
                Err(e) => return Some((Err(e), state)),
            };

            match link.map(|l| url.join(&l)) {
                Some(Ok(next)) => state.next = Some(next),
                Some(Err(e)) => {
                    state.error = Some(TruthSocialError::UnexpectedResponse {
                        msg: format!("invalid next link from {}: {}", url, e),
                    })
                }
                None => {}
            }
            tracing::info!(
                parent: state.client.span(),
                "Fetched {}, next: {:?}",
                url,
                state.next.as_ref().map(Url::as_str)
            );

            Some((Ok(page), state))
        })
    }
}

/// Find the `rel="next"` URL in a `Link` header
pub(crate) fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|link| {
        let parts: Vec<_> = link.split(';').collect();
        if parts.len() == 2 && parts[1].trim() == r#"rel="next""# {
            let url = parts[0].trim().trim_start_matches('<').trim_end_matches('>');
            Some(url.to_owned())
        } else {
            None
        }
    })
}

/// Flatten pages of JSON arrays into their items
pub(crate) fn items<'a>(
    pages: impl Stream<Item = Result<Value>> + 'a,
) -> impl Stream<Item = Result<Value>> + 'a {
    pages.flat_map(|page| {
        let items = match page {
            Ok(Value::Array(items)) => items.into_iter().map(Ok).collect(),
            Ok(Value::Null) => Vec::new(),
            Ok(other) => vec![Err(TruthSocialError::UnexpectedResponse {
                msg: format!("expected a list, got {}", other),
            })],
            Err(e) => vec![Err(e)],
        };
        stream::iter(items)
    })
}

#[cfg(test)]
mod test {
    use std::time::Instant;

    use serde_json::json;
    use time::format_description::well_known::Rfc3339;
    use time::OffsetDateTime;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::utils::test_client;

    #[test]
    fn next_link_mixed_rel() {
        let header = concat!(
            r#"<https://truthsocial.com/api/v1/accounts/1/followers?min_id=9>; rel="prev", "#,
            r#"<https://truthsocial.com/api/v1/accounts/1/followers?max_id=3>; rel="next""#,
        );
        assert_eq!(
            next_link(header).as_deref(),
            Some("https://truthsocial.com/api/v1/accounts/1/followers?max_id=3")
        );
    }

    #[test]
    fn next_link_missing() {
        let header = r#"<https://truthsocial.com/api/v1/accounts/1/followers>; rel="prev""#;
        assert_eq!(next_link(header), None);
        assert_eq!(next_link(""), None);
    }

    #[tokio::test]
    async fn follows_next_until_absent() {
        let server = MockServer::start().await;
        let uri = server.uri();

        Mock::given(method("GET"))
            .and(path("/api/v1/accounts/1/followers"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": "10"}, {"id": "9"}]))
                    .insert_header(
                        "link",
                        format!(
                            r#"<{uri}/api/v1/prev>; rel="prev", <{uri}/api/v1/page-2>; rel="next""#
                        ),
                    ),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/page-2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": "8"}]))
                    .insert_header("link", format!(r#"<{uri}/api/v1/prev>; rel="prev""#)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&uri);
        let pages: Vec<_> = client
            .paginate("/api/v1/accounts/1/followers", Vec::new(), None)
            .collect()
            .await;
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].as_ref().unwrap(), &json!([{"id": "8"}]));
    }

    #[tokio::test]
    async fn resume_and_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/accounts/1/following"))
            .and(query_param("max_id", "99"))
            .and(query_param("limit", "80"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"id": "1"}, {"id": "2"}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let pages = client.paginate(
            "/api/v1/accounts/1/following",
            vec![("limit", "80".to_owned())],
            Some("99"),
        );
        let accounts: Vec<_> = items(pages).collect().await;
        assert_eq!(accounts.len(), 2);
        assert!(accounts.iter().all(|a| a.is_ok()));
    }

    #[tokio::test]
    async fn error_ends_stream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/accounts/1/followers"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let pages: Vec<_> = client
            .paginate("/api/v1/accounts/1/followers", Vec::new(), None)
            .collect()
            .await;
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].as_ref().unwrap_err().status(), Some(401));
    }

    async fn mount_rate_limited(server: &MockServer, reset_in: Duration, next_hits: u64) {
        let uri = server.uri();
        let reset = (OffsetDateTime::now_utc() + reset_in).format(&Rfc3339).unwrap();
        Mock::given(method("GET"))
            .and(path("/api/v1/accounts/1/followers"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": "2"}]))
                    .insert_header("x-ratelimit-remaining", "0")
                    .insert_header("x-ratelimit-reset", reset.as_str())
                    .insert_header("link", format!(r#"<{uri}/api/v1/page-2>; rel="next""#)),
            )
            .expect(1)
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "1"}])))
            .expect(next_hits)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn waits_for_rate_limit_reset() {
        let server = MockServer::start().await;
        mount_rate_limited(&server, Duration::from_millis(1200), 1).await;

        let client = test_client(&server.uri());
        let start = Instant::now();
        let pages: Vec<_> = client
            .paginate("/api/v1/accounts/1/followers", Vec::new(), None)
            .collect()
            .await;
        assert_eq!(pages.len(), 2);
        assert!(pages.iter().all(|p| p.is_ok()));
        assert!(start.elapsed() >= Duration::from_millis(900), "{:?}", start.elapsed());
    }

    #[tokio::test]
    async fn no_wait_when_stopping_early() {
        let server = MockServer::start().await;
        mount_rate_limited(&server, Duration::from_secs(10), 0).await;

        let client = test_client(&server.uri());
        let start = Instant::now();
        let pages: Vec<_> = client
            .paginate("/api/v1/accounts/1/followers", Vec::new(), None)
            .take(1)
            .collect()
            .await;
        assert_eq!(pages.len(), 1);
        assert!(start.elapsed() < Duration::from_secs(5), "{:?}", start.elapsed());
    }
}
