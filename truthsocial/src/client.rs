use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use tracing::Span;

use crate::error::{Result, TruthSocialError};
use crate::rate_limit::check_rate_limit;

pub static DEFAULT_BASE_URL: &str = "https://truthsocial.com/";
pub static DEFAULT_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 ",
    "(KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36",
);

/// Settings used to build a [`TruthSocialClient`]
#[derive(Clone)]
pub struct ClientConfig {
    pub token: String,
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
    /// Sleep until the rate limit resets once this few requests remain
    pub rate_limit_floor: u64,
}

impl ClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            timeout: Duration::from_secs(30),
            rate_limit_floor: 0,
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .field("rate_limit_floor", &self.rate_limit_floor)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct TruthSocialClient {
    client: Client,
    headers: HeaderMap,
    base_url: Url,
    rate_limit_floor: u64,
    span: Span,
}

impl TruthSocialClient {
    /// Create a new TruthSocialClient against the public site
    pub fn new(token: &str) -> Result<Self> {
        Self::from_config(ClientConfig::new(token))
    }

    pub fn from_config(config: ClientConfig) -> Result<Self> {
        if config.token.is_empty() {
            return Err(TruthSocialError::MissingToken);
        }

        let mut base_url = Url::parse(&config.base_url).map_err(|e| TruthSocialError::Config {
            msg: format!("{}: {}", config.base_url, e),
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let origin = base_url.origin().ascii_serialization();

        let mut auth = header_value(&format!("Bearer {}", config.token))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(header::USER_AGENT, header_value(&config.user_agent)?);
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(header::ORIGIN, header_value(&origin)?);
        headers.insert(header::REFERER, header_value(&origin)?);

        let client = ClientBuilder::new()
            .cookie_store(true)
            .timeout(config.timeout)
            .build()
            .map_err(|e| TruthSocialError::Config { msg: e.to_string() })?;

        Ok(Self {
            client,
            headers,
            base_url,
            rate_limit_floor: config.rate_limit_floor,
            span: tracing::info_span!("truthsocial"),
        })
    }

    /// Emit this client's log events under `span` instead of the default one
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Headers sent with every request
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub(crate) fn span(&self) -> &Span {
        &self.span
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| TruthSocialError::Config {
                msg: format!("{}: {}", path, e),
            })
    }

    pub(crate) async fn get(&self, url: Url, params: &[(&str, String)]) -> Result<Response> {
        let request = self.client.get(url.clone()).query(params);
        self.send(request, &url).await
    }

    /// GET an endpoint and decode its JSON body, honoring the rate limit
    pub(crate) async fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = self.endpoint(path)?;
        let resp = self.get(url, params).await?;
        if let Some(duration) = self.rate_limit_delay(resp.headers()) {
            self.wait(duration).await;
        }
        read_json(resp).await
    }

    pub(crate) async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T> {
        let url = self.endpoint(path)?;
        let request = self.client.post(url.clone()).json(body);
        read_json(self.send(request, &url).await?).await
    }

    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T> {
        let url = self.endpoint(path)?;
        let request = self.client.post(url.clone()).multipart(form);
        read_json(self.send(request, &url).await?).await
    }

    pub(crate) fn rate_limit_delay(&self, headers: &HeaderMap) -> Option<Duration> {
        check_rate_limit(headers, self.rate_limit_floor, OffsetDateTime::now_utc())
    }

    pub(crate) async fn wait(&self, duration: Duration) {
        tracing::warn!(parent: &self.span, "Rate limit hit, sleeping for {:?}", duration);
        tokio::time::sleep(duration).await;
    }

    async fn send(&self, request: RequestBuilder, url: &Url) -> Result<Response> {
        request
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|error| TruthSocialError::Http {
                url: url.to_string(),
                error,
            })
    }
}

/// Decode a 200 response body, anything else becomes an API error carrying the body text
pub(crate) async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let url = resp.url().to_string();
    let status = resp.status();
    let text = resp
        .text()
        .await
        .map_err(|error| TruthSocialError::Http {
            url: url.clone(),
            error,
        })?;

    if status != StatusCode::OK {
        return Err(TruthSocialError::Api {
            status: status.as_u16(),
            message: text,
        });
    }

    serde_json::from_str(&text).map_err(|e| TruthSocialError::Decode {
        url,
        msg: e.to_string(),
    })
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| TruthSocialError::Config {
        msg: format!("invalid header value {:?}: {}", value, e),
    })
}
