use std::num::NonZeroU32;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use color_eyre::eyre::{OptionExt, Result, WrapErr};
use governor::{
    Quota, RateLimiter, clock::DefaultClock, state::InMemoryState, state::direct::NotKeyed,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Query string pairs, encoded by reqwest.
pub type Query<'a> = [(&'a str, String)];

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Worth retrying: throttling, server errors and dropped connections.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(e) => e.is_timeout() || e.is_connect(),
            ApiError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            ApiError::Decode(_) | ApiError::Url(_) => false,
        }
    }

    /// Whether `method` may be sent again after this error.
    ///
    /// A non-idempotent request that timed out or hit a server error may already
    /// have been applied, so it is only repeated when it provably never landed:
    /// the server throttled it, or the connection was never made.
    pub fn is_retryable(&self, method: &Method) -> bool {
        if method.is_idempotent() {
            return self.is_transient();
        }
        match self {
            ApiError::Transport(e) => e.is_connect() && !e.is_timeout(),
            _ => self.status() == Some(StatusCode::TOO_MANY_REQUESTS),
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Timeout, retry and throttle settings shared by every service client.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub max_retries: usize,
    pub requests_per_second: u32,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 3,
            requests_per_second: 10,
        }
    }
}

/// JSON client for one REST API rooted at `base_url`.
///
/// Each instance owns its rate limiter, so two services never share a budget.
pub struct ApiClient {
    client: Client,
    base_url: Url,
    limiter: DirectRateLimiter,
    max_retries: usize,
}

/// Build a header map, rejecting values that cannot go on the wire.
pub fn headers(pairs: &[(&'static str, String)]) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        let mut value = HeaderValue::from_str(value)
            .wrap_err_with(|| format!("Invalid value for header {name}"))?;
        value.set_sensitive(true);
        map.insert(HeaderName::from_static(name), value);
    }
    Ok(map)
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        default_headers: HeaderMap,
        settings: &HttpSettings,
    ) -> Result<Self> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url =
            Url::parse(&base).wrap_err_with(|| format!("Invalid API base url: {base_url}"))?;

        let client = Client::builder()
            .default_headers(default_headers)
            .timeout(settings.timeout)
            .build()
            .wrap_err("Failed to build HTTP client")?;

        let per_second = NonZeroU32::new(settings.requests_per_second)
            .ok_or_eyre("requests_per_second must be greater than zero")?;

        Ok(Self {
            client,
            base_url,
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
            max_retries: settings.max_retries,
        })
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Query<'_>,
    ) -> Result<T, ApiError> {
        let body = self.send(Method::GET, path, query, None).await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)?;
        let text = self.send(Method::POST, path, &[], Some(body)).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Send a request whose response body is not needed.
    pub async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &Query<'_>,
        body: Option<&B>,
    ) -> Result<(), ApiError> {
        let body = body.map(serde_json::to_value).transpose()?;
        self.send(method, path, query, body).await?;
        Ok(())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &Query<'_>,
        body: Option<serde_json::Value>,
    ) -> Result<String, ApiError> {
        let url = self.url(path)?;
        let backoff = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(500))
            .with_max_times(self.max_retries)
            .with_jitter();

        let attempt = || {
            let method = method.clone();
            let url = url.clone();
            let body = body.as_ref();
            async move { self.send_once(method, url, query, body).await }
        };

        attempt
            .retry(backoff)
            .when(|err| err.is_retryable(&method))
            .notify(|err, delay| {
                tracing::warn!("Retrying {} {} in {:?}: {}", method, path, delay, err)
            })
            .await
    }

    async fn send_once(
        &self,
        method: Method,
        url: Url,
        query: &Query<'_>,
        body: Option<&serde_json::Value>,
    ) -> Result<String, ApiError> {
        self.limiter.until_ready().await;
        tracing::debug!("{} {}", method, url);

        let mut request = self.client.request(method, url).query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status { status, body: text });
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pong {
        ok: bool,
    }

    fn settings() -> HttpSettings {
        HttpSettings {
            timeout: Duration::from_secs(5),
            max_retries: 2,
            requests_per_second: 1000,
        }
    }

    fn client(server: &MockServer) -> ApiClient {
        let headers = headers(&[("authorization", "Bearer t0ken".to_string())]).unwrap();
        ApiClient::new(&format!("{}/v1", server.uri()), headers, &settings()).unwrap()
    }

    #[tokio::test]
    async fn test_get_json_joins_base_and_sends_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/ping"))
            .and(query_param("limit", "5"))
            .and(header("authorization", "Bearer t0ken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let pong: Pong = client(&server)
            .get_json("/ping", &[("limit", "5".to_string())])
            .await
            .unwrap();

        assert_eq!(pong, Pong { ok: true });
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let pong: Pong = client(&server).get_json("flaky", &[]).await.unwrap();
        assert!(pong.ok);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server)
            .get_json::<Pong>("missing", &[])
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert!(!err.is_transient());
        assert!(err.to_string().contains("nope"));
    }

    #[tokio::test]
    async fn test_slow_post_is_not_sent_twice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/playlists"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!({"ok": true}))
                    .set_delay(Duration::from_millis(1500)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let settings = HttpSettings {
            timeout: Duration::from_secs(1),
            ..settings()
        };
        let api = ApiClient::new(&format!("{}/v1", server.uri()), HeaderMap::new(), &settings)
            .unwrap();

        let err = api
            .post_json::<_, Pong>("playlists", &serde_json::json!({"name": "Road Trip"}))
            .await
            .unwrap_err();

        assert!(err.is_transient());
        assert!(!err.is_retryable(&Method::POST));
        // `expect(1)` is checked when the server drops.
    }

    #[tokio::test]
    async fn test_post_server_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/playlists"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server)
            .post_json::<_, Pong>("playlists", &serde_json::json!({"name": "Road Trip"}))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
    }

    #[tokio::test]
    async fn test_throttled_post_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/playlists"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/playlists"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let pong: Pong = client(&server)
            .post_json("playlists", &serde_json::json!({"name": "Road Trip"}))
            .await
            .unwrap();

        assert!(pong.ok);
    }

    #[test]
    fn test_zero_rate_is_rejected() {
        let settings = HttpSettings {
            requests_per_second: 0,
            ..HttpSettings::default()
        };
        assert!(ApiClient::new("http://localhost", HeaderMap::new(), &settings).is_err());
    }

    #[test]
    fn test_too_many_requests_is_transient() {
        let err = ApiError::Status {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: String::new(),
        };
        assert!(err.is_transient());
    }
}
