use std::time::Duration;

use rand::RngExt;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::StatusCode;
use tokio::time::sleep;

use crate::{FetchConfig, NetworkError, Result};

/// Fixed pause between retry attempts.
const RETRY_PAUSE: Duration = Duration::from_secs(1);

/// Cached transport handle plus the verification mode it was built under.
/// `reqwest` fixes TLS verification at client construction, so a flag flip
/// invalidates the cached client.
#[derive(Debug)]
struct CachedTransport {
    tls_verify: bool,
    client: reqwest::Client,
}

/// Outcome of a single attempt. A completed exchange always carries a status
/// code; a transport-level failure carries only the error description.
enum Attempt {
    Completed { status: StatusCode, body: String },
    TransportFailed(String),
}

/// HTTP fetch engine: downloads a URL's response body as text, applying the
/// delay, retry, TLS, auth and payload settings of its [`FetchConfig`].
///
/// The engine owns one lazily constructed transport handle, reused across
/// calls. The handle and the configuration are mutated in place, so a shared
/// instance needs external synchronization; give each logical caller its own
/// engine instead.
#[derive(Debug, Default)]
pub struct HttpDownloader {
    config: FetchConfig,
    http: Option<CachedTransport>,
}

impl HttpDownloader {
    /// Creates an engine with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine with a prepared configuration.
    pub fn with_config(config: FetchConfig) -> Self {
        Self { config, http: None }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Mutable access to the configuration. Changes apply to subsequent
    /// fetches only.
    pub fn config_mut(&mut self) -> &mut FetchConfig {
        &mut self.config
    }

    /// Downloads the response body from `url`.
    ///
    /// Sleeps a random interval within the configured bounds, then issues the
    /// configured request up to `max_retries` times with a fixed one second
    /// pause between attempts, and returns the final attempt's body when its
    /// status is 200. Any other outcome fails with a [`NetworkError`]. The
    /// URL is not validated up front; a malformed URL surfaces as a transport
    /// error.
    pub async fn fetch(&mut self, url: &str) -> Result<String> {
        self.pre_request_delay().await;

        let client = self.transport()?;
        let request = self.build_request(&client, url)?;

        let mut last: Option<Attempt> = None;

        for attempt in 0..self.config.max_retries() {
            if attempt > 0 {
                sleep(RETRY_PAUSE).await;
            }

            let outcome = Self::issue(&client, &request).await;

            #[cfg(feature = "tracing")]
            match &outcome {
                Attempt::Completed { status, .. } => {
                    tracing::debug!(%url, attempt, %status, "request completed");
                }
                Attempt::TransportFailed(message) => {
                    tracing::debug!(%url, attempt, error = %message, "request failed");
                }
            }

            let transport_failed = matches!(outcome, Attempt::TransportFailed(_));
            last = Some(outcome);

            // A completed exchange always reports an HTTP status, so only an
            // attempt with no status at all ends the loop early. Completed
            // attempts are re-issued until the retry cap and the final one
            // decides the outcome.
            if transport_failed {
                break;
            }
        }

        match last {
            Some(Attempt::Completed { status, body }) if status == StatusCode::OK => Ok(body),
            Some(Attempt::Completed { .. }) | None => Err(NetworkError::new("")),
            Some(Attempt::TransportFailed(message)) => Err(NetworkError::new(message)),
        }
    }

    /// Sleeps a uniformly random interval in `[sleep_min, sleep_max]`
    /// microseconds. A zero `sleep_min` disables the delay regardless of
    /// `sleep_max`; an inverted range would make the draw ill-defined and is
    /// treated as no delay as well.
    async fn pre_request_delay(&self) {
        let min = self.config.sleep_min();
        let max = self.config.sleep_max();
        if min == 0 || max < min {
            return;
        }

        let micros = rand::rng().random_range(min..=max);

        #[cfg(feature = "tracing")]
        tracing::debug!(micros, "pre-request delay");

        sleep(Duration::from_micros(micros)).await;
    }

    /// Returns the transport handle, building it on first use and rebuilding
    /// it when the cached one was constructed under a different TLS
    /// verification mode.
    fn transport(&mut self) -> Result<reqwest::Client> {
        let tls_verify = self.config.tls_verify_enabled();
        if let Some(cached) = &self.http {
            if cached.tls_verify == tls_verify {
                return Ok(cached.client.clone());
            }
        }

        let mut builder = reqwest::Client::builder();
        if !tls_verify {
            // Disables certificate and hostname verification in one step; the
            // default client requires both.
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder.build().map_err(NetworkError::from_transport)?;

        self.http = Some(CachedTransport {
            tls_verify,
            client: client.clone(),
        });
        Ok(client)
    }

    /// Builds the request once per fetch; the retry loop re-issues clones of
    /// it. The presence of POST fields selects the method.
    fn build_request(&self, client: &reqwest::Client, url: &str) -> Result<reqwest::Request> {
        let fields = self.config.post_fields();
        let mut builder = if fields.is_empty() {
            client.get(url)
        } else {
            client.post(url).form(fields)
        };

        builder = builder.timeout(Duration::from_secs(self.config.timeout()));

        if let Some(auth) = self.config.basic_auth() {
            builder = builder.basic_auth(auth.username(), Some(auth.password()));
        }

        for line in self.config.headers() {
            let (name, value) = split_header_line(line)?;
            builder = builder.header(name, value);
        }

        builder.build().map_err(NetworkError::from_transport)
    }

    async fn issue(client: &reqwest::Client, request: &reqwest::Request) -> Attempt {
        // Form and empty bodies are plain bytes, so the clone cannot fail in
        // practice; a non-reusable body still must not panic here.
        let Some(request) = request.try_clone() else {
            return Attempt::TransportFailed("request body cannot be reused".to_owned());
        };

        match client.execute(request).await {
            Ok(response) => {
                let status = response.status();
                match response.text().await {
                    Ok(body) => Attempt::Completed { status, body },
                    Err(err) => Attempt::TransportFailed(err.to_string()),
                }
            }
            Err(err) => Attempt::TransportFailed(err.to_string()),
        }
    }
}

/// Splits a raw `Key: Value` line into a typed header name and value.
fn split_header_line(line: &str) -> Result<(HeaderName, HeaderValue)> {
    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| NetworkError::new(format!("invalid header line: {line:?}")))?;
    let name = name
        .trim()
        .parse::<HeaderName>()
        .map_err(|err| NetworkError::new(format!("invalid header name in {line:?}: {err}")))?;
    let value = value
        .trim()
        .parse::<HeaderValue>()
        .map_err(|err| NetworkError::new(format!("invalid header value in {line:?}: {err}")))?;
    Ok((name, value))
}

#[cfg(test)]
mod tests {
    use super::{split_header_line, HttpDownloader};

    #[test]
    fn split_header_line_trims_name_and_value() {
        let (name, value) = split_header_line("X-Tag:  tagged ").expect("line must parse");

        assert_eq!(name.as_str(), "x-tag");
        assert_eq!(value.to_str().expect("value must be ascii"), "tagged");
    }

    #[test]
    fn split_header_line_rejects_a_missing_colon() {
        assert!(split_header_line("no colon here").is_err());
    }

    #[test]
    fn build_request_switches_method_on_post_fields() {
        let client = reqwest::Client::new();
        let mut engine = HttpDownloader::new();

        let request = engine
            .build_request(&client, "http://localhost/path")
            .expect("request must build");
        assert_eq!(request.method(), &reqwest::Method::GET);

        engine.config_mut().add_post_field("a", "1");
        let request = engine
            .build_request(&client, "http://localhost/path")
            .expect("request must build");
        assert_eq!(request.method(), &reqwest::Method::POST);
    }

    #[test]
    fn build_request_preserves_duplicate_header_lines() {
        let client = reqwest::Client::new();
        let mut engine = HttpDownloader::new();
        engine.config_mut().add_header("X-Tag", "one");
        engine.config_mut().add_header("X-Tag", "two");

        let request = engine
            .build_request(&client, "http://localhost/path")
            .expect("request must build");

        let values: Vec<_> = request.headers().get_all("x-tag").iter().collect();
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn transport_is_rebuilt_when_tls_mode_changes() {
        let mut engine = HttpDownloader::new();

        engine.transport().expect("transport must build");
        assert!(matches!(&engine.http, Some(cached) if cached.tls_verify));

        engine.config_mut().disable_tls_verify();
        engine.transport().expect("transport must rebuild");
        assert!(matches!(&engine.http, Some(cached) if !cached.tls_verify));
    }
}
