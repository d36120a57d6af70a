use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response as HttpResponse};
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

use crate::config::HttpSettings;
use crate::text::truncate_text;

const ERROR_BODY_MAX_CHARS: usize = 512;

/// Blocking client shared by every HTTP adapter. Cloning shares the connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: HttpClient,
    transport_retries: usize,
    retry_backoff: Duration,
}

impl HttpTransport {
    pub fn new(settings: &HttpSettings) -> Result<Self> {
        let client = HttpClient::builder()
            .timeout(settings.request_timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            transport_retries: settings.transport_retries,
            retry_backoff: settings.retry_backoff,
        })
    }

    /// Sends the request built by `build`, rebuilding and resending it after timeouts or
    /// connection failures with a linearly growing pause.
    pub fn send_with_retries<F>(&self, label: &str, build: F) -> Result<HttpResponse>
    where
        F: Fn(&HttpClient) -> RequestBuilder,
    {
        let mut attempt = 0usize;
        loop {
            match build(&self.client).send() {
                Ok(response) => return Ok(response),
                Err(raw) => {
                    let err = anyhow::Error::new(raw).context(format!("{label} request failed"));
                    if !is_retryable_transport_error(&err) || attempt >= self.transport_retries {
                        return Err(err);
                    }
                    attempt += 1;
                    tracing::warn!(
                        provider = label,
                        attempt,
                        max = self.transport_retries,
                        "transport retry after transient request failure"
                    );
                    thread::sleep(self.retry_backoff.mul_f64(attempt as f64));
                }
            }
        }
    }

    pub fn post_json<F>(&self, label: &str, build: F) -> Result<Value>
    where
        F: Fn(&HttpClient) -> RequestBuilder,
    {
        let response = self.send_with_retries(label, build)?;
        response_json_or_error(label, response)
    }

    /// Downloads a hosted image, returning its bytes and declared content type.
    pub fn download(&self, label: &str, url: &str) -> Result<(Vec<u8>, Option<String>)> {
        let response = self.send_with_retries(label, |client| client.get(url))?;
        let status = response.status();
        if !status.is_success() {
            bail!("{label} image download failed ({}): {url}", status.as_u16());
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
            .filter(|value| value.starts_with("image/"));
        let bytes = response
            .bytes()
            .with_context(|| format!("{label} image download body read failed"))?;
        Ok((bytes.to_vec(), content_type))
    }
}

pub fn response_json_or_error(provider: &str, response: HttpResponse) -> Result<Value> {
    let status = response.status();
    let code = status.as_u16();
    let body = response
        .text()
        .with_context(|| format!("{provider} response body read failed"))?;
    if !status.is_success() {
        bail!(
            "{provider} request failed ({code}): {}",
            truncate_text(&body, ERROR_BODY_MAX_CHARS)
        );
    }
    let parsed: Value = serde_json::from_str(&body)
        .with_context(|| format!("{provider} returned invalid JSON payload"))?;
    Ok(parsed)
}

pub fn is_retryable_transport_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<reqwest::Error>()
            .map(|reqwest_err| {
                reqwest_err.is_timeout() || reqwest_err.is_connect() || reqwest_err.is_request()
            })
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{is_retryable_transport_error, HttpTransport};
    use crate::config::HttpSettings;

    #[test]
    fn plain_errors_are_not_retried() {
        let err = anyhow::anyhow!("GLM request failed (401): unauthorized");
        assert!(!is_retryable_transport_error(&err));
    }

    #[test]
    fn connection_refused_is_retried_then_reported() -> anyhow::Result<()> {
        let transport = HttpTransport::new(&HttpSettings {
            request_timeout: Duration::from_secs(2),
            transport_retries: 1,
            retry_backoff: Duration::from_millis(1),
        })?;
        let calls = std::cell::Cell::new(0usize);
        let result = transport.send_with_retries("local", |client| {
            calls.set(calls.get() + 1);
            client.get("http://127.0.0.1:9/unreachable")
        });
        let err = match result {
            Ok(response) => anyhow::bail!("unexpected response {}", response.status()),
            Err(err) => err,
        };
        assert!(is_retryable_transport_error(&err));
        assert!(err.to_string().contains("local request failed"));
        assert_eq!(calls.get(), 2);
        Ok(())
    }
}
