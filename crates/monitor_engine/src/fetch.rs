use std::fmt;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use futures_util::StreamExt;
use monitor_logging::{monitor_debug, monitor_warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, CONTENT_TYPE, REFERER, USER_AGENT};
use url::Url;

use crate::decode::{decode_utf8, DecodedHtml};
use crate::{FailureKind, FetchError, FetchMetadata, FetchOutput};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub user_agent: String,
    pub accept_language: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
                .to_string(),
            accept_language: "zh-CN,zh;q=0.8,en-US;q=0.5,en;q=0.3".to_string(),
        }
    }
}

/// Cookie-holding HTTP client for one monitor run.
///
/// Created by the authenticator and handed to the listing fetcher; dropping it
/// discards the login state.
pub struct Session {
    client: reqwest::Client,
    redirect_counter: Arc<AtomicUsize>,
    max_bytes: u64,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("max_bytes", &self.max_bytes)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(settings: &FetchSettings, site: &Url) -> Result<Self, FetchError> {
        let redirect_counter = Arc::new(AtomicUsize::new(0));
        let counter = redirect_counter.clone();
        let redirect_limit = settings.redirect_limit;
        let policy = reqwest::redirect::Policy::custom(move |attempt| {
            let count = attempt.previous().len();
            counter.store(count, Ordering::Relaxed);
            if count >= redirect_limit {
                attempt.error("redirect limit exceeded")
            } else {
                attempt.follow()
            }
        });

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(policy)
            .cookie_store(true)
            .default_headers(default_headers(settings, site)?)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            client,
            redirect_counter,
            max_bytes: settings.max_bytes,
        })
    }

    /// GET without judging the status code.
    pub async fn get(&self, url: &Url) -> Result<FetchOutput, FetchError> {
        monitor_debug!("GET {}", url);
        self.execute(url, self.client.get(url.clone())).await
    }

    /// POST an urlencoded form without judging the status code.
    pub async fn post_form(
        &self,
        url: &Url,
        params: &[(String, String)],
    ) -> Result<FetchOutput, FetchError> {
        monitor_debug!("POST {} ({} fields)", url, params.len());
        self.execute(url, self.client.post(url.clone()).form(params))
            .await
    }

    async fn execute(
        &self,
        url: &Url,
        request: reqwest::RequestBuilder,
    ) -> Result<FetchOutput, FetchError> {
        self.redirect_counter.store(0, Ordering::Relaxed);
        let response = request.send().await.map_err(map_reqwest_error)?;

        if let Some(content_len) = response.content_length() {
            if content_len > self.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        let metadata = FetchMetadata {
            original_url: url.to_string(),
            final_url,
            status,
            redirect_count: self.redirect_counter.load(Ordering::Relaxed),
            content_type,
            byte_len: bytes.len() as u64,
        };
        Ok(FetchOutput { bytes, metadata })
    }
}

fn default_headers(settings: &FetchSettings, site: &Url) -> Result<HeaderMap, FetchError> {
    let value = |raw: &str| {
        HeaderValue::from_str(raw)
            .map_err(|err| FetchError::new(FailureKind::InvalidHeader, format!("{raw:?}: {err}")))
    };
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, value(&settings.user_agent)?);
    headers.insert(ACCEPT_LANGUAGE, value(&settings.accept_language)?);
    headers.insert(REFERER, value(site.as_str())?);
    Ok(headers)
}

/// Downloads the listing page over an authenticated session.
#[derive(Debug, Clone)]
pub struct ListingFetcher {
    allowed_content_types: Vec<String>,
}

impl Default for ListingFetcher {
    fn default() -> Self {
        Self {
            allowed_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
            ],
        }
    }
}

impl ListingFetcher {
    /// Fetch and decode. The body is always read as UTF-8: the charset the
    /// site declares is not trustworthy.
    pub async fn fetch(&self, session: &Session, url: &Url) -> Result<DecodedHtml, FetchError> {
        let output = session.get(url).await?.ensure_success()?;

        if let Some(ct) = output.metadata.content_type.as_deref() {
            if !self.is_content_type_allowed(ct) {
                return Err(FetchError::new(
                    FailureKind::UnsupportedContentType {
                        content_type: ct.to_string(),
                    },
                    "unsupported content type",
                ));
            }
        }

        let decoded = decode_utf8(&output.bytes);
        if decoded.had_errors {
            monitor_warn!(
                "Listing body from {} is not valid UTF-8; invalid sequences replaced",
                output.metadata.final_url
            );
        }
        Ok(decoded)
    }

    fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let ct = content_type.split(';').next().unwrap_or(content_type).trim();
        self.allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ct))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
