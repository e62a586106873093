//! HTTP endpoint.
//!
//! Chunks go out as `multipart/form-data` POSTs to the endpoint URL, the
//! combine request as a JSON POST to `<endpoint>/combine`.

use std::time::Duration;

use coursemart_protocol::{COMBINE_PATH, CombineRequest, CombineResponse, ErrorResponse, fields};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};

use crate::endpoint::{ChunkRequest, EndpointFuture, UploadEndpoint};
use crate::error::TransportError;

/// [`UploadEndpoint`] backed by `reqwest`.
pub struct HttpEndpoint {
    http: reqwest::Client,
    base_url: String,
}

impl HttpEndpoint {
    /// Creates an endpoint for `base_url` with the transport's default timeouts.
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        Self::with_options(base_url, None, None)
    }

    /// Creates an endpoint with an optional per-request timeout and bearer token.
    pub fn with_options(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
        auth_token: Option<&str>,
    ) -> Result<Self, TransportError> {
        let base_url = parse_base_url(base_url.into())?;

        let mut headers = HeaderMap::new();
        if let Some(token) = auth_token.filter(|t| !t.is_empty()) {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|_| TransportError::InvalidToken)?,
            );
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url,
        })
    }

    /// URL chunk requests are posted to.
    pub fn upload_url(&self) -> &str {
        &self.base_url
    }

    /// URL the combine request is posted to.
    pub fn combine_url(&self) -> String {
        format!("{}{COMBINE_PATH}", self.base_url)
    }

    async fn post_chunk(&self, request: ChunkRequest<'_>) -> Result<(), TransportError> {
        let part = Part::bytes(request.data.to_vec())
            .file_name(format!("chunk-{}", request.chunk_number))
            .mime_str("application/octet-stream")?;

        let form = Form::new()
            .part(fields::CHUNK, part)
            .text(fields::UPLOAD_ID, request.upload_id.to_string())
            .text(fields::CHUNK_NUMBER, request.chunk_number.to_string())
            .text(fields::TOTAL_CHUNKS, request.total_chunks.to_string())
            .text(fields::CHECKSUM, request.checksum.to_string());

        let resp = self.http.post(&self.base_url).multipart(form).send().await?;
        check_status(resp).await?;
        Ok(())
    }

    async fn post_combine(&self, request: &CombineRequest) -> Result<CombineResponse, TransportError> {
        let resp = self
            .http
            .post(self.combine_url())
            .json(request)
            .send()
            .await?;
        let resp = check_status(resp).await?;

        let body = resp.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| TransportError::InvalidResponse(e.to_string()))
    }
}

/// Checks that `raw` is an absolute http(s) URL and trims trailing slashes.
fn parse_base_url(raw: String) -> Result<String, TransportError> {
    let invalid = |reason: String| TransportError::InvalidUrl {
        url: raw.clone(),
        reason,
    };
    let url = reqwest::Url::parse(&raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

/// Maps a non-2xx response to [`TransportError::Status`].
///
/// Uses the `error` field of a JSON error body when present, the raw body
/// otherwise.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let raw = resp.text().await.unwrap_or_default();
    let body = serde_json::from_str::<ErrorResponse>(&raw)
        .map(|e| e.error)
        .unwrap_or(raw);
    Err(TransportError::Status {
        status: status.as_u16(),
        body,
    })
}

impl UploadEndpoint for HttpEndpoint {
    fn upload_chunk<'a>(&'a self, request: ChunkRequest<'a>) -> EndpointFuture<'a, ()> {
        Box::pin(self.post_chunk(request))
    }

    fn combine<'a>(&'a self, request: &'a CombineRequest) -> EndpointFuture<'a, CombineResponse> {
        Box::pin(self.post_combine(request))
    }
}
