//! Thin REST client for the platform API.

use std::time::Duration;

use reqwest::header::{ETAG, HeaderName, IF_NONE_MATCH, LINK};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::ApiError;
use crate::models::DeleteResult;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Raw page response: body plus the headers pagination depends on.
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub body: String,
    pub etag: Option<String>,
    pub link: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for `path`. Absolute inputs pass through untouched.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!(%method, %url, "API request");
        self.http.request(method, url)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = check(self.request(Method::GET, path).send().await?).await?;
        Ok(resp.json::<T>().await?)
    }

    pub async fn get_text(&self, path: &str) -> Result<String, ApiError> {
        let resp = check(self.request(Method::GET, path).send().await?).await?;
        Ok(resp.text().await?)
    }

    pub async fn options_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = check(self.request(Method::OPTIONS, path).send().await?).await?;
        Ok(resp.json::<T>().await?)
    }

    /// Conditional paged GET. A matching `etag` makes the server answer 304,
    /// reported as [`ApiError::NotModified`].
    pub async fn get_page(
        &self,
        path: &str,
        query: &[(String, String)],
        etag: Option<&str>,
    ) -> Result<PageResponse, ApiError> {
        let mut req = self.request(Method::GET, path).query(query);
        if let Some(tag) = etag {
            req = req.header(IF_NONE_MATCH, tag);
        }
        let resp = check(req.send().await?).await?;
        let header = |name: HeaderName| {
            resp.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let etag = header(ETAG);
        let link = header(LINK);
        let body = resp.text().await?;
        Ok(PageResponse { body, etag, link })
    }

    /// DELETE a resource. A `{success: false, errors}` body is a failure too.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let resp = check(self.request(Method::DELETE, path).send().await?).await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Ok(());
        }
        match serde_json::from_str::<DeleteResult>(&body) {
            Ok(result) if !result.success => Err(ApiError::Status {
                status,
                message: Some(result.errors.join("; ")),
            }),
            _ => Ok(()),
        }
    }
}

/// Map 304 and non-success statuses to [`ApiError`], keeping the server's `{message}`.
async fn check(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status == StatusCode::NOT_MODIFIED {
        return Err(ApiError::NotModified);
    }
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp
        .text()
        .await
        .ok()
        .and_then(|body| serde_json::from_str::<ErrorBody>(&body).ok())
        .and_then(|b| b.message);
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}
