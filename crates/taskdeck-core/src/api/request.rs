use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;

use super::error::{ApiError, ApiErrorKind, ApiResult};

/// A single outbound API call: method, URL, headers, optional body.
///
/// Built fresh per call and never persisted. The client clones it to rebuild
/// the request for the one retry after a token refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::PATCH, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Serializes `body` as the JSON request body and sets the content type.
    ///
    /// # Errors
    /// Returns an error if the body cannot be serialized.
    pub fn json<T: Serialize>(mut self, body: &T) -> ApiResult<Self> {
        let bytes = serde_json::to_vec(body).map_err(|err| {
            ApiError::new(
                ApiErrorKind::Parse,
                format!("Failed to serialize request body: {err}"),
            )
        })?;
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.body = Some(bytes);
        Ok(self)
    }
}
