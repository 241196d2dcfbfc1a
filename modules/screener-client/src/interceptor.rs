//! Outbound request hooks, applied to every request before it is sent.

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Request;

use crate::error::{ApiError, Result};

pub trait RequestInterceptor: Send + Sync {
    /// Inspect or rewrite the request. Returning an error aborts the call
    /// before anything is sent; it surfaces as a configuration error.
    fn intercept(&self, request: Request) -> Result<Request>;
}

/// Sends the request as built.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThrough;

impl RequestInterceptor for PassThrough {
    fn intercept(&self, request: Request) -> Result<Request> {
        Ok(request)
    }
}

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tags each request with a fresh `X-Request-Id` so server logs can be
/// correlated with client logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestIdInterceptor;

impl RequestInterceptor for RequestIdInterceptor {
    fn intercept(&self, mut request: Request) -> Result<Request> {
        let id = uuid::Uuid::new_v4().to_string();
        let value = HeaderValue::from_str(&id).map_err(|e| ApiError::Config(e.to_string()))?;
        tracing::debug!(request_id = %id, url = %request.url(), "Tagging request");
        request
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
        Ok(request)
    }
}
