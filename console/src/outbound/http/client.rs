//! Reqwest-backed console API adapter.
//!
//! This adapter owns transport details only: URL building, bearer
//! authentication, HTTP error mapping and JSON decoding.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_DISPOSITION, CONTENT_TYPE, HeaderName};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde_json::Value;
use tracing::debug;

use super::dto::{LoginRequestDto, LoginResponseDto, decode_user};
use crate::domain::ports::{
    ApiError, AuthApi, Download, ExportApi, ExportRequest, LoginGrant, ResourceApi, ResourcePath,
    filename_from_disposition,
};
use crate::domain::{BearerToken, LoginCredentials, SessionUser};

/// Console API client bound to one base URL and, optionally, one token.
#[derive(Debug, Clone)]
pub struct HttpConsoleApi {
    client: Client,
    base: Url,
    token: Option<BearerToken>,
}

impl HttpConsoleApi {
    /// Build an adapter; `timeout` of `None` leaves requests unbounded.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base: Url, timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let builder = Client::builder();
        let builder = match timeout {
            Some(limit) => builder.timeout(limit),
            None => builder,
        };
        Ok(Self {
            client: builder.build()?,
            base,
            token: None,
        })
    }

    /// Copy of this adapter that authenticates as `token`.
    #[must_use]
    pub fn with_token(&self, token: BearerToken) -> Self {
        Self {
            client: self.client.clone(),
            base: self.base.clone(),
            token: Some(token),
        }
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub const fn base(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &ResourcePath) -> Result<Url, ApiError> {
        endpoint(&self.base, path)
    }

    fn request(
        &self,
        method: Method,
        path: &ResourcePath,
        token: Option<&BearerToken>,
    ) -> Result<RequestBuilder, ApiError> {
        let url = self.url(path)?;
        let request = self.client.request(method, url);
        Ok(match token {
            Some(bearer) => request.bearer_auth(bearer.expose()),
            None => request,
        })
    }

    async fn send_json(
        &self,
        method: Method,
        path: &ResourcePath,
        body: Option<&Value>,
        token: Option<&BearerToken>,
    ) -> Result<Value, ApiError> {
        let request = self
            .request(method.clone(), path, token)?
            .header(ACCEPT, "application/json");
        let request = match body {
            Some(json) => request.json(json),
            None => request,
        };
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        debug!(%method, %path, status = status.as_u16(), "api response");
        if !status.is_success() {
            return Err(map_status_error(status, bytes.as_ref()));
        }
        decode_body(bytes.as_ref())
    }
}

#[async_trait]
impl ResourceApi for HttpConsoleApi {
    async fn get(&self, path: &ResourcePath) -> Result<Value, ApiError> {
        self.send_json(Method::GET, path, None, self.token.as_ref())
            .await
    }

    async fn post(&self, path: &ResourcePath, body: &Value) -> Result<Value, ApiError> {
        self.send_json(Method::POST, path, Some(body), self.token.as_ref())
            .await
    }

    async fn put(&self, path: &ResourcePath, body: &Value) -> Result<Value, ApiError> {
        self.send_json(Method::PUT, path, Some(body), self.token.as_ref())
            .await
    }

    async fn patch(&self, path: &ResourcePath, body: &Value) -> Result<Value, ApiError> {
        self.send_json(Method::PATCH, path, Some(body), self.token.as_ref())
            .await
    }

    async fn delete(&self, path: &ResourcePath) -> Result<(), ApiError> {
        self.send_json(Method::DELETE, path, None, self.token.as_ref())
            .await
            .map(drop)
    }
}

#[async_trait]
impl AuthApi for HttpConsoleApi {
    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginGrant, ApiError> {
        let body = serde_json::to_value(LoginRequestDto::from(credentials))
            .map_err(|err| ApiError::decode(err.to_string()))?;
        let path = ResourcePath::new("auth").child("login");
        let response = self
            .send_json(Method::POST, &path, Some(&body), None)
            .await?;
        serde_json::from_value::<LoginResponseDto>(response)
            .map_err(|err| ApiError::decode(format!("invalid login response: {err}")))?
            .into_grant()
    }

    async fn profile(&self, token: &BearerToken) -> Result<SessionUser, ApiError> {
        let path = ResourcePath::new("user").child("profile");
        let response = self.send_json(Method::GET, &path, None, Some(token)).await?;
        decode_user(&response)
    }
}

#[async_trait]
impl ExportApi for HttpConsoleApi {
    async fn download(&self, request: &ExportRequest) -> Result<Download, ApiError> {
        let path = request.path();
        let response = self
            .request(Method::GET, &path, self.token.as_ref())?
            .query(&request.query())
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        let (filename, content_type) = {
            let header = |name: HeaderName| {
                response
                    .headers()
                    .get(name)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_owned)
            };
            let filename = header(CONTENT_DISPOSITION)
                .as_deref()
                .and_then(filename_from_disposition)
                .unwrap_or_else(|| request.fallback_filename());
            (filename, header(CONTENT_TYPE))
        };
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, bytes.as_ref()));
        }
        debug!(%path, %filename, size = bytes.len(), "export downloaded");
        Ok(Download {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}

fn endpoint(base: &Url, path: &ResourcePath) -> Result<Url, ApiError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| ApiError::transport(format!("base URL `{base}` cannot carry a path")))?
        .pop_if_empty()
        .extend(path.segments());
    Ok(url)
}

fn decode_body(body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body)
        .map_err(|err| ApiError::decode(format!("invalid JSON payload: {err}")))
}

fn map_transport_error(error: reqwest::Error) -> ApiError {
    ApiError::transport(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ApiError {
    let detail = error_detail(body);
    let message = if detail.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        detail
    };

    match status {
        StatusCode::UNAUTHORIZED => ApiError::unauthorized(message),
        StatusCode::FORBIDDEN => ApiError::forbidden(message),
        StatusCode::NOT_FOUND => ApiError::not_found(message),
        _ if status.is_client_error() => ApiError::rejected(status.as_u16(), message),
        _ => ApiError::transport(format!("status {}: {message}", status.as_u16())),
    }
}

// FastAPI puts the reason under `detail`, as a string or a validation list.
fn error_detail(body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => match fields.get("detail") {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => body_preview(body),
        },
        _ => body_preview(body),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network mapping helpers.

    use super::*;
    use rstest::rstest;

    fn base() -> Url {
        Url::parse("http://127.0.0.1:8000/api/").expect("base url")
    }

    #[rstest]
    #[case(ResourcePath::new("clients"), "http://127.0.0.1:8000/api/clients")]
    #[case(
        ResourcePath::new("users").child("amy smith").child("status"),
        "http://127.0.0.1:8000/api/users/amy%20smith/status"
    )]
    #[case(
        ResourcePath::new("services").child("SV/1").child("notes"),
        "http://127.0.0.1:8000/api/services/SV%2F1/notes"
    )]
    fn segments_are_escaped_under_the_base(#[case] path: ResourcePath, #[case] expected: &str) {
        assert_eq!(endpoint(&base(), &path).expect("url").as_str(), expected);
    }

    #[test]
    fn base_without_trailing_slash_still_nests() {
        let base = Url::parse("http://localhost/api").expect("base url");
        let url = endpoint(&base, &ResourcePath::new("councils")).expect("url");
        assert_eq!(url.as_str(), "http://localhost/api/councils");
    }

    #[rstest]
    #[case::unauthorized(StatusCode::UNAUTHORIZED, "Unauthorized")]
    #[case::forbidden(StatusCode::FORBIDDEN, "Forbidden")]
    #[case::not_found(StatusCode::NOT_FOUND, "NotFound")]
    #[case::unprocessable(StatusCode::UNPROCESSABLE_ENTITY, "Rejected")]
    #[case::server_error(StatusCode::INTERNAL_SERVER_ERROR, "Transport")]
    fn maps_http_statuses_to_expected_port_errors(
        #[case] status: StatusCode,
        #[case] expected: &str,
    ) {
        let error = map_status_error(status, br#"{"detail":"Client not found"}"#);
        let matched = match expected {
            "Unauthorized" => matches!(error, ApiError::Unauthorized { .. }),
            "Forbidden" => matches!(error, ApiError::Forbidden { .. }),
            "NotFound" => matches!(error, ApiError::NotFound { .. }),
            "Rejected" => matches!(error, ApiError::Rejected { status: 422, .. }),
            "Transport" => matches!(error, ApiError::Transport { .. }),
            _ => panic!("unsupported test expectation: {expected}"),
        };
        assert!(matched, "{status} mapped to {error:?}");
    }

    #[rstest]
    #[case(br#"{"detail":"Invalid credentials"}"#.as_slice(), "Invalid credentials")]
    #[case(br#"{"detail":[{"msg":"field required"}]}"#.as_slice(), r#"[{"msg":"field required"}]"#)]
    #[case(b"Internal   Server\nError".as_slice(), "Internal Server Error")]
    #[case(b"".as_slice(), "")]
    fn extracts_error_details(#[case] body: &[u8], #[case] expected: &str) {
        assert_eq!(error_detail(body), expected);
    }

    #[test]
    fn empty_success_bodies_decode_as_null() {
        assert_eq!(decode_body(b" \n").expect("decode"), Value::Null);
        assert!(matches!(decode_body(b"<html>"), Err(ApiError::Decode { .. })));
    }

    #[test]
    fn long_previews_are_truncated() {
        let body = "x".repeat(200);
        let preview = body_preview(body.as_bytes());
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 163);
    }

    #[test]
    fn token_copies_share_the_base() {
        let api = HttpConsoleApi::new(base(), None).expect("client");
        let authed = api.with_token(BearerToken::new("t"));
        assert_eq!(authed.base(), api.base());
        assert!(authed.token.is_some());
    }
}
