use std::fmt;

use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::profile::UserProfile;

/// Backend seam for the profile view. The real client talks HTTP; tests
/// substitute a recording fake.
pub trait BackendApi {
    fn fetch_me(&self) -> impl Future<Output = Result<UserProfile>> + Send;
    fn check_tasks(&self) -> impl Future<Output = Result<String>> + Send;
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .build()
            .wrap_err("failed to build HTTP client for the backend")?;
        Ok(Self { base_url, http })
    }
}

impl BackendApi for ApiClient {
    async fn fetch_me(&self) -> Result<UserProfile> {
        let url = format!("{}/user/me", self.base_url);
        let res = self
            .http
            .get(url)
            .send()
            .await
            .wrap_err("profile request failed")?;
        let status = res.status();
        let bytes = res
            .bytes()
            .await
            .wrap_err("failed to read profile response body")?;
        if !status.is_success() {
            return Err(eyre!(error_message(status, &bytes)));
        }
        UserProfile::from_me_payload(&bytes)
    }

    async fn check_tasks(&self) -> Result<String> {
        let url = format!("{}/task/check", self.base_url);
        let res = self
            .http
            .get(url)
            .send()
            .await
            .wrap_err("task check request failed")?;
        let status = res.status();
        let bytes = res
            .bytes()
            .await
            .wrap_err("failed to read task check response body")?;
        if !status.is_success() {
            return Err(eyre!(error_message(status, &bytes)));
        }
        let dto: TaskCheckDto =
            serde_json::from_slice(&bytes).wrap_err("invalid task check payload")?;
        Ok(dto.message)
    }
}

#[derive(Deserialize)]
struct TaskCheckDto {
    message: String,
}

#[derive(Deserialize)]
struct ErrorBodyDto {
    message: String,
}

// Failure notifications carry the backend's message verbatim when it sends
// one, and fall back to the HTTP status otherwise.
fn error_message(status: StatusCode, bytes: &[u8]) -> String {
    match serde_json::from_slice::<ErrorBodyDto>(bytes) {
        Ok(body) => body.message,
        Err(_) => format!("backend responded with {status}"),
    }
}

impl fmt::Display for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    #[test]
    fn error_message__prefers_the_backend_message() {
        let body = br#"{"message":"task service unavailable"}"#;

        let message = error_message(StatusCode::BAD_GATEWAY, body);

        assert_eq!(message, "task service unavailable");
    }

    #[test]
    fn error_message__falls_back_to_the_http_status() {
        let message = error_message(StatusCode::INTERNAL_SERVER_ERROR, b"<html>");

        assert_eq!(message, "backend responded with 500 Internal Server Error");
    }

    #[test]
    fn new__trims_trailing_slashes_from_the_base_url() {
        let client = ApiClient::new("http://localhost:5000/").unwrap();

        assert_eq!(client.to_string(), "http://localhost:5000");
    }
}
