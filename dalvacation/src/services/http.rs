use async_trait::async_trait;
use reqwest::Response;
use serde::{de::DeserializeOwned, Deserialize};

/// Information about an unsuccessful response.
#[derive(Debug, Clone)]
pub struct NotSuccessResponseInfo {
    pub status_code: u16,
    pub text: String,
}

#[async_trait]
pub trait ResponseExt {
    async fn check_success(self) -> Result<Self, NotSuccessResponseInfo>
    where
        Self: Sized;
}

#[async_trait]
impl ResponseExt for Response {
    async fn check_success(self) -> Result<Self, NotSuccessResponseInfo> {
        let status = self.status();
        if !status.is_success() {
            return Err(NotSuccessResponseInfo {
                status_code: status.as_u16(),
                text: self
                    .text()
                    .await
                    .unwrap_or_else(|_| "Failed to read response text".to_string()),
            });
        }
        Ok(self)
    }
}

/// Error of any call to the booking backend.
#[derive(Debug, Clone)]
pub struct BackendError {
    pub http_status: Option<u16>,
    pub error: String,
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for BackendError {}

impl From<reqwest::Error> for BackendError {
    fn from(error: reqwest::Error) -> Self {
        Self {
            http_status: error.status().map(|s| s.as_u16()),
            error: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(error: serde_json::Error) -> Self {
        Self {
            http_status: None,
            error: format!("Unexpected response: {}", error),
        }
    }
}

impl From<NotSuccessResponseInfo> for BackendError {
    fn from(info: NotSuccessResponseInfo) -> Self {
        Self {
            http_status: Some(info.status_code),
            error: error_message(&info.text),
        }
    }
}

/// Envelope returned by the booking API gateway: the payload is itself a JSON
/// document serialized into `body`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    #[serde(default)]
    pub status_code: Option<u16>,
    pub body: String,
}

impl ProxyResponse {
    pub fn parse_body<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    pub fn is_success(&self) -> bool {
        self.status_code.map(|s| (200..300).contains(&s)).unwrap_or(true)
    }
}

/// Extracts a readable message from an error body, whatever its shape.
pub fn error_message(text: &str) -> String {
    #[derive(Deserialize)]
    struct Body {
        message: Option<String>,
        error: Option<String>,
    }
    match serde_json::from_str::<Body>(text) {
        Ok(Body {
            message: Some(m), ..
        }) => m,
        Ok(Body { error: Some(e), .. }) => e,
        _ => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_response_body() {
        let res: ProxyResponse =
            serde_json::from_str(r#"{"statusCode":200,"body":"{\"reservationId\":\"r-1\"}"}"#)
                .unwrap();
        assert!(res.is_success());
        let body: serde_json::Value = res.parse_body().unwrap();
        assert_eq!(body["reservationId"], "r-1");

        let res: ProxyResponse =
            serde_json::from_str(r#"{"statusCode":404,"body":"\"Room not found\""}"#).unwrap();
        assert!(!res.is_success());
    }

    #[test]
    fn error_messages() {
        assert_eq!(error_message(r#"{"message":"User exists"}"#), "User exists");
        assert_eq!(error_message(r#"{"error":"Bad request"}"#), "Bad request");
        assert_eq!(error_message("Internal Server Error"), "Internal Server Error");
    }
}
