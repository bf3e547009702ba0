use async_trait::async_trait;
use reqwest::Response;
use serde::Serialize;

pub use super::http::BackendError;
use super::http::ResponseExt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityProfileRequest {
    pub email: String,
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmIdentityRequest {
    #[serde(rename = "userPoolId")]
    pub user_pool_id: String,
    pub username: String,
}

/// Backend finishing an account once the identity provider created it.
#[async_trait]
pub trait ProfileBackend: std::fmt::Debug + Send + Sync {
    /// Stores the recovery question and answer of the account.
    async fn save_security_profile(
        &self,
        request: &SecurityProfileRequest,
    ) -> Result<(), BackendError>;
    /// Marks the identity provider account as confirmed, without the out-of-band code.
    async fn confirm_identity(&self, request: &ConfirmIdentityRequest)
        -> Result<(), BackendError>;
}

#[derive(Debug, Clone)]
pub struct ProfileClient {
    http: reqwest::Client,
    security_question_url: String,
    confirm_user_url: String,
}

impl ProfileClient {
    pub fn new(security_question_url: String, confirm_user_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            security_question_url,
            confirm_user_url,
        }
    }

    async fn post_json<T: Serialize + Sync>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<Response, BackendError> {
        let req = self
            .http
            .post(url)
            .header("Content-Type", "application/json")
            .json(body);
        tracing::debug!("Sending http request: {:?}", req);
        Ok(req.send().await?.check_success().await?)
    }
}

#[async_trait]
impl ProfileBackend for ProfileClient {
    async fn save_security_profile(
        &self,
        request: &SecurityProfileRequest,
    ) -> Result<(), BackendError> {
        self.post_json(&self.security_question_url, request).await?;
        Ok(())
    }

    async fn confirm_identity(
        &self,
        request: &ConfirmIdentityRequest,
    ) -> Result<(), BackendError> {
        self.post_json(&self.confirm_user_url, request).await?;
        tracing::info!("Identity of {} confirmed", request.username);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn client(server: &MockServer) -> ProfileClient {
        ProfileClient::new(
            format!("{}/security-question", server.uri()),
            format!("{}/confirm-user", server.uri()),
        )
    }

    #[tokio::test]
    async fn posts_documented_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/security-question"))
            .and(body_json(json!({
                "email": "a@b.com",
                "question": "What was the name of your first pet?",
                "answer": "Rex"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/confirm-user"))
            .and(body_json(json!({
                "userPoolId": "us-east-1_pool",
                "username": "a@b.com"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        client
            .save_security_profile(&SecurityProfileRequest {
                email: "a@b.com".to_string(),
                question: "What was the name of your first pet?".to_string(),
                answer: "Rex".to_string(),
            })
            .await
            .unwrap();
        client
            .confirm_identity(&ConfirmIdentityRequest {
                user_pool_id: "us-east-1_pool".to_string(),
                username: "a@b.com".to_string(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn failures_keep_status_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({ "message": "Internal error" })),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .confirm_identity(&ConfirmIdentityRequest {
                user_pool_id: "pool".to_string(),
                username: "a@b.com".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.http_status, Some(500));
        assert_eq!(err.to_string(), "Internal error");
    }
}
