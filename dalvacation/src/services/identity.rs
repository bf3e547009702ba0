use async_trait::async_trait;
use reqwest::{IntoUrl, Method, RequestBuilder};
use serde::{Deserialize, Serialize};

use crate::signup::form::{Credentials, UserRole};

use super::http::{NotSuccessResponseInfo, ResponseExt};

const SIGN_UP_TARGET: &str = "AWSCognitoIdentityProviderService.SignUp";
const AMZ_JSON: &str = "application/x-amz-json-1.1";

/// Name of the identity attribute holding the account role.
pub const ROLE_ATTRIBUTE: &str = "custom:userRole";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub username: String,
    pub password: String,
    pub options: SignUpOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpOptions {
    pub user_attributes: UserAttributes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAttributes {
    pub email: String,
    #[serde(rename = "custom:userRole")]
    pub role: UserRole,
}

impl From<&Credentials> for SignUpRequest {
    fn from(credentials: &Credentials) -> Self {
        Self {
            username: credentials.email.clone(),
            password: credentials.password.clone(),
            options: SignUpOptions {
                user_attributes: UserAttributes {
                    email: credentials.email.clone(),
                    role: credentials.role,
                },
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct IdentityError {
    pub http_status: Option<u16>,
    /// Exception name reported by the provider, e.g. `UsernameExistsException`.
    pub kind: Option<String>,
    pub error: String,
}

impl std::fmt::Display for IdentityError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for IdentityError {}

impl From<reqwest::Error> for IdentityError {
    fn from(error: reqwest::Error) -> Self {
        Self {
            http_status: error.status().map(|s| s.as_u16()),
            kind: None,
            error: error.to_string(),
        }
    }
}

impl From<NotSuccessResponseInfo> for IdentityError {
    fn from(info: NotSuccessResponseInfo) -> Self {
        #[derive(Deserialize)]
        struct ProviderError {
            #[serde(rename = "__type")]
            kind: Option<String>,
            #[serde(alias = "Message")]
            message: Option<String>,
        }
        match serde_json::from_str::<ProviderError>(&info.text) {
            Ok(e) => Self {
                http_status: Some(info.status_code),
                // The exception name may be namespaced: `com.amazonaws...#UsernameExistsException`.
                kind: e
                    .kind
                    .map(|k| k.rsplit('#').next().unwrap_or_default().to_string()),
                error: e.message.unwrap_or(info.text),
            },
            Err(_) => Self {
                http_status: Some(info.status_code),
                kind: None,
                error: info.text,
            },
        }
    }
}

/// External service owning the credentials.
#[async_trait]
pub trait IdentityProvider: std::fmt::Debug + Send + Sync {
    /// Creates an unconfirmed account carrying the requested attributes.
    async fn sign_up(&self, request: &SignUpRequest) -> Result<(), IdentityError>;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CognitoSignUp<'a> {
    client_id: &'a str,
    username: &'a str,
    password: &'a str,
    user_attributes: [CognitoAttribute<'a>; 2],
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CognitoAttribute<'a> {
    name: &'a str,
    value: &'a str,
}

/// Cognito user pool client, speaking the `SignUp` action of the public API.
#[derive(Debug, Clone)]
pub struct CognitoClient {
    http: reqwest::Client,
    endpoint: String,
    client_id: String,
}

impl CognitoClient {
    pub fn new(region: &str, client_id: String) -> Self {
        Self::with_endpoint(
            format!("https://cognito-idp.{}.amazonaws.com/", region),
            client_id,
        )
    }

    pub fn with_endpoint(endpoint: String, client_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            client_id,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request<U: IntoUrl>(&self, url: U, target: &str) -> RequestBuilder {
        let req = self
            .http
            .request(Method::POST, url)
            .header("X-Amz-Target", target)
            .header("Content-Type", AMZ_JSON);
        tracing::debug!("Sending http request: {:?}", req);
        req
    }
}

#[async_trait]
impl IdentityProvider for CognitoClient {
    async fn sign_up(&self, request: &SignUpRequest) -> Result<(), IdentityError> {
        let attributes = &request.options.user_attributes;
        let body = CognitoSignUp {
            client_id: &self.client_id,
            username: &request.username,
            password: &request.password,
            user_attributes: [
                CognitoAttribute {
                    name: "email",
                    value: &attributes.email,
                },
                CognitoAttribute {
                    name: ROLE_ATTRIBUTE,
                    value: attributes.role.as_str(),
                },
            ],
        };
        // The x-amz-json content type is not the one set by `RequestBuilder::json`.
        let content = serde_json::to_vec(&body).map_err(|e| IdentityError {
            http_status: None,
            kind: None,
            error: e.to_string(),
        })?;

        self.request(&self.endpoint, SIGN_UP_TARGET)
            .body(content)
            .send()
            .await?
            .check_success()
            .await?;

        tracing::info!("Identity created for {}", request.username);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, header, method},
        Mock, MockServer, ResponseTemplate,
    };

    fn request() -> SignUpRequest {
        SignUpRequest::from(&Credentials {
            email: "a@b.com".to_string(),
            password: "Abcd1234!".to_string(),
            role: UserRole::Regular,
        })
    }

    #[test]
    fn sign_up_request_payload() {
        assert_eq!(
            serde_json::to_value(request()).unwrap(),
            json!({
                "username": "a@b.com",
                "password": "Abcd1234!",
                "options": {
                    "userAttributes": {
                        "email": "a@b.com",
                        "custom:userRole": "regular"
                    }
                }
            })
        );
    }

    #[test]
    fn default_endpoint() {
        let client = CognitoClient::new("us-east-1", "client".to_string());
        assert_eq!(client.endpoint(), "https://cognito-idp.us-east-1.amazonaws.com/");
    }

    #[tokio::test]
    async fn sign_up_sends_cognito_action() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("X-Amz-Target", SIGN_UP_TARGET))
            .and(header("Content-Type", AMZ_JSON))
            .and(body_json(json!({
                "ClientId": "web-client",
                "Username": "a@b.com",
                "Password": "Abcd1234!",
                "UserAttributes": [
                    { "Name": "email", "Value": "a@b.com" },
                    { "Name": "custom:userRole", "Value": "regular" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "UserConfirmed": false,
                "UserSub": "1234"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = CognitoClient::with_endpoint(server.uri(), "web-client".to_string());
        client.sign_up(&request()).await.unwrap();
    }

    #[tokio::test]
    async fn provider_errors_become_a_single_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "__type": "com.amazonaws.cognito#UsernameExistsException",
                "message": "An account with the given email already exists."
            })))
            .mount(&server)
            .await;

        let client = CognitoClient::with_endpoint(server.uri(), "web-client".to_string());
        let err = client.sign_up(&request()).await.unwrap_err();
        assert_eq!(err.http_status, Some(400));
        assert_eq!(err.kind.as_deref(), Some("UsernameExistsException"));
        assert_eq!(
            err.to_string(),
            "An account with the given email already exists."
        );
    }
}
