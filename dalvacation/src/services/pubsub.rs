use serde::{Deserialize, Serialize};

use super::http::{BackendError, ResponseExt};

/// Customer concern forwarded to the support agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcernMessage {
    pub booking_reference: String,
    pub customer_concern: String,
    pub customer_email: String,
    pub customer_id: String,
}

#[derive(Debug, Serialize)]
struct PublishRequest<'a> {
    message: &'a ConcernMessage,
}

#[derive(Debug, Clone)]
pub struct PubSubClient {
    http: reqwest::Client,
    url: String,
}

impl PubSubClient {
    pub fn new(url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            url,
        }
    }

    pub async fn publish_message(
        &self,
        message: &ConcernMessage,
    ) -> Result<serde_json::Value, BackendError> {
        let req = self
            .http
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&PublishRequest { message });
        tracing::debug!("Sending http request: {:?}", req);
        let response = req
            .send()
            .await?
            .check_success()
            .await
            .map_err(|e| {
                tracing::error!("Error publishing message: {:?}", e);
                BackendError::from(e)
            })?;
        // Some deployments answer with an empty body.
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}
