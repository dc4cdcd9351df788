use std::time::Duration;

use async_trait::async_trait;

use super::DispatchError;

/// One outbound JSON POST. Returns the HTTP status code; transport
/// failures (connect, timeout) are errors.
#[async_trait]
pub trait ActionTransport: Send + Sync {
    async fn post_json(&self, url: &str, payload: &serde_json::Value)
        -> Result<u16, DispatchError>;
}

/// reqwest-backed transport with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ActionTransport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<u16, DispatchError> {
        let response = self.client.post(url).json(payload).send().await?;
        Ok(response.status().as_u16())
    }
}
