//! [`Transport`] over HTTP using [`reqwest`], with a cookie-backed session
//! shared by every request.

use async_trait::async_trait;
use facemark_types::{config::ServiceConfig, outcome::ServiceResponse, FacemarkError, Result};
use serde_json::Value;
use tokio::time::Duration;
use tracing::{debug, info};

use crate::{classify_reply, endpoints, transport_error, Transport};

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| {
                FacemarkError::Configuration(format!("failed to build http client: {err}"))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Opens an admin session. The login page answers a good form with a
    /// redirect and a bad one by re-rendering itself.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url(endpoints::LOGIN))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|err| transport_error(format!("login request failed: {err}")))?;

        if response.status().is_redirection() {
            info!("Admin session opened for {}", username);
            Ok(())
        } else if response.status().is_success() {
            Err(FacemarkError::Domain("Invalid credentials".into()))
        } else {
            Err(transport_error(format!(
                "login failed with status {}",
                response.status().as_u16()
            )))
        }
    }

    async fn read(&self, response: reqwest::Response) -> Result<ServiceResponse> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| transport_error(format!("failed to read response body: {err}")))?;
        debug!("HTTP {} ({} bytes)", status, body.len());
        classify_reply(status, &body)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, path: &str) -> Result<ServiceResponse> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|err| transport_error(format!("GET {path} failed: {err}")))?;
        self.read(response).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<ServiceResponse> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|err| transport_error(format!("POST {path} failed: {err}")))?;
        self.read(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_in_base_url_is_trimmed() {
        let transport = HttpTransport::new(&ServiceConfig {
            base_url: "http://localhost:5000/".into(),
            timeout_ms: 1000,
        })
        .unwrap();
        assert_eq!(
            transport.url(endpoints::PENDING),
            "http://localhost:5000/api/admin/pending"
        );
    }

    #[tokio::test]
    async fn unreachable_service_is_transport_error() {
        let transport = HttpTransport::new(&ServiceConfig {
            base_url: "http://127.0.0.1:9".into(),
            timeout_ms: 500,
        })
        .unwrap();
        let err = transport.get_json(endpoints::USERS).await.unwrap_err();
        assert!(matches!(err, FacemarkError::Transport(_)));
    }
}
