use crate::domain::model::{AuthContext, Contact, ContactFilter, Operation};
use crate::domain::ports::{ContactStore, TokenProvider};
use crate::utils::error::{ContactError, Result};
use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

pub fn build_client(timeout_seconds: u64) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()?;
    Ok(client)
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub subscription: String,
    pub requestor: String,
}

impl ApiCredentials {
    /// base64 of `client_id:client_secret`, as the auth endpoint expects.
    pub fn encoded(&self) -> String {
        base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", self.client_id, self.client_secret))
    }
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    authentication: String,
    requestor: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<Value>,
}

/// Token lifetime in seconds. Some gateways send it as a string.
fn expiry_seconds(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Requests a fresh token from `POST {base}/auth` for every operation.
pub struct ApiTokenProvider {
    client: Client,
    base_url: String,
    credentials: ApiCredentials,
}

impl ApiTokenProvider {
    pub fn new(client: Client, base_url: &str, credentials: ApiCredentials) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            credentials,
        }
    }
}

fn auth_error(message: impl Into<String>) -> ContactError {
    ContactError::Auth {
        message: message.into(),
    }
}

#[async_trait]
impl TokenProvider for ApiTokenProvider {
    async fn get_token(&self, operation: Operation) -> Result<AuthContext> {
        let url = endpoint(&self.base_url, "auth");
        tracing::debug!("🔑 {}: Requesting token from {}", operation, url);

        let response = self
            .client
            .post(&url)
            .header("Subscription", &self.credentials.subscription)
            .json(&TokenRequest {
                authentication: self.credentials.encoded(),
                requestor: &self.credentials.requestor,
            })
            .send()
            .await
            .map_err(|e| auth_error(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(auth_error(format!(
                "token endpoint returned status {}",
                status
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| auth_error(format!("unreadable token response: {}", e)))?;

        let expires_in = body.expires_in.as_ref().and_then(expiry_seconds);
        match (body.access_token, expires_in) {
            (Some(token), Some(expires_in)) if !token.is_empty() && expires_in > 0.0 => {
                tracing::debug!("🔑 {}: Token valid for {}s", operation, expires_in);
                Ok(AuthContext::new(operation)
                    .with_header("Subscription", &self.credentials.subscription)
                    .with_header("Authorization", &format!("Bearer {}", token))
                    .with_header("requestor", &self.credentials.requestor)
                    .with_header("test_case", operation.tag()))
            }
            _ => Err(auth_error("response carried no usable access token")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ContactsEnvelope {
    contacts: Vec<Contact>,
}

#[derive(Debug, Serialize)]
struct ContactsPayload<'a> {
    contacts: &'a [Contact],
}

/// Contacts collection behind `GET`/`POST {base}/contacts`.
pub struct HttpContactStore {
    client: Client,
    base_url: String,
}

impl HttpContactStore {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    fn authorized(&self, request: RequestBuilder, auth: &AuthContext) -> RequestBuilder {
        auth.headers
            .iter()
            .fold(request, |request, (name, value)| request.header(name, value))
    }
}

async fn failure_detail(response: Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(body) if !body.is_empty() => format!("status {}: {}", status, body),
        _ => format!("status {}", status),
    }
}

#[async_trait]
impl ContactStore for HttpContactStore {
    async fn list_contacts(
        &self,
        auth: &AuthContext,
        filter: &ContactFilter,
    ) -> Result<Vec<Contact>> {
        let url = endpoint(&self.base_url, "contacts");
        let mut request = self.authorized(self.client.get(&url), auth);
        if let Some(status) = &filter.status {
            request = request.query(&[("status", status)]);
        }

        tracing::debug!("📡 {}: GET {} ({:?})", auth.operation, url, filter);
        let response = request.send().await.map_err(|e| ContactError::Fetch {
            message: e.to_string(),
        })?;
        tracing::debug!("📡 {}: API response status: {}", auth.operation, response.status());

        if !response.status().is_success() {
            return Err(ContactError::Fetch {
                message: failure_detail(response).await,
            });
        }

        let envelope: ContactsEnvelope =
            response.json().await.map_err(|e| ContactError::Fetch {
                message: format!("malformed contacts response: {}", e),
            })?;
        Ok(envelope.contacts)
    }

    async fn save_contacts(&self, auth: &AuthContext, batch: &[Contact]) -> Result<()> {
        let url = endpoint(&self.base_url, "contacts");
        tracing::debug!("📡 {}: POST {} ({} contacts)", auth.operation, url, batch.len());

        let response = self
            .authorized(self.client.post(&url), auth)
            .json(&ContactsPayload { contacts: batch })
            .send()
            .await
            .map_err(|e| ContactError::Persist {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ContactError::Persist {
                message: failure_detail(response).await,
            });
        }
        Ok(())
    }
}
