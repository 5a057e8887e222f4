//! Client for the published-design service.

use crate::{EditorError, EditorResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde_json::Value;

/// User agent string for service requests
const USER_AGENT_VALUE: &str = concat!("designer/", env!("CARGO_PKG_VERSION"));

/// Fetches published designs by id
#[derive(Debug, Clone)]
pub struct RemoteClient {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteClient {
    /// Creates a client for the service rooted at `base_url`
    pub fn new(base_url: impl Into<String>) -> EditorResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT_VALUE)
            .build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches the published design `id`.
    ///
    /// The returned snapshot carries `id` and `fetched: true` so a later
    /// local edit can record where it was derived from.
    pub async fn fetch(&self, id: &str, credential: Option<&str>) -> EditorResult<Value> {
        let url = format!("{}/{}", self.base_url, id);
        tracing::debug!("Fetching published design from {}", url);

        let mut request = self.client.get(&url);
        if let Some(credential) = credential {
            request = request.header(AUTHORIZATION, format!("Basic {}", STANDARD.encode(credential)));
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(EditorError::AuthenticationRequired);
        }
        if !status.is_success() {
            return Err(EditorError::RemoteFetch {
                status: status.as_u16(),
            });
        }

        let mut design: Value = response.json().await?;
        let Value::Object(fields) = &mut design else {
            return Err(EditorError::SchemaUpgrade(format!(
                "published design {id} is not a JSON object"
            )));
        };
        fields.insert("id".to_string(), Value::String(id.to_string()));
        fields.insert("fetched".to_string(), Value::Bool(true));

        Ok(design)
    }
}
