use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Default assistant endpoint; overridable through the config file.
pub const DEFAULT_ENDPOINT: &str = "https://api.monadassistant.xyz";

#[derive(Serialize)]
struct AskRequest {
    message: String,
}

#[derive(Deserialize)]
struct AskResponse {
    answer: String,
}

/// HTTP client for the assistant endpoint. Cheap to clone so a spawned task
/// can own its own copy while a request is in flight.
#[derive(Clone)]
pub struct AssistantClient {
    client: Client,
    base_url: String,
}

impl AssistantClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Send one message, returning the assistant's answer verbatim.
    /// A non-success status or a malformed body is an error; the caller
    /// decides how failures surface.
    pub async fn ask(&self, message: &str) -> Result<String> {
        let url = format!("{}/ask", self.base_url);

        let request = AskRequest {
            message: message.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "assistant request failed with status: {}",
                response.status()
            ));
        }

        let body: AskResponse = response.json().await?;
        Ok(body.answer)
    }
}
