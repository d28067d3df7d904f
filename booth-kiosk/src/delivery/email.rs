//! Email transport (Resend API)
//!
//! Sends the strip as a base64 JPEG attachment on a Resend-style
//! `POST /emails` with bearer auth.

use super::{DeliveryTransport, SendRequest};
use booth_common::config::EmailConfig;
use booth_common::events::ChannelKind;
use booth_common::{Error, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const SUBJECT: &str = "Your photo booth strip is ready!";

pub struct ResendEmailTransport {
    client: reqwest::Client,
    config: EmailConfig,
}

impl ResendEmailTransport {
    pub fn new(config: EmailConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl DeliveryTransport for ResendEmailTransport {
    fn channel(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn send(&self, request: &SendRequest) -> Result<String> {
        let filename = format!("photobooth-{}.jpg", request.session_id);
        let body = json!({
            "from": self.config.from_address,
            "to": [request.recipient],
            "subject": SUBJECT,
            "html": email_body(),
            "attachments": [{
                "filename": filename,
                "content": BASE64.encode(request.strip_jpeg.as_slice()),
            }],
        });

        debug!(
            "Sending strip for session {} to {} via {}",
            request.session_id, request.recipient, self.config.api_url
        );

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Delivery(format!("email request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Delivery(format!(
                "email provider returned {}: {}",
                status, detail
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Delivery(format!("email provider response unreadable: {}", e)))?;

        payload
            .get("id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::Delivery("email provider response missing message id".into()))
    }
}

fn email_body() -> &'static str {
    concat!(
        "<div style=\"font-family: sans-serif; text-align: center;\">",
        "<h1>Thanks for visiting the photo booth!</h1>",
        "<p>Your strip is attached. Share it, print it, frame it.</p>",
        "</div>"
    )
}
