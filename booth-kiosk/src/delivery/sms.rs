//! SMS/MMS transport (Twilio API)
//!
//! Sends an MMS pointing at the hosted strip URL via a Twilio-style
//! `POST /Accounts/{sid}/Messages.json` with basic auth. The image rides as
//! `MediaUrl`, so a publicly reachable strip URL is required.

use super::{DeliveryTransport, SendRequest};
use booth_common::config::SmsConfig;
use booth_common::events::ChannelKind;
use booth_common::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

const MESSAGE_BODY: &str = "Your photo booth strip is ready! 📸";

/// Normalize a user-entered phone number to E.164
///
/// Strips formatting characters, assumes the NANP country code for bare
/// ten-digit numbers, and prefixes '+'.
pub fn normalize_phone(raw: &str) -> Result<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(Error::InvalidInput(format!(
            "phone number '{}' contains no digits",
            raw
        )));
    }
    let digits = if digits.len() == 10 {
        format!("1{}", digits)
    } else {
        digits
    };
    Ok(format!("+{}", digits))
}

pub struct TwilioSmsTransport {
    client: reqwest::Client,
    config: SmsConfig,
}

impl TwilioSmsTransport {
    pub fn new(config: SmsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl DeliveryTransport for TwilioSmsTransport {
    fn channel(&self) -> ChannelKind {
        ChannelKind::Sms
    }

    async fn send(&self, request: &SendRequest) -> Result<String> {
        let strip_url = request.strip_url.as_deref().ok_or_else(|| {
            Error::InvalidInput("MMS delivery requires a hosted strip URL".into())
        })?;
        let to = normalize_phone(&request.recipient)?;

        let url = format!(
            "{}/Accounts/{}/Messages.json",
            self.config.api_url, self.config.account_sid
        );
        let form = [
            ("To", to.as_str()),
            ("From", self.config.from_number.as_str()),
            ("Body", MESSAGE_BODY),
            ("MediaUrl", strip_url),
        ];

        debug!(
            "Sending strip for session {} to {} via MMS",
            request.session_id, to
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::Delivery(format!("sms request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Delivery(format!(
                "sms provider returned {}: {}",
                status, detail
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Delivery(format!("sms provider response unreadable: {}", e)))?;

        payload
            .get("sid")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::Delivery("sms provider response missing message sid".into()))
    }
}
