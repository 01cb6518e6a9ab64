use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{BloodGroup, Urgency};

/// Errors that can occur when handing an alert to a delivery channel
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Gateway rejected alert: {0}")]
    Rejected(String),
}

/// Outbound alert for a single donor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub request_id: Uuid,
    pub donor_id: Uuid,
    pub donor_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub blood_group: BloodGroup,
    pub urgency: Urgency,
    pub distance_km: f64,
    pub message: String,
}

/// Delivery channel for donor alerts (SMS, email, push...)
#[async_trait]
pub trait DeliveryGateway: Send + Sync {
    /// Gateway name, used in logs
    fn name(&self) -> &str;

    async fn deliver(&self, alert: &Alert) -> Result<(), DeliveryError>;
}

/// Writes alerts to the log instead of sending them
#[derive(Debug, Clone, Copy, Default)]
pub struct LogGateway;

#[async_trait]
impl DeliveryGateway for LogGateway {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, alert: &Alert) -> Result<(), DeliveryError> {
        tracing::info!(
            request_id = %alert.request_id,
            donor_id = %alert.donor_id,
            to = %alert.donor_name,
            phone = %alert.phone,
            message = %alert.message,
            "Donor alert"
        );
        Ok(())
    }
}

/// Posts each alert as JSON to an SMS/email relay
pub struct WebhookGateway {
    url: String,
    token: Option<String>,
    client: Client,
}

impl WebhookGateway {
    pub fn new(url: String, token: Option<String>, timeout: Duration) -> Result<Self, DeliveryError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { url, token, client })
    }
}

#[async_trait]
impl DeliveryGateway for WebhookGateway {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn deliver(&self, alert: &Alert) -> Result<(), DeliveryError> {
        let mut request = self.client.post(&self.url).json(alert);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            return Err(DeliveryError::Rejected(format!("{} - {}", status, body)));
        }

        tracing::debug!(donor_id = %alert.donor_id, "Alert posted to webhook");
        Ok(())
    }
}
