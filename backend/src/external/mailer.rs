//! Outbound mail client for OTP delivery
//!
//! Thin client for an HTTP mail relay. Delivery failures are reported as
//! errors but never abort registration; the resend endpoint covers lost
//! mail.

use reqwest::Client;
use serde::Serialize;

use crate::config::MailerConfig;
use crate::error::{AppError, AppResult};

/// Client for the outbound mail relay
#[derive(Clone)]
pub struct MailerClient {
    endpoint: String,
    api_key: String,
    sender: String,
    http_client: Client,
}

#[derive(Debug, Serialize)]
struct SendMailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: String,
}

impl MailerClient {
    /// Create a new client from configuration.
    pub fn new(config: &MailerConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            sender: config.sender.clone(),
            http_client: Client::new(),
        }
    }

    /// Send a one-time verification code.
    pub async fn send_otp(&self, email: &str, otp: &str) -> AppResult<()> {
        tracing::debug!("Sending OTP mail to {}", email);

        let request = SendMailRequest {
            from: &self.sender,
            to: email,
            subject: "Pro Connect – Email Verification",
            text: format!("Your OTP is {}. Valid for 5 minutes.", otp),
        };

        let response = self
            .http_client
            .post(format!("{}/messages", self.endpoint))
            .header("X-Api-Key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::MailerError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::MailerError(format!(
                "Mail relay returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}
