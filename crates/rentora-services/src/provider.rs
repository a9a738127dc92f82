//! Payment provider gateway
//!
//! HTTP client for the external payment provider. The gateway is called
//! outside of any database transaction; callers decide what a provider
//! failure means for their own records.

use async_trait::async_trait;
use rentora_core::{config::ProviderConfig, AppError, AppResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, instrument};
use uuid::Uuid;

/// Charge request sent to the provider
#[derive(Debug, Clone, Serialize)]
pub struct ChargeRequest {
    /// Our payment reference, echoed back in provider events
    pub reference: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub description: String,
    /// When false the provider places a hold instead of capturing
    pub capture: bool,
}

/// Checkout session returned by the provider
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSession {
    pub session_id: String,
    pub checkout_url: Option<String>,
}

/// Asynchronous event delivered by the provider webhook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEvent {
    pub event_type: ProviderEventType,
    /// Our payment reference, if the provider echoed it
    pub payment_reference: Option<Uuid>,
    /// Provider-side transaction identifier
    pub external_transaction_id: Option<String>,
    /// Provider-side status string, e.g. "succeeded" or "requires_capture"
    pub provider_status: Option<String>,
    /// Raw event payload, persisted for audit
    pub payload: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderEventType {
    Success,
    Failure,
    Refund,
}

/// Outbound calls to the payment provider
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Start a charge (or a hold, when `capture` is false) and return
    /// the checkout session
    async fn initiate_charge(&self, request: &ChargeRequest) -> AppResult<ProviderSession>;

    /// Release a previously placed hold without capturing it
    async fn release_hold(&self, transaction_id: &str) -> AppResult<()>;
}

/// reqwest-based gateway talking to the provider's REST API
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout_ms: u64,
}

impl HttpPaymentGateway {
    pub fn new(config: &ProviderConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build provider client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout_ms: config.timeout_ms,
        })
    }

    fn map_request_error(&self, err: reqwest::Error) -> AppError {
        if err.is_timeout() {
            AppError::ProviderTimeout(self.timeout_ms)
        } else {
            AppError::Provider(format!("Provider request failed: {}", err))
        }
    }

    async fn check_status(&self, response: reqwest::Response) -> AppResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        error!("Provider returned {}: {}", status, body);
        Err(AppError::Provider(format!(
            "Provider returned {}: {}",
            status, body
        )))
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    #[instrument(skip(self, request), fields(reference = %request.reference))]
    async fn initiate_charge(&self, request: &ChargeRequest) -> AppResult<ProviderSession> {
        let url = format!("{}/v1/charges", self.base_url);
        debug!("Initiating charge of {} {}", request.amount, request.currency);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let response = self.check_status(response).await?;

        let session: ProviderSession = response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("Invalid provider response: {}", e)))?;

        debug!("Provider session {} created", session.session_id);
        Ok(session)
    }

    #[instrument(skip(self))]
    async fn release_hold(&self, transaction_id: &str) -> AppResult<()> {
        let url = format!("{}/v1/charges/{}/release", self.base_url, transaction_id);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        self.check_status(response).await?;
        debug!("Hold {} released", transaction_id);
        Ok(())
    }
}
