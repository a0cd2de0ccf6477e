use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::handlers::WebhookAck;
use crate::middleware::{SignatureVerifier, SIGNATURE_HEADER};
use crate::models::{
    ApiResponse, ConfirmRequest, DestinationRecord, HealthStatus, NewDestination, NewWallet,
    PaymentInstructions, PaymentRecord, PaymentRequest, RateRequest, SelectedRate, Stats,
    WalletRecord, WebhookEvent,
};

/// Typed client for the orchestrator HTTP API. Used by the smoke-test
/// agent and handy for integration scripts; webhook delivery signs the
/// payload the same way a real anchor would.
pub struct OrchestratorClient {
    base_url: String,
    http: Client,
}

impl OrchestratorClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Ok(response.json().await?)
    }

    pub async fn stats(&self) -> Result<Stats> {
        let response = self
            .http
            .get(format!("{}/stats", self.base_url))
            .send()
            .await?;
        Ok(response.json().await?)
    }

    pub async fn create_wallet(&self, wallet: &NewWallet) -> Result<WalletRecord> {
        self.post("/api/wallets", wallet).await
    }

    pub async fn create_destination(
        &self,
        destination: &NewDestination,
    ) -> Result<DestinationRecord> {
        self.post("/api/destinations", destination).await
    }

    pub async fn get_rate(&self, request: &RateRequest) -> Result<SelectedRate> {
        self.post("/api/rates", request).await
    }

    pub async fn create_payment(&self, request: &PaymentRequest) -> Result<PaymentRecord> {
        self.post("/api/payments", request).await
    }

    pub async fn payment(&self, payment_id: &str) -> Result<PaymentRecord> {
        let url = format!("{}/api/payments/{}", self.base_url, payment_id);
        let response = self.http.get(url).send().await?;
        Self::unwrap_envelope(response).await
    }

    pub async fn payment_instructions(&self, payment_id: &str) -> Result<PaymentInstructions> {
        let url = format!("{}/api/payments/{}/instructions", self.base_url, payment_id);
        let response = self.http.get(url).send().await?;
        Self::unwrap_envelope(response).await
    }

    pub async fn settle_payment(&self, payment_id: &str) -> Result<PaymentRecord> {
        let url = format!("{}/api/payments/{}/settle", self.base_url, payment_id);
        let response = self.http.post(url).send().await?;
        Self::unwrap_envelope(response).await
    }

    pub async fn confirm_payment(
        &self,
        payment_id: &str,
        request: &ConfirmRequest,
    ) -> Result<PaymentRecord> {
        let url = format!("{}/api/payments/{}/confirm", self.base_url, payment_id);
        let response = self.http.post(url).json(request).send().await?;
        Self::unwrap_envelope(response).await
    }

    /// Delivers a webhook the way an anchor does: raw JSON body plus an
    /// HMAC signature over those exact bytes.
    pub async fn deliver_webhook(
        &self,
        event: &WebhookEvent,
        webhook_secret: &str,
    ) -> Result<WebhookAck> {
        let body = serde_json::to_vec(event).context("Failed to serialize webhook event")?;
        let signature = SignatureVerifier::new(webhook_secret).sign(&body);

        let response = self
            .http
            .post(format!("{}/api/webhooks/anchor", self.base_url))
            .header(SIGNATURE_HEADER, signature)
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await?;
        Self::unwrap_envelope(response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;
        Self::unwrap_envelope(response).await
    }

    async fn unwrap_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Request failed with {}: {}", status, body);
        }

        let envelope: ApiResponse<T> = response.json().await?;
        Ok(envelope.data)
    }
}
