use axum::{
    body::Body,
    extract::Request,
    middleware::Next,
    response::Response,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

use crate::error::OrchestratorError;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

// Anchors redeliver webhooks; bodies stay small. Anything larger than
// this is not a callback we recognize.
const MAX_WEBHOOK_BYTES: usize = 64 * 1024;

/// Shared-secret HMAC-SHA256 verification for anchor callbacks. The
/// signature covers the raw request body and travels hex-encoded in the
/// `X-Webhook-Signature` header.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: String,
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn sign(&self, payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    pub fn verify(&self, payload: &[u8], signature: &str) -> Result<(), OrchestratorError> {
        let provided = hex::decode(signature).map_err(|_| OrchestratorError::InvalidSignature)?;

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(payload);
        mac.verify_slice(&provided)
            .map_err(|_| OrchestratorError::InvalidSignature)
    }
}

// Axum middleware function. Buffers the body, checks the signature, and
// replays the bytes into the request so extractors downstream see an
// untouched payload.
pub async fn verify_webhook_signature(
    verifier: Arc<SignatureVerifier>,
    request: Request,
    next: Next,
) -> Result<Response, OrchestratorError> {
    let signature = request
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::to_owned)
        .ok_or(OrchestratorError::InvalidSignature)?;

    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_WEBHOOK_BYTES)
        .await
        .map_err(|_| OrchestratorError::InvalidSignature)?;

    verifier.verify(&bytes, &signature)?;

    let request = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(request).await)
}
