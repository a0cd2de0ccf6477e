use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::anchors::{AnchorRegistry, CashoutParams};
use crate::error::OrchestratorError;
use crate::models::{
    ConfirmRequest, PaymentInstructions, PaymentRail, PaymentRecord, PaymentRequest,
    PaymentStatus, QuoteRequest, RateRequest, SelectedRate, WebhookEvent, WebhookOutcome,
    WebhookStatus,
};
use crate::services::metrics::Metrics;
use crate::services::payments::PaymentStore;

/// Drives every payment from rate lookup to terminal state.
///
/// Anchor selection always runs on the crypto rail: funding leaves the
/// sender's wallet on-chain regardless of where the recipient is paid out,
/// and the destination rail only matters once the anchor cashes out.
pub struct OrchestratorService {
    registry: Arc<AnchorRegistry>,
    store: Arc<PaymentStore>,
    metrics: Arc<Metrics>,
}

impl OrchestratorService {
    pub fn new(registry: Arc<AnchorRegistry>, store: Arc<PaymentStore>, metrics: Arc<Metrics>) -> Self {
        Self {
            registry,
            store,
            metrics,
        }
    }

    /// Best available rate across all registered anchors, fee-adjusted.
    pub async fn get_rate(&self, request: &RateRequest) -> Result<SelectedRate, OrchestratorError> {
        let quote_request = request.quote_request()?;
        let (anchor, quote) = self
            .registry
            .select(&quote_request, PaymentRail::Crypto)
            .await?;

        Ok(SelectedRate {
            anchor: anchor.name().to_string(),
            rate: quote.rate(),
        })
    }

    /// Creates a payment in CREATED with the amounts fixed by the winning
    /// quote. No anchor is committed yet; settlement re-runs selection.
    pub async fn initiate_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentRecord, OrchestratorError> {
        let wallet = self.store.wallet(&request.wallet_id).await?;
        let destination = self.store.destination(&request.destination_id).await?;

        if request.source_amount <= Decimal::ZERO {
            return Err(OrchestratorError::MissingAmount);
        }

        let quote_request = QuoteRequest::for_source(
            &wallet.currency,
            &destination.currency,
            request.source_amount,
        );
        let (anchor, quote) = self
            .registry
            .select(&quote_request, PaymentRail::Crypto)
            .await?;

        let record = PaymentRecord::new(request, anchor.name(), &quote);
        let snapshot = record.clone();
        self.store.insert_payment(record).await;

        self.metrics
            .record_payment_initiated(&snapshot.id, &snapshot.anchor)
            .await;
        info!(
            payment_id = %snapshot.id,
            anchor = %snapshot.anchor,
            source = %snapshot.source_amount,
            target = %snapshot.target_amount,
            "Payment created"
        );

        Ok(snapshot)
    }

    /// What the sender must pay, and where. Before settlement the deposit
    /// address is resolved live from the quoted anchor; afterwards the
    /// address the anchor committed to is returned unchanged.
    pub async fn payment_instructions(
        &self,
        payment_id: &str,
    ) -> Result<PaymentInstructions, OrchestratorError> {
        let record = self.store.payment(payment_id).await?;

        let (address, memo) = match record.liquidation_address.clone() {
            Some(address) => (address, record.liquidation_memo.clone()),
            None => {
                let destination = self.store.destination(&record.destination_id).await?;
                let anchor = self.registry.get(&record.anchor)?;
                let liquidation = anchor
                    .get_liquidation_address(&destination.destination)
                    .await?;
                (liquidation.address, liquidation.memo)
            }
        };

        Ok(PaymentInstructions {
            payment_id: record.id,
            currency: record.source_currency,
            amount: record.source_amount,
            fee: record.fee,
            total: record.source_amount + record.fee,
            address,
            memo,
        })
    }

    /// Commits the payment to an anchor: resolves a deposit address, runs
    /// any conversion, books the cash-out, and moves CREATED to
    /// ANCHOR_ACCEPTED. Candidates that cannot resolve a deposit address
    /// are skipped in ranked order; once conversion or cash-out has been
    /// attempted, failures mark the payment FAILED.
    pub async fn settle_payment(&self, payment_id: &str) -> Result<PaymentRecord, OrchestratorError> {
        let mut payment = self.store.lock_payment(payment_id).await?;

        if payment.status != PaymentStatus::Created {
            return Err(OrchestratorError::InvalidTransition {
                payment_id: payment.id.clone(),
                from: payment.status,
                to: PaymentStatus::AnchorAccepted,
            });
        }

        let destination = self.store.destination(&payment.destination_id).await?;
        let quote_request = QuoteRequest::for_source(
            &payment.source_currency,
            &payment.target_currency,
            payment.source_amount,
        );

        let ranked = match self
            .registry
            .ranked(&quote_request, PaymentRail::Crypto)
            .await
        {
            Ok(ranked) => ranked,
            Err(err) => {
                payment.fail(err.to_string())?;
                self.metrics.record_payment_failed();
                return Err(err);
            }
        };

        let mut last_error = None;
        for (anchor, quote) in ranked {
            // Address resolution moves no funds; conversion and cash-out
            // do, which is why only this stage falls through.
            let liquidation = match anchor
                .get_liquidation_address(&destination.destination)
                .await
            {
                Ok(liquidation) => liquidation,
                Err(err) => {
                    warn!(
                        payment_id = %payment.id,
                        anchor = anchor.name(),
                        error = %err,
                        "Could not resolve a liquidation address, trying next anchor"
                    );
                    last_error = Some(err);
                    continue;
                }
            };

            if quote.source_currency != quote.target_currency {
                if let Err(err) = anchor
                    .convert_currency(
                        &quote.source_currency,
                        &quote.target_currency,
                        quote.source_amount,
                        quote.target_amount,
                    )
                    .await
                {
                    payment.fail(err.to_string())?;
                    self.metrics.record_payment_failed();
                    return Err(err);
                }
            }

            let external_order_id = if destination.destination.requires_cashout() {
                let params = CashoutParams {
                    internal_order_id: payment.id.clone(),
                    target_amount: quote.target_amount,
                    source_currency: quote.source_currency.clone(),
                    target_currency: quote.target_currency.clone(),
                    recipient_name: destination.holder_name.clone(),
                    destination: destination.destination.clone(),
                };
                match anchor.request_cashout(&params).await {
                    Ok(receipt) => Some(receipt.external_order_id),
                    Err(err) => {
                        payment.fail(err.to_string())?;
                        self.metrics.record_payment_failed();
                        return Err(err);
                    }
                }
            } else {
                None
            };

            payment.accept(
                anchor.name(),
                liquidation.address,
                liquidation.memo,
                external_order_id,
            )?;
            info!(
                payment_id = %payment.id,
                anchor = anchor.name(),
                "Payment accepted by anchor"
            );
            return Ok(payment.clone());
        }

        payment.fail("no anchor could provide a liquidation address")?;
        self.metrics.record_payment_failed();
        Err(
            last_error.unwrap_or_else(|| OrchestratorError::NoEligibleAnchor {
                source_currency: quote_request.source_currency.clone(),
                target_currency: quote_request.target_currency.clone(),
                rail: PaymentRail::Crypto,
            }),
        )
    }

    /// Records the sender's on-chain submission and starts the wait for
    /// anchor confirmation.
    pub async fn confirm_payment(
        &self,
        payment_id: &str,
        request: &ConfirmRequest,
    ) -> Result<PaymentRecord, OrchestratorError> {
        let mut payment = self.store.lock_payment(payment_id).await?;
        payment.record_submission(request.tx_id.clone(), request.tx_hash.clone())?;

        info!(
            payment_id = %payment.id,
            tx_hash = %request.tx_hash,
            "Payment submitted, awaiting anchor confirmation"
        );

        Ok(payment.clone())
    }

    /// Applies an anchor status callback. Replays and late arrivals on
    /// settled payments are absorbed rather than rejected, so anchors can
    /// redeliver freely.
    pub async fn process_webhook(
        &self,
        event: &WebhookEvent,
    ) -> Result<(PaymentRecord, WebhookOutcome), OrchestratorError> {
        self.metrics.record_webhook(&event.event).await;

        let mut payment = self
            .store
            .lock_payment(&event.data.payment_id)
            .await
            .map_err(|err| match err {
                OrchestratorError::PaymentNotFound(id) => {
                    OrchestratorError::WebhookMismatch(format!("unknown payment {}", id))
                }
                other => other,
            })?;

        let outcome = payment.apply_webhook(event.data.status, event.data.failed_reason.clone())?;

        if outcome == WebhookOutcome::Applied {
            match event.data.status {
                WebhookStatus::Completed => self.metrics.record_payment_confirmed(),
                WebhookStatus::Failed => self.metrics.record_payment_failed(),
                WebhookStatus::Pending => {}
            }
        }

        info!(
            payment_id = %payment.id,
            event = %event.event,
            status = %payment.status,
            applied = outcome == WebhookOutcome::Applied,
            "Webhook processed"
        );

        Ok((payment.clone(), outcome))
    }

    pub async fn payment_state(&self, payment_id: &str) -> Result<PaymentRecord, OrchestratorError> {
        self.store.payment(payment_id).await
    }
}
