use anyhow::Result;
use chrono::Utc;
use freelii_orchestrator::client::OrchestratorClient;
use freelii_orchestrator::models::{
    ConfirmRequest, NewDestination, NewWallet, PaymentDestination, PaymentRequest, RateRequest,
    WebhookData, WebhookEvent, WebhookStatus,
};
use rust_decimal::Decimal;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    // Load configuration
    dotenvy::dotenv().ok();

    let base_url = std::env::var("ORCHESTRATOR_URL")
        .unwrap_or_else(|_| "http://localhost:8080".to_string());
    let webhook_secret = std::env::var("WEBHOOK_SECRET")?;

    println!("Payment Orchestrator Test Agent");
    println!("================================");
    println!("Server: {}", base_url);
    println!();

    let client = OrchestratorClient::new(&base_url);

    // Health first; nothing below is meaningful against a dead server.
    let health = client.health().await?;
    println!("Server status: {} (v{})", health.status, health.version);
    println!("Registered anchors: {}", health.anchors.join(", "));
    println!();

    println!("Step 1: Creating wallet and destination...");
    let wallet = client
        .create_wallet(&NewWallet {
            id: "w-demo".to_string(),
            currency: "USDC".to_string(),
        })
        .await?;
    let destination = client
        .create_destination(&NewDestination {
            id: "dest-demo".to_string(),
            currency: "USDC".to_string(),
            holder_name: "Maria Santos".to_string(),
            destination: PaymentDestination::Crypto {
                address: "GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ".to_string(),
                memo: None,
            },
        })
        .await?;
    println!("   [OK] Wallet {} ({})", wallet.id, wallet.currency);
    println!("   [OK] Destination {} ({})", destination.id, destination.currency);
    println!();

    println!("Step 2: Fetching best rate...");
    let selected = client
        .get_rate(&RateRequest {
            source_currency: "USDC".to_string(),
            target_currency: "USDC".to_string(),
            source_amount: Some(Decimal::from(50)),
            target_amount: None,
        })
        .await?;
    println!(
        "   [OK] {} quoted {} (expires in {}s)",
        selected.anchor, selected.rate.exchange_rate, selected.rate.expires_in
    );
    println!();

    println!("Step 3: Creating payment...");
    let payment = client
        .create_payment(&PaymentRequest {
            source_amount: Decimal::from(50),
            recipient_id: 7,
            destination_id: destination.id.clone(),
            sender_id: 3,
            wallet_id: wallet.id.clone(),
        })
        .await?;
    println!(
        "   [OK] Payment {} is {} via {}",
        payment.id, payment.status, payment.anchor
    );
    println!();

    println!("Step 4: Fetching deposit instructions...");
    let instructions = client.payment_instructions(&payment.id).await?;
    println!(
        "   [OK] Send {} {} to {}",
        instructions.total, instructions.currency, instructions.address
    );
    if let Some(memo) = &instructions.memo {
        println!("   [OK] Memo: {}", memo);
    }
    println!();

    println!("Step 5: Settling with the anchor...");
    let settled = client.settle_payment(&payment.id).await?;
    println!("   [OK] Payment is {} via {}", settled.status, settled.anchor);
    println!();

    println!("Step 6: Confirming on-chain submission...");
    let confirmed = client
        .confirm_payment(
            &payment.id,
            &ConfirmRequest {
                tx_id: "demo-op-1".to_string(),
                tx_hash: "b7f9a2c4e8d1f3a5b7f9a2c4e8d1f3a5".to_string(),
            },
        )
        .await?;
    println!("   [OK] Payment is {}", confirmed.status);
    println!();

    println!("Step 7: Delivering signed completion webhook...");
    let ack = client
        .deliver_webhook(
            &WebhookEvent {
                event: "payment.created".to_string(),
                data: WebhookData {
                    payment_id: payment.id.clone(),
                    status: WebhookStatus::Completed,
                    failed_reason: None,
                },
                timestamp: Utc::now().timestamp(),
            },
            &webhook_secret,
        )
        .await?;
    println!(
        "   [OK] Webhook applied={}, payment is {}",
        ack.applied, ack.status
    );
    println!();

    let record = client.payment(&payment.id).await?;
    println!("Final state: {}", record.status);

    let stats = client.stats().await?;
    println!(
        "Server counters: {} rates, {} initiated, {} confirmed, {} failed, {} webhooks",
        stats.rates_served,
        stats.payments_initiated,
        stats.payments_confirmed,
        stats.payments_failed,
        stats.webhooks_received
    );

    Ok(())
}
