use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Method;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;

use crate::anchors::{Anchor, CashoutParams, CashoutReceipt, LiquidationAddress};
use crate::error::OrchestratorError;
use crate::models::{
    AnchorQuote, AnchorRate, PaymentDestination, PaymentRail, QuoteAmount, QuoteRequest,
};
use crate::services::CacheService;

type HmacSha256 = Hmac<Sha256>;

const ANCHOR_NAME: &str = "CoinsPH";
const RATE_TTL_SECS: u64 = 30;

const TICKER_PATH: &str = "/openapi/quote/v1/ticker/price";
const GET_QUOTE_PATH: &str = "/openapi/convert/v1/get-quote";
const ACCEPT_QUOTE_PATH: &str = "/openapi/convert/v1/accept-quote";
const CASH_OUT_PATH: &str = "/openapi/fiat/v1/cash-out";
const DEPOSIT_ADDRESS_PATH: &str = "/openapi/wallet/v1/deposit/address";

// Binance-compatible envelope wrapped around convert and fiat endpoints.
// status 0 means success; anything else carries an upstream error code
// (for example -1022 for a rejected signature).
#[derive(Debug, Deserialize)]
struct CoinsEnvelope<T> {
    status: i64,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct TickerPrice {
    #[allow(dead_code)]
    symbol: String,
    price: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConvertQuoteData {
    quote_id: String,
    price: Decimal,
    expiry: u64,
    source_currency: String,
    target_currency: String,
    source_amount: Decimal,
    target_amount: Decimal,
    #[serde(default)]
    fee: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AcceptQuoteData {
    order_id: String,
    #[allow(dead_code)]
    status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CashoutData {
    external_order_id: String,
    internal_order_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DepositAddressData {
    #[allow(dead_code)]
    coin: String,
    address: String,
    #[serde(default)]
    address_tag: Option<String>,
}

// Philippine fiat anchor over the Coins.ph openapi. Requests follow the
// Binance signing convention: every signed call carries a millisecond
// timestamp and an HMAC-SHA256 hex signature over the query string.
pub struct CoinsPhAnchor {
    host: String,
    api_key: String,
    api_secret: String,
    http: reqwest::Client,
    cache: Arc<CacheService>,
    rails: Vec<PaymentRail>,
    currencies: Vec<String>,
}

impl CoinsPhAnchor {
    pub fn new(
        host: &str,
        api_key: &str,
        api_secret: &str,
        timeout_secs: u64,
        cache: Arc<CacheService>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            host: host.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            http,
            cache,
            rails: vec![PaymentRail::Crypto, PaymentRail::Wire, PaymentRail::Ewallet],
            currencies: vec!["USDC".to_string(), "USD".to_string(), "PHP".to_string()],
        })
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.api_secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn signed_url(
        &self,
        path: &str,
        mut params: Vec<(String, String)>,
    ) -> Result<String, OrchestratorError> {
        params.push((
            "timestamp".to_string(),
            Utc::now().timestamp_millis().to_string(),
        ));

        let url = reqwest::Url::parse_with_params(&format!("{}{}", self.host, path), &params)
            .map_err(|e| {
                OrchestratorError::InternalError(format!("invalid Coins.ph URL: {}", e))
            })?;

        // The signature covers the encoded query exactly as sent.
        let query = url.query().unwrap_or("").to_string();
        let signature = self.sign(&query);
        Ok(format!("{}&signature={}", url, signature))
    }

    async fn signed_call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: Vec<(String, String)>,
    ) -> Result<T, OrchestratorError> {
        let url = self.signed_url(path, params)?;
        let response = self
            .http
            .request(method, &url)
            .header("X-COINS-APIKEY", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OrchestratorError::AnchorError {
                anchor: ANCHOR_NAME.to_string(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        Ok(response.json::<T>().await?)
    }

    fn take_data<T>(&self, envelope: CoinsEnvelope<T>) -> Result<T, OrchestratorError> {
        if envelope.status != 0 {
            return Err(OrchestratorError::AnchorError {
                anchor: ANCHOR_NAME.to_string(),
                message: format!(
                    "status {}: {}",
                    envelope.status,
                    envelope.error.unwrap_or_default()
                ),
            });
        }

        envelope.data.ok_or_else(|| OrchestratorError::AnchorError {
            anchor: ANCHOR_NAME.to_string(),
            message: "empty response data".to_string(),
        })
    }

    // InstaPay settles instantly but is capped per transfer; PESONet
    // covers everything above the cap.
    fn cashout_channel(amount: Decimal) -> &'static str {
        if amount <= Decimal::from(50_000) {
            "INSTAPAY"
        } else {
            "SWIFTPAY_PESONET"
        }
    }
}

#[async_trait]
impl Anchor for CoinsPhAnchor {
    fn name(&self) -> &str {
        ANCHOR_NAME
    }

    fn supported_rails(&self) -> &[PaymentRail] {
        &self.rails
    }

    fn supported_currencies(&self) -> &[String] {
        &self.currencies
    }

    async fn request_quote(&self, request: &QuoteRequest) -> Result<AnchorQuote, OrchestratorError> {
        self.ensure_currency(&request.source_currency)?;
        self.ensure_currency(&request.target_currency)?;

        let mut params = vec![
            ("sourceCurrency".to_string(), request.source_currency.clone()),
            ("targetCurrency".to_string(), request.target_currency.clone()),
        ];
        match request.amount {
            QuoteAmount::Source(amount) => {
                params.push(("sourceAmount".to_string(), amount.to_string()));
            }
            QuoteAmount::Target(amount) => {
                params.push(("targetAmount".to_string(), amount.to_string()));
            }
        }

        let envelope: CoinsEnvelope<ConvertQuoteData> =
            self.signed_call(Method::POST, GET_QUOTE_PATH, params).await?;
        let data = self.take_data(envelope)?;

        Ok(AnchorQuote {
            quote_id: data.quote_id,
            exchange_rate: data.price,
            expires_in: data.expiry,
            source_currency: data.source_currency,
            target_currency: data.target_currency,
            source_amount: data.source_amount,
            target_amount: data.target_amount,
            fee: data.fee,
            total: data.source_amount + data.fee,
        })
    }

    async fn get_rate(
        &self,
        source_currency: &str,
        target_currency: &str,
    ) -> Result<AnchorRate, OrchestratorError> {
        let cache_key = format!("rate:coinsph:{}{}", source_currency, target_currency);
        if let Some(cached) = self.cache.get::<AnchorRate>(&cache_key).await.ok().flatten() {
            tracing::debug!(
                "Returning cached Coins.ph rate for {}{}",
                source_currency,
                target_currency
            );
            return Ok(cached);
        }

        let symbol = format!("{}{}", source_currency, target_currency);
        let response = self
            .http
            .get(format!("{}{}", self.host, TICKER_PATH))
            .query(&[("symbol", symbol.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OrchestratorError::AnchorError {
                anchor: ANCHOR_NAME.to_string(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let ticker: TickerPrice = response.json().await?;
        let rate = AnchorRate {
            exchange_rate: ticker.price,
            expires_in: RATE_TTL_SECS,
        };

        self.cache
            .set(&cache_key, &rate, RATE_TTL_SECS)
            .await
            .map_err(|e| OrchestratorError::CacheError(e.to_string()))?;

        Ok(rate)
    }

    // Funds are delivered to Coins.ph's own USDC deposit account on
    // Stellar; the recipient is paid out on the fiat side afterwards.
    async fn get_liquidation_address(
        &self,
        _destination: &PaymentDestination,
    ) -> Result<LiquidationAddress, OrchestratorError> {
        let params = vec![
            ("coin".to_string(), "USDC".to_string()),
            ("network".to_string(), "XLM".to_string()),
        ];
        let data: DepositAddressData = self
            .signed_call(Method::GET, DEPOSIT_ADDRESS_PATH, params)
            .await?;

        Ok(LiquidationAddress {
            address: data.address,
            memo: data.address_tag.filter(|tag| !tag.is_empty()),
        })
    }

    async fn request_cashout(
        &self,
        params: &CashoutParams,
    ) -> Result<CashoutReceipt, OrchestratorError> {
        let (channel_subject, account_number, mobile) = match &params.destination {
            PaymentDestination::Ewallet {
                mobile_number,
                provider,
            } => (provider.clone(), mobile_number.clone(), Some(mobile_number.clone())),
            PaymentDestination::Wire {
                external_account_id,
                ..
            }
            | PaymentDestination::Ach {
                external_account_id,
                ..
            }
            | PaymentDestination::Sepa {
                external_account_id,
                ..
            } => (external_account_id.clone(), external_account_id.clone(), None),
            PaymentDestination::Crypto { .. } => {
                return Err(OrchestratorError::AnchorError {
                    anchor: ANCHOR_NAME.to_string(),
                    message: "cash-out requires a fiat or e-wallet destination".to_string(),
                });
            }
        };

        let channel = Self::cashout_channel(params.target_amount);
        tracing::info!(
            payment_id = %params.internal_order_id,
            channel = channel,
            amount = %params.target_amount,
            "Requesting Coins.ph cash-out"
        );

        let mut request_params = vec![
            ("internalOrderId".to_string(), params.internal_order_id.clone()),
            ("amount".to_string(), params.target_amount.to_string()),
            ("currency".to_string(), params.target_currency.clone()),
            ("recipientName".to_string(), params.recipient_name.clone()),
            ("recipientAccountNumber".to_string(), account_number),
            ("channelName".to_string(), channel.to_string()),
            ("channelSubject".to_string(), channel_subject),
        ];
        if let Some(mobile_number) = mobile {
            request_params.push(("recipientMobile".to_string(), mobile_number));
        }

        let envelope: CoinsEnvelope<CashoutData> = self
            .signed_call(Method::POST, CASH_OUT_PATH, request_params)
            .await?;
        let data = self.take_data(envelope)?;

        Ok(CashoutReceipt {
            external_order_id: data.external_order_id,
            internal_order_id: data.internal_order_id,
        })
    }

    async fn convert_currency(
        &self,
        source_currency: &str,
        target_currency: &str,
        source_amount: Decimal,
        expected_target_amount: Decimal,
    ) -> Result<Decimal, OrchestratorError> {
        let request = QuoteRequest::for_source(source_currency, target_currency, source_amount);
        let quote = self.request_quote(&request).await?;

        if quote.target_amount < expected_target_amount {
            tracing::warn!(
                achieved = %quote.target_amount,
                expected = %expected_target_amount,
                "Conversion quote came in below the expected target amount"
            );
        }

        let envelope: CoinsEnvelope<AcceptQuoteData> = self
            .signed_call(
                Method::POST,
                ACCEPT_QUOTE_PATH,
                vec![("quoteId".to_string(), quote.quote_id.clone())],
            )
            .await?;
        let data = self.take_data(envelope)?;

        tracing::info!(
            order_id = %data.order_id,
            source = source_currency,
            target = target_currency,
            "Coins.ph conversion executed"
        );

        Ok(quote.target_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use rust_decimal_macros::dec;

    async fn test_anchor(host: &str) -> CoinsPhAnchor {
        let cache = Arc::new(CacheService::new("redis://127.0.0.1:1").await.unwrap());
        CoinsPhAnchor::new(host, "test-key", "test-secret", 5, cache).unwrap()
    }

    #[tokio::test]
    async fn signatures_are_hex_and_deterministic() {
        let anchor = test_anchor("http://localhost").await;

        let first = anchor.sign("sourceCurrency=USDC&targetCurrency=PHP&timestamp=1");
        let second = anchor.sign("sourceCurrency=USDC&targetCurrency=PHP&timestamp=1");

        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));

        let other = anchor.sign("sourceCurrency=USDC&targetCurrency=PHP&timestamp=2");
        assert_ne!(first, other);
    }

    #[tokio::test]
    async fn rate_fetches_ticker_once_then_serves_from_cache() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", TICKER_PATH)
            .match_query(Matcher::UrlEncoded("symbol".into(), "USDCPHP".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"symbol":"USDCPHP","price":"57.5"}"#)
            .expect(1)
            .create_async()
            .await;

        let anchor = test_anchor(&server.url()).await;

        let first = anchor.get_rate("USDC", "PHP").await.unwrap();
        assert_eq!(first.exchange_rate, dec!(57.5));

        let second = anchor.get_rate("USDC", "PHP").await.unwrap();
        assert_eq!(second.exchange_rate, dec!(57.5));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn quote_total_includes_the_fee() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", GET_QUOTE_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"status":0,"error":"OK","data":{
                    "quoteId":"q-771","price":"57.5","expiry":30,
                    "sourceCurrency":"USDC","targetCurrency":"PHP",
                    "sourceAmount":"100","targetAmount":"5750","fee":"2.50"
                }}"#,
            )
            .create_async()
            .await;

        let anchor = test_anchor(&server.url()).await;
        let request = QuoteRequest::for_source("USDC", "PHP", dec!(100));

        let quote = anchor.request_quote(&request).await.unwrap();

        assert_eq!(quote.quote_id, "q-771");
        assert_eq!(quote.exchange_rate, dec!(57.5));
        assert_eq!(quote.fee, dec!(2.50));
        assert_eq!(quote.total, dec!(102.50));
        assert_eq!(quote.target_amount, dec!(5750));
    }

    #[tokio::test]
    async fn envelope_errors_surface_the_upstream_code() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", GET_QUOTE_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":-1022,"error":"Signature for this request is not valid."}"#)
            .create_async()
            .await;

        let anchor = test_anchor(&server.url()).await;
        let request = QuoteRequest::for_source("USDC", "PHP", dec!(100));

        let err = anchor.request_quote(&request).await.unwrap_err();
        match err {
            OrchestratorError::AnchorError { anchor, message } => {
                assert_eq!(anchor, "CoinsPH");
                assert!(message.contains("-1022"));
            }
            other => panic!("expected AnchorError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn large_cashouts_route_through_pesonet() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", CASH_OUT_PATH)
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("channelName".into(), "SWIFTPAY_PESONET".into()),
                Matcher::UrlEncoded("recipientName".into(), "Juan dela Cruz".into()),
                Matcher::UrlEncoded("internalOrderId".into(), "pay-9".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"status":0,"error":"OK","data":{
                    "externalOrderId":"ext-55","internalOrderId":"pay-9"
                }}"#,
            )
            .create_async()
            .await;

        let anchor = test_anchor(&server.url()).await;
        let params = CashoutParams {
            internal_order_id: "pay-9".to_string(),
            target_amount: dec!(60000),
            source_currency: "USDC".to_string(),
            target_currency: "PHP".to_string(),
            recipient_name: "Juan dela Cruz".to_string(),
            destination: PaymentDestination::Wire {
                external_account_id: "0001-2345".to_string(),
                currency: "PHP".to_string(),
            },
        };

        let receipt = anchor.request_cashout(&params).await.unwrap();
        assert_eq!(receipt.external_order_id, "ext-55");
        assert_eq!(receipt.internal_order_id, "pay-9");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn conversion_quotes_then_accepts() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", GET_QUOTE_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"status":0,"error":"OK","data":{
                    "quoteId":"q-9","price":"57.5","expiry":30,
                    "sourceCurrency":"USDC","targetCurrency":"PHP",
                    "sourceAmount":"100","targetAmount":"5750","fee":"0"
                }}"#,
            )
            .create_async()
            .await;
        let accept = server
            .mock("POST", ACCEPT_QUOTE_PATH)
            .match_query(Matcher::UrlEncoded("quoteId".into(), "q-9".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":0,"error":"OK","data":{"orderId":"ord-1","status":"SUCCESS"}}"#)
            .create_async()
            .await;

        let anchor = test_anchor(&server.url()).await;
        let achieved = anchor
            .convert_currency("USDC", "PHP", dec!(100), dec!(5700))
            .await
            .unwrap();

        assert_eq!(achieved, dec!(5750));
        accept.assert_async().await;
    }

    #[tokio::test]
    async fn crypto_destinations_cannot_cash_out() {
        let anchor = test_anchor("http://localhost:1").await;
        let params = CashoutParams {
            internal_order_id: "pay-1".to_string(),
            target_amount: dec!(10),
            source_currency: "USDC".to_string(),
            target_currency: "USDC".to_string(),
            recipient_name: "Ada".to_string(),
            destination: PaymentDestination::Crypto {
                address: "GABC".to_string(),
                memo: None,
            },
        };

        let err = anchor.request_cashout(&params).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::AnchorError { .. }));
    }

    #[tokio::test]
    async fn deposit_address_carries_the_stellar_memo() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", DEPOSIT_ADDRESS_PATH)
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("coin".into(), "USDC".into()),
                Matcher::UrlEncoded("network".into(), "XLM".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"coin":"USDC","address":"GDEPOSITADDRESS","addressTag":"880021"}"#,
            )
            .create_async()
            .await;

        let anchor = test_anchor(&server.url()).await;
        let destination = PaymentDestination::Ewallet {
            mobile_number: "+639171234567".to_string(),
            provider: "gcash".to_string(),
        };

        let resolved = anchor.get_liquidation_address(&destination).await.unwrap();
        assert_eq!(resolved.address, "GDEPOSITADDRESS");
        assert_eq!(resolved.memo.as_deref(), Some("880021"));
    }
}
