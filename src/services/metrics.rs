use crate::{models::Stats, services::CacheService};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct Metrics {
    cache: Arc<CacheService>,
    rates_served: AtomicU64,
    payments_initiated: AtomicU64,
    payments_confirmed: AtomicU64,
    payments_failed: AtomicU64,
    webhooks_received: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    response_time_micros: AtomicU64,
    responses: AtomicU64,
    start_time: Instant,
}

impl Metrics {
    pub fn new(cache: Arc<CacheService>) -> Self {
        Self {
            cache,
            rates_served: AtomicU64::new(0),
            payments_initiated: AtomicU64::new(0),
            payments_confirmed: AtomicU64::new(0),
            payments_failed: AtomicU64::new(0),
            webhooks_received: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            response_time_micros: AtomicU64::new(0),
            responses: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub async fn record_rate_served(&self, cache_hit: bool, elapsed: Duration) {
        self.rates_served.fetch_add(1, Ordering::SeqCst);
        if cache_hit {
            self.cache_hits.fetch_add(1, Ordering::SeqCst);
        } else {
            self.cache_misses.fetch_add(1, Ordering::SeqCst);
        }
        self.response_time_micros
            .fetch_add(elapsed.as_micros() as u64, Ordering::SeqCst);
        self.responses.fetch_add(1, Ordering::SeqCst);

        let date = Utc::now().format("%Y-%m-%d").to_string();
        let _ = self
            .cache
            .increment(&format!("metrics:rates:{}", date), 1)
            .await;
    }

    pub async fn record_payment_initiated(&self, payment_id: &str, anchor: &str) {
        self.payments_initiated.fetch_add(1, Ordering::SeqCst);

        let date = Utc::now().format("%Y-%m-%d").to_string();
        let _ = self
            .cache
            .increment(&format!("metrics:payments:{}", date), 1)
            .await;
        let _ = self
            .cache
            .increment(&format!("metrics:anchor:{}:{}", anchor, date), 1)
            .await;

        tracing::info!(
            payment_id = payment_id,
            anchor = anchor,
            "Payment initiated"
        );
    }

    pub fn record_payment_confirmed(&self) {
        self.payments_confirmed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_payment_failed(&self) {
        self.payments_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub async fn record_webhook(&self, event: &str) {
        self.webhooks_received.fetch_add(1, Ordering::SeqCst);

        let date = Utc::now().format("%Y-%m-%d").to_string();
        let _ = self
            .cache
            .increment(&format!("metrics:webhooks:{}:{}", event, date), 1)
            .await;
    }

    pub fn get_stats(&self) -> Stats {
        let hits = self.cache_hits.load(Ordering::SeqCst);
        let misses = self.cache_misses.load(Ordering::SeqCst);
        let lookups = hits + misses;
        let cache_hit_rate = if lookups > 0 {
            hits as f64 / lookups as f64
        } else {
            0.0
        };

        let responses = self.responses.load(Ordering::SeqCst);
        let avg_response_time_ms = if responses > 0 {
            self.response_time_micros.load(Ordering::SeqCst) as f64 / responses as f64 / 1000.0
        } else {
            0.0
        };

        Stats {
            rates_served: self.rates_served.load(Ordering::SeqCst),
            payments_initiated: self.payments_initiated.load(Ordering::SeqCst),
            payments_confirmed: self.payments_confirmed.load(Ordering::SeqCst),
            payments_failed: self.payments_failed.load(Ordering::SeqCst),
            webhooks_received: self.webhooks_received.load(Ordering::SeqCst),
            cache_hit_rate,
            avg_response_time_ms,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
