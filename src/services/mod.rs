pub mod cache;
pub mod fx;
pub mod metrics;
pub mod orchestrator;
pub mod payments;

pub use cache::CacheService;
pub use fx::FxService;
pub use metrics::Metrics;
pub use orchestrator::OrchestratorService;
pub use payments::PaymentStore;
