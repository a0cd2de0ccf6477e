use anyhow::{bail, Context, Result};

#[derive(Debug, Clone)]
pub enum Environment {
    Development,
    Testnet,
    Production,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub host: String,
    pub port: u16,

    // Coins.ph anchor (fiat rail)
    pub coins_ph_api_host: String,
    pub coins_ph_api_key: String,
    pub coins_ph_api_secret: String,

    // Webhook ingestion
    pub webhook_secret: String,

    // FX facade binding
    pub fx_anchor: String,

    // Redis
    pub redis_url: String,

    // Rate Limiting
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,

    // Upstream timeout
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let environment = Self::parse_environment()?;

        let config = Self {
            environment: environment.clone(),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid PORT")?,

            coins_ph_api_host: std::env::var("COINS_PH_API_HOST")
                .context("COINS_PH_API_HOST required")?,
            coins_ph_api_key: std::env::var("COINS_PH_API_KEY")
                .context("COINS_PH_API_KEY required")?,
            coins_ph_api_secret: std::env::var("COINS_PH_API_SECRET")
                .context("COINS_PH_API_SECRET required")?,

            webhook_secret: std::env::var("WEBHOOK_SECRET").context("WEBHOOK_SECRET required")?,

            fx_anchor: std::env::var("FX_ANCHOR").unwrap_or_else(|_| "coinsph".to_string()),

            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),

            rate_limit_per_second: std::env::var("RATE_LIMIT_PER_SECOND")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid RATE_LIMIT_PER_SECOND")?,
            rate_limit_burst: std::env::var("RATE_LIMIT_BURST")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("Invalid RATE_LIMIT_BURST")?,

            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .context("Invalid REQUEST_TIMEOUT_SECS")?,
        };

        config.validate()?;
        Ok(config)
    }

    fn parse_environment() -> Result<Environment> {
        let env = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        match env.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testnet" | "test" => Ok(Environment::Testnet),
            "production" | "prod" => Ok(Environment::Production),
            _ => bail!("Unknown environment: {}", env),
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.coins_ph_api_host.starts_with("http") {
            bail!("COINS_PH_API_HOST must be HTTP(S) URL");
        }

        if self.webhook_secret.len() < 16 {
            bail!("WEBHOOK_SECRET must be at least 16 characters");
        }

        tracing::info!(
            "Configuration validated for {:?} environment",
            self.environment
        );

        Ok(())
    }
}
