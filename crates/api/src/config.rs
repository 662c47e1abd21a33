//! Process configuration, read once from the environment at startup.

use bazaar_infra::checkout::CheckoutPolicy;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: String,
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
    pub checkout_policy: CheckoutPolicy,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let use_persistent_stores = std::env::var("USE_PERSISTENT_STORES")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        let database_url = std::env::var("DATABASE_URL").ok();

        let checkout_policy = match std::env::var("CHECKOUT_POLICY") {
            Ok(raw) => raw.parse::<CheckoutPolicy>().unwrap_or_else(|_| {
                tracing::warn!("unrecognized CHECKOUT_POLICY {raw:?}; using best_effort");
                CheckoutPolicy::BestEffort
            }),
            Err(_) => CheckoutPolicy::BestEffort,
        };

        Self {
            bind_addr,
            use_persistent_stores,
            database_url,
            checkout_policy,
        }
    }

    /// In-memory stores, default policy. What tests run against.
    pub fn in_memory() -> Self {
        Self {
            bind_addr: "127.0.0.1:0".to_string(),
            use_persistent_stores: false,
            database_url: None,
            checkout_policy: CheckoutPolicy::BestEffort,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_config_uses_an_ephemeral_port_and_best_effort() {
        let config = ApiConfig::in_memory();
        assert!(!config.use_persistent_stores);
        assert_eq!(config.checkout_policy, CheckoutPolicy::BestEffort);
        assert_eq!(config.bind_addr, "127.0.0.1:0");
    }
}
