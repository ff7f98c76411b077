use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::env;
use taptravel_shared::Masked;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    pub payment: PaymentConfig,
    #[serde(default)]
    pub rider: RiderConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentConfig {
    pub merchant_display_name: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RiderConfig {
    /// Session token issued at sign-in.
    #[serde(default)]
    pub token: Option<Masked<String>>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        Self::defaults()?
            // Checked-in defaults, then the run mode's overrides, then an
            // untracked local file
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Eg.. `TAPTRAVEL__BACKEND__BASE_URL=https://api.example.com`
            .add_source(Environment::with_prefix("TAPTRAVEL").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Parse a TOML document on top of the built-in defaults.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        config::Config::builder()
            .set_default("backend.request_timeout_secs", 15_i64)?
            .set_default("payment.merchant_display_name", "Tap & Travel")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let config = Config::from_toml(
            r#"
            [backend]
            base_url = "https://api.taptravel.test"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.base_url, "https://api.taptravel.test");
        assert_eq!(config.backend.request_timeout_secs, 15);
        assert_eq!(config.payment.merchant_display_name, "Tap & Travel");
        assert!(config.rider.token.is_none());
    }

    #[test]
    fn test_overrides_and_masked_token() {
        let config = Config::from_toml(
            r#"
            [backend]
            base_url = "http://localhost:4000"
            request_timeout_secs = 3

            [payment]
            merchant_display_name = "Night Coach"

            [rider]
            token = "eyJ.secret.token"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.request_timeout_secs, 3);
        assert_eq!(config.payment.merchant_display_name, "Night Coach");
        let token = config.rider.token.unwrap();
        assert_eq!(token.expose(), "eyJ.secret.token");
        assert_eq!(format!("{:?}", token), "Masked(********)");
    }

    #[test]
    fn test_base_url_is_required() {
        assert!(Config::from_toml("").is_err());
    }
}
