//! Process configuration, resolved once at startup and passed down explicitly.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::domain::ConfigError;

use super::network::{BASE_MAINNET_CHAIN_ID, BASE_SEPOLIA_CHAIN_ID};

pub const DEFAULT_REGISTRY_ADDRESS: &str = "0x651a242f3b09f4846adA583D3C2103069D9635F0";

/// Which Base network the registry is read from and minted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainEnv {
    Testnet,
    Production,
}

impl ChainEnv {
    /// `testnet` selects Base Sepolia; anything else is production.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("testnet") => ChainEnv::Testnet,
            _ => ChainEnv::Production,
        }
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            ChainEnv::Testnet => BASE_SEPOLIA_CHAIN_ID,
            ChainEnv::Production => BASE_MAINNET_CHAIN_ID,
        }
    }

    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            ChainEnv::Testnet => "https://sepolia.base.org",
            ChainEnv::Production => "https://mainnet.base.org",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: ChainEnv,
    pub expected_chain_id: u64,
    /// Read-only RPC for the expected chain.
    pub rpc_url: String,
    /// Wallet endpoint that signs and sends transactions.
    pub wallet_rpc_url: String,
    pub registry_address: String,
    /// Public origin of the front end, used in the mini app manifest.
    pub root_url: String,
    pub bind_addr: String,
    pub paymaster_url: Option<SecretString>,
    pub onchainkit_api_key: Option<SecretString>,
    pub receipt_poll_interval: Duration,
    pub receipt_timeout: Option<Duration>,
    pub payment_delay: Duration,
    pub session_ttl: Duration,
    /// How long a `mintFee` read is reused for rendering. Mints always re-read.
    pub mint_fee_ttl: Duration,
}

impl AppConfig {
    /// Defaults for the given network with nothing read from the environment.
    pub fn for_env(env: ChainEnv) -> Self {
        Self {
            env,
            expected_chain_id: env.chain_id(),
            rpc_url: env.default_rpc_url().to_string(),
            wallet_rpc_url: "http://127.0.0.1:8545".to_string(),
            registry_address: DEFAULT_REGISTRY_ADDRESS.to_string(),
            root_url: "http://localhost:3000".to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
            paymaster_url: None,
            onchainkit_api_key: None,
            receipt_poll_interval: Duration::from_secs(2),
            receipt_timeout: Some(Duration::from_secs(180)),
            payment_delay: Duration::from_millis(1000),
            session_ttl: Duration::from_secs(3600),
            mint_fee_ttl: Duration::from_secs(30),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let env = ChainEnv::parse(get("MINT_ENV").as_deref());
        let mut config = Self::for_env(env);

        if let Some(url) = get("RPC_URL") {
            config.rpc_url = url;
        }
        if let Some(url) = get("WALLET_RPC_URL") {
            config.wallet_rpc_url = url;
        }
        if let Some(address) = get("REGISTRY_ADDRESS") {
            validate_address("REGISTRY_ADDRESS", &address)?;
            config.registry_address = address;
        }
        if let Some(url) = get("ROOT_URL") {
            config.root_url = url.trim_end_matches('/').to_string();
        }
        if let Some(addr) = get("BIND_ADDR") {
            config.bind_addr = addr;
        }
        config.paymaster_url = get("PAYMASTER_URL").map(SecretString::from);
        config.onchainkit_api_key = get("ONCHAINKIT_API_KEY").map(SecretString::from);

        if let Some(ms) = parse_u64(&get, "RECEIPT_POLL_INTERVAL_MS")? {
            config.receipt_poll_interval = Duration::from_millis(ms.max(1));
        }
        if let Some(secs) = parse_u64(&get, "RECEIPT_TIMEOUT_SECS")? {
            // 0 disables the watcher's own timeout.
            config.receipt_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(ms) = parse_u64(&get, "PAYMENT_DELAY_MS")? {
            config.payment_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_u64(&get, "SESSION_TTL_SECS")? {
            config.session_ttl = Duration::from_secs(secs.max(1));
        }
        if let Some(secs) = parse_u64(&get, "MINT_FEE_TTL_SECS")? {
            config.mint_fee_ttl = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn parse_u64<G>(get: &G, key: &str) -> Result<Option<u64>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.trim().parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })
        })
        .transpose()
}

fn validate_address(key: &str, value: &str) -> Result<(), ConfigError> {
    let hex = value.strip_prefix("0x").unwrap_or_default();
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "expected a 0x-prefixed 20-byte hex address".to_string(),
        });
    }
    Ok(())
}

/// Loggable form of a secret: 6-char prefix, 4-char suffix and length.
pub fn short_secret(secret: Option<&SecretString>) -> String {
    let Some(secret) = secret else {
        return "missing".to_string();
    };
    let value = secret.expose_secret();
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 10 {
        return format!("*** (len={})", chars.len());
    }
    let prefix: String = chars[..6].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{prefix}…{suffix} (len={})", chars.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_to_production() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.env, ChainEnv::Production);
        assert_eq!(config.expected_chain_id, BASE_MAINNET_CHAIN_ID);
        assert_eq!(config.rpc_url, "https://mainnet.base.org");
        assert_eq!(config.registry_address, DEFAULT_REGISTRY_ADDRESS);
        assert!(config.paymaster_url.is_none());
    }

    #[test]
    fn test_testnet_selects_base_sepolia() {
        let config = AppConfig::from_lookup(lookup(&[("MINT_ENV", "testnet")])).unwrap();
        assert_eq!(config.expected_chain_id, BASE_SEPOLIA_CHAIN_ID);
        assert_eq!(config.rpc_url, "https://sepolia.base.org");
    }

    #[test]
    fn test_overrides_and_durations() {
        let config = AppConfig::from_lookup(lookup(&[
            ("RPC_URL", "http://localhost:9545"),
            ("ROOT_URL", "https://mint.example/"),
            ("RECEIPT_TIMEOUT_SECS", "0"),
            ("PAYMENT_DELAY_MS", "5"),
            ("MINT_FEE_TTL_SECS", "0"),
        ]))
        .unwrap();
        assert_eq!(config.rpc_url, "http://localhost:9545");
        assert_eq!(config.root_url, "https://mint.example");
        assert!(config.receipt_timeout.is_none());
        assert_eq!(config.payment_delay, Duration::from_millis(5));
        assert_eq!(config.mint_fee_ttl, Duration::ZERO);
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("SESSION_TTL_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "SESSION_TTL_SECS"));
    }

    #[test]
    fn test_invalid_registry_address_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("REGISTRY_ADDRESS", "0x1234")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_short_secret() {
        assert_eq!(short_secret(None), "missing");
        let secret = SecretString::from("https://paymaster.example/key");
        assert_eq!(short_secret(Some(&secret)), "https:…/key (len=29)");
        let short = SecretString::from("abc");
        assert_eq!(short_secret(Some(&short)), "*** (len=3)");
    }
}
