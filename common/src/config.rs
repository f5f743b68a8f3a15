// common/src/config.rs
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use config::{Config as ConfigFile, File, Environment};

/// Central configuration for both services
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub secrets_server_addr: String,
    pub profile_server_addr: String,
    /// Base URL the profile server publishes tokens to
    pub secrets_server_url: String,

    pub token_cache: TokenCacheConfig,
    pub rate_limit: RateLimitConfig,
    pub oracle: OracleConfig,
    pub spotify: SpotifyConfig,
    pub wallet: WalletConfig,
    pub smart_account: SmartAccountConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenCacheConfig {
    pub ttl_seconds: i64,
    pub cleanup_interval_seconds: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub window_seconds: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Hex encoded X25519 public key of the oracle network
    pub public_key: String,
    /// Base64 PKCS#8 Ed25519 key used to sign exported bundles
    pub signer_key: Option<String>,
    /// Shared secret required on `GET /secrets` when set
    pub export_api_key: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub accounts_url: String,
    pub api_url: String,
    pub scopes: String,
    pub request_timeout_seconds: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    pub environment_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartAccountConfig {
    pub chain_id: u64,
    pub bundler_url: String,
    pub paymaster_url: String,
    pub paymaster_api_key: String,
    pub entry_point_address: String,
    pub validation_module_address: String,
}

impl Default for TokenCacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 5 * 60,
            cleanup_interval_seconds: 60,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_seconds: 15 * 60,
        }
    }
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: "http://localhost:5173/profile".to_string(),
            accounts_url: "https://accounts.spotify.com".to_string(),
            api_url: "https://api.spotify.com/v1".to_string(),
            scopes: "user-read-private user-read-email user-top-read".to_string(),
            request_timeout_seconds: 10,
        }
    }
}

impl Default for SmartAccountConfig {
    fn default() -> Self {
        Self {
            // Sepolia
            chain_id: 11155111,
            bundler_url: String::new(),
            paymaster_url: String::new(),
            paymaster_api_key: String::new(),
            entry_point_address: "0x5ff137d4b0fdcd49dca30c7cf57e578a026d2789".to_string(),
            validation_module_address: "0x0000001c5b32F37F5beA87BDD5374eB2aC54eA8e".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            secrets_server_addr: "127.0.0.1:8081".to_string(),
            profile_server_addr: "127.0.0.1:5173".to_string(),
            secrets_server_url: "http://127.0.0.1:8081".to_string(),
            token_cache: TokenCacheConfig::default(),
            rate_limit: RateLimitConfig::default(),
            oracle: OracleConfig::default(),
            spotify: SpotifyConfig::default(),
            wallet: WalletConfig::default(),
            smart_account: SmartAccountConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config_dir = env::var("CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                // Run from the workspace root or from a member crate
                let mut path = PathBuf::from("./config");
                if !path.exists() {
                    path = PathBuf::from("../config");
                }
                path
            });

        tracing::info!("Loading configuration from {}", config_dir.display());
        tracing::info!("Using run mode: {}", run_mode);

        let config = ConfigFile::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", run_mode))).required(false))
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // APP_ORACLE__PUBLIC_KEY -> oracle.public_key
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load from files when possible, plain environment variables otherwise
    pub fn from_env() -> Self {
        match Self::load() {
            Ok(config) => {
                tracing::info!("Configuration loaded from files and environment");
                config
            },
            Err(e) => {
                tracing::warn!("Failed to load configuration from files: {}", e);
                tracing::info!("Falling back to environment variables only");
                Self::from_plain_env()
            }
        }
    }

    fn from_plain_env() -> Self {
        let defaults = Self::default();

        let string_var = |name: &str, default: &str| {
            env::var(name).unwrap_or_else(|_| default.to_string())
        };
        let optional_var = |name: &str| env::var(name).ok().filter(|v| !v.is_empty());

        Self {
            secrets_server_addr: string_var("SECRETS_SERVER_ADDR", &defaults.secrets_server_addr),
            profile_server_addr: string_var("PROFILE_SERVER_ADDR", &defaults.profile_server_addr),
            secrets_server_url: string_var("SECRETS_SERVER_URL", &defaults.secrets_server_url),
            token_cache: TokenCacheConfig {
                ttl_seconds: env::var("TOKEN_TTL_SECONDS")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok())
                    .unwrap_or(defaults.token_cache.ttl_seconds),
                ..defaults.token_cache
            },
            rate_limit: defaults.rate_limit,
            oracle: OracleConfig {
                public_key: string_var("DON_PUBLIC_KEY", ""),
                signer_key: optional_var("SIGNER_KEY"),
                export_api_key: optional_var("EXPORT_API_KEY"),
            },
            spotify: SpotifyConfig {
                client_id: string_var("SPOTIFY_CLIENT_ID", ""),
                client_secret: string_var("SPOTIFY_CLIENT_SECRET", ""),
                redirect_uri: string_var("SPOTIFY_REDIRECT_URI", &defaults.spotify.redirect_uri),
                ..defaults.spotify
            },
            wallet: WalletConfig {
                environment_id: string_var("WALLET_ENVIRONMENT_ID", ""),
            },
            smart_account: SmartAccountConfig {
                bundler_url: string_var("BUNDLER_URL", ""),
                paymaster_url: string_var("PAYMASTER_URL", ""),
                paymaster_api_key: string_var("PAYMASTER_API_KEY", ""),
                ..defaults.smart_account
            },
        }
    }
}
