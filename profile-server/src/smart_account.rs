// profile-server/src/smart_account.rs
use common::{AppError, AppResult, SmartAccountConfig};
use serde::Serialize;
use url::Url;

/// Settings the browser passes straight to the account-abstraction SDK
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartAccountSettings {
    pub chain_id: u64,
    pub bundler_url: String,
    pub paymaster_url: String,
    pub paymaster_api_key: String,
    pub entry_point_address: String,
    pub validation_module_address: String,
}

impl SmartAccountSettings {
    pub fn from_config(config: &SmartAccountConfig) -> AppResult<Self> {
        let bundler_url = parse_url("bundler url", &config.bundler_url)?;
        let paymaster_url = parse_url("paymaster url", &config.paymaster_url)?;
        check_address("entry point address", &config.entry_point_address)?;
        check_address("validation module address", &config.validation_module_address)?;

        Ok(Self {
            chain_id: config.chain_id,
            bundler_url,
            paymaster_url,
            paymaster_api_key: config.paymaster_api_key.clone(),
            entry_point_address: config.entry_point_address.clone(),
            validation_module_address: config.validation_module_address.clone(),
        })
    }
}

fn parse_url(field: &str, value: &str) -> AppResult<String> {
    if value.is_empty() {
        return Err(AppError::invalid_input(format!("{} not set", field)));
    }
    Url::parse(value)
        .map(|url| url.to_string())
        .map_err(|e| AppError::invalid_input(format!("{}: {}", field, e)))
}

fn check_address(field: &str, value: &str) -> AppResult<()> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| AppError::invalid_input(format!("{} must start with 0x", field)))?;
    if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AppError::invalid_input(format!("{} must be 20 hex bytes", field)));
    }
    Ok(())
}
