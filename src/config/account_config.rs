/// One monitored account: exchange API credentials plus an optional on-chain
/// wallet tracked for the same user.
#[derive(serde::Deserialize, Debug, Clone)]
pub struct ExchangeAccountConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    #[serde(default = "ExchangeAccountConfig::default_note")]
    pub note: String,
    #[serde(default)]
    pub notify_users: Vec<String>,
    #[serde(default)]
    pub wallet: Option<WalletDescriptor>,
}

impl ExchangeAccountConfig {
    fn default_note() -> String {
        "unnamed account".to_string()
    }

    pub fn has_exchange_credentials(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct WalletDescriptor {
    pub address: String,
    /// Comma-joined chain id list, e.g. "1,56,137".
    #[serde(default = "WalletDescriptor::default_chains")]
    pub chains: String,
}

impl WalletDescriptor {
    fn default_chains() -> String {
        "1".to_string()
    }
}
