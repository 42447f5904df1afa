/// Credentials for the wallet-aggregation API. All four fields are required
/// before any wallet fetch is attempted; a partially filled section means the
/// wallet source is skipped for every account.
#[derive(serde::Deserialize, Debug, Clone, Default)]
pub struct WalletApiConfig {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub passphrase: String,
}

impl WalletApiConfig {
    pub fn is_complete(&self) -> bool {
        !self.project_id.is_empty()
            && !self.api_key.is_empty()
            && !self.secret_key.is_empty()
            && !self.passphrase.is_empty()
    }
}
