#[derive(serde::Deserialize, Debug, Clone)]
pub struct NotificationConfig {
    #[serde(default = "NotificationConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default = "NotificationConfig::default_title")]
    pub title: String,
    /// Relay endpoint that fans messages out to the recipients.
    #[serde(default = "NotificationConfig::default_endpoint")]
    pub endpoint: String,
}

impl NotificationConfig {
    fn default_enabled() -> bool {
        true
    }

    fn default_title() -> String {
        "balance monitor".to_string()
    }

    fn default_endpoint() -> String {
        "http://gossiphere.com:9999/cmd".to_string()
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            title: Self::default_title(),
            endpoint: Self::default_endpoint(),
        }
    }
}
