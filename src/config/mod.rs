pub mod account_config;
pub mod app_config;
pub mod notification_config;
pub mod wallet_api_config;
