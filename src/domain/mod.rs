pub mod holding;
pub mod user_assets;
