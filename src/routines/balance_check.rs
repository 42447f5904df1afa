use std::sync::Arc;

use error_stack::ResultExt;

use crate::aggregator::Aggregator;
use crate::config::app_config::AppConfig;
use crate::exchange::account_client::ExchangeAccountClient;
use crate::ledger::Ledger;
use crate::notify::Notifier;
use crate::price::oracle::PriceOracle;
use crate::wallet::fetcher::WalletFetcher;

use super::routine::{Routine, RoutineError};

/// One scheduled balance check pass. Config and the ledger handle are opened
/// fresh on every run so live edits to `Config.toml` (accounts, database
/// path, cadence) take effect without a restart.
pub struct BalanceCheckRoutine;

#[async_trait::async_trait]
impl Routine for BalanceCheckRoutine {
    fn name(&self) -> &'static str {
        "Balance Check"
    }

    async fn run(&self) -> error_stack::Result<(), RoutineError> {
        let config = AppConfig::load()
            .change_context(RoutineError::routine_failure("could not load config"))?;

        let ledger = Ledger::open(&config.database.path)
            .await
            .change_context(RoutineError::routine_failure("could not open ledger"))?;

        let client = reqwest::Client::new();
        let aggregator = Aggregator::new(
            Arc::new(ExchangeAccountClient::new(client.clone())),
            Arc::new(WalletFetcher::new(
                client.clone(),
                config.wallet_api.clone(),
            )),
            Arc::new(PriceOracle::new(client.clone())),
            ledger,
        );
        let notifier = Notifier::new(client, config.notifications.clone());

        log::info!("checking {} configured account(s)", config.accounts.len());
        aggregator.check_all(&config, &notifier).await;

        Ok(())
    }
}
