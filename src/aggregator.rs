use std::sync::Arc;

use crate::config::account_config::ExchangeAccountConfig;
use crate::config::app_config::AppConfig;
use crate::domain::holding::Holding;
use crate::domain::user_assets::{ExchangeBalances, UserAssets, WalletBalance};
use crate::ledger::{Ledger, SourceKind};
use crate::notify::Notifier;
use crate::price::oracle::PriceSnapshot;
use crate::report;
use crate::valuation::{holdings_to_usdt, significant_holdings};

/// Spot + funding balance retrieval for one credentialed exchange account.
/// Implementations fail soft: an unreachable endpoint yields an empty list.
#[async_trait::async_trait]
pub trait ExchangeSource: Send + Sync {
    async fn spot_holdings(&self, api_key: &str, api_secret: &str) -> Vec<Holding>;
    async fn funding_holdings(&self, api_key: &str, api_secret: &str) -> Vec<Holding>;
}

/// Aggregate USD value of one address. The boolean is the fetch success
/// flag; `(0.0, false)` means "unknown", not "empty".
#[async_trait::async_trait]
pub trait WalletSource: Send + Sync {
    async fn total_value(&self, address: &str, chains: &str) -> (f64, bool);
}

#[async_trait::async_trait]
pub trait PriceSource: Send + Sync {
    async fn snapshot(&self) -> PriceSnapshot;
}

/// Merges every configured source into one per-user total and appends the
/// results to the ledger. One instance lives for one check pass.
pub struct Aggregator {
    exchange: Arc<dyn ExchangeSource>,
    wallet: Arc<dyn WalletSource>,
    prices: Arc<dyn PriceSource>,
    ledger: Ledger,
}

impl Aggregator {
    pub fn new(
        exchange: Arc<dyn ExchangeSource>,
        wallet: Arc<dyn WalletSource>,
        prices: Arc<dyn PriceSource>,
        ledger: Ledger,
    ) -> Self {
        Self {
            exchange,
            wallet,
            prices,
            ledger,
        }
    }

    /// One full pass: a single price snapshot, then every configured account.
    /// Users share no mutable state, so they are checked concurrently; one
    /// wallet's retry pauses never stretch the whole pass. Per-account
    /// failures never abort the rest.
    pub async fn check_all(&self, config: &AppConfig, notifier: &Notifier) {
        let snapshot = self.prices.snapshot().await;
        let wallet_api_ready = config.wallet_api.is_complete();

        let checks = config.accounts.iter().map(|account| async {
            let assets = self.check_user(account, wallet_api_ready, &snapshot).await;
            log::info!(
                "user {} total asset value: ${:.2} USD",
                assets.note,
                assets.total_usd
            );

            if notifier.enabled() && !account.notify_users.is_empty() {
                let message = report::format_user_summary(&assets);
                for recipient in &account.notify_users {
                    notifier.send_async(recipient, &message);
                }
            }
        });
        futures::future::join_all(checks).await;
    }

    /// Checks both sources for one user. The exchange result merges spot and
    /// funding even when one sub-call failed soft; a wallet total only counts
    /// toward the user total when its fetch actually succeeded.
    pub async fn check_user(
        &self,
        account: &ExchangeAccountConfig,
        wallet_api_ready: bool,
        snapshot: &PriceSnapshot,
    ) -> UserAssets {
        log::info!("checking assets for user {}", account.note);

        let exchange = self.check_exchange(account, snapshot).await;
        let wallet = self.check_wallet(account, wallet_api_ready).await;

        let mut total_usd = 0.0;
        if let Some(balances) = &exchange {
            total_usd += balances.combined_total();
        }
        if let Some(balance) = &wallet {
            if balance.fetch_succeeded {
                total_usd += balance.total_usd;
            }
        }

        UserAssets {
            note: account.note.clone(),
            exchange,
            wallet,
            total_usd,
        }
    }

    async fn check_exchange(
        &self,
        account: &ExchangeAccountConfig,
        snapshot: &PriceSnapshot,
    ) -> Option<ExchangeBalances> {
        if !account.has_exchange_credentials() {
            log::warn!("account {} has no exchange credentials", account.note);
            return None;
        }

        let spot = self
            .exchange
            .spot_holdings(&account.api_key, &account.api_secret)
            .await;
        let funding = self
            .exchange
            .funding_holdings(&account.api_key, &account.api_secret)
            .await;

        // Totals run over everything; the significant lists are display-only.
        let spot_total_usdt = holdings_to_usdt(&spot, snapshot);
        let funding_total_usdt = holdings_to_usdt(&funding, snapshot);
        let significant_spot = significant_holdings(&spot);
        let significant_funding = significant_holdings(&funding);

        let detail = serde_json::json!({
            "spot_balances": holdings_detail(&significant_spot),
            "funding_balances": holdings_detail(&significant_funding),
            "spot_total_usdt": spot_total_usdt,
            "funding_total_usdt": funding_total_usdt,
        });

        let mut holdings = significant_spot;
        holdings.extend(significant_funding);
        let balances = ExchangeBalances {
            spot_total_usdt,
            funding_total_usdt,
            holdings,
        };

        if let Err(e) = self
            .ledger
            .append(
                SourceKind::Exchange,
                &account.note,
                &account.api_key,
                balances.combined_total(),
                &detail.to_string(),
            )
            .await
        {
            // The in-memory aggregate survives; notification still goes out.
            log::error!("failed to record exchange balance for {}: {e:?}", account.note);
        }

        log::info!(
            "account {} spot ${:.2}, funding ${:.2}, combined ${:.2} USDT",
            account.note,
            balances.spot_total_usdt,
            balances.funding_total_usdt,
            balances.combined_total()
        );
        Some(balances)
    }

    async fn check_wallet(
        &self,
        account: &ExchangeAccountConfig,
        wallet_api_ready: bool,
    ) -> Option<WalletBalance> {
        let descriptor = account.wallet.as_ref()?;
        if descriptor.address.is_empty() {
            log::warn!("wallet for {} has no address configured", account.note);
            return None;
        }
        if !wallet_api_ready {
            log::warn!(
                "wallet API credentials incomplete, skipping wallet for {}",
                account.note
            );
            return None;
        }

        let (total_usd, fetch_succeeded) = self
            .wallet
            .total_value(&descriptor.address, &descriptor.chains)
            .await;

        let wallet_note = format!("{}-wallet", account.note);
        let detail = serde_json::json!({
            "address": descriptor.address,
            "chains": descriptor.chains,
            "total_value_usd": total_usd,
            "fetch_success": fetch_succeeded,
        });

        if let Err(e) = self
            .ledger
            .append(
                SourceKind::Wallet,
                &wallet_note,
                &descriptor.address,
                total_usd,
                &detail.to_string(),
            )
            .await
        {
            log::error!("failed to record wallet balance for {}: {e:?}", account.note);
        }

        if fetch_succeeded {
            log::info!("wallet of {} holds ${total_usd:.2} USD", account.note);
        } else {
            log::warn!("wallet fetch for {} failed, value unknown", account.note);
        }

        Some(WalletBalance {
            address: descriptor.address.clone(),
            chains: descriptor.chains.clone(),
            total_usd,
            fetch_succeeded,
        })
    }
}

fn holdings_detail(holdings: &[Holding]) -> Vec<serde_json::Value> {
    holdings
        .iter()
        .map(|holding| {
            serde_json::json!({
                "asset": holding.asset,
                "total": holding.total(),
                "free": holding.free,
                "locked": holding.locked,
                "account_type": holding.sub_account.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::account_config::WalletDescriptor;
    use crate::domain::holding::SubAccount;

    struct StubExchange {
        spot: Vec<Holding>,
        funding: Vec<Holding>,
    }

    #[async_trait::async_trait]
    impl ExchangeSource for StubExchange {
        async fn spot_holdings(&self, _key: &str, _secret: &str) -> Vec<Holding> {
            self.spot.clone()
        }

        async fn funding_holdings(&self, _key: &str, _secret: &str) -> Vec<Holding> {
            self.funding.clone()
        }
    }

    struct StubWallet {
        total: f64,
        succeeded: bool,
    }

    #[async_trait::async_trait]
    impl WalletSource for StubWallet {
        async fn total_value(&self, _address: &str, _chains: &str) -> (f64, bool) {
            (self.total, self.succeeded)
        }
    }

    struct StubPrices(PriceSnapshot);

    #[async_trait::async_trait]
    impl PriceSource for StubPrices {
        async fn snapshot(&self) -> PriceSnapshot {
            self.0.clone()
        }
    }

    fn spot(asset: &str, free: f64) -> Holding {
        Holding {
            asset: asset.into(),
            free,
            locked: 0.0,
            sub_account: SubAccount::Spot,
        }
    }

    fn snapshot(pairs: &[(&str, f64)]) -> PriceSnapshot {
        pairs
            .iter()
            .map(|(symbol, price)| (symbol.to_string(), *price))
            .collect()
    }

    fn account_with_credentials(note: &str) -> ExchangeAccountConfig {
        serde_json::from_value(serde_json::json!({
            "api_key": "key-1",
            "api_secret": "secret-1",
            "note": note,
        }))
        .unwrap()
    }

    fn wallet_descriptor(address: &str) -> WalletDescriptor {
        serde_json::from_value(serde_json::json!({ "address": address })).unwrap()
    }

    async fn aggregator(
        exchange: StubExchange,
        wallet: StubWallet,
    ) -> Aggregator {
        Aggregator::new(
            Arc::new(exchange),
            Arc::new(wallet),
            Arc::new(StubPrices(PriceSnapshot::new())),
            Ledger::open_in_memory().await.unwrap(),
        )
    }

    #[tokio::test]
    async fn spot_and_funding_merge_into_one_exchange_result() {
        let aggregator = aggregator(
            StubExchange {
                spot: vec![spot("USDT", 100.0), spot("ETH", 2.0)],
                funding: vec![Holding {
                    asset: "USDT".into(),
                    free: 25.0,
                    locked: 0.0,
                    sub_account: SubAccount::Funding,
                }],
            },
            StubWallet {
                total: 0.0,
                succeeded: true,
            },
        )
        .await;

        let account = account_with_credentials("main");
        let snapshot = snapshot(&[("ETHUSDT", 3000.0)]);
        let assets = aggregator.check_user(&account, false, &snapshot).await;

        let exchange = assets.exchange.unwrap();
        assert_eq!(exchange.spot_total_usdt, 6100.0);
        assert_eq!(exchange.funding_total_usdt, 25.0);
        assert_eq!(assets.total_usd, 6125.0);
        assert!(assets.wallet.is_none());
    }

    #[tokio::test]
    async fn failed_exchange_leaves_wallet_total_intact() {
        // Exchange endpoints failed soft: empty holdings, zero totals.
        let aggregator = aggregator(
            StubExchange {
                spot: vec![],
                funding: vec![],
            },
            StubWallet {
                total: 250.5,
                succeeded: true,
            },
        )
        .await;

        let mut account = account_with_credentials("main");
        account.wallet = Some(wallet_descriptor("0xabc"));

        let assets = aggregator
            .check_user(&account, true, &PriceSnapshot::new())
            .await;

        assert_eq!(assets.total_usd, 250.5);
        assert!(assets.exchange.is_some());
        assert_eq!(assets.exchange.unwrap().combined_total(), 0.0);
    }

    #[tokio::test]
    async fn wallet_only_user_totals_the_wallet_value() {
        let aggregator = aggregator(
            StubExchange {
                spot: vec![],
                funding: vec![],
            },
            StubWallet {
                total: 250.5,
                succeeded: true,
            },
        )
        .await;

        // No exchange credentials at all.
        let mut account: ExchangeAccountConfig =
            serde_json::from_value(serde_json::json!({ "note": "watch-only" })).unwrap();
        account.wallet = Some(wallet_descriptor("0xabc"));

        let assets = aggregator
            .check_user(&account, true, &PriceSnapshot::new())
            .await;

        assert!(assets.exchange.is_none());
        assert_eq!(assets.total_usd, 250.5);
    }

    #[tokio::test]
    async fn failed_wallet_fetch_never_counts_toward_the_total() {
        let aggregator = aggregator(
            StubExchange {
                spot: vec![spot("USDT", 100.0)],
                funding: vec![],
            },
            StubWallet {
                total: 0.0,
                succeeded: false,
            },
        )
        .await;

        let mut account = account_with_credentials("main");
        account.wallet = Some(wallet_descriptor("0xabc"));

        let assets = aggregator
            .check_user(&account, true, &PriceSnapshot::new())
            .await;

        let wallet = assets.wallet.unwrap();
        assert!(!wallet.fetch_succeeded);
        assert_eq!(assets.total_usd, 100.0);
    }

    #[tokio::test]
    async fn incomplete_wallet_api_credentials_skip_the_wallet_source() {
        let aggregator = aggregator(
            StubExchange {
                spot: vec![],
                funding: vec![],
            },
            StubWallet {
                total: 999.0,
                succeeded: true,
            },
        )
        .await;

        let mut account = account_with_credentials("main");
        account.wallet = Some(wallet_descriptor("0xabc"));

        let assets = aggregator
            .check_user(&account, false, &PriceSnapshot::new())
            .await;

        assert!(assets.wallet.is_none());
        assert_eq!(assets.total_usd, 0.0);

        // Skipping is not a failure: no wallet row lands in the ledger.
        let rows = aggregator.ledger.history(None, 1).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].account_type, "exchange");
    }

    #[tokio::test]
    async fn repeated_checks_append_rows_with_identical_totals() {
        let aggregator = aggregator(
            StubExchange {
                spot: vec![spot("USDT", 100.0)],
                funding: vec![],
            },
            StubWallet {
                total: 0.0,
                succeeded: true,
            },
        )
        .await;

        let account = account_with_credentials("main");
        let first = aggregator
            .check_user(&account, false, &PriceSnapshot::new())
            .await;
        let second = aggregator
            .check_user(&account, false, &PriceSnapshot::new())
            .await;
        assert_eq!(first.total_usd, second.total_usd);

        let rows = aggregator.ledger.history(None, 1).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].total_usdt, rows[1].total_usdt);
        assert_eq!(rows[0].account_identifier, rows[1].account_identifier);
    }

    #[tokio::test]
    async fn check_all_covers_every_configured_account() {
        use crate::config::notification_config::NotificationConfig;

        let aggregator = aggregator(
            StubExchange {
                spot: vec![spot("USDT", 10.0)],
                funding: vec![],
            },
            StubWallet {
                total: 0.0,
                succeeded: true,
            },
        )
        .await;

        let config = AppConfig {
            database: Default::default(),
            scheduler: Default::default(),
            notifications: NotificationConfig {
                enabled: false,
                ..Default::default()
            },
            wallet_api: Default::default(),
            accounts: vec![
                account_with_credentials("one"),
                account_with_credentials("two"),
            ],
        };
        let notifier = Notifier::new(reqwest::Client::new(), config.notifications.clone());

        aggregator.check_all(&config, &notifier).await;

        let rows = aggregator.ledger.history(None, 1).await.unwrap();
        assert_eq!(rows.len(), 2);
        let mut notes: Vec<_> = rows.iter().map(|row| row.account_note.clone()).collect();
        notes.sort();
        assert_eq!(notes, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn wallet_rows_are_tagged_and_hashed() {
        let aggregator = aggregator(
            StubExchange {
                spot: vec![],
                funding: vec![],
            },
            StubWallet {
                total: 250.5,
                succeeded: true,
            },
        )
        .await;

        let mut account: ExchangeAccountConfig =
            serde_json::from_value(serde_json::json!({ "note": "watch-only" })).unwrap();
        account.wallet = Some(wallet_descriptor("0xabc"));

        aggregator
            .check_user(&account, true, &PriceSnapshot::new())
            .await;

        let rows = aggregator.ledger.history(None, 1).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].account_type, "wallet");
        assert_eq!(rows[0].account_note, "watch-only-wallet");
        assert_eq!(rows[0].account_identifier, crate::ledger::hash_identifier("0xabc"));
        assert_eq!(rows[0].total_usdt, 250.5);

        let detail: serde_json::Value =
            serde_json::from_str(rows[0].asset_details.as_deref().unwrap()).unwrap();
        assert_eq!(detail["fetch_success"], serde_json::Value::Bool(true));
    }
}
