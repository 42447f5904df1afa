use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;

/// Assets treated as 1:1 with the USD reporting unit, no price lookup.
pub const STABLE_ASSETS: [&str; 3] = ["USDT", "BUSD", "USDC"];

const TICKER_ENDPOINT: &str = "/api/v3/ticker/price";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Full ticker snapshot, trading-pair symbol to price. Fetched once per check
/// pass and reused for every conversion within that pass.
pub type PriceSnapshot = HashMap<String, f64>;

#[derive(Error, Debug)]
pub enum PriceFeedError {
    #[error("price feed request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("price feed returned HTTP {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Debug, serde::Deserialize)]
struct TickerEntry {
    symbol: String,
    price: String,
}

pub struct PriceOracle {
    client: reqwest::Client,
    base_url: String,
}

impl PriceOracle {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: "https://api.binance.com".to_string(),
        }
    }

    /// Fetches the full ticker list. Fails soft: on any transport or HTTP
    /// failure the snapshot comes back empty and non-stable assets simply
    /// stay unpriced for this pass instead of aborting it.
    pub async fn fetch_snapshot(&self) -> PriceSnapshot {
        match self.try_fetch_snapshot().await {
            Ok(snapshot) => {
                log::debug!("price snapshot loaded with {} pairs", snapshot.len());
                snapshot
            }
            Err(e) => {
                log::error!("failed to fetch price snapshot: {e}");
                PriceSnapshot::new()
            }
        }
    }

    async fn try_fetch_snapshot(&self) -> Result<PriceSnapshot, PriceFeedError> {
        let url = format!("{}{}", self.base_url, TICKER_ENDPOINT);
        let response = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PriceFeedError::Status(response.status()));
        }

        let entries: Vec<TickerEntry> = response.json().await?;
        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                entry
                    .price
                    .parse::<f64>()
                    .ok()
                    .map(|price| (entry.symbol, price))
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl crate::aggregator::PriceSource for PriceOracle {
    async fn snapshot(&self) -> PriceSnapshot {
        self.fetch_snapshot().await
    }
}

/// Resolves an asset to its USDT price: stable set first, then the direct
/// `{asset}USDT` pair, then bridging through BTC. `None` means the asset is
/// unpriced and must be excluded from totals rather than counted as zero.
pub fn lookup_usdt_price(snapshot: &PriceSnapshot, asset: &str) -> Option<f64> {
    if STABLE_ASSETS.contains(&asset) {
        return Some(1.0);
    }

    if let Some(price) = snapshot.get(&format!("{asset}USDT")) {
        return Some(*price);
    }

    match (snapshot.get(&format!("{asset}BTC")), snapshot.get("BTCUSDT")) {
        (Some(asset_btc), Some(btc_usdt)) => Some(asset_btc * btc_usdt),
        _ => None,
    }
}
