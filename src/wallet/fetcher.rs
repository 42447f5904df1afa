use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;

use crate::config::wallet_api_config::WalletApiConfig;
use crate::signing::sign_wallet_request;

const TOTAL_VALUE_ENDPOINT: &str = "/api/v5/wallet/asset/total-value-by-address";
const MAX_ATTEMPTS: usize = 5;
const RETRY_DELAY: Duration = Duration::from_secs(2);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Error, Debug)]
pub enum WalletApiError {
    #[error("wallet request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("wallet API returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("wallet API error {code}: {msg}")]
    Api { code: String, msg: String },
    #[error("wallet API response carried no usable total")]
    MissingData,
}

#[derive(Debug, serde::Deserialize)]
struct WalletTotalResponse {
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Vec<WalletTotalEntry>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct WalletTotalEntry {
    total_value: String,
}

/// Client for the wallet-aggregation API: one aggregate USD value per
/// address across the requested chains. The upstream is known to be flaky,
/// hence the bounded retry loop.
pub struct WalletFetcher {
    client: reqwest::Client,
    base_url: String,
    credentials: WalletApiConfig,
}

impl WalletFetcher {
    pub fn new(client: reqwest::Client, credentials: WalletApiConfig) -> Self {
        Self {
            client,
            base_url: "https://web3.okx.com".to_string(),
            credentials,
        }
    }

    /// Fetches the aggregate value with up to 5 attempts, 2 s apart. The
    /// returned flag distinguishes "confirmed value" from "unknown": a
    /// `(0.0, false)` result must never be read as an empty wallet.
    pub async fn fetch_total(&self, address: &str, chains: &str) -> (f64, bool) {
        fetch_with_retry(MAX_ATTEMPTS, RETRY_DELAY, || {
            self.try_fetch_total(address, chains)
        })
        .await
    }

    async fn try_fetch_total(&self, address: &str, chains: &str) -> Result<f64, WalletApiError> {
        // Fixed selectors: all asset types, risk tokens always excluded.
        let query =
            format!("address={address}&chains={chains}&assetType=0&excludeRiskToken=true");
        let request_path = format!("{TOTAL_VALUE_ENDPOINT}?{query}");
        let url = format!("{}{}", self.base_url, request_path);

        let timestamp = Utc::now().timestamp_millis().to_string();
        let signature = sign_wallet_request(
            &timestamp,
            "GET",
            &request_path,
            "",
            &self.credentials.secret_key,
        );

        let response = self
            .client
            .get(&url)
            .header("OK-ACCESS-PROJECT", &self.credentials.project_id)
            .header("OK-ACCESS-KEY", &self.credentials.api_key)
            .header("OK-ACCESS-SIGN", signature)
            .header("OK-ACCESS-PASSPHRASE", &self.credentials.passphrase)
            .header("OK-ACCESS-TIMESTAMP", &timestamp)
            .header("Content-Type", "application/json")
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WalletApiError::Status { status, body });
        }

        let payload: WalletTotalResponse = response.json().await?;
        // The upstream encodes application errors in the body, separate from
        // the HTTP status.
        if payload.code != "0" {
            return Err(WalletApiError::Api {
                code: payload.code,
                msg: payload.msg,
            });
        }

        let entry = payload.data.first().ok_or(WalletApiError::MissingData)?;
        entry
            .total_value
            .parse::<f64>()
            .map_err(|_| WalletApiError::MissingData)
    }
}

#[async_trait::async_trait]
impl crate::aggregator::WalletSource for WalletFetcher {
    async fn total_value(&self, address: &str, chains: &str) -> (f64, bool) {
        self.fetch_total(address, chains).await
    }
}

/// Retry driver: first success wins, exhaustion yields `(0.0, false)`. The
/// delay is a fixed pause, not exponential backoff.
async fn fetch_with_retry<F, Fut>(attempts: usize, delay: Duration, mut attempt: F) -> (f64, bool)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<f64, WalletApiError>>,
{
    for n in 1..=attempts {
        match attempt().await {
            Ok(total) => {
                log::info!("wallet fetch succeeded on attempt {n}/{attempts}: ${total:.2}");
                return (total, true);
            }
            Err(e) => {
                log::warn!("wallet fetch attempt {n}/{attempts} failed: {e}");
                if n < attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    log::error!("wallet fetch gave up after {attempts} attempts");
    (0.0, false)
}
