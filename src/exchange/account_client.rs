use std::time::Duration;

use chrono::Utc;
use thiserror::Error;

use crate::domain::holding::{Holding, SubAccount};
use crate::signing::sign_exchange_query;

const SPOT_ENDPOINT: &str = "/api/v3/account";
const FUNDING_ENDPOINT: &str = "/sapi/v1/asset/get-funding-asset";
const API_KEY_HEADER: &str = "X-MBX-APIKEY";
const RECV_WINDOW_MS: u64 = 60_000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum ExchangeApiError {
    #[error("exchange request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("exchange returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Spot balance entry as reported by the exchange; amounts arrive as strings.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SpotBalance {
    pub asset: String,
    pub free: String,
    pub locked: String,
}

#[derive(Debug, serde::Deserialize)]
struct SpotAccountResponse {
    #[serde(default)]
    balances: Vec<SpotBalance>,
}

/// Funding wallet entry; the funding sub-ledger reports no locked amount.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct FundingAsset {
    pub asset: String,
    pub free: String,
}

/// Signed client for one exchange's account endpoints. Both calls are single
/// attempt and fail soft to an empty list; the caller reports a zero total
/// for the affected sub-account rather than an error.
pub struct ExchangeAccountClient {
    client: reqwest::Client,
    base_url: String,
}

impl ExchangeAccountClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: "https://api.binance.com".to_string(),
        }
    }

    pub async fn fetch_spot_balances(&self, api_key: &str, api_secret: &str) -> Vec<SpotBalance> {
        match self.try_fetch_spot(api_key, api_secret).await {
            Ok(balances) => balances,
            Err(e) => {
                log::error!("spot balance fetch failed: {e}");
                Vec::new()
            }
        }
    }

    pub async fn fetch_funding_balances(
        &self,
        api_key: &str,
        api_secret: &str,
    ) -> Vec<FundingAsset> {
        match self.try_fetch_funding(api_key, api_secret).await {
            Ok(assets) => assets,
            Err(e) => {
                log::error!("funding balance fetch failed: {e}");
                Vec::new()
            }
        }
    }

    async fn try_fetch_spot(
        &self,
        api_key: &str,
        api_secret: &str,
    ) -> Result<Vec<SpotBalance>, ExchangeApiError> {
        let url = self.signed_url(SPOT_ENDPOINT, api_secret);
        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, api_key)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let response = check_status(response).await?;
        let account: SpotAccountResponse = response.json().await?;
        Ok(account.balances)
    }

    async fn try_fetch_funding(
        &self,
        api_key: &str,
        api_secret: &str,
    ) -> Result<Vec<FundingAsset>, ExchangeApiError> {
        let url = self.signed_url(FUNDING_ENDPOINT, api_secret);
        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    fn signed_url(&self, endpoint: &str, api_secret: &str) -> String {
        let timestamp = Utc::now().timestamp_millis();
        let query = format!("timestamp={timestamp}&recvWindow={RECV_WINDOW_MS}");
        let signature = sign_exchange_query(&query, api_secret);
        format!("{}{}?{}&signature={}", self.base_url, endpoint, query, signature)
    }
}

#[async_trait::async_trait]
impl crate::aggregator::ExchangeSource for ExchangeAccountClient {
    async fn spot_holdings(&self, api_key: &str, api_secret: &str) -> Vec<Holding> {
        self.fetch_spot_balances(api_key, api_secret)
            .await
            .into_iter()
            .map(|balance| Holding {
                asset: balance.asset,
                free: balance.free.parse().unwrap_or(0.0),
                locked: balance.locked.parse().unwrap_or(0.0),
                sub_account: SubAccount::Spot,
            })
            .collect()
    }

    async fn funding_holdings(&self, api_key: &str, api_secret: &str) -> Vec<Holding> {
        self.fetch_funding_balances(api_key, api_secret)
            .await
            .into_iter()
            .map(|asset| Holding {
                asset: asset.asset,
                free: asset.free.parse().unwrap_or(0.0),
                locked: 0.0,
                sub_account: SubAccount::Funding,
            })
            .collect()
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ExchangeApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ExchangeApiError::Status { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_url_carries_query_and_signature() {
        let client = ExchangeAccountClient::new(reqwest::Client::new());
        let url = client.signed_url(SPOT_ENDPOINT, "secret");

        assert!(url.starts_with("https://api.binance.com/api/v3/account?timestamp="));
        assert!(url.contains("&recvWindow=60000&signature="));

        let signature = url.split("signature=").nth(1).unwrap();
        assert_eq!(signature.len(), 64);
    }

    #[test]
    fn spot_response_parses_balance_strings() {
        let raw = r#"{"balances":[{"asset":"ETH","free":"2.0","locked":"0.5"}],"accountType":"SPOT"}"#;
        let account: SpotAccountResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(account.balances.len(), 1);
        assert_eq!(account.balances[0].asset, "ETH");
        assert_eq!(account.balances[0].free, "2.0");
    }

    #[test]
    fn funding_response_ignores_extra_fields() {
        let raw = r#"[{"asset":"USDT","free":"100.0","freeze":"0","withdrawing":"0","btcValuation":"0.001"}]"#;
        let assets: Vec<FundingAsset> = serde_json::from_str(raw).unwrap();
        assert_eq!(assets[0].asset, "USDT");
        assert_eq!(assets[0].free, "100.0");
    }
}
