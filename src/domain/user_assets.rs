use super::holding::Holding;

/// Merged spot + funding view of one exchange account. Sub-calls fail soft,
/// so a zero sub-total can mean "empty" or "unreachable" here; only the
/// wallet source carries an explicit success flag.
#[derive(Debug, Clone)]
pub struct ExchangeBalances {
    pub spot_total_usdt: f64,
    pub funding_total_usdt: f64,
    /// Significant holdings across both sub-accounts, tagged by origin.
    pub holdings: Vec<Holding>,
}

impl ExchangeBalances {
    pub fn combined_total(&self) -> f64 {
        self.spot_total_usdt + self.funding_total_usdt
    }
}

/// Aggregate USD value of an on-chain wallet. `fetch_succeeded == false`
/// means "unknown", never "confirmed zero": such a result must not be added
/// to any user total.
#[derive(Debug, Clone)]
pub struct WalletBalance {
    pub address: String,
    pub chains: String,
    pub total_usd: f64,
    pub fetch_succeeded: bool,
}

/// Everything known about one user after a check pass. Built fresh per pass,
/// handed to formatting and the ledger writer, then discarded.
#[derive(Debug, Clone)]
pub struct UserAssets {
    pub note: String,
    pub exchange: Option<ExchangeBalances>,
    pub wallet: Option<WalletBalance>,
    pub total_usd: f64,
}
