/// A single asset position inside one sub-account.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub asset: String,
    pub free: f64,
    pub locked: f64,
    pub sub_account: SubAccount,
}

impl Holding {
    pub fn total(&self) -> f64 {
        self.free + self.locked
    }
}

/// The exchange keeps two sub-ledgers with separate balance endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SubAccount {
    Spot,
    Funding,
}
