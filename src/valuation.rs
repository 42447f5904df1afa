use crate::domain::holding::Holding;
use crate::price::oracle::{lookup_usdt_price, PriceSnapshot};

/// Holdings at or below this total are omitted from display lists. The fiat
/// total is always computed over all holdings, dust included.
pub const DUST_THRESHOLD: f64 = 0.001;

/// Converts a list of holdings into one USDT total. Stable assets count at
/// face value; everything else goes through the snapshot lookup. Assets
/// without a resolvable price contribute nothing and are dropped from the sum
/// silently.
pub fn holdings_to_usdt(holdings: &[Holding], snapshot: &PriceSnapshot) -> f64 {
    let mut total_usdt = 0.0;

    for holding in holdings {
        let quantity = holding.total();
        if quantity <= 0.0 {
            continue;
        }

        match lookup_usdt_price(snapshot, &holding.asset) {
            Some(price) => total_usdt += quantity * price,
            None => {
                log::debug!("no USDT conversion path for {}, excluded", holding.asset);
            }
        }
    }

    total_usdt
}

/// The display list: holdings above the dust threshold. Pricing status does
/// not matter here; display inclusion and sum inclusion are independent.
pub fn significant_holdings(holdings: &[Holding]) -> Vec<Holding> {
    holdings
        .iter()
        .filter(|holding| holding.total() > DUST_THRESHOLD)
        .cloned()
        .collect()
}
