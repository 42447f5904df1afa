use chrono::Local;

use crate::domain::holding::SubAccount;
use crate::domain::user_assets::UserAssets;

/// Assets shown in the summary message, largest first.
const TOP_ASSET_COUNT: usize = 8;
const TOP_ASSET_MIN_QUANTITY: f64 = 1.0;

const CHAIN_NAMES: [(&str, &str); 7] = [
    ("1", "Ethereum"),
    ("10", "Optimism"),
    ("56", "BSC"),
    ("137", "Polygon"),
    ("250", "Fantom"),
    ("42161", "Arbitrum"),
    ("43114", "Avalanche"),
];

/// Builds the per-user summary sent to every notify target.
pub fn format_user_summary(assets: &UserAssets) -> String {
    let checked_at = Local::now().format("%Y-%m-%d %H:%M:%S");

    let mut message = String::from("💰 User asset report\n\n");
    message.push_str(&format!("User: 【{}】\n", assets.note));
    message.push_str(&format!("Checked at: {checked_at}\n"));
    message.push_str(&format!("Total value: ${:.2} USD\n\n", assets.total_usd));

    match &assets.exchange {
        Some(exchange) => {
            message.push_str(&format!(
                "🏢 Exchange: ${:.2} USDT\n",
                exchange.combined_total()
            ));
            if exchange.spot_total_usdt > 0.0 {
                message.push_str(&format!(
                    "  📈 Spot account: ${:.2} USDT\n",
                    exchange.spot_total_usdt
                ));
            }
            if exchange.funding_total_usdt > 0.0 {
                message.push_str(&format!(
                    "  💰 Funding account: ${:.2} USDT\n",
                    exchange.funding_total_usdt
                ));
            }

            let mut holdings = exchange.holdings.clone();
            holdings.sort_by(|a, b| {
                b.total()
                    .partial_cmp(&a.total())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            let top: Vec<_> = holdings
                .iter()
                .take(TOP_ASSET_COUNT)
                .filter(|holding| holding.total() > TOP_ASSET_MIN_QUANTITY)
                .collect();
            if !top.is_empty() {
                message.push_str("Top assets:\n");
                for holding in top {
                    let tag = match holding.sub_account {
                        SubAccount::Spot => "📈",
                        SubAccount::Funding => "💰",
                    };
                    message.push_str(&format!(
                        "  {tag} {}: {:.4}\n",
                        holding.asset,
                        holding.total()
                    ));
                }
            }
        }
        None => {
            message.push_str("🏢 Exchange: not configured or unavailable\n");
        }
    }

    match &assets.wallet {
        Some(wallet) => {
            if wallet.fetch_succeeded {
                message.push_str(&format!(
                    "\n💼 On-chain wallet: ${:.2} USD\n",
                    wallet.total_usd
                ));
            } else {
                message.push_str("\n💼 On-chain wallet: ❌ fetch failed\n");
            }
            message.push_str(&format!("Address: {}\n", short_address(&wallet.address)));
            message.push_str(&format!("Chains: {}\n", chain_display(&wallet.chains)));
        }
        None => {
            message.push_str("\n💼 Wallet: not configured\n");
        }
    }

    message
}

/// `0x1234567890…beef` form; identifying material stays out of messages.
pub fn short_address(address: &str) -> String {
    if address.len() <= 10 {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

/// Turns a comma-joined chain id list into readable names.
pub fn chain_display(chains: &str) -> String {
    chains
        .split(',')
        .map(|id| {
            let id = id.trim();
            CHAIN_NAMES
                .iter()
                .find(|(chain_id, _)| *chain_id == id)
                .map(|(_, name)| name.to_string())
                .unwrap_or_else(|| format!("Chain-{id}"))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::holding::Holding;
    use crate::domain::user_assets::{ExchangeBalances, WalletBalance};

    #[test]
    fn short_address_keeps_ends_only() {
        assert_eq!(
            short_address("0x1234567890abcdef1234567890abcdefdeadbeef"),
            "0x1234...beef"
        );
        assert_eq!(short_address("0xshort"), "0xshort");
    }

    #[test]
    fn chain_display_maps_known_ids() {
        assert_eq!(chain_display("1"), "Ethereum");
        assert_eq!(chain_display("1, 56,999"), "Ethereum, BSC, Chain-999");
    }

    #[test]
    fn failed_wallet_fetch_is_marked_not_zeroed() {
        let assets = UserAssets {
            note: "main".into(),
            exchange: None,
            wallet: Some(WalletBalance {
                address: "0x1234567890abcdef1234567890abcdefdeadbeef".into(),
                chains: "1".into(),
                total_usd: 0.0,
                fetch_succeeded: false,
            }),
            total_usd: 0.0,
        };

        let message = format_user_summary(&assets);
        assert!(message.contains("❌ fetch failed"));
        assert!(!message.contains("wallet: $0.00"));
    }

    #[test]
    fn summary_shows_sub_account_totals_and_top_assets() {
        let assets = UserAssets {
            note: "main".into(),
            exchange: Some(ExchangeBalances {
                spot_total_usdt: 6100.0,
                funding_total_usdt: 25.0,
                holdings: vec![
                    Holding {
                        asset: "ETH".into(),
                        free: 2.0,
                        locked: 0.0,
                        sub_account: SubAccount::Spot,
                    },
                    Holding {
                        asset: "USDT".into(),
                        free: 100.0,
                        locked: 0.0,
                        sub_account: SubAccount::Funding,
                    },
                ],
            }),
            wallet: None,
            total_usd: 6125.0,
        };

        let message = format_user_summary(&assets);
        assert!(message.contains("Total value: $6125.00 USD"));
        assert!(message.contains("📈 Spot account: $6100.00 USDT"));
        assert!(message.contains("💰 Funding account: $25.00 USDT"));
        // Sorted by quantity: USDT (100) before ETH (2).
        let usdt_pos = message.find("USDT: 100.0000").unwrap();
        let eth_pos = message.find("ETH: 2.0000").unwrap();
        assert!(usdt_pos < eth_pos);
    }
}
