//! Circulating supply calculation
//!
//! Total supply minus the balances of accounts holding non-circulating tokens.

use crate::amount::TokenAmount;
use crate::config::TokenConfig;
use crate::errors::SupplyError;
use crate::upstream::ChainApi;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::debug;

pub const UNKNOWN_BALANCES_ERROR: &str = "Unknown error getting ignored balances";

/// Derives supply figures from the chain API
pub struct SupplyCalculator {
    chain: Arc<dyn ChainApi>,
    token: TokenConfig,
}

impl SupplyCalculator {
    pub fn new(chain: Arc<dyn ChainApi>, token: TokenConfig) -> Self {
        Self { chain, token }
    }

    /// Total supply as reported in the contract's stats table
    pub async fn total_supply(&self) -> Result<TokenAmount, SupplyError> {
        let stats = self.chain.get_currency_stats().await?;
        let supply = stats
            .supply(&self.token.symbol)
            .ok_or(SupplyError::UnknownSupply)?;

        TokenAmount::parse(supply, self.token.decimals).map_err(|e| calculation_error(e.to_string()))
    }

    /// Total supply minus every configured excluded account
    pub async fn current_circulating_supply(&self) -> Result<TokenAmount, SupplyError> {
        let total = self.total_supply().await?;
        self.circulating_supply(total, &self.token.excluded_accounts)
            .await
    }

    /// Subtract each excluded account's balance from `total`.
    ///
    /// Balances are fetched concurrently and any failed lookup fails the whole
    /// calculation. Subtraction follows the order of `excluded`, rounding after
    /// every step.
    pub async fn circulating_supply(
        &self,
        total: TokenAmount,
        excluded: &[String],
    ) -> Result<TokenAmount, SupplyError> {
        if excluded.is_empty() {
            return Ok(total);
        }

        let balances = try_join_all(
            excluded
                .iter()
                .map(|account| self.chain.get_currency_balance(account)),
        )
        .await
        .map_err(|e| calculation_error(e.to_string()))?;

        let decimals = total.decimals();
        excluded
            .iter()
            .zip(balances)
            .try_fold(total, |acc, (account, balance)| {
                // No row in the accounts table means nothing is held
                let held = match balance.first() {
                    Some(wire) => TokenAmount::parse(wire, decimals)
                        .map_err(|e| calculation_error(e.to_string()))?,
                    None => TokenAmount::zero(decimals),
                };
                debug!(account = %account, held = %held, "subtracting excluded balance");

                acc.checked_sub(held).map_err(|e| {
                    calculation_error(format!("Subtracting balance of {}: {}", account, e))
                })
            })
    }
}

fn calculation_error(message: String) -> SupplyError {
    if message.trim().is_empty() {
        SupplyError::Calculation(UNKNOWN_BALANCES_ERROR.to_string())
    } else {
        SupplyError::Calculation(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ChainQueryError;
    use crate::upstream::CurrencyStats;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct MockChain {
        supply: Option<String>,
        balances: HashMap<String, Vec<String>>,
        delays_ms: HashMap<String, u64>,
        failing: Option<(String, String)>,
        balance_calls: AtomicUsize,
    }

    impl MockChain {
        fn new(supply: &str) -> Self {
            Self {
                supply: Some(supply.to_string()),
                balances: HashMap::new(),
                delays_ms: HashMap::new(),
                failing: None,
                balance_calls: AtomicUsize::new(0),
            }
        }

        fn with_balance(mut self, account: &str, wire: &str) -> Self {
            self.balances.insert(account.to_string(), vec![wire.to_string()]);
            self
        }

        fn with_delay(mut self, account: &str, ms: u64) -> Self {
            self.delays_ms.insert(account.to_string(), ms);
            self
        }

        fn failing_on(mut self, account: &str, message: &str) -> Self {
            self.failing = Some((account.to_string(), message.to_string()));
            self
        }
    }

    #[async_trait]
    impl ChainApi for MockChain {
        async fn get_currency_stats(&self) -> Result<CurrencyStats, ChainQueryError> {
            let mut entries = serde_json::Map::new();
            if let Some(supply) = &self.supply {
                entries.insert("KARMA".to_string(), json!({ "supply": supply }));
            }
            Ok(CurrencyStats::new(entries))
        }

        async fn get_currency_balance(&self, account: &str) -> Result<Vec<String>, ChainQueryError> {
            self.balance_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(ms) = self.delays_ms.get(account) {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            }
            if let Some((failing, message)) = &self.failing {
                if failing == account {
                    return Err(ChainQueryError::new(message.clone()));
                }
            }
            Ok(self.balances.get(account).cloned().unwrap_or_default())
        }
    }

    fn token(excluded: &[&str]) -> TokenConfig {
        TokenConfig {
            excluded_accounts: excluded.iter().map(|a| a.to_string()).collect(),
            ..TokenConfig::default()
        }
    }

    fn accounts(names: &[&str]) -> Vec<String> {
        names.iter().map(|a| a.to_string()).collect()
    }

    #[tokio::test]
    async fn test_empty_excluded_set_returns_total() {
        let chain = Arc::new(MockChain::new("1000000.0000 KARMA"));
        let calculator = SupplyCalculator::new(chain.clone(), token(&[]));

        let total = TokenAmount::parse("1234.5678 KARMA", 4).unwrap();
        let result = calculator.circulating_supply(total, &[]).await.unwrap();

        assert_eq!(result, total);
        assert_eq!(chain.balance_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_subtracts_excluded_balances() {
        let chain = Arc::new(
            MockChain::new("1000000.0000 KARMA")
                .with_balance("issuer", "1000.0000 KARMA")
                .with_balance("airdrop", "2000.0000 KARMA")
                .with_balance("market", "0.0000 KARMA"),
        );
        let calculator = SupplyCalculator::new(chain.clone(), token(&["issuer", "airdrop", "market"]));

        let result = calculator.current_circulating_supply().await.unwrap();
        assert_eq!(result.to_string(), "997000.0000");
        assert_eq!(chain.balance_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_balances_are_rounded_before_subtraction() {
        let chain = Arc::new(
            MockChain::new("10.0000 KARMA")
                .with_balance("a", "0.00004 KARMA")
                .with_balance("b", "0.00004 KARMA"),
        );
        let calculator = SupplyCalculator::new(chain, token(&[]));

        // Each balance rounds to 0.0000 on its own; their raw sum would round to 0.0001
        let total = TokenAmount::parse("10.0000 KARMA", 4).unwrap();
        let result = calculator
            .circulating_supply(total, &accounts(&["a", "b"]))
            .await
            .unwrap();
        assert_eq!(result.to_string(), "10.0000");
    }

    #[tokio::test]
    async fn test_reduction_follows_configured_order_not_completion_order() {
        let chain = Arc::new(
            MockChain::new("100.0000 KARMA")
                .with_balance("slow", "30.0000 KARMA")
                .with_balance("fast", "20.0000 KARMA")
                .with_delay("slow", 50),
        );
        let calculator = SupplyCalculator::new(chain.clone(), token(&[]));

        let total = TokenAmount::parse("100.0000 KARMA", 4).unwrap();
        let result = calculator
            .circulating_supply(total, &accounts(&["slow", "fast"]))
            .await
            .unwrap();
        assert_eq!(result.to_string(), "50.0000");
        assert_eq!(chain.balance_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_account_without_balance_contributes_nothing() {
        let chain = Arc::new(MockChain::new("100.0000 KARMA").with_balance("a", "1.5000 KARMA"));
        let calculator = SupplyCalculator::new(chain, token(&["a", "empty"]));

        let result = calculator.current_circulating_supply().await.unwrap();
        assert_eq!(result.to_string(), "98.5000");
    }

    #[tokio::test]
    async fn test_single_failed_lookup_fails_calculation() {
        let chain = Arc::new(
            MockChain::new("100.0000 KARMA")
                .with_balance("a", "1.0000 KARMA")
                .failing_on("b", "3 - x - y"),
        );
        let calculator = SupplyCalculator::new(chain, token(&["a", "b"]));

        let err = calculator.current_circulating_supply().await.unwrap_err();
        assert_eq!(err, SupplyError::Calculation("3 - x - y".to_string()));
    }

    #[tokio::test]
    async fn test_failed_lookup_without_message_uses_fallback() {
        let chain = Arc::new(MockChain::new("100.0000 KARMA").failing_on("a", ""));
        let calculator = SupplyCalculator::new(chain, token(&["a"]));

        let err = calculator.current_circulating_supply().await.unwrap_err();
        assert_eq!(err.to_string(), UNKNOWN_BALANCES_ERROR);
    }

    fn precise_token(excluded: &[&str]) -> TokenConfig {
        TokenConfig {
            decimals: 18,
            ..token(excluded)
        }
    }

    #[tokio::test]
    async fn test_total_supply_beyond_precision_fails() {
        let chain = Arc::new(MockChain::new("100000000000.0000 KARMA"));
        let calculator = SupplyCalculator::new(chain, precise_token(&[]));

        let err = calculator.total_supply().await.unwrap_err();
        assert!(matches!(err, SupplyError::Calculation(_)));
        assert!(err.to_string().contains("18 decimal places"));
    }

    #[tokio::test]
    async fn test_reduction_beyond_precision_fails() {
        let chain = Arc::new(
            MockChain::new("79000000000 KARMA").with_balance("refund", "-1000000000 KARMA"),
        );
        let calculator = SupplyCalculator::new(chain, precise_token(&["refund"]));

        let err = calculator.current_circulating_supply().await.unwrap_err();
        assert!(matches!(err, SupplyError::Calculation(_)));
        assert!(err.to_string().contains("refund"));
    }

    #[tokio::test]
    async fn test_high_precision_supply_keeps_every_digit() {
        let chain = Arc::new(
            MockChain::new("1000.5 KARMA").with_balance("issuer", "0.000000000000000001 KARMA"),
        );
        let calculator = SupplyCalculator::new(chain, precise_token(&["issuer"]));

        let result = calculator.current_circulating_supply().await.unwrap();
        assert_eq!(result.to_string(), "1000.499999999999999999");
    }

    #[tokio::test]
    async fn test_missing_symbol_in_stats() {
        let mut chain = MockChain::new("");
        chain.supply = None;
        let calculator = SupplyCalculator::new(Arc::new(chain), token(&[]));

        let err = calculator.total_supply().await.unwrap_err();
        assert_eq!(err, SupplyError::UnknownSupply);
    }
}
