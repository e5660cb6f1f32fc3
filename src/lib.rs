//! Karma Supply - circulating supply proxy for an EOSIO token
//!
//! Answers supply and balance questions for one token by querying a chain
//! API node and adjusting the figures it reports.

pub mod amount;
pub mod api;
pub mod config;
pub mod errors;
pub mod supply;
pub mod upstream;

pub use amount::TokenAmount;
pub use config::SupplyConfig;
pub use errors::{AmountError, ChainQueryError, SupplyError, UpstreamError};
pub use supply::SupplyCalculator;
pub use upstream::{ChainApi, CurrencyStats, HttpChainClient};
