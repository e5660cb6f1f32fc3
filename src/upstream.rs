//! Chain API client
//!
//! Wraps the two EOSIO `chain` plugin calls the proxy needs. Handlers and the
//! supply calculator depend on [`ChainApi`] so they can run against an
//! in-memory node in tests.

use crate::config::{TokenConfig, UpstreamConfig};
use crate::errors::{ChainQueryError, UpstreamError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

pub const CURRENCY_STATS_PATH: &str = "/chain/get_currency_stats";
pub const CURRENCY_BALANCE_PATH: &str = "/chain/get_currency_balance";

/// Currency statistics keyed by token symbol.
///
/// Kept as the node's raw JSON object so `/stats` can pass it through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyStats(Map<String, Value>);

impl CurrencyStats {
    pub fn new(entries: Map<String, Value>) -> Self {
        Self(entries)
    }

    /// Wire-form `supply` for `symbol`, if the node reported one
    pub fn supply(&self, symbol: &str) -> Option<&str> {
        self.0.get(symbol)?.get("supply")?.as_str()
    }
}

/// Read access to the token contract through a chain API node
#[async_trait]
pub trait ChainApi: Send + Sync {
    /// Stats for the configured contract/symbol pair
    async fn get_currency_stats(&self) -> Result<CurrencyStats, ChainQueryError>;

    /// Wire-form balances of `account`; empty when the account holds none
    async fn get_currency_balance(&self, account: &str) -> Result<Vec<String>, ChainQueryError>;
}

#[derive(Debug, Serialize)]
struct CurrencyStatsRequest<'a> {
    code: &'a str,
    symbol: &'a str,
}

#[derive(Debug, Serialize)]
struct CurrencyBalanceRequest<'a> {
    code: &'a str,
    symbol: &'a str,
    account: &'a str,
}

/// Error body returned by nodeos on failure
#[derive(Debug, Deserialize)]
struct NodeErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<NodeErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct NodeErrorDetail {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    what: String,
}

/// HTTP client for a chain API node
pub struct HttpChainClient {
    client: Client,
    base_url: String,
    contract: String,
    symbol: String,
}

impl HttpChainClient {
    pub fn new(upstream: &UpstreamConfig, token: &TokenConfig) -> Result<Self, UpstreamError> {
        let mut builder = Client::builder();
        if let Some(timeout) = upstream.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: upstream.base_url.trim_end_matches('/').to_string(),
            contract: token.contract.clone(),
            symbol: token.symbol.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, UpstreamError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(node_error(status, &bytes));
        }

        serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ChainApi for HttpChainClient {
    async fn get_currency_stats(&self) -> Result<CurrencyStats, ChainQueryError> {
        debug!(contract = %self.contract, symbol = %self.symbol, "querying currency stats");

        let request = CurrencyStatsRequest {
            code: &self.contract,
            symbol: &self.symbol,
        };
        Ok(self.post(CURRENCY_STATS_PATH, &request).await?)
    }

    async fn get_currency_balance(&self, account: &str) -> Result<Vec<String>, ChainQueryError> {
        debug!(contract = %self.contract, symbol = %self.symbol, account, "querying currency balance");

        let request = CurrencyBalanceRequest {
            code: &self.contract,
            symbol: &self.symbol,
            account,
        };
        Ok(self.post(CURRENCY_BALANCE_PATH, &request).await?)
    }
}

fn node_error(status: StatusCode, body: &[u8]) -> UpstreamError {
    match serde_json::from_slice::<NodeErrorResponse>(body) {
        Ok(NodeErrorResponse {
            error: Some(detail), ..
        }) => UpstreamError::Application {
            code: detail.code,
            name: detail.name,
            what: detail.what,
        },
        Ok(NodeErrorResponse { message, .. }) => UpstreamError::Status {
            status: status.as_u16(),
            message,
        },
        Err(_) => UpstreamError::Status {
            status: status.as_u16(),
            message: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_currency_stats_supply_lookup() {
        let stats: CurrencyStats = serde_json::from_value(json!({
            "KARMA": {
                "supply": "1000000.0000 KARMA",
                "max_supply": "10000000000.0000 KARMA",
                "issuer": "therealkarma"
            }
        }))
        .unwrap();

        assert_eq!(stats.supply("KARMA"), Some("1000000.0000 KARMA"));
        assert_eq!(stats.supply("EOS"), None);
    }

    #[test]
    fn test_currency_stats_passthrough_keeps_unknown_fields() {
        let raw = json!({ "KARMA": { "supply": "1.0000 KARMA", "transfer_locked": true } });
        let stats: CurrencyStats = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&stats).unwrap(), raw);
    }

    #[test]
    fn test_node_error_structured() {
        let body = json!({
            "code": 500,
            "message": "Internal Service Error",
            "error": { "code": 3010001, "name": "name_type_exception", "what": "Invalid name", "details": [] }
        });
        let err = node_error(StatusCode::INTERNAL_SERVER_ERROR, body.to_string().as_bytes());
        assert_eq!(err.message(), "3010001 - name_type_exception - Invalid name");
    }

    #[test]
    fn test_node_error_generic_message() {
        let body = json!({ "code": 404, "message": "Not Found" });
        let err = node_error(StatusCode::NOT_FOUND, body.to_string().as_bytes());
        assert_eq!(err.message(), "Not Found");
    }

    #[test]
    fn test_node_error_unparseable_body() {
        let err = node_error(StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>");
        assert_eq!(err.message(), "Unknown Error");
    }

    #[test]
    fn test_request_bodies() {
        let stats = CurrencyStatsRequest { code: "therealkarma", symbol: "KARMA" };
        assert_eq!(
            serde_json::to_value(&stats).unwrap(),
            json!({ "code": "therealkarma", "symbol": "KARMA" })
        );

        let balance = CurrencyBalanceRequest { code: "therealkarma", symbol: "KARMA", account: "alice" };
        assert_eq!(
            serde_json::to_value(&balance).unwrap(),
            json!({ "code": "therealkarma", "symbol": "KARMA", "account": "alice" })
        );
    }
}
