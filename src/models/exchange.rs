// ============================================================================
// Exchange : réponses de /api/v3/exchanges/...
// ============================================================================
// - /exchanges/{id}          -> ExchangeDetail
// - /exchanges/{id}/tickers  -> ExchangeTickers (paginé, 100 tickers par page)
// - /exchanges/list          -> Vec<ExchangeListEntry>
// ============================================================================

use serde::{Deserialize, Serialize};

use super::coin::CurrencyMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangeDetail {
    pub name: String,
    pub year_established: Option<u32>,
    pub country: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub image: Option<String>,
    pub facebook_url: Option<String>,
    pub reddit_url: Option<String>,
    pub twitter_handle: Option<String>,
    pub has_trading_incentive: Option<bool>,
    pub centralized: Option<bool>,
    pub trust_score: Option<u32>,
    pub trust_score_rank: Option<u32>,
    pub trade_volume_24h_btc: Option<f64>,
    pub trade_volume_24h_btc_normalized: Option<f64>,
    pub tickers: Option<Vec<ExchangeTicker>>,
}

/// Une page de tickers d'un exchange
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangeTickers {
    pub name: String,
    pub tickers: Option<Vec<ExchangeTicker>>,
}

/// Une cotation d'une paire (ex: BTC/USDT) sur un exchange
///
/// Les dates restent des String : elles sont seulement affichées
/// et le cache doit les restituer à l'identique.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangeTicker {
    pub base: Option<String>,
    pub target: Option<String>,
    pub market: Option<Market>,
    pub last: Option<f64>,
    pub volume: Option<f64>,
    pub cost_to_move_up_usd: Option<f64>,
    pub cost_to_move_down_usd: Option<f64>,
    pub converted_last: Option<CurrencyMap>,
    pub converted_volume: Option<CurrencyMap>,
    pub trust_score: Option<String>,
    pub bid_ask_spread_percentage: Option<f64>,
    pub timestamp: Option<String>,
    pub last_traded_at: Option<String>,
    pub last_fetch_at: Option<String>,
    pub is_anomaly: Option<bool>,
    pub is_stale: Option<bool>,
    pub trade_url: Option<String>,
    pub token_info_url: Option<String>,
    pub coin_id: Option<String>,
    pub target_coin_id: Option<String>,
}

impl ExchangeTicker {
    /// Paire lisible (ex: "BTC/USDT")
    pub fn pair(&self) -> String {
        format!(
            "{}/{}",
            self.base.as_deref().unwrap_or("?"),
            self.target.as_deref().unwrap_or("?")
        )
    }

    /// Dernier prix converti dans une devise (usd, btc, eth)
    pub fn converted_last_in(&self, vs: &str) -> Option<f64> {
        self.converted_last.as_ref()?.get(vs).copied().flatten()
    }

    pub fn converted_volume_in(&self, vs: &str) -> Option<f64> {
        self.converted_volume.as_ref()?.get(vs).copied().flatten()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub name: Option<String>,
    pub identifier: Option<String>,
    pub has_trading_incentive: Option<bool>,
    pub logo: Option<String>,
}

/// Entrée de /exchanges/list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangeListEntry {
    pub id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_tickers_page() {
        let json = r#"{
            "name": "Binance",
            "tickers": [{
                "base": "BTC",
                "target": "USDT",
                "market": { "name": "Binance", "identifier": "binance", "has_trading_incentive": false },
                "last": 69702.5,
                "volume": 12345.6,
                "converted_last": { "btc": 1.0, "eth": 19.4, "usd": 69702.5 },
                "trust_score": "green",
                "timestamp": "2024-04-02T05:44:13+00:00",
                "is_anomaly": false,
                "is_stale": false,
                "coin_id": "bitcoin",
                "target_coin_id": "tether"
            }]
        }"#;

        let page: ExchangeTickers = serde_json::from_str(json).unwrap();
        let tickers = page.tickers.unwrap();
        assert_eq!(tickers.len(), 1);

        let ticker = &tickers[0];
        assert_eq!(ticker.pair(), "BTC/USDT");
        assert_eq!(ticker.converted_last_in("usd"), Some(69702.5));
        assert_eq!(ticker.converted_volume_in("usd"), None);
        assert_eq!(ticker.timestamp.as_deref(), Some("2024-04-02T05:44:13+00:00"));
    }

    #[test]
    fn test_tickers_null() {
        let page: ExchangeTickers = serde_json::from_str(r#"{"name":"X","tickers":null}"#).unwrap();
        assert!(page.tickers.is_none());
    }
}
