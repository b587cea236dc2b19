// ============================================================================
// Coin : réponse de /api/v3/coins/{id}
// ============================================================================
// Ces structures reflètent le JSON de CoinGecko champ par champ.
// Elles dérivent aussi Serialize pour être mises en cache telles quelles
// (CoinResponses/coin_response.json).
//
// CONCEPT RUST : Option<T> partout
// - CoinGecko omet ou met à null beaucoup de champs selon le coin
// - Serde transforme un champ absent ou null en None
// ============================================================================

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Format de `last_updated` renvoyé par CoinGecko (ex: 2024-04-02T05:44:13.549Z)
pub const LAST_UPDATED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Map "devise de cotation -> valeur" (ex: "usd" -> 69702.0)
pub type CurrencyMap = HashMap<String, Option<f64>>;

/// Détail complet d'un coin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinDetail {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub web_slug: Option<String>,
    pub asset_platform_id: Option<String>,
    pub image: Option<HashMap<String, Option<String>>>,
    pub links: Option<Links>,
    pub genesis_date: Option<String>,
    pub sentiment_votes_up_percentage: Option<f64>,
    pub sentiment_votes_down_percentage: Option<f64>,
    pub market_cap_rank: Option<u32>,
    pub watchlist_portfolio_users: Option<u64>,
    pub market_data: Option<MarketData>,
    pub community_data: Option<CommunityData>,
    pub developer_data: Option<DeveloperData>,
    pub last_updated: Option<String>,
    pub tickers: Option<Vec<CoinTicker>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Links {
    pub homepage: Option<Vec<String>>,
    pub whitepaper: Option<String>,
    pub blockchain_site: Option<Vec<String>>,
    pub official_forum_url: Option<Vec<String>>,
    pub chat_url: Option<Vec<String>>,
    pub announcement_url: Option<Vec<String>>,
    pub subreddit_url: Option<String>,
    pub repos_url: Option<HashMap<String, Option<Vec<String>>>>,
}

/// Données de marché (prix, market cap, variations, supplies...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    pub current_price: Option<CurrencyMap>,
    pub total_value_locked: Option<CurrencyMap>,
    pub mcap_to_tvl_ratio: Option<f64>,
    pub fdv_to_tvl_ratio: Option<f64>,
    pub roi: Option<Roi>,
    pub ath: Option<CurrencyMap>,
    pub ath_change_percentage: Option<CurrencyMap>,
    pub ath_date: Option<HashMap<String, Option<String>>>,
    pub atl: Option<CurrencyMap>,
    pub atl_change_percentage: Option<CurrencyMap>,
    pub atl_date: Option<HashMap<String, Option<String>>>,
    pub market_cap: Option<CurrencyMap>,
    pub market_cap_rank: Option<u32>,
    pub fully_diluted_valuation: Option<CurrencyMap>,
    pub market_cap_fdv_ratio: Option<f64>,
    pub total_volume: Option<CurrencyMap>,
    pub high_24h: Option<CurrencyMap>,
    pub low_24h: Option<CurrencyMap>,
    pub price_change_24h: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
    pub price_change_percentage_7d: Option<f64>,
    pub price_change_percentage_14d: Option<f64>,
    pub price_change_percentage_30d: Option<f64>,
    pub price_change_percentage_60d: Option<f64>,
    pub price_change_percentage_200d: Option<f64>,
    pub price_change_percentage_1y: Option<f64>,
    pub market_cap_change_24h: Option<f64>,
    pub market_cap_change_percentage_24h: Option<f64>,
    pub price_change_24h_in_currency: Option<CurrencyMap>,
    pub price_change_percentage_24h_in_currency: Option<CurrencyMap>,
    pub price_change_percentage_7d_in_currency: Option<CurrencyMap>,
    pub price_change_percentage_30d_in_currency: Option<CurrencyMap>,
    pub total_supply: Option<f64>,
    pub max_supply: Option<f64>,
    pub circulating_supply: Option<f64>,
    pub sparkline_7d: Option<Sparkline>,
    pub last_updated: Option<String>,
}

/// Prix horaires des 7 derniers jours
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sparkline {
    pub price: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roi {
    pub times: Option<f64>,
    pub currency: Option<String>,
    pub percentage: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommunityData {
    pub facebook_likes: Option<u64>,
    pub twitter_followers: Option<u64>,
    pub reddit_average_posts_48h: Option<f64>,
    pub reddit_average_comments_48h: Option<f64>,
    pub reddit_subscribers: Option<u64>,
    pub reddit_accounts_active_48h: Option<u64>,
    pub telegram_channel_user_count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeveloperData {
    pub forks: Option<u64>,
    pub stars: Option<u64>,
    pub subscribers: Option<u64>,
    pub total_issues: Option<u64>,
    pub closed_issues: Option<u64>,
    pub pull_requests_merged: Option<u64>,
    pub pull_request_contributors: Option<u64>,
    pub code_additions_deletions_4_weeks: Option<HashMap<String, Option<i64>>>,
    pub commit_count_4_weeks: Option<u64>,
}

/// Ticker tel qu'il apparaît dans le détail d'un coin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinTicker {
    pub base: Option<String>,
    pub target: Option<String>,
    pub market: Option<TickerMarket>,
    pub last: Option<f64>,
    pub volume: Option<f64>,
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

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerMarket {
    pub name: Option<String>,
    pub identifier: Option<String>,
    pub has_trading_incentive: Option<bool>,
    pub logo: Option<String>,
}

/// Entrée de /coins/list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinListEntry {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub platforms: Option<HashMap<String, Option<String>>>,
}

// ============================================================================
// Vue "données courantes" d'un coin
// ============================================================================

/// Les chiffres affichés en tête de la page coin, pour une devise donnée
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoinSnapshot {
    pub homepage: Option<Vec<String>>,
    pub sentiment_votes_up_percentage: Option<f64>,
    pub sentiment_votes_down_percentage: Option<f64>,
    pub current_price: Option<f64>,
    pub market_cap_fdv_ratio: Option<f64>,
    pub total_volume: Option<f64>,
    pub high_24h: Option<f64>,
    pub low_24h: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
    pub price_change_percentage_7d: Option<f64>,
    pub price_change_percentage_30d: Option<f64>,
    pub total_supply: Option<f64>,
    pub max_supply: Option<f64>,
    pub circulating_supply: Option<f64>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Parse un `last_updated` CoinGecko, None si le format ne correspond pas
pub fn parse_last_updated(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, LAST_UPDATED_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Lit la valeur d'une devise dans une map optionnelle
fn in_currency(map: Option<&CurrencyMap>, vs: &str) -> Option<f64> {
    map.and_then(|m| m.get(vs).copied().flatten())
}

impl CoinDetail {
    /// Prix horaires des 7 derniers jours (sparkline)
    pub fn sparkline(&self) -> Option<&[f64]> {
        self.market_data
            .as_ref()?
            .sparkline_7d
            .as_ref()?
            .price
            .as_deref()
    }

    /// Prix courant dans la devise demandée
    pub fn current_price(&self, vs: &str) -> Option<f64> {
        in_currency(self.market_data.as_ref()?.current_price.as_ref(), vs)
    }

    pub fn price_change_24h(&self) -> Option<f64> {
        self.market_data.as_ref()?.price_change_24h
    }

    pub fn price_change_percentage_24h(&self) -> Option<f64> {
        self.market_data.as_ref()?.price_change_percentage_24h
    }

    /// Extrait les données courantes pour une devise
    pub fn current_data(&self, vs: &str) -> CoinSnapshot {
        let mut snapshot = CoinSnapshot {
            homepage: self.links.as_ref().and_then(|l| l.homepage.clone()),
            sentiment_votes_up_percentage: self.sentiment_votes_up_percentage,
            sentiment_votes_down_percentage: self.sentiment_votes_down_percentage,
            last_updated: self.last_updated.as_deref().and_then(parse_last_updated),
            ..Default::default()
        };

        if let Some(md) = &self.market_data {
            snapshot.current_price = in_currency(md.current_price.as_ref(), vs);
            snapshot.market_cap_fdv_ratio = md.market_cap_fdv_ratio;
            snapshot.total_volume = in_currency(md.total_volume.as_ref(), vs);
            snapshot.high_24h = in_currency(md.high_24h.as_ref(), vs);
            snapshot.low_24h = in_currency(md.low_24h.as_ref(), vs);
            snapshot.price_change_percentage_24h = md.price_change_percentage_24h;
            snapshot.price_change_percentage_7d = md.price_change_percentage_7d;
            snapshot.price_change_percentage_30d = md.price_change_percentage_30d;
            snapshot.total_supply = md.total_supply;
            snapshot.max_supply = md.max_supply;
            snapshot.circulating_supply = md.circulating_supply;
        }

        snapshot
    }

    /// Lignes "label / valeur" affichées sous un favori
    ///
    /// Le prix n'apparaît que si la map des prix existe
    pub fn stats_rows(&self, vs: &str) -> Vec<(String, String)> {
        let md = self.market_data.as_ref();
        let mut rows = Vec::with_capacity(3);

        let last_updated = md
            .and_then(|m| m.last_updated.clone())
            .unwrap_or_default();
        rows.push(("Last Updated".to_string(), last_updated));

        if let Some(prices) = md.and_then(|m| m.current_price.as_ref()) {
            let price = prices
                .get(vs)
                .copied()
                .flatten()
                .map(format_price)
                .unwrap_or_default();
            rows.push((format!("Latest Price ({})", vs), price));
        }

        let rank = md
            .and_then(|m| m.market_cap_rank)
            .map(|r| r.to_string())
            .unwrap_or_default();
        rows.push(("Market Cap Rank".to_string(), rank));

        rows
    }
}

/// Formate un prix avec une précision adaptée à sa grandeur
///
/// CONCEPT : les petits coins (ex: SHIB) valent moins d'un centime
pub fn format_price(price: f64) -> String {
    let abs = price.abs();
    if abs >= 1.0 {
        format!("{:.2}", price)
    } else if abs >= 0.01 {
        format!("{:.4}", price)
    } else {
        format!("{:.8}", price)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
