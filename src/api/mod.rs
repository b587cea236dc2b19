// ============================================================================
// Module : api
// ============================================================================
// Client de l'API REST CoinGecko :
// - client    : construction des URI, GET + désérialisation JSON
// - coins     : détail d'un coin, market chart, OHLC, liste des coins
// - exchanges : détail d'un exchange, tickers paginés, liste des exchanges
// - simple    : devises de cotation supportées
// ============================================================================

pub mod client;
pub mod coins;
pub mod exchanges;
pub mod simple;

// Re-export des fonctions principales
pub use client::{CoinGeckoClient, COINGECKO_ROOT};
pub use coins::{fetch_coin, get_market_chart, get_ohlc};
pub use exchanges::{fetch_exchange_tickers, get_coin_ids, get_exchange_ids};
pub use simple::fetch_supported_currencies;
