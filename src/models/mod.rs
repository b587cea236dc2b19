// ============================================================================
// Module : models
// ============================================================================
// Structures de données de l'application :
// - les réponses de l'API CoinGecko (coin, exchange, market chart)
// - les données locales (favoris)
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : déclare un sous-module public
// - "pub use" : re-export pour raccourcir les imports
// ============================================================================

pub mod coin;         // Détail d'un coin (/coins/{id})
pub mod exchange;     // Exchanges et tickers
pub mod favourite;    // Favoris locaux
pub mod market_chart; // Séries de prix et chandelles

// Au lieu de : use lazygecko::models::coin::CoinDetail;
// On peut faire : use lazygecko::models::CoinDetail;
pub use coin::{CoinDetail, CoinListEntry, CoinSnapshot, MarketData};
pub use exchange::{ExchangeDetail, ExchangeListEntry, ExchangeTicker, ExchangeTickers, Market};
pub use favourite::{FavouriteCoin, FavouriteEntry};
pub use market_chart::{Candle, ChartPoint, ChartRange, MarketChart, MarketChartResponse};
