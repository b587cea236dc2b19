// ============================================================================
// Module : storage
// ============================================================================
// Persistance locale :
// - paths        : répertoires AppData / Cache et helpers fichiers
// - json_store   : fichier JSON utilisé comme base clé -> valeur
// - sqlite       : base SQLite embarquée (sqlx)
// - favourites   : table des favoris
// - ticker_cache : cache des tickers d'exchange (JSON ou SQLite)
// - coin_cache   : cache des détails de coins favoris
// ============================================================================

pub mod coin_cache;
pub mod favourites;
pub mod json_store;
pub mod paths;
pub mod sqlite;
pub mod ticker_cache;

pub use coin_cache::CoinCache;
pub use favourites::FavouritesStore;
pub use json_store::{JsonFile, JsonItemStore};
pub use paths::AppPaths;
pub use sqlite::SqliteStore;
pub use ticker_cache::{CacheBackend, TickerCache};
