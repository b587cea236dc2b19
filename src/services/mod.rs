// ============================================================================
// Module : services
// ============================================================================
// La couche entre l'état de l'application et l'API / le stockage local.
// Chaque page a son service :
// - coin_service       : page d'un coin, ajout/retrait des favoris
// - exchange_service   : tickers de l'exchange (cache read-through)
// - favourites_service : liste des favoris avec leur détail
// ============================================================================

pub mod coin_service;
pub mod exchange_service;
pub mod favourites_service;

use anyhow::{Context, Result};
use tracing::info;

pub use coin_service::{CoinService, CoinView, Trend};
pub use exchange_service::{ExchangeService, TickersView};
pub use favourites_service::FavouritesService;

use crate::api::CoinGeckoClient;
use crate::settings::SettingsStore;
use crate::storage::{AppPaths, CacheBackend, CoinCache, FavouritesStore, SqliteStore, TickerCache};

/// Tous les services, construits une fois au démarrage du worker
#[derive(Debug, Clone)]
pub struct Services {
    pub client: CoinGeckoClient,
    pub coins: CoinService,
    pub exchanges: ExchangeService,
    pub favourites: FavouritesService,
}

impl Services {
    /// Ouvre les bases locales et assemble les services
    pub async fn open(paths: &AppPaths, client: CoinGeckoClient, backend: CacheBackend) -> Result<Self> {
        let favourites_db = SqliteStore::open(&paths.favourites_db())
            .await
            .context("Échec de l'ouverture de la base des favoris")?;
        let favourites = FavouritesStore::new(favourites_db).await?;
        let coin_cache = CoinCache::open(paths.coin_responses_file()).await?;

        let ticker_cache = match backend {
            CacheBackend::Json => TickerCache::open_json(paths.tickers_json()).await?,
            CacheBackend::Sqlite => TickerCache::open_sqlite(SqliteStore::open(&paths.tickers_db()).await?).await?,
        };
        info!(backend = backend.label(), "Services ready");

        Ok(Self {
            coins: CoinService::new(client.clone(), favourites.clone(), coin_cache.clone()),
            exchanges: ExchangeService::new(client.clone(), ticker_cache),
            favourites: FavouritesService::new(client.clone(), favourites, coin_cache),
            client,
        })
    }

    /// Récupère et met en cache les devises supportées
    pub async fn refresh_supported_currencies(&self, settings: &SettingsStore) -> Result<Vec<String>> {
        crate::settings::refresh_supported_currencies(&self.client, settings).await
    }
}
