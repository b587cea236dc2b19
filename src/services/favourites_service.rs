// ============================================================================
// Service favoris : page des favoris
// ============================================================================

use anyhow::Result;
use tracing::{debug, instrument, warn};

use crate::api::{self, CoinGeckoClient};
use crate::models::FavouriteEntry;
use crate::storage::{CoinCache, FavouritesStore};

#[derive(Debug, Clone)]
pub struct FavouritesService {
    client: CoinGeckoClient,
    favourites: FavouritesStore,
    cache: CoinCache,
}

impl FavouritesService {
    pub fn new(client: CoinGeckoClient, favourites: FavouritesStore, cache: CoinCache) -> Self {
        Self {
            client,
            favourites,
            cache,
        }
    }

    /// Chaque favori avec son dernier détail connu
    ///
    /// Un détail absent du cache est récupéré sur le réseau. En cas d'échec
    /// le favori est listé sans détail.
    #[instrument(skip(self))]
    pub async fn load_favourites(&self) -> Result<Vec<FavouriteEntry>> {
        let mut entries = Vec::new();

        for favourite in self.favourites.list().await? {
            let cached = self.cache.get(&favourite.id).await.unwrap_or_else(|e| {
                warn!(coin = %favourite.id, error = ?e, "Coin cache unreadable");
                None
            });

            let detail = match cached {
                Some(detail) => Some(detail),
                None => match api::fetch_coin(&self.client, &favourite.id).await {
                    Ok(detail) => {
                        if let Err(e) = self.cache.put(&favourite.id, &detail).await {
                            warn!(coin = %favourite.id, error = ?e, "Could not cache favourite detail");
                        }
                        Some(detail)
                    }
                    Err(e) => {
                        warn!(coin = %favourite.id, error = %e, "Favourite detail unavailable");
                        None
                    }
                },
            };

            entries.push(FavouriteEntry {
                id: favourite.id,
                detail,
            });
        }

        debug!(count = entries.len(), "Favourites loaded");
        Ok(entries)
    }

    /// Récupère à nouveau le détail de chaque favori, puis les liste
    ///
    /// Un favori qui échoue garde son ancien détail en cache.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Vec<FavouriteEntry>> {
        for favourite in self.favourites.list().await? {
            let refreshed = match api::fetch_coin(&self.client, &favourite.id).await {
                Ok(detail) => self.cache.put(&favourite.id, &detail).await,
                Err(e) => Err(e),
            };
            if let Err(e) = refreshed {
                warn!(coin = %favourite.id, error = %e, "Favourite refresh failed");
            }
        }
        self.load_favourites().await
    }

    /// Retire un favori et son détail en cache
    pub async fn remove(&self, coin_id: &str) -> Result<bool> {
        let removed = self.favourites.remove(coin_id).await?;
        self.cache.remove(coin_id).await?;
        Ok(removed)
    }
}
