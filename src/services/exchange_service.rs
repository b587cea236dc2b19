// ============================================================================
// Service exchange : tickers de l'exchange configuré
// ============================================================================
// Lecture "read-through" :
//   show_tickers    -> cache ; si vide -> refresh_tickers
//   refresh_tickers -> réseau (page 1) ; écrase le cache
// ============================================================================

use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::api::{self, CoinGeckoClient};
use crate::models::ExchangeTicker;
use crate::storage::TickerCache;

/// Tickers affichés et leur provenance
#[derive(Debug, Clone, PartialEq)]
pub struct TickersView {
    pub exchange_id: String,
    /// Nom lisible quand il vient du réseau (ex: "Binance")
    pub exchange_name: Option<String>,
    pub tickers: Vec<ExchangeTicker>,
    pub from_cache: bool,
}

#[derive(Debug, Clone)]
pub struct ExchangeService {
    client: CoinGeckoClient,
    cache: TickerCache,
}

impl ExchangeService {
    pub fn new(client: CoinGeckoClient, cache: TickerCache) -> Self {
        Self { client, cache }
    }

    pub fn cache(&self) -> &TickerCache {
        &self.cache
    }

    /// Cache d'abord, réseau seulement si le cache est vide
    #[instrument(skip(self))]
    pub async fn show_tickers(&self, exchange_id: &str) -> Result<TickersView> {
        let cached = self.cache.load(exchange_id).await.unwrap_or_else(|e| {
            warn!(error = ?e, "Ticker cache unreadable, treating it as empty");
            Vec::new()
        });
        if cached.is_empty() {
            info!("Ticker cache empty, fetching from network");
            return self.refresh_tickers(exchange_id).await;
        }

        Ok(TickersView {
            exchange_id: exchange_id.to_string(),
            exchange_name: None,
            tickers: cached,
            from_cache: true,
        })
    }

    /// Récupère la première page et écrase le cache
    ///
    /// Une page absente ou sans liste de tickers laisse le cache intact.
    #[instrument(skip(self))]
    pub async fn refresh_tickers(&self, exchange_id: &str) -> Result<TickersView> {
        let page = api::fetch_exchange_tickers(&self.client, exchange_id, 1).await?;

        match page {
            Some(page) => match page.tickers {
                Some(tickers) => {
                    if let Err(e) = self.cache.store(exchange_id, &tickers).await {
                        warn!(error = ?e, "Could not overwrite ticker cache");
                    }
                    info!(count = tickers.len(), "Tickers refreshed");
                    Ok(TickersView {
                        exchange_id: exchange_id.to_string(),
                        exchange_name: Some(page.name),
                        tickers,
                        from_cache: false,
                    })
                }
                None => self.keep_cache(exchange_id).await,
            },
            None => self.keep_cache(exchange_id).await,
        }
    }

    async fn keep_cache(&self, exchange_id: &str) -> Result<TickersView> {
        warn!("No tickers returned, keeping cache");
        Ok(TickersView {
            exchange_id: exchange_id.to_string(),
            exchange_name: None,
            tickers: self.cache.load(exchange_id).await?,
            from_cache: true,
        })
    }

    /// Tous les coin ids cotés sur l'exchange
    pub async fn coin_ids(&self, exchange_id: &str) -> Result<Vec<String>> {
        api::get_coin_ids(&self.client, exchange_id).await
    }

    /// Ids de tous les exchanges connus de CoinGecko
    pub async fn exchange_ids(&self) -> Result<Vec<String>> {
        api::get_exchange_ids(&self.client).await
    }
}
