// ============================================================================
// Service coin : page d'un coin + favoris
// ============================================================================
// Combine l'API (détail + market chart), la table des favoris et le cache
// des détails. Un favori reste consultable quand le réseau échoue : on
// retombe alors sur son dernier détail connu.
// ============================================================================

use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::api::{self, CoinGeckoClient};
use crate::error::GeckoError;
use crate::models::{Candle, ChartRange, CoinDetail, MarketChart};
use crate::storage::{CoinCache, FavouritesStore};

/// Sens de la variation sur 24h
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
}

impl Trend {
    /// Variation > 0 : hausse, < 0 : baisse, nulle ou inconnue : rien
    pub fn from_change(change: Option<f64>) -> Option<Trend> {
        match change {
            Some(c) if c > 0.0 => Some(Trend::Up),
            Some(c) if c < 0.0 => Some(Trend::Down),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Trend::Up => "▲",
            Trend::Down => "▼",
        }
    }
}

/// Tout ce qu'affiche la page d'un coin
#[derive(Debug, Clone, PartialEq)]
pub struct CoinView {
    pub coin_id: String,
    pub detail: CoinDetail,
    /// None si le graphique n'a pas pu être chargé
    pub chart: Option<MarketChart>,
    pub range: ChartRange,
    pub quote_currency: String,
    pub favourite: bool,
    /// true si le détail vient du cache (réseau indisponible)
    pub from_cache: bool,
}

impl CoinView {
    pub fn current_price(&self) -> Option<f64> {
        self.detail.current_price(&self.quote_currency)
    }

    pub fn trend(&self) -> Option<Trend> {
        Trend::from_change(self.detail.price_change_24h())
    }

    /// "▲", "▼" ou "" selon la variation sur 24h
    pub fn price_change_indicator(&self) -> &'static str {
        self.trend().map(|t| t.symbol()).unwrap_or("")
    }
}

#[derive(Debug, Clone)]
pub struct CoinService {
    client: CoinGeckoClient,
    favourites: FavouritesStore,
    cache: CoinCache,
}

impl CoinService {
    pub fn new(client: CoinGeckoClient, favourites: FavouritesStore, cache: CoinCache) -> Self {
        Self {
            client,
            favourites,
            cache,
        }
    }

    /// Charge la page d'un coin
    ///
    /// Détail obligatoire (réseau, ou cache pour un favori), graphique
    /// optionnel. Le détail d'un favori est rafraîchi dans le cache.
    #[instrument(skip(self))]
    pub async fn open_coin(&self, coin_id: &str, vs: &str, range: ChartRange) -> Result<CoinView> {
        let favourite = self.favourites.is_favourite(coin_id).await?;

        let (detail, from_cache) = match api::fetch_coin(&self.client, coin_id).await {
            Ok(detail) => {
                if favourite {
                    // Le détail est déjà là : un cache en échec ne bloque pas la page
                    if let Err(e) = self.cache.put(coin_id, &detail).await {
                        warn!(error = ?e, "Could not refresh cached favourite detail");
                    }
                }
                (detail, false)
            }
            Err(e) => {
                let cached = if favourite {
                    self.cache.get(coin_id).await.unwrap_or_else(|cache_err| {
                        warn!(error = ?cache_err, "Coin cache unreadable");
                        None
                    })
                } else {
                    None
                };
                match cached {
                    Some(detail) => {
                        warn!(error = %e, "Network failed, using cached coin detail");
                        (detail, true)
                    }
                    None => return Err(e),
                }
            }
        };

        let chart = if from_cache {
            None
        } else {
            match self.load_chart(coin_id, vs, range).await {
                Ok(chart) => Some(chart),
                Err(e) => {
                    warn!(error = %e, "Market chart unavailable");
                    None
                }
            }
        };

        Ok(CoinView {
            coin_id: coin_id.to_string(),
            detail,
            chart,
            range,
            quote_currency: vs.to_string(),
            favourite,
            from_cache,
        })
    }

    /// Graphique seul (changement de période)
    pub async fn load_chart(&self, coin_id: &str, vs: &str, range: ChartRange) -> Result<MarketChart> {
        api::get_market_chart(&self.client, coin_id, vs, range.to_days()).await
    }

    /// Chandelles OHLC pour la vue en chandeliers
    pub async fn load_candles(&self, coin_id: &str, vs: &str, range: ChartRange) -> Result<Vec<Candle>> {
        api::get_ohlc(&self.client, coin_id, vs, range.ohlc_days()).await
    }

    /// Ajoute ou retire des favoris, retourne le nouvel état
    ///
    /// L'ajout est refusé au-delà de `max_favourites`.
    #[instrument(skip(self))]
    pub async fn toggle_favourite(&self, coin_id: &str, max_favourites: u32) -> Result<bool> {
        if self.favourites.is_favourite(coin_id).await? {
            self.favourites.remove(coin_id).await?;
            self.cache.remove(coin_id).await?;
            info!("Coin removed from favourites");
            return Ok(false);
        }

        if self.favourites.count().await? >= max_favourites as usize {
            return Err(GeckoError::FavouritesFull { max: max_favourites }.into());
        }

        self.favourites.add(coin_id).await?;
        if let Err(e) = self.update_favourite_cache(coin_id).await {
            // Le favori est gardé, son détail sera récupéré plus tard
            warn!(error = %e, "Could not cache favourite detail");
        }
        Ok(true)
    }

    /// Rafraîchit le détail en cache d'un favori
    ///
    /// Retourne false (sans appel réseau) si le coin n'est pas favori.
    pub async fn update_favourite_cache(&self, coin_id: &str) -> Result<bool> {
        if !self.favourites.is_favourite(coin_id).await? {
            return Ok(false);
        }
        let detail = api::fetch_coin(&self.client, coin_id).await?;
        self.cache.put(coin_id, &detail).await?;
        Ok(true)
    }

    /// Dernier détail connu d'un favori (None si pas favori)
    pub async fn cached_favourite(&self, coin_id: &str) -> Result<Option<CoinDetail>> {
        if !self.favourites.is_favourite(coin_id).await? {
            return Ok(None);
        }
        self.cache.get(coin_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trend() {
        assert_eq!(Trend::from_change(Some(1.2)), Some(Trend::Up));
        assert_eq!(Trend::from_change(Some(-0.1)), Some(Trend::Down));
        assert_eq!(Trend::from_change(Some(0.0)), None);
        assert_eq!(Trend::from_change(None), None);
    }

    #[test]
    fn test_price_change_indicator() {
        let mut view = CoinView {
            coin_id: "bitcoin".to_string(),
            detail: CoinDetail::default(),
            chart: None,
            range: ChartRange::default(),
            quote_currency: "usd".to_string(),
            favourite: false,
            from_cache: false,
        };
        assert_eq!(view.price_change_indicator(), "");

        view.detail.market_data = Some(crate::models::MarketData {
            price_change_24h: Some(-3.0),
            ..Default::default()
        });
        assert_eq!(view.price_change_indicator(), "▼");
    }
}
