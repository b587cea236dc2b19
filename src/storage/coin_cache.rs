// ============================================================================
// Cache des détails de coins
// ============================================================================
// CoinResponses/coin_response.json : clé = id du coin, valeur = CoinDetail.
// Sert à afficher les favoris hors-ligne ou quand l'API limite le débit.
// ============================================================================

use std::path::PathBuf;

use anyhow::Result;

use super::json_store::JsonItemStore;
use crate::models::CoinDetail;

#[derive(Debug, Clone)]
pub struct CoinCache {
    store: JsonItemStore,
}

impl CoinCache {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            store: JsonItemStore::open(path).await?,
        })
    }

    pub async fn get(&self, coin_id: &str) -> Result<Option<CoinDetail>> {
        self.store.get(coin_id).await
    }

    /// Insère ou remplace le détail d'un coin
    pub async fn put(&self, coin_id: &str, detail: &CoinDetail) -> Result<()> {
        self.store.replace(coin_id, detail, true).await
    }

    pub async fn remove(&self, coin_id: &str) -> Result<bool> {
        self.store.delete(coin_id).await
    }
}
