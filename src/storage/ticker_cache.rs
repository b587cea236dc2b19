// ============================================================================
// Cache des tickers d'exchange
// ============================================================================
// Cache "read-through" : on lit le cache, on va sur le réseau seulement s'il
// est vide, et chaque rafraîchissement écrase tout. Pas d'expiration, pas
// d'éviction.
//
// Deux backends au choix (--cache-backend) :
// - Json   : Databases/exchange_tickers.json, clé = id de l'exchange
// - Sqlite : table exchange_tickers, la liste stockée en BLOB JSON
//
// CONCEPT RUST : enum plutôt que trait object
// - Deux variantes connues à la compilation
// - Un match par opération, pas de Box<dyn ...> ni d'async trait
// ============================================================================

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::Row;
use tracing::{debug, info, instrument};

use super::json_store::JsonItemStore;
use super::sqlite::{from_blob, to_blob, SqliteStore};
use crate::models::ExchangeTicker;

const TABLE: &str = "exchange_tickers";

/// Backend choisi en ligne de commande (--cache-backend json|sqlite)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CacheBackend {
    #[default]
    Json,
    Sqlite,
}

impl CacheBackend {
    pub fn label(&self) -> &'static str {
        match self {
            CacheBackend::Json => "json",
            CacheBackend::Sqlite => "sqlite",
        }
    }
}

#[derive(Debug, Clone)]
pub enum TickerCache {
    Json(JsonItemStore),
    Sqlite(SqliteStore),
}

impl TickerCache {
    pub async fn open_json(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(TickerCache::Json(JsonItemStore::open(path).await?))
    }

    /// Prépare la table exchange_tickers
    pub async fn open_sqlite(db: SqliteStore) -> Result<Self> {
        db.create_table(
            TABLE,
            &[
                "exchange_id TEXT PRIMARY KEY",
                "tickers BLOB NOT NULL",
                "updated_at TEXT NOT NULL",
            ],
        )
        .await
        .context("Échec de la création de la table des tickers")?;
        Ok(TickerCache::Sqlite(db))
    }

    pub fn backend(&self) -> CacheBackend {
        match self {
            TickerCache::Json(_) => CacheBackend::Json,
            TickerCache::Sqlite(_) => CacheBackend::Sqlite,
        }
    }

    /// Tickers en cache pour un exchange (vide si rien)
    #[instrument(skip(self), fields(backend = self.backend().label()))]
    pub async fn load(&self, exchange_id: &str) -> Result<Vec<ExchangeTicker>> {
        let tickers = match self {
            TickerCache::Json(store) => store
                .get::<Vec<ExchangeTicker>>(exchange_id)
                .await?
                .unwrap_or_default(),
            TickerCache::Sqlite(db) => {
                let row = sqlx::query("SELECT tickers FROM exchange_tickers WHERE exchange_id = ?")
                    .bind(exchange_id)
                    .fetch_optional(db.pool())
                    .await?;
                match row {
                    Some(row) => {
                        let blob: Vec<u8> = row.get("tickers");
                        from_blob(&blob)?
                    }
                    None => Vec::new(),
                }
            }
        };

        debug!(count = tickers.len(), "Tickers loaded from cache");
        Ok(tickers)
    }

    /// Écrase le cache d'un exchange
    #[instrument(skip(self, tickers), fields(backend = self.backend().label(), count = tickers.len()))]
    pub async fn store(&self, exchange_id: &str, tickers: &[ExchangeTicker]) -> Result<()> {
        match self {
            TickerCache::Json(store) => store.replace(exchange_id, &tickers, true).await?,
            TickerCache::Sqlite(db) => {
                sqlx::query(
                    r#"
                    INSERT INTO exchange_tickers (exchange_id, tickers, updated_at)
                    VALUES (?, ?, ?)
                    ON CONFLICT(exchange_id) DO UPDATE SET
                        tickers = excluded.tickers,
                        updated_at = excluded.updated_at
                    "#,
                )
                .bind(exchange_id)
                .bind(to_blob(&tickers)?)
                .bind(Utc::now().to_rfc3339())
                .execute(db.pool())
                .await
                .context("Échec de l'écriture du cache des tickers")?;
            }
        }

        info!("Ticker cache overwritten");
        Ok(())
    }

    /// Oublie les tickers d'un exchange
    pub async fn clear(&self, exchange_id: &str) -> Result<()> {
        match self {
            TickerCache::Json(store) => {
                store.delete(exchange_id).await?;
            }
            TickerCache::Sqlite(db) => {
                sqlx::query("DELETE FROM exchange_tickers WHERE exchange_id = ?")
                    .bind(exchange_id)
                    .execute(db.pool())
                    .await?;
            }
        }
        Ok(())
    }
}
