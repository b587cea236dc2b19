// ============================================================================
// Favoris (SQLite)
// ============================================================================
// Table :
//   favourites (
//     id        TEXT PRIMARY KEY NOT NULL UNIQUE,
//     favourite INTEGER NOT NULL CHECK (favourite IN (0, 1))
//   )
// ============================================================================

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use super::sqlite::SqliteStore;
use crate::models::FavouriteCoin;

const TABLE: &str = "favourites";

#[derive(Debug, Clone)]
pub struct FavouritesStore {
    db: SqliteStore,
}

impl FavouritesStore {
    /// Prépare la table si elle n'existe pas
    pub async fn new(db: SqliteStore) -> Result<Self> {
        db.create_table(
            TABLE,
            &[
                "id TEXT PRIMARY KEY NOT NULL UNIQUE",
                "favourite INTEGER NOT NULL CHECK (favourite IN (0, 1))",
            ],
        )
        .await
        .context("Échec de la création de la table des favoris")?;

        Ok(Self { db })
    }

    pub async fn is_favourite(&self, coin_id: &str) -> Result<bool> {
        let flag: Option<i64> = sqlx::query_scalar("SELECT favourite FROM favourites WHERE id = ?")
            .bind(coin_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(flag == Some(1))
    }

    /// Marque un coin comme favori (upsert)
    #[instrument(skip(self))]
    pub async fn add(&self, coin_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO favourites (id, favourite)
            VALUES (?, 1)
            ON CONFLICT(id) DO UPDATE SET favourite = 1
            "#,
        )
        .bind(coin_id)
        .execute(self.db.pool())
        .await
        .with_context(|| format!("Échec de l'ajout de {} aux favoris", coin_id))?;

        info!("Coin added to favourites");
        Ok(())
    }

    /// Retire un favori, retourne false s'il n'y était pas
    #[instrument(skip(self))]
    pub async fn remove(&self, coin_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM favourites WHERE id = ?")
            .bind(coin_id)
            .execute(self.db.pool())
            .await
            .with_context(|| format!("Échec de la suppression de {} des favoris", coin_id))?;

        let removed = result.rows_affected() > 0;
        debug!(removed, "Favourite removal done");
        Ok(removed)
    }

    /// Tous les favoris, dans l'ordre d'ajout
    pub async fn list(&self) -> Result<Vec<FavouriteCoin>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT id, favourite FROM favourites WHERE favourite = 1 ORDER BY rowid",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, flag)| FavouriteCoin {
                id,
                favourite: flag == 1,
            })
            .collect())
    }

    pub async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM favourites WHERE favourite = 1")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> FavouritesStore {
        FavouritesStore::new(SqliteStore::open_in_memory().await.unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let favourites = store().await;

        favourites.add("bitcoin").await.unwrap();
        favourites.add("bitcoin").await.unwrap();

        assert!(favourites.is_favourite("bitcoin").await.unwrap());
        assert_eq!(favourites.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let favourites = store().await;
        favourites.add("ethereum").await.unwrap();

        assert!(favourites.remove("ethereum").await.unwrap());
        assert!(!favourites.remove("ethereum").await.unwrap());
        assert!(!favourites.is_favourite("ethereum").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order() {
        let favourites = store().await;
        for id in ["solana", "bitcoin", "cardano"] {
            favourites.add(id).await.unwrap();
        }

        let ids: Vec<String> = favourites.list().await.unwrap().into_iter().map(|f| f.id).collect();
        assert_eq!(ids, vec!["solana", "bitcoin", "cardano"]);
    }
}
