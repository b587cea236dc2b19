// ============================================================================
// Store SQLite embarqué
// ============================================================================
// Petite surcouche sur sqlx :
// - ouverture d'un fichier .db (créé si absent) ou d'une base en mémoire
// - exécution de SQL brut
// - gestion de tables (create / drop / vidage / comptage)
// - conversion d'objets en BLOB (JSON UTF-8) et inversement
//
// Les noms de tables sont interpolés dans le SQL : ils doivent être des
// identifiants simples ([A-Za-z_][A-Za-z0-9_]*).
// ============================================================================

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info, instrument};

use crate::error::GeckoError;

/// Connexion (pool) vers une base SQLite
///
/// CONCEPT RUST : Clone sur un pool
/// - SqlitePool est un Arc interne, cloner partage les connexions
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Ouvre un fichier SQLite, le crée (avec ses parents) si besoin
    #[instrument]
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Échec de la création de {}", parent.display()))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .with_context(|| format!("Échec de l'ouverture de {}", path.display()))?;

        info!(path = %path.display(), "SQLite database opened");
        Ok(Self { pool })
    }

    /// Base en mémoire (tests, mode sans disque)
    ///
    /// Une seule connexion gardée ouverte : chaque connexion ":memory:"
    /// aurait sinon sa propre base vide.
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new().in_memory(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await
            .context("Échec de l'ouverture de la base en mémoire")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Exécute du SQL sans résultat, retourne le nombre de lignes touchées
    pub async fn execute(&self, sql: &str) -> Result<u64> {
        debug!(sql = %sql, "Executing SQL");
        let result = sqlx::query(sql)
            .execute(&self.pool)
            .await
            .context("Échec de l'exécution SQL")?;
        Ok(result.rows_affected())
    }

    /// CREATE TABLE IF NOT EXISTS name (col1, col2, ...)
    pub async fn create_table(&self, name: &str, columns: &[&str]) -> Result<()> {
        let name = validate_identifier(name)?;
        let sql = format!("CREATE TABLE IF NOT EXISTS {} ({})", name, columns.join(", "));
        self.execute(&sql).await?;
        Ok(())
    }

    /// DROP TABLE IF EXISTS name
    pub async fn delete_table(&self, name: &str) -> Result<()> {
        let name = validate_identifier(name)?;
        self.execute(&format!("DROP TABLE IF EXISTS {}", name)).await?;
        Ok(())
    }

    /// Vide une table, retourne le nombre de lignes supprimées
    pub async fn remove_all_rows(&self, name: &str) -> Result<u64> {
        let name = validate_identifier(name)?;
        self.execute(&format!("DELETE FROM {}", name)).await
    }

    pub async fn row_count(&self, name: &str) -> Result<i64> {
        let name = validate_identifier(name)?;
        let sql = format!("SELECT COUNT(*) FROM {}", name);
        let count: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Échec du comptage de {}", name))?;
        Ok(count)
    }

    pub async fn table_exists(&self, name: &str) -> Result<bool> {
        let found: Option<String> =
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }
}

/// Vérifie qu'un nom peut être interpolé tel quel dans du SQL
pub fn validate_identifier(name: &str) -> Result<&str, GeckoError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);

    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(name)
    } else {
        Err(GeckoError::InvalidIdentifier(name.to_string()))
    }
}

/// Objet -> BLOB (JSON encodé en UTF-8)
pub fn to_blob<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).context("Échec de la sérialisation en BLOB")
}

/// BLOB -> objet
pub fn from_blob<T: DeserializeOwned>(blob: &[u8]) -> Result<T> {
    serde_json::from_slice(blob).context("BLOB JSON invalide")
}

// ============================================================================
// Tests unitaires
// ============================================================================
