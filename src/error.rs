// ============================================================================
// Erreurs typées
// ============================================================================
// La plupart des fonctions retournent anyhow::Result avec du contexte.
// GeckoError couvre les cas que l'appelant doit pouvoir distinguer
// (ex: afficher "trop de requêtes" au lieu d'une erreur générique).
//
// CONCEPT RUST : downcast
// - anyhow::Error peut contenir n'importe quelle erreur
// - err.downcast_ref::<GeckoError>() retrouve le type d'origine
// ============================================================================

use thiserror::Error;

/// Erreurs métier de LazyGecko
#[derive(Debug, Error, PartialEq)]
pub enum GeckoError {
    /// L'API gratuite limite l'historique à moins de 365 jours
    #[error("Historical data must be less than {max} days (got {days})")]
    DaysOutOfRange { days: u32, max: u32 },

    /// Un point de série n'a pas le bon nombre d'éléments
    #[error("Series point must contain exactly {expected} elements (got {got})")]
    InvalidSeriesPoint { expected: usize, got: usize },

    /// Timestamp hors de la plage représentable
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(f64),

    /// HTTP 429 : l'API publique limite le débit
    #[error("Too many requests, please wait a few seconds")]
    TooManyRequests,

    /// Tout autre statut HTTP non-succès
    #[error("CoinGecko returned HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("Key already exists: {0}")]
    KeyExists(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// Nom de table SQL invalide (seuls [A-Za-z0-9_] sont acceptés)
    #[error("Invalid SQL identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Favourites are full ({max} max)")]
    FavouritesFull { max: u32 },

    #[error("Unsupported quote currency: {0}")]
    UnsupportedCurrency(String),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
}

impl GeckoError {
    /// Retrouve une GeckoError dans une chaîne d'erreurs anyhow
    pub fn find(err: &anyhow::Error) -> Option<&GeckoError> {
        err.chain().find_map(|cause| cause.downcast_ref::<GeckoError>())
    }
}

/// Message court pour la barre de statut
///
/// Une GeckoError est affichée telle quelle, sinon le contexte de plus haut
/// niveau suivi de la cause racine.
pub fn user_message(err: &anyhow::Error) -> String {
    match GeckoError::find(err) {
        Some(gecko) => gecko.to_string(),
        None => match err.chain().last() {
            Some(root) if err.chain().count() > 1 => format!("{}: {}", err, root),
            _ => err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_find_through_context() {
        let result: anyhow::Result<()> =
            Err(GeckoError::TooManyRequests).context("Échec du chargement du coin");
        let err = result.unwrap_err();

        assert_eq!(GeckoError::find(&err), Some(&GeckoError::TooManyRequests));
    }

    #[test]
    fn test_user_message() {
        let result: anyhow::Result<()> =
            Err(GeckoError::TooManyRequests).context("Échec du chargement du coin");
        assert_eq!(user_message(&result.unwrap_err()), "Too many requests, please wait a few seconds");

        let result: anyhow::Result<()> = Err(anyhow::anyhow!("connection refused")).context("Fetch failed");
        assert_eq!(user_message(&result.unwrap_err()), "Fetch failed: connection refused");

        assert_eq!(user_message(&anyhow::anyhow!("boom")), "boom");
    }

    #[test]
    fn test_messages() {
        let err = GeckoError::DaysOutOfRange { days: 400, max: 365 };
        assert_eq!(err.to_string(), "Historical data must be less than 365 days (got 400)");
    }
}
