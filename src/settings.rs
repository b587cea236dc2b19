// ============================================================================
// Réglages utilisateur
// ============================================================================
// Stockés dans <AppData>/Settings/config.json :
//
//   {
//     "user_setting": {
//       "darkmode": false, "quotecurrency": "usd",
//       "maxfavourites": 15, "exchangeid": "binance"
//     },
//     "supported_currencies": ["btc", "eth", "usd", ...]
//   }
//
// Chaque modification est écrite immédiatement sur disque.
// ============================================================================

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::api::{fetch_supported_currencies, CoinGeckoClient};
use crate::error::GeckoError;
use crate::storage::JsonItemStore;

const USER_SETTING_KEY: &str = "user_setting";
const SUPPORTED_CURRENCIES_KEY: &str = "supported_currencies";

/// Bornes acceptées pour le nombre de favoris
pub const MAX_FAVOURITES_RANGE: std::ops::RangeInclusive<u32> = 1..=50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    #[serde(rename = "darkmode")]
    pub dark_mode: bool,
    #[serde(rename = "quotecurrency")]
    pub quote_currency: String,
    #[serde(rename = "maxfavourites")]
    pub max_favourites: u32,
    #[serde(rename = "exchangeid")]
    pub exchange_id: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            dark_mode: false,
            quote_currency: "usd".to_string(),
            max_favourites: 15,
            exchange_id: "binance".to_string(),
        }
    }
}

/// Réglages en mémoire + fichier config.json
#[derive(Debug, Clone)]
pub struct SettingsStore {
    store: JsonItemStore,
    settings: UserSettings,
}

impl SettingsStore {
    /// Charge les réglages, écrit les valeurs par défaut s'il n'y en a pas
    #[instrument(skip(path))]
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let store = JsonItemStore::open(path).await?;

        let settings = match store.get::<UserSettings>(USER_SETTING_KEY).await {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                info!("No user settings found, writing defaults");
                let defaults = UserSettings::default();
                store.replace(USER_SETTING_KEY, &defaults, true).await?;
                defaults
            }
            Err(e) => {
                warn!(error = ?e, "Unreadable user settings, resetting to defaults");
                let defaults = UserSettings::default();
                store.replace(USER_SETTING_KEY, &defaults, true).await?;
                defaults
            }
        };

        Ok(Self { store, settings })
    }

    pub fn settings(&self) -> &UserSettings {
        &self.settings
    }

    pub async fn save(&self) -> Result<()> {
        self.write(&self.settings).await
    }

    async fn write(&self, settings: &UserSettings) -> Result<()> {
        self.store
            .replace(USER_SETTING_KEY, settings, true)
            .await
            .context("Échec de l'écriture des réglages")
    }

    /// Écrit puis adopte les nouveaux réglages
    ///
    /// En cas d'échec, la version en mémoire reste celle du disque.
    async fn commit(&mut self, settings: UserSettings) -> Result<()> {
        self.write(&settings).await?;
        self.settings = settings;
        Ok(())
    }

    /// Revient aux valeurs par défaut
    pub async fn reset(&mut self) -> Result<()> {
        self.commit(UserSettings::default()).await
    }

    /// Inverse le mode sombre, retourne la nouvelle valeur
    pub async fn switch_dark_mode(&mut self) -> Result<bool> {
        let dark_mode = !self.settings.dark_mode;
        self.commit(UserSettings {
            dark_mode,
            ..self.settings.clone()
        })
        .await?;
        Ok(dark_mode)
    }

    /// Change la devise de cotation
    ///
    /// Vérifiée contre la liste des devises supportées quand elle est en
    /// cache. Stockée en minuscules.
    pub async fn change_quote_currency(&mut self, currency: &str) -> Result<()> {
        let currency = currency.trim().to_lowercase();
        if currency.is_empty() {
            return Err(GeckoError::InvalidSetting("quote currency cannot be empty".to_string()).into());
        }

        let supported = self.read_supported_currencies().await?;
        if !supported.is_empty() && !supported.iter().any(|c| c.eq_ignore_ascii_case(&currency)) {
            return Err(GeckoError::UnsupportedCurrency(currency).into());
        }

        self.commit(UserSettings {
            quote_currency: currency.clone(),
            ..self.settings.clone()
        })
        .await?;
        info!(currency = %currency, "Quote currency changed");
        Ok(())
    }

    pub async fn change_exchange_id(&mut self, exchange_id: &str) -> Result<()> {
        let exchange_id = exchange_id.trim().to_lowercase();
        let valid = !exchange_id.is_empty()
            && exchange_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(GeckoError::InvalidSetting(format!("invalid exchange id: {:?}", exchange_id)).into());
        }

        self.commit(UserSettings {
            exchange_id: exchange_id.clone(),
            ..self.settings.clone()
        })
        .await?;
        info!(exchange = %exchange_id, "Exchange changed");
        Ok(())
    }

    pub async fn change_max_favourites(&mut self, max: u32) -> Result<()> {
        if !MAX_FAVOURITES_RANGE.contains(&max) {
            return Err(GeckoError::InvalidSetting(format!(
                "max favourites must be between {} and {}",
                MAX_FAVOURITES_RANGE.start(),
                MAX_FAVOURITES_RANGE.end()
            ))
            .into());
        }

        self.commit(UserSettings {
            max_favourites: max,
            ..self.settings.clone()
        })
        .await
    }

    pub async fn write_supported_currencies(&self, currencies: &[String]) -> Result<()> {
        self.store
            .replace(SUPPORTED_CURRENCIES_KEY, &currencies, true)
            .await
    }

    /// Devises en cache (vide si jamais rafraîchies)
    pub async fn read_supported_currencies(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .get::<Vec<String>>(SUPPORTED_CURRENCIES_KEY)
            .await?
            .unwrap_or_default())
    }
}

/// Récupère les devises supportées et les met en cache
pub async fn refresh_supported_currencies(
    client: &CoinGeckoClient,
    settings: &SettingsStore,
) -> Result<Vec<String>> {
    let currencies = fetch_supported_currencies(client).await?;
    settings.write_supported_currencies(&currencies).await?;
    Ok(currencies)
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    async fn load(tmp: &tempfile::TempDir) -> SettingsStore {
        SettingsStore::load(tmp.path().join("Settings/config.json")).await.unwrap()
    }

    #[tokio::test]
    async fn test_defaults_written_on_first_load() {
        let tmp = tempfile::tempdir().unwrap();
        let store = load(&tmp).await;
        assert_eq!(store.settings(), &UserSettings::default());

        let raw = std::fs::read_to_string(tmp.path().join("Settings/config.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["user_setting"]["quotecurrency"], "usd");
        assert_eq!(json["user_setting"]["maxfavourites"], 15);
        assert_eq!(json["user_setting"]["exchangeid"], "binance");
        assert_eq!(json["user_setting"]["darkmode"], false);
    }

    #[tokio::test]
    async fn test_changes_persist() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = load(&tmp).await;

        assert!(store.switch_dark_mode().await.unwrap());
        store.change_exchange_id(" Kraken ").await.unwrap();
        store.change_max_favourites(20).await.unwrap();

        let reloaded = load(&tmp).await;
        assert!(reloaded.settings().dark_mode);
        assert_eq!(reloaded.settings().exchange_id, "kraken");
        assert_eq!(reloaded.settings().max_favourites, 20);

        let mut reloaded = reloaded;
        reloaded.reset().await.unwrap();
        assert_eq!(load(&tmp).await.settings(), &UserSettings::default());
    }

    #[tokio::test]
    async fn test_quote_currency_validation() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = load(&tmp).await;

        // Pas de liste en cache : tout est accepté
        store.change_quote_currency("EUR").await.unwrap();
        assert_eq!(store.settings().quote_currency, "eur");

        store
            .write_supported_currencies(&["usd".to_string(), "btc".to_string()])
            .await
            .unwrap();
        let err = store.change_quote_currency("eur").await.unwrap_err();
        assert_eq!(GeckoError::find(&err), Some(&GeckoError::UnsupportedCurrency("eur".to_string())));

        store.change_quote_currency("BTC").await.unwrap();
        assert_eq!(store.settings().quote_currency, "btc");
        assert_eq!(store.read_supported_currencies().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_values_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = load(&tmp).await;

        assert!(store.change_max_favourites(0).await.is_err());
        assert!(store.change_max_favourites(51).await.is_err());
        assert!(store.change_exchange_id("bad id").await.is_err());
        assert!(store.change_quote_currency("  ").await.is_err());
        assert_eq!(store.settings(), &UserSettings::default());
    }

    #[tokio::test]
    async fn test_partial_record_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{"user_setting":{"darkmode":true}}"#).unwrap();

        let store = SettingsStore::load(&path).await.unwrap();
        assert!(store.settings().dark_mode);
        assert_eq!(store.settings().quote_currency, "usd");
    }

    #[tokio::test]
    async fn test_truncated_file_resets_to_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{"user_setting":{"darkmode":tr"#).unwrap();

        let store = SettingsStore::load(&path).await.unwrap();
        assert_eq!(store.settings(), &UserSettings::default());

        // Le fichier est réécrit proprement
        let raw = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["user_setting"]["exchangeid"], "binance");
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        let mut store = SettingsStore::load(&path).await.unwrap();

        // Un répertoire à la place du fichier : lecture et écriture échouent
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(store.switch_dark_mode().await.is_err());
        assert!(store.change_exchange_id("kraken").await.is_err());
        assert!(store.change_max_favourites(20).await.is_err());
        assert!(store.reset().await.is_err());
        assert_eq!(store.settings(), &UserSettings::default());

        // Disque réparé : seule la nouvelle modification est écrite
        std::fs::remove_dir(&path).unwrap();
        store.change_quote_currency("eur").await.unwrap();

        let reloaded = SettingsStore::load(&path).await.unwrap();
        assert!(!reloaded.settings().dark_mode);
        assert_eq!(reloaded.settings().exchange_id, "binance");
        assert_eq!(reloaded.settings().quote_currency, "eur");
    }
}
