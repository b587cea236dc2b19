// ============================================================================
// Client HTTP CoinGecko
// ============================================================================
// Toutes les requêtes passent par ici :
// 1. construire l'URI (endpoint + query string)
// 2. GET avec reqwest
// 3. vérifier le statut HTTP
// 4. désérialiser le JSON avec serde
//
// CONCEPT RUST : Generics + trait bounds
// - fetch_json<T: DeserializeOwned> marche pour n'importe quelle réponse
// - Le type est choisi par l'appelant : let coin: CoinDetail = ...
// ============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument, warn};

use crate::error::GeckoError;

/// Racine de l'API publique
pub const COINGECKO_ROOT: &str = "https://api.coingecko.com";

const USER_AGENT: &str = concat!("lazygecko/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client partagé par tous les appels API
///
/// CONCEPT RUST : Clone bon marché
/// - reqwest::Client contient un Arc interne
/// - Cloner le client partage le même pool de connexions
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    root: String,
    http: reqwest::Client,
}

impl CoinGeckoClient {
    /// Crée un client pour une racine donnée (ex: un serveur local en test)
    pub fn new(root: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Échec de la création du client HTTP")?;

        Ok(Self {
            root: root.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Assemble des segments de chemin
    ///
    /// ["api", "v3", "coins"] -> "/api/v3/coins"
    pub fn make_endpoint(segments: &[&str]) -> String {
        segments.iter().map(|s| format!("/{}", s)).collect()
    }

    /// Assemble des paires clé/valeur en query string
    ///
    /// [("k1", "v1"), ("k2", "v2")] -> "k1=v1&k2=v2"
    pub fn make_query(pairs: &[(&str, &str)]) -> String {
        pairs
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// URI complète : <root><endpoint>?<query>
    pub fn make_uri(&self, endpoint: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}{}", self.root, endpoint)
        } else {
            format!("{}{}?{}", self.root, endpoint, query)
        }
    }

    /// GET + vérification du statut
    async fn get(&self, uri: &str) -> Result<reqwest::Response> {
        debug!(uri = %uri, "Sending HTTP request to CoinGecko");
        let response = self
            .http
            .get(uri)
            .send()
            .await
            .with_context(|| format!("Échec de la requête HTTP vers {}", uri))?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("CoinGecko rate limit reached");
            return Err(GeckoError::TooManyRequests.into());
        }
        if !status.is_success() {
            error!(status = %status, "CoinGecko returned error status");
            return Err(GeckoError::HttpStatus {
                status: status.as_u16(),
            }
            .into());
        }

        Ok(response)
    }

    /// Récupère et désérialise une réponse JSON
    #[instrument(skip(self))]
    pub async fn fetch_json<T: DeserializeOwned>(&self, uri: &str) -> Result<T> {
        let response = self.get(uri).await?;
        response
            .json::<T>()
            .await
            .context("Échec du parsing JSON de la réponse CoinGecko")
    }

    /// Comme fetch_json, mais un 404 ou un corps `null` donnent None
    #[instrument(skip(self))]
    pub async fn fetch_optional_json<T: DeserializeOwned>(&self, uri: &str) -> Result<Option<T>> {
        match self.fetch_json::<Option<T>>(uri).await {
            Ok(value) => Ok(value),
            Err(e) if GeckoError::find(&e) == Some(&GeckoError::HttpStatus { status: 404 }) => {
                debug!("Resource not found, returning None");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Récupère le corps brut, None si le statut n'est pas un succès
    #[instrument(skip(self))]
    pub async fn fetch_text(&self, uri: &str) -> Result<Option<String>> {
        let response = self
            .http
            .get(uri)
            .send()
            .await
            .with_context(|| format!("Échec de la requête HTTP vers {}", uri))?;

        if !response.status().is_success() {
            debug!(status = %response.status(), "Non-success status, no body returned");
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .context("Échec de la lecture du corps de la réponse")?;
        Ok(Some(body))
    }
}

impl Default for CoinGeckoClient {
    /// Client pointant vers l'API publique
    fn default() -> Self {
        Self::new(COINGECKO_ROOT).unwrap_or_else(|e| {
            warn!(error = ?e, "Falling back to a default HTTP client");
            Self {
                root: COINGECKO_ROOT.to_string(),
                http: reqwest::Client::new(),
            }
        })
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_endpoint() {
        assert_eq!(CoinGeckoClient::make_endpoint(&["api", "v3", "coins"]), "/api/v3/coins");
        assert_eq!(CoinGeckoClient::make_endpoint(&[]), "");
    }

    #[test]
    fn test_make_query() {
        let query = CoinGeckoClient::make_query(&[("k1", "v1"), ("k2", "v2")]);
        assert_eq!(query, "k1=v1&k2=v2");
        assert_eq!(CoinGeckoClient::make_query(&[]), "");
    }

    #[test]
    fn test_make_uri() {
        let client = CoinGeckoClient::new("https://api.coingecko.com/").unwrap();
        assert_eq!(
            client.make_uri("/api/v3/coins/list", "include_platform=true"),
            "https://api.coingecko.com/api/v3/coins/list?include_platform=true"
        );
        assert_eq!(
            client.make_uri("/api/v3/exchanges/list", ""),
            "https://api.coingecko.com/api/v3/exchanges/list"
        );
    }

    #[test]
    fn test_default_root() {
        let client = CoinGeckoClient::default();
        assert_eq!(client.root(), COINGECKO_ROOT);
    }
}
