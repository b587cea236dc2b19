// ============================================================================
// API : /api/v3/simple
// ============================================================================

use anyhow::{Context, Result};
use tracing::{info, instrument};

use super::client::CoinGeckoClient;

/// Devises de cotation acceptées par CoinGecko (ex: "usd", "eur", "btc")
#[instrument(skip(client))]
pub async fn fetch_supported_currencies(client: &CoinGeckoClient) -> Result<Vec<String>> {
    let endpoint = CoinGeckoClient::make_endpoint(&["api", "v3", "simple", "supported_vs_currencies"]);
    let uri = client.make_uri(&endpoint, "");

    let currencies: Vec<String> = client
        .fetch_json(&uri)
        .await
        .context("Échec du chargement des devises supportées")?;

    info!(count = currencies.len(), "Supported currencies fetched");
    Ok(currencies)
}
