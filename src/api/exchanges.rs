// ============================================================================
// API : /api/v3/exchanges
// ============================================================================

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use super::client::CoinGeckoClient;
use crate::models::{ExchangeDetail, ExchangeListEntry, ExchangeTickers};

/// Petite pause entre deux pages (l'API publique limite le débit)
const PAGE_DELAY: Duration = Duration::from_millis(250);

fn exchanges_endpoint(segments: &[&str]) -> String {
    let mut all = vec!["api", "v3", "exchanges"];
    all.extend_from_slice(segments);
    CoinGeckoClient::make_endpoint(&all)
}

/// Détail d'un exchange (nom, pays, trust score, top tickers...)
#[instrument(skip(client))]
pub async fn fetch_exchange(client: &CoinGeckoClient, exchange_id: &str) -> Result<ExchangeDetail> {
    let uri = client.make_uri(&exchanges_endpoint(&[exchange_id]), "");
    client
        .fetch_json(&uri)
        .await
        .with_context(|| format!("Échec du chargement de l'exchange {}", exchange_id))
}

/// Une page de tickers, triée par trust score
///
/// None quand la page n'existe pas (404 ou corps `null`)
#[instrument(skip(client))]
pub async fn fetch_exchange_tickers(
    client: &CoinGeckoClient,
    exchange_id: &str,
    page: u32,
) -> Result<Option<ExchangeTickers>> {
    let page = page.to_string();
    let query = CoinGeckoClient::make_query(&[
        ("include_exchange_logo", "true"),
        ("page", &page),
        ("depth", "true"),
        ("order", "trust_score_desc"),
    ]);
    let uri = client.make_uri(&exchanges_endpoint(&[exchange_id, "tickers"]), &query);

    client
        .fetch_optional_json(&uri)
        .await
        .with_context(|| format!("Échec du chargement des tickers de {}", exchange_id))
}

/// Tous les coin ids cotés sur un exchange
///
/// Parcourt les pages à partir de 1 jusqu'à une page absente ou vide.
/// Les doublons sont retirés page par page, l'ordre est conservé.
#[instrument(skip(client))]
pub async fn get_coin_ids(client: &CoinGeckoClient, exchange_id: &str) -> Result<Vec<String>> {
    let mut coin_ids = Vec::new();
    let mut page = 1;

    loop {
        let tickers = match fetch_exchange_tickers(client, exchange_id, page).await? {
            Some(ExchangeTickers {
                tickers: Some(tickers),
                ..
            }) if !tickers.is_empty() => tickers,
            _ => break,
        };

        // CONCEPT RUST : HashSet::insert retourne false si déjà présent
        let mut seen = HashSet::new();
        let page_ids: Vec<String> = tickers
            .into_iter()
            .filter_map(|t| t.coin_id)
            .filter(|id| seen.insert(id.clone()))
            .collect();

        debug!(page, count = page_ids.len(), "Collected coin ids from page");
        coin_ids.extend(page_ids);

        page += 1;
        tokio::time::sleep(PAGE_DELAY).await;
    }

    info!(pages = page - 1, total = coin_ids.len(), "Coin ids collected");
    Ok(coin_ids)
}

/// Liste de tous les exchanges (id + nom)
#[instrument(skip(client))]
pub async fn fetch_exchanges_list(client: &CoinGeckoClient) -> Result<Vec<ExchangeListEntry>> {
    let uri = client.make_uri(&exchanges_endpoint(&["list"]), "");
    client
        .fetch_json(&uri)
        .await
        .context("Échec du chargement de la liste des exchanges")
}

/// Ids de tous les exchanges
pub async fn get_exchange_ids(client: &CoinGeckoClient) -> Result<Vec<String>> {
    let list = fetch_exchanges_list(client).await?;
    Ok(list.into_iter().map(|e| e.id).collect())
}
