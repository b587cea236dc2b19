// ============================================================================
// API : /api/v3/coins
// ============================================================================
// - /coins/{id}                 : détail complet (tickers, market data...)
// - /coins/{id}/market_chart    : séries prix / market cap / volume
// - /coins/{id}/ohlc            : chandelles
// - /coins/list                 : liste de tous les coins
//
// L'API gratuite limite l'historique à moins de 365 jours : la limite est
// vérifiée AVANT d'envoyer la requête.
// ============================================================================

use anyhow::{Context, Result};
use tracing::{info, instrument};

use super::client::CoinGeckoClient;
use crate::models::market_chart::{candles_from_rows, check_days};
use crate::models::{Candle, CoinDetail, CoinListEntry, MarketChart, MarketChartResponse};

fn coins_endpoint(segments: &[&str]) -> String {
    let mut all = vec!["api", "v3", "coins"];
    all.extend_from_slice(segments);
    CoinGeckoClient::make_endpoint(&all)
}

/// Détail complet d'un coin
#[instrument(skip(client))]
pub async fn fetch_coin(client: &CoinGeckoClient, coin_id: &str) -> Result<CoinDetail> {
    let query = CoinGeckoClient::make_query(&[
        ("tickers", "true"),
        ("market_data", "true"),
        ("community_data", "true"),
        ("developer_data", "true"),
        ("sparkline", "true"),
    ]);
    let uri = client.make_uri(&coins_endpoint(&[coin_id]), &query);

    let detail: CoinDetail = client
        .fetch_json(&uri)
        .await
        .with_context(|| format!("Échec du chargement du coin {}", coin_id))?;

    info!(name = %detail.name, "Coin detail fetched");
    Ok(detail)
}

/// Market chart brut (paires [timestamp_ms, valeur])
#[instrument(skip(client))]
pub async fn fetch_market_chart(
    client: &CoinGeckoClient,
    coin_id: &str,
    vs_currency: &str,
    days: u32,
) -> Result<MarketChartResponse> {
    check_days(days)?;

    let days = days.to_string();
    let query = CoinGeckoClient::make_query(&[
        ("vs_currency", vs_currency),
        ("days", &days),
        ("precision", "full"),
    ]);
    let uri = client.make_uri(&coins_endpoint(&[coin_id, "market_chart"]), &query);

    client
        .fetch_json(&uri)
        .await
        .with_context(|| format!("Échec du chargement du market chart de {}", coin_id))
}

/// Market chart nettoyé (ChartPoint avec DateTime)
pub async fn get_market_chart(
    client: &CoinGeckoClient,
    coin_id: &str,
    vs_currency: &str,
    days: u32,
) -> Result<MarketChart> {
    let raw = fetch_market_chart(client, coin_id, vs_currency, days).await?;
    let chart = MarketChart::from_response(&raw)?;
    info!(coin = %coin_id, points = chart.price_points().len(), "Market chart loaded");
    Ok(chart)
}

/// Lignes OHLC brutes [timestamp_ms, open, high, low, close]
#[instrument(skip(client))]
pub async fn fetch_ohlc(
    client: &CoinGeckoClient,
    coin_id: &str,
    vs_currency: &str,
    days: u32,
) -> Result<Vec<Vec<f64>>> {
    check_days(days)?;

    let days = days.to_string();
    let query = CoinGeckoClient::make_query(&[
        ("vs_currency", vs_currency),
        ("days", &days),
        ("precision", "full"),
    ]);
    let uri = client.make_uri(&coins_endpoint(&[coin_id, "ohlc"]), &query);

    client
        .fetch_json(&uri)
        .await
        .with_context(|| format!("Échec du chargement des OHLC de {}", coin_id))
}

/// Chandelles triées par date croissante
pub async fn get_ohlc(
    client: &CoinGeckoClient,
    coin_id: &str,
    vs_currency: &str,
    days: u32,
) -> Result<Vec<Candle>> {
    let rows = fetch_ohlc(client, coin_id, vs_currency, days).await?;
    Ok(candles_from_rows(&rows)?)
}

/// Liste de tous les coins (avec leurs plateformes)
#[instrument(skip(client))]
pub async fn fetch_coins_list(client: &CoinGeckoClient) -> Result<Vec<CoinListEntry>> {
    let query = CoinGeckoClient::make_query(&[("include_platform", "true")]);
    let uri = client.make_uri(&coins_endpoint(&["list"]), &query);

    client
        .fetch_json(&uri)
        .await
        .context("Échec du chargement de la liste des coins")
}
