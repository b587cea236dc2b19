// ============================================================================
// Tests d'intégration : client et endpoints CoinGecko
// ============================================================================

mod common;

use common::{coin_json, market_chart_json, ticker_json, tickers_page_json, MockServer, Route};
use lazygecko::api::{self, CoinGeckoClient};
use lazygecko::error::{user_message, GeckoError};
use lazygecko::models::ExchangeTickers;

#[tokio::test]
async fn test_rate_limit_is_typed() {
    let server = MockServer::start(vec![Route::status("/coins/bitcoin", 429)]).await;
    let client = CoinGeckoClient::new(server.root.clone()).unwrap();

    let err = api::fetch_coin(&client, "bitcoin").await.unwrap_err();
    assert_eq!(GeckoError::find(&err), Some(&GeckoError::TooManyRequests));
    assert_eq!(user_message(&err), "Too many requests, please wait a few seconds");
}

#[tokio::test]
async fn test_server_error_is_typed() {
    let server = MockServer::start(vec![Route::status("/coins/bitcoin", 500)]).await;
    let client = CoinGeckoClient::new(server.root.clone()).unwrap();

    let err = api::fetch_coin(&client, "bitcoin").await.unwrap_err();
    assert_eq!(GeckoError::find(&err), Some(&GeckoError::HttpStatus { status: 500 }));
}

#[tokio::test]
async fn test_fetch_coin_sends_expected_query() {
    let server = MockServer::start(vec![Route::json("/api/v3/coins/bitcoin", coin_json("bitcoin", "Bitcoin", 70_000.0))]).await;
    let client = CoinGeckoClient::new(server.root.clone()).unwrap();

    let detail = api::fetch_coin(&client, "bitcoin").await.unwrap();
    assert_eq!(detail.name, "Bitcoin");

    let requests = server.requests();
    assert_eq!(
        requests,
        vec!["/api/v3/coins/bitcoin?tickers=true&market_data=true&community_data=true&developer_data=true&sparkline=true"]
    );
}

#[tokio::test]
async fn test_optional_json_missing_page() {
    let server = MockServer::start(vec![
        Route::json("page=1&", serde_json::Value::Null),
        Route::status("page=2&", 404),
    ])
    .await;
    let client = CoinGeckoClient::new(server.root.clone()).unwrap();

    assert!(api::fetch_exchange_tickers(&client, "binance", 1).await.unwrap().is_none());
    assert!(api::fetch_exchange_tickers(&client, "binance", 2).await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_coin_ids_walks_pages() {
    let server = MockServer::start(vec![
        Route::json(
            "/exchanges/binance/tickers?include_exchange_logo=true&page=1&",
            tickers_page_json(
                "Binance",
                vec![
                    ticker_json("BTC", "bitcoin", 70_000.0),
                    ticker_json("BTC", "bitcoin", 70_010.0),
                    ticker_json("ETH", "ethereum", 3_500.0),
                ],
            ),
        ),
        Route::json(
            "/exchanges/binance/tickers?include_exchange_logo=true&page=2&",
            tickers_page_json("Binance", vec![ticker_json("SOL", "solana", 180.0)]),
        ),
        Route::json(
            "/exchanges/binance/tickers?include_exchange_logo=true&page=3&",
            tickers_page_json("Binance", vec![]),
        ),
    ])
    .await;
    let client = CoinGeckoClient::new(server.root.clone()).unwrap();

    let ids = api::get_coin_ids(&client, "binance").await.unwrap();
    assert_eq!(ids, vec!["bitcoin", "ethereum", "solana"]);
    assert_eq!(server.hits("/exchanges/binance/tickers"), 3);
}

#[tokio::test]
async fn test_tickers_page_parsing() {
    let server = MockServer::start(vec![Route::json(
        "/exchanges/kraken/tickers",
        tickers_page_json("Kraken", vec![ticker_json("BTC", "bitcoin", 70_000.0)]),
    )])
    .await;
    let client = CoinGeckoClient::new(server.root.clone()).unwrap();

    let page: ExchangeTickers = api::fetch_exchange_tickers(&client, "kraken", 1).await.unwrap().unwrap();
    assert_eq!(page.name, "Kraken");

    let tickers = page.tickers.unwrap();
    assert_eq!(tickers.len(), 1);
    assert_eq!(tickers[0].pair(), "BTC/USDT");
    assert_eq!(tickers[0].converted_last_in("usd"), Some(70_000.0));
}

#[tokio::test]
async fn test_market_chart() {
    let server = MockServer::start(vec![Route::json("/coins/bitcoin/market_chart", market_chart_json())]).await;
    let client = CoinGeckoClient::new(server.root.clone()).unwrap();

    let chart = api::get_market_chart(&client, "bitcoin", "usd", 7).await.unwrap();
    assert_eq!(chart.price_points().len(), 2);
    assert_eq!(chart.price_bounds(), Some((69_000.0, 70_500.0)));
    assert_eq!(
        server.requests(),
        vec!["/api/v3/coins/bitcoin/market_chart?vs_currency=usd&days=7&precision=full"]
    );
}

#[tokio::test]
async fn test_market_chart_days_rejected_without_request() {
    let server = MockServer::start(vec![Route::json("/coins/bitcoin/market_chart", market_chart_json())]).await;
    let client = CoinGeckoClient::new(server.root.clone()).unwrap();

    let err = api::get_market_chart(&client, "bitcoin", "usd", 365).await.unwrap_err();
    assert_eq!(
        GeckoError::find(&err),
        Some(&GeckoError::DaysOutOfRange { days: 365, max: 365 })
    );
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_ohlc_sorted() {
    let server = MockServer::start(vec![Route::json(
        "/coins/bitcoin/ohlc",
        serde_json::json!([
            [1_712_016_000_000.0, 70_000.0, 71_000.0, 69_500.0, 70_500.0],
            [1_711_929_600_000.0, 69_000.0, 70_200.0, 68_800.0, 70_000.0]
        ]),
    )])
    .await;
    let client = CoinGeckoClient::new(server.root.clone()).unwrap();

    let candles = api::get_ohlc(&client, "bitcoin", "usd", 14).await.unwrap();
    assert_eq!(candles.len(), 2);
    assert!(candles[0].time < candles[1].time);
    assert_eq!(candles[0].open, 69_000.0);
}

#[tokio::test]
async fn test_supported_currencies_and_exchange_ids() {
    let server = MockServer::start(vec![
        Route::json("/simple/supported_vs_currencies", serde_json::json!(["usd", "eur", "btc"])),
        Route::json(
            "/exchanges/list",
            serde_json::json!([{ "id": "binance", "name": "Binance" }, { "id": "kraken", "name": "Kraken" }]),
        ),
    ])
    .await;
    let client = CoinGeckoClient::new(server.root.clone()).unwrap();

    let currencies = api::fetch_supported_currencies(&client).await.unwrap();
    assert_eq!(currencies, vec!["usd", "eur", "btc"]);

    let ids = api::get_exchange_ids(&client).await.unwrap();
    assert_eq!(ids, vec!["binance", "kraken"]);
}

#[tokio::test]
async fn test_fetch_text() {
    let server = MockServer::start(vec![
        Route::json("/api/v3/ping", serde_json::json!({ "gecko_says": "(V3) To the Moon!" })),
        Route::status("/api/v3/limited", 429),
    ])
    .await;
    let client = CoinGeckoClient::new(server.root.clone()).unwrap();

    let body = client.fetch_text(&client.make_uri("/api/v3/ping", "")).await.unwrap();
    let json: serde_json::Value = serde_json::from_str(&body.unwrap()).unwrap();
    assert_eq!(json["gecko_says"], "(V3) To the Moon!");

    // Statut non-succès (429 compris) : None, pas d'erreur
    assert_eq!(client.fetch_text(&client.make_uri("/api/v3/limited", "")).await.unwrap(), None);
    assert_eq!(client.fetch_text(&client.make_uri("/api/v3/missing", "")).await.unwrap(), None);

    assert_eq!(server.hits("/api/v3/ping"), 1);
    assert_eq!(server.hits("/api/v3/limited"), 1);
    assert_eq!(server.hits("/api/v3/missing"), 1);
}
