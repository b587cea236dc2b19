// ============================================================================
// Tests d'intégration : services (API simulée + stockage sur disque)
// ============================================================================

mod common;

use common::{coin_json, market_chart_json, ticker_json, tickers_page_json, MockServer, Route};
use lazygecko::api::CoinGeckoClient;
use lazygecko::error::GeckoError;
use lazygecko::models::{ChartRange, FavouriteEntry};
use lazygecko::services::Services;
use lazygecko::settings::SettingsStore;
use lazygecko::storage::{AppPaths, CacheBackend};
use tempfile::TempDir;

async fn setup(server: &MockServer, backend: CacheBackend) -> (TempDir, AppPaths, Services) {
    let dir = tempfile::tempdir().unwrap();
    let paths = AppPaths::with_root(dir.path());
    paths.init_file_structure().unwrap();

    let client = CoinGeckoClient::new(server.root.clone()).unwrap();
    let services = Services::open(&paths, client, backend).await.unwrap();
    (dir, paths, services)
}

fn coin_routes() -> Vec<Route> {
    vec![
        Route::json("/coins/bitcoin/market_chart", market_chart_json()),
        Route::json("/coins/bitcoin?", coin_json("bitcoin", "Bitcoin", 70_000.0)),
        Route::json("/coins/ethereum/market_chart", market_chart_json()),
        Route::json("/coins/ethereum?", coin_json("ethereum", "Ethereum", 3_500.0)),
    ]
}

fn usd_price(entry: &FavouriteEntry) -> Option<f64> {
    let detail = entry.detail.as_ref()?;
    detail.market_data.as_ref()?.current_price.as_ref()?.get("usd").copied().flatten()
}

// ============================================================================
// Tickers de l'exchange
// ============================================================================

async fn check_ticker_read_through(backend: CacheBackend) {
    let server = MockServer::start(vec![Route::json(
        "/exchanges/binance/tickers",
        tickers_page_json(
            "Binance",
            vec![ticker_json("BTC", "bitcoin", 70_000.0), ticker_json("ETH", "ethereum", 3_500.0)],
        ),
    )])
    .await;
    let (_dir, _paths, services) = setup(&server, backend).await;

    // Cache vide : réseau
    let first = services.exchanges.show_tickers("binance").await.unwrap();
    assert!(!first.from_cache);
    assert_eq!(first.exchange_name.as_deref(), Some("Binance"));
    assert_eq!(first.tickers.len(), 2);
    assert_eq!(server.hits("/tickers"), 1);

    // Cache rempli : pas de requête
    let second = services.exchanges.show_tickers("binance").await.unwrap();
    assert!(second.from_cache);
    assert_eq!(second.tickers, first.tickers);
    assert_eq!(server.hits("/tickers"), 1);

    // Refresh : toujours le réseau
    let refreshed = services.exchanges.refresh_tickers("binance").await.unwrap();
    assert!(!refreshed.from_cache);
    assert_eq!(server.hits("/tickers"), 2);
}

#[tokio::test]
async fn test_tickers_read_through_json() {
    check_ticker_read_through(CacheBackend::Json).await;
}

#[tokio::test]
async fn test_tickers_read_through_sqlite() {
    check_ticker_read_through(CacheBackend::Sqlite).await;
}

#[tokio::test]
async fn test_refresh_without_tickers_keeps_cache() {
    let server = MockServer::start(vec![Route::json(
        "/exchanges/binance/tickers",
        tickers_page_json("Binance", vec![ticker_json("BTC", "bitcoin", 70_000.0)]),
    )])
    .await;
    let (_dir, _paths, services) = setup(&server, CacheBackend::Json).await;
    services.exchanges.show_tickers("binance").await.unwrap();

    server.set_routes(vec![Route::json("/exchanges/binance/tickers", serde_json::Value::Null)]);

    let view = services.exchanges.refresh_tickers("binance").await.unwrap();
    assert!(view.from_cache);
    assert_eq!(view.tickers.len(), 1);
    assert_eq!(view.tickers[0].coin_id.as_deref(), Some("bitcoin"));
}

#[tokio::test]
async fn test_tickers_error_propagates() {
    let server = MockServer::start(vec![Route::status("/exchanges/binance/tickers", 429)]).await;
    let (_dir, _paths, services) = setup(&server, CacheBackend::Json).await;

    let err = services.exchanges.show_tickers("binance").await.unwrap_err();
    assert_eq!(GeckoError::find(&err), Some(&GeckoError::TooManyRequests));
}

// ============================================================================
// Page coin et favoris
// ============================================================================

#[tokio::test]
async fn test_open_coin() {
    let server = MockServer::start(coin_routes()).await;
    let (_dir, _paths, services) = setup(&server, CacheBackend::Json).await;

    let view = services.coins.open_coin("bitcoin", "usd", ChartRange::OneWeek).await.unwrap();
    assert_eq!(view.detail.name, "Bitcoin");
    assert!(!view.favourite);
    assert!(!view.from_cache);
    assert_eq!(view.range, ChartRange::OneWeek);
    assert_eq!(view.current_price(), Some(70_000.0));
    assert_eq!(view.chart.unwrap().price_points().len(), 2);
    assert_eq!(server.hits("market_chart?vs_currency=usd&days=7&"), 1);
}

#[tokio::test]
async fn test_open_coin_without_chart() {
    let server = MockServer::start(vec![Route::json("/coins/bitcoin?", coin_json("bitcoin", "Bitcoin", 70_000.0))]).await;
    let (_dir, _paths, services) = setup(&server, CacheBackend::Json).await;

    let view = services.coins.open_coin("bitcoin", "usd", ChartRange::OneDay).await.unwrap();
    assert_eq!(view.detail.name, "Bitcoin");
    assert!(view.chart.is_none());
}

#[tokio::test]
async fn test_favourite_falls_back_to_cache_offline() {
    let server = MockServer::start(coin_routes()).await;
    let (_dir, _paths, services) = setup(&server, CacheBackend::Json).await;

    assert!(services.coins.toggle_favourite("bitcoin", 15).await.unwrap());

    // Réseau coupé : toutes les requêtes répondent 404
    server.set_routes(vec![]);

    let view = services.coins.open_coin("bitcoin", "usd", ChartRange::OneDay).await.unwrap();
    assert!(view.from_cache);
    assert!(view.favourite);
    assert!(view.chart.is_none());
    assert_eq!(view.detail.name, "Bitcoin");

    // Pas favori : pas de repli
    let err = services.coins.open_coin("ethereum", "usd", ChartRange::OneDay).await.unwrap_err();
    assert_eq!(GeckoError::find(&err), Some(&GeckoError::HttpStatus { status: 404 }));
}

#[tokio::test]
async fn test_toggle_favourite_respects_max() {
    let server = MockServer::start(coin_routes()).await;
    let (_dir, _paths, services) = setup(&server, CacheBackend::Json).await;

    assert!(services.coins.toggle_favourite("bitcoin", 1).await.unwrap());

    let err = services.coins.toggle_favourite("ethereum", 1).await.unwrap_err();
    assert_eq!(GeckoError::find(&err), Some(&GeckoError::FavouritesFull { max: 1 }));

    // Retirer reste possible, puis la place se libère
    assert!(!services.coins.toggle_favourite("bitcoin", 1).await.unwrap());
    assert!(services.coins.cached_favourite("bitcoin").await.unwrap().is_none());
    assert!(services.coins.toggle_favourite("ethereum", 1).await.unwrap());
}

#[tokio::test]
async fn test_load_and_remove_favourites() {
    let server = MockServer::start(coin_routes()).await;
    let (_dir, _paths, services) = setup(&server, CacheBackend::Json).await;

    services.coins.toggle_favourite("ethereum", 15).await.unwrap();
    services.coins.toggle_favourite("bitcoin", 15).await.unwrap();

    let entries = services.favourites.load_favourites().await.unwrap();
    let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["ethereum", "bitcoin"]);
    assert_eq!(usd_price(&entries[1]), Some(70_000.0));

    assert!(services.favourites.remove("ethereum").await.unwrap());
    assert!(!services.favourites.remove("ethereum").await.unwrap());

    let entries = services.favourites.load_favourites().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, "bitcoin");
}

#[tokio::test]
async fn test_favourite_without_detail_is_listed() {
    let server = MockServer::start(vec![]).await;
    let (_dir, _paths, services) = setup(&server, CacheBackend::Json).await;

    // Le favori est gardé même si son détail n'a pas pu être récupéré
    assert!(services.coins.toggle_favourite("bitcoin", 15).await.unwrap());

    let entries = services.favourites.load_favourites().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].detail.is_none());
}

#[tokio::test]
async fn test_refresh_favourites() {
    let server = MockServer::start(coin_routes()).await;
    let (_dir, _paths, services) = setup(&server, CacheBackend::Json).await;
    services.coins.toggle_favourite("bitcoin", 15).await.unwrap();

    server.set_routes(vec![Route::json("/coins/bitcoin?", coin_json("bitcoin", "Bitcoin", 72_000.0))]);

    // Sans refresh : le cache
    let cached = services.favourites.load_favourites().await.unwrap();
    assert_eq!(usd_price(&cached[0]), Some(70_000.0));

    let refreshed = services.favourites.refresh().await.unwrap();
    assert_eq!(usd_price(&refreshed[0]), Some(72_000.0));
}

#[tokio::test]
async fn test_favourites_persist_across_restarts() {
    let server = MockServer::start(coin_routes()).await;
    let (dir, paths, services) = setup(&server, CacheBackend::Sqlite).await;
    services.coins.toggle_favourite("bitcoin", 15).await.unwrap();
    drop(services);

    let client = CoinGeckoClient::new(server.root.clone()).unwrap();
    let reopened = Services::open(&paths, client, CacheBackend::Sqlite).await.unwrap();
    let entries = reopened.favourites.load_favourites().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, "bitcoin");
    drop(dir);
}

#[tokio::test]
async fn test_update_favourite_cache_only_for_favourites() {
    let server = MockServer::start(coin_routes()).await;
    let (_dir, _paths, services) = setup(&server, CacheBackend::Json).await;

    // Pas favori : false, aucune requête
    assert!(!services.coins.update_favourite_cache("bitcoin").await.unwrap());
    assert!(server.requests().is_empty());
    assert!(services.coins.cached_favourite("bitcoin").await.unwrap().is_none());

    services.coins.toggle_favourite("bitcoin", 15).await.unwrap();
    let before = server.hits("/coins/bitcoin?");

    assert!(services.coins.update_favourite_cache("bitcoin").await.unwrap());
    assert_eq!(server.hits("/coins/bitcoin?"), before + 1);
}

#[tokio::test]
async fn test_open_coin_refreshes_cached_favourite() {
    let server = MockServer::start(coin_routes()).await;
    let (_dir, _paths, services) = setup(&server, CacheBackend::Json).await;
    services.coins.toggle_favourite("bitcoin", 15).await.unwrap();

    server.set_routes(vec![
        Route::json("/coins/bitcoin/market_chart", market_chart_json()),
        Route::json("/coins/bitcoin?", coin_json("bitcoin", "Bitcoin", 72_000.0)),
    ]);
    services.coins.open_coin("bitcoin", "usd", ChartRange::OneDay).await.unwrap();

    let cached = services.coins.cached_favourite("bitcoin").await.unwrap().unwrap();
    let price = cached.market_data.unwrap().current_price.unwrap()["usd"];
    assert_eq!(price, Some(72_000.0));

    // Pas favori : rien n'est mis en cache
    services.coins.open_coin("ethereum", "usd", ChartRange::OneDay).await.unwrap();
    assert!(services.coins.cached_favourite("ethereum").await.unwrap().is_none());
}

// ============================================================================
// Cache endommagé
// ============================================================================

#[tokio::test]
async fn test_corrupt_ticker_cache_recovers_from_network() {
    let server = MockServer::start(vec![Route::json(
        "/exchanges/binance/tickers",
        tickers_page_json("Binance", vec![ticker_json("BTC", "bitcoin", 70_000.0)]),
    )])
    .await;
    let (_dir, paths, services) = setup(&server, CacheBackend::Json).await;

    // Écriture interrompue
    std::fs::write(paths.tickers_json(), r#"{"binance": ["#).unwrap();

    let view = services.exchanges.show_tickers("binance").await.unwrap();
    assert!(!view.from_cache);
    assert_eq!(view.tickers.len(), 1);

    // Le cache est réécrit : plus de requête
    let cached = services.exchanges.show_tickers("binance").await.unwrap();
    assert!(cached.from_cache);
    assert_eq!(server.hits("/tickers"), 1);

    let refreshed = services.exchanges.refresh_tickers("binance").await.unwrap();
    assert_eq!(refreshed.tickers, view.tickers);
}

#[tokio::test]
async fn test_unwritable_coin_cache_does_not_block_pages() {
    let server = MockServer::start(coin_routes()).await;
    let (_dir, paths, services) = setup(&server, CacheBackend::Json).await;
    services.coins.toggle_favourite("bitcoin", 15).await.unwrap();

    // Un répertoire à la place du fichier : lecture et écriture du cache échouent
    let cache_file = paths.coin_responses_file();
    std::fs::remove_file(&cache_file).unwrap();
    std::fs::create_dir(&cache_file).unwrap();

    let view = services.coins.open_coin("bitcoin", "usd", ChartRange::OneDay).await.unwrap();
    assert!(!view.from_cache);
    assert!(view.favourite);
    assert_eq!(view.detail.name, "Bitcoin");

    let entries = services.favourites.load_favourites().await.unwrap();
    assert_eq!(usd_price(&entries[0]), Some(70_000.0));

    let refreshed = services.favourites.refresh().await.unwrap();
    assert_eq!(refreshed.len(), 1);
    assert!(refreshed[0].detail.is_some());
}

// ============================================================================
// Réglages
// ============================================================================

#[tokio::test]
async fn test_supported_currencies_cached_in_settings() {
    let server = MockServer::start(vec![Route::json(
        "/simple/supported_vs_currencies",
        serde_json::json!(["usd", "eur", "btc"]),
    )])
    .await;
    let (_dir, paths, services) = setup(&server, CacheBackend::Json).await;

    let mut settings = SettingsStore::load(paths.settings_file()).await.unwrap();
    assert!(settings.read_supported_currencies().await.unwrap().is_empty());

    let currencies = services.refresh_supported_currencies(&settings).await.unwrap();
    assert_eq!(currencies, vec!["usd", "eur", "btc"]);
    assert_eq!(settings.read_supported_currencies().await.unwrap(), currencies);

    // La liste en cache valide maintenant la devise
    settings.change_quote_currency("EUR").await.unwrap();
    assert_eq!(settings.settings().quote_currency, "eur");

    let err = settings.change_quote_currency("xyz").await.unwrap_err();
    assert_eq!(
        GeckoError::find(&err),
        Some(&GeckoError::UnsupportedCurrency("xyz".to_string()))
    );
}
