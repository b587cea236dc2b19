// ============================================================================
// Serveur HTTP minimal pour les tests d'intégration
// ============================================================================
// Un TcpListener tokio répond à la place de CoinGecko :
// - chaque route associe un motif (contenu dans la cible de la requête)
//   à un statut et un corps JSON
// - les cibles reçues sont enregistrées pour compter les appels réseau
// - les routes peuvent être remplacées en cours de test (ex: réseau coupé)
// ============================================================================

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
pub struct Route {
    pattern: String,
    status: u16,
    body: String,
}

impl Route {
    pub fn json(pattern: &str, body: serde_json::Value) -> Self {
        Self {
            pattern: pattern.to_string(),
            status: 200,
            body: body.to_string(),
        }
    }

    pub fn status(pattern: &str, status: u16) -> Self {
        Self {
            pattern: pattern.to_string(),
            status,
            body: "{}".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockServer {
    pub root: String,
    routes: Arc<Mutex<Vec<Route>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockServer {
    /// Démarre le serveur sur un port libre
    pub async fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = Self {
            root: format!("http://{}", addr),
            routes: Arc::new(Mutex::new(routes)),
            requests: Arc::new(Mutex::new(Vec::new())),
        };

        let handle = server.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let handle = handle.clone();
                tokio::spawn(async move { handle.serve(stream).await });
            }
        });

        server
    }

    /// Remplace toutes les routes (les requêtes sans route reçoivent un 404)
    pub fn set_routes(&self, routes: Vec<Route>) {
        *self.routes.lock().unwrap() = routes;
    }

    /// Cibles reçues, dans l'ordre (ex: "/api/v3/coins/bitcoin?tickers=true...")
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Nombre de requêtes dont la cible contient `pattern`
    pub fn hits(&self, pattern: &str) -> usize {
        self.requests().iter().filter(|r| r.contains(pattern)).count()
    }

    async fn serve(&self, mut stream: TcpStream) {
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 1024];

        // GET uniquement : la requête s'arrête à la ligne vide
        loop {
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    buffer.extend_from_slice(&chunk[..n]);
                    if buffer.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
            }
        }

        let request = String::from_utf8_lossy(&buffer);
        let target = request
            .lines()
            .next()
            .and_then(|line| line.split_whitespace().nth(1))
            .unwrap_or("/")
            .to_string();
        self.requests.lock().unwrap().push(target.clone());

        let route = self
            .routes
            .lock()
            .unwrap()
            .iter()
            .find(|r| target.contains(&r.pattern))
            .cloned()
            .unwrap_or_else(|| Route::status("", 404));

        let response = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            route.status,
            reason(route.status),
            route.body.len(),
            route.body
        );
        // Le client peut avoir déjà fermé (timeout, test terminé) : rien à faire
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.shutdown().await;
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

// ============================================================================
// Réponses CoinGecko de test
// ============================================================================

pub fn coin_json(id: &str, name: &str, price: f64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "symbol": &id[..3.min(id.len())],
        "name": name,
        "market_cap_rank": 1,
        "market_data": {
            "current_price": { "usd": price, "eur": price * 0.9 },
            "total_volume": { "usd": 1_000_000.0 },
            "price_change_percentage_24h": 2.5
        },
        "last_updated": "2024-04-01T00:00:00.000Z"
    })
}

pub fn market_chart_json() -> serde_json::Value {
    serde_json::json!({
        "prices": [[1_711_929_600_000.0, 69_000.0], [1_712_016_000_000.0, 70_500.0]],
        "market_caps": [[1_711_929_600_000.0, 1.3e12], [1_712_016_000_000.0, 1.4e12]],
        "total_volumes": [[1_711_929_600_000.0, 3.1e10], [1_712_016_000_000.0, 2.9e10]]
    })
}

pub fn ticker_json(base: &str, coin_id: &str, last: f64) -> serde_json::Value {
    serde_json::json!({
        "base": base,
        "target": "USDT",
        "market": { "name": "Binance", "identifier": "binance", "has_trading_incentive": false },
        "last": last,
        "volume": 1234.5,
        "converted_last": { "usd": last, "btc": 1.0, "eth": 20.0 },
        "converted_volume": { "usd": last * 1234.5 },
        "trust_score": "green",
        "bid_ask_spread_percentage": 0.01,
        "timestamp": "2024-04-01T00:00:00+00:00",
        "coin_id": coin_id,
        "target_coin_id": "tether"
    })
}

pub fn tickers_page_json(name: &str, tickers: Vec<serde_json::Value>) -> serde_json::Value {
    serde_json::json!({ "name": name, "tickers": tickers })
}
