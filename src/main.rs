// ============================================================================
// LazyGecko - Données de marché CoinGecko dans le terminal
// ============================================================================
// Programme TUI : tickers d'un exchange, page détaillée d'un coin, favoris
// gardés en local et réglages persistants.
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : boucle infinie qui gère événements et rendering
// 3. Worker thread : un runtime tokio dédié aux appels réseau et au stockage
// 4. Channels : l'UI envoie des commandes, le worker répond avec des résultats
// ============================================================================

use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use lazygecko::api::{CoinGeckoClient, COINGECKO_ROOT};
use lazygecko::app::{App, ChartMode, Screen, SettingChange};
use lazygecko::error::user_message;
use lazygecko::models::{Candle, ChartRange, FavouriteEntry, MarketChart};
use lazygecko::services::{CoinView, Services, TickersView};
use lazygecko::settings::{SettingsStore, UserSettings};
use lazygecko::storage::{AppPaths, CacheBackend};
use lazygecko::ui::{events::EventHandler, render};

// ============================================================================
// Ligne de commande
// ============================================================================
// CONCEPT RUST : clap derive
// - La struct décrit les options, clap génère le parsing et --help
// - Les doc comments deviennent le texte d'aide
// ============================================================================

/// CoinGecko market data in your terminal
#[derive(Debug, Parser)]
#[command(name = "lazygecko", version, about)]
struct Cli {
    /// Root folder for data and cache (defaults to the platform folders)
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// CoinGecko API root
    #[arg(long, value_name = "URL", default_value = COINGECKO_ROOT)]
    api_url: String,

    /// Where exchange tickers are cached
    #[arg(long, value_enum, default_value_t = CacheBackend::Json)]
    cache_backend: CacheBackend,

    /// Exchange to show for this run (the saved setting is left untouched)
    #[arg(long, value_name = "ID")]
    exchange: Option<String>,

    /// Open this coin page at start (ex: bitcoin)
    #[arg(long, value_name = "ID")]
    coin: Option<String>,
}

// ============================================================================
// AppCommand / AppResult : protocole UI <-> worker
// ============================================================================
// CONCEPT RUST : Command pattern avec channels
// - L'event loop envoie des AppCommand au worker
// - Le worker exécute les tâches async (réseau, SQLite, fichiers JSON)
// - Il répond par un AppResult que l'event loop applique à App
// ============================================================================

/// Commandes envoyées au worker thread
#[derive(Debug, Clone)]
enum AppCommand {
    /// Tickers depuis le cache, réseau si le cache est vide
    ShowTickers { exchange_id: String },

    /// Tickers depuis le réseau (écrase le cache)
    RefreshTickers { exchange_id: String },

    /// Détail + graphique d'un coin
    OpenCoin { coin_id: String, vs: String, range: ChartRange },

    /// Graphique seul, après un changement de période
    LoadChart { coin_id: String, vs: String, range: ChartRange },

    /// Chandelles OHLC pour la vue en chandeliers
    LoadCandles { coin_id: String, vs: String, range: ChartRange },

    ToggleFavourite { coin_id: String, max_favourites: u32 },

    LoadFavourites,

    /// Détail de chaque favori depuis le réseau
    RefreshFavourites,

    RemoveFavourite { coin_id: String },

    ChangeSetting(SettingChange),

    /// Devises supportées et ids des exchanges (refresh : ignorer le cache)
    LoadSettingsLists { refresh: bool },
}

impl AppCommand {
    /// Message affiché pendant le chargement
    fn describe(&self) -> String {
        match self {
            AppCommand::ShowTickers { exchange_id } => format!("Loading {} tickers", exchange_id),
            AppCommand::RefreshTickers { exchange_id } => format!("Refreshing {} tickers", exchange_id),
            AppCommand::OpenCoin { coin_id, .. } => format!("Loading {}", coin_id),
            AppCommand::LoadChart { range, .. } => format!("Loading {} chart", range.label()),
            AppCommand::LoadCandles { range, .. } => format!("Loading {} candles", range.label()),
            AppCommand::ToggleFavourite { coin_id, .. } => format!("Updating favourite {}", coin_id),
            AppCommand::LoadFavourites => "Loading favourites".to_string(),
            AppCommand::RefreshFavourites => "Refreshing favourites".to_string(),
            AppCommand::RemoveFavourite { coin_id } => format!("Removing {}", coin_id),
            AppCommand::ChangeSetting(_) => "Saving settings".to_string(),
            AppCommand::LoadSettingsLists { .. } => "Loading currencies and exchanges".to_string(),
        }
    }
}

/// Résultats renvoyés par le worker thread
#[derive(Debug)]
enum AppResult {
    TickersLoaded(TickersView),
    CoinLoaded(CoinView),
    CoinFailed { coin_id: String, error: String },
    ChartLoaded { coin_id: String, range: ChartRange, chart: MarketChart },
    CandlesLoaded { coin_id: String, candles: Vec<Candle> },
    FavouriteToggled { coin_id: String, favourite: bool },
    FavouritesLoaded(Vec<FavouriteEntry>),
    FavouriteRemoved { coin_id: String },
    SettingsSaved(UserSettings),
    SettingsListsLoaded { currencies: Vec<String>, exchange_ids: Vec<String> },

    /// Erreur non fatale, affichée dans la barre de statut
    Failed { action: String, error: String },
}

// ============================================================================
// Initialisation du logging
// ============================================================================
// CONCEPT : Logging dans une app TUI
// - Les println! ne fonctionnent pas une fois le TUI lancé
// - On log vers un fichier à la place, avec rotation quotidienne
// ============================================================================

/// Initialise le système de logging vers <AppData>/Logs/lazygecko.log
///
/// # Utilisation
/// ```bash
/// # Contrôler le niveau de log
/// RUST_LOG=debug lazygecko
/// RUST_LOG=lazygecko=trace lazygecko
/// ```
fn init_logging(log_dir: &Path) -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    std::fs::create_dir_all(log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "lazygecko.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false) // Pas de codes couleur dans le fichier
                .with_target(true)
                .with_thread_ids(true) // UI et worker sont sur deux threads
                .with_line_number(true),
        )
        .with(
            // Par défaut : debug pour lazygecko, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lazygecko=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialised");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = match &cli.data_dir {
        Some(root) => AppPaths::with_root(root),
        None => AppPaths::from_platform()?,
    };
    paths.init_file_structure()?;

    // Le logging échoue sans bloquer le programme
    init_logging(&paths.logs_dir()).unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    info!(data_dir = ?paths.app_data_dir(), api = %cli.api_url, backend = cli.cache_backend.label(), "LazyGecko starting up");

    // CONCEPT RUST : Runtime créé ici puis déplacé dans le worker
    // - Les pools SQLite sont ouverts dans ce runtime (block_on)
    // - Le worker continue à les utiliser dans le même runtime
    let runtime = tokio::runtime::Runtime::new().context("Échec de la création du runtime tokio")?;

    let client = CoinGeckoClient::new(cli.api_url.clone())?;
    let (services, settings, currencies) = runtime.block_on(async {
        let services = Services::open(&paths, client, cli.cache_backend).await?;
        let settings = SettingsStore::load(paths.settings_file()).await?;
        let currencies = settings.read_supported_currencies().await?;
        Ok::<_, anyhow::Error>((services, settings, currencies))
    })?;

    let mut app = App::new(settings.settings().clone());
    app.supported_currencies = currencies;
    app.exchange_override = cli.exchange.clone();

    let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
    let (result_tx, result_rx) = mpsc::channel::<AppResult>();

    info!("Spawning background worker thread");
    spawn_background_worker(runtime, services, settings, command_rx, result_tx);

    // Premières commandes : tickers, et la page coin si --coin
    let exchange_id = app.active_exchange().to_string();
    dispatch(&mut app, &command_tx, AppCommand::ShowTickers { exchange_id });
    if let Some(coin_id) = cli.coin.as_deref().map(normalise_coin_id).filter(|id| !id.is_empty()) {
        open_coin(&mut app, &command_tx, coin_id);
    }

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let events = EventHandler::default();

    info!("Starting event loop");
    let result = run(&mut terminal, &mut app, &events, &command_tx, &result_rx);

    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

// ============================================================================
// Background Worker Thread
// ============================================================================
// CONCEPT RUST : Ownership plutôt que partage
// - Le worker possède Services et SettingsStore (move dans la closure)
// - Il traite les commandes une par une, dans l'ordre d'arrivée
// - Quand command_tx est droppé, recv() échoue et le thread s'arrête
// ============================================================================

fn spawn_background_worker(
    runtime: tokio::runtime::Runtime,
    services: Services,
    mut settings: SettingsStore,
    command_rx: mpsc::Receiver<AppCommand>,
    result_tx: mpsc::Sender<AppResult>,
) {
    std::thread::spawn(move || {
        while let Ok(command) = command_rx.recv() {
            debug!(?command, "Worker received command");

            let result = runtime.block_on(execute(command, &services, &mut settings));

            if result_tx.send(result).is_err() {
                // L'UI est partie, plus personne n'écoute
                break;
            }
        }
        info!("Worker thread exiting (channel closed)");
    });
}

/// Exécute une commande et la transforme en résultat
///
/// CONCEPT : Les erreurs ne sortent jamais du worker
/// - Chaque échec devient un AppResult::Failed affiché dans le footer
/// - Un 429 (trop de requêtes) n'interrompt pas l'application
async fn execute(command: AppCommand, services: &Services, settings: &mut SettingsStore) -> AppResult {
    let action = command.describe();

    let result: Result<AppResult> = match command {
        AppCommand::ShowTickers { exchange_id } => services
            .exchanges
            .show_tickers(&exchange_id)
            .await
            .map(AppResult::TickersLoaded),

        AppCommand::RefreshTickers { exchange_id } => services
            .exchanges
            .refresh_tickers(&exchange_id)
            .await
            .map(AppResult::TickersLoaded),

        AppCommand::OpenCoin { coin_id, vs, range } => {
            return match services.coins.open_coin(&coin_id, &vs, range).await {
                Ok(view) => AppResult::CoinLoaded(view),
                Err(e) => {
                    error!(coin = %coin_id, error = ?e, "Failed to open coin");
                    AppResult::CoinFailed {
                        coin_id,
                        error: user_message(&e),
                    }
                }
            };
        }

        AppCommand::LoadChart { coin_id, vs, range } => services
            .coins
            .load_chart(&coin_id, &vs, range)
            .await
            .map(|chart| AppResult::ChartLoaded { coin_id, range, chart }),

        AppCommand::LoadCandles { coin_id, vs, range } => services
            .coins
            .load_candles(&coin_id, &vs, range)
            .await
            .map(|candles| AppResult::CandlesLoaded { coin_id, candles }),

        AppCommand::ToggleFavourite { coin_id, max_favourites } => services
            .coins
            .toggle_favourite(&coin_id, max_favourites)
            .await
            .map(|favourite| AppResult::FavouriteToggled { coin_id, favourite }),

        AppCommand::LoadFavourites => services
            .favourites
            .load_favourites()
            .await
            .map(AppResult::FavouritesLoaded),

        AppCommand::RefreshFavourites => services
            .favourites
            .refresh()
            .await
            .map(AppResult::FavouritesLoaded),

        AppCommand::RemoveFavourite { coin_id } => services
            .favourites
            .remove(&coin_id)
            .await
            .map(|_| AppResult::FavouriteRemoved { coin_id }),

        AppCommand::ChangeSetting(change) => apply_setting(settings, change)
            .await
            .map(|_| AppResult::SettingsSaved(settings.settings().clone())),

        AppCommand::LoadSettingsLists { refresh } => load_settings_lists(services, settings, refresh).await,
    };

    result.unwrap_or_else(|e| {
        error!(action = %action, error = ?e, "Command failed");
        AppResult::Failed {
            action,
            error: user_message(&e),
        }
    })
}

async fn apply_setting(settings: &mut SettingsStore, change: SettingChange) -> Result<()> {
    match change {
        SettingChange::ToggleDarkMode => settings.switch_dark_mode().await.map(|_| ()),
        SettingChange::QuoteCurrency(currency) => settings.change_quote_currency(&currency).await,
        SettingChange::MaxFavourites(max) => settings.change_max_favourites(max).await,
        SettingChange::ExchangeId(exchange_id) => settings.change_exchange_id(&exchange_id).await,
        SettingChange::Reset => settings.reset().await,
    }
}

/// Devises (cache d'abord) et ids des exchanges (réseau)
async fn load_settings_lists(services: &Services, settings: &SettingsStore, refresh: bool) -> Result<AppResult> {
    let cached = settings.read_supported_currencies().await?;
    let currencies = if refresh || cached.is_empty() {
        services.refresh_supported_currencies(settings).await?
    } else {
        cached
    };

    let exchange_ids = services.exchanges.exchange_ids().await?;
    Ok(AppResult::SettingsListsLoaded { currencies, exchange_ids })
}

// ============================================================================
// Envoi des commandes
// ============================================================================

/// Envoie une commande au worker et active l'indicateur de chargement
fn dispatch(app: &mut App, command_tx: &mpsc::Sender<AppCommand>, command: AppCommand) {
    app.start_loading(Some(command.describe()));
    if let Err(e) = command_tx.send(command) {
        error!(error = %e, "Worker thread is gone");
        app.stop_loading();
        app.set_error("Background worker stopped, please restart");
    }
}

/// Coin id tel que l'attend CoinGecko ("Bitcoin " -> "bitcoin")
fn normalise_coin_id(input: &str) -> String {
    input.trim().to_lowercase()
}

/// Passe sur la page coin et demande son chargement
fn open_coin(app: &mut App, command_tx: &mpsc::Sender<AppCommand>, coin_id: String) {
    info!(coin = %coin_id, "Opening coin page");
    app.show_coin();
    let command = AppCommand::OpenCoin {
        coin_id,
        vs: app.quote_currency().to_string(),
        range: app.chart_range,
    };
    dispatch(app, command_tx, command);
}

/// Recharge le graphique visible (période ou type de graphique changé)
fn reload_chart(app: &mut App, command_tx: &mpsc::Sender<AppCommand>) {
    let (coin_id, vs) = match &app.coin {
        Some(view) => (view.coin_id.clone(), view.quote_currency.clone()),
        None => return,
    };
    let range = app.chart_range;
    info!(coin = %coin_id, range = range.label(), mode = ?app.chart_mode, "Reloading chart");

    app.candles = None;
    let command = match app.chart_mode {
        ChartMode::Line => AppCommand::LoadChart { coin_id, vs, range },
        ChartMode::Candles => AppCommand::LoadCandles { coin_id, vs, range },
    };
    dispatch(app, command_tx, command);
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// CONCEPT : Game Loop / Event Loop Pattern
// - Loop infinie : while app.is_running()
// - À chaque itération :
//   0. Appliquer les résultats du worker
//   1. Dessiner l'interface (render)
//   2. Traiter les événements (input)
//   3. Mettre à jour l'état (update)
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
    command_tx: &mpsc::Sender<AppCommand>,
    result_rx: &mpsc::Receiver<AppResult>,
) -> Result<()> {
    while app.is_running() {
        // 0. RÉSULTATS : try_recv ne bloque pas, on vide tout ce qui est arrivé
        loop {
            match result_rx.try_recv() {
                Ok(result) => {
                    app.stop_loading();
                    apply_result(app, result, command_tx);
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    error!("Worker thread disconnected!");
                    app.set_error("Background worker stopped, please restart");
                    break;
                }
            }
        }

        // 1. RENDER
        terminal.draw(|frame| render(frame, app))?;

        // 2. INPUT
        match events.next() {
            Ok(event) => handle_event(app, event, command_tx),
            Err(e) => warn!(error = %e, "Failed to read terminal event"),
        }

        // 3. UPDATE
        app.tick();
    }

    Ok(())
}

/// Applique un résultat du worker à l'état
fn apply_result(app: &mut App, result: AppResult, command_tx: &mpsc::Sender<AppCommand>) {
    match result {
        AppResult::TickersLoaded(view) => {
            info!(exchange = %view.exchange_id, count = view.tickers.len(), cached = view.from_cache, "Tickers loaded");
            if view.exchange_id == app.active_exchange() {
                app.set_tickers(view);
            }
        }
        AppResult::CoinLoaded(view) => {
            let from_cache = view.from_cache;
            if from_cache {
                app.set_status("Network unavailable, showing cached favourite");
            }
            app.set_coin(view);

            // OpenCoin ne charge que la courbe : les chandelles suivent
            if app.chart_mode == ChartMode::Candles && !from_cache {
                reload_chart(app, command_tx);
            }
        }
        AppResult::CoinFailed { coin_id, error } => {
            app.set_error(format!("Could not load {}: {}", coin_id, error));
            // Rien à afficher : on quitte la page coin restée vide
            if app.is_on(Screen::Coin) && app.coin.is_none() {
                app.close_coin();
            }
        }
        AppResult::ChartLoaded { coin_id, range, chart } => app.set_chart(&coin_id, range, chart),
        AppResult::CandlesLoaded { coin_id, candles } => app.set_candles(&coin_id, candles),
        AppResult::FavouriteToggled { coin_id, favourite } => {
            app.set_favourite_flag(&coin_id, favourite);
            if favourite {
                app.set_status(format!("{} added to favourites", coin_id));
            } else {
                app.set_status(format!("{} removed from favourites", coin_id));
            }
        }
        AppResult::FavouritesLoaded(entries) => app.set_favourites(entries),
        AppResult::FavouriteRemoved { coin_id } => {
            app.set_favourite_flag(&coin_id, false);
            app.set_status(format!("{} removed from favourites", coin_id));
        }
        AppResult::SettingsSaved(settings) => {
            if app.set_settings(settings) {
                let exchange_id = app.active_exchange().to_string();
                dispatch(app, command_tx, AppCommand::ShowTickers { exchange_id });
            }
            app.set_status("Settings saved");
        }
        AppResult::SettingsListsLoaded { currencies, exchange_ids } => {
            app.supported_currencies = currencies;
            app.exchange_ids = exchange_ids;
        }
        AppResult::Failed { action, error } => app.set_error(format!("{} failed: {}", action, error)),
    }
}

// ============================================================================
// Gestion des événements
// ============================================================================

/// Traite un événement et met à jour l'état de l'application
///
/// CONCEPT RUST : Pattern matching avec guards
/// - Le premier bras qui correspond gagne : l'ordre compte
/// - Le mode saisie passe avant tout (on tape 'q' dans un coin id)
fn handle_event(app: &mut App, event: lazygecko::ui::events::Event, command_tx: &mpsc::Sender<AppCommand>) {
    use lazygecko::ui::events::{
        get_char_from_event, is_backspace_event, is_chart_mode_event, is_coin_id_char_event, is_delete_event,
        is_down_event, is_enter_event, is_escape_event, is_next_event, is_previous_event, is_quit_event,
        is_refresh_event, is_search_event, is_star_event, is_tab_event, is_up_event, Event,
    };

    match event {
        // ========================================
        // Input Mode : saisie d'un coin id
        // ========================================
        Event::Key(_) if is_escape_event(&event) && app.is_in_input_mode() => {
            debug!("User cancelled search");
            app.cancel_input();
        }

        Event::Key(_) if is_enter_event(&event) && app.is_in_input_mode() => {
            let coin_id = normalise_coin_id(&app.submit_input());
            if coin_id.is_empty() {
                debug!("Empty coin id, ignoring");
            } else {
                open_coin(app, command_tx, coin_id);
            }
        }

        Event::Key(_) if is_backspace_event(&event) && app.is_in_input_mode() => app.backspace(),

        Event::Key(_) if is_coin_id_char_event(&event) && app.is_in_input_mode() => {
            if let Some(c) = get_char_from_event(&event) {
                app.append_char(c);
            }
        }

        Event::Key(_) if app.is_in_input_mode() => {}

        // ========================================
        // Quit (two-step)
        // ========================================
        Event::Key(_) if is_quit_event(&event) => {
            if app.is_awaiting_quit_confirmation() {
                info!("User confirmed quit");
                app.quit();
            } else {
                info!("User requested quit (awaiting confirmation)");
                app.cancel_delete();
                app.request_quit();
            }
        }

        // ========================================
        // Commun à toutes les pages
        // ========================================
        Event::Key(_) if is_tab_event(&event) => {
            let page = app.next_page();
            debug!(page = page.title(), "User switched page");
            match page {
                Screen::Exchange if app.tickers.is_none() => {
                    let exchange_id = app.active_exchange().to_string();
                    dispatch(app, command_tx, AppCommand::ShowTickers { exchange_id });
                }
                Screen::Favourites => dispatch(app, command_tx, AppCommand::LoadFavourites),
                Screen::Settings if app.exchange_ids.is_empty() => {
                    dispatch(app, command_tx, AppCommand::LoadSettingsLists { refresh: false })
                }
                _ => {}
            }
        }

        Event::Key(_) if is_search_event(&event) => {
            app.cancel_quit();
            app.cancel_delete();
            app.start_input("Coin id: ".to_string());
        }

        Event::Key(_) if is_up_event(&event) => {
            app.cancel_quit();
            app.cancel_delete();
            app.navigate_up();
        }

        Event::Key(_) if is_down_event(&event) => {
            app.cancel_quit();
            app.cancel_delete();
            app.navigate_down();
        }

        // ========================================
        // Page exchange
        // ========================================
        Event::Key(_) if is_enter_event(&event) && (app.is_on(Screen::Exchange) || app.is_on(Screen::Favourites)) => {
            app.cancel_quit();
            app.cancel_delete();
            match app.selected_coin_id() {
                Some(coin_id) => open_coin(app, command_tx, coin_id),
                None => app.set_error("This ticker has no CoinGecko coin id"),
            }
        }

        Event::Key(_) if is_refresh_event(&event) && app.is_on(Screen::Exchange) => {
            app.cancel_quit();
            let exchange_id = app.active_exchange().to_string();
            info!(exchange = %exchange_id, "User refreshed tickers");
            dispatch(app, command_tx, AppCommand::RefreshTickers { exchange_id });
        }

        // ========================================
        // Page coin
        // ========================================
        Event::Key(_) if is_escape_event(&event) && app.is_on(Screen::Coin) => {
            app.cancel_quit();
            app.close_coin();
        }

        Event::Key(_) if is_next_event(&event) && app.is_on(Screen::Coin) => {
            app.cancel_quit();
            app.next_range();
            reload_chart(app, command_tx);
        }

        Event::Key(_) if is_previous_event(&event) && app.is_on(Screen::Coin) => {
            app.cancel_quit();
            app.previous_range();
            reload_chart(app, command_tx);
        }

        Event::Key(_) if is_chart_mode_event(&event) && app.is_on(Screen::Coin) => {
            app.cancel_quit();
            let mode = app.toggle_chart_mode();
            if mode == ChartMode::Candles && app.candles.is_none() {
                reload_chart(app, command_tx);
            }
        }

        Event::Key(_) if is_star_event(&event) && app.is_on(Screen::Coin) => {
            app.cancel_quit();
            if let Some(coin_id) = app.current_coin_id().map(str::to_string) {
                let max_favourites = app.settings.max_favourites;
                dispatch(app, command_tx, AppCommand::ToggleFavourite { coin_id, max_favourites });
            }
        }

        Event::Key(_) if is_refresh_event(&event) && app.is_on(Screen::Coin) => {
            app.cancel_quit();
            if let Some(view) = &app.coin {
                let command = AppCommand::OpenCoin {
                    coin_id: view.coin_id.clone(),
                    vs: app.quote_currency().to_string(),
                    range: app.chart_range,
                };
                dispatch(app, command_tx, command);
            }
        }

        // ========================================
        // Page favoris
        // ========================================
        Event::Key(_) if is_delete_event(&event) && app.is_on(Screen::Favourites) => {
            app.cancel_quit();
            if let Some(coin_id) = app.selected_favourite().map(|f| f.id.clone()) {
                if app.is_awaiting_delete_confirmation() {
                    info!(coin = %coin_id, "User confirmed favourite removal");
                    app.cancel_delete();
                    dispatch(app, command_tx, AppCommand::RemoveFavourite { coin_id });
                } else {
                    app.request_delete();
                }
            }
        }

        Event::Key(_) if is_refresh_event(&event) && app.is_on(Screen::Favourites) => {
            app.cancel_quit();
            app.cancel_delete();
            dispatch(app, command_tx, AppCommand::RefreshFavourites);
        }

        // ========================================
        // Page réglages
        // ========================================
        Event::Key(_)
            if (is_next_event(&event) || is_enter_event(&event) || is_previous_event(&event))
                && app.is_on(Screen::Settings) =>
        {
            app.cancel_quit();
            let forward = !is_previous_event(&event);
            if let Some(change) = app.setting_change(forward) {
                debug!(?change, "User changed a setting");
                dispatch(app, command_tx, AppCommand::ChangeSetting(change));
            }
        }

        Event::Key(_) if is_refresh_event(&event) && app.is_on(Screen::Settings) => {
            app.cancel_quit();
            dispatch(app, command_tx, AppCommand::LoadSettingsLists { refresh: true });
        }

        Event::Tick => {}

        Event::Key(_) => {
            // Toute autre touche : annule les confirmations si actives
            app.cancel_quit();
            app.cancel_delete();
        }
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================
// IMPORTANT : Toujours restaurer le terminal avant de quitter !
// ============================================================================

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use lazygecko::models::CoinDetail;

    fn coin_view(coin_id: &str, from_cache: bool) -> CoinView {
        CoinView {
            coin_id: coin_id.to_string(),
            detail: CoinDetail {
                id: coin_id.to_string(),
                name: coin_id.to_string(),
                ..Default::default()
            },
            chart: None,
            range: ChartRange::OneDay,
            quote_currency: "usd".to_string(),
            favourite: false,
            from_cache,
        }
    }

    /// Ouvre un coin puis applique sa réponse, retourne les commandes envoyées
    fn open_and_load(mode: ChartMode, from_cache: bool) -> (App, Vec<AppCommand>) {
        let (tx, rx) = mpsc::channel();
        let mut app = App::default();
        app.chart_mode = mode;

        open_coin(&mut app, &tx, "ethereum".to_string());
        app.stop_loading();
        apply_result(&mut app, AppResult::CoinLoaded(coin_view("ethereum", from_cache)), &tx);

        (app, rx.try_iter().collect())
    }

    #[test]
    fn test_candles_requested_after_coin_loaded() {
        let (app, commands) = open_and_load(ChartMode::Candles, false);

        assert_eq!(commands.len(), 2);
        assert!(matches!(&commands[0], AppCommand::OpenCoin { coin_id, .. } if coin_id == "ethereum"));
        assert!(matches!(
            &commands[1],
            AppCommand::LoadCandles { coin_id, range: ChartRange::OneDay, .. } if coin_id == "ethereum"
        ));
        assert_eq!(app.chart_mode, ChartMode::Candles);
        assert!(app.is_loading);
    }

    #[test]
    fn test_line_mode_needs_no_extra_request() {
        let (_, commands) = open_and_load(ChartMode::Line, false);
        assert_eq!(commands.len(), 1);
        assert!(matches!(&commands[0], AppCommand::OpenCoin { .. }));
    }

    #[test]
    fn test_cached_coin_does_not_request_candles() {
        let (app, commands) = open_and_load(ChartMode::Candles, true);
        assert_eq!(commands.len(), 1);
        assert!(app.status.as_ref().is_some_and(|s| !s.is_error));
    }
}
