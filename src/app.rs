// ============================================================================
// État de l'application
// ============================================================================
// Ce module contient la structure App qui représente l'état complet de
// l'application : page affichée, données chargées, sélections et
// confirmations en cours.
//
// CONCEPTS RUST :
// 1. Struct : regroupe les données liées
// 2. Enums : représenter les pages et les réglages
// 3. Ownership : le thread UI possède App, le worker ne lui envoie que des
//    résultats (pas de Mutex)
// ============================================================================

use crate::models::{Candle, ChartRange, ExchangeTicker, FavouriteEntry, MarketChart};
use crate::services::{CoinView, TickersView};
use crate::settings::{UserSettings, MAX_FAVOURITES_RANGE};

/// Devises proposées tant que la liste de l'API n'est pas chargée
const FALLBACK_CURRENCIES: [&str; 6] = ["usd", "eur", "gbp", "jpy", "btc", "eth"];

/// Exchanges proposés tant que la liste de l'API n'est pas chargée
const FALLBACK_EXCHANGES: [&str; 5] = ["binance", "gdax", "kraken", "bybit_spot", "okex"];

/// Durée d'affichage d'un message de statut (en ticks de 250ms)
const STATUS_TICKS: u16 = 24;

// ============================================================================
// Pages
// ============================================================================

/// Page actuellement affichée
///
/// CONCEPT RUST : Enum pour représenter un état
/// - Le compilateur force le router à gérer chaque page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Tickers de l'exchange configuré
    Exchange,

    /// Détail, stats et graphique d'un coin
    Coin,

    /// Coins favoris avec leur sparkline 7 jours
    Favourites,

    Settings,

    /// Saisie d'un coin id (par-dessus la page précédente)
    InputMode,
}

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Screen::Exchange => "Exchange",
            Screen::Coin => "Coin",
            Screen::Favourites => "Favourites",
            Screen::Settings => "Settings",
            Screen::InputMode => "Search",
        }
    }

    /// Page atteinte avec Tab
    ///
    /// La page coin n'est pas dans le cycle : Tab y ramène à l'exchange.
    pub fn next_page(&self) -> Screen {
        match self {
            Screen::Exchange => Screen::Favourites,
            Screen::Favourites => Screen::Settings,
            Screen::Settings => Screen::Exchange,
            Screen::Coin => Screen::Exchange,
            Screen::InputMode => Screen::InputMode,
        }
    }
}

/// Type de graphique sur la page coin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartMode {
    /// Courbe des prix (/market_chart)
    #[default]
    Line,
    /// Chandeliers japonais (/ohlc)
    Candles,
}

// ============================================================================
// Réglages éditables
// ============================================================================

/// Ligne sélectionnable de la page des réglages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingField {
    DarkMode,
    QuoteCurrency,
    MaxFavourites,
    Exchange,
    Reset,
}

impl SettingField {
    pub const ALL: [SettingField; 5] = [
        SettingField::DarkMode,
        SettingField::QuoteCurrency,
        SettingField::MaxFavourites,
        SettingField::Exchange,
        SettingField::Reset,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SettingField::DarkMode => "Dark mode",
            SettingField::QuoteCurrency => "Quote currency",
            SettingField::MaxFavourites => "Max favourites",
            SettingField::Exchange => "Exchange",
            SettingField::Reset => "Reset to defaults",
        }
    }
}

/// Modification demandée au worker (qui possède le fichier de réglages)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingChange {
    ToggleDarkMode,
    QuoteCurrency(String),
    MaxFavourites(u32),
    ExchangeId(String),
    Reset,
}

/// Message affiché dans le footer (info ou erreur)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

// ============================================================================
// Structure App
// ============================================================================

/// État principal de l'application
#[derive(Debug)]
pub struct App {
    pub running: bool,

    pub current_screen: Screen,

    /// Page à retrouver en sortant de la page coin ou de la saisie
    pub previous_screen: Screen,

    /// Copie des réglages (la source de vérité est dans le worker)
    pub settings: UserSettings,

    /// Exchange imposé par --exchange pour cette session
    pub exchange_override: Option<String>,

    /// Listes pour faire défiler les valeurs des réglages
    pub supported_currencies: Vec<String>,
    pub exchange_ids: Vec<String>,

    // Page exchange
    pub tickers: Option<TickersView>,
    pub ticker_index: usize,

    // Page coin
    pub coin: Option<CoinView>,
    pub candles: Option<Vec<Candle>>,
    pub chart_range: ChartRange,
    pub chart_mode: ChartMode,

    // Page favoris
    pub favourites: Vec<FavouriteEntry>,
    pub favourite_index: usize,

    // Page réglages
    pub setting_index: usize,

    /// Confirmation de quit (two-step : appuyer deux fois sur 'q')
    pub confirm_quit: bool,

    /// Confirmation de retrait d'un favori (two-step : 'd' deux fois)
    pub confirm_delete: bool,

    /// Au moins une commande est en cours dans le worker
    pub is_loading: bool,
    pub loading_message: Option<String>,
    pending: usize,

    pub status: Option<StatusMessage>,
    status_ttl: u16,

    /// Buffer de saisie (coin id recherché)
    pub input_buffer: String,
    pub input_prompt: String,
}

impl App {
    /// Crée l'état initial à partir des réglages chargés
    pub fn new(settings: UserSettings) -> Self {
        Self {
            running: true,
            current_screen: Screen::Exchange,
            previous_screen: Screen::Exchange,
            settings,
            exchange_override: None,
            supported_currencies: Vec::new(),
            exchange_ids: Vec::new(),
            tickers: None,
            ticker_index: 0,
            coin: None,
            candles: None,
            chart_range: ChartRange::default(),
            chart_mode: ChartMode::default(),
            favourites: Vec::new(),
            favourite_index: 0,
            setting_index: 0,
            confirm_quit: false,
            confirm_delete: false,
            is_loading: false,
            loading_message: None,
            pending: 0,
            status: None,
            status_ttl: 0,
            input_buffer: String::new(),
            input_prompt: String::new(),
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Appelé à chaque tour de boucle : fait expirer le message de statut
    pub fn tick(&mut self) {
        if self.status.is_some() {
            self.status_ttl = self.status_ttl.saturating_sub(1);
            if self.status_ttl == 0 {
                self.status = None;
            }
        }
    }

    pub fn is_on(&self, screen: Screen) -> bool {
        self.current_screen == screen
    }

    /// Exchange affiché : --exchange s'il est donné, sinon le réglage
    pub fn active_exchange(&self) -> &str {
        self.exchange_override
            .as_deref()
            .unwrap_or(&self.settings.exchange_id)
    }

    pub fn quote_currency(&self) -> &str {
        &self.settings.quote_currency
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Monte dans la liste de la page courante
    ///
    /// CONCEPT RUST : saturating_sub
    /// - 0 - 1 reste 0 au lieu de paniquer
    pub fn navigate_up(&mut self) {
        match self.current_screen {
            Screen::Exchange => self.ticker_index = self.ticker_index.saturating_sub(1),
            Screen::Favourites => self.favourite_index = self.favourite_index.saturating_sub(1),
            Screen::Settings => self.setting_index = self.setting_index.saturating_sub(1),
            Screen::Coin | Screen::InputMode => {}
        }
    }

    /// Descend dans la liste de la page courante, sans dépasser le dernier
    pub fn navigate_down(&mut self) {
        match self.current_screen {
            Screen::Exchange => {
                let len = self.tickers.as_ref().map(|t| t.tickers.len()).unwrap_or(0);
                self.ticker_index = step_down(self.ticker_index, len);
            }
            Screen::Favourites => {
                self.favourite_index = step_down(self.favourite_index, self.favourites.len());
            }
            Screen::Settings => {
                self.setting_index = step_down(self.setting_index, SettingField::ALL.len());
            }
            Screen::Coin | Screen::InputMode => {}
        }
    }

    /// Tab : page suivante
    pub fn next_page(&mut self) -> Screen {
        self.cancel_quit();
        self.cancel_delete();
        self.current_screen = self.current_screen.next_page();
        self.current_screen
    }

    pub fn selected_ticker(&self) -> Option<&ExchangeTicker> {
        self.tickers.as_ref()?.tickers.get(self.ticker_index)
    }

    pub fn selected_favourite(&self) -> Option<&FavouriteEntry> {
        self.favourites.get(self.favourite_index)
    }

    pub fn selected_setting(&self) -> SettingField {
        SettingField::ALL[self.setting_index.min(SettingField::ALL.len() - 1)]
    }

    /// Coin id sous le curseur (page exchange ou favoris)
    pub fn selected_coin_id(&self) -> Option<String> {
        match self.current_screen {
            Screen::Exchange => self.selected_ticker()?.coin_id.clone(),
            Screen::Favourites => self.selected_favourite().map(|f| f.id.clone()),
            _ => None,
        }
    }

    /// Passe sur la page coin (le contenu arrive plus tard du worker)
    pub fn show_coin(&mut self) {
        if !matches!(self.current_screen, Screen::Coin | Screen::InputMode) {
            self.previous_screen = self.current_screen;
        }
        self.current_screen = Screen::Coin;
        self.coin = None;
        self.candles = None;
    }

    /// Quitte la page coin pour la page d'où on venait
    pub fn close_coin(&mut self) {
        self.current_screen = match self.previous_screen {
            Screen::Coin | Screen::InputMode => Screen::Exchange,
            other => other,
        };
    }

    // ========================================================================
    // Graphique
    // ========================================================================

    pub fn next_range(&mut self) -> ChartRange {
        self.chart_range = self.chart_range.next();
        self.chart_range
    }

    pub fn previous_range(&mut self) -> ChartRange {
        self.chart_range = self.chart_range.previous();
        self.chart_range
    }

    pub fn toggle_chart_mode(&mut self) -> ChartMode {
        self.chart_mode = match self.chart_mode {
            ChartMode::Line => ChartMode::Candles,
            ChartMode::Candles => ChartMode::Line,
        };
        self.chart_mode
    }

    pub fn current_coin_id(&self) -> Option<&str> {
        self.coin.as_ref().map(|c| c.coin_id.as_str())
    }

    // ========================================================================
    // Résultats du worker
    // ========================================================================

    pub fn set_tickers(&mut self, view: TickersView) {
        self.ticker_index = clamp_index(self.ticker_index, view.tickers.len());
        self.tickers = Some(view);
    }

    pub fn set_coin(&mut self, view: CoinView) {
        self.chart_range = view.range;
        self.candles = None;
        self.coin = Some(view);
    }

    /// Remplace le graphique si le coin affiché n'a pas changé entre-temps
    pub fn set_chart(&mut self, coin_id: &str, range: ChartRange, chart: MarketChart) {
        if let Some(view) = self.coin.as_mut().filter(|v| v.coin_id == coin_id) {
            view.range = range;
            view.chart = Some(chart);
        }
    }

    pub fn set_candles(&mut self, coin_id: &str, candles: Vec<Candle>) {
        if self.current_coin_id() == Some(coin_id) {
            self.candles = Some(candles);
        }
    }

    pub fn set_favourite_flag(&mut self, coin_id: &str, favourite: bool) {
        if let Some(view) = self.coin.as_mut().filter(|v| v.coin_id == coin_id) {
            view.favourite = favourite;
        }
        if !favourite {
            self.remove_favourite_entry(coin_id);
        }
    }

    pub fn set_favourites(&mut self, entries: Vec<FavouriteEntry>) {
        self.favourite_index = clamp_index(self.favourite_index, entries.len());
        self.favourites = entries;
    }

    pub fn remove_favourite_entry(&mut self, coin_id: &str) {
        self.favourites.retain(|f| f.id != coin_id);
        self.favourite_index = clamp_index(self.favourite_index, self.favourites.len());
    }

    /// Applique les réglages sauvegardés
    ///
    /// Retourne true si l'exchange affiché a changé (tickers à recharger).
    pub fn set_settings(&mut self, settings: UserSettings) -> bool {
        let exchange_changed = settings.exchange_id != self.settings.exchange_id;
        self.settings = settings;
        if exchange_changed {
            self.exchange_override = None;
            self.tickers = None;
            self.ticker_index = 0;
        }
        exchange_changed
    }

    // ========================================================================
    // Réglages
    // ========================================================================

    /// Valeur suivante (ou précédente) du réglage sélectionné
    ///
    /// None quand le réglage est déjà à sa borne.
    pub fn setting_change(&self, forward: bool) -> Option<SettingChange> {
        match self.selected_setting() {
            SettingField::DarkMode => Some(SettingChange::ToggleDarkMode),
            SettingField::QuoteCurrency => {
                let values = or_fallback(&self.supported_currencies, &FALLBACK_CURRENCIES);
                cycle(&values, &self.settings.quote_currency, forward)
                    .map(SettingChange::QuoteCurrency)
            }
            SettingField::MaxFavourites => {
                let current = self.settings.max_favourites;
                let next = if forward {
                    current.saturating_add(1)
                } else {
                    current.saturating_sub(1)
                };
                MAX_FAVOURITES_RANGE
                    .contains(&next)
                    .then_some(SettingChange::MaxFavourites(next))
            }
            SettingField::Exchange => {
                let values = or_fallback(&self.exchange_ids, &FALLBACK_EXCHANGES);
                cycle(&values, &self.settings.exchange_id, forward).map(SettingChange::ExchangeId)
            }
            SettingField::Reset => Some(SettingChange::Reset),
        }
    }

    // ========================================================================
    // Confirmations
    // ========================================================================

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    pub fn request_delete(&mut self) {
        self.confirm_delete = true;
    }

    pub fn cancel_delete(&mut self) {
        self.confirm_delete = false;
    }

    pub fn is_awaiting_delete_confirmation(&self) -> bool {
        self.confirm_delete
    }

    // ========================================================================
    // Chargement et statut
    // ========================================================================

    /// Une commande part au worker
    ///
    /// CONCEPT : Compteur plutôt que booléen
    /// - Le worker traite les commandes une par une
    /// - L'indicateur reste affiché tant qu'il reste des réponses attendues
    pub fn start_loading(&mut self, message: Option<String>) {
        self.pending += 1;
        self.is_loading = true;
        self.loading_message = message;
    }

    /// Une réponse du worker est arrivée
    pub fn stop_loading(&mut self) {
        self.pending = self.pending.saturating_sub(1);
        if self.pending == 0 {
            self.is_loading = false;
            self.loading_message = None;
        }
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
        });
        self.status_ttl = STATUS_TICKS;
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: true,
        });
        self.status_ttl = STATUS_TICKS;
    }

    pub fn clear_status(&mut self) {
        self.status = None;
        self.status_ttl = 0;
    }

    // ========================================================================
    // Mode saisie
    // ========================================================================

    /// Passe en mode saisie (Vim-like '/')
    pub fn start_input(&mut self, prompt: String) {
        if !matches!(self.current_screen, Screen::InputMode) {
            self.previous_screen = self.current_screen;
        }
        self.current_screen = Screen::InputMode;
        self.input_prompt = prompt;
        self.input_buffer.clear();
    }

    pub fn cancel_input(&mut self) {
        self.leave_input();
    }

    /// Valide la saisie et retourne le texte tapé
    ///
    /// CONCEPT RUST : std::mem::take
    /// - Récupère le String en laissant un String vide à sa place
    pub fn submit_input(&mut self) -> String {
        let input = std::mem::take(&mut self.input_buffer);
        self.leave_input();
        input
    }

    fn leave_input(&mut self) {
        self.input_buffer.clear();
        self.input_prompt.clear();
        self.current_screen = self.previous_screen;
    }

    pub fn append_char(&mut self, c: char) {
        self.input_buffer.push(c);
    }

    pub fn backspace(&mut self) {
        self.input_buffer.pop();
    }

    pub fn is_in_input_mode(&self) -> bool {
        self.current_screen == Screen::InputMode
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(UserSettings::default())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn step_down(index: usize, len: usize) -> usize {
    (index + 1).min(len.saturating_sub(1))
}

fn clamp_index(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}

fn or_fallback(values: &[String], fallback: &[&str]) -> Vec<String> {
    if values.is_empty() {
        fallback.iter().map(|v| v.to_string()).collect()
    } else {
        values.to_vec()
    }
}

/// Valeur voisine dans une liste circulaire
///
/// Une valeur courante absente de la liste repart du début.
fn cycle(values: &[String], current: &str, forward: bool) -> Option<String> {
    if values.is_empty() {
        return None;
    }
    let next = match values.iter().position(|v| v == current) {
        Some(i) if forward => (i + 1) % values.len(),
        Some(i) => (i + values.len() - 1) % values.len(),
        None => 0,
    };
    Some(values[next].clone())
}

// ============================================================================
// Tests unitaires
// ============================================================================
