// ============================================================================
// Dashboard - Router et cadre commun
// ============================================================================
// Dessine le cadre de toutes les pages (onglets en haut, raccourcis ou
// saisie en bas) et la page exchange (tableau des tickers).
//
// CONCEPTS RATATUI :
// 1. Frame : surface de dessin
// 2. Layout : découpage de l'espace en zones
// 3. Table + TableState : tableau avec ligne sélectionnée et scroll
// 4. Tabs : barre d'onglets
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Tabs},
    Frame,
};

use crate::app::{App, Screen};
use crate::models::coin::format_price;
use crate::ui::theme::Theme;
use crate::ui::{chart, favourites, settings};

/// Pages du cycle Tab, dans l'ordre des onglets
const TAB_PAGES: [Screen; 3] = [Screen::Exchange, Screen::Favourites, Screen::Settings];

// ============================================================================
// Fonction principale de rendu
// ============================================================================

/// Dessine l'interface complète
///
/// CONCEPT RUST : Routing avec match sur enum
/// - En mode saisie, la page d'origine reste visible derrière
/// - Le compilateur garantit l'exhaustivité (tous les cas gérés)
pub fn render(frame: &mut Frame, app: &App) {
    let theme = Theme::from_dark_mode(app.settings.dark_mode);
    let size = frame.size();
    frame.render_widget(Block::default().style(theme.base()), size);

    let chunks = create_layout(size);
    render_header(frame, app, &theme, chunks[0]);

    let page = if app.is_in_input_mode() {
        app.previous_screen
    } else {
        app.current_screen
    };

    match page {
        Screen::Coin => chart::render_coin_page(frame, app, &theme, chunks[1]),
        Screen::Favourites => favourites::render_favourites(frame, app, &theme, chunks[1]),
        Screen::Settings => settings::render_settings(frame, app, &theme, chunks[1]),
        Screen::Exchange | Screen::InputMode => render_exchange(frame, app, &theme, chunks[1]),
    }

    if app.is_in_input_mode() {
        render_input_footer(frame, app, &theme, chunks[2]);
    } else {
        render_footer(frame, app, &theme, chunks[2]);
    }
}

/// Header (3 lignes), contenu, footer (4 lignes : raccourcis + statut)
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(4),
        ])
        .split(area)
        .to_vec()
}

// ============================================================================
// Header : onglets + indicateur de chargement
// ============================================================================

fn render_header(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let mut title = String::from(" LazyGecko ");
    if app.is_loading {
        let message = app.loading_message.as_deref().unwrap_or("Loading");
        title = format!(" LazyGecko ⟳ {}… ", message);
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .title(title)
        .title_alignment(Alignment::Center);

    // La page coin et la saisie n'ont pas d'onglet : on surligne la page d'origine
    let selected_page = match app.current_screen {
        Screen::Coin | Screen::InputMode => app.previous_screen,
        other => other,
    };
    let selected = TAB_PAGES.iter().position(|p| *p == selected_page).unwrap_or(0);

    let titles: Vec<Line> = TAB_PAGES.iter().map(|p| Line::from(p.title())).collect();
    let tabs = Tabs::new(titles)
        .block(block)
        .select(selected)
        .style(Style::default().fg(theme.muted))
        .highlight_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
        .divider("│");

    frame.render_widget(tabs, area);
}

// ============================================================================
// Page exchange : tableau des tickers
// ============================================================================

/// Dessine les tickers de l'exchange actif
///
/// CONCEPT RATATUI : render_stateful_widget
/// - TableState garde la ligne sélectionnée
/// - Le widget fait défiler tout seul pour la garder visible
fn render_exchange(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let vs = app.quote_currency();

    let title = match &app.tickers {
        Some(view) => {
            let name = view.exchange_name.as_deref().unwrap_or(&view.exchange_id);
            let origin = if view.from_cache { " (cache)" } else { "" };
            format!(" 📊 {} - {} tickers{} ", name, view.tickers.len(), origin)
        }
        None => format!(" 📊 {} ", app.active_exchange()),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .title(title);

    let tickers = match &app.tickers {
        Some(view) if !view.tickers.is_empty() => &view.tickers,
        Some(_) => {
            render_message(frame, theme, block, area, "No tickers for this exchange");
            return;
        }
        None => {
            render_message(frame, theme, block, area, "Loading tickers...");
            return;
        }
    };

    let header = Row::new(vec![
        Cell::from("Pair"),
        Cell::from("Coin"),
        Cell::from(format!("Last ({})", vs)),
        Cell::from(format!("Volume ({})", vs)),
        Cell::from("Spread"),
        Cell::from("Trust"),
    ])
    .style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = tickers
        .iter()
        .map(|ticker| {
            let last = ticker
                .converted_last_in(vs)
                .map(format_price)
                .unwrap_or_else(|| "N/A".to_string());
            let volume = ticker
                .converted_volume_in(vs)
                .map(|v| format!("{:.0}", v))
                .unwrap_or_else(|| "N/A".to_string());
            let spread = ticker
                .bid_ask_spread_percentage
                .map(|s| format!("{:.2}%", s))
                .unwrap_or_default();

            // trust_score : "green", "yellow" ou "red"
            let trust_color = match ticker.trust_score.as_deref() {
                Some("green") => theme.up,
                Some("red") => theme.down,
                Some("yellow") => theme.warning,
                _ => theme.muted,
            };

            let mut row_style = Style::default().fg(theme.text);
            if ticker.is_stale == Some(true) || ticker.is_anomaly == Some(true) {
                row_style = row_style.fg(theme.muted);
            }

            Row::new(vec![
                Cell::from(ticker.pair()),
                Cell::from(ticker.coin_id.clone().unwrap_or_default()),
                Cell::from(last),
                Cell::from(volume),
                Cell::from(spread),
                Cell::from(Span::styled("●", Style::default().fg(trust_color))),
            ])
            .style(row_style)
        })
        .collect();

    let widths = [
        Constraint::Percentage(22),
        Constraint::Percentage(22),
        Constraint::Percentage(18),
        Constraint::Percentage(20),
        Constraint::Percentage(10),
        Constraint::Percentage(8),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED))
        .highlight_symbol("▶ ");

    let mut state = TableState::default().with_selected(Some(app.ticker_index));
    frame.render_stateful_widget(table, area, &mut state);
}

// ============================================================================
// Footer : raccourcis, confirmations et statut
// ============================================================================

fn render_footer(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style());

    let warning = Style::default().fg(theme.warning).add_modifier(Modifier::BOLD);
    let blinking_key = Style::default()
        .fg(theme.down)
        .add_modifier(Modifier::BOLD)
        .add_modifier(Modifier::SLOW_BLINK);

    let shortcuts = if app.is_awaiting_delete_confirmation() {
        let name = app
            .selected_favourite()
            .map(|f| f.display_name().to_string())
            .unwrap_or_else(|| "?".to_string());
        Line::from(vec![
            Span::styled("⚠  Press ", warning),
            Span::styled("[d]", blinking_key),
            Span::styled(format!(" again to remove {} from favourites ⚠", name), warning),
        ])
    } else if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled("⚠  Press ", warning),
            Span::styled("[q]", blinking_key),
            Span::styled(" again to quit, any other key to cancel ⚠", warning),
        ])
    } else {
        shortcut_line(app.current_screen, theme)
    };

    let status = match &app.status {
        Some(status) => {
            let color = if status.is_error { theme.down } else { theme.accent };
            Line::from(Span::styled(status.text.clone(), Style::default().fg(color)))
        }
        None => Line::from(""),
    };

    let paragraph = Paragraph::new(vec![shortcuts, status])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Raccourcis disponibles sur une page
fn shortcut_line(screen: Screen, theme: &Theme) -> Line<'static> {
    let keys: &[(&str, &str)] = match screen {
        Screen::Exchange => &[
            ("[q]", "Quit"),
            ("[↑↓ / j k]", "Navigate"),
            ("[Enter]", "Coin"),
            ("[r]", "Refresh"),
            ("[/]", "Search"),
            ("[Tab]", "Next page"),
        ],
        Screen::Coin => &[
            ("[Esc]", "Back"),
            ("[h l]", "Range"),
            ("[c]", "Line/Candles"),
            ("[s]", "Star"),
            ("[r]", "Refresh"),
            ("[Tab]", "Next page"),
        ],
        Screen::Favourites => &[
            ("[q]", "Quit"),
            ("[↑↓ / j k]", "Navigate"),
            ("[Enter]", "Coin"),
            ("[d]", "Remove"),
            ("[r]", "Refresh"),
            ("[Tab]", "Next page"),
        ],
        Screen::Settings => &[
            ("[q]", "Quit"),
            ("[↑↓ / j k]", "Navigate"),
            ("[h l]", "Change value"),
            ("[r]", "Reload lists"),
            ("[Tab]", "Next page"),
        ],
        Screen::InputMode => &[("[Enter]", "Confirm"), ("[Esc]", "Cancel")],
    };

    let spans: Vec<Span<'static>> = keys
        .iter()
        .flat_map(|(key, label)| {
            [
                Span::styled(key.to_string(), theme.key_style()),
                Span::raw(format!(" {}  ", label)),
            ]
        })
        .collect();

    Line::from(spans)
}

// ============================================================================
// Input Mode : saisie d'un coin id
// ============================================================================

/// Dessine le footer en mode input avec la ligne de saisie
fn render_input_footer(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent)); // Couleur d'accent pour indiquer le mode input

    let input_line = Line::from(vec![
        Span::styled(
            app.input_prompt.clone(),
            Style::default().fg(theme.border).add_modifier(Modifier::BOLD),
        ),
        Span::styled(app.input_buffer.clone(), Style::default().fg(theme.text)),
        Span::styled(
            "█", // Curseur
            Style::default().fg(theme.text).add_modifier(Modifier::SLOW_BLINK),
        ),
    ]);

    let paragraph = Paragraph::new(vec![input_line, shortcut_line(Screen::InputMode, theme)])
        .block(block)
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Helper : message centré dans un bloc
// ============================================================================

pub(crate) fn render_message(frame: &mut Frame, theme: &Theme, block: Block, area: Rect, message: &str) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Style::default().fg(theme.muted))),
    ];

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Tests
// ============================================================================
// CONCEPT RATATUI : TestBackend
// - Un terminal en mémoire, sans vrai écran
// - On dessine puis on lit le contenu du buffer
// ============================================================================
