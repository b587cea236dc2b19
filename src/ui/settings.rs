// ============================================================================
// Page des réglages
// ============================================================================

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, SettingField};
use crate::ui::theme::Theme;

/// Valeur affichée d'un réglage
pub fn setting_value(app: &App, field: SettingField) -> String {
    let settings = &app.settings;
    match field {
        SettingField::DarkMode => if settings.dark_mode { "on" } else { "off" }.to_string(),
        SettingField::QuoteCurrency => settings.quote_currency.to_uppercase(),
        SettingField::MaxFavourites => settings.max_favourites.to_string(),
        SettingField::Exchange => match &app.exchange_override {
            Some(exchange) => format!("{} (--exchange {})", settings.exchange_id, exchange),
            None => settings.exchange_id.clone(),
        },
        SettingField::Reset => String::new(),
    }
}

pub fn render_settings(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(5)])
        .split(area)
        .to_vec();

    let items: Vec<ListItem> = SettingField::ALL
        .iter()
        .map(|field| {
            let value = setting_value(app, *field);
            let line = if value.is_empty() {
                Line::from(Span::styled(field.label(), Style::default().fg(theme.warning)))
            } else {
                Line::from(vec![
                    Span::styled(format!("{:<18}", field.label()), Style::default().fg(theme.muted)),
                    Span::styled("◀ ", Style::default().fg(theme.muted)),
                    Span::styled(value, Style::default().fg(theme.text).add_modifier(Modifier::BOLD)),
                    Span::styled(" ▶", Style::default().fg(theme.muted)),
                ])
            };
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style())
                .title(" ⚙ Settings "),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("▶ ");

    let mut state = ListState::default().with_selected(Some(app.setting_index));
    frame.render_stateful_widget(list, chunks[0], &mut state);

    // Aide : d'où viennent les valeurs proposées
    let currencies = if app.supported_currencies.is_empty() {
        "built-in list".to_string()
    } else {
        format!("{} from CoinGecko", app.supported_currencies.len())
    };
    let exchanges = if app.exchange_ids.is_empty() {
        "built-in list".to_string()
    } else {
        format!("{} from CoinGecko", app.exchange_ids.len())
    };

    let help = vec![
        Line::from(vec![
            Span::styled("Currencies: ", Style::default().fg(theme.muted)),
            Span::raw(currencies),
            Span::styled("   Exchanges: ", Style::default().fg(theme.muted)),
            Span::raw(exchanges),
        ]),
        Line::from(Span::styled(
            "Changes are saved immediately. [r] reloads both lists from the API.",
            Style::default().fg(theme.muted),
        )),
    ];

    let paragraph = Paragraph::new(help)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style()),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, chunks[1]);
}
