// ============================================================================
// Page des favoris
// ============================================================================
// Liste des favoris à gauche (nom, prix, variation 24h, mini-sparkline
// texte), détail du favori sélectionné à droite (sparkline 7 jours et
// lignes de stats).
// ============================================================================

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Sparkline},
    Frame,
};

use crate::app::App;
use crate::models::coin::format_price;
use crate::models::FavouriteEntry;
use crate::ui::dashboard::render_message;
use crate::ui::theme::Theme;

/// Caractères d'une sparkline texte, du plus bas au plus haut
const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Largeur de la mini-sparkline dans la liste
const INLINE_SPARK_WIDTH: usize = 16;

pub fn render_favourites(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .title(format!(
            " ★ Favourites {}/{} ",
            app.favourites.len(),
            app.settings.max_favourites
        ));

    if app.favourites.is_empty() {
        render_message(
            frame,
            theme,
            block,
            area,
            "No favourites yet: open a coin and press [s]",
        );
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area)
        .to_vec();

    let vs = app.quote_currency();
    let items: Vec<ListItem> = app
        .favourites
        .iter()
        .map(|entry| ListItem::new(favourite_line(entry, vs, theme)))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED))
        .highlight_symbol("▶ ");

    let mut state = ListState::default().with_selected(Some(app.favourite_index));
    frame.render_stateful_widget(list, chunks[0], &mut state);

    if let Some(entry) = app.selected_favourite() {
        render_favourite_detail(frame, entry, vs, theme, chunks[1]);
    }
}

/// Une ligne de la liste : nom, prix, variation et sparkline texte
fn favourite_line(entry: &FavouriteEntry, vs: &str, theme: &Theme) -> Line<'static> {
    let detail = match &entry.detail {
        Some(detail) => detail,
        None => {
            return Line::from(vec![
                Span::styled(format!("{:<18}", entry.display_name()), Style::default().fg(theme.text)),
                Span::styled("unavailable", Style::default().fg(theme.muted)),
            ]);
        }
    };

    let color = theme.trend_color(detail.price_change_24h());
    let price = detail
        .current_price(vs)
        .map(format_price)
        .unwrap_or_else(|| "N/A".to_string());
    let change = detail
        .price_change_percentage_24h()
        .map(|c| format!("{:+.2}%", c))
        .unwrap_or_default();
    let arrow = match entry.is_up_24h() {
        Some(true) => "▲",
        Some(false) => "▼",
        None => " ",
    };
    let spark = detail
        .sparkline()
        .map(|prices| text_sparkline(prices, INLINE_SPARK_WIDTH))
        .unwrap_or_default();

    Line::from(vec![
        Span::styled(format!("{:<18}", entry.display_name()), Style::default().fg(theme.text)),
        Span::styled(format!("{:>14} ", price), Style::default().fg(color)),
        Span::styled(format!("{} {:<9}", arrow, change), Style::default().fg(color)),
        Span::styled(spark, Style::default().fg(color)),
    ])
}

fn render_favourite_detail(frame: &mut Frame, entry: &FavouriteEntry, vs: &str, theme: &Theme, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(7)])
        .split(area)
        .to_vec();

    let title = format!(" {} ", entry.display_name());
    let spark_block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .title(format!("{}- 7d ", title));

    let detail = match &entry.detail {
        Some(detail) => detail,
        None => {
            render_message(frame, theme, spark_block, area, "Detail unavailable, press [r] to retry");
            return;
        }
    };

    let data = detail.sparkline().map(scale_to_u64).unwrap_or_default();
    if data.is_empty() {
        render_message(frame, theme, spark_block, chunks[0], "No sparkline data");
    } else {
        let width = spark_block.inner(chunks[0]).width as usize;
        let sampled = resample(&data, width);
        let sparkline = Sparkline::default()
            .block(spark_block)
            .data(&sampled)
            .style(Style::default().fg(theme.trend_color(detail.price_change_24h())));
        frame.render_widget(sparkline, chunks[0]);
    }

    let rows: Vec<Line> = detail
        .stats_rows(vs)
        .into_iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(format!("{:<20}", label), Style::default().fg(theme.muted)),
                Span::styled(value, Style::default().fg(theme.text)),
            ])
        })
        .collect();

    let stats = Paragraph::new(rows).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style())
            .title(title),
    );
    frame.render_widget(stats, chunks[1]);
}

// ============================================================================
// Sparklines
// ============================================================================

/// Sparkline texte de `width` caractères (▁ à █)
///
/// Les valeurs sont rééchantillonnées puis ramenées entre min et max.
pub fn text_sparkline(values: &[f64], width: usize) -> String {
    let sampled = resample(values, width);
    let (min, max) = sampled
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    sampled
        .iter()
        .map(|&v| {
            if max <= min {
                SPARK_LEVELS[SPARK_LEVELS.len() / 2]
            } else {
                let level = ((v - min) / (max - min) * (SPARK_LEVELS.len() - 1) as f64).round() as usize;
                SPARK_LEVELS[level.min(SPARK_LEVELS.len() - 1)]
            }
        })
        .collect()
}

/// Prix ramenés sur 0..=100 au-dessus du minimum (Sparkline veut des u64)
pub fn scale_to_u64(values: &[f64]) -> Vec<u64> {
    let (min, max) = values
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    values
        .iter()
        .map(|&v| {
            if max <= min {
                50
            } else {
                (((v - min) / (max - min)) * 100.0).round() as u64
            }
        })
        .collect()
}

/// Garde au plus `width` valeurs réparties sur toute la série
///
/// CONCEPT RUST : Generics avec Copy
/// - Même fonction pour les f64 (texte) et les u64 (widget)
fn resample<T: Copy>(values: &[T], width: usize) -> Vec<T> {
    if width == 0 || values.len() <= width {
        return values.to_vec();
    }
    let step = values.len() as f64 / width as f64;
    (0..width)
        .map(|i| values[((i as f64 * step) as usize).min(values.len() - 1)])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CoinDetail, MarketData};
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_text_sparkline() {
        assert_eq!(text_sparkline(&[1.0, 2.0, 3.0], 10), "▁▅█");
        assert_eq!(text_sparkline(&[5.0, 5.0], 10), "▅▅");
        assert_eq!(text_sparkline(&[], 10), "");

        let long: Vec<f64> = (0..168).map(|i| i as f64).collect();
        let spark = text_sparkline(&long, 16);
        assert_eq!(spark.chars().count(), 16);
        assert!(spark.starts_with('▁'));
        assert!(spark.ends_with('█'));
    }

    #[test]
    fn test_scale_to_u64() {
        assert_eq!(scale_to_u64(&[10.0, 15.0, 20.0]), vec![0, 50, 100]);
        assert_eq!(scale_to_u64(&[3.0, 3.0]), vec![50, 50]);
    }

    #[test]
    fn test_resample_keeps_short_series() {
        assert_eq!(resample(&[1, 2, 3], 10), vec![1, 2, 3]);
        assert_eq!(resample(&[1, 2, 3, 4], 2), vec![1, 3]);
    }

    #[test]
    fn test_render_favourites() {
        let mut app = App::default();
        app.next_page();
        app.set_favourites(vec![
            FavouriteEntry {
                id: "bitcoin".to_string(),
                detail: Some(CoinDetail {
                    name: "Bitcoin".to_string(),
                    market_data: Some(MarketData {
                        price_change_24h: Some(120.0),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
            },
            FavouriteEntry {
                id: "dogecoin".to_string(),
                detail: None,
            },
        ]);

        let mut terminal = Terminal::new(TestBackend::new(140, 30)).unwrap();
        terminal.draw(|frame| crate::ui::render(frame, &app)).unwrap();

        let text: String = terminal.backend().buffer().content.iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Favourites 2/15"));
        assert!(text.contains("Bitcoin"));
        assert!(text.contains("dogecoin"));
        assert!(text.contains("unavailable"));
    }
}
