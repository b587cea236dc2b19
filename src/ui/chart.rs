// ============================================================================
// Chart - Page d'un coin
// ============================================================================
// Header (prix, variation 24h, étoile favori), stats à gauche, graphique à
// droite (courbe des prix ou chandeliers) et volumes en dessous.
//
// CONCEPTS RATATUI :
// 1. Chart widget : courbe (x = timestamp, y = prix)
// 2. BarChart : variations par période
// 3. Sparkline : volumes
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        block::{Position, Title},
        Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph, Sparkline,
    },
    Frame,
};

use crate::app::{App, ChartMode};
use crate::models::coin::format_price;
use crate::models::{ChartRange, CoinDetail, MarketChart};
use crate::services::CoinView;
use crate::ui::candles::CandleRenderer;
use crate::ui::dashboard::render_message;
use crate::ui::theme::Theme;

/// Largeur du panneau de stats
const STATS_WIDTH: u16 = 38;

/// Dessine la page du coin courant
pub fn render_coin_page(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let view = match &app.coin {
        Some(view) => view,
        None => {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style());
            render_message(frame, theme, block, area, "Loading coin...");
            return;
        }
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area)
        .to_vec();

    render_coin_header(frame, view, theme, rows[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(STATS_WIDTH), Constraint::Min(0)])
        .split(rows[1])
        .to_vec();

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(10)])
        .split(columns[0])
        .to_vec();
    render_stats(frame, view, theme, left[0]);
    render_changes(frame, &view.detail, theme, left[1]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(5)])
        .split(columns[1])
        .to_vec();

    match app.chart_mode {
        ChartMode::Line => render_price_chart(frame, view, theme, right[0]),
        ChartMode::Candles => render_candles(frame, app, view.range, theme, right[0]),
    }
    render_volumes(frame, view, theme, right[1]);
}

// ============================================================================
// Header
// ============================================================================

fn render_coin_header(frame: &mut Frame, view: &CoinView, theme: &Theme, area: Rect) {
    let detail = &view.detail;
    let star = if view.favourite { "★" } else { "☆" };
    let name = if detail.name.is_empty() { &view.coin_id } else { &detail.name };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .title(format!(" 📈 {} ({}) {} ", name, detail.symbol.to_uppercase(), star));

    let change = detail.price_change_percentage_24h();
    let color = theme.trend_color(detail.price_change_24h());

    let mut spans = vec![Span::raw("Price: ")];
    match view.current_price() {
        Some(price) => spans.push(Span::styled(
            format!("{} {}", format_price(price), view.quote_currency.to_uppercase()),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        None => spans.push(Span::styled("N/A", Style::default().fg(theme.muted))),
    }
    if let Some(change) = change {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("{} {:+.2}% (24h)", view.price_change_indicator(), change),
            Style::default().fg(color),
        ));
    }
    spans.push(Span::raw("  "));
    spans.push(Span::styled(format!("[{}]", view.range.label()), theme.key_style()));
    if view.from_cache {
        spans.push(Span::styled("  offline (cached)", Style::default().fg(theme.warning)));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Stats
// ============================================================================

/// Lignes "label  valeur" du panneau de stats
pub fn stat_lines(detail: &CoinDetail, vs: &str) -> Vec<(String, String)> {
    let data = detail.current_data(vs);
    let vs_upper = vs.to_uppercase();

    let price = |v: Option<f64>| v.map(format_price).unwrap_or_else(|| "-".to_string());
    let amount = |v: Option<f64>| v.map(|v| format!("{:.0}", v)).unwrap_or_else(|| "-".to_string());
    let percent = |v: Option<f64>| v.map(|v| format!("{:+.2}%", v)).unwrap_or_else(|| "-".to_string());

    let mut lines = vec![
        (format!("Price ({})", vs_upper), price(data.current_price)),
        ("24h High".to_string(), price(data.high_24h)),
        ("24h Low".to_string(), price(data.low_24h)),
        (format!("Volume ({})", vs_upper), amount(data.total_volume)),
        ("Change 24h".to_string(), percent(data.price_change_percentage_24h)),
        ("Change 7d".to_string(), percent(data.price_change_percentage_7d)),
        ("Change 30d".to_string(), percent(data.price_change_percentage_30d)),
        ("Circulating".to_string(), amount(data.circulating_supply)),
        ("Total supply".to_string(), amount(data.total_supply)),
        ("Max supply".to_string(), amount(data.max_supply)),
        (
            "MCap / FDV".to_string(),
            data.market_cap_fdv_ratio
                .map(|r| format!("{:.2}", r))
                .unwrap_or_else(|| "-".to_string()),
        ),
    ];

    if let (Some(up), Some(down)) = (data.sentiment_votes_up_percentage, data.sentiment_votes_down_percentage) {
        lines.push(("Votes".to_string(), format!("▲ {:.0}% ▼ {:.0}%", up, down)));
    }
    if let Some(homepage) = data.homepage.as_ref().and_then(|h| h.iter().find(|url| !url.is_empty())) {
        lines.push(("Homepage".to_string(), homepage.clone()));
    }
    if let Some(updated) = data.last_updated {
        lines.push(("Updated".to_string(), updated.format("%d/%m/%y %H:%M").to_string()));
    }

    lines
}

fn render_stats(frame: &mut Frame, view: &CoinView, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .title(" Stats ");

    let text: Vec<Line> = stat_lines(&view.detail, &view.quote_currency)
        .into_iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(format!("{:<14}", label), Style::default().fg(theme.muted)),
                Span::styled(value, Style::default().fg(theme.text)),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(text).block(block), area);
}

/// Variations par période en barres
///
/// BarChart n'accepte que des u64 : la hauteur est la valeur absolue, le
/// signe passe par la couleur et le texte.
fn render_changes(frame: &mut Frame, detail: &CoinDetail, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .title(" Change % ");

    let md = match &detail.market_data {
        Some(md) => md,
        None => {
            render_message(frame, theme, block, area, "No market data");
            return;
        }
    };

    let periods = [
        ("24h", md.price_change_percentage_24h),
        ("7d", md.price_change_percentage_7d),
        ("14d", md.price_change_percentage_14d),
        ("30d", md.price_change_percentage_30d),
        ("60d", md.price_change_percentage_60d),
        ("1y", md.price_change_percentage_1y),
    ];

    let bars: Vec<Bar> = periods
        .iter()
        .filter_map(|(label, change)| change.map(|c| (*label, c)))
        .map(|(label, change)| {
            Bar::default()
                .label(Line::from(label))
                .value((change.abs() * 100.0).round() as u64)
                .text_value(format!("{:+.0}", change))
                .style(Style::default().fg(theme.trend_color(Some(change))))
        })
        .collect();

    if bars.is_empty() {
        render_message(frame, theme, block, area, "No change data");
        return;
    }

    let chart = BarChart::default()
        .block(block)
        .bar_width(4)
        .bar_gap(1)
        .value_style(Style::default().fg(theme.text).add_modifier(Modifier::BOLD))
        .data(BarGroup::default().bars(&bars));

    frame.render_widget(chart, area);
}

// ============================================================================
// Graphique des prix
// ============================================================================

/// Points (timestamp en secondes, prix) pour le Chart widget
pub fn price_series(chart: &MarketChart) -> Vec<(f64, f64)> {
    chart
        .price_points()
        .iter()
        .map(|p| (p.time.timestamp() as f64, p.value))
        .collect()
}

fn render_price_chart(frame: &mut Frame, view: &CoinView, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .title(format!(" Price - {} ", view.range.label()));

    let chart = match &view.chart {
        Some(chart) => chart,
        None if view.from_cache => {
            render_message(frame, theme, block, area, "Chart unavailable offline");
            return;
        }
        None => {
            render_message(frame, theme, block, area, "No chart data");
            return;
        }
    };

    let points = price_series(chart);
    let (min_price, max_price) = match chart.price_bounds() {
        Some(bounds) if points.len() > 1 => bounds,
        _ => {
            render_message(frame, theme, block, area, "Not enough points to draw");
            return;
        }
    };

    // Marge de 5% pour que la courbe respire
    let margin = ((max_price - min_price) * 0.05).max(max_price.abs() * 0.001);
    let y_min = (min_price - margin).max(0.0);
    let y_max = max_price + margin;

    let color = theme.trend_color(chart.change_percent());
    let datasets = vec![Dataset::default()
        .name(view.coin_id.as_str())
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&points)];

    let prices = chart.price_points();
    let x_labels = x_axis_labels(chart, view.range);
    let x_axis = Axis::default()
        .style(Style::default().fg(theme.muted))
        .bounds([points[0].0, points[points.len() - 1].0])
        .labels(x_labels.into_iter().map(Span::raw).collect());

    let y_axis = Axis::default()
        .title(view.quote_currency.to_uppercase())
        .style(Style::default().fg(theme.muted))
        .bounds([y_min, y_max])
        .labels(vec![
            Span::raw(format_price(y_min)),
            Span::raw(format_price((y_min + y_max) / 2.0)),
            Span::raw(format_price(y_max)),
        ]);

    let change = chart
        .change_percent()
        .map(|c| format!(" {:+.2}% over {} points ", c, prices.len()))
        .unwrap_or_default();

    let widget = Chart::new(datasets)
        .block(block.title(Title::from(change).position(Position::Bottom)))
        .x_axis(x_axis)
        .y_axis(y_axis);

    frame.render_widget(widget, area);
}

/// Dates du début, du milieu et de la fin de la série
pub fn x_axis_labels(chart: &MarketChart, range: ChartRange) -> Vec<String> {
    let prices = chart.price_points();
    let format = range.axis_format();
    match (prices.first(), prices.get(prices.len() / 2), prices.last()) {
        (Some(first), Some(middle), Some(last)) => vec![
            first.time.format(format).to_string(),
            middle.time.format(format).to_string(),
            last.time.format(format).to_string(),
        ],
        _ => Vec::new(),
    }
}

fn render_candles(frame: &mut Frame, app: &App, range: ChartRange, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .title(format!(" OHLC - {} ", range.label()));

    let candles = match &app.candles {
        Some(candles) if !candles.is_empty() => candles,
        Some(_) => {
            render_message(frame, theme, block, area, "No candles for this range");
            return;
        }
        None => {
            render_message(frame, theme, block, area, "Loading candles...");
            return;
        }
    };

    let inner = block.inner(area);
    let renderer = CandleRenderer::new(candles, range, *theme, inner.width, inner.height);
    frame.render_widget(Paragraph::new(renderer.render_lines()).block(block), area);
}

// ============================================================================
// Volumes
// ============================================================================

/// Volumes ramenés sur 0..=100 pour le Sparkline (qui veut des u64)
pub fn scaled_volumes(chart: &MarketChart) -> Vec<u64> {
    let volumes = chart.volume_points();
    let max = volumes.iter().fold(0.0_f64, |m, p| m.max(p.value));
    if max <= 0.0 {
        return vec![0; volumes.len()];
    }
    volumes
        .iter()
        .map(|p| ((p.value / max) * 100.0).round() as u64)
        .collect()
}

fn render_volumes(frame: &mut Frame, view: &CoinView, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .title(" Volume ");

    let data = view.chart.as_ref().map(scaled_volumes).unwrap_or_default();
    if data.is_empty() {
        render_message(frame, theme, block, area, "");
        return;
    }

    // Les derniers points qui tiennent dans la largeur
    let width = block.inner(area).width as usize;
    let start = data.len().saturating_sub(width);

    let sparkline = Sparkline::default()
        .block(block)
        .data(&data[start..])
        .style(Style::default().fg(theme.accent));

    frame.render_widget(sparkline, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MarketChartResponse, MarketData};
    use ratatui::{backend::TestBackend, Terminal};

    fn chart() -> MarketChart {
        let raw = MarketChartResponse {
            prices: Some(vec![
                vec![1_700_000_000_000.0, 100.0],
                vec![1_700_086_400_000.0, 110.0],
                vec![1_700_172_800_000.0, 120.0],
            ]),
            market_caps: None,
            total_volumes: Some(vec![
                vec![1_700_000_000_000.0, 50.0],
                vec![1_700_086_400_000.0, 200.0],
            ]),
        };
        MarketChart::from_response(&raw).unwrap()
    }

    #[test]
    fn test_price_series_in_seconds() {
        let series = price_series(&chart());
        assert_eq!(series[0], (1_700_000_000.0, 100.0));
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn test_scaled_volumes() {
        assert_eq!(scaled_volumes(&chart()), vec![25, 100]);
        assert!(scaled_volumes(&MarketChart::default()).is_empty());
    }

    #[test]
    fn test_x_axis_labels() {
        let labels = x_axis_labels(&chart(), ChartRange::OneMonth);
        assert_eq!(labels, vec!["14/11/23", "15/11/23", "16/11/23"]);
        assert!(x_axis_labels(&MarketChart::default(), ChartRange::OneMonth).is_empty());
    }

    #[test]
    fn test_stat_lines() {
        let mut detail = CoinDetail::default();
        detail.market_data = Some(MarketData {
            price_change_percentage_7d: Some(-4.5),
            ..Default::default()
        });
        let lines = stat_lines(&detail, "eur");
        assert_eq!(lines[0], ("Price (EUR)".to_string(), "-".to_string()));
        assert!(lines.contains(&("Change 7d".to_string(), "-4.50%".to_string())));
        assert!(!lines.iter().any(|(label, _)| label == "Votes"));
    }

    #[test]
    fn test_render_coin_page() {
        let mut app = App::default();
        app.show_coin();
        app.set_coin(CoinView {
            coin_id: "bitcoin".to_string(),
            detail: CoinDetail {
                name: "Bitcoin".to_string(),
                symbol: "btc".to_string(),
                ..Default::default()
            },
            chart: Some(chart()),
            range: ChartRange::OneWeek,
            quote_currency: "usd".to_string(),
            favourite: true,
            from_cache: false,
        });

        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        terminal.draw(|frame| crate::ui::render(frame, &app)).unwrap();

        let text: String = terminal.backend().buffer().content.iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Bitcoin (BTC) ★"));
        assert!(text.contains("Price - 7D"));

        app.toggle_chart_mode();
        terminal.draw(|frame| crate::ui::render(frame, &app)).unwrap();
        let text: String = terminal.backend().buffer().content.iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Loading candles..."));
    }
}
