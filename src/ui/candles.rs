// ============================================================================
// Chandeliers japonais en mode texte
// ============================================================================
// Dessine les chandelles de /coins/{id}/ohlc ligne par ligne, de haut en bas.
// Pour chaque ligne et chaque chandelle on choisit un caractère Unicode
// selon la zone traversée : mèche haute, corps, mèche basse. Les seuils
// 0.25 / 0.75 donnent une précision d'un demi-caractère.
//
// ┃ corps plein          │ mèche pleine
// ╻ demi-corps (bas)     ╹ demi-corps (haut)
// ╽ corps puis mèche     ╿ mèche puis corps
// ╷ demi-mèche haute     ╵ demi-mèche basse
// ============================================================================

use ratatui::{
    style::Style,
    text::{Line, Span},
};

use crate::models::coin::format_price;
use crate::models::{Candle, ChartRange};
use crate::ui::theme::Theme;

const VOID: char = ' ';
const BODY: char = '┃';
const HALF_BODY_BOTTOM: char = '╻';
const HALF_BODY_TOP: char = '╹';
const WICK: char = '│';
const BODY_TO_WICK_UP: char = '╽';
const WICK_TO_BODY_DOWN: char = '╿';
const UPPER_HALF_WICK: char = '╷';
const LOWER_HALF_WICK: char = '╵';

/// Largeur de l'axe des prix ("  12345.67 │ ")
const Y_AXIS_WIDTH: usize = 14;

/// Lignes réservées sous le graphique pour les dates
const X_AXIS_HEIGHT: u16 = 2;

/// Renderer de chandeliers pour une zone de width x height caractères
pub struct CandleRenderer<'a> {
    candles: &'a [Candle],
    range: ChartRange,
    theme: Theme,
    min_price: f64,
    max_price: f64,
    height: u16,
    width: usize,
}

impl<'a> CandleRenderer<'a> {
    pub fn new(candles: &'a [Candle], range: ChartRange, theme: Theme, width: u16, height: u16) -> Self {
        let width = (width as usize).saturating_sub(Y_AXIS_WIDTH);
        let height = height.saturating_sub(X_AXIS_HEIGHT);

        // Seules les dernières chandelles qui tiennent dans la largeur comptent
        let visible = if candles.len() > width {
            &candles[candles.len() - width..]
        } else {
            candles
        };
        let (min_price, max_price) = price_bounds(visible);

        Self {
            candles: visible,
            range,
            theme,
            min_price,
            max_price,
            height,
            width,
        }
    }

    /// Convertit un prix en hauteur (0 = bas du graphique)
    fn height_of(&self, price: f64) -> f64 {
        if self.max_price <= self.min_price {
            return self.height as f64 / 2.0;
        }
        (price - self.min_price) / (self.max_price - self.min_price) * self.height as f64
    }

    /// Caractère d'une chandelle sur la ligne `y`
    fn glyph(&self, candle: &Candle, y: u16) -> char {
        let y = y as f64;
        let high = self.height_of(candle.high);
        let low = self.height_of(candle.low);
        let top = self.height_of(candle.open.max(candle.close));
        let bottom = self.height_of(candle.open.min(candle.close));

        if high.ceil() >= y && y >= top.floor() {
            // Mèche haute
            if top - y > 0.75 {
                BODY
            } else if top - y > 0.25 {
                if high - y > 0.75 {
                    BODY_TO_WICK_UP
                } else {
                    HALF_BODY_BOTTOM
                }
            } else if high - y > 0.75 {
                WICK
            } else if high - y > 0.25 {
                UPPER_HALF_WICK
            } else {
                VOID
            }
        } else if top.floor() >= y && y >= bottom.ceil() {
            BODY
        } else if bottom.ceil() >= y && y >= low.floor() {
            // Mèche basse
            if bottom - y < 0.25 {
                BODY
            } else if bottom - y < 0.75 {
                if low - y < 0.25 {
                    WICK_TO_BODY_DOWN
                } else {
                    HALF_BODY_TOP
                }
            } else if low - y < 0.25 {
                WICK
            } else if low - y < 0.75 {
                LOWER_HALF_WICK
            } else {
                VOID
            }
        } else {
            VOID
        }
    }

    /// Colonne de chaque chandelle
    ///
    /// Chaque position est calculée depuis l'index (i * spacing) et non
    /// depuis la précédente, pour que les arrondis ne s'accumulent pas.
    fn columns(&self) -> Vec<usize> {
        match self.candles.len() {
            0 => Vec::new(),
            1 => vec![self.width / 2],
            n => {
                let spacing = self.width as f64 / n as f64;
                (0..n)
                    .map(|i| ((i as f64 * spacing).round() as usize).min(self.width.saturating_sub(1)))
                    .collect()
            }
        }
    }

    fn y_label(&self, y: u16) -> String {
        if y % 4 == 0 && self.height > 0 {
            let price = self.min_price + y as f64 * (self.max_price - self.min_price) / self.height as f64;
            format!("{:>11} │ ", format_price(price))
        } else {
            format!("{:>11} │ ", "")
        }
    }

    /// Toutes les lignes : chandelles puis axe des dates
    pub fn render_lines(&self) -> Vec<Line<'static>> {
        let columns = self.columns();
        if columns.is_empty() {
            return Vec::new();
        }

        let mut lines = Vec::with_capacity(self.height as usize + X_AXIS_HEIGHT as usize);
        for y in (1..=self.height).rev() {
            let mut spans = vec![Span::styled(self.y_label(y), Style::default().fg(self.theme.muted))];
            let mut cursor = 0;
            for (candle, &column) in self.candles.iter().zip(&columns) {
                if column > cursor {
                    spans.push(Span::raw(" ".repeat(column - cursor)));
                }
                let color = if candle.is_bullish() {
                    self.theme.up
                } else {
                    self.theme.down
                };
                spans.push(Span::styled(self.glyph(candle, y).to_string(), Style::default().fg(color)));
                cursor = column + 1;
            }
            lines.push(Line::from(spans));
        }

        lines.extend(self.x_axis(&columns));
        lines
    }

    /// Ticks et dates sous quelques chandelles, sans chevauchement
    fn x_axis(&self, columns: &[usize]) -> Vec<Line<'static>> {
        let format = self.range.axis_format();
        let label_width = self
            .candles
            .first()
            .map(|c| c.time.format(format).to_string().chars().count())
            .unwrap_or(8);

        let mut ticks = " ".repeat(Y_AXIS_WIDTH);
        let mut labels = " ".repeat(Y_AXIS_WIDTH);
        let mut next_free = 0;

        for (candle, &column) in self.candles.iter().zip(columns) {
            if column < next_free || column + label_width > self.width {
                continue;
            }
            pad_to(&mut ticks, Y_AXIS_WIDTH + column);
            ticks.push('│');
            pad_to(&mut labels, Y_AXIS_WIDTH + column);
            labels.push_str(&candle.time.format(format).to_string());
            next_free = column + label_width + 2;
        }

        let style = Style::default().fg(self.theme.muted);
        vec![
            Line::from(Span::styled(ticks, style)),
            Line::from(Span::styled(labels, style)),
        ]
    }
}

/// Bornes de prix avec une marge de 2%
fn price_bounds(candles: &[Candle]) -> (f64, f64) {
    if candles.is_empty() {
        return (0.0, 0.0);
    }
    let max = candles.iter().fold(f64::NEG_INFINITY, |m, c| m.max(c.high));
    let min = candles.iter().fold(f64::INFINITY, |m, c| m.min(c.low));
    let margin = (max - min) * 0.02;
    ((min - margin).max(0.0), max + margin)
}

/// Complète une ligne avec des espaces jusqu'à la colonne `width`
fn pad_to(line: &mut String, width: usize) {
    let len = line.chars().count();
    if len < width {
        line.push_str(&" ".repeat(width - len));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(day: i64, open: f64, high: f64, low: f64, close: f64) -> Candle {
        let millis = (1_700_000_000 + day * 86_400) as f64 * 1000.0;
        Candle::from_row(&[millis, open, high, low, close]).unwrap()
    }

    #[test]
    fn test_body_and_wicks() {
        let candles = vec![candle(0, 10.0, 20.0, 0.0, 15.0)];
        let renderer = CandleRenderer::new(&candles, ChartRange::OneMonth, Theme::light(), 40, 22);
        let column: Vec<char> = (1..=renderer.height).rev().map(|y| renderer.glyph(&candles[0], y)).collect();

        assert!(column.contains(&BODY));
        assert!(column.contains(&WICK));
        // Le haut du graphique est au-dessus du plus haut (marge de 2%)
        assert_eq!(column[0], VOID);
    }

    #[test]
    fn test_keeps_last_candles_that_fit() {
        let candles: Vec<Candle> = (0..100).map(|d| candle(d, 1.0, 2.0, 0.5, 1.5)).collect();
        let renderer = CandleRenderer::new(&candles, ChartRange::ThreeMonths, Theme::dark(), 50, 12);
        assert_eq!(renderer.candles.len(), 50 - Y_AXIS_WIDTH);
        assert_eq!(renderer.candles.last(), candles.last());
    }

    #[test]
    fn test_render_lines_height() {
        let candles: Vec<Candle> = (0..5).map(|d| candle(d, 1.0, 2.0, 0.5, 1.5)).collect();
        let renderer = CandleRenderer::new(&candles, ChartRange::OneWeek, Theme::light(), 60, 12);
        assert_eq!(renderer.render_lines().len(), 12);
        assert!(CandleRenderer::new(&[], ChartRange::OneWeek, Theme::light(), 60, 12)
            .render_lines()
            .is_empty());
    }

    #[test]
    fn test_columns_spread_over_width() {
        let candles: Vec<Candle> = (0..4).map(|d| candle(d, 1.0, 2.0, 0.5, 1.5)).collect();
        let renderer = CandleRenderer::new(&candles, ChartRange::OneMonth, Theme::light(), 54, 12);
        assert_eq!(renderer.columns(), vec![0, 10, 20, 30]);
    }
}
