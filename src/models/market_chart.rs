// ============================================================================
// Market chart : séries temporelles d'un coin
// ============================================================================
// CoinGecko renvoie les séries sous forme de tableaux JSON :
//   "prices": [[1711929600000, 69702.3], [1711933200000, 69810.1], ...]
// Le premier élément est un timestamp Unix en millisecondes, le second la valeur.
//
// Ce module "nettoie" ces tableaux en structures typées :
// - [f64; 2]  -> ChartPoint { time, value }
// - [f64; 5]  -> Candle { time, open, high, low, close }
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GeckoError;

/// Limite de l'API gratuite : l'historique doit faire moins de 365 jours
pub const MAX_FREE_CHART_DAYS: u32 = 365;

/// Vérifie qu'une période respecte la limite de l'API gratuite
pub fn check_days(days: u32) -> Result<(), GeckoError> {
    if days >= MAX_FREE_CHART_DAYS {
        return Err(GeckoError::DaysOutOfRange {
            days,
            max: MAX_FREE_CHART_DAYS,
        });
    }
    Ok(())
}

/// Convertit un timestamp Unix en millisecondes (f64) en DateTime<Utc>
pub fn datetime_from_millis(millis: f64) -> Result<DateTime<Utc>, GeckoError> {
    if !millis.is_finite() {
        return Err(GeckoError::InvalidTimestamp(millis));
    }
    DateTime::from_timestamp_millis(millis as i64).ok_or(GeckoError::InvalidTimestamp(millis))
}

// ============================================================================
// Période affichée
// ============================================================================

/// Période du graphique (nombre de jours demandés à /market_chart)
///
/// CONCEPT : Cycle d'états, comme un sélecteur
/// - h / l dans la page coin font défiler les périodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartRange {
    OneDay,
    OneWeek,
    TwoWeeks,
    OneMonth,
    ThreeMonths,
    SixMonths,
    /// Maximum de l'API gratuite (364 jours)
    MaxFree,
}

impl ChartRange {
    /// Nombre de jours correspondant
    pub fn to_days(&self) -> u32 {
        match self {
            ChartRange::OneDay => 1,
            ChartRange::OneWeek => 7,
            ChartRange::TwoWeeks => 14,
            ChartRange::OneMonth => 30,
            ChartRange::ThreeMonths => 90,
            ChartRange::SixMonths => 180,
            ChartRange::MaxFree => MAX_FREE_CHART_DAYS - 1,
        }
    }

    /// Jours demandés à /ohlc
    ///
    /// /ohlc n'accepte que 1, 7, 14, 30, 90, 180 et 365 jours, et 365 dépasse
    /// la limite gratuite : la période max retombe sur 180.
    pub fn ohlc_days(&self) -> u32 {
        match self {
            ChartRange::MaxFree => 180,
            other => other.to_days(),
        }
    }

    /// Label court pour l'affichage
    pub fn label(&self) -> &'static str {
        match self {
            ChartRange::OneDay => "24h",
            ChartRange::OneWeek => "7D",
            ChartRange::TwoWeeks => "14D",
            ChartRange::OneMonth => "1M",
            ChartRange::ThreeMonths => "3M",
            ChartRange::SixMonths => "6M",
            ChartRange::MaxFree => "1Y",
        }
    }

    /// Période suivante (cycle)
    pub fn next(&self) -> ChartRange {
        match self {
            ChartRange::OneDay => ChartRange::OneWeek,
            ChartRange::OneWeek => ChartRange::TwoWeeks,
            ChartRange::TwoWeeks => ChartRange::OneMonth,
            ChartRange::OneMonth => ChartRange::ThreeMonths,
            ChartRange::ThreeMonths => ChartRange::SixMonths,
            ChartRange::SixMonths => ChartRange::MaxFree,
            ChartRange::MaxFree => ChartRange::OneDay, // Boucle
        }
    }

    /// Période précédente (cycle)
    pub fn previous(&self) -> ChartRange {
        match self {
            ChartRange::OneDay => ChartRange::MaxFree, // Boucle
            ChartRange::OneWeek => ChartRange::OneDay,
            ChartRange::TwoWeeks => ChartRange::OneWeek,
            ChartRange::OneMonth => ChartRange::TwoWeeks,
            ChartRange::ThreeMonths => ChartRange::OneMonth,
            ChartRange::SixMonths => ChartRange::ThreeMonths,
            ChartRange::MaxFree => ChartRange::SixMonths,
        }
    }

    /// Format des dates sur l'axe X selon la période
    pub fn axis_format(&self) -> &'static str {
        match self {
            ChartRange::OneDay => "%H:%M",
            ChartRange::OneWeek | ChartRange::TwoWeeks => "%d/%m %Hh",
            _ => "%d/%m/%y",
        }
    }
}

impl Default for ChartRange {
    /// Un mois par défaut
    fn default() -> Self {
        ChartRange::OneMonth
    }
}

// ============================================================================
// Réponse brute de /coins/{id}/market_chart
// ============================================================================

/// Réponse brute : trois séries de paires [timestamp_ms, valeur]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketChartResponse {
    pub prices: Option<Vec<Vec<f64>>>,
    pub market_caps: Option<Vec<Vec<f64>>>,
    pub total_volumes: Option<Vec<Vec<f64>>>,
}

/// Un point d'une série (prix, market cap ou volume)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub time: DateTime<Utc>,
    pub value: f64,
}

impl ChartPoint {
    /// Transforme une paire [timestamp_ms, valeur] en ChartPoint
    ///
    /// CONCEPT RUST : slice pattern
    /// - &[ts, value] matche exactement deux éléments
    /// - Tout autre longueur tombe dans le cas d'erreur
    pub fn from_pair(pair: &[f64]) -> Result<Self, GeckoError> {
        match *pair {
            [timestamp, value] => Ok(Self {
                time: datetime_from_millis(timestamp)?,
                value,
            }),
            _ => Err(GeckoError::InvalidSeriesPoint {
                expected: 2,
                got: pair.len(),
            }),
        }
    }
}

/// Convertit une série complète, échoue au premier point invalide
fn convert_series(series: &[Vec<f64>]) -> Result<Vec<ChartPoint>, GeckoError> {
    series.iter().map(|pair| ChartPoint::from_pair(pair)).collect()
}

/// Market chart nettoyé : une série absente de la réponse reste None
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketChart {
    pub prices: Option<Vec<ChartPoint>>,
    pub market_caps: Option<Vec<ChartPoint>>,
    pub total_volumes: Option<Vec<ChartPoint>>,
}

impl MarketChart {
    pub fn from_response(raw: &MarketChartResponse) -> Result<Self, GeckoError> {
        Ok(Self {
            prices: raw.prices.as_deref().map(convert_series).transpose()?,
            market_caps: raw.market_caps.as_deref().map(convert_series).transpose()?,
            total_volumes: raw.total_volumes.as_deref().map(convert_series).transpose()?,
        })
    }

    /// Série des prix (slice vide si absente)
    pub fn price_points(&self) -> &[ChartPoint] {
        self.prices.as_deref().unwrap_or(&[])
    }

    pub fn volume_points(&self) -> &[ChartPoint] {
        self.total_volumes.as_deref().unwrap_or(&[])
    }

    /// Bornes (min, max) des prix, None si pas de prix
    pub fn price_bounds(&self) -> Option<(f64, f64)> {
        let points = self.price_points();
        if points.is_empty() {
            return None;
        }
        Some(points.iter().fold((f64::MAX, f64::MIN), |(min, max), p| {
            (min.min(p.value), max.max(p.value))
        }))
    }

    /// Variation en pourcentage entre le premier et le dernier prix
    pub fn change_percent(&self) -> Option<f64> {
        let points = self.price_points();
        let first = points.first()?.value;
        let last = points.last()?.value;
        if first == 0.0 {
            return None;
        }
        Some(((last - first) / first) * 100.0)
    }
}

// ============================================================================
// Chandelles de /coins/{id}/ohlc
// ============================================================================

/// Une chandelle japonaise : [timestamp_ms, open, high, low, close]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    pub fn from_row(row: &[f64]) -> Result<Self, GeckoError> {
        match *row {
            [timestamp, open, high, low, close] => Ok(Self {
                time: datetime_from_millis(timestamp)?,
                open,
                high,
                low,
                close,
            }),
            _ => Err(GeckoError::InvalidSeriesPoint {
                expected: 5,
                got: row.len(),
            }),
        }
    }

    /// Chandelle haussière (close > open)
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Variation en pourcentage depuis l'ouverture
    pub fn change_percent(&self) -> f64 {
        if self.open == 0.0 {
            0.0
        } else {
            ((self.close - self.open) / self.open) * 100.0
        }
    }
}

/// Convertit les lignes OHLC et les trie par date croissante
pub fn candles_from_rows(rows: &[Vec<f64>]) -> Result<Vec<Candle>, GeckoError> {
    let mut candles = rows
        .iter()
        .map(|row| Candle::from_row(row))
        .collect::<Result<Vec<_>, _>>()?;
    candles.sort_by_key(|c| c.time);
    Ok(candles)
}

// ============================================================================
// Tests unitaires
// ============================================================================
