// ============================================================================
// Thème : couleurs clair / sombre
// ============================================================================
// Le réglage "darkmode" choisit la palette. Les pages ne touchent jamais
// Color directement pour les éléments communs (bordures, texte, hausse,
// baisse) : elles passent par Theme.
// ============================================================================

use ratatui::style::{Color, Modifier, Style};

/// Palette utilisée par toutes les pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub background: Color,
    pub text: Color,
    pub muted: Color,
    pub border: Color,
    pub accent: Color,
    pub key: Color,
    pub up: Color,
    pub down: Color,
    pub warning: Color,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            background: Color::Reset,
            text: Color::Reset,
            muted: Color::Gray,
            border: Color::Cyan,
            accent: Color::Green,
            key: Color::Yellow,
            up: Color::Rgb(52, 208, 88),
            down: Color::Rgb(234, 74, 90),
            warning: Color::Yellow,
        }
    }

    pub fn dark() -> Self {
        Self {
            background: Color::Rgb(18, 18, 24),
            text: Color::Rgb(220, 220, 220),
            muted: Color::Rgb(120, 120, 130),
            border: Color::Rgb(90, 110, 200),
            accent: Color::Rgb(120, 200, 255),
            key: Color::Rgb(250, 200, 80),
            up: Color::Rgb(52, 208, 88),
            down: Color::Rgb(234, 74, 90),
            warning: Color::Rgb(250, 200, 80),
        }
    }

    pub fn from_dark_mode(dark_mode: bool) -> Self {
        if dark_mode {
            Self::dark()
        } else {
            Self::light()
        }
    }

    /// Style de base d'une zone (fond + texte)
    pub fn base(&self) -> Style {
        Style::default().bg(self.background).fg(self.text)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    /// Raccourci clavier dans un footer (ex: "[q]")
    pub fn key_style(&self) -> Style {
        Style::default().fg(self.key).add_modifier(Modifier::BOLD)
    }

    /// Vert si hausse, rouge si baisse, neutre si inconnu
    pub fn trend_color(&self, change: Option<f64>) -> Color {
        match change {
            Some(c) if c >= 0.0 => self.up,
            Some(_) => self.down,
            None => self.muted,
        }
    }
}
