// ============================================================================
// Module : ui
// ============================================================================
// Gère toute l'interface utilisateur (Terminal User Interface)
// ============================================================================

pub mod events;     // Gestion des événements clavier
pub mod theme;      // Palettes clair / sombre
pub mod dashboard;  // Router, cadre commun et page exchange
pub mod chart;      // Page d'un coin
pub mod candles;    // Chandeliers japonais (Unicode text)
pub mod favourites; // Page des favoris
pub mod settings;   // Page des réglages

// Re-exports pour simplifier les imports
pub use dashboard::render;
pub use events::{Event, EventHandler};
pub use theme::Theme;
