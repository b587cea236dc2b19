// ============================================================================
// LazyGecko - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests d'intégration
// ============================================================================

pub mod api;       // Client CoinGecko
pub mod app;       // État de l'application
pub mod error;     // Erreurs typées
pub mod models;    // Structures de données
pub mod services;  // Logique des pages (API + stockage)
pub mod settings;  // Réglages utilisateur
pub mod storage;   // Fichiers, JSON et SQLite locaux
pub mod ui;        // Interface utilisateur
