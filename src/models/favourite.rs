// ============================================================================
// FavouriteCoin : un coin marqué comme favori
// ============================================================================
// Stocké dans la table SQLite `favourites` (id, favourite 0/1)
// ============================================================================

use serde::{Deserialize, Serialize};

use super::coin::CoinDetail;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavouriteCoin {
    pub id: String,
    pub favourite: bool,
}

impl FavouriteCoin {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            favourite: true,
        }
    }
}

/// Un favori prêt à afficher : l'id et le dernier détail connu
#[derive(Debug, Clone, PartialEq)]
pub struct FavouriteEntry {
    pub id: String,
    pub detail: Option<CoinDetail>,
}

impl FavouriteEntry {
    /// Nom affiché : le nom du coin si on l'a, sinon son id
    pub fn display_name(&self) -> &str {
        self.detail
            .as_ref()
            .map(|d| d.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.id)
    }

    /// Tendance 24h : true = hausse, false = baisse, None = inconnue
    pub fn is_up_24h(&self) -> Option<bool> {
        self.detail
            .as_ref()?
            .price_change_24h()
            .map(|change| change >= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallback() {
        let entry = FavouriteEntry {
            id: "bitcoin".to_string(),
            detail: None,
        };
        assert_eq!(entry.display_name(), "bitcoin");
        assert_eq!(entry.is_up_24h(), None);

        let entry = FavouriteEntry {
            id: "bitcoin".to_string(),
            detail: Some(CoinDetail {
                name: "Bitcoin".to_string(),
                ..Default::default()
            }),
        };
        assert_eq!(entry.display_name(), "Bitcoin");
    }
}
