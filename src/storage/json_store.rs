// ============================================================================
// Store JSON "fichier plat"
// ============================================================================
// Un fichier JSON contenant UN objet racine, utilisé comme petite base
// clé -> valeur :
//
//   {
//     "bitcoin":  { ...CoinDetail... },
//     "ethereum": { ...CoinDetail... }
//   }
//
// Chaque opération relit puis réécrit le fichier entier : pas de cache
// mémoire, pas de verrou. Suffisant pour quelques Mo de données.
//
// L'écriture passe par un fichier temporaire renommé ensuite : un arrêt
// brutal laisse l'ancien contenu intact. Un fichier illisible est traité
// comme un objet vide, la prochaine écriture le remplace.
//
// CONCEPT RUST : serde_json::Value
// - Représentation dynamique d'un JSON quelconque
// - Permet de stocker des types différents sous des clés différentes
// ============================================================================

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::error::GeckoError;

/// Un fichier JSON lu et écrit d'un bloc
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lit et désérialise tout le fichier
    pub async fn read<T: DeserializeOwned>(&self) -> Result<T> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Échec de la lecture de {}", self.path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("JSON invalide dans {}", self.path.display()))
    }

    /// Sérialise et remplace tout le fichier
    ///
    /// CONCEPT : Écriture atomique
    /// - On écrit <fichier>.tmp puis on le renomme par-dessus l'original
    /// - rename est atomique sur un même système de fichiers
    pub async fn write<T: Serialize>(&self, data: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(data)?;

        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, content)
            .await
            .with_context(|| format!("Échec de l'écriture de {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Échec de l'écriture de {}", self.path.display()))
    }

    /// store.json -> store.json.tmp
    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Crée le fichier avec `{}` s'il n'existe pas ou s'il est vide
    ///
    /// Les répertoires parents sont créés si besoin.
    pub async fn create_empty_json(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Échec de la création de {}", parent.display()))?;
        }

        let needs_init = match tokio::fs::read_to_string(path).await {
            Ok(content) => content.trim().is_empty(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(e).with_context(|| format!("Échec de la lecture de {}", path.display())),
        };

        if needs_init {
            debug!(path = %path.display(), "Initializing empty JSON store");
            tokio::fs::write(path, "{}").await?;
        }
        Ok(())
    }
}

/// Base clé -> objet dans un seul fichier JSON
#[derive(Debug, Clone)]
pub struct JsonItemStore {
    file: JsonFile,
}

impl JsonItemStore {
    /// Ouvre (et initialise si besoin) le store
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let file = JsonFile::new(path);
        JsonFile::create_empty_json(file.path()).await?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Objet racine, vide si le fichier manque ou est corrompu
    async fn load(&self) -> Result<Map<String, Value>> {
        let content = match tokio::fs::read_to_string(self.path()).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Échec de la lecture de {}", self.path().display()))
            }
        };

        match serde_json::from_str(&content) {
            Ok(map) => Ok(map),
            Err(e) => {
                warn!(path = %self.path().display(), error = %e, "Corrupt JSON store, starting from an empty object");
                Ok(Map::new())
            }
        }
    }

    async fn save(&self, map: &Map<String, Value>) -> Result<()> {
        self.file.write(map).await
    }

    /// Valeur d'une clé, None si absente
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut map = self.load().await?;
        match map.remove(key) {
            Some(value) => {
                let item = serde_json::from_value(value)
                    .with_context(|| format!("Format inattendu pour la clé {}", key))?;
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }

    /// Toutes les entrées (suppose des valeurs de même type)
    pub async fn get_all<T: DeserializeOwned>(&self) -> Result<BTreeMap<String, T>> {
        let map = self.load().await?;
        map.into_iter()
            .map(|(key, value)| -> Result<(String, T)> {
                let item = serde_json::from_value(value)
                    .with_context(|| format!("Format inattendu pour la clé {}", key))?;
                Ok((key, item))
            })
            .collect()
    }

    pub async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.load().await?.keys().cloned().collect())
    }

    pub async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.load().await?.contains_key(key))
    }

    /// Insère une nouvelle clé, échoue si elle existe déjà
    #[instrument(skip(self, obj), fields(path = %self.path().display()))]
    pub async fn insert<T: Serialize>(&self, key: &str, obj: &T) -> Result<()> {
        let mut map = self.load().await?;
        if map.contains_key(key) {
            return Err(GeckoError::KeyExists(key.to_string()).into());
        }
        map.insert(key.to_string(), serde_json::to_value(obj)?);
        self.save(&map).await
    }

    /// Remplace la valeur d'une clé
    ///
    /// Sans `upsert`, la clé doit exister (KeyNotFound sinon).
    #[instrument(skip(self, obj), fields(path = %self.path().display()))]
    pub async fn replace<T: Serialize>(&self, key: &str, obj: &T, upsert: bool) -> Result<()> {
        let mut map = self.load().await?;
        if !upsert && !map.contains_key(key) {
            return Err(GeckoError::KeyNotFound(key.to_string()).into());
        }
        map.insert(key.to_string(), serde_json::to_value(obj)?);
        self.save(&map).await
    }

    /// Fusionne de nouvelles propriétés dans un objet existant
    ///
    /// Fusion superficielle : les propriétés de premier niveau de
    /// `properties` écrasent ou complètent celles de l'objet.
    #[instrument(skip(self, properties), fields(path = %self.path().display()))]
    pub async fn update(&self, key: &str, properties: Value) -> Result<()> {
        let Value::Object(new_props) = properties else {
            anyhow::bail!("Les propriétés à fusionner doivent être un objet JSON");
        };

        let mut map = self.load().await?;
        let item = map
            .get_mut(key)
            .ok_or_else(|| GeckoError::KeyNotFound(key.to_string()))?;

        let Value::Object(existing) = item else {
            anyhow::bail!("La valeur de {} n'est pas un objet JSON", key);
        };
        existing.extend(new_props);

        self.save(&map).await
    }

    /// Supprime une clé, retourne false si elle n'existait pas
    #[instrument(skip(self), fields(path = %self.path().display()))]
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let mut map = self.load().await?;
        if map.remove(key).is_none() {
            return Ok(false);
        }
        self.save(&map).await?;
        Ok(true)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
