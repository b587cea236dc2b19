// ============================================================================
// Chemins de l'application
// ============================================================================
// Deux racines :
// - AppData : données persistantes (settings, favoris, caches JSON, logs)
//     Linux : ~/.local/share/LazyGecko
// - Cache   : données jetables
//     Linux : ~/.cache/LazyGecko
//
// Arborescence créée au démarrage :
//   <AppData>/Settings/config.json
//   <AppData>/Databases/favourites.db, exchange_tickers.json|.db
//   <AppData>/CoinResponses/coin_response.json
//   <AppData>/Logs/lazygecko.log.<date>
// ============================================================================

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

pub const APP_DIR_NAME: &str = "LazyGecko";

pub const SETTINGS_DIR: &str = "Settings";
pub const DATABASES_DIR: &str = "Databases";
pub const LOGS_DIR: &str = "Logs";
pub const COIN_RESPONSES_DIR: &str = "CoinResponses";

/// Racines de l'application et chemins des fichiers connus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    app_data_dir: PathBuf,
    cache_dir: PathBuf,
}

impl AppPaths {
    /// Répertoires de la plateforme (via dirs)
    pub fn from_platform() -> Result<Self> {
        let data = dirs::data_dir().context("Impossible de trouver le répertoire de données")?;
        let cache = dirs::cache_dir().context("Impossible de trouver le répertoire de cache")?;

        Ok(Self {
            app_data_dir: data.join(APP_DIR_NAME),
            cache_dir: cache.join(APP_DIR_NAME),
        })
    }

    /// Tout sous une racine choisie (--data-dir, tests)
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            app_data_dir: root.join("data"),
            cache_dir: root.join("cache"),
        }
    }

    pub fn app_data_dir(&self) -> &Path {
        &self.app_data_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn settings_file(&self) -> PathBuf {
        self.app_data_dir.join(SETTINGS_DIR).join("config.json")
    }

    pub fn favourites_db(&self) -> PathBuf {
        self.app_data_dir.join(DATABASES_DIR).join("favourites.db")
    }

    pub fn tickers_json(&self) -> PathBuf {
        self.app_data_dir.join(DATABASES_DIR).join("exchange_tickers.json")
    }

    pub fn tickers_db(&self) -> PathBuf {
        self.app_data_dir.join(DATABASES_DIR).join("exchange_tickers.db")
    }

    pub fn coin_responses_file(&self) -> PathBuf {
        self.app_data_dir
            .join(COIN_RESPONSES_DIR)
            .join("coin_response.json")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.app_data_dir.join(LOGS_DIR)
    }

    /// Crée l'arborescence de base (idempotent)
    pub fn init_file_structure(&self) -> Result<()> {
        for sub in [SETTINGS_DIR, DATABASES_DIR, LOGS_DIR, COIN_RESPONSES_DIR] {
            self.create_dir_in_app_data(sub)?;
        }
        fs::create_dir_all(&self.cache_dir)
            .with_context(|| format!("Échec de la création de {}", self.cache_dir.display()))?;

        info!(app_data = %self.app_data_dir.display(), "File structure initialized");
        Ok(())
    }

    // ========================================================================
    // Création
    // ========================================================================

    pub fn create_dir_in_app_data(&self, sub: impl AsRef<Path>) -> Result<PathBuf> {
        create_dir(&self.app_data_dir, sub.as_ref())
    }

    pub fn create_dir_in_cache(&self, sub: impl AsRef<Path>) -> Result<PathBuf> {
        create_dir(&self.cache_dir, sub.as_ref())
    }

    /// Crée un fichier vide (et ses parents) s'il n'existe pas
    pub fn create_file_in_app_data(&self, sub: impl AsRef<Path>, name: &str) -> Result<PathBuf> {
        create_file(&self.app_data_dir.join(sub), name)
    }

    pub fn create_file_in_cache(&self, sub: impl AsRef<Path>, name: &str) -> Result<PathBuf> {
        create_file(&self.cache_dir.join(sub), name)
    }

    // ========================================================================
    // Suppression
    // ========================================================================

    /// Retourne false si le fichier n'existait pas
    pub fn remove_file_from_app_data(&self, sub: impl AsRef<Path>, name: &str) -> Result<bool> {
        remove_file(&self.app_data_dir.join(sub).join(name))
    }

    pub fn remove_file_from_cache(&self, sub: impl AsRef<Path>, name: &str) -> Result<bool> {
        remove_file(&self.cache_dir.join(sub).join(name))
    }

    pub fn remove_dir_from_app_data(&self, sub: impl AsRef<Path>) -> Result<bool> {
        remove_dir(&self.app_data_dir.join(sub))
    }

    pub fn remove_dir_from_cache(&self, sub: impl AsRef<Path>) -> Result<bool> {
        remove_dir(&self.cache_dir.join(sub))
    }

    /// Vide un répertoire sans le supprimer
    pub fn remove_dir_contents_from_app_data(&self, sub: impl AsRef<Path>) -> Result<()> {
        remove_dir_contents(&self.app_data_dir.join(sub))
    }

    pub fn remove_dir_contents_from_cache(&self, sub: impl AsRef<Path>) -> Result<()> {
        remove_dir_contents(&self.cache_dir.join(sub))
    }
}

fn create_dir(root: &Path, sub: &Path) -> Result<PathBuf> {
    let dir = root.join(sub);
    fs::create_dir_all(&dir).with_context(|| format!("Échec de la création de {}", dir.display()))?;
    Ok(dir)
}

fn create_file(dir: &Path, name: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Échec de la création de {}", dir.display()))?;
    let path = dir.join(name);
    if !path.exists() {
        fs::File::create(&path).with_context(|| format!("Échec de la création de {}", path.display()))?;
        debug!(path = %path.display(), "Empty file created");
    }
    Ok(path)
}

fn remove_file(path: &Path) -> Result<bool> {
    if !path.is_file() {
        return Ok(false);
    }
    fs::remove_file(path).with_context(|| format!("Échec de la suppression de {}", path.display()))?;
    Ok(true)
}

fn remove_dir(path: &Path) -> Result<bool> {
    if !path.is_dir() {
        return Ok(false);
    }
    fs::remove_dir_all(path).with_context(|| format!("Échec de la suppression de {}", path.display()))?;
    Ok(true)
}

fn remove_dir_contents(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(dir).with_context(|| format!("Échec de la lecture de {}", dir.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Copie un fichier dans un répertoire cible (écrase la destination)
pub fn copy_overwrite(source: &Path, target_dir: &Path, new_name: Option<&str>) -> Result<PathBuf> {
    if !source.is_file() {
        anyhow::bail!("Fichier source introuvable : {}", source.display());
    }
    let name = match new_name {
        Some(name) => std::ffi::OsString::from(name),
        None => source
            .file_name()
            .context("Le chemin source n'a pas de nom de fichier")?
            .to_os_string(),
    };

    fs::create_dir_all(target_dir)?;
    let target = target_dir.join(name);
    fs::copy(source, &target)
        .with_context(|| format!("Échec de la copie vers {}", target.display()))?;
    Ok(target)
}

/// Cherche un fichier par nom, récursivement
///
/// Le premier répertoire (parcours en profondeur, entrées triées) qui contient
/// le nom gagne. Les répertoires illisibles sont ignorés.
pub fn search_for_file(root: &Path, file_name: &str) -> Option<PathBuf> {
    let candidate = root.join(file_name);
    if candidate.is_file() {
        return Some(candidate);
    }

    let mut subdirs: Vec<PathBuf> = match fs::read_dir(root) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect(),
        Err(e) => {
            warn!(dir = %root.display(), error = %e, "Skipping unreadable directory");
            return None;
        }
    };
    subdirs.sort();

    subdirs.iter().find_map(|dir| search_for_file(dir, file_name))
}

// ============================================================================
// Tests unitaires
// ============================================================================
