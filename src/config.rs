use crate::catalog::DEFAULT_QUERY;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Page size bounds accepted from users
pub const MIN_PER_PAGE: usize = 10;
pub const MAX_PER_PAGE: usize = 500;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "IMGPRUNE_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanSection,

    #[serde(default)]
    pub catalog: CatalogSection,

    #[serde(default)]
    pub listing: ListingSection,

    #[serde(default)]
    pub security: SecuritySection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanSection {
    /// Image tree to scan, e.g. `/var/www/shop/img/p`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSection {
    /// SQLite database holding the catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,

    /// Query returning one identifier per row in column 0
    #[serde(default = "default_query")]
    pub query: String,

    /// Plain text list of identifiers; takes precedence over `database`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingSection {
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecuritySection {
    /// When set, deletions must present this token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            database: None,
            query: default_query(),
            ids_file: None,
        }
    }
}

impl Default for ListingSection {
    fn default() -> Self {
        Self {
            per_page: default_per_page(),
        }
    }
}

fn default_query() -> String {
    DEFAULT_QUERY.to_string()
}

fn default_per_page() -> usize {
    50
}

/// Clamp a user-supplied page size into the accepted range.
pub fn clamp_per_page(per_page: usize) -> usize {
    per_page.clamp(MIN_PER_PAGE, MAX_PER_PAGE)
}

impl Config {
    /// Config file path: `$IMGPRUNE_CONFIG`, else `<config dir>/imgprune/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(custom) = std::env::var(CONFIG_ENV) {
            if !custom.is_empty() {
                return Ok(PathBuf::from(custom));
            }
        }
        let dirs = directories::ProjectDirs::from("", "", "imgprune")
            .ok_or_else(|| Error::Config("cannot determine config directory".to_string()))?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load config from file or return defaults
    pub fn load() -> Self {
        match Self::config_path() {
            Ok(path) if path.exists() => match Self::load_from(&path) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring config file");
                    Self::default()
                }
            },
            _ => Self::default(),
        }
    }

    /// Load and parse a specific config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))
    }

    /// Save config to the default location, returning the path written
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let toml = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("cannot serialize config: {}", e)))?;
        fs::write(path, toml)?;
        Ok(())
    }

    /// Apply CLI option overrides
    pub fn apply_cli_overrides(
        &mut self,
        root: Option<PathBuf>,
        ids_file: Option<PathBuf>,
        database: Option<PathBuf>,
        query: Option<String>,
        per_page: Option<usize>,
    ) {
        if let Some(root) = root {
            self.scan.root = Some(root);
        }
        if let Some(ids_file) = ids_file {
            self.catalog.ids_file = Some(ids_file);
        }
        if let Some(database) = database {
            // An explicit database on the command line beats a configured id list
            self.catalog.database = Some(database);
            self.catalog.ids_file = None;
        }
        if let Some(query) = query {
            self.catalog.query = query;
        }
        if let Some(per_page) = per_page {
            self.listing.per_page = per_page;
        }
    }

    pub fn scan_root(&self) -> Result<&Path> {
        self.scan.root.as_deref().ok_or_else(|| {
            Error::Config("no scan root; pass --root or set [scan] root in the config file".to_string())
        })
    }

    pub fn per_page(&self) -> usize {
        clamp_per_page(self.listing.per_page)
    }

    /// Check a deletion request's token against the configured one.
    ///
    /// Without a configured token every request is allowed.
    pub fn authorize(&self, provided: Option<&str>) -> Result<()> {
        match (&self.security.token, provided) {
            (None, _) => Ok(()),
            (Some(expected), Some(given)) if expected == given => Ok(()),
            _ => Err(Error::Unauthorized),
        }
    }
}
