//! Known-ID sources.
//!
//! The catalog decides which image identifiers are still in use. It is queried
//! exactly once per scan; any failure here is fatal to the scan because orphan
//! detection is impossible without it.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::scanner::ImageId;
use rusqlite::{Connection, OpenFlags};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default query against a PrestaShop-style schema
pub const DEFAULT_QUERY: &str = "SELECT id_image FROM ps_image";

/// Identifiers currently referenced by the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownIdSet(HashSet<ImageId>);

impl KnownIdSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: ImageId) -> bool {
        self.0.insert(id)
    }

    pub fn contains(&self, id: ImageId) -> bool {
        self.0.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convenience for callers holding raw integers; zeros are dropped.
    pub fn from_raw<I: IntoIterator<Item = u64>>(ids: I) -> Self {
        ids.into_iter().filter_map(ImageId::new).collect()
    }
}

impl FromIterator<ImageId> for KnownIdSet {
    fn from_iter<I: IntoIterator<Item = ImageId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

pub trait KnownIdSource {
    /// Return every identifier the catalog currently references.
    fn load_known_ids(&self) -> Result<KnownIdSet>;
}

impl KnownIdSource for KnownIdSet {
    fn load_known_ids(&self) -> Result<KnownIdSet> {
        Ok(self.clone())
    }
}

/// Identifiers read from an SQLite database with a single query.
///
/// The first column of every row is read as an integer; non-positive values
/// are ignored.
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    pub database: PathBuf,
    pub query: String,
}

impl SqliteCatalog {
    pub fn new(database: impl Into<PathBuf>, query: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            query: query.into(),
        }
    }
}

impl KnownIdSource for SqliteCatalog {
    fn load_known_ids(&self) -> Result<KnownIdSet> {
        if !self.database.is_file() {
            return Err(Error::Catalog(format!(
                "database not found: {}",
                self.database.display()
            )));
        }

        let conn = Connection::open_with_flags(&self.database, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        let mut stmt = conn.prepare(&self.query)?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;

        let mut ids = KnownIdSet::new();
        for row in rows {
            let value = row?;
            if let Some(id) = u64::try_from(value).ok().and_then(ImageId::new) {
                ids.insert(id);
            }
        }

        debug!(database = %self.database.display(), count = ids.len(), "loaded known ids");
        Ok(ids)
    }
}

/// Identifiers read from a plain text file.
///
/// Identifiers are separated by whitespace or commas; `#` starts a comment
/// that runs to the end of the line.
#[derive(Debug, Clone)]
pub struct IdListFile {
    pub path: PathBuf,
}

impl IdListFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl KnownIdSource for IdListFile {
    fn load_known_ids(&self) -> Result<KnownIdSet> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            Error::Catalog(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        let ids = parse_id_list(&content, &self.path)?;
        debug!(file = %self.path.display(), count = ids.len(), "loaded known ids");
        Ok(ids)
    }
}

fn parse_id_list(content: &str, origin: &Path) -> Result<KnownIdSet> {
    let mut ids = KnownIdSet::new();

    for (line_no, line) in content.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("");
        for token in line.split(|c: char| c.is_whitespace() || c == ',') {
            if token.is_empty() {
                continue;
            }
            let id = ImageId::parse_digits(token).ok_or_else(|| {
                Error::Catalog(format!(
                    "{}:{}: '{}' is not a positive integer",
                    origin.display(),
                    line_no + 1,
                    token
                ))
            })?;
            ids.insert(id);
        }
    }

    Ok(ids)
}

/// Build the configured Known-ID source. An id list file wins over a database.
pub fn from_config(config: &Config) -> Result<Box<dyn KnownIdSource>> {
    if let Some(ids_file) = &config.catalog.ids_file {
        return Ok(Box::new(IdListFile::new(ids_file)));
    }
    if let Some(database) = &config.catalog.database {
        return Ok(Box::new(SqliteCatalog::new(database, config.catalog.query.clone())));
    }
    Err(Error::Config(
        "no catalog configured; pass --ids-file or --catalog-db, or set [catalog] in the config file"
            .to_string(),
    ))
}
