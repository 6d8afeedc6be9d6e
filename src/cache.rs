use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::{
    error::{Error, Result},
    record::Record,
};

const DATASET: &str = "dataset.json";
const VERSION: &str = "version";

/// The two persisted entries: the normalized dataset and the library version it was fetched at.
#[derive(Clone, Debug)]
pub struct Cache {
    dir: PathBuf,
}

impl Cache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Cache { dir: dir.into() }
    }

    /// `$XDG_CACHE_HOME/pubshelf`, falling back to `$HOME/.cache/pubshelf`.
    pub fn default_dir() -> PathBuf {
        std::env::var_os("XDG_CACHE_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| Path::new(&h).join(".cache")))
            .unwrap_or_else(std::env::temp_dir)
            .join("pubshelf")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn version(&self) -> Result<Option<String>> {
        let path = self.dir.join(VERSION);
        Ok(read_optional(&path)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }

    /// Last stored dataset. A missing or unreadable copy both count as no cache.
    pub fn load(&self) -> Result<Option<Vec<Record>>> {
        let path = self.dir.join(DATASET);
        let Some(body) = read_optional(&path)? else {
            return Ok(None);
        };
        match serde_json::from_str(&body) {
            Ok(records) => Ok(Some(records)),
            Err(e) => {
                log::warn!("ignoring unreadable cache {}: {e}", path.display());
                Ok(None)
            }
        }
    }

    /// Overwrite both entries.
    pub fn store(&self, records: &[Record], version: Option<&str>) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|source| Error::Cache {
            path: self.dir.clone(),
            source,
        })?;
        let body = serde_json::to_string(records).map_err(|source| Error::Payload {
            origin: "session".into(),
            source,
        })?;
        write(&self.dir.join(DATASET), &body)?;
        write(&self.dir.join(VERSION), version.unwrap_or_default())?;
        log::debug!("cached {} records in {}", records.len(), self.dir.display());
        Ok(())
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(body) => Ok(Some(body)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(Error::Cache {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write(path: &Path, body: &str) -> Result<()> {
    fs::write(path, body).map_err(|source| Error::Cache {
        path: path.to_path_buf(),
        source,
    })
}
