use anyhow::{anyhow, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_API_PORT: u16 = 8080;
const DEFAULT_INDEX_TTL_SECS: u64 = 20;

#[derive(Debug, Clone)]
pub struct MurmurConfig {
    pub api_port: u16,
    pub paths: MurmurPaths,
    pub cache: CacheConfig,
}

impl MurmurConfig {
    pub fn from_env() -> Result<Self> {
        let paths = MurmurPaths::discover()?;
        let api_port = env::var("MURMUR_API_PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_API_PORT);
        let cache = CacheConfig::from_env();
        Ok(Self {
            api_port,
            paths,
            cache,
        })
    }

    pub fn new(api_port: u16, paths: MurmurPaths, cache: CacheConfig) -> Self {
        Self {
            api_port,
            paths,
            cache,
        }
    }
}

/// TTL for the whole-page index cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub index_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            index_ttl: Duration::from_secs(DEFAULT_INDEX_TTL_SECS),
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Self {
        let index_ttl = env::var("MURMUR_CACHE_TTL_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_INDEX_TTL_SECS));
        Self { index_ttl }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MurmurPaths {
    pub base: PathBuf,
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub media_dir: PathBuf,
}

impl MurmurPaths {
    pub fn discover() -> Result<Self> {
        if let Ok(base) = env::var("MURMUR_BASE_DIR") {
            return Self::from_base_dir(base);
        }
        let exe_path = env::current_exe()
            .map_err(|err| anyhow!("failed to resolve current executable: {err}"))?;
        let base = exe_path
            .parent()
            .ok_or_else(|| anyhow!("executable path missing parent"))?
            .to_path_buf();
        Self::from_base_dir(base)
    }

    pub fn from_base_dir<P: AsRef<Path>>(base: P) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        let data_dir = base.join("data");
        let db_path = data_dir.join("murmur.db");
        let media_dir = base.join("media");

        Ok(Self {
            base,
            data_dir,
            db_path,
            media_dir,
        })
    }
}
