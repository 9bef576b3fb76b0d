use agscope_providers::{DecodeLimits, default_root};
use agscope_types::Source;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub enabled: bool,
    pub root: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Sessions at or above this size are searched sequentially in phase 2
    pub large_file_threshold_bytes: u64,
    /// Phase-1 batch size
    pub batch_size: usize,
    /// Upper bound on result/progress deliveries per second
    pub progress_hz: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            large_file_threshold_bytes: 10 * 1024 * 1024,
            batch_size: 64,
            progress_hz: 10,
        }
    }
}

impl SearchConfig {
    pub fn update_interval(&self) -> Duration {
        if self.progress_hz == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(1) / self.progress_hz
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 15 * 60 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub max_record_bytes: u64,
    pub header_records: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        let limits = DecodeLimits::default();
        Self {
            max_record_bytes: limits.max_record_bytes,
            header_records: limits.header_records,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Config {
    /// Extra directories used to resolve Gemini project hashes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub project_roots: Vec<PathBuf>,
    #[serde(default)]
    pub sources: BTreeMap<String, SourceConfig>,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub parser: ParserConfig,
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn path_in(data_dir: &Path) -> PathBuf {
        data_dir.join("config.toml")
    }

    /// Config for every source whose default log root exists
    pub fn detect_sources() -> Self {
        let mut config = Config::default();
        for source in Source::ALL {
            if let Some(root) = default_root(source)
                && root.is_dir()
            {
                config.set_source(source, SourceConfig { enabled: true, root });
            }
        }
        config
    }

    /// Fill unconfigured sources from detected defaults
    pub fn with_detected_sources(mut self) -> Self {
        for (name, detected) in Self::detect_sources().sources {
            self.sources.entry(name).or_insert(detected);
        }
        self
    }

    pub fn source(&self, source: Source) -> Option<&SourceConfig> {
        self.sources.get(source.id())
    }

    pub fn set_source(&mut self, source: Source, config: SourceConfig) {
        self.sources.insert(source.id().to_string(), config);
    }

    /// Enabled sources in [`Source::ALL`] order; unknown names are skipped
    pub fn enabled_sources(&self) -> Vec<(Source, PathBuf)> {
        Source::ALL
            .into_iter()
            .filter_map(|source| {
                self.source(source)
                    .filter(|c| c.enabled)
                    .map(|c| (source, agscope_core::expand_tilde(&c.root.to_string_lossy())))
            })
            .collect()
    }

    pub fn decode_limits(&self) -> DecodeLimits {
        DecodeLimits {
            max_record_bytes: self.parser.max_record_bytes,
            header_records: self.parser.header_records,
            full_scan_bytes: self.search.large_file_threshold_bytes,
            ..DecodeLimits::default()
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }
}
