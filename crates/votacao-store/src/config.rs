//! Configuration loading and the storage factory.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use votacao_core::engine::RuleConfig;
use votacao_core::identity::{IdentityResolver, IdentityStrategy};
use votacao_core::parser::{default_seed, parse_seed, Seed};
use votacao_core::traits::StorageAdapter;

use crate::json_file::JsonFileStorage;
use crate::memory::MemoryStorage;

/// Where the state document lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    Json {
        #[serde(default = "default_db_path")]
        path: PathBuf,
    },
    Memory,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Json {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("db.json")
}

/// Top-level votacao configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotacaoConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Seed file; the embedded seed is used when unset.
    #[serde(default)]
    pub seed_path: Option<PathBuf>,
    #[serde(default)]
    pub identity: IdentityStrategy,
    #[serde(default = "default_leader_codes")]
    pub leader_codes: Vec<String>,
    #[serde(default = "default_leader_max")]
    pub leader_max_score: u8,
    #[serde(default = "default_max")]
    pub default_max_score: u8,
    #[serde(default = "default_star_quota")]
    pub star_quota: usize,
    #[serde(default = "default_placeholder_topics")]
    pub placeholder_topics: usize,
    #[serde(default = "default_max_questions")]
    pub max_questions: usize,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_leader_codes() -> Vec<String> {
    (1..=6).map(|c| c.to_string()).collect()
}
fn default_leader_max() -> u8 {
    10
}
fn default_max() -> u8 {
    5
}
fn default_star_quota() -> usize {
    5
}
fn default_placeholder_topics() -> usize {
    3
}
fn default_max_questions() -> usize {
    3
}

impl Default for VotacaoConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            storage: StorageConfig::default(),
            seed_path: None,
            identity: IdentityStrategy::default(),
            leader_codes: default_leader_codes(),
            leader_max_score: default_leader_max(),
            default_max_score: default_max(),
            star_quota: default_star_quota(),
            placeholder_topics: default_placeholder_topics(),
            max_questions: default_max_questions(),
        }
    }
}

impl VotacaoConfig {
    /// Scoring and quota rules for the engine.
    pub fn to_rules(&self) -> RuleConfig {
        RuleConfig {
            leader_codes: self.leader_codes.iter().cloned().collect(),
            leader_max_score: self.leader_max_score,
            default_max_score: self.default_max_score,
            star_quota: self.star_quota,
            placeholder_topics: self.placeholder_topics,
            max_questions: self.max_questions,
        }
    }

    pub fn identity_resolver(&self) -> IdentityResolver {
        IdentityResolver::new(self.identity.matcher())
    }

    /// Parse the configured seed file, or fall back to the embedded seed.
    pub fn load_seed(&self) -> Result<Seed> {
        match &self.seed_path {
            Some(path) => parse_seed(path),
            None => default_seed(),
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.bind, self.port))
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.default_max_score >= 1 && self.leader_max_score >= 1,
            "max scores must be at least 1"
        );
        anyhow::ensure!(self.max_questions >= 1, "max_questions must be at least 1");
        Ok(())
    }

    fn resolve_env_vars(&mut self) {
        self.bind = resolve_env_vars(&self.bind);
        if let StorageConfig::Json { path } = &mut self.storage {
            *path = resolve_env_path(path);
        }
        if let Some(seed) = &mut self.seed_path {
            *seed = resolve_env_path(seed);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        for var in ["PORT", "VOTACAO_PORT"] {
            if let Ok(raw) = std::env::var(var) {
                self.port = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{var} is not a valid port: {raw}"))?;
            }
        }
        if let Ok(path) = std::env::var("VOTACAO_DB") {
            self.storage = StorageConfig::Json {
                path: PathBuf::from(path),
            };
        }
        Ok(())
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_env_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `votacao.toml` in the current directory
/// 2. `~/.config/votacao/config.toml`
///
/// Environment variable overrides: `PORT`, `VOTACAO_PORT` (wins over `PORT`)
/// and `VOTACAO_DB`.
pub fn load_config() -> Result<VotacaoConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<VotacaoConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("votacao.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            parse_config(&path)?
        }
        None => VotacaoConfig::default(),
    };

    config.apply_env_overrides()?;
    Ok(config)
}

/// Parse one config file, resolving `${VAR}` references. No env overrides.
pub fn parse_config(path: &Path) -> Result<VotacaoConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let mut config = toml::from_str::<VotacaoConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))?;
    config.resolve_env_vars();
    config.validate()?;
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("votacao"))
}

/// Create a storage adapter from its configuration.
pub fn create_storage(config: &StorageConfig) -> Arc<dyn StorageAdapter> {
    match config {
        StorageConfig::Json { path } => Arc::new(JsonFileStorage::new(path)),
        StorageConfig::Memory => Arc::new(MemoryStorage::new()),
    }
}
