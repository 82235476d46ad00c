use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Active profile name (empty = default).
    pub profile: String,
    /// Directory scanned for criteria YAML documents.
    pub criteria_dir: PathBuf,
    pub cache: CacheConfig,
    /// Subjects per rayon work unit in batch evaluation.
    pub batch_chunk_size: usize,
    /// Decision label used when no threshold band matches.
    pub default_decision: String,
    /// Fallback tracing filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl EngineConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `VERDICT_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("VERDICT_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            criteria_dir: PathBuf::from(profiled_env_or(p, "VERDICT_CRITERIA_DIR", "data/criteria")),
            cache: CacheConfig::from_env_profiled(p),
            batch_chunk_size: profiled_env_usize(p, "VERDICT_BATCH_CHUNK_SIZE", 256).max(1),
            default_decision: profiled_env_or(p, "VERDICT_DEFAULT_DECISION", "Rejected"),
            log_filter: profiled_env_or(p, "VERDICT_LOG", "info"),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  criteria:    dir={}", self.criteria_dir.display());
        tracing::info!(
            "  cache:       enabled={}, namespace={}, ttl={}s, capacity={}",
            self.cache.enabled,
            self.cache.namespace,
            self.cache.ttl_secs,
            self.cache.capacity
        );
        tracing::info!("  batch:       chunk_size={}", self.batch_chunk_size);
        tracing::info!("  decisions:   default={}", self.default_decision);
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            profile: String::new(),
            criteria_dir: PathBuf::from("data/criteria"),
            cache: CacheConfig::default(),
            batch_chunk_size: 256,
            default_decision: "Rejected".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

// ── Cache ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Key prefix separating this engine's entries in a shared backend.
    pub namespace: String,
    pub ttl_secs: u64,
    pub capacity: usize,
}

impl CacheConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            enabled: profiled_env_bool(p, "VERDICT_CACHE_ENABLED", true),
            namespace: profiled_env_or(p, "VERDICT_CACHE_NAMESPACE", "verdict"),
            ttl_secs: profiled_env_u64(p, "VERDICT_CACHE_TTL_SECS", 3600),
            capacity: profiled_env_usize(p, "VERDICT_CACHE_CAPACITY", 10_000).max(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            namespace: "verdict".to_string(),
            ttl_secs: 3600,
            capacity: 10_000,
        }
    }
}
