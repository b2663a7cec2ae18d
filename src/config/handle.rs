//! Global config with atomic reload support.
//!
//! Uses `arc-swap` for lock-free reads and atomic config replacement.
//! This enables hot-reloading of `manview.toml` while serving.
//!
//! ```text
//!   request threads            watcher
//!        │                        │
//!      cfg()               reload_config()
//!   (lock-free)           (atomic replace)
//!        └──────── CONFIG ────────┘
//! ```

use super::ManviewConfig;
use anyhow::Context;
use arc_swap::ArcSwap;
use std::{
    fs,
    sync::{
        Arc, LazyLock,
        atomic::{AtomicU64, Ordering},
    },
};

/// Global config storage with atomic replacement support.
///
/// Initialized with default config, then replaced with loaded config in main.
pub static CONFIG: LazyLock<ArcSwap<ManviewConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(ManviewConfig::default()));

/// Hash of the config file content last loaded.
static CONFIG_HASH: AtomicU64 = AtomicU64::new(0);

/// Get current config as `Arc<ManviewConfig>`. Thread-safe and wait-free.
#[inline]
pub fn cfg() -> Arc<ManviewConfig> {
    CONFIG.load_full()
}

fn content_hash(content: &[u8]) -> u64 {
    let hash = blake3::hash(content);
    let mut head = [0u8; 8];
    head.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(head)
}

/// Replace config atomically (called when manview.toml changes).
///
/// Returns `true` if config was actually updated, `false` if the file content
/// matches the last load. The old config stays valid for readers holding it.
pub fn reload_config() -> anyhow::Result<bool> {
    let c = cfg();
    let cli = c.cli.context("config reloaded before initialization")?;

    let content = fs::read_to_string(&c.config_path)
        .with_context(|| format!("failed to read {}", c.config_path.display()))?;
    let new_hash = content_hash(content.as_bytes());
    if new_hash == CONFIG_HASH.load(Ordering::Relaxed) {
        return Ok(false);
    }

    let mut new_config = ManviewConfig::from_str(&content)?;
    new_config.update_with_cli(cli);
    new_config.validate()?;

    CONFIG.store(Arc::new(new_config));
    CONFIG_HASH.store(new_hash, Ordering::Relaxed);
    Ok(true)
}

/// Initialize global config (called once at startup).
pub fn init_config(config: ManviewConfig) {
    if let Ok(content) = fs::read_to_string(&config.config_path) {
        CONFIG_HASH.store(content_hash(content.as_bytes()), Ordering::Relaxed);
    }
    CONFIG.store(Arc::new(config));
}
