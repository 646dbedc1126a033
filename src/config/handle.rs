// src/config/handle.rs
//! Shared, live view of the monitor configuration.
//!
//! Scanners never keep a config around between units: they call
//! [`ConfigSource::current`] before every unit, so edits made through
//! [`ConfigHandle::replace`] (or picked up by the hot-reload thread) apply from
//! the next unit on.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, SystemTime};

use super::monitor::{load_config_from, MonitorConfig};
use crate::monitor::types::ConfigSource;

pub const ENV_HOT_RELOAD: &str = "MONITOR_HOT_RELOAD";

/// A threadsafe handle around the current [`MonitorConfig`].
#[derive(Clone, Default)]
pub struct ConfigHandle {
    inner: Arc<RwLock<MonitorConfig>>,
}

impl ConfigHandle {
    pub fn new(cfg: MonitorConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(cfg.cleaned())),
        }
    }

    /// Swap in a new configuration (cleaned first).
    pub fn replace(&self, cfg: MonitorConfig) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = cfg.cleaned();
        }
    }

    /// Apply an in-place edit, e.g. adding a community from a UI action.
    pub fn update<F: FnOnce(&mut MonitorConfig)>(&self, f: F) {
        if let Ok(mut guard) = self.inner.write() {
            let mut next = guard.clone();
            f(&mut next);
            *guard = next.cleaned();
        }
    }

    pub fn snapshot(&self) -> MonitorConfig {
        match self.inner.read() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ConfigSource for ConfigHandle {
    fn current(&self) -> MonitorConfig {
        self.snapshot()
    }
}

fn hot_reload_enabled() -> bool {
    std::env::var(ENV_HOT_RELOAD)
        .ok()
        .map(|v| v == "1")
        .unwrap_or(false)
}

/// Start a simple polling watcher on `path` that reloads into `handle`.
/// Polls mtime every 2s. No-op unless MONITOR_HOT_RELOAD=1.
pub fn start_hot_reload_thread(handle: ConfigHandle, path: PathBuf) {
    if !hot_reload_enabled() {
        return;
    }

    tracing::info!(target: "monitor", path = %path.display(), "config hot reload enabled");
    thread::spawn(move || {
        let poll = Duration::from_secs(2);
        let mut last_mtime: Option<SystemTime> = None;

        loop {
            if let Ok(mtime) = fs::metadata(&path).and_then(|m| m.modified()) {
                let changed = match last_mtime {
                    None => {
                        last_mtime = Some(mtime);
                        false
                    }
                    Some(prev) => mtime > prev,
                };
                if changed {
                    match load_config_from(&path) {
                        Ok(cfg) => {
                            handle.replace(cfg);
                            tracing::info!(target: "monitor", "config reloaded");
                        }
                        Err(e) => {
                            tracing::warn!(
                                target: "monitor",
                                error = ?e,
                                "config reload failed; keeping previous"
                            );
                        }
                    }
                    last_mtime = Some(mtime);
                }
            }
            thread::sleep(poll);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_is_visible_to_next_read() {
        let handle = ConfigHandle::new(MonitorConfig::default());
        let reader = handle.clone();
        assert!(reader.current().brand_keywords.is_empty());

        handle.replace(MonitorConfig {
            brand_keywords: vec![" acme ".into()],
            ..Default::default()
        });
        assert_eq!(reader.current().brand_keywords, vec!["acme".to_string()]);
    }

    #[test]
    fn update_cleans_new_entries() {
        let handle = ConfigHandle::default();
        handle.update(|c| c.monitored_communities.push("r/RustLang".into()));
        assert_eq!(handle.snapshot().monitored_communities, vec!["rustlang"]);
    }
}
