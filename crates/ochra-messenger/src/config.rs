//! Engine configuration: worker pool sizing and logging verbosity.
//!
//! This struct is meant to be embedded as the `[messenger]` table of the
//! daemon's own `toml`-backed `DaemonConfig` (see `ochra-daemon::config`);
//! it carries no parsing logic of its own.

use serde::{Deserialize, Serialize};

/// Engine configuration (Section 1.1 of the expanded specification).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessengerConfig {
    /// Log verbosity: "debug" | "info" | "warn" | "error" | "none".
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Comma-separated tag allowlist; empty means all tags.
    #[serde(default)]
    pub log_tags: String,
    /// Number of worker tasks draining the task queue.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_worker_threads() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    cpus.clamp(4, 24)
}

impl Default for MessengerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_tags: String::new(),
            worker_threads: default_worker_threads(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_worker_threads_in_range() {
        let cfg = MessengerConfig::default();
        assert!(cfg.worker_threads >= 4 && cfg.worker_threads <= 24);
    }

    #[test]
    fn test_default_log_level() {
        assert_eq!(MessengerConfig::default().log_level, "info");
    }
}
