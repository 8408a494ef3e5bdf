use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;

use crate::codec::DEFAULT_MAX_FRAME_SIZE;

pub const DEFAULT_PORT: u16 = 6379;
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Startup configuration of the server.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    /// Shared secret clients must present with `AUTH`. `None` disables authentication.
    pub password: Option<Bytes>,
    pub enable_unsupported_commands: bool,
    /// Number of threads available to deferred command bodies.
    pub workers: usize,
    pub max_frame_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            password: None,
            enable_unsupported_commands: false,
            workers: 4,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// Settings that may change while the server is running. Shared by every connection.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    allow_unsupported: Arc<AtomicBool>,
}

impl Settings {
    pub fn new(allow_unsupported: bool) -> Settings {
        Settings {
            allow_unsupported: Arc::new(AtomicBool::new(allow_unsupported)),
        }
    }

    pub fn allow_unsupported(&self) -> bool {
        self.allow_unsupported.load(Ordering::Relaxed)
    }

    pub fn set_allow_unsupported(&self, allow: bool) {
        self.allow_unsupported.store(allow, Ordering::Relaxed);
    }
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Self {
        Settings::new(config.enable_unsupported_commands)
    }
}
