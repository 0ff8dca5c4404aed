//! Environment variable access for environment-bound arguments.
//!
//! Arguments read their defaults from, and mirror their values into, an
//! [`Environment`]. [`ProcessEnv`] talks to the real process environment;
//! [`MemoryEnv`] keeps an isolated map so tests and embedded hosts do not
//! leak state into the process.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

/// Read/write access to a set of environment variables.
pub trait Environment: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// The process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn set(&self, key: &str, value: &str) {
        if key.is_empty() || key.contains('=') || key.contains('\0') || value.contains('\0') {
            tracing::warn!("refusing to export invalid environment variable '{}'", key);
            return;
        }
        // SAFETY: parse invocations run one at a time; hosts that read the
        // environment from other threads should use `MemoryEnv` instead.
        unsafe { std::env::set_var(key, value) };
    }

    fn remove(&self, key: &str) {
        if key.is_empty() || key.contains('=') || key.contains('\0') {
            return;
        }
        // SAFETY: see `set`.
        unsafe { std::env::remove_var(key) };
    }
}

/// An in-memory environment.
#[derive(Debug, Default)]
pub struct MemoryEnv {
    vars: Mutex<HashMap<String, String>>,
}

impl MemoryEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the environment with variables.
    pub fn with_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let env = Self::new();
        {
            let mut map = env.lock();
            for (k, v) in vars {
                map.insert(k.into(), v.into());
            }
        }
        env
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.vars.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Environment for MemoryEnv {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.lock().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.lock().remove(key);
    }
}
