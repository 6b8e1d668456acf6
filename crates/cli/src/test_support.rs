use std::sync::{Mutex, OnceLock};

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// Runs `run` with exclusive access to the process environment.
///
/// The listed variables are cleared first and restored to their previous
/// values afterwards, even if `run` panics.
pub(crate) fn with_locked_env<R>(keys: &[&str], run: impl FnOnce() -> R) -> R {
    let _guard = env_lock().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _restore = EnvRestore::capture(keys);
    for key in keys {
        remove_env_var(key);
    }
    run()
}

/// Previous values of a set of variables, written back on drop.
struct EnvRestore {
    saved: Vec<(String, Option<String>)>,
}

impl EnvRestore {
    fn capture(keys: &[&str]) -> Self {
        Self {
            saved: keys
                .iter()
                .map(|key| (key.to_string(), std::env::var(key).ok()))
                .collect(),
        }
    }
}

impl Drop for EnvRestore {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(value) => set_env_var(key, value),
                None => remove_env_var(key),
            }
        }
    }
}

/// Set an environment variable in test contexts.
///
/// # Safety
/// Only call inside `with_locked_env` so parallel tests never race.
pub(crate) fn set_env_var(key: &str, value: &str) {
    // SAFETY: callers hold the environment lock.
    unsafe {
        std::env::set_var(key, value);
    }
}

/// Remove an environment variable in test contexts.
///
/// # Safety
/// Only call inside `with_locked_env` so parallel tests never race.
pub(crate) fn remove_env_var(key: &str) {
    // SAFETY: callers hold the environment lock.
    unsafe {
        std::env::remove_var(key);
    }
}
