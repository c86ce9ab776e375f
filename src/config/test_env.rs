use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

/// Serializes every test that touches `BOLT_CONSENT_*` variables.
static ENV_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Holds the environment lock for its lifetime and puts every variable it
/// touched back the way it found it on drop.
pub(super) struct ScopedEnv {
    saved: Vec<(&'static str, Option<String>)>,
    _lock: MutexGuard<'static, ()>,
}

impl ScopedEnv {
    pub(super) fn new() -> Self {
        Self {
            saved: Vec::new(),
            _lock: ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    pub(super) fn set(mut self, key: &'static str, value: &str) -> Self {
        self.remember(key);
        // SAFETY: ENV_LOCK is held by `self`, so no other test mutates the
        // environment concurrently.
        unsafe {
            std::env::set_var(key, value);
        }
        self
    }

    pub(super) fn unset(mut self, key: &'static str) -> Self {
        self.remember(key);
        // SAFETY: as in `set`.
        unsafe {
            std::env::remove_var(key);
        }
        self
    }

    fn remember(&mut self, key: &'static str) {
        if !self.saved.iter().any(|(saved, _)| *saved == key) {
            self.saved.push((key, std::env::var(key).ok()));
        }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        // Fields drop after this body, so the lock outlives the restore.
        for (key, previous) in self.saved.drain(..).rev() {
            // SAFETY: ENV_LOCK is still held.
            unsafe {
                match previous {
                    Some(value) => std::env::set_var(key, value),
                    None => std::env::remove_var(key),
                }
            }
        }
    }
}
