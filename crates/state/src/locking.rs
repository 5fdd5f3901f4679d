//! Process-wide named locks
//!
//! A named lock serializes every holder of the same name inside this
//! process. Cross-process exclusion comes from pairing it with a write to the
//! matching row of the `locks` table inside the guarded transaction (see
//! [`crate::queries::touch_lock`]).

use dashmap::DashMap;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lock serializing every buildpack creation, across all names
pub const LOCK_BUILDPACKS: &str = "buildpacks";

static REGISTRY: OnceLock<DashMap<String, Arc<Mutex<()>>>> = OnceLock::new();

fn registry() -> &'static DashMap<String, Arc<Mutex<()>>> {
    REGISTRY.get_or_init(DashMap::new)
}

/// Held for as long as the named lock is owned; dropping it releases the lock
#[derive(Debug)]
pub struct NamedLockGuard {
    name: String,
    waited: Duration,
    _guard: OwnedMutexGuard<()>,
}

impl NamedLockGuard {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Time spent waiting for the lock
    #[must_use]
    pub fn waited(&self) -> Duration {
        self.waited
    }
}

/// Acquire the process-wide lock registered under `name`, waiting if held
pub async fn acquire(name: &str) -> NamedLockGuard {
    let started = Instant::now();
    let mutex = registry()
        .entry(name.to_string())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone();
    let guard = mutex.lock_owned().await;

    NamedLockGuard {
        name: name.to_string(),
        waited: started.elapsed(),
        _guard: guard,
    }
}

/// Try to take the lock without waiting
#[must_use]
pub fn try_acquire(name: &str) -> Option<NamedLockGuard> {
    let mutex = registry()
        .entry(name.to_string())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone();
    mutex.try_lock_owned().ok().map(|guard| NamedLockGuard {
        name: name.to_string(),
        waited: Duration::ZERO,
        _guard: guard,
    })
}
