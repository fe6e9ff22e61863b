//! # Scene Lock
//!
//! Guards host scene-graph reads. The session acquires it for the snapshot
//! and must release it before the blocking render call.
//!
//! ```text
//! acquire ──> traverse scene ──> release ──> render
//!    │                              ↑
//!    └──── any early exit ──────────┘ (guard drop)
//! ```

use std::ops::Deref;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard};
use tracing::debug;

use crate::error::LockError;

/// Host scene data behind a timed lock.
#[derive(Debug, Default)]
pub struct SceneLock<S> {
    scene: Mutex<S>,
}

impl<S> SceneLock<S> {
    /// Wraps host scene data.
    #[must_use]
    pub fn new(scene: S) -> Self {
        Self {
            scene: Mutex::new(scene),
        }
    }

    /// Acquires read access to the scene, waiting at most `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`LockError`] if the lock is still held elsewhere when the
    /// timeout elapses.
    pub fn acquire(&self, timeout: Duration) -> Result<SceneGuard<'_, S>, LockError> {
        let started = Instant::now();
        let guard = self
            .scene
            .try_lock_for(timeout)
            .ok_or(LockError { waited: timeout })?;
        debug!(waited_us = started.elapsed().as_micros() as u64, "scene lock acquired");
        Ok(SceneGuard {
            guard,
            acquired_at: Instant::now(),
        })
    }

    /// Exclusive access for the host, outside any render.
    pub fn lock(&self) -> MutexGuard<'_, S> {
        self.scene.lock()
    }

    /// Whether the lock is currently held.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.scene.is_locked()
    }

    /// Returns the scene data.
    pub fn into_inner(self) -> S {
        self.scene.into_inner()
    }
}

/// Read access to the scene. Releases the lock when dropped.
#[derive(Debug)]
pub struct SceneGuard<'a, S> {
    guard: MutexGuard<'a, S>,
    acquired_at: Instant,
}

impl<S> SceneGuard<'_, S> {
    /// Releases the lock now.
    pub fn release(self) {
        drop(self);
    }
}

impl<S> Deref for SceneGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl<S> Drop for SceneGuard<'_, S> {
    fn drop(&mut self) {
        debug!(
            held_us = self.acquired_at.elapsed().as_micros() as u64,
            "scene lock released"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{mpsc, Arc};
    use std::thread;

    #[test]
    fn test_guard_releases_on_drop() {
        let lock = SceneLock::new(vec![1, 2, 3]);
        {
            let guard = lock.acquire(Duration::from_millis(10)).unwrap();
            assert_eq!(guard.len(), 3);
            assert!(lock.is_locked());
        }
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_explicit_release() {
        let lock = SceneLock::new(());
        let guard = lock.acquire(Duration::from_millis(10)).unwrap();
        guard.release();
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_times_out_when_held_elsewhere() {
        let lock = Arc::new(SceneLock::new(0u32));
        let (locked_tx, locked_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel::<()>();

        let holder = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                let _guard = lock.lock();
                locked_tx.send(()).unwrap();
                done_rx.recv().unwrap();
            })
        };

        locked_rx.recv().unwrap();
        let err = lock.acquire(Duration::from_millis(20)).unwrap_err();
        assert_eq!(err.waited, Duration::from_millis(20));

        done_tx.send(()).unwrap();
        holder.join().unwrap();
        assert!(lock.acquire(Duration::from_millis(20)).is_ok());
    }
}
