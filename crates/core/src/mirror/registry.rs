//! In-flight destination registry shared by all workers.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Concurrent set of destination paths currently being fetched.
///
/// `try_acquire` is a single insert-if-absent under one lock, so two
/// workers can never both win the same path.
#[derive(Debug, Default)]
pub struct DedupRegistry {
    in_flight: Mutex<HashSet<String>>,
}

impl DedupRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashSet<String>> {
        // Entries stay consistent even if a holder panicked mid-operation
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks `path` as in flight. Returns false if it already was.
    pub fn try_acquire(&self, path: &str) -> bool {
        self.entries().insert(path.to_string())
    }

    /// Removes `path` unconditionally.
    pub fn release(&self, path: &str) {
        self.entries().remove(path);
    }

    /// Scoped variant of [`try_acquire`](Self::try_acquire): the entry is
    /// released when the returned guard is dropped.
    pub fn acquire(self: &Arc<Self>, path: &str) -> Option<InFlightGuard> {
        if self.try_acquire(path) {
            Some(InFlightGuard {
                registry: Arc::clone(self),
                path: path.to_string(),
            })
        } else {
            None
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries().contains(path)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// Holds a registry entry for the duration of one fetch attempt.
#[derive(Debug)]
pub struct InFlightGuard {
    registry: Arc<DedupRegistry>,
    path: String,
}

impl InFlightGuard {
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.release(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_try_acquire_is_exclusive() {
        let registry = DedupRegistry::new();
        assert!(registry.try_acquire("uploads/a.png"));
        assert!(!registry.try_acquire("uploads/a.png"));
        assert!(registry.contains("uploads/a.png"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_release_allows_reacquire() {
        let registry = DedupRegistry::new();
        assert!(registry.try_acquire("uploads/a.png"));
        registry.release("uploads/a.png");
        assert!(!registry.contains("uploads/a.png"));
        assert!(registry.try_acquire("uploads/a.png"));
    }

    #[test]
    fn test_release_of_absent_path_is_noop() {
        let registry = DedupRegistry::new();
        registry.release("uploads/missing.png");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_distinct_paths_do_not_conflict() {
        let registry = DedupRegistry::new();
        assert!(registry.try_acquire("uploads/a.png"));
        assert!(registry.try_acquire("uploads/b.png"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let registry = Arc::new(DedupRegistry::new());
        {
            let guard = registry.acquire("uploads/a.png").expect("first acquire");
            assert_eq!(guard.path(), "uploads/a.png");
            assert!(registry.acquire("uploads/a.png").is_none());
        }
        assert!(registry.is_empty());
        assert!(registry.acquire("uploads/a.png").is_some());
    }

    #[test]
    fn test_guard_releases_on_panic() {
        let registry = Arc::new(DedupRegistry::new());
        let cloned = Arc::clone(&registry);
        let result = thread::spawn(move || {
            let _guard = cloned.acquire("uploads/panic.png").unwrap();
            panic!("fetch blew up");
        })
        .join();

        assert!(result.is_err());
        assert!(!registry.contains("uploads/panic.png"));
    }

    #[test]
    fn test_concurrent_acquire_has_single_winner() {
        const THREADS: usize = 16;
        let registry = Arc::new(DedupRegistry::new());
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    registry.try_acquire("uploads/logo.png")
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
