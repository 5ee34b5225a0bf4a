// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use glint_core::asset::AssetUUID;
use std::collections::HashSet;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// The set of identifiers currently being loaded.
///
/// At most one [`LoadingLock`] exists per identifier. Waiters block on a
/// condition variable that is signalled whenever a lock is released.
#[derive(Debug, Default)]
pub struct LoadingLocks {
    loading: Mutex<HashSet<AssetUUID>>,
    released: Condvar,
}

impl LoadingLocks {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&self) -> MutexGuard<'_, HashSet<AssetUUID>> {
        self.loading.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks `uuid` as loading, or returns `None` if a load is already in flight.
    pub fn try_lock(&self, uuid: AssetUUID) -> Option<LoadingLock<'_>> {
        let inserted = self.set().insert(uuid);
        inserted.then(|| LoadingLock { locks: self, uuid })
    }

    /// Waits until no load of `uuid` is in flight, then marks it as loading.
    pub fn lock(&self, uuid: AssetUUID) -> LoadingLock<'_> {
        let mut loading = self.set();
        while loading.contains(&uuid) {
            loading = self
                .released
                .wait(loading)
                .unwrap_or_else(PoisonError::into_inner);
        }
        loading.insert(uuid);
        LoadingLock { locks: self, uuid }
    }

    /// Returns `true` if a load of `uuid` is in flight.
    pub fn is_loading(&self, uuid: AssetUUID) -> bool {
        self.set().contains(&uuid)
    }

    /// Every identifier currently being loaded.
    pub fn all_loading(&self) -> Vec<AssetUUID> {
        let mut all: Vec<AssetUUID> = self.set().iter().copied().collect();
        all.sort();
        all
    }
}

/// Marks one identifier as loading until dropped.
#[derive(Debug)]
#[must_use = "the identifier is released as soon as the lock is dropped"]
pub struct LoadingLock<'a> {
    locks: &'a LoadingLocks,
    uuid: AssetUUID,
}

impl LoadingLock<'_> {
    /// The locked identifier.
    pub fn uuid(&self) -> AssetUUID {
        self.uuid
    }
}

impl Drop for LoadingLock<'_> {
    fn drop(&mut self) {
        self.locks.set().remove(&self.uuid);
        self.locks.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn uuid(raw: u64) -> AssetUUID {
        AssetUUID::from_raw(raw).unwrap()
    }

    #[test]
    fn test_second_lock_is_refused() {
        let locks = LoadingLocks::new();
        let first = locks.try_lock(uuid(1));
        assert!(first.is_some());
        assert!(locks.try_lock(uuid(1)).is_none());
        assert!(locks.try_lock(uuid(2)).is_some());
        assert!(locks.is_loading(uuid(1)));
    }

    #[test]
    fn test_drop_releases() {
        let locks = LoadingLocks::new();
        {
            let _lock = locks.try_lock(uuid(1)).unwrap();
            assert_eq!(locks.all_loading(), vec![uuid(1)]);
        }
        assert!(!locks.is_loading(uuid(1)));
        assert!(locks.try_lock(uuid(1)).is_some());
    }

    #[test]
    fn test_blocking_lock_waits_for_release() {
        let locks = Arc::new(LoadingLocks::new());
        let acquired = Arc::new(AtomicBool::new(false));

        let held = locks.try_lock(uuid(7)).unwrap();
        let waiter = {
            let locks = locks.clone();
            let acquired = acquired.clone();
            thread::spawn(move || {
                let _lock = locks.lock(uuid(7));
                acquired.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!acquired.load(Ordering::SeqCst));
        drop(held);

        waiter.join().unwrap();
        assert!(acquired.load(Ordering::SeqCst));
        assert!(!locks.is_loading(uuid(7)));
    }
}
