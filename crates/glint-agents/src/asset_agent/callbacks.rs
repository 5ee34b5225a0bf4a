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

use glint_core::asset::{AssetUUID, SharedResource};
use glint_core::event::{AssetEvent, AssetEventKind, EventBus};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A one-shot callback receiving a loaded resource.
pub type AssetCallback = Box<dyn FnOnce(SharedResource) + Send + 'static>;

/// A subscriber to asset notifications of one kind.
pub type EventCallback = Box<dyn FnMut(&AssetEvent) + Send + 'static>;

/// Outcome of registering interest in an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Registration {
    /// Nothing was pending; the caller must start a load.
    Started,
    /// A load is already pending; the callback was queued behind it.
    AlreadyPending,
}

pub(crate) struct Completion {
    uuid: AssetUUID,
    resource: Option<SharedResource>,
    callbacks: Vec<AssetCallback>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Pending per-identifier callbacks and the queue of finished loads.
///
/// Workers report completions from any thread. Completing an identifier takes
/// its callback list out of the pending set, so a registration that arrives
/// afterwards starts a fresh load instead of attaching to a finished one.
/// [`CallbackQueue::drain`] runs on the consuming thread and invokes the
/// callbacks of each completion once, in registration order.
#[derive(Default)]
pub(crate) struct CallbackQueue {
    pending: Mutex<HashMap<AssetUUID, Vec<AssetCallback>>>,
    completions: EventBus<Completion>,
}

impl CallbackQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&self, uuid: AssetUUID, callback: Option<AssetCallback>) -> Registration {
        let mut pending = lock(&self.pending);
        match pending.get_mut(&uuid) {
            Some(callbacks) => {
                callbacks.extend(callback);
                Registration::AlreadyPending
            }
            None => {
                pending.insert(uuid, callback.into_iter().collect());
                Registration::Started
            }
        }
    }

    pub(crate) fn is_pending(&self, uuid: AssetUUID) -> bool {
        lock(&self.pending).contains_key(&uuid)
    }

    /// Reports a finished load; `None` marks a failure.
    pub(crate) fn complete(&self, uuid: AssetUUID, resource: Option<SharedResource>) {
        let callbacks = lock(&self.pending).remove(&uuid).unwrap_or_default();
        self.completions.publish(Completion {
            uuid,
            resource,
            callbacks,
        });
    }

    /// Delivers every reported completion. Returns the number of callbacks invoked.
    pub(crate) fn drain(&self) -> usize {
        let mut invoked = 0;
        for Completion {
            uuid,
            resource,
            callbacks,
        } in self.completions.drain()
        {
            match resource {
                Some(resource) => {
                    for callback in callbacks {
                        callback(resource.clone());
                        invoked += 1;
                    }
                }
                None if !callbacks.is_empty() => {
                    log::debug!(
                        "Discarding {} callbacks for failed load of asset {uuid}",
                        callbacks.len()
                    );
                }
                None => {}
            }
        }
        invoked
    }

    pub(crate) fn clear(&self) {
        lock(&self.pending).clear();
        self.completions.drain();
    }
}

/// Loaded/Reloaded/Unloaded notifications and their subscribers.
#[derive(Default)]
pub(crate) struct AssetEvents {
    bus: EventBus<AssetEvent>,
    subscribers: Mutex<HashMap<AssetEventKind, Vec<EventCallback>>>,
}

impl AssetEvents {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn subscribe(&self, kind: AssetEventKind, callback: EventCallback) {
        lock(&self.subscribers).entry(kind).or_default().push(callback);
    }

    pub(crate) fn publish(
        &self,
        kind: AssetEventKind,
        uuid: AssetUUID,
        resource: Option<SharedResource>,
    ) {
        log::trace!("Asset {uuid} {kind:?}");
        self.bus.publish(AssetEvent {
            kind,
            uuid,
            resource,
        });
    }

    /// Delivers every queued notification. Returns the number delivered.
    ///
    /// Subscribers are called without the subscriber lock held, so they may
    /// subscribe further callbacks; those see the next notification onwards.
    pub(crate) fn dispatch(&self) -> usize {
        let events = self.bus.drain();
        for event in &events {
            let mut callbacks = lock(&self.subscribers)
                .remove(&event.kind)
                .unwrap_or_default();
            for callback in callbacks.iter_mut() {
                callback(event);
            }
            let mut subscribers = lock(&self.subscribers);
            let added = subscribers.remove(&event.kind).unwrap_or_default();
            callbacks.extend(added);
            subscribers.insert(event.kind, callbacks);
        }
        events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_core::asset::{Resource, ResourceIdentity, TypeHash};
    use std::sync::Arc;

    #[derive(Default)]
    struct Blob {
        identity: ResourceIdentity,
    }

    impl Resource for Blob {
        fn identity(&self) -> &ResourceIdentity {
            &self.identity
        }

        fn identity_mut(&mut self) -> &mut ResourceIdentity {
            &mut self.identity
        }

        fn type_hash(&self) -> TypeHash {
            TypeHash::of_name("Blob")
        }
    }

    fn uuid(raw: u64) -> AssetUUID {
        AssetUUID::from_raw(raw).unwrap()
    }

    #[test]
    fn test_callbacks_fire_in_registration_order() {
        let queue = CallbackQueue::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for label in ["first", "second", "third"] {
            let order = order.clone();
            let callback: AssetCallback = Box::new(move |_| order.lock().unwrap().push(label));
            queue.register(uuid(1), Some(callback));
        }

        queue.complete(uuid(1), Some(Arc::new(Blob::default())));
        assert_eq!(queue.drain(), 3);
        assert_eq!(*order.lock().unwrap(), ["first", "second", "third"]);
        assert!(!queue.is_pending(uuid(1)));
    }

    #[test]
    fn test_registration_reports_pending_loads() {
        let queue = CallbackQueue::new();
        assert_eq!(queue.register(uuid(1), None), Registration::Started);
        assert_eq!(queue.register(uuid(1), None), Registration::AlreadyPending);
        assert_eq!(queue.register(uuid(2), None), Registration::Started);
    }

    #[test]
    fn test_registration_after_completion_starts_new_load() {
        let queue = CallbackQueue::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let first = order.clone();
        queue.register(uuid(1), Some(Box::new(move |_| first.lock().unwrap().push(1))));
        queue.complete(uuid(1), Some(Arc::new(Blob::default())));

        // Not drained yet, but the finished load no longer takes new callbacks.
        assert!(!queue.is_pending(uuid(1)));
        let second = order.clone();
        let registration =
            queue.register(uuid(1), Some(Box::new(move |_| second.lock().unwrap().push(2))));
        assert_eq!(registration, Registration::Started);

        assert_eq!(queue.drain(), 1);
        assert_eq!(*order.lock().unwrap(), [1]);

        queue.complete(uuid(1), Some(Arc::new(Blob::default())));
        assert_eq!(queue.drain(), 1);
        assert_eq!(*order.lock().unwrap(), [1, 2]);
    }

    #[test]
    fn test_failed_load_drops_callbacks() {
        let queue = CallbackQueue::new();
        let called = Arc::new(Mutex::new(false));
        let flag = called.clone();
        queue.register(uuid(1), Some(Box::new(move |_| *flag.lock().unwrap() = true)));

        queue.complete(uuid(1), None);
        assert_eq!(queue.drain(), 0);
        assert!(!*called.lock().unwrap());
        assert!(!queue.is_pending(uuid(1)));
    }

    #[test]
    fn test_events_reach_subscribers_of_their_kind() {
        let events = AssetEvents::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        events.subscribe(
            AssetEventKind::Reloaded,
            Box::new(move |event: &AssetEvent| sink.lock().unwrap().push(event.uuid)),
        );

        events.publish(AssetEventKind::Loaded, uuid(1), None);
        events.publish(AssetEventKind::Reloaded, uuid(2), None);
        assert_eq!(events.dispatch(), 2);
        assert_eq!(*seen.lock().unwrap(), vec![uuid(2)]);
    }
}
