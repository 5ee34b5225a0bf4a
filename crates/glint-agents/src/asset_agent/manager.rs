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

use super::callbacks::{AssetCallback, AssetEvents, CallbackQueue, Registration};
use super::loader::LoaderRegistry;
use super::loading::LoadingLocks;
use crate::config::AssetManagerConfig;
use crate::jobs::{JobRunner, WorkerPool};
use anyhow::Context;
use glint_core::asset::{
    downcast_resource, AssetHandle, AssetUUID, Resource, ResourceResolver, SharedResource,
    TypeHash, TypeRegistry, TypedResource,
};
use glint_core::database::{AssetDatabase, AssetLocation};
use glint_core::event::{AssetEvent, AssetEventKind};
use glint_core::AssetError;
use glint_data::resources::ResourceStore;
use glint_lanes::asset_lane::{ArchiveCache, AssetArchive, ResourceLoader};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard};

/// State shared between the manager and its background jobs.
struct SharedState {
    config: AssetManagerConfig,
    database: Arc<dyn AssetDatabase>,
    registry: RwLock<TypeRegistry>,
    loaders: RwLock<LoaderRegistry>,
    resources: RwLock<ResourceStore>,
    archives: ArchiveCache,
    loading: LoadingLocks,
    callbacks: CallbackQueue,
    events: AssetEvents,
    reloading: Mutex<HashSet<AssetUUID>>,
}

/// Resolves asset identifiers to loaded resources.
///
/// Lookups hit the per-type resource store first. On a miss the asset is
/// loaded either on the calling thread ([`AssetManager::get_asset_immediate`])
/// or by a background job ([`AssetManager::get_asset`],
/// [`AssetManager::get_or_load_asset`]). At most one load per identifier is in
/// flight at any time. Completion callbacks and notifications are delivered
/// only from [`AssetManager::run_callbacks`], on the caller's thread.
///
/// Failures never cross this API: they are logged and reported as `None`.
pub struct AssetManager {
    jobs: Option<Box<dyn JobRunner>>,
    shared: Arc<SharedState>,
}

impl AssetManager {
    /// Creates a manager backed by a worker pool sized from the configuration.
    pub fn new(config: AssetManagerConfig, database: Arc<dyn AssetDatabase>) -> anyhow::Result<Self> {
        let pool = WorkerPool::new(config.worker_count())
            .context("Failed to start the asset loader threads")?;
        Ok(Self::with_job_runner(config, database, Box::new(pool)))
    }

    /// Creates a manager that runs background loads on `jobs`.
    pub fn with_job_runner(
        config: AssetManagerConfig,
        database: Arc<dyn AssetDatabase>,
        jobs: Box<dyn JobRunner>,
    ) -> Self {
        log::info!(
            "Asset manager initialized (asset root '{}')",
            config.asset_root.display()
        );
        Self {
            jobs: Some(jobs),
            shared: Arc::new(SharedState {
                config,
                database,
                registry: RwLock::new(TypeRegistry::new()),
                loaders: RwLock::new(LoaderRegistry::new()),
                resources: RwLock::new(ResourceStore::new()),
                archives: ArchiveCache::new(),
                loading: LoadingLocks::new(),
                callbacks: CallbackQueue::new(),
                events: AssetEvents::new(),
                reloading: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// The configuration the manager was created with.
    pub fn config(&self) -> &AssetManagerConfig {
        &self.shared.config
    }

    /// The asset database.
    pub fn database(&self) -> &dyn AssetDatabase {
        self.shared.database.as_ref()
    }

    /// Read access to the type registry.
    pub fn registry(&self) -> RwLockReadGuard<'_, TypeRegistry> {
        self.shared.registry()
    }

    /// Registers a resource type, its file extensions and its storage.
    pub fn register_resource_type<T: TypedResource>(&self, extensions: &[&str]) -> TypeHash {
        let hash = write(&self.shared.registry).register_resource::<T>(extensions);
        write(&self.shared.resources).register::<T>();
        hash
    }

    /// Registers a plain value type usable as a material property.
    pub fn register_basic_type<T: 'static>(&self, name: &str) -> TypeHash {
        write(&self.shared.registry).register_basic_type::<T>(name)
    }

    /// Registers the loader module for `T`.
    pub fn register_loader<T: TypedResource>(&self, loader: impl ResourceLoader<T> + 'static) {
        let mut loaders = write(&self.shared.loaders);
        loaders.register::<T>(loader);
        log::debug!("{} loader modules registered", loaders.len());
    }

    /// Requests `uuid` and calls `callback` once it is available.
    ///
    /// A cached asset is handed to `callback` right away. Otherwise the
    /// callback is queued and delivered by [`AssetManager::run_callbacks`]
    /// after the load finishes; callbacks queued while a load is in flight
    /// share that load and fire in the order they were queued. A failed
    /// load drops its callbacks without calling them.
    pub fn get_asset(&self, uuid: AssetUUID, callback: impl FnOnce(SharedResource) + Send + 'static) {
        if let Some(resource) = self.shared.find_resource(uuid) {
            callback(resource);
            return;
        }
        let callback: AssetCallback = Box::new(callback);
        if self.shared.callbacks.register(uuid, Some(callback)) == Registration::Started {
            self.enqueue(uuid);
        }
    }

    /// Returns the cached asset, or starts a background load and returns `None`.
    ///
    /// Callers poll: every call returns `None` until the load has finished.
    pub fn get_or_load_asset(&self, uuid: AssetUUID) -> Option<SharedResource> {
        if let Some(resource) = self.shared.find_resource(uuid) {
            return Some(resource);
        }
        if self.shared.callbacks.register(uuid, None) == Registration::Started {
            self.enqueue(uuid);
        }
        None
    }

    /// Returns the asset, loading it on the calling thread if necessary.
    ///
    /// Blocks while another load of `uuid` is in flight.
    pub fn get_asset_immediate(&self, uuid: AssetUUID) -> Option<SharedResource> {
        self.shared.load_immediate(uuid)
    }

    /// Typed variant of [`AssetManager::get_asset_immediate`].
    pub fn get_asset_immediate_as<T: TypedResource>(&self, uuid: AssetUUID) -> Option<Arc<T>> {
        let resource = self.get_asset_immediate(uuid)?;
        let type_hash = resource.type_hash();
        let typed = downcast_resource::<T>(resource);
        if typed.is_none() {
            log::error!(
                "{}",
                AssetError::TypeMismatch {
                    uuid,
                    expected: T::TYPE_NAME
                }
            );
            log::debug!("Asset {uuid} has type {type_hash}");
        }
        typed
    }

    /// Drops the cached asset and loads it again in the background.
    ///
    /// The new resource is announced with [`AssetEventKind::Reloaded`]. A
    /// load that is already in flight also gets a fresh job queued behind it,
    /// so the reload is never absorbed by a load that read the old data.
    pub fn reload_asset(&self, uuid: AssetUUID) {
        self.unload_asset(uuid);
        lock(&self.shared.reloading).insert(uuid);
        self.shared.callbacks.register(uuid, None);
        self.enqueue(uuid);
    }

    /// Removes the asset from the cache. Does nothing if it is not loaded.
    ///
    /// A load that is in flight is not cancelled.
    pub fn unload_asset(&self, uuid: AssetUUID) {
        let removed = write(&self.shared.resources).remove(uuid);
        if removed.is_some() {
            log::debug!("Unloaded asset {uuid}");
            self.shared
                .events
                .publish(AssetEventKind::Unloaded, uuid, None);
        }
    }

    /// Cache-only lookup.
    pub fn find_resource(&self, uuid: AssetUUID) -> Option<SharedResource> {
        self.shared.find_resource(uuid)
    }

    /// Cache-only typed lookup.
    pub fn find<T: TypedResource>(&self, uuid: AssetUUID) -> Option<AssetHandle<T>> {
        read(&self.shared.resources).get_typed::<T>(uuid)
    }

    /// Registers an already constructed resource under its own identifier,
    /// assigning a new one if it has none.
    pub fn add_loaded_resource(&self, resource: Box<dyn Resource>) -> Option<SharedResource> {
        let uuid = resource.identity().uuid().unwrap_or_else(AssetUUID::new);
        self.add_loaded_resource_with_id(resource, uuid)
    }

    /// Registers an already constructed resource under `uuid`, replacing any
    /// resource cached under that identifier.
    pub fn add_loaded_resource_with_id(
        &self,
        mut resource: Box<dyn Resource>,
        uuid: AssetUUID,
    ) -> Option<SharedResource> {
        resource.identity_mut().set_uuid(Some(uuid));
        let resource = SharedResource::from(resource);
        match self.shared.store(uuid, resource.clone()) {
            Ok(()) => Some(resource),
            Err(e) => {
                log::error!("Failed to add resource {uuid}: {e}");
                None
            }
        }
    }

    /// Returns `true` if a load of `uuid` is in flight.
    pub fn is_loading(&self, uuid: AssetUUID) -> bool {
        self.shared.loading.is_loading(uuid) || self.shared.callbacks.is_pending(uuid)
    }

    /// Every identifier with a load in flight.
    pub fn all_loading(&self) -> Vec<AssetUUID> {
        self.shared.loading.all_loading()
    }

    /// Loads (or returns the cached) archive at `path`, relative to the asset root.
    pub fn get_or_load_archive(&self, path: &Path) -> Option<Arc<AssetArchive>> {
        let resolved = self.shared.config.resolve(path);
        let registry = self.shared.registry();
        match self.shared.archives.get_or_load(&resolved, &registry) {
            Ok(archive) => Some(archive),
            Err(e) => {
                log::error!("Failed to load archive '{}': {e:#}", resolved.display());
                None
            }
        }
    }

    /// Seeds the archive cache.
    pub fn add_asset_archive(&self, key: u32, archive: Arc<AssetArchive>) {
        self.shared.archives.insert(key, archive);
    }

    /// Subscribes to one kind of asset notification.
    pub fn subscribe(
        &self,
        kind: AssetEventKind,
        callback: impl FnMut(&AssetEvent) + Send + 'static,
    ) {
        self.shared.events.subscribe(kind, Box::new(callback));
    }

    /// Delivers finished loads to their callbacks, then notifications to
    /// their subscribers. Call once per tick from the consuming thread.
    pub fn run_callbacks(&self) {
        let callbacks = self.shared.callbacks.drain();
        let events = self.shared.events.dispatch();
        if callbacks + events > 0 {
            log::trace!("Delivered {callbacks} asset callbacks and {events} notifications");
        }
    }

    /// The number of cached resources.
    pub fn loaded_count(&self) -> usize {
        read(&self.shared.resources).len()
    }

    /// Stops background loading and frees every cached resource and archive.
    ///
    /// Queued background loads finish before this returns.
    pub fn destroy(&mut self) {
        drop(self.jobs.take());
        write(&self.shared.resources).clear();
        self.shared.archives.clear();
        self.shared.callbacks.clear();
        lock(&self.shared.reloading).clear();
        log::info!("Asset manager destroyed");
    }

    fn enqueue(&self, uuid: AssetUUID) {
        let Some(jobs) = &self.jobs else {
            log::warn!("Asset manager is shut down; not loading asset {uuid}");
            self.shared.callbacks.complete(uuid, None);
            return;
        };
        let shared = Arc::clone(&self.shared);
        jobs.submit(Box::new(move || {
            let resource = shared.load_immediate(uuid);
            shared.callbacks.complete(uuid, resource);
        }));
    }
}

impl ResourceResolver for AssetManager {
    fn find_resource(&self, uuid: AssetUUID) -> Option<SharedResource> {
        AssetManager::find_resource(self, uuid)
    }

    fn get_or_load(&self, uuid: AssetUUID) -> Option<SharedResource> {
        self.get_or_load_asset(uuid)
    }
}

impl SharedState {
    fn registry(&self) -> RwLockReadGuard<'_, TypeRegistry> {
        read(&self.registry)
    }

    fn find_resource(&self, uuid: AssetUUID) -> Option<SharedResource> {
        read(&self.resources).get(uuid)
    }

    fn store(&self, uuid: AssetUUID, resource: SharedResource) -> Result<(), AssetError> {
        write(&self.resources).add(uuid, resource)
    }

    fn load_immediate(&self, uuid: AssetUUID) -> Option<SharedResource> {
        let _lock = self.loading.lock(uuid);
        if let Some(resource) = self.find_resource(uuid) {
            // A load finished after the reload request unloaded the asset.
            if lock(&self.reloading).remove(&uuid) {
                self.events
                    .publish(AssetEventKind::Reloaded, uuid, Some(resource.clone()));
            }
            return Some(resource);
        }

        match self.try_load(uuid) {
            Ok(resource) => {
                let kind = if lock(&self.reloading).remove(&uuid) {
                    AssetEventKind::Reloaded
                } else {
                    AssetEventKind::Loaded
                };
                self.events.publish(kind, uuid, Some(resource.clone()));
                Some(resource)
            }
            Err(e) => {
                lock(&self.reloading).remove(&uuid);
                log::error!("Failed to load asset {uuid}: {e}");
                None
            }
        }
    }

    fn try_load(&self, uuid: AssetUUID) -> Result<SharedResource, AssetError> {
        let meta = self
            .database
            .resource_meta(uuid)
            .ok_or(AssetError::NotFound(uuid))?;
        let location = self
            .database
            .asset_location(uuid)
            .ok_or(AssetError::NotFound(uuid))?;

        let name = if meta.name.is_empty() {
            display_name(&location)
        } else {
            meta.name.clone()
        };

        if location.is_subresource() {
            return self.load_subresource(uuid, name, &location);
        }

        let path = self.config.resolve(&location.path);
        let extension = location.extension().unwrap_or_else(|| meta.extension.clone());

        if self.config.is_archive_extension(&extension) {
            match self.load_from_archive(uuid, &path) {
                Ok(Some(resource)) => return Ok(resource),
                Ok(None) => log::warn!(
                    "Archive '{}' does not contain asset {uuid}",
                    path.display()
                ),
                Err(e) => log::error!("Failed to load archive '{}': {e:#}", path.display()),
            }
        }

        self.load_legacy(uuid, name, meta.type_hash, &extension, &path)
    }

    fn load_subresource(
        &self,
        uuid: AssetUUID,
        name: String,
        location: &AssetLocation,
    ) -> Result<SharedResource, AssetError> {
        let subresource = location.subresource_path.clone().unwrap_or_default();
        let root_path = location.path.display().to_string();
        let missing = || AssetError::SubresourceMissing {
            path: root_path.clone(),
            subresource: subresource.clone(),
        };

        let root_id = self
            .database
            .uuid_for_path(&location.path)
            .ok_or_else(|| AssetError::PathNotFound(root_path.clone()))?;
        if root_id == uuid {
            return Err(missing());
        }

        let root = self
            .load_immediate(root_id)
            .ok_or_else(|| AssetError::LoadFailed {
                uuid: root_id,
                path: root_path.clone(),
                message: "the root resource could not be loaded".to_string(),
            })?;

        let mut resource = root.subresource(&subresource).ok_or_else(missing)?;
        resource.identity_mut().assign(Some(uuid), name);
        let resource = SharedResource::from(resource);
        self.store(uuid, resource.clone())?;
        Ok(resource)
    }

    /// Adds every archive entry that is not cached yet, then looks `uuid` up.
    fn load_from_archive(&self, uuid: AssetUUID, path: &Path) -> anyhow::Result<Option<SharedResource>> {
        let archive = {
            let registry = self.registry();
            self.archives.get_or_load(path, &registry)?
        };

        let mut resources = write(&self.resources);
        for entry in archive.iter() {
            let Some(entry_id) = entry.uuid() else {
                continue;
            };
            if entry_id == uuid || !resources.contains(entry_id) {
                resources.add(entry_id, entry.clone())?;
            }
        }
        Ok(resources.get(uuid))
    }

    fn load_legacy(
        &self,
        uuid: AssetUUID,
        name: String,
        type_hash: TypeHash,
        extension: &str,
        path: &Path,
    ) -> Result<SharedResource, AssetError> {
        log::warn!("Using legacy loading for file: {}", path.display());
        if let Err(source) = std::fs::metadata(path) {
            return Err(AssetError::Io {
                path: path.to_path_buf(),
                source,
            });
        }

        let mut resource = {
            let loaders = read(&self.loaders);
            let loader = match loaders.get(type_hash) {
                Some(loader) => loader,
                None => {
                    let by_extension = self
                        .registry()
                        .by_extension(extension)
                        .map(|resource_type| resource_type.hash());
                    match by_extension.and_then(|hash| loaders.get(hash)) {
                        Some(loader) => loader,
                        None => {
                            log::error!(
                                "No loader module registered for type {type_hash} (extension '{extension}')"
                            );
                            return Err(AssetError::ExtensionUnsupported(extension.to_string()));
                        }
                    }
                }
            };
            loader
                .load_path(path)
                .map_err(|e| AssetError::LoadFailed {
                    uuid,
                    path: path.display().to_string(),
                    message: format!("{e:#}"),
                })?
        };

        resource.identity_mut().assign(Some(uuid), name);
        let resource = SharedResource::from(resource);
        self.store(uuid, resource.clone())?;
        Ok(resource)
    }
}

fn display_name(location: &AssetLocation) -> String {
    let path = location.path.display();
    match location.subresource_path.as_deref() {
        Some(subresource) if !subresource.is_empty() => format!("{path}/{subresource}"),
        _ => path.to_string(),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
