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

use glint_core::asset::{AssetHandle, AssetUUID, SharedResource, TypeHash, TypedResource};
use std::any::Any;
use std::collections::HashMap;

/// Owns every loaded resource of one type.
///
/// Resources live in a dense list with a parallel identifier list; a hash index
/// maps identifiers to positions. Identifiers are unique within a manager.
pub struct ResourceManager<T: TypedResource> {
    resources: Vec<AssetHandle<T>>,
    ids: Vec<AssetUUID>,
    index: HashMap<AssetUUID, usize>,
}

impl<T: TypedResource> Default for ResourceManager<T> {
    fn default() -> Self {
        Self {
            resources: Vec::new(),
            ids: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: TypedResource> ResourceManager<T> {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a resource under `uuid`, replacing any resource already stored
    /// under the same identifier.
    pub fn add(&mut self, uuid: AssetUUID, handle: AssetHandle<T>) {
        if let Some(&position) = self.index.get(&uuid) {
            self.resources[position] = handle;
            return;
        }
        self.index.insert(uuid, self.resources.len());
        self.resources.push(handle);
        self.ids.push(uuid);
    }

    /// The position of `uuid` in the dense list.
    pub fn index(&self, uuid: AssetUUID) -> Option<usize> {
        self.index.get(&uuid).copied()
    }

    /// Returns `true` if a resource is stored under `uuid`.
    pub fn is_loaded(&self, uuid: AssetUUID) -> bool {
        self.index(uuid).is_some()
    }

    /// The resource stored under `uuid`.
    pub fn get(&self, uuid: AssetUUID) -> Option<&AssetHandle<T>> {
        self.index(uuid).map(|position| &self.resources[position])
    }

    /// Removes and returns the resource stored under `uuid`.
    ///
    /// The last resource takes the freed position.
    pub fn remove(&mut self, uuid: AssetUUID) -> Option<AssetHandle<T>> {
        let position = self.index.remove(&uuid)?;
        let removed = self.resources.swap_remove(position);
        self.ids.swap_remove(position);
        if let Some(&moved) = self.ids.get(position) {
            self.index.insert(moved, position);
        }
        Some(removed)
    }

    /// The stored identifiers, in storage order.
    pub fn ids(&self) -> &[AssetUUID] {
        &self.ids
    }

    /// Iterates over the stored resources, in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (AssetUUID, &AssetHandle<T>)> {
        self.ids.iter().copied().zip(self.resources.iter())
    }

    /// The number of stored resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Drops every stored resource.
    pub fn clear(&mut self) {
        self.resources.clear();
        self.ids.clear();
        self.index.clear();
    }
}

/// Type-erased access to a [`ResourceManager`].
pub trait AnyResourceManager: Send + Sync {
    /// The hash of the stored resource type.
    fn type_hash(&self) -> TypeHash;

    /// Stores a shared resource; hands it back if it is not of the stored type.
    fn add_erased(&mut self, uuid: AssetUUID, resource: SharedResource)
        -> Result<(), SharedResource>;

    /// The resource stored under `uuid`.
    fn get_erased(&self, uuid: AssetUUID) -> Option<SharedResource>;

    /// Removes the resource stored under `uuid`.
    fn remove_erased(&mut self, uuid: AssetUUID) -> Option<SharedResource>;

    /// Returns `true` if a resource is stored under `uuid`.
    fn is_loaded(&self, uuid: AssetUUID) -> bool;

    /// The number of stored resources.
    fn len(&self) -> usize;

    /// Drops every stored resource.
    fn clear(&mut self);

    /// Upcasts to `Any` for typed access.
    fn as_any(&self) -> &dyn Any;

    /// Upcasts to `Any` for typed mutable access.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: TypedResource> AnyResourceManager for ResourceManager<T> {
    fn type_hash(&self) -> TypeHash {
        TypeHash::of::<T>()
    }

    fn add_erased(
        &mut self,
        uuid: AssetUUID,
        resource: SharedResource,
    ) -> Result<(), SharedResource> {
        let Some(handle) = AssetHandle::<T>::from_shared(resource.clone()) else {
            return Err(resource);
        };
        self.add(uuid, handle);
        Ok(())
    }

    fn get_erased(&self, uuid: AssetUUID) -> Option<SharedResource> {
        self.get(uuid).map(|handle| handle.clone().into_shared())
    }

    fn remove_erased(&mut self, uuid: AssetUUID) -> Option<SharedResource> {
        self.remove(uuid).map(AssetHandle::into_shared)
    }

    fn is_loaded(&self, uuid: AssetUUID) -> bool {
        ResourceManager::is_loaded(self, uuid)
    }

    fn len(&self) -> usize {
        ResourceManager::len(self)
    }

    fn clear(&mut self) {
        ResourceManager::clear(self);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
