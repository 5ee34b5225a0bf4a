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

use super::{AnyResourceManager, ResourceManager};
use glint_core::asset::{AssetHandle, AssetUUID, Resource, SharedResource, TypedResource};
use glint_core::AssetError;
use std::any::TypeId;
use std::collections::HashMap;

/// Owns one [`ResourceManager`] per registered resource type.
///
/// An identifier lives in at most one manager: adding a resource under an
/// identifier that is already stored evicts the previous entry first, even
/// when the types differ.
#[derive(Default)]
pub struct ResourceStore {
    managers: HashMap<TypeId, Box<dyn AnyResourceManager>>,
    owners: HashMap<AssetUUID, TypeId>,
}

impl ResourceStore {
    /// Creates a store with no registered types.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the manager for `T`. Returns `false` if it already existed.
    pub fn register<T: TypedResource>(&mut self) -> bool {
        let type_id = TypeId::of::<T>();
        if self.managers.contains_key(&type_id) {
            return false;
        }
        self.managers
            .insert(type_id, Box::new(ResourceManager::<T>::new()));
        log::debug!("Created resource storage for '{}'", T::TYPE_NAME);
        true
    }

    /// Returns `true` if a manager exists for the given type.
    pub fn is_registered(&self, type_id: TypeId) -> bool {
        self.managers.contains_key(&type_id)
    }

    /// Stores `resource` under `uuid` in the manager of its concrete type.
    ///
    /// # Errors
    /// Returns [`AssetError::UnregisteredType`] if no manager exists for the type.
    pub fn add(&mut self, uuid: AssetUUID, resource: SharedResource) -> Result<(), AssetError> {
        let type_id = resource.concrete_type_id();
        if !self.managers.contains_key(&type_id) {
            return Err(AssetError::UnregisteredType(resource.type_hash()));
        }

        if self.remove(uuid).is_some() {
            log::trace!("Replacing stored resource {uuid}");
        }

        let type_hash = resource.type_hash();
        let manager = self
            .managers
            .get_mut(&type_id)
            .ok_or(AssetError::UnregisteredType(type_hash))?;
        manager
            .add_erased(uuid, resource)
            .map_err(|_| AssetError::UnregisteredType(type_hash))?;
        self.owners.insert(uuid, type_id);
        Ok(())
    }

    /// The resource stored under `uuid`.
    pub fn get(&self, uuid: AssetUUID) -> Option<SharedResource> {
        let type_id = self.owners.get(&uuid)?;
        self.managers.get(type_id)?.get_erased(uuid)
    }

    /// The resource stored under `uuid`, if it is a `T`.
    pub fn get_typed<T: TypedResource>(&self, uuid: AssetUUID) -> Option<AssetHandle<T>> {
        self.manager::<T>()?.get(uuid).cloned()
    }

    /// Removes the resource stored under `uuid`.
    pub fn remove(&mut self, uuid: AssetUUID) -> Option<SharedResource> {
        let type_id = self.owners.remove(&uuid)?;
        self.managers.get_mut(&type_id)?.remove_erased(uuid)
    }

    /// Returns `true` if anything is stored under `uuid`.
    pub fn contains(&self, uuid: AssetUUID) -> bool {
        self.owners.contains_key(&uuid)
    }

    /// The number of stored resources across all types.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Typed access to the manager of `T`.
    pub fn manager<T: TypedResource>(&self) -> Option<&ResourceManager<T>> {
        self.managers
            .get(&TypeId::of::<T>())?
            .as_any()
            .downcast_ref::<ResourceManager<T>>()
    }

    /// Drops every stored resource; registered types are kept.
    pub fn clear(&mut self) {
        for manager in self.managers.values_mut() {
            manager.clear();
        }
        self.owners.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_core::asset::{ResourceIdentity, TypeHash};
    use std::sync::Arc;

    macro_rules! test_resource {
        ($name:ident, $type_name:literal) => {
            #[derive(Default)]
            struct $name {
                identity: ResourceIdentity,
            }

            impl Resource for $name {
                fn identity(&self) -> &ResourceIdentity {
                    &self.identity
                }

                fn identity_mut(&mut self) -> &mut ResourceIdentity {
                    &mut self.identity
                }

                fn type_hash(&self) -> TypeHash {
                    TypeHash::of::<Self>()
                }
            }

            impl TypedResource for $name {
                const TYPE_NAME: &'static str = $type_name;
            }
        };
    }

    test_resource!(Texture, "TextureData");
    test_resource!(Shader, "ShaderSourceData");

    fn uuid(raw: u64) -> AssetUUID {
        AssetUUID::from_raw(raw).unwrap()
    }

    #[test]
    fn test_add_unregistered_type_fails() {
        let mut store = ResourceStore::new();
        let result = store.add(uuid(1), Arc::new(Texture::default()));
        assert!(matches!(result, Err(AssetError::UnregisteredType(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_typed_and_erased_access() {
        let mut store = ResourceStore::new();
        assert!(store.register::<Texture>());
        assert!(!store.register::<Texture>());

        let texture: SharedResource = Arc::new(Texture::default());
        store.add(uuid(1), texture.clone()).unwrap();

        assert!(Arc::ptr_eq(&store.get(uuid(1)).unwrap(), &texture));
        assert!(store.get_typed::<Texture>(uuid(1)).is_some());
        assert!(store.get_typed::<Shader>(uuid(1)).is_none());
        assert_eq!(store.manager::<Texture>().unwrap().len(), 1);
    }

    #[test]
    fn test_add_evicts_previous_owner() {
        let mut store = ResourceStore::new();
        store.register::<Texture>();
        store.register::<Shader>();

        store.add(uuid(1), Arc::new(Texture::default())).unwrap();
        store.add(uuid(1), Arc::new(Shader::default())).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.manager::<Texture>().unwrap().len(), 0);
        assert!(store.get(uuid(1)).unwrap().is::<Shader>());
    }

    #[test]
    fn test_remove_and_clear() {
        let mut store = ResourceStore::new();
        store.register::<Texture>();
        store.add(uuid(1), Arc::new(Texture::default())).unwrap();
        store.add(uuid(2), Arc::new(Texture::default())).unwrap();

        assert!(store.remove(uuid(1)).is_some());
        assert!(store.remove(uuid(1)).is_none());
        assert!(!store.contains(uuid(1)));

        store.clear();
        assert!(store.is_empty());
        assert!(store.is_registered(TypeId::of::<Texture>()));
    }
}
