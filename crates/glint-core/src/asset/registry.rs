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

//! The resource type registry: a `TypeId -> vtable` table built at startup.

use super::{AssetUUID, Resource, TypeHash, TypedResource};
use std::any::TypeId;
use std::collections::HashMap;

/// Describes a plain value type (e.g. `float`, `vec4`) usable as a material property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicTypeData {
    /// The registered name of the type.
    pub name: String,
    /// The stable hash of `name`.
    pub hash: TypeHash,
    /// The size of one value in bytes.
    pub size: usize,
}

/// Constructors for one resource type.
#[derive(Debug, Clone, Copy)]
struct ResourceVTable {
    create_default: fn() -> Box<dyn Resource>,
    create_named: fn(AssetUUID, String) -> Box<dyn Resource>,
}

fn create_default<T: TypedResource>() -> Box<dyn Resource> {
    Box::new(T::default())
}

fn create_named<T: TypedResource>(uuid: AssetUUID, name: String) -> Box<dyn Resource> {
    let mut resource = T::default();
    resource.identity_mut().assign(Some(uuid), name);
    Box::new(resource)
}

/// A registered resource type.
#[derive(Debug, Clone)]
pub struct ResourceType {
    hash: TypeHash,
    name: &'static str,
    full_name: &'static str,
    type_id: TypeId,
    extensions: Vec<String>,
    vtable: ResourceVTable,
}

impl ResourceType {
    /// The stable hash of the type.
    pub fn hash(&self) -> TypeHash {
        self.hash
    }

    /// The persisted type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The fully qualified Rust type name, for diagnostics only.
    pub fn full_name(&self) -> &'static str {
        self.full_name
    }

    /// The `TypeId` of the concrete type.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The file extensions (lowercase, without the dot) mapped to this type.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Default-constructs an instance without an identity.
    pub fn create(&self) -> Box<dyn Resource> {
        (self.vtable.create_default)()
    }

    /// Constructs an instance carrying the given identifier and name.
    pub fn create_named(&self, uuid: AssetUUID, name: impl Into<String>) -> Box<dyn Resource> {
        (self.vtable.create_named)(uuid, name.into())
    }
}

/// Maps resource types to stable hashes, file extensions and constructors.
///
/// Registration is idempotent: registering the same type twice keeps the first
/// entry (extensions passed the second time are added to it). Lookups of
/// unregistered types or extensions return `None`, which callers treat as a
/// non-fatal "not found".
#[derive(Debug, Default)]
pub struct TypeRegistry {
    resource_types: Vec<ResourceType>,
    by_type_id: HashMap<TypeId, usize>,
    by_hash: HashMap<TypeHash, usize>,
    by_extension: HashMap<String, usize>,

    basic_types: Vec<BasicTypeData>,
    basic_by_hash: HashMap<TypeHash, usize>,
    basic_by_name: HashMap<String, usize>,
}

fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_ascii_lowercase()
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resource type and the file extensions that map to it.
    pub fn register_resource<T: TypedResource>(&mut self, extensions: &[&str]) -> TypeHash {
        let type_id = TypeId::of::<T>();
        let index = match self.by_type_id.get(&type_id) {
            Some(&index) => index,
            None => {
                let hash = TypeHash::of::<T>();
                if let Some(&existing) = self.by_hash.get(&hash) {
                    log::error!(
                        "Resource type '{}' collides with '{}' on hash {hash}; keeping the first",
                        T::TYPE_NAME,
                        self.resource_types[existing].name
                    );
                    return hash;
                }

                let index = self.resource_types.len();
                self.resource_types.push(ResourceType {
                    hash,
                    name: T::TYPE_NAME,
                    full_name: std::any::type_name::<T>(),
                    type_id,
                    extensions: Vec::new(),
                    vtable: ResourceVTable {
                        create_default: create_default::<T>,
                        create_named: create_named::<T>,
                    },
                });
                self.by_type_id.insert(type_id, index);
                self.by_hash.insert(hash, index);
                log::debug!("Registered resource type '{}' ({hash})", T::TYPE_NAME);
                index
            }
        };

        for extension in extensions.iter().map(|ext| normalize_extension(ext)) {
            if extension.is_empty() || self.by_extension.contains_key(&extension) {
                continue;
            }
            self.resource_types[index].extensions.push(extension.clone());
            self.by_extension.insert(extension, index);
        }

        self.resource_types[index].hash
    }

    /// Registers a plain value type under a stable name.
    pub fn register_basic_type<T: 'static>(&mut self, name: &str) -> TypeHash {
        let hash = TypeHash::of_name(name);
        if self.basic_by_hash.contains_key(&hash) {
            return hash;
        }
        let index = self.basic_types.len();
        self.basic_types.push(BasicTypeData {
            name: name.to_string(),
            hash,
            size: std::mem::size_of::<T>(),
        });
        self.basic_by_hash.insert(hash, index);
        self.basic_by_name.insert(name.to_string(), index);
        hash
    }

    /// Looks up a resource type by its Rust type.
    pub fn resource_type<T: TypedResource>(&self) -> Option<&ResourceType> {
        self.by_type_id(TypeId::of::<T>())
    }

    /// Looks up a resource type by `TypeId`.
    pub fn by_type_id(&self, type_id: TypeId) -> Option<&ResourceType> {
        self.by_type_id
            .get(&type_id)
            .map(|&index| &self.resource_types[index])
    }

    /// Looks up a resource type by its stable hash.
    pub fn by_hash(&self, hash: TypeHash) -> Option<&ResourceType> {
        self.by_hash
            .get(&hash)
            .map(|&index| &self.resource_types[index])
    }

    /// Looks up a resource type by file extension (with or without the dot).
    pub fn by_extension(&self, extension: &str) -> Option<&ResourceType> {
        self.by_extension
            .get(&normalize_extension(extension))
            .map(|&index| &self.resource_types[index])
    }

    /// Returns `true` if `hash` names a registered resource type.
    pub fn is_resource(&self, hash: TypeHash) -> bool {
        self.by_hash.contains_key(&hash)
    }

    /// Looks up a basic value type by hash.
    pub fn basic_type(&self, hash: TypeHash) -> Option<&BasicTypeData> {
        self.basic_by_hash
            .get(&hash)
            .map(|&index| &self.basic_types[index])
    }

    /// Looks up a basic value type by name.
    pub fn basic_type_by_name(&self, name: &str) -> Option<&BasicTypeData> {
        self.basic_by_name
            .get(name)
            .map(|&index| &self.basic_types[index])
    }

    /// Iterates over every registered resource type, in registration order.
    pub fn resource_types(&self) -> impl Iterator<Item = &ResourceType> {
        self.resource_types.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::ResourceIdentity;

    #[derive(Default)]
    struct Texture {
        identity: ResourceIdentity,
    }

    impl Resource for Texture {
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

    impl TypedResource for Texture {
        const TYPE_NAME: &'static str = "TextureData";
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = TypeRegistry::new();
        let first = registry.register_resource::<Texture>(&["png"]);
        let second = registry.register_resource::<Texture>(&[".JPG"]);
        assert_eq!(first, second);
        assert_eq!(registry.resource_types().count(), 1);

        let texture_type = registry.resource_type::<Texture>().unwrap();
        assert_eq!(texture_type.extensions(), &["png".to_string(), "jpg".to_string()]);
    }

    #[test]
    fn test_lookup_by_extension_and_hash() {
        let mut registry = TypeRegistry::new();
        let hash = registry.register_resource::<Texture>(&[".png"]);

        assert_eq!(registry.by_extension("PNG").unwrap().hash(), hash);
        assert_eq!(registry.by_hash(hash).unwrap().name(), "TextureData");
        assert!(registry.is_resource(hash));
        assert!(registry.by_extension("fbx").is_none());
        assert!(registry.by_hash(TypeHash::of_name("Unknown")).is_none());
    }

    #[test]
    fn test_create_named_stamps_identity() {
        let mut registry = TypeRegistry::new();
        registry.register_resource::<Texture>(&[]);
        let uuid = AssetUUID::new();

        let resource = registry
            .resource_type::<Texture>()
            .unwrap()
            .create_named(uuid, "brick");
        assert_eq!(resource.uuid(), Some(uuid));
        assert_eq!(resource.name(), "brick");
        assert!(resource.is::<Texture>());
    }

    #[test]
    fn test_basic_types() {
        let mut registry = TypeRegistry::new();
        let hash = registry.register_basic_type::<[f32; 4]>("vec4");
        let data = registry.basic_type(hash).unwrap();
        assert_eq!(data.size, 16);
        assert_eq!(registry.basic_type_by_name("vec4").unwrap().hash, hash);
        assert!(!registry.is_resource(hash));
    }
}
