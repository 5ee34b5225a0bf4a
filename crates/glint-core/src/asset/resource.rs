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

use super::{AssetUUID, TypeHash};
use crate::stream::{BinaryReader, BinaryWriter, StreamError};
use std::any::{Any, TypeId};
use std::sync::Arc;

/// Helper trait to allow downcasting `dyn Resource` trait objects to their concrete types.
pub trait AsAny: Any + Send + Sync {
    /// Returns a reference to the inner value as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Converts a shared pointer into a shared `Any` pointer, keeping the allocation.
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// The identity every loaded resource carries: its identifier and display name.
///
/// Loaders produce resources without an identity; the asset manager stamps the
/// requested identifier and the resolved display name before registering them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceIdentity {
    uuid: Option<AssetUUID>,
    name: String,
}

impl ResourceIdentity {
    /// Creates an identity from an identifier and a display name.
    pub fn new(uuid: Option<AssetUUID>, name: impl Into<String>) -> Self {
        Self {
            uuid,
            name: name.into(),
        }
    }

    /// The identifier, if one has been assigned.
    pub fn uuid(&self) -> Option<AssetUUID> {
        self.uuid
    }

    /// The display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replaces both the identifier and the display name.
    pub fn assign(&mut self, uuid: Option<AssetUUID>, name: impl Into<String>) {
        self.uuid = uuid;
        self.name = name.into();
    }

    /// Replaces only the identifier.
    pub fn set_uuid(&mut self, uuid: Option<AssetUUID>) {
        self.uuid = uuid;
    }
}

/// The base contract for any loaded asset (texture, mesh, material, ...).
///
/// Resources are shared between the resource store and its consumers as
/// [`SharedResource`]; all post-load mutation therefore goes through interior
/// locks owned by the concrete type.
pub trait Resource: AsAny {
    /// The resource's identifier and display name.
    fn identity(&self) -> &ResourceIdentity;

    /// Mutable access to the identity, used when stamping freshly loaded resources.
    fn identity_mut(&mut self) -> &mut ResourceIdentity;

    /// The stable hash of this resource's type.
    fn type_hash(&self) -> TypeHash;

    /// Extracts a named embedded resource (e.g. one mesh of a multi-mesh file).
    ///
    /// The returned resource has no identity yet; the caller assigns one.
    fn subresource(&self, _path: &str) -> Option<Box<dyn Resource>> {
        None
    }

    /// Writes the resource payload (not its identity) to a binary stream.
    fn serialize(&self, _writer: &mut BinaryWriter<'_>) -> Result<(), StreamError> {
        Err(StreamError::Unsupported(std::any::type_name::<Self>()))
    }

    /// Reads the resource payload written by [`Resource::serialize`].
    fn deserialize(&mut self, _reader: &mut BinaryReader<'_>) -> Result<(), StreamError> {
        Err(StreamError::Unsupported(std::any::type_name::<Self>()))
    }
}

/// A resource type that can be registered in the [`TypeRegistry`](super::TypeRegistry).
///
/// `TYPE_NAME` is the persistent name the type hash is derived from; renaming
/// it invalidates every asset database and archive that refers to the type.
pub trait TypedResource: Resource + Default {
    /// The stable, persisted name of the resource type.
    const TYPE_NAME: &'static str;
}

/// A loaded resource shared between the store and its consumers.
pub type SharedResource = Arc<dyn Resource>;

impl dyn Resource {
    /// The identifier of this resource, if assigned.
    pub fn uuid(&self) -> Option<AssetUUID> {
        self.identity().uuid()
    }

    /// The display name of this resource.
    pub fn name(&self) -> &str {
        self.identity().name()
    }

    /// The `TypeId` of the concrete resource type behind the trait object.
    pub fn concrete_type_id(&self) -> TypeId {
        self.as_any().type_id()
    }

    /// Returns `true` if the concrete type is `T`.
    pub fn is<T: Resource>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Downcasts to a concrete resource reference.
    pub fn downcast_ref<T: Resource>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Downcasts a shared resource to its concrete type, keeping the same allocation.
pub fn downcast_resource<T: Resource>(resource: SharedResource) -> Option<Arc<T>> {
    resource.into_any_arc().downcast::<T>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Dummy {
        identity: ResourceIdentity,
    }

    impl Resource for Dummy {
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

    impl TypedResource for Dummy {
        const TYPE_NAME: &'static str = "Dummy";
    }

    #[test]
    fn test_downcast_keeps_allocation() {
        let shared: SharedResource = Arc::new(Dummy::default());
        let typed = downcast_resource::<Dummy>(shared.clone()).unwrap();
        assert!(std::ptr::eq(
            Arc::as_ptr(&typed) as *const u8,
            Arc::as_ptr(&shared) as *const u8
        ));
    }

    #[test]
    fn test_concrete_type_id() {
        let shared: SharedResource = Arc::new(Dummy::default());
        assert_eq!(shared.concrete_type_id(), TypeId::of::<Dummy>());
        assert!(shared.is::<Dummy>());
    }

    #[test]
    fn test_default_serialization_is_unsupported() {
        let dummy = Dummy::default();
        let mut bytes = Vec::new();
        let mut writer = BinaryWriter::new(&mut bytes);
        assert!(matches!(
            dummy.serialize(&mut writer),
            Err(StreamError::Unsupported(_))
        ));
    }

    #[test]
    fn test_identity_assignment() {
        let mut dummy = Dummy::default();
        let uuid = AssetUUID::new();
        dummy.identity_mut().assign(Some(uuid), "dummy");
        assert_eq!(dummy.identity().uuid(), Some(uuid));
        assert_eq!(dummy.identity().name(), "dummy");
    }
}
