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

use super::{downcast_resource, Resource, SharedResource};
use std::{ops::Deref, sync::Arc};

/// A thread-safe, reference-counted handle to a loaded resource of type `T`.
///
/// This acts as a smart pointer, providing shared ownership of a resource's data.
/// Cloning a handle is cheap, as it only increments the reference count
/// and does not duplicate the underlying resource.
///
/// Unloading an asset removes the store's handle; the data is deallocated once
/// the last outstanding handle is dropped.
#[derive(Debug)]
pub struct AssetHandle<T: Resource>(Arc<T>);

impl<T: Resource> AssetHandle<T> {
    /// Creates a new `AssetHandle` that takes ownership of the resource.
    pub fn new(resource: T) -> Self {
        Self(Arc::new(resource))
    }

    /// Wraps an existing shared pointer.
    pub fn from_arc(resource: Arc<T>) -> Self {
        Self(resource)
    }

    /// Attempts to view a type-erased shared resource as a `T` handle.
    pub fn from_shared(resource: SharedResource) -> Option<Self> {
        downcast_resource::<T>(resource).map(Self)
    }

    /// Converts the handle into a type-erased shared resource.
    pub fn into_shared(self) -> SharedResource {
        self.0
    }

    /// Returns `true` if both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Resource> Clone for AssetHandle<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Resource> Deref for AssetHandle<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
