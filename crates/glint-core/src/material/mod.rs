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

//! The material property model.
//!
//! A [`BaseMaterial`] owns a property schema, a packed byte buffer holding the
//! value properties back to back, and a table of resource references. A
//! [`MaterialInstance`] points at a base material by identifier and overlays
//! sparse overrides on top of it: each property is either overridden, in which
//! case the instance's own storage is read, or delegated to the base.
//!
//! The base of an instance is resolved through a [`ResourceResolver`] on every
//! access and never cached, so hot-reloading a base material is picked up by
//! every instance immediately.

mod base;
mod instance;
mod property;

pub use base::{BaseMaterial, MaterialLayout};
pub use instance::MaterialInstance;
pub use property::PropertyInfo;

use crate::asset::{AssetUUID, ResourceResolver, SharedResource};

/// File extension of serialized base materials.
pub const BASE_MATERIAL_EXTENSION: &str = "gmat";
/// File extension of serialized material instances.
pub const MATERIAL_INSTANCE_EXTENSION: &str = "gminst";

/// A resource property resolved for drawing.
#[derive(Clone)]
pub struct ResourceBinding {
    /// The shader-facing name of the property.
    pub shader_name: String,
    /// The bound resource.
    pub resource: SharedResource,
}

impl std::fmt::Debug for ResourceBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceBinding")
            .field("shader_name", &self.shader_name)
            .field("resource", &self.resource.uuid())
            .finish()
    }
}

/// Read access shared by base materials and material instances.
///
/// Every method takes the resolver used to reach a base material; base
/// materials ignore it.
pub trait MaterialProperties: Send + Sync {
    /// The pipeline (shader program) the material renders with.
    fn pipeline_id(&self, resolver: &dyn ResourceResolver) -> Option<AssetUUID>;

    /// The number of properties in the schema.
    fn property_info_count(&self, resolver: &dyn ResourceResolver) -> usize;

    /// The property at `index`.
    fn property_info_at(
        &self,
        resolver: &dyn ResourceResolver,
        index: usize,
    ) -> Option<PropertyInfo>;

    /// The index of the property named `name`.
    fn property_index(&self, resolver: &dyn ResourceResolver, name: &str) -> Option<usize>;

    /// The size of the packed buffer.
    fn current_buffer_offset(&self, resolver: &dyn ResourceResolver) -> usize;

    /// The number of resource properties.
    fn resource_property_count(&self, resolver: &dyn ResourceResolver) -> usize;

    /// The property describing the resource slot `resource_index`.
    fn resource_property_info(
        &self,
        resolver: &dyn ResourceResolver,
        resource_index: usize,
    ) -> Option<PropertyInfo> {
        self.property_index_from_resource_index(resolver, resource_index)
            .and_then(|index| self.property_info_at(resolver, index))
    }

    /// Maps a resource slot to the index of its property.
    fn property_index_from_resource_index(
        &self,
        resolver: &dyn ResourceResolver,
        resource_index: usize,
    ) -> Option<usize>;

    /// The asset referenced by resource slot `resource_index`.
    fn resource_id_at(
        &self,
        resolver: &dyn ResourceResolver,
        resource_index: usize,
    ) -> Option<AssetUUID>;

    /// The effective packed buffer.
    fn buffer_reference(&self, resolver: &dyn ResourceResolver) -> Vec<u8>;

    /// Resolves every resource property for drawing.
    ///
    /// Uses the non-blocking [`ResourceResolver::get_or_load`]: references
    /// that are still loading are skipped and show up on a later call.
    fn bind_resources(&self, resolver: &dyn ResourceResolver) -> Vec<ResourceBinding> {
        (0..self.resource_property_count(resolver))
            .filter_map(|slot| {
                let info = self.resource_property_info(resolver, slot)?;
                let uuid = self.resource_id_at(resolver, slot)?;
                let resource = resolver.get_or_load(uuid)?;
                Some(ResourceBinding {
                    shader_name: info.shader_name().to_string(),
                    resource,
                })
            })
            .collect()
    }
}
