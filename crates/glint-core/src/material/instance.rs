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

use super::{BaseMaterial, MaterialLayout, MaterialProperties, PropertyInfo};
use crate::asset::{
    downcast_resource, AssetUUID, Resource, ResourceIdentity, ResourceResolver, SharedResource,
    TypeHash, TypedResource,
};
use crate::stream::{BinaryReader, BinaryWriter, StreamError};
use bytemuck::Pod;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct InstanceState {
    base: Option<AssetUUID>,
    overrides: Vec<bool>,
    buffer: Vec<u8>,
    resources: Vec<Option<AssetUUID>>,
}

impl InstanceState {
    /// Grows the overlay storage to the base's current schema. Never shrinks,
    /// so existing overrides keep their indices.
    fn grow_to(&mut self, layout: &MaterialLayout) {
        if self.overrides.len() < layout.property_count() {
            self.overrides.resize(layout.property_count(), false);
        }
        if self.buffer.len() < layout.buffer().len() {
            self.buffer.resize(layout.buffer().len(), 0);
        }
        if self.resources.len() < layout.resource_count() {
            self.resources.resize(layout.resource_count(), None);
        }
    }

    fn is_overridden(&self, index: usize) -> bool {
        self.overrides.get(index).copied().unwrap_or(false)
    }

    fn value_bytes<'a>(&'a self, layout: &'a MaterialLayout, index: usize) -> Option<&'a [u8]> {
        if !self.is_overridden(index) {
            return layout.value_bytes(index);
        }
        let range = layout.property_info(index)?.byte_range()?;
        self.buffer.get(range)
    }

    fn resource_id(&self, layout: &MaterialLayout, slot: usize) -> Option<AssetUUID> {
        let index = layout.property_index_from_resource_index(slot)?;
        if self.is_overridden(index) {
            self.resources.get(slot).copied().flatten()
        } else {
            layout.resource_id(slot)
        }
    }
}

/// A material that overlays sparse overrides on a base material.
///
/// The instance stores the base by identifier. Every accessor resolves the base
/// through the given [`ResourceResolver`] (cache only) and resizes the overlay
/// storage to the base's schema before touching it, so a base that gained
/// properties after the instance was created is handled transparently. When
/// the base is not loaded, accessors report absence.
#[derive(Debug, Default)]
pub struct MaterialInstance {
    identity: ResourceIdentity,
    state: Mutex<InstanceState>,
}

impl MaterialInstance {
    /// Creates an instance without a base material.
    pub fn new(uuid: Option<AssetUUID>, name: impl Into<String>) -> Self {
        Self {
            identity: ResourceIdentity::new(uuid, name),
            state: Mutex::default(),
        }
    }

    /// Creates an instance of `base` with no overrides.
    pub fn of(base: &BaseMaterial, uuid: Option<AssetUUID>, name: impl Into<String>) -> Self {
        let mut state = InstanceState {
            base: base.identity().uuid(),
            ..InstanceState::default()
        };
        state.grow_to(&base.layout());
        Self {
            identity: ResourceIdentity::new(uuid, name),
            state: Mutex::new(state),
        }
    }

    fn state(&self) -> MutexGuard<'_, InstanceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The identifier of the base material.
    pub fn base_material_id(&self) -> Option<AssetUUID> {
        self.state().base
    }

    /// Resolves the base material from the cache.
    pub fn base_material(&self, resolver: &dyn ResourceResolver) -> Option<Arc<BaseMaterial>> {
        let resource = resolver.find_resource(self.base_material_id()?)?;
        downcast_resource::<BaseMaterial>(resource)
    }

    /// Runs `f` with the base layout and the overlay grown to match it.
    ///
    /// Lock order is base layout, then instance state.
    fn with_base<R>(
        &self,
        resolver: &dyn ResourceResolver,
        f: impl FnOnce(&MaterialLayout, &mut InstanceState) -> R,
    ) -> Option<R> {
        let base = self.base_material(resolver)?;
        let layout = base.layout();
        let mut state = self.state();
        state.grow_to(&layout);
        Some(f(&*layout, &mut *state))
    }

    /// Replaces the base material; `None` drops every override.
    pub fn set_base_material(&self, base: Option<AssetUUID>, resolver: &dyn ResourceResolver) {
        {
            let mut state = self.state();
            if state.base != base {
                *state = InstanceState {
                    base,
                    ..InstanceState::default()
                };
            }
        }
        if base.is_some() {
            self.reload_properties(resolver);
        }
    }

    /// Grows the overlay storage to the base's current schema.
    pub fn reload_properties(&self, resolver: &dyn ResourceResolver) {
        self.with_base(resolver, |_, _| ());
    }

    /// Returns `true` if property `index` reads from this instance.
    ///
    /// Indices beyond the overlay storage are not overridden.
    pub fn is_property_overridden(&self, index: usize) -> bool {
        self.state().is_overridden(index)
    }

    /// Marks property `index` as overridden.
    pub fn enable_property(&self, index: usize, resolver: &dyn ResourceResolver) -> bool {
        self.set_override(index, true, resolver)
    }

    /// Makes property `index` delegate to the base again.
    pub fn disable_property(&self, index: usize, resolver: &dyn ResourceResolver) -> bool {
        self.set_override(index, false, resolver)
    }

    fn set_override(&self, index: usize, enabled: bool, resolver: &dyn ResourceResolver) -> bool {
        self.with_base(resolver, |layout, state| {
            if index >= layout.property_count() {
                return false;
            }
            state.overrides[index] = enabled;
            true
        })
        .unwrap_or(false)
    }

    /// Writes the raw bytes of value property `index` and overrides it.
    pub fn set_property_bytes(
        &self,
        index: usize,
        bytes: &[u8],
        resolver: &dyn ResourceResolver,
    ) -> bool {
        self.with_base(resolver, |layout, state| {
            let Some(range) = layout.property_info(index).and_then(PropertyInfo::byte_range)
            else {
                return false;
            };
            if range.len() != bytes.len() {
                return false;
            }
            let Some(target) = state.buffer.get_mut(range) else {
                return false;
            };
            target.copy_from_slice(bytes);
            state.overrides[index] = true;
            true
        })
        .unwrap_or(false)
    }

    /// The effective bytes of value property `index`.
    pub fn property_bytes(&self, index: usize, resolver: &dyn ResourceResolver) -> Option<Vec<u8>> {
        self.with_base(resolver, |layout, state| {
            state.value_bytes(layout, index).map(<[u8]>::to_vec)
        })
        .flatten()
    }

    /// Writes a typed value to the property named `name` and overrides it.
    pub fn set_property<T: Pod>(
        &self,
        name: &str,
        value: T,
        resolver: &dyn ResourceResolver,
    ) -> bool {
        self.with_base(resolver, |layout, state| {
            let Some(index) = layout.property_index(name) else {
                return false;
            };
            let Some(range) = layout.property_info(index).and_then(PropertyInfo::byte_range)
            else {
                return false;
            };
            if range.len() != std::mem::size_of::<T>() {
                return false;
            }
            let Some(target) = state.buffer.get_mut(range) else {
                return false;
            };
            target.copy_from_slice(bytemuck::bytes_of(&value));
            state.overrides[index] = true;
            true
        })
        .unwrap_or(false)
    }

    /// Reads the effective typed value of the property named `name`.
    pub fn get_property<T: Pod>(&self, name: &str, resolver: &dyn ResourceResolver) -> Option<T> {
        self.with_base(resolver, |layout, state| {
            let bytes = state.value_bytes(layout, layout.property_index(name)?)?;
            (bytes.len() == std::mem::size_of::<T>()).then(|| bytemuck::pod_read_unaligned(bytes))
        })
        .flatten()
    }

    /// Overrides the resource property named `name` with `texture`.
    pub fn set_texture(
        &self,
        name: &str,
        texture: Option<AssetUUID>,
        resolver: &dyn ResourceResolver,
    ) -> bool {
        self.with_base(resolver, |layout, state| {
            let Some(index) = layout.property_index(name) else {
                return false;
            };
            let Some(info) = layout.property_info(index).filter(|info| info.is_resource()) else {
                return false;
            };
            state.resources[info.offset()] = texture;
            state.overrides[index] = true;
            true
        })
        .unwrap_or(false)
    }

    /// The effective reference of the resource property named `name`.
    pub fn texture_id(&self, name: &str, resolver: &dyn ResourceResolver) -> Option<AssetUUID> {
        self.with_base(resolver, |layout, state| {
            let info = layout.property_info(layout.property_index(name)?)?;
            if !info.is_resource() {
                return None;
            }
            state.resource_id(layout, info.offset())
        })
        .flatten()
    }

    /// Resolves the resource property named `name`, requesting a load if needed.
    pub fn get_texture(
        &self,
        name: &str,
        resolver: &dyn ResourceResolver,
    ) -> Option<SharedResource> {
        resolver.get_or_load(self.texture_id(name, resolver)?)
    }

    /// Copies the override mask.
    pub fn copy_override_states(&self) -> Vec<bool> {
        self.state().overrides.clone()
    }

    /// Replaces the override mask, e.g. to undo an edit.
    pub fn paste_override_states(&self, states: &[bool]) {
        let mut state = self.state();
        state.overrides.clear();
        state.overrides.extend_from_slice(states);
    }
}

impl Resource for MaterialInstance {
    fn identity(&self) -> &ResourceIdentity {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut ResourceIdentity {
        &mut self.identity
    }

    fn type_hash(&self) -> TypeHash {
        TypeHash::of::<Self>()
    }

    fn serialize(&self, writer: &mut BinaryWriter<'_>) -> Result<(), StreamError> {
        let state = self.state();
        writer.write_uuid(state.base)?;

        writer.write_usize(state.overrides.len())?;
        for &overridden in &state.overrides {
            writer.write_bool(overridden)?;
        }

        writer.write_bytes(&state.buffer)?;

        writer.write_usize(state.resources.len())?;
        for &resource in &state.resources {
            writer.write_uuid(resource)?;
        }
        Ok(())
    }

    fn deserialize(&mut self, reader: &mut BinaryReader<'_>) -> Result<(), StreamError> {
        let base = reader.read_uuid()?;

        let override_count = reader.read_usize()?;
        let mut overrides = Vec::new();
        for _ in 0..override_count {
            overrides.push(reader.read_bool()?);
        }

        let buffer = reader.read_bytes()?;

        let resource_count = reader.read_usize()?;
        let mut resources = Vec::new();
        for _ in 0..resource_count {
            resources.push(reader.read_uuid()?);
        }

        *self.state.get_mut().unwrap_or_else(PoisonError::into_inner) = InstanceState {
            base,
            overrides,
            buffer,
            resources,
        };
        Ok(())
    }
}

impl TypedResource for MaterialInstance {
    const TYPE_NAME: &'static str = "MaterialInstanceData";
}

impl MaterialProperties for MaterialInstance {
    fn pipeline_id(&self, resolver: &dyn ResourceResolver) -> Option<AssetUUID> {
        self.base_material(resolver)?.pipeline()
    }

    fn property_info_count(&self, resolver: &dyn ResourceResolver) -> usize {
        self.base_material(resolver)
            .map_or(0, |base| base.layout().property_count())
    }

    fn property_info_at(
        &self,
        resolver: &dyn ResourceResolver,
        index: usize,
    ) -> Option<PropertyInfo> {
        self.base_material(resolver)?
            .layout()
            .property_info(index)
            .cloned()
    }

    fn property_index(&self, resolver: &dyn ResourceResolver, name: &str) -> Option<usize> {
        self.base_material(resolver)?.layout().property_index(name)
    }

    fn current_buffer_offset(&self, resolver: &dyn ResourceResolver) -> usize {
        self.base_material(resolver)
            .map_or(0, |base| base.layout().current_offset())
    }

    fn resource_property_count(&self, resolver: &dyn ResourceResolver) -> usize {
        self.base_material(resolver)
            .map_or(0, |base| base.layout().resource_property_count())
    }

    fn property_index_from_resource_index(
        &self,
        resolver: &dyn ResourceResolver,
        resource_index: usize,
    ) -> Option<usize> {
        self.base_material(resolver)?
            .layout()
            .property_index_from_resource_index(resource_index)
    }

    fn resource_id_at(
        &self,
        resolver: &dyn ResourceResolver,
        resource_index: usize,
    ) -> Option<AssetUUID> {
        self.with_base(resolver, |layout, state| {
            state.resource_id(layout, resource_index)
        })
        .flatten()
    }

    /// Rebuilds the effective buffer: base bytes for every property that is
    /// not overridden, the instance's own bytes for the rest.
    fn buffer_reference(&self, resolver: &dyn ResourceResolver) -> Vec<u8> {
        self.with_base(resolver, |layout, state| {
            let base_buffer = layout.buffer();
            for (index, info) in layout.properties().iter().enumerate() {
                let Some(range) = info.byte_range() else {
                    continue;
                };
                if state.overrides.get(index).copied().unwrap_or(false) {
                    continue;
                }
                if let (Some(target), Some(source)) =
                    (state.buffer.get_mut(range.clone()), base_buffer.get(range))
                {
                    target.copy_from_slice(source);
                }
            }
            let len = base_buffer.len().min(state.buffer.len());
            state.buffer[..len].to_vec()
        })
        .unwrap_or_else(|| self.state().buffer.clone())
    }
}
