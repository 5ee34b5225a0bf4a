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

use super::{MaterialProperties, PropertyInfo};
use crate::asset::{
    AssetUUID, Resource, ResourceIdentity, ResourceResolver, SharedResource, TypeHash,
    TypedResource,
};
use crate::hash::stable_hash;
use crate::stream::{BinaryReader, BinaryWriter, StreamError};
use bytemuck::Pod;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// The schema and data of a base material.
///
/// Invariants: `buffer.len() == current_offset`; value properties occupy
/// consecutive, unpadded byte ranges in insertion order; resource properties
/// take no buffer bytes and their offset indexes `resources`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialLayout {
    pipeline: Option<AssetUUID>,
    infos: Vec<PropertyInfo>,
    buffer: Vec<u8>,
    resources: Vec<Option<AssetUUID>>,
    resource_property_indices: Vec<usize>,
    name_to_index: HashMap<u32, usize>,
    current_offset: usize,
}

impl MaterialLayout {
    /// The pipeline the material renders with.
    pub fn pipeline(&self) -> Option<AssetUUID> {
        self.pipeline
    }

    /// Every property, in schema order.
    pub fn properties(&self) -> &[PropertyInfo] {
        &self.infos
    }

    /// The number of properties.
    pub fn property_count(&self) -> usize {
        self.infos.len()
    }

    /// The property at `index`.
    pub fn property_info(&self, index: usize) -> Option<&PropertyInfo> {
        self.infos.get(index)
    }

    /// Looks a property up by display name.
    pub fn property_index(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(&stable_hash(name)).copied()
    }

    /// The packed value buffer.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// The next free byte offset, equal to the buffer size.
    pub fn current_offset(&self) -> usize {
        self.current_offset
    }

    /// The number of entries in the resource-reference table.
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// The asset referenced by resource slot `slot`.
    pub fn resource_id(&self, slot: usize) -> Option<AssetUUID> {
        self.resources.get(slot).copied().flatten()
    }

    /// The number of resource properties.
    pub fn resource_property_count(&self) -> usize {
        self.resource_property_indices.len()
    }

    /// Maps a resource slot to the index of its property.
    pub fn property_index_from_resource_index(&self, slot: usize) -> Option<usize> {
        self.resource_property_indices.get(slot).copied()
    }

    /// The bytes of value property `index`.
    pub fn value_bytes(&self, index: usize) -> Option<&[u8]> {
        let range = self.infos.get(index)?.byte_range()?;
        self.buffer.get(range)
    }

    fn push_info(&mut self, info: PropertyInfo) -> usize {
        let index = self.infos.len();
        self.name_to_index.insert(info.name_hash(), index);
        if info.is_resource() {
            self.resource_property_indices.push(index);
        } else if let Some(end) = info.end_offset() {
            self.current_offset = end;
            self.buffer.resize(end, 0);
        }
        self.infos.push(info);
        index
    }

    fn add_property(
        &mut self,
        display_name: &str,
        shader_name: &str,
        type_hash: TypeHash,
        size: usize,
        flags: u32,
    ) -> usize {
        if let Some(index) = self.property_index(display_name) {
            return index;
        }
        let info = PropertyInfo::value(
            display_name,
            shader_name,
            type_hash,
            size,
            self.current_offset,
            flags,
        );
        self.push_info(info)
    }

    fn add_resource_property(
        &mut self,
        display_name: &str,
        shader_name: &str,
        type_hash: TypeHash,
        resource: Option<AssetUUID>,
        flags: u32,
    ) -> usize {
        if let Some(index) = self.property_index(display_name) {
            let info = &self.infos[index];
            if info.is_resource() {
                if let Some(slot) = self.resources.get_mut(info.offset()) {
                    *slot = resource;
                }
            }
            return index;
        }
        let info = PropertyInfo::resource(
            display_name,
            shader_name,
            type_hash,
            self.resources.len(),
            flags,
        );
        self.resources.push(resource);
        self.push_info(info)
    }

    fn add_property_info(&mut self, other: &PropertyInfo) -> usize {
        if let Some(index) = self.property_index(other.display_name()) {
            return index;
        }
        let mut info = other.clone();
        if info.is_resource() {
            info.set_offset(self.resources.len());
            self.resources.push(None);
        } else {
            info.set_offset(self.current_offset);
        }
        self.push_info(info)
    }

    fn set_value_bytes(&mut self, index: usize, bytes: &[u8]) -> bool {
        let Some(range) = self.infos.get(index).and_then(PropertyInfo::byte_range) else {
            return false;
        };
        if range.len() != bytes.len() {
            return false;
        }
        match self.buffer.get_mut(range) {
            Some(target) => {
                target.copy_from_slice(bytes);
                true
            }
            None => false,
        }
    }

    fn set_resource(&mut self, index: usize, resource: Option<AssetUUID>) -> bool {
        let Some(info) = self.infos.get(index).filter(|info| info.is_resource()) else {
            return false;
        };
        match self.resources.get_mut(info.offset()) {
            Some(slot) => {
                *slot = resource;
                true
            }
            None => false,
        }
    }

    fn clear(&mut self) {
        let pipeline = self.pipeline;
        *self = Self {
            pipeline,
            ..Self::default()
        };
    }

    fn write(&self, writer: &mut BinaryWriter<'_>) -> Result<(), StreamError> {
        writer.write_uuid(self.pipeline)?;

        writer.write_usize(self.infos.len())?;
        for info in &self.infos {
            info.write(writer)?;
        }

        writer.write_bytes(&self.buffer)?;

        writer.write_usize(self.resources.len())?;
        for resource in &self.resources {
            writer.write_uuid(*resource)?;
        }
        Ok(())
    }

    fn read(reader: &mut BinaryReader<'_>) -> Result<Self, StreamError> {
        let pipeline = reader.read_uuid()?;

        let count = reader.read_usize()?;
        let mut infos = Vec::new();
        for _ in 0..count {
            infos.push(PropertyInfo::read(reader)?);
        }

        let buffer = reader.read_bytes()?;

        let resource_count = reader.read_usize()?;
        let mut resources = Vec::new();
        for _ in 0..resource_count {
            resources.push(reader.read_uuid()?);
        }

        let mut layout = Self {
            pipeline,
            current_offset: buffer.len(),
            buffer,
            resources,
            ..Self::default()
        };
        for (index, info) in infos.iter().enumerate() {
            if info.is_resource() {
                if info.offset() >= layout.resources.len() {
                    return Err(StreamError::Invalid(format!(
                        "property '{}' references missing resource slot {}",
                        info.display_name(),
                        info.offset()
                    )));
                }
                layout.resource_property_indices.push(index);
            } else if info
                .end_offset()
                .is_none_or(|end| end > layout.buffer.len())
            {
                return Err(StreamError::Invalid(format!(
                    "property '{}' overruns the property buffer",
                    info.display_name()
                )));
            }
            layout.name_to_index.entry(info.name_hash()).or_insert(index);
        }
        layout.infos = infos;
        Ok(layout)
    }
}

/// A material that owns its property schema and values.
///
/// All mutators take `&self`; the layout sits behind a read-write lock so a
/// loaded, shared material can be edited while other threads read it.
#[derive(Debug, Default)]
pub struct BaseMaterial {
    identity: ResourceIdentity,
    layout: RwLock<MaterialLayout>,
}

impl BaseMaterial {
    /// Creates an empty material.
    pub fn new(uuid: Option<AssetUUID>, name: impl Into<String>) -> Self {
        Self {
            identity: ResourceIdentity::new(uuid, name),
            layout: RwLock::default(),
        }
    }

    /// Read access to the whole layout.
    pub fn layout(&self) -> RwLockReadGuard<'_, MaterialLayout> {
        self.layout.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn layout_mut(&self) -> RwLockWriteGuard<'_, MaterialLayout> {
        self.layout.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a value property at the next free offset and returns its index.
    ///
    /// A property with the same name is kept as is.
    pub fn add_property(
        &self,
        display_name: &str,
        shader_name: &str,
        type_hash: TypeHash,
        size: usize,
        flags: u32,
    ) -> usize {
        self.layout_mut()
            .add_property(display_name, shader_name, type_hash, size, flags)
    }

    /// Appends a resource property, or updates the reference of an existing one.
    pub fn add_resource_property(
        &self,
        display_name: &str,
        shader_name: &str,
        type_hash: TypeHash,
        resource: Option<AssetUUID>,
        flags: u32,
    ) -> usize {
        self.layout_mut()
            .add_resource_property(display_name, shader_name, type_hash, resource, flags)
    }

    /// Appends a copy of a property taken from another material.
    ///
    /// The copy gets a fresh offset (or resource slot) in this material.
    pub fn add_property_info(&self, info: &PropertyInfo) -> usize {
        self.layout_mut().add_property_info(info)
    }

    /// Removes every property and value, keeping the pipeline.
    pub fn clear_properties(&self) {
        self.layout_mut().clear();
    }

    /// Sets the pipeline.
    pub fn set_pipeline(&self, pipeline: Option<AssetUUID>) {
        self.layout_mut().pipeline = pipeline;
    }

    /// Returns the pipeline.
    pub fn pipeline(&self) -> Option<AssetUUID> {
        self.layout().pipeline
    }

    /// Writes the raw bytes of value property `index`; the size must match.
    pub fn set_property_bytes(&self, index: usize, bytes: &[u8]) -> bool {
        self.layout_mut().set_value_bytes(index, bytes)
    }

    /// Copies out the raw bytes of value property `index`.
    pub fn property_bytes(&self, index: usize) -> Option<Vec<u8>> {
        self.layout().value_bytes(index).map(<[u8]>::to_vec)
    }

    /// Writes a typed value to the property named `name`.
    ///
    /// Returns `false` if there is no such value property or its size differs
    /// from `size_of::<T>()`.
    pub fn set_property<T: Pod>(&self, name: &str, value: T) -> bool {
        let mut layout = self.layout_mut();
        match layout.property_index(name) {
            Some(index) => layout.set_value_bytes(index, bytemuck::bytes_of(&value)),
            None => false,
        }
    }

    /// Reads a typed value from the property named `name`.
    pub fn get_property<T: Pod>(&self, name: &str) -> Option<T> {
        let layout = self.layout();
        let bytes = layout.value_bytes(layout.property_index(name)?)?;
        (bytes.len() == std::mem::size_of::<T>()).then(|| bytemuck::pod_read_unaligned(bytes))
    }

    /// Points the resource property named `name` at `texture`.
    pub fn set_texture(&self, name: &str, texture: Option<AssetUUID>) -> bool {
        let mut layout = self.layout_mut();
        match layout.property_index(name) {
            Some(index) => layout.set_resource(index, texture),
            None => false,
        }
    }

    /// The asset referenced by the resource property named `name`.
    pub fn texture_id(&self, name: &str) -> Option<AssetUUID> {
        let layout = self.layout();
        let info = layout.property_info(layout.property_index(name)?)?;
        if !info.is_resource() {
            return None;
        }
        layout.resource_id(info.offset())
    }

    /// Resolves the resource property named `name`, requesting a load if needed.
    pub fn get_texture(
        &self,
        name: &str,
        resolver: &dyn ResourceResolver,
    ) -> Option<SharedResource> {
        resolver.get_or_load(self.texture_id(name)?)
    }
}

impl Resource for BaseMaterial {
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
        self.layout().write(writer)
    }

    fn deserialize(&mut self, reader: &mut BinaryReader<'_>) -> Result<(), StreamError> {
        let layout = MaterialLayout::read(reader)?;
        *self.layout.get_mut().unwrap_or_else(PoisonError::into_inner) = layout;
        Ok(())
    }
}

impl TypedResource for BaseMaterial {
    const TYPE_NAME: &'static str = "MaterialData";
}

impl MaterialProperties for BaseMaterial {
    fn pipeline_id(&self, _resolver: &dyn ResourceResolver) -> Option<AssetUUID> {
        self.pipeline()
    }

    fn property_info_count(&self, _resolver: &dyn ResourceResolver) -> usize {
        self.layout().property_count()
    }

    fn property_info_at(
        &self,
        _resolver: &dyn ResourceResolver,
        index: usize,
    ) -> Option<PropertyInfo> {
        self.layout().property_info(index).cloned()
    }

    fn property_index(&self, _resolver: &dyn ResourceResolver, name: &str) -> Option<usize> {
        self.layout().property_index(name)
    }

    fn current_buffer_offset(&self, _resolver: &dyn ResourceResolver) -> usize {
        self.layout().current_offset()
    }

    fn resource_property_count(&self, _resolver: &dyn ResourceResolver) -> usize {
        self.layout().resource_property_count()
    }

    fn property_index_from_resource_index(
        &self,
        _resolver: &dyn ResourceResolver,
        resource_index: usize,
    ) -> Option<usize> {
        self.layout().property_index_from_resource_index(resource_index)
    }

    fn resource_id_at(
        &self,
        _resolver: &dyn ResourceResolver,
        resource_index: usize,
    ) -> Option<AssetUUID> {
        self.layout().resource_id(resource_index)
    }

    fn buffer_reference(&self, _resolver: &dyn ResourceResolver) -> Vec<u8> {
        self.layout().buffer().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn float() -> TypeHash {
        TypeHash::of_name("float")
    }

    fn texture() -> TypeHash {
        TypeHash::of_name("TextureData")
    }

    fn sample_material() -> BaseMaterial {
        let material = BaseMaterial::new(AssetUUID::from_raw(10), "Brick");
        material.set_pipeline(AssetUUID::from_raw(77));
        material.add_property("Roughness", "u_Roughness", float(), 4, 0);
        material.add_resource_property("Albedo", "u_Albedo", texture(), AssetUUID::from_raw(5), 1);
        material.add_property("Tint", "u_Tint", TypeHash::of_name("vec3"), 12, 0);
        material.add_resource_property("Normal", "u_Normal", texture(), None, 1);
        material.set_property("Roughness", 0.25f32);
        material.set_property("Tint", [1.0f32, 0.5, 0.0]);
        material
    }

    #[test]
    fn test_offsets_are_packed_in_insertion_order() {
        let material = sample_material();
        let layout = material.layout();
        assert_eq!(layout.property_info(0).unwrap().offset(), 0);
        assert_eq!(layout.property_info(2).unwrap().offset(), 4);
        assert_eq!(layout.current_offset(), 16);
        assert_eq!(layout.buffer().len(), 16);
        assert_eq!(layout.property_info(1).unwrap().offset(), 0);
        assert_eq!(layout.property_info(3).unwrap().offset(), 1);
    }

    #[test]
    fn test_duplicate_value_property_keeps_first() {
        let material = sample_material();
        let index = material.add_property("Roughness", "other", float(), 8, 0);
        assert_eq!(index, 0);
        assert_eq!(material.layout().property_count(), 4);
        assert_eq!(material.layout().current_offset(), 16);
        assert_eq!(material.get_property::<f32>("Roughness"), Some(0.25));
    }

    #[test]
    fn test_readding_resource_property_updates_reference() {
        let material = sample_material();
        let index =
            material.add_resource_property("Albedo", "u_Albedo", texture(), AssetUUID::from_raw(6), 1);
        assert_eq!(index, 1);
        assert_eq!(material.texture_id("Albedo"), AssetUUID::from_raw(6));
        assert_eq!(material.layout().resource_count(), 2);
    }

    #[test]
    fn test_typed_access_checks_size() {
        let material = sample_material();
        assert!(!material.set_property("Roughness", 1.0f64));
        assert_eq!(material.get_property::<f64>("Roughness"), None);
        assert_eq!(material.get_property::<[f32; 3]>("Tint"), Some([1.0, 0.5, 0.0]));
        assert!(!material.set_property("Albedo", 1u32));
        assert!(!material.set_property("Missing", 1u32));
    }

    #[test]
    fn test_set_texture_only_targets_resources() {
        let material = sample_material();
        assert!(material.set_texture("Normal", AssetUUID::from_raw(9)));
        assert_eq!(material.texture_id("Normal"), AssetUUID::from_raw(9));
        assert!(!material.set_texture("Roughness", AssetUUID::from_raw(9)));
        assert_eq!(material.texture_id("Roughness"), None);
    }

    #[test]
    fn test_add_property_info_reassigns_offsets() {
        let source = sample_material();
        let copy = BaseMaterial::default();
        copy.add_property("Metallic", "u_Metallic", float(), 4, 0);

        for info in source.layout().properties() {
            copy.add_property_info(info);
        }

        let layout = copy.layout();
        assert_eq!(layout.property_count(), 5);
        let tint = layout.property_info(layout.property_index("Tint").unwrap()).unwrap();
        assert_eq!(tint.offset(), 8);
        assert_eq!(layout.current_offset(), 20);
        assert_eq!(layout.resource_count(), 2);
        assert_eq!(layout.resource_id(0), None);
    }

    #[test]
    fn test_resource_property_info_maps_through_slot() {
        let material = sample_material();
        struct NoResolver;
        impl ResourceResolver for NoResolver {
            fn find_resource(&self, _uuid: AssetUUID) -> Option<SharedResource> {
                None
            }
            fn get_or_load(&self, _uuid: AssetUUID) -> Option<SharedResource> {
                None
            }
        }

        let info = material.resource_property_info(&NoResolver, 1).unwrap();
        assert_eq!(info.display_name(), "Normal");
        assert_eq!(material.property_index_from_resource_index(&NoResolver, 1), Some(3));
        assert_eq!(material.resource_property_info(&NoResolver, 2), None);
    }

    #[test]
    fn test_serialize_round_trip_restores_lookup() {
        let material = sample_material();
        let mut bytes = Vec::new();
        material.serialize(&mut BinaryWriter::new(&mut bytes)).unwrap();

        let mut restored = BaseMaterial::default();
        let mut cursor = Cursor::new(bytes);
        restored
            .deserialize(&mut BinaryReader::new(&mut cursor))
            .unwrap();

        assert_eq!(*restored.layout(), *material.layout());
        assert_eq!(restored.layout().property_index("Tint"), Some(2));
        assert_eq!(restored.pipeline(), AssetUUID::from_raw(77));
        assert_eq!(restored.get_property::<f32>("Roughness"), Some(0.25));
    }

    #[test]
    fn test_deserialize_rejects_overrunning_property() {
        let material = BaseMaterial::default();
        material.add_property("Roughness", "u_Roughness", float(), 4, 0);
        let mut bytes = Vec::new();
        material.serialize(&mut BinaryWriter::new(&mut bytes)).unwrap();

        // Shrink the buffer length prefix from 4 to 2 and drop two bytes.
        let buffer_len_at = bytes.len() - 8 - 4 - 8;
        bytes[buffer_len_at] = 2;
        bytes.drain(buffer_len_at + 8..buffer_len_at + 10);

        let mut restored = BaseMaterial::default();
        let mut cursor = Cursor::new(bytes);
        assert!(matches!(
            restored.deserialize(&mut BinaryReader::new(&mut cursor)),
            Err(StreamError::Invalid(_))
        ));
    }

    #[test]
    fn test_deserialize_rejects_overflowing_offset() {
        let info = PropertyInfo::value("Roughness", "u_Roughness", float(), 4, usize::MAX - 1, 0);
        let mut bytes = Vec::new();
        {
            let mut writer = BinaryWriter::new(&mut bytes);
            writer.write_uuid(None).unwrap();
            writer.write_usize(1).unwrap();
            info.write(&mut writer).unwrap();
            writer.write_bytes(&[0; 4]).unwrap();
            writer.write_usize(0).unwrap();
        }

        let mut restored = BaseMaterial::default();
        let mut cursor = Cursor::new(bytes);
        assert!(matches!(
            restored.deserialize(&mut BinaryReader::new(&mut cursor)),
            Err(StreamError::Invalid(_))
        ));
        assert_eq!(restored.layout().property_count(), 0);
    }

    #[test]
    fn test_clear_properties_keeps_pipeline() {
        let material = sample_material();
        material.clear_properties();
        let layout = material.layout();
        assert_eq!(layout.property_count(), 0);
        assert_eq!(layout.current_offset(), 0);
        assert_eq!(layout.resource_property_count(), 0);
        assert_eq!(layout.pipeline(), AssetUUID::from_raw(77));
    }
}
