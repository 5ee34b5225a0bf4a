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

use crate::asset::TypeHash;
use crate::hash::stable_hash;
use crate::stream::{BinaryReader, BinaryWriter, StreamError};

/// Describes one named property of a material.
///
/// For value properties `offset` is a byte offset into the packed property
/// buffer. For resource properties `size` is zero and `offset` is an index into
/// the material's resource-reference table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyInfo {
    display_name: String,
    shader_name: String,
    type_hash: TypeHash,
    size: usize,
    offset: usize,
    is_resource: bool,
    flags: u32,
}

impl PropertyInfo {
    /// Describes a value property stored in the packed buffer.
    pub fn value(
        display_name: impl Into<String>,
        shader_name: impl Into<String>,
        type_hash: TypeHash,
        size: usize,
        offset: usize,
        flags: u32,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            shader_name: shader_name.into(),
            type_hash,
            size,
            offset,
            is_resource: false,
            flags,
        }
    }

    /// Describes a resource property stored in the resource-reference table.
    pub fn resource(
        display_name: impl Into<String>,
        shader_name: impl Into<String>,
        type_hash: TypeHash,
        resource_index: usize,
        flags: u32,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            shader_name: shader_name.into(),
            type_hash,
            size: 0,
            offset: resource_index,
            is_resource: true,
            flags,
        }
    }

    /// The name shown to users and used for lookups.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The name of the matching shader uniform or binding.
    pub fn shader_name(&self) -> &str {
        &self.shader_name
    }

    /// The hash of the value type (or resource type).
    pub fn type_hash(&self) -> TypeHash {
        self.type_hash
    }

    /// The size in bytes; zero for resource properties.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The byte offset, or the resource index for resource properties.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The first byte past this property; the next property starts here.
    ///
    /// `None` if the range does not fit in `usize`.
    pub fn end_offset(&self) -> Option<usize> {
        self.offset.checked_add(self.size)
    }

    /// Returns `true` for properties that reference another asset.
    pub fn is_resource(&self) -> bool {
        self.is_resource
    }

    /// Feature flags attached to the property.
    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// The hash used by name lookups.
    pub fn name_hash(&self) -> u32 {
        stable_hash(&self.display_name)
    }

    /// The byte range of the value in the packed buffer; `None` for resources.
    pub fn byte_range(&self) -> Option<std::ops::Range<usize>> {
        if self.is_resource {
            return None;
        }
        Some(self.offset..self.end_offset()?)
    }

    pub(crate) fn set_offset(&mut self, offset: usize) {
        self.offset = offset;
    }

    pub(crate) fn write(&self, writer: &mut BinaryWriter<'_>) -> Result<(), StreamError> {
        writer.write_u32(self.type_hash.get())?;
        writer.write_str(&self.shader_name)?;
        writer.write_str(&self.display_name)?;
        writer.write_usize(self.size)?;
        writer.write_usize(self.offset)?;
        writer.write_bool(self.is_resource)?;
        writer.write_u32(self.flags)
    }

    pub(crate) fn read(reader: &mut BinaryReader<'_>) -> Result<Self, StreamError> {
        let type_hash = TypeHash::from_raw(reader.read_u32()?);
        let shader_name = reader.read_string()?;
        let display_name = reader.read_string()?;
        let size = reader.read_usize()?;
        let offset = reader.read_usize()?;
        let is_resource = reader.read_bool()?;
        let flags = reader.read_u32()?;
        Ok(Self {
            display_name,
            shader_name,
            type_hash,
            size,
            offset,
            is_resource,
            flags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_offset_packs_without_padding() {
        let info = PropertyInfo::value("Tint", "u_Tint", TypeHash::of_name("vec3"), 12, 4, 0);
        assert_eq!(info.end_offset(), Some(16));
        assert_eq!(info.byte_range(), Some(4..16));
    }

    #[test]
    fn test_overflowing_range_has_no_bytes() {
        let info = PropertyInfo::value(
            "Tint",
            "u_Tint",
            TypeHash::of_name("vec3"),
            4,
            usize::MAX - 1,
            0,
        );
        assert_eq!(info.end_offset(), None);
        assert_eq!(info.byte_range(), None);
    }

    #[test]
    fn test_resource_property_has_no_bytes() {
        let info = PropertyInfo::resource("Albedo", "u_Albedo", TypeHash::of_name("TextureData"), 2, 1);
        assert_eq!(info.size(), 0);
        assert_eq!(info.offset(), 2);
        assert!(info.is_resource());
        assert_eq!(info.byte_range(), None);
    }
}
