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

use glint_core::asset::TypedResource;
use glint_core::stream::BinaryReader;
use std::error::Error;
use std::io::Cursor;
use std::marker::PhantomData;
use std::path::Path;

/// A loader module that produces resources of type `T`.
///
/// Implementors parse raw bytes; the default [`ResourceLoader::load_path`]
/// reads the whole file and forwards to [`ResourceLoader::load`].
pub trait ResourceLoader<T: TypedResource>: Send + Sync {
    /// Parses a byte slice into a resource.
    ///
    /// The returned resource has no identity yet; the caller assigns one.
    fn load(&self, bytes: &[u8]) -> Result<T, Box<dyn Error + Send + Sync>>;

    /// Reads and parses the file at `path`.
    fn load_path(&self, path: &Path) -> Result<T, Box<dyn Error + Send + Sync>> {
        let bytes = std::fs::read(path)?;
        self.load(&bytes)
    }
}

/// Loads any resource written with its own [`Resource::serialize`](glint_core::asset::Resource::serialize).
pub struct BinaryLoader<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> BinaryLoader<T> {
    /// Creates the loader.
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for BinaryLoader<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TypedResource> ResourceLoader<T> for BinaryLoader<T> {
    fn load(&self, bytes: &[u8]) -> Result<T, Box<dyn Error + Send + Sync>> {
        let mut resource = T::default();
        let mut cursor = Cursor::new(bytes);
        resource.deserialize(&mut BinaryReader::new(&mut cursor))?;
        Ok(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_core::asset::{Resource, TypeHash};
    use glint_core::material::BaseMaterial;
    use glint_core::stream::BinaryWriter;

    #[test]
    fn test_binary_loader_reads_serialized_material() {
        let material = BaseMaterial::default();
        material.add_property("Roughness", "u_Roughness", TypeHash::of_name("float"), 4, 0);
        material.set_property("Roughness", 0.4f32);

        let mut bytes = Vec::new();
        material
            .serialize(&mut BinaryWriter::new(&mut bytes))
            .unwrap();

        let loaded = BinaryLoader::<BaseMaterial>::new().load(&bytes).unwrap();
        assert_eq!(loaded.get_property::<f32>("Roughness"), Some(0.4));
    }

    #[test]
    fn test_binary_loader_rejects_truncated_input() {
        let result = BinaryLoader::<BaseMaterial>::new().load(&[1, 2, 3]);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_path_reports_missing_file() {
        let result =
            BinaryLoader::<BaseMaterial>::new().load_path(Path::new("does/not/exist.gmat"));
        assert!(result.is_err());
    }
}
