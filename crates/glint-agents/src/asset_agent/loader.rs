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

use anyhow::Result;
use glint_core::asset::{Resource, TypeHash, TypedResource};
use glint_lanes::asset_lane::ResourceLoader;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::Path;

/// A loader module with its resource type erased.
pub(crate) trait AnyLoader: Send + Sync {
    fn load_path(&self, path: &Path) -> Result<Box<dyn Resource>>;
}

struct LoaderWrapper<T, L>(L, PhantomData<fn() -> T>);

impl<T: TypedResource, L: ResourceLoader<T>> AnyLoader for LoaderWrapper<T, L> {
    fn load_path(&self, path: &Path) -> Result<Box<dyn Resource>> {
        let resource: T = self.0.load_path(path).map_err(anyhow::Error::from_boxed)?;
        Ok(Box::new(resource))
    }
}

/// Loader modules keyed by the hash of the resource type they produce.
#[derive(Default)]
pub(crate) struct LoaderRegistry {
    loaders: HashMap<TypeHash, Box<dyn AnyLoader>>,
}

impl LoaderRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers `loader` for `T`, replacing any previous loader for that type.
    pub(crate) fn register<T: TypedResource>(&mut self, loader: impl ResourceLoader<T> + 'static) {
        let wrapped = LoaderWrapper(loader, PhantomData);
        if self
            .loaders
            .insert(TypeHash::of::<T>(), Box::new(wrapped))
            .is_some()
        {
            log::debug!("Replaced the loader for '{}'", T::TYPE_NAME);
        }
    }

    pub(crate) fn get(&self, type_hash: TypeHash) -> Option<&dyn AnyLoader> {
        self.loaders.get(&type_hash).map(|loader| &**loader)
    }

    pub(crate) fn len(&self) -> usize {
        self.loaders.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_core::material::BaseMaterial;
    use glint_lanes::asset_lane::BinaryLoader;

    #[test]
    fn test_lookup_by_type_hash() {
        let mut registry = LoaderRegistry::new();
        registry.register::<BaseMaterial>(BinaryLoader::new());

        assert!(registry.get(TypeHash::of::<BaseMaterial>()).is_some());
        assert!(registry.get(TypeHash::of_name("TextureData")).is_none());

        registry.register::<BaseMaterial>(BinaryLoader::new());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_loader_errors_are_wrapped() {
        let mut registry = LoaderRegistry::new();
        registry.register::<BaseMaterial>(BinaryLoader::new());
        let loader = registry.get(TypeHash::of::<BaseMaterial>()).unwrap();
        let error = loader.load_path(Path::new("missing/base.gmat")).err().unwrap();
        assert!(!error.to_string().is_empty());
    }

    #[derive(Debug)]
    struct DecodeFailure(std::io::Error);

    impl std::fmt::Display for DecodeFailure {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("material header is corrupt")
        }
    }

    impl std::error::Error for DecodeFailure {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    struct FailingLoader;

    impl ResourceLoader<BaseMaterial> for FailingLoader {
        fn load(
            &self,
            _bytes: &[u8],
        ) -> std::result::Result<BaseMaterial, Box<dyn std::error::Error + Send + Sync>> {
            let cause = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "stream ended early");
            Err(Box::new(DecodeFailure(cause)))
        }

        fn load_path(
            &self,
            _path: &Path,
        ) -> std::result::Result<BaseMaterial, Box<dyn std::error::Error + Send + Sync>> {
            self.load(&[])
        }
    }

    #[test]
    fn test_loader_error_keeps_its_cause_chain() {
        let mut registry = LoaderRegistry::new();
        registry.register::<BaseMaterial>(FailingLoader);
        let loader = registry.get(TypeHash::of::<BaseMaterial>()).unwrap();

        let error = loader.load_path(Path::new("base.gmat")).err().unwrap();
        assert_eq!(error.chain().count(), 2);
        let report = format!("{error:#}");
        assert!(report.contains("material header is corrupt"));
        assert!(report.contains("stream ended early"));
    }
}
