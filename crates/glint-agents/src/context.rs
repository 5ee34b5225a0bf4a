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

//! The engine-facing entry point to the asset system.

use crate::config::AssetManagerConfig;
use crate::jobs::JobRunner;
use crate::AssetManager;
use glint_core::database::AssetDatabase;
use glint_core::material::{
    BaseMaterial, MaterialInstance, BASE_MATERIAL_EXTENSION, MATERIAL_INSTANCE_EXTENSION,
};
use glint_lanes::asset_lane::BinaryLoader;
use std::ops::Deref;
use std::sync::Arc;

/// Owns the [`AssetManager`] with the built-in resource types registered.
///
/// Materials and material instances, the plain property value types and
/// their binary loaders are available as soon as the context exists.
/// Dropping the context shuts the manager down.
pub struct AssetContext {
    manager: AssetManager,
}

impl AssetContext {
    /// Creates a context with a worker pool sized from `config`.
    pub fn new(config: AssetManagerConfig, database: Arc<dyn AssetDatabase>) -> anyhow::Result<Self> {
        Ok(Self::from_manager(AssetManager::new(config, database)?))
    }

    /// Creates a context whose background loads run on `jobs`.
    pub fn with_job_runner(
        config: AssetManagerConfig,
        database: Arc<dyn AssetDatabase>,
        jobs: Box<dyn JobRunner>,
    ) -> Self {
        Self::from_manager(AssetManager::with_job_runner(config, database, jobs))
    }

    fn from_manager(manager: AssetManager) -> Self {
        manager.register_resource_type::<BaseMaterial>(&[BASE_MATERIAL_EXTENSION]);
        manager.register_resource_type::<MaterialInstance>(&[MATERIAL_INSTANCE_EXTENSION]);
        manager.register_loader::<BaseMaterial>(BinaryLoader::new());
        manager.register_loader::<MaterialInstance>(BinaryLoader::new());

        manager.register_basic_type::<f32>("float");
        manager.register_basic_type::<[f32; 2]>("vec2");
        manager.register_basic_type::<[f32; 3]>("vec3");
        manager.register_basic_type::<[f32; 4]>("vec4");
        manager.register_basic_type::<i32>("int");
        manager.register_basic_type::<u32>("uint");

        Self { manager }
    }

    /// Delivers finished loads and notifications. Call once per frame.
    pub fn tick(&self) {
        self.manager.run_callbacks();
    }

    /// The asset manager.
    pub fn manager(&self) -> &AssetManager {
        &self.manager
    }
}

impl Deref for AssetContext {
    type Target = AssetManager;

    fn deref(&self) -> &AssetManager {
        &self.manager
    }
}

impl Drop for AssetContext {
    fn drop(&mut self) {
        self.manager.destroy();
    }
}
