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

use super::{AssetUUID, SharedResource};

/// Narrow lookup interface into the asset manager.
///
/// Consumers that hold asset identifiers (material instances pointing at their
/// base material, materials pointing at textures) resolve them through this
/// trait on every access instead of caching pointers, so hot-reloaded assets
/// are always picked up.
pub trait ResourceResolver: Send + Sync {
    /// Cache-only lookup; never triggers a load.
    fn find_resource(&self, uuid: AssetUUID) -> Option<SharedResource>;

    /// Returns the resource if it is cached, otherwise requests a background
    /// load and returns `None` until that load has completed.
    fn get_or_load(&self, uuid: AssetUUID) -> Option<SharedResource>;
}
