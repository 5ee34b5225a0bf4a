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

use crate::asset::{AssetUUID, SharedResource};

/// What happened to an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetEventKind {
    /// The asset finished loading for the first time.
    Loaded,
    /// The asset was loaded again after a reload request.
    Reloaded,
    /// The asset was removed from the cache.
    Unloaded,
}

/// A notification about one asset, delivered on the consuming thread.
#[derive(Clone)]
pub struct AssetEvent {
    /// The kind of notification.
    pub kind: AssetEventKind,
    /// The asset the notification is about.
    pub uuid: AssetUUID,
    /// The resource, absent for [`AssetEventKind::Unloaded`].
    pub resource: Option<SharedResource>,
}

impl std::fmt::Debug for AssetEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetEvent")
            .field("kind", &self.kind)
            .field("uuid", &self.uuid)
            .field("resource", &self.resource.as_ref().map(|r| r.name().to_string()))
            .finish()
    }
}
