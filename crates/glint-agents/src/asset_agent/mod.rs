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

//! The asset manager and the machinery behind it.
//!
//! [`AssetManager`] answers "give me the resource for this identifier". It
//! consults the in-memory store, then the bulk archives, then the registered
//! loader modules. Background loads run on a [`JobRunner`](crate::jobs::JobRunner);
//! their results are handed back to the consuming thread through
//! [`AssetManager::run_callbacks`].

mod callbacks;
mod loader;
mod loading;
mod manager;

pub use callbacks::{AssetCallback, EventCallback};
pub use glint_core::event::{AssetEvent, AssetEventKind};
pub use loading::{LoadingLock, LoadingLocks};
pub use manager::AssetManager;
