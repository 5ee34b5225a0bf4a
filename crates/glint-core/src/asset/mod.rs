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

//! Provides the foundational traits and primitive types for Glint's asset system.
//!
//! This module defines the "common language" for all asset-related operations in the
//! engine. It contains the core contracts that other crates implement or use,
//! but it has no knowledge of how assets are located, scheduled or stored.
//!
//! The key components are:
//! - The [`Resource`] trait: the base contract for every loadable asset.
//! - [`AssetUUID`]: the stable identifier used to reference assets throughout the engine.
//! - [`TypeRegistry`]: the `TypeId -> vtable` table that maps resource types to
//!   stable hashes, file extensions and constructors.
//! - [`ResourceResolver`]: the narrow lookup interface that consumers (such as
//!   material instances) use to reach loaded assets.

mod handle;
mod registry;
mod resolver;
mod resource;
mod type_hash;
mod uuid;

pub use handle::*;
pub use registry::*;
pub use resolver::*;
pub use resource::*;
pub use type_hash::*;
pub use uuid::*;
