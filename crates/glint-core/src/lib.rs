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

//! # Glint Core
//!
//! Foundational crate containing the asset identity types, the resource type
//! registry, the binary stream codec and the material property model.
//!
//! Nothing in here knows how assets are located on disk or scheduled for
//! loading; those concerns live in `glint-lanes` and `glint-agents`.

#![warn(missing_docs)]

pub mod asset;
pub mod database;
pub mod error;
pub mod event;
pub mod hash;
pub mod material;
pub mod stream;

pub use error::AssetError;
