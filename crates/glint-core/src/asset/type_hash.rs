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

use super::TypedResource;
use crate::hash::stable_hash;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A stable 32-bit hash identifying a resource type or a basic value type.
///
/// Hashes are derived from a type's registered name rather than from its
/// `TypeId`, so they stay valid across builds and can be stored in asset files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeHash(u32);

impl TypeHash {
    /// Wraps an already computed hash value.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Hashes a type name.
    pub fn of_name(name: &str) -> Self {
        Self(stable_hash(name))
    }

    /// Returns the hash of a resource type.
    pub fn of<T: TypedResource>() -> Self {
        Self::of_name(T::TYPE_NAME)
    }

    /// Returns the raw hash value.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
