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

use serde::{Deserialize, Serialize};
use std::{fmt, num::NonZeroU64};
use uuid::Uuid;

/// A globally unique, persistent 64-bit identifier for a logical asset.
///
/// The identifier names the "idea" of an asset, decoupled from its physical
/// file path. It is never zero: the absence of an asset is expressed as
/// `Option<AssetUUID>`, which keeps the same size thanks to the niche, and
/// `0` is only used as the serialized form of `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetUUID(NonZeroU64);

impl AssetUUID {
    /// Creates a new, random identifier (a version 4 UUID folded to 64 bits).
    pub fn new() -> Self {
        Self::fold(Uuid::new_v4())
    }

    /// Derives a deterministic identifier from a path or any other stable name.
    pub fn from_path(path: &str) -> Self {
        Self::fold(Uuid::new_v5(&Uuid::NAMESPACE_OID, path.as_bytes()))
    }

    /// Interprets a raw serialized value, where `0` means "no asset".
    pub const fn from_raw(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Returns the serialized form of an optional identifier (`0` for `None`).
    pub fn to_raw(uuid: Option<Self>) -> u64 {
        uuid.map_or(0, Self::get)
    }

    /// Returns the raw, non-zero value of this identifier.
    pub const fn get(self) -> u64 {
        self.0.get()
    }

    fn fold(uuid: Uuid) -> Self {
        let (high, low) = uuid.as_u64_pair();
        Self(NonZeroU64::new(high ^ low).unwrap_or(NonZeroU64::MIN))
    }
}

impl Default for AssetUUID {
    /// Creates a new, random `AssetUUID`.
    fn default() -> Self {
        Self::new()
    }
}

impl From<NonZeroU64> for AssetUUID {
    fn from(value: NonZeroU64) -> Self {
        Self(value)
    }
}

impl fmt::Display for AssetUUID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_absent() {
        assert_eq!(AssetUUID::from_raw(0), None);
        assert_eq!(AssetUUID::to_raw(None), 0);
    }

    #[test]
    fn test_raw_round_trip() {
        let uuid = AssetUUID::from_raw(42).unwrap();
        assert_eq!(uuid.get(), 42);
        assert_eq!(AssetUUID::to_raw(Some(uuid)), 42);
    }

    #[test]
    fn test_from_path_is_deterministic() {
        assert_eq!(
            AssetUUID::from_path("textures/brick.png"),
            AssetUUID::from_path("textures/brick.png")
        );
        assert_ne!(
            AssetUUID::from_path("textures/brick.png"),
            AssetUUID::from_path("textures/stone.png")
        );
    }

    #[test]
    fn test_optional_uuid_has_no_size_overhead() {
        assert_eq!(
            std::mem::size_of::<Option<AssetUUID>>(),
            std::mem::size_of::<u64>()
        );
    }
}
