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

//! Stable string hashing.
//!
//! Type hashes, property-name hashes and archive path hashes are persisted in
//! asset files, so they must not depend on the compiler or the process. The
//! hash is the first four bytes of the BLAKE3 digest, read little-endian.

/// Hashes a string into a stable 32-bit value.
pub fn stable_hash(text: &str) -> u32 {
    let digest = blake3::hash(text.as_bytes());
    let bytes = digest.as_bytes();
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(stable_hash("Color"), stable_hash("Color"));
    }

    #[test]
    fn test_hash_distinguishes_names() {
        assert_ne!(stable_hash("Color"), stable_hash("color"));
        assert_ne!(stable_hash("Albedo"), stable_hash("Normal"));
    }
}
