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

//! The asset database: the read-only index mapping identifiers to metadata and file locations.

use crate::asset::{AssetUUID, TypeHash};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Per-identifier metadata recorded when the database was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMeta {
    /// The display name. May be empty, in which case a name is derived from the location.
    pub name: String,
    /// The stable hash of the resource type.
    pub type_hash: TypeHash,
    /// The file extension of the source file (lowercase, without the dot).
    pub extension: String,
    /// The embedded resource path, mirroring [`AssetLocation::subresource_path`].
    #[serde(default)]
    pub subresource_path: Option<String>,
}

/// Where the data for an identifier lives on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetLocation {
    /// The root file, relative to the asset root.
    pub path: PathBuf,
    /// The embedded resource inside `path`, when the identifier addresses one.
    pub subresource_path: Option<String>,
}

impl AssetLocation {
    /// A location addressing a whole file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            subresource_path: None,
        }
    }

    /// A location addressing a named resource embedded in a file.
    pub fn subresource(path: impl Into<PathBuf>, subresource: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            subresource_path: Some(subresource.into()),
        }
    }

    /// Returns `true` if the location names a non-empty subresource path.
    pub fn is_subresource(&self) -> bool {
        self.subresource_path
            .as_deref()
            .is_some_and(|path| !path.is_empty())
    }

    /// The file extension of the root file, lowercase.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }
}

/// One entry of the database index file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// The identifier of the asset.
    pub uuid: AssetUUID,
    /// The asset's metadata.
    pub meta: ResourceMeta,
    /// The asset's location.
    pub location: AssetLocation,
}

/// Read access to the asset database.
pub trait AssetDatabase: Send + Sync {
    /// The metadata recorded for `uuid`.
    fn resource_meta(&self, uuid: AssetUUID) -> Option<ResourceMeta>;

    /// The file location recorded for `uuid`.
    fn asset_location(&self, uuid: AssetUUID) -> Option<AssetLocation>;

    /// The identifier of the whole-file asset stored at `path`.
    fn uuid_for_path(&self, path: &Path) -> Option<AssetUUID>;

    /// Every identifier whose metadata has the given type hash.
    fn uuids_of_type(&self, type_hash: TypeHash) -> Vec<AssetUUID>;
}

/// An in-memory database built from an index of [`AssetRecord`]s.
#[derive(Debug, Default)]
pub struct IndexedAssetDatabase {
    records: HashMap<AssetUUID, AssetRecord>,
    by_path: HashMap<PathBuf, AssetUUID>,
}

impl IndexedAssetDatabase {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a database from the raw bytes of an index file.
    ///
    /// # Errors
    /// Returns a `DecodeError` if the bytes are not a bincode-encoded list of records.
    pub fn from_index_bytes(index_bytes: &[u8]) -> Result<Self, bincode::error::DecodeError> {
        let config = bincode::config::standard();
        let (records, _): (Vec<AssetRecord>, _) =
            bincode::serde::decode_from_slice(index_bytes, config)?;

        let mut database = Self::new();
        for record in records {
            database.insert(record);
        }
        Ok(database)
    }

    /// Encodes the database into the index file format.
    pub fn to_index_bytes(&self) -> Result<Vec<u8>, bincode::error::EncodeError> {
        let mut records: Vec<&AssetRecord> = self.records.values().collect();
        records.sort_by_key(|record| record.uuid);
        bincode::serde::encode_to_vec(&records, bincode::config::standard())
    }

    /// Adds or replaces a record.
    ///
    /// The location is authoritative: the meta's subresource path is
    /// overwritten with the location's.
    pub fn insert(&mut self, mut record: AssetRecord) {
        record.meta.subresource_path = record.location.subresource_path.clone();
        if let Some(previous) = self.records.get(&record.uuid) {
            if !previous.location.is_subresource() {
                self.by_path.remove(&previous.location.path);
            }
        }
        if !record.location.is_subresource() {
            self.by_path.insert(record.location.path.clone(), record.uuid);
        }
        self.records.insert(record.uuid, record);
    }

    /// The number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the database holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl AssetDatabase for IndexedAssetDatabase {
    fn resource_meta(&self, uuid: AssetUUID) -> Option<ResourceMeta> {
        self.records.get(&uuid).map(|record| record.meta.clone())
    }

    fn asset_location(&self, uuid: AssetUUID) -> Option<AssetLocation> {
        self.records.get(&uuid).map(|record| record.location.clone())
    }

    fn uuid_for_path(&self, path: &Path) -> Option<AssetUUID> {
        self.by_path.get(path).copied()
    }

    fn uuids_of_type(&self, type_hash: TypeHash) -> Vec<AssetUUID> {
        let mut uuids: Vec<AssetUUID> = self
            .records
            .values()
            .filter(|record| record.meta.type_hash == type_hash)
            .map(|record| record.uuid)
            .collect();
        uuids.sort();
        uuids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(raw: u64, path: &str, subresource: Option<&str>) -> AssetRecord {
        AssetRecord {
            uuid: AssetUUID::from_raw(raw).unwrap(),
            meta: ResourceMeta {
                name: String::new(),
                type_hash: TypeHash::of_name("MeshData"),
                extension: "gmesh".to_string(),
                subresource_path: None,
            },
            location: AssetLocation {
                path: PathBuf::from(path),
                subresource_path: subresource.map(str::to_string),
            },
        }
    }

    #[test]
    fn test_index_bytes_round_trip() {
        let mut database = IndexedAssetDatabase::new();
        database.insert(record(1, "meshes/tree.gmesh", None));
        database.insert(record(2, "meshes/tree.gmesh", Some("leaves")));

        let bytes = database.to_index_bytes().unwrap();
        let decoded = IndexedAssetDatabase::from_index_bytes(&bytes).unwrap();
        assert_eq!(decoded.len(), 2);

        let leaves = AssetUUID::from_raw(2).unwrap();
        assert_eq!(
            decoded.asset_location(leaves).unwrap().subresource_path.as_deref(),
            Some("leaves")
        );
    }

    #[test]
    fn test_meta_mirrors_location_subresource() {
        let mut database = IndexedAssetDatabase::new();
        let mut leaves = record(2, "meshes/tree.gmesh", Some("leaves"));
        leaves.meta.subresource_path = Some("stale".to_string());
        database.insert(leaves);
        database.insert(record(1, "meshes/tree.gmesh", None));

        let meta = database.resource_meta(AssetUUID::from_raw(2).unwrap()).unwrap();
        assert_eq!(meta.subresource_path.as_deref(), Some("leaves"));
        let meta = database.resource_meta(AssetUUID::from_raw(1).unwrap()).unwrap();
        assert_eq!(meta.subresource_path, None);
    }

    #[test]
    fn test_path_lookup_ignores_subresources() {
        let mut database = IndexedAssetDatabase::new();
        database.insert(record(1, "meshes/tree.gmesh", None));
        database.insert(record(2, "meshes/tree.gmesh", Some("leaves")));

        assert_eq!(
            database.uuid_for_path(Path::new("meshes/tree.gmesh")),
            AssetUUID::from_raw(1)
        );
        assert_eq!(database.uuid_for_path(Path::new("meshes/rock.gmesh")), None);
    }

    #[test]
    fn test_uuids_of_type() {
        let mut database = IndexedAssetDatabase::new();
        database.insert(record(3, "a.gmesh", None));
        database.insert(record(1, "b.gmesh", None));

        let uuids = database.uuids_of_type(TypeHash::of_name("MeshData"));
        assert_eq!(uuids, vec![AssetUUID::from_raw(1).unwrap(), AssetUUID::from_raw(3).unwrap()]);
        assert!(database.uuids_of_type(TypeHash::of_name("Other")).is_empty());
    }

    #[test]
    fn test_corrupt_index_is_rejected() {
        assert!(IndexedAssetDatabase::from_index_bytes(&[0xff, 0xff, 0xff]).is_err());
    }
}
