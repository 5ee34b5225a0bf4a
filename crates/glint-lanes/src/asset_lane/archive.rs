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

use anyhow::{Context, Result};
use glint_core::asset::{AssetUUID, Resource, SharedResource, TypeHash, TypeRegistry};
use glint_core::hash::stable_hash;
use glint_core::stream::{BinaryReader, BinaryWriter};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

/// The first four bytes of every archive file.
pub const ARCHIVE_MAGIC: [u8; 4] = *b"GCAG";
/// The archive layout version written by [`write_archive`].
pub const ARCHIVE_VERSION: u32 = 1;

/// Structural problems in an archive file.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The file does not start with [`ARCHIVE_MAGIC`].
    #[error("not an asset archive (bad magic)")]
    BadMagic,
    /// The file was written by an unknown layout version.
    #[error("unsupported archive version {0}")]
    UnsupportedVersion(u32),
    /// An entry's payload range lies outside the payload section.
    #[error("entry '{name}' points outside the archive payload")]
    EntryOutOfBounds {
        /// The name of the entry.
        name: String,
    },
    /// A resource without an identifier cannot be archived.
    #[error("resource '{0}' has no identifier")]
    MissingUuid(String),
}

struct EntryHeader {
    type_hash: TypeHash,
    uuid: Option<AssetUUID>,
    name: String,
    offset: usize,
    size: usize,
}

/// An ordered, immutable set of resources read from one archive file.
#[derive(Default)]
pub struct AssetArchive {
    entries: Vec<SharedResource>,
}

impl AssetArchive {
    /// Wraps already loaded resources.
    pub fn from_resources(entries: Vec<SharedResource>) -> Self {
        Self { entries }
    }

    /// The number of resources.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the archive holds no resources.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The resource at `index`.
    pub fn get(&self, index: usize) -> Option<&SharedResource> {
        self.entries.get(index)
    }

    /// Iterates over the resources in file order.
    pub fn iter(&self) -> impl Iterator<Item = &SharedResource> {
        self.entries.iter()
    }
}

impl std::fmt::Debug for AssetArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|entry| (entry.uuid(), entry.name())))
            .finish()
    }
}

/// Reads an archive, constructing each entry through the type registry.
///
/// Entries of unregistered types are skipped with a warning.
pub fn read_archive(path: &Path, registry: &TypeRegistry) -> Result<AssetArchive> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read archive '{}'", path.display()))?;
    let mut cursor = Cursor::new(bytes.as_slice());
    let mut reader = BinaryReader::new(&mut cursor);

    let mut magic = [0u8; 4];
    reader.read_raw(&mut magic)?;
    if magic != ARCHIVE_MAGIC {
        return Err(ArchiveError::BadMagic.into());
    }
    let version = reader.read_u32()?;
    if version != ARCHIVE_VERSION {
        return Err(ArchiveError::UnsupportedVersion(version).into());
    }

    let count = reader.read_usize()?;
    let mut headers = Vec::new();
    for _ in 0..count {
        headers.push(EntryHeader {
            type_hash: TypeHash::from_raw(reader.read_u32()?),
            uuid: reader.read_uuid()?,
            name: reader.read_string()?,
            offset: reader.read_usize()?,
            size: reader.read_usize()?,
        });
    }
    drop(reader);
    let payload = &bytes[cursor.position() as usize..];

    let mut entries = Vec::with_capacity(headers.len());
    for header in headers {
        let Some(resource_type) = registry.by_hash(header.type_hash) else {
            log::warn!(
                "Skipping archive entry '{}' of unregistered type {}",
                header.name,
                header.type_hash
            );
            continue;
        };
        let uuid = header
            .uuid
            .ok_or_else(|| ArchiveError::MissingUuid(header.name.clone()))?;
        let data = header
            .offset
            .checked_add(header.size)
            .and_then(|end| payload.get(header.offset..end))
            .ok_or_else(|| ArchiveError::EntryOutOfBounds {
                name: header.name.clone(),
            })?;

        let mut resource = resource_type.create_named(uuid, header.name.clone());
        let mut entry_cursor = Cursor::new(data);
        resource
            .deserialize(&mut BinaryReader::new(&mut entry_cursor))
            .with_context(|| format!("Failed to deserialize archive entry '{}'", header.name))?;
        entries.push(SharedResource::from(resource));
    }

    log::debug!("Read {} resources from archive '{}'", entries.len(), path.display());
    Ok(AssetArchive { entries })
}

/// Writes resources into a new archive file.
pub fn write_archive(path: &Path, resources: &[&dyn Resource]) -> Result<()> {
    let mut payload = Vec::new();
    let mut headers = Vec::with_capacity(resources.len());
    for resource in resources {
        let uuid = resource
            .identity()
            .uuid()
            .ok_or_else(|| ArchiveError::MissingUuid(resource.identity().name().to_string()))?;
        let offset = payload.len();
        resource
            .serialize(&mut BinaryWriter::new(&mut payload))
            .with_context(|| format!("Failed to serialize '{}'", resource.identity().name()))?;
        headers.push(EntryHeader {
            type_hash: resource.type_hash(),
            uuid: Some(uuid),
            name: resource.identity().name().to_string(),
            offset,
            size: payload.len() - offset,
        });
    }

    let mut bytes = Vec::new();
    let mut writer = BinaryWriter::new(&mut bytes);
    writer.write_raw(&ARCHIVE_MAGIC)?;
    writer.write_u32(ARCHIVE_VERSION)?;
    writer.write_usize(headers.len())?;
    for header in &headers {
        writer.write_u32(header.type_hash.get())?;
        writer.write_uuid(header.uuid)?;
        writer.write_str(&header.name)?;
        writer.write_usize(header.offset)?;
        writer.write_usize(header.size)?;
    }
    writer.write_raw(&payload)?;

    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to write archive '{}'", path.display()))
}

/// Loaded archives, keyed by a hash of their path.
///
/// Archives are never evicted individually; [`ArchiveCache::clear`] drops all
/// of them at teardown.
#[derive(Default)]
pub struct ArchiveCache {
    archives: RwLock<HashMap<u32, Arc<AssetArchive>>>,
}

impl ArchiveCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache key of an archive path.
    pub fn path_key(path: &Path) -> u32 {
        stable_hash(&path.to_string_lossy())
    }

    /// Returns the cached archive for `path`, reading the file on first use.
    ///
    /// Concurrent callers asking for the same path read the file once.
    pub fn get_or_load(&self, path: &Path, registry: &TypeRegistry) -> Result<Arc<AssetArchive>> {
        let key = Self::path_key(path);
        if let Some(archive) = self.get(key) {
            return Ok(archive);
        }

        let mut archives = self.archives.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(archive) = archives.get(&key) {
            return Ok(archive.clone());
        }
        if !path.exists() {
            log::error!("Archive file '{}' does not exist", path.display());
        }
        let archive = Arc::new(read_archive(path, registry)?);
        archives.insert(key, archive.clone());
        Ok(archive)
    }

    /// Seeds the cache with an archive under `key`.
    pub fn insert(&self, key: u32, archive: Arc<AssetArchive>) {
        self.archives
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, archive);
    }

    /// The archive cached under `key`.
    pub fn get(&self, key: u32) -> Option<Arc<AssetArchive>> {
        self.archives
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    /// The number of cached archives.
    pub fn len(&self) -> usize {
        self.archives
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no archive is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached archive.
    pub fn clear(&self) {
        self.archives
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
