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

use glint_core::asset::{AssetUUID, Resource, SharedResource, TypeHash, TypeRegistry};
use glint_core::material::{BaseMaterial, MaterialInstance};
use glint_lanes::asset_lane::{
    read_archive, write_archive, ArchiveCache, ArchiveError, AssetArchive,
};
use std::sync::Arc;
use tempfile::tempdir;

fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.register_resource::<BaseMaterial>(&["gmat"]);
    registry.register_resource::<MaterialInstance>(&["gminst"]);
    registry
}

fn material(raw: u64, name: &str, roughness: f32) -> BaseMaterial {
    let material = BaseMaterial::new(AssetUUID::from_raw(raw), name);
    material.add_property("Roughness", "u_Roughness", TypeHash::of_name("float"), 4, 0);
    material.set_property("Roughness", roughness);
    material
}

#[test]
fn test_archive_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("materials.gcag");

    let brick = material(1, "Brick", 0.8);
    let metal = material(2, "Metal", 0.1);
    let instance = MaterialInstance::of(&brick, AssetUUID::from_raw(3), "BrickWet");
    write_archive(&path, &[&brick, &metal, &instance]).unwrap();

    let archive = read_archive(&path, &registry()).unwrap();
    assert_eq!(archive.len(), 3);

    let names: Vec<&str> = archive.iter().map(|entry| entry.name()).collect();
    assert_eq!(names, ["Brick", "Metal", "BrickWet"]);

    let metal = archive.get(1).unwrap();
    assert_eq!(metal.uuid(), AssetUUID::from_raw(2));
    let metal = metal.downcast_ref::<BaseMaterial>().unwrap();
    assert_eq!(metal.get_property::<f32>("Roughness"), Some(0.1));

    let instance = archive.get(2).unwrap();
    let instance = instance.downcast_ref::<MaterialInstance>().unwrap();
    assert_eq!(instance.base_material_id(), AssetUUID::from_raw(1));
}

#[test]
fn test_unregistered_entries_are_skipped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mixed.gcag");
    let brick = material(1, "Brick", 0.8);
    let instance = MaterialInstance::of(&brick, AssetUUID::from_raw(3), "BrickWet");
    write_archive(&path, &[&brick, &instance]).unwrap();

    let mut only_materials = TypeRegistry::new();
    only_materials.register_resource::<BaseMaterial>(&["gmat"]);

    let archive = read_archive(&path, &only_materials).unwrap();
    assert_eq!(archive.len(), 1);
    assert!(archive.get(0).unwrap().is::<BaseMaterial>());
}

#[test]
fn test_cache_reads_each_path_once() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("materials.gcag");
    write_archive(&path, &[&material(1, "Brick", 0.8)]).unwrap();

    let cache = ArchiveCache::new();
    let registry = registry();
    let first = cache.get_or_load(&path, &registry).unwrap();

    std::fs::remove_file(&path).unwrap();
    let second = cache.get_or_load(&path, &registry).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);
    assert!(cache.get(ArchiveCache::path_key(&path)).is_some());
}

#[test]
fn test_missing_archive_is_an_error() {
    let dir = tempdir().unwrap();
    let cache = ArchiveCache::new();
    let result = cache.get_or_load(&dir.path().join("missing.gcag"), &registry());
    assert!(result.is_err());
    assert!(cache.is_empty());
}

#[test]
fn test_bad_magic_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("garbage.gcag");
    std::fs::write(&path, b"NOPE\x01\x00\x00\x00").unwrap();

    let error = read_archive(&path, &registry()).unwrap_err();
    assert!(matches!(
        error.downcast_ref::<ArchiveError>(),
        Some(ArchiveError::BadMagic)
    ));
}

#[test]
fn test_unidentified_resource_cannot_be_archived() {
    let dir = tempdir().unwrap();
    let anonymous = BaseMaterial::default();
    assert!(anonymous.identity().uuid().is_none());
    assert!(write_archive(&dir.path().join("a.gcag"), &[&anonymous]).is_err());
}

#[test]
fn test_seeded_archive_is_served_from_cache() {
    let cache = ArchiveCache::new();
    let seeded: SharedResource = Arc::new(material(9, "Seeded", 0.5));
    let archive = Arc::new(AssetArchive::from_resources(vec![seeded]));
    let path = std::path::Path::new("never/on/disk.gcag");
    cache.insert(ArchiveCache::path_key(path), archive.clone());

    let loaded = cache.get_or_load(path, &registry()).unwrap();
    assert!(Arc::ptr_eq(&loaded, &archive));
}
