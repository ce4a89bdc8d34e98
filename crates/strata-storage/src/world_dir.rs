//! On-disk layout of saved worlds under the data root.
//!
//! ```text
//! <root>/saves/<world>/world.dat
//! <root>/saves/<world>/dimensions/<dimension>/regions/r_<rx>_<rz>.rgn
//! ```

use std::path::{Path, PathBuf};

use strata_voxel::RegionPos;

use crate::error::StorageError;

/// Dimension used when the caller has no other.
pub const DEFAULT_DIMENSION: &str = "overworld";

const WORLD_DATA_FILE: &str = "world.dat";

/// Directory holding all saved worlds under `data_root`.
pub fn saves_dir(data_root: &Path) -> PathBuf {
    data_root.join("saves")
}

/// Names of saved worlds, sorted. Empty if nothing has been saved yet.
pub fn list_worlds(data_root: &Path) -> Result<Vec<String>, StorageError> {
    let dir = saves_dir(data_root);
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StorageError::io(&dir, e)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StorageError::io(&dir, e))?;
        let is_dir = entry
            .file_type()
            .map_err(|e| StorageError::io(&entry.path(), e))?
            .is_dir();
        if is_dir && let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// One world's save directory.
#[derive(Clone, Debug)]
pub struct WorldDirectory {
    name: String,
    path: PathBuf,
}

impl WorldDirectory {
    /// Opens (creating if needed) the save directory of `world` under `data_root`.
    pub fn open(data_root: &Path, world: &str) -> Result<Self, StorageError> {
        validate_name("world", world)?;
        let path = saves_dir(data_root).join(world);
        std::fs::create_dir_all(&path).map_err(|e| StorageError::io(&path, e))?;
        tracing::debug!(world, path = %path.display(), "opened world directory");
        Ok(Self {
            name: world.to_string(),
            path,
        })
    }

    /// World name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the world metadata file.
    pub fn world_data_path(&self) -> PathBuf {
        self.path.join(WORLD_DATA_FILE)
    }

    /// Directory holding the region files of `dimension`.
    pub fn regions_dir(&self, dimension: &str) -> Result<PathBuf, StorageError> {
        validate_name("dimension", dimension)?;
        Ok(self.path.join("dimensions").join(dimension).join("regions"))
    }

    /// Path of one region file.
    pub fn region_path(&self, dimension: &str, region: RegionPos) -> Result<PathBuf, StorageError> {
        Ok(self.regions_dir(dimension)?.join(region.file_name()))
    }
}

/// Rejects names that would escape or alias the save directory.
fn validate_name(kind: &'static str, name: &str) -> Result<(), StorageError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(StorageError::InvalidName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_worlds_missing_saves_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_worlds(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_list_worlds_sorted_directories_only() {
        let dir = tempfile::tempdir().unwrap();
        WorldDirectory::open(dir.path(), "zeta").unwrap();
        WorldDirectory::open(dir.path(), "alpha").unwrap();
        std::fs::write(saves_dir(dir.path()).join("notes.txt"), b"x").unwrap();

        assert_eq!(list_worlds(dir.path()).unwrap(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_region_path_layout() {
        let dir = tempfile::tempdir().unwrap();
        let world = WorldDirectory::open(dir.path(), "w").unwrap();
        let path = world.region_path("nether", RegionPos::new(-1, 3)).unwrap();
        assert!(path.ends_with("saves/w/dimensions/nether/regions/r_-1_3.rgn"));
        assert!(world.world_data_path().ends_with("saves/w/world.dat"));
    }

    #[test]
    fn test_invalid_names_rejected() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["", "..", "a/b", "a\\b"] {
            assert!(matches!(
                WorldDirectory::open(dir.path(), name),
                Err(StorageError::InvalidName { kind: "world", .. })
            ));
        }
        let world = WorldDirectory::open(dir.path(), "ok").unwrap();
        assert!(matches!(
            world.regions_dir("../up"),
            Err(StorageError::InvalidName {
                kind: "dimension",
                ..
            })
        ));
    }
}
