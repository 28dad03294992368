//! Frame discovery and index navigation
//!
//! A [`FrameCatalog`] is the ordered list of point cloud files making up a
//! sequence together with the index of the frame currently shown.

use log::{debug, info};
use pcdseq_core::{Error, Result};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

/// Ordered list of frame files plus the current position in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameCatalog {
    files: Vec<PathBuf>,
    current: usize,
}

impl FrameCatalog {
    /// Build a catalog from a file or a directory.
    ///
    /// A single file is kept when its extension matches. A directory
    /// contributes its immediate regular files with a matching extension,
    /// sorted by path. `extension` may be given with or without the leading
    /// dot and is compared case-sensitively.
    pub fn discover<P: AsRef<Path>>(path: P, extension: &str) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() || !path.exists() {
            return Err(Error::NotFound(format!(
                "An argument 'pcd_path : {}' is empty or doesn't exist!",
                path.display()
            )));
        }

        let wanted = extension.trim_start_matches('.');
        let mut files = Vec::new();

        if path.is_dir() {
            for entry in fs::read_dir(path)? {
                let candidate = entry?.path();
                if candidate.is_file() && has_extension(&candidate, wanted) {
                    debug!("{} is detected.", candidate.display());
                    files.push(candidate);
                }
            }
            files.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
        } else if has_extension(path, wanted) {
            debug!("{} is detected.", path.display());
            files.push(path.to_path_buf());
        }

        info!("found {} frame(s) in {}", files.len(), path.display());
        Ok(Self::from_files(files))
    }

    /// Build a catalog from an already ordered list of files
    pub fn from_files(files: Vec<PathBuf>) -> Self {
        Self { files, current: 0 }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Path of the frame at `index`
    pub fn get(&self, index: usize) -> Option<&Path> {
        self.files.get(index).map(PathBuf::as_path)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.get(self.current)
    }

    /// Move the cursor to `index`, which must be inside the catalog
    pub fn set_current(&mut self, index: usize) -> Result<()> {
        if self.files.is_empty() {
            return Err(Error::EmptyCatalog);
        }
        if index >= self.files.len() {
            return Err(Error::InvalidData(format!(
                "frame index {} out of range for {} frame(s)",
                index,
                self.files.len()
            )));
        }
        self.current = index;
        Ok(())
    }

    /// Index reached by moving `delta` frames from `current`, wrapping around
    pub fn advance(&self, current: usize, delta: isize) -> Result<usize> {
        advance_index(current, delta, self.files.len())
    }
}

/// `(current + delta) mod len`, with negative deltas wrapping to the end.
///
/// An empty catalog has no valid index and reports [`Error::EmptyCatalog`].
pub fn advance_index(current: usize, delta: isize, len: usize) -> Result<usize> {
    if len == 0 {
        return Err(Error::EmptyCatalog);
    }
    let len = len as i128;
    let next = (current as i128 + delta as i128).rem_euclid(len);
    Ok(next as usize)
}

/// Path of the file paired with `frame` under `root`.
///
/// When `root` is a file it is used as is; otherwise the companion is
/// `root/<frame stem><extension>`.
pub fn companion_path(root: &Path, frame: &Path, extension: &str) -> PathBuf {
    if root.is_file() {
        return root.to_path_buf();
    }

    let stem = frame.file_stem().unwrap_or_else(|| OsStr::new(""));
    let mut name = stem.to_os_string();
    if !extension.is_empty() && !extension.starts_with('.') {
        name.push(".");
    }
    name.push(extension);
    root.join(name)
}

fn has_extension(path: &Path, wanted: &str) -> bool {
    path.extension().and_then(OsStr::to_str) == Some(wanted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        File::create(&path).unwrap();
        path
    }

    #[test]
    fn test_discover_directory_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "frame010.pcd");
        touch(dir.path(), "frame002.pcd");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "frame001.PCD");
        touch(dir.path(), "frame005.pcd");
        fs::create_dir(dir.path().join("nested.pcd")).unwrap();
        touch(&dir.path().join("nested.pcd"), "deep.pcd");

        let catalog = FrameCatalog::discover(dir.path(), ".pcd").unwrap();
        let names: Vec<_> = catalog
            .files()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["frame002.pcd", "frame005.pcd", "frame010.pcd"]);
        assert_eq!(catalog.current_index(), 0);
    }

    #[test]
    fn test_discover_accepts_extension_without_dot() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.pcd");
        touch(dir.path(), "b.ply");

        let catalog = FrameCatalog::discover(dir.path(), "ply").unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get(0).unwrap().ends_with("b.ply"));
    }

    #[test]
    fn test_discover_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = touch(dir.path(), "only.pcd");
        let other = touch(dir.path(), "image.png");

        let catalog = FrameCatalog::discover(&file, ".pcd").unwrap();
        assert_eq!(catalog.files(), &[file]);

        let catalog = FrameCatalog::discover(&other, ".pcd").unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_discover_missing_path() {
        assert!(matches!(FrameCatalog::discover("", ".pcd"), Err(Error::NotFound(_))));
        assert!(matches!(
            FrameCatalog::discover("/no/such/dir/anywhere", ".pcd"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_advance_wraps_both_ways() {
        assert_eq!(advance_index(0, 1, 3).unwrap(), 1);
        assert_eq!(advance_index(2, 1, 3).unwrap(), 0);
        assert_eq!(advance_index(0, -1, 3).unwrap(), 2);
        assert_eq!(advance_index(1, -4, 3).unwrap(), 0);
        assert_eq!(advance_index(0, 1, 1).unwrap(), 0);
    }

    #[test]
    fn test_advance_then_back_is_identity() {
        for len in 1..8usize {
            for i in 0..len {
                let forward = advance_index(i, 1, len).unwrap();
                assert!(forward < len);
                assert_eq!(advance_index(forward, -1, len).unwrap(), i);
            }
        }
    }

    #[test]
    fn test_full_cycle_returns_to_start() {
        let catalog = FrameCatalog::from_files((0..5).map(|i| PathBuf::from(format!("{}.pcd", i))).collect());
        for start in 0..catalog.len() {
            let mut index = start;
            for _ in 0..catalog.len() {
                index = catalog.advance(index, 1).unwrap();
            }
            assert_eq!(index, start);
        }
    }

    #[test]
    fn test_advance_on_empty_catalog() {
        assert!(matches!(advance_index(0, 1, 0), Err(Error::EmptyCatalog)));
        let mut catalog = FrameCatalog::from_files(Vec::new());
        assert!(matches!(catalog.advance(0, -1), Err(Error::EmptyCatalog)));
        assert!(matches!(catalog.set_current(0), Err(Error::EmptyCatalog)));
    }

    #[test]
    fn test_set_current_bounds() {
        let mut catalog = FrameCatalog::from_files(vec![PathBuf::from("a.pcd"), PathBuf::from("b.pcd")]);
        catalog.set_current(1).unwrap();
        assert_eq!(catalog.current_path(), Some(Path::new("b.pcd")));
        assert!(catalog.set_current(2).is_err());
        assert_eq!(catalog.current_index(), 1);
    }

    #[test]
    fn test_companion_path() {
        let dir = tempfile::tempdir().unwrap();
        let frame = Path::new("/data/clouds/frame007.pcd");

        assert_eq!(
            companion_path(dir.path(), frame, ".png"),
            dir.path().join("frame007.png")
        );
        assert_eq!(
            companion_path(dir.path(), frame, "json"),
            dir.path().join("frame007.json")
        );

        let fixed = touch(dir.path(), "fixed.png");
        assert_eq!(companion_path(&fixed, frame, ".png"), fixed);
    }
}
