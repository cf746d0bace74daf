// src/subprojects.rs

use crate::error::Result;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Ignore-marker file looked for when none is configured.
pub const DEFAULT_IGNORE_FILE: &str = ".gitversion.ignore";

/// Finds the nested projects below a project directory.
pub trait SubprojectLocator {
    /// Root-relative, `/`-separated paths of the subprojects under `project`.
    fn locate(&self, root: &Path, project: &Path) -> Result<Vec<String>>;
}

/// Treats every directory holding one of `markers` as a subproject, unless it
/// also holds one of `ignore_files`.
#[derive(Debug, Clone)]
pub struct MarkerLocator {
    pub markers: Vec<String>,
    pub ignore_files: Vec<String>,
    /// Directory names or root-relative paths never searched
    pub ignore_dirs: Vec<String>,
}

impl Default for MarkerLocator {
    fn default() -> Self {
        MarkerLocator {
            markers: Vec::new(),
            ignore_files: vec![DEFAULT_IGNORE_FILE.to_string()],
            ignore_dirs: Vec::new(),
        }
    }
}

impl MarkerLocator {
    fn is_skipped_dir(&self, root: &Path, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        if name == ".git" {
            return true;
        }
        let local = local_path(root, entry.path());
        self.ignore_dirs.iter().any(|dir| *dir == name || *dir == local)
    }

    fn is_ignored(&self, dir: &Path) -> bool {
        self.ignore_files.iter().any(|file| dir.join(file).is_file())
    }
}

impl SubprojectLocator for MarkerLocator {
    fn locate(&self, root: &Path, project: &Path) -> Result<Vec<String>> {
        if self.markers.is_empty() {
            return Ok(Vec::new());
        }

        let mut found = BTreeSet::new();
        let walker = WalkDir::new(project)
            .into_iter()
            .filter_entry(|entry| !self.is_skipped_dir(root, entry));
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if !self.markers.iter().any(|marker| *marker == name) {
                continue;
            }
            let Some(dir) = entry.path().parent() else { continue };
            if dir == project || self.is_ignored(dir) {
                continue;
            }
            found.insert(local_path(root, dir));
        }
        Ok(found.into_iter().collect())
    }
}

/// Nearest directory at or above `dir` that contains `.git`, or `dir` itself.
pub fn find_git_root(dir: &Path) -> PathBuf {
    dir.ancestors()
        .find(|candidate| candidate.join(".git").exists())
        .unwrap_or(dir)
        .to_path_buf()
}

/// `dir` relative to `root` with `/` separators; empty for the root itself.
pub fn local_path(root: &Path, dir: &Path) -> String {
    let relative = dir.strip_prefix(root).unwrap_or(dir);
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
