//! Entry sources feeding the index.
//!
//! An [`IndexSource`] is the strategy object a [`PrefixIndex`](crate::engine::PrefixIndex)
//! is constructed with. It enumerates raw entries per root, decides which
//! entries to skip, splits entries into ordered search components, and tells
//! the engine where (if anywhere) to persist snapshots.

use crate::index::types::{EntryIndex, Root};
use crate::utils::{index_file_path, split_components};
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Capabilities the engine needs from its surroundings
pub trait IndexSource: Send + Sync + 'static {
    /// Raw entries under `root`, in a stable order
    fn enumerate(&self, root: &Root) -> Vec<String>;

    /// Whether a (root-mapped) entry should stay out of the index
    fn should_skip(&self, _entry: &str) -> bool {
        false
    }

    /// Ordered search components of an entry; earlier components score better
    fn split_components(&self, entry: &str, entry_index: EntryIndex) -> Vec<String>;

    /// Snapshot file for `base_path`, or `None` to disable persistence
    fn resolve_index_path(&self, _base_path: &str, _is_temp: bool) -> Option<PathBuf> {
        None
    }
}

/// Filesystem-backed source: walks each root directory
pub struct FsSource {
    skip: GlobSet,
    index_dir: Option<PathBuf>,
    include_hidden: bool,
}

impl FsSource {
    /// Create a source skipping `skip_globs`, persisting into `index_dir`
    pub fn new(skip_globs: &[String], index_dir: Option<PathBuf>) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in skip_globs {
            let glob = Glob::new(pattern)
                .with_context(|| format!("Invalid skip glob: {}", pattern))?;
            builder.add(glob);
        }
        let skip = builder.build().context("Failed to compile skip globs")?;

        Ok(Self {
            skip,
            index_dir,
            include_hidden: false,
        })
    }

    /// Also enumerate hidden files and directories
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    fn walk(&self, base: &Path) -> Vec<String> {
        let walker = WalkBuilder::new(base)
            .hidden(!self.include_hidden)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .sort_by_file_path(|a, b| a.cmp(b))
            .build();

        let mut entries = Vec::new();
        for result in walker {
            match result {
                Ok(entry) => {
                    if entry.file_type().is_some_and(|t| t.is_file()) {
                        entries.push(entry.path().to_string_lossy().into_owned());
                    }
                }
                Err(err) => {
                    tracing::debug!("skipping unreadable entry under {}: {}", base.display(), err);
                }
            }
        }
        entries
    }
}

impl IndexSource for FsSource {
    fn enumerate(&self, root: &Root) -> Vec<String> {
        let base = Path::new(&root.base_path);
        if !base.is_dir() {
            tracing::warn!("root {} is not a directory", base.display());
            return Vec::new();
        }
        self.walk(base)
    }

    fn should_skip(&self, entry: &str) -> bool {
        self.skip.is_match(entry)
    }

    fn split_components(&self, entry: &str, _entry_index: EntryIndex) -> Vec<String> {
        split_components(entry)
    }

    fn resolve_index_path(&self, base_path: &str, is_temp: bool) -> Option<PathBuf> {
        self.index_dir
            .as_ref()
            .map(|dir| index_file_path(dir, base_path, is_temp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_fs_source_enumerates_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Scripts")).unwrap();
        fs::write(dir.path().join("Scripts/b.ext"), b"").unwrap();
        fs::write(dir.path().join("Scripts/a.ext"), b"").unwrap();
        fs::write(dir.path().join("top.ext"), b"").unwrap();

        let source = FsSource::new(&[], None).unwrap();
        let root = Root::bare(dir.path().to_string_lossy());
        let entries = source.enumerate(&root);

        let names: Vec<_> = entries
            .iter()
            .map(|e| e.replace('\\', "/").rsplit('/').next().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.ext", "b.ext", "top.ext"]);
    }

    #[test]
    fn test_fs_source_missing_root() {
        let source = FsSource::new(&[], None).unwrap();
        assert!(source.enumerate(&Root::bare("/definitely/not/here")).is_empty());
    }

    #[test]
    fn test_fs_source_skip_globs() {
        let source = FsSource::new(&["**/*.meta".to_string()], None).unwrap();
        assert!(source.should_skip("Scripts/Player.cs.meta"));
        assert!(!source.should_skip("Scripts/Player.cs"));
    }

    #[test]
    fn test_fs_source_invalid_glob() {
        assert!(FsSource::new(&["[".to_string()], None).is_err());
    }

    #[test]
    fn test_fs_source_index_path() {
        let source = FsSource::new(&[], None).unwrap();
        assert!(source.resolve_index_path("Assets", false).is_none());

        let source = FsSource::new(&[], Some(PathBuf::from("/tmp/idx"))).unwrap();
        let path = source.resolve_index_path("Assets", true).unwrap();
        assert!(path.starts_with("/tmp/idx"));
    }
}
