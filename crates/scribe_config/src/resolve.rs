//! Resolution of the on-disk cache location.

use std::path::{Path, PathBuf};

use crate::types::CacheSettings;

/// Resolves the cache record path for a project.
///
/// A relative `directory` is joined onto `project_root`; an absolute one is
/// used as is. The directory does not need to exist yet.
pub fn resolve_cache_path(project_root: &Path, settings: &CacheSettings) -> PathBuf {
    let dir = Path::new(&settings.directory);
    let dir = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        project_root.join(dir)
    };
    dir.join(&settings.file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_directory_joins_root() {
        let settings = CacheSettings::default();
        let path = resolve_cache_path(Path::new("/work/docs"), &settings);
        assert_eq!(
            path,
            PathBuf::from("/work/docs/.scribe-cache/documents.json")
        );
    }

    #[test]
    fn absolute_directory_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = CacheSettings {
            directory: tmp.path().display().to_string(),
            ..CacheSettings::default()
        };
        let path = resolve_cache_path(Path::new("/work/docs"), &settings);
        assert_eq!(path, tmp.path().join("documents.json"));
    }
}
