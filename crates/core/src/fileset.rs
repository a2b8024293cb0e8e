use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::CheckError;

/// Ordered list of files whose contents feed one aggregate digest.
///
/// Order is `PathBuf` ordering (component-wise lexicographic), independent of
/// what the filesystem reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    files: Vec<PathBuf>,
}

impl FileSet {
    /// A single file yields itself; a directory yields its regular files,
    /// immediate children only unless `recursive`.
    pub fn resolve(target: &Path, recursive: bool) -> Result<Self, CheckError> {
        let meta = fs::metadata(target).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => CheckError::NotFound {
                path: target.to_path_buf(),
            },
            _ => CheckError::io(format!("stat {}", target.display()), e),
        })?;

        if meta.is_file() {
            return Ok(Self {
                files: vec![target.to_path_buf()],
            });
        }
        // FIFOs, sockets and devices can block or never end.
        if !meta.is_dir() {
            return Err(CheckError::InvalidArgument(format!(
                "{} is not a regular file or directory",
                target.display()
            )));
        }

        let mut walker = WalkDir::new(target).min_depth(1).follow_links(false);
        if !recursive {
            walker = walker.max_depth(1);
        }

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| {
                let context = match e.path() {
                    Some(p) => format!("walk {}", p.display()),
                    None => format!("walk {}", target.display()),
                };
                CheckError::io(context, e.into())
            })?;

            // Symlinks count when they point at a regular file.
            let is_file = entry.file_type().is_file()
                || (entry.path_is_symlink() && entry.path().is_file());
            if is_file {
                files.push(entry.into_path());
            }
        }

        files.sort();
        Ok(Self { files })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(PathBuf::as_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), b"b").unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("c.txt"), b"c").unwrap();
        dir
    }

    fn names(set: &FileSet, root: &Path) -> Vec<String> {
        set.iter()
            .map(|p| p.strip_prefix(root).unwrap().display().to_string())
            .collect()
    }

    #[test]
    fn single_file_is_its_own_set() {
        let dir = layout();
        let f = dir.path().join("a.txt");
        let set = FileSet::resolve(&f, true).unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![f.as_path()]);
    }

    #[test]
    fn shallow_listing_skips_subdirectories() {
        let dir = layout();
        let set = FileSet::resolve(dir.path(), false).unwrap();
        assert_eq!(names(&set, dir.path()), vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn recursive_listing_is_sorted() {
        let dir = layout();
        let set = FileSet::resolve(dir.path(), true).unwrap();
        let expected = vec![
            "a.txt".to_string(),
            "b.txt".to_string(),
            Path::new("sub").join("c.txt").display().to_string(),
        ];
        assert_eq!(names(&set, dir.path()), expected);
    }

    #[cfg(unix)]
    #[test]
    fn fifo_target_is_rejected_without_opening() {
        let dir = tempfile::tempdir().unwrap();
        let fifo = dir.path().join("pipe");
        let status = std::process::Command::new("mkfifo")
            .arg(&fifo)
            .status()
            .unwrap();
        assert!(status.success());

        let err = FileSet::resolve(&fifo, false).unwrap_err();
        assert!(matches!(err, CheckError::InvalidArgument(_)));
        assert!(err.to_string().contains("not a regular file or directory"));

        // inside a directory it is simply skipped
        let set = FileSet::resolve(dir.path(), true).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn empty_directory_gives_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let set = FileSet::resolve(dir.path(), true).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn missing_target_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileSet::resolve(&dir.path().join("gone"), false).unwrap_err();
        assert!(matches!(err, CheckError::NotFound { .. }));
    }
}
