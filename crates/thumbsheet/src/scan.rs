//! Recursive directory scanning
//!
//! Files of a directory are yielded before its subdirectories are entered;
//! otherwise entries come in the order the filesystem lists them.

use std::path::{Path, PathBuf};

use log::trace;
use walkdir::{DirEntry, WalkDir};

use crate::error::{Error, Result};

/// A file discovered by the [`Scanner`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// Absolute path
    pub path: PathBuf,
    /// Final path segment, shown in the workbook
    pub name: String,
}

/// Lazy recursive walk yielding files whose name ends with an extension.
///
/// The match is case-sensitive: with `".jpg"`, `photo.JPG` is not yielded.
/// Symlinks to files are yielded, as are dangling symlinks; symlinked
/// directories are not followed.
///
/// ```no_run
/// use thumbsheet::scan::Scanner;
///
/// for file in Scanner::new("photos", ".jpg")? {
///     println!("{}", file?.name);
/// }
/// # Ok::<(), thumbsheet::Error>(())
/// ```
pub struct Scanner {
    root: PathBuf,
    extension: String,
    inner: walkdir::IntoIter,
}

impl Scanner {
    /// Start scanning `root` for files ending with `extension`
    pub fn new<P: AsRef<Path>, S: Into<String>>(root: P, extension: S) -> Result<Self> {
        let root = root.as_ref();
        let root = root
            .canonicalize()
            .map_err(|source| Error::io(root, source))?;
        if !root.is_dir() {
            return Err(Error::NotADirectory(root));
        }

        let inner = WalkDir::new(&root)
            .follow_links(false)
            .sort_by(|a, b| a.file_type().is_dir().cmp(&b.file_type().is_dir()))
            .into_iter();

        Ok(Self {
            root,
            extension: extension.into(),
            inner,
        })
    }

    /// The canonicalized root being scanned
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn matches(&self, entry: &DirEntry) -> bool {
        let is_file = if entry.path_is_symlink() {
            // Dangling links count as files; opening them fails later
            entry.path().metadata().map_or(true, |m| !m.is_dir())
        } else {
            entry.file_type().is_file()
        };
        is_file
            && entry
                .file_name()
                .to_string_lossy()
                .ends_with(self.extension.as_str())
    }
}

impl Iterator for Scanner {
    type Item = Result<ScannedFile>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(err) => return Some(Err(Error::Scan(err))),
            };

            if !self.matches(&entry) {
                trace!("skipping {}", entry.path().display());
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            return Some(Ok(ScannedFile {
                path: entry.into_path(),
                name,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn names(scanner: Scanner) -> Vec<String> {
        let mut names: Vec<String> = scanner.map(|f| f.unwrap().name).collect();
        names.sort();
        names
    }

    #[test]
    fn test_matches_extension_recursively() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), b"").unwrap();
        fs::write(dir.path().join("b.JPG"), b"").unwrap();
        fs::write(dir.path().join("c.txt"), b"").unwrap();
        fs::write(dir.path().join("d.jpg.bak"), b"").unwrap();
        fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        fs::write(dir.path().join("sub/e.jpg"), b"").unwrap();
        fs::write(dir.path().join("sub/deeper/f.jpg"), b"").unwrap();
        fs::create_dir(dir.path().join("dir.jpg")).unwrap();

        let scanner = Scanner::new(dir.path(), ".jpg").unwrap();
        assert_eq!(names(scanner), vec!["a.jpg", "e.jpg", "f.jpg"]);
    }

    #[test]
    fn test_paths_are_absolute() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), b"").unwrap();

        let files: Vec<ScannedFile> = Scanner::new(dir.path(), ".jpg")
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].path.is_absolute());
        assert!(files[0].path.ends_with("a.jpg"));
    }

    #[test]
    fn test_files_before_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/inner.jpg"), b"").unwrap();
        fs::write(dir.path().join("top.jpg"), b"").unwrap();

        let order: Vec<String> = Scanner::new(dir.path(), ".jpg")
            .unwrap()
            .map(|f| f.unwrap().name)
            .collect();
        assert_eq!(order, vec!["top.jpg", "inner.jpg"]);
    }

    #[test]
    fn test_empty_and_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Scanner::new(dir.path(), ".jpg").unwrap().count(), 0);

        assert!(matches!(
            Scanner::new(dir.path().join("missing"), ".jpg"),
            Err(Error::Io { .. })
        ));

        let file = dir.path().join("a.jpg");
        fs::write(&file, b"").unwrap();
        assert!(matches!(
            Scanner::new(&file, ".jpg"),
            Err(Error::NotADirectory(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("linked.jpg"), b"").unwrap();
        fs::write(outside.path().join("target.jpg"), b"").unwrap();

        std::os::unix::fs::symlink(outside.path(), dir.path().join("linkdir")).unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("target.jpg"),
            dir.path().join("alias.jpg"),
        )
        .unwrap();

        std::os::unix::fs::symlink(
            outside.path().join("missing.jpg"),
            dir.path().join("dangling.jpg"),
        )
        .unwrap();

        let scanner = Scanner::new(dir.path(), ".jpg").unwrap();
        assert_eq!(names(scanner), vec!["alias.jpg", "dangling.jpg"]);
    }
}
