//! Output path derivation for extracted components.
//!
//! A reference name such as `sub/dir/file-oval.xml` is split into a relative
//! directory and a file name. The directory is joined onto the target base
//! and created (like `mkdir -p`); the file name is joined onto that.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Longest directory path, in bytes, that will be created.
pub const MAX_PATH_LEN: usize = 4096;

/// A resolved output location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPath {
    /// Directory holding the file. Catalog entries of the same component are
    /// resolved relative to it.
    pub dir: PathBuf,
    /// Full path of the file to write.
    pub file: PathBuf,
}

/// Resolve `name` below `base` and make sure its directory exists.
pub fn resolve_output_path(base: &Path, name: &str) -> Result<OutputPath> {
    let (rel_dir, file_name) = split_name(name)?;
    let dir = if rel_dir.as_os_str().is_empty() {
        base.to_path_buf()
    } else {
        base.join(rel_dir)
    };
    ensure_dir(&dir)?;
    let file = dir.join(file_name);
    Ok(OutputPath { dir, file })
}

/// Split a reference name into its relative directory and file name.
///
/// Root and `.` components are dropped so the result always stays relative
/// to the target base.
pub fn split_name(name: &str) -> Result<(PathBuf, String)> {
    if name.is_empty() || name.ends_with('/') {
        return Err(Error::InvalidOutputName(name.to_string()));
    }

    let mut parts: Vec<Component<'_>> = Path::new(name)
        .components()
        .filter(|c| matches!(c, Component::Normal(_) | Component::ParentDir))
        .collect();

    let file_name = match parts.pop() {
        Some(Component::Normal(file)) => file.to_string_lossy().into_owned(),
        _ => return Err(Error::InvalidOutputName(name.to_string())),
    };

    Ok((parts.iter().collect(), file_name))
}

/// Create `dir` and all missing parents, owner-only permissions.
/// Succeeds if the directory already exists.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().len() > MAX_PATH_LEN {
        return Err(Error::PathTooLong {
            path: dir.to_path_buf(),
            max: MAX_PATH_LEN,
        });
    }

    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }

    builder.create(dir).map_err(|e| Error::Write {
        path: dir.to_path_buf(),
        source: Box::new(Error::Io(e)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_split_name() {
        assert_eq!(
            split_name("sub/dir/file-oval.xml").unwrap(),
            (PathBuf::from("sub/dir"), "file-oval.xml".to_string())
        );
        assert_eq!(
            split_name("file.xml").unwrap(),
            (PathBuf::new(), "file.xml".to_string())
        );
        assert_eq!(
            split_name("./a/./b.xml").unwrap(),
            (PathBuf::from("a"), "b.xml".to_string())
        );
        assert_eq!(
            split_name("/abs/c.xml").unwrap(),
            (PathBuf::from("abs"), "c.xml".to_string())
        );
    }

    #[test]
    fn test_split_name_rejects_directories() {
        assert!(split_name("").is_err());
        assert!(split_name("dir/").is_err());
        assert!(split_name("..").is_err());
        assert!(split_name(".").is_err());
    }

    #[test]
    fn test_resolve_creates_directories() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("out");

        let out = resolve_output_path(&base, "sub/dir/file-oval.xml").unwrap();
        assert_eq!(out.dir, base.join("sub/dir"));
        assert_eq!(out.file, base.join("sub/dir/file-oval.xml"));
        assert!(out.dir.is_dir());
        assert!(!out.file.exists());

        // Idempotent.
        let again = resolve_output_path(&base, "sub/dir/file-oval.xml").unwrap();
        assert_eq!(again, out);
    }

    #[cfg(unix)]
    #[test]
    fn test_created_directories_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let out = resolve_output_path(tmp.path(), "private/x.xml").unwrap();
        let mode = std::fs::metadata(&out.dir).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }

    #[test]
    fn test_path_too_long() {
        let tmp = TempDir::new().unwrap();
        let long = "d/".repeat(MAX_PATH_LEN) + "f.xml";

        let err = resolve_output_path(tmp.path(), &long).unwrap_err();
        assert!(matches!(err, Error::PathTooLong { max: MAX_PATH_LEN, .. }));
        assert!(!err.is_fatal());
    }

    proptest! {
        #[test]
        fn prop_split_name_rejoins(
            dirs in proptest::collection::vec("[a-z0-9_-]{1,8}", 0..4),
            file in "[a-z0-9_-]{1,8}\\.xml",
        ) {
            let name = dirs.iter().cloned().chain(std::iter::once(file.clone())).collect::<Vec<_>>().join("/");
            let (dir, base) = split_name(&name).unwrap();
            prop_assert_eq!(base, file);
            prop_assert_eq!(dir, dirs.iter().collect::<PathBuf>());
        }
    }
}
