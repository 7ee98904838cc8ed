use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Component, Path, PathBuf};

use log::{debug, info};
use zip::ZipArchive;

use crate::error::{AdoError, Result};

const ARCHIVE_EXTENSION: &str = "zip";

#[cfg(unix)]
const DEFAULT_FILE_MODE: u32 = 0o666;

/// Lists the `*.zip` files directly inside `dir`, sorted by name.
pub fn list_archives(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(AdoError::file("failed to read directory", dir))?;

    let mut archives = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(AdoError::file("failed to read directory", dir))?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == ARCHIVE_EXTENSION) {
            archives.push(path);
        }
    }
    archives.sort();
    Ok(archives)
}

/// Extracts every archive in `dir` into `dir` itself.
///
/// Stops at the first failure, leaving whatever was extracted so far and all
/// archives in place.
pub fn extract_archives(dir: &Path) -> Result<usize> {
    let archives = list_archives(dir)?;
    for archive in &archives {
        info!("Unzipping file {}", archive.display());
        unzip(archive, dir)?;
    }
    Ok(archives.len())
}

/// Deletes every archive in `dir`. Run only after all of them were extracted.
pub fn remove_archives(dir: &Path) -> Result<usize> {
    let archives = list_archives(dir)?;
    for archive in &archives {
        fs::remove_file(archive).map_err(AdoError::file("error removing zip file", archive))?;
    }
    debug!("Removed {} archives from {}", archives.len(), dir.display());
    Ok(archives.len())
}

/// Extracts `archive` below `root`, rejecting entries that would land outside it.
pub fn unzip(archive: &Path, root: &Path) -> Result<()> {
    let file = File::open(archive).map_err(AdoError::file("failed to open archive", archive))?;
    let zip_error = |source| AdoError::Zip {
        archive: archive.to_path_buf(),
        source,
    };
    let mut zip = ZipArchive::new(file).map_err(zip_error)?;

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(zip_error)?;
        let destination =
            enclosed_path(root, entry.name()).ok_or_else(|| AdoError::UnsafeArchiveEntry {
                archive: archive.to_path_buf(),
                entry: entry.name().to_string(),
            })?;

        if entry.is_dir() {
            fs::create_dir_all(&destination)
                .map_err(AdoError::file("failed to create directory", &destination))?;
            continue;
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .map_err(AdoError::file("failed to create directory", parent))?;
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(entry.unix_mode().map_or(DEFAULT_FILE_MODE, |mode| mode & 0o7777));
        }

        let mut output = options
            .open(&destination)
            .map_err(AdoError::file("failed to create file", &destination))?;
        io::copy(&mut entry, &mut output)
            .map_err(AdoError::file("failed to extract file", &destination))?;

        debug!("Extracted {}", destination.display());
    }

    Ok(())
}

/// Joins an archive entry name onto `root`, resolving `.` and `..` lexically.
///
/// Returns `None` for absolute names and for names that resolve to `root`
/// itself or to anything outside it.
pub fn enclosed_path(root: &Path, entry_name: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();

    for component in Path::new(entry_name).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !relative.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if relative.as_os_str().is_empty() {
        return None;
    }

    Some(root.join(relative))
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    use super::*;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, content) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, options.clone()).unwrap();
            } else {
                writer.start_file(*name, options.clone()).unwrap();
                writer.write_all(content.as_bytes()).unwrap();
            }
        }
        let bytes = writer.finish().unwrap().into_inner();
        fs::write(path, bytes).unwrap();
    }

    mod enclosed_path {
        use super::*;

        #[test]
        fn joins_plain_names() {
            assert_eq!(
                enclosed_path(Path::new("out"), "bin/app.dll"),
                Some(PathBuf::from("out/bin/app.dll"))
            );
        }

        #[test]
        fn resolves_inner_parent_references() {
            assert_eq!(
                enclosed_path(Path::new("out"), "bin/../lib/./x.so"),
                Some(PathBuf::from("out/lib/x.so"))
            );
        }

        #[test]
        fn rejects_parent_escapes() {
            assert_eq!(enclosed_path(Path::new("out"), "../../evil"), None);
            assert_eq!(enclosed_path(Path::new("out"), "bin/../../evil"), None);
        }

        #[test]
        fn rejects_absolute_names() {
            assert_eq!(enclosed_path(Path::new("out"), "/etc/passwd"), None);
        }

        #[test]
        fn rejects_the_root_itself() {
            assert_eq!(enclosed_path(Path::new("out"), "./"), None);
            assert_eq!(enclosed_path(Path::new("out"), "bin/.."), None);
        }
    }

    #[test]
    fn extracts_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        write_zip(
            &dir.path().join("drop.zip"),
            &[("bin/", ""), ("bin/app.txt", "hello"), ("readme.md", "docs")],
        );

        assert_eq!(extract_archives(dir.path()).unwrap(), 1);

        assert_eq!(fs::read(dir.path().join("bin/app.txt")).unwrap(), b"hello");
        assert_eq!(fs::read(dir.path().join("readme.md")).unwrap(), b"docs");
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        write_zip(&dir.path().join("drop.zip"), &[("a/b/c.txt", "deep")]);

        extract_archives(dir.path()).unwrap();

        assert_eq!(fs::read(dir.path().join("a/b/c.txt")).unwrap(), b"deep");
    }

    #[test]
    fn truncates_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.txt"), "a much longer previous content").unwrap();
        write_zip(&dir.path().join("drop.zip"), &[("app.txt", "new")]);

        extract_archives(dir.path()).unwrap();

        assert_eq!(fs::read(dir.path().join("app.txt")).unwrap(), b"new");
    }

    #[test]
    fn rejects_zip_slip_without_writing_outside() {
        let parent = tempfile::tempdir().unwrap();
        let dir = parent.path().join("resource");
        fs::create_dir(&dir).unwrap();
        write_zip(&dir.join("evil.zip"), &[("../../evil", "pwned")]);

        let err = extract_archives(&dir).unwrap_err();

        assert!(matches!(err, AdoError::UnsafeArchiveEntry { .. }));
        assert!(err.to_string().contains("../../evil"));
        assert!(!parent.path().join("evil").exists());
        assert!(dir.join("evil.zip").exists());
    }

    #[test]
    fn corrupt_archive_is_a_zip_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.zip"), "not a zip").unwrap();

        assert!(matches!(
            extract_archives(dir.path()),
            Err(AdoError::Zip { .. })
        ));
    }

    #[test]
    fn remove_archives_keeps_other_files() {
        let dir = tempfile::tempdir().unwrap();
        write_zip(&dir.path().join("a.zip"), &[("x.txt", "x")]);
        write_zip(&dir.path().join("b.zip"), &[("y.txt", "y")]);
        fs::write(dir.path().join("keep.txt"), "keep").unwrap();

        assert_eq!(remove_archives(dir.path()).unwrap(), 2);

        assert!(!dir.path().join("a.zip").exists());
        assert!(!dir.path().join("b.zip").exists());
        assert!(dir.path().join("keep.txt").exists());
    }

    #[test]
    fn lists_only_zip_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.zip"), "").unwrap();
        fs::write(dir.path().join("a.zip"), "").unwrap();
        fs::write(dir.path().join("c.txt"), "").unwrap();
        fs::create_dir(dir.path().join("d.zip")).unwrap();

        let names: Vec<_> = list_archives(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a.zip", "b.zip"]);
    }

    #[cfg(unix)]
    #[test]
    fn applies_stored_unix_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(
                "run.sh",
                SimpleFileOptions::default()
                    .compression_method(CompressionMethod::Stored)
                    .unix_permissions(0o700),
            )
            .unwrap();
        writer.write_all(b"#!/bin/sh\n").unwrap();
        fs::write(
            dir.path().join("drop.zip"),
            writer.finish().unwrap().into_inner(),
        )
        .unwrap();

        extract_archives(dir.path()).unwrap();

        let mode = fs::metadata(dir.path().join("run.sh"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}
