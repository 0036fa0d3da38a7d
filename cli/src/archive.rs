use crate::error::{KitError, KitResult};
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek};
use std::path::{Component, Path, PathBuf};
use zip::ZipArchive;

/// One entry of the archive, with the hosting service's top-level folder stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveEntry {
    pub raw_name: String,
    pub is_directory: bool,
    /// `None` when nothing is left after stripping (the top-level folder itself).
    pub relative: Option<PathBuf>,
    pub unix_mode: Option<u32>,
}

/// A relative path that is guaranteed to stay inside `root`.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetPath<'a> {
    pub root: &'a Path,
    pub relative: &'a Path,
}

impl TargetPath<'_> {
    pub fn resolve(&self) -> PathBuf {
        let path = self.root.join(self.relative);
        debug_assert!(path.starts_with(self.root));
        path
    }
}

/// Turns a stored entry name into a path relative to the install root.
///
/// GitHub (and friends) wrap everything in `<repo>-<ref>/`, so the first
/// segment is dropped. Empty and `.` segments are ignored. `..`, absolute
/// pieces and drive prefixes are rejected outright instead of normalized.
pub fn relative_path(raw_name: &str) -> KitResult<Option<PathBuf>> {
    let Some((_, rest)) = raw_name.split_once('/') else {
        return Ok(None);
    };

    let mut relative = PathBuf::new();
    for segment in rest.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) => relative.push(part),
            _ => return Err(KitError::PathTraversal(raw_name.to_string())),
        }
    }

    if relative.as_os_str().is_empty() {
        Ok(None)
    } else {
        Ok(Some(relative))
    }
}

/// Walks a zip archive one entry at a time.
///
/// Only the central directory is read up front. Each call to `advance` opens
/// the next entry, and the previous one has to be dropped first, so at most
/// one payload is ever open.
pub struct EntryCursor<R: Read + Seek> {
    archive: ZipArchive<R>,
    next: usize,
}

impl<R: Read + Seek> EntryCursor<R> {
    pub fn new(reader: R) -> KitResult<Self> {
        let archive = ZipArchive::new(reader)
            .map_err(|e| KitError::Archive(format!("could not open archive: {}", e)))?;
        Ok(Self { archive, next: 0 })
    }

    fn len(&self) -> usize {
        self.archive.len()
    }

    /// Moves to the next entry and hands back its metadata plus a reader for its bytes.
    pub fn advance(&mut self) -> Option<KitResult<(ArchiveEntry, impl Read + '_)>> {
        if self.next >= self.archive.len() {
            return None;
        }
        let index = self.next;
        self.next += 1;

        let file = match self.archive.by_index(index) {
            Ok(file) => file,
            Err(e) => {
                return Some(Err(KitError::Archive(format!(
                    "could not read entry #{}: {}",
                    index, e
                ))));
            }
        };

        let raw_name = file.name().to_string();
        let relative = match relative_path(&raw_name) {
            Ok(relative) => relative,
            Err(e) => return Some(Err(e)),
        };

        let entry = ArchiveEntry {
            is_directory: raw_name.ends_with('/'),
            relative,
            unix_mode: file.unix_mode(),
            raw_name,
        };

        Some(Ok((entry, file)))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MaterializeSummary {
    pub directories: usize,
    pub files: usize,
    pub skipped: usize,
}

/// Extracts the archive at `archive_path` into `root`.
///
/// Strictly sequential: an entry is fully written before the next one is read.
/// Any failure aborts the whole extraction; whatever was already written stays.
pub fn materialize(archive_path: &Path, root: &Path) -> KitResult<MaterializeSummary> {
    let file = File::open(archive_path)
        .map_err(|e| KitError::Archive(format!("could not open {}: {}", archive_path.display(), e)))?;
    let mut cursor = EntryCursor::new(BufReader::new(file))?;
    log::debug!("archive has {} entries", cursor.len());

    let mut summary = MaterializeSummary::default();

    while let Some(next) = cursor.advance() {
        let (entry, mut payload) = next?;

        let Some(relative) = entry.relative.as_deref() else {
            log::trace!("skipping {}", entry.raw_name);
            summary.skipped += 1;
            continue;
        };
        let dest = TargetPath { root, relative }.resolve();

        if entry.is_directory {
            fs::create_dir_all(&dest).map_err(|e| KitError::fs(&dest, e))?;
            summary.directories += 1;
            continue;
        }

        // Archives don't have to list directories, so make sure the parent exists.
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| KitError::fs(parent, e))?;
        }

        let mut out = File::create(&dest).map_err(|e| KitError::fs(&dest, e))?;
        io::copy(&mut payload, &mut out).map_err(|e| KitError::fs(&dest, e))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode {
            apply_exec_bits(&dest, mode)?;
        }

        log::trace!("wrote {}", dest.display());
        summary.files += 1;
    }

    Ok(summary)
}

/// Carries over the executable bits only; the umask decides the rest.
#[cfg(unix)]
fn apply_exec_bits(path: &Path, mode: u32) -> KitResult<()> {
    use std::os::unix::fs::PermissionsExt;

    let exec = mode & 0o111;
    if exec == 0 {
        return Ok(());
    }
    let mut perms = fs::metadata(path).map_err(|e| KitError::fs(path, e))?.permissions();
    perms.set_mode(perms.mode() | exec);
    fs::set_permissions(path, perms).map_err(|e| KitError::fs(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::FileOptions;

    enum Item<'a> {
        Dir(&'a str),
        File(&'a str, &'a str),
    }

    fn build_archive(dir: &Path, items: &[Item]) -> PathBuf {
        let path = dir.join("kit.zip");
        let file = File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options: FileOptions<'_, ()> = FileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .unix_permissions(0o644);

        for item in items {
            match item {
                Item::Dir(name) => zip.add_directory(*name, options).unwrap(),
                Item::File(name, content) => {
                    zip.start_file(*name, options).unwrap();
                    zip.write_all(content.as_bytes()).unwrap();
                }
            }
        }
        zip.finish().unwrap();
        path
    }

    fn setup() -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("app");
        fs::create_dir(&root).unwrap();
        (tmp, root)
    }

    #[test]
    fn test_relative_path_strips_first_segment() {
        assert_eq!(
            relative_path("kit-master/src/index.js").unwrap(),
            Some(PathBuf::from("src").join("index.js"))
        );
        assert_eq!(relative_path("kit-master/src/").unwrap(), Some(PathBuf::from("src")));
        assert_eq!(relative_path("kit-master/./a//b").unwrap(), Some(PathBuf::from("a").join("b")));
    }

    #[test]
    fn test_relative_path_empty_is_none() {
        assert_eq!(relative_path("kit-master/").unwrap(), None);
        assert_eq!(relative_path("kit-master").unwrap(), None);
        assert_eq!(relative_path("kit-master/./").unwrap(), None);
    }

    #[test]
    fn test_relative_path_rejects_parent_segments() {
        assert!(matches!(
            relative_path("kit-master/../../etc/passwd"),
            Err(KitError::PathTraversal(_))
        ));
        assert!(matches!(
            relative_path("kit-master/src/../../x"),
            Err(KitError::PathTraversal(_))
        ));
    }

    #[test]
    fn test_leading_slash_stays_inside_root() {
        // The empty segment before the slash is the one that gets dropped.
        assert_eq!(
            relative_path("/etc/passwd").unwrap(),
            Some(PathBuf::from("etc").join("passwd"))
        );
    }

    #[test]
    fn test_readme_lands_at_root() {
        let (tmp, root) = setup();
        let archive = build_archive(tmp.path(), &[Item::File("kit-master/README.md", "# Kit")]);

        let summary = materialize(&archive, &root).unwrap();
        assert_eq!(fs::read_to_string(root.join("README.md")).unwrap(), "# Kit");
        assert_eq!(summary.files, 1);
    }

    #[test]
    fn test_directory_then_nested_file() {
        let (tmp, root) = setup();
        let archive = build_archive(
            tmp.path(),
            &[
                Item::Dir("kit-master/"),
                Item::Dir("kit-master/src/"),
                Item::File("kit-master/src/index.js", "console.log('hi');"),
            ],
        );

        let summary = materialize(&archive, &root).unwrap();
        assert!(root.join("src").is_dir());
        assert_eq!(
            fs::read_to_string(root.join("src/index.js")).unwrap(),
            "console.log('hi');"
        );
        assert_eq!(
            summary,
            MaterializeSummary {
                directories: 1,
                files: 1,
                skipped: 1
            }
        );
    }

    #[test]
    fn test_file_without_directory_entries() {
        let (tmp, root) = setup();
        let archive = build_archive(
            tmp.path(),
            &[
                Item::File("kit-master/a/b/c.txt", "deep"),
                Item::Dir("kit-master/a/b/"),
            ],
        );

        materialize(&archive, &root).unwrap();
        assert_eq!(fs::read_to_string(root.join("a/b/c.txt")).unwrap(), "deep");
    }

    #[test]
    fn test_top_level_folder_creates_nothing() {
        let (tmp, root) = setup();
        let archive = build_archive(tmp.path(), &[Item::Dir("kit-master/")]);

        let summary = materialize(&archive, &root).unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(fs::read_dir(&root).unwrap().count(), 0);
    }

    #[test]
    fn test_traversal_entry_is_rejected() {
        let (tmp, root) = setup();
        let archive = build_archive(
            tmp.path(),
            &[Item::File("kit-master/../../evil.txt", "gotcha")],
        );

        let err = materialize(&archive, &root).unwrap_err();
        assert!(matches!(err, KitError::PathTraversal(_)));
        assert!(!tmp.path().join("evil.txt").exists());
    }

    #[test]
    fn test_not_a_zip() {
        let (tmp, root) = setup();
        let bogus = tmp.path().join("bogus.zip");
        fs::write(&bogus, "definitely not a zip").unwrap();

        assert!(matches!(materialize(&bogus, &root), Err(KitError::Archive(_))));
    }

    #[test]
    fn test_cursor_yields_entries_in_order() {
        let tmp = TempDir::new().unwrap();
        let archive = build_archive(
            tmp.path(),
            &[
                Item::Dir("kit-master/"),
                Item::File("kit-master/package.json", "{}"),
            ],
        );
        let mut cursor = EntryCursor::new(File::open(archive).unwrap()).unwrap();
        assert_eq!(cursor.len(), 2);

        let names: Vec<(String, bool)> = std::iter::from_fn(|| {
            cursor
                .advance()
                .map(|next| next.map(|(entry, _)| (entry.raw_name, entry.is_directory)).unwrap())
        })
        .collect();
        assert_eq!(
            names,
            vec![
                ("kit-master/".to_string(), true),
                ("kit-master/package.json".to_string(), false)
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_executable_bit_survives() {
        use std::os::unix::fs::PermissionsExt;

        let (tmp, root) = setup();
        let path = tmp.path().join("kit.zip");
        {
            let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
            let options: FileOptions<'_, ()> = FileOptions::default().unix_permissions(0o755);
            zip.start_file("kit-master/bin/run.sh", options).unwrap();
            zip.write_all(b"#!/bin/sh\n").unwrap();
            zip.finish().unwrap();
        }

        materialize(&path, &root).unwrap();
        let mode = fs::metadata(root.join("bin/run.sh")).unwrap().permissions().mode();
        assert_ne!(mode & 0o111, 0);
    }
}
