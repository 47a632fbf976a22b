use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};

use zip::ZipArchive;

use super::error::{Context, Result};

/// Folders that archiving tools add and that never contain anything we want.
const IGNORED_ENTRIES: &[&str] = &["__MACOSX"];

/// Extracts the zip at `archive` into `dest`. Returns the number of files written. Entries whose
/// paths would land outside `dest` are skipped.
pub fn extract(archive: &Path, dest: &Path) -> Result<usize> {
    let file = File::open(archive).context(format!("unable to open {}", archive.display()))?;
    let mut zip = ZipArchive::new(file).context("the downloaded archive is not a valid zip")?;

    let mut written = 0;

    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .context("the downloaded archive is damaged")?;

        let relative = match entry.enclosed_name() {
            Some(path) => path.to_path_buf(),
            None => {
                log::warn!("skipping unsafe archive entry {:?}", entry.name());
                continue;
            }
        };

        let out_path = dest.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .context(format!("unable to create {}", out_path.display()))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .context(format!("unable to create {}", parent.display()))?;
        }

        let mut out = File::create(&out_path)
            .context(format!("unable to create {}", out_path.display()))?;

        io::copy(&mut entry, &mut out)
            .context(format!("unable to extract {}", relative.display()))?;

        written += 1;
    }

    log::info!("extracted {} file(s) to {}", written, dest.display());
    Ok(written)
}

/// Finds the folder holding the release's files. Release archives usually wrap everything in one
/// top-level folder; if that's the only thing at the top, we use it, otherwise `dir` itself.
pub fn find_content_root(dir: &Path) -> Result<PathBuf> {
    let entries = fs::read_dir(dir)
        .context(format!("unable to read {}", dir.display()))?
        .collect::<io::Result<Vec<_>>>()
        .context(format!("unable to read {}", dir.display()))?;

    let mut top_level = entries.iter().filter(|entry| {
        !IGNORED_ENTRIES
            .iter()
            .any(|ignored| entry.file_name() == **ignored)
    });

    match (top_level.next(), top_level.next()) {
        (Some(only), None) if only.path().is_dir() => Ok(only.path()),
        _ => Ok(dir.to_path_buf()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    /// Writes a zip at `path` containing `files` (path, contents).
    pub(crate) fn write_zip(path: &Path, files: &[(&str, &str)]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());

        for (name, contents) in files {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(contents.as_bytes()).unwrap();
        }

        zip.finish().unwrap();
    }

    #[test]
    fn extracts_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("release.zip");
        write_zip(
            &archive,
            &[
                ("AccessibilityMod/AccessibilityMod.dll", "plugin"),
                ("AccessibilityMod/data/Details/GS1/1.txt", "badge"),
            ],
        );

        let out = dir.path().join("out");
        assert_eq!(extract(&archive, &out).unwrap(), 2);

        assert_eq!(
            fs::read_to_string(out.join("AccessibilityMod/data/Details/GS1/1.txt")).unwrap(),
            "badge"
        );
        assert_eq!(
            find_content_root(&out).unwrap(),
            out.join("AccessibilityMod")
        );
    }

    #[test]
    fn flat_archive_uses_extraction_root() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("release.zip");
        write_zip(
            &archive,
            &[("AccessibilityMod.dll", "plugin"), ("Tolk.dll", "tolk")],
        );

        let out = dir.path().join("out");
        extract(&archive, &out).unwrap();

        assert_eq!(find_content_root(&out).unwrap(), out);
    }

    #[test]
    fn single_file_is_not_a_wrapper() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("AccessibilityMod.dll"), "plugin").unwrap();

        assert_eq!(find_content_root(dir.path()).unwrap(), dir.path());
    }

    #[test]
    fn macos_metadata_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("__MACOSX")).unwrap();
        fs::create_dir_all(dir.path().join("release")).unwrap();

        assert_eq!(
            find_content_root(dir.path()).unwrap(),
            dir.path().join("release")
        );
    }

    #[test]
    fn unsafe_paths_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("evil.zip");
        write_zip(&archive, &[("../escape.txt", "nope"), ("ok.txt", "fine")]);

        let out = dir.path().join("out");
        assert_eq!(extract(&archive, &out).unwrap(), 1);
        assert!(!dir.path().join("escape.txt").exists());
        assert!(out.join("ok.txt").exists());
    }

    #[test]
    fn garbage_is_not_a_zip() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("broken.zip");
        fs::write(&archive, "this is not a zip").unwrap();

        let err = extract(&archive, &dir.path().join("out")).unwrap_err();
        assert!(err.message().contains("not a valid zip"));
    }
}
