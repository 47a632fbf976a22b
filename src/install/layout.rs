//! Where each part of a release goes inside the game folder.

use std::{
    fs,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use super::error::{Context, InstallError, Result};
use crate::meta::DATA_DIR;

/// The plugin itself. Goes in `Mods/`.
pub const PLUGIN_FILE: &str = "AccessibilityMod.dll";

/// The mod loader's plugin folder, relative to the game root.
pub const MODS_DIR: &str = "Mods";

/// Native screen reader libraries. These go next to the game executable.
pub const SUPPORT_LIBRARIES: &[&str] = &["Tolk.dll", "nvdaControllerClient64.dll", "SAAPI64.dll"];

/// Folder in the release holding the descriptions and other data.
pub const DATA_SOURCE_DIR: &str = "data";

/// File recording which release is installed.
pub const VERSION_FILE: &str = "installed_version.txt";

/// What an install copied.
#[derive(Debug, Default)]
pub struct InstallReport {
    /// Files written, relative to the game root.
    pub copied: Vec<PathBuf>,

    /// Expected files that weren't in the release.
    pub missing: Vec<String>,
}

/// Looks for `name` at the top of the release, then in a `Mods` folder inside it.
fn find_in_release(source: &Path, name: &str) -> Option<PathBuf> {
    [source.join(name), source.join(MODS_DIR).join(name)]
        .into_iter()
        .find(|path| path.is_file())
}

fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).context(format!("unable to create {}", parent.display()))?;
    }

    fs::copy(from, to).context(format!("unable to copy {}", to.display()))?;
    Ok(())
}

/// Copies everything under `from` into `to`, replacing existing files. Returns the paths written,
/// relative to `to`.
fn copy_dir(from: &Path, to: &Path) -> Result<Vec<PathBuf>> {
    let mut copied = vec![];

    for entry in WalkDir::new(from) {
        let entry = entry.context(format!("unable to read {}", from.display()))?;

        let relative = match entry.path().strip_prefix(from) {
            Ok(relative) => relative,
            Err(_) => continue,
        };

        let target = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .context(format!("unable to create {}", target.display()))?;
        } else {
            copy_file(entry.path(), &target)?;
            copied.push(relative.to_path_buf());
        }
    }

    Ok(copied)
}

/// Copies the release at `source` into the game at `game_root`. Existing files are overwritten;
/// files from older releases that are no longer shipped are left alone.
pub fn install_layout(source: &Path, game_root: &Path) -> Result<InstallReport> {
    if !game_root.is_dir() {
        return Err(InstallError::new(format!(
            "{} is not a folder",
            game_root.display()
        )));
    }

    let mut report = InstallReport::default();

    let plugin = find_in_release(source, PLUGIN_FILE).ok_or_else(|| {
        InstallError::new(format!("the release does not contain {PLUGIN_FILE}"))
    })?;

    let plugin_target = Path::new(MODS_DIR).join(PLUGIN_FILE);
    copy_file(&plugin, &game_root.join(&plugin_target))?;
    report.copied.push(plugin_target);

    for library in SUPPORT_LIBRARIES {
        match find_in_release(source, library) {
            Some(path) => {
                copy_file(&path, &game_root.join(library))?;
                report.copied.push(PathBuf::from(library));
            }

            None => {
                log::warn!("release has no {}, skipping it", library);
                report.missing.push(library.to_string());
            }
        }
    }

    let data_source = source.join(DATA_SOURCE_DIR);

    if data_source.is_dir() {
        let data_dir = Path::new(DATA_DIR);

        for relative in copy_dir(&data_source, &game_root.join(data_dir))? {
            report.copied.push(data_dir.join(relative));
        }
    } else {
        log::warn!("release has no {} folder", DATA_SOURCE_DIR);
        report.missing.push(DATA_SOURCE_DIR.to_string());
    }

    log::info!(
        "copied {} file(s) into {}",
        report.copied.len(),
        game_root.display()
    );

    Ok(report)
}

/// Returns the release tag recorded by the last install, if any.
pub fn read_installed_tag(game_root: &Path) -> Option<String> {
    let tag = fs::read_to_string(game_root.join(DATA_DIR).join(VERSION_FILE)).ok()?;
    let tag = tag.trim();

    (!tag.is_empty()).then(|| tag.to_string())
}

/// Records `tag` as the installed release.
pub fn write_installed_tag(game_root: &Path, tag: &str) -> Result<()> {
    let dir = game_root.join(DATA_DIR);
    fs::create_dir_all(&dir).context(format!("unable to create {}", dir.display()))?;
    fs::write(dir.join(VERSION_FILE), tag).context("unable to record the installed version")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn copies_into_game_layout() {
        let release = tempfile::tempdir().unwrap();
        let game = tempfile::tempdir().unwrap();

        write(&release.path().join(PLUGIN_FILE), "plugin v2");
        write(&release.path().join("Tolk.dll"), "tolk");
        write(&release.path().join("nvdaControllerClient64.dll"), "nvda");
        write(&release.path().join("data/Details/GS1/1.txt"), "badge");
        write(&release.path().join("data/strings.json"), "{}");

        // Leftovers from an earlier install.
        write(&game.path().join("Mods").join(PLUGIN_FILE), "plugin v1");
        write(
            &game.path().join(DATA_DIR).join("Details/GS1/2.txt"),
            "older file",
        );

        let report = install_layout(release.path(), game.path()).unwrap();

        assert_eq!(
            fs::read_to_string(game.path().join("Mods").join(PLUGIN_FILE)).unwrap(),
            "plugin v2"
        );
        assert!(game.path().join("Tolk.dll").is_file());
        assert!(game.path().join("nvdaControllerClient64.dll").is_file());
        assert_eq!(
            fs::read_to_string(game.path().join(DATA_DIR).join("Details/GS1/1.txt")).unwrap(),
            "badge"
        );

        // Not part of this release, so left alone.
        assert!(game.path().join(DATA_DIR).join("Details/GS1/2.txt").is_file());

        assert_eq!(report.missing, vec!["SAAPI64.dll".to_string()]);
        assert!(report
            .copied
            .contains(&Path::new(DATA_DIR).join("Details/GS1/1.txt")));
    }

    #[test]
    fn plugin_can_live_in_mods_folder() {
        let release = tempfile::tempdir().unwrap();
        let game = tempfile::tempdir().unwrap();

        write(&release.path().join("Mods").join(PLUGIN_FILE), "plugin");

        install_layout(release.path(), game.path()).unwrap();
        assert!(game.path().join("Mods").join(PLUGIN_FILE).is_file());
    }

    #[test]
    fn missing_plugin_is_an_error() {
        let release = tempfile::tempdir().unwrap();
        let game = tempfile::tempdir().unwrap();

        write(&release.path().join("Tolk.dll"), "tolk");

        let err = install_layout(release.path(), game.path()).unwrap_err();
        assert!(err.message().contains(PLUGIN_FILE));
    }

    #[test]
    fn game_root_must_exist() {
        let release = tempfile::tempdir().unwrap();
        let err = install_layout(release.path(), Path::new("/no/such/game")).unwrap_err();
        assert!(err.message().contains("is not a folder"));
    }

    #[test]
    fn installed_tag_round_trip() {
        let game = tempfile::tempdir().unwrap();
        assert_eq!(read_installed_tag(game.path()), None);

        write_installed_tag(game.path(), "v1.3.0").unwrap();
        assert_eq!(read_installed_tag(game.path()).as_deref(), Some("v1.3.0"));
    }
}
