//! Downloads a release of the mod and copies it into a game folder.
//!
//! The steps run strictly in order: ask GitHub for the newest release, pick its archive, download
//! it, unzip it into a temporary folder and copy the files into place. Any failure stops the
//! install and is reported as an `InstallError`. Nothing already copied is rolled back, so running
//! the installer again is always the fix.

pub mod archive;
pub mod download;
pub mod error;
pub mod github;
pub mod layout;
pub mod version;

use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub use error::{InstallError, Result};
pub use github::{Asset, Release, ReleaseClient};
pub use layout::InstallReport;
pub use version::Version;

use error::Context;

/// What the user asked the installer to do.
#[derive(Clone, Debug)]
pub struct InstallOptions {
    /// The game's install folder (the one containing the executable).
    pub game_root: PathBuf,

    /// Whether pre-releases count as "newest".
    pub include_prerelease: bool,

    /// Install even if the same or a newer release is already installed.
    pub force: bool,
}

/// How an install finished.
#[derive(Debug)]
pub enum Outcome {
    Installed {
        tag: String,
        report: InstallReport,
    },

    /// The installed release is the same as or newer than the newest available one.
    UpToDate { installed: String, available: String },
}

/// Removes a temporary folder, logging (and otherwise ignoring) any failure.
fn clean_up(dir: TempDir) {
    let path = dir.path().to_path_buf();

    if let Err(err) = dir.close() {
        log::warn!("unable to remove {}: {}", path.display(), err);
    }
}

fn temp_dir(purpose: &str) -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix(&format!("accessibility-{purpose}-"))
        .tempdir()
        .context("unable to create a temporary folder")
}

/// Installs the release archive at `archive` into `game_root`.
pub fn install_from_archive(archive: &Path, game_root: &Path) -> Result<InstallReport> {
    let extract_dir = temp_dir("extract")?;

    // If anything fails, `extract_dir` is still removed when it's dropped.
    archive::extract(archive, extract_dir.path())?;
    let source = archive::find_content_root(extract_dir.path())?;
    let report = layout::install_layout(&source, game_root)?;

    clean_up(extract_dir);
    Ok(report)
}

/// Returns true if the recorded installed release is at least as new as `available`.
fn is_up_to_date(installed: Option<&str>, available: &str) -> bool {
    match (installed.and_then(Version::parse), Version::parse(available)) {
        (Some(installed), Some(available)) => installed >= available,

        // Tags we can't compare are only "up to date" if they're identical.
        _ => installed == Some(available),
    }
}

/// Runs installs against GitHub releases.
pub struct Installer {
    client: ReleaseClient,
}

impl Installer {
    pub fn new(client: ReleaseClient) -> Installer {
        Installer { client }
    }

    /// Installs the newest release, calling `on_progress` with the download percentage.
    pub fn run(
        &self,
        options: &InstallOptions,
        on_progress: &mut dyn FnMut(u8),
    ) -> Result<Outcome> {
        let release = self.client.fetch_latest(options.include_prerelease)?;

        if !options.force {
            let installed = layout::read_installed_tag(&options.game_root);

            if is_up_to_date(installed.as_deref(), &release.tag_name) {
                let installed = installed.unwrap_or_default();
                log::info!(
                    "{} is installed and {} is the newest release, nothing to do",
                    installed,
                    release.tag_name
                );

                return Ok(Outcome::UpToDate {
                    installed,
                    available: release.tag_name,
                });
            }
        }

        let asset = github::select_asset(&release).ok_or_else(|| {
            InstallError::new(format!(
                "release {} has no zip archive to download",
                release.tag_name
            ))
        })?;

        log::info!("selected {} ({} bytes)", asset.name, asset.size);

        let download_dir = temp_dir("download")?;
        let archive_path = download_dir.path().join(&asset.name);

        download::download(
            self.client.http(),
            &asset.browser_download_url,
            &archive_path,
            on_progress,
        )?;

        let report = install_from_archive(&archive_path, &options.game_root)?;
        clean_up(download_dir);

        layout::write_installed_tag(&options.game_root, &release.tag_name)?;

        Ok(Outcome::Installed {
            tag: release.tag_name,
            report,
        })
    }
}
