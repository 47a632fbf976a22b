//! Installs (or updates) the accessibility mod into a copy of the game.

use std::{
    io::{self, BufRead, IsTerminal, Write},
    path::PathBuf,
    process::ExitCode,
};

use clap::Parser;
use trilogy_access::{
    install::{self, InstallOptions, InstallReport, Installer, Outcome, ReleaseClient},
    logging,
};

#[derive(Parser, Debug)]
#[command(name = "accessibility-installer", version, about)]
struct Args {
    /// The game's install folder (the one containing the game executable).
    game_root: PathBuf,

    /// Install the newest release of any kind, including pre-releases.
    #[arg(long)]
    prerelease: bool,

    /// Reinstall even if this release is already installed.
    #[arg(long)]
    force: bool,

    /// Install from a zip that has already been downloaded instead of fetching from GitHub.
    #[arg(long, value_name = "ZIP")]
    archive: Option<PathBuf>,

    /// Use a different GitHub API host.
    #[arg(long, value_name = "URL")]
    api_base: Option<String>,

    /// Print log messages as well as writing them to the log file.
    #[arg(short, long)]
    verbose: bool,

    /// Never ask to retry after a failure.
    #[arg(long)]
    no_prompt: bool,
}

fn print_report(report: &InstallReport) {
    println!("Copied {} file(s).", report.copied.len());

    for missing in &report.missing {
        println!("  Not included in this release: {missing}");
    }
}

fn run_once(args: &Args) -> install::Result<()> {
    if let Some(archive) = &args.archive {
        println!("Installing from {}...", archive.display());
        let report = install::install_from_archive(archive, &args.game_root)?;
        print_report(&report);
        return Ok(());
    }

    let mut client = ReleaseClient::new()?;

    if let Some(api_base) = &args.api_base {
        client = client.with_api_base(api_base);
    }

    let options = InstallOptions {
        game_root: args.game_root.clone(),
        include_prerelease: args.prerelease,
        force: args.force,
    };

    println!("Checking for the newest release...");

    let mut stdout = io::stdout();
    let outcome = Installer::new(client).run(&options, &mut |percent| {
        let _ = write!(stdout, "\rDownloading... {percent:>3}%");
        let _ = stdout.flush();
    })?;

    match outcome {
        Outcome::Installed { tag, report } => {
            println!();
            println!("Installed {tag}.");
            print_report(&report);
        }

        Outcome::UpToDate {
            installed,
            available,
        } => {
            println!("{installed} is already installed (newest is {available}). Use --force to reinstall.");
        }
    }

    Ok(())
}

/// Asks whether to try again. Anything other than "y" means no.
fn ask_retry() -> bool {
    print!("Try again? [y/N] ");
    let _ = io::stdout().flush();

    let mut answer = String::new();

    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => answer.trim().eq_ignore_ascii_case("y"),
        Err(_) => false,
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let log_path = std::env::temp_dir().join("accessibility-installer.log");

    if let Err(err) = logging::init(&log_path, args.verbose) {
        eprintln!("unable to start logging: {err:?}");
    }

    let interactive = !args.no_prompt && io::stdin().is_terminal();

    loop {
        match run_once(&args) {
            Ok(()) => return ExitCode::SUCCESS,

            Err(err) => {
                log::error!("install failed: {err:?}");

                println!();
                eprintln!("Installation failed: {err}");
                eprintln!("See {} for details.", log_path.display());

                if !interactive || !ask_retry() {
                    return ExitCode::FAILURE;
                }
            }
        }
    }
}
