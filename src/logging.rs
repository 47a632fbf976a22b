//! Logging backend which writes to a file (and optionally stderr) from a background thread.

use chrono::Local;
use eyre::Result;
use log::{Level, LevelFilter, Metadata, Record};
use once_cell::sync::OnceCell;
use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
    sync::{mpsc, Mutex},
};

struct Message {
    module: String,
    level: Level,
    string: String,
    time: String,
}

impl Message {
    fn write_to(&self, out: &mut impl Write) {
        let level_name = match self.level {
            Level::Error => "error",
            Level::Warn => "warning",
            Level::Info => "info",
            Level::Debug | Level::Trace => "debug",
        };

        // [date time] [module] [level] Text
        let _ = writeln!(
            out,
            "[{}] [{}] [{}] {}",
            self.time, self.module, level_name, self.string
        );
    }
}

/// Crates that log far too much at info level for a game's log file.
const NOISY_CRATES: &[&str] = &["hyper", "mio", "reqwest", "want"];

struct Logger;

impl Logger {
    fn commit(&self, record: &Record) {
        let module_path = match record.module_path() {
            Some(path) => path,
            None => return,
        };

        let message = Message {
            module: module_path
                .split("::")
                .last()
                .unwrap_or("unknown")
                .to_string(),
            level: record.level(),
            string: format!("{}", record.args()),
            time: Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
        };

        if let Some(sender) = MSG_SENDER.get() {
            if let Ok(sender) = sender.lock() {
                // The writer thread only stops if the process is going down.
                let _ = sender.send(message);
            }
        }
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let noisy = NOISY_CRATES
            .iter()
            .any(|name| metadata.target().starts_with(name));

        !noisy || metadata.level() <= Level::Warn
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.commit(record);
        }
    }

    fn flush(&self) {}
}

static MSG_SENDER: OnceCell<Mutex<mpsc::Sender<Message>>> = OnceCell::new();

/// Where panic reports go.
static PANIC_PATH: OnceCell<PathBuf> = OnceCell::new();

/// The file set up by the first successful `init`.
static LOG_PATH: OnceCell<PathBuf> = OnceCell::new();

/// The file log messages are going to, if logging has started.
pub fn log_path() -> Option<&'static Path> {
    LOG_PATH.get().map(PathBuf::as_path)
}

fn install_panic_hook() {
    // Keep the previous hook so the host (or the test harness) still sees the panic.
    let previous = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |info| {
        let message = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "no message".to_string());

        let location = info
            .location()
            .map_or_else(|| "unknown".to_string(), ToString::to_string);

        let time = Local::now();
        let backtrace = std::backtrace::Backtrace::force_capture();

        let info_dump = format!(
            "The accessibility mod hit an internal error.

Please report this along with the log file.

Message: {message}
Location: {location}
Version: {}
Time: {time}

{backtrace}",
            env!("CARGO_PKG_VERSION")
        );

        log::error!("{info_dump}");

        if let Some(path) = PANIC_PATH.get() {
            let _ = std::fs::write(path, info_dump);
        }

        previous(info);
    }));
}

/// Starts logging to `log_path`. If `echo` is set, messages are copied to stderr.
///
/// The logger can only be installed once per process. Calling this again after a successful call
/// keeps the first file (and echo setting) and only logs a warning if `log_path` differs.
pub fn init(log_path: &Path, echo: bool) -> Result<()> {
    if let Some(current) = LOG_PATH.get() {
        if current != log_path {
            log::warn!(
                "already logging to {}, not switching to {}",
                current.display(),
                log_path.display()
            );
        }

        return Ok(());
    }

    if let Some(dir) = log_path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let mut file = File::create(log_path)?;

    let _ = PANIC_PATH.set(log_path.with_file_name("PANIC.txt"));
    install_panic_hook();

    let (sender, receiver) = mpsc::channel::<Message>();

    MSG_SENDER
        .set(Mutex::new(sender))
        .map_err(|_| eyre::eyre!("logger initialised twice"))?;

    log::set_boxed_logger(Box::new(Logger))
        .map(|_| log::set_max_level(LevelFilter::Debug))
        .map_err(|err| eyre::eyre!("unable to set logger: {}", err))?;

    let _ = LOG_PATH.set(log_path.to_path_buf());

    // Start receiving log messages on a background thread so that file writes never happen on the
    // game's main thread.
    std::thread::spawn(move || {
        for msg in receiver {
            msg.write_to(&mut file);
            let _ = file.flush();

            if echo {
                msg.write_to(&mut std::io::stderr());
            }
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_format() {
        let message = Message {
            module: "details".to_string(),
            level: Level::Warn,
            string: "skipping badge.txt".to_string(),
            time: "2024-01-01 12:00:00.000".to_string(),
        };

        let mut out = Vec::<u8>::new();
        message.write_to(&mut out);

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "[2024-01-01 12:00:00.000] [details] [warning] skipping badge.txt\n"
        );
    }

    #[test]
    fn noisy_crates_are_filtered() {
        use log::Log;

        let quiet = Metadata::builder()
            .target("hyper::proto")
            .level(Level::Info)
            .build();
        let loud = Metadata::builder()
            .target("hyper::proto")
            .level(Level::Error)
            .build();
        let ours = Metadata::builder()
            .target("trilogy_access::game::details")
            .level(Level::Debug)
            .build();

        assert!(!Logger.enabled(&quiet));
        assert!(Logger.enabled(&loud));
        assert!(Logger.enabled(&ours));
    }
}
