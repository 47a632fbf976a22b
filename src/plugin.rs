//! The plugin instance and the C functions the host's mod loader calls.
//!
//! The host owns the game, the plugin ABI and the screen reader, so everything crossing this
//! boundary is plain C: integers, booleans, NUL-terminated strings and two callbacks (one telling
//! us which title is running, one speaking text). Nothing here may panic into the host; every
//! export catches panics and falls back to a "nothing" value.

use std::{
    ffi::{CStr, CString},
    os::raw::c_char,
    panic::AssertUnwindSafe,
    path::{Path, PathBuf},
    ptr,
    sync::Mutex,
};

use once_cell::sync::Lazy;

use crate::{
    game::{DetailStore, LoadSummary, NameTable, Title, TitleProvider},
    meta::{
        reader::{Context, DetailReader},
        settings::Options,
        speech::{LogSpeaker, Speaker},
        strings::{MessageKey, Phrases},
    },
};

/// Name of the log file inside the data folder.
pub const LOG_FILE: &str = "accessibility.log";

/// Returns the index of the running title (0, 1 or 2), or anything else if unknown.
pub type TitleCallback = extern "C" fn() -> i32;

/// Speaks a NUL-terminated UTF-8 string. The flag asks for current speech to be interrupted.
pub type SpeechCallback = extern "C" fn(*const c_char, bool);

/// All of the mod's state.
pub struct Plugin {
    data_dir: PathBuf,
    options: Options,
    phrases: Phrases,
    store: DetailStore,
    names: NameTable,
    reader: DetailReader,
    speaker: Box<dyn Speaker + Send>,

    /// The last string handed to the host. It stays valid until the next one replaces it.
    last_string: CString,
}

impl Plugin {
    /// Creates the plugin and loads everything from `data_dir`.
    pub fn new(
        data_dir: impl Into<PathBuf>,
        provider: impl TitleProvider + Send + 'static,
    ) -> Plugin {
        let data_dir = data_dir.into();

        let mut plugin = Plugin {
            options: Options::load(&data_dir),
            phrases: Phrases::load(&data_dir),
            store: DetailStore::new(&data_dir, provider),
            names: NameTable::new(&data_dir),
            reader: DetailReader::default(),
            speaker: Box::new(LogSpeaker),
            last_string: CString::default(),
            data_dir,
        };

        plugin.store.initialize();
        plugin.names.reload();

        log::info!("Options: {:#?}", plugin.options);

        plugin
    }

    pub fn set_speaker(&mut self, speaker: impl Speaker + Send + 'static) {
        self.speaker = Box::new(speaker);
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn store(&self) -> &DetailStore {
        &self.store
    }

    /// Re-reads settings, phrases, names and descriptions from disk, then announces how many
    /// descriptions were loaded.
    pub fn reload(&mut self) -> LoadSummary {
        self.options = Options::load(&self.data_dir);
        self.phrases = Phrases::load(&self.data_dir);
        self.names.reload();

        let summary = self.store.reload();

        let message = self.phrases.format(
            MessageKey::Reloaded,
            &[("count", summary.total().to_string())],
        );
        self.say(Some(message));

        summary
    }

    /// The name override for `speaker_id` in the running title.
    pub fn character_name(&self, speaker_id: i32) -> Option<&str> {
        self.names.get(self.store.active_title(), speaker_id)
    }

    fn say(&mut self, text: Option<String>) -> bool {
        match text {
            Some(text) => {
                self.speaker.speak(&text, self.options.interrupt());
                true
            }

            None => false,
        }
    }

    /// Opens `detail_id` and reads its first page. Returns true if anything was spoken.
    pub fn open_detail(&mut self, detail_id: i32) -> bool {
        let ctx = Context {
            store: &self.store,
            phrases: &self.phrases,
            options: &self.options,
        };

        let text = self.reader.open(&ctx, detail_id);
        self.say(text)
    }

    pub fn next_page(&mut self) -> bool {
        let ctx = Context {
            store: &self.store,
            phrases: &self.phrases,
            options: &self.options,
        };

        let text = self.reader.next_page(&ctx);
        self.say(text)
    }

    pub fn previous_page(&mut self) -> bool {
        let ctx = Context {
            store: &self.store,
            phrases: &self.phrases,
            options: &self.options,
        };

        let text = self.reader.previous_page(&ctx);
        self.say(text)
    }

    pub fn repeat(&mut self) -> bool {
        let ctx = Context {
            store: &self.store,
            phrases: &self.phrases,
            options: &self.options,
        };

        let text = self.reader.repeat(&ctx);
        self.say(text)
    }

    /// Keeps `text` alive in `last_string` and returns a pointer to it, or null for `None`.
    fn hand_out(&mut self, text: Option<String>) -> *const c_char {
        let Some(text) = text else {
            return ptr::null();
        };

        // Interior NULs would cut the string short on the C side.
        self.last_string = CString::new(text.replace('\0', "")).unwrap_or_default();
        self.last_string.as_ptr()
    }
}

static PLUGIN: Lazy<Mutex<Option<Plugin>>> = Lazy::new(|| Mutex::new(None));

static TITLE_CALLBACK: Mutex<Option<TitleCallback>> = Mutex::new(None);

/// Asks the host which title is running.
struct HostTitle;

impl TitleProvider for HostTitle {
    fn current_title(&self) -> Option<Title> {
        let callback = (*TITLE_CALLBACK.lock().ok()?)?;
        Title::from_index(callback())
    }
}

/// Speech waiting to be handed to the host once `PLUGIN` is unlocked.
static PENDING_SPEECH: Mutex<Vec<(SpeechCallback, CString, bool)>> = Mutex::new(Vec::new());

/// Sends speech to the host. Text is queued and delivered by `flush_speech`, so the host's
/// callback never runs while we hold the plugin lock.
struct HostSpeaker(SpeechCallback);

impl Speaker for HostSpeaker {
    fn speak(&mut self, text: &str, interrupt: bool) {
        let Ok(text) = CString::new(text.replace('\0', "")) else {
            return;
        };

        if let Ok(mut pending) = PENDING_SPEECH.lock() {
            pending.push((self.0, text, interrupt));
        }
    }
}

/// Calls the host's speech callback for everything queued so far. Must not be called with the
/// plugin locked.
fn flush_speech() {
    let pending = match PENDING_SPEECH.lock() {
        Ok(mut pending) => std::mem::take(&mut *pending),
        Err(_) => return,
    };

    for (callback, text, interrupt) in pending {
        callback(text.as_ptr(), interrupt);
    }
}

/// Runs `f` on the plugin if it has been initialised. Returns `default` if it hasn't, or if `f`
/// panics.
fn with_plugin<R>(default: R, f: impl FnOnce(&mut Plugin) -> R) -> R {
    let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
        let mut guard = PLUGIN
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        guard.as_mut().map(f)
    }));

    flush_speech();

    match result {
        Ok(Some(value)) => value,

        Ok(None) => {
            log::warn!("plugin called before accessibility_init");
            default
        }

        Err(_) => {
            log::error!("recovered from a panic in a plugin call");
            default
        }
    }
}

/// Loads the mod from `data_dir` (normally `<game>/UserData/AccessibilityMod`). Calling this
/// again replaces the existing instance and keeps the speech callback. Returns false if `data_dir`
/// is unusable.
///
/// The log file is set up by the first successful call. A later call with a different `data_dir`
/// reads its data from there, but keeps logging to the first directory's `accessibility.log`.
///
/// # Safety
///
/// `data_dir` must be null or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn accessibility_init(data_dir: *const c_char) -> bool {
    if data_dir.is_null() {
        return false;
    }

    let data_dir = match CStr::from_ptr(data_dir).to_str() {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => return false,
    };

    std::panic::catch_unwind(|| {
        // Only peek at the echo setting here. `Plugin::new` loads the settings properly (and logs
        // any problems with them) once the logger is running.
        let echo = matches!(
            Options::load_from_file(&data_dir),
            Ok(Some(options)) if options.log_to_console
        );

        if let Err(err) = crate::logging::init(&data_dir.join(LOG_FILE), echo) {
            // Still usable without a log file.
            eprintln!("unable to start logging: {err:?}");
        }

        log::info!(
            "accessibility mod {} starting from {}",
            env!("CARGO_PKG_VERSION"),
            data_dir.display()
        );

        let plugin = Plugin::new(data_dir, HostTitle);

        let mut guard = PLUGIN
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Keep the host's speech callback across re-initialisation.
        let old = guard.replace(plugin);

        if let (Some(old), Some(new)) = (old, guard.as_mut()) {
            new.speaker = old.speaker;
        }
    })
    .is_ok()
}

/// Reloads every data file. Returns the number of descriptions loaded, or -1 before init.
#[no_mangle]
pub extern "C" fn accessibility_reload() -> i32 {
    with_plugin(-1, |plugin| {
        i32::try_from(plugin.reload().total()).unwrap_or(i32::MAX)
    })
}

/// Registers the function we call to find out which title is running.
#[no_mangle]
pub extern "C" fn accessibility_set_title_callback(callback: Option<TitleCallback>) {
    if let Ok(mut slot) = TITLE_CALLBACK.lock() {
        *slot = callback;
    }
}

/// Registers the function that speaks text. Passing null sends speech to the log.
///
/// The callback is always called after the export that produced the speech has released its lock,
/// so it may call back into any `accessibility_*` function.
#[no_mangle]
pub extern "C" fn accessibility_set_speech_callback(callback: Option<SpeechCallback>) {
    with_plugin((), |plugin| match callback {
        Some(callback) => plugin.set_speaker(HostSpeaker(callback)),
        None => plugin.set_speaker(LogSpeaker),
    });
}

/// Returns page `page` of the description for `detail_id`, or null. The string stays valid until
/// the next call that returns a string.
#[no_mangle]
pub extern "C" fn accessibility_get_description(detail_id: i32, page: i32) -> *const c_char {
    with_plugin(ptr::null(), |plugin| {
        let text = usize::try_from(page)
            .ok()
            .and_then(|page| plugin.store.description(detail_id, page))
            .map(str::to_string);

        plugin.hand_out(text)
    })
}

#[no_mangle]
pub extern "C" fn accessibility_has_description(detail_id: i32) -> bool {
    with_plugin(false, |plugin| plugin.store.has_description(detail_id))
}

#[no_mangle]
pub extern "C" fn accessibility_page_count(detail_id: i32) -> i32 {
    with_plugin(0, |plugin| {
        i32::try_from(plugin.store.page_count(detail_id)).unwrap_or(i32::MAX)
    })
}

/// Returns the name override for a speaker in the running title, or null. Same lifetime rules as
/// `accessibility_get_description`.
#[no_mangle]
pub extern "C" fn accessibility_character_name(speaker_id: i32) -> *const c_char {
    with_plugin(ptr::null(), |plugin| {
        let name = plugin.character_name(speaker_id).map(str::to_string);
        plugin.hand_out(name)
    })
}

/// Opens a detail and speaks its first page. Returns true if anything was spoken.
#[no_mangle]
pub extern "C" fn accessibility_open_detail(detail_id: i32) -> bool {
    with_plugin(false, |plugin| plugin.open_detail(detail_id))
}

#[no_mangle]
pub extern "C" fn accessibility_next_page() -> bool {
    with_plugin(false, Plugin::next_page)
}

#[no_mangle]
pub extern "C" fn accessibility_previous_page() -> bool {
    with_plugin(false, Plugin::previous_page)
}

#[no_mangle]
pub extern "C" fn accessibility_repeat() -> bool {
    with_plugin(false, Plugin::repeat)
}
