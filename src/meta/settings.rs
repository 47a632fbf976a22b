use std::{fs::File, io::Read, path::Path};

use eyre::Result;
use serde::{Deserialize, Serialize};

/// Name of the settings file inside the data folder.
pub const SETTINGS_FILE: &str = "settings.json";

/// When page numbers are read out after a page of a description.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum PageNumbers {
    /// Never read page numbers.
    Never,

    /// Only for descriptions with more than one page. This is the default.
    MultiPageOnly,

    /// Always, even for "Page 1 of 1".
    Always,
}

impl Default for PageNumbers {
    fn default() -> Self {
        PageNumbers::MultiPageOnly
    }
}

impl PageNumbers {
    /// Returns true if the page number should be read for a description with `page_count` pages.
    pub fn should_announce(self, page_count: usize) -> bool {
        match self {
            PageNumbers::Never => false,
            PageNumbers::MultiPageOnly => page_count > 1,
            PageNumbers::Always => true,
        }
    }
}

/// How new speech interacts with speech that is still playing.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum SpeechMode {
    /// Stop whatever the screen reader is saying. This is the default, because reading stale text
    /// after the player has moved on is confusing.
    Interrupt,

    /// Queue after current speech.
    Queue,
}

impl Default for SpeechMode {
    fn default() -> Self {
        SpeechMode::Interrupt
    }
}

/// What happens when the player opens a detail we have no description for.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum MissingDescription {
    /// Say nothing.
    Silent,

    /// Say that there's no description. This is the default.
    Announce,
}

impl Default for MissingDescription {
    fn default() -> Self {
        MissingDescription::Announce
    }
}

/// The user's settings for the mod.
#[derive(Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Options {
    /// When page numbers are spoken.
    #[serde(default)]
    pub page_numbers: PageNumbers,

    /// Whether new speech interrupts old speech.
    #[serde(default)]
    pub speech_mode: SpeechMode,

    /// Behaviour for details without descriptions.
    #[serde(default)]
    pub missing_description: MissingDescription,

    /// Whether log messages are also written to the console window the mod loader opens.
    #[serde(default)]
    pub log_to_console: bool,
}

impl Options {
    /// Attempts to parse the contents of `reader` to get an `Options` value.
    fn parse_json(reader: impl Read) -> Result<Options> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Looks for a settings file in `dir` and loads it.
    pub(crate) fn load_from_file(dir: &Path) -> Result<Option<Options>> {
        let path = dir.join(SETTINGS_FILE);

        if !path.exists() {
            // This isn't an error, but we didn't find any settings.
            return Ok(None);
        }

        Ok(Some(Options::parse_json(File::open(path)?)?))
    }

    /// Either loads the settings from `dir` or generates default values for them.
    pub fn load(dir: &Path) -> Options {
        match Options::load_from_file(dir) {
            Ok(Some(options)) => return options,

            Ok(None) => log::info!("No settings file found. Defaults will be used."),

            Err(err) => {
                log::error!("Error loading settings file: {err:?}. Defaults will be used.")
            }
        };

        Options::default()
    }

    /// Saves the settings to `dir`, returning any errors encountered.
    pub fn try_save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        std::fs::write(dir.join(SETTINGS_FILE), serde_json::to_string_pretty(self)?)?;

        Ok(())
    }

    /// Saves the settings to `dir`. Errors will be logged.
    pub fn save(&self, dir: &Path) {
        if let Err(err) = self.try_save(dir) {
            log::error!("Error saving options to file: {err:?}.");
        } else {
            log::info!("Settings saved.");
        }
    }

    /// Whether speech should interrupt what's currently being said.
    pub fn interrupt(&self) -> bool {
        matches!(self.speech_mode, SpeechMode::Interrupt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Options::load(dir.path()), Options::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{ "page_numbers": "Always" }"#,
        )
        .unwrap();

        let options = Options::load(dir.path());
        assert_eq!(options.page_numbers, PageNumbers::Always);
        assert_eq!(options.speech_mode, SpeechMode::Interrupt);
        assert!(options.interrupt());
    }

    #[test]
    fn broken_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "{ not json").unwrap();

        assert_eq!(Options::load(dir.path()), Options::default());
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let options = Options {
            speech_mode: SpeechMode::Queue,
            missing_description: MissingDescription::Silent,
            ..Options::default()
        };

        options.try_save(&dir.path().join("nested")).unwrap();
        assert_eq!(Options::load(&dir.path().join("nested")), options);
    }

    #[test]
    fn page_number_policy() {
        assert!(!PageNumbers::Never.should_announce(3));
        assert!(!PageNumbers::MultiPageOnly.should_announce(1));
        assert!(PageNumbers::MultiPageOnly.should_announce(2));
        assert!(PageNumbers::Always.should_announce(1));
    }
}
