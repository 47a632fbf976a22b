//! The fixed phrases the mod speaks on its own behalf. English defaults are built in, and any of
//! them can be replaced by putting a `strings.json` in the data folder, keyed by the kebab-case
//! message name (`{"page-position": "Seite {page} von {total}"}`).

use std::{collections::HashMap, fs, path::Path};

use strum::{EnumIter, EnumString, IntoStaticStr};

use crate::text;

/// Name of the phrase override file inside the data folder.
pub const STRINGS_FILE: &str = "strings.json";

#[derive(Clone, Copy, Debug, EnumIter, EnumString, IntoStaticStr, PartialEq, Eq, Hash)]
#[strum(serialize_all = "kebab-case")]
pub enum MessageKey {
    /// `{page}` and `{total}`.
    PagePosition,
    NoDescription,
    FirstPage,
    LastPage,
    NothingOpen,

    /// `{count}`.
    Reloaded,
}

impl MessageKey {
    /// Returns the key used in `strings.json`.
    pub fn key_str(self) -> &'static str {
        self.into()
    }

    fn default_text(self) -> &'static str {
        match self {
            MessageKey::PagePosition => "Page {page} of {total}",
            MessageKey::NoDescription => "No description available.",
            MessageKey::FirstPage => "First page.",
            MessageKey::LastPage => "Last page.",
            MessageKey::NothingOpen => "Nothing to read.",
            MessageKey::Reloaded => "Reloaded {count} descriptions.",
        }
    }
}

/// The phrases currently in use.
#[derive(Default)]
pub struct Phrases {
    overrides: HashMap<MessageKey, String>,
}

impl Phrases {
    /// Loads overrides from `dir`. A missing or broken file just means the defaults are used.
    pub fn load(dir: &Path) -> Phrases {
        let path = dir.join(STRINGS_FILE);

        match fs::read_to_string(&path) {
            Ok(json) => Phrases::from_json(&json),
            Err(_) => {
                log::info!("No phrase overrides at {}.", path.display());
                Phrases::default()
            }
        }
    }

    /// Builds the phrase set from the contents of an override file.
    pub fn from_json(json: &str) -> Phrases {
        let mut overrides = HashMap::new();

        for (key, value) in text::parse_string_map(json) {
            match key.parse::<MessageKey>() {
                Ok(message) => {
                    overrides.insert(message, value);
                }

                Err(_) => log::warn!("unknown phrase key '{}' in {}", key, STRINGS_FILE),
            }
        }

        Phrases { overrides }
    }

    /// Returns the text for `key` with no substitutions.
    pub fn get(&self, key: MessageKey) -> &str {
        self.overrides
            .get(&key)
            .map_or_else(|| key.default_text(), String::as_str)
    }

    /// Returns the text for `key` with each `{name}` placeholder replaced.
    pub fn format(&self, key: MessageKey, args: &[(&str, String)]) -> String {
        let mut formatted = self.get(key).to_string();

        for (name, value) in args {
            formatted = formatted.replace(&format!("{{{name}}}"), value);
        }

        formatted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn defaults_without_overrides() {
        let phrases = Phrases::default();

        for key in MessageKey::iter() {
            assert!(!phrases.get(key).is_empty(), "{:?} has no text", key);
        }

        assert_eq!(
            phrases.format(
                MessageKey::PagePosition,
                &[("page", 2.to_string()), ("total", 5.to_string())]
            ),
            "Page 2 of 5"
        );
    }

    #[test]
    fn overrides_replace_defaults() {
        let phrases = Phrases::from_json(
            r#"{
                "_comment": "German",
                "page-position": "Seite {page} von {total}",
                "not-a-key": "ignored"
            }"#,
        );

        assert_eq!(
            phrases.format(
                MessageKey::PagePosition,
                &[("page", 1.to_string()), ("total", 3.to_string())]
            ),
            "Seite 1 von 3"
        );
        assert_eq!(phrases.get(MessageKey::LastPage), "Last page.");
    }

    #[test]
    fn keys_are_kebab_case() {
        assert_eq!(MessageKey::NoDescription.key_str(), "no-description");
        assert_eq!(
            "page-position".parse::<MessageKey>(),
            Ok(MessageKey::PagePosition)
        );
    }
}
