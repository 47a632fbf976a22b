//! Character name overrides. The game's own speaker names are sometimes images rather than text,
//! so each title has a small JSON file mapping speaker IDs to the names we should read out.

use std::{collections::HashMap, fs, path::PathBuf};

use strum::IntoEnumIterator;

use super::title::Title;
use crate::text;

/// Folder under the data root holding `<title>.json` name files.
pub const NAMES_FOLDER: &str = "Names";

/// Speaker names for every title.
#[derive(Default)]
pub struct NameTable {
    root: PathBuf,
    names: HashMap<Title, HashMap<i32, String>>,
}

impl NameTable {
    pub fn new(root: impl Into<PathBuf>) -> NameTable {
        NameTable {
            root: root.into(),
            names: HashMap::new(),
        }
    }

    /// Path of the name file for `title`.
    pub fn path_for(&self, title: Title) -> PathBuf {
        self.root
            .join(NAMES_FOLDER)
            .join(format!("{}.json", title.folder_name()))
    }

    /// Reads every title's name file again, replacing the previous tables.
    pub fn reload(&mut self) {
        for title in Title::iter() {
            let path = self.path_for(title);

            let names = match fs::read_to_string(&path) {
                Ok(json) => text::parse_int_map(&json),

                Err(err) => {
                    log::debug!("no names for {:?} ({}): {}", title, path.display(), err);
                    HashMap::new()
                }
            };

            log::info!("{} name override(s) for {:?}", names.len(), title);
            self.names.insert(title, names);
        }
    }

    /// Returns the override for `speaker_id` in `title`, if there is one.
    pub fn get(&self, title: Title, speaker_id: i32) -> Option<&str> {
        self.names.get(&title)?.get(&speaker_id).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_per_title_files() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join(NAMES_FOLDER);
        fs::create_dir_all(&dir).unwrap();

        fs::write(
            dir.join("GS1.json"),
            r#"{"5": "Mia Fey", "_comment": "speaker IDs from the script", "x": "y"}"#,
        )
        .unwrap();

        fs::write(dir.join("GS2.json"), r#"{"4": "Pearl Fey", "5": "Maya Fey"#).unwrap();

        let mut names = NameTable::new(root.path());
        names.reload();

        assert_eq!(names.get(Title::Gs1, 5), Some("Mia Fey"));
        assert_eq!(names.get(Title::Gs1, 6), None);

        // Unterminated value, so only the pairs before it are read.
        assert_eq!(names.get(Title::Gs2, 4), Some("Pearl Fey"));
        assert_eq!(names.get(Title::Gs2, 5), None);

        // No file at all.
        assert_eq!(names.get(Title::Gs3, 5), None);
    }

    #[test]
    fn reload_drops_removed_entries() {
        let root = tempfile::tempdir().unwrap();
        let mut names = NameTable::new(root.path());
        let path = names.path_for(Title::Gs3);

        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"1": "Godot"}"#).unwrap();
        names.reload();
        assert_eq!(names.get(Title::Gs3, 1), Some("Godot"));

        fs::remove_file(&path).unwrap();
        names.reload();
        assert_eq!(names.get(Title::Gs3, 1), None);
    }
}
