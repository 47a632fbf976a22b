//! Descriptions for evidence and examination views ("details"), loaded from per-title folders of
//! numbered text files.
//!
//! Lookups never fail loudly. The host calls these from its rendering path, and a missing
//! description should just mean nothing gets read out.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use strum::IntoEnumIterator;

use super::title::{Title, TitleProvider};
use crate::text;

/// Name of the folder under the data root that holds the per-title description folders.
pub const DETAILS_FOLDER: &str = "Details";

/// The text for one detail ID, split into pages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetailDescription {
    pages: Vec<String>,
}

impl DetailDescription {
    /// Splits the contents of a description file into a description.
    pub fn from_text(text: &str) -> DetailDescription {
        DetailDescription {
            pages: text::split_pages(text),
        }
    }

    /// Returns the page at `index`, or `None` if there is no such page.
    pub fn page(&self, index: usize) -> Option<&str> {
        self.pages.get(index).map(String::as_str)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[String] {
        &self.pages
    }
}

/// Detail ID to description.
pub type DetailTable = HashMap<i32, DetailDescription>;

/// Number of descriptions loaded for each title by the last (re)load.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub counts: BTreeMap<Title, usize>,
}

impl LoadSummary {
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Holds the description tables for every title and picks the right one for the running game.
pub struct DetailStore {
    /// The mod's data folder. Descriptions live in `<root>/Details/<title>/`.
    root: PathBuf,

    /// Where we find out which title is running.
    provider: Box<dyn TitleProvider + Send>,

    tables: HashMap<Title, DetailTable>,
}

impl DetailStore {
    /// Creates an empty store. Nothing is read from disk until `initialize` is called.
    pub fn new(root: impl Into<PathBuf>, provider: impl TitleProvider + Send + 'static) -> Self {
        DetailStore {
            root: root.into(),
            provider: Box::new(provider),
            tables: HashMap::new(),
        }
    }

    /// Loads the tables for all titles.
    pub fn initialize(&mut self) -> LoadSummary {
        self.reload()
    }

    /// Rebuilds every title's table from disk, throwing away whatever was loaded before.
    pub fn reload(&mut self) -> LoadSummary {
        let mut summary = LoadSummary::default();

        for title in Title::iter() {
            summary.counts.insert(title, self.reload_title(title));
        }

        log::info!(
            "loaded {} detail descriptions ({:?})",
            summary.total(),
            summary.counts
        );

        summary
    }

    /// Rebuilds the table for a single title. Returns the number of descriptions loaded.
    pub fn reload_title(&mut self, title: Title) -> usize {
        let table = load_table(&self.title_dir(title));
        let count = table.len();

        // Replace, never merge: a file deleted since the last load must disappear.
        self.tables.insert(title, table);

        count
    }

    /// The folder that descriptions for `title` are loaded from.
    pub fn title_dir(&self, title: Title) -> PathBuf {
        self.root.join(DETAILS_FOLDER).join(title.folder_name())
    }

    /// Returns the title that lookups currently go to. Falls back to the first game if the host
    /// can't tell us.
    pub fn active_title(&self) -> Title {
        self.provider.current_title().unwrap_or_default()
    }

    fn active_description(&self, detail_id: i32) -> Option<&DetailDescription> {
        self.tables.get(&self.active_title())?.get(&detail_id)
    }

    /// Returns the text of page `page` of the description for `detail_id`.
    pub fn description(&self, detail_id: i32, page: usize) -> Option<&str> {
        self.active_description(detail_id)?.page(page)
    }

    /// Returns the whole description for `detail_id`.
    pub fn detail(&self, detail_id: i32) -> Option<&DetailDescription> {
        self.active_description(detail_id)
    }

    pub fn has_description(&self, detail_id: i32) -> bool {
        self.active_description(detail_id).is_some()
    }

    /// Returns the number of pages for `detail_id`, or zero if there is no description.
    pub fn page_count(&self, detail_id: i32) -> usize {
        self.active_description(detail_id)
            .map_or(0, DetailDescription::page_count)
    }

    /// Number of descriptions loaded for `title`.
    pub fn entry_count(&self, title: Title) -> usize {
        self.tables.get(&title).map_or(0, HashMap::len)
    }
}

/// Why a file in a description folder was not loaded.
enum Skip {
    /// Underscore-prefixed files are notes for people editing the descriptions.
    Note,

    /// Not `<number>.txt`.
    BadName,
}

/// Works out the detail ID for a file from its name.
fn detail_id_for(path: &Path) -> Result<i32, Skip> {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or(Skip::BadName)?;

    if stem.starts_with(text::COMMENT_PREFIX) {
        return Err(Skip::Note);
    }

    let is_txt = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("txt"));

    if !is_txt {
        return Err(Skip::BadName);
    }

    stem.trim().parse().map_err(|_| Skip::BadName)
}

/// Loads every `<id>.txt` file in `dir`. A missing folder is just an empty table.
pub fn load_table(dir: &Path) -> DetailTable {
    let mut table = DetailTable::new();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            log::info!("no descriptions loaded from {}: {}", dir.display(), err);
            return table;
        }
    };

    // Sort so that duplicate IDs ("5.txt" and "05.txt") resolve the same way on every platform.
    let paths = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(err) => {
                log::warn!("error while reading {}: {}", dir.display(), err);
                None
            }
        })
        .filter(|path| path.is_file())
        .sorted();

    for path in paths {
        let detail_id = match detail_id_for(&path) {
            Ok(id) => id,

            Err(Skip::Note) => {
                log::debug!("skipping note file {}", path.display());
                continue;
            }

            Err(Skip::BadName) => {
                log::warn!(
                    "skipping {}: description files must be named <number>.txt",
                    path.display()
                );
                continue;
            }
        };

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) => {
                log::warn!("unable to read {}: {}", path.display(), err);
                continue;
            }
        };

        if table
            .insert(detail_id, DetailDescription::from_text(&contents))
            .is_some()
        {
            log::warn!(
                "{} overrides an earlier description for detail {}",
                path.display(),
                detail_id
            );
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::title::FixedTitle;
    use std::sync::{Arc, Mutex};

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), contents).unwrap();
    }

    fn store_with_files(files: &[(Title, &str, &str)]) -> (tempfile::TempDir, DetailStore) {
        let root = tempfile::tempdir().unwrap();

        for (title, name, contents) in files {
            let dir = root.path().join(DETAILS_FOLDER).join(title.folder_name());
            write(&dir, name, contents);
        }

        let mut store = DetailStore::new(root.path(), FixedTitle(Title::Gs1));
        store.initialize();

        (root, store)
    }

    #[test]
    fn loads_numbered_files_and_skips_others() {
        let (_root, store) = store_with_files(&[
            (Title::Gs1, "12.txt", "Attorney's badge.\n---\nIt's shiny."),
            (Title::Gs1, "_readme.txt", "notes for translators"),
            (Title::Gs1, "badge.txt", "not a number"),
            (Title::Gs1, "7.json", "wrong extension"),
        ]);

        assert_eq!(store.entry_count(Title::Gs1), 1);
        assert_eq!(store.page_count(12), 2);
        assert_eq!(store.description(12, 0), Some("Attorney's badge."));
        assert_eq!(store.description(12, 1), Some("It's shiny."));
    }

    #[test]
    fn missing_lookups_degrade() {
        let (_root, store) = store_with_files(&[(Title::Gs1, "1.txt", "Only page")]);

        assert_eq!(store.description(99, 0), None);
        assert!(!store.has_description(99));
        assert_eq!(store.page_count(99), 0);

        // Present ID, page out of range.
        assert!(store.has_description(1));
        assert_eq!(store.description(1, 1), None);
    }

    #[test]
    fn empty_file_is_a_description_with_no_pages() {
        let (_root, store) = store_with_files(&[(Title::Gs1, "3.txt", "  \n")]);

        assert!(store.has_description(3));
        assert_eq!(store.page_count(3), 0);
        assert_eq!(store.description(3, 0), None);
    }

    #[test]
    fn lookups_follow_the_active_title() {
        let root = tempfile::tempdir().unwrap();
        write(
            &root.path().join("Details/GS1"),
            "4.txt",
            "Magatama? Not yet.",
        );
        write(&root.path().join("Details/GS2"), "4.txt", "Magatama.");

        let current = Arc::new(Mutex::new(None));
        let provider = {
            let current = Arc::clone(&current);
            move || *current.lock().unwrap()
        };

        let mut store = DetailStore::new(root.path(), provider);
        store.initialize();

        // Unknown title falls back to the first game.
        assert_eq!(store.active_title(), Title::Gs1);
        assert_eq!(store.description(4, 0), Some("Magatama? Not yet."));

        *current.lock().unwrap() = Some(Title::Gs2);
        assert_eq!(store.description(4, 0), Some("Magatama."));

        *current.lock().unwrap() = Some(Title::Gs3);
        assert!(!store.has_description(4));
    }

    #[test]
    fn reload_with_empty_folder_clears_table() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("Details/GS1");
        write(&dir, "1.txt", "One");
        write(&dir, "2.txt", "Two");

        let mut store = DetailStore::new(root.path(), FixedTitle(Title::Gs1));
        assert_eq!(store.initialize().counts[&Title::Gs1], 2);

        fs::remove_file(dir.join("1.txt")).unwrap();
        fs::remove_file(dir.join("2.txt")).unwrap();

        let summary = store.reload();
        assert_eq!(summary.counts[&Title::Gs1], 0);
        assert!(!store.has_description(1));
        assert!(!store.has_description(2));
    }

    #[test]
    fn reload_replaces_changed_text() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("Details/GS3");
        write(&dir, "8.txt", "Old");

        let mut store = DetailStore::new(root.path(), FixedTitle(Title::Gs3));
        store.initialize();
        assert_eq!(store.description(8, 0), Some("Old"));

        write(&dir, "8.txt", "New\n---\nMore");
        assert_eq!(store.reload_title(Title::Gs3), 1);
        assert_eq!(store.description(8, 0), Some("New"));
        assert_eq!(store.page_count(8), 2);
    }

    #[test]
    fn duplicate_ids_resolve_to_the_later_file() {
        let (_root, store) = store_with_files(&[
            (Title::Gs1, "05.txt", "Padded"),
            (Title::Gs1, "5.txt", "Plain"),
        ]);

        // "05.txt" sorts before "5.txt", so the plain name wins.
        assert_eq!(store.entry_count(Title::Gs1), 1);
        assert_eq!(store.description(5, 0), Some("Plain"));
    }

    #[test]
    fn missing_root_loads_nothing() {
        let mut store = DetailStore::new("/definitely/not/here", FixedTitle(Title::Gs1));
        assert_eq!(store.initialize().total(), 0);
        assert_eq!(store.page_count(1), 0);
    }
}
