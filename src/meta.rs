//! The mod's own systems: settings, spoken phrases and page navigation. These only read game state
//! through `crate::game`.

pub mod reader;
pub mod settings;
pub mod speech;
pub mod strings;

/// Folder, relative to the game root, that holds the mod's data and settings.
pub const DATA_DIR: &str = "UserData/AccessibilityMod";
