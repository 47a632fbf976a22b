//! The three games in the trilogy, and access to which one is running.

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoStaticStr};

/// One of the games bundled in the trilogy. Each has its own description and name tables.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Debug,
    Default,
    EnumIter,
    IntoStaticStr,
)]
pub enum Title {
    /// Phoenix Wright: Ace Attorney. Used whenever the host can't tell us the title.
    #[default]
    #[strum(serialize = "GS1")]
    Gs1,

    /// Justice for All.
    #[strum(serialize = "GS2")]
    Gs2,

    /// Trials and Tribulations.
    #[strum(serialize = "GS3")]
    Gs3,
}

impl Title {
    /// Converts the host's title index into a `Title`. Returns `None` for values outside the
    /// trilogy.
    pub fn from_index(index: i32) -> Option<Title> {
        match index {
            0 => Some(Title::Gs1),
            1 => Some(Title::Gs2),
            2 => Some(Title::Gs3),
            _ => None,
        }
    }

    /// The name of this title's data folder (and data file stem).
    pub fn folder_name(self) -> &'static str {
        self.into()
    }
}

/// Tells us which game the host is currently running. The host's state may not be readable yet
/// (for example, on the launcher screen), in which case this returns `None`.
pub trait TitleProvider {
    fn current_title(&self) -> Option<Title>;
}

impl<F> TitleProvider for F
where
    F: Fn() -> Option<Title>,
{
    fn current_title(&self) -> Option<Title> {
        self()
    }
}

/// Provider that always reports the same title. Useful when there is no host to ask.
#[derive(Clone, Copy, Debug)]
pub struct FixedTitle(pub Title);

impl TitleProvider for FixedTitle {
    fn current_title(&self) -> Option<Title> {
        Some(self.0)
    }
}
