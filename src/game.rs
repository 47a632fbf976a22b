//! Game-facing state: which title is running and the text we read out for it.

pub mod details;
pub mod names;
pub mod title;

pub use details::{DetailDescription, DetailStore, LoadSummary};
pub use names::NameTable;
pub use title::{FixedTitle, Title, TitleProvider};
