//! Screen reader support for the Ace Attorney trilogy.
//!
//! The library is loaded by the game's mod loader, which drives it through the functions in
//! [`plugin`]. The same crate also provides the installer that downloads releases and puts them in
//! the right places (see [`install`] and the `accessibility-installer` binary).

pub mod game;
pub mod install;
pub mod logging;
pub mod meta;
pub mod plugin;
pub mod text;

pub use game::{DetailDescription, DetailStore, Title, TitleProvider};
pub use plugin::Plugin;
