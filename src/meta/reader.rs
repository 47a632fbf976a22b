//! Page navigation for the description that is currently open.

use super::{
    settings::{MissingDescription, Options},
    strings::{MessageKey, Phrases},
};
use crate::game::DetailStore;

/// Everything the reader needs to turn a page into speech.
pub struct Context<'a> {
    pub store: &'a DetailStore,
    pub phrases: &'a Phrases,
    pub options: &'a Options,
}

impl Context<'_> {
    /// The text for one page, with the page position added if the settings ask for it.
    fn render(&self, detail_id: i32, page: usize) -> Option<String> {
        let text = self.store.description(detail_id, page)?;
        let total = self.store.page_count(detail_id);

        if !self.options.page_numbers.should_announce(total) {
            return Some(text.to_string());
        }

        let position = self.phrases.format(
            MessageKey::PagePosition,
            &[("page", (page + 1).to_string()), ("total", total.to_string())],
        );

        Some(format!("{text}\n{position}"))
    }
}

/// The open description and page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Position {
    detail_id: i32,
    page: usize,
}

/// Tracks which description is open and which page the player is on. Every method returns the text
/// to speak, or `None` if nothing should be said.
#[derive(Default, Debug)]
pub struct DetailReader {
    open: Option<Position>,
}

impl DetailReader {
    /// Opens the first page of `detail_id`.
    pub fn open(&mut self, ctx: &Context, detail_id: i32) -> Option<String> {
        if ctx.store.page_count(detail_id) == 0 {
            self.open = None;

            return match ctx.options.missing_description {
                MissingDescription::Silent => None,
                MissingDescription::Announce => {
                    Some(ctx.phrases.get(MessageKey::NoDescription).to_string())
                }
            };
        }

        let position = Position { detail_id, page: 0 };
        self.open = Some(position);

        ctx.render(position.detail_id, position.page)
    }

    /// Forgets the open description.
    pub fn close(&mut self) {
        self.open = None;
    }

    /// Returns the open detail ID and page index.
    pub fn position(&self) -> Option<(i32, usize)> {
        self.open.map(|pos| (pos.detail_id, pos.page))
    }

    /// Moves to the next page. On the last page, says so instead.
    pub fn next_page(&mut self, ctx: &Context) -> Option<String> {
        self.step(ctx, |page, total| {
            if page + 1 < total {
                Ok(page + 1)
            } else {
                Err(MessageKey::LastPage)
            }
        })
    }

    /// Moves to the previous page. On the first page, says so instead.
    pub fn previous_page(&mut self, ctx: &Context) -> Option<String> {
        self.step(ctx, |page, _| page.checked_sub(1).ok_or(MessageKey::FirstPage))
    }

    /// Reads the current page again.
    pub fn repeat(&mut self, ctx: &Context) -> Option<String> {
        self.step(ctx, |page, _| Ok(page))
    }

    fn step(
        &mut self,
        ctx: &Context,
        next: impl FnOnce(usize, usize) -> Result<usize, MessageKey>,
    ) -> Option<String> {
        let Some(mut position) = self.open else {
            return Some(ctx.phrases.get(MessageKey::NothingOpen).to_string());
        };

        let total = ctx.store.page_count(position.detail_id);

        // The description may have changed under us after a reload.
        if total == 0 {
            self.open = None;
            return Some(ctx.phrases.get(MessageKey::NoDescription).to_string());
        }

        position.page = position.page.min(total - 1);

        match next(position.page, total) {
            Ok(page) => {
                position.page = page;
                self.open = Some(position);
                ctx.render(position.detail_id, position.page)
            }

            Err(boundary) => {
                self.open = Some(position);
                Some(ctx.phrases.get(boundary).to_string())
            }
        }
    }
}
