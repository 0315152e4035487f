use crate::flip::Navigator;
use crate::models::{Mode, Page};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum CollectionError {
    #[error("page index {index} is out of range (book has {len} pages)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("switch to Write mode to add or edit pages")]
    ReadOnly,
}

/// Operations the current (mode, contents) combination allows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Capabilities {
    pub append: bool,
    pub edit: bool,
    pub navigate: bool,
}

/// The authoritative, ordered list of pages.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct PageCollection {
    pages: Vec<Page>,
}

impl PageCollection {
    pub fn from_pages(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn capabilities(&self, mode: Mode) -> Capabilities {
        let write = mode.is_write();
        Capabilities {
            append: write,
            edit: write && !self.is_empty(),
            navigate: !self.is_empty(),
        }
    }

    /// Identity for the next appended page.
    pub fn next_number(&self) -> u32 {
        self.pages
            .iter()
            .map(|p| p.number)
            .max()
            .map_or(1, |n| n.saturating_add(1))
    }

    /// Append an empty page. Returns its index and a copy of it.
    pub fn append_blank(&mut self, mode: Mode) -> Result<(usize, Page), CollectionError> {
        if !self.capabilities(mode).append {
            return Err(CollectionError::ReadOnly);
        }
        let page = Page::blank(self.next_number());
        self.pages.push(page.clone());
        Ok((self.pages.len() - 1, page))
    }

    /// Replace the page at `index`. The caller is responsible for the index
    /// matching the page; no identity lookup happens here.
    pub fn update_at(&mut self, index: usize, page: Page) -> Result<(), CollectionError> {
        let len = self.pages.len();
        let slot = self
            .pages
            .get_mut(index)
            .ok_or(CollectionError::IndexOutOfRange { index, len })?;
        *slot = page;
        Ok(())
    }

    /// Insert or overwrite by page number, keeping book order. Returns the index.
    pub fn upsert(&mut self, page: Page) -> usize {
        if let Some(i) = self.pages.iter().position(|p| p.number == page.number) {
            self.pages[i] = page;
            return i;
        }
        let i = self.pages.partition_point(|p| p.number < page.number);
        self.pages.insert(i, page);
        i
    }

    /// All pages, with the one sharing `page.number` swapped for `page`.
    pub fn with_replaced(&self, page: &Page) -> Vec<Page> {
        self.pages
            .iter()
            .map(|p| if p.number == page.number { page.clone() } else { p.clone() })
            .collect()
    }

    /// Clamp `target` into the book. `None` when the book is empty.
    pub fn clamp_index(&self, target: i64) -> Option<usize> {
        let last = self.pages.len().checked_sub(1)?;
        Some(target.clamp(0, last as i64) as usize)
    }

    /// Clamp and ask the navigator to show that page.
    ///
    /// No-op (returns `None`) when the book is empty or nothing is mounted yet.
    pub fn jump_to(&self, target: i64, nav: Option<&dyn Navigator>) -> Option<usize> {
        let nav = nav?;
        let index = self.clamp_index(target)?;
        nav.flip(index);
        Some(index)
    }

    /// Case-insensitive title search. An empty query lists every page.
    pub fn search_titles(&self, query: &str) -> Vec<(usize, &Page)> {
        let query = query.trim().to_lowercase();
        self.pages
            .iter()
            .enumerate()
            .filter(|(_, p)| query.is_empty() || p.title.to_lowercase().contains(&query))
            .collect()
    }
}
