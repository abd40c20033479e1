//! State behind the characters page: current search and page, and the
//! pagination controls derived from a list response.

use crate::models::{CharacterFilters, PageInfo};

/// Search term and page number that select the visible list page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterBrowser {
    search: String,
    page: u32,
}

impl Default for CharacterBrowser {
    fn default() -> Self {
        Self {
            search: String::new(),
            page: 1,
        }
    }
}

impl CharacterBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Filters for the current state; this is what keys the list query.
    pub fn filters(&self) -> CharacterFilters {
        CharacterFilters::new()
            .with_name(&self.search)
            .with_page(self.page)
    }

    /// A new search always starts from page 1. Returns whether the filters
    /// changed.
    pub fn set_search(&mut self, term: &str) -> bool {
        let before = self.filters();
        self.search = term.to_string();
        self.page = 1;
        self.filters() != before
    }

    /// Pages start at 1; lower values clamp.
    pub fn set_page(&mut self, page: u32) -> bool {
        let page = page.max(1);
        let changed = page != self.page;
        self.page = page;
        changed
    }

    /// Advance when the response says a next page exists.
    pub fn next_page(&mut self, info: &PageInfo) -> bool {
        if !info.has_next() {
            return false;
        }
        self.set_page(self.page.saturating_add(1))
    }

    pub fn prev_page(&mut self, info: &PageInfo) -> bool {
        if !info.has_prev() {
            return false;
        }
        self.set_page(self.page.saturating_sub(1))
    }
}

/// Pagination bar state for one list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageControls {
    pub page: u32,
    pub total_pages: u32,
    pub has_prev: bool,
    pub has_next: bool,
}

impl PageControls {
    pub fn new(page: u32, info: &PageInfo) -> Self {
        Self {
            page,
            total_pages: info.pages,
            has_prev: info.has_prev(),
            has_next: info.has_next(),
        }
    }

    /// The bar is hidden for single-page results.
    pub fn is_visible(&self) -> bool {
        self.total_pages > 1
    }

    /// "2 / 42"
    pub fn label(&self) -> String {
        format!("{} / {}", self.page, self.total_pages)
    }
}

/// "Showing 107 characters matching \"rick\"", the line above the results.
pub fn results_summary(info: &PageInfo, search: &str) -> String {
    let search = search.trim();
    if search.is_empty() {
        format!("Showing {} characters", info.count)
    } else {
        format!("Showing {} characters matching \"{}\"", info.count, search)
    }
}
