use crate::model::{FilterColumn, TrackRow};
use std::collections::BTreeSet;
use unicode_normalization::UnicodeNormalization;

pub const COMBINED_VIEW_PAGE_SIZE: usize = 10;
pub const SIMPLE_VIEW_PAGE_SIZE: usize = 20;

/// Search, column, year and page selection for the rows table.
///
/// Every filter change sends the view back to page 1. Filters are
/// independent: changing one never clears another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    search: String,
    column: FilterColumn,
    years: BTreeSet<i32>,
    page: usize,
    page_size: usize,
}

impl Default for QueryState {
    fn default() -> Self {
        Self::new(COMBINED_VIEW_PAGE_SIZE)
    }
}

impl QueryState {
    pub fn new(page_size: usize) -> Self {
        Self {
            search: String::new(),
            column: FilterColumn::default(),
            years: BTreeSet::new(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn with_column(mut self, column: FilterColumn) -> Self {
        self.column = column;
        self
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn column(&self) -> FilterColumn {
        self.column
    }

    pub fn years(&self) -> &BTreeSet<i32> {
        &self.years
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn has_search(&self) -> bool {
        !self.search.is_empty()
    }

    pub fn set_search(&mut self, value: &str) {
        self.search = value.to_string();
        self.page = 1;
    }

    pub fn clear_search(&mut self) {
        self.set_search("");
    }

    pub fn set_column(&mut self, column: FilterColumn) {
        self.column = column;
        self.page = 1;
    }

    pub fn set_years<I>(&mut self, years: I)
    where
        I: IntoIterator<Item = i32>,
    {
        self.years = years.into_iter().collect();
        self.page = 1;
    }

    pub fn toggle_year(&mut self, year: i32) {
        if !self.years.remove(&year) {
            self.years.insert(year);
        }
        self.page = 1;
    }

    pub fn clear_years(&mut self) {
        self.set_years([]);
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryPage {
    pub rows: Vec<TrackRow>,
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub matching_rows: usize,
}

/// Narrows `rows` to the current search without changing their order.
pub fn filter_rows<'a>(rows: &'a [TrackRow], state: &QueryState) -> Vec<&'a TrackRow> {
    if !state.has_search() {
        return rows.iter().collect();
    }

    let needle = fold_text(state.search());
    rows.iter()
        .filter(|row| fold_text(state.column().value_of(row)).contains(&needle))
        .collect()
}

pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1))
}

/// The 1-based `page` of `items`; empty when the page is out of range.
pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let page_size = page_size.max(1);
    let Some(start) = page
        .checked_sub(1)
        .and_then(|index| index.checked_mul(page_size))
    else {
        return &[];
    };
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

pub fn run_query(rows: &[TrackRow], state: &QueryState) -> QueryPage {
    let matching = filter_rows(rows, state);
    QueryPage {
        rows: page_slice(&matching, state.page(), state.page_size())
            .iter()
            .map(|row| (*row).clone())
            .collect(),
        page: state.page(),
        page_size: state.page_size(),
        page_count: page_count(matching.len(), state.page_size()),
        matching_rows: matching.len(),
    }
}

fn fold_text(text: &str) -> String {
    text.nfc().collect::<String>().to_lowercase()
}
