//! Pure derivation of the rendered slice: filter, stable sort, paginate.

use std::cmp::Ordering;

use crate::entity::{Entity, FieldValue};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery<F> {
    pub search: String,
    pub sort: Option<F>,
    pub direction: SortDirection,
    pub page_size: usize,
    /// 1-based.
    pub page: usize,
}

impl<F> Default for ListQuery<F> {
    fn default() -> Self {
        Self {
            search: String::new(),
            sort: None,
            direction: SortDirection::Ascending,
            page_size: DEFAULT_PAGE_SIZE,
            page: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedView<T> {
    pub items: Vec<T>,
    pub filtered_count: usize,
    /// Zero when nothing matches.
    pub total_pages: usize,
    pub page: usize,
    pub page_size: usize,
}

pub fn matches_search<T: Entity>(item: &T, needle_lowercase: &str) -> bool {
    needle_lowercase.is_empty()
        || T::SEARCHABLE
            .iter()
            .any(|field| item.field_value(*field).contains_lowercase(needle_lowercase))
}

pub fn filter_items<'a, T: Entity>(items: &'a [T], search: &str) -> Vec<&'a T> {
    let needle = search.to_lowercase();
    items
        .iter()
        .filter(|item| matches_search(*item, &needle))
        .collect()
}

/// Three-way comparison of field values. Missing values order first; values of
/// different kinds order number < time < text.
pub fn compare_values(left: &FieldValue<'_>, right: &FieldValue<'_>) -> Ordering {
    fn rank(value: &FieldValue<'_>) -> u8 {
        match value {
            FieldValue::Missing => 0,
            FieldValue::Number(_) => 1,
            FieldValue::Time(_) => 2,
            FieldValue::Text(_) => 3,
        }
    }

    match (left, right) {
        (FieldValue::Number(a), FieldValue::Number(b)) => a.total_cmp(b),
        (FieldValue::Time(a), FieldValue::Time(b)) => a.cmp(b),
        (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
        _ => rank(left).cmp(&rank(right)),
    }
}

/// Stable sort; equal keys keep their incoming order in both directions.
pub fn sort_items<T: Entity>(items: &mut [&T], field: Option<T::Field>, direction: SortDirection) {
    let Some(field) = field else {
        return;
    };
    items.sort_by(|a, b| {
        let ordering = compare_values(&a.field_value(field), &b.field_value(field));
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

pub fn total_pages(filtered_count: usize, page_size: usize) -> usize {
    filtered_count.div_ceil(page_size.max(1))
}

pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

pub fn derive<T: Entity>(items: &[T], query: &ListQuery<T::Field>) -> DerivedView<T> {
    let mut filtered = filter_items(items, &query.search);
    sort_items(&mut filtered, query.sort, query.direction);

    let page_size = query.page_size.max(1);
    let filtered_count = filtered.len();
    let total_pages = total_pages(filtered_count, page_size);
    let page = clamp_page(query.page, total_pages);
    let start = (page - 1) * page_size;

    DerivedView {
        items: filtered
            .into_iter()
            .skip(start)
            .take(page_size)
            .cloned()
            .collect(),
        filtered_count,
        total_pages,
        page,
        page_size,
    }
}

/// Declarative row interaction state; the renderer looks the class up
/// instead of mutating styles on pointer events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowState {
    pub hovered: bool,
    pub active: bool,
}

pub fn row_class(state: RowState) -> &'static str {
    match (state.active, state.hovered) {
        (true, _) => "row row--active",
        (false, true) => "row row--hover",
        (false, false) => "row",
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
