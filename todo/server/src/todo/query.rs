//! Filter, sort and paginate pipeline for todo listings.
//!
//! The pipeline runs in three explicit stages over already loaded records so that the
//! ordering and paging rules do not depend on a particular storage engine:
//! predicate application, sorting, then offset/limit.

use crate::entities::sea_orm_active_enums::Priority;
use crate::entities::todo;
use std::cmp::Ordering;

/// Number of todos returned per page.
pub const PAGE_SIZE: usize = 10;

/// Categories offered when no todo has a category yet.
pub const DEFAULT_CATEGORIES: [&str; 4] = ["Personal", "Work", "Shopping", "Health"];

/// Optional listing filters. Every present filter must match; absent or empty ones are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoFilter {
    /// Case-sensitive substring matched against the title or the description.
    pub search: Option<String>,
    /// Exact category match.
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub is_completed: Option<bool>,
}

impl TodoFilter {
    /// Returns true when the todo satisfies every active filter.
    pub fn matches(&self, todo: &todo::Model) -> bool {
        let search_matches = match non_empty(&self.search) {
            Some(needle) => todo.title.contains(needle) || todo.description.contains(needle),
            None => true,
        };
        let category_matches = match non_empty(&self.category) {
            Some(category) => todo.category == category,
            None => true,
        };
        let priority_matches = self.priority.is_none_or(|priority| todo.priority == priority);
        let completion_matches = self
            .is_completed
            .is_none_or(|is_completed| todo.is_completed == is_completed);

        search_matches && category_matches && priority_matches && completion_matches
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

/// One page of an ordered, filtered listing plus the totals computed before slicing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_count: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Converts the items while keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            total_count: self.total_count,
            total_pages: self.total_pages,
        }
    }
}

/// Listing order: priority descending, next due date ascending with undated todos last,
/// then id ascending.
pub fn listing_order(a: &todo::Model, b: &todo::Model) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| match (a.next_due_date, b.next_due_date) {
            (Some(a_due), Some(b_due)) => a_due.cmp(&b_due),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.id.cmp(&b.id))
}

/// Number of pages needed for `total_count` items.
pub fn total_pages(total_count: usize) -> usize {
    total_count.div_ceil(PAGE_SIZE)
}

/// Clamps a requested 1-based page number to at least 1.
pub fn normalize_page(page: Option<i64>) -> usize {
    match page {
        Some(page) if page > 1 => usize::try_from(page).unwrap_or(usize::MAX),
        _ => 1,
    }
}

/// Applies filter, sort and pagination in order.
pub fn paginate(todos: Vec<todo::Model>, filter: &TodoFilter, page: usize) -> Page<todo::Model> {
    let page = page.max(1);

    let mut matching: Vec<todo::Model> = todos
        .into_iter()
        .filter(|todo| filter.matches(todo))
        .collect();

    matching.sort_by(listing_order);

    let total_count = matching.len();
    let offset = (page - 1).saturating_mul(PAGE_SIZE);
    let items = matching.into_iter().skip(offset).take(PAGE_SIZE).collect();

    Page {
        items,
        page,
        total_count,
        total_pages: total_pages(total_count),
    }
}
