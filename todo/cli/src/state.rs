//! Client-side state kept between invocations.
//!
//! The state file is read once when the client starts and written once before it exits.

use crate::model::{ListQuery, Priority};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_STATE_FILE: &str = ".todo-cli.json";

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Cannot access state file: {0}")]
    Io(#[from] std::io::Error),
    #[error("State file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn name(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Filters applied to every listing until changed or cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    pub search: Option<String>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        *self == FilterState::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientState {
    pub theme: Theme,
    pub filters: FilterState,
    /// 1-based page of the current listing.
    pub page: u32,
    /// Page count reported by the last listing.
    pub total_pages: u32,
    /// Category picker list. Additions and removals never reach the server.
    pub categories: Vec<String>,
    /// Error banner from the last failed action.
    pub error: Option<String>,
}

impl Default for ClientState {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            filters: FilterState::default(),
            page: 1,
            total_pages: 0,
            categories: Vec::new(),
            error: None,
        }
    }
}

impl ClientState {
    /// Reads the state file, starting fresh when it does not exist yet.
    pub fn load(path: &Path) -> Result<Self, StateError> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn list_query(&self) -> ListQuery {
        ListQuery {
            page: self.page.max(1),
            search: self.filters.search.clone(),
            category: self.filters.category.clone(),
            priority: self.filters.priority,
            is_completed: self.filters.completed,
        }
    }

    /// Replaces the filters and goes back to the first page.
    pub fn set_filters(&mut self, filters: FilterState) {
        self.filters = filters;
        self.page = 1;
    }

    pub fn clear_filters(&mut self) {
        self.set_filters(FilterState::default());
    }

    pub fn go_to_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Advances one page. Returns false when already on the last known page.
    pub fn next_page(&mut self) -> bool {
        if self.page >= self.total_pages {
            return false;
        }
        self.page += 1;
        true
    }

    /// Steps back one page. Returns false when already on the first page.
    pub fn prev_page(&mut self) -> bool {
        if self.page <= 1 {
            return false;
        }
        self.page -= 1;
        true
    }

    /// Adds categories from the server that the picker does not list yet.
    pub fn merge_categories(&mut self, categories: Vec<String>) {
        for category in categories {
            if !self.categories.contains(&category) {
                self.categories.push(category);
            }
        }
    }

    /// Adds a category to the picker. Returns false for blank or duplicate names.
    pub fn add_category(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.categories.iter().any(|c| c == name) {
            return false;
        }
        self.categories.push(name.to_string());
        true
    }

    /// Removes a category from the picker. Returns false when it was not listed.
    pub fn remove_category(&mut self, name: &str) -> bool {
        let before = self.categories.len();
        self.categories.retain(|c| c != name.trim());
        self.categories.len() != before
    }

    pub fn record_error(&mut self, message: String) {
        self.error = Some(message);
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// True when the last action failed.
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}
