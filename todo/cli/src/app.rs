//! Command handling for the terminal client.
//!
//! Every command issues at most the requests it needs against a [`TodoApi`] and
//! updates the [`ClientState`]. A failure becomes the error banner; the next
//! successful command clears it. Local state is never rolled back.

use crate::client::{ClientError, TodoApi};
use crate::model::{Priority, RecurrenceType, Todo, TodoInput};
use crate::state::{ClientState, FilterState, Theme};
use crate::view;
use clap::{Args, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("Cannot access file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List todos, optionally changing the filters or the page
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long)]
        completed: Option<bool>,
        #[arg(long)]
        page: Option<u32>,
    },
    /// Show the next page of the current listing
    Next,
    /// Show the previous page of the current listing
    Prev,
    /// Drop every filter and list from the first page
    ClearFilters,
    /// Show a todo with its comments
    Show { id: i32 },
    /// Create a todo
    Add {
        title: String,
        #[command(flatten)]
        fields: TodoFields,
    },
    /// Flip the completion state of a todo
    Toggle { id: i32 },
    /// Change fields of an existing todo
    Edit {
        id: i32,
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        fields: TodoFields,
        /// Stop the todo from repeating
        #[arg(long, conflicts_with_all = ["recur", "every"])]
        no_recur: bool,
    },
    /// Delete a todo and its comments
    Delete { id: i32 },
    /// Add a comment to a todo
    Comment { id: i32, text: String },
    /// List the categories in use
    Categories,
    /// Edit the local category list
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },
    /// Switch the colour theme
    Theme {
        #[arg(value_enum)]
        mode: ThemeMode,
    },
    /// Download every todo as JSON
    Export {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Upload todos from a JSON file as new records
    Import { file: PathBuf },
}

#[derive(Debug, Clone, Default, Args)]
pub struct TodoFields {
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, value_enum)]
    pub priority: Option<Priority>,
    #[arg(long)]
    pub category: Option<String>,
    /// Repeat the todo on this schedule
    #[arg(long, value_enum)]
    pub recur: Option<RecurrenceType>,
    /// Repeat interval, in units of the schedule
    #[arg(long)]
    pub every: Option<i32>,
}

impl TodoFields {
    fn apply(self, input: &mut TodoInput) {
        if let Some(description) = self.description {
            input.description = description;
        }
        if let Some(priority) = self.priority {
            input.priority = Some(priority);
        }
        if let Some(category) = self.category {
            input.category = category;
        }
        if let Some(kind) = self.recur {
            input.recurrence_type = Some(kind);
            input.recurrence_interval = Some(self.every.unwrap_or(1));
        } else if let Some(every) = self.every {
            input.recurrence_interval = Some(every);
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum CategoryAction {
    Add { name: String },
    Remove { name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeMode {
    Light,
    Dark,
    Toggle,
}

/// Runs one command and returns the text to print.
///
/// Failures are recorded as the error banner and rendered instead of the command output.
pub async fn execute(api: &dyn TodoApi, state: &mut ClientState, command: Command) -> String {
    match dispatch(api, state, command).await {
        Ok(output) => {
            state.clear_error();
            output
        }
        Err(err) => {
            tracing::warn!("Command failed: {}", err);
            state.record_error(err.to_string());
            view::render_banner(&err.to_string(), state.theme)
        }
    }
}

async fn dispatch(
    api: &dyn TodoApi,
    state: &mut ClientState,
    command: Command,
) -> Result<String, AppError> {
    match command {
        Command::List {
            search,
            category,
            priority,
            completed,
            page,
        } => {
            let changed = FilterState {
                search: search.or_else(|| state.filters.search.clone()),
                category: category.or_else(|| state.filters.category.clone()),
                priority: priority.or(state.filters.priority),
                completed: completed.or(state.filters.completed),
            };
            if changed != state.filters {
                state.set_filters(changed);
            }
            if let Some(page) = page {
                state.go_to_page(page);
            }
            refresh(api, state).await
        }
        Command::Next => {
            if !state.next_page() {
                return Err(AppError::Invalid("Already on the last page".to_string()));
            }
            refresh(api, state).await
        }
        Command::Prev => {
            if !state.prev_page() {
                return Err(AppError::Invalid("Already on the first page".to_string()));
            }
            refresh(api, state).await
        }
        Command::ClearFilters => {
            state.clear_filters();
            refresh(api, state).await
        }
        Command::Show { id } => {
            let todo = api.get(id).await?;
            Ok(view::render_todo(&todo, state.theme))
        }
        Command::Add { title, fields } => {
            let mut input = TodoInput {
                title,
                ..Default::default()
            };
            fields.apply(&mut input);
            let created = api.create(input).await?;
            Ok(format!(
                "Created todo #{}\n{}",
                created.id,
                view::render_todo(&created, state.theme)
            ))
        }
        Command::Toggle { id } => {
            let todo = api.get(id).await?;
            let mut input = TodoInput::from(&todo);
            input.is_completed = !todo.is_completed;
            save(api, state, id, input).await
        }
        Command::Edit {
            id,
            title,
            fields,
            no_recur,
        } => {
            let todo = api.get(id).await?;
            let mut input = TodoInput::from(&todo);
            if let Some(title) = title {
                input.title = title;
            }
            fields.apply(&mut input);
            if no_recur {
                input.recurrence_type = None;
                input.recurrence_interval = None;
                input.next_due_date = None;
            }
            save(api, state, id, input).await
        }
        Command::Delete { id } => {
            api.delete(id).await?;
            Ok(format!("Deleted todo #{id}"))
        }
        Command::Comment { id, text } => {
            let comment = api.add_comment(id, text).await?;
            Ok(format!("Added comment #{} to todo #{id}", comment.id))
        }
        Command::Categories => {
            let categories = api.categories().await?;
            state.merge_categories(categories);
            Ok(view::render_categories(&state.categories, state.theme))
        }
        Command::Category { action } => match action {
            CategoryAction::Add { name } => {
                if !state.add_category(&name) {
                    return Err(AppError::Invalid(format!(
                        "Category '{}' is blank or already listed",
                        name.trim()
                    )));
                }
                Ok(view::render_categories(&state.categories, state.theme))
            }
            CategoryAction::Remove { name } => {
                if !state.remove_category(&name) {
                    return Err(AppError::Invalid(format!("Category '{name}' is not listed")));
                }
                Ok(view::render_categories(&state.categories, state.theme))
            }
        },
        Command::Theme { mode } => {
            state.theme = match mode {
                ThemeMode::Light => Theme::Light,
                ThemeMode::Dark => Theme::Dark,
                ThemeMode::Toggle => state.theme.toggled(),
            };
            Ok(format!("Theme set to {}", state.theme.name()))
        }
        Command::Export { output } => {
            let todos = api.export().await?;
            let json = serde_json::to_string_pretty(&todos)?;
            match output {
                Some(path) => {
                    fs::write(&path, json)?;
                    Ok(format!("Exported {} todos to {}", todos.len(), path.display()))
                }
                None => Ok(json),
            }
        }
        Command::Import { file } => {
            let contents = fs::read_to_string(&file)?;
            let todos: Vec<TodoInput> = serde_json::from_str(&contents)?;
            let imported = api.import(todos).await?;
            Ok(format!("Imported {} todos", imported.len()))
        }
    }
}

/// Fetches the current page and records the reported page count.
async fn refresh(api: &dyn TodoApi, state: &mut ClientState) -> Result<String, AppError> {
    let page = api.list(state.list_query()).await?;
    state.total_pages = page.total_pages;
    Ok(view::render_page(&page, state))
}

/// Sends a full update, then reloads the todo so server-side rescheduling is shown.
async fn save(
    api: &dyn TodoApi,
    state: &ClientState,
    id: i32,
    input: TodoInput,
) -> Result<String, AppError> {
    api.update(id, input).await?;
    let todo: Todo = api.get(id).await?;
    Ok(view::render_todo(&todo, state.theme))
}
