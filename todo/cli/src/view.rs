//! Text rendering for the terminal, coloured according to the selected theme.

use crate::model::{Todo, TodoPage};
use crate::state::{ClientState, Theme};
use colored::{Color, ColoredString, Colorize};
use std::fmt::Write;

struct Palette {
    accent: Color,
    muted: Color,
    done: Color,
    error: Color,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Light => Palette {
            accent: Color::Blue,
            muted: Color::BrightBlack,
            done: Color::Green,
            error: Color::Red,
        },
        Theme::Dark => Palette {
            accent: Color::BrightCyan,
            muted: Color::White,
            done: Color::BrightGreen,
            error: Color::BrightRed,
        },
    }
}

fn paint(colour: Color, text: &str) -> ColoredString {
    text.color(colour)
}

fn checkbox(todo: &Todo) -> &'static str {
    if todo.is_completed { "[x]" } else { "[ ]" }
}

/// One line per todo, followed by the page position and the active filters.
pub fn render_page(page: &TodoPage, state: &ClientState) -> String {
    let colours = palette(state.theme);
    let mut out = String::new();

    if page.items.is_empty() {
        let _ = writeln!(out, "{}", paint(colours.muted, "No todos found"));
    }
    for todo in &page.items {
        let marker = if todo.is_completed {
            paint(colours.done, checkbox(todo))
        } else {
            checkbox(todo).normal()
        };
        let _ = write!(
            out,
            "{marker} {} {} ({})",
            paint(colours.accent, &format!("#{}", todo.id)),
            todo.title,
            todo.priority.label()
        );
        if !todo.category.is_empty() {
            let _ = write!(out, " [{}]", todo.category);
        }
        if let Some(due) = todo.next_due_date {
            let _ = write!(out, " due {}", due.format("%Y-%m-%d"));
        }
        out.push('\n');
    }

    let _ = write!(
        out,
        "{}",
        paint(
            colours.muted,
            &format!(
                "Page {} of {} ({} todos)",
                state.page,
                page.total_pages.max(1),
                page.total_count
            )
        )
    );
    if !state.filters.is_empty() {
        let _ = write!(out, "\n{}", paint(colours.muted, &describe_filters(state)));
    }
    out
}

fn describe_filters(state: &ClientState) -> String {
    let filters = &state.filters;
    let mut parts = Vec::new();
    if let Some(search) = &filters.search {
        parts.push(format!("search \"{search}\""));
    }
    if let Some(category) = &filters.category {
        parts.push(format!("category {category}"));
    }
    if let Some(priority) = filters.priority {
        parts.push(format!("priority {}", priority.label()));
    }
    if let Some(completed) = filters.completed {
        parts.push(if completed { "completed" } else { "open" }.to_string());
    }
    format!("Filters: {}", parts.join(", "))
}

/// Full detail view of a single todo including its comments.
pub fn render_todo(todo: &Todo, theme: Theme) -> String {
    let colours = palette(theme);
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} {} {}",
        checkbox(todo),
        paint(colours.accent, &format!("#{}", todo.id)),
        todo.title
    );
    if !todo.description.is_empty() {
        let _ = writeln!(out, "  {}", todo.description);
    }
    let _ = writeln!(out, "  Priority: {}", todo.priority.label());
    if !todo.category.is_empty() {
        let _ = writeln!(out, "  Category: {}", todo.category);
    }
    if let Some(kind) = todo.recurrence_type {
        let every = todo.recurrence_interval.unwrap_or(1);
        let _ = writeln!(out, "  Repeats: {} (every {every})", kind.label());
    }
    if let Some(due) = todo.next_due_date {
        let _ = writeln!(out, "  Next due: {}", due.format("%Y-%m-%d %H:%M"));
    }
    if let Some(done) = todo.last_completed_date {
        let _ = writeln!(out, "  Last completed: {}", done.format("%Y-%m-%d %H:%M"));
    }
    let _ = write!(
        out,
        "{}",
        paint(
            colours.muted,
            &format!("  Created {}", todo.created_date.format("%Y-%m-%d %H:%M"))
        )
    );
    for comment in &todo.comments {
        let _ = write!(
            out,
            "\n  {} {}",
            paint(colours.muted, &comment.created_date.format("%Y-%m-%d").to_string()),
            comment.content
        );
    }
    out
}

pub fn render_categories(categories: &[String], theme: Theme) -> String {
    if categories.is_empty() {
        return paint(palette(theme).muted, "No categories").to_string();
    }
    categories.join("\n")
}

pub fn render_banner(message: &str, theme: Theme) -> String {
    paint(palette(theme).error, &format!("Error: {message}"))
        .bold()
        .to_string()
}
