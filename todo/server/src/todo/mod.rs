use crate::entities::sea_orm_active_enums::{Priority, RecurrenceType};
use crate::entities::*;
use chrono::{DateTime, Utc};
use sea_orm::*;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

pub mod api;
pub mod query;
pub mod recurrence;

use query::{Page, TodoFilter};

/// A comment attached to a todo.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct Comment {
    pub id: i32,
    pub content: String,
    pub created_date: DateTime<Utc>,
    pub todo_id: i32,
}

impl From<todo_comment::Model> for Comment {
    fn from(model: todo_comment::Model) -> Self {
        Self {
            id: model.id,
            content: model.content,
            created_date: model.created_date,
            todo_id: model.todo_id,
        }
    }
}

/// A todo together with its comments, oldest comment first.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct Todo {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub is_completed: bool,
    pub created_date: DateTime<Utc>,
    pub priority: Priority,
    pub category: String,
    pub recurrence_type: Option<RecurrenceType>,
    pub recurrence_interval: Option<i32>,
    pub next_due_date: Option<DateTime<Utc>>,
    pub last_completed_date: Option<DateTime<Utc>>,
    pub comments: Vec<Comment>,
}

impl Todo {
    fn from_parts(model: todo::Model, comments: Vec<todo_comment::Model>) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            is_completed: model.is_completed,
            created_date: model.created_date,
            priority: model.priority,
            category: model.category,
            recurrence_type: model.recurrence_type,
            recurrence_interval: model.recurrence_interval,
            next_due_date: model.next_due_date,
            last_completed_date: model.last_completed_date,
            comments: comments.into_iter().map(Comment::from).collect(),
        }
    }
}

/// Client-submitted todo fields, used for create, full update and import.
///
/// Missing optional fields fall back to server defaults where the operation defines one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoDraft {
    pub id: Option<i32>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_completed: bool,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub recurrence_type: Option<RecurrenceType>,
    pub recurrence_interval: Option<i32>,
    pub next_due_date: Option<DateTime<Utc>>,
    pub last_completed_date: Option<DateTime<Utc>>,
    /// Comment contents, only honoured by create and import.
    pub comments: Vec<String>,
}

/// Error type for TodoService operations.
#[derive(Debug, thiserror::Error)]
pub enum TodoServiceError {
    /// Represents a missing or invalid required field.
    #[error("Validation failed: {0}")]
    Validation(String),
    /// Represents an update whose body id differs from the route id.
    #[error("Route ID {path_id} does not match body ID {body_id:?}")]
    IdMismatch { path_id: i32, body_id: Option<i32> },
    /// Represents a todo not found error.
    #[error("Todo with ID {0} not found")]
    TodoNotFound(i32),
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Source of the current time for server-assigned timestamps.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

static SYSTEM_CLOCK: SystemClock = SystemClock;

#[derive(Clone, Debug)]
pub struct TodoState {
    pub db: Arc<sea_orm::DatabaseConnection>,
    pub clock: Arc<dyn Clock>,
}

impl TodoState {
    pub fn new(db: sea_orm::DatabaseConnection) -> Self {
        Self {
            db: Arc::new(db),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(db: sea_orm::DatabaseConnection, clock: impl Clock + 'static) -> Self {
        Self {
            db: Arc::new(db),
            clock: Arc::new(clock),
        }
    }

    pub fn service(&self) -> TodoService<'_> {
        TodoService::with_clock(&self.db, self.clock.as_ref())
    }
}

pub struct TodoService<'a> {
    db: &'a sea_orm::DatabaseConnection,
    clock: &'a dyn Clock,
}

impl<'a> TodoService<'a> {
    pub fn new(db: &'a sea_orm::DatabaseConnection) -> TodoService<'a> {
        TodoService {
            db,
            clock: &SYSTEM_CLOCK,
        }
    }

    pub fn with_clock(db: &'a sea_orm::DatabaseConnection, clock: &'a dyn Clock) -> TodoService<'a> {
        TodoService { db, clock }
    }

    /// Lists one page of todos matching `filter`.
    ///
    /// # Arguments
    ///
    /// * `filter` - Filters to apply; empty ones are ignored.
    /// * `page` - The 1-based page number.
    ///
    /// # Returns
    ///
    /// A `Result` containing the requested `Page` with totals computed before slicing.
    #[tracing::instrument(skip(self))]
    pub async fn list_todos(
        &self,
        filter: &TodoFilter,
        page: usize,
    ) -> Result<Page<Todo>, TodoServiceError> {
        let models = todo::Entity::find().all(self.db).await?;
        let page = query::paginate(models, filter, page);

        let ids: Vec<i32> = page.items.iter().map(|model| model.id).collect();
        let mut comments = self.load_comments(&ids).await?;

        Ok(page.map(|model| {
            let todo_comments = comments.remove(&model.id).unwrap_or_default();
            Todo::from_parts(model, todo_comments)
        }))
    }

    /// Retrieves the distinct non-empty categories in use, alphabetically.
    /// Falls back to the default category set when no todo has a category.
    #[tracing::instrument(skip(self))]
    pub async fn get_categories(&self) -> Result<Vec<String>, TodoServiceError> {
        let categories: Vec<String> = todo::Entity::find()
            .select_only()
            .column(todo::Column::Category)
            .distinct()
            .filter(todo::Column::Category.ne(""))
            .order_by_asc(todo::Column::Category)
            .into_tuple()
            .all(self.db)
            .await?;

        if categories.is_empty() {
            return Ok(query::DEFAULT_CATEGORIES
                .iter()
                .map(|category| String::from(*category))
                .collect());
        }
        Ok(categories)
    }

    /// Retrieves a todo and its comments by ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_todo_by_id(&self, id: i32) -> Result<Todo, TodoServiceError> {
        let model = self.find_todo(id).await?;
        let mut comments = self.load_comments(&[id]).await?;
        Ok(Todo::from_parts(
            model,
            comments.remove(&id).unwrap_or_default(),
        ))
    }

    /// Creates a new todo.
    ///
    /// The creation timestamp is assigned here, the todo always starts out incomplete,
    /// and a recurring todo gets its first due date computed from the creation time.
    ///
    /// # Arguments
    ///
    /// * `draft` - The submitted fields. A blank title is rejected.
    ///
    /// # Returns
    ///
    /// A `Result` containing the created `Todo` if successful, or an error otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn create_todo(&self, draft: TodoDraft) -> Result<Todo, TodoServiceError> {
        let title = validated_title(draft.title.as_deref())?;
        let now = self.clock.now();
        let next_due_date =
            recurrence::schedule(now, draft.recurrence_type, draft.recurrence_interval)
                .or(draft.next_due_date);
        let draft = TodoDraft {
            is_completed: false,
            next_due_date,
            ..draft
        };

        let txn = self.db.begin().await?;
        let created = insert_draft(&txn, draft, title, now).await?;
        txn.commit().await?;

        tracing::info!("Created todo {}", created.id);
        Ok(created)
    }

    /// Replaces every mutable field of a todo.
    ///
    /// Completing a todo that has a recurrence kind reschedules it instead: the
    /// completion time is recorded, the next due date is advanced from now, and the
    /// todo stays open.
    ///
    /// # Arguments
    ///
    /// * `id` - The ID from the route. Must equal `draft.id`.
    /// * `draft` - The full replacement record.
    ///
    /// # Returns
    ///
    /// A `Result` containing the stored `Todo` if successful, or an error otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn update_todo(&self, id: i32, draft: TodoDraft) -> Result<Todo, TodoServiceError> {
        if draft.id != Some(id) {
            return Err(TodoServiceError::IdMismatch {
                path_id: id,
                body_id: draft.id,
            });
        }

        let existing = self.find_todo(id).await?;
        let title = validated_title(draft.title.as_deref())?;
        let replacement = replace_fields(&existing, &draft, title, self.clock.now());

        let updated = match full_update(replacement).update(self.db).await {
            Ok(updated) => updated,
            Err(DbErr::RecordNotUpdated) => {
                if self.todo_exists(id).await? {
                    return Err(TodoServiceError::Database(DbErr::RecordNotUpdated));
                }
                return Err(TodoServiceError::TodoNotFound(id));
            }
            Err(err) => return Err(err.into()),
        };

        let mut comments = self.load_comments(&[id]).await?;
        Ok(Todo::from_parts(
            updated,
            comments.remove(&id).unwrap_or_default(),
        ))
    }

    /// Deletes a todo and all of its comments.
    ///
    /// # Returns
    ///
    /// A `Result` containing the deleted `Todo`, including the removed comments.
    #[tracing::instrument(skip(self))]
    pub async fn delete_todo_by_id(&self, id: i32) -> Result<Todo, TodoServiceError> {
        let existing = self.find_todo(id).await?;
        let comments = self.load_comments(&[id]).await?.remove(&id).unwrap_or_default();

        let txn = self.db.begin().await?;
        let removed = todo_comment::Entity::delete_many()
            .filter(todo_comment::Column::TodoId.eq(id))
            .exec(&txn)
            .await?;
        todo::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(
            "Deleted todo {} along with {} comments",
            id,
            removed.rows_affected
        );
        Ok(Todo::from_parts(existing, comments))
    }

    /// Adds a comment to an existing todo.
    #[tracing::instrument(skip(self))]
    pub async fn add_comment(
        &self,
        todo_id: i32,
        content: String,
    ) -> Result<Comment, TodoServiceError> {
        if content.trim().is_empty() {
            return Err(TodoServiceError::Validation(
                "Comment content is required".to_string(),
            ));
        }
        if !self.todo_exists(todo_id).await? {
            return Err(TodoServiceError::TodoNotFound(todo_id));
        }

        let active_model = todo_comment::ActiveModel {
            content: ActiveValue::Set(content),
            created_date: ActiveValue::Set(self.clock.now()),
            todo_id: ActiveValue::Set(todo_id),
            ..Default::default()
        };
        let created = active_model.insert(self.db).await?;
        Ok(Comment::from(created))
    }

    /// Imports a batch of todos as new records in one transaction.
    ///
    /// Supplied IDs are discarded and creation timestamps are reassigned. A blank title
    /// anywhere in the batch rejects the whole batch.
    #[tracing::instrument(skip(self, drafts), fields(count = drafts.len()))]
    pub async fn import_todos(&self, drafts: Vec<TodoDraft>) -> Result<Vec<Todo>, TodoServiceError> {
        let titles = drafts
            .iter()
            .enumerate()
            .map(|(index, draft)| {
                validated_title(draft.title.as_deref()).map_err(|_| {
                    TodoServiceError::Validation(format!("Todo at index {index} has no title"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let now = self.clock.now();
        let txn = self.db.begin().await?;
        let mut imported = Vec::with_capacity(drafts.len());
        for (draft, title) in drafts.into_iter().zip(titles) {
            let next_due_date = draft.next_due_date.or_else(|| {
                recurrence::schedule(now, draft.recurrence_type, draft.recurrence_interval)
            });
            let draft = TodoDraft {
                id: None,
                next_due_date,
                ..draft
            };
            imported.push(insert_draft(&txn, draft, title, now).await?);
        }
        txn.commit().await?;

        tracing::info!("Imported {} todos", imported.len());
        Ok(imported)
    }

    /// Returns every todo with its comments, ordered by ID.
    #[tracing::instrument(skip(self))]
    pub async fn export_todos(&self) -> Result<Vec<Todo>, TodoServiceError> {
        let models = todo::Entity::find()
            .order_by_asc(todo::Column::Id)
            .all(self.db)
            .await?;
        let ids: Vec<i32> = models.iter().map(|model| model.id).collect();
        let mut comments = self.load_comments(&ids).await?;

        Ok(models
            .into_iter()
            .map(|model| {
                let todo_comments = comments.remove(&model.id).unwrap_or_default();
                Todo::from_parts(model, todo_comments)
            })
            .collect())
    }

    async fn find_todo(&self, id: i32) -> Result<todo::Model, TodoServiceError> {
        todo::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or(TodoServiceError::TodoNotFound(id))
    }

    async fn todo_exists(&self, id: i32) -> Result<bool, TodoServiceError> {
        let count = todo::Entity::find_by_id(id).count(self.db).await?;
        Ok(count > 0)
    }

    /// Loads the comments of the given todos, grouped by todo ID and ordered by comment ID.
    async fn load_comments(
        &self,
        todo_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<todo_comment::Model>>, TodoServiceError> {
        if todo_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let comments = todo_comment::Entity::find()
            .filter(todo_comment::Column::TodoId.is_in(todo_ids.iter().copied()))
            .order_by_asc(todo_comment::Column::Id)
            .all(self.db)
            .await?;

        let mut grouped: HashMap<i32, Vec<todo_comment::Model>> = HashMap::new();
        for comment in comments {
            grouped.entry(comment.todo_id).or_default().push(comment);
        }
        Ok(grouped)
    }
}

fn validated_title(title: Option<&str>) -> Result<String, TodoServiceError> {
    match title {
        Some(title) if !title.trim().is_empty() => Ok(title.to_string()),
        _ => Err(TodoServiceError::Validation("Title is required".to_string())),
    }
}

/// Priority stored for a new todo. Zero (Low) is treated the same as unset.
fn creation_priority(priority: Option<Priority>) -> Priority {
    match priority {
        None | Some(Priority::Low) => Priority::Medium,
        Some(priority) => priority,
    }
}

/// Inserts a todo and its comments, applying the server-side defaults.
async fn insert_draft<C>(
    conn: &C,
    draft: TodoDraft,
    title: String,
    now: DateTime<Utc>,
) -> Result<Todo, TodoServiceError>
where
    C: ConnectionTrait,
{
    let active_model = todo::ActiveModel {
        title: ActiveValue::Set(title),
        description: ActiveValue::Set(draft.description.unwrap_or_default()),
        is_completed: ActiveValue::Set(draft.is_completed),
        created_date: ActiveValue::Set(now),
        priority: ActiveValue::Set(creation_priority(draft.priority)),
        category: ActiveValue::Set(draft.category.unwrap_or_default()),
        recurrence_type: ActiveValue::Set(draft.recurrence_type),
        recurrence_interval: ActiveValue::Set(draft.recurrence_interval),
        next_due_date: ActiveValue::Set(draft.next_due_date),
        last_completed_date: ActiveValue::Set(draft.last_completed_date),
        ..Default::default()
    };
    let created = active_model.insert(conn).await?;

    let mut comments = Vec::with_capacity(draft.comments.len());
    for content in draft.comments {
        let comment = todo_comment::ActiveModel {
            content: ActiveValue::Set(content),
            created_date: ActiveValue::Set(now),
            todo_id: ActiveValue::Set(created.id),
            ..Default::default()
        };
        comments.push(comment.insert(conn).await?);
    }

    Ok(Todo::from_parts(created, comments))
}

/// Builds the record that replaces `existing` on a full update.
///
/// A transition from open to completed on a todo with a recurrence kind is turned into
/// a reschedule: `last_completed_date` becomes `now`, `next_due_date` advances from `now`
/// by the submitted interval (1 when missing or not positive) and the todo stays open.
pub fn replace_fields(
    existing: &todo::Model,
    draft: &TodoDraft,
    title: String,
    now: DateTime<Utc>,
) -> todo::Model {
    let mut replacement = todo::Model {
        id: existing.id,
        title,
        description: draft.description.clone().unwrap_or_default(),
        is_completed: draft.is_completed,
        created_date: existing.created_date,
        priority: draft.priority.unwrap_or_default(),
        category: draft.category.clone().unwrap_or_default(),
        recurrence_type: draft.recurrence_type,
        recurrence_interval: draft.recurrence_interval,
        next_due_date: draft.next_due_date,
        last_completed_date: draft.last_completed_date,
    };

    let completing = !existing.is_completed && draft.is_completed;
    if let (true, Some(kind)) = (completing, draft.recurrence_type) {
        let interval = recurrence::positive_interval(draft.recurrence_interval)
            .unwrap_or(recurrence::DEFAULT_INTERVAL);
        replacement.last_completed_date = Some(now);
        replacement.next_due_date = Some(recurrence::next_due_date(now, kind, interval));
        replacement.is_completed = false;
    }

    replacement
}

/// Marks every column except the key and the creation date as changed.
fn full_update(model: todo::Model) -> todo::ActiveModel {
    todo::ActiveModel {
        id: ActiveValue::Unchanged(model.id),
        title: ActiveValue::Set(model.title),
        description: ActiveValue::Set(model.description),
        is_completed: ActiveValue::Set(model.is_completed),
        created_date: ActiveValue::Unchanged(model.created_date),
        priority: ActiveValue::Set(model.priority),
        category: ActiveValue::Set(model.category),
        recurrence_type: ActiveValue::Set(model.recurrence_type),
        recurrence_interval: ActiveValue::Set(model.recurrence_interval),
        next_due_date: ActiveValue::Set(model.next_due_date),
        last_completed_date: ActiveValue::Set(model.last_completed_date),
    }
}
