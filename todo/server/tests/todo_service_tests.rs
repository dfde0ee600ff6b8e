use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use todo_server::entities::sea_orm_active_enums::{Priority, RecurrenceType};
use todo_server::entities::todo_comment;
use todo_server::todo::query::TodoFilter;
use todo_server::todo::{FixedClock, TodoDraft, TodoService, TodoServiceError};

mod common;

pub struct TestContext {
    pub db: DatabaseConnection,
}

async fn setup() -> anyhow::Result<TestContext> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().try_init();
    let db = common::setup_sqlite_db().await?;
    Ok(TestContext { db })
}

fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

fn draft(title: &str) -> TodoDraft {
    TodoDraft {
        title: Some(title.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn can_create_todo_with_server_defaults() {
    let state = setup().await.expect("Failed to setup test context");
    let clock = FixedClock(day(2024, 1, 1));
    let service = TodoService::with_clock(&state.db, &clock);

    let created = service
        .create_todo(TodoDraft {
            is_completed: true,
            ..draft("Buy milk")
        })
        .await
        .expect("Failed to create todo");

    assert_eq!(created.title, "Buy milk");
    assert_eq!(created.description, "");
    assert_eq!(created.category, "");
    assert_eq!(created.priority, Priority::Medium);
    assert!(!created.is_completed);
    assert_eq!(created.created_date, day(2024, 1, 1));
    assert_eq!(created.next_due_date, None);
    assert!(created.comments.is_empty());
}

#[tokio::test]
async fn can_keep_submitted_priority_and_category() {
    let state = setup().await.expect("Failed to setup test context");
    let service = TodoService::new(&state.db);

    let created = service
        .create_todo(TodoDraft {
            priority: Some(Priority::High),
            category: Some("Shopping".to_string()),
            ..draft("Buy milk")
        })
        .await
        .expect("Failed to create todo");

    assert_eq!(created.priority, Priority::High);
    assert_eq!(created.category, "Shopping");
}

#[tokio::test]
async fn can_store_low_priority_as_medium_on_create() {
    let state = setup().await.expect("Failed to setup test context");
    let service = TodoService::new(&state.db);

    let created = service
        .create_todo(TodoDraft {
            priority: Some(Priority::Low),
            ..draft("Buy milk")
        })
        .await
        .expect("Failed to create todo");

    assert_eq!(created.priority, Priority::Medium);
    let stored = service
        .get_todo_by_id(created.id)
        .await
        .expect("Failed to get todo");
    assert_eq!(stored.priority, Priority::Medium);
}

#[tokio::test]
async fn can_reject_todo_with_blank_title() {
    let state = setup().await.expect("Failed to setup test context");
    let service = TodoService::new(&state.db);

    let result = service.create_todo(draft("   ")).await;

    assert!(matches!(result, Err(TodoServiceError::Validation(_))));
    let missing = service.create_todo(TodoDraft::default()).await;
    assert!(matches!(missing, Err(TodoServiceError::Validation(_))));
}

#[tokio::test]
async fn can_schedule_first_due_date_for_recurring_todo() {
    let state = setup().await.expect("Failed to setup test context");
    let clock = FixedClock(day(2024, 1, 31));
    let service = TodoService::with_clock(&state.db, &clock);

    let monthly = service
        .create_todo(TodoDraft {
            recurrence_type: Some(RecurrenceType::Monthly),
            recurrence_interval: Some(1),
            ..draft("Pay rent")
        })
        .await
        .expect("Failed to create todo");
    let no_interval = service
        .create_todo(TodoDraft {
            recurrence_type: Some(RecurrenceType::Daily),
            recurrence_interval: Some(0),
            ..draft("Stretch")
        })
        .await
        .expect("Failed to create todo");

    assert_eq!(monthly.next_due_date, Some(day(2024, 2, 29)));
    assert_eq!(no_interval.next_due_date, None);
}

#[tokio::test]
async fn can_complete_non_recurring_todo() {
    let state = setup().await.expect("Failed to setup test context");
    let service = TodoService::new(&state.db);
    let created = service
        .create_todo(draft("File taxes"))
        .await
        .expect("Failed to create todo");

    let updated = service
        .update_todo(
            created.id,
            TodoDraft {
                id: Some(created.id),
                is_completed: true,
                ..draft("File taxes")
            },
        )
        .await
        .expect("Failed to update todo");

    assert!(updated.is_completed);
    assert_eq!(updated.recurrence_type, None);
    assert_eq!(updated.next_due_date, None);
    assert_eq!(updated.last_completed_date, None);
    assert_eq!(updated.created_date, created.created_date);
}

#[tokio::test]
async fn can_reschedule_recurring_todo_when_completed() {
    let state = setup().await.expect("Failed to setup test context");
    let creation_clock = FixedClock(day(2023, 12, 30));
    let created = TodoService::with_clock(&state.db, &creation_clock)
        .create_todo(TodoDraft {
            recurrence_type: Some(RecurrenceType::Daily),
            recurrence_interval: Some(2),
            ..draft("Water plants")
        })
        .await
        .expect("Failed to create todo");
    assert_eq!(created.next_due_date, Some(day(2024, 1, 1)));

    let completion_clock = FixedClock(day(2024, 1, 1));
    let updated = TodoService::with_clock(&state.db, &completion_clock)
        .update_todo(
            created.id,
            TodoDraft {
                id: Some(created.id),
                is_completed: true,
                recurrence_type: Some(RecurrenceType::Daily),
                recurrence_interval: Some(2),
                next_due_date: created.next_due_date,
                ..draft("Water plants")
            },
        )
        .await
        .expect("Failed to update todo");

    assert!(!updated.is_completed);
    assert_eq!(updated.last_completed_date, Some(day(2024, 1, 1)));
    assert_eq!(updated.next_due_date, Some(day(2024, 1, 3)));
    assert_eq!(updated.created_date, day(2023, 12, 30));
}

#[tokio::test]
async fn can_reject_update_with_mismatched_id() {
    let state = setup().await.expect("Failed to setup test context");
    let service = TodoService::new(&state.db);
    let created = service
        .create_todo(draft("Call mom"))
        .await
        .expect("Failed to create todo");

    let result = service
        .update_todo(
            created.id,
            TodoDraft {
                id: Some(created.id + 1),
                ..draft("Call mom")
            },
        )
        .await;

    assert!(matches!(
        result,
        Err(TodoServiceError::IdMismatch { path_id, .. }) if path_id == created.id
    ));
}

#[tokio::test]
async fn can_handle_update_when_todo_not_found() {
    let state = setup().await.expect("Failed to setup test context");
    let service = TodoService::new(&state.db);

    let result = service
        .update_todo(
            99,
            TodoDraft {
                id: Some(99),
                ..draft("Ghost")
            },
        )
        .await;

    let err = result.expect_err("Update of a missing todo should fail");
    assert_eq!(err.to_string(), "Todo with ID 99 not found");
}

#[tokio::test]
async fn can_delete_todo_with_all_comments() {
    let state = setup().await.expect("Failed to setup test context");
    let service = TodoService::new(&state.db);
    let doomed = service
        .create_todo(draft("Plan trip"))
        .await
        .expect("Failed to create todo");
    let survivor = service
        .create_todo(draft("Book hotel"))
        .await
        .expect("Failed to create todo");
    for content in ["flights", "visa", "insurance"] {
        service
            .add_comment(doomed.id, content.to_string())
            .await
            .expect("Failed to add comment");
    }
    service
        .add_comment(survivor.id, "check reviews".to_string())
        .await
        .expect("Failed to add comment");

    let deleted = service
        .delete_todo_by_id(doomed.id)
        .await
        .expect("Failed to delete todo");

    assert_eq!(deleted.comments.len(), 3);
    let remaining_comments = todo_comment::Entity::find()
        .all(&state.db)
        .await
        .expect("Failed to query comments");
    assert_eq!(remaining_comments.len(), 1);
    assert_eq!(remaining_comments[0].todo_id, survivor.id);
    assert!(matches!(
        service.get_todo_by_id(doomed.id).await,
        Err(TodoServiceError::TodoNotFound(_))
    ));
}

#[tokio::test]
async fn can_handle_delete_when_todo_not_found() {
    let state = setup().await.expect("Failed to setup test context");
    let service = TodoService::new(&state.db);

    let result = service.delete_todo_by_id(5).await;

    assert!(matches!(result, Err(TodoServiceError::TodoNotFound(5))));
}

#[tokio::test]
async fn can_add_comments_in_order() {
    let state = setup().await.expect("Failed to setup test context");
    let clock = FixedClock(day(2024, 3, 1));
    let service = TodoService::with_clock(&state.db, &clock);
    let created = service
        .create_todo(draft("Write report"))
        .await
        .expect("Failed to create todo");

    let first = service
        .add_comment(created.id, "outline done".to_string())
        .await
        .expect("Failed to add comment");
    service
        .add_comment(created.id, "draft sent".to_string())
        .await
        .expect("Failed to add comment");

    assert_eq!(first.todo_id, created.id);
    assert_eq!(first.created_date, day(2024, 3, 1));
    let fetched = service
        .get_todo_by_id(created.id)
        .await
        .expect("Failed to get todo");
    let contents: Vec<&str> = fetched
        .comments
        .iter()
        .map(|comment| comment.content.as_str())
        .collect();
    assert_eq!(contents, vec!["outline done", "draft sent"]);
}

#[tokio::test]
async fn can_reject_comment_for_missing_todo_or_blank_content() {
    let state = setup().await.expect("Failed to setup test context");
    let service = TodoService::new(&state.db);
    let created = service
        .create_todo(draft("Write report"))
        .await
        .expect("Failed to create todo");

    let missing = service.add_comment(created.id + 10, "hello".to_string()).await;
    let blank = service.add_comment(created.id, " ".to_string()).await;

    assert!(matches!(missing, Err(TodoServiceError::TodoNotFound(_))));
    assert!(matches!(blank, Err(TodoServiceError::Validation(_))));
}

#[tokio::test]
async fn can_fall_back_to_default_categories() {
    let state = setup().await.expect("Failed to setup test context");
    let service = TodoService::new(&state.db);
    service
        .create_todo(draft("Uncategorized"))
        .await
        .expect("Failed to create todo");

    let categories = service
        .get_categories()
        .await
        .expect("Failed to get categories");

    assert_eq!(categories, vec!["Personal", "Work", "Shopping", "Health"]);
}

#[tokio::test]
async fn can_list_distinct_categories_in_use() {
    let state = setup().await.expect("Failed to setup test context");
    let service = TodoService::new(&state.db);
    for (title, category) in [("a", "Work"), ("b", "Garden"), ("c", "Work"), ("d", "")] {
        service
            .create_todo(TodoDraft {
                category: Some(category.to_string()),
                ..draft(title)
            })
            .await
            .expect("Failed to create todo");
    }

    let categories = service
        .get_categories()
        .await
        .expect("Failed to get categories");

    assert_eq!(categories, vec!["Garden", "Work"]);
}

#[tokio::test]
async fn can_list_filtered_page_with_totals() {
    let state = setup().await.expect("Failed to setup test context");
    let service = TodoService::new(&state.db);
    for i in 0..15 {
        service
            .create_todo(TodoDraft {
                category: Some("Work".to_string()),
                priority: Some(Priority::High),
                ..draft(&format!("Work item {i}"))
            })
            .await
            .expect("Failed to create todo");
    }
    for i in 0..4 {
        service
            .create_todo(TodoDraft {
                category: Some("Home".to_string()),
                priority: Some(Priority::High),
                ..draft(&format!("Home item {i}"))
            })
            .await
            .expect("Failed to create todo");
    }
    let filter = TodoFilter {
        category: Some("Work".to_string()),
        priority: Some(Priority::High),
        ..Default::default()
    };

    let first = service
        .list_todos(&filter, 1)
        .await
        .expect("Failed to list todos");
    let second = service
        .list_todos(&filter, 2)
        .await
        .expect("Failed to list todos");
    let third = service
        .list_todos(&filter, 3)
        .await
        .expect("Failed to list todos");

    assert_eq!(first.items.len(), 10);
    assert_eq!(first.total_count, 15);
    assert_eq!(first.total_pages, 2);
    assert_eq!(second.items.len(), 5);
    assert!(third.items.is_empty());
    assert!(first.items.iter().all(|todo| todo.category == "Work"));
}

#[tokio::test]
async fn can_import_todos_as_new_records() {
    let state = setup().await.expect("Failed to setup test context");
    let clock = FixedClock(day(2024, 5, 5));
    let service = TodoService::with_clock(&state.db, &clock);
    let existing = service
        .create_todo(draft("Existing"))
        .await
        .expect("Failed to create todo");

    let imported = service
        .import_todos(vec![
            TodoDraft {
                id: Some(existing.id),
                is_completed: true,
                comments: vec!["imported note".to_string()],
                ..draft("Imported done")
            },
            TodoDraft {
                id: Some(500),
                ..draft("Imported open")
            },
        ])
        .await
        .expect("Failed to import todos");

    assert_eq!(imported.len(), 2);
    assert!(imported.iter().all(|todo| todo.id != existing.id && todo.id != 500));
    assert!(imported.iter().all(|todo| todo.created_date == day(2024, 5, 5)));
    assert!(imported[0].is_completed);
    assert_eq!(imported[0].comments.len(), 1);
    assert_eq!(imported[0].comments[0].content, "imported note");
    let total = todo_server::entities::todo::Entity::find()
        .count(&state.db)
        .await
        .expect("Failed to count todos");
    assert_eq!(total, 3);
}

#[tokio::test]
async fn can_reject_whole_import_batch_with_blank_title() {
    let state = setup().await.expect("Failed to setup test context");
    let service = TodoService::new(&state.db);

    let result = service
        .import_todos(vec![draft("Fine"), draft("")])
        .await;

    assert!(matches!(result, Err(TodoServiceError::Validation(_))));
    let exported = service.export_todos().await.expect("Failed to export");
    assert!(exported.is_empty());
}

#[tokio::test]
async fn can_export_every_todo_with_comments() {
    let state = setup().await.expect("Failed to setup test context");
    let service = TodoService::new(&state.db);
    let mut ids = Vec::new();
    for i in 0..12 {
        let created = service
            .create_todo(TodoDraft {
                is_completed: i % 2 == 0,
                ..draft(&format!("Todo {i}"))
            })
            .await
            .expect("Failed to create todo");
        ids.push(created.id);
    }
    service
        .add_comment(ids[3], "note".to_string())
        .await
        .expect("Failed to add comment");

    let exported = service.export_todos().await.expect("Failed to export");

    assert_eq!(exported.len(), 12);
    assert_eq!(
        exported.iter().map(|todo| todo.id).collect::<Vec<_>>(),
        ids
    );
    assert_eq!(exported[3].comments.len(), 1);
}
