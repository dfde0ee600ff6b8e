use super::sea_orm_active_enums::{Priority, RecurrenceType};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "todos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub is_completed: bool,
    pub created_date: DateTimeUtc,
    pub priority: Priority,
    pub category: String,
    pub recurrence_type: Option<RecurrenceType>,
    pub recurrence_interval: Option<i32>,
    pub next_due_date: Option<DateTimeUtc>,
    pub last_completed_date: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::todo_comment::Entity")]
    TodoComment,
}

impl Related<super::todo_comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TodoComment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
