use sea_orm_migration::prelude::*;

use crate::m20250901_000001_create_todos_table::Todos;

#[derive(DeriveMigrationName)]
pub struct Migration;

const FK_TODO_COMMENTS_TO_TODOS: &str = "fk-todo_comments-todo_id";
const IDX_TODO_COMMENTS_TODO_ID: &str = "idx-todo_comments-todo_id";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TodoComments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TodoComments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TodoComments::Content).text().not_null())
                    .col(
                        ColumnDef::new(TodoComments::CreatedDate)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(TodoComments::TodoId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name(FK_TODO_COMMENTS_TO_TODOS)
                            .from(TodoComments::Table, TodoComments::TodoId)
                            .to(Todos::Table, Todos::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_TODO_COMMENTS_TODO_ID)
                    .table(TodoComments::Table)
                    .col(TodoComments::TodoId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(IDX_TODO_COMMENTS_TODO_ID)
                    .table(TodoComments::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(TodoComments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TodoComments {
    Table,
    Id,
    Content,
    CreatedDate,
    TodoId,
}
