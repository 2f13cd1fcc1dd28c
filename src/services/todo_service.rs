use crate::{
    db::dao::TodoDao,
    db::entities::todo::{self, TodoStatus},
    error::AppError,
};

/// Fields a caller may set on a todo. The id is always assigned by the
/// database.
#[derive(Debug, Clone)]
pub struct TodoInput {
    pub description: String,
    pub status: TodoStatus,
}

#[derive(Clone)]
pub struct TodoService {
    todo_dao: TodoDao,
}

impl TodoService {
    pub fn new(todo_dao: TodoDao) -> Self {
        Self { todo_dao }
    }

    pub async fn get_todos(&self) -> Result<Vec<todo::Model>, AppError> {
        Ok(self.todo_dao.list_todos().await?)
    }

    pub async fn get_todo_by_id(&self, id: i64) -> Result<todo::Model, AppError> {
        Ok(self.todo_dao.find_todo(id).await?)
    }

    pub async fn insert(&self, input: TodoInput) -> Result<todo::Model, AppError> {
        let description = normalize_description(&input.description)?;
        let created = self.todo_dao.create_todo(description, input.status).await?;
        tracing::debug!(id = created.id, "todo created");
        Ok(created)
    }

    pub async fn update_todo(&self, id: i64, input: TodoInput) -> Result<todo::Model, AppError> {
        let description = normalize_description(&input.description)?;
        Ok(self
            .todo_dao
            .replace_todo(id, description, input.status)
            .await?)
    }

    pub async fn delete_todo(&self, id: i64) -> Result<(), AppError> {
        self.todo_dao.delete_todo(id).await?;
        tracing::debug!(id, "todo deleted");
        Ok(())
    }
}

fn normalize_description(description: &str) -> Result<&str, AppError> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(AppError::bad_request("Description required"));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase};

    use super::{TodoInput, TodoService};
    use crate::db::dao::{DaoBase, TodoDao};
    use crate::db::entities::todo::{self, TodoStatus};
    use crate::error::AppError;

    fn service(db: &sea_orm::DatabaseConnection) -> TodoService {
        TodoService::new(TodoDao::new(db))
    }

    #[tokio::test]
    async fn insert_rejects_blank_description() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let err = service(&db)
            .insert(TodoInput {
                description: "   ".to_string(),
                status: TodoStatus::Pending,
            })
            .await
            .expect_err("blank description should be rejected");

        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(err.message(), "Description required");
    }

    #[tokio::test]
    async fn update_rejects_blank_description_before_lookup() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let err = service(&db)
            .update_todo(
                1,
                TodoInput {
                    description: String::new(),
                    status: TodoStatus::Done,
                },
            )
            .await
            .expect_err("empty description should be rejected");

        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn get_todo_by_id_maps_missing_row_to_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<todo::Model>::new()])
            .into_connection();

        let err = service(&db)
            .get_todo_by_id(5)
            .await
            .expect_err("todo should be missing");

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(err.message(), "Todo not found (id=5)");
    }
}
