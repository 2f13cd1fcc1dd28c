use sea_orm::{DatabaseConnection, Order, Set};

use super::{DaoBase, DaoResult};
use crate::db::entities::prelude::Todo;
use crate::db::entities::todo::{self, TodoStatus};

#[derive(Clone)]
pub struct TodoDao {
    db: DatabaseConnection,
}

impl DaoBase for TodoDao {
    type Entity = Todo;
    const ENTITY_NAME: &'static str = "Todo";

    fn from_db(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl TodoDao {
    pub async fn create_todo(
        &self,
        description: &str,
        status: TodoStatus,
    ) -> DaoResult<todo::Model> {
        let model = todo::ActiveModel {
            description: Set(description.to_string()),
            status: Set(status),
            ..Default::default()
        };
        self.create(model).await
    }

    pub async fn list_todos(&self) -> DaoResult<Vec<todo::Model>> {
        self.find_all(None, Some((todo::Column::Id, Order::Asc)), |query| query)
            .await
    }

    pub async fn find_todo(&self, id: i64) -> DaoResult<todo::Model> {
        self.find_by_id(id).await
    }

    pub async fn replace_todo(
        &self,
        id: i64,
        description: &str,
        status: TodoStatus,
    ) -> DaoResult<todo::Model> {
        let description = description.to_string();
        self.update(id, move |active| {
            active.description = Set(description);
            active.status = Set(status);
        })
        .await
    }

    pub async fn delete_todo(&self, id: i64) -> DaoResult<i64> {
        self.delete(id).await
    }

    pub async fn count_todos(&self) -> DaoResult<u64> {
        self.count().await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};

    use super::TodoDao;
    use crate::db::dao::{DaoBase, DaoLayerError};
    use crate::db::entities::todo::{self, TodoStatus};

    fn ts() -> chrono::DateTime<chrono::FixedOffset> {
        FixedOffset::east_opt(0)
            .expect("offset should be valid")
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp should be valid")
    }

    fn todo_model(id: i64, description: &str, status: TodoStatus) -> todo::Model {
        let now = ts();
        todo::Model {
            id,
            description: description.to_string(),
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn find_todo_returns_not_found_when_missing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<todo::Model>::new()])
            .into_connection();
        let dao = TodoDao::new(&db);

        let err = dao.find_todo(42).await.expect_err("todo should be missing");
        assert!(matches!(
            err,
            DaoLayerError::NotFound {
                entity: "Todo",
                id: 42
            }
        ));
    }

    #[tokio::test]
    async fn list_todos_returns_rows_from_a_single_page() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[
                todo_model(1, "write tests", TodoStatus::Pending),
                todo_model(2, "ship it", TodoStatus::Done),
            ]])
            .into_connection();
        let dao = TodoDao::new(&db);

        let todos = dao.list_todos().await.expect("query should succeed");
        let ids: Vec<i64> = todos.iter().map(|todo| todo.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(todos[1].status, TodoStatus::Done);
    }

    #[tokio::test]
    async fn replace_todo_reports_missing_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<todo::Model>::new()])
            .into_connection();
        let dao = TodoDao::new(&db);

        let err = dao
            .replace_todo(9, "nope", TodoStatus::Done)
            .await
            .expect_err("update should fail");
        assert!(matches!(err, DaoLayerError::NotFound { id: 9, .. }));
    }

    #[tokio::test]
    async fn delete_todo_reports_missing_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let dao = TodoDao::new(&db);

        let err = dao.delete_todo(3).await.expect_err("delete should fail");
        assert!(matches!(err, DaoLayerError::NotFound { id: 3, .. }));
    }

    #[tokio::test]
    async fn delete_todo_returns_id_when_row_removed() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let dao = TodoDao::new(&db);

        assert_eq!(dao.delete_todo(3).await.expect("delete should succeed"), 3);
    }

    #[tokio::test]
    async fn find_rejects_invalid_pagination() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let dao = TodoDao::new(&db);

        let err = dao
            .find(0, 10, None, |query| query)
            .await
            .expect_err("page 0 should be rejected");
        assert!(matches!(
            err,
            DaoLayerError::InvalidPagination {
                page: 0,
                page_size: 10
            }
        ));
    }

    #[tokio::test]
    async fn count_todos_maps_database_errors() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("count failed".to_string())])
            .into_connection();
        let dao = TodoDao::new(&db);

        let err = dao.count_todos().await.expect_err("count should fail");
        assert!(matches!(err, DaoLayerError::Db(_)));
    }
}
