use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    routing::get,
};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};

use crate::{
    db::entities::todo::{self, TodoStatus},
    error::AppError,
    routes::API_PREFIX,
    services::{ServiceContext, todo_service::TodoInput},
    state::AppState,
};

const TODO_HEADER: HeaderName = HeaderName::from_static("todo");

/// Request body for create and replace. An `id` field, if sent, is ignored.
#[derive(Debug, Deserialize)]
pub struct TodoPayload {
    pub description: String,
    #[serde(default)]
    pub status: TodoStatus,
}

#[derive(Debug, Serialize)]
pub struct TodoResponse {
    pub id: i64,
    pub description: String,
    pub status: TodoStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/todo", get(get_all_todos).post(save_todo))
        .route(
            "/todo/{id}",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .with_state(state)
}

async fn get_all_todos(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TodoResponse>>, AppError> {
    let todos = ServiceContext::from_state(&state).todo().get_todos().await?;
    Ok(Json(todos.into_iter().map(TodoResponse::from).collect()))
}

async fn get_todo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<TodoResponse>, AppError> {
    let todo = ServiceContext::from_state(&state)
        .todo()
        .get_todo_by_id(id)
        .await?;
    Ok(Json(todo.into()))
}

async fn save_todo(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TodoPayload>,
) -> Result<(StatusCode, HeaderMap, Json<TodoResponse>), AppError> {
    let todo = ServiceContext::from_state(&state)
        .todo()
        .insert(body.into())
        .await?;

    let location = HeaderValue::try_from(format!("{API_PREFIX}/todo/{}", todo.id))
        .map_err(|err| AppError::internal(format!("invalid location header: {err}")))?;
    let mut headers = HeaderMap::new();
    headers.insert(TODO_HEADER, location.clone());
    headers.insert(header::LOCATION, location);

    Ok((StatusCode::CREATED, headers, Json(todo.into())))
}

async fn update_todo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<TodoPayload>,
) -> Result<Json<TodoResponse>, AppError> {
    let service = ServiceContext::from_state(&state).todo();
    service.update_todo(id, body.into()).await?;
    let todo = service.get_todo_by_id(id).await?;
    Ok(Json(todo.into()))
}

async fn delete_todo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    ServiceContext::from_state(&state)
        .todo()
        .delete_todo(id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

impl From<TodoPayload> for TodoInput {
    fn from(payload: TodoPayload) -> Self {
        Self {
            description: payload.description,
            status: payload.status,
        }
    }
}

impl From<todo::Model> for TodoResponse {
    fn from(model: todo::Model) -> Self {
        Self {
            id: model.id,
            description: model.description,
            status: model.status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
