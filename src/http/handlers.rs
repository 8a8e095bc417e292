//! Task list request handlers.
//!
//! Each handler runs its store call inside `Telemetry::instrument_with` under
//! a fixed operation name, tags the span with the request method and path,
//! and turns the result into a response. Every other telemetry choice lives
//! in the wrapper.

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode, Uri},
    Json,
};
use opentelemetry_semantic_conventions::trace::{HTTP_REQUEST_METHOD, URL_PATH};

use crate::http::response::DELETE_SUCCESS_STATUS;
use crate::http::server::AppState;
use crate::observability::OperationError;
use crate::store::{CreateTask, TaskItem, UpdateTask};

pub const LIST_TODOS: &str = "ListTodos";
pub const GET_TODO: &str = "GetTodo";
pub const ADD_TODO: &str = "AddTodo";
pub const UPDATE_TODO: &str = "UpdateTodo";
pub const DELETE_TODO: &str = "DeleteTodo";

/// Span attributes describing the request an operation serves.
fn request_attributes<'a>(method: &'a Method, uri: &'a Uri) -> [(&'static str, &'a str); 2] {
    [(HTTP_REQUEST_METHOD, method.as_str()), (URL_PATH, uri.path())]
}

/// `GET /todos`
pub async fn list_todos(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Result<Json<Vec<TaskItem>>, OperationError> {
    let attributes = request_attributes(&method, &uri);
    let items = state.telemetry.instrument_with(LIST_TODOS, &attributes, |op| {
        op.info("Processing GET /todos");
        let items = state.store.list();
        op.info("Finished GET /todos");
        Ok(items)
    })?;

    Ok(Json(items))
}

/// `GET /todos/{id}`
pub async fn get_todo(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    Path(id): Path<String>,
) -> Result<Json<TaskItem>, OperationError> {
    let attributes = request_attributes(&method, &uri);
    let item = state.telemetry.instrument_with(GET_TODO, &attributes, |op| {
        op.info(format!("Processing GET /todos/{id}"));
        let item = state.store.get(&id)?;
        op.info(format!("Finished GET /todos/{id}"));
        Ok(item)
    })?;

    Ok(Json(item))
}

/// `POST /todos`
pub async fn add_todo(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    Json(payload): Json<CreateTask>,
) -> Result<(StatusCode, Json<TaskItem>), OperationError> {
    let attributes = request_attributes(&method, &uri);
    let item = state.telemetry.instrument_with(ADD_TODO, &attributes, |op| {
        op.info("Processing POST /todos");
        let item = state.store.insert(payload.title);
        op.debug(format!("Created todo {}", item.id));
        op.info("Finished POST /todos");
        Ok(item)
    })?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// `PUT /todos/{id}`
///
/// Replaces title and completed flag; fields missing from the body reset to
/// their defaults.
pub async fn update_todo(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTask>,
) -> Result<Json<TaskItem>, OperationError> {
    let attributes = request_attributes(&method, &uri);
    let item = state.telemetry.instrument_with(UPDATE_TODO, &attributes, |op| {
        op.info(format!("Processing PUT /todos/{id}"));
        let item = state.store.update(&id, payload.title, payload.completed)?;
        op.info(format!("Finished PUT /todos/{id}"));
        Ok(item)
    })?;

    Ok(Json(item))
}

/// `DELETE /todos/{id}`
pub async fn delete_todo(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    Path(id): Path<String>,
) -> Result<StatusCode, OperationError> {
    let attributes = request_attributes(&method, &uri);
    state.telemetry.instrument_with(DELETE_TODO, &attributes, |op| {
        op.info(format!("Processing DELETE /todos/{id}"));
        state.store.delete(&id)?;
        op.info(format!("Finished DELETE /todos/{id}"));
        Ok(())
    })?;

    Ok(DELETE_SUCCESS_STATUS)
}
