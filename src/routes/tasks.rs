use crate::{
    auth::extractors::AuthenticatedUserId,
    error::AppError,
    models::{Task, TaskInput, TaskQuery, TaskUpdate},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Retrieves a list of tasks for the authenticated user.
///
/// Tasks are scoped to their owner and ordered by creation date, newest first.
///
/// ## Query Parameters:
/// - `status` (optional): Filters tasks by their status (e.g., "todo", "in_progress", "done").
/// - `limit` (optional): Page size, 1 to 100, default 10.
/// - `offset` (optional): Number of tasks to skip, default 0.
///
/// ## Responses:
/// - `200 OK`: Returns a JSON array of `Task` objects.
/// - `401 Unauthorized`: If the request lacks a valid access token.
/// - `422 Unprocessable Entity`: If `limit` or `offset` is out of range.
/// - `500 Internal Server Error`: For database errors or other unexpected issues.
#[get("")]
pub async fn get_tasks(
    pool: web::Data<PgPool>,
    query_params: web::Query<TaskQuery>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    query_params.validate()?;

    let limit = query_params.limit.unwrap_or(10);
    let offset = query_params.offset.unwrap_or(0);

    let tasks = match &query_params.status {
        Some(status) => {
            sqlx::query_as::<_, Task>(
                "SELECT id, title, description, status, owner_id, created_at
                 FROM tasks WHERE owner_id = $1 AND status = $2
                 ORDER BY created_at DESC LIMIT $3 OFFSET $4",
            )
            .bind(user.0)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&**pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Task>(
                "SELECT id, title, description, status, owner_id, created_at
                 FROM tasks WHERE owner_id = $1
                 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            )
            .bind(user.0)
            .bind(limit)
            .bind(offset)
            .fetch_all(&**pool)
            .await?
        }
    };

    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task for the authenticated user.
///
/// ## Request Body:
/// A JSON object matching the `TaskInput` struct, including:
/// - `title`: The title of the task (required).
/// - `description` (optional): A description of the task.
/// - `status` (optional): Initial status, defaults to "todo".
///
/// ## Responses:
/// - `201 Created`: Returns the newly created `Task` object as JSON.
/// - `401 Unauthorized`: If the request lacks a valid access token.
/// - `422 Unprocessable Entity`: If input validation on `TaskInput` fails.
/// - `500 Internal Server Error`: For database errors or other unexpected issues.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    task_data: web::Json<TaskInput>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    // Validate input
    task_data.validate()?;

    let task = Task::new(task_data.into_inner(), user.0);

    let result = sqlx::query_as::<_, Task>(
        "INSERT INTO tasks (id, title, description, status, owner_id, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id, title, description, status, owner_id, created_at",
    )
    .bind(task.id)
    .bind(task.title)
    .bind(task.description)
    .bind(task.status)
    .bind(task.owner_id)
    .bind(task.created_at)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Created().json(result))
}

/// Retrieves a specific task by its ID.
///
/// The authenticated user must be the owner; tasks owned by other users read
/// as not found.
///
/// ## Responses:
/// - `200 OK`: Returns the `Task` object as JSON if found and owned by the user.
/// - `401 Unauthorized`: If the request lacks a valid access token.
/// - `404 Not Found`: If the task does not exist or is not owned by the authenticated user.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let task = sqlx::query_as::<_, Task>(
        "SELECT id, title, description, status, owner_id, created_at
         FROM tasks WHERE id = $1 AND owner_id = $2",
    )
    .bind(task_id.into_inner())
    .bind(user.0)
    .fetch_optional(&**pool)
    .await?;

    match task {
        Some(task) => Ok(HttpResponse::Ok().json(task)),
        None => Err(AppError::NotFound("Task not found".into())),
    }
}

/// Updates an existing task.
///
/// Partial update: absent fields keep their current values. Only the owner can
/// update a task.
///
/// ## Responses:
/// - `200 OK`: Returns the updated `Task` object as JSON.
/// - `401 Unauthorized`: If the request lacks a valid access token.
/// - `404 Not Found`: If the task does not exist or is not owned by the authenticated user.
/// - `422 Unprocessable Entity`: If input validation on `TaskUpdate` fails.
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskUpdate>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let update = task_data.into_inner();

    let task = sqlx::query_as::<_, Task>(
        "UPDATE tasks
         SET title = COALESCE($1, title),
             description = COALESCE($2, description),
             status = COALESCE($3, status)
         WHERE id = $4 AND owner_id = $5
         RETURNING id, title, description, status, owner_id, created_at",
    )
    .bind(update.title)
    .bind(update.description)
    .bind(update.status)
    .bind(task_id.into_inner())
    .bind(user.0)
    .fetch_optional(&**pool)
    .await?;

    match task {
        Some(task) => Ok(HttpResponse::Ok().json(task)),
        None => Err(AppError::NotFound("Task not found".into())),
    }
}

/// Deletes a task.
///
/// Only the owner can delete a task.
///
/// ## Responses:
/// - `204 No Content`: The task was deleted.
/// - `401 Unauthorized`: If the request lacks a valid access token.
/// - `404 Not Found`: If the task does not exist or is not owned by the authenticated user.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND owner_id = $2")
        .bind(task_id.into_inner())
        .bind(user.0)
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Task not found".into()));
    }

    Ok(HttpResponse::NoContent().finish())
}
