use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{instrument, warn};

use super::dto::{CreateUserRequest, DeleteUserResponse, ListUsersQuery, UpdateUserRequest};
use super::error::{UserError, UserResult};
use super::repo_types::{SortSpec, User, UserFilter};
use super::services;
use crate::state::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

/// A request without a JSON content type carries no fields, so it reads as
/// an empty body. Malformed JSON is still a 400.
fn json_body<T: Default>(payload: Result<Json<T>, JsonRejection>) -> UserResult<T> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "rejected request body");
            Err(UserError::Validation(rejection.body_text()))
        }
    }
}

/// GET /users?sortBy=&order=&search=
#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    Query(q): Query<ListUsersQuery>,
) -> UserResult<Json<Vec<User>>> {
    let filter = UserFilter::search(q.search.unwrap_or_default());
    let sort = SortSpec::from_params(q.sort_by.as_deref(), q.order.as_deref());
    let users = services::list_users(state.users.as_ref(), &filter, sort.as_ref()).await?;
    Ok(Json(users))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> UserResult<Json<User>> {
    let user = services::get_user(state.users.as_ref(), &id).await?;
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> UserResult<(StatusCode, [(header::HeaderName, String); 1], Json<User>)> {
    let new_user = json_body(payload)?.validate().map_err(|e| {
        warn!(error = %e, "invalid create request");
        e
    })?;
    let user = services::create_user(state.users.as_ref(), new_user).await?;
    let location = format!("/api/users/{}", user.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(user)))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> UserResult<Json<User>> {
    let patch = json_body(payload)?.into_patch()?;
    let user = services::update_user(state.users.as_ref(), &id, patch).await?;
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> UserResult<Json<DeleteUserResponse>> {
    let deleted_count = services::delete_user(state.users.as_ref(), &id).await?;
    Ok(Json(DeleteUserResponse {
        message: "User deleted successfully".into(),
        deleted_count,
    }))
}
