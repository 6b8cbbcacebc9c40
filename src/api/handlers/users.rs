//! User handlers
//!
//! Route gates have already checked the declared requirement by the time these
//! run. `create_user` adds a handler-level check because the target tenant only
//! appears in the body.

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::auth_helpers::ensure_tenant_access;
use crate::api::error::ApiError;
use crate::auth::RequestIdentity;

/// Body of `POST /v1/users`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateUserRequest {
    pub user_id: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub org_unit_id: Option<String>,
}

/// `GET /v1/users/:id`
pub async fn get_user(
    Path(user_id): Path<String>,
    Extension(identity): Extension<RequestIdentity>,
) -> Json<Value> {
    Json(json!({
        "user_id": user_id,
        "tenant_id": identity.tenant_id,
        "requested_by": identity.user_id,
        "own_record": identity.is_self(&user_id),
    }))
}

/// `PUT /v1/users/:id`
///
/// Receives the JSON body after the gate has inspected it for the target user.
pub async fn update_user(
    Path(user_id): Path<String>,
    Extension(identity): Extension<RequestIdentity>,
    Json(changes): Json<Value>,
) -> Json<Value> {
    Json(json!({
        "user_id": user_id,
        "updated_by": identity.user_id,
        "own_record": identity.is_self(&user_id),
        "changes": changes,
    }))
}

/// `POST /v1/users`
///
/// Creating a user in another tenant needs `user:create:global`.
pub async fn create_user(
    Extension(identity): Extension<RequestIdentity>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreateUserRequest>), ApiError> {
    let tenant_id = request.tenant_id.as_deref().unwrap_or_default();
    ensure_tenant_access(&identity, "user", "create", tenant_id)?;

    let created = CreateUserRequest {
        tenant_id: Some(
            request
                .tenant_id
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| identity.tenant_id.clone()),
        ),
        ..request
    };

    Ok((StatusCode::CREATED, Json(created)))
}

/// `DELETE /v1/users/:id`
pub async fn delete_user(
    Path(_user_id): Path<String>,
    Extension(_identity): Extension<RequestIdentity>,
) -> StatusCode {
    StatusCode::NO_CONTENT
}

/// `GET /v1/me`
pub async fn me(Extension(identity): Extension<RequestIdentity>) -> Json<RequestIdentity> {
    Json(identity)
}
