//! Tenant handlers

use axum::extract::{Extension, Path};
use axum::Json;
use serde_json::{json, Value};

use crate::auth::RequestIdentity;

/// `GET /v1/tenants/:tenant_id`
pub async fn get_tenant(
    Path(tenant_id): Path<String>,
    Extension(identity): Extension<RequestIdentity>,
) -> Json<Value> {
    Json(json!({
        "tenant_id": tenant_id,
        "requested_by": identity.user_id,
        "own_tenant": tenant_id == identity.tenant_id,
    }))
}
