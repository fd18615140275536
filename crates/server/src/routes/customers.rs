use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use service::customer::{
    domain::{CustomerInput, CustomerView},
    CustomerService,
};
use tracing::info;

use crate::errors::JsonApiError;

#[derive(Clone)]
pub struct AppState {
    pub customers: Arc<CustomerService>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Return only the customer registered with this address.
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VerifyQuery {
    pub token: Option<String>,
}

#[utoipa::path(
    get, path = "/customers", tag = "customers",
    params(ListQuery),
    responses(
        (status = 200, description = "List OK", body = [crate::openapi::CustomerDoc]),
        (status = 500, description = "List Failed")
    )
)]
pub async fn list(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<CustomerView>>, JsonApiError> {
    let customers: Vec<_> = match q.email.as_deref().filter(|e| !e.trim().is_empty()) {
        Some(email) => state.customers.find_by_email(email).await?.into_iter().collect(),
        None => state.customers.get_customers().await?,
    };
    info!(count = customers.len(), "list customers");
    Ok(Json(customers.into_iter().map(CustomerView::from).collect()))
}

#[utoipa::path(
    post, path = "/customers", tag = "customers",
    request_body = crate::openapi::CustomerInputDoc,
    responses(
        (status = 200, description = "Created", body = crate::openapi::CustomerDoc),
        (status = 400, description = "Malformed body or validation error"),
        (status = 409, description = "Email already exists"),
        (status = 500, description = "Create Failed")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CustomerInput>, JsonRejection>,
) -> Result<Json<CustomerView>, JsonApiError> {
    let Json(input) = payload?;
    let created = state.customers.create_customer(input).await?;
    Ok(Json(created.into()))
}

#[utoipa::path(
    put, path = "/customers/{id}", tag = "customers",
    params(("id" = String, Path, description = "Customer id (24 hex characters)")),
    request_body = crate::openapi::CustomerInputDoc,
    responses(
        (status = 200, description = "Updated", body = crate::openapi::CustomerDoc),
        (status = 400, description = "Malformed id, body or validation error"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Email already exists"),
        (status = 500, description = "Update Failed")
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<CustomerInput>, JsonRejection>,
) -> Result<Json<CustomerView>, JsonApiError> {
    let Json(input) = payload?;
    let updated = state.customers.update_customer(&id, input).await?;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    get, path = "/verify-email", tag = "customers",
    params(VerifyQuery),
    responses(
        (status = 200, description = "Email verified (plain text)"),
        (status = 400, description = "Token is required"),
        (status = 404, description = "Unknown or already used token"),
        (status = 500, description = "Verification Failed")
    )
)]
pub async fn verify_email(
    State(state): State<AppState>,
    Query(q): Query<VerifyQuery>,
) -> Result<(StatusCode, &'static str), JsonApiError> {
    let token = q
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| JsonApiError::bad_request("Token is required"))?;
    state.customers.verify_email(&token).await?;
    Ok((StatusCode::OK, "Email verified successfully"))
}
