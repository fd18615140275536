use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct CustomerInputDoc {
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i32>,
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Customer as returned by the API. Never includes the password.
#[derive(ToSchema)]
pub struct CustomerDoc {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i32>,
    pub email: String,
    pub username: String,
    pub is_verified: bool,
    /// RFC 3339 timestamp
    pub created_at: String,
    /// RFC 3339 timestamp
    pub updated_at: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::customers::list,
        crate::routes::customers::create,
        crate::routes::customers::update,
        crate::routes::customers::verify_email,
    ),
    components(schemas(HealthResponse, CustomerInputDoc, CustomerDoc)),
    tags((name = "health"), (name = "customers"))
)]
pub struct ApiDoc;
