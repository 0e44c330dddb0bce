use axum::response::IntoResponse;

// axum handler for the unversioned root path
pub async fn root() -> impl IntoResponse {
    crate::APP_USER_AGENT
}
