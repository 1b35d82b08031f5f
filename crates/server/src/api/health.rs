//! Liveness endpoint.

/// Tag for OpenAPI documentation.
pub const MISC_TAG: &str = "Miscellaneous";

/// Health check endpoint.
#[tracing::instrument()]
#[utoipa::path(
    method(get, head),
    path = "/healthz",
    tag = MISC_TAG,
    operation_id = "Health Check",
    summary = "Service health check",
    description = "Returns `ok` while the process accepts requests. Neither the database nor the \
                   identity provider is contacted, so it is safe for liveness probes.",
    responses(
        (status = 200, description = "Service is up", body = str, content_type = "text/plain", example = "ok")
    )
)]
pub async fn health() -> &'static str {
    "ok"
}
