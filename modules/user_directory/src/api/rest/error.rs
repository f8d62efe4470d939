use axum::http::StatusCode;

use crate::api::rest::problem::{Problem, ProblemResponse};
use crate::domain::error::DomainError;

/// Helper to create a ProblemResponse with less boilerplate
pub fn from_parts(
    status: StatusCode,
    code: &str,
    title: &str,
    detail: impl Into<String>,
    instance: &str,
) -> ProblemResponse {
    let problem = Problem::new(status, title, detail)
        .with_type(format!("https://errors.userdir.dev/{}", code))
        .with_code(code)
        .with_instance(instance);

    let problem = if let Some(id) = tracing::Span::current().id() {
        problem.with_trace_id(id.into_u64().to_string())
    } else {
        problem
    };

    ProblemResponse(problem)
}

/// 400 for payloads that never reached the domain (bad JSON, bad multipart).
pub fn bad_request(detail: impl Into<String>, instance: &str) -> ProblemResponse {
    from_parts(
        StatusCode::BAD_REQUEST,
        "USERS_BAD_REQUEST",
        "Bad request",
        detail,
        instance,
    )
}

/// Map domain error to RFC9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    match e {
        DomainError::InvalidArgument { .. } => from_parts(
            StatusCode::BAD_REQUEST,
            "USERS_INVALID_ARGUMENT",
            "Invalid argument",
            e.to_string(),
            instance,
        ),
        DomainError::Unauthorized { .. } => from_parts(
            StatusCode::UNAUTHORIZED,
            "USERS_NO_ADMIN_FOUND",
            "Unauthorized",
            e.to_string(),
            instance,
        ),
        DomainError::Forbidden { .. } => from_parts(
            StatusCode::FORBIDDEN,
            "USERS_INVALID_ROLE",
            "Forbidden",
            e.to_string(),
            instance,
        ),
        DomainError::UserNotFound { .. } | DomainError::NoUsers => from_parts(
            StatusCode::NOT_FOUND,
            "USERS_NOT_FOUND",
            "No user found",
            e.to_string(),
            instance,
        ),
        DomainError::RoleNotFound { .. } => from_parts(
            StatusCode::NOT_FOUND,
            "ROLES_NOT_FOUND",
            "Role not found",
            e.to_string(),
            instance,
        ),
        DomainError::PhotoNotFound { .. } => from_parts(
            StatusCode::NOT_FOUND,
            "PHOTOS_NOT_FOUND",
            "Photo not found",
            e.to_string(),
            instance,
        ),
        DomainError::PhotoAlreadyExists { .. } => from_parts(
            StatusCode::CONFLICT,
            "PHOTOS_ALREADY_EXISTS",
            "User already has a photo",
            e.to_string(),
            instance,
        ),
        DomainError::Store { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Store error occurred");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_STORE",
                "Internal error",
                "An internal storage error occurred",
                instance,
            )
        }
        DomainError::TimedOut { .. } => from_parts(
            StatusCode::GATEWAY_TIMEOUT,
            "REQUEST_TIMEOUT",
            "Request timed out",
            e.to_string(),
            instance,
        ),
        DomainError::Cancelled => from_parts(
            StatusCode::SERVICE_UNAVAILABLE,
            "REQUEST_CANCELLED",
            "Request cancelled",
            e.to_string(),
            instance,
        ),
    }
}
