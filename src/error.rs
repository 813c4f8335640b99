// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// HTTP API error with appropriate status codes and client-friendly
/// messages. Tenant resolution, authorization, and infrastructure failures
/// keep distinct codes: "does not exist", "inactive", and "no access" must
/// never collapse into one generic rejection.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    PermissionDenied(String),
    TenantInactive(String),

    // 404 Not Found
    TenantNotFound(String),
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    SchemaNotInitialized(String),
    InternalServerError(String),

    // 503 Service Unavailable
    ConnectionUnavailable(String),
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            ApiError::TenantInactive(_) => StatusCode::FORBIDDEN,
            ApiError::TenantNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::SchemaNotInitialized(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ConnectionUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::PermissionDenied(msg)
            | ApiError::TenantInactive(msg)
            | ApiError::TenantNotFound(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::SchemaNotInitialized(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::ConnectionUnavailable(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::PermissionDenied(_) => "PERMISSION_DENIED",
            ApiError::TenantInactive(_) => "TENANT_INACTIVE",
            ApiError::TenantNotFound(_) => "TENANT_NOT_FOUND",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::SchemaNotInitialized(_) => "SCHEMA_NOT_INITIALIZED",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ConnectionUnavailable(_) => "CONNECTION_UNAVAILABLE",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        })
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }
}

impl From<crate::auth::AuthError> for ApiError {
    fn from(err: crate::auth::AuthError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

impl From<crate::auth::guard::AccessDenied> for ApiError {
    fn from(err: crate::auth::guard::AccessDenied) -> Self {
        ApiError::PermissionDenied(err.to_string())
    }
}

impl From<crate::database::router::RouterError> for ApiError {
    fn from(err: crate::database::router::RouterError) -> Self {
        use crate::database::router::RouterError;
        match err {
            RouterError::SchemaNotInitialized(schema) => {
                tracing::error!("Schema not initialized: {}", schema);
                ApiError::SchemaNotInitialized(format!("Schema '{}' is not initialized", schema))
            }
            RouterError::ConnectionUnavailable(msg) => {
                tracing::error!("Connection unavailable: {}", msg);
                ApiError::ConnectionUnavailable("Database temporarily unavailable".to_string())
            }
            RouterError::InvalidSchemaName(name) => {
                ApiError::BadRequest(format!("Invalid schema name: {}", name))
            }
            RouterError::ConfigMissing(_) | RouterError::InvalidDatabaseUrl => {
                tracing::error!("Database configuration error: {}", err);
                ApiError::ServiceUnavailable("Service misconfigured".to_string())
            }
            RouterError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<crate::services::directory::DirectoryError> for ApiError {
    fn from(err: crate::services::directory::DirectoryError) -> Self {
        use crate::services::directory::DirectoryError;
        match err {
            DirectoryError::TenantNotFound(slug) => {
                ApiError::TenantNotFound(format!("Tenant '{}' does not exist", slug))
            }
            DirectoryError::TenantInactive { slug, status } => ApiError::TenantInactive(format!(
                "Tenant '{}' is not active (status: {})",
                slug, status
            )),
            DirectoryError::InvalidTransition { slug, from, to } => ApiError::Conflict(format!(
                "Tenant '{}' cannot move from {} to {}",
                slug, from, to
            )),
            DirectoryError::Router(e) => e.into(),
            DirectoryError::Sqlx(sqlx_err) => {
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<crate::services::provisioner::ProvisioningError> for ApiError {
    fn from(err: crate::services::provisioner::ProvisioningError) -> Self {
        use crate::services::provisioner::ProvisioningError;
        match err {
            ProvisioningError::InvalidSlug(slug) => {
                ApiError::BadRequest(format!("Invalid tenant slug: {}", slug))
            }
            ProvisioningError::AlreadyExists(slug) => {
                ApiError::Conflict(format!("Tenant '{}' already exists", slug))
            }
            ProvisioningError::Directory(e) => e.into(),
            ProvisioningError::Router(e) => e.into(),
            other => {
                tracing::error!("Provisioning error: {}", other);
                ApiError::internal_server_error(other.to_string())
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::directory::DirectoryError;
    use crate::database::models::tenant::TenantStatus;

    #[test]
    fn rejection_kinds_stay_distinguishable() {
        let not_found: ApiError = DirectoryError::TenantNotFound("acme".to_string()).into();
        let inactive: ApiError = DirectoryError::TenantInactive {
            slug: "acme".to_string(),
            status: TenantStatus::Suspended,
        }
        .into();
        let denied: ApiError =
            crate::auth::guard::AccessDenied::MainDomainRestricted.into();

        assert_eq!(not_found.error_code(), "TENANT_NOT_FOUND");
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(inactive.error_code(), "TENANT_INACTIVE");
        assert_eq!(inactive.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(denied.error_code(), "PERMISSION_DENIED");
        assert_eq!(denied.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn infrastructure_errors_map_to_503() {
        use crate::database::router::RouterError;
        let err: ApiError =
            RouterError::ConnectionUnavailable("timed out".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.error_code(), "CONNECTION_UNAVAILABLE");
        // Internal detail is not leaked to clients
        assert!(!err.message().contains("timed out"));
    }

    #[test]
    fn json_envelope_shape() {
        let err = ApiError::TenantNotFound("acme".to_string());
        let body = err.to_json();
        assert_eq!(body["error"], true);
        assert_eq!(body["code"], "TENANT_NOT_FOUND");
    }
}
