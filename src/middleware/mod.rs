pub mod auth;
pub mod tenant_context;

use std::sync::Arc;

use crate::database::router::ConnectionRouter;
use crate::services::directory::TenantDirectory;

/// Shared service state injected into the middleware stack and handlers
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ConnectionRouter>,
    pub directory: Arc<TenantDirectory>,
}

pub use auth::jwt_auth_middleware;
pub use tenant_context::{tenant_context_middleware, TenantContext};
