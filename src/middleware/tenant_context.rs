use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::auth::{guard, AuthenticatedPrincipal};
use crate::database::models::tenant::Tenant;
use crate::error::ApiError;
use crate::middleware::AppState;
use crate::resolver;

/// Per-request tenant context: the resolved tenant (or none, for the main
/// domain) and the principal the guard already allowed against it. Created
/// at request start, discarded at request end, never cached.
#[derive(Clone, Debug)]
pub struct TenantContext {
    pub tenant: Option<Tenant>,
    pub principal: AuthenticatedPrincipal,
}

impl TenantContext {
    /// Schema to acquire a session against, when a tenant was resolved
    pub fn schema_name(&self) -> Option<&str> {
        self.tenant.as_ref().map(|t| t.schema_name.as_str())
    }
}

/// Resolution pipeline for every tenant-aware request:
/// resolve (host / header / query) -> directory lookup (servable only) ->
/// access guard -> inject TenantContext. Handlers then acquire schema
/// sessions through the router in state.
///
/// Must run after `jwt_auth_middleware`; a missing principal is a 401.
pub async fn tenant_context_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = request
        .extensions()
        .get::<AuthenticatedPrincipal>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("Authentication required before tenant resolution"))?;

    let host = request
        .headers()
        .get(axum::http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let slug_header = request
        .headers()
        .get("x-tenant-slug")
        .and_then(|v| v.to_str().ok());
    let slug_query = query_param(request.uri().query(), "tenant");

    let resolved = resolver::resolve(host, slug_header, slug_query.as_deref());

    let tenant = match &resolved {
        Some(resolved) => {
            let tenant = state.directory.lookup_servable(&resolved.slug).await?;
            debug!(
                "Resolved tenant '{}' (schema {}) for {}",
                tenant.slug, tenant.schema_name, principal.subject
            );
            Some(tenant)
        }
        None => {
            debug!("Main-domain context for {}", principal.subject);
            None
        }
    };

    guard::check(&principal, tenant.as_ref())?;

    request
        .extensions_mut()
        .insert(TenantContext { tenant, principal });

    Ok(next.run(request).await)
}

/// Minimal query-string lookup; tenant slugs never need percent-decoding
fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    query?.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name && !value.is_empty()).then(|| value.to_string())
    })
}
