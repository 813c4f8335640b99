use thiserror::Error;

use crate::auth::{AuthenticatedPrincipal, Role};
use crate::database::models::tenant::Tenant;

/// Why a principal/tenant pairing was refused. Everything here surfaces to
/// the caller as a 403 PERMISSION_DENIED; the variants exist for logs and
/// tests, not for the wire.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessDenied {
    #[error("tenant-scoped principals cannot act outside a tenant")]
    MainDomainRestricted,

    #[error("principal is not associated with tenant '{requested}'")]
    TenantMismatch { requested: String },

    #[error("principal carries no tenant association")]
    MissingTenantAssociation,

    #[error("missing required permission '{0}'")]
    MissingPermission(String),
}

/// Decide whether a principal may act on the resolved tenant.
///
/// Rule order:
/// 1. super_admin and service principals are allowed everywhere, including
///    the main-domain (no tenant) context.
/// 2. A main-domain request from any other principal is denied.
/// 3. Tenant-scoped principals are allowed only on their own tenant; a
///    principal with no tenant association is denied.
pub fn check(
    principal: &AuthenticatedPrincipal,
    tenant: Option<&Tenant>,
) -> Result<(), AccessDenied> {
    if principal.role == Role::SuperAdmin || principal.is_service() {
        return Ok(());
    }

    let tenant = match tenant {
        Some(tenant) => tenant,
        None => return Err(AccessDenied::MainDomainRestricted),
    };

    match principal.tenant_slug.as_deref() {
        Some(slug) if slug == tenant.slug => Ok(()),
        Some(_) => Err(AccessDenied::TenantMismatch {
            requested: tenant.slug.clone(),
        }),
        None => Err(AccessDenied::MissingTenantAssociation),
    }
}

/// Finer-grained permission check, applied after `check` has confirmed
/// tenant access. A permission is granted if present verbatim, or through a
/// `resource.*` wildcard for dotted permissions. tenant_admin (and the
/// always-allowed roles) hold every permission implicitly.
pub fn has_permission(principal: &AuthenticatedPrincipal, required: &str) -> bool {
    if principal.role == Role::SuperAdmin
        || principal.role == Role::TenantAdmin
        || principal.is_service()
    {
        return true;
    }

    if principal.permissions.iter().any(|p| p == required) {
        return true;
    }

    if let Some((resource, _action)) = required.split_once('.') {
        let wildcard = format!("{}.*", resource);
        return principal.permissions.iter().any(|p| *p == wildcard);
    }

    false
}

/// `check` + `has_permission` in one call, for handlers that gate a single
/// operation
pub fn check_permission(
    principal: &AuthenticatedPrincipal,
    tenant: Option<&Tenant>,
    required: &str,
) -> Result<(), AccessDenied> {
    check(principal, tenant)?;
    if !has_permission(principal, required) {
        return Err(AccessDenied::MissingPermission(required.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenType;
    use crate::testing;

    fn principal(role: Role, tenant_slug: Option<&str>) -> AuthenticatedPrincipal {
        testing::claims(role, tenant_slug).into()
    }

    #[test]
    fn super_admin_allowed_everywhere() {
        let admin = principal(Role::SuperAdmin, None);
        let acme = testing::tenant("acme");

        assert!(check(&admin, Some(&acme)).is_ok());
        assert!(check(&admin, None).is_ok());
    }

    #[test]
    fn service_principal_allowed_everywhere() {
        let mut svc = principal(Role::TenantUser, None);
        svc.token_type = TokenType::Service;
        let acme = testing::tenant("acme");

        assert!(check(&svc, Some(&acme)).is_ok());
        assert!(check(&svc, None).is_ok());
    }

    #[test]
    fn tenant_scoped_allowed_only_on_own_tenant() {
        let acme = testing::tenant("acme");
        let beta = testing::tenant("beta");

        for role in [Role::TenantAdmin, Role::TenantUser, Role::TenantViewer] {
            let p = principal(role, Some("acme"));
            assert!(check(&p, Some(&acme)).is_ok());
            assert_eq!(
                check(&p, Some(&beta)),
                Err(AccessDenied::TenantMismatch {
                    requested: "beta".to_string()
                })
            );
        }
    }

    #[test]
    fn tenant_scoped_denied_on_main_domain() {
        let p = principal(Role::TenantUser, Some("acme"));
        assert_eq!(check(&p, None), Err(AccessDenied::MainDomainRestricted));
    }

    #[test]
    fn missing_association_is_denied() {
        let p = principal(Role::TenantUser, None);
        let acme = testing::tenant("acme");
        assert_eq!(
            check(&p, Some(&acme)),
            Err(AccessDenied::MissingTenantAssociation)
        );
    }

    #[test]
    fn verbatim_permission_grants() {
        let mut p = principal(Role::TenantUser, Some("acme"));
        p.permissions = vec!["bookings.read".to_string()];

        assert!(has_permission(&p, "bookings.read"));
        assert!(!has_permission(&p, "bookings.write"));
        assert!(!has_permission(&p, "invoices.read"));
    }

    #[test]
    fn wildcard_permission_grants_resource_actions() {
        let mut p = principal(Role::TenantViewer, Some("acme"));
        p.permissions = vec!["bookings.*".to_string()];

        assert!(has_permission(&p, "bookings.read"));
        assert!(has_permission(&p, "bookings.cancel"));
        assert!(!has_permission(&p, "invoices.read"));
        // The wildcard itself is not a dotted permission elsewhere
        assert!(!has_permission(&p, "bookings"));
    }

    #[test]
    fn tenant_admin_holds_all_permissions_implicitly() {
        let p = principal(Role::TenantAdmin, Some("acme"));
        assert!(has_permission(&p, "anything.at-all"));
    }

    #[test]
    fn check_permission_combines_both_gates() {
        let acme = testing::tenant("acme");
        let mut p = principal(Role::TenantUser, Some("acme"));
        p.permissions = vec!["bookings.read".to_string()];

        assert!(check_permission(&p, Some(&acme), "bookings.read").is_ok());
        assert_eq!(
            check_permission(&p, Some(&acme), "bookings.write"),
            Err(AccessDenied::MissingPermission("bookings.write".to_string()))
        );

        let beta = testing::tenant("beta");
        assert!(matches!(
            check_permission(&p, Some(&beta), "bookings.read"),
            Err(AccessDenied::TenantMismatch { .. })
        ));
    }
}
