use crate::database::models::tenant::schema_name_for;

/// Subdomain labels that never name a tenant
const RESERVED_SUBDOMAINS: &[&str] = &["www", "app", "api"];

/// A tenant identity resolved from request metadata, before any directory
/// lookup has confirmed it exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTenant {
    pub slug: String,
    pub schema_name: String,
}

/// Resolve the target tenant for a request from its host, the
/// `X-Tenant-Slug` header, and the `tenant` query parameter, in that
/// precedence order. Returns `None` for the main-domain / system context.
///
/// Pure and total: malformed input means "no tenant found", never an error.
pub fn resolve(
    host: &str,
    header: Option<&str>,
    query: Option<&str>,
) -> Option<ResolvedTenant> {
    let candidates = [subdomain_candidate(host), header, query];

    for candidate in candidates.into_iter().flatten() {
        if is_valid_candidate(candidate) {
            return Some(ResolvedTenant {
                slug: candidate.to_string(),
                schema_name: schema_name_for(candidate),
            });
        }
        // Rejected candidates fall through to the next source
    }

    None
}

/// First host label, if the host has a subdomain and it is not reserved.
/// Hosts with fewer than three labels (localhost, example.com) and IP
/// addresses have no subdomain to offer.
fn subdomain_candidate(host: &str) -> Option<&str> {
    let host = host.split(':').next().unwrap_or_default();
    if host.parse::<std::net::IpAddr>().is_ok() {
        return None;
    }
    let mut labels = host.split('.');
    let first = labels.next().filter(|l| !l.is_empty())?;

    // Need at least base domain + TLD after the candidate label
    if labels.count() < 2 {
        return None;
    }
    if RESERVED_SUBDOMAINS.contains(&first) {
        return None;
    }

    Some(first)
}

fn is_valid_candidate(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slug_of(resolved: Option<ResolvedTenant>) -> Option<String> {
        resolved.map(|r| r.slug)
    }

    #[test]
    fn resolves_subdomain() {
        let resolved = resolve("acme.example.com", None, None).unwrap();
        assert_eq!(resolved.slug, "acme");
        assert_eq!(resolved.schema_name, "tenant_acme");
    }

    #[test]
    fn strips_port_from_host() {
        assert_eq!(
            slug_of(resolve("acme.example.com:8080", None, None)),
            Some("acme".to_string())
        );
    }

    #[test]
    fn main_domain_resolves_to_none() {
        assert_eq!(resolve("example.com", None, None), None);
        assert_eq!(resolve("localhost", None, None), None);
        assert_eq!(resolve("localhost:3000", None, None), None);
    }

    #[test]
    fn ip_hosts_have_no_subdomain() {
        assert_eq!(resolve("127.0.0.1", None, None), None);
        assert_eq!(resolve("127.0.0.1:8080", None, None), None);
        assert_eq!(
            slug_of(resolve("127.0.0.1:8080", Some("acme"), None)),
            Some("acme".to_string())
        );
    }

    #[test]
    fn reserved_subdomains_are_skipped() {
        assert_eq!(resolve("www.example.com", None, None), None);
        assert_eq!(resolve("app.example.com", None, None), None);
        assert_eq!(resolve("api.example.com", None, None), None);
    }

    #[test]
    fn header_fallback_when_no_subdomain() {
        assert_eq!(
            slug_of(resolve("example.com", Some("acme"), None)),
            Some("acme".to_string())
        );
    }

    #[test]
    fn query_fallback_when_no_subdomain_or_header() {
        assert_eq!(
            slug_of(resolve("example.com", None, Some("acme"))),
            Some("acme".to_string())
        );
    }

    #[test]
    fn subdomain_wins_over_header_and_query() {
        assert_eq!(
            slug_of(resolve("acme.example.com", Some("beta"), Some("gamma"))),
            Some("acme".to_string())
        );
    }

    #[test]
    fn header_wins_over_query() {
        assert_eq!(
            slug_of(resolve("example.com", Some("beta"), Some("gamma"))),
            Some("beta".to_string())
        );
    }

    #[test]
    fn malformed_candidates_fall_through() {
        // Uppercase subdomain rejected, header picks up
        assert_eq!(
            slug_of(resolve("Acme.example.com", Some("beta"), None)),
            Some("beta".to_string())
        );
        // Malformed header rejected, query picks up
        assert_eq!(
            slug_of(resolve("example.com", Some("not valid!"), Some("gamma"))),
            Some("gamma".to_string())
        );
        // Everything malformed: main-domain context, not an error
        assert_eq!(resolve("example.com", Some("NOPE"), Some("als0_bad!")), None);
    }

    #[test]
    fn hyphenated_slug_maps_to_underscored_schema() {
        let resolved = resolve("acme-corp.example.com", None, None).unwrap();
        assert_eq!(resolved.slug, "acme-corp");
        assert_eq!(resolved.schema_name, "tenant_acme_corp");
    }

    #[test]
    fn empty_sources_resolve_to_none() {
        assert_eq!(resolve("", None, None), None);
        assert_eq!(resolve("example.com", Some(""), Some("")), None);
    }
}
