pub mod tenant;

pub use tenant::{schema_name_for, Tenant, TenantStatus};
