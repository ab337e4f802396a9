use crate::principal::Principal;
use crate::resolver::Capabilities;
use crate::resource::ResourceView;

/// The single tenant isolation check.
///
/// Runs before any rule predicate; a mismatch is final and no rule can
/// override it. True when:
/// - the resource is global (null tenant), or
/// - the principal is the privileged null-tenant super-admin, or
/// - both tenant ids compare equal in canonical string form.
///
/// A null-tenant principal without the super-admin grant is scoped to
/// global resources only.
pub fn same_tenant(
    principal: &Principal,
    caps: &Capabilities,
    resource: &dyn ResourceView,
) -> bool {
    let Some(resource_tenant) = resource.tenant() else {
        return true;
    };
    match principal.tenant.as_ref() {
        None => caps.is_total(),
        Some(principal_tenant) => principal_tenant == resource_tenant,
    }
}
