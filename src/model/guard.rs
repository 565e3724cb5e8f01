use crate::model::account::{Account, Role};

pub const LOGIN_ROUTE: &str = "/login";
pub const CHANGE_PASSWORD_ROUTE: &str = "/account/change-password";
pub const MFA_SETUP_ROUTE: &str = "/account/mfa-setup";

///
/// Where the guard sends a session that may not proceed.
///
#[derive(Clone, Debug, PartialEq)]
pub enum Access {
    Allow,
    RedirectToLogin,
    RedirectToPasswordChange,
    RedirectToMfaSetup,
    Denied { redirect_to: &'static str },
}

impl Access {
    pub fn redirect_to(&self) -> &str {
        match self {
            Access::Allow => "",
            Access::RedirectToLogin => LOGIN_ROUTE,
            Access::RedirectToPasswordChange => CHANGE_PASSWORD_ROUTE,
            Access::RedirectToMfaSetup => MFA_SETUP_ROUTE,
            Access::Denied { redirect_to } => redirect_to,
        }
    }
}

///
/// The single role-to-landing-page mapping. Every denial redirect comes
/// through here rather than ad-hoc branching at each call site.
///
pub fn landing_route(role: Role) -> &'static str {
    match role {
        Role::Patient => "/portal",
        Role::Provider => "/provider",
        Role::Admin | Role::SuperAdmin => "/admin",
    }
}

///
/// The route access guard.
///
/// The gate order is load-bearing: remediation gates (forced password change,
/// MFA enrolment) outrank the role check, so a non-compliant admin cannot use
/// its role to sidestep remediation. An empty allowed-role set means the
/// route is open to any authenticated session.
///
pub fn check_access(session: Option<&Account>, allowed_roles: &[Role]) -> Access {
    let account = match session {
        Some(account) => account,
        None => return Access::RedirectToLogin,
    };

    if account.change_password_required {
        return Access::RedirectToPasswordChange
    }

    if account.mfa_required && !account.mfa_enabled {
        return Access::RedirectToMfaSetup
    }

    if !allowed_roles.is_empty() && !allowed_roles.contains(&account.role) {
        return Access::Denied { redirect_to: landing_route(account.role) }
    }

    Access::Allow
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn account(role: Role) -> Account {
        Account::new("acc-1".to_string(), "user@example.com".to_string(), "$argon2id$...".to_string(), role, Utc::now())
    }

    #[test]
    fn test_no_session_redirects_to_login() {
        assert_eq!(check_access(None, &[]), Access::RedirectToLogin);
    }

    #[test]
    fn test_a_compliant_session_with_a_permitted_role_is_allowed() {
        let admin = account(Role::Admin);
        assert_eq!(check_access(Some(&admin), &[Role::Admin, Role::SuperAdmin]), Access::Allow);
    }

    #[test]
    fn test_an_open_route_admits_any_authenticated_session() {
        let patient = account(Role::Patient);
        assert_eq!(check_access(Some(&patient), &[]), Access::Allow);
    }

    #[test]
    fn test_forced_change_outranks_the_role_check() {
        // An admin with a pending forced change hitting an admin route must be
        // sent to the change-password flow, never through the role gate.
        let mut admin = account(Role::Admin);
        admin.change_password_required = true;

        assert_eq!(check_access(Some(&admin), &[Role::Admin]), Access::RedirectToPasswordChange);
    }

    #[test]
    fn test_forced_change_outranks_mfa_enrolment() {
        let mut admin = account(Role::Admin);
        admin.change_password_required = true;
        admin.mfa_required = true;

        assert_eq!(check_access(Some(&admin), &[Role::Admin]), Access::RedirectToPasswordChange);
    }

    #[test]
    fn test_missing_mfa_enrolment_outranks_the_role_check() {
        let mut provider = account(Role::Provider);
        provider.mfa_required = true;

        assert_eq!(check_access(Some(&provider), &[Role::Provider]), Access::RedirectToMfaSetup);

        provider.mfa_enabled = true;
        assert_eq!(check_access(Some(&provider), &[Role::Provider]), Access::Allow);
    }

    #[test]
    fn test_a_denied_role_lands_on_its_own_page() {
        let patient = account(Role::Patient);
        assert_eq!(
            check_access(Some(&patient), &[Role::Admin]),
            Access::Denied { redirect_to: "/portal" });

        let provider = account(Role::Provider);
        assert_eq!(
            check_access(Some(&provider), &[Role::Admin, Role::SuperAdmin]),
            Access::Denied { redirect_to: "/provider" });
    }
}
