use std::str::FromStr;
use tonic::{Request, Response, Status};
use crate::grpc::warden as api;
use crate::model::account::Role;
use crate::model::events::{AuditEvent, AuditKind};
use crate::model::guard::{self, Access};
use crate::services::get_session::load_session_account;
use crate::utils::context::ServiceContext;
use crate::utils::errors::WardenError;

///
/// The route access guard: resolve the session, run the ordered gates and
/// report where the caller should send the user.
///
pub async fn check_access(ctx: &ServiceContext, request: Request<api::CheckAccessRequest>)
    -> Result<Response<api::CheckAccessResponse>, Status> {

    let request = request.into_inner();

    let allowed_roles = request.allowed_roles
        .iter()
        .map(|role| Role::from_str(role))
        .collect::<Result<Vec<Role>, WardenError>>()?;

    let account = load_session_account(ctx, &request.session_token).await?;
    let access = guard::check_access(account.as_ref(), &allowed_roles);

    if let (Access::Denied { .. }, Some(account)) = (&access, &account) {
        tracing::warn!("Access denied: account {} with role {} attempted a route restricted to {:?}",
            account.account_id, account.role, request.allowed_roles);

        ctx.audit(AuditEvent::new(AuditKind::AccessDenied, ctx.now())
            .for_account(account)
            .because(&format!("role {} attempted a route restricted to {:?}", account.role, request.allowed_roles))).await?;
    }

    let decision = match &access {
        Access::Allow                    => api::AccessDecision::Allow,
        Access::RedirectToLogin          => api::AccessDecision::RedirectToLogin,
        Access::RedirectToPasswordChange => api::AccessDecision::RedirectToChangePassword,
        Access::RedirectToMfaSetup       => api::AccessDecision::RedirectToMfaSetup,
        Access::Denied { .. }            => api::AccessDecision::Denied,
    };

    Ok(Response::new(api::CheckAccessResponse {
        decision: decision.into(),
        redirect_to: access.redirect_to().to_string(),
    }))
}
