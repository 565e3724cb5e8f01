use tonic::{Request, Response, Status};
use crate::grpc::{admin, common};
use crate::model::events::{AuditEvent, AuditKind};
use crate::services::normalise_email;
use crate::utils::context::ServiceContext;
use crate::utils::errors::ErrorCode;

///
/// Update the MFA gating flags. Verification of a second factor is the
/// portal's concern - warden only gates on required/enrolled.
///
pub async fn set_mfa(ctx: &ServiceContext, request: Request<admin::SetMfaRequest>)
    -> Result<Response<common::Empty>, Status> {

    let request = request.into_inner();
    let email = normalise_email(&request.email);
    let now = ctx.now();

    let account = match ctx.store().load_account(&email).await? {
        Some(account) => account,
        None => return Err(ErrorCode::AccountNotFound.with_msg("no account with that email").into()),
    };

    ctx.store().set_mfa(&account.account_id, request.mfa_required, request.mfa_enabled).await?;

    ctx.audit(AuditEvent::new(AuditKind::MfaUpdated, now)
        .for_account(&account)
        .by_actor("operator")
        .because(&format!("required={} enabled={}", request.mfa_required, request.mfa_enabled))).await?;

    Ok(Response::new(common::Empty::default()))
}
