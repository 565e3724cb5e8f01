use tonic::{Request, Response, Status};
use crate::grpc::{admin, common};
use crate::model::events::{AuditEvent, AuditKind};
use crate::services::normalise_email;
use crate::utils::context::ServiceContext;
use crate::utils::errors::ErrorCode;

///
/// Flag the account for forced rotation. The hash is untouched - the account
/// keeps authenticating, but the access guard pins every session to the
/// change-password flow until the rotation completes.
///
pub async fn force_password_change(ctx: &ServiceContext, request: Request<admin::ForceChangeRequest>)
    -> Result<Response<common::Empty>, Status> {

    let request = request.into_inner();
    let email = normalise_email(&request.email);
    let now = ctx.now();

    let account = match ctx.store().load_account(&email).await? {
        Some(account) => account,
        None => return Err(ErrorCode::AccountNotFound.with_msg("no account with that email").into()),
    };

    ctx.store().set_change_required(&account.account_id).await?;

    ctx.audit(AuditEvent::new(AuditKind::ForcedPasswordChange, now)
        .for_account(&account)
        .by_actor("operator")).await?;

    Ok(Response::new(common::Empty::default()))
}
