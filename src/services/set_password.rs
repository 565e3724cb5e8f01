use tonic::{Request, Response, Status};
use crate::grpc::{admin, common};
use crate::model::events::{AuditEvent, AuditKind};
use crate::services::normalise_email;
use crate::utils::context::ServiceContext;
use crate::utils::errors::{ErrorCode, WardenError};

const OPERATOR: &str = "operator";

///
/// Administrative credential reset. Replaces the old habit of one-off scripts
/// poking the password column directly.
///
/// Optionally flags the account so the next login forces a rotation.
///
pub async fn set_password(ctx: &ServiceContext, request: Request<admin::SetPasswordRequest>)
    -> Result<Response<common::Empty>, Status> {

    let request = request.into_inner();
    let email = normalise_email(&request.email);
    let now = ctx.now();

    let policy = ctx.policy_snapshot();
    policy.validate_pattern(&request.new_password)?;

    let account = match ctx.store().load_account(&email).await? {
        Some(account) => account,
        None => return Err(ErrorCode::AccountNotFound.with_msg("no account with that email").into()),
    };

    let new_password = request.new_password.clone();
    let new_phc = tokio::task::spawn_blocking(move || policy.hash_into_phc(&new_password))
        .await
        .map_err(WardenError::from)??;

    if !ctx.store().set_password(&account.account_id, &new_phc, request.require_change_on_next, None, now).await? {
        return Err(ErrorCode::AccountNotFound.with_msg("the account no longer exists").into())
    }

    ctx.audit(AuditEvent::new(AuditKind::PasswordChanged, now)
        .for_account(&account)
        .by_actor(OPERATOR)
        .because("administrative reset")).await?;

    Ok(Response::new(common::Empty::default()))
}
