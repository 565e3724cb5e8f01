use chrono::Duration;
use tonic::{Request, Response, Status};
use crate::grpc::{common, warden as api};
use crate::model::account::Role;
use crate::model::events::{AuditEvent, AuditKind};
use crate::services::normalise_email;
use crate::utils::context::ServiceContext;
use crate::utils::errors::{ErrorCode, WardenError};

///
/// Phase 2/2 of the self-service reset: redeem the code for a new credential.
///
/// A completed reset restores good standing - counters zeroed and any lock
/// released - like every other credential write.
///
pub async fn complete_reset(ctx: &ServiceContext, request: Request<api::CompleteResetRequest>)
    -> Result<Response<common::Empty>, Status> {

    let request = request.into_inner();
    let email = normalise_email(&request.email);
    let now = ctx.now();
    let policy = ctx.policy_snapshot();

    let account = match ctx.store().load_account(&email).await? {
        Some(account) => account,
        None => return Err(ErrorCode::AccountNotFound.with_msg("no account with that email").into()),
    };

    if account.role == Role::SuperAdmin {
        return Err(ErrorCode::SelfServiceResetDisabled
            .with_msg("superadmin accounts have no self-service reset").into())
    }

    let (reset_code, started_at) = match (&account.reset_code, account.reset_started_at) {
        (Some(reset_code), Some(started_at)) => (reset_code, started_at),
        _ => return Err(ErrorCode::NoResetCode.with_msg("no reset is in progress").into()),
    };

    if now - started_at.to_chrono() > Duration::seconds(policy.reset_timeout_seconds as i64) {
        return Err(ErrorCode::ResetWindowExpired
            .with_msg("the reset code has expired, start the reset again").into())
    }

    if reset_code != &request.reset_code {
        return Err(ErrorCode::ResetCodeMismatch.with_msg("the reset code does not match").into())
    }

    policy.validate_pattern(&request.new_password)?;

    let new_password = request.new_password.clone();
    let new_phc = tokio::task::spawn_blocking(move || policy.hash_into_phc(&new_password))
        .await
        .map_err(WardenError::from)??;

    if !ctx.store().set_password(&account.account_id, &new_phc, false, None, now).await? {
        return Err(ErrorCode::AccountNotFound.with_msg("the account no longer exists").into())
    }

    ctx.audit(AuditEvent::new(AuditKind::PasswordResetCompleted, now).for_account(&account)).await?;

    Ok(Response::new(common::Empty::default()))
}
