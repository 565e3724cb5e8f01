use rand::Rng;
use rand::distributions::Alphanumeric;
use tonic::{Request, Response, Status};
use crate::grpc::warden as api;
use crate::model::account::Role;
use crate::model::events::{AuditEvent, AuditKind};
use crate::services::normalise_email;
use crate::utils::context::ServiceContext;
use crate::utils::errors::ErrorCode;

const RESET_CODE_LENGTH: usize = 8;

///
/// Phase 1/2 of the self-service reset: issue a one-shot code.
///
/// Delivery of the code (email, SMS) belongs to the portal tier - it is
/// returned to the caller, never logged.
///
pub async fn start_reset(ctx: &ServiceContext, request: Request<api::StartResetRequest>)
    -> Result<Response<api::StartResetResponse>, Status> {

    let request = request.into_inner();
    let email = normalise_email(&request.email);
    let now = ctx.now();

    let account = match ctx.store().load_account(&email).await? {
        Some(account) => account,
        None => return Err(ErrorCode::AccountNotFound.with_msg("no account with that email").into()),
    };

    // The only way out of a superadmin lockout is the emergency unlock path.
    if account.role == Role::SuperAdmin {
        return Err(ErrorCode::SelfServiceResetDisabled
            .with_msg("superadmin accounts have no self-service reset").into())
    }

    let reset_code: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RESET_CODE_LENGTH)
        .map(char::from)
        .collect();

    ctx.store().set_reset_code(&account.account_id, &reset_code, now).await?;

    ctx.audit(AuditEvent::new(AuditKind::PasswordResetStarted, now).for_account(&account)).await?;

    Ok(Response::new(api::StartResetResponse { reset_code }))
}
