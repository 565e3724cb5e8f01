use tonic::{Request, Response, Status};
use crate::grpc::admin;
use crate::model::account::Role;
use crate::model::events::{AuditEvent, AuditKind};
use crate::services::normalise_email;
use crate::utils::context::ServiceContext;
use crate::utils::errors::ErrorCode;

///
/// The out-of-band unlock for superadmin accounts, whose locks are indefinite
/// and have no self-service exit.
///
/// Only reachable through the loopback admin listener. The audit event is
/// mandatory: a failed audit write surfaces before success is reported.
///
pub async fn emergency_unlock(ctx: &ServiceContext, request: Request<admin::EmergencyUnlockRequest>)
    -> Result<Response<admin::EmergencyUnlockResponse>, Status> {

    let request = request.into_inner();
    let email = normalise_email(&request.email);
    let now = ctx.now();

    if request.actor.trim().is_empty() {
        return Err(Status::invalid_argument("an actor identity is required"))
    }

    if request.reason.trim().is_empty() {
        return Err(Status::invalid_argument("a reason is required"))
    }

    // Deliberately the same error whether the email is unknown or the account
    // is not a superadmin.
    let account = match ctx.store().load_account(&email).await? {
        Some(account) if account.role == Role::SuperAdmin => account,
        _ => return Err(ErrorCode::AccountNotFound.with_msg("no superadmin account with that email").into()),
    };

    if !account.account_locked {
        return Ok(Response::new(admin::EmergencyUnlockResponse {
            outcome: admin::UnlockOutcome::NoActionNeeded.into(),
        }))
    }

    match ctx.store().clear_lockout(&account.account_id).await? {
        true => {
            ctx.audit(AuditEvent::new(AuditKind::EmergencyUnlock, now)
                .for_account(&account)
                .by_actor(&request.actor)
                .because(&request.reason)).await?;

            Ok(Response::new(admin::EmergencyUnlockResponse {
                outcome: admin::UnlockOutcome::Unlocked.into(),
            }))
        },

        // Something released the lock while we were looking at it.
        false => Ok(Response::new(admin::EmergencyUnlockResponse {
            outcome: admin::UnlockOutcome::NoActionNeeded.into(),
        })),
    }
}
