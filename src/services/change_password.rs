use tonic::{Request, Response, Status};
use crate::grpc::{common, warden as api};
use crate::model::algorithm;
use crate::model::events::{AuditEvent, AuditKind};
use crate::services::{normalise_email, uniform_rejection};
use crate::utils::context::ServiceContext;
use crate::utils::errors::{ErrorCode, WardenError};

/// A concurrent credential change is retried once before surfacing.
const CONFLICT_RETRIES: usize = 1;

///
/// Rotate the credential after verifying the current one.
///
/// The write is guarded on the hash we verified against, so two racing
/// changes cannot silently overwrite each other - the loser reloads and
/// re-verifies, then surfaces StorageConflict if it loses again.
///
pub async fn change_password(ctx: &ServiceContext, request: Request<api::ChangePasswordRequest>)
    -> Result<Response<common::Empty>, Status> {

    let request = request.into_inner();
    let email = normalise_email(&request.email);

    let policy = ctx.policy_snapshot();
    policy.validate_pattern(&request.new_password)?;

    for _ in 0..=CONFLICT_RETRIES {
        let now = ctx.now();

        let account = match ctx.store().load_account(&email).await? {
            Some(account) => account,
            None => return Err(uniform_rejection()),
        };

        let phc = account.phc.clone();
        let current_password = request.current_password.clone();
        let valid = tokio::task::spawn_blocking(move || algorithm::validate(&current_password, &phc))
            .await
            .map_err(WardenError::from)??;

        if !valid {
            tracing::info!("Password change rejected for account {}: current credential did not match", account.account_id);
            return Err(uniform_rejection())
        }

        let policy_for_hashing = policy.clone();
        let new_password = request.new_password.clone();
        let new_phc = tokio::task::spawn_blocking(move || policy_for_hashing.hash_into_phc(&new_password))
            .await
            .map_err(WardenError::from)??;

        if ctx.store().set_password(&account.account_id, &new_phc, false, Some(&account.phc), now).await? {
            ctx.audit(AuditEvent::new(AuditKind::PasswordChanged, now)
                .for_account(&account)
                .by_actor(&account.email)
                .because("self-service change")).await?;

            return Ok(Response::new(common::Empty::default()))
        }

        tracing::warn!("Concurrent credential change detected for account {}, retrying", account.account_id);
    }

    Err(ErrorCode::StorageConflict.with_msg("the credential changed while the request was in flight").into())
}
