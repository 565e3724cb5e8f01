use tonic::{Request, Response, Status};
use crate::grpc::warden as api;
use crate::model::algorithm;
use crate::model::events::{AuditEvent, AuditKind};
use crate::model::lockout::{self, Decision, RejectReason, Transition};
use crate::model::session::Session;
use crate::services::{normalise_email, uniform_rejection};
use crate::utils::context::ServiceContext;
use crate::utils::errors::{ErrorCode, WardenError};
use crate::utils::generate_id;

///
/// Evaluate a login attempt through the lockout state machine.
///
/// The engine works on a snapshot of the record; every mutation it calls for
/// is applied through the store's atomic primitives, so attempts racing on
/// the same account cannot under-count failures or lock twice.
///
pub async fn login(ctx: &ServiceContext, request: Request<api::LoginRequest>)
    -> Result<Response<api::LoginResponse>, Status> {

    let request = request.into_inner();
    let email = normalise_email(&request.email);
    let now = ctx.now();
    let policy = ctx.policy_snapshot().lockout();

    let mut account = match ctx.store().load_account(&email).await? {
        Some(account) => account,
        None => {
            tracing::info!("Login rejected: no account for the supplied email");
            ctx.audit(AuditEvent::new(AuditKind::LoginFailed, now)
                .for_email(&email)
                .because("unknown email")).await?;
            return Err(uniform_rejection())
        },
    };

    // Don't spend hash time on an account a standing lock rejects anyway.
    let standing_lock = account.account_locked && !account.lock_expired(now);
    let credentials_valid = match standing_lock {
        true => false,
        false => {
            let phc = account.phc.clone();
            let plain_text_password = request.plain_text_password.clone();
            tokio::task::spawn_blocking(move || algorithm::validate(&plain_text_password, &phc))
                .await
                .map_err(WardenError::from)??
        },
    };

    let (decision, transitions) = lockout::evaluate_attempt(&mut account, credentials_valid, now, &policy);

    for transition in transitions {
        match transition {
            Transition::AutoUnlock => {
                if ctx.store().try_auto_unlock(&account.account_id, now).await? {
                    ctx.audit(AuditEvent::new(AuditKind::AccountUnlocked, now)
                        .for_account(&account)
                        .because("lock expired")).await?;
                }
            },

            Transition::RecordFailure => {
                // The post-increment count from the store is authoritative -
                // the snapshot under-counts when attempts race.
                let attempts = ctx.store().record_failure(&account.account_id, now).await?;

                if attempts >= policy.max_failures {
                    let expires_at = policy.lock_expiry(account.role, now);

                    if ctx.store().try_lock(&account.account_id, expires_at).await? {
                        tracing::warn!("Account {} exceeded the failure threshold and is now locked", account.account_id);
                        ctx.audit(AuditEvent::new(AuditKind::AccountLocked, now)
                            .for_account(&account)
                            .because(&format!("{} consecutive failed logins", attempts))).await?;
                    }
                }
            },

            Transition::RecordSuccess => {
                ctx.store().record_success(&account.account_id, now).await?;
            },
        }
    }

    match decision {
        Decision::Accepted { must_change_password } => {
            let session = Session::new(generate_id(), &account.account_id, now);
            ctx.store().create_session(&session).await?;

            ctx.audit(AuditEvent::new(AuditKind::LoginSucceeded, now).for_account(&account)).await?;

            Ok(Response::new(api::LoginResponse {
                session_token: session.session_token,
                account: Some((&account).into()),
                must_change_password,
            }))
        },

        Decision::Rejected(reason) => {
            // The precise rejection is logged and audited, then collapsed into
            // the uniform public response.
            let (kind, precise) = match reason {
                RejectReason::InvalidCredentials =>
                    (AuditKind::LoginFailed, ErrorCode::InvalidCredentials.with_msg("credentials did not match")),
                RejectReason::AccountLocked =>
                    (AuditKind::LoginRejectedLocked, ErrorCode::AccountLocked.with_msg("the account is locked")),
            };

            tracing::info!("Login rejected for account {}: {}", account.account_id, precise.message());
            ctx.audit(AuditEvent::new(kind, now).for_account(&account).because(precise.message())).await?;
            Err(uniform_rejection())
        },
    }
}
