use std::str::FromStr;
use tonic::{Request, Response, Status};
use crate::grpc::warden as api;
use crate::model::account::{Account, Role};
use crate::model::events::{AuditEvent, AuditKind};
use crate::services::normalise_email;
use crate::utils::context::ServiceContext;
use crate::utils::errors::WardenError;
use crate::utils::generate_id;

///
/// Provision a new account security record with unlocked defaults.
///
pub async fn register(ctx: &ServiceContext, request: Request<api::RegisterRequest>)
    -> Result<Response<api::AccountResponse>, Status> {

    let request = request.into_inner();
    let email = normalise_email(&request.email);
    let role = Role::from_str(&request.role)?;

    // Check the password against the active policy before paying for a hash.
    let policy = ctx.policy_snapshot();
    policy.validate_pattern(&request.plain_text_password)?;

    // Hashing is CPU-bound, keep it off the event loop.
    let plain_text_password = request.plain_text_password.clone();
    let phc = tokio::task::spawn_blocking(move || policy.hash_into_phc(&plain_text_password))
        .await
        .map_err(WardenError::from)??;

    let account = Account::new(generate_id(), email, phc, role, ctx.now());
    ctx.store().insert_account(&account).await?;

    ctx.audit(AuditEvent::new(AuditKind::Registered, ctx.now()).for_account(&account)).await?;

    Ok(Response::new(api::AccountResponse { account: Some((&account).into()) }))
}
