use serde_json::json;
use tonic::{Request, Response, Status};
use crate::grpc::{admin, common};
use crate::model::events::{AuditEvent, AuditKind};
use crate::model::policy::SecurityPolicy;
use crate::utils::context::ServiceContext;
use crate::utils::errors::ErrorCode;
use crate::utils::generate_id;

/// Peer instances consume this topic to keep their active policy in sync.
const POLICY_ACTIVATED_TOPIC: &str = "warden.policy.activated";

///
/// Store a new security policy and optionally make it the active one.
///
pub async fn create_policy(ctx: &ServiceContext, request: Request<admin::CreatePolicyRequest>)
    -> Result<Response<common::Empty>, Status> {

    let request = request.into_inner();
    let now = ctx.now();

    let api_policy = match request.policy {
        Some(api_policy) => api_policy,
        None => return Err(ErrorCode::PolicyMandatory.with_msg("a policy is required").into()),
    };

    let policy = SecurityPolicy::from_api(api_policy, generate_id(), now)?;
    ctx.store().upsert_policy(&policy).await?;

    tracing::info!("Created security policy {}", policy.policy_id);

    if request.activate {
        ctx.store().set_active_policy(&policy.policy_id, now).await?;

        // Tell peer instances, then apply locally without waiting for the
        // notification to come back around.
        ctx.send(POLICY_ACTIVATED_TOPIC, json!({ "active_policy_id": policy.policy_id }), 1).await?;

        ctx.audit(AuditEvent::new(AuditKind::PolicyActivated, now)
            .by_actor("operator")
            .because(&format!("policy {}", policy.policy_id))).await?;

        ctx.apply_policy(policy, now);
    }

    Ok(Response::new(common::Empty::default()))
}
