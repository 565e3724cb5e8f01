use tonic::{Request, Response, Status};
use crate::grpc::{admin, common};
use crate::utils::context::ServiceContext;

pub async fn get_active_policy(ctx: &ServiceContext, _request: Request<common::Empty>)
    -> Result<Response<admin::PolicyResponse>, Status> {

    let lock = ctx.active_policy();

    Ok(Response::new(admin::PolicyResponse {
        policy_id: lock.policy.policy_id.clone(),
        policy: Some((&lock.policy).into()),
    }))
}
