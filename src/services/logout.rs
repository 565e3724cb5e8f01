use tonic::{Request, Response, Status};
use crate::grpc::{common, warden as api};
use crate::utils::context::ServiceContext;

///
/// Clear the session. The account record is untouched.
///
pub async fn logout(ctx: &ServiceContext, request: Request<api::LogoutRequest>)
    -> Result<Response<common::Empty>, Status> {

    let request = request.into_inner();
    ctx.store().delete_session(&request.session_token).await?;
    Ok(Response::new(common::Empty::default()))
}
