use tonic::{Request, Response, Status};
use crate::grpc::warden as api;
use crate::model::account::Account;
use crate::utils::context::ServiceContext;
use crate::utils::errors::{ErrorCode, WardenError};

///
/// Session introspection only - no record mutation.
///
pub async fn get_session(ctx: &ServiceContext, request: Request<api::SessionRequest>)
    -> Result<Response<api::AccountResponse>, Status> {

    let request = request.into_inner();

    match load_session_account(ctx, &request.session_token).await? {
        Some(account) => Ok(Response::new(api::AccountResponse { account: Some((&account).into()) })),
        None => Err(ErrorCode::SessionNotFound.with_msg("the session is not valid").into()),
    }
}

///
/// Resolve a session token to its account - None when either side is gone.
///
pub async fn load_session_account(ctx: &ServiceContext, session_token: &str)
    -> Result<Option<Account>, WardenError> {

    match ctx.store().load_session(session_token).await? {
        Some(session) => ctx.store().load_account_by_id(&session.account_id).await,
        None => Ok(None),
    }
}
