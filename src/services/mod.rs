mod change_password;
mod check_access;
mod complete_reset;
mod create_policy;
mod emergency_unlock;
mod force_change;
mod get_active_policy;
mod get_session;
mod login;
mod logout;
mod register;
mod set_mfa;
mod set_password;
mod set_time;
mod start_reset;

use std::sync::Arc;
use tracing::instrument;
use tonic::{Request, Response, Status};
use crate::grpc::{admin, common, warden as api};
use crate::grpc::warden::warden_server::Warden;
use crate::grpc::admin::admin_server::Admin;
use crate::utils::context::ServiceContext;
use crate::utils::errors::ErrorCode;

///
/// Every failed login gets this exact response. The precise reason - unknown
/// email, wrong password, locked account - goes to the logs and the audit
/// trail only, so callers cannot probe which emails exist or which accounts
/// are locked.
///
pub fn uniform_rejection() -> Status {
    Status::from(ErrorCode::InvalidCredentials.with_msg("invalid email or password"))
}

/// Emails are matched case-insensitively.
pub fn normalise_email(email: &str) -> String {
    email.trim().to_lowercase()
}

///
/// Implementation for the public service endpoints defined in warden.proto.
///
#[tonic::async_trait]
impl Warden for Arc<ServiceContext> {

    #[instrument(skip(self, request))]
    async fn register(&self, request: Request<api::RegisterRequest>) -> Result<Response<api::AccountResponse>, Status> {
        register::register(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn login(&self, request: Request<api::LoginRequest>) -> Result<Response<api::LoginResponse>, Status> {
        login::login(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn logout(&self, request: Request<api::LogoutRequest>) -> Result<Response<common::Empty>, Status> {
        logout::logout(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn get_session(&self, request: Request<api::SessionRequest>) -> Result<Response<api::AccountResponse>, Status> {
        get_session::get_session(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn change_password(&self, request: Request<api::ChangePasswordRequest>) -> Result<Response<common::Empty>, Status> {
        change_password::change_password(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn start_reset(&self, request: Request<api::StartResetRequest>) -> Result<Response<api::StartResetResponse>, Status> {
        start_reset::start_reset(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn complete_reset(&self, request: Request<api::CompleteResetRequest>) -> Result<Response<common::Empty>, Status> {
        complete_reset::complete_reset(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn check_access(&self, request: Request<api::CheckAccessRequest>) -> Result<Response<api::CheckAccessResponse>, Status> {
        check_access::check_access(self, request).await
    }
}

///
/// Implementation for the operator-only endpoints defined in admin.proto.
///
/// These are served on the loopback admin listener - the trusted execution
/// context the emergency paths require.
///
#[tonic::async_trait]
impl Admin for Arc<ServiceContext> {

    async fn ping(&self, _request: Request<common::Empty>) -> Result<Response<common::Empty>, Status> {
        Ok(Response::new(common::Empty::default()))
    }

    #[instrument(skip(self, request))]
    async fn emergency_unlock(&self, request: Request<admin::EmergencyUnlockRequest>) -> Result<Response<admin::EmergencyUnlockResponse>, Status> {
        emergency_unlock::emergency_unlock(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn set_password(&self, request: Request<admin::SetPasswordRequest>) -> Result<Response<common::Empty>, Status> {
        set_password::set_password(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn force_password_change(&self, request: Request<admin::ForceChangeRequest>) -> Result<Response<common::Empty>, Status> {
        force_change::force_password_change(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn set_mfa(&self, request: Request<admin::SetMfaRequest>) -> Result<Response<common::Empty>, Status> {
        set_mfa::set_mfa(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn create_policy(&self, request: Request<admin::CreatePolicyRequest>) -> Result<Response<common::Empty>, Status> {
        create_policy::create_policy(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn get_active_policy(&self, request: Request<common::Empty>) -> Result<Response<admin::PolicyResponse>, Status> {
        get_active_policy::get_active_policy(self, request).await
    }

    async fn set_time(&self, request: Request<admin::NewTime>) -> Result<Response<common::Empty>, Status> {
        set_time::set_time(self, request).await
    }

    async fn reset_time(&self, request: Request<common::Empty>) -> Result<Response<common::Empty>, Status> {
        set_time::reset_time(self, request).await
    }
}
