use tonic::Status;
use warden::grpc::{admin, common, warden as api};
use super::TestContext;

///
/// A security policy with cheap argon parameters so the suites spend their
/// time on behaviour, not hashing.
///
pub fn test_policy(max_failures: u32, lockout_seconds: u32) -> admin::Policy {
    admin::Policy {
        max_failures,
        lockout_seconds,
        min_length: 8,
        max_length: 128,
        min_letters: 1,
        min_numbers: 1,
        min_symbols: 1,
        mixed_case_required: true,
        prohibited_phrases: vec!("password".to_string(), "qwerty".to_string()),
        reset_timeout_seconds: 900,
        algorithm: Some(admin::policy::Algorithm::ArgonPolicy(admin::ArgonPolicy {
            parallelism: 1,
            tag_length: 32,
            memory_size_kb: 1024,
            iterations: 1,
            version: 19,
        })),
    }
}

///
/// Store and activate the given policy - takes effect immediately.
///
pub async fn activate_policy(policy: admin::Policy, ctx: &mut TestContext) {
    ctx.admin()
        .create_policy(admin::CreatePolicyRequest { policy: Some(policy), activate: true })
        .await
        .expect("create_policy failed");
}

pub async fn register_assert_ok(email: &str, password: &str, role: &str, ctx: &mut TestContext) -> api::Account {
    ctx.client()
        .register(api::RegisterRequest {
            email: email.to_string(),
            plain_text_password: password.to_string(),
            role: role.to_string(),
        })
        .await
        .expect("register failed")
        .into_inner()
        .account
        .expect("register response had no account")
}

pub async fn register_assert_err(email: &str, password: &str, role: &str, ctx: &mut TestContext) -> Status {
    ctx.client()
        .register(api::RegisterRequest {
            email: email.to_string(),
            plain_text_password: password.to_string(),
            role: role.to_string(),
        })
        .await
        .expect_err("register unexpectedly succeeded")
}

pub async fn login_assert_ok(email: &str, password: &str, ctx: &mut TestContext) -> api::LoginResponse {
    ctx.client()
        .login(api::LoginRequest { email: email.to_string(), plain_text_password: password.to_string() })
        .await
        .expect("login failed")
        .into_inner()
}

pub async fn login_assert_err(email: &str, password: &str, ctx: &mut TestContext) -> Status {
    ctx.client()
        .login(api::LoginRequest { email: email.to_string(), plain_text_password: password.to_string() })
        .await
        .expect_err("login unexpectedly succeeded")
}

pub async fn logout(session_token: &str, ctx: &mut TestContext) {
    ctx.client()
        .logout(api::LogoutRequest { session_token: session_token.to_string() })
        .await
        .expect("logout failed");
}

pub async fn get_session_assert_err(session_token: &str, ctx: &mut TestContext) -> Status {
    ctx.client()
        .get_session(api::SessionRequest { session_token: session_token.to_string() })
        .await
        .expect_err("get_session unexpectedly succeeded")
}

pub async fn get_session_assert_ok(session_token: &str, ctx: &mut TestContext) -> api::Account {
    ctx.client()
        .get_session(api::SessionRequest { session_token: session_token.to_string() })
        .await
        .expect("get_session failed")
        .into_inner()
        .account
        .expect("session response had no account")
}

pub async fn change_password_assert_ok(email: &str, current: &str, new: &str, ctx: &mut TestContext) {
    ctx.client()
        .change_password(api::ChangePasswordRequest {
            email: email.to_string(),
            current_password: current.to_string(),
            new_password: new.to_string(),
        })
        .await
        .expect("change_password failed");
}

pub async fn change_password_assert_err(email: &str, current: &str, new: &str, ctx: &mut TestContext) -> Status {
    ctx.client()
        .change_password(api::ChangePasswordRequest {
            email: email.to_string(),
            current_password: current.to_string(),
            new_password: new.to_string(),
        })
        .await
        .expect_err("change_password unexpectedly succeeded")
}

pub async fn check_access(session_token: &str, allowed_roles: &[&str], ctx: &mut TestContext) -> api::CheckAccessResponse {
    ctx.client()
        .check_access(api::CheckAccessRequest {
            session_token: session_token.to_string(),
            allowed_roles: allowed_roles.iter().map(|role| role.to_string()).collect(),
        })
        .await
        .expect("check_access failed")
        .into_inner()
}

pub async fn set_time(new_time: &str, ctx: &mut TestContext) {
    ctx.admin()
        .set_time(admin::NewTime { new_time: new_time.to_string() })
        .await
        .expect("set_time failed");
}

pub async fn reset_time(ctx: &mut TestContext) {
    ctx.admin()
        .reset_time(common::Empty::default())
        .await
        .expect("reset_time failed");
}

///
/// Pull the stable numeric error code out of the status details.
///
pub fn error_code(status: Status) -> u32 {
    String::from_utf8_lossy(status.details())
        .parse()
        .expect("status had no numeric error code in its details")
}
