mod common;

use tonic::Code;
use warden::grpc::warden as api;
use crate::common::{helper, start_warden, TestConfig};

const PORT: u16 = 50181;
const ADMIN_PORT: u16 = 50182;

fn config() -> TestConfig {
    TestConfig::for_suite(PORT, ADMIN_PORT)
}

#[tokio::test]
async fn test_the_two_phase_reset_rotates_the_credential() {
    let mut ctx = start_warden(config()).await;
    helper::activate_policy(helper::test_policy(5, 1800), &mut ctx).await;

    helper::register_assert_ok("forgetful@example.com", "Old!pwd99", "patient", &mut ctx).await;

    let reset_code = ctx.client()
        .start_reset(api::StartResetRequest { email: "forgetful@example.com".to_string() })
        .await
        .expect("start_reset failed")
        .into_inner()
        .reset_code;
    assert_eq!(reset_code.len(), 8);

    // A wrong code is rejected and leaves the reset in progress.
    let status = ctx.client()
        .complete_reset(api::CompleteResetRequest {
            email: "forgetful@example.com".to_string(),
            reset_code: "WRONG123".to_string(),
            new_password: "N3w!secret".to_string(),
        })
        .await
        .expect_err("complete_reset unexpectedly succeeded");
    assert_eq!(status.code(), Code::Unauthenticated);
    assert_eq!(helper::error_code(status), 2201 /* ResetCodeMismatch */);

    ctx.client()
        .complete_reset(api::CompleteResetRequest {
            email: "forgetful@example.com".to_string(),
            reset_code: reset_code.clone(),
            new_password: "N3w!secret".to_string(),
        })
        .await
        .expect("complete_reset failed");

    helper::login_assert_ok("forgetful@example.com", "N3w!secret", &mut ctx).await;
    helper::login_assert_err("forgetful@example.com", "Old!pwd99", &mut ctx).await;

    // The code is one-shot.
    let status = ctx.client()
        .complete_reset(api::CompleteResetRequest {
            email: "forgetful@example.com".to_string(),
            reset_code,
            new_password: "An0ther!one".to_string(),
        })
        .await
        .expect_err("complete_reset unexpectedly succeeded");
    assert_eq!(helper::error_code(status), 2200 /* NoResetCode */);
}

#[tokio::test]
async fn test_the_reset_window_expires() {
    let mut ctx = start_warden(config()).await;
    helper::activate_policy(helper::test_policy(5, 1800), &mut ctx).await;

    helper::set_time("2026-03-02T09:30:00Z", &mut ctx).await;
    helper::register_assert_ok("slowcoach@example.com", "Old!pwd99", "patient", &mut ctx).await;

    let reset_code = ctx.client()
        .start_reset(api::StartResetRequest { email: "slowcoach@example.com".to_string() })
        .await
        .expect("start_reset failed")
        .into_inner()
        .reset_code;

    // The policy allows 15 minutes - travel 16.
    helper::set_time("2026-03-02T09:46:00Z", &mut ctx).await;

    let status = ctx.client()
        .complete_reset(api::CompleteResetRequest {
            email: "slowcoach@example.com".to_string(),
            reset_code,
            new_password: "N3w!secret".to_string(),
        })
        .await
        .expect_err("complete_reset unexpectedly succeeded");

    assert_eq!(status.code(), Code::DeadlineExceeded);
    assert_eq!(helper::error_code(status), 2202 /* ResetWindowExpired */);
}

#[tokio::test]
async fn test_change_password_verifies_the_current_credential() {
    let mut ctx = start_warden(config()).await;
    helper::activate_policy(helper::test_policy(5, 1800), &mut ctx).await;

    helper::register_assert_ok("careful@example.com", "Old!pwd99", "provider", &mut ctx).await;

    let status = helper::change_password_assert_err("careful@example.com", "Wr0ng!pwd", "N3w!secret", &mut ctx).await;
    assert_eq!(status.code(), Code::Unauthenticated);

    // The new credential must satisfy the active policy.
    let status = helper::change_password_assert_err("careful@example.com", "Old!pwd99", "short", &mut ctx).await;
    assert_eq!(status.code(), Code::InvalidArgument);

    helper::change_password_assert_ok("careful@example.com", "Old!pwd99", "N3w!secret", &mut ctx).await;
    helper::login_assert_ok("careful@example.com", "N3w!secret", &mut ctx).await;
    helper::login_assert_err("careful@example.com", "Old!pwd99", &mut ctx).await;
}

#[tokio::test]
async fn test_an_activated_policy_applies_immediately() {
    let mut ctx = start_warden(config()).await;

    let mut strict = helper::test_policy(5, 1800);
    strict.min_length = 12;
    helper::activate_policy(strict, &mut ctx).await;

    // Nine characters passed the default policy but not this one.
    let status = helper::register_assert_err("strict@example.com", "W!bble123", "patient", &mut ctx).await;
    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(helper::error_code(status), 2002 /* PasswordTooShort */);

    helper::register_assert_ok("strict@example.com", "W!bble123456", "patient", &mut ctx).await;

    // The active policy is queryable over the admin API.
    let response = ctx.admin()
        .get_active_policy(warden::grpc::common::Empty::default())
        .await
        .expect("get_active_policy failed")
        .into_inner();
    assert_eq!(response.policy.expect("no policy in response").min_length, 12);
}
