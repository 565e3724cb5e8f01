use chrono::{DateTime, Duration, Utc};
use crate::model::account::{Account, Role};

///
/// The lockout knobs from the active security policy.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LockoutPolicy {
    pub max_failures: u32,

    /// 0 means indefinite - manual unlock only.
    pub lockout_seconds: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Decision {
    Accepted { must_change_password: bool },
    Rejected(RejectReason),
}

///
/// The precise rejection reason. This never reaches the public client - the
/// login endpoint responds uniformly - but audit records keep it.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RejectReason {
    InvalidCredentials,
    AccountLocked,
}

///
/// The record mutations an evaluation calls for. The caller applies each one
/// through the store's atomic primitives - the counter bump is a server-side
/// increment and the lock flip is a state-filtered conditional update, so
/// concurrent attempts against the same account cannot lose updates.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Transition {
    AutoUnlock,
    RecordFailure,
    RecordSuccess,
}

impl LockoutPolicy {
    ///
    /// When a lock applied now would expire. Superadmin locks are always
    /// indefinite: the only way out is the emergency unlock path.
    ///
    pub fn lock_expiry(&self, role: Role, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if role == Role::SuperAdmin || self.lockout_seconds == 0 {
            return None
        }

        Some(now + Duration::seconds(self.lockout_seconds as i64))
    }
}

///
/// The account lockout state machine.
///
/// Evaluates one login attempt against the record, mutating the record to its
/// post-attempt state and returning the decision plus the transitions the
/// store must apply:
///
/// - an expired lock is released before the attempt is considered,
/// - a standing lock rejects without any further mutation,
/// - a failure increments the counter and locks at the policy threshold,
/// - a success resets the counter.
///
pub fn evaluate_attempt(account: &mut Account, credentials_valid: bool, now: DateTime<Utc>, policy: &LockoutPolicy)
    -> (Decision, Vec<Transition>) {

    let mut transitions = Vec::new();

    if account.account_locked && account.lock_expired(now) {
        account.account_locked = false;
        account.lock_expires_at = None;
        account.failed_login_attempts = 0;
        account.last_failed_login = None;
        transitions.push(Transition::AutoUnlock);
    }

    if account.account_locked {
        return (Decision::Rejected(RejectReason::AccountLocked), transitions)
    }

    if !credentials_valid {
        account.failed_login_attempts += 1;
        account.last_failed_login = Some(now.into());
        transitions.push(Transition::RecordFailure);

        if account.failed_login_attempts >= policy.max_failures {
            account.account_locked = true;
            account.lock_expires_at = policy.lock_expiry(account.role, now).map(bson::DateTime::from_chrono);
            return (Decision::Rejected(RejectReason::AccountLocked), transitions)
        }

        return (Decision::Rejected(RejectReason::InvalidCredentials), transitions)
    }

    account.failed_login_attempts = 0;
    account.last_failed_login = None;
    account.last_success = Some(now.into());
    transitions.push(Transition::RecordSuccess);

    (Decision::Accepted { must_change_password: account.change_password_required }, transitions)
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: LockoutPolicy = LockoutPolicy { max_failures: 5, lockout_seconds: 1800 };

    fn account(role: Role) -> Account {
        Account::new("acc-1".to_string(), "user@example.com".to_string(), "$argon2id$...".to_string(), role, now())
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-02T09:30:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_failures_below_the_threshold_never_lock() {
        let mut account = account(Role::Patient);

        for n in 1..POLICY.max_failures {
            let (decision, transitions) = evaluate_attempt(&mut account, false, now(), &POLICY);
            assert_eq!(decision, Decision::Rejected(RejectReason::InvalidCredentials));
            assert_eq!(transitions, vec!(Transition::RecordFailure));
            assert_eq!(account.failed_login_attempts, n);
            assert!(!account.account_locked);
        }
    }

    #[test]
    fn test_the_attempt_reaching_the_threshold_locks() {
        let mut account = account(Role::Patient);
        account.failed_login_attempts = POLICY.max_failures - 1;

        let (decision, _) = evaluate_attempt(&mut account, false, now(), &POLICY);

        assert_eq!(decision, Decision::Rejected(RejectReason::AccountLocked));
        assert!(account.account_locked);
        assert_eq!(
            account.lock_expires_at.map(|at| at.to_chrono()),
            Some(now() + Duration::seconds(POLICY.lockout_seconds as i64)));
    }

    #[test]
    fn test_a_success_resets_the_counter_whatever_its_value() {
        let mut account = account(Role::Patient);
        account.failed_login_attempts = POLICY.max_failures - 1;
        account.last_failed_login = Some(now().into());

        let (decision, transitions) = evaluate_attempt(&mut account, true, now(), &POLICY);

        assert_eq!(decision, Decision::Accepted { must_change_password: false });
        assert_eq!(transitions, vec!(Transition::RecordSuccess));
        assert_eq!(account.failed_login_attempts, 0);
        assert_eq!(account.last_failed_login, None);
    }

    #[test]
    fn test_a_standing_lock_rejects_valid_credentials_without_mutation() {
        let mut account = account(Role::Patient);
        account.account_locked = true;
        account.lock_expires_at = Some((now() + Duration::minutes(30)).into());
        account.failed_login_attempts = POLICY.max_failures;

        let (decision, transitions) = evaluate_attempt(&mut account, true, now(), &POLICY);

        assert_eq!(decision, Decision::Rejected(RejectReason::AccountLocked));
        assert!(transitions.is_empty());
        assert_eq!(account.failed_login_attempts, POLICY.max_failures);
        assert!(account.account_locked);
    }

    #[test]
    fn test_an_expired_lock_releases_before_a_success() {
        let mut account = account(Role::Patient);
        account.account_locked = true;
        account.lock_expires_at = Some((now() - Duration::seconds(1)).into());
        account.failed_login_attempts = POLICY.max_failures;

        let (decision, transitions) = evaluate_attempt(&mut account, true, now(), &POLICY);

        assert_eq!(decision, Decision::Accepted { must_change_password: false });
        assert_eq!(transitions, vec!(Transition::AutoUnlock, Transition::RecordSuccess));
        assert!(!account.account_locked);
        assert_eq!(account.failed_login_attempts, 0);
    }

    #[test]
    fn test_an_expired_lock_releases_before_a_failure_counts_afresh() {
        let mut account = account(Role::Patient);
        account.account_locked = true;
        account.lock_expires_at = Some((now() - Duration::minutes(1)).into());
        account.failed_login_attempts = POLICY.max_failures;

        let (decision, transitions) = evaluate_attempt(&mut account, false, now(), &POLICY);

        assert_eq!(decision, Decision::Rejected(RejectReason::InvalidCredentials));
        assert_eq!(transitions, vec!(Transition::AutoUnlock, Transition::RecordFailure));
        assert!(!account.account_locked);
        assert_eq!(account.failed_login_attempts, 1);
    }

    #[test]
    fn test_a_lock_that_exactly_reaches_expiry_releases() {
        let mut account = account(Role::Patient);
        account.account_locked = true;
        account.lock_expires_at = Some(now().into());

        let (decision, _) = evaluate_attempt(&mut account, true, now(), &POLICY);

        assert_eq!(decision, Decision::Accepted { must_change_password: false });
    }

    #[test]
    fn test_zero_duration_means_an_indefinite_lock() {
        let policy = LockoutPolicy { max_failures: 3, lockout_seconds: 0 };
        let mut account = account(Role::Patient);
        account.failed_login_attempts = 2;

        let (decision, _) = evaluate_attempt(&mut account, false, now(), &policy);

        assert_eq!(decision, Decision::Rejected(RejectReason::AccountLocked));
        assert!(account.account_locked);
        assert_eq!(account.lock_expires_at, None);
        assert!(!account.lock_expired(now() + Duration::days(365)));
    }

    #[test]
    fn test_superadmin_locks_are_indefinite_regardless_of_policy() {
        let mut account = account(Role::SuperAdmin);
        account.failed_login_attempts = POLICY.max_failures - 1;

        let (decision, _) = evaluate_attempt(&mut account, false, now(), &POLICY);

        assert_eq!(decision, Decision::Rejected(RejectReason::AccountLocked));
        assert!(account.account_locked);
        assert_eq!(account.lock_expires_at, None);
    }

    #[test]
    fn test_an_accepted_attempt_reports_a_pending_forced_change() {
        let mut account = account(Role::Admin);
        account.change_password_required = true;

        let (decision, _) = evaluate_attempt(&mut account, true, now(), &POLICY);

        assert_eq!(decision, Decision::Accepted { must_change_password: true });
    }
}
