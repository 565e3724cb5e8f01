use chrono::{DateTime, Utc};

///
/// An overridable clock - used for tests.
///
/// Lock expiry and reset windows are evaluated lazily against this clock, so
/// fixing it lets the test suites travel through time without sleeping.
///
#[derive(Debug, Default)]
pub struct TimeProvider {
    fixed: Option<DateTime<Utc>>
}

impl TimeProvider {
    pub fn now(&self) -> DateTime<Utc> {
        match self.fixed {
            Some(fixed) => fixed,
            None => Utc::now()
        }
    }

    pub fn fix(&mut self, fixed: Option<DateTime<Utc>>) {
        self.fixed = fixed;
    }
}
