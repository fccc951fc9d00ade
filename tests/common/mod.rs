#![allow(dead_code)]

pub use warden_test_utils::builders;
pub use warden_test_utils::fakes;
pub use warden_test_utils::{init_tracing, wait_until, with_timeout};

use std::time::{Duration, SystemTime};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// `UNIX_EPOCH + secs`, for readable mock modification times.
pub fn at(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}
